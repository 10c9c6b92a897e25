//! Device-local preferences: a small JSON key/value file.
//!
//! Every write rewrites the whole file. A missing file is an empty store; a
//! corrupt file or value is logged and treated as absent.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crewboard_core::filter::{normalize_search, Paged, Pagination, TeamFilter, FIRST_PAGE};
use crewboard_core::swimlane::SwimlaneSetting;
use crewboard_core::types::RecordId;

use crate::error::ConsoleResult;

/// Key of the persisted [`SwimlaneSetting`].
pub const SWIMLANE_SETTINGS_KEY: &str = "crewboard.swimlane.settings";

/// Key of the user's named filter sets.
pub const SAVED_FILTERS_KEY: &str = "crewboard.filters.saved";

// ---------------------------------------------------------------------------
// LocalStore
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct LocalStore {
    path: PathBuf,
    entries: BTreeMap<String, Value>,
}

impl LocalStore {
    /// Open the store at `path`. Only I/O errors other than "not found" fail.
    pub fn open(path: impl Into<PathBuf>) -> ConsoleResult<Self> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Corrupt preferences file, starting empty");
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Typed value under `key`; `None` when absent or not decodable.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.entries.get(key)?;
        match serde_json::from_value(value.clone()) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!(key, error = %e, "Ignoring unreadable preference");
                None
            }
        }
    }

    pub fn set<T: Serialize>(&mut self, key: &str, value: &T) -> ConsoleResult<()> {
        self.entries.insert(key.to_string(), serde_json::to_value(value)?);
        self.persist()
    }

    pub fn remove(&mut self, key: &str) -> ConsoleResult<()> {
        if self.entries.remove(key).is_some() {
            self.persist()?;
        }
        Ok(())
    }

    fn persist(&self) -> ConsoleResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(&self.entries)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Typed preferences
// ---------------------------------------------------------------------------

/// A named set of board filters the user can re-apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedFilter {
    pub name: String,
    #[serde(default)]
    pub region_ids: Vec<RecordId>,
    #[serde(default)]
    pub team_name: Option<String>,
}

impl SavedFilter {
    /// `filter` with this set's regions and team name, back on page 1.
    /// The date window and page size are kept.
    pub fn apply(&self, mut filter: TeamFilter) -> TeamFilter {
        filter.region_ids = self.region_ids.clone();
        filter.name = self.team_name.as_deref().and_then(normalize_search);
        let size = filter.pagination().page_size;
        filter.set_pagination(Pagination::new(FIRST_PAGE, size));
        filter
    }
}

pub struct Preferences {
    store: LocalStore,
}

impl Preferences {
    pub fn open(path: impl Into<PathBuf>) -> ConsoleResult<Self> {
        Ok(Self {
            store: LocalStore::open(path)?,
        })
    }

    /// Stored swimlane setting, or the default when missing or invalid.
    pub fn swimlane_settings(&self) -> SwimlaneSetting {
        let Some(setting) = self.store.get::<SwimlaneSetting>(SWIMLANE_SETTINGS_KEY) else {
            return SwimlaneSetting::default();
        };
        match setting.validate() {
            Ok(()) => setting,
            Err(e) => {
                tracing::warn!(error = %e, "Stored swimlane setting is invalid, using defaults");
                SwimlaneSetting::default()
            }
        }
    }

    /// Validate and persist a swimlane setting.
    pub fn save_swimlane_settings(&mut self, setting: &SwimlaneSetting) -> ConsoleResult<()> {
        setting.validate()?;
        self.store.set(SWIMLANE_SETTINGS_KEY, setting)
    }

    pub fn saved_filters(&self) -> Vec<SavedFilter> {
        self.store.get(SAVED_FILTERS_KEY).unwrap_or_default()
    }

    /// Store `filter`, replacing any filter with the same name.
    pub fn save_filter(&mut self, filter: SavedFilter) -> ConsoleResult<()> {
        let mut filters = self.saved_filters();
        match filters.iter_mut().find(|f| f.name == filter.name) {
            Some(existing) => *existing = filter,
            None => filters.push(filter),
        }
        self.store.set(SAVED_FILTERS_KEY, &filters)
    }

    /// Returns whether a filter with that name existed.
    pub fn delete_filter(&mut self, name: &str) -> ConsoleResult<bool> {
        let mut filters = self.saved_filters();
        let before = filters.len();
        filters.retain(|f| f.name != name);
        if filters.len() == before {
            return Ok(false);
        }
        self.store.set(SAVED_FILTERS_KEY, &filters)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::Weekday;
    use crewboard_core::error::CoreError;
    use crewboard_core::swimlane::WeekdayMask;

    use super::*;
    use crate::error::ConsoleError;

    fn prefs_in(dir: &tempfile::TempDir) -> Preferences {
        Preferences::open(dir.path().join("nested/preferences.json")).unwrap()
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = prefs_in(&dir);
        assert_eq!(prefs.swimlane_settings(), SwimlaneSetting::default());
        assert!(prefs.saved_filters().is_empty());
    }

    #[test]
    fn swimlane_settings_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let setting = SwimlaneSetting {
            day_start: 700,
            day_end: 1530,
            weekdays: WeekdayMask::weekdays_only(),
            snap_minutes: 15,
        };
        prefs_in(&dir).save_swimlane_settings(&setting).unwrap();

        let reopened = prefs_in(&dir);
        assert_eq!(reopened.swimlane_settings(), setting);
        assert!(!reopened.swimlane_settings().weekdays.is_enabled(Weekday::Sun));
    }

    #[test]
    fn invalid_setting_is_not_saved() {
        let dir = tempfile::tempdir().unwrap();
        let mut prefs = prefs_in(&dir);
        let setting = SwimlaneSetting {
            snap_minutes: 7,
            ..SwimlaneSetting::default()
        };
        let err = prefs.save_swimlane_settings(&setting).unwrap_err();
        assert_matches!(err, ConsoleError::Core(CoreError::Validation(_)));
        assert!(!dir.path().join("nested/preferences.json").exists());
    }

    #[test]
    fn corrupt_file_is_treated_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        std::fs::write(&path, "{not json").unwrap();

        let prefs = Preferences::open(&path).unwrap();
        assert_eq!(prefs.swimlane_settings(), SwimlaneSetting::default());
    }

    #[test]
    fn corrupt_value_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        std::fs::write(
            &path,
            r#"{"crewboard.swimlane.settings": "not an object", "other": 1}"#,
        )
        .unwrap();

        let prefs = Preferences::open(&path).unwrap();
        assert_eq!(prefs.swimlane_settings(), SwimlaneSetting::default());
    }

    #[test]
    fn saved_filter_applies_regions_and_name_keeping_window() {
        let start = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = chrono::NaiveDate::from_ymd_opt(2024, 1, 7).unwrap();
        let mut current = TeamFilter::window(start, end)
            .with_regions(vec!["R9".into()])
            .with_name("east");
        current.set_pagination(Pagination::new(4, 50));
        let saved = SavedFilter {
            name: "North".into(),
            region_ids: vec!["R1".into(), "R2".into()],
            team_name: Some(" crew ".into()),
        };

        let applied = saved.apply(current);

        assert_eq!(applied.region_ids, vec!["R1".to_string(), "R2".to_string()]);
        assert_eq!(applied.name.as_deref(), Some("crew"));
        assert_eq!((applied.start_date, applied.end_date), (start, end));
        assert_eq!(applied.page_number, 1);
        assert_eq!(applied.page_size, 50);

        let cleared = SavedFilter {
            team_name: None,
            ..saved
        }
        .apply(applied);
        assert_eq!(cleared.name, None);
    }

    #[test]
    fn saved_filters_replace_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut prefs = prefs_in(&dir);
        prefs
            .save_filter(SavedFilter {
                name: "North".into(),
                region_ids: vec!["R1".into()],
                team_name: None,
            })
            .unwrap();
        prefs
            .save_filter(SavedFilter {
                name: "North".into(),
                region_ids: vec!["R1".into(), "R2".into()],
                team_name: Some("crew".into()),
            })
            .unwrap();

        let filters = prefs_in(&dir).saved_filters();
        assert_eq!(filters.len(), 1);
        assert_eq!(filters[0].region_ids, vec!["R1".to_string(), "R2".to_string()]);

        assert!(prefs.delete_filter("North").unwrap());
        assert!(!prefs.delete_filter("North").unwrap());
        assert!(prefs_in(&dir).saved_filters().is_empty());
    }
}
