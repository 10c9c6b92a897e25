use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConsoleError;

/// Console configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development against a backend
/// on `localhost:8080`.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Base URL of the scheduling backend API.
    pub backend_url: String,
    /// Quiet period before a search box keystroke triggers a request.
    pub search_debounce: Duration,
    /// How long a toast stays visible.
    pub toast_dismiss: Duration,
    /// Rows per page for list panels.
    pub page_size: u32,
    /// Device-local preferences file.
    pub preferences_path: PathBuf,
    /// Width in pixels the swimlane may use.
    pub viewport_width: f64,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:8080/api".into(),
            search_debounce: Duration::from_millis(500),
            toast_dismiss: Duration::from_secs(5),
            page_size: crewboard_core::filter::DEFAULT_PAGE_SIZE,
            preferences_path: PathBuf::from(".crewboard/preferences.json"),
            viewport_width: 1280.0,
        }
    }
}

impl ConsoleConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var              | Default                       |
    /// |----------------------|-------------------------------|
    /// | `BACKEND_URL`        | `http://localhost:8080/api`   |
    /// | `SEARCH_DEBOUNCE_MS` | `500`                         |
    /// | `TOAST_DISMISS_SECS` | `5`                           |
    /// | `PAGE_SIZE`          | `20`                          |
    /// | `PREFERENCES_PATH`   | `.crewboard/preferences.json` |
    /// | `VIEWPORT_WIDTH`     | `1280`                        |
    pub fn from_env() -> Result<Self, ConsoleError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConsoleError> {
        let defaults = Self::default();

        let backend_url = lookup("BACKEND_URL").unwrap_or(defaults.backend_url);
        let search_debounce_ms: u64 = parse_var(&lookup, "SEARCH_DEBOUNCE_MS", 500)?;
        let toast_dismiss_secs: u64 = parse_var(&lookup, "TOAST_DISMISS_SECS", 5)?;
        let page_size: u32 = parse_var(&lookup, "PAGE_SIZE", defaults.page_size)?;
        let preferences_path = lookup("PREFERENCES_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.preferences_path);
        let viewport_width: f64 = parse_var(&lookup, "VIEWPORT_WIDTH", defaults.viewport_width)?;

        Ok(Self {
            backend_url,
            search_debounce: Duration::from_millis(search_debounce_ms),
            toast_dismiss: Duration::from_secs(toast_dismiss_secs),
            page_size: crewboard_core::filter::clamp_page_size(page_size),
            preferences_path,
            viewport_width,
        })
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConsoleError> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConsoleError::Config(format!("{key} must be a number, got {raw:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = ConsoleConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.backend_url, "http://localhost:8080/api");
        assert_eq!(config.search_debounce, Duration::from_millis(500));
        assert_eq!(config.page_size, 20);
    }

    #[test]
    fn overrides_are_parsed() {
        let config = ConsoleConfig::from_lookup(lookup(&[
            ("BACKEND_URL", "https://sched.example/api"),
            ("SEARCH_DEBOUNCE_MS", "300"),
            ("PAGE_SIZE", "5000"),
        ]))
        .unwrap();
        assert_eq!(config.backend_url, "https://sched.example/api");
        assert_eq!(config.search_debounce, Duration::from_millis(300));
        assert_eq!(config.page_size, crewboard_core::filter::MAX_PAGE_SIZE);
    }

    #[test]
    fn unparseable_number_is_config_error() {
        let err = ConsoleConfig::from_lookup(lookup(&[("TOAST_DISMISS_SECS", "soon")])).unwrap_err();
        assert_matches!(err, ConsoleError::Config(msg) if msg.contains("TOAST_DISMISS_SECS"));
    }
}
