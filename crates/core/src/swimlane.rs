//! Swimlane columns and display settings.
//!
//! The swimlane is the calendar grid of the team board: one column per
//! visible calendar day. Which days are visible depends on the user's
//! [`SwimlaneSetting`], persisted on the device and loaded at startup.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::hhmm;
use crate::types::Hhmm;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default start of the working-hours window.
pub const DEFAULT_DAY_START: Hhmm = 800;

/// Default end of the working-hours window.
pub const DEFAULT_DAY_END: Hhmm = 1800;

/// Default time-snap granularity in minutes.
pub const DEFAULT_SNAP_MINUTES: i32 = 30;

/// Time-snap granularities offered by the settings panel.
pub const SNAP_CHOICES: &[i32] = &[15, 30, 60];

// ---------------------------------------------------------------------------
// Weekday mask
// ---------------------------------------------------------------------------

fn enabled() -> bool {
    true
}

/// Per-weekday enable flags. A weekday absent from persisted JSON is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekdayMask {
    #[serde(default = "enabled")]
    pub mon: bool,
    #[serde(default = "enabled")]
    pub tue: bool,
    #[serde(default = "enabled")]
    pub wed: bool,
    #[serde(default = "enabled")]
    pub thu: bool,
    #[serde(default = "enabled")]
    pub fri: bool,
    #[serde(default = "enabled")]
    pub sat: bool,
    #[serde(default = "enabled")]
    pub sun: bool,
}

impl Default for WeekdayMask {
    fn default() -> Self {
        Self::all()
    }
}

impl WeekdayMask {
    /// Every day enabled.
    pub fn all() -> Self {
        Self {
            mon: true,
            tue: true,
            wed: true,
            thu: true,
            fri: true,
            sat: true,
            sun: true,
        }
    }

    /// Monday to Friday.
    pub fn weekdays_only() -> Self {
        Self {
            sat: false,
            sun: false,
            ..Self::all()
        }
    }

    pub fn is_enabled(&self, day: Weekday) -> bool {
        match day {
            Weekday::Mon => self.mon,
            Weekday::Tue => self.tue,
            Weekday::Wed => self.wed,
            Weekday::Thu => self.thu,
            Weekday::Fri => self.fri,
            Weekday::Sat => self.sat,
            Weekday::Sun => self.sun,
        }
    }

    pub fn set(&mut self, day: Weekday, on: bool) {
        let slot = match day {
            Weekday::Mon => &mut self.mon,
            Weekday::Tue => &mut self.tue,
            Weekday::Wed => &mut self.wed,
            Weekday::Thu => &mut self.thu,
            Weekday::Fri => &mut self.fri,
            Weekday::Sat => &mut self.sat,
            Weekday::Sun => &mut self.sun,
        };
        *slot = on;
    }

    /// Builder form of [`set`](Self::set).
    pub fn with(mut self, day: Weekday, on: bool) -> Self {
        self.set(day, on);
        self
    }

    pub fn enabled_count(&self) -> usize {
        [
            self.mon, self.tue, self.wed, self.thu, self.fri, self.sat, self.sun,
        ]
        .iter()
        .filter(|on| **on)
        .count()
    }
}

// ---------------------------------------------------------------------------
// Date range
// ---------------------------------------------------------------------------

/// Calendar days from `start` to `end` (both inclusive), skipping disabled
/// weekdays.
///
/// Returns an empty list when `start > end` or when every weekday is
/// disabled.
pub fn build_date_range(start: NaiveDate, end: NaiveDate, mask: &WeekdayMask) -> Vec<NaiveDate> {
    if start > end || mask.enabled_count() == 0 {
        return Vec::new();
    }
    start
        .iter_days()
        .take_while(|day| *day <= end)
        .filter(|day| mask.is_enabled(day.weekday()))
        .collect()
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Swimlane display preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SwimlaneSetting {
    /// Start of the working-hours window.
    pub day_start: Hhmm,
    /// End of the working-hours window.
    pub day_end: Hhmm,
    pub weekdays: WeekdayMask,
    /// Time-snap granularity in minutes, one of [`SNAP_CHOICES`].
    pub snap_minutes: i32,
}

impl Default for SwimlaneSetting {
    fn default() -> Self {
        Self {
            day_start: DEFAULT_DAY_START,
            day_end: DEFAULT_DAY_END,
            weekdays: WeekdayMask::all(),
            snap_minutes: DEFAULT_SNAP_MINUTES,
        }
    }
}

impl SwimlaneSetting {
    /// Validate the working-hours window and snap granularity.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !hhmm::is_valid(self.day_start) || !hhmm::is_valid(self.day_end) {
            return Err(CoreError::Validation(format!(
                "Working hours must be valid times, got {} and {}",
                self.day_start, self.day_end
            )));
        }
        if self.day_start >= self.day_end {
            return Err(CoreError::Validation(format!(
                "Working hours must end after they start ({} - {})",
                hhmm::decode(self.day_start),
                hhmm::decode(self.day_end)
            )));
        }
        if !SNAP_CHOICES.contains(&self.snap_minutes) {
            return Err(CoreError::Validation(format!(
                "Snap granularity must be one of {SNAP_CHOICES:?} minutes"
            )));
        }
        Ok(())
    }

    /// Slot start times across the working-hours window.
    pub fn time_slots(&self) -> Vec<Hhmm> {
        if self.snap_minutes <= 0 {
            return Vec::new();
        }
        let end = hhmm::to_minutes(self.day_end);
        let mut slots = Vec::new();
        let mut cursor = hhmm::to_minutes(self.day_start);
        while cursor < end {
            slots.push(hhmm::from_minutes(cursor));
            cursor += self.snap_minutes;
        }
        slots
    }

    /// Visible dates for a range under this setting's weekday mask.
    pub fn date_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        build_date_range(start, end, &self.weekdays)
    }
}
