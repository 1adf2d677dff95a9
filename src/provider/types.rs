//! Canonical metric shapes — the only data jobs and reports ever see.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Inclusive local-date range for a provider query. The wire encoding adds
/// one day to `end` because the server treats the period end as exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl TimeRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// A single-day range.
    pub fn day(date: NaiveDate) -> Self {
        Self { start: date, end: date }
    }
}

/// Per-app usage, seconds of active window time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppUsage {
    pub app: String,
    pub seconds: f64,
}

/// Normalized daily work metrics.
///
/// `afk_seconds` and `night_work_seconds` are zero when produced by the
/// window-events query; callers needing them query AFK metrics separately or
/// derive them from hourly bins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyMetrics {
    pub work_seconds: f64,
    pub afk_seconds: f64,
    pub night_work_seconds: f64,
    /// `max(duration)` over the merged-by-app event stream — an approximation
    /// of the longest continuous session, computed this way for
    /// reproducibility.
    pub max_continuous_seconds: f64,
    /// Top apps by active seconds, descending, ties broken by app name.
    /// At most 5 entries.
    pub top_apps: Vec<AppUsage>,
}

/// Aggregate AFK split for a range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AfkMetrics {
    pub afk_seconds: f64,
    pub not_afk_seconds: f64,
}

/// AFK watcher status. Anything the watcher reports outside afk/not-afk is
/// carried as `Other` and ignored by the binner and the sleep analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AfkStatus {
    Afk,
    NotAfk,
    Other,
}

impl AfkStatus {
    pub fn parse(s: &str) -> Self {
        match s {
            "afk" => Self::Afk,
            "not-afk" => Self::NotAfk,
            _ => Self::Other,
        }
    }
}

/// One AFK watcher event: a half-open span `[timestamp, timestamp+duration)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AfkEvent {
    pub timestamp: DateTime<Utc>,
    pub duration_secs: f64,
    pub status: AfkStatus,
}

/// Per-project editor usage, seconds, descending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectUsage {
    pub project: String,
    pub seconds: f64,
}

/// Editor project ranking. Empty when no editor watcher bucket exists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditorProjectMetrics {
    pub projects: Vec<ProjectUsage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_afk_status_parse() {
        assert_eq!(AfkStatus::parse("afk"), AfkStatus::Afk);
        assert_eq!(AfkStatus::parse("not-afk"), AfkStatus::NotAfk);
        assert_eq!(AfkStatus::parse("unknown"), AfkStatus::Other);
        assert_eq!(AfkStatus::parse(""), AfkStatus::Other);
    }

    #[test]
    fn test_time_range_day() {
        let d = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        let range = TimeRange::day(d);
        assert_eq!(range.start, d);
        assert_eq!(range.end, d);
    }
}
