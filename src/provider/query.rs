//! Server-side query composition.
//!
//! The activity server evaluates a small statement language; the exact text
//! of these programs is an external-interface contract and must stay
//! bit-compatible with the server's primitives: `query_bucket`,
//! `filter_keyvals`, `filter_period_intersect`, `merge_events_by_keys`,
//! `sort_by_duration`, `sort_by_timestamp`. Statements are `;`-terminated
//! with a final `RETURN = ...`.

use chrono::{Days, NaiveDate};

use super::types::TimeRange;

/// Encode a range as the server's half-open `YYYY-MM-DD/YYYY-MM-DD` period.
/// The supplied end date is inclusive, the wire end is exclusive, so one day
/// is added.
pub fn encode_timeperiod(range: &TimeRange) -> String {
    let end_exclusive = range
        .end
        .checked_add_days(Days::new(1))
        .unwrap_or(range.end);
    format!(
        "{}/{}",
        range.start.format("%Y-%m-%d"),
        end_exclusive.format("%Y-%m-%d")
    )
}

/// Parse a `YYYY-MM-DD` date key.
pub fn parse_date_key(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Window events intersected with not-AFK, merged by app, longest first.
pub fn work_metrics_query(window_bucket: &str, afk_bucket: &str) -> String {
    [
        format!("events = query_bucket(\"{window_bucket}\");"),
        format!("not_afk = query_bucket(\"{afk_bucket}\");"),
        "not_afk = filter_keyvals(not_afk, \"status\", [\"not-afk\"]);".into(),
        "events = filter_period_intersect(events, not_afk);".into(),
        "events = merge_events_by_keys(events, [\"app\"]);".into(),
        "events = sort_by_duration(events);".into(),
        "RETURN = events;".into(),
    ]
    .join("\n")
}

/// AFK events merged by status, longest first.
pub fn afk_metrics_query(afk_bucket: &str) -> String {
    [
        format!("events = query_bucket(\"{afk_bucket}\");"),
        "events = filter_keyvals(events, \"status\", [\"afk\", \"not-afk\"]);".into(),
        "events = merge_events_by_keys(events, [\"status\"]);".into(),
        "events = sort_by_duration(events);".into(),
        "RETURN = events;".into(),
    ]
    .join("\n")
}

/// Raw AFK events in timestamp order, for binning and sleep inference.
pub fn afk_events_query(afk_bucket: &str) -> String {
    [
        format!("events = query_bucket(\"{afk_bucket}\");"),
        "events = filter_keyvals(events, \"status\", [\"afk\", \"not-afk\"]);".into(),
        "events = sort_by_timestamp(events);".into(),
        "RETURN = events;".into(),
    ]
    .join("\n")
}

/// Editor events intersected with not-AFK, merged by project, longest first.
pub fn editor_projects_query(editor_bucket: &str, afk_bucket: &str) -> String {
    [
        format!("events = query_bucket(\"{editor_bucket}\");"),
        format!("not_afk = query_bucket(\"{afk_bucket}\");"),
        "not_afk = filter_keyvals(not_afk, \"status\", [\"not-afk\"]);".into(),
        "events = filter_period_intersect(events, not_afk);".into(),
        "events = merge_events_by_keys(events, [\"project\"]);".into(),
        "events = sort_by_duration(events);".into(),
        "RETURN = events;".into(),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_timeperiod_end_exclusive() {
        let range = TimeRange::new(date(2026, 1, 10), date(2026, 1, 12));
        assert_eq!(encode_timeperiod(&range), "2026-01-10/2026-01-13");
    }

    #[test]
    fn test_timeperiod_single_day() {
        let range = TimeRange::day(date(2026, 1, 10));
        assert_eq!(encode_timeperiod(&range), "2026-01-10/2026-01-11");
    }

    #[test]
    fn test_timeperiod_crosses_month_boundary() {
        let range = TimeRange::day(date(2026, 1, 31));
        assert_eq!(encode_timeperiod(&range), "2026-01-31/2026-02-01");
    }

    #[test]
    fn test_work_query_shape() {
        let q = work_metrics_query("aw-watcher-window_host", "aw-watcher-afk_host");
        assert!(q.contains("query_bucket(\"aw-watcher-window_host\")"));
        assert!(q.contains("filter_keyvals(not_afk, \"status\", [\"not-afk\"])"));
        assert!(q.contains("merge_events_by_keys(events, [\"app\"])"));
        assert!(q.contains("sort_by_duration"));
        assert!(q.trim_end().ends_with("RETURN = events;"));
    }

    #[test]
    fn test_afk_events_query_sorted_by_timestamp() {
        let q = afk_events_query("aw-watcher-afk_host");
        assert!(q.contains("sort_by_timestamp"));
        assert!(!q.contains("merge_events_by_keys"));
    }

    #[test]
    fn test_editor_query_merges_by_project() {
        let q = editor_projects_query("aw-watcher-vscode_host", "aw-watcher-afk_host");
        assert!(q.contains("merge_events_by_keys(events, [\"project\"])"));
    }

    #[test]
    fn test_parse_date_key() {
        assert_eq!(parse_date_key("2026-03-01"), Some(date(2026, 3, 1)));
        assert_eq!(parse_date_key("garbage"), None);
    }
}
