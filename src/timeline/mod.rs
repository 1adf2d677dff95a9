//! Local-date arithmetic over a fixed UTC offset.
//!
//! All timezone reasoning in the agent goes through these helpers — nothing
//! else may consult the process-wide local timezone. The offset is a
//! parameter everywhere (JST, +09:00, in the default configuration).

pub mod binner;
pub mod sleep;

use chrono::{DateTime, Days, FixedOffset, NaiveDate, Utc};

/// Bounds for multi-day aggregation windows.
pub const MIN_WINDOW_DAYS: u32 = 1;
pub const MAX_WINDOW_DAYS: u32 = 31;

/// The local calendar date of a UTC instant under `offset`.
pub fn local_date(instant: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    instant.with_timezone(&offset).date_naive()
}

/// Minute-of-day (0..1440) of a UTC instant under `offset`.
pub fn local_minute_of_day(instant: DateTime<Utc>, offset: FixedOffset) -> u32 {
    use chrono::Timelike;
    let local = instant.with_timezone(&offset);
    local.hour() * 60 + local.minute()
}

/// The last `days` local dates ending yesterday, oldest first.
///
/// `now` itself is excluded — multi-day reports cover completed days only.
/// `days` is clamped to `[MIN_WINDOW_DAYS, MAX_WINDOW_DAYS]`.
pub fn build_date_keys(now: DateTime<Utc>, days: u32, offset: FixedOffset) -> Vec<NaiveDate> {
    let days = days.clamp(MIN_WINDOW_DAYS, MAX_WINDOW_DAYS);
    let today = local_date(now, offset);
    let Some(yesterday) = today.checked_sub_days(Days::new(1)) else {
        return Vec::new();
    };

    (0..days)
        .rev()
        .filter_map(|back| yesterday.checked_sub_days(Days::new(back as u64)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jst() -> FixedOffset {
        FixedOffset::east_opt(9 * 3600).unwrap()
    }

    fn utc(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_local_date_crosses_midnight() {
        // 16:00 UTC on Dec 31 is 01:00 JST on Jan 1.
        assert_eq!(
            local_date(utc("2025-12-31T16:00:00Z"), jst()),
            date(2026, 1, 1)
        );
    }

    #[test]
    fn test_local_minute_of_day() {
        // 15:30 UTC = 00:30 JST.
        assert_eq!(local_minute_of_day(utc("2025-12-31T15:30:00Z"), jst()), 30);
    }

    #[test]
    fn test_date_keys_end_yesterday_oldest_first() {
        // 2026-01-10 10:00 JST.
        let now = utc("2026-01-10T01:00:00Z");
        let keys = build_date_keys(now, 3, jst());
        assert_eq!(
            keys,
            vec![date(2026, 1, 7), date(2026, 1, 8), date(2026, 1, 9)]
        );
    }

    #[test]
    fn test_date_keys_clamped() {
        let now = utc("2026-01-10T01:00:00Z");
        assert_eq!(build_date_keys(now, 0, jst()).len(), 1);
        assert_eq!(build_date_keys(now, 500, jst()).len(), 31);
    }

    #[test]
    fn test_date_keys_respect_offset() {
        // 23:30 UTC Jan 9 is already Jan 10 in JST, so "yesterday" is Jan 9.
        let now = utc("2026-01-09T23:30:00Z");
        let keys = build_date_keys(now, 1, jst());
        assert_eq!(keys, vec![date(2026, 1, 9)]);
    }
}
