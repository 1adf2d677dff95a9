//! Sleep/wake inference from long AFK runs.
//!
//! An AFK event at least [`DEFAULT_SLEEP_MIN_SECS`] long is taken as a sleep
//! span: its start marks falling asleep on the start's local date, its end
//! marks waking on the end's local date. When a date collects several
//! candidates the earliest minute-of-day wins.

use std::collections::HashMap;

use chrono::{Duration, FixedOffset, NaiveDate};

use crate::provider::types::{AfkEvent, AfkStatus};
use crate::timeline::{local_date, local_minute_of_day};

/// Minimum AFK duration considered sleep: 3 hours.
pub const DEFAULT_SLEEP_MIN_SECS: f64 = 3.0 * 3600.0;

/// Inferred sleep/wake minutes for one local date. Either side may be absent
/// when no qualifying span touched that date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailySleepWake {
    pub date: NaiveDate,
    /// Minute-of-day in [0, 1440).
    pub wake_minutes: Option<u32>,
    pub sleep_minutes: Option<u32>,
}

/// Per-window sleep summary: means over days that have a value, plus one
/// record per requested date.
#[derive(Debug, Clone, PartialEq)]
pub struct SleepWakeSummary {
    pub avg_wake_minutes: Option<f64>,
    pub avg_sleep_minutes: Option<f64>,
    pub records: Vec<DailySleepWake>,
}

/// Derive mean wake/sleep minutes from long AFK runs.
pub fn analyze_sleep(
    events: &[AfkEvent],
    date_keys: &[NaiveDate],
    offset: FixedOffset,
    min_secs: f64,
) -> SleepWakeSummary {
    let mut sleep_by_date: HashMap<NaiveDate, u32> = HashMap::new();
    let mut wake_by_date: HashMap<NaiveDate, u32> = HashMap::new();

    for event in events {
        if event.status != AfkStatus::Afk || event.duration_secs < min_secs {
            continue;
        }

        let start = event.timestamp;
        let end = start + Duration::milliseconds((event.duration_secs * 1000.0).round() as i64);

        let sleep_date = local_date(start, offset);
        let sleep_minute = local_minute_of_day(start, offset);
        sleep_by_date
            .entry(sleep_date)
            .and_modify(|m| *m = (*m).min(sleep_minute))
            .or_insert(sleep_minute);

        let wake_date = local_date(end, offset);
        let wake_minute = local_minute_of_day(end, offset);
        wake_by_date
            .entry(wake_date)
            .and_modify(|m| *m = (*m).min(wake_minute))
            .or_insert(wake_minute);
    }

    let records: Vec<DailySleepWake> = date_keys
        .iter()
        .map(|date| DailySleepWake {
            date: *date,
            wake_minutes: wake_by_date.get(date).copied(),
            sleep_minutes: sleep_by_date.get(date).copied(),
        })
        .collect();

    SleepWakeSummary {
        avg_wake_minutes: mean(records.iter().filter_map(|r| r.wake_minutes)),
        avg_sleep_minutes: mean(records.iter().filter_map(|r| r.sleep_minutes)),
        records,
    }
}

/// Arithmetic mean; days without a value stay out of the divisor.
fn mean(values: impl Iterator<Item = u32>) -> Option<f64> {
    let values: Vec<u32> = values.collect();
    if values.is_empty() {
        return None;
    }
    Some(values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64)
}

/// Render minutes-of-day as `HH:MM` for reports.
pub fn format_minutes(minutes: f64) -> String {
    let m = minutes.round() as u32 % 1440;
    format!("{:02}:{:02}", m / 60, m % 60)
}
