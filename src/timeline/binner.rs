//! Hourly activity binning in a target timezone.
//!
//! Pure: raw AFK events in, per-day × per-hour active/AFK seconds out. Each
//! event is a half-open UTC span projected by a fixed offset and clipped to
//! successive (date, hour) bins, so a span crossing an hour boundary splits
//! its contribution proportionally. Seconds are never attributed outside the
//! requested dates.

use std::collections::HashMap;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Timelike, Utc};

use crate::provider::types::{AfkEvent, AfkStatus};

/// One hour's worth of activity.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HourBucket {
    pub active_seconds: f64,
    pub afk_seconds: f64,
}

/// 24 hourly buckets for one local date.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyHourlyBuckets {
    pub date: NaiveDate,
    pub hours: [HourBucket; 24],
}

impl DailyHourlyBuckets {
    fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            hours: [HourBucket::default(); 24],
        }
    }

    /// Total active seconds across the day.
    pub fn active_total(&self) -> f64 {
        self.hours.iter().map(|h| h.active_seconds).sum()
    }

    /// Total AFK seconds across the day.
    pub fn afk_total(&self) -> f64 {
        self.hours.iter().map(|h| h.afk_seconds).sum()
    }
}

/// Bin AFK events into hourly buckets for the listed dates.
///
/// Events with a status outside {afk, not-afk} are discarded. Dates not in
/// `date_keys` receive no contributions; listed dates with no events keep 24
/// zero bins. Output order matches `date_keys`.
pub fn bin_afk_events(
    events: &[AfkEvent],
    date_keys: &[NaiveDate],
    offset: FixedOffset,
) -> Vec<DailyHourlyBuckets> {
    let mut days: Vec<DailyHourlyBuckets> =
        date_keys.iter().map(|d| DailyHourlyBuckets::empty(*d)).collect();
    let index: HashMap<NaiveDate, usize> = date_keys
        .iter()
        .enumerate()
        .map(|(i, d)| (*d, i))
        .collect();

    for event in events {
        let active = match event.status {
            AfkStatus::NotAfk => true,
            AfkStatus::Afk => false,
            AfkStatus::Other => continue,
        };
        if event.duration_secs <= 0.0 {
            continue;
        }

        let end = event.timestamp + duration_from_secs(event.duration_secs);
        let mut cursor = event.timestamp;

        while cursor < end {
            let chunk_end = end.min(next_hour_boundary(cursor, offset));
            let seconds = (chunk_end - cursor).num_milliseconds() as f64 / 1000.0;

            let local = cursor.with_timezone(&offset);
            if let Some(&day_idx) = index.get(&local.date_naive()) {
                let bucket = &mut days[day_idx].hours[local.hour() as usize];
                if active {
                    bucket.active_seconds += seconds;
                } else {
                    bucket.afk_seconds += seconds;
                }
            }

            cursor = chunk_end;
        }
    }

    days
}

fn duration_from_secs(secs: f64) -> Duration {
    Duration::milliseconds((secs * 1000.0).round() as i64)
}

/// The UTC instant of the next local hour boundary strictly after `instant`.
fn next_hour_boundary(instant: DateTime<Utc>, offset: FixedOffset) -> DateTime<Utc> {
    let local = instant.with_timezone(&offset);
    let truncated = local
        .with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(local);
    (truncated + Duration::hours(1)).with_timezone(&Utc)
}
