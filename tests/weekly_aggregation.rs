//! Integration tests for the multi-day aggregation path: date keys, hourly
//! binning, and sleep inference working together over one event stream.

use aw_analyzer::provider::types::{AfkEvent, AfkStatus};
use aw_analyzer::timeline::binner::bin_afk_events;
use aw_analyzer::timeline::sleep::{analyze_sleep, DEFAULT_SLEEP_MIN_SECS};
use aw_analyzer::timeline::build_date_keys;
use chrono::{FixedOffset, NaiveDate};

fn jst() -> FixedOffset {
    FixedOffset::east_opt(9 * 3600).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn event(ts: &str, secs: f64, status: AfkStatus) -> AfkEvent {
    AfkEvent {
        timestamp: ts.parse().unwrap(),
        duration_secs: secs,
        status,
    }
}

#[test]
fn midnight_straddling_event_splits_between_hours() {
    // 15:30Z Dec 31 is 00:30 JST Jan 1; the hour splits evenly.
    let events = vec![event("2025-12-31T15:30:00Z", 3600.0, AfkStatus::NotAfk)];
    let bins = bin_afk_events(&events, &[date(2026, 1, 1)], jst());

    assert_eq!(bins[0].hours[0].active_seconds, 1800.0);
    assert_eq!(bins[0].hours[1].active_seconds, 1800.0);
}

#[test]
fn binner_conserves_clipped_durations() {
    let keys = vec![date(2026, 1, 5), date(2026, 1, 6), date(2026, 1, 7)];
    // Non-overlapping spans; the last one leaks past the window's end.
    let events = vec![
        event("2026-01-04T15:00:00Z", 7200.0, AfkStatus::NotAfk), // Jan 5 JST 00:00-02:00
        event("2026-01-05T00:00:00Z", 3600.0, AfkStatus::Afk),    // Jan 5 JST 09:00-10:00
        event("2026-01-06T10:00:00Z", 1800.0, AfkStatus::NotAfk), // Jan 6 JST 19:00-19:30
        event("2026-01-07T14:00:00Z", 7200.0, AfkStatus::NotAfk), // Jan 7 23:00 - Jan 8 01:00 JST
    ];
    let bins = bin_afk_events(&events, &keys, jst());

    let binned: f64 = bins.iter().map(|d| d.active_total() + d.afk_total()).sum();
    // 7200 + 3600 + 1800 fully inside, plus one clipped hour of the last span.
    assert_eq!(binned, 7200.0 + 3600.0 + 1800.0 + 3600.0);
}

#[test]
fn binner_output_follows_key_order() {
    let keys = build_date_keys("2026-01-10T01:00:00Z".parse().unwrap(), 7, jst());
    assert_eq!(keys.len(), 7);
    assert_eq!(*keys.last().unwrap(), date(2026, 1, 9)); // ends yesterday

    let bins = bin_afk_events(&[], &keys, jst());
    let out: Vec<NaiveDate> = bins.iter().map(|b| b.date).collect();
    assert_eq!(out, keys);
}

#[test]
fn overnight_afk_produces_sleep_and_wake_rows() {
    // Asleep 23:45 JST Jan 5, awake 06:45 JST Jan 6.
    let events = vec![
        event("2026-01-05T14:45:00Z", 7.0 * 3600.0, AfkStatus::Afk),
        // Daytime AFK below the sleep threshold: ignored.
        event("2026-01-06T03:00:00Z", 1800.0, AfkStatus::Afk),
    ];
    let keys = vec![date(2026, 1, 5), date(2026, 1, 6)];
    let summary = analyze_sleep(&events, &keys, jst(), DEFAULT_SLEEP_MIN_SECS);

    assert_eq!(summary.records[0].sleep_minutes, Some(23 * 60 + 45));
    assert_eq!(summary.records[1].wake_minutes, Some(6 * 60 + 45));
    assert_eq!(summary.avg_sleep_minutes, Some((23 * 60 + 45) as f64));
    assert_eq!(summary.avg_wake_minutes, Some((6 * 60 + 45) as f64));
}

#[test]
fn sleep_and_binner_agree_on_event_filtering() {
    // An unrecognized status contributes to neither analysis.
    let weird = event("2026-01-05T14:45:00Z", 8.0 * 3600.0, AfkStatus::Other);
    let keys = vec![date(2026, 1, 5), date(2026, 1, 6)];

    let bins = bin_afk_events(std::slice::from_ref(&weird), &keys, jst());
    assert!(bins.iter().all(|d| d.active_total() + d.afk_total() == 0.0));

    let summary = analyze_sleep(&[weird], &keys, jst(), DEFAULT_SLEEP_MIN_SECS);
    assert!(summary.avg_sleep_minutes.is_none());
    assert!(summary.avg_wake_minutes.is_none());
}

#[test]
fn date_keys_clamp_and_exclude_today() {
    let now = "2026-01-10T01:00:00Z".parse().unwrap(); // Jan 10 JST
    let one = build_date_keys(now, 0, jst());
    assert_eq!(one, vec![date(2026, 1, 9)]);

    let month = build_date_keys(now, 99, jst());
    assert_eq!(month.len(), 31);
    assert!(!month.contains(&date(2026, 1, 10)));
}
