//! The built-in job library.
//!
//! Jobs are constructed once at CLI startup from [`JobsConfig`] and stay
//! read-only for the tick. Each implements its own trigger discipline on top
//! of the scheduler's cooldown gate: the daily pair uses date-keyed markers,
//! the continuous-work alert uses a cooldown.

mod continuous_work;
mod daily_report;
mod daily_summary;

pub use continuous_work::ContinuousWorkJob;
pub use daily_report::DailyReportJob;
pub use daily_summary::DailySummaryJob;

use chrono::Timelike;

use crate::config::JobsConfig;
use crate::scheduler::{daily_marker_key, Job, JobContext};

/// The standard tick roster, in evaluation order.
pub fn default_jobs(config: &JobsConfig) -> Vec<Box<dyn Job>> {
    vec![
        Box::new(DailySummaryJob::new(
            config.summary_hour,
            config.summary_minute,
        )),
        Box::new(ContinuousWorkJob::new(
            config.continuous_threshold_secs,
            config.continuous_cooldown_mins * 60 * 1000,
        )),
        Box::new(DailyReportJob::new(config.report_hour, config.report_minute)),
    ]
}

/// True once local time reaches `hour:minute`.
pub(crate) fn at_or_after(ctx: &JobContext, hour: u32, minute: u32) -> bool {
    let local = ctx.now.with_timezone(&ctx.tz_offset());
    (local.hour(), local.minute()) >= (hour, minute)
}

/// True when the job already emitted today: the daily marker holds today's
/// date. The marker value is compared, not just its presence, so stale
/// markers from previous days never suppress a fresh emission.
pub(crate) fn emitted_today(ctx: &JobContext, job_id: &str) -> bool {
    let today = ctx.local_today();
    let key = daily_marker_key(job_id, today);
    ctx.state
        .get(&key)
        .and_then(|v| v.as_str())
        .map(|v| v == today.to_string())
        .unwrap_or(false)
}

/// Record today's emission. Write failures are logged, not fatal — losing a
/// marker risks one duplicate notification, not a broken tick.
pub(crate) fn write_daily_marker(ctx: &mut JobContext, job_id: &str) {
    let today = ctx.local_today();
    let key = daily_marker_key(job_id, today);
    if let Err(e) = ctx.state.set(&key, serde_json::Value::from(today.to_string())) {
        log::error!("[{job_id}] daily marker write failed: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::state::StateStore;

    fn ctx_at(now: &str, dir: &std::path::Path) -> JobContext {
        JobContext::new(
            now.parse().unwrap(),
            StateStore::open(dir.join("state.json")),
            AppConfig::default(),
        )
    }

    #[test]
    fn test_default_jobs_order() {
        let jobs = default_jobs(&JobsConfig::default());
        let ids: Vec<&str> = jobs.iter().map(|j| j.id()).collect();
        assert_eq!(
            ids,
            vec!["daily-summary", "continuous-work-alert", "daily-report"]
        );
    }

    #[test]
    fn test_at_or_after_uses_local_time() {
        let dir = tempfile::tempdir().unwrap();
        // 01:00 UTC = 10:00 JST.
        let ctx = ctx_at("2026-01-02T01:00:00Z", dir.path());
        assert!(at_or_after(&ctx, 9, 0));
        assert!(at_or_after(&ctx, 10, 0));
        assert!(!at_or_after(&ctx, 10, 1));
        assert!(!at_or_after(&ctx, 11, 0));
    }

    #[test]
    fn test_daily_marker_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = ctx_at("2026-01-02T01:00:00Z", dir.path());
        assert!(!emitted_today(&ctx, "daily-summary"));

        write_daily_marker(&mut ctx, "daily-summary");
        assert!(emitted_today(&ctx, "daily-summary"));
        assert_eq!(
            ctx.state
                .get("daily:daily-summary:2026-01-02")
                .and_then(|v| v.as_str()),
            Some("2026-01-02")
        );
    }

    #[test]
    fn test_stale_marker_does_not_suppress() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = ctx_at("2026-01-02T01:00:00Z", dir.path());
        write_daily_marker(&mut ctx, "daily-summary");

        // Next local day: yesterday's marker is irrelevant.
        ctx.now = "2026-01-03T01:00:00Z".parse().unwrap();
        assert!(!emitted_today(&ctx, "daily-summary"));
    }
}
