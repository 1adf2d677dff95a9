//! Daily report — rich block message to chat, confirmed by a local toast.
//!
//! The job succeeds as long as the metrics arrive: analyzer failures drop to
//! the deterministic fallback, chat failures are logged and swallowed, and
//! the daily marker is written either way so the report is generated exactly
//! once per day.

use async_trait::async_trait;
use chrono::Days;

use crate::analyzer::{fallback::fallback_daily, AnalysisResult, Analyzer};
use crate::error::AgentError;
use crate::provider::types::{DailyMetrics, TimeRange};
use crate::report::{build_daily_report, format_duration};
use crate::scheduler::{Job, JobContext, JobResult};
use crate::slack::webhook::SlackWebhook;

use super::{at_or_after, emitted_today, write_daily_marker};

const JOB_ID: &str = "daily-report";

/// Fires once per local date, at or after the configured time.
pub struct DailyReportJob {
    target_hour: u32,
    target_minute: u32,
}

impl DailyReportJob {
    pub fn new(target_hour: u32, target_minute: u32) -> Self {
        Self {
            target_hour,
            target_minute,
        }
    }

    async fn analyze(&self, ctx: &JobContext, date: chrono::NaiveDate, metrics: &DailyMetrics) -> AnalysisResult {
        if ctx.config.llm.api_key.is_none() {
            return fallback_daily(metrics);
        }
        let analyzer = Analyzer::new(ctx.config.llm.clone());
        match analyzer.generate_daily(date, metrics).await {
            Ok(analysis) => analysis,
            Err(e) => {
                log::warn!("[{JOB_ID}] analyzer failed: {e} — using fallback rules");
                fallback_daily(metrics)
            }
        }
    }
}

#[async_trait]
impl Job for DailyReportJob {
    fn id(&self) -> &str {
        JOB_ID
    }

    fn should_run(&self, ctx: &JobContext) -> Result<bool, AgentError> {
        Ok(at_or_after(ctx, self.target_hour, self.target_minute) && !emitted_today(ctx, JOB_ID))
    }

    async fn run(&self, ctx: &mut JobContext) -> Result<JobResult, AgentError> {
        let yesterday = ctx
            .local_today()
            .checked_sub_days(Days::new(1))
            .ok_or_else(|| AgentError::Parse("date underflow computing yesterday".into()))?;

        let metrics = ctx
            .provider
            .get_daily_metrics(&TimeRange::day(yesterday))
            .await?;

        let analysis = self.analyze(ctx, yesterday, &metrics).await;

        let blocks = build_daily_report(
            yesterday,
            &metrics,
            Some(&analysis),
            Some((ctx.config.aw.base_url.as_str(), ctx.config.aw.hostname.as_str())),
        );

        // Chat delivery is best-effort: the report still counts as generated
        // and the local toast still confirms it.
        match &ctx.config.slack.webhook_url {
            Some(url) => {
                let webhook = SlackWebhook::new(url.clone());
                let fallback_text = format!("Daily report for {yesterday}");
                if let Err(e) = webhook.post_blocks(&fallback_text, &blocks).await {
                    log::error!("[{JOB_ID}] chat delivery failed: {e}");
                }
            }
            None => log::debug!("[{JOB_ID}] no webhook configured, skipping chat delivery"),
        }

        write_daily_marker(ctx, JOB_ID);

        Ok(JobResult::notify(
            format!("Daily report: {yesterday}"),
            format!(
                "{} active, longest block {}.",
                format_duration(metrics.work_seconds),
                format_duration(metrics.max_continuous_seconds)
            ),
        ))
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
    fn test_marker_gates_second_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = ctx_at("2026-01-02T01:00:00Z", dir.path());
        let job = DailyReportJob::new(9, 0);
        assert!(job.should_run(&ctx).unwrap());

        write_daily_marker(&mut ctx, JOB_ID);
        assert!(!job.should_run(&ctx).unwrap());
    }

    #[tokio::test]
    async fn test_analyze_without_key_uses_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ctx_at("2026-01-02T01:00:00Z", dir.path());
        let job = DailyReportJob::new(9, 0);
        let metrics = DailyMetrics {
            work_seconds: 28800.0,
            max_continuous_seconds: 5400.0,
            ..Default::default()
        };
        let date = chrono::NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let analysis = job.analyze(&ctx, date, &metrics).await;
        assert_eq!(analysis, fallback_daily(&metrics));
    }
}
