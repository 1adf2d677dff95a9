//! Daily summary — one local toast per day recapping yesterday.

use async_trait::async_trait;
use chrono::Days;

use crate::error::AgentError;
use crate::provider::types::TimeRange;
use crate::report::format_duration;
use crate::scheduler::{Job, JobContext, JobResult};

use super::{at_or_after, emitted_today, write_daily_marker};

const JOB_ID: &str = "daily-summary";

/// Fires once per local date, at or after the configured time.
pub struct DailySummaryJob {
    target_hour: u32,
    target_minute: u32,
}

impl DailySummaryJob {
    pub fn new(target_hour: u32, target_minute: u32) -> Self {
        Self {
            target_hour,
            target_minute,
        }
    }
}

#[async_trait]
impl Job for DailySummaryJob {
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

        let title = format!("Yesterday: {} active", format_duration(metrics.work_seconds));
        let mut body = format!(
            "Longest block {}",
            format_duration(metrics.max_continuous_seconds)
        );
        if let Some(top) = metrics.top_apps.first() {
            body.push_str(&format!(
                " · top app {} ({})",
                top.app,
                format_duration(top.seconds)
            ));
        }

        write_daily_marker(ctx, JOB_ID);

        Ok(JobResult::notify(title, body))
    }
}
