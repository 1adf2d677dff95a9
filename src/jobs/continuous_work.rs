//! Continuous-work alert — nudges the user after a long unbroken stretch.

use async_trait::async_trait;

use crate::error::AgentError;
use crate::provider::types::TimeRange;
use crate::report::format_duration;
use crate::scheduler::{cooldown_key, Job, JobContext, JobResult};

const JOB_ID: &str = "continuous-work-alert";

/// Checks every tick; the scheduler's cooldown gate keeps it quiet.
pub struct ContinuousWorkJob {
    threshold_secs: u64,
    cooldown_ms: i64,
}

impl ContinuousWorkJob {
    pub fn new(threshold_secs: u64, cooldown_ms: u64) -> Self {
        Self {
            threshold_secs,
            cooldown_ms: cooldown_ms as i64,
        }
    }
}

#[async_trait]
impl Job for ContinuousWorkJob {
    fn id(&self) -> &str {
        JOB_ID
    }

    fn should_run(&self, _ctx: &JobContext) -> Result<bool, AgentError> {
        Ok(true)
    }

    async fn run(&self, ctx: &mut JobContext) -> Result<JobResult, AgentError> {
        let today = ctx.local_today();
        let metrics = ctx
            .provider
            .get_daily_metrics(&TimeRange::day(today))
            .await?;

        if metrics.max_continuous_seconds < self.threshold_secs as f64 {
            return Ok(JobResult::no_notify(format!(
                "longest block {} under threshold {}",
                format_duration(metrics.max_continuous_seconds),
                format_duration(self.threshold_secs as f64),
            )));
        }

        Ok(JobResult::notify_with_cooldown(
            "Time for a break?",
            format!(
                "You've been at it for {} without a pause.",
                format_duration(metrics.max_continuous_seconds)
            ),
            cooldown_key(JOB_ID),
            self.cooldown_ms,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::state::StateStore;

    #[test]
    fn test_always_eligible() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = JobContext::new(
            "2026-01-02T01:00:00Z".parse().unwrap(),
            StateStore::open(dir.path().join("state.json")),
            AppConfig::default(),
        );
        let job = ContinuousWorkJob::new(3600, 3_600_000);
        assert!(job.should_run(&ctx).unwrap());
    }
}
