//! Tick engine — evaluates jobs in order and dispatches at most one
//! notification per job per tick, gated by cooldowns.
//!
//! The contract is deliberately rigid so a tick is reproducible from its
//! inputs: `ctx.now` is read once per invocation and never refreshed, jobs
//! run strictly sequentially, and every state transition happens at a fixed
//! point in the per-job lifecycle.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

use crate::config::AppConfig;
use crate::error::{AgentError, SchedulerError};
use crate::notify::Notifier;
use crate::provider::ActivityProvider;
use crate::state::StateStore;

/// Everything a job may consult during one tick. The same context instance is
/// threaded through every job in order.
pub struct JobContext {
    /// Wall time at tick start; never re-read within the tick.
    pub now: DateTime<Utc>,
    pub state: StateStore,
    pub config: AppConfig,
    pub provider: ActivityProvider,
}

impl JobContext {
    pub fn new(now: DateTime<Utc>, state: StateStore, config: AppConfig) -> Self {
        let provider = ActivityProvider::new(config.aw.base_url.clone());
        Self {
            now,
            state,
            config,
            provider,
        }
    }

    pub fn tz_offset(&self) -> FixedOffset {
        self.config.tz_offset()
    }

    /// Today's local calendar date under the configured offset.
    pub fn local_today(&self) -> NaiveDate {
        crate::timeline::local_date(self.now, self.tz_offset())
    }
}

/// What a job's `run` produced.
#[derive(Debug, Clone, PartialEq)]
pub enum JobResult {
    /// Nothing to tell the user this tick.
    NoNotify { reason: String },
    /// Deliver a local notification, optionally recording a cooldown.
    Notify {
        title: String,
        body: String,
        cooldown_key: Option<String>,
        cooldown_ms: Option<i64>,
    },
}

impl JobResult {
    pub fn no_notify(reason: impl Into<String>) -> Self {
        Self::NoNotify {
            reason: reason.into(),
        }
    }

    pub fn notify(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Notify {
            title: title.into(),
            body: body.into(),
            cooldown_key: None,
            cooldown_ms: None,
        }
    }

    pub fn notify_with_cooldown(
        title: impl Into<String>,
        body: impl Into<String>,
        cooldown_key: impl Into<String>,
        cooldown_ms: i64,
    ) -> Self {
        Self::Notify {
            title: title.into(),
            body: body.into(),
            cooldown_key: Some(cooldown_key.into()),
            cooldown_ms: Some(cooldown_ms),
        }
    }
}

/// A named unit of scheduling.
#[async_trait]
pub trait Job: Send + Sync {
    fn id(&self) -> &str;

    /// Cheap gate consulted before `run`. A failure here skips the job but
    /// never the tick.
    fn should_run(&self, ctx: &JobContext) -> Result<bool, AgentError>;

    /// Produce this tick's outcome. A failure here aborts the tick — run
    /// failures indicate data-layer problems likely affecting every job.
    async fn run(&self, ctx: &mut JobContext) -> Result<JobResult, AgentError>;
}

/// Outcome of one tick, job ids in evaluation order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickResult {
    pub executed: Vec<String>,
    pub notified: Vec<String>,
    pub skipped: Vec<String>,
}

/// State key for a job's cooldown timestamp.
pub fn cooldown_key(job_id: &str) -> String {
    format!("cooldown:{job_id}")
}

/// State key for a job's daily marker on `date`.
pub fn daily_marker_key(job_id: &str, date: NaiveDate) -> String {
    format!("daily:{job_id}:{date}")
}

/// Evaluate `jobs` in order against `ctx`, dispatching through `notifier`.
pub async fn run_tick(
    ctx: &mut JobContext,
    notifier: &dyn Notifier,
    jobs: &[Box<dyn Job>],
) -> Result<TickResult, SchedulerError> {
    let mut result = TickResult::default();
    let now_ms = ctx.now.timestamp_millis();

    for job in jobs {
        let job_id = job.id().to_string();

        match job.should_run(ctx) {
            Ok(true) => {}
            Ok(false) => {
                log::debug!("[{job_id}] skipped: shouldRun=false");
                result.skipped.push(job_id);
                continue;
            }
            Err(e) => {
                log::warn!("[{job_id}] shouldRun failed: {e} — skipping");
                result.skipped.push(job_id);
                continue;
            }
        }

        let outcome = match job.run(ctx).await {
            Ok(outcome) => outcome,
            Err(source) => {
                return Err(SchedulerError::Provider {
                    job_id,
                    source,
                });
            }
        };
        result.executed.push(job_id.clone());

        let (title, body, cd_key, cd_ms) = match outcome {
            JobResult::NoNotify { reason } => {
                log::debug!("[{job_id}] no notification: {reason}");
                continue;
            }
            JobResult::Notify {
                title,
                body,
                cooldown_key,
                cooldown_ms,
            } => (title, body, cooldown_key, cooldown_ms),
        };

        // Cooldown gate: strict `<`, so a notification exactly cooldown_ms
        // later goes through. Missing or unreadable timestamps fail open.
        if let (Some(key), Some(ms)) = (cd_key.as_deref(), cd_ms) {
            if let Some(last) = ctx.state.get_time(key) {
                if now_ms - last < ms {
                    log::info!(
                        "[{job_id}] suppressed by cooldown ({}ms of {}ms elapsed)",
                        now_ms - last,
                        ms
                    );
                    continue;
                }
            }
        }

        if let Err(source) = notifier.notify(&title, &body).await {
            return Err(SchedulerError::Notifier { job_id, source });
        }
        result.notified.push(job_id.clone());

        // Cooldown is post-success: only a delivered notification moves the
        // timestamp. A failed state write must not un-send it.
        if let Some(key) = cd_key.as_deref() {
            if let Err(e) = ctx.state.set_time(key, now_ms) {
                log::error!("[{job_id}] cooldown write failed: {e}");
            }
        }
    }

    Ok(result)
}
