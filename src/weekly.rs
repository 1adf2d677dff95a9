//! Weekly report pipeline — multi-day aggregation, heatmap, analysis,
//! delivery.
//!
//! Invoked by the `weekly-report` verb, not by the tick scheduler. Provider
//! calls run sequentially and each result stands alone; per-day activity
//! totals come from the hourly bins rather than per-day server queries.

use chrono::{DateTime, Utc};

use crate::analyzer::{fallback::fallback_weekly, Analyzer, WeeklyAnalysisResult, WeeklyInput};
use crate::config::AppConfig;
use crate::error::AgentError;
use crate::provider::types::TimeRange;
use crate::provider::ActivityProvider;
use crate::report::heatmap::render_heatmap;
use crate::report::{build_weekly_report, choose_weekly_image, weekly_report_mrkdwn};
use crate::slack::upload::{SlackUploader, UploadRequest};
use crate::slack::webhook::SlackWebhook;
use crate::timeline::binner::{bin_afk_events, DailyHourlyBuckets};
use crate::timeline::sleep::{analyze_sleep, DEFAULT_SLEEP_MIN_SECS};
use crate::timeline::build_date_keys;

/// A day needs at least this much active time to count toward the per-day
/// average (1 hour).
const DATA_THRESHOLD_SECS: f64 = 3600.0;

/// Run the full weekly pipeline for the `days` completed days before `now`.
pub async fn run_weekly_report(
    config: &AppConfig,
    now: DateTime<Utc>,
    days: u32,
) -> Result<(), AgentError> {
    if config.slack.webhook_url.is_none() && config.slack.bot_token.is_none() {
        return Err(AgentError::Config(
            "weekly report needs SLACK_WEBHOOK_URL or SLACK_BOT_TOKEN".into(),
        ));
    }

    let offset = config.tz_offset();
    let date_keys = build_date_keys(now, days, offset);
    let (Some(&start), Some(&end)) = (date_keys.first(), date_keys.last()) else {
        return Err(AgentError::Config("empty report window".into()));
    };
    let range = TimeRange::new(start, end);

    let provider = ActivityProvider::new(config.aw.base_url.clone());

    // Sequential, independent provider calls.
    let afk_events = provider.get_afk_events(&range).await?;
    let afk_metrics = provider.get_afk_metrics(&range).await?;
    let editor = provider.get_editor_project_metrics(&range).await?;

    let bins = bin_afk_events(&afk_events, &date_keys, offset);
    let sleep = analyze_sleep(&afk_events, &date_keys, offset, DEFAULT_SLEEP_MIN_SECS);

    let (days_with_data, avg_per_day) = per_day_average(&bins);
    let input = WeeklyInput {
        start,
        end,
        total_not_afk_seconds: afk_metrics.not_afk_seconds,
        avg_not_afk_seconds_per_day: avg_per_day,
        days_with_data,
        days: date_keys.len(),
        top_projects: editor.projects,
        avg_wake_minutes: sleep.avg_wake_minutes,
        avg_sleep_minutes: sleep.avg_sleep_minutes,
    };

    let analysis = analyze(config, &input).await;
    let svg = render_heatmap(&bins);

    deliver(config, &input, &analysis, svg).await
}

/// Days clearing the data threshold and the mean over exactly those days.
fn per_day_average(bins: &[DailyHourlyBuckets]) -> (usize, f64) {
    let qualifying: Vec<f64> = bins
        .iter()
        .map(DailyHourlyBuckets::active_total)
        .filter(|&total| total >= DATA_THRESHOLD_SECS)
        .collect();
    if qualifying.is_empty() {
        return (0, 0.0);
    }
    let avg = qualifying.iter().sum::<f64>() / qualifying.len() as f64;
    (qualifying.len(), avg)
}

async fn analyze(config: &AppConfig, input: &WeeklyInput) -> WeeklyAnalysisResult {
    if config.llm.api_key.is_none() {
        return fallback_weekly(input);
    }
    let analyzer = Analyzer::new(config.llm.clone());
    match analyzer.generate_weekly(input).await {
        Ok(analysis) => analysis,
        Err(e) => {
            log::warn!("weekly analyzer failed: {e} — using fallback rules");
            fallback_weekly(input)
        }
    }
}

/// Upload the heatmap when a bot token exists, then post the block report to
/// the webhook. The upload result feeds the image block; losing the upload
/// degrades the report rather than failing the run, as long as one delivery
/// path succeeds.
async fn deliver(
    config: &AppConfig,
    input: &WeeklyInput,
    analysis: &WeeklyAnalysisResult,
    svg: String,
) -> Result<(), AgentError> {
    let mut image = None;
    let mut upload_err = None;
    if let Some(token) = &config.slack.bot_token {
        let uploader = SlackUploader::new(token.clone());
        let request = UploadRequest {
            filename: format!("activity-heatmap-{}-{}.svg", input.start, input.end),
            bytes: svg.into_bytes(),
            title: "Weekly activity heatmap".into(),
            channel_id: config.slack.channel_id.clone(),
            initial_comment: Some(weekly_report_mrkdwn(input, analysis)),
            share_public: true,
        };
        match uploader.upload(request).await {
            Ok(outcome) => {
                image = choose_weekly_image(
                    Some(outcome.file_id),
                    outcome.permalink,
                    outcome.permalink_public,
                );
            }
            Err(e) => {
                log::error!("heatmap upload failed: {e}");
                upload_err = Some(e);
            }
        }
    }

    match &config.slack.webhook_url {
        Some(url) => {
            let webhook = SlackWebhook::new(url.clone());
            let blocks = build_weekly_report(input, analysis, image.as_ref());
            let fallback_text = format!("Weekly report {} – {}", input.start, input.end);
            webhook.post_blocks(&fallback_text, &blocks).await
        }
        // Upload-only delivery: the caption carried the report, so a failed
        // upload means nothing reached the user.
        None => match upload_err {
            Some(e) => Err(e),
            None => Ok(()),
        },
    }
}
