//! Report composition — metrics + analysis into block payloads.
//!
//! Layouts are fixed so repeated runs produce byte-identical messages for
//! identical inputs. All builders are pure; transmission and validation live
//! in the chat layer.

pub mod blocks;
pub mod heatmap;

use chrono::NaiveDate;

use crate::analyzer::{AnalysisResult, WeeklyAnalysisResult, WeeklyInput};
use crate::provider::types::DailyMetrics;
use crate::timeline::sleep::format_minutes;
use self::blocks::{Block, SlackFileRef};

/// Hard cap for the plain-text weekly rendering (upload captions).
pub const MAX_MRKDWN_LEN: usize = 3500;

const RANK_MEDALS: [&str; 3] = ["🥇", "🥈", "🥉"];

/// Human-form duration: `8h`, `1h 30m`, `45m`. Sub-minute values collapse
/// to `0m` so metric fields stay uniform.
pub fn format_duration(secs: f64) -> String {
    let total = secs.max(0.0).round() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    match (hours, minutes) {
        (0, 0) => "0m".to_string(),
        (0, m) => format!("{m}m"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h {m}m"),
    }
}

/// The fixed daily report layout.
pub fn build_daily_report(
    date: NaiveDate,
    metrics: &DailyMetrics,
    analysis: Option<&AnalysisResult>,
    dashboard: Option<(&str, &str)>,
) -> Vec<Block> {
    let mut out = Vec::new();

    out.push(Block::header(format!("📊 Daily Report — {date}")));

    if let Some(analysis) = analysis {
        out.push(Block::section(analysis.summary.clone()));
    }

    out.push(Block::divider());
    out.push(Block::fields(vec![
        format!("*Work*\n{}", format_duration(metrics.work_seconds)),
        format!(
            "*Longest block*\n{}",
            format_duration(metrics.max_continuous_seconds)
        ),
        format!("*Night work*\n{}", format_duration(metrics.night_work_seconds)),
        format!("*Date*\n{date}"),
    ]));

    out.push(Block::divider());
    out.push(Block::section(top_apps_text(metrics)));

    if let Some(analysis) = analysis {
        if !analysis.insights.is_empty() {
            out.push(Block::divider());
            let lines: Vec<String> = analysis
                .insights
                .iter()
                .map(|i| format!("• {i}"))
                .collect();
            out.push(Block::section(format!("*Insights*\n{}", lines.join("\n"))));
        }
        if !analysis.tip.is_empty() {
            out.push(Block::divider());
            out.push(Block::context(format!("💡 {}", analysis.tip)));
        }
    }

    if let Some((base_url, hostname)) = dashboard {
        out.push(Block::divider());
        out.push(Block::section(format!(
            "<{base_url}/#/activity/{hostname}|Open activity dashboard> · <{base_url}/#/timeline|Timeline>"
        )));
    }

    out
}

fn top_apps_text(metrics: &DailyMetrics) -> String {
    if metrics.top_apps.is_empty() {
        return "*Top apps*\nNo app usage recorded.".to_string();
    }
    let mut lines = vec!["*Top apps*".to_string()];
    for (i, app) in metrics.top_apps.iter().enumerate() {
        let rank = RANK_MEDALS.get(i).copied().unwrap_or("•");
        lines.push(format!(
            "{rank} {} — {}",
            app.app,
            format_duration(app.seconds)
        ));
    }
    lines.join("\n")
}

/// Image source for the weekly report, in preference order.
#[derive(Debug, Clone, PartialEq)]
pub enum WeeklyImage {
    FileId(String),
    FileUrl(String),
    Url(String),
}

/// Pick the best available image reference: uploaded file id, then uploaded
/// file URL, then an external URL.
pub fn choose_weekly_image(
    file_id: Option<String>,
    file_url: Option<String>,
    external_url: Option<String>,
) -> Option<WeeklyImage> {
    file_id
        .map(WeeklyImage::FileId)
        .or(file_url.map(WeeklyImage::FileUrl))
        .or(external_url.map(WeeklyImage::Url))
}

/// The fixed weekly report layout.
pub fn build_weekly_report(
    input: &WeeklyInput,
    analysis: &WeeklyAnalysisResult,
    image: Option<&WeeklyImage>,
) -> Vec<Block> {
    let mut out = Vec::new();

    out.push(Block::header(format!(
        "📅 Weekly Report — {} – {}",
        input.start, input.end
    )));
    out.push(Block::divider());

    out.push(Block::fields(vec![
        format!("*Total active*\n{}", format_duration(input.total_not_afk_seconds)),
        format!(
            "*Average / day*\n{}",
            format_duration(input.avg_not_afk_seconds_per_day)
        ),
        format!("*Average wake*\n{}", fmt_opt_minutes(input.avg_wake_minutes)),
        format!("*Average sleep*\n{}", fmt_opt_minutes(input.avg_sleep_minutes)),
    ]));

    out.push(Block::section(project_ranking_text(input)));

    if let Some(image) = image {
        let alt = "Weekly activity heatmap";
        out.push(match image {
            WeeklyImage::FileId(id) => Block::image_file(
                SlackFileRef {
                    id: Some(id.clone()),
                    url: None,
                },
                alt,
            ),
            WeeklyImage::FileUrl(url) => Block::image_file(
                SlackFileRef {
                    id: None,
                    url: Some(url.clone()),
                },
                alt,
            ),
            WeeklyImage::Url(url) => Block::image_url(url.clone(), alt),
        });
    }

    out.push(Block::section(format!(
        "*{}*\n{}",
        analysis.title, analysis.summary
    )));
    if !analysis.insights.is_empty() {
        let lines: Vec<String> = analysis
            .insights
            .iter()
            .map(|i| format!("• {i}"))
            .collect();
        out.push(Block::section(lines.join("\n")));
    }
    out.push(Block::context(format!("➡️ Next: {}", analysis.next_action)));

    out
}

fn fmt_opt_minutes(minutes: Option<f64>) -> String {
    minutes.map(format_minutes).unwrap_or_else(|| "–".to_string())
}

fn project_ranking_text(input: &WeeklyInput) -> String {
    if input.top_projects.is_empty() {
        return "*Projects*\nNo editor activity recorded.".to_string();
    }
    let mut lines = vec!["*Projects*".to_string()];
    for (i, project) in input.top_projects.iter().take(5).enumerate() {
        let rank = RANK_MEDALS.get(i).copied().unwrap_or("•");
        lines.push(format!(
            "{rank} {} — {}",
            project.project,
            format_duration(project.seconds)
        ));
    }
    lines.join("\n")
}

/// Plain-text weekly rendering for channels that only accept text plus a
/// caption. Truncated with an ellipsis past [`MAX_MRKDWN_LEN`].
pub fn weekly_report_mrkdwn(input: &WeeklyInput, analysis: &WeeklyAnalysisResult) -> String {
    let mut lines = vec![
        format!("*📅 Weekly Report — {} – {}*", input.start, input.end),
        String::new(),
        format!(
            "Total active: {} · Average/day: {} ({} of {} days with data)",
            format_duration(input.total_not_afk_seconds),
            format_duration(input.avg_not_afk_seconds_per_day),
            input.days_with_data,
            input.days,
        ),
        format!(
            "Average wake: {} · Average sleep: {}",
            fmt_opt_minutes(input.avg_wake_minutes),
            fmt_opt_minutes(input.avg_sleep_minutes),
        ),
        String::new(),
        project_ranking_text(input),
        String::new(),
        format!("*{}*", analysis.title),
        analysis.summary.clone(),
    ];
    for insight in &analysis.insights {
        lines.push(format!("• {insight}"));
    }
    lines.push(format!("➡️ Next: {}", analysis.next_action));

    truncate_with_ellipsis(lines.join("\n"), MAX_MRKDWN_LEN)
}

fn truncate_with_ellipsis(text: String, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text;
    }
    let mut out: String = text.chars().take(limit.saturating_sub(1)).collect();
    out.push('…');
    out
}
