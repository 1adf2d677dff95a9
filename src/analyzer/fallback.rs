//! Deterministic analysis rules — the reference implementation the remote
//! analyzer is allowed to improve on but never replace.
//!
//! Pure functions over the same inputs as the remote path: no I/O, stable
//! output for a given input. The report jobs fall back here whenever the
//! remote analyzer is unconfigured or fails.

use crate::analyzer::{AnalysisResult, WeeklyAnalysisResult, WeeklyInput};
use crate::provider::types::DailyMetrics;
use crate::report::format_duration;
use crate::timeline::sleep::format_minutes;

/// Work beyond this suggests the rest tip (10 hours).
const OVERWORK_SECS: f64 = 10.0 * 3600.0;

/// Night work beyond this suggests the rest tip (2 hours).
const NIGHT_WORK_SECS: f64 = 2.0 * 3600.0;

/// A focus block at least this long counts as deep work (1 hour).
const DEEP_WORK_SECS: f64 = 3600.0;

/// Weekly average below this prompts a scheduling nudge (2 hours/day).
const LOW_AVERAGE_SECS: f64 = 2.0 * 3600.0;

/// Rule-based daily analysis.
pub fn fallback_daily(metrics: &DailyMetrics) -> AnalysisResult {
    let summary = format!(
        "Worked {} with a longest continuous block of {}.",
        format_duration(metrics.work_seconds),
        format_duration(metrics.max_continuous_seconds),
    );

    let mut insights = Vec::new();
    if let Some(top) = metrics.top_apps.first() {
        insights.push(format!(
            "Most time went to {} ({}).",
            top.app,
            format_duration(top.seconds)
        ));
    }
    if metrics.max_continuous_seconds >= DEEP_WORK_SECS {
        insights.push(format!(
            "Longest focus block ran {} — solid deep work.",
            format_duration(metrics.max_continuous_seconds)
        ));
    } else {
        insights.push(format!(
            "Longest focus block was only {}; interruptions may be fragmenting the day.",
            format_duration(metrics.max_continuous_seconds)
        ));
    }
    if metrics.night_work_seconds > 0.0 {
        insights.push(format!(
            "{} of work happened at night.",
            format_duration(metrics.night_work_seconds)
        ));
    }

    let tip = if metrics.work_seconds > OVERWORK_SECS {
        "That was a long day — schedule real rest before tomorrow.".to_string()
    } else if metrics.night_work_seconds > NIGHT_WORK_SECS {
        "Night work is piling up — wind down earlier and protect your sleep.".to_string()
    } else {
        "Plan tomorrow's first task before closing out to start with momentum.".to_string()
    };

    AnalysisResult {
        summary,
        insights,
        tip,
    }
}

/// Rule-based weekly analysis.
pub fn fallback_weekly(input: &WeeklyInput) -> WeeklyAnalysisResult {
    let title = format!("Weekly Review: {} – {}", input.start, input.end);

    let summary = format!(
        "Logged {} of active time across {} of {} days, averaging {} per active day.",
        format_duration(input.total_not_afk_seconds),
        input.days_with_data,
        input.days,
        format_duration(input.avg_not_afk_seconds_per_day),
    );

    let mut insights = Vec::new();
    if let Some(top) = input.top_projects.first() {
        insights.push(format!(
            "Top project was {} with {}.",
            top.project,
            format_duration(top.seconds)
        ));
    }
    match (input.avg_wake_minutes, input.avg_sleep_minutes) {
        (Some(wake), Some(sleep)) => insights.push(format!(
            "Average wake {} and average sleep {}.",
            format_minutes(wake),
            format_minutes(sleep)
        )),
        (Some(wake), None) => {
            insights.push(format!("Average wake time was {}.", format_minutes(wake)))
        }
        (None, Some(sleep)) => {
            insights.push(format!("Average sleep time was {}.", format_minutes(sleep)))
        }
        (None, None) => {}
    }
    if input.days_with_data < input.days {
        insights.push(format!(
            "{} day(s) had little or no recorded activity.",
            input.days - input.days_with_data
        ));
    }
    if insights.is_empty() {
        insights.push("Not enough data this week for a trend.".to_string());
    }

    let next_action = if input.avg_not_afk_seconds_per_day < LOW_AVERAGE_SECS {
        "Schedule one protected focus block each morning next week.".to_string()
    } else {
        "Keep the current rhythm and protect your longest focus block.".to_string()
    };

    WeeklyAnalysisResult {
        title,
        summary,
        insights,
        next_action,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::types::{AppUsage, ProjectUsage};
    use chrono::NaiveDate;

    fn metrics_8h() -> DailyMetrics {
        DailyMetrics {
            work_seconds: 28800.0,
            max_continuous_seconds: 5400.0,
            top_apps: vec![
                AppUsage { app: "VS Code".into(), seconds: 14400.0 },
                AppUsage { app: "Chrome".into(), seconds: 7200.0 },
                AppUsage { app: "Slack".into(), seconds: 3600.0 },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_daily_summary_embeds_work_duration() {
        let analysis = fallback_daily(&metrics_8h());
        assert!(analysis.summary.contains("8h"), "got: {}", analysis.summary);
    }

    #[test]
    fn test_daily_insights_cover_focus_and_top_app() {
        let analysis = fallback_daily(&metrics_8h());
        let joined = analysis.insights.join(" | ");
        assert!(joined.contains("VS Code"), "got: {joined}");
        assert!(
            joined.contains("1h 30m") && joined.contains("focus"),
            "got: {joined}"
        );
    }

    #[test]
    fn test_daily_tip_does_not_suggest_rest_for_normal_day() {
        let analysis = fallback_daily(&metrics_8h());
        let tip = analysis.tip.to_lowercase();
        assert!(!tip.contains("rest"), "got: {tip}");
    }

    #[test]
    fn test_daily_tip_suggests_rest_when_overworked() {
        let mut metrics = metrics_8h();
        metrics.work_seconds = 11.0 * 3600.0;
        let analysis = fallback_daily(&metrics);
        assert!(analysis.tip.to_lowercase().contains("rest"));
    }

    #[test]
    fn test_daily_tip_reacts_to_night_work() {
        let mut metrics = metrics_8h();
        metrics.night_work_seconds = 3.0 * 3600.0;
        let analysis = fallback_daily(&metrics);
        assert!(analysis.tip.to_lowercase().contains("sleep"));
    }

    #[test]
    fn test_daily_is_deterministic() {
        let metrics = metrics_8h();
        assert_eq!(fallback_daily(&metrics), fallback_daily(&metrics));
    }

    fn weekly_input() -> WeeklyInput {
        WeeklyInput {
            start: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            end: NaiveDate::from_ymd_opt(2026, 1, 11).unwrap(),
            total_not_afk_seconds: 12600.0,
            avg_not_afk_seconds_per_day: 6300.0,
            days_with_data: 2,
            days: 4,
            top_projects: vec![ProjectUsage {
                project: "aw-analyzer".into(),
                seconds: 9000.0,
            }],
            avg_wake_minutes: Some(420.0),
            avg_sleep_minutes: Some(23.5 * 60.0),
        }
    }

    #[test]
    fn test_weekly_has_all_fields() {
        let analysis = fallback_weekly(&weekly_input());
        assert!(analysis.title.contains("2026-01-05"));
        assert!(analysis.summary.contains("2 of 4 days"));
        assert!(!analysis.insights.is_empty());
        assert!(!analysis.next_action.is_empty());
    }

    #[test]
    fn test_weekly_low_average_changes_next_action() {
        let mut input = weekly_input();
        input.avg_not_afk_seconds_per_day = 3600.0;
        let analysis = fallback_weekly(&input);
        assert!(analysis.next_action.contains("focus block each morning"));
    }

    #[test]
    fn test_weekly_no_data_still_has_insight() {
        let input = WeeklyInput {
            top_projects: vec![],
            avg_wake_minutes: None,
            avg_sleep_minutes: None,
            days_with_data: 4,
            days: 4,
            ..weekly_input()
        };
        let analysis = fallback_weekly(&input);
        assert!(!analysis.insights.is_empty());
    }
}
