//! AI analysis of activity metrics, with a deterministic fallback.
//!
//! The remote path calls an OpenAI-compatible `chat/completions` endpoint
//! and asks for a strict JSON object matching [`AnalysisResult`] (or the
//! weekly variant). Anything that goes wrong — missing key, transport
//! failure, `ok: false`, malformed JSON — surfaces as a typed error so the
//! report jobs can drop to [`fallback`], which produces the same shape from
//! fixed rules without touching the network.

pub mod fallback;

use std::time::Duration;

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::LlmConfig;
use crate::error::AgentError;
use crate::provider::types::{DailyMetrics, ProjectUsage};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Structured result of a daily analysis.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnalysisResult {
    pub summary: String,
    pub insights: Vec<String>,
    pub tip: String,
}

/// Structured result of a weekly analysis.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WeeklyAnalysisResult {
    pub title: String,
    pub summary: String,
    pub insights: Vec<String>,
    #[serde(rename = "nextAction")]
    pub next_action: String,
}

/// Aggregated input for the weekly analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyInput {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Total active seconds across the window.
    pub total_not_afk_seconds: f64,
    /// Mean active seconds over days that cleared the data threshold.
    pub avg_not_afk_seconds_per_day: f64,
    /// Days that cleared the threshold.
    pub days_with_data: usize,
    /// Days in the window.
    pub days: usize,
    pub top_projects: Vec<ProjectUsage>,
    pub avg_wake_minutes: Option<f64>,
    pub avg_sleep_minutes: Option<f64>,
}

/// Remote LLM analyzer.
pub struct Analyzer {
    config: LlmConfig,
    client: reqwest::Client,
}

impl Analyzer {
    pub fn new(config: LlmConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { config, client }
    }

    /// Analyze one day of metrics.
    pub async fn generate_daily(
        &self,
        date: NaiveDate,
        metrics: &DailyMetrics,
    ) -> Result<AnalysisResult, AgentError> {
        let system = "You are a personal productivity analyst. Given one day of \
                      computer-activity metrics, respond with a single JSON object with \
                      exactly these keys: \"summary\" (one sentence), \"insights\" (array \
                      of 1-3 short strings), \"tip\" (one actionable sentence). No prose \
                      outside the JSON.";
        let user = daily_prompt(date, metrics);
        let value = self.chat_json(system, &user).await?;
        let result: AnalysisResult = serde_json::from_value(value)
            .map_err(|e| AgentError::Parse(format!("daily analysis: {e}")))?;
        validate_daily(&result)?;
        Ok(result)
    }

    /// Analyze a multi-day window.
    pub async fn generate_weekly(
        &self,
        input: &WeeklyInput,
    ) -> Result<WeeklyAnalysisResult, AgentError> {
        let system = "You are a personal productivity analyst reviewing a week of \
                      computer-activity metrics. Respond with a single JSON object with \
                      exactly these keys: \"title\", \"summary\", \"insights\" (array of \
                      1-4 short strings), \"nextAction\" (one concrete suggestion). No \
                      prose outside the JSON.";
        let user = weekly_prompt(input);
        let value = self.chat_json(system, &user).await?;
        let result: WeeklyAnalysisResult = serde_json::from_value(value)
            .map_err(|e| AgentError::Parse(format!("weekly analysis: {e}")))?;
        validate_weekly(&result)?;
        Ok(result)
    }

    /// One `chat/completions` round-trip returning the parsed JSON object.
    async fn chat_json(&self, system: &str, user: &str) -> Result<Value, AgentError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AgentError::Config("LLM API key is not set".into()))?;

        let url = format!("{}/chat/completions", self.config.api_base.trim_end_matches('/'));
        let body = json!({
            "model": self.config.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
            "temperature": 0.2,
            "response_format": {"type": "json_object"},
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::Api(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable>".to_string());
            return Err(AgentError::Api(format!("HTTP {}: {body}", status.as_u16())));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| AgentError::Api(format!("response body: {e}")))?;

        let content = payload
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(Value::as_str)
            .ok_or_else(|| AgentError::Parse("completion has no message content".into()))?;

        serde_json::from_str(content)
            .map_err(|e| AgentError::Parse(format!("completion content is not JSON: {e}")))
    }
}

fn daily_prompt(date: NaiveDate, metrics: &DailyMetrics) -> String {
    let apps: Vec<String> = metrics
        .top_apps
        .iter()
        .map(|a| format!("{}: {}", a.app, crate::report::format_duration(a.seconds)))
        .collect();
    format!(
        "Date: {date}\nActive time: {}\nLongest continuous block: {}\nNight work: {}\nTop apps: {}",
        crate::report::format_duration(metrics.work_seconds),
        crate::report::format_duration(metrics.max_continuous_seconds),
        crate::report::format_duration(metrics.night_work_seconds),
        if apps.is_empty() { "none".into() } else { apps.join(", ") },
    )
}

fn weekly_prompt(input: &WeeklyInput) -> String {
    let projects: Vec<String> = input
        .top_projects
        .iter()
        .take(5)
        .map(|p| format!("{}: {}", p.project, crate::report::format_duration(p.seconds)))
        .collect();
    let wake = input
        .avg_wake_minutes
        .map(crate::timeline::sleep::format_minutes)
        .unwrap_or_else(|| "unknown".into());
    let sleep = input
        .avg_sleep_minutes
        .map(crate::timeline::sleep::format_minutes)
        .unwrap_or_else(|| "unknown".into());
    format!(
        "Window: {} to {}\nTotal active: {}\nAverage per active day: {}\nDays with data: {} of {}\nAverage wake: {wake}\nAverage sleep: {sleep}\nTop projects: {}",
        input.start,
        input.end,
        crate::report::format_duration(input.total_not_afk_seconds),
        crate::report::format_duration(input.avg_not_afk_seconds_per_day),
        input.days_with_data,
        input.days,
        if projects.is_empty() { "none".into() } else { projects.join(", ") },
    )
}

fn validate_daily(result: &AnalysisResult) -> Result<(), AgentError> {
    if result.summary.trim().is_empty() {
        return Err(AgentError::Parse("daily analysis: empty summary".into()));
    }
    if result.insights.is_empty() || result.insights.iter().any(|i| i.trim().is_empty()) {
        return Err(AgentError::Parse("daily analysis: empty insights".into()));
    }
    if result.tip.trim().is_empty() {
        return Err(AgentError::Parse("daily analysis: empty tip".into()));
    }
    Ok(())
}

fn validate_weekly(result: &WeeklyAnalysisResult) -> Result<(), AgentError> {
    for (field, value) in [
        ("title", &result.title),
        ("summary", &result.summary),
        ("nextAction", &result.next_action),
    ] {
        if value.trim().is_empty() {
            return Err(AgentError::Parse(format!("weekly analysis: empty {field}")));
        }
    }
    if result.insights.is_empty() {
        return Err(AgentError::Parse("weekly analysis: empty insights".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::types::AppUsage;

    fn metrics() -> DailyMetrics {
        DailyMetrics {
            work_seconds: 28800.0,
            max_continuous_seconds: 5400.0,
            top_apps: vec![AppUsage {
                app: "VS Code".into(),
                seconds: 14400.0,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_daily_prompt_contains_metrics() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        let prompt = daily_prompt(date, &metrics());
        assert!(prompt.contains("2026-01-15"));
        assert!(prompt.contains("8h"));
        assert!(prompt.contains("VS Code"));
    }

    #[test]
    fn test_validate_daily_rejects_empty_fields() {
        let ok = AnalysisResult {
            summary: "s".into(),
            insights: vec!["i".into()],
            tip: "t".into(),
        };
        assert!(validate_daily(&ok).is_ok());

        let no_insights = AnalysisResult {
            insights: vec![],
            ..ok.clone()
        };
        assert!(validate_daily(&no_insights).is_err());

        let blank_tip = AnalysisResult {
            tip: "  ".into(),
            ..ok
        };
        assert!(validate_daily(&blank_tip).is_err());
    }

    #[test]
    fn test_weekly_result_accepts_next_action_key() {
        let parsed: WeeklyAnalysisResult = serde_json::from_str(
            r#"{"title": "t", "summary": "s", "insights": ["a"], "nextAction": "n"}"#,
        )
        .unwrap();
        assert_eq!(parsed.next_action, "n");
        assert!(validate_weekly(&parsed).is_ok());
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let analyzer = Analyzer::new(LlmConfig {
            api_key: None,
            api_base: "https://example.invalid/v1".into(),
            model: "m".into(),
        });
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let err = rt
            .block_on(analyzer.chat_json("sys", "user"))
            .expect_err("must fail without a key");
        assert!(matches!(err, AgentError::Config(_)));
    }
}
