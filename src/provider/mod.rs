//! Activity-server client — bucket discovery, query execution, decoding.
//!
//! Each high-level call is self-contained: it discovers buckets, issues the
//! server-side query for the supplied range, and decodes the response into
//! the fixed result types in [`types`]. The provider holds no state across
//! ticks beyond its HTTP client.

pub mod query;
pub mod types;

use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;

use crate::error::AgentError;
use self::types::{
    AfkEvent, AfkMetrics, AfkStatus, AppUsage, DailyMetrics, EditorProjectMetrics, ProjectUsage,
    TimeRange,
};

/// Bucket id prefixes published by the upstream watchers.
const WINDOW_PREFIX: &str = "aw-watcher-window_";
const AFK_PREFIX: &str = "aw-watcher-afk_";
const EDITOR_PREFIXES: [&str; 2] = ["aw-watcher-vscode_", "aw-watcher-vim_"];

/// Apps the window watcher could not identify share one bucket.
const UNKNOWN_APP: &str = "Unknown";

const QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Discovered bucket ids for one provider call.
#[derive(Debug, Clone, Default)]
struct Buckets {
    window: Option<String>,
    afk: Option<String>,
    editor: Option<String>,
}

/// Client for the local activity server.
pub struct ActivityProvider {
    client: reqwest::Client,
    base_url: String,
}

impl ActivityProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(QUERY_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Work metrics for the range: total seconds, top apps, longest merged
    /// event. AFK and night-work seconds are not computed by this query and
    /// read as zero.
    pub async fn get_daily_metrics(&self, range: &TimeRange) -> Result<DailyMetrics, AgentError> {
        let buckets = self.discover_buckets().await?;
        let (window, afk) = required(buckets.window, buckets.afk)?;
        let program = query::work_metrics_query(&window, &afk);
        let events = self.run_query(&program, range).await?;
        decode_daily_metrics(&events)
    }

    /// Aggregate AFK / not-AFK seconds for the range.
    pub async fn get_afk_metrics(&self, range: &TimeRange) -> Result<AfkMetrics, AgentError> {
        let buckets = self.discover_buckets().await?;
        let afk = buckets
            .afk
            .ok_or_else(|| AgentError::connection("activity server", "Required buckets not found"))?;
        let program = query::afk_metrics_query(&afk);
        let events = self.run_query(&program, range).await?;
        decode_afk_metrics(&events)
    }

    /// Raw AFK events in timestamp order, for binning and sleep inference.
    pub async fn get_afk_events(&self, range: &TimeRange) -> Result<Vec<AfkEvent>, AgentError> {
        let buckets = self.discover_buckets().await?;
        let afk = buckets
            .afk
            .ok_or_else(|| AgentError::connection("activity server", "Required buckets not found"))?;
        let program = query::afk_events_query(&afk);
        let events = self.run_query(&program, range).await?;
        decode_afk_events(&events)
    }

    /// Editor project ranking. A missing editor bucket is not an error —
    /// not everyone runs an editor watcher — and yields an empty ranking.
    pub async fn get_editor_project_metrics(
        &self,
        range: &TimeRange,
    ) -> Result<EditorProjectMetrics, AgentError> {
        let buckets = self.discover_buckets().await?;
        let Some(editor) = buckets.editor else {
            return Ok(EditorProjectMetrics::default());
        };
        let afk = buckets
            .afk
            .ok_or_else(|| AgentError::connection("activity server", "Required buckets not found"))?;
        let program = query::editor_projects_query(&editor, &afk);
        let events = self.run_query(&program, range).await?;
        decode_editor_projects(&events)
    }

    /// `GET /api/0/buckets/` and pick the first id per known prefix.
    async fn discover_buckets(&self) -> Result<Buckets, AgentError> {
        let url = format!("{}/api/0/buckets/", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AgentError::connection("activity server", e))?;

        if !response.status().is_success() {
            return Err(AgentError::connection(
                "activity server",
                format!("bucket list returned HTTP {}", response.status().as_u16()),
            ));
        }

        let map: HashMap<String, Value> = response
            .json()
            .await
            .map_err(|e| AgentError::Parse(format!("bucket list: {e}")))?;

        let mut ids: Vec<&String> = map.keys().collect();
        ids.sort();

        let find = |prefix: &str| ids.iter().find(|id| id.starts_with(prefix)).map(|s| s.to_string());

        Ok(Buckets {
            window: find(WINDOW_PREFIX),
            afk: find(AFK_PREFIX),
            editor: EDITOR_PREFIXES.iter().find_map(|&p| find(p)),
        })
    }

    /// `POST /api/0/query/` and return the event list for our single period.
    async fn run_query(&self, program: &str, range: &TimeRange) -> Result<Vec<Value>, AgentError> {
        let url = format!("{}/api/0/query/", self.base_url);
        let body = serde_json::json!({
            "query": [program],
            "timeperiods": [query::encode_timeperiod(range)],
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::connection("activity server", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable>".to_string());
            return Err(AgentError::Query {
                status: status.as_u16(),
                body,
            });
        }

        let results: Vec<Value> = response
            .json()
            .await
            .map_err(|e| AgentError::Parse(format!("query response: {e}")))?;

        // The response array is aligned to timeperiods; index 0 is ours.
        let first = results
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::Parse("query response was empty".into()))?;

        match first {
            Value::Array(events) => Ok(events),
            other => Err(AgentError::Parse(format!(
                "expected event array, got {other}"
            ))),
        }
    }
}

fn required(
    window: Option<String>,
    afk: Option<String>,
) -> Result<(String, String), AgentError> {
    match (window, afk) {
        (Some(w), Some(a)) => Ok((w, a)),
        _ => Err(AgentError::connection(
            "activity server",
            "Required buckets not found",
        )),
    }
}

fn event_duration(event: &Value) -> f64 {
    event
        .get("duration")
        .and_then(Value::as_f64)
        .filter(|d| d.is_finite() && *d >= 0.0)
        .unwrap_or(0.0)
}

fn event_data_str<'a>(event: &'a Value, key: &str) -> Option<&'a str> {
    event.get("data").and_then(|d| d.get(key)).and_then(Value::as_str)
}

/// Decode merged-by-app window events into [`DailyMetrics`].
pub fn decode_daily_metrics(events: &[Value]) -> Result<DailyMetrics, AgentError> {
    let mut work_seconds = 0.0;
    let mut max_continuous = 0.0_f64;
    let mut per_app: HashMap<String, f64> = HashMap::new();

    for event in events {
        let duration = event_duration(event);
        work_seconds += duration;
        max_continuous = max_continuous.max(duration);

        let app = event_data_str(event, "app")
            .filter(|a| !a.is_empty())
            .unwrap_or(UNKNOWN_APP);
        *per_app.entry(app.to_string()).or_insert(0.0) += duration;
    }

    let mut top_apps: Vec<AppUsage> = per_app
        .into_iter()
        .map(|(app, seconds)| AppUsage { app, seconds })
        .collect();
    // Descending by seconds, ties broken by app name so output is stable.
    top_apps.sort_by(|a, b| {
        b.seconds
            .partial_cmp(&a.seconds)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.app.cmp(&b.app))
    });
    top_apps.truncate(5);

    Ok(DailyMetrics {
        work_seconds,
        afk_seconds: 0.0,
        night_work_seconds: 0.0,
        max_continuous_seconds: max_continuous,
        top_apps,
    })
}

/// Decode merged-by-status AFK events into [`AfkMetrics`].
pub fn decode_afk_metrics(events: &[Value]) -> Result<AfkMetrics, AgentError> {
    let mut metrics = AfkMetrics::default();
    for event in events {
        let duration = event_duration(event);
        match event_data_str(event, "status") {
            Some("afk") => metrics.afk_seconds += duration,
            Some("not-afk") => metrics.not_afk_seconds += duration,
            _ => {}
        }
    }
    Ok(metrics)
}

/// Decode raw AFK events. Events missing a parseable timestamp are a shape
/// error — the binner depends on every span having an instant.
pub fn decode_afk_events(events: &[Value]) -> Result<Vec<AfkEvent>, AgentError> {
    events
        .iter()
        .map(|event| {
            let ts = event
                .get("timestamp")
                .and_then(Value::as_str)
                .ok_or_else(|| AgentError::Parse("AFK event missing timestamp".into()))?;
            let timestamp = chrono::DateTime::parse_from_rfc3339(ts)
                .map_err(|e| AgentError::Parse(format!("AFK event timestamp {ts:?}: {e}")))?
                .with_timezone(&chrono::Utc);
            let status = event_data_str(event, "status")
                .map(AfkStatus::parse)
                .unwrap_or(AfkStatus::Other);
            Ok(AfkEvent {
                timestamp,
                duration_secs: event_duration(event),
                status,
            })
        })
        .collect()
}

/// Decode merged-by-project editor events. Project identifiers are path-like;
/// the ranking uses the last path segment.
pub fn decode_editor_projects(events: &[Value]) -> Result<EditorProjectMetrics, AgentError> {
    let mut per_project: HashMap<String, f64> = HashMap::new();

    for event in events {
        let Some(raw) = event_data_str(event, "project").filter(|p| !p.is_empty()) else {
            continue;
        };
        let name = project_name(raw);
        *per_project.entry(name.to_string()).or_insert(0.0) += event_duration(event);
    }

    let mut projects: Vec<ProjectUsage> = per_project
        .into_iter()
        .map(|(project, seconds)| ProjectUsage { project, seconds })
        .collect();
    projects.sort_by(|a, b| {
        b.seconds
            .partial_cmp(&a.seconds)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.project.cmp(&b.project))
    });

    Ok(EditorProjectMetrics { projects })
}

/// Last path segment of a project identifier, tolerating both separators.
fn project_name(path: &str) -> &str {
    path.trim_end_matches(['/', '\\'])
        .rsplit(['/', '\\'])
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(path)
}
