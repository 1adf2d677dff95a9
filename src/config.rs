//! Agent configuration — environment variables layered over an optional
//! `~/.aw-analyzer/config.toml`.
//!
//! Environment supplies secrets and endpoint overrides; the TOML file supplies
//! job tuning (target hours, thresholds, cooldowns, timezone offset) that has
//! no natural env encoding. Env wins when both are present. All boundary
//! validation happens here — components receive a ready `AppConfig` and never
//! read the environment themselves.
//!
//! ```toml
//! # ~/.aw-analyzer/config.toml — all sections optional.
//! tz_offset_hours = 9
//!
//! [jobs]
//! summary_hour = 21
//! summary_minute = 0
//! report_hour = 9
//! report_minute = 0
//! continuous_threshold_secs = 3600
//! continuous_cooldown_mins = 60
//! ```

use serde::Deserialize;
use std::path::PathBuf;

/// Default activity-server endpoint.
const DEFAULT_AW_URL: &str = "http://localhost:5600";

/// Default OpenAI-compatible API base.
const DEFAULT_LLM_BASE: &str = "https://api.openai.com/v1";

const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";

/// LLM analyzer configuration. An absent API key activates the fallback
/// analyzer; it is not an error until the remote path is actually invoked.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub api_base: String,
    pub model: String,
}

/// Slack delivery configuration. Webhook and bot token are independent
/// channels: block messages go over the webhook, file uploads need the token.
#[derive(Debug, Clone, Default)]
pub struct SlackConfig {
    pub webhook_url: Option<String>,
    pub bot_token: Option<String>,
    pub channel_id: Option<String>,
}

/// Activity-server connection settings.
#[derive(Debug, Clone)]
pub struct AwConfig {
    pub base_url: String,
    /// Used to build dashboard deep-links; defaults to the OS hostname.
    pub hostname: String,
}

/// Job tuning parameters, from the `[jobs]` section of config.toml.
#[derive(Debug, Clone, Deserialize)]
pub struct JobsConfig {
    /// Local hour after which the daily summary fires.
    #[serde(default = "default_summary_hour")]
    pub summary_hour: u32,
    #[serde(default)]
    pub summary_minute: u32,

    /// Local hour after which the daily report fires.
    #[serde(default = "default_report_hour")]
    pub report_hour: u32,
    #[serde(default)]
    pub report_minute: u32,

    /// Continuous-work alert threshold in seconds.
    #[serde(default = "default_continuous_threshold")]
    pub continuous_threshold_secs: u64,

    /// Minimum interval between continuous-work alerts, in minutes.
    #[serde(default = "default_continuous_cooldown")]
    pub continuous_cooldown_mins: u64,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            summary_hour: default_summary_hour(),
            summary_minute: 0,
            report_hour: default_report_hour(),
            report_minute: 0,
            continuous_threshold_secs: default_continuous_threshold(),
            continuous_cooldown_mins: default_continuous_cooldown(),
        }
    }
}

fn default_summary_hour() -> u32 {
    21
}

fn default_report_hour() -> u32 {
    9
}

fn default_continuous_threshold() -> u64 {
    3600
}

fn default_continuous_cooldown() -> u64 {
    60
}

fn default_tz_offset() -> i32 {
    9
}

/// On-disk shape of `~/.aw-analyzer/config.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
struct FileConfig {
    #[serde(default)]
    tz_offset_hours: Option<i32>,
    #[serde(default)]
    jobs: Option<JobsConfig>,
}

/// Fully resolved agent configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub slack: SlackConfig,
    pub aw: AwConfig,
    pub jobs: JobsConfig,
    /// Fixed UTC offset, in hours, used for all local-date reasoning.
    pub tz_offset_hours: i32,
    pub state_path: PathBuf,
    pub log_level: String,
}

impl Default for AppConfig {
    /// Baseline configuration with no environment reads — what `load` returns
    /// in an empty environment with no config file. Used heavily by tests.
    fn default() -> Self {
        Self {
            llm: LlmConfig {
                api_key: None,
                api_base: DEFAULT_LLM_BASE.into(),
                model: DEFAULT_LLM_MODEL.into(),
            },
            slack: SlackConfig::default(),
            aw: AwConfig {
                base_url: DEFAULT_AW_URL.into(),
                hostname: "localhost".into(),
            },
            jobs: JobsConfig::default(),
            tz_offset_hours: default_tz_offset(),
            state_path: PathBuf::from(".aw-analyzer/state.json"),
            log_level: "INFO".into(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the environment plus the optional TOML file.
    pub fn load() -> Self {
        let file = load_file_config();

        let llm = LlmConfig {
            api_key: env_nonempty("LLM_API_KEY"),
            api_base: env_nonempty("LLM_API_BASE").unwrap_or_else(|| DEFAULT_LLM_BASE.into()),
            model: env_nonempty("LLM_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.into()),
        };

        let slack = SlackConfig {
            webhook_url: env_nonempty("SLACK_WEBHOOK_URL"),
            bot_token: env_nonempty("SLACK_BOT_TOKEN"),
            channel_id: env_nonempty("SLACK_CHANNEL_ID"),
        };

        let aw = AwConfig {
            base_url: env_nonempty("AW_SERVER_URL").unwrap_or_else(|| DEFAULT_AW_URL.into()),
            hostname: env_nonempty("AW_HOSTNAME").unwrap_or_else(os_hostname),
        };

        let state_path = env_nonempty("AW_ANALYZER_STATE")
            .map(PathBuf::from)
            .unwrap_or_else(default_state_path);

        Self {
            llm,
            slack,
            aw,
            jobs: file.jobs.unwrap_or_default(),
            tz_offset_hours: file.tz_offset_hours.unwrap_or_else(default_tz_offset),
            state_path,
            log_level: env_nonempty("LOG_LEVEL").unwrap_or_else(|| "INFO".into()),
        }
    }

    /// Print warnings for configuration that will limit functionality.
    /// Never fails — the agent should still run with partial config.
    pub fn validate(&self) {
        if self.llm.api_key.is_none() {
            log::info!("LLM_API_KEY not set — reports will use the deterministic fallback analyzer");
        }
        if self.slack.webhook_url.is_none() {
            log::warn!("SLACK_WEBHOOK_URL not set — chat delivery is disabled");
        }
        if self.slack.bot_token.is_some() && self.slack.channel_id.is_none() {
            log::warn!("SLACK_BOT_TOKEN set without SLACK_CHANNEL_ID — uploads will not post to a channel");
        }
        if !(-14..=14).contains(&self.tz_offset_hours) {
            log::warn!(
                "tz_offset_hours {} is outside [-14, 14] — local-date math will be wrong",
                self.tz_offset_hours
            );
        }
        if self.jobs.summary_hour > 23 || self.jobs.report_hour > 23 {
            log::warn!("job target hour above 23 — that job will never fire");
        }
    }

    /// The fixed offset used to project UTC instants onto local dates.
    pub fn tz_offset(&self) -> chrono::FixedOffset {
        chrono::FixedOffset::east_opt(self.tz_offset_hours * 3600)
            .unwrap_or_else(|| chrono::FixedOffset::east_opt(9 * 3600).unwrap())
    }
}

/// Read an env var, treating empty strings as unset.
fn env_nonempty(key: &str) -> Option<String> {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

fn load_file_config() -> FileConfig {
    let Some(path) = config_dir().map(|d| d.join("config.toml")) else {
        return FileConfig::default();
    };
    let Ok(contents) = std::fs::read_to_string(&path) else {
        return FileConfig::default();
    };
    match toml::from_str(&contents) {
        Ok(config) => {
            log::debug!("loaded config from {}", path.display());
            config
        }
        Err(e) => {
            log::warn!("failed to parse {}: {e} — using defaults", path.display());
            FileConfig::default()
        }
    }
}

/// `~/.aw-analyzer`, the agent's home for config and state.
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".aw-analyzer"))
}

fn default_state_path() -> PathBuf {
    config_dir()
        .map(|d| d.join("state.json"))
        .unwrap_or_else(|| PathBuf::from(".aw-analyzer/state.json"))
}

/// Resolve the OS hostname via the `hostname` utility.
fn os_hostname() -> String {
    std::process::Command::new("hostname")
        .output()
        .ok()
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "localhost".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jobs_defaults() {
        let jobs = JobsConfig::default();
        assert_eq!(jobs.summary_hour, 21);
        assert_eq!(jobs.report_hour, 9);
        assert_eq!(jobs.continuous_threshold_secs, 3600);
        assert_eq!(jobs.continuous_cooldown_mins, 60);
    }

    #[test]
    fn test_parse_file_config() {
        let toml = r#"
tz_offset_hours = -5

[jobs]
summary_hour = 9
continuous_threshold_secs = 7200
"#;
        let config: FileConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.tz_offset_hours, Some(-5));
        let jobs = config.jobs.unwrap();
        assert_eq!(jobs.summary_hour, 9);
        assert_eq!(jobs.summary_minute, 0);
        assert_eq!(jobs.continuous_threshold_secs, 7200);
        // Unspecified fields keep their defaults.
        assert_eq!(jobs.report_hour, 9);
        assert_eq!(jobs.continuous_cooldown_mins, 60);
    }

    #[test]
    fn test_parse_empty_file_config() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert!(config.tz_offset_hours.is_none());
        assert!(config.jobs.is_none());
    }
}
