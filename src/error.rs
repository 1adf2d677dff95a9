//! Error taxonomy shared by every boundary component.
//!
//! Components (provider, analyzer, chat, uploader, state, notifier) return
//! `Result<T, AgentError>` and never panic or propagate dynamic reports
//! across module boundaries. The CLI layer wraps these into `color_eyre`
//! reports for display.

use thiserror::Error;

/// Errors produced by the agent's boundary components.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Network/DNS failure or non-2xx on a non-query HTTP call.
    #[error("cannot reach {service}: {message}")]
    Connection { service: String, message: String },

    /// Non-2xx or malformed activity-server query response.
    #[error("query failed with HTTP {status}: {body}")]
    Query { status: u16, body: String },

    /// Upstream payload shape does not match the expected contract.
    #[error("unexpected payload shape: {0}")]
    Parse(String),

    /// Missing or empty required configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Upstream API returned `ok: false`.
    #[error("API error: {0}")]
    Api(String),

    /// Transport-level non-2xx from a chat endpoint.
    #[error("HTTP {status} from {endpoint}")]
    Http { status: u16, endpoint: String },

    /// A locally composed message violated platform constraints; the
    /// transmitter refused to send it. Carries every violation found.
    #[error("message failed validation: {}", .0.join("; "))]
    InvalidMessage(Vec<String>),

    /// Local OS notification subcommand failed.
    #[error("notifier failed: {0}")]
    Notifier(String),

    /// State file write failed.
    #[error("state write failed: {0}")]
    State(String),
}

impl AgentError {
    /// Connection error with a uniform "cannot reach" message.
    pub fn connection(service: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Connection {
            service: service.into(),
            message: message.to_string(),
        }
    }
}

/// Fatal scheduler outcomes — these abort the tick and map to exit code 1.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// A job's `run` failed; data-layer problems likely affect all jobs.
    #[error("job '{job_id}' failed: {source}")]
    Provider {
        job_id: String,
        #[source]
        source: AgentError,
    },

    /// The local notifier failed to deliver.
    #[error("notifier failed for job '{job_id}': {source}")]
    Notifier {
        job_id: String,
        #[source]
        source: AgentError,
    },
}
