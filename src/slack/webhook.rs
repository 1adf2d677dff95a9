//! Incoming-webhook client for block messages.

use std::time::Duration;

use serde_json::json;

use crate::error::AgentError;
use crate::report::blocks::{validate_blocks, Block};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Posts block messages to one incoming webhook URL.
pub struct SlackWebhook {
    url: String,
    client: reqwest::Client,
}

impl SlackWebhook {
    pub fn new(url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            url: url.into(),
            client,
        }
    }

    /// Validate and send. `text` is the notification fallback line. A block
    /// tree with violations is never transmitted — the error lists all of
    /// them so the layout bug is debuggable from the log alone.
    pub async fn post_blocks(&self, text: &str, blocks: &[Block]) -> Result<(), AgentError> {
        let violations = validate_blocks(blocks);
        if !violations.is_empty() {
            return Err(AgentError::InvalidMessage(violations));
        }

        let body = json!({
            "text": text,
            "blocks": blocks,
        });

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::connection("chat webhook", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AgentError::Http {
                status: status.as_u16(),
                endpoint: "incoming webhook".into(),
            });
        }

        Ok(())
    }

    /// Plain-text post, for messages that have no block form.
    pub async fn post_text(&self, text: &str) -> Result<(), AgentError> {
        self.post_blocks(text, &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_blocks_refused_before_send() {
        let webhook = SlackWebhook::new("https://hooks.invalid/services/T/B/X");
        let bad = vec![Block::header("x".repeat(151)), Block::fields(vec![])];

        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let err = rt
            .block_on(webhook.post_blocks("fallback", &bad))
            .expect_err("violations must refuse the send");

        match err {
            AgentError::InvalidMessage(violations) => assert_eq!(violations.len(), 2),
            other => panic!("expected InvalidMessage, got {other}"),
        }
    }
}
