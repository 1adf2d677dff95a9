//! External file upload — the three-leg Web API protocol.
//!
//! 1. `files.getUploadURLExternal` reserves an upload slot.
//! 2. The raw bytes go to the returned URL (no auth header).
//! 3. `files.completeUploadExternal` finalizes, optionally sharing to a
//!    channel with a caption.
//!
//! Each leg surfaces its own error context. The optional public-share flow
//! degrades gracefully: a share failure falls back to `files.info`, and a
//! missing public permalink is success without a link, not an error.

use std::time::Duration;

use serde_json::{json, Value};

use super::{api_error, is_ok};
use crate::error::AgentError;

const API_BASE: &str = "https://slack.com/api";
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Result of a completed upload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadOutcome {
    pub file_id: String,
    pub permalink: Option<String>,
    pub permalink_public: Option<String>,
}

/// Parameters for one upload.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub title: String,
    /// Post the file to this channel on completion.
    pub channel_id: Option<String>,
    /// Caption shown with the channel post.
    pub initial_comment: Option<String>,
    /// Also try to mint a public permalink.
    pub share_public: bool,
}

/// Web API file uploader, authenticated with a bot token.
pub struct SlackUploader {
    token: String,
    client: reqwest::Client,
}

impl SlackUploader {
    pub fn new(token: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(UPLOAD_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            token: token.into(),
            client,
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!("{API_BASE}/{method}")
    }

    /// Run the full upload protocol.
    pub async fn upload(&self, request: UploadRequest) -> Result<UploadOutcome, AgentError> {
        let (upload_url, file_id) = self
            .get_upload_url(&request.filename, request.bytes.len())
            .await?;

        self.put_bytes(&upload_url, &request.filename, request.bytes)
            .await?;

        let permalink = self
            .complete_upload(
                &file_id,
                &request.title,
                request.channel_id.as_deref(),
                request.initial_comment.as_deref(),
            )
            .await?;

        let permalink_public = if request.share_public {
            self.share_public(&file_id).await
        } else {
            None
        };

        Ok(UploadOutcome {
            file_id,
            permalink,
            permalink_public,
        })
    }

    /// Leg 1 — reserve the upload slot.
    async fn get_upload_url(
        &self,
        filename: &str,
        length: usize,
    ) -> Result<(String, String), AgentError> {
        let payload = self
            .post_form(
                "files.getUploadURLExternal",
                &[("filename", filename.to_string()), ("length", length.to_string())],
            )
            .await?;

        if !is_ok(&payload) {
            return Err(api_error("files.getUploadURLExternal", &payload));
        }

        let upload_url = payload
            .get("upload_url")
            .and_then(Value::as_str)
            .ok_or_else(|| AgentError::Parse("getUploadURLExternal: missing upload_url".into()))?;
        let file_id = payload
            .get("file_id")
            .and_then(Value::as_str)
            .ok_or_else(|| AgentError::Parse("getUploadURLExternal: missing file_id".into()))?;

        Ok((upload_url.to_string(), file_id.to_string()))
    }

    /// Leg 2 — ship the bytes. The upload URL is pre-authorized; no bearer
    /// header goes with this request.
    async fn put_bytes(
        &self,
        upload_url: &str,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<(), AgentError> {
        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AgentError::connection("file upload", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AgentError::Http {
                status: status.as_u16(),
                endpoint: "upload_url".into(),
            });
        }

        Ok(())
    }

    /// Leg 3 — finalize and optionally post to a channel.
    async fn complete_upload(
        &self,
        file_id: &str,
        title: &str,
        channel_id: Option<&str>,
        initial_comment: Option<&str>,
    ) -> Result<Option<String>, AgentError> {
        let files = json!([{"id": file_id, "title": title}]).to_string();
        let mut form: Vec<(&str, String)> = vec![("files", files)];
        if let Some(channel) = channel_id {
            form.push(("channel_id", channel.to_string()));
        }
        if let Some(comment) = initial_comment {
            form.push(("initial_comment", comment.to_string()));
        }

        let payload = self.post_form("files.completeUploadExternal", &form).await?;
        if !is_ok(&payload) {
            return Err(api_error("files.completeUploadExternal", &payload));
        }

        Ok(payload
            .get("files")
            .and_then(|f| f.get(0))
            .and_then(|f| f.get("permalink"))
            .and_then(Value::as_str)
            .map(String::from))
    }

    /// Optional public-share flow. Never fails the upload: an API error falls
    /// back to `files.info`, and a still-missing permalink reads as None.
    async fn share_public(&self, file_id: &str) -> Option<String> {
        match self
            .post_form("files.sharedPublicURL", &[("file", file_id.to_string())])
            .await
        {
            Ok(payload) if is_ok(&payload) => {
                if let Some(link) = extract_permalink_public(&payload) {
                    return Some(link);
                }
            }
            Ok(payload) => {
                log::warn!(
                    "{} — falling back to files.info",
                    api_error("files.sharedPublicURL", &payload)
                );
            }
            Err(e) => {
                log::warn!("files.sharedPublicURL failed: {e} — falling back to files.info");
            }
        }

        match self
            .post_form("files.info", &[("file", file_id.to_string())])
            .await
        {
            Ok(payload) if is_ok(&payload) => extract_permalink_public(&payload),
            Ok(payload) => {
                log::warn!("{}", api_error("files.info", &payload));
                None
            }
            Err(e) => {
                log::warn!("files.info failed: {e}");
                None
            }
        }
    }

    /// Form-encoded POST with bearer auth; non-2xx is a transport error.
    async fn post_form(
        &self,
        method: &str,
        form: &[(&str, String)],
    ) -> Result<Value, AgentError> {
        let response = self
            .client
            .post(self.api_url(method))
            .bearer_auth(&self.token)
            .form(form)
            .send()
            .await
            .map_err(|e| AgentError::connection("chat API", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AgentError::Http {
                status: status.as_u16(),
                endpoint: method.to_string(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| AgentError::Parse(format!("{method}: {e}")))
    }
}

fn extract_permalink_public(payload: &Value) -> Option<String> {
    payload
        .get("file")
        .and_then(|f| f.get("permalink_public"))
        .and_then(Value::as_str)
        .map(String::from)
}
