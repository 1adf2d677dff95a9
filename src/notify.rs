//! Local desktop notifications via the platform's toast utility.
//!
//! Shells out instead of binding a notification library — same trade the
//! GitHub integration makes with the `gh` CLI: reuse what is already on the
//! machine.

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::AgentError;

/// Sink for local notifications. The scheduler only ever sees this trait, so
/// tests can substitute a recorder.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, title: &str, body: &str) -> Result<(), AgentError>;
}

/// Sends toasts with `osascript` on macOS and `notify-send` elsewhere.
pub struct DesktopNotifier;

#[async_trait]
impl Notifier for DesktopNotifier {
    async fn notify(&self, title: &str, body: &str) -> Result<(), AgentError> {
        let output = if cfg!(target_os = "macos") {
            let script = format!(
                "display notification \"{}\" with title \"{}\"",
                escape_applescript(body),
                escape_applescript(title),
            );
            Command::new("osascript").args(["-e", &script]).output().await
        } else {
            Command::new("notify-send").args([title, body]).output().await
        };

        let output = output.map_err(|e| AgentError::Notifier(format!("failed to spawn: {e}")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AgentError::Notifier(format!(
                "exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}

/// Escape double quotes and backslashes for an AppleScript string literal.
fn escape_applescript(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
