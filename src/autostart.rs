//! launchd integration — install or remove the periodic `tick` agent.
//!
//! Writes a property-list under `~/Library/LaunchAgents` and drives
//! `launchctl` to load or unload it. Dry-run renders the document to stdout
//! (secrets redacted) and touches nothing.

use std::path::{Path, PathBuf};

use tokio::process::Command;

use crate::config::config_dir;
use crate::error::AgentError;

/// launchd job label; also the plist file stem.
pub const LABEL: &str = "com.aw-analyzer.tick";

/// Env vars forwarded into the agent's environment when set.
const FORWARDED_ENV: [&str; 8] = [
    "LLM_API_KEY",
    "LLM_API_BASE",
    "LLM_MODEL",
    "SLACK_WEBHOOK_URL",
    "SLACK_BOT_TOKEN",
    "SLACK_CHANNEL_ID",
    "AW_SERVER_URL",
    "LOG_LEVEL",
];

/// Values for these keys never appear in dry-run output.
const SECRET_ENV: [&str; 3] = ["LLM_API_KEY", "SLACK_BOT_TOKEN", "SLACK_WEBHOOK_URL"];

/// Install the agent: write the plist and `launchctl load` it.
/// `interval_mins` is clamped to at least one minute but has no upper bound.
pub async fn install(interval_mins: u32, dry_run: bool) -> Result<(), AgentError> {
    let interval_secs = interval_mins.max(1) * 60;
    let exe = std::env::current_exe()
        .map_err(|e| AgentError::Config(format!("cannot resolve own executable path: {e}")))?;

    if dry_run {
        println!("{}", plist_document(&exe, interval_secs, true));
        return Ok(());
    }

    let path = plist_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| AgentError::State(format!("create {}: {e}", parent.display())))?;
    }
    std::fs::write(&path, plist_document(&exe, interval_secs, false))
        .map_err(|e| AgentError::State(format!("write {}: {e}", path.display())))?;

    launchctl(&["load", "-w"], &path).await?;
    log::info!("installed {} (every {interval_mins}m)", path.display());
    Ok(())
}

/// Uninstall the agent: `launchctl unload` and remove the plist.
pub async fn uninstall() -> Result<(), AgentError> {
    let path = plist_path()?;
    if !path.exists() {
        log::info!("{} not installed", LABEL);
        return Ok(());
    }

    // Unload before removing; an already-unloaded agent is not an error.
    if let Err(e) = launchctl(&["unload"], &path).await {
        log::warn!("launchctl unload failed: {e}");
    }

    std::fs::remove_file(&path)
        .map_err(|e| AgentError::State(format!("remove {}: {e}", path.display())))?;
    log::info!("removed {}", path.display());
    Ok(())
}

async fn launchctl(args: &[&str], plist: &Path) -> Result<(), AgentError> {
    let output = Command::new("launchctl")
        .args(args)
        .arg(plist)
        .output()
        .await
        .map_err(|e| AgentError::Config(format!("failed to run launchctl: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AgentError::Config(format!(
            "launchctl {} failed: {}",
            args.join(" "),
            stderr.trim()
        )));
    }
    Ok(())
}

fn plist_path() -> Result<PathBuf, AgentError> {
    dirs::home_dir()
        .map(|h| h.join("Library/LaunchAgents").join(format!("{LABEL}.plist")))
        .ok_or_else(|| AgentError::Config("cannot resolve home directory".into()))
}

/// Render the launchd document. `redact` replaces secret values for display.
fn plist_document(exe: &Path, interval_secs: u32, redact: bool) -> String {
    let log_dir = config_dir().unwrap_or_else(|| PathBuf::from(".aw-analyzer"));

    let mut env_entries = String::new();
    for key in FORWARDED_ENV {
        let Ok(value) = std::env::var(key) else {
            continue;
        };
        if value.is_empty() {
            continue;
        }
        let shown = if redact && SECRET_ENV.contains(&key) {
            "********".to_string()
        } else {
            xml_escape(&value)
        };
        env_entries.push_str(&format!(
            "        <key>{key}</key>\n        <string>{shown}</string>\n"
        ));
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
    <key>Label</key>
    <string>{LABEL}</string>
    <key>ProgramArguments</key>
    <array>
        <string>{exe}</string>
        <string>tick</string>
    </array>
    <key>StartInterval</key>
    <integer>{interval_secs}</integer>
    <key>EnvironmentVariables</key>
    <dict>
{env_entries}    </dict>
    <key>StandardOutPath</key>
    <string>{out_log}</string>
    <key>StandardErrorPath</key>
    <string>{err_log}</string>
</dict>
</plist>
"#,
        exe = xml_escape(&exe.display().to_string()),
        out_log = xml_escape(&log_dir.join("tick.log").display().to_string()),
        err_log = xml_escape(&log_dir.join("tick.err.log").display().to_string()),
    )
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
