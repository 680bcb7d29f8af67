//! Audit engine invocation.
//!
//! Drives the external engine CLI against the page already opened by the
//! browser session, over the session's debug port. The engine writes a JSON
//! report to the computed report path; when it also emits the report on
//! stdout, that becomes the in-memory result for the Direct resolution tier.

use chrono::{DateTime, Utc};
use pagelens_core::config::AuditConfig;
use pagelens_core::{Error, Result};
use serde_json::{json, Value};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info};

use super::aggregate::Category;

pub struct AuditRunner {
    config: AuditConfig,
}

impl AuditRunner {
    pub fn new(config: AuditConfig) -> Self {
        Self { config }
    }

    /// Run the engine against `url` through `debug_port`, writing the report
    /// to `report_path`. Returns the engine's stdout report when it emitted
    /// one; resolution falls back to the written file otherwise.
    pub async fn run(
        &self,
        url: &str,
        debug_port: u16,
        report_path: &Path,
    ) -> Result<Option<Value>> {
        let settings_path = std::env::temp_dir().join("pagelens-engine-settings.json");
        std::fs::write(&settings_path, gating_settings().to_string())
            .map_err(|e| Error::AuditEngine(format!("Failed to write engine settings: {}", e)))?;

        info!(engine = %self.config.engine_command, url = %url, port = debug_port, "Running audit");

        let mut cmd = Command::new(&self.config.engine_command);
        cmd.arg(url)
            .arg(format!("--port={}", debug_port))
            .arg("--output=json")
            .arg(format!("--output-path={}", report_path.display()))
            .arg(format!("--config-path={}", settings_path.display()))
            .arg("--quiet")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let run_timeout = Duration::from_secs(self.config.run_timeout_secs);
        let output = timeout(run_timeout, cmd.output())
            .await
            .map_err(|_| {
                Error::Timeout(format!(
                    "Audit engine did not finish within {}s",
                    run_timeout.as_secs()
                ))
            })?
            .map_err(|e| {
                Error::AuditEngine(format!(
                    "Failed to run {}: {}",
                    self.config.engine_command, e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::AuditEngine(format!(
                "{} exited with {}: {}",
                self.config.engine_command,
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let raw = serde_json::from_str::<Value>(stdout.trim()).ok();
        debug!(direct = raw.is_some(), "Audit engine finished");
        Ok(raw)
    }
}

/// Engine configuration: default rule set with every category gate zeroed so
/// the engine never withholds results on low scores.
fn gating_settings() -> Value {
    let mut categories = serde_json::Map::new();
    for category in Category::ALL {
        categories.insert(category.as_str().to_string(), json!({"score": 0}));
    }
    json!({
        "extends": "lighthouse:default",
        "categories": categories,
    })
}

/// Report filename for a request: a pure function of hostname and request
/// timestamp. Dots in the hostname become dashes; the timestamp is UTC
/// ISO-8601 with colons as dashes and fractional seconds stripped.
pub fn report_file_name(url: &str, now: DateTime<Utc>) -> Result<String> {
    let parsed = url::Url::parse(url)
        .map_err(|e| Error::Validation(format!("Invalid URL '{}': {}", url, e)))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| Error::Validation(format!("URL '{}' has no host", url)))?
        .replace('.', "-");
    Ok(format!(
        "lighthouse-{}-{}.json",
        host,
        now.format("%Y-%m-%dT%H-%M-%S")
    ))
}
