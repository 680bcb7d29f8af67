use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::paths::Paths;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserConfig {
    /// Explicit browser binary path. When unset, well-known Chrome/Chromium
    /// locations are probed at launch time.
    #[serde(default)]
    pub binary: Option<String>,
    #[serde(default = "default_debug_port")]
    pub debug_port: u16,
    #[serde(default = "default_launch_timeout_secs")]
    pub launch_timeout_secs: u64,
    #[serde(default = "default_navigation_timeout_secs")]
    pub navigation_timeout_secs: u64,
}

fn default_debug_port() -> u16 {
    9222
}

fn default_launch_timeout_secs() -> u64 {
    15
}

fn default_navigation_timeout_secs() -> u64 {
    30
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            binary: None,
            debug_port: default_debug_port(),
            launch_timeout_secs: default_launch_timeout_secs(),
            navigation_timeout_secs: default_navigation_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditConfig {
    /// Audit engine executable. Resolved through PATH when not absolute.
    #[serde(default = "default_engine_command")]
    pub engine_command: String,
    #[serde(default = "default_run_timeout_secs")]
    pub run_timeout_secs: u64,
}

fn default_engine_command() -> String {
    "lighthouse".to_string()
}

fn default_run_timeout_secs() -> u64 {
    120
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            engine_command: default_engine_command(),
            run_timeout_secs: default_run_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub audit: AuditConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Load the config file, or write defaults back on first run.
    pub fn load_or_init(paths: &Paths) -> Result<Self> {
        let config_path = paths.config_file();
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            let config = Self::default();
            config.save(&config_path)?;
            Ok(config)
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }
}
