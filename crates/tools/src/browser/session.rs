//! Browser session lifecycle.
//!
//! At most one Chrome process and one page exist per manager. The session is
//! created lazily on first use and torn down with an idempotent `close`; the
//! audit engine attaches to the same page through the fixed debug port.

use super::cdp::CdpClient;
use pagelens_core::config::BrowserConfig;
use pagelens_core::{Error, Result};
use serde_json::Value;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};
use tracing::{debug, info};

/// A live browser with its Chrome process and a CDP connection to its page.
pub struct BrowserSession {
    /// Remote debugging port the audit engine attaches to.
    pub debug_port: u16,
    /// Chrome child process.
    chrome_process: Child,
    /// CDP client connected to the page target.
    pub cdp: CdpClient,
}

impl BrowserSession {
    /// Tear the session down: graceful CDP close first, then kill.
    pub async fn shutdown(&mut self) {
        if let Err(e) = self.cdp.close_browser().await {
            debug!("CDP Browser.close failed (may already be closed): {}", e);
        }
        let _ = self.chrome_process.kill().await;
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        // Best-effort kill on drop
        let _ = self.chrome_process.start_kill();
    }
}

/// Owns the single browser/page pair.
///
/// State machine: Closed —ensure→ Open —close→ Closed. `ensure` on an Open
/// manager is a self-loop returning the existing session; `close` on a
/// Closed manager is a no-op.
pub struct SessionManager {
    config: BrowserConfig,
    /// Base directory for the browser profile.
    base_dir: PathBuf,
    session: Option<BrowserSession>,
}

impl SessionManager {
    pub fn new(config: BrowserConfig, base_dir: PathBuf) -> Self {
        Self {
            config,
            base_dir,
            session: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Get the live session, launching the browser only if none exists.
    pub async fn ensure(&mut self) -> Result<&mut BrowserSession> {
        if self.session.is_some() {
            return Ok(self.session.as_mut().unwrap());
        }

        let session = self.launch().await?;
        self.session = Some(session);
        Ok(self.session.as_mut().unwrap())
    }

    /// Ensure a session, then load `url` with a wait-until-load policy.
    ///
    /// A navigation failure propagates as-is; the session is left Open and
    /// the caller owns cleanup.
    pub async fn navigate(&mut self, url: &str) -> Result<()> {
        let timeout = Duration::from_secs(self.config.navigation_timeout_secs);
        let session = self.ensure().await?;
        session.cdp.navigate(url, timeout).await
    }

    /// Release the browser and page handles. Safe to call when already
    /// closed.
    pub async fn close(&mut self) {
        if let Some(mut session) = self.session.take() {
            info!("Closing browser session");
            session.shutdown().await;
        }
    }

    async fn launch(&self) -> Result<BrowserSession> {
        let browser_path = match &self.config.binary {
            Some(path) => path.clone(),
            None => find_browser_binary().ok_or_else(|| {
                Error::Session("No Chrome/Chromium binary found. Please install one.".to_string())
            })?,
        };

        let user_data_dir = self.base_dir.join("profile");
        std::fs::create_dir_all(&user_data_dir)
            .map_err(|e| Error::Session(format!("Failed to create profile dir: {}", e)))?;

        let debug_port = self.config.debug_port;
        let args = build_chrome_args(debug_port, &user_data_dir);

        info!(port = debug_port, browser = %browser_path, "Launching browser");

        let child = Command::new(&browser_path)
            .args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Session(format!("Failed to launch {}: {}", browser_path, e)))?;

        // Bounded wait for the page target to expose its WebSocket URL.
        let launch_timeout = Duration::from_secs(self.config.launch_timeout_secs);
        let page_ws_url = wait_for_page_ws_url(debug_port, launch_timeout).await?;

        let cdp = CdpClient::connect(&page_ws_url).await?;
        cdp.enable_domain("Page").await?;

        info!(ws_url = %page_ws_url, "CDP connection established (page target)");

        Ok(BrowserSession {
            debug_port,
            chrome_process: child,
            cdp,
        })
    }
}

/// Fixed launch configuration: headless, fixed debug port, certificate-error
/// bypass.
fn build_chrome_args(debug_port: u16, user_data_dir: &std::path::Path) -> Vec<String> {
    vec![
        format!("--remote-debugging-port={}", debug_port),
        format!("--user-data-dir={}", user_data_dir.display()),
        "--headless=new".to_string(),
        "--ignore-certificate-errors".to_string(),
        "--no-first-run".to_string(),
        "--no-default-browser-check".to_string(),
        "--disable-background-networking".to_string(),
        "--disable-extensions".to_string(),
        "--disable-sync".to_string(),
        "--window-size=1280,720".to_string(),
        "about:blank".to_string(),
    ]
}

/// Find a Chrome/Chromium binary on the system.
pub fn find_browser_binary() -> Option<String> {
    let candidates = if cfg!(target_os = "macos") {
        vec![
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
        ]
    } else if cfg!(target_os = "linux") {
        vec![
            "google-chrome",
            "google-chrome-stable",
            "chromium",
            "chromium-browser",
            "/usr/bin/google-chrome",
            "/usr/bin/chromium",
        ]
    } else {
        vec![
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
        ]
    };

    for candidate in candidates {
        if std::path::Path::new(candidate).exists() {
            return Some(candidate.to_string());
        }
        if !candidate.contains('/') && !candidate.contains('\\') && which::which(candidate).is_ok()
        {
            return Some(candidate.to_string());
        }
    }
    None
}

/// Poll Chrome's /json/list endpoint until a page target with a WebSocket
/// URL appears, bounded by `timeout`.
async fn wait_for_page_ws_url(port: u16, timeout: Duration) -> Result<String> {
    let start = std::time::Instant::now();
    let url = format!("http://127.0.0.1:{}/json/list", port);

    loop {
        if start.elapsed() > timeout {
            return Err(Error::Timeout(format!(
                "Browser debug port {} not ready after {}s",
                port,
                timeout.as_secs()
            )));
        }

        if let Ok(resp) = reqwest::get(&url).await {
            if let Ok(targets) = resp.json::<Vec<Value>>().await {
                for target in &targets {
                    if target.get("type").and_then(|v| v.as_str()) == Some("page") {
                        if let Some(ws_url) =
                            target.get("webSocketDebuggerUrl").and_then(|v| v.as_str())
                        {
                            return Ok(ws_url.to_string());
                        }
                    }
                }
            }
        }

        tokio::time::sleep(Duration::from_millis(200)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chrome_args_fixed_launch_configuration() {
        let args = build_chrome_args(9222, std::path::Path::new("/tmp/profile"));
        assert!(args.contains(&"--remote-debugging-port=9222".to_string()));
        assert!(args.contains(&"--headless=new".to_string()));
        assert!(args.contains(&"--ignore-certificate-errors".to_string()));
    }

    #[tokio::test]
    async fn test_close_on_closed_manager_is_noop() {
        let mut mgr =
            SessionManager::new(BrowserConfig::default(), PathBuf::from("/tmp/pagelens-test"));
        assert!(!mgr.is_open());
        mgr.close().await;
        mgr.close().await;
        assert!(!mgr.is_open());
    }
}
