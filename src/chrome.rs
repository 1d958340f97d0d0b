//! Chrome discovery and launch for test harnesses.
//!
//! Test runs need a Chrome with remote debugging enabled. `Browser::launch`
//! reuses an instance already listening on the configured port, or starts
//! one with an isolated profile, then connects a CDP client to it.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::process::{Child, Command};
use tracing::{info, warn};

use crate::cdp::{CdpClient, CdpError, PageSession};

/// Browser harness errors.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Chrome not found. Please install Google Chrome or Chromium.")]
    ChromeNotFound,

    #[error("Failed to launch Chrome: {0}")]
    LaunchFailed(String),

    #[error("Chrome did not become ready on port {0}")]
    NotReady(u16),

    #[error(transparent)]
    Cdp(#[from] CdpError),
}

/// Browser harness configuration.
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Chrome debugging port.
    pub debug_port: u16,
    /// Viewport width.
    pub viewport_width: u32,
    /// Viewport height.
    pub viewport_height: u32,
    /// Profile directory; a per-user default is used when unset.
    pub profile_dir: Option<PathBuf>,
    /// Whether to run Chrome headless.
    pub headless: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            debug_port: 9222,
            viewport_width: 1280,
            viewport_height: 720,
            profile_dir: None,
            headless: true,
        }
    }
}

impl BrowserConfig {
    /// Get the profile directory, falling back to a per-user default.
    pub fn get_profile_dir(&self) -> PathBuf {
        self.profile_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".mercury-e2e")
                .join("browser-profile")
        })
    }

    /// Get the CDP endpoint URL.
    pub fn endpoint(&self) -> String {
        format!("http://localhost:{}", self.debug_port)
    }
}

/// A connected browser, possibly launched by this harness.
pub struct Browser {
    config: BrowserConfig,
    client: CdpClient,
    /// Chrome process handle (if we launched it).
    process: Option<Child>,
}

impl Browser {
    /// Connect to Chrome on the configured port, launching it first when
    /// nothing is listening there.
    pub async fn launch(config: BrowserConfig) -> Result<Self, BrowserError> {
        let mut process = None;

        if !is_chrome_running(&config).await {
            info!(
                "Chrome not running on port {}, launching...",
                config.debug_port
            );
            let child = launch_chrome(&config).await?;
            process = Some(child);

            let mut attempts = 0;
            loop {
                tokio::time::sleep(Duration::from_millis(200)).await;
                if is_chrome_running(&config).await {
                    break;
                }
                attempts += 1;
                if attempts >= 30 {
                    return Err(BrowserError::NotReady(config.debug_port));
                }
            }
        }

        let client = CdpClient::connect(&config.endpoint()).await?;
        Ok(Self {
            config,
            client,
            process,
        })
    }

    /// Find Chrome executable path.
    pub fn find_chrome() -> Option<PathBuf> {
        #[cfg(target_os = "macos")]
        let paths = [
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
        ];

        #[cfg(target_os = "linux")]
        let paths = [
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/snap/bin/chromium",
        ];

        #[cfg(target_os = "windows")]
        let paths = [
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
        ];

        paths.iter().map(PathBuf::from).find(|p| p.exists())
    }

    /// The connected CDP client.
    pub fn client(&self) -> &CdpClient {
        &self.client
    }

    /// The configuration this browser was launched with.
    pub fn config(&self) -> &BrowserConfig {
        &self.config
    }

    /// Open a new page at the given URL.
    pub async fn open(&self, url: &str) -> Result<PageSession, BrowserError> {
        Ok(self.client.new_page(Some(url)).await?)
    }

    /// Shut down the launched Chrome process, if any.
    pub async fn shutdown(mut self) -> Result<(), BrowserError> {
        if let Some(mut child) = self.process.take() {
            if let Err(e) = child.kill().await {
                warn!("Failed to kill Chrome process: {}", e);
            }
        }
        Ok(())
    }
}

async fn is_chrome_running(config: &BrowserConfig) -> bool {
    reqwest::get(format!("{}/json/version", config.endpoint()))
        .await
        .is_ok()
}

async fn launch_chrome(config: &BrowserConfig) -> Result<Child, BrowserError> {
    let chrome_path = Browser::find_chrome().ok_or(BrowserError::ChromeNotFound)?;
    let profile_dir = config.get_profile_dir();

    if let Err(e) = std::fs::create_dir_all(&profile_dir) {
        warn!("Failed to create profile directory: {}", e);
    }

    info!("Launching Chrome with profile at: {}", profile_dir.display());

    let mut cmd = Command::new(&chrome_path);
    cmd.arg(format!("--remote-debugging-port={}", config.debug_port))
        .arg(format!("--user-data-dir={}", profile_dir.display()))
        .arg(format!(
            "--window-size={},{}",
            config.viewport_width, config.viewport_height
        ))
        .arg("--no-first-run")
        .arg("--no-default-browser-check")
        .arg("--disable-background-networking")
        .arg("--disable-sync")
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    if config.headless {
        cmd.arg("--headless=new");
    }

    let child = cmd
        .spawn()
        .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

    info!("Chrome launched with PID: {:?}", child.id());
    Ok(child)
}

#[cfg(test)]
#[path = "chrome_tests.rs"]
mod tests;
