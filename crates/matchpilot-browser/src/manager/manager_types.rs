//! Browser manager type definitions and configuration.

use std::path::PathBuf;
use std::time::Duration;

use matchpilot_config::BrowserConfig;
use matchpilot_core::PageError;
use thiserror::Error;

use crate::cdp::CdpError;

/// Browser manager errors.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Action failed: {0}")]
    ActionFailed(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Browser not connected")]
    NotConnected,

    #[error("Chrome not found. Please install Google Chrome or Chromium.")]
    ChromeNotFound,

    #[error("Failed to launch Chrome: {0}")]
    LaunchFailed(String),

    #[error(transparent)]
    Page(PageError),
}

impl From<CdpError> for BrowserError {
    fn from(e: CdpError) -> Self {
        match e {
            CdpError::ConnectionFailed(msg) => BrowserError::ConnectionFailed(msg),
            CdpError::ChromeNotAvailable(msg) => BrowserError::ConnectionFailed(msg),
            CdpError::NavigationFailed(msg) => BrowserError::NavigationFailed(msg),
            CdpError::Timeout(msg) => BrowserError::Timeout(msg),
            CdpError::SessionClosed | CdpError::WebSocket(_) => BrowserError::NotConnected,
            other => BrowserError::Page(other.into()),
        }
    }
}

impl From<BrowserError> for PageError {
    fn from(e: BrowserError) -> Self {
        match e {
            BrowserError::ConnectionFailed(_) | BrowserError::NotConnected => PageError::Disconnected,
            BrowserError::NavigationFailed(msg) => PageError::Navigation(msg),
            BrowserError::Timeout(msg) => PageError::Timeout(msg),
            BrowserError::Page(inner) => inner,
            other => PageError::Other(other.to_string()),
        }
    }
}

/// Browser configuration.
#[derive(Debug, Clone)]
pub struct BrowserManagerConfig {
    /// Chrome debugging port.
    pub debug_port: u16,
    /// Profile directory for persistent login state.
    pub profile_dir: Option<PathBuf>,
    /// Whether to run Chrome in headless mode.
    pub headless: bool,
    /// Accept invalid TLS certificates.
    pub ignore_https_errors: bool,
    /// Extra flags appended to the Chrome command line.
    pub extra_args: Vec<String>,
    /// Upper bound for a single CDP command, and for a new page to load.
    pub command_timeout: Duration,
    /// Interval between target scans while waiting for a new view.
    pub target_poll_interval: Duration,
}

impl Default for BrowserManagerConfig {
    fn default() -> Self {
        Self {
            debug_port: 9222,
            profile_dir: None,
            headless: false,
            ignore_https_errors: true,
            extra_args: Vec::new(),
            command_timeout: Duration::from_secs(30),
            target_poll_interval: Duration::from_millis(250),
        }
    }
}

impl BrowserManagerConfig {
    pub fn from_config(config: &BrowserConfig) -> Self {
        Self {
            debug_port: config.debug_port,
            profile_dir: config.profile_dir.clone(),
            headless: config.headless,
            ignore_https_errors: config.ignore_https_errors,
            extra_args: config.extra_args.clone(),
            ..Self::default()
        }
    }

    /// Get the profile directory, creating default if not specified.
    pub fn get_profile_dir(&self) -> PathBuf {
        self.profile_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".matchpilot")
                .join("browser-profile")
        })
    }

    /// Get the CDP endpoint URL.
    pub fn endpoint(&self) -> String {
        format!("http://127.0.0.1:{}", self.debug_port)
    }

    /// Command-line flags for a Chrome we launch ourselves.
    pub fn chrome_args(&self) -> Vec<String> {
        let mut args = vec![
            format!("--remote-debugging-port={}", self.debug_port),
            format!("--user-data-dir={}", self.get_profile_dir().display()),
            "--no-first-run".to_string(),
            "--no-default-browser-check".to_string(),
            "--disable-extensions".to_string(),
            // The contest site is plain HTTP on a public host.
            "--disable-features=BlockInsecurePrivateNetworkRequests,UpgradeInsecureRequests"
                .to_string(),
        ];
        if self.ignore_https_errors {
            args.push("--ignore-certificate-errors".to_string());
        }
        if self.headless {
            args.push("--headless=new".to_string());
        }
        args.extend(self.extra_args.iter().cloned());
        args
    }
}
