//! Suite configuration

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{E2eError, E2eResult};

/// Default address of the application under test (local dev server).
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Environment variable that overrides [`DEFAULT_BASE_URL`].
pub const BASE_URL_ENV: &str = "AUTHFLOW_BASE_URL";

/// Configuration shared by every scenario in a run
#[derive(Debug, Clone)]
pub struct SuiteConfig {
    /// Root address of the application, without a trailing slash
    pub base_url: String,

    /// How long to keep looking for a form field before giving up
    pub element_timeout: Duration,

    /// How long to wait for the post-submit outcome
    pub wait_timeout: Duration,

    /// Polling cadence for element lookups and outcome waits
    pub poll_interval: Duration,

    /// Browser settings
    pub browser: BrowserOptions,

    /// Seed the fixture accounts before running
    pub seed_fixtures: bool,

    /// How long the reachability preflight may take
    pub preflight_timeout: Duration,

    /// Output directory for results
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct BrowserOptions {
    pub headless: bool,

    /// Chrome/Chromium binary (None = let the driver locate one)
    pub chrome_executable: Option<PathBuf>,

    pub window_width: u32,
    pub window_height: u32,

    /// Pass `--no-sandbox` (needed when running as root in containers)
    pub no_sandbox: bool,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: true,
            chrome_executable: None,
            window_width: 1280,
            window_height: 720,
            no_sandbox: false,
        }
    }
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            element_timeout: Duration::from_secs(10),
            wait_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(500),
            browser: BrowserOptions::default(),
            seed_fixtures: false,
            preflight_timeout: Duration::from_secs(30),
            output_dir: PathBuf::from("test-results"),
        }
    }
}

impl SuiteConfig {
    /// Default configuration pointed at another base address
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(&base_url.into()),
            ..Default::default()
        }
    }

    /// Absolute URL for an application path such as `/login`
    pub fn url_for(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        format!("{}/{}", self.base_url, path)
    }

    pub fn validate(&self) -> E2eResult<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(E2eError::InvalidConfig(format!(
                "base URL must start with http:// or https://, got '{}'",
                self.base_url
            )));
        }

        for (name, value) in [
            ("element timeout", self.element_timeout),
            ("wait timeout", self.wait_timeout),
            ("poll interval", self.poll_interval),
        ] {
            if value.is_zero() {
                return Err(E2eError::InvalidConfig(format!("{} must be non-zero", name)));
            }
        }

        if self.poll_interval > self.element_timeout || self.poll_interval > self.wait_timeout {
            return Err(E2eError::InvalidConfig(format!(
                "poll interval {:?} exceeds a timeout",
                self.poll_interval
            )));
        }

        Ok(())
    }
}

/// Strip trailing slashes so paths can be appended with a single `/`
pub fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
