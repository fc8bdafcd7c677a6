use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the headless browser session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Whether to run the browser in headless mode (default: true)
    pub headless: bool,

    /// Chrome/Chromium executable; auto-detected when unset
    pub chrome_path: Option<PathBuf>,

    /// Page navigation timeout in seconds (default: 30)
    pub navigation_timeout_secs: u64,

    /// Bound on waiting for article elements to appear, in seconds (default: 15)
    pub wait_timeout_secs: u64,

    /// Pause after navigation for dynamic content in milliseconds (default: 2000)
    pub wait_after_load_ms: u64,

    /// How long to look for a cookie/consent prompt in milliseconds (default: 5000)
    pub consent_timeout_ms: u64,

    /// User agent string to use
    pub user_agent: Option<String>,

    /// DevTools endpoint of an already running browser, e.g.
    /// `http://chrome:9222`. When set, no local browser is launched.
    /// `NEWSREEL_BROWSER_URL` overrides it.
    pub remote_url: Option<String>,

    /// Connection attempts against `remote_url` before giving up (default: 10)
    pub connect_attempts: u32,

    /// Pause between connection attempts in milliseconds (default: 2000)
    pub connect_retry_ms: u64,
}

/// Environment variable that overrides `browser.remote_url`.
pub const REMOTE_URL_ENV: &str = "NEWSREEL_BROWSER_URL";

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            chrome_path: None,
            navigation_timeout_secs: 30,
            wait_timeout_secs: 15,
            wait_after_load_ms: 2000,
            consent_timeout_ms: 5000,
            user_agent: Some(
                "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36"
                    .to_string(),
            ),
            remote_url: None,
            connect_attempts: 10,
            connect_retry_ms: 2000,
        }
    }
}

impl BrowserConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    pub fn wait_after_load(&self) -> Duration {
        Duration::from_millis(self.wait_after_load_ms)
    }

    pub fn consent_timeout(&self) -> Duration {
        Duration::from_millis(self.consent_timeout_ms)
    }

    pub fn connect_retry(&self) -> Duration {
        Duration::from_millis(self.connect_retry_ms)
    }

    /// Remote endpoint to connect to, if any. The environment wins over the file.
    pub fn remote_endpoint(&self) -> Option<String> {
        pick_endpoint(std::env::var(REMOTE_URL_ENV).ok(), self.remote_url.as_deref())
    }
}

fn pick_endpoint(env: Option<String>, configured: Option<&str>) -> Option<String> {
    env.or_else(|| configured.map(str::to_string))
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
}
