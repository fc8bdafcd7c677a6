use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as LaunchConfig};
use chromiumoxide::Handler;
use chromiumoxide::{Element as CdpElement, Page};
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::app::{PipelineError, Result};
use crate::browser::config::BrowserConfig;
use crate::browser::{BrowserSession, Element, ElementHandle};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Headless Chrome session driving a single page.
pub struct ChromeSession {
    browser: Mutex<Option<Browser>>,
    page: Page,
    handler: JoinHandle<()>,
    alive: Arc<AtomicBool>,
    /// Connected to a browser this process does not own
    remote: bool,
    config: BrowserConfig,
}

impl ChromeSession {
    /// Launch a local browser, or connect to `remote_url` when one is
    /// configured, and open the page the crawl will reuse.
    pub async fn launch(config: BrowserConfig) -> Result<Self> {
        let remote = config.remote_endpoint();
        let (browser, mut handler) = match remote {
            Some(ref url) => connect_remote(url, &config).await?,
            None => launch_local(&config).await?,
        };

        // The handler stream ends when the browser connection goes away
        let alive = Arc::new(AtomicBool::new(true));
        let flag = alive.clone();
        let handler = tokio::spawn(async move {
            while let Some(_event) = handler.next().await {}
            flag.store(false, Ordering::SeqCst);
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| PipelineError::SessionFatal(format!("Failed to create page: {}", e)))?;

        if let Some(ref ua) = config.user_agent {
            page.set_user_agent(ua)
                .await
                .map_err(|e| PipelineError::Browser(format!("Failed to set user agent: {}", e)))?;
        }

        match remote {
            Some(ref url) => tracing::info!(endpoint = %url, "Browser session started"),
            None => tracing::info!(headless = config.headless, "Browser session started"),
        }

        Ok(Self {
            browser: Mutex::new(Some(browser)),
            page,
            handler,
            alive,
            remote: remote.is_some(),
            config,
        })
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    fn ensure_alive(&self) -> Result<()> {
        if self.is_alive() {
            Ok(())
        } else {
            Err(PipelineError::SessionFatal(
                "browser connection closed".to_string(),
            ))
        }
    }
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.ensure_alive()?;

        let timeout = self.config.navigation_timeout();
        match tokio::time::timeout(timeout, self.page.goto(url)).await {
            Err(_) => {
                return Err(PipelineError::Navigation {
                    url: url.to_string(),
                    reason: format!("timed out after {}s", timeout.as_secs()),
                });
            }
            Ok(Err(e)) => {
                self.ensure_alive()?;
                return Err(PipelineError::Navigation {
                    url: url.to_string(),
                    reason: e.to_string(),
                });
            }
            Ok(Ok(_)) => {}
        }

        // Additional wait for dynamic content
        tokio::time::sleep(self.config.wait_after_load()).await;
        Ok(())
    }

    async fn query(&self, selector: &str) -> Vec<Element> {
        match self.page.find_elements(selector).await {
            Ok(elements) => wrap(elements),
            Err(e) => {
                tracing::trace!("Query {} failed: {}", selector, e);
                Vec::new()
            }
        }
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            self.ensure_alive()?;
            if self.page.find_element(selector).await.is_ok() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(PipelineError::WaitTimeout {
                    selector: selector.to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn execute_script(&self, script: &str) -> Result<serde_json::Value> {
        self.ensure_alive()?;
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| PipelineError::Browser(format!("Script execution failed: {}", e)))?;
        Ok(result
            .into_value::<serde_json::Value>()
            .unwrap_or(serde_json::Value::Null))
    }

    async fn close(&self) -> Result<()> {
        let Some(mut browser) = self.browser.lock().await.take() else {
            return Ok(());
        };

        if self.remote {
            // Leave the shared browser running; only give back our tab
            if self.is_alive() {
                if let Err(e) = self.page.clone().close().await {
                    tracing::warn!("Page did not close cleanly: {}", e);
                }
            }
        } else {
            if self.is_alive() {
                if let Err(e) = browser.close().await {
                    tracing::warn!("Browser did not close cleanly: {}", e);
                }
            }
            if let Err(e) = browser.wait().await {
                tracing::debug!("Waiting for browser process failed: {}", e);
            }
        }
        drop(browser);
        self.handler.abort();

        tracing::info!("Browser session closed");
        Ok(())
    }
}

async fn launch_local(config: &BrowserConfig) -> Result<(Browser, Handler)> {
    let mut builder = LaunchConfig::builder()
        .arg("--no-sandbox")
        .arg("--disable-gpu")
        .arg("--disable-dev-shm-usage")
        .arg("--disable-notifications")
        .arg("--disable-software-rasterizer")
        .request_timeout(config.navigation_timeout());

    if !config.headless {
        builder = builder.with_head();
    }
    if let Some(ref path) = config.chrome_path {
        builder = builder.chrome_executable(path);
    }

    let launch_config = builder
        .build()
        .map_err(|e| PipelineError::SessionFatal(format!("Failed to build browser config: {}", e)))?;

    Browser::launch(launch_config).await.map_err(|e| {
        PipelineError::SessionFatal(format!(
            "Failed to launch browser: {}. Is Chrome or Chromium installed and in PATH?",
            e
        ))
    })
}

async fn connect_remote(url: &str, config: &BrowserConfig) -> Result<(Browser, Handler)> {
    tracing::info!("Connecting to remote browser at {}", url);
    retry_connect(config.connect_attempts, config.connect_retry(), |_| {
        Browser::connect(url.to_string())
    })
    .await
    .map_err(|e| {
        PipelineError::SessionFatal(format!(
            "Failed to connect to remote browser at {} after {} attempts: {}",
            url,
            config.connect_attempts.max(1),
            e
        ))
    })
}

/// Call `connect` until it succeeds, sleeping `delay` between tries.
/// At least one attempt is made; the last error is returned.
async fn retry_connect<T, E, F, Fut>(
    attempts: u32,
    delay: Duration,
    mut connect: F,
) -> std::result::Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    E: fmt::Display,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match connect(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts => {
                tracing::warn!("Browser connection attempt {}/{} failed: {}", attempt, attempts, e);
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

fn wrap(elements: Vec<CdpElement>) -> Vec<Element> {
    elements
        .into_iter()
        .map(|e| Box::new(ChromeElement(e)) as Element)
        .collect()
}

struct ChromeElement(CdpElement);

#[async_trait]
impl ElementHandle for ChromeElement {
    async fn text(&self) -> Option<String> {
        self.0
            .inner_text()
            .await
            .ok()
            .flatten()
            .map(|t| t.trim().to_string())
    }

    async fn attribute(&self, name: &str) -> Option<String> {
        self.0.attribute(name).await.ok().flatten()
    }

    async fn find_all(&self, selector: &str) -> Vec<Element> {
        self.0
            .find_elements(selector)
            .await
            .map(wrap)
            .unwrap_or_default()
    }

    async fn is_visible(&self) -> bool {
        const VISIBLE: &str = "function() { \
            const r = this.getBoundingClientRect(); \
            return r.width > 0 && r.height > 0 && getComputedStyle(this).visibility !== 'hidden'; }";
        matches!(self.call_script(VISIBLE).await.as_deref(), Some("true"))
    }

    async fn click(&self) -> Result<()> {
        // Script click works on overlays that intercept pointer events
        self.0
            .call_js_fn("function() { this.click(); }", false)
            .await
            .map_err(|e| PipelineError::Browser(format!("Click failed: {}", e)))?;
        Ok(())
    }

    async fn call_script(&self, function: &str) -> Option<String> {
        let returns = self.0.call_js_fn(function, false).await.ok()?;
        match returns.result.value? {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s),
            other => Some(other.to_string()),
        }
    }
}
