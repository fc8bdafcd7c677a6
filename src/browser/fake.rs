//! In-memory browser used by the test suite.
//!
//! Pages are keyed by URL and elements by the exact selector string the
//! code under test queries with.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::app::{PipelineError, Result};
use crate::browser::{BrowserSession, Element, ElementHandle};

#[derive(Debug, Clone, Default)]
pub struct FakeElement {
    text: Option<String>,
    attributes: HashMap<String, String>,
    children: HashMap<String, Vec<FakeElement>>,
    scripts: Vec<(String, String)>,
    hidden: bool,
    clicks: Arc<AtomicUsize>,
}

impl FakeElement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn child(mut self, selector: &str, child: FakeElement) -> Self {
        self.children
            .entry(selector.to_string())
            .or_default()
            .push(child);
        self
    }

    /// Answer `call_script` for any function containing `needle`.
    pub fn script(mut self, needle: &str, result: &str) -> Self {
        self.scripts.push((needle.to_string(), result.to_string()));
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn clicks(&self) -> usize {
        self.clicks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ElementHandle for FakeElement {
    async fn text(&self) -> Option<String> {
        self.text.clone()
    }

    async fn attribute(&self, name: &str) -> Option<String> {
        self.attributes.get(name).cloned()
    }

    async fn find_all(&self, selector: &str) -> Vec<Element> {
        boxed(self.children.get(selector))
    }

    async fn is_visible(&self) -> bool {
        !self.hidden
    }

    async fn click(&self) -> Result<()> {
        self.clicks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn call_script(&self, function: &str) -> Option<String> {
        self.scripts
            .iter()
            .find(|(needle, _)| function.contains(needle.as_str()))
            .map(|(_, result)| result.clone())
    }
}

fn boxed(elements: Option<&Vec<FakeElement>>) -> Vec<Element> {
    elements
        .map(|list| {
            list.iter()
                .cloned()
                .map(|e| Box::new(e) as Element)
                .collect()
        })
        .unwrap_or_default()
}

#[derive(Debug, Clone, Default)]
pub struct FakePage {
    elements: HashMap<String, Vec<FakeElement>>,
    scripts: Vec<(String, serde_json::Value)>,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, selector: &str, element: FakeElement) -> Self {
        self.elements
            .entry(selector.to_string())
            .or_default()
            .push(element);
        self
    }

    pub fn with_all(mut self, selector: &str, elements: Vec<FakeElement>) -> Self {
        self.elements
            .entry(selector.to_string())
            .or_default()
            .extend(elements);
        self
    }

    /// Answer `execute_script` for any script containing `needle`.
    pub fn script(mut self, needle: &str, result: serde_json::Value) -> Self {
        self.scripts.push((needle.to_string(), result));
        self
    }
}

#[derive(Debug, Default)]
pub struct FakeSession {
    pages: HashMap<String, FakePage>,
    failing: HashSet<String>,
    fatal: HashSet<String>,
    current: Mutex<Option<String>>,
    visited: Mutex<Vec<String>>,
    scripts: Mutex<Vec<String>>,
    closes: AtomicUsize,
    lost: AtomicBool,
}

impl FakeSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, page: FakePage) -> Self {
        self.pages.insert(url.to_string(), page);
        self
    }

    /// Navigating to `url` fails with a page-level error.
    pub fn failing(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    /// Navigating to `url` kills the session.
    pub fn fatal(mut self, url: &str) -> Self {
        self.fatal.insert(url.to_string());
        self
    }

    pub fn visited(&self) -> Vec<String> {
        self.visited.lock().unwrap().clone()
    }

    pub fn scripts(&self) -> Vec<String> {
        self.scripts.lock().unwrap().clone()
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    fn current_page(&self) -> Option<FakePage> {
        let current = self.current.lock().unwrap();
        current.as_ref().and_then(|url| self.pages.get(url).cloned())
    }
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn navigate(&self, url: &str) -> Result<()> {
        if self.lost.load(Ordering::SeqCst) || self.closes.load(Ordering::SeqCst) > 0 {
            return Err(PipelineError::SessionFatal("session closed".into()));
        }
        self.visited.lock().unwrap().push(url.to_string());

        if self.fatal.contains(url) {
            self.lost.store(true, Ordering::SeqCst);
            return Err(PipelineError::SessionFatal("browser crashed".into()));
        }
        if self.failing.contains(url) || !self.pages.contains_key(url) {
            return Err(PipelineError::Navigation {
                url: url.to_string(),
                reason: "net::ERR_CONNECTION_REFUSED".into(),
            });
        }

        *self.current.lock().unwrap() = Some(url.to_string());
        Ok(())
    }

    async fn query(&self, selector: &str) -> Vec<Element> {
        let page = self.current_page();
        boxed(page.as_ref().and_then(|p| p.elements.get(selector)))
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<()> {
        if self.query(selector).await.is_empty() {
            return Err(PipelineError::WaitTimeout {
                selector: selector.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            });
        }
        Ok(())
    }

    async fn execute_script(&self, script: &str) -> Result<serde_json::Value> {
        self.scripts.lock().unwrap().push(script.to_string());
        let result = self.current_page().and_then(|page| {
            page.scripts
                .into_iter()
                .find(|(needle, _)| script.contains(needle.as_str()))
                .map(|(_, value)| value)
        });
        Ok(result.unwrap_or(serde_json::Value::Null))
    }

    async fn close(&self) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
