//! Browser session boundary.
//!
//! The pipeline only needs a navigable, DOM-queryable surface:
//!
//! ```text
//! navigate(url) → wait_for(selector) → query(selector) → element.text()/attribute()
//! ```
//!
//! [`ChromeSession`] implements it with headless Chrome via chromiumoxide.
//! Queries never fail: a selector that matches nothing, or an element that
//! has gone stale, yields an empty result.

mod chrome;
mod config;
#[cfg(test)]
pub(crate) mod fake;

pub use chrome::ChromeSession;
pub use config::BrowserConfig;

use std::time::Duration;

use async_trait::async_trait;

use crate::app::Result;

pub type Element = Box<dyn ElementHandle>;

/// A DOM element on the current page.
#[async_trait]
pub trait ElementHandle: Send + Sync {
    /// Rendered text, trimmed. `None` when unavailable.
    async fn text(&self) -> Option<String>;

    async fn attribute(&self, name: &str) -> Option<String>;

    /// Descendants matching a CSS selector, in document order.
    async fn find_all(&self, selector: &str) -> Vec<Element>;

    async fn find_first(&self, selector: &str) -> Option<Element> {
        self.find_all(selector).await.into_iter().next()
    }

    async fn is_visible(&self) -> bool;

    async fn click(&self) -> Result<()>;

    /// Call a JavaScript function with the element bound to `this` and
    /// return its result as a string.
    async fn call_script(&self, function: &str) -> Option<String>;
}

#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Load `url` in the session's page.
    ///
    /// Fails with `Navigation` for page-level problems and `SessionFatal`
    /// when the browser itself is gone.
    async fn navigate(&self, url: &str) -> Result<()>;

    async fn query(&self, selector: &str) -> Vec<Element>;

    async fn find_first(&self, selector: &str) -> Option<Element> {
        self.query(selector).await.into_iter().next()
    }

    /// Wait until at least one element matches, failing with `WaitTimeout`.
    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<()>;

    async fn execute_script(&self, script: &str) -> Result<serde_json::Value>;

    /// Terminate the session. Safe to call more than once.
    async fn close(&self) -> Result<()>;
}

#[async_trait]
impl<T: BrowserSession + ?Sized> BrowserSession for std::sync::Arc<T> {
    async fn navigate(&self, url: &str) -> Result<()> {
        (**self).navigate(url).await
    }

    async fn query(&self, selector: &str) -> Vec<Element> {
        (**self).query(selector).await
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<()> {
        (**self).wait_for(selector, timeout).await
    }

    async fn execute_script(&self, script: &str) -> Result<serde_json::Value> {
        (**self).execute_script(script).await
    }

    async fn close(&self) -> Result<()> {
        (**self).close().await
    }
}
