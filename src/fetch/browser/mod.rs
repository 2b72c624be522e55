//! Headless browser abstraction for the dynamic strategy
//!
//! A `Renderer` is one running browser session; each fetch attempt opens a
//! `RenderPage` on it and closes the page when done. The session itself is
//! created through a `RendererLauncher`, which lets the dynamic strategy
//! launch lazily and lets tests substitute a scripted browser.

mod chromium;

pub use chromium::{ChromiumLauncher, ChromiumRenderer};

use crate::FetchResult;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// A running browser session
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Opens a new blank page
    async fn new_page(&self) -> FetchResult<Box<dyn RenderPage>>;

    /// Terminates the session. Pages still open become unusable.
    async fn shutdown(&self);
}

/// One open page in a browser session
#[async_trait]
pub trait RenderPage: Send {
    /// Navigates and waits for the load to settle
    async fn navigate(&mut self, url: &str) -> FetchResult<()>;

    /// Polls until an element matches the CSS selector or the timeout passes
    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> FetchResult<()>;

    /// Evaluates a script expression and returns its JSON value
    async fn evaluate(&mut self, script: &str) -> FetchResult<serde_json::Value>;

    /// Serialised HTML of the current document
    async fn html(&mut self) -> FetchResult<String>;

    async fn close(self: Box<Self>);
}

/// Starts browser sessions
#[async_trait]
pub trait RendererLauncher: Send + Sync {
    async fn launch(&self) -> FetchResult<Arc<dyn Renderer>>;
}
