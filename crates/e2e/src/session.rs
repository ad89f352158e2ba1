//! The seam between scenarios and whatever drives the browser

use async_trait::async_trait;

use crate::error::E2eResult;
use crate::locator::Locator;

/// One isolated browser session.
///
/// Element operations act on the first match and report absence as a
/// normal value (`false` / `None`); lookups with a deadline are layered
/// on top in [`crate::forms`] and [`crate::wait`].
#[async_trait]
pub trait BrowserSession: Send {
    /// Load an absolute URL
    async fn navigate(&mut self, url: &str) -> E2eResult<()>;

    /// Address currently shown by the page
    async fn current_url(&mut self) -> E2eResult<String>;

    /// Type literal text into the first matching element
    async fn send_keys(&mut self, locator: &Locator, text: &str) -> E2eResult<bool>;

    /// Trigger the submit behaviour of the first matching form
    async fn submit(&mut self, locator: &Locator) -> E2eResult<bool>;

    /// Rendered text of the first matching element
    async fn text(&mut self, locator: &Locator) -> E2eResult<Option<String>>;

    /// Release the session. Called exactly once by the runner.
    async fn quit(&mut self) -> E2eResult<()>;
}

/// Produces a fresh session per call; sessions are never shared
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> E2eResult<Box<dyn BrowserSession>>;
}
