//! Chrome sessions over the DevTools protocol

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::BrowserOptions;
use crate::error::{E2eError, E2eResult};
use crate::locator::Locator;
use crate::session::{BrowserSession, SessionFactory};

// Runs the form's submit handlers the way a user-initiated submit would.
const SUBMIT_FN: &str = r#"function() {
    if (typeof this.requestSubmit === 'function') {
        this.requestSubmit();
    } else {
        this.submit();
    }
}"#;

/// Upper bound on each teardown step before the browser is killed
pub const CLOSE_TIMEOUT: Duration = Duration::from_secs(10);

/// Launches one headless (or headed) Chrome per session
#[derive(Debug, Clone)]
pub struct ChromeSessionFactory {
    options: BrowserOptions,
}

impl ChromeSessionFactory {
    pub fn new(options: BrowserOptions) -> Self {
        Self { options }
    }

    fn browser_config(&self, profile: &TempDir) -> E2eResult<BrowserConfig> {
        let mut builder = BrowserConfig::builder()
            .user_data_dir(profile.path())
            .window_size(self.options.window_width, self.options.window_height)
            .arg("--no-first-run")
            .arg("--no-default-browser-check");

        if !self.options.headless {
            builder = builder.with_head();
        }
        if self.options.no_sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(path) = &self.options.chrome_executable {
            builder = builder.chrome_executable(path);
        }

        builder.build().map_err(E2eError::BrowserLaunch)
    }
}

#[async_trait]
impl SessionFactory for ChromeSessionFactory {
    async fn open(&self) -> E2eResult<Box<dyn BrowserSession>> {
        // A fresh profile per session: no cookies or storage carry over.
        let profile = tempfile::Builder::new()
            .prefix("authflow-profile-")
            .tempdir()?;
        let config = self.browser_config(&profile)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| E2eError::BrowserLaunch(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("CDP handler stopped: {}", e);
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler_task.abort();
                return Err(e.into());
            }
        };

        info!("Browser session started (profile: {})", profile.path().display());

        Ok(Box::new(ChromeSession {
            browser,
            page,
            handler_task: Some(handler_task),
            profile: Some(profile),
        }))
    }
}

pub struct ChromeSession {
    browser: Browser,
    page: Page,
    handler_task: Option<JoinHandle<()>>,
    profile: Option<TempDir>,
}

impl ChromeSession {
    async fn first(&self, locator: &Locator) -> E2eResult<Option<chromiumoxide::Element>> {
        let mut elements = self.page.find_elements(locator.css()).await?;
        if elements.is_empty() {
            Ok(None)
        } else {
            Ok(Some(elements.swap_remove(0)))
        }
    }
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn navigate(&mut self, url: &str) -> E2eResult<()> {
        debug!("Navigating to {}", url);
        self.page.goto(url).await?;
        Ok(())
    }

    async fn current_url(&mut self) -> E2eResult<String> {
        Ok(self.page.url().await?.unwrap_or_default())
    }

    async fn send_keys(&mut self, locator: &Locator, text: &str) -> E2eResult<bool> {
        match self.first(locator).await? {
            Some(element) => {
                element.focus().await?;
                element.type_str(text).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn submit(&mut self, locator: &Locator) -> E2eResult<bool> {
        match self.first(locator).await? {
            Some(element) => {
                element.call_js_fn(SUBMIT_FN, false).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn text(&mut self, locator: &Locator) -> E2eResult<Option<String>> {
        let selector = serde_json::to_string(&locator.css())?;
        let script = format!(
            "(() => {{ const el = document.querySelector({}); return el ? el.innerText : null; }})()",
            selector
        );

        // A page mid-navigation has no execution context yet; that reads as "not there".
        match self.page.evaluate(script).await {
            Ok(result) => Ok(result.into_value::<Option<String>>().unwrap_or(None)),
            Err(e) if is_missing_context(&e.to_string()) => {
                debug!("Could not read {}: {}", locator, e);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn quit(&mut self) -> E2eResult<()> {
        let graceful = match bounded(self.browser.close(), CLOSE_TIMEOUT).await {
            Ok(()) => bounded(self.browser.wait(), CLOSE_TIMEOUT)
                .await
                .map_err(|s| s.into_error("browser exit")),
            Err(s) => Err(s.into_error("browser close")),
        };

        if let Err(e) = &graceful {
            warn!("Killing browser process: {}", e);
            match tokio::time::timeout(CLOSE_TIMEOUT, self.browser.kill()).await {
                Ok(Some(Err(e))) => warn!("Could not kill browser process: {}", e),
                Err(_) => warn!("Browser process still running after kill"),
                _ => {}
            }
        }
        if let Some(mut task) = self.handler_task.take() {
            if tokio::time::timeout(CLOSE_TIMEOUT, &mut task).await.is_err() {
                task.abort();
            }
        }
        if let Some(profile) = self.profile.take() {
            profile.close()?;
        }
        graceful?;
        info!("Browser session closed");
        Ok(())
    }
}

/// Evaluation errors Chrome raises while a page is between documents
fn is_missing_context(message: &str) -> bool {
    const MID_NAVIGATION: [&str; 3] = [
        "Execution context was destroyed",
        "Cannot find context with specified id",
        "Inspected target navigated or closed",
    ];
    MID_NAVIGATION.iter().any(|m| message.contains(m))
}

/// Why a bounded teardown step did not finish
#[derive(Debug)]
enum Shutdown {
    Failed(E2eError),
    TimedOut(Duration),
}

impl Shutdown {
    fn into_error(self, step: &str) -> E2eError {
        match self {
            Shutdown::Failed(e) => e,
            Shutdown::TimedOut(waited) => E2eError::Timeout {
                condition: step.to_string(),
                waited,
            },
        }
    }
}

async fn bounded<F, T, E>(step: F, limit: Duration) -> Result<(), Shutdown>
where
    F: Future<Output = Result<T, E>>,
    E: Into<E2eError>,
{
    match tokio::time::timeout(limit, step).await {
        Ok(Ok(_)) => Ok(()),
        Ok(Err(e)) => Err(Shutdown::Failed(e.into())),
        Err(_) => Err(Shutdown::TimedOut(limit)),
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        if let Some(task) = self.handler_task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use test_case::test_case;

    #[test]
    fn test_browser_config_builds_with_explicit_executable() {
        let factory = ChromeSessionFactory::new(BrowserOptions {
            chrome_executable: Some(PathBuf::from("/usr/bin/chromium")),
            no_sandbox: true,
            ..Default::default()
        });
        let profile = tempfile::tempdir().unwrap();
        assert!(factory.browser_config(&profile).is_ok());
    }

    #[test_case("Execution context was destroyed, most likely because of a navigation.", true)]
    #[test_case("Cannot find context with specified id", true)]
    #[test_case("Inspected target navigated or closed", true)]
    #[test_case("Uncaught SyntaxError: Unexpected token ')'", false)]
    #[test_case("Request timed out.", false)]
    fn test_missing_context_errors(message: &str, expected: bool) {
        assert_eq!(is_missing_context(message), expected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_close_times_out_at_limit() {
        let started = tokio::time::Instant::now();
        let hung = futures::future::pending::<Result<(), std::io::Error>>();

        let shutdown = bounded(hung, CLOSE_TIMEOUT).await.unwrap_err();
        assert!(matches!(shutdown, Shutdown::TimedOut(waited) if waited == CLOSE_TIMEOUT));
        assert_eq!(started.elapsed(), CLOSE_TIMEOUT);

        match shutdown.into_error("browser close") {
            E2eError::Timeout { condition, waited } => {
                assert_eq!(condition, "browser close");
                assert_eq!(waited, CLOSE_TIMEOUT);
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_close_keeps_its_error() {
        let failing = async { Err::<(), _>(std::io::Error::other("pipe closed")) };
        let shutdown = bounded(failing, CLOSE_TIMEOUT).await;
        assert!(matches!(shutdown, Err(Shutdown::Failed(E2eError::Io(_)))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_prompt_close_is_closed() {
        let started = tokio::time::Instant::now();
        let shutdown = bounded(async { Ok::<_, std::io::Error>(()) }, CLOSE_TIMEOUT).await;
        assert!(shutdown.is_ok());
        assert_eq!(started.elapsed(), Duration::ZERO);
    }
}
