//! Bounded polling waits over page state

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::error::{E2eError, E2eResult};
use crate::locator::Locator;
use crate::session::BrowserSession;

/// One observation of some state `S`, repeated by [`Wait::until`].
///
/// `Ok(None)` means "not yet"; an error ends the wait immediately.
#[async_trait]
pub trait Check<S: ?Sized + Send>: Send {
    type Output: Send;

    async fn poll(&mut self, state: &mut S) -> E2eResult<Option<Self::Output>>;
}

/// Deadline plus polling cadence
#[derive(Debug, Clone, Copy)]
pub struct Wait {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Wait {
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self { timeout, poll_interval }
    }

    /// Poll `check` against `state` until it yields a value or the deadline passes.
    ///
    /// The check always runs at least once, and once more right at the
    /// deadline. Between attempts the task sleeps for `poll_interval`.
    pub async fn until<S, P>(
        &self,
        condition: &str,
        state: &mut S,
        check: &mut P,
    ) -> E2eResult<P::Output>
    where
        S: ?Sized + Send,
        P: Check<S>,
    {
        let started = Instant::now();
        let mut attempts = 0usize;
        loop {
            attempts += 1;
            if let Some(value) = check.poll(state).await? {
                return Ok(value);
            }

            let elapsed = started.elapsed();
            if elapsed >= self.timeout {
                debug!("Gave up on '{}' after {} attempt(s)", condition, attempts);
                return Err(E2eError::Timeout {
                    condition: condition.to_string(),
                    waited: elapsed,
                });
            }
            sleep(self.poll_interval.min(self.timeout - elapsed)).await;
        }
    }
}

/// Observable page states a scenario can wait for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// The current address equals this exact URL
    UrlIs(String),
    /// An element matching the locator is in the page
    ElementPresent(Locator),
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::UrlIs(url) => write!(f, "url == {}", url),
            Condition::ElementPresent(locator) => write!(f, "element present: {}", locator),
        }
    }
}

/// What the page looked like when the condition held
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Navigated(String),
    ElementPresent { text: String },
}

#[async_trait]
impl<'a> Check<dyn BrowserSession + 'a> for Condition {
    type Output = Outcome;

    async fn poll(&mut self, session: &mut (dyn BrowserSession + 'a)) -> E2eResult<Option<Outcome>> {
        match self {
            Condition::UrlIs(expected) => {
                let url = session.current_url().await?;
                Ok((url == *expected).then_some(Outcome::Navigated(url)))
            }
            Condition::ElementPresent(locator) => Ok(session
                .text(locator)
                .await?
                .map(|text| Outcome::ElementPresent { text })),
        }
    }
}

/// Block until `condition` holds on `session`, or time out
pub async fn wait_for(
    session: &mut dyn BrowserSession,
    wait: &Wait,
    condition: &Condition,
) -> E2eResult<Outcome> {
    let mut check = condition.clone();
    let outcome = wait.until(&condition.to_string(), session, &mut check).await?;
    debug!("Condition met: {}", condition);
    Ok(outcome)
}
