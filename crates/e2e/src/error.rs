//! Error types for the auth E2E suite

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Element not found: {locator} (waited {waited:?})")]
    ElementNotFound { locator: String, waited: Duration },

    #[error("Timeout waiting for: {condition} (waited {waited:?})")]
    Timeout { condition: String, waited: Duration },

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("{scenario}: {message}")]
    ScenarioFailed { scenario: String, message: String },

    #[error("Browser error: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),

    #[error("Browser failed to launch: {0}")]
    BrowserLaunch(String),

    #[error("Application at {url} did not respond after {attempts} attempts")]
    AppUnreachable { url: String, attempts: usize },

    #[error("Fixture setup failed: {0}")]
    FixtureSetup(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Scenario not found: {0}")]
    ScenarioNotFound(String),

    #[error("Scenario panicked: {0}")]
    Panicked(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// How a failure shows up in the run report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// A required element never appeared on the page
    Locator,
    /// The expected navigation or banner did not happen in time
    Timeout,
    /// The observed URL or text did not match
    Assertion,
    /// Browser launch, protocol, IO and other harness-side problems
    Infrastructure,
}

impl E2eError {
    pub fn kind(&self) -> FailureKind {
        match self {
            E2eError::ElementNotFound { .. } => FailureKind::Locator,
            E2eError::Timeout { .. } | E2eError::ScenarioFailed { .. } => FailureKind::Timeout,
            E2eError::AssertionFailed(_) => FailureKind::Assertion,
            _ => FailureKind::Infrastructure,
        }
    }
}

pub type E2eResult<T> = Result<T, E2eError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        let not_found = E2eError::ElementNotFound {
            locator: "#email".into(),
            waited: Duration::from_secs(10),
        };
        assert_eq!(not_found.kind(), FailureKind::Locator);

        let failed = E2eError::ScenarioFailed {
            scenario: "test_04_successful_login".into(),
            message: "Login failed - redirect to contact page did not occur".into(),
        };
        assert_eq!(failed.kind(), FailureKind::Timeout);
        assert_eq!(
            failed.to_string(),
            "test_04_successful_login: Login failed - redirect to contact page did not occur"
        );

        assert_eq!(E2eError::AssertionFailed("x".into()).kind(), FailureKind::Assertion);
        assert_eq!(E2eError::Panicked("boom".into()).kind(), FailureKind::Infrastructure);
    }
}
