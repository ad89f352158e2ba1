//! Scenario runner: one fresh session per scenario, released on every exit path

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::SuiteConfig;
use crate::error::{E2eError, E2eResult, FailureKind};
use crate::scenario::{Scenario, ScenarioPlan};
use crate::session::{BrowserSession, SessionFactory};

/// Work that runs against a single, freshly opened session
#[async_trait]
pub trait SessionTask: Send + Sync {
    type Output: Send;

    fn label(&self) -> String;

    async fn run(
        &self,
        session: &mut dyn BrowserSession,
        config: &SuiteConfig,
    ) -> E2eResult<Self::Output>;
}

#[async_trait]
impl SessionTask for ScenarioPlan {
    type Output = ();

    fn label(&self) -> String {
        self.scenario.slug()
    }

    async fn run(&self, session: &mut dyn BrowserSession, config: &SuiteConfig) -> E2eResult<()> {
        self.execute(session, config).await
    }
}

/// Open a session, run `task`, and always release the session afterwards.
///
/// Release happens exactly once, whether the task succeeded, returned an
/// error, or panicked. A failed release is logged and does not change
/// the task's result.
pub async fn in_fresh_session<T: SessionTask>(
    factory: &dyn SessionFactory,
    config: &SuiteConfig,
    task: &T,
) -> E2eResult<T::Output> {
    let label = task.label();
    let mut session = factory.open().await?;
    debug!("{}: session opened", label);

    let outcome = AssertUnwindSafe(task.run(session.as_mut(), config))
        .catch_unwind()
        .await;

    if let Err(e) = session.quit().await {
        warn!("{}: failed to release browser session: {}", label, e);
    } else {
        debug!("{}: session released", label);
    }

    match outcome {
        Ok(result) => result,
        Err(payload) => Err(E2eError::Panicked(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub number: u8,
    pub name: String,
    pub description: String,
    pub success: bool,
    pub duration_ms: u64,
    pub requires_fixture: bool,
    pub failure_kind: Option<FailureKind>,
    pub error: Option<String>,
}

/// Result of running the suite
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResult {
    pub started_at: DateTime<Utc>,
    pub base_url: String,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
    pub results: Vec<ScenarioResult>,
}

impl SuiteResult {
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// Runs scenarios one at a time against sessions from `factory`
pub struct TestRunner<F: SessionFactory> {
    factory: F,
    config: SuiteConfig,
}

impl<F: SessionFactory> TestRunner<F> {
    pub fn new(factory: F, config: SuiteConfig) -> Self {
        Self { factory, config }
    }

    /// Run all five scenarios in order
    pub async fn run_all(&self) -> SuiteResult {
        self.run_selected(&Scenario::all()).await
    }

    /// Run the given scenarios sequentially. A failure never stops the rest.
    pub async fn run_selected(&self, scenarios: &[Scenario]) -> SuiteResult {
        let started_at = Utc::now();
        let start = Instant::now();
        let mut results = Vec::with_capacity(scenarios.len());

        info!("Running {} scenario(s) against {}", scenarios.len(), self.config.base_url);

        for scenario in scenarios {
            let result = self.run_one(*scenario).await;
            if result.success {
                info!("✓ {} ({} ms)", result.name, result.duration_ms);
            } else {
                error!(
                    "✗ {} - {}",
                    result.name,
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }
            results.push(result);
        }

        let passed = results.iter().filter(|r| r.success).count();
        let failed = results.len() - passed;
        let duration_ms = start.elapsed().as_millis() as u64;

        info!(
            "Scenario results: {} passed, {} failed ({} ms)",
            passed, failed, duration_ms
        );

        SuiteResult {
            started_at,
            base_url: self.config.base_url.clone(),
            total: results.len(),
            passed,
            failed,
            duration_ms,
            results,
        }
    }

    /// Run a single scenario in its own session
    pub async fn run_one(&self, scenario: Scenario) -> ScenarioResult {
        let start = Instant::now();
        let plan = scenario.plan();
        debug!("Running {}: {}", scenario, scenario.description());

        let outcome = in_fresh_session(&self.factory, &self.config, &plan).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        let (failure_kind, error) = match &outcome {
            Ok(()) => (None, None),
            Err(e) => (Some(e.kind()), Some(e.to_string())),
        };

        ScenarioResult {
            number: scenario.number(),
            name: scenario.slug(),
            description: scenario.description().to_string(),
            success: outcome.is_ok(),
            duration_ms,
            requires_fixture: scenario.requires_fixture(),
            failure_kind,
            error,
        }
    }

    /// Write the run report as JSON into the output directory
    pub fn write_results(&self, results: &SuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.config.output_dir)?;

        let path = self.config.output_dir.join("test-results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeAuthApp;

    fn config_for(app: &FakeAuthApp) -> SuiteConfig {
        SuiteConfig::with_base_url(app.base_url())
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_one_releases_session_on_success() {
        let app = FakeAuthApp::seeded();
        let runner = TestRunner::new(app.clone(), config_for(&app));

        let result = runner.run_one(Scenario::SuccessfulLogin).await;
        assert!(result.success, "{:?}", result.error);
        assert_eq!(app.sessions_opened(), 1);
        assert_eq!(app.sessions_released(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_scenario_still_releases_session() {
        let app = FakeAuthApp::seeded().panicking_on_submit();
        let runner = TestRunner::new(app.clone(), config_for(&app));

        let result = runner.run_one(Scenario::InvalidLogin).await;
        assert!(!result.success);
        assert_eq!(result.failure_kind, Some(FailureKind::Infrastructure));
        assert!(result.error.unwrap().contains("fake app crashed"));
        assert_eq!(app.sessions_released(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_failure_fails_only_that_scenario() {
        let app = FakeAuthApp::seeded().failing_open();
        let runner = TestRunner::new(app.clone(), config_for(&app));

        let suite = runner.run_all().await;
        assert_eq!(suite.total, 5);
        assert_eq!(suite.failed, 5);
        assert_eq!(app.sessions_released(), 0);
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("static str");
        assert_eq!(panic_message(payload.as_ref()), "static str");
        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");
        let payload: Box<dyn Any + Send> = Box::new(42u32);
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }

    #[tokio::test]
    async fn test_write_results() {
        let dir = tempfile::tempdir().unwrap();
        let app = FakeAuthApp::seeded();
        let config = SuiteConfig {
            output_dir: dir.path().join("out"),
            ..config_for(&app)
        };
        let runner = TestRunner::new(app, config);
        let suite = SuiteResult {
            started_at: Utc::now(),
            base_url: "http://fake-app.test".into(),
            total: 0,
            passed: 0,
            failed: 0,
            duration_ms: 0,
            results: vec![],
        };

        let path = runner.write_results(&suite).unwrap();
        let parsed: SuiteResult =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert!(parsed.all_passed());
        assert_eq!(parsed.base_url, "http://fake-app.test");
    }
}
