//! The five scenarios run end to end against the in-memory application.

use std::time::Duration;

use authflow_e2e::fake::FakeAuthApp;
use authflow_e2e::{FailureKind, Scenario, SuiteConfig, TestRunner};
use test_case::test_case;

fn config_for(app: &FakeAuthApp) -> SuiteConfig {
    SuiteConfig::with_base_url(app.base_url())
}

#[tokio::test(start_paused = true)]
async fn all_scenarios_pass_against_a_seeded_app() {
    let app = FakeAuthApp::seeded();
    let runner = TestRunner::new(app.clone(), config_for(&app));

    let suite = runner.run_all().await;

    for result in &suite.results {
        assert!(result.success, "{} failed: {:?}", result.name, result.error);
    }
    assert_eq!(suite.total, 5);
    assert_eq!(suite.passed, 5);
    assert!(suite.all_passed());
    assert_eq!(
        suite.results.iter().map(|r| r.number).collect::<Vec<_>>(),
        vec![1, 2, 3, 4, 5]
    );

    // one session per scenario, each released once
    assert_eq!(app.sessions_opened(), 5);
    assert_eq!(app.sessions_released(), 5);

    // scenario 1 registered a throwaway account; scenario 2 must not have
    assert_eq!(app.account_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn slow_responses_within_the_timeout_still_pass() {
    let app = FakeAuthApp::seeded()
        .with_render_delay(Duration::from_secs(3))
        .with_response_delay(Duration::from_secs(8));
    let runner = TestRunner::new(app.clone(), config_for(&app));

    let suite = runner.run_all().await;
    assert!(suite.all_passed(), "{:?}", suite.results);
}

#[test_case(Scenario::SuccessfulRegistration, "Registration failed - redirect to login page did not occur")]
#[test_case(Scenario::PasswordMismatchRegistration, "Error message for password mismatch not displayed")]
#[test_case(Scenario::DuplicateEmailRegistration, "Error message for duplicate email not displayed")]
#[test_case(Scenario::SuccessfulLogin, "Login failed - redirect to contact page did not occur")]
#[test_case(Scenario::InvalidLogin, "Error message for invalid credentials not displayed")]
#[tokio::test(start_paused = true)]
async fn timeouts_report_the_scenario_message(scenario: Scenario, message: &str) {
    let app = FakeAuthApp::seeded().ignoring_submissions();
    let runner = TestRunner::new(app.clone(), config_for(&app));

    let result = runner.run_one(scenario).await;

    assert!(!result.success);
    assert_eq!(result.failure_kind, Some(FailureKind::Timeout));
    let error = result.error.unwrap();
    assert!(error.ends_with(message), "unexpected error: {}", error);
    assert!(!error.contains("Timeout waiting for"), "raw timeout leaked: {}", error);
    assert_eq!(app.sessions_released(), 1);
}

#[tokio::test(start_paused = true)]
async fn responses_after_the_deadline_time_out() {
    let app = FakeAuthApp::seeded().with_response_delay(Duration::from_secs(11));
    let runner = TestRunner::new(app.clone(), config_for(&app));

    let result = runner.run_one(Scenario::SuccessfulLogin).await;
    assert_eq!(result.failure_kind, Some(FailureKind::Timeout));
    assert_eq!(app.sessions_released(), 1);
}

#[tokio::test(start_paused = true)]
async fn missing_field_is_a_locator_failure() {
    let app = FakeAuthApp::seeded().without_field("confirm_password");
    let runner = TestRunner::new(app.clone(), config_for(&app));

    let suite = runner.run_all().await;

    // registration scenarios need confirm_password; login scenarios do not
    let kinds: Vec<_> = suite.results.iter().map(|r| r.failure_kind).collect();
    assert_eq!(
        kinds,
        vec![
            Some(FailureKind::Locator),
            Some(FailureKind::Locator),
            Some(FailureKind::Locator),
            None,
            None,
        ]
    );
    assert!(suite.results[0]
        .error
        .as_deref()
        .unwrap()
        .contains("id=confirm_password"));
    assert_eq!(app.sessions_released(), 5);
}

#[tokio::test(start_paused = true)]
async fn wrong_banner_text_is_an_assertion_failure() {
    let app = FakeAuthApp::seeded().with_banner_text("Something went wrong");
    let runner = TestRunner::new(app.clone(), config_for(&app));

    let result = runner.run_one(Scenario::InvalidLogin).await;
    assert_eq!(result.failure_kind, Some(FailureKind::Assertion));
    assert!(result
        .error
        .unwrap()
        .contains("Incorrect username or password"));
    assert_eq!(app.sessions_released(), 1);
}

#[test_case(Scenario::SuccessfulRegistration, "Registration failed - redirect to login page did not occur")]
#[test_case(Scenario::SuccessfulLogin, "Login failed - redirect to contact page did not occur")]
#[tokio::test(start_paused = true)]
async fn redirects_to_the_wrong_page_fail(scenario: Scenario, message: &str) {
    let app = FakeAuthApp::seeded().with_wrong_redirects();
    let runner = TestRunner::new(app.clone(), config_for(&app));

    let result = runner.run_one(scenario).await;

    assert!(!result.success);
    assert_eq!(result.failure_kind, Some(FailureKind::Timeout));
    let error = result.error.unwrap();
    assert!(error.ends_with(message), "unexpected error: {}", error);
    assert_eq!(app.sessions_released(), 1);
}

#[tokio::test(start_paused = true)]
async fn unseeded_app_fails_only_fixture_scenarios() {
    let app = FakeAuthApp::new();
    let runner = TestRunner::new(app.clone(), config_for(&app));

    let suite = runner
        .run_selected(&[
            Scenario::SuccessfulRegistration,
            Scenario::PasswordMismatchRegistration,
            Scenario::DuplicateEmailRegistration,
            Scenario::SuccessfulLogin,
        ])
        .await;

    let passed: Vec<bool> = suite.results.iter().map(|r| r.success).collect();
    assert_eq!(passed, vec![true, true, false, false]);
    assert!(suite.results[2].requires_fixture);
    assert_eq!(suite.failed, 2);
    assert_eq!(app.sessions_released(), 4);
}

#[tokio::test(start_paused = true)]
async fn seeding_makes_fixture_scenarios_pass() {
    let app = FakeAuthApp::new();
    let config = config_for(&app);

    authflow_e2e::fixtures::seed_fixtures(&app, &config)
        .await
        .unwrap();
    let runner = TestRunner::new(app.clone(), config);
    let suite = runner.run_all().await;

    assert!(suite.all_passed(), "{:?}", suite.results);
    // two seeding sessions plus one per scenario
    assert_eq!(app.sessions_opened(), 7);
    assert_eq!(app.sessions_released(), 7);
}
