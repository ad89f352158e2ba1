//! The five acceptance scenarios for the register and login pages

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::SuiteConfig;
use crate::error::{E2eError, E2eResult};
use crate::forms::FormFiller;
use crate::identity::{
    self, Credentials, EXISTING_EMAIL, MISMATCH_PASSWORD, NONEXISTENT_EMAIL, VALID_EMAIL,
    VALID_PASSWORD, WRONG_PASSWORD,
};
use crate::locator::Locator;
use crate::session::BrowserSession;
use crate::wait::{self, Condition, Outcome, Wait};

/// Class of the banner the application renders on a rejected form
pub const ERROR_BANNER_CLASS: &str = "alert-danger";

pub const REGISTER_PATH: &str = "/register";
pub const LOGIN_PATH: &str = "/login";
pub const CONTACT_PATH: &str = "/contact";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    SuccessfulRegistration,
    PasswordMismatchRegistration,
    DuplicateEmailRegistration,
    SuccessfulLogin,
    InvalidLogin,
}

/// What a submission should lead to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expectation {
    /// The browser ends up at this application path
    Redirect { path: &'static str },
    /// An error banner appears whose text contains this
    ErrorBanner { contains: &'static str },
}

/// A scenario with its inputs drawn, ready to execute
#[derive(Debug, Clone)]
pub struct ScenarioPlan {
    pub scenario: Scenario,
    pub path: &'static str,
    pub credentials: Credentials,
    pub expectation: Expectation,
}

impl Scenario {
    pub const ALL: [Scenario; 5] = [
        Scenario::SuccessfulRegistration,
        Scenario::PasswordMismatchRegistration,
        Scenario::DuplicateEmailRegistration,
        Scenario::SuccessfulLogin,
        Scenario::InvalidLogin,
    ];

    /// All scenarios in their numbered order
    pub fn all() -> Vec<Scenario> {
        Self::ALL.to_vec()
    }

    pub fn number(&self) -> u8 {
        match self {
            Scenario::SuccessfulRegistration => 1,
            Scenario::PasswordMismatchRegistration => 2,
            Scenario::DuplicateEmailRegistration => 3,
            Scenario::SuccessfulLogin => 4,
            Scenario::InvalidLogin => 5,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Scenario::SuccessfulRegistration => "successful_registration",
            Scenario::PasswordMismatchRegistration => "password_mismatch_registration",
            Scenario::DuplicateEmailRegistration => "duplicate_email_registration",
            Scenario::SuccessfulLogin => "successful_login",
            Scenario::InvalidLogin => "invalid_login",
        }
    }

    /// `test_01_successful_registration`
    pub fn slug(&self) -> String {
        format!("test_{:02}_{}", self.number(), self.name())
    }

    pub fn description(&self) -> &'static str {
        match self {
            Scenario::SuccessfulRegistration => "Successful user registration",
            Scenario::PasswordMismatchRegistration => "Registration with mismatched passwords",
            Scenario::DuplicateEmailRegistration => "Registration with an existing email",
            Scenario::SuccessfulLogin => "Successful login",
            Scenario::InvalidLogin => "Login with invalid credentials",
        }
    }

    /// Reported instead of a bare timeout when the outcome never shows up
    pub fn timeout_message(&self) -> &'static str {
        match self {
            Scenario::SuccessfulRegistration => {
                "Registration failed - redirect to login page did not occur"
            }
            Scenario::PasswordMismatchRegistration => {
                "Error message for password mismatch not displayed"
            }
            Scenario::DuplicateEmailRegistration => "Error message for duplicate email not displayed",
            Scenario::SuccessfulLogin => "Login failed - redirect to contact page did not occur",
            Scenario::InvalidLogin => "Error message for invalid credentials not displayed",
        }
    }

    /// Needs accounts that must exist before the run
    pub fn requires_fixture(&self) -> bool {
        matches!(
            self,
            Scenario::DuplicateEmailRegistration | Scenario::SuccessfulLogin | Scenario::InvalidLogin
        )
    }

    /// Match by number (`4`), name (`successful_login`) or slug (`test_04_successful_login`)
    pub fn find(query: &str) -> E2eResult<Scenario> {
        let query = query.trim();
        Self::ALL
            .into_iter()
            .find(|s| {
                query == s.name()
                    || query == s.slug()
                    || query.parse::<u8>().map(|n| n == s.number()).unwrap_or(false)
            })
            .ok_or_else(|| E2eError::ScenarioNotFound(query.to_string()))
    }

    /// Draw the inputs. Random emails are fresh on every call.
    pub fn plan(&self) -> ScenarioPlan {
        let (path, credentials, expectation) = match self {
            Scenario::SuccessfulRegistration => (
                REGISTER_PATH,
                Credentials::registration(identity::random_email(), VALID_PASSWORD, VALID_PASSWORD),
                Expectation::Redirect { path: LOGIN_PATH },
            ),
            Scenario::PasswordMismatchRegistration => (
                REGISTER_PATH,
                Credentials::registration(identity::random_email(), VALID_PASSWORD, MISMATCH_PASSWORD),
                Expectation::ErrorBanner {
                    contains: "Passwords do not match",
                },
            ),
            Scenario::DuplicateEmailRegistration => (
                REGISTER_PATH,
                Credentials::registration(EXISTING_EMAIL, VALID_PASSWORD, VALID_PASSWORD),
                Expectation::ErrorBanner {
                    contains: "Email is already in use",
                },
            ),
            Scenario::SuccessfulLogin => (
                LOGIN_PATH,
                Credentials::login(VALID_EMAIL, VALID_PASSWORD),
                Expectation::Redirect { path: CONTACT_PATH },
            ),
            Scenario::InvalidLogin => (
                LOGIN_PATH,
                Credentials::login(NONEXISTENT_EMAIL, WRONG_PASSWORD),
                Expectation::ErrorBanner {
                    contains: "Incorrect username or password",
                },
            ),
        };

        ScenarioPlan {
            scenario: *self,
            path,
            credentials,
            expectation,
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.slug())
    }
}

impl FromStr for Scenario {
    type Err = E2eError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scenario::find(s)
    }
}

impl ScenarioPlan {
    /// Navigate, fill, submit, wait, assert. The session is owned by the caller.
    pub async fn execute(
        &self,
        session: &mut dyn BrowserSession,
        config: &SuiteConfig,
    ) -> E2eResult<()> {
        let url = config.url_for(self.path);
        debug!("{}: opening {}", self.scenario, url);
        session.navigate(&url).await?;

        {
            let lookup = Wait::new(config.element_timeout, config.poll_interval);
            let mut form = FormFiller::new(&mut *session, lookup);
            form.fill(&self.credentials).await?;
            form.submit_form().await?;
        }

        let condition = self.condition(config);
        let outcome_wait = Wait::new(config.wait_timeout, config.poll_interval);
        let outcome = match wait::wait_for(session, &outcome_wait, &condition).await {
            Ok(outcome) => outcome,
            Err(E2eError::Timeout { .. }) => {
                return Err(E2eError::ScenarioFailed {
                    scenario: self.scenario.slug(),
                    message: self.scenario.timeout_message().to_string(),
                });
            }
            Err(e) => return Err(e),
        };

        self.check(config, &outcome)?;
        info!("{}: outcome confirmed", self.scenario);
        Ok(())
    }

    pub fn condition(&self, config: &SuiteConfig) -> Condition {
        match &self.expectation {
            Expectation::Redirect { path } => Condition::UrlIs(config.url_for(path)),
            Expectation::ErrorBanner { .. } => {
                Condition::ElementPresent(Locator::class_name(ERROR_BANNER_CLASS))
            }
        }
    }

    /// Compare what the page showed against the expectation
    pub fn check(&self, config: &SuiteConfig, outcome: &Outcome) -> E2eResult<()> {
        match (&self.expectation, outcome) {
            (Expectation::Redirect { path }, Outcome::Navigated(url)) => {
                let expected = config.url_for(path);
                if *url == expected {
                    Ok(())
                } else {
                    Err(E2eError::AssertionFailed(format!(
                        "expected address {}, got {}",
                        expected, url
                    )))
                }
            }
            (Expectation::ErrorBanner { contains }, Outcome::ElementPresent { text }) => {
                if text.contains(contains) {
                    Ok(())
                } else {
                    Err(E2eError::AssertionFailed(format!(
                        "expected error banner containing '{}', got '{}'",
                        contains, text
                    )))
                }
            }
            (expectation, outcome) => Err(E2eError::AssertionFailed(format!(
                "expected {:?}, observed {:?}",
                expectation, outcome
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_numbering_and_slugs() {
        let slugs: Vec<String> = Scenario::all().iter().map(Scenario::slug).collect();
        assert_eq!(
            slugs,
            vec![
                "test_01_successful_registration",
                "test_02_password_mismatch_registration",
                "test_03_duplicate_email_registration",
                "test_04_successful_login",
                "test_05_invalid_login",
            ]
        );
    }

    #[test_case("1", Scenario::SuccessfulRegistration ; "by number")]
    #[test_case("invalid_login", Scenario::InvalidLogin ; "by name")]
    #[test_case("test_03_duplicate_email_registration", Scenario::DuplicateEmailRegistration ; "by slug")]
    #[test_case(" 4 ", Scenario::SuccessfulLogin ; "trimmed")]
    fn test_find(query: &str, expected: Scenario) {
        assert_eq!(Scenario::find(query).unwrap(), expected);
    }

    #[test]
    fn test_find_unknown() {
        assert!(matches!(Scenario::find("6"), Err(E2eError::ScenarioNotFound(_))));
        assert!("logout".parse::<Scenario>().is_err());
    }

    #[test]
    fn test_fixture_dependencies() {
        let needing: Vec<u8> = Scenario::all()
            .into_iter()
            .filter(Scenario::requires_fixture)
            .map(|s| s.number())
            .collect();
        assert_eq!(needing, vec![3, 4, 5]);
    }

    #[test]
    fn test_plans_draw_fresh_emails() {
        let a = Scenario::SuccessfulRegistration.plan();
        let b = Scenario::SuccessfulRegistration.plan();
        assert!(identity::is_generated_email(&a.credentials.email));
        assert!(identity::is_generated_email(&b.credentials.email));
        assert_ne!(a.credentials.email, b.credentials.email);
    }

    #[test]
    fn test_mismatch_plan_uses_different_confirmation() {
        let plan = Scenario::PasswordMismatchRegistration.plan();
        assert_eq!(plan.credentials.password, "Test123!");
        assert_eq!(plan.credentials.confirm_password.as_deref(), Some("Different123!"));
        assert_eq!(plan.path, "/register");
    }

    #[test]
    fn test_check_outcomes() {
        let config = SuiteConfig::default();
        let login = Scenario::SuccessfulLogin.plan();
        assert!(login
            .check(&config, &Outcome::Navigated("http://localhost:3000/contact".into()))
            .is_ok());
        assert!(matches!(
            login.check(&config, &Outcome::Navigated("http://localhost:3000/".into())),
            Err(E2eError::AssertionFailed(_))
        ));

        let invalid = Scenario::InvalidLogin.plan();
        let banner = Outcome::ElementPresent {
            text: "Error: Incorrect username or password.".into(),
        };
        assert!(invalid.check(&config, &banner).is_ok());

        let other = Outcome::ElementPresent {
            text: "Something went wrong".into(),
        };
        assert!(invalid.check(&config, &other).is_err());
    }

    #[test]
    fn test_conditions() {
        let config = SuiteConfig::default();
        assert_eq!(
            Scenario::SuccessfulRegistration.plan().condition(&config),
            Condition::UrlIs("http://localhost:3000/login".into())
        );
        assert_eq!(
            Scenario::DuplicateEmailRegistration.plan().condition(&config),
            Condition::ElementPresent(Locator::class_name("alert-danger"))
        );
    }
}
