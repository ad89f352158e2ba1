//! Accounts the duplicate-email and login scenarios depend on.
//!
//! Scenarios 3-5 assume the application already holds
//! `existing@example.com` and `test@example.com`. [`seed_fixtures`]
//! creates them through the registration page, treating an
//! "Email is already in use" banner as already seeded.

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::SuiteConfig;
use crate::error::{E2eError, E2eResult};
use crate::forms::FormFiller;
use crate::identity::{EXISTING_EMAIL, VALID_EMAIL, VALID_PASSWORD};
use crate::locator::Locator;
use crate::runner::{in_fresh_session, SessionTask};
use crate::scenario::{ERROR_BANNER_CLASS, LOGIN_PATH, REGISTER_PATH};
use crate::session::{BrowserSession, SessionFactory};
use crate::wait::{Check, Wait};

const EMAIL_IN_USE: &str = "Email is already in use";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FixtureAccount {
    pub email: &'static str,
    pub password: &'static str,
}

pub const FIXTURE_ACCOUNTS: [FixtureAccount; 2] = [
    FixtureAccount {
        email: EXISTING_EMAIL,
        password: VALID_PASSWORD,
    },
    FixtureAccount {
        email: VALID_EMAIL,
        password: VALID_PASSWORD,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedOutcome {
    Created,
    AlreadyPresent,
}

impl fmt::Display for SeedOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeedOutcome::Created => f.write_str("created"),
            SeedOutcome::AlreadyPresent => f.write_str("already present"),
        }
    }
}

struct SeedTask {
    account: FixtureAccount,
}

#[async_trait]
impl SessionTask for SeedTask {
    type Output = SeedOutcome;

    fn label(&self) -> String {
        format!("seed:{}", self.account.email)
    }

    async fn run(
        &self,
        session: &mut dyn BrowserSession,
        config: &SuiteConfig,
    ) -> E2eResult<SeedOutcome> {
        let account = self.account;
        session.navigate(&config.url_for(REGISTER_PATH)).await?;

        {
            let lookup = Wait::new(config.element_timeout, config.poll_interval);
            let mut form = FormFiller::new(&mut *session, lookup);
            form.fill_registration_form(account.email, account.password, account.password)
                .await?;
            form.submit_form().await?;
        }

        let mut result = SeedResult {
            email: account.email,
            login_url: config.url_for(LOGIN_PATH),
            banner: Locator::class_name(ERROR_BANNER_CLASS),
        };
        Wait::new(config.wait_timeout, config.poll_interval)
            .until("registration response", session, &mut result)
            .await
            .map_err(|e| match e {
                E2eError::Timeout { waited, .. } => E2eError::FixtureSetup(format!(
                    "registering {} produced neither a redirect nor an error banner within {:?}",
                    account.email, waited
                )),
                other => other,
            })
    }
}

/// Redirect to the login page, or an error banner, after a registration submit
struct SeedResult {
    email: &'static str,
    login_url: String,
    banner: Locator,
}

#[async_trait]
impl<'a> Check<dyn BrowserSession + 'a> for SeedResult {
    type Output = SeedOutcome;

    async fn poll(&mut self, session: &mut (dyn BrowserSession + 'a)) -> E2eResult<Option<SeedOutcome>> {
        if session.current_url().await? == self.login_url {
            return Ok(Some(SeedOutcome::Created));
        }
        match session.text(&self.banner).await? {
            Some(text) if text.contains(EMAIL_IN_USE) => Ok(Some(SeedOutcome::AlreadyPresent)),
            Some(text) => Err(E2eError::FixtureSetup(format!(
                "registering {} was rejected: {}",
                self.email, text
            ))),
            None => Ok(None),
        }
    }
}

/// Make sure every fixture account exists, one fresh session per account
pub async fn seed_fixtures(
    factory: &dyn SessionFactory,
    config: &SuiteConfig,
) -> E2eResult<Vec<(FixtureAccount, SeedOutcome)>> {
    let mut seeded = Vec::with_capacity(FIXTURE_ACCOUNTS.len());
    for account in FIXTURE_ACCOUNTS {
        let outcome = in_fresh_session(factory, config, &SeedTask { account }).await?;
        info!("Fixture {}: {}", account.email, outcome);
        seeded.push((account, outcome));
    }
    Ok(seeded)
}

/// Log the preconditions a run without seeding relies on
pub fn warn_unseeded() {
    for account in FIXTURE_ACCOUNTS {
        warn!(
            "Assuming fixture account {} exists with its known password (use --seed-fixtures to create it)",
            account.email
        );
    }
}
