//! Form-fill helpers for the register and login pages

use async_trait::async_trait;
use tracing::debug;

use crate::error::{E2eError, E2eResult};
use crate::identity::Credentials;
use crate::locator::Locator;
use crate::session::BrowserSession;
use crate::wait::{Check, Wait};

pub const EMAIL_FIELD: &str = "email";
pub const PASSWORD_FIELD: &str = "password";
pub const CONFIRM_PASSWORD_FIELD: &str = "confirm_password";
pub const FORM_TAG: &str = "form";

/// Drives form interactions on one session with a bounded element lookup
pub struct FormFiller<'a> {
    session: &'a mut dyn BrowserSession,
    lookup: Wait,
}

impl<'a> FormFiller<'a> {
    pub fn new(session: &'a mut dyn BrowserSession, lookup: Wait) -> Self {
        Self { session, lookup }
    }

    /// Type into the element, waiting for it to appear first.
    ///
    /// A field that never shows up is an [`E2eError::ElementNotFound`].
    pub async fn send_keys(&mut self, locator: &Locator, text: &str) -> E2eResult<()> {
        let mut typing = TypeInto { locator, text };
        self.lookup
            .until(&locator.to_string(), &mut *self.session, &mut typing)
            .await
            .map_err(|e| not_found(locator, e))?;
        debug!("Typed into {}", locator);
        Ok(())
    }

    /// Submit the first `<form>` on the page
    pub async fn submit_form(&mut self) -> E2eResult<()> {
        let locator = Locator::tag_name(FORM_TAG);
        let mut submitting = SubmitForm { locator: &locator };
        self.lookup
            .until(&locator.to_string(), &mut *self.session, &mut submitting)
            .await
            .map_err(|e| not_found(&locator, e))?;
        debug!("Submitted {}", locator);
        Ok(())
    }

    pub async fn fill_registration_form(
        &mut self,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> E2eResult<()> {
        self.send_keys(&Locator::id(EMAIL_FIELD), email).await?;
        self.send_keys(&Locator::id(PASSWORD_FIELD), password).await?;
        self.send_keys(&Locator::id(CONFIRM_PASSWORD_FIELD), confirm_password)
            .await
    }

    pub async fn fill_login_form(&mut self, email: &str, password: &str) -> E2eResult<()> {
        self.send_keys(&Locator::id(EMAIL_FIELD), email).await?;
        self.send_keys(&Locator::id(PASSWORD_FIELD), password).await
    }

    /// Registration form when a confirmation is present, login form otherwise
    pub async fn fill(&mut self, credentials: &Credentials) -> E2eResult<()> {
        match &credentials.confirm_password {
            Some(confirm) => {
                self.fill_registration_form(&credentials.email, &credentials.password, confirm)
                    .await
            }
            None => {
                self.fill_login_form(&credentials.email, &credentials.password)
                    .await
            }
        }
    }
}

struct TypeInto<'l> {
    locator: &'l Locator,
    text: &'l str,
}

#[async_trait]
impl<'l, 'a> Check<dyn BrowserSession + 'a> for TypeInto<'l> {
    type Output = ();

    async fn poll(&mut self, session: &mut (dyn BrowserSession + 'a)) -> E2eResult<Option<()>> {
        Ok(session.send_keys(self.locator, self.text).await?.then_some(()))
    }
}

struct SubmitForm<'l> {
    locator: &'l Locator,
}

#[async_trait]
impl<'l, 'a> Check<dyn BrowserSession + 'a> for SubmitForm<'l> {
    type Output = ();

    async fn poll(&mut self, session: &mut (dyn BrowserSession + 'a)) -> E2eResult<Option<()>> {
        Ok(session.submit(self.locator).await?.then_some(()))
    }
}

fn not_found(locator: &Locator, expired: E2eError) -> E2eError {
    match expired {
        E2eError::Timeout { waited, .. } => E2eError::ElementNotFound {
            locator: locator.to_string(),
            waited,
        },
        other => other,
    }
}
