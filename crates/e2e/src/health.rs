//! Reachability preflight for the application under test

use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::SuiteConfig;
use crate::error::{E2eError, E2eResult};
use crate::scenario::LOGIN_PATH;
use crate::wait::{Check, Wait};

const PREFLIGHT_POLL: Duration = Duration::from_millis(100);

/// Wait until the login page answers with a success status
pub async fn wait_for_app(config: &SuiteConfig) -> E2eResult<()> {
    let url = config.url_for(LOGIN_PATH);
    let mut client = reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()?;

    let mut login_page = LoginPage {
        url: url.clone(),
        base_url: config.base_url.clone(),
        attempts: 0,
    };
    let wait = Wait::new(config.preflight_timeout, PREFLIGHT_POLL);
    match wait.until("application reachable", &mut client, &mut login_page).await {
        Ok(()) => {
            info!("Application is up at {}", config.base_url);
            Ok(())
        }
        Err(E2eError::Timeout { .. }) => Err(E2eError::AppUnreachable {
            url,
            attempts: login_page.attempts,
        }),
        Err(e) => Err(e),
    }
}

struct LoginPage {
    url: String,
    base_url: String,
    attempts: usize,
}

#[async_trait]
impl Check<reqwest::Client> for LoginPage {
    type Output = ();

    async fn poll(&mut self, client: &mut reqwest::Client) -> E2eResult<Option<()>> {
        self.attempts += 1;
        match client.get(&self.url).send().await {
            Ok(resp) if resp.status().is_success() => Ok(Some(())),
            Ok(resp) => {
                warn!("Preflight {} returned {}", self.url, resp.status());
                Ok(None)
            }
            Err(e) => {
                if self.attempts == 1 {
                    info!("Waiting for application at {}...", self.base_url);
                }
                // Connection refused is expected while the app is starting
                if !e.is_connect() {
                    warn!("Preflight error: {}", e);
                }
                Ok(None)
            }
        }
    }
}
