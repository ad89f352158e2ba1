//! Authflow E2E Acceptance Suite
//!
//! Browser-driven acceptance tests for an application's registration
//! and login pages:
//! - Opens a fresh, isolated Chrome session per scenario
//! - Fills forms by element id and submits them
//! - Waits, with a bounded poll, for a redirect or an error banner
//! - Releases the session on every exit path
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TestRunner                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  for each Scenario (1..=5):                                 │
//! │    ├── SessionFactory::open() -> BrowserSession             │
//! │    ├── ScenarioPlan::execute()                              │
//! │    │     ├── navigate { base_url + path }                   │
//! │    │     ├── FormFiller: email / password / confirm         │
//! │    │     ├── submit first <form>                            │
//! │    │     └── wait_for(UrlIs | ElementPresent(.alert-danger))│
//! │    └── BrowserSession::quit()   (always, exactly once)      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ChromeSessionFactory (chromiumoxide)  │  FakeAuthApp        │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod chrome;
pub mod config;
pub mod error;
pub mod fake;
pub mod fixtures;
pub mod forms;
pub mod health;
pub mod identity;
pub mod locator;
pub mod runner;
pub mod scenario;
pub mod session;
pub mod wait;

pub use config::SuiteConfig;
pub use error::{E2eError, E2eResult, FailureKind};
pub use runner::{ScenarioResult, SuiteResult, TestRunner};
pub use scenario::Scenario;
pub use session::{BrowserSession, SessionFactory};
