//! In-memory stand-in for the application under test.
//!
//! [`FakeAuthApp`] behaves like the real register/login pages as seen
//! through a [`BrowserSession`]: inputs addressed by id, a `<form>`,
//! redirects on success and an `alert-danger` banner on failure. It also
//! counts sessions opened and released so teardown can be checked
//! without a browser.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::error::{E2eError, E2eResult};
use crate::forms::{CONFIRM_PASSWORD_FIELD, EMAIL_FIELD, FORM_TAG, PASSWORD_FIELD};
use crate::identity::{EXISTING_EMAIL, VALID_EMAIL, VALID_PASSWORD};
use crate::locator::Locator;
use crate::session::{BrowserSession, SessionFactory};

pub const FAKE_BASE_URL: &str = "http://fake-app.test";
pub const ERROR_CLASS: &str = "alert-danger";

pub const MSG_PASSWORD_MISMATCH: &str = "Passwords do not match";
pub const MSG_EMAIL_IN_USE: &str = "Email is already in use";
pub const MSG_BAD_CREDENTIALS: &str = "Incorrect username or password";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Blank,
    Register,
    Login,
    Contact,
    NotFound,
}

impl Page {
    fn from_path(path: &str) -> Self {
        match path.trim_end_matches('/') {
            "/register" => Page::Register,
            "/login" => Page::Login,
            "/contact" => Page::Contact,
            _ => Page::NotFound,
        }
    }

    fn fields(&self) -> &'static [&'static str] {
        match self {
            Page::Register => &[EMAIL_FIELD, PASSWORD_FIELD, CONFIRM_PASSWORD_FIELD],
            Page::Login => &[EMAIL_FIELD, PASSWORD_FIELD],
            _ => &[],
        }
    }
}

#[derive(Debug, Default)]
struct AppState {
    accounts: HashMap<String, String>,
    opened: usize,
    released: usize,
    typed: HashMap<String, String>,
    last_page: Option<Page>,
}

#[derive(Debug, Clone, Default)]
struct Behaviour {
    render_delay: Duration,
    response_delay: Duration,
    missing_fields: Vec<String>,
    ignore_submissions: bool,
    fail_open: bool,
    panic_on_submit: bool,
    wrong_redirects: bool,
    banner_override: Option<&'static str>,
}

/// Shared application state behind every session it hands out
#[derive(Clone)]
pub struct FakeAuthApp {
    base_url: String,
    state: Arc<Mutex<AppState>>,
    behaviour: Behaviour,
}

impl Default for FakeAuthApp {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeAuthApp {
    /// An app with no accounts
    pub fn new() -> Self {
        Self {
            base_url: FAKE_BASE_URL.to_string(),
            state: Arc::new(Mutex::new(AppState::default())),
            behaviour: Behaviour::default(),
        }
    }

    /// An app holding the accounts the duplicate-email and login scenarios expect
    pub fn seeded() -> Self {
        Self::new()
            .with_account(EXISTING_EMAIL, VALID_PASSWORD)
            .with_account(VALID_EMAIL, VALID_PASSWORD)
    }

    pub fn with_account(self, email: &str, password: &str) -> Self {
        self.state
            .lock()
            .accounts
            .insert(email.to_string(), password.to_string());
        self
    }

    /// Form fields appear only this long after a page load
    pub fn with_render_delay(mut self, delay: Duration) -> Self {
        self.behaviour.render_delay = delay;
        self
    }

    /// Redirects and banners appear only this long after a submit
    pub fn with_response_delay(mut self, delay: Duration) -> Self {
        self.behaviour.response_delay = delay;
        self
    }

    pub fn without_field(mut self, id: &str) -> Self {
        self.behaviour.missing_fields.push(id.to_string());
        self
    }

    /// Submissions are accepted but nothing ever happens
    pub fn ignoring_submissions(mut self) -> Self {
        self.behaviour.ignore_submissions = true;
        self
    }

    pub fn failing_open(mut self) -> Self {
        self.behaviour.fail_open = true;
        self
    }

    pub fn panicking_on_submit(mut self) -> Self {
        self.behaviour.panic_on_submit = true;
        self
    }

    /// Successful submissions land on `/` instead of the expected page
    pub fn with_wrong_redirects(mut self) -> Self {
        self.behaviour.wrong_redirects = true;
        self
    }

    /// Every error banner shows this text instead of the real message
    pub fn with_banner_text(mut self, text: &'static str) -> Self {
        self.behaviour.banner_override = Some(text);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn has_account(&self, email: &str) -> bool {
        self.state.lock().accounts.contains_key(email)
    }

    pub fn account_count(&self) -> usize {
        self.state.lock().accounts.len()
    }

    pub fn sessions_opened(&self) -> usize {
        self.state.lock().opened
    }

    pub fn sessions_released(&self) -> usize {
        self.state.lock().released
    }

    /// Text typed into the field with this id by the most recent session
    pub fn last_typed(&self, id: &str) -> Option<String> {
        self.state.lock().typed.get(id).cloned()
    }

    pub fn page_of_last_session(&self) -> Option<Page> {
        self.state.lock().last_page
    }
}

#[async_trait]
impl SessionFactory for FakeAuthApp {
    async fn open(&self) -> E2eResult<Box<dyn BrowserSession>> {
        if self.behaviour.fail_open {
            return Err(E2eError::BrowserLaunch("fake app refused a session".into()));
        }
        {
            let mut state = self.state.lock();
            state.opened += 1;
            state.typed.clear();
        }
        Ok(Box::new(FakeSession {
            app: self.clone(),
            url: "about:blank".to_string(),
            page: Page::Blank,
            loaded_at: Instant::now(),
            fields: HashMap::new(),
            banner: None,
            pending: None,
            released: false,
        }))
    }
}

#[derive(Debug, Clone)]
enum Response {
    Redirect(&'static str),
    Banner(&'static str),
}

struct FakeSession {
    app: FakeAuthApp,
    url: String,
    page: Page,
    loaded_at: Instant,
    fields: HashMap<String, String>,
    banner: Option<String>,
    pending: Option<(Instant, Response)>,
    released: bool,
}

impl FakeSession {
    fn ensure_open(&self) -> E2eResult<()> {
        if self.released {
            return Err(E2eError::BrowserLaunch("session already released".into()));
        }
        Ok(())
    }

    fn load(&mut self, path: &str) {
        self.page = Page::from_path(path);
        self.url = self.app.url_for(path);
        self.loaded_at = Instant::now();
        self.fields.clear();
        self.banner = None;
        self.pending = None;
        self.app.state.lock().last_page = Some(self.page);
    }

    fn settle(&mut self) {
        let due = matches!(&self.pending, Some((at, _)) if Instant::now() >= *at);
        if !due {
            return;
        }
        if let Some((_, response)) = self.pending.take() {
            match response {
                Response::Redirect(path) => self.load(path),
                Response::Banner(msg) => self.banner = Some(msg.to_string()),
            }
        }
    }

    fn rendered(&self) -> bool {
        Instant::now() >= self.loaded_at + self.app.behaviour.render_delay
    }

    fn has_field(&self, id: &str) -> bool {
        self.rendered()
            && self.page.fields().contains(&id)
            && !self.app.behaviour.missing_fields.iter().any(|f| f == id)
    }

    fn has_form(&self) -> bool {
        self.rendered() && matches!(self.page, Page::Register | Page::Login)
    }

    fn field(&self, id: &str) -> &str {
        self.fields.get(id).map(String::as_str).unwrap_or("")
    }

    fn respond(&self) -> Option<Response> {
        let email = self.field(EMAIL_FIELD).to_string();
        let password = self.field(PASSWORD_FIELD).to_string();
        let mut state = self.app.state.lock();

        let response = match self.page {
            Page::Register => {
                if password != self.field(CONFIRM_PASSWORD_FIELD) {
                    Response::Banner(MSG_PASSWORD_MISMATCH)
                } else if state.accounts.contains_key(&email) {
                    Response::Banner(MSG_EMAIL_IN_USE)
                } else {
                    state.accounts.insert(email, password);
                    Response::Redirect("/login")
                }
            }
            Page::Login => match state.accounts.get(&email) {
                Some(stored) if *stored == password => Response::Redirect("/contact"),
                _ => Response::Banner(MSG_BAD_CREDENTIALS),
            },
            _ => return None,
        };

        match response {
            Response::Redirect(_) if self.app.behaviour.wrong_redirects => {
                Some(Response::Redirect("/"))
            }
            Response::Banner(_) if self.app.behaviour.banner_override.is_some() => {
                self.app.behaviour.banner_override.map(Response::Banner)
            }
            other => Some(other),
        }
    }
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn navigate(&mut self, url: &str) -> E2eResult<()> {
        self.ensure_open()?;
        let path = url.strip_prefix(&self.app.base_url).unwrap_or("/__external");
        let path = if path.is_empty() { "/" } else { path };
        self.load(path);
        Ok(())
    }

    async fn current_url(&mut self) -> E2eResult<String> {
        self.ensure_open()?;
        self.settle();
        Ok(self.url.clone())
    }

    async fn send_keys(&mut self, locator: &Locator, text: &str) -> E2eResult<bool> {
        self.ensure_open()?;
        self.settle();
        let Locator::Id(id) = locator else {
            return Ok(false);
        };
        if !self.has_field(id) {
            return Ok(false);
        }
        let value = self.fields.entry(id.clone()).or_default();
        value.push_str(text);
        let value = value.clone();
        self.app.state.lock().typed.insert(id.clone(), value);
        Ok(true)
    }

    async fn submit(&mut self, locator: &Locator) -> E2eResult<bool> {
        self.ensure_open()?;
        self.settle();
        if *locator != Locator::tag_name(FORM_TAG) || !self.has_form() {
            return Ok(false);
        }
        if self.app.behaviour.panic_on_submit {
            panic!("fake app crashed while handling the form");
        }
        if self.app.behaviour.ignore_submissions {
            return Ok(true);
        }
        if let Some(response) = self.respond() {
            let due = Instant::now() + self.app.behaviour.response_delay;
            self.pending = Some((due, response));
            self.settle();
        }
        Ok(true)
    }

    async fn text(&mut self, locator: &Locator) -> E2eResult<Option<String>> {
        self.ensure_open()?;
        self.settle();
        let text = match locator {
            Locator::ClassName(class) if class == ERROR_CLASS => self.banner.clone(),
            Locator::Id(id) if self.has_field(id) => Some(self.field(id).to_string()),
            Locator::TagName(tag) if tag == FORM_TAG && self.has_form() => Some(String::new()),
            _ => None,
        };
        Ok(text)
    }

    async fn quit(&mut self) -> E2eResult<()> {
        self.ensure_open()?;
        self.released = true;
        self.app.state.lock().released += 1;
        Ok(())
    }
}
