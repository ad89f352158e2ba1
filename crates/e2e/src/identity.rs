//! Test identities: throwaway emails and the fixed fixture credentials

use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;

/// Length of the random part of a generated email
pub const TOKEN_LEN: usize = 8;

/// Account that must already exist for the duplicate-email scenario
pub const EXISTING_EMAIL: &str = "existing@example.com";

/// Account that must already exist, with [`VALID_PASSWORD`], for the login scenario
pub const VALID_EMAIL: &str = "test@example.com";
pub const VALID_PASSWORD: &str = "Test123!";

pub const MISMATCH_PASSWORD: &str = "Different123!";

pub const NONEXISTENT_EMAIL: &str = "nonexistent@example.com";
pub const WRONG_PASSWORD: &str = "WrongPassword123!";

static GENERATED_EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^test_[a-z]{8}@example\.com$").expect("static pattern"));

/// Form input for one submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,

    /// Only set for the registration form
    pub confirm_password: Option<String>,
}

impl Credentials {
    pub fn registration(
        email: impl Into<String>,
        password: impl Into<String>,
        confirm_password: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            confirm_password: Some(confirm_password.into()),
        }
    }

    pub fn login(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            confirm_password: None,
        }
    }
}

/// Lowercase ASCII letters drawn from `rng`.
pub fn random_token<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len).map(|_| rng.gen_range(b'a'..=b'z') as char).collect()
}

/// A fresh `test_<token>@example.com` address.
///
/// Uniqueness is probabilistic: 26^8 possible tokens, not a guarantee.
pub fn random_email() -> String {
    email_from_rng(&mut rand::thread_rng())
}

pub fn email_from_rng<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("test_{}@example.com", random_token(rng, TOKEN_LEN))
}

/// Whether `email` has the exact shape [`random_email`] produces
pub fn is_generated_email(email: &str) -> bool {
    GENERATED_EMAIL.is_match(email)
}
