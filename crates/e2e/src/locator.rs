//! Element locators

use std::fmt;

/// How an element is addressed on the page
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    /// `id` attribute
    Id(String),
    /// One entry of the `class` attribute
    ClassName(String),
    /// Element tag, e.g. `form`
    TagName(String),
}

impl Locator {
    pub fn id(name: impl Into<String>) -> Self {
        Locator::Id(name.into())
    }

    pub fn class_name(name: impl Into<String>) -> Self {
        Locator::ClassName(name.into())
    }

    pub fn tag_name(name: impl Into<String>) -> Self {
        Locator::TagName(name.into())
    }

    /// CSS selector equivalent
    pub fn css(&self) -> String {
        match self {
            Locator::Id(id) => format!("#{}", css_escape(id)),
            Locator::ClassName(class) => format!(".{}", css_escape(class)),
            Locator::TagName(tag) => tag.clone(),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Id(id) => write!(f, "id={}", id),
            Locator::ClassName(class) => write!(f, "class={}", class),
            Locator::TagName(tag) => write!(f, "tag={}", tag),
        }
    }
}

// Identifiers here are plain ASCII names; anything else gets a backslash escape.
fn css_escape(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len());
    for c in ident.chars() {
        if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
            out.push(c);
        } else {
            out.push('\\');
            out.push(c);
        }
    }
    out
}
