//! Duplicate a group of form fields ("add another address") and remove the
//! copies again, keeping every copy numbered `1..K` without gaps.
//!
//! The crate works on its own in-memory document: build a [`Page`] from
//! markup, attach a [`FieldGroupCloner`] to the fields a selector matches,
//! then drive it with user actions.
//!
//! ```
//! use form_field_cloner::Page;
//! use serde_json::json;
//!
//! # fn main() -> form_field_cloner::Result<()> {
//! let mut page = Page::from_html(
//!     r#"<form><label for="email_1">Mail</label><input id="email_1" class="mail"></form>"#,
//! )?;
//! page.attach_cloner("form > label, form > .mail", &json!({ "addButtonText": "Add" }))?;
//! page.click(".btn-blue-text")?;
//! page.assert_attr(".cloned-fields-1 input", "id", "email_1")?;
//! page.assert_focused(".cloned-fields-1 input")?;
//! # Ok(())
//! # }
//! ```

use std::error::Error as StdError;
use std::fmt;

mod cloner;
mod dom;
mod element_builder;
mod events;
mod html;
mod numbering;
mod options;
mod page;
mod selector;

pub use cloner::{ClonerId, FieldGroupCloner};
pub use element_builder::{ElementSpec, InsertPosition};
pub use options::{
    ClonerOptions, ControlClasses, DEFAULT_ADD_BUTTON_TEXT, DEFAULT_DELETE_BUTTON_TEXT,
    deep_merge,
};
pub use page::Page;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    HtmlParse(String),
    SelectorNotFound(String),
    UnsupportedSelector(String),
    TypeMismatch {
        selector: String,
        expected: String,
        actual: String,
    },
    DomMutation(String),
    Config(String),
    AssertionFailed {
        selector: String,
        expected: String,
        actual: String,
        dom_snippet: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HtmlParse(msg) => write!(f, "html parse error: {msg}"),
            Self::SelectorNotFound(selector) => write!(f, "selector not found: {selector}"),
            Self::UnsupportedSelector(selector) => write!(f, "unsupported selector: {selector}"),
            Self::TypeMismatch {
                selector,
                expected,
                actual,
            } => write!(
                f,
                "type mismatch for {selector}: expected {expected}, actual {actual}"
            ),
            Self::DomMutation(msg) => write!(f, "dom mutation error: {msg}"),
            Self::Config(msg) => write!(f, "configuration error: {msg}"),
            Self::AssertionFailed {
                selector,
                expected,
                actual,
                dom_snippet,
            } => write!(
                f,
                "assertion failed for {selector}: expected {expected}, actual {actual}, snippet {dom_snippet}"
            ),
        }
    }
}

impl StdError for Error {}

#[cfg(test)]
mod tests;
