//! The driver boundary: raw find/execute/interact primitives.
//!
//! Everything above this module talks to the browser exclusively through the
//! [`Driver`] trait, so the resolution engine and the environment can be
//! exercised against a scripted fake in tests while production code runs on
//! [`chrome::ChromeDriver`].

pub mod chrome;

#[cfg(test)]
pub(crate) mod fake;

pub use chrome::{ChromeDriver, ChromeOptions};

use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{fmt, sync::Arc, time::Duration};

/// The query mechanism used to search the DOM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// CSS selector
    Css,
    /// `id` attribute
    Id,
    /// Class name (one of the whitespace-separated classes)
    Class,
    /// `name` attribute
    Name,
    /// Tag name
    Tag,
    /// XPath expression
    XPath,
}

impl Strategy {
    /// Translate a query under this strategy into an equivalent CSS selector.
    ///
    /// XPath has no CSS equivalent; drivers must route it to their XPath
    /// finder instead of calling this.
    pub fn as_css(self, query: &str) -> String {
        match self {
            Strategy::Css => query.to_string(),
            Strategy::Id => format!("[id='{}']", query),
            Strategy::Class => format!("[class~='{}']", query),
            Strategy::Name => format!("[name='{}']", query),
            Strategy::Tag => query.to_string(),
            Strategy::XPath => query.to_string(),
        }
    }

    /// Whether this strategy requires an XPath finder
    pub fn is_xpath(self) -> bool {
        matches!(self, Strategy::XPath)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::Css => "css",
            Strategy::Id => "id",
            Strategy::Class => "class",
            Strategy::Name => "name",
            Strategy::Tag => "tag",
            Strategy::XPath => "xpath",
        };
        write!(f, "{}", name)
    }
}

/// An opaque handle to one DOM element inside a driver session.
///
/// The handle borrows no browser resources; it carries just enough identity
/// (node, session-scoped element id, session id) for the driver to
/// rematerialize the element on the next interaction. A handle is assumed
/// valid until an interaction fails with
/// [`EnvError::StaleReference`](crate::EnvError::StaleReference).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle {
    /// Backend node id within the page
    pub node_id: u32,

    /// Session-scoped element id (CDP remote object id)
    pub element_id: String,

    /// Id of the driver session the element was resolved against
    pub session_id: String,
}

impl ElementHandle {
    pub fn new(node_id: u32, element_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            node_id,
            element_id: element_id.into(),
            session_id: session_id.into(),
        }
    }
}

/// Shared handle to a driver session.
///
/// The model is single-threaded and blocking: one logical test script drives
/// one session at a time. The `Arc` exists so hits can point back into the
/// session they were resolved against, not for cross-thread sharing.
pub type DriverHandle = Arc<dyn Driver>;

/// The collaborator contract every browser backend must satisfy.
///
/// All operations block the calling thread. `find_one`/`find_all` are
/// single-shot probes; polling against the implicit-wait budget is the
/// wait evaluator's job, not the driver's.
pub trait Driver {
    /// Id of the underlying browser session
    fn session_id(&self) -> &str;

    /// The configured implicit-wait budget consumed by the wait evaluator
    fn implicit_wait(&self) -> Duration;

    /// Reconfigure the implicit-wait budget
    fn set_implicit_wait(&self, budget: Duration);

    /// Load a URL and block until the page settles
    fn navigate(&self, url: &str) -> Result<()>;

    /// URL of the currently loaded page
    fn current_url(&self) -> Result<String>;

    /// Probe for the first element matching `(strategy, query)`.
    ///
    /// Absence is `Ok(None)`; an `Err` means the session itself failed.
    fn find_one(&self, strategy: Strategy, query: &str) -> Result<Option<ElementHandle>>;

    /// Probe for every element matching `(strategy, query)`, in document order
    fn find_all(&self, strategy: Strategy, query: &str) -> Result<Vec<ElementHandle>>;

    /// Execute a script body with positional arguments.
    ///
    /// `script` is treated as a function body: use `return` to produce a
    /// value and `arguments[n]` to read the nth argument.
    fn execute(&self, script: &str, args: &[Value]) -> Result<Value>;

    /// Click the element, scrolling it into view if the click is intercepted
    fn click(&self, element: &ElementHandle) -> Result<()>;

    /// Read a tag-level attribute; absence is `Ok(None)`
    fn attribute(&self, element: &ElementHandle, name: &str) -> Result<Option<String>>;

    /// Read a script-exposed property; absence is `Value::Null`
    fn property(&self, element: &ElementHandle, name: &str) -> Result<Value>;

    /// Invoke a JavaScript function with the element bound as `this`
    fn call_on(&self, element: &ElementHandle, function: &str, args: &[Value]) -> Result<Value>;

    /// Capture a PNG of one element, or of the viewport when `element` is
    /// `None`. Only guaranteed on the Chrome backend; other drivers may
    /// return [`EnvError::Screenshot`](crate::EnvError::Screenshot).
    fn screenshot(&self, element: Option<&ElementHandle>) -> Result<Vec<u8>>;

    /// Tear the session down
    fn close(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_as_css() {
        assert_eq!(Strategy::Css.as_css("div.themes-div"), "div.themes-div");
        assert_eq!(Strategy::Id.as_css("top-nav"), "[id='top-nav']");
        assert_eq!(Strategy::Class.as_css("layer-div"), "[class~='layer-div']");
        assert_eq!(Strategy::Name.as_css("q"), "[name='q']");
        assert_eq!(Strategy::Tag.as_css("h3"), "h3");
    }

    #[test]
    fn test_strategy_xpath_flag() {
        assert!(Strategy::XPath.is_xpath());
        assert!(!Strategy::Css.is_xpath());
        assert!(!Strategy::Id.is_xpath());
    }

    #[test]
    fn test_strategy_display() {
        assert_eq!(Strategy::Css.to_string(), "css");
        assert_eq!(Strategy::XPath.to_string(), "xpath");
    }

    #[test]
    fn test_strategy_serialization() {
        let json = serde_json::to_string(&Strategy::XPath).unwrap();
        assert_eq!(json, "\"x-path\"");

        let back: Strategy = serde_json::from_str("\"css\"").unwrap();
        assert_eq!(back, Strategy::Css);
    }

    #[test]
    fn test_element_handle_equality() {
        let a = ElementHandle::new(7, "obj-7", "session-1");
        let b = ElementHandle::new(7, "obj-7", "session-1");
        let c = ElementHandle::new(7, "obj-7", "session-2");

        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
