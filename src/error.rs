//! Error types and result aliases.
//!
//! The guiding split: "element not found" is data ([`crate::Response::Miss`]),
//! not an error. Everything here signals either a caller mistake (bad locator
//! name, wrong term count, index out of range) or a broken session (launch
//! failure, lost driver, detached element).

use thiserror::Error;

/// Errors that can occur during environment and locator operations
#[derive(Debug, Error)]
pub enum EnvError {
    /// The URL is not an accepted EarthTime page
    #[error("'{0}' is not an accepted EarthTime url")]
    InvalidUrl(String),

    /// No locator is registered under the requested name
    #[error("no locator registered under '{0}'")]
    UnknownLocator(String),

    /// The number of supplied terms does not match the locator's arity
    #[error("locator '{name}' expects {expected} term(s), {given} supplied")]
    TermMismatch {
        name: String,
        expected: usize,
        given: usize,
    },

    /// The templated queries of one locator disagree on how many terms they take
    #[error("templated queries of locator '{name}' disagree on arity: {arities:?}")]
    TermSignatureMismatch { name: String, arities: Vec<usize> },

    /// An explicit strategy index does not exist for the locator
    #[error("locator '{name}' has {len} strategies, index {index} is out of range")]
    StrategyOutOfRange {
        name: String,
        index: usize,
        len: usize,
    },

    /// A previously resolved element is no longer attached to the live DOM
    #[error("element {0} is no longer attached to the page")]
    StaleReference(String),

    /// Strict attribute access missed both the tag attributes and the
    /// script-exposed properties of the element
    #[error("'{0}' is not an attribute or property of this element")]
    AttributeNotFound(String),

    /// Positional access past the end of a hit list
    #[error("index {index} out of range for hit list of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// The environment has not been activated, or was already torn down
    #[error("environment is not active")]
    Inactive,

    /// Browser failed to launch
    #[error("failed to launch browser: {0}")]
    LaunchFailed(String),

    /// Navigation failed
    #[error("failed to navigate: {0}")]
    NavigationFailed(String),

    /// JavaScript evaluation failed
    #[error("script evaluation failed: {0}")]
    ScriptFailed(String),

    /// Screenshot capture failed or is not supported by the driver
    #[error("screenshot capture failed: {0}")]
    Screenshot(String),

    /// A session-level driver failure; fatal to the environment
    #[error("driver failure: {0}")]
    Driver(String),
}

/// Result type alias using [`EnvError`]
pub type Result<T> = std::result::Result<T, EnvError>;
