//! Locator resolution: descriptors, wait conditions, the resolution engine,
//! and the result model it produces.
//!
//! The pieces compose bottom-up. A [`Locator`] names one or more
//! strategy/query pairs in priority order. [`resolve`] walks those pairs
//! against a driver, polling each through [`wait::poll`] under the driver's
//! implicit-wait budget, and returns the first [`Response`] that carries an
//! element. Absence is a value, [`Response::Miss`], never an error.

pub mod locator;
pub mod registry;
pub mod resolve;
pub mod response;
pub mod wait;

pub use locator::{Locator, Pair, Query};
pub use registry::{canonical_name, Registry};
pub use resolve::{resolve, CacheKey, LookupKey};
pub use response::{Hit, HitList, Response, Screenshot, ScreenshotMode};
pub use wait::{poll, Condition, POLL_INTERVAL};
