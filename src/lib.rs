//! # earthtime-use
//!
//! A Rust library for driving EarthTime pages via Chrome DevTools Protocol (CDP),
//! built around a cached locator-resolution engine for named DOM elements.
//!
//! ## Features
//!
//! - **Environment**: A blocking session bound to one validated EarthTime page,
//!   with a memo of every element it has already resolved
//! - **Locator Catalog**: Named, multi-strategy descriptors for the EarthTime UI
//!   (navigation, stories menu, data library, waypoints), extensible at runtime
//! - **Result Model**: Lookups answer with a [`Response`] - a miss, one element,
//!   or a non-empty collection - so "not found" stays ordinary data, not an error
//! - **Wait Evaluation**: Every resolution polls under a configurable
//!   implicit-wait budget before degrading to a miss
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use earthtime_use::{Environment, ScreenshotMode};
//!
//! # fn main() -> earthtime_use::Result<()> {
//! // Launch Chrome on the main explore page
//! let mut env = Environment::explore()?;
//!
//! // Resolve named elements; repeated pulls answer from the memo
//! let nav = env.pull("TopNavigation")?;
//! println!("top navigation found: {}", nav.is_hit());
//!
//! // Collections come back as hit lists
//! if let Some(headers) = env.pull("ThemeHeaders")?.as_list() {
//!     println!("{} themes enabled", headers.len());
//! }
//!
//! env.screenshot_to_file("explore.png")?;
//! env.quit()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Parameterized Lookups
//!
//! Template locators take positional terms and try their strategies in
//! priority order:
//!
//! ```rust,no_run
//! use earthtime_use::{Environment, LookupKey};
//!
//! # fn main() -> earthtime_use::Result<()> {
//! # let mut env = Environment::explore()?;
//! let header = env.pull(LookupKey::name("ThemeHeader").with_term("biodiversity"))?;
//! if let Some(hit) = header.as_hit() {
//!     println!("theme: {}", hit.attribute("innerText")?);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! - [`env`]: The environment, its query cache, and URL validation
//! - [`locate`]: Locators, the registry, wait conditions, the resolution
//!   engine, and the result model
//! - [`driver`]: The driver abstraction and its CDP implementation
//! - [`error`]: Error types and result alias

pub mod driver;
pub mod env;
pub mod error;
pub mod locate;

pub use driver::chrome::{ChromeDriver, ChromeOptions};
pub use driver::{Driver, DriverHandle, ElementHandle, Strategy};
pub use env::{validate_url, Environment, DEFAULT_WAIT, EXPLORE_URL};
pub use error::{EnvError, Result};
pub use locate::{
    Condition, Hit, HitList, Locator, LookupKey, Registry, Response, Screenshot, ScreenshotMode,
};
