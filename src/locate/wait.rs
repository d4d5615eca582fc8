//! Polling of wait conditions against the live driver.
//!
//! A [`Condition`] maps the driver to a [`Response`]; [`poll`] evaluates it
//! repeatedly until it produces a hit or the driver's implicit-wait budget
//! runs out. A timeout is not exceptional: it degrades to
//! [`Response::Miss`], so "the element is not there yet" stays a cheap,
//! ordinary outcome.

use crate::driver::{DriverHandle, Strategy};
use crate::error::Result;
use crate::locate::response::Response;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Interval between condition evaluations while the budget lasts
pub const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// A swappable predicate over the live driver.
///
/// Conditions are compared by identity (the shared closure pointer) when they
/// participate in cache keys: two clones of one condition are the same
/// condition, two separately built ones never are.
#[derive(Clone)]
pub struct Condition {
    check: Arc<dyn Fn(&DriverHandle) -> Result<Response>>,
}

impl Condition {
    pub fn new(check: impl Fn(&DriverHandle) -> Result<Response> + 'static) -> Self {
        Self {
            check: Arc::new(check),
        }
    }

    /// Bare existence check: a hit as soon as one element matches
    pub fn exists(strategy: Strategy, query: impl Into<String>) -> Self {
        let query = query.into();
        Self::new(move |driver| {
            Ok(match driver.find_one(strategy, &query)? {
                Some(handle) => Response::single(driver, handle),
                None => Response::Miss,
            })
        })
    }

    /// Bare existence check over a list query: a hit list as soon as at
    /// least one element matches
    pub fn exists_all(strategy: Strategy, query: impl Into<String>) -> Self {
        let query = query.into();
        Self::new(move |driver| {
            let handles = driver.find_all(strategy, &query)?;
            Ok(Response::list(driver, handles))
        })
    }

    /// Evaluate the condition once
    pub fn check(&self, driver: &DriverHandle) -> Result<Response> {
        (self.check)(driver)
    }

    /// Identity token used for cache-key equality
    pub(crate) fn token(&self) -> usize {
        Arc::as_ptr(&self.check) as *const () as usize
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Condition[{:#x}]", self.token())
    }
}

/// Poll `condition` against the driver until it yields a hit or the driver's
/// implicit-wait budget elapses.
///
/// A zero budget means exactly one evaluation. Driver-level failures abort
/// the poll and propagate; an exhausted budget yields [`Response::Miss`].
pub fn poll(driver: &DriverHandle, condition: &Condition) -> Result<Response> {
    let deadline = Instant::now() + driver.implicit_wait();

    loop {
        let response = condition.check(driver)?;
        if response.is_hit() {
            return Ok(response);
        }

        let now = Instant::now();
        if now >= deadline {
            return Ok(Response::Miss);
        }

        std::thread::sleep(POLL_INTERVAL.min(deadline - now));
    }
}
