//! The resolution engine: from a named lookup to a concrete response.
//!
//! [`resolve`] is pure with respect to environment state: it reads the
//! registry and queries the driver, but never touches the query cache. The
//! caching wrapper lives in [`crate::env`], which keeps this step
//! independently testable.

use crate::driver::DriverHandle;
use crate::error::{EnvError, Result};
use crate::locate::locator::Pair;
use crate::locate::registry::Registry;
use crate::locate::response::Response;
use crate::locate::wait::{self, Condition};
use std::fmt;

/// The full identity of one resolution request: locator name, positional
/// terms, optional explicit strategy index, optional wait-condition override.
///
/// Two lookups with equal keys are semantically equivalent and share one
/// cache slot.
#[derive(Debug, Clone)]
pub struct LookupKey {
    pub name: String,
    pub terms: Vec<String>,
    pub strategy: Option<usize>,
    pub until: Option<Condition>,
}

impl LookupKey {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            terms: Vec::new(),
            strategy: None,
            until: None,
        }
    }

    /// Builder method: supply positional terms for templated queries
    pub fn with_terms<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.terms = terms.into_iter().map(Into::into).collect();
        self
    }

    /// Builder method: supply a single positional term
    pub fn with_term(mut self, term: impl Into<String>) -> Self {
        self.terms.push(term.into());
        self
    }

    /// Builder method: restrict resolution to one strategy of the descriptor
    pub fn with_strategy(mut self, index: usize) -> Self {
        self.strategy = Some(index);
        self
    }

    /// Builder method: override the descriptor's default wait condition
    pub fn with_until(mut self, condition: Condition) -> Self {
        self.until = Some(condition);
        self
    }

    /// The hashable identity of this key. Condition overrides participate by
    /// closure identity: retrying with a cloned condition hits the same
    /// slot, a freshly built one does not.
    pub(crate) fn cache_key(&self) -> CacheKey {
        CacheKey {
            name: self.name.clone(),
            terms: self.terms.clone(),
            strategy: self.strategy,
            until: self.until.as_ref().map(Condition::token),
        }
    }
}

impl From<&str> for LookupKey {
    fn from(name: &str) -> Self {
        LookupKey::name(name)
    }
}

impl From<String> for LookupKey {
    fn from(name: String) -> Self {
        LookupKey::name(name)
    }
}

impl fmt::Display for LookupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.terms.is_empty() {
            write!(f, "({})", self.terms.join(", "))?;
        }
        if let Some(i) = self.strategy {
            write!(f, "[strategy {}]", i)?;
        }
        Ok(())
    }
}

/// Hashable form of a [`LookupKey`], used to index the query cache
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub(crate) name: String,
    pub(crate) terms: Vec<String>,
    pub(crate) strategy: Option<usize>,
    pub(crate) until: Option<usize>,
}

/// Resolve a lookup against the registry and the live driver.
///
/// Caller-contract violations (unknown name, bad strategy index, term
/// mismatches) fail before any driver round-trip. Candidate pairs are then
/// tried in declared priority order, each through the wait evaluator; the
/// first non-miss response wins, and exhausting all candidates yields
/// [`Response::Miss`].
pub fn resolve(registry: &Registry, driver: &DriverHandle, key: &LookupKey) -> Result<Response> {
    let Some((name, locator)) = registry.lookup(&key.name) else {
        return Err(EnvError::UnknownLocator(key.name.clone()));
    };

    let candidates: Vec<(usize, &Pair)> = match key.strategy {
        Some(index) => {
            let Some(pair) = locator.pairs().get(index) else {
                return Err(EnvError::StrategyOutOfRange {
                    name: name.to_string(),
                    index,
                    len: locator.pairs().len(),
                });
            };
            vec![(index, pair)]
        }
        None => locator.pairs().iter().enumerate().collect(),
    };

    locator.validate_terms(name, &key.terms)?;

    for (index, pair) in candidates {
        let query = pair.query.format(&key.terms);

        let condition = key
            .until
            .clone()
            .or_else(|| locator.default_until().cloned())
            .unwrap_or_else(|| {
                if locator.is_list() {
                    Condition::exists_all(pair.strategy, query.clone())
                } else {
                    Condition::exists(pair.strategy, query.clone())
                }
            });

        let response = wait::poll(driver, &condition)?;
        if response.is_hit() {
            log::debug!(
                "resolved '{}' via strategy {} ({} {})",
                name,
                index,
                pair.strategy,
                query
            );
            return Ok(response);
        }
    }

    log::debug!("'{}' missed on all strategies", key);
    Ok(Response::Miss)
}
