//! Locator descriptors: immutable definitions of how to find a named element.
//!
//! A [`Locator`] is a list of (strategy, query) pairs tried in declared
//! order, an optional default wait condition, and a flag for list queries.
//! Descriptors never change after construction; the priority among pairs is
//! fixed when the catalog is built, not recomputed per call.

use crate::driver::Strategy;
use crate::error::{EnvError, Result};
use crate::locate::wait::Condition;
use std::fmt;

/// A query under one strategy: either a fixed string or a template that
/// formats call-time terms into a string
#[derive(Clone)]
pub enum Query {
    /// A complete query string taking no terms
    Fixed(String),

    /// A query built from positional terms at resolution time
    Template {
        /// Number of terms the template consumes
        arity: usize,
        build: fn(&[String]) -> String,
    },
}

impl Query {
    pub fn fixed(query: impl Into<String>) -> Self {
        Query::Fixed(query.into())
    }

    pub fn template(arity: usize, build: fn(&[String]) -> String) -> Self {
        Query::Template { arity, build }
    }

    /// Number of terms this query consumes
    pub fn arity(&self) -> usize {
        match self {
            Query::Fixed(_) => 0,
            Query::Template { arity, .. } => *arity,
        }
    }

    /// Produce the concrete query string. Fixed queries ignore terms;
    /// templates assume the arity was validated upstream.
    pub fn format(&self, terms: &[String]) -> String {
        match self {
            Query::Fixed(query) => query.clone(),
            Query::Template { build, .. } => build(terms),
        }
    }
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::Fixed(query) => write!(f, "Fixed({:?})", query),
            Query::Template { arity, .. } => write!(f, "Template(arity={})", arity),
        }
    }
}

/// One (strategy, query) candidate within a descriptor
#[derive(Debug, Clone)]
pub struct Pair {
    pub strategy: Strategy,
    pub query: Query,
}

impl Pair {
    pub fn new(strategy: Strategy, query: Query) -> Self {
        Self { strategy, query }
    }

    pub fn fixed(strategy: Strategy, query: impl Into<String>) -> Self {
        Self::new(strategy, Query::fixed(query))
    }

    pub fn template(strategy: Strategy, arity: usize, build: fn(&[String]) -> String) -> Self {
        Self::new(strategy, Query::template(arity, build))
    }
}

/// An immutable definition of how to find a named element.
///
/// Pairs are tried in declared order until one produces a non-miss response;
/// catalogs put id-like queries before class-like before generic ones.
#[derive(Debug, Clone)]
pub struct Locator {
    pairs: Vec<Pair>,
    list: bool,
    until: Option<Condition>,
    navigates: bool,
}

impl Locator {
    pub fn new(pairs: Vec<Pair>) -> Self {
        Self {
            pairs,
            list: false,
            until: None,
            navigates: false,
        }
    }

    /// Single fixed CSS-selector locator
    pub fn css(query: impl Into<String>) -> Self {
        Self::new(vec![Pair::fixed(Strategy::Css, query)])
    }

    /// Single fixed locator under an explicit strategy
    pub fn by(strategy: Strategy, query: impl Into<String>) -> Self {
        Self::new(vec![Pair::fixed(strategy, query)])
    }

    /// Single templated locator
    pub fn template(strategy: Strategy, arity: usize, build: fn(&[String]) -> String) -> Self {
        Self::new(vec![Pair::template(strategy, arity, build)])
    }

    /// Builder method: append a lower-priority fixed candidate
    pub fn or(mut self, strategy: Strategy, query: impl Into<String>) -> Self {
        self.pairs.push(Pair::fixed(strategy, query));
        self
    }

    /// Builder method: append a lower-priority templated candidate
    pub fn or_template(
        mut self,
        strategy: Strategy,
        arity: usize,
        build: fn(&[String]) -> String,
    ) -> Self {
        self.pairs.push(Pair::template(strategy, arity, build));
        self
    }

    /// Builder method: mark as a list query (find-all semantics)
    pub fn list(mut self) -> Self {
        self.list = true;
        self
    }

    /// Builder method: attach the default wait condition
    pub fn until(mut self, condition: Condition) -> Self {
        self.until = Some(condition);
        self
    }

    /// Builder method: mark that clicking this element unloads the page.
    ///
    /// Waypoint-style elements stay unmarked: the page framework handles
    /// those transitions without a reload.
    pub fn navigating(mut self) -> Self {
        self.navigates = true;
        self
    }

    pub fn pairs(&self) -> &[Pair] {
        &self.pairs
    }

    pub fn is_list(&self) -> bool {
        self.list
    }

    pub fn default_until(&self) -> Option<&Condition> {
        self.until.as_ref()
    }

    pub fn navigates(&self) -> bool {
        self.navigates
    }

    /// Number of terms one resolution of this locator expects
    pub fn arity(&self) -> usize {
        self.pairs
            .iter()
            .map(|p| p.query.arity())
            .find(|a| *a > 0)
            .unwrap_or(0)
    }

    /// Validate call-time terms against this descriptor, before any driver
    /// round-trip.
    ///
    /// All templated pairs must agree on one arity, and the supplied term
    /// count must match it exactly (zero for an all-fixed descriptor).
    pub(crate) fn validate_terms(&self, name: &str, terms: &[String]) -> Result<()> {
        let arities: Vec<usize> = self
            .pairs
            .iter()
            .filter_map(|p| match p.query {
                Query::Template { arity, .. } => Some(arity),
                Query::Fixed(_) => None,
            })
            .collect();

        if let Some(first) = arities.first() {
            if arities.iter().any(|a| a != first) {
                return Err(EnvError::TermSignatureMismatch {
                    name: name.to_string(),
                    arities,
                });
            }
        }

        let expected = arities.first().copied().unwrap_or(0);
        if terms.len() != expected {
            return Err(EnvError::TermMismatch {
                name: name.to_string(),
                expected,
                given: terms.len(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_query_format() {
        let query = Query::fixed("div.themes-div > h3[data-enabled='true']");
        assert_eq!(query.arity(), 0);
        assert_eq!(
            query.format(&[]),
            "div.themes-div > h3[data-enabled='true']"
        );
    }

    #[test]
    fn test_template_query_format() {
        let query = Query::template(1, |t| format!("h3#{}", t[0]));
        assert_eq!(query.arity(), 1);
        assert_eq!(query.format(&["theme_biodiversity".to_string()]), "h3#theme_biodiversity");
    }

    #[test]
    fn test_locator_builder() {
        let locator = Locator::by(Strategy::Id, "menu-logo").navigating();
        assert_eq!(locator.pairs().len(), 1);
        assert!(!locator.is_list());
        assert!(locator.navigates());
        assert_eq!(locator.arity(), 0);

        let locator = Locator::css("div.themes-div > h3[data-enabled='true']").list();
        assert!(locator.is_list());
    }

    #[test]
    fn test_declared_order_is_priority() {
        let locator = Locator::template(Strategy::Css, 1, |t| format!("h3#{}", t[0]))
            .or_template(Strategy::Css, 1, |t| {
                format!("div.themes-div > h3[aria-controls='{}']", t[0])
            });

        let pairs = locator.pairs();
        assert_eq!(pairs.len(), 2);
        assert_eq!(
            pairs[0].query.format(&["a".to_string()]),
            "h3#a"
        );
        assert_eq!(
            pairs[1].query.format(&["a".to_string()]),
            "div.themes-div > h3[aria-controls='a']"
        );
    }

    #[test]
    fn test_validate_exact_arity() {
        let locator = Locator::template(Strategy::Css, 1, |t| format!("table#{}", t[0]));

        assert!(locator.validate_terms("ThemeTable", &["t".to_string()]).is_ok());

        match locator.validate_terms("ThemeTable", &[]) {
            Err(EnvError::TermMismatch {
                expected: 1,
                given: 0,
                ..
            }) => {}
            other => panic!("expected TermMismatch, got {:?}", other),
        }

        match locator.validate_terms("ThemeTable", &["a".to_string(), "b".to_string()]) {
            Err(EnvError::TermMismatch {
                expected: 1,
                given: 2,
                ..
            }) => {}
            other => panic!("expected TermMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_terms_for_fixed_locator() {
        let locator = Locator::by(Strategy::Id, "top-nav");

        match locator.validate_terms("TopNavigation", &["extra".to_string()]) {
            Err(EnvError::TermMismatch {
                expected: 0,
                given: 1,
                ..
            }) => {}
            other => panic!("expected TermMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_disagreeing_template_arities() {
        let locator = Locator::template(Strategy::Css, 1, |t| format!("h3#{}", t[0]))
            .or_template(Strategy::XPath, 2, |t| {
                format!("//div[text()='{}']/h3[text()='{}']", t[0], t[1])
            });

        match locator.validate_terms("Mixed", &["x".to_string()]) {
            Err(EnvError::TermSignatureMismatch { arities, .. }) => {
                assert_eq!(arities, vec![1, 2]);
            }
            other => panic!("expected TermSignatureMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_mixed_fixed_and_template_descriptor() {
        // Fixed fallbacks may sit alongside templates; they just ignore terms
        let locator = Locator::template(Strategy::Css, 1, |t| format!("h3#{}", t[0]))
            .or(Strategy::Css, "div#featured-layers > h3");

        assert!(locator.validate_terms("CategoryHeader", &["x".to_string()]).is_ok());
        assert_eq!(locator.arity(), 1);
        assert_eq!(
            locator.pairs()[1].query.format(&["x".to_string()]),
            "div#featured-layers > h3"
        );
    }
}
