//! Per-environment memo of resolved queries.
//!
//! The cache maps full [`CacheKey`]s (name, terms, strategy restriction,
//! condition identity) to the [`Response`] a resolution produced. Misses are
//! cached too: a query that came back empty stays empty until the slot is
//! evicted or the page state changes enough for the caller to invalidate.

use crate::locate::resolve::CacheKey;
use crate::locate::response::Response;
use indexmap::IndexMap;

#[derive(Debug, Default)]
pub struct QueryCache {
    entries: IndexMap<CacheKey, Response>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<&Response> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: CacheKey, response: Response) {
        self.entries.insert(key, response);
    }

    /// Drop one slot. Returns the evicted response if the slot was occupied.
    pub fn evict(&mut self, key: &CacheKey) -> Option<Response> {
        self.entries.shift_remove(key)
    }

    /// Drop every slot whose entry names `name`
    pub fn evict_name(&mut self, name: &str) {
        self.entries.retain(|key, _| key.name != name);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &str, terms: &[&str]) -> CacheKey {
        CacheKey {
            name: name.to_string(),
            terms: terms.iter().map(|t| t.to_string()).collect(),
            strategy: None,
            until: None,
        }
    }

    #[test]
    fn test_insert_get_evict() {
        let mut cache = QueryCache::new();
        cache.insert(key("TopNavigation", &[]), Response::Miss);

        assert!(matches!(
            cache.get(&key("TopNavigation", &[])),
            Some(Response::Miss)
        ));
        assert_eq!(cache.len(), 1);

        assert!(cache.evict(&key("TopNavigation", &[])).is_some());
        assert!(cache.is_empty());
        assert!(cache.evict(&key("TopNavigation", &[])).is_none());
    }

    #[test]
    fn test_terms_distinguish_slots() {
        let mut cache = QueryCache::new();
        cache.insert(key("ThemeHeader", &["biodiversity"]), Response::Miss);

        assert!(cache.get(&key("ThemeHeader", &["forests"])).is_none());
        assert!(cache.get(&key("ThemeHeader", &["biodiversity"])).is_some());
    }

    #[test]
    fn test_evict_name_spans_terms() {
        let mut cache = QueryCache::new();
        cache.insert(key("ThemeHeader", &["biodiversity"]), Response::Miss);
        cache.insert(key("ThemeHeader", &["forests"]), Response::Miss);
        cache.insert(key("TopNavigation", &[]), Response::Miss);

        cache.evict_name("ThemeHeader");
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&key("TopNavigation", &[])).is_some());
    }
}
