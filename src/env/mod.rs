//! The driving session: a validated EarthTime page, a driver, a locator
//! catalog, and a memo of everything already resolved.
//!
//! [`Environment`] is the crate's front door. `env.pull("ThemeHeaders")`
//! resolves a named element through the cache, `env.fetch(...)` forces a
//! fresh resolution, and `env.click(...)` knows which elements reload the
//! page and drops the memo when they do. All calls run on the caller's
//! thread and block until the driver answers.

pub mod cache;

use crate::driver::chrome::{ChromeDriver, ChromeOptions};
use crate::driver::{DriverHandle, Strategy};
use crate::error::{EnvError, Result};
use crate::locate::locator::Locator;
use crate::locate::registry::Registry;
use crate::locate::resolve::{resolve, CacheKey, LookupKey};
use crate::locate::response::{Response, Screenshot, ScreenshotMode};
use cache::QueryCache;
use regex::Regex;
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

/// Implicit-wait budget a fresh environment starts with
pub const DEFAULT_WAIT: Duration = Duration::from_millis(2500);

/// The main explore page
pub const EXPLORE_URL: &str = "https://earthtime.org/explore";

static EARTHTIME_URL: OnceLock<Regex> = OnceLock::new();

fn earthtime_url() -> &'static Regex {
    EARTHTIME_URL.get_or_init(|| {
        Regex::new(r"^https://([a-z0-9-]+\.)?earthtime\.org/(explore|stories/[A-Za-z0-9_-]+)/?$")
            .expect("EarthTime URL pattern")
    })
}

/// Check that `url` names an EarthTime explore or story page
pub fn validate_url(url: &str) -> Result<()> {
    if earthtime_url().is_match(url) {
        Ok(())
    } else {
        Err(EnvError::InvalidUrl(url.to_string()))
    }
}

pub struct Environment {
    driver: Option<DriverHandle>,
    registry: Registry,
    cache: QueryCache,
    history: Vec<LookupKey>,
    url: String,
}

impl Environment {
    /// Launch a Chrome driver with default options and open `url`
    pub fn new(url: &str) -> Result<Self> {
        Self::with_options(url, ChromeOptions::new())
    }

    /// Launch a Chrome driver with the given options and open `url`
    pub fn with_options(url: &str, options: ChromeOptions) -> Result<Self> {
        let driver: DriverHandle = Arc::new(ChromeDriver::launch(options)?);
        Self::from_driver(url, driver, Registry::earthtime())
    }

    /// The main explore page with default options
    pub fn explore() -> Result<Self> {
        Self::new(EXPLORE_URL)
    }

    /// Wrap an existing driver. Validates the URL, navigates, and arms the
    /// default implicit-wait budget.
    pub fn from_driver(url: &str, driver: DriverHandle, registry: Registry) -> Result<Self> {
        validate_url(url)?;
        driver.set_implicit_wait(DEFAULT_WAIT);
        driver.navigate(url)?;
        log::info!("environment active at {url}");
        Ok(Self {
            driver: Some(driver),
            registry,
            cache: QueryCache::new(),
            history: Vec::new(),
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Whether the driver is still attached
    pub fn is_active(&self) -> bool {
        self.driver.is_some()
    }

    /// Whether the catalog knows `name` (relaxed spellings included)
    pub fn contains(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    fn driver(&self) -> Result<&DriverHandle> {
        self.driver.as_ref().ok_or(EnvError::Inactive)
    }

    /// Memo slot for a key, with the name resolved to its catalog spelling
    /// so relaxed spellings of one locator share one slot
    fn slot(&self, key: &LookupKey) -> CacheKey {
        let mut slot = key.cache_key();
        if let Some((canonical, _)) = self.registry.lookup(&key.name) {
            slot.name = canonical.to_string();
        }
        slot
    }

    pub fn implicit_wait(&self) -> Result<Duration> {
        Ok(self.driver()?.implicit_wait())
    }

    /// Change how long resolutions keep polling before degrading to a miss.
    /// A zero budget means exactly one probe per candidate.
    pub fn set_implicit_wait(&self, budget: Duration) -> Result<()> {
        self.driver()?.set_implicit_wait(budget);
        Ok(())
    }

    /// Bring the environment to its page and drop the memo. On an inactive
    /// environment this launches a fresh default Chrome driver first.
    pub fn activate(&mut self) -> Result<()> {
        if self.driver.is_none() {
            let driver: DriverHandle = Arc::new(ChromeDriver::launch(ChromeOptions::new())?);
            driver.set_implicit_wait(DEFAULT_WAIT);
            self.driver = Some(driver);
        }
        self.driver()?.navigate(&self.url)?;
        self.cache.clear();
        Ok(())
    }

    /// Mediated navigation to another EarthTime page. The memo is dropped;
    /// navigation done directly through the driver is not detected and
    /// leaves invalidation to the caller.
    pub fn goto(&mut self, url: &str) -> Result<()> {
        validate_url(url)?;
        self.driver()?.navigate(url)?;
        self.url = url.to_string();
        self.cache.clear();
        Ok(())
    }

    /// Resolve a named element, answering from the memo when a slot for this
    /// exact key exists. Cached misses are answers too.
    pub fn pull(&mut self, key: impl Into<LookupKey>) -> Result<Response> {
        let key = key.into();
        let slot = self.slot(&key);

        if let Some(cached) = self.cache.get(&slot) {
            log::debug!("{key} answered from cache");
            let response = cached.clone();
            self.history.push(key);
            return Ok(response);
        }

        let response = resolve(&self.registry, self.driver()?, &key)?;
        self.cache.insert(slot, response.clone());
        self.history.push(key);
        Ok(response)
    }

    /// Resolve a named element against the live page, neither reading nor
    /// populating the memo. For callers who know the DOM moved since the
    /// last cached read.
    pub fn fetch(&mut self, key: impl Into<LookupKey>) -> Result<Response> {
        let key = key.into();
        let response = resolve(&self.registry, self.driver()?, &key)?;
        self.history.push(key);
        Ok(response)
    }

    /// Drop the entire memo unconditionally. The next pull of any key
    /// re-invokes the resolution engine.
    pub fn invalidate(&mut self) {
        self.cache.clear();
    }

    /// Drop the memo slot for one exact key
    pub fn evict(&mut self, key: impl Into<LookupKey>) {
        let key = key.into();
        let slot = self.slot(&key);
        self.cache.evict(&slot);
    }

    /// Drop every memo slot resolved under `name`, across all terms and
    /// strategy restrictions
    pub fn evict_name(&mut self, name: &str) {
        let canonical = match self.registry.lookup(name) {
            Some((canonical, _)) => canonical.to_string(),
            None => name.to_string(),
        };
        self.cache.evict_name(&canonical);
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Pull and click. When the element's descriptor is marked navigating,
    /// the whole memo is dropped afterwards since the page it described is
    /// gone.
    pub fn click(&mut self, key: impl Into<LookupKey>) -> Result<Response> {
        let key = key.into();
        let navigates = self
            .registry
            .lookup(&key.name)
            .map(|(_, locator)| locator.navigates())
            .unwrap_or(false);

        let response = self.pull(key)?;
        response.click()?;

        if navigates && response.is_hit() {
            log::debug!("navigating click, dropping {} cached slots", self.cache.len());
            self.cache.clear();
        }
        Ok(response)
    }

    /// Run `actions` and re-resolve `key` for as long as the result stays a
    /// miss: "do this until the target appears".
    ///
    /// The key's slot is evicted before every re-pull, so each round probes
    /// the live page even though it goes through the cached path. There is
    /// no built-in retry bound; an action that never produces the element
    /// loops forever, which is the caller's bug to bound.
    pub fn repeat_if(
        &mut self,
        key: impl Into<LookupKey>,
        mut actions: impl FnMut(&mut Self) -> Result<()>,
    ) -> Result<Response> {
        let key = key.into();
        let mut response = self.pull(key.clone())?;
        while response.is_miss() {
            actions(self)?;
            let slot = self.slot(&key);
            self.cache.evict(&slot);
            response = self.pull(key.clone())?;
        }
        Ok(response)
    }

    /// Re-run the most recent lookup through the cached path
    pub fn repeat(&mut self) -> Result<Response> {
        let Some(key) = self.history.last().cloned() else {
            return Ok(Response::Miss);
        };
        self.pull(key)
    }

    /// Re-run the `index`th lookup in the history (oldest first) through the
    /// cached path.
    ///
    /// An out-of-range index is a caller bug and fails with
    /// [`EnvError::IndexOutOfRange`], matching
    /// [`HitList::at`](crate::locate::response::HitList::at). This is
    /// stricter than answering a miss: a miss means the page lacked an
    /// element, not that the history lacked an entry.
    pub fn repeat_at(&mut self, index: usize) -> Result<Response> {
        let Some(key) = self.history.get(index).cloned() else {
            return Err(EnvError::IndexOutOfRange {
                index,
                len: self.history.len(),
            });
        };
        self.pull(key)
    }

    /// Keys pulled so far, oldest first
    pub fn history(&self) -> &[LookupKey] {
        &self.history
    }

    /// Run a script body in the page. `arguments[n]` inside the body refers
    /// to `args[n]`.
    pub fn execute(&self, script: &str, args: &[Value]) -> Result<Value> {
        self.driver()?.execute(script, args)
    }

    /// One-off uncached lookup by raw strategy and query
    pub fn find(&self, strategy: Strategy, query: &str) -> Result<Response> {
        let driver = self.driver()?;
        Ok(match driver.find_one(strategy, query)? {
            Some(handle) => Response::single(driver, handle),
            None => Response::Miss,
        })
    }

    /// One-off uncached lookup of every match for a raw strategy and query
    pub fn find_all(&self, strategy: Strategy, query: &str) -> Result<Response> {
        let driver = self.driver()?;
        let handles = driver.find_all(strategy, query)?;
        Ok(Response::list(driver, handles))
    }

    /// Resolve a name registered on the fly, outside the predefined catalog
    pub fn register(&mut self, name: impl Into<String>, locator: Locator) {
        self.registry.register(name, locator);
    }

    /// Capture the full page
    pub fn screenshot(&self, mode: ScreenshotMode) -> Result<Screenshot> {
        let raw = self.driver()?.screenshot(None)?;
        Screenshot::encode(raw, mode)
    }

    /// Capture the full page and write it as PNG
    pub fn screenshot_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let raw = self.driver()?.screenshot(None)?;
        std::fs::write(path.as_ref(), raw).map_err(|e| EnvError::Screenshot(e.to_string()))
    }

    /// Detach and hand the driver back without closing it. The environment
    /// is inactive afterwards; cached responses are dropped.
    pub fn release_driver(&mut self) -> Option<DriverHandle> {
        self.cache.clear();
        self.driver.take()
    }

    /// Close the driver and drop all cached responses
    pub fn quit(&mut self) -> Result<()> {
        self.cache.clear();
        if let Some(driver) = self.driver.take() {
            driver.close()?;
        }
        Ok(())
    }
}

impl Drop for Environment {
    fn drop(&mut self) {
        if let Some(driver) = self.driver.take() {
            if let Err(e) = driver.close() {
                log::warn!("driver close on drop failed: {e}");
            }
        }
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("url", &self.url)
            .field("active", &self.is_active())
            .field("cached", &self.cache.len())
            .field("history", &self.history.len())
            .finish()
    }
}
