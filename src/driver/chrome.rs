//! Chrome/Chromium backend over the `headless_chrome` CDP client.

use crate::driver::{Driver, ElementHandle, Strategy};
use crate::error::{EnvError, Result};
use headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption;
use headless_chrome::{Browser, Element, Tab};
use serde_json::Value;
use std::{cell::Cell, ffi::OsStr, path::PathBuf, sync::Arc, time::Duration};

/// Options for launching the Chrome backend
#[derive(Debug, Clone)]
pub struct ChromeOptions {
    /// Run in headless mode (default: true)
    pub headless: bool,

    /// Window width in pixels
    pub window_width: u32,

    /// Window height in pixels
    pub window_height: u32,

    /// Path to the Chrome binary (default: auto-detect)
    pub chrome_path: Option<PathBuf>,

    /// User data directory for the browser profile
    pub user_data_dir: Option<PathBuf>,

    /// Enable the Chrome sandbox (default: true)
    pub sandbox: bool,
}

impl Default for ChromeOptions {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1920,
            window_height: 1080,
            chrome_path: None,
            user_data_dir: None,
            sandbox: true,
        }
    }
}

impl ChromeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set headless mode
    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Builder method: set window size
    pub fn window_size(mut self, width: u32, height: u32) -> Self {
        self.window_width = width;
        self.window_height = height;
        self
    }

    /// Builder method: set Chrome binary path
    pub fn chrome_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.chrome_path = Some(path.into());
        self
    }

    /// Builder method: set user data directory
    pub fn user_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.user_data_dir = Some(dir.into());
        self
    }

    /// Builder method: set sandbox mode
    pub fn sandbox(mut self, sandbox: bool) -> Self {
        self.sandbox = sandbox;
        self
    }
}

/// Driver session backed by a Chrome/Chromium instance.
///
/// Owns the browser process for its lifetime; dropping the driver closes it.
pub struct ChromeDriver {
    browser: Browser,
    tab: Arc<Tab>,
    session: String,
    implicit_wait: Cell<Duration>,
}

impl ChromeDriver {
    /// Launch a new browser instance with the given options
    pub fn launch(options: ChromeOptions) -> Result<Self> {
        let mut launch_opts = headless_chrome::LaunchOptions::default();

        // Keep automation markers out of the way of bot detection
        launch_opts
            .ignore_default_args
            .push(OsStr::new("--enable-automation"));
        launch_opts
            .args
            .push(OsStr::new("--disable-blink-features=AutomationControlled"));

        // Timelapse sessions idle for long stretches; the 30 second default
        // would kill the browser between interactions
        launch_opts.idle_browser_timeout = Duration::from_secs(60 * 60);

        launch_opts.headless = options.headless;
        launch_opts.window_size = Some((options.window_width, options.window_height));
        launch_opts.sandbox = options.sandbox;

        if let Some(path) = options.chrome_path {
            launch_opts.path = Some(path);
        }

        if let Some(dir) = options.user_data_dir {
            launch_opts.user_data_dir = Some(dir);
        }

        let browser =
            Browser::new(launch_opts).map_err(|e| EnvError::LaunchFailed(e.to_string()))?;

        let tab = browser
            .new_tab()
            .map_err(|e| EnvError::LaunchFailed(format!("failed to create tab: {}", e)))?;

        let session = tab.get_target_id().clone();

        Ok(Self {
            browser,
            tab,
            session,
            implicit_wait: Cell::new(Duration::ZERO),
        })
    }

    /// Connect to an existing browser instance via WebSocket
    pub fn connect(ws_url: impl Into<String>) -> Result<Self> {
        let browser = Browser::connect(ws_url.into())
            .map_err(|e| EnvError::LaunchFailed(format!("connection failed: {}", e)))?;

        let tab = browser
            .new_tab()
            .map_err(|e| EnvError::LaunchFailed(format!("failed to create tab: {}", e)))?;

        let session = tab.get_target_id().clone();

        Ok(Self {
            browser,
            tab,
            session,
            implicit_wait: Cell::new(Duration::ZERO),
        })
    }

    /// Get the underlying Browser instance
    pub fn browser(&self) -> &Browser {
        &self.browser
    }

    /// Get the tab this driver operates on
    pub fn tab(&self) -> &Arc<Tab> {
        &self.tab
    }

    fn handle_for(&self, element: &Element<'_>) -> ElementHandle {
        ElementHandle::new(
            element.node_id,
            element.remote_object_id.clone(),
            self.session.clone(),
        )
    }

    /// Rematerialize an element from its handle. Failure here means the node
    /// is gone from the live DOM.
    fn element(&self, handle: &ElementHandle) -> Result<Element<'_>> {
        Element::new(&self.tab, handle.node_id)
            .map_err(|_| EnvError::StaleReference(handle.element_id.clone()))
    }
}

/// Whether a `headless_chrome` error means "no such element" as opposed to a
/// broken session.
fn is_no_element(err: &anyhow::Error) -> bool {
    err.downcast_ref::<headless_chrome::browser::tab::NoElementFound>()
        .is_some()
        || err.to_string().contains("No element found")
}

impl Driver for ChromeDriver {
    fn session_id(&self) -> &str {
        &self.session
    }

    fn implicit_wait(&self) -> Duration {
        self.implicit_wait.get()
    }

    fn set_implicit_wait(&self, budget: Duration) {
        self.implicit_wait.set(budget);
    }

    fn navigate(&self, url: &str) -> Result<()> {
        self.tab
            .navigate_to(url)
            .map_err(|e| EnvError::NavigationFailed(format!("{}: {}", url, e)))?;

        self.tab
            .wait_until_navigated()
            .map_err(|e| EnvError::NavigationFailed(format!("navigation timeout: {}", e)))?;

        Ok(())
    }

    fn current_url(&self) -> Result<String> {
        Ok(self.tab.get_url())
    }

    fn find_one(&self, strategy: Strategy, query: &str) -> Result<Option<ElementHandle>> {
        let found = if strategy.is_xpath() {
            self.tab.find_element_by_xpath(query)
        } else {
            self.tab.find_element(&strategy.as_css(query))
        };

        match found {
            Ok(element) => Ok(Some(self.handle_for(&element))),
            Err(e) if is_no_element(&e) => Ok(None),
            Err(e) => Err(EnvError::Driver(e.to_string())),
        }
    }

    fn find_all(&self, strategy: Strategy, query: &str) -> Result<Vec<ElementHandle>> {
        let found = if strategy.is_xpath() {
            self.tab.find_elements_by_xpath(query)
        } else {
            self.tab.find_elements(&strategy.as_css(query))
        };

        match found {
            Ok(elements) => Ok(elements.iter().map(|e| self.handle_for(e)).collect()),
            Err(e) if is_no_element(&e) => Ok(Vec::new()),
            Err(e) => Err(EnvError::Driver(e.to_string())),
        }
    }

    fn execute(&self, script: &str, args: &[Value]) -> Result<Value> {
        // Selenium-style calling convention: the script is a function body
        // applied to a positional argument array
        let arg_list = serde_json::to_string(args)
            .map_err(|e| EnvError::ScriptFailed(e.to_string()))?;
        let expression = format!("(function() {{ {} }}).apply(null, {})", script, arg_list);

        let result = self
            .tab
            .evaluate(&expression, false)
            .map_err(|e| EnvError::ScriptFailed(e.to_string()))?;

        Ok(result.value.unwrap_or(Value::Null))
    }

    fn click(&self, element: &ElementHandle) -> Result<()> {
        let el = self.element(element)?;

        if let Err(e) = el.click() {
            // Click interception is usually an element scrolled out of view
            log::debug!("direct click failed, retrying via script: {}", e);
            el.call_js_fn(
                "function() { this.scrollIntoView(); this.click(); }",
                Vec::new(),
                false,
            )
            .map_err(|e| EnvError::Driver(e.to_string()))?;
        }

        Ok(())
    }

    fn attribute(&self, element: &ElementHandle, name: &str) -> Result<Option<String>> {
        let el = self.element(element)?;
        let attributes = el
            .get_attributes()
            .map_err(|e| EnvError::Driver(e.to_string()))?;

        // DOM.getAttributes returns a flat [name, value, ...] list
        Ok(attributes.and_then(|list| {
            list.chunks_exact(2)
                .find(|pair| pair[0] == name)
                .map(|pair| pair[1].clone())
        }))
    }

    fn property(&self, element: &ElementHandle, name: &str) -> Result<Value> {
        self.call_on(
            element,
            "function(name) { return this[name]; }",
            &[Value::String(name.to_string())],
        )
    }

    fn call_on(&self, element: &ElementHandle, function: &str, args: &[Value]) -> Result<Value> {
        let el = self.element(element)?;
        let result = el
            .call_js_fn(function, args.to_vec(), false)
            .map_err(|e| EnvError::ScriptFailed(e.to_string()))?;

        Ok(result.value.unwrap_or(Value::Null))
    }

    fn screenshot(&self, element: Option<&ElementHandle>) -> Result<Vec<u8>> {
        match element {
            Some(handle) => {
                let el = self.element(handle)?;
                el.capture_screenshot(CaptureScreenshotFormatOption::Png)
                    .map_err(|e| EnvError::Screenshot(e.to_string()))
            }
            None => self
                .tab
                .capture_screenshot(CaptureScreenshotFormatOption::Png, None, None, true)
                .map_err(|e| EnvError::Screenshot(e.to_string())),
        }
    }

    fn close(&self) -> Result<()> {
        self.tab
            .close(false)
            .map_err(|e| EnvError::Driver(e.to_string()))?;
        Ok(())
    }
}
