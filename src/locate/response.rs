//! Possible responses from a request to the DOM.
//!
//! Every lookup produces one of three shapes: [`Response::Miss`] (nothing
//! matched, always falsy), a single [`Hit`], or an ordered, never-empty
//! [`HitList`]. Absence is ordinary data here, not an error: chaining through
//! a failed lookup keeps yielding misses instead of failing.

use crate::driver::{DriverHandle, ElementHandle};
use crate::error::{EnvError, Result};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cell::RefCell;
use std::fmt;

/// The form a screenshot is returned in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScreenshotMode {
    /// Raw PNG bytes
    Png,
    /// Base64-encoded PNG string
    Base64,
    /// Decoded image object
    Image,
}

/// A captured screenshot, in the form requested via [`ScreenshotMode`]
pub enum Screenshot {
    Png(Vec<u8>),
    Base64(String),
    Image(image::DynamicImage),
}

impl Screenshot {
    pub(crate) fn encode(raw: Vec<u8>, mode: ScreenshotMode) -> Result<Self> {
        match mode {
            ScreenshotMode::Png => Ok(Screenshot::Png(raw)),
            ScreenshotMode::Base64 => Ok(Screenshot::Base64(STANDARD.encode(raw))),
            ScreenshotMode::Image => image::load_from_memory(&raw)
                .map(Screenshot::Image)
                .map_err(|e| EnvError::Screenshot(e.to_string())),
        }
    }

    /// Raw PNG bytes, when captured in `Png` mode
    pub fn as_png(&self) -> Option<&[u8]> {
        match self {
            Screenshot::Png(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Base64 string, when captured in `Base64` mode
    pub fn as_base64(&self) -> Option<&str> {
        match self {
            Screenshot::Base64(s) => Some(s),
            _ => None,
        }
    }

    /// Decoded image, when captured in `Image` mode
    pub fn as_image(&self) -> Option<&image::DynamicImage> {
        match self {
            Screenshot::Image(img) => Some(img),
            _ => None,
        }
    }
}

impl fmt::Debug for Screenshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Screenshot::Png(bytes) => write!(f, "Screenshot::Png({} bytes)", bytes.len()),
            Screenshot::Base64(s) => write!(f, "Screenshot::Base64({} chars)", s.len()),
            Screenshot::Image(img) => {
                write!(f, "Screenshot::Image({}x{})", img.width(), img.height())
            }
        }
    }
}

/// A successful single-element return from a request.
///
/// Owns no browser resources; the element lives in the driver's session and
/// is assumed attached until an interaction fails with
/// [`EnvError::StaleReference`].
pub struct Hit {
    driver: DriverHandle,
    handle: ElementHandle,
    /// Inline display value remembered by `hide` so `reset_display` can
    /// restore it exactly
    display: RefCell<Option<String>>,
}

impl Hit {
    pub fn new(driver: DriverHandle, handle: ElementHandle) -> Self {
        Self {
            driver,
            handle,
            display: RefCell::new(None),
        }
    }

    /// The session-scoped element id
    pub fn element_id(&self) -> &str {
        &self.handle.element_id
    }

    /// The id of the driver session this element was resolved against
    pub fn session_id(&self) -> &str {
        &self.handle.session_id
    }

    /// The raw handle, for callers going straight to the driver
    pub fn handle(&self) -> &ElementHandle {
        &self.handle
    }

    /// Strict attribute access: tag-level attributes first, then
    /// script-exposed properties. A miss on both is
    /// [`EnvError::AttributeNotFound`].
    pub fn attribute(&self, name: &str) -> Result<String> {
        if let Some(value) = self.driver.attribute(&self.handle, name)? {
            return Ok(value);
        }

        match self.driver.property(&self.handle, name)? {
            Value::Null => Err(EnvError::AttributeNotFound(name.to_string())),
            Value::String(s) => Ok(s),
            other => Ok(other.to_string()),
        }
    }

    /// Non-strict attribute access: same lookup as [`Hit::attribute`], but a
    /// miss is `Ok(None)` rather than an error
    pub fn try_attribute(&self, name: &str) -> Result<Option<String>> {
        match self.attribute(name) {
            Ok(value) => Ok(Some(value)),
            Err(EnvError::AttributeNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Read a script-exposed property of the element
    pub fn get_property(&self, name: &str) -> Result<Value> {
        self.driver.property(&self.handle, name)
    }

    /// Invoke a method of the element's script object
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value> {
        let mut call_args = vec![Value::String(name.to_string())];
        call_args.extend_from_slice(args);
        self.driver.call_on(
            &self.handle,
            "function(name, ...rest) { return this[name](...rest); }",
            &call_args,
        )
    }

    /// Click the element. Fails with [`EnvError::StaleReference`] if the
    /// element has detached from the live DOM.
    pub fn click(&self) -> Result<()> {
        self.driver.click(&self.handle)
    }

    /// Hide the element, remembering its prior inline display value
    pub fn hide(&self) -> Result<()> {
        let prior = self.driver.call_on(
            &self.handle,
            "function() { const d = this.style.display; this.style.display = 'none'; return d; }",
            &[],
        )?;

        let mut remembered = self.display.borrow_mut();
        if remembered.is_none() {
            *remembered = Some(prior.as_str().unwrap_or("").to_string());
        }

        Ok(())
    }

    /// Restore the inline display value remembered by [`Hit::hide`]. Without
    /// one, the inline display is cleared.
    pub fn reset_display(&self) -> Result<()> {
        let prior = self.display.borrow_mut().take().unwrap_or_default();
        self.driver.call_on(
            &self.handle,
            "function(d) { this.style.display = d; }",
            &[Value::String(prior)],
        )?;
        Ok(())
    }

    /// Apply a condition to this element, returning its boolean outcome
    pub fn verify(&self, condition: impl FnOnce(&Hit) -> bool) -> bool {
        condition(self)
    }

    /// Keep the element if the condition holds, otherwise degrade to a miss
    pub fn if_(self, condition: impl FnOnce(&Hit) -> bool) -> Response {
        if condition(&self) {
            Response::Hit(self)
        } else {
            Response::Miss
        }
    }

    /// Escape hatch: run an arbitrary function against the element
    pub fn apply<T>(&self, f: impl FnOnce(&Hit) -> T) -> T {
        f(self)
    }

    /// Capture a screenshot of this element in the requested form.
    ///
    /// Only guaranteed on the Chrome backend; other drivers may fail with
    /// [`EnvError::Screenshot`].
    pub fn screenshot(&self, mode: ScreenshotMode) -> Result<Screenshot> {
        let raw = self.driver.screenshot(Some(&self.handle))?;
        Screenshot::encode(raw, mode)
    }
}

impl Clone for Hit {
    fn clone(&self) -> Self {
        Self {
            driver: self.driver.clone(),
            handle: self.handle.clone(),
            display: RefCell::new(self.display.borrow().clone()),
        }
    }
}

impl PartialEq for Hit {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl fmt::Debug for Hit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hit[{}]", self.handle.element_id)
    }
}

/// An ordered list of hits.
///
/// Never empty by construction: zero matches must surface as
/// [`Response::Miss`], so every `HitList` has at least one element.
#[derive(Debug, Clone, PartialEq)]
pub struct HitList {
    hits: Vec<Hit>,
}

impl HitList {
    /// Build a list from hits; `None` when `hits` is empty
    pub fn new(hits: Vec<Hit>) -> Option<Self> {
        if hits.is_empty() {
            None
        } else {
            Some(Self { hits })
        }
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn first(&self) -> &Hit {
        &self.hits[0]
    }

    /// Positional access: a hit inside `[0, len)`, a miss outside it
    pub fn get(&self, index: usize) -> Response {
        match self.hits.get(index) {
            Some(hit) => Response::Hit(hit.clone()),
            None => Response::Miss,
        }
    }

    /// Strict positional access: out of range is [`EnvError::IndexOutOfRange`]
    pub fn at(&self, index: usize) -> Result<&Hit> {
        self.hits.get(index).ok_or(EnvError::IndexOutOfRange {
            index,
            len: self.hits.len(),
        })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Hit> {
        self.hits.iter()
    }

    /// Apply a condition to every hit, and-ing the outcomes
    pub fn verify(&self, condition: impl Fn(&Hit) -> bool) -> bool {
        self.hits.iter().all(condition)
    }

    /// Keep the hits satisfying the condition; a miss when none do
    pub fn where_(&self, condition: impl Fn(&Hit) -> bool) -> Response {
        let kept: Vec<Hit> = self.hits.iter().filter(|h| condition(h)).cloned().collect();
        match HitList::new(kept) {
            Some(list) => Response::HitList(list),
            None => Response::Miss,
        }
    }

    /// Apply a function to every hit, collecting the results
    pub fn apply<T>(&self, f: impl Fn(&Hit) -> T) -> Vec<T> {
        self.hits.iter().map(f).collect()
    }
}

impl<'a> IntoIterator for &'a HitList {
    type Item = &'a Hit;
    type IntoIter = std::slice::Iter<'a, Hit>;

    fn into_iter(self) -> Self::IntoIter {
        self.hits.iter()
    }
}

/// The outcome of one request to the DOM
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Nothing matched; always falsy
    Miss,
    /// Exactly one element matched
    Hit(Hit),
    /// More than zero elements matched a list query
    HitList(HitList),
}

impl Response {
    /// Wrap one found handle
    pub fn single(driver: &DriverHandle, handle: ElementHandle) -> Response {
        Response::Hit(Hit::new(driver.clone(), handle))
    }

    /// Wrap the handles of a list query; zero handles degrade to a miss
    pub fn list(driver: &DriverHandle, handles: Vec<ElementHandle>) -> Response {
        let hits: Vec<Hit> = handles
            .into_iter()
            .map(|h| Hit::new(driver.clone(), h))
            .collect();
        match HitList::new(hits) {
            Some(list) => Response::HitList(list),
            None => Response::Miss,
        }
    }

    /// Truthiness: hits and hit lists are true, a miss is false
    pub fn is_hit(&self) -> bool {
        !matches!(self, Response::Miss)
    }

    pub fn is_miss(&self) -> bool {
        matches!(self, Response::Miss)
    }

    /// Number of wrapped elements: 0, 1, or the list length
    pub fn len(&self) -> usize {
        match self {
            Response::Miss => 0,
            Response::Hit(_) => 1,
            Response::HitList(list) => list.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.is_miss()
    }

    pub fn as_hit(&self) -> Option<&Hit> {
        match self {
            Response::Hit(hit) => Some(hit),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&HitList> {
        match self {
            Response::HitList(list) => Some(list),
            _ => None,
        }
    }

    /// Positional access across all variants: a miss stays a miss, a single
    /// hit answers only index 0, a list delegates to [`HitList::get`]
    pub fn get(&self, index: usize) -> Response {
        match self {
            Response::Miss => Response::Miss,
            Response::Hit(hit) if index == 0 => Response::Hit(hit.clone()),
            Response::Hit(_) => Response::Miss,
            Response::HitList(list) => list.get(index),
        }
    }

    /// Non-strict attribute access forwarded to the (first) element; a miss
    /// yields `Ok(None)` rather than an error
    pub fn try_attribute(&self, name: &str) -> Result<Option<String>> {
        match self {
            Response::Miss => Ok(None),
            Response::Hit(hit) => hit.try_attribute(name),
            Response::HitList(list) => list.first().try_attribute(name),
        }
    }

    /// Click the (first) element; a miss is a no-op
    pub fn click(&self) -> Result<()> {
        match self {
            Response::Miss => Ok(()),
            Response::Hit(hit) => hit.click(),
            Response::HitList(list) => list.first().click(),
        }
    }

    /// Hide the (first) element; a miss is a no-op
    pub fn hide(&self) -> Result<()> {
        match self {
            Response::Miss => Ok(()),
            Response::Hit(hit) => hit.hide(),
            Response::HitList(list) => list.first().hide(),
        }
    }

    /// Restore the display value remembered by [`Response::hide`]; a miss is
    /// a no-op
    pub fn reset_display(&self) -> Result<()> {
        match self {
            Response::Miss => Ok(()),
            Response::Hit(hit) => hit.reset_display(),
            Response::HitList(list) => list.first().reset_display(),
        }
    }

    /// Capture a screenshot of the (first) element; `Ok(None)` for a miss
    pub fn screenshot(&self, mode: ScreenshotMode) -> Result<Option<Screenshot>> {
        match self {
            Response::Miss => Ok(None),
            Response::Hit(hit) => hit.screenshot(mode).map(Some),
            Response::HitList(list) => list.first().screenshot(mode).map(Some),
        }
    }

    /// Apply a condition: false for a miss, the predicate outcome for a hit,
    /// the and-ed outcome for a list
    pub fn verify(&self, condition: impl Fn(&Hit) -> bool) -> bool {
        match self {
            Response::Miss => false,
            Response::Hit(hit) => hit.verify(condition),
            Response::HitList(list) => list.verify(condition),
        }
    }

    /// Keep the response if the condition holds for it, else degrade to a miss
    pub fn if_(self, condition: impl Fn(&Hit) -> bool) -> Response {
        match self {
            Response::Miss => Response::Miss,
            Response::Hit(hit) => hit.if_(condition),
            Response::HitList(list) => {
                if list.verify(&condition) {
                    Response::HitList(list)
                } else {
                    Response::Miss
                }
            }
        }
    }

    /// Escape hatch over the (first) element; `None` for a miss
    pub fn apply<T>(&self, f: impl FnOnce(&Hit) -> T) -> Option<T> {
        match self {
            Response::Miss => None,
            Response::Hit(hit) => Some(hit.apply(f)),
            Response::HitList(list) => Some(f(list.first())),
        }
    }
}
