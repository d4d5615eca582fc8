//! Scripted in-memory driver for exercising the resolution engine without a
//! browser. Tests place handles under (strategy, query) slots and inspect the
//! recorded traffic afterwards.

use crate::driver::{Driver, ElementHandle, Strategy};
use crate::error::{EnvError, Result};
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

/// The smallest valid 1x1 transparent PNG, for screenshot tests
pub const TINY_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

pub struct FakeDriver {
    dom: RefCell<HashMap<(Strategy, String), Vec<ElementHandle>>>,
    finds: RefCell<Vec<(Strategy, String)>>,
    clicks: RefCell<Vec<String>>,
    navigations: RefCell<Vec<String>>,
    attributes: RefCell<HashMap<(String, String), String>>,
    properties: RefCell<HashMap<(String, String), Value>>,
    call_results: RefCell<VecDeque<Value>>,
    calls: RefCell<Vec<(String, Vec<Value>)>>,
    stale: RefCell<HashSet<String>>,
    implicit_wait: Cell<Duration>,
    next_node: Cell<u32>,
}

impl FakeDriver {
    pub fn new() -> Self {
        Self {
            dom: RefCell::new(HashMap::new()),
            finds: RefCell::new(Vec::new()),
            clicks: RefCell::new(Vec::new()),
            navigations: RefCell::new(Vec::new()),
            attributes: RefCell::new(HashMap::new()),
            properties: RefCell::new(HashMap::new()),
            call_results: RefCell::new(VecDeque::new()),
            calls: RefCell::new(Vec::new()),
            stale: RefCell::new(HashSet::new()),
            implicit_wait: Cell::new(Duration::ZERO),
            next_node: Cell::new(1),
        }
    }

    /// Place `count` elements under a (strategy, query) slot, returning their
    /// handles
    pub fn place(&self, strategy: Strategy, query: &str, count: usize) -> Vec<ElementHandle> {
        let handles: Vec<ElementHandle> = (0..count)
            .map(|_| {
                let node = self.next_node.get();
                self.next_node.set(node + 1);
                ElementHandle::new(node, format!("obj-{}", node), "fake-session")
            })
            .collect();

        self.dom
            .borrow_mut()
            .insert((strategy, query.to_string()), handles.clone());
        handles
    }

    /// Remove a slot, as if the matching elements left the page
    pub fn remove(&self, strategy: Strategy, query: &str) {
        self.dom.borrow_mut().remove(&(strategy, query.to_string()));
    }

    pub fn set_attribute(&self, element: &ElementHandle, name: &str, value: &str) {
        self.attributes.borrow_mut().insert(
            (element.element_id.clone(), name.to_string()),
            value.to_string(),
        );
    }

    pub fn set_property(&self, element: &ElementHandle, name: &str, value: Value) {
        self.properties
            .borrow_mut()
            .insert((element.element_id.clone(), name.to_string()), value);
    }

    /// Queue the value the next `call_on` invocation returns
    pub fn push_call_result(&self, value: Value) {
        self.call_results.borrow_mut().push_back(value);
    }

    pub fn mark_stale(&self, element: &ElementHandle) {
        self.stale.borrow_mut().insert(element.element_id.clone());
    }

    /// Every find issued so far, in order
    pub fn finds(&self) -> Vec<(Strategy, String)> {
        self.finds.borrow().clone()
    }

    pub fn find_count(&self) -> usize {
        self.finds.borrow().len()
    }

    pub fn clicks(&self) -> Vec<String> {
        self.clicks.borrow().clone()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.navigations.borrow().clone()
    }

    /// Every `call_on` issued so far: (function source, args)
    pub fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.calls.borrow().clone()
    }

    fn check_attached(&self, element: &ElementHandle) -> Result<()> {
        if self.stale.borrow().contains(&element.element_id) {
            Err(EnvError::StaleReference(element.element_id.clone()))
        } else {
            Ok(())
        }
    }
}

impl Default for FakeDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl Driver for FakeDriver {
    fn session_id(&self) -> &str {
        "fake-session"
    }

    fn implicit_wait(&self) -> Duration {
        self.implicit_wait.get()
    }

    fn set_implicit_wait(&self, budget: Duration) {
        self.implicit_wait.set(budget);
    }

    fn navigate(&self, url: &str) -> Result<()> {
        self.navigations.borrow_mut().push(url.to_string());
        Ok(())
    }

    fn current_url(&self) -> Result<String> {
        Ok(self
            .navigations
            .borrow()
            .last()
            .cloned()
            .unwrap_or_else(|| "about:blank".to_string()))
    }

    fn find_one(&self, strategy: Strategy, query: &str) -> Result<Option<ElementHandle>> {
        self.finds.borrow_mut().push((strategy, query.to_string()));
        Ok(self
            .dom
            .borrow()
            .get(&(strategy, query.to_string()))
            .and_then(|handles| handles.first().cloned()))
    }

    fn find_all(&self, strategy: Strategy, query: &str) -> Result<Vec<ElementHandle>> {
        self.finds.borrow_mut().push((strategy, query.to_string()));
        Ok(self
            .dom
            .borrow()
            .get(&(strategy, query.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    fn execute(&self, _script: &str, _args: &[Value]) -> Result<Value> {
        Ok(Value::Null)
    }

    fn click(&self, element: &ElementHandle) -> Result<()> {
        self.check_attached(element)?;
        self.clicks.borrow_mut().push(element.element_id.clone());
        Ok(())
    }

    fn attribute(&self, element: &ElementHandle, name: &str) -> Result<Option<String>> {
        self.check_attached(element)?;
        Ok(self
            .attributes
            .borrow()
            .get(&(element.element_id.clone(), name.to_string()))
            .cloned())
    }

    fn property(&self, element: &ElementHandle, name: &str) -> Result<Value> {
        self.check_attached(element)?;
        Ok(self
            .properties
            .borrow()
            .get(&(element.element_id.clone(), name.to_string()))
            .cloned()
            .unwrap_or(Value::Null))
    }

    fn call_on(&self, element: &ElementHandle, function: &str, args: &[Value]) -> Result<Value> {
        self.check_attached(element)?;
        self.calls
            .borrow_mut()
            .push((function.to_string(), args.to_vec()));
        Ok(self
            .call_results
            .borrow_mut()
            .pop_front()
            .unwrap_or(Value::Null))
    }

    fn screenshot(&self, element: Option<&ElementHandle>) -> Result<Vec<u8>> {
        if let Some(el) = element {
            self.check_attached(el)?;
        }
        Ok(TINY_PNG.to_vec())
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}
