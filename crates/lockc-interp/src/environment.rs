//! Activation records.
//!
//! A call's new record is linked to the *caller's* environment, not the
//! callee's declaration site — there are no closures in Locks, so a
//! function body only ever sees the globals and whatever scope happened
//! to be active when it was invoked. This is a conscious simplification
//! carried over unchanged rather than a defect to fix (see the
//! interpreter's design notes).

use crate::value::Value;
use lockc_util::FxHashMap;
use std::cell::RefCell;
use std::rc::Rc;

pub struct Environment {
    values: FxHashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn global() -> Rc<RefCell<Environment>> {
        Rc::new(RefCell::new(Environment { values: FxHashMap::default(), enclosing: None }))
    }

    pub fn enclosed(parent: &Rc<RefCell<Environment>>) -> Rc<RefCell<Environment>> {
        Rc::new(RefCell::new(Environment { values: FxHashMap::default(), enclosing: Some(parent.clone()) }))
    }

    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(v) = self.values.get(name) {
            return Some(v.clone());
        }
        self.enclosing.as_ref().and_then(|e| e.borrow().get(name))
    }

    /// Assigns to the nearest enclosing scope that already declares
    /// `name`; returns `false` if no such scope exists (the caller turns
    /// that into a `NameErr`).
    pub fn assign(&mut self, name: &str, value: Value) -> bool {
        if self.values.contains_key(name) {
            self.values.insert(name.to_string(), value);
            return true;
        }
        match &self.enclosing {
            Some(parent) => parent.borrow_mut().assign(name, value),
            None => false,
        }
    }
}
