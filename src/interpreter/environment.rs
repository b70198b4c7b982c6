use std::{cell::RefCell, collections::HashMap, rc::Rc};

use super::error::RuntimeError;
use super::value::Value;

/// One lexical scope. Scopes are shared by every closure that captured them, so all mutation goes through the
/// interior `RefCell` and is visible to every holder.
#[derive(Default)]
pub struct Environment {
    values: RefCell<HashMap<String, Value>>,
    parent: Option<Rc<Environment>>,
}

impl Environment {
    pub fn new_global() -> Rc<Environment> {
        Rc::new(Environment::default())
    }

    pub fn new_child(parent: &Rc<Environment>) -> Rc<Environment> {
        Rc::new(Environment {
            values: RefCell::new(HashMap::new()),
            parent: Some(parent.clone()),
        })
    }

    /// Bind `name` in this scope, replacing any binding of the same name made here before
    pub fn define(&self, name: &str, value: Value) {
        tracing::trace!(name, "define");
        self.values.borrow_mut().insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Result<Value, RuntimeError> {
        let mut env = self;
        loop {
            if let Some(value) = env.values.borrow().get(name) {
                return Ok(value.clone());
            }
            match &env.parent {
                Some(parent) => env = parent.as_ref(),
                None => return Err(RuntimeError::UnresolvedName(name.to_string())),
            }
        }
    }

    /// Overwrite the nearest existing binding of `name`. Never declares.
    pub fn assign(&self, name: &str, value: Value) -> Result<(), RuntimeError> {
        let mut env = self;
        loop {
            if let Some(slot) = env.values.borrow_mut().get_mut(name) {
                *slot = value;
                return Ok(());
            }
            match &env.parent {
                Some(parent) => env = parent.as_ref(),
                None => return Err(RuntimeError::UnresolvedName(name.to_string())),
            }
        }
    }

    pub fn is_defined_locally(&self, name: &str) -> bool {
        self.values.borrow().contains_key(name)
    }
}
