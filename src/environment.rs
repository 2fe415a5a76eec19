use crate::error::NameError;
use crate::symbol::Symbol;
use crate::types::Object;
use derive_more::{Deref, DerefMut};
use itertools::Itertools;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

#[derive(Deref, DerefMut, Default)]
pub struct Frame(pub HashMap<Symbol, Object>);

/// One frame of bindings plus the chain it extends. The outermost
/// environment (no parent) is the global frame.
#[derive(Default)]
pub struct Environment {
    frame: RefCell<Frame>,
    parent: Option<Rc<Environment>>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new innermost frame over `parent`. The parent chain is shared, not
    /// copied.
    pub fn extend(parent: &Rc<Environment>, bindings: Frame) -> Rc<Environment> {
        Rc::new(Self {
            frame: RefCell::new(bindings),
            parent: Some(parent.clone()),
        })
    }

    fn frames(&self) -> impl Iterator<Item = &Environment> {
        std::iter::successors(Some(self), |env| env.parent.as_deref())
    }

    fn global(&self) -> &Environment {
        self.frames()
            .last()
            .unwrap_or_else(|| unreachable!("successors always yields self"))
    }

    pub fn get(&self, key: &Symbol) -> Option<Object> {
        self.frames()
            .find_map(|env| env.frame.borrow().get(key).cloned())
    }

    pub fn contains(&self, key: &Symbol) -> bool {
        self.frames().any(|env| env.frame.borrow().contains_key(key))
    }

    pub fn lookup(&self, key: &Symbol) -> Result<Object, NameError> {
        self.get(key)
            .ok_or_else(|| NameError::Undefined(key.clone()))
    }

    /// Binds in the outermost frame, whatever frame `self` is.
    pub fn define(&self, key: Symbol, value: Object) {
        log::debug!("define {}", key);
        self.global().frame.borrow_mut().insert(key, value);
    }

    /// Overwrites the binding in the nearest frame that owns `key`.
    pub fn assign(&self, key: &Symbol, value: Object) -> Result<Object, NameError> {
        let owner = self
            .frames()
            .find(|env| env.frame.borrow().contains_key(key))
            .ok_or_else(|| NameError::Unassignable(key.clone()))?;
        log::debug!("set! {}", key);
        owner.frame.borrow_mut().insert(key.clone(), value.clone());
        Ok(value)
    }

    pub fn depth(&self) -> usize {
        self.frames().count()
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = self
            .frames()
            .map(|env| env.frame.borrow().keys().map(Symbol::name).sorted().join(" "))
            .join(" | ");
        write!(f, "#<env {}>", names)
    }
}

impl fmt::Debug for Environment {
    // Not derived: frames may contain closures that capture this environment.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Environment{{depth: {}}}", self.depth())
    }
}
