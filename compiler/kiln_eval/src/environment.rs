//! Lexical scopes for `let` variables and parameters.
//!
//! Globals never live here; they are resolved to stash entries when a unit
//! is parsed. A `begin` block starts from an empty scope chain, so it cannot
//! see the lexicals of the unit it sits in: those do not exist yet while
//! the unit is still being constructed.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use kiln_ir::Name;
use rustc_hash::FxHashMap;

use crate::value::Value;

/// Assignment to a name that no scope in the chain defines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AssignError;

/// Shared, interior-mutable handle to a scope.
///
/// Closures keep the scope they were created in alive through one of
/// these, after the block that pushed it has exited.
pub struct LocalScope<T>(Rc<RefCell<T>>);

impl<T> LocalScope<T> {
    pub fn new(value: T) -> Self {
        LocalScope(Rc::new(RefCell::new(value)))
    }

    pub fn borrow(&self) -> Ref<'_, T> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        self.0.borrow_mut()
    }
}

impl<T> Clone for LocalScope<T> {
    fn clone(&self) -> Self {
        LocalScope(Rc::clone(&self.0))
    }
}

// Scopes and the closures stored in them can form cycles, so the contents
// are not printed.
impl<T> fmt::Debug for LocalScope<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LocalScope(..)")
    }
}

/// Bindings introduced by one block or call.
#[derive(Debug, Default)]
pub struct Scope {
    bindings: FxHashMap<Name, Value>,
    parent: Option<LocalScope<Scope>>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parent(parent: LocalScope<Scope>) -> Self {
        Scope {
            bindings: FxHashMap::default(),
            parent: Some(parent),
        }
    }

    pub fn define(&mut self, name: Name, value: Value) {
        self.bindings.insert(name, value);
    }

    pub fn lookup(&self, name: Name) -> Option<Value> {
        match self.bindings.get(&name) {
            Some(value) => Some(value.clone()),
            None => self.parent.as_ref()?.borrow().lookup(name),
        }
    }

    /// Overwrite the innermost binding of `name`.
    pub fn assign(&mut self, name: Name, value: Value) -> Result<(), AssignError> {
        if let Some(slot) = self.bindings.get_mut(&name) {
            *slot = value;
            return Ok(());
        }
        match &self.parent {
            Some(parent) => parent.borrow_mut().assign(name, value),
            None => Err(AssignError),
        }
    }
}

/// The scopes of the code currently running, innermost last.
///
/// Never empty: the bottom entry is a root scope that is never popped.
pub struct Environment {
    scopes: Vec<LocalScope<Scope>>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            scopes: vec![LocalScope::new(Scope::new())],
        }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    fn top(&self) -> &LocalScope<Scope> {
        match self.scopes.last() {
            Some(scope) => scope,
            None => unreachable!("root scope is never popped"),
        }
    }

    /// Enter a nested block.
    pub fn push_scope(&mut self) {
        let scope = Scope::with_parent(self.top().clone());
        self.scopes.push(LocalScope::new(scope));
    }

    /// Enter a call or `begin` block. Lookups see `parent` (a closure's
    /// captured scope) or nothing, never the caller's locals.
    pub fn push_detached(&mut self, parent: Option<LocalScope<Scope>>) {
        let scope = parent.map_or_else(Scope::new, Scope::with_parent);
        self.scopes.push(LocalScope::new(scope));
    }

    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub fn current_scope(&self) -> LocalScope<Scope> {
        self.top().clone()
    }

    pub fn define(&mut self, name: Name, value: Value) {
        self.top().borrow_mut().define(name, value);
    }

    pub fn lookup(&self, name: Name) -> Option<Value> {
        self.top().borrow().lookup(name)
    }

    pub fn assign(&mut self, name: Name, value: Value) -> Result<(), AssignError> {
        self.top().borrow_mut().assign(name, value)
    }
}
