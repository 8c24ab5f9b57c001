//! Global symbol table.
//!
//! Each global name maps to a [`Glob`]: a shared cell holding the name's
//! current value. Constructed code holds globs, not names, so the stash can
//! either update a glob in place (every constructed reference sees the new
//! value) or replace it (constructed references keep the old glob).

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use kiln_ir::Name;
use rustc_hash::FxHashMap;

use crate::value::Value;

/// A named global cell.
pub struct Glob {
    name: Name,
    value: RefCell<Option<Value>>,
}

impl Glob {
    pub fn new(name: Name, value: Option<Value>) -> Rc<Self> {
        Rc::new(Glob {
            name,
            value: RefCell::new(value),
        })
    }

    pub fn name(&self) -> Name {
        self.name
    }

    /// Current value, or `None` if the global was referenced but never set.
    pub fn get(&self) -> Option<Value> {
        self.value.borrow().clone()
    }

    /// Store `value`, returning the previous one.
    ///
    /// The previous value is handed back so the caller decides when it is
    /// dropped; dropping a sub body can run native destructors.
    pub fn set(&self, value: Value) -> Option<Value> {
        self.value.borrow_mut().replace(value)
    }
}

impl fmt::Debug for Glob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Glob")
            .field("name", &self.name)
            .field("value", &self.value.borrow())
            .finish()
    }
}

/// Name to glob map.
#[derive(Default)]
pub struct Stash {
    globs: FxHashMap<Name, Rc<Glob>>,
}

impl Stash {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: Name) -> Option<&Rc<Glob>> {
        self.globs.get(&name)
    }

    /// The glob for `name`, creating an empty one if needed.
    pub fn resolve(&mut self, name: Name) -> Rc<Glob> {
        Rc::clone(
            self.globs
                .entry(name)
                .or_insert_with(|| Glob::new(name, None)),
        )
    }

    /// Set the value of `name`'s glob in place.
    pub fn define(&mut self, name: Name, value: Value) -> Option<Value> {
        self.resolve(name).set(value)
    }

    /// Bind `name` to a fresh glob holding `value`.
    ///
    /// The old glob is detached but keeps its value for whatever constructed
    /// code still references it.
    pub fn replace(&mut self, name: Name, value: Value) -> Option<Rc<Glob>> {
        self.globs.insert(name, Glob::new(name, Some(value)))
    }

    /// Detach `name`'s glob.
    pub fn remove(&mut self, name: Name) -> Option<Rc<Glob>> {
        self.globs.remove(&name)
    }

    pub fn contains(&self, name: Name) -> bool {
        self.globs.contains_key(&name)
    }
}
