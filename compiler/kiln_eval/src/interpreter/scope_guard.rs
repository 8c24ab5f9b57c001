//! RAII guards for interpreter state that must be restored on every exit
//! path: environment scopes and the construction depth.
//!
//! Both guards hold `&mut Interpreter` and deref to it, so code inside the
//! guarded region uses the interpreter as usual.
//!
//! ```text
//! interpreter.with_env_scope(|scoped| {
//!     scoped.env.define(name, value);
//!     scoped.exec_block(body)
//! })
//! ```

use std::ops::{Deref, DerefMut};

use super::Interpreter;
use crate::environment::{LocalScope, Scope};

/// Pops the environment scope it pushed when dropped.
pub(crate) struct ScopedInterpreter<'a> {
    interpreter: &'a mut Interpreter,
}

impl Drop for ScopedInterpreter<'_> {
    fn drop(&mut self) {
        self.interpreter.env.pop_scope();
    }
}

impl Deref for ScopedInterpreter<'_> {
    type Target = Interpreter;

    fn deref(&self) -> &Self::Target {
        self.interpreter
    }
}

impl DerefMut for ScopedInterpreter<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.interpreter
    }
}

/// Leaves the `begin` depth it entered when dropped.
pub(crate) struct DepthGuard<'a> {
    interpreter: &'a mut Interpreter,
}

impl<'a> DepthGuard<'a> {
    pub(crate) fn enter(interpreter: &'a mut Interpreter) -> Self {
        interpreter.site.enter_begin();
        DepthGuard { interpreter }
    }
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.interpreter.site.leave_begin();
    }
}

impl Deref for DepthGuard<'_> {
    type Target = Interpreter;

    fn deref(&self) -> &Self::Target {
        self.interpreter
    }
}

impl DerefMut for DepthGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.interpreter
    }
}

impl Interpreter {
    /// Run `f` in a child of the current scope.
    pub(crate) fn with_env_scope<R>(&mut self, f: impl FnOnce(&mut Interpreter) -> R) -> R {
        self.env.push_scope();
        let mut scoped = ScopedInterpreter { interpreter: self };
        f(&mut *scoped)
    }

    /// Run `f` in a child of `parent`, or in an isolated scope. Used for
    /// calls and `begin` blocks, which must not see the caller's lexicals.
    pub(crate) fn with_detached_scope<R>(
        &mut self,
        parent: Option<LocalScope<Scope>>,
        f: impl FnOnce(&mut Interpreter) -> R,
    ) -> R {
        self.env.push_detached(parent);
        let mut scoped = ScopedInterpreter { interpreter: self };
        f(&mut *scoped)
    }
}
