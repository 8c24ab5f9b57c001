//! Host-side seams: the dispatch binding and the unit under construction.

use crate::{DispatchFn, InjectError, InjectionMode};

/// Owner of the single runtime-visible dispatch name.
pub trait DispatchBinder<B> {
    /// Expose `dispatch` as the active depth's dispatch function.
    ///
    /// The previous binding, if any, belongs to an ancestor depth. Code
    /// already constructed against it must keep calling it, so the binder
    /// replaces the binding rather than mutating it.
    fn bind(&mut self, depth: usize, dispatch: DispatchFn<B>);

    /// Restore `parent` as the binding, or remove the binding when `None`.
    ///
    /// `parent_depth` is the depth `parent` was created for, or 0.
    fn unbind_to(&mut self, parent_depth: usize, parent: Option<DispatchFn<B>>);
}

/// A host that is (possibly) constructing a unit.
pub trait ConstructionSite<B>: DispatchBinder<B> {
    /// Number of active construction-time blocks. Zero means none.
    fn depth(&self) -> usize;

    /// Whether the innermost unit under construction came from a string eval.
    fn compiling_string_eval(&self) -> bool;

    /// Splice `text` into the innermost unit under construction.
    fn inject(&mut self, mode: InjectionMode, text: &str) -> Result<(), InjectError>;
}
