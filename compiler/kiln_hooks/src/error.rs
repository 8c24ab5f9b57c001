//! Errors for hook registration and injection.
//!
//! Every error here is detected before the registry or the dispatch
//! binding is touched, so a failed call leaves no partial state.

use thiserror::Error;

/// Why text could not be spliced into a unit.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Hash)]
pub enum InjectError {
    #[error("no unit is being constructed")]
    NoUnit,
    #[error("cannot inject into a string-evaluated fragment")]
    StringEval,
}

/// Usage errors from [`Lowering`](crate::Lowering) and
/// [`HookRegistry`](crate::HookRegistry).
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Hash)]
pub enum HookError {
    #[error("must be called while constructing a unit")]
    NotConstructing,
    #[error("cannot defer to runtime from inside a string eval")]
    StringEval,
    #[error("no pending hooks at depth {depth}")]
    NoSlot { depth: usize },
    #[error(transparent)]
    Inject(#[from] InjectError),
}
