//! Construction-time to runtime hook lowering.
//!
//! Code running while a unit is being constructed (inside a `begin` block)
//! can ask for a block to run *later*, at the point in the unit's execution
//! that corresponds to where construction currently is. This crate holds
//! the host-independent half of that mechanism:
//!
//! - [`HookRegistry`]: one optional slot per construction depth. A slot owns
//!   the [`DispatchFn`] for its depth, which owns the queued [`Hook`]s.
//! - [`DispatchBinder`]: the host's single runtime-visible name for "the
//!   dispatch function of the active depth".
//! - [`Lowering`]: the protocol run for each new hook. The first hook at a
//!   depth injects `at_runtime::dispatch(); begin { at_runtime::clear(d) }`
//!   into the unit and binds a fresh dispatch function; later hooks at the
//!   same depth just queue.
//!
//! # Lifetime
//!
//! The registry only holds a dispatch function until the self-clearing
//! `begin` runs, which is immediately after the host has constructed the
//! dispatch call. From then on the constructed call site is the only owner,
//! so queued blocks live exactly as long as the compiled code containing
//! the call. Dropping that code drops the blocks unrun.
//!
//! # Host contract
//!
//! The host implements [`ConstructionSite`]: it reports the construction
//! depth, whether the innermost unit is a string eval, splices text into
//! the unit under construction, and rebinds the dispatch name.

mod binder;
mod error;
mod hook;
mod lowering;
mod mode;
mod registry;

pub use binder::{ConstructionSite, DispatchBinder};
pub use error::{HookError, InjectError};
pub use hook::{DispatchFn, Hook, HookList};
pub use lowering::{clear_fragment, dispatch_fragment, Lowering, CLEAR_NAME, DISPATCH_NAME};
pub use mode::{InjectionMode, ParseInjectionModeError, INJECTION_ENV};
pub use registry::{HookRegistry, Registration};
