//! Stack growth for deeply nested Kiln code.
//!
//! Both phases of a Kiln unit recurse over the source structure: the parser
//! descends into nested blocks and closures, and the evaluator descends into
//! nested calls. Construction-time `begin` blocks make this worse, because a
//! `begin` can `require` another module whose own parse runs on top of the
//! current one. Wrapping recursion points in [`ensure_sufficient_stack`]
//! keeps that from overflowing the native stack.
//!
//! - **Native targets**: `stacker` grows the stack on demand.
//! - **WASM targets**: passthrough.

/// Remaining stack below which we grow (128KB).
const RED_ZONE: usize = 128 * 1024;

/// Size of each new stack segment (1MB).
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Run `f`, first growing the stack if less than the red zone remains.
///
/// ```text
/// fn parse_block(&mut self) -> Result<Block, ParseError> {
///     ensure_sufficient_stack(|| self.parse_block_inner())
/// }
/// ```
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

/// WASM version: call directly.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
