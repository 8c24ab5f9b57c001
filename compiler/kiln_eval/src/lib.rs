//! Kiln Eval - parser and tree-walking interpreter for Kiln.
//!
//! A Kiln unit goes through two phases:
//!
//! 1. **Construction.** The parser reads the unit one token at a time. Each
//!    `begin { ... }` block is executed as soon as its closing brace is
//!    parsed, and each `sub` is installed as soon as it is parsed. Code in a
//!    `begin` block may splice more source into the unit (`lex_stuff`) or
//!    defer a block to runtime (`at_runtime`, `after_runtime`).
//! 2. **Execution.** The constructed [`CompiledUnit`] is run by
//!    [`Interpreter::execute`], as many times as the caller likes.
//!
//! # Architecture
//!
//! - `parse`: recursive-descent parser driving a [`kiln_lexer::Lexer`] and
//!   calling back into the interpreter through [`ConstructionHost`]
//! - `Environment`: lexical scopes for locals, shared with closures
//! - `Stash`: globals. Names that are not lexicals resolve to a [`Glob`]
//!   at construction time
//! - `interpreter`: construction stack, `begin` depth, hook dispatch and
//!   evaluation
//! - `SourceMap`: the final text of each constructed unit, which error and
//!   warning spans are resolved against
//!
//! Deferred blocks are lowered by [`kiln_hooks::Lowering`]; this crate is
//! its host.

mod ast;
mod diagnostics;
mod environment;
pub mod errors;
pub mod interpreter;
mod operators;
mod parse;
mod print_handler;
mod sources;
mod stash;
mod value;

pub use ast::{BinaryOp, Block, Expr, ExprKind, FunctionDef, Stmt, StmtKind, UnaryOp};
pub use diagnostics::{Backtrace, BacktraceFrame, CallFrame, CallStack, FrameKind};
pub use environment::{AssignError, Environment, LocalScope, Scope};
pub use errors::{CompileError, EvalError, EvalErrorKind, EvalResult, KilnError};
pub use interpreter::{
    CompiledUnit, Interpreter, InterpreterBuilder, UnitOrigin, DEFAULT_MAX_CALL_DEPTH,
};
pub use parse::{ConstructionHost, ParseError, Parser};
pub use print_handler::{
    buffer_handler, silent_handler, stdout_handler, PrintHandlerImpl, SharedPrintHandler,
};
pub use sources::{SourceId, SourceMap, UnitSource, UnitWarning};
pub use stash::{Glob, Stash};
pub use value::{DeferredBlock, FunctionValue, NativeFn, NativeFunction, Value};

pub use kiln_hooks::InjectionMode;
