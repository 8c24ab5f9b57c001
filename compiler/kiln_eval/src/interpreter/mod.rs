//! The Kiln interpreter.
//!
//! One [`Interpreter`] owns everything a session needs: the global stash,
//! the stack of units under construction, the construction depth, the hook
//! registry, and the runtime environment. Units are constructed with
//! [`Interpreter::compile`] and run with [`Interpreter::execute`].
//!
//! # Construction depth
//!
//! Depth counts the `begin` blocks currently executing. It is 0 while plain
//! runtime code runs, 1 inside a top-level `begin`, and grows when a
//! `begin` constructs another unit (`require`, `eval`) that has `begin`
//! blocks of its own. Deferral is only possible at depth 1 or more.

mod builder;
mod builtins;
mod construction;
mod exec;
mod scope_guard;

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use kiln_hooks::{ConstructionSite, Hook, InjectionMode, Lowering};
use kiln_ir::{Name, SharedInterner};
use rustc_hash::FxHashMap;

use crate::ast::Block;
use crate::diagnostics::{CallFrame, CallStack, FrameKind};
use crate::environment::Environment;
use crate::errors::{CompileError, EvalError, EvalErrorKind, EvalResult, KilnError};
use crate::print_handler::SharedPrintHandler;
use crate::sources::{SourceId, SourceMap, UnitWarning};
use crate::value::{DeferredBlock, NativeFunction, Value};

pub use builder::{InterpreterBuilder, DEFAULT_MAX_CALL_DEPTH};
pub use construction::UnitOrigin;

use construction::ConstructionState;
use exec::Flow;

/// A constructed unit, ready to run any number of times.
///
/// Dropping it drops every block deferred into it that no other constructed
/// code references.
#[derive(Debug)]
pub struct CompiledUnit {
    name: Name,
    origin: UnitOrigin,
    body: Rc<Block>,
    source: Rc<str>,
    source_id: SourceId,
}

impl CompiledUnit {
    pub fn name(&self) -> Name {
        self.name
    }

    pub fn origin(&self) -> UnitOrigin {
        self.origin
    }

    pub fn body(&self) -> &Block {
        &self.body
    }

    /// Source as finally parsed, including text injected during
    /// construction.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Entry for this unit in the interpreter's [`SourceMap`].
    pub fn source_id(&self) -> SourceId {
        self.source_id
    }
}

enum Module {
    /// Source known, not yet loaded.
    Registered(Rc<str>),
    /// Constructed and run (or being constructed right now).
    Loaded,
}

/// Names interned once at construction of the interpreter.
#[derive(Clone, Copy)]
struct Names {
    dispatch: Name,
    anon: Name,
    eval_unit: Name,
}

impl Names {
    fn new(interner: &SharedInterner) -> Self {
        Names {
            dispatch: interner.intern(kiln_hooks::DISPATCH_NAME),
            anon: interner.intern("__ANON__"),
            eval_unit: interner.intern("(eval)"),
        }
    }
}

pub struct Interpreter {
    interner: SharedInterner,
    site: ConstructionState,
    lowering: Lowering<DeferredBlock>,
    env: Environment,
    call_stack: CallStack,
    /// Blocks to run when each executing block exits, innermost last.
    exit_actions: Vec<Vec<DeferredBlock>>,
    modules: FxHashMap<Name, Module>,
    module_paths: Vec<PathBuf>,
    print_handler: SharedPrintHandler,
    names: Names,
    main_unit: Name,
    sources: SourceMap,
    /// Unit of the code executing now; runtime error spans point into it.
    current_source: Option<SourceId>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// An interpreter with default settings; see [`InterpreterBuilder`].
    pub fn new() -> Self {
        InterpreterBuilder::new().build()
    }

    pub fn builder() -> InterpreterBuilder {
        InterpreterBuilder::new()
    }

    pub fn interner(&self) -> &SharedInterner {
        &self.interner
    }

    pub fn print_handler(&self) -> &SharedPrintHandler {
        &self.print_handler
    }

    pub fn injection_mode(&self) -> InjectionMode {
        self.lowering.mode()
    }

    // ===== Units =====

    /// Construct `source` as the main unit.
    pub fn compile(&mut self, source: &str) -> Result<CompiledUnit, CompileError> {
        self.construct(self.main_unit, UnitOrigin::Main, None, source)
    }

    /// Construct `source`, read from `path`, as the main unit.
    pub fn compile_file(&mut self, path: &Path, source: &str) -> Result<CompiledUnit, CompileError> {
        self.construct(self.main_unit, UnitOrigin::Main, Some(path.to_path_buf()), source)
    }

    /// Construct `source` as a main unit called `name`.
    pub fn compile_named(&mut self, name: &str, source: &str) -> Result<CompiledUnit, CompileError> {
        let name = self.interner.intern(name);
        self.construct(name, UnitOrigin::Main, None, source)
    }

    /// Run a constructed unit. Returns the value of its last statement.
    pub fn execute(&mut self, unit: &CompiledUnit) -> EvalResult {
        let _span = tracing::debug_span!("execute", unit = self.interner.lookup(unit.name)).entered();
        let body = Rc::clone(&unit.body);
        self.call_stack
            .push(CallFrame::new(unit.name, FrameKind::Unit, None))?;
        let result = self.in_source(Some(unit.source_id), |interp| {
            interp.with_detached_scope(None, |interp| interp.exec_block(&body))
        });
        self.call_stack.pop();
        result.map(Flow::into_value)
    }

    /// Construct and run `source` as the main unit.
    pub fn run_source(&mut self, source: &str) -> Result<Value, KilnError> {
        let unit = self.compile(source)?;
        Ok(self.execute(&unit)?)
    }

    /// Make `source` loadable with `require(name)`.
    pub fn add_module(&mut self, name: &str, source: &str) {
        let name = self.interner.intern(name);
        self.modules.insert(name, Module::Registered(Rc::from(source)));
    }

    /// Bind `name` to a Rust function.
    pub fn define_native(
        &mut self,
        name: &str,
        func: impl Fn(&mut Interpreter, &[Value], kiln_ir::Span) -> EvalResult + 'static,
    ) {
        let name = self.interner.intern(name);
        let native = Value::Native(Rc::new(NativeFunction::new(name, func)));
        self.site.stash.define(name, native);
    }

    /// Call a Kiln callable from Rust.
    pub fn call(&mut self, func: &Value, args: &[Value]) -> EvalResult {
        self.call_value(func, args, kiln_ir::Span::DUMMY)
    }

    /// Value of a global, if it is set.
    pub fn global(&self, name: &str) -> Option<Value> {
        let name = self.interner.intern(name);
        self.site.stash.get(name).and_then(|glob| glob.get())
    }

    // ===== Hooks =====

    /// Run `callable` at the runtime point matching the current
    /// construction point.
    pub fn at_runtime(&mut self, callable: Value) -> EvalResult<()> {
        self.defer(callable, false)
    }

    /// Run `callable` when the runtime block containing the current
    /// construction point exits.
    pub fn after_runtime(&mut self, callable: Value) -> EvalResult<()> {
        self.defer(callable, true)
    }

    fn defer(&mut self, callable: Value, after: bool) -> EvalResult<()> {
        if !callable.is_callable() {
            return Err(EvalError::new(EvalErrorKind::NotCallable {
                type_name: callable.type_name(),
            }));
        }
        let label = self.hook_label(after);
        let block = DeferredBlock { callable, label };
        let hook = if after {
            Hook::AfterRuntime(block)
        } else {
            Hook::AtRuntime(block)
        };
        let registration = self.lowering.defer(&mut self.site, hook)?;
        tracing::debug!(
            depth = self.site.depth(),
            created = registration.is_created(),
            after,
            "deferred block registered"
        );
        Ok(())
    }

    /// `<unit>::(at_runtime)` or `<unit>::(after_runtime)` for the
    /// innermost unit under construction.
    fn hook_label(&self, after: bool) -> Name {
        let unit = self.interner.lookup(self.site.current_unit().unwrap_or(self.main_unit));
        let kind = if after { "after_runtime" } else { "at_runtime" };
        self.interner.intern(&format!("{unit}::({kind})"))
    }

    /// Splice `text` into the unit under construction.
    pub fn lex_stuff(&mut self, text: &str) -> EvalResult<()> {
        self.lowering.inject_text(&mut self.site, text)?;
        Ok(())
    }

    /// Warnings collected during construction since the last call.
    pub fn take_warnings(&mut self) -> Vec<UnitWarning> {
        std::mem::take(&mut self.site.warnings)
    }

    /// Final text of every unit constructed so far, failed ones included.
    pub fn sources(&self) -> &SourceMap {
        &self.sources
    }

    /// Number of `begin` blocks currently executing.
    pub fn construction_depth(&self) -> usize {
        self.site.depth()
    }

    /// Depths that have a dispatch slot awaiting its clearing marker.
    pub fn pending_depths(&self) -> Vec<usize> {
        self.lowering.registry().active_depths().collect()
    }

    /// Depth of the dispatch function `at_runtime::dispatch` is bound to.
    pub fn dispatch_binding(&self) -> Option<usize> {
        match self.site.stash.get(self.names.dispatch)?.get()? {
            Value::Dispatch(dispatch) => Some(dispatch.depth()),
            _ => None,
        }
    }

    /// Frame names of the live call stack, innermost first.
    pub fn callers(&self) -> Vec<String> {
        self.call_stack
            .frames()
            .map(|frame| self.interner.lookup(frame.name).to_owned())
            .collect()
    }

    pub(crate) fn attach_backtrace(&self, err: EvalError) -> EvalError {
        self.call_stack.attach_backtrace(err, &self.interner)
    }

    /// Give `err` the location `span` in the executing unit, unless it was
    /// raised somewhere more precise.
    pub(crate) fn locate(&self, err: EvalError, span: kiln_ir::Span) -> EvalError {
        err.or_location(span, self.current_source)
    }

    /// Run `f` with `source` as the executing unit. `None` keeps the
    /// current one, as for natives.
    fn in_source<R>(&mut self, source: Option<SourceId>, f: impl FnOnce(&mut Self) -> R) -> R {
        let Some(source) = source else {
            return f(self);
        };
        let outer = self.current_source.replace(source);
        let result = f(self);
        self.current_source = outer;
        result
    }

    fn new_lexer(&self, source: &str) -> Rc<RefCell<kiln_lexer::Lexer>> {
        Rc::new(RefCell::new(kiln_lexer::Lexer::new(
            source,
            self.interner.clone(),
        )))
    }
}

#[cfg(test)]
mod tests;
