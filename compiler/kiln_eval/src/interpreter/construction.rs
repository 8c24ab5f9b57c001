//! Construction of units: the parser callbacks, `begin` execution, and the
//! host side of the hook lowering protocol.
//!
//! [`ConstructionState`] is kept apart from the rest of the interpreter so
//! that [`Lowering`](kiln_hooks::Lowering), which lives next to it, can
//! borrow it mutably as the construction site.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use kiln_hooks::{ConstructionSite, DispatchBinder, DispatchFn, InjectError, InjectionMode};
use kiln_ir::{Name, Span};
use kiln_lexer::Lexer;

use super::scope_guard::DepthGuard;
use super::{CompiledUnit, Interpreter, Module};
use crate::ast::{Block, FunctionDef};
use crate::diagnostics::{CallFrame, FrameKind};
use crate::errors::{CompileError, EvalError, EvalErrorKind, EvalResult};
use crate::parse::{ConstructionHost, Parser};
use crate::sources::{SourceId, UnitWarning};
use crate::stash::{Glob, Stash};
use crate::value::{DeferredBlock, FunctionValue, Value};

/// Where a unit's source came from.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum UnitOrigin {
    /// Handed to [`Interpreter::compile`].
    Main,
    /// Loaded by `require`.
    Module,
    /// A string passed to `eval`. Nothing may be injected into it.
    StringEval,
}

struct Construction {
    lexer: Rc<RefCell<Lexer>>,
    origin: UnitOrigin,
    name: Name,
    source: SourceId,
}

pub(super) struct ConstructionState {
    pub(super) stash: Stash,
    units: Vec<Construction>,
    depth: usize,
    pub(super) warnings: Vec<UnitWarning>,
    dispatch_name: Name,
}

impl ConstructionState {
    pub(super) fn new(dispatch_name: Name) -> Self {
        ConstructionState {
            stash: Stash::new(),
            units: Vec::new(),
            depth: 0,
            warnings: Vec::new(),
            dispatch_name,
        }
    }

    /// Name of the innermost unit under construction.
    pub(super) fn current_unit(&self) -> Option<Name> {
        self.units.last().map(|unit| unit.name)
    }

    /// Source entry of the innermost unit under construction.
    pub(super) fn current_source(&self) -> Option<SourceId> {
        self.units.last().map(|unit| unit.source)
    }

    pub(super) fn enter_begin(&mut self) {
        self.depth += 1;
    }

    pub(super) fn leave_begin(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}

impl DispatchBinder<DeferredBlock> for ConstructionState {
    fn bind(&mut self, depth: usize, dispatch: DispatchFn<DeferredBlock>) {
        tracing::debug!(depth, "at_runtime::dispatch bound");
        self.stash
            .replace(self.dispatch_name, Value::Dispatch(dispatch));
    }

    fn unbind_to(&mut self, parent_depth: usize, parent: Option<DispatchFn<DeferredBlock>>) {
        match parent {
            Some(parent) => {
                tracing::debug!(depth = parent_depth, "at_runtime::dispatch restored");
                self.stash.replace(self.dispatch_name, Value::Dispatch(parent));
            }
            None => {
                tracing::debug!("at_runtime::dispatch unbound");
                self.stash.remove(self.dispatch_name);
            }
        }
    }
}

impl ConstructionSite<DeferredBlock> for ConstructionState {
    fn depth(&self) -> usize {
        self.depth
    }

    fn compiling_string_eval(&self) -> bool {
        self.units
            .last()
            .is_some_and(|unit| unit.origin == UnitOrigin::StringEval)
    }

    fn inject(&mut self, mode: InjectionMode, text: &str) -> Result<(), InjectError> {
        let unit = self.units.last().ok_or(InjectError::NoUnit)?;
        if unit.origin == UnitOrigin::StringEval {
            return Err(InjectError::StringEval);
        }

        let injection = {
            let mut lexer = unit.lexer.borrow_mut();
            match mode {
                InjectionMode::Precise => lexer.insert_at_cursor(text),
                InjectionMode::Line => lexer.insert_next_line(text),
            }
        };
        tracing::trace!(offset = injection.offset, %mode, text, "text injected");

        if let Some(warning) = injection.warning {
            let unit_name = unit.lexer.borrow().interner().lookup(unit.name);
            self.warnings.push(UnitWarning {
                source: unit.source,
                diagnostic: warning.with_note(format!("in unit `{unit_name}`")),
            });
        }
        Ok(())
    }
}

impl ConstructionHost for Interpreter {
    fn resolve_global(&mut self, name: Name) -> Rc<Glob> {
        self.site.stash.resolve(name)
    }

    fn install_sub(&mut self, name: Name, def: FunctionDef) {
        let sub = Value::Function(Rc::new(FunctionValue {
            name,
            def: Rc::new(def),
            captured: None,
            source: self.site.current_source(),
        }));
        let previous = self.site.stash.define(name, sub);
        tracing::debug!(
            sub = self.interner.lookup(name),
            redefined = previous.is_some(),
            "sub installed"
        );
        // The old body, and any dispatch call constructed into it, goes now.
        drop(previous);
    }

    fn run_begin(&mut self, body: Block, span: Span) -> Result<(), CompileError> {
        let unit = self.site.current_unit().unwrap_or(self.main_unit);
        let label = self
            .interner
            .intern(&format!("{}::BEGIN", self.interner.lookup(unit)));

        let source = self.site.current_source();
        let result = {
            let mut guard = DepthGuard::enter(self);
            tracing::debug!(depth = guard.site.depth(), "running begin block");
            let frame = CallFrame::new(label, FrameKind::Begin, Some(span));
            guard.in_source(source, |interp| {
                interp.run_in_frame(frame, None, |interp| interp.exec_block(&body))
            })
        };

        result.map(drop).map_err(|error| {
            tracing::debug!(%error, "begin block failed");
            CompileError::Begin {
                span,
                error: Box::new(error),
                unit: None,
            }
        })
    }
}

impl Interpreter {
    /// Parse `source` as a unit, running its `begin` blocks.
    ///
    /// The buffer construction ends with is recorded in the source map
    /// whether or not it succeeds. If construction fails, hook slots opened
    /// at deeper depths by this unit will never see their clearing marker,
    /// so they are unwound.
    pub(super) fn construct(
        &mut self,
        name: Name,
        origin: UnitOrigin,
        path: Option<PathBuf>,
        source: &str,
    ) -> Result<CompiledUnit, CompileError> {
        let _span = tracing::debug_span!(
            "construct",
            unit = self.interner.lookup(name),
            ?origin
        )
        .entered();

        let base_depth = self.site.depth;
        let source_id = self
            .sources
            .add(self.interner.lookup(name).to_owned(), path, Rc::from(source));
        let lexer = self.new_lexer(source);
        self.site.units.push(Construction {
            lexer: Rc::clone(&lexer),
            origin,
            name,
            source: source_id,
        });
        let result = Parser::new(Rc::clone(&lexer), self).parse_unit();
        self.site.units.pop();

        let text: Rc<str> = match Rc::try_unwrap(lexer) {
            Ok(lexer) => lexer.into_inner().into_source().into(),
            Err(shared) => shared.borrow().source().into(),
        };
        self.sources.finish(source_id, Rc::clone(&text));

        let body = match result {
            Ok(body) => body,
            Err(err) => {
                self.lowering.unwind_to(&mut self.site, base_depth);
                return Err(err.in_unit(source_id));
            }
        };
        Ok(CompiledUnit {
            name,
            origin,
            body: Rc::new(body),
            source: text,
            source_id,
        })
    }

    /// `eval(text)`: construct `text` as a string-evaluated unit and run it.
    pub(super) fn eval_string(&mut self, text: &str) -> EvalResult {
        let unit = self.construct(self.names.eval_unit, UnitOrigin::StringEval, None, text)?;
        self.execute(&unit)
    }

    /// `require(name)`: construct and run a module once.
    pub(super) fn require(&mut self, module: &str) -> EvalResult {
        let key = self.interner.intern(module);
        let (source, path) = match self.modules.get(&key) {
            Some(Module::Loaded) => return Ok(Value::Bool(true)),
            Some(Module::Registered(source)) => (Rc::clone(source), None),
            None => {
                let (path, source) = self.find_module_file(module)?;
                (source, Some(path))
            }
        };
        let from_file = path.is_some();

        // Marked before construction so a module requiring itself stops.
        self.modules.insert(key, Module::Loaded);
        let result = self
            .construct(key, UnitOrigin::Module, path, &source)
            .map_err(EvalError::from)
            .and_then(|unit| self.execute(&unit));

        if let Err(err) = result {
            // A file module is looked up again on the next attempt.
            if from_file {
                self.modules.remove(&key);
            } else {
                self.modules.insert(key, Module::Registered(source));
            }
            return Err(err);
        }
        tracing::debug!(module, "module loaded");
        Ok(Value::Bool(true))
    }

    fn find_module_file(&self, module: &str) -> EvalResult<(PathBuf, Rc<str>)> {
        let relative = format!("{}.kn", module.replace("::", "/"));
        for dir in &self.module_paths {
            let path = dir.join(&relative);
            if !path.is_file() {
                continue;
            }
            return match std::fs::read_to_string(&path) {
                Ok(text) => Ok((path, Rc::from(text))),
                Err(err) => Err(EvalError::new(EvalErrorKind::UnreadableModule {
                    path: path.display().to_string(),
                    message: err.to_string(),
                })),
            };
        }
        Err(EvalError::new(EvalErrorKind::UnknownModule {
            name: module.to_owned(),
        }))
    }
}
