//! `InterpreterBuilder` for creating Interpreter instances with various configurations.

use std::path::PathBuf;

use kiln_hooks::{InjectionMode, Lowering};
use kiln_ir::SharedInterner;
use rustc_hash::FxHashMap;

use super::construction::ConstructionState;
use super::{builtins, Interpreter, Names};
use crate::diagnostics::CallStack;
use crate::environment::Environment;
use crate::print_handler::{stdout_handler, SharedPrintHandler};
use crate::sources::SourceMap;

/// Call depth at which a runaway recursion is reported instead of
/// overflowing the native stack.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 10_000;

/// Builder for creating Interpreter instances with various configurations.
///
/// ```text
/// let interp = Interpreter::builder()
///     .injection(InjectionMode::Line)
///     .print_handler(buffer_handler())
///     .build();
/// ```
pub struct InterpreterBuilder {
    injection: Option<InjectionMode>,
    print_handler: Option<SharedPrintHandler>,
    max_call_depth: Option<usize>,
    unit_name: String,
    module_paths: Vec<PathBuf>,
    interner: Option<SharedInterner>,
}

impl Default for InterpreterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl InterpreterBuilder {
    pub fn new() -> Self {
        InterpreterBuilder {
            injection: None,
            print_handler: None,
            max_call_depth: Some(DEFAULT_MAX_CALL_DEPTH),
            unit_name: "main".to_owned(),
            module_paths: Vec::new(),
            interner: None,
        }
    }

    /// Set the injection variant.
    ///
    /// Default is whatever `KILN_INJECTION` selects, falling back to
    /// [`InjectionMode::Precise`].
    #[must_use]
    pub fn injection(mut self, mode: InjectionMode) -> Self {
        self.injection = Some(mode);
        self
    }

    /// Set where `print` writes. Default is stdout.
    #[must_use]
    pub fn print_handler(mut self, handler: SharedPrintHandler) -> Self {
        self.print_handler = Some(handler);
        self
    }

    /// Set the call depth limit; `None` removes it.
    #[must_use]
    pub fn max_call_depth(mut self, depth: Option<usize>) -> Self {
        self.max_call_depth = depth;
        self
    }

    /// Name of units handed to [`Interpreter::compile`].
    #[must_use]
    pub fn unit_name(mut self, name: impl Into<String>) -> Self {
        self.unit_name = name.into();
        self
    }

    /// Add a directory searched by `require` for `<Name>.kn` files.
    #[must_use]
    pub fn module_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.module_paths.push(dir.into());
        self
    }

    /// Share an existing interner instead of creating one.
    #[must_use]
    pub fn interner(mut self, interner: SharedInterner) -> Self {
        self.interner = Some(interner);
        self
    }

    pub fn build(self) -> Interpreter {
        let interner = self.interner.unwrap_or_default();
        let names = Names::new(&interner);
        let mode = self.injection.unwrap_or_else(InjectionMode::from_env);
        tracing::debug!(%mode, "interpreter created");

        let mut interpreter = Interpreter {
            site: ConstructionState::new(names.dispatch),
            lowering: Lowering::new(mode),
            env: Environment::new(),
            call_stack: CallStack::new(self.max_call_depth),
            exit_actions: Vec::new(),
            modules: FxHashMap::default(),
            module_paths: self.module_paths,
            print_handler: self.print_handler.unwrap_or_else(stdout_handler),
            names,
            main_unit: interner.intern(&self.unit_name),
            interner,
            sources: SourceMap::default(),
            current_source: None,
        };
        builtins::register(&mut interpreter);
        interpreter
    }
}
