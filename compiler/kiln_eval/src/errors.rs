//! Errors raised while constructing or executing Kiln code.
//!
//! - [`EvalError`]: anything raised while code runs, including code run at
//!   construction time by a `begin` block
//! - [`CompileError`]: construction failed, either on a syntax error or
//!   because a `begin` block raised an [`EvalError`]
//! - [`KilnError`]: either of the above, for [`Interpreter::run_source`]
//!
//! [`Interpreter::run_source`]: crate::Interpreter::run_source

use kiln_diagnostic::{Diagnostic, ErrorCode};
use kiln_hooks::{HookError, InjectError};
use kiln_ir::Span;
use thiserror::Error;

use crate::ast::BinaryOp;
use crate::diagnostics::Backtrace;
use crate::parse::ParseError;
use crate::sources::SourceId;

pub type EvalResult<T = crate::Value> = Result<T, EvalError>;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum EvalErrorKind {
    /// Raised by `die`.
    #[error("{message}")]
    Die { message: String },

    #[error("unknown identifier `{name}`")]
    UndefinedVariable { name: String },

    #[error("undefined sub `{name}`")]
    UndefinedSub { name: String },

    #[error("cannot apply `{op}` to {left} and {right}")]
    BinaryTypeMismatch {
        op: BinaryOp,
        left: &'static str,
        right: &'static str,
    },

    #[error("cannot apply `{op}` to {operand}")]
    UnaryTypeMismatch {
        op: &'static str,
        operand: &'static str,
    },

    #[error("`{name}` expects {expected}, got {got}")]
    WrongArgType {
        name: String,
        expected: &'static str,
        got: &'static str,
    },

    #[error("`{name}` takes {expected} argument(s), got {got}")]
    ArityMismatch {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("{type_name} is not callable")]
    NotCallable { type_name: &'static str },

    #[error("integer overflow in `{op}`")]
    IntegerOverflow { op: &'static str },

    #[error("division by zero")]
    DivisionByZero,

    #[error("call depth limit of {depth} exceeded")]
    StackOverflow { depth: usize },

    /// `at_runtime::dispatch` was loaded as a value instead of called.
    #[error("`at_runtime::dispatch` can only be called, not used as a value")]
    DispatchAsValue,

    #[error(transparent)]
    Hook(#[from] HookError),

    #[error("no module named `{name}`")]
    UnknownModule { name: String },

    #[error("cannot read `{path}`: {message}")]
    UnreadableModule { path: String, message: String },

    /// A unit constructed at runtime (`eval`, `require`) failed to construct.
    #[error("{0}")]
    Compile(Box<CompileError>),
}

impl EvalErrorKind {
    pub fn code(&self) -> ErrorCode {
        match self {
            EvalErrorKind::Die { .. } => ErrorCode::E4001,
            EvalErrorKind::UndefinedVariable { .. } | EvalErrorKind::UndefinedSub { .. } => {
                ErrorCode::E4002
            }
            EvalErrorKind::BinaryTypeMismatch { .. }
            | EvalErrorKind::UnaryTypeMismatch { .. }
            | EvalErrorKind::WrongArgType { .. }
            | EvalErrorKind::DispatchAsValue => ErrorCode::E4003,
            EvalErrorKind::ArityMismatch { .. } => ErrorCode::E4004,
            EvalErrorKind::NotCallable { .. } => ErrorCode::E4005,
            EvalErrorKind::StackOverflow { .. } => ErrorCode::E4006,
            EvalErrorKind::DivisionByZero => ErrorCode::E4007,
            EvalErrorKind::IntegerOverflow { .. } => ErrorCode::E4008,
            EvalErrorKind::Hook(err) => hook_error_code(*err),
            EvalErrorKind::UnknownModule { .. } => ErrorCode::E2002,
            EvalErrorKind::UnreadableModule { .. } => ErrorCode::E2003,
            EvalErrorKind::Compile(err) => err.code(),
        }
    }
}

fn hook_error_code(err: HookError) -> ErrorCode {
    match err {
        HookError::NotConstructing | HookError::Inject(InjectError::NoUnit) => ErrorCode::E3001,
        HookError::StringEval | HookError::Inject(InjectError::StringEval) => ErrorCode::E3002,
        HookError::NoSlot { .. } => ErrorCode::E3003,
    }
}

/// A runtime error with its location and the call stack it was raised in.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("{kind}")]
pub struct EvalError {
    pub kind: EvalErrorKind,
    pub span: Option<Span>,
    /// Unit whose source `span` points into.
    pub unit: Option<SourceId>,
    pub backtrace: Option<Backtrace>,
}

impl EvalError {
    pub fn new(kind: EvalErrorKind) -> Self {
        EvalError {
            kind,
            span: None,
            unit: None,
            backtrace: None,
        }
    }

    pub fn die(message: impl Into<String>) -> Self {
        Self::new(EvalErrorKind::Die {
            message: message.into(),
        })
    }

    /// Set the span, and the unit it points into, unless they were
    /// recorded closer to the error.
    #[must_use]
    pub fn or_location(mut self, span: Span, unit: Option<SourceId>) -> Self {
        self.span.get_or_insert(span);
        if self.unit.is_none() {
            self.unit = unit;
        }
        self
    }

    #[must_use]
    pub fn with_backtrace(mut self, backtrace: Backtrace) -> Self {
        self.backtrace = Some(backtrace);
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.kind.code()
    }

    /// The hook error at the root of this error, looking through failed
    /// nested constructions.
    pub fn hook_error(&self) -> Option<HookError> {
        match &self.kind {
            EvalErrorKind::Hook(err) => Some(*err),
            EvalErrorKind::Compile(err) => err.hook_error(),
            _ => None,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut diag = Diagnostic::error(self.code()).with_message(self.kind.to_string());
        if let Some(span) = self.span {
            let label = match self.kind {
                EvalErrorKind::Compile(_) => "while constructing this unit",
                _ => "raised here",
            };
            diag = diag.with_label(span, label);
        }
        if let Some(backtrace) = self.backtrace.as_ref().filter(|bt| !bt.is_empty()) {
            diag = diag.with_note(backtrace.to_string().trim_end().to_owned());
        }
        diag
    }
}

impl From<HookError> for EvalError {
    fn from(err: HookError) -> Self {
        EvalError::new(EvalErrorKind::Hook(err))
    }
}

impl From<CompileError> for EvalError {
    fn from(err: CompileError) -> Self {
        EvalError::new(EvalErrorKind::Compile(Box::new(err)))
    }
}

/// Construction of a unit failed.
///
/// `unit` is the unit that failed; its recorded source is the buffer as
/// construction left it, so spans account for text injected before the
/// failure.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum CompileError {
    #[error("{error}")]
    Syntax {
        error: ParseError,
        unit: Option<SourceId>,
    },

    /// A `begin` block raised an error; the rest of the unit was not
    /// constructed.
    #[error("begin block failed; construction aborted: {error}")]
    Begin {
        span: Span,
        error: Box<EvalError>,
        unit: Option<SourceId>,
    },
}

impl From<ParseError> for CompileError {
    fn from(error: ParseError) -> Self {
        CompileError::Syntax { error, unit: None }
    }
}

impl CompileError {
    pub fn code(&self) -> ErrorCode {
        match self {
            CompileError::Syntax { error, .. } => error.code,
            CompileError::Begin { .. } => ErrorCode::E2001,
        }
    }

    pub fn unit(&self) -> Option<SourceId> {
        match self {
            CompileError::Syntax { unit, .. } | CompileError::Begin { unit, .. } => *unit,
        }
    }

    /// Record `id` as the failing unit unless one is already set.
    #[must_use]
    pub fn in_unit(mut self, id: SourceId) -> Self {
        match &mut self {
            CompileError::Syntax { unit, .. } | CompileError::Begin { unit, .. } => {
                unit.get_or_insert(id);
            }
        }
        self
    }

    pub fn hook_error(&self) -> Option<HookError> {
        match self {
            CompileError::Syntax { .. } => None,
            CompileError::Begin { error, .. } => error.hook_error(),
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            CompileError::Syntax { error, .. } => error.to_diagnostic(),
            CompileError::Begin { span, error, unit } => {
                let mut diag = Diagnostic::error(ErrorCode::E2001)
                    .with_message("begin block failed; construction aborted")
                    .with_label(*span, "this block failed");
                // Labels share one source; an error raised in another unit
                // is only named in the note below.
                let same_unit = error.unit.is_none() || error.unit == *unit;
                if let Some(inner) = error.span.filter(|_| same_unit) {
                    diag = diag.with_secondary_label(inner, error.kind.to_string());
                }
                diag = diag.with_note(format!("caused by [{}]: {}", error.code(), error.kind));
                if let Some(backtrace) = error.backtrace.as_ref().filter(|bt| !bt.is_empty()) {
                    diag = diag.with_note(backtrace.to_string().trim_end().to_owned());
                }
                diag
            }
        }
    }
}

/// Failure of a construct-then-execute run.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum KilnError {
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Runtime(#[from] EvalError),
}

impl KilnError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            KilnError::Compile(err) => err.to_diagnostic(),
            KilnError::Runtime(err) => err.to_diagnostic(),
        }
    }

    pub fn hook_error(&self) -> Option<HookError> {
        match self {
            KilnError::Compile(err) => err.hook_error(),
            KilnError::Runtime(err) => err.hook_error(),
        }
    }

    /// Unit whose source the diagnostic's spans point into.
    pub fn unit(&self) -> Option<SourceId> {
        match self {
            KilnError::Compile(err) => err.unit(),
            KilnError::Runtime(err) => err.unit,
        }
    }
}
