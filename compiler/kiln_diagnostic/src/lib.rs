//! Diagnostics for Kiln.
//!
//! A [`Diagnostic`] is what a user sees when a unit fails to lex, parse or
//! construct, when it fails at runtime, or when line-granular injection
//! lands after code the user did not expect to run first. Rendering lives
//! in [`emitter`]; this module only describes the problem.

pub mod emitter;
pub mod span_utils;

use std::fmt;

use kiln_ir::Span;

macro_rules! error_codes {
    ($($(#[$doc:meta])* $code:ident => $summary:literal,)*) => {
        /// Stable, searchable identifier of a diagnostic.
        ///
        /// The first digit is the phase that raised it: 0 lexing, 1
        /// parsing, 2 construction, 3 deferral and injection, 4 runtime.
        /// `W` codes are warnings.
        #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
        pub enum ErrorCode {
            $($(#[$doc])* $code,)*
        }

        impl ErrorCode {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(ErrorCode::$code => stringify!($code),)*
                }
            }

            /// One-line explanation of what the code means.
            pub fn summary(&self) -> &'static str {
                match self {
                    $(ErrorCode::$code => $summary,)*
                }
            }
        }
    };
}

error_codes! {
    E0001 => "string literal is missing its closing quote",
    E0002 => "character that cannot start a token",
    E0003 => "integer literal does not fit in 64 bits",

    E1001 => "unexpected token",
    E1002 => "expected an expression",
    E1003 => "delimiter opened but never closed",
    E1004 => "expected an identifier",
    E1005 => "`return` outside a sub or closure",

    /// Construction of the unit was aborted; wraps the `begin` failure.
    E2001 => "a `begin` block failed",
    E2002 => "`require` named a module that cannot be found",
    E2003 => "source file could not be read",

    E3001 => "deferral or injection while no unit is under construction",
    E3002 => "deferral or injection from inside a string eval",
    E3003 => "clear requested for a depth with no pending deferred blocks",

    E4001 => "error raised with `die`",
    E4002 => "name is not defined",
    E4003 => "value has the wrong type for this operation",
    E4004 => "wrong number of arguments",
    E4005 => "value is not callable",
    E4006 => "call depth limit exceeded",
    E4007 => "division by zero",
    E4008 => "integer overflow",

    /// Only raised in line-granular injection mode.
    W4001 => "code after an injection point runs before the injected code",
}

impl ErrorCode {
    pub fn is_warning(&self) -> bool {
        self.as_str().starts_with('W')
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        })
    }
}

/// A span plus what to say about it. The primary label marks where the
/// problem is; secondary labels point at related code.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Label {
    pub span: Span,
    pub message: String,
    pub is_primary: bool,
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[must_use = "a diagnostic does nothing until it is emitted"]
pub struct Diagnostic {
    pub code: ErrorCode,
    pub severity: Severity,
    pub message: String,
    pub labels: Vec<Label>,
    /// Context, such as the unit that was being constructed.
    pub notes: Vec<String>,
    /// How to fix it, rendered as `help:` lines.
    pub suggestions: Vec<String>,
}

impl Diagnostic {
    fn new(code: ErrorCode, severity: Severity) -> Self {
        Diagnostic {
            code,
            severity,
            message: String::new(),
            labels: Vec::new(),
            notes: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    pub fn error(code: ErrorCode) -> Self {
        Self::new(code, Severity::Error)
    }

    pub fn warning(code: ErrorCode) -> Self {
        Self::new(code, Severity::Warning)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_label(self, span: Span, message: impl Into<String>) -> Self {
        self.labelled(span, message.into(), true)
    }

    pub fn with_secondary_label(self, span: Span, message: impl Into<String>) -> Self {
        self.labelled(span, message.into(), false)
    }

    fn labelled(mut self, span: Span, message: String, is_primary: bool) -> Self {
        self.labels.push(Label {
            span,
            message,
            is_primary,
        });
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn primary_span(&self) -> Option<Span> {
        self.labels
            .iter()
            .find_map(|label| label.is_primary.then_some(label.span))
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// `W4001`: line-granular injection found code after the injection point
/// on the same line. That code runs before the injected fragment.
pub fn extra_text_after_injection(span: Span, text: &str) -> Diagnostic {
    Diagnostic::warning(ErrorCode::W4001)
        .with_message(format!("extra text '{text}' after call to lex_stuff"))
        .with_label(span, "this text runs before the injected code")
        .with_note("line-granular injection inserts at the start of the next line")
        .with_suggestion("move the trailing text to its own line, or use KILN_INJECTION=precise")
}

/// Plain, uncoloured rendering without source context; used in logs and
/// test failures.
impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.severity, self.code, self.message)?;
        for label in &self.labels {
            let arrow = if label.is_primary { "-->" } else { "   " };
            write!(f, "\n  {arrow} {}: {}", label.span, label.message)?;
        }
        let extras = self.notes.iter().map(|note| ("note", note));
        let extras = extras.chain(self.suggestions.iter().map(|help| ("help", help)));
        for (kind, text) in extras {
            write!(f, "\n  = {kind}: {text}")?;
        }
        Ok(())
    }
}
