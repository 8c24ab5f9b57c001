//! Syntax errors.

use kiln_diagnostic::{Diagnostic, ErrorCode};
use kiln_ir::Span;
use kiln_lexer::{LexError, TokenKind};
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ParseError {
    pub code: ErrorCode,
    pub message: String,
    pub span: Span,
    /// Text for the primary label.
    pub label: String,
    /// Where an unclosed delimiter was opened.
    pub opened_at: Option<Span>,
}

impl ParseError {
    pub fn new(code: ErrorCode, message: impl Into<String>, span: Span) -> Self {
        ParseError {
            code,
            message: message.into(),
            span,
            label: String::new(),
            opened_at: None,
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// `expected` was wanted but `found` (with source text `text`) was seen.
    pub(crate) fn unexpected(expected: &str, found: TokenKind, text: &str, span: Span) -> Self {
        if let TokenKind::Error(err) = found {
            return Self::lex(err, text, span);
        }
        let found = if text.is_empty() {
            found.describe().to_owned()
        } else {
            format!("`{text}`")
        };
        ParseError::new(
            ErrorCode::E1001,
            format!("expected {expected}, found {found}"),
            span,
        )
        .with_label(format!("expected {expected}"))
    }

    pub(crate) fn expected_expression(found: TokenKind, text: &str, span: Span) -> Self {
        if let TokenKind::Error(err) = found {
            return Self::lex(err, text, span);
        }
        let found = if text.is_empty() {
            found.describe().to_owned()
        } else {
            format!("`{text}`")
        };
        ParseError::new(
            ErrorCode::E1002,
            format!("expected expression, found {found}"),
            span,
        )
        .with_label("expected expression here")
    }

    pub(crate) fn unclosed(delimiter: char, opened_at: Span, span: Span) -> Self {
        let mut err = ParseError::new(
            ErrorCode::E1003,
            format!("unclosed delimiter `{delimiter}`"),
            span,
        )
        .with_label("reached end of input");
        err.opened_at = Some(opened_at);
        err
    }

    pub(crate) fn lex(err: LexError, text: &str, span: Span) -> Self {
        match err {
            LexError::UnterminatedString => {
                ParseError::new(ErrorCode::E0001, "unterminated string literal", span)
                    .with_label("string starts here")
            }
            LexError::InvalidChar => {
                ParseError::new(ErrorCode::E0002, format!("invalid character `{text}`"), span)
                    .with_label("not valid here")
            }
            LexError::InvalidInt => ParseError::new(
                ErrorCode::E0003,
                format!("integer literal `{text}` is out of range"),
                span,
            )
            .with_label("does not fit in 64 bits"),
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let label = if self.label.is_empty() {
            self.message.clone()
        } else {
            self.label.clone()
        };
        let mut diag = Diagnostic::error(self.code)
            .with_message(self.message.clone())
            .with_label(self.span, label);
        if let Some(open) = self.opened_at {
            diag = diag.with_secondary_label(open, "unclosed delimiter opened here");
        }
        diag
    }
}
