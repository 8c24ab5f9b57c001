//! Terminal rendering of diagnostics.
//!
//! Without a source attached, labels print their raw span. With one, each
//! label becomes `path:line:col` followed by the line it points into and an
//! underline. Spans refer to the unit's final source, injected text
//! included, so the line shown is the one the parser actually saw.

use std::fmt::Write as _;
use std::io::Write;

use kiln_ir::Span;

use crate::span_utils::{line_text, offset_to_line_col};
use crate::{Diagnostic, Label, Severity};

use super::DiagnosticEmitter;

/// When to emit ANSI styling.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorMode {
    /// Style only when writing to a terminal.
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    pub fn should_use_colors(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

/// Styles used by the renderer.
#[derive(Clone, Copy)]
enum Paint {
    Error,
    Warning,
    Help,
    Strong,
    Secondary,
}

impl Paint {
    fn ansi(self) -> &'static str {
        match self {
            Paint::Error => "\x1b[1;31m",
            Paint::Warning => "\x1b[1;33m",
            Paint::Help => "\x1b[1;32m",
            Paint::Strong => "\x1b[1m",
            Paint::Secondary => "\x1b[1;34m",
        }
    }

    fn for_severity(severity: Severity) -> Self {
        match severity {
            Severity::Error => Paint::Error,
            Severity::Warning => Paint::Warning,
        }
    }

    fn for_label(label: &Label) -> Self {
        if label.is_primary {
            Paint::Error
        } else {
            Paint::Secondary
        }
    }
}

/// The unit text that spans index into.
struct UnitSource {
    path: String,
    text: String,
}

impl UnitSource {
    fn location(&self, span: Span) -> String {
        let (line, col) = offset_to_line_col(&self.text, span.start);
        format!("{}:{line}:{col}", self.path)
    }

    /// The line under `span` and the 0-based column and width of its
    /// underline, clipped to the end of that line.
    fn excerpt(&self, span: Span) -> (&str, usize, usize) {
        let line = line_text(&self.text, span.start);
        let indent = offset_to_line_col(&self.text, span.start).1 as usize - 1;
        let room = line.chars().count().saturating_sub(indent).max(1);
        let width = (span.len() as usize).clamp(1, room);
        (line, indent, width)
    }
}

/// Writes diagnostics as text, one block per diagnostic. Each block is
/// rendered to a string and written with a single `write_all`.
pub struct TerminalEmitter<W: Write> {
    writer: W,
    colors: bool,
    source: Option<UnitSource>,
}

impl<W: Write> TerminalEmitter<W> {
    pub fn with_color_mode(writer: W, mode: ColorMode, is_tty: bool) -> Self {
        TerminalEmitter {
            writer,
            colors: mode.should_use_colors(is_tty),
            source: None,
        }
    }

    /// Resolve spans against `text`, reported as `path`.
    #[must_use]
    pub fn with_source(mut self, path: impl Into<String>, text: impl Into<String>) -> Self {
        self.source = Some(UnitSource {
            path: path.into(),
            text: text.into(),
        });
        self
    }

    fn paint(&self, out: &mut String, paint: Paint, text: &str) {
        if self.colors {
            let _ = write!(out, "{}{text}\x1b[0m", paint.ansi());
        } else {
            out.push_str(text);
        }
    }

    fn render_label(&self, out: &mut String, label: &Label) {
        out.push_str(if label.is_primary { "  --> " } else { "      " });
        match &self.source {
            Some(source) => self.paint(out, Paint::Strong, &source.location(label.span)),
            None => {
                let _ = write!(out, "{:?}", label.span);
            }
        }
        out.push_str(": ");
        self.paint(out, Paint::for_label(label), &label.message);
        out.push('\n');

        let Some(source) = &self.source else {
            return;
        };
        let (line, indent, width) = source.excerpt(label.span);
        let _ = writeln!(out, "   | {line}");
        let _ = write!(out, "   | {}", " ".repeat(indent));
        let mark = if label.is_primary { "^" } else { "-" };
        self.paint(out, Paint::for_label(label), &mark.repeat(width));
        out.push('\n');
    }

    fn render(&self, diagnostic: &Diagnostic) -> String {
        let mut out = String::new();
        self.paint(
            &mut out,
            Paint::for_severity(diagnostic.severity),
            &diagnostic.severity.to_string(),
        );
        self.paint(&mut out, Paint::Strong, &format!("[{}]", diagnostic.code));
        let _ = writeln!(out, ": {}", diagnostic.message);

        for label in &diagnostic.labels {
            self.render_label(&mut out, label);
        }
        for note in &diagnostic.notes {
            out.push_str("  = ");
            self.paint(&mut out, Paint::Strong, "note");
            let _ = writeln!(out, ": {note}");
        }
        for suggestion in &diagnostic.suggestions {
            out.push_str("  = ");
            self.paint(&mut out, Paint::Help, "help");
            let _ = writeln!(out, ": {suggestion}");
        }
        out.push('\n');
        out
    }
}

fn counted(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("1 {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

impl<W: Write> DiagnosticEmitter for TerminalEmitter<W> {
    fn emit(&mut self, diagnostic: &Diagnostic) {
        let text = self.render(diagnostic);
        let _ = self.writer.write_all(text.as_bytes());
    }

    fn flush(&mut self) {
        let _ = self.writer.flush();
    }

    fn emit_summary(&mut self, error_count: usize, warning_count: usize) {
        let mut out = String::new();
        let warnings = (warning_count > 0)
            .then(|| format!("{} emitted", counted(warning_count, "warning")));
        match (error_count, warnings) {
            (0, None) => return,
            (0, Some(warnings)) => {
                self.paint(&mut out, Paint::Warning, "warning");
                let _ = writeln!(out, ": {warnings}");
            }
            (errors, warnings) => {
                self.paint(&mut out, Paint::Error, "error");
                let cause = if errors == 1 {
                    "previous error".to_owned()
                } else {
                    format!("{errors} previous errors")
                };
                let _ = write!(out, ": aborting due to {cause}");
                if let Some(warnings) = warnings {
                    let _ = write!(out, "; {warnings}");
                }
                out.push('\n');
            }
        }
        let _ = self.writer.write_all(out.as_bytes());
    }
}

#[cfg(test)]
mod tests;
