//! Output sinks for diagnostics.

mod terminal;

pub use terminal::{ColorMode, TerminalEmitter};

use crate::Diagnostic;

/// Somewhere diagnostics are written to.
///
/// Write errors are swallowed: a diagnostic that cannot be shown must not
/// turn into a second failure.
pub trait DiagnosticEmitter {
    fn emit(&mut self, diagnostic: &Diagnostic);

    fn emit_all(&mut self, diagnostics: &[Diagnostic]) {
        diagnostics.iter().for_each(|diagnostic| self.emit(diagnostic));
    }

    fn flush(&mut self);

    /// Closing line: `error: aborting due to ...` when `error_count` is
    /// nonzero, otherwise a warning count, otherwise nothing.
    fn emit_summary(&mut self, error_count: usize, warning_count: usize);
}
