//! Command handlers for the Kiln CLI.
//!
//! Shared utilities like `read_file` and the interpreter setup live here in
//! the module root.

use std::path::{Path, PathBuf};

use kiln_diagnostic::emitter::{ColorMode, DiagnosticEmitter, TerminalEmitter};
use kiln_eval::{Interpreter, KilnError, SharedPrintHandler, SourceId};
use kiln_hooks::InjectionMode;

mod check;
mod run;

pub use check::check_file;
pub use run::run_file;

/// Arguments shared by `run` and `check`.
#[derive(Debug, PartialEq, Eq)]
pub struct RunOptions {
    pub path: String,
    /// `None` leaves the choice to `KILN_INJECTION`.
    pub injection: Option<InjectionMode>,
}

impl RunOptions {
    pub fn parse(args: &[String]) -> Result<Self, String> {
        let mut path = None;
        let mut injection = None;
        for arg in args {
            if let Some(mode) = arg.strip_prefix("--injection=") {
                injection = Some(mode.parse::<InjectionMode>().map_err(|e| e.to_string())?);
            } else if arg.starts_with('-') {
                return Err(format!("unknown option '{arg}'"));
            } else if path.is_none() {
                path = Some(arg.clone());
            } else {
                return Err(format!("unexpected argument '{arg}'"));
            }
        }
        let path = path.ok_or_else(|| "missing file path".to_owned())?;
        Ok(RunOptions { path, injection })
    }
}

pub(super) fn read_file(path: &str) -> String {
    match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            let msg = match e.kind() {
                std::io::ErrorKind::NotFound => format!("cannot find file '{path}'"),
                std::io::ErrorKind::PermissionDenied => {
                    format!("permission denied reading '{path}'")
                }
                std::io::ErrorKind::InvalidData => {
                    format!("'{path}' contains invalid UTF-8 data")
                }
                _ => format!("error reading '{path}': {e}"),
            };
            eprintln!("{msg}");
            std::process::exit(1);
        }
    }
}

/// Interpreter for the script at `options.path`. `require` looks for
/// modules next to the script.
pub(super) fn interpreter(options: &RunOptions, print_handler: SharedPrintHandler) -> Interpreter {
    let dir = Path::new(&options.path)
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    let mut builder = Interpreter::builder()
        .print_handler(print_handler)
        .module_path(dir);
    if let Some(mode) = options.injection {
        builder = builder.injection(mode);
    }
    builder.build()
}

/// The script being run: its path as given and its text as read.
pub(super) struct Script<'a> {
    pub path: &'a str,
    pub source: &'a str,
}

/// Name and text that spans in `unit` resolve against. Falls back to the
/// script when the diagnostic carries no unit.
fn unit_source<'a>(
    interpreter: &'a Interpreter,
    unit: Option<SourceId>,
    script: &'a Script<'a>,
) -> (String, &'a str) {
    match unit.and_then(|id| interpreter.sources().get(id)) {
        Some(unit) => (unit.display_name(), unit.text()),
        None => (script.path.to_owned(), script.source),
    }
}

fn emitter(path: String, source: &str) -> TerminalEmitter<std::io::Stderr> {
    let is_tty = std::io::IsTerminal::is_terminal(&std::io::stderr());
    TerminalEmitter::with_color_mode(std::io::stderr(), ColorMode::Auto, is_tty)
        .with_source(path, source)
}

/// Emit construction warnings, each against its own unit. They are also
/// logged where they arise.
pub(super) fn report_warnings(interpreter: &mut Interpreter, script: &Script<'_>) -> usize {
    let warnings = interpreter.take_warnings();
    for warning in &warnings {
        let (path, text) = unit_source(interpreter, Some(warning.source), script);
        let mut emitter = emitter(path, text);
        emitter.emit(&warning.diagnostic);
        emitter.flush();
    }
    warnings.len()
}

/// Emit `err` against the unit it was raised in and exit with status 1.
pub(super) fn fail(
    interpreter: &Interpreter,
    script: &Script<'_>,
    err: &KilnError,
    warnings: usize,
) -> ! {
    let (path, text) = unit_source(interpreter, err.unit(), script);
    let mut emitter = emitter(path, text);
    emitter.emit(&err.to_diagnostic());
    emitter.emit_summary(1, warnings);
    emitter.flush();
    std::process::exit(1);
}
