//! Destination for `print` output.
//!
//! The CLI prints to stdout. Tests and embedders capture into a buffer and
//! read it back with [`PrintHandlerImpl::output`]; construction-only runs
//! (`kiln check`) discard everything.

use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;

pub enum PrintHandlerImpl {
    /// Write each line to stdout.
    Stdout,
    /// Capture lines in memory.
    Buffer(Mutex<String>),
    /// Drop all output.
    Silent,
}

impl PrintHandlerImpl {
    /// Emit `line` followed by a newline.
    pub fn println(&self, line: &str) {
        match self {
            PrintHandlerImpl::Stdout => {
                let mut out = std::io::stdout().lock();
                // A closed stdout (e.g. piped into `head`) is not a Kiln error.
                let _ = writeln!(out, "{line}");
            }
            PrintHandlerImpl::Buffer(buffer) => {
                let mut buffer = buffer.lock();
                buffer.push_str(line);
                buffer.push('\n');
            }
            PrintHandlerImpl::Silent => {}
        }
    }

    /// Everything captured so far. Empty for non-capturing handlers.
    pub fn output(&self) -> String {
        match self {
            PrintHandlerImpl::Buffer(buffer) => buffer.lock().clone(),
            PrintHandlerImpl::Stdout | PrintHandlerImpl::Silent => String::new(),
        }
    }

    /// Return and clear the captured output.
    pub fn take_output(&self) -> String {
        match self {
            PrintHandlerImpl::Buffer(buffer) => std::mem::take(&mut *buffer.lock()),
            PrintHandlerImpl::Stdout | PrintHandlerImpl::Silent => String::new(),
        }
    }
}

/// Handler shared between the interpreter and whoever reads the output.
pub type SharedPrintHandler = Arc<PrintHandlerImpl>;

pub fn stdout_handler() -> SharedPrintHandler {
    Arc::new(PrintHandlerImpl::Stdout)
}

pub fn buffer_handler() -> SharedPrintHandler {
    Arc::new(PrintHandlerImpl::Buffer(Mutex::new(String::new())))
}

pub fn silent_handler() -> SharedPrintHandler {
    Arc::new(PrintHandlerImpl::Silent)
}
