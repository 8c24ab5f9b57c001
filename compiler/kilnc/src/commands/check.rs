//! The `check` command: construct a Kiln script without executing it.
//!
//! `begin` blocks still run, since construction depends on them; their
//! output is discarded.

use std::path::Path;

use kiln_eval::silent_handler;

use super::{fail, interpreter, read_file, report_warnings, RunOptions, Script};

pub fn check_file(options: &RunOptions) {
    let path = options.path.as_str();
    let source = read_file(path);
    let script = Script {
        path,
        source: &source,
    };
    let mut interp = interpreter(options, silent_handler());

    let compiled = interp.compile_file(Path::new(path), &source);
    let warnings = report_warnings(&mut interp, &script);
    match compiled {
        Ok(unit) => {
            tracing::debug!(bytes = unit.source().len(), "constructed");
            println!("{path}: ok");
        }
        Err(err) => fail(&interp, &script, &err.into(), warnings),
    }
}
