//! The `run` command: construct a Kiln script, then execute it.

use std::path::Path;

use kiln_eval::stdout_handler;

use super::{fail, interpreter, read_file, report_warnings, RunOptions, Script};

pub fn run_file(options: &RunOptions) {
    let path = options.path.as_str();
    let source = read_file(path);
    let script = Script {
        path,
        source: &source,
    };
    let mut interp = interpreter(options, stdout_handler());

    let compiled = interp.compile_file(Path::new(path), &source);
    let warnings = report_warnings(&mut interp, &script);
    let unit = match compiled {
        Ok(unit) => unit,
        Err(err) => fail(&interp, &script, &err.into(), warnings),
    };

    if let Err(err) = interp.execute(&unit) {
        fail(&interp, &script, &err.into(), warnings);
    }
}
