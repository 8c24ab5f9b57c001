#![allow(clippy::unwrap_used, reason = "tests use unwrap for brevity")]

//! Smoke tests for the `kiln` binary.

use std::path::Path;
use std::process::{Command, Output};

use pretty_assertions::assert_eq;

fn kiln(args: &[&str], dir: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_kiln"))
        .args(args)
        .current_dir(dir)
        .env_remove("KILN_INJECTION")
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn script(dir: &Path, name: &str, source: &str) {
    std::fs::write(dir.join(name), source).unwrap();
}

#[test]
fn run_prints_in_inline_order() {
    let dir = tempfile::tempdir().unwrap();
    script(
        dir.path(),
        "main.kn",
        "print(\"ONE\");\nbegin { at_runtime(fn() { print(\"TWO\"); }); }\nprint(\"THREE\");\n",
    );
    let output = kiln(&["run", "main.kn"], dir.path());
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), "ONE\nTWO\nTHREE\n");
}

#[test]
fn run_loads_modules_from_the_script_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("Util")).unwrap();
    script(
        dir.path(),
        "Util/Log.kn",
        "begin { at_runtime(fn() { print(\"module hook\"); }); }",
    );
    script(dir.path(), "main.kn", "require(\"Util::Log\"); print(\"main\");");
    let output = kiln(&["run", "main.kn"], dir.path());
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), "module hook\nmain\n");
}

#[test]
fn line_mode_reports_trailing_text() {
    let dir = tempfile::tempdir().unwrap();
    script(
        dir.path(),
        "main.kn",
        "begin { at_runtime(fn() { print(\"x\"); }); } print(\"y\");\n",
    );
    let output = kiln(&["run", "main.kn", "--injection=line"], dir.path());
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), "y\nx\n");
    assert!(stderr(&output).contains("W4001"));
}

#[test]
fn runtime_registration_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    script(dir.path(), "main.kn", "at_runtime(fn() { });");
    let output = kiln(&["run", "main.kn"], dir.path());
    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("E3001"), "{err}");
    assert!(err.contains("must be called while constructing a unit"), "{err}");
}

#[test]
fn check_constructs_without_running() {
    let dir = tempfile::tempdir().unwrap();
    script(
        dir.path(),
        "main.kn",
        "begin { print(\"construction\"); } print(\"runtime\");",
    );
    let output = kiln(&["check", "main.kn"], dir.path());
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), "main.kn: ok\n");

    script(dir.path(), "bad.kn", "begin { die(\"nope\"); }");
    let output = kiln(&["check", "bad.kn"], dir.path());
    assert!(!output.status.success());
    assert!(stderr(&output).contains("E2001"));
}

#[test]
fn missing_file_and_bad_flag() {
    let dir = tempfile::tempdir().unwrap();
    let output = kiln(&["run", "absent.kn"], dir.path());
    assert!(!output.status.success());
    assert!(stderr(&output).contains("cannot find file 'absent.kn'"));

    let output = kiln(&["run", "absent.kn", "--injection=sideways"], dir.path());
    assert!(!output.status.success());
    assert!(stderr(&output).contains("unknown injection mode"));
}

#[test]
fn errors_after_an_injection_report_file_positions() {
    let dir = tempfile::tempdir().unwrap();
    script(
        dir.path(),
        "main.kn",
        "begin { at_runtime(fn() { print(\"x\"); }); }\nprint(1);\nprint(2) oops;\n",
    );
    let output = kiln(&["check", "main.kn"], dir.path());
    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("E1001"), "{err}");
    assert!(err.contains("main.kn:3:10"), "{err}");
    assert!(err.contains("   | print(2) oops;"), "{err}");
}

#[test]
fn line_mode_warning_after_an_injection_points_at_its_line() {
    let dir = tempfile::tempdir().unwrap();
    script(
        dir.path(),
        "w.kn",
        "begin { at_runtime(fn() { print(\"a\"); }); }\nprint(1);\n\
         begin { at_runtime(fn() { print(\"b\"); }); } print(2);\n",
    );
    let output = kiln(&["run", "w.kn", "--injection=line"], dir.path());
    assert!(output.status.success(), "{}", stderr(&output));
    let err = stderr(&output);
    assert!(err.contains("W4001"), "{err}");
    assert!(err.contains("w.kn:3:45"), "{err}");
}

#[test]
fn runtime_errors_in_modules_report_the_module_file() {
    let dir = tempfile::tempdir().unwrap();
    script(dir.path(), "Mod.kn", "print(1);\n\ndie(\"in module\");\n");
    script(dir.path(), "main.kn", "print(0);\nrequire(\"Mod\");\n");
    let output = kiln(&["run", "main.kn"], dir.path());
    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("E4001"), "{err}");
    assert!(err.contains("Mod.kn:3:1"), "{err}");
    assert!(!err.contains("main.kn:"), "{err}");
}
