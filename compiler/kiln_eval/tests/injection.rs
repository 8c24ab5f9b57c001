#![allow(clippy::unwrap_used, reason = "tests use unwrap for brevity")]

//! Where injected text lands, for both injection variants.

use kiln_diagnostic::span_utils::offset_to_line_col;
use kiln_diagnostic::{ErrorCode, Severity};
use kiln_eval::{buffer_handler, CompileError, Interpreter, KilnError};
use kiln_hooks::{dispatch_fragment, HookError, InjectError, InjectionMode, DISPATCH_NAME};
use pretty_assertions::assert_eq;

fn interpreter(mode: InjectionMode) -> Interpreter {
    Interpreter::builder()
        .injection(mode)
        .print_handler(buffer_handler())
        .build()
}

fn output(interp: &Interpreter) -> String {
    interp.print_handler().take_output()
}

#[test]
fn precise_injection_lands_right_after_the_begin_block() {
    let mut interp = interpreter(InjectionMode::Precise);
    let unit = interp
        .compile("begin { at_runtime(fn() { }); } print(1);")
        .unwrap();
    assert_eq!(
        unit.source(),
        format!("begin {{ at_runtime(fn() {{ }}); }}{} print(1);", dispatch_fragment(1))
    );
    assert!(interp.take_warnings().is_empty());
}

#[test]
fn line_injection_warns_about_trailing_code() {
    let mut interp = interpreter(InjectionMode::Line);
    let unit = interp
        .compile(
            "begin { at_runtime(fn() { print(\"x\"); }); } print(\"same line\");\nprint(\"next\");\n",
        )
        .unwrap();

    let warnings = interp.take_warnings();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].source, unit.source_id());
    let warning = &warnings[0].diagnostic;
    assert_eq!(warning.code, ErrorCode::W4001);
    assert_eq!(warning.severity, Severity::Warning);
    assert_eq!(
        warning.message,
        "extra text 'print(\"same line\");' after call to lex_stuff"
    );
    assert!(warning.notes.iter().any(|note| note == "in unit `main`"));

    interp.execute(&unit).unwrap();
    assert_eq!(output(&interp), "same line\nx\nnext\n");
}

#[test]
fn line_injection_without_trailing_code_is_silent() {
    let mut interp = interpreter(InjectionMode::Line);
    interp
        .run_source("begin { at_runtime(fn() { print(\"x\"); }); } // comment\nprint(\"y\");")
        .unwrap();
    assert!(interp.take_warnings().is_empty());
    assert_eq!(output(&interp), "x\ny\n");
}

#[test]
fn syntax_error_after_injection_points_into_the_final_buffer() {
    let mut interp = interpreter(InjectionMode::Precise);
    let err = interp
        .compile("begin { at_runtime(fn() { print(\"x\"); }); }\nprint(1);\nprint(2) oops;\n")
        .unwrap_err();
    let CompileError::Syntax {
        error,
        unit: Some(unit),
    } = err
    else {
        panic!("expected a syntax error tied to its unit");
    };

    let text = interp.sources().get(unit).unwrap().text();
    assert!(text.contains(DISPATCH_NAME));
    assert_eq!(&text[error.span.to_range()], "oops");
    assert_eq!(offset_to_line_col(text, error.span.start), (3, 10));
}

#[test]
fn line_warning_after_earlier_injection_resolves_in_its_unit() {
    let mut interp = interpreter(InjectionMode::Line);
    let unit = interp
        .compile(
            "begin { at_runtime(fn() { print(\"a\"); }); }\nprint(1);\n\
             begin { at_runtime(fn() { print(\"b\"); }); } print(2);\n",
        )
        .unwrap();

    let warnings = interp.take_warnings();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].source, unit.source_id());
    let span = warnings[0].diagnostic.primary_span().unwrap();
    let text = interp.sources().get(unit.source_id()).unwrap().text();
    assert_eq!(text, unit.source());
    assert_eq!(&text[span.to_range()], "print(2);");
    assert_eq!(offset_to_line_col(text, span.start), (3, 45));
}

#[test]
fn lex_stuff_splices_source() {
    for mode in [InjectionMode::Precise, InjectionMode::Line] {
        let mut interp = interpreter(mode);
        interp
            .run_source("begin { lex_stuff(\"print(\\\"spliced\\\");\"); }\nprint(\"after\");")
            .unwrap();
        assert_eq!(output(&interp), "spliced\nafter\n", "{mode}");
    }
}

#[test]
fn lex_stuff_needs_a_unit_under_construction() {
    let mut interp = interpreter(InjectionMode::Precise);
    let Err(KilnError::Runtime(err)) = interp.run_source("lex_stuff(\"1;\");") else {
        panic!("expected runtime error");
    };
    assert_eq!(err.hook_error(), Some(HookError::Inject(InjectError::NoUnit)));
    assert_eq!(err.code(), ErrorCode::E3001);
}

#[test]
fn injection_mode_names() {
    assert_eq!("precise".parse::<InjectionMode>().unwrap(), InjectionMode::Precise);
    assert_eq!("filter".parse::<InjectionMode>().unwrap(), InjectionMode::Line);
    assert_eq!(InjectionMode::Line.to_string(), "line");
}
