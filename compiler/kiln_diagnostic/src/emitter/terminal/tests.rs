#![allow(clippy::unwrap_used, reason = "tests use unwrap for brevity")]

use super::*;
use crate::ErrorCode;
use kiln_ir::Span;

fn sample_diagnostic() -> Diagnostic {
    Diagnostic::error(ErrorCode::E3002)
        .with_message("at_runtime cannot be used inside a string eval")
        .with_label(Span::new(10, 20), "deferred here")
        .with_secondary_label(Span::new(0, 4), "eval started here")
        .with_note("string evals have no enclosing unit to inject into")
        .with_suggestion("call at_runtime from a begin block in a file or module")
}

fn render(emitter: impl FnOnce(&mut Vec<u8>)) -> String {
    let mut output = Vec::new();
    emitter(&mut output);
    String::from_utf8(output).unwrap()
}

#[test]
fn test_terminal_emitter_no_color() {
    let text = render(|out| {
        let mut emitter = TerminalEmitter::with_color_mode(out, ColorMode::Never, false);
        emitter.emit(&sample_diagnostic());
        emitter.flush();
    });

    assert!(text.starts_with("error[E3002]: at_runtime cannot be used inside a string eval"));
    assert!(text.contains("--> 10..20: deferred here"));
    assert!(text.contains("note:"));
    assert!(text.contains("help:"));
    assert!(!text.contains("\x1b["));
}

#[test]
fn test_terminal_emitter_with_color() {
    let text = render(|out| {
        let mut emitter = TerminalEmitter::with_color_mode(out, ColorMode::Always, false);
        emitter.emit(&sample_diagnostic());
    });

    assert!(text.contains("\x1b["));
    assert!(text.contains("E3002"));
}

#[test]
fn test_emit_with_source_shows_line_and_carets() {
    let source = "let a = 1;\nbegin { lex_stuff(\"x\"); } print(a);\n";
    let diag = crate::extra_text_after_injection(Span::new(37, 46), "print(a);");

    let text = render(|out| {
        let mut emitter =
            TerminalEmitter::with_color_mode(out, ColorMode::Never, false).with_source("t.kn", source);
        emitter.emit(&diag);
    });

    assert!(text.starts_with("warning[W4001]: extra text 'print(a);' after call to lex_stuff"));
    assert!(text.contains("--> t.kn:2:27: "));
    assert!(text.contains("   | begin { lex_stuff(\"x\"); } print(a);\n"));
    assert!(text.contains(&format!("   | {}^^^^^^^^^\n", " ".repeat(26))));
}

#[test]
fn test_emit_all() {
    let text = render(|out| {
        let mut emitter = TerminalEmitter::with_color_mode(out, ColorMode::Never, false);
        emitter.emit_all(&[
            Diagnostic::error(ErrorCode::E1001).with_message("error 1"),
            Diagnostic::error(ErrorCode::E4001).with_message("error 2"),
        ]);
    });

    assert!(text.contains("error 1"));
    assert!(text.contains("error 2"));
}

#[test]
fn test_emit_summary_errors() {
    let text = render(|out| {
        let mut emitter = TerminalEmitter::with_color_mode(out, ColorMode::Never, false);
        emitter.emit_summary(2, 1);
    });

    assert_eq!(text, "error: aborting due to 2 previous errors; 1 warning emitted\n");
}

#[test]
fn test_emit_summary_warnings_only() {
    let text = render(|out| {
        let mut emitter = TerminalEmitter::with_color_mode(out, ColorMode::Never, false);
        emitter.emit_summary(0, 3);
    });

    assert_eq!(text, "warning: 3 warnings emitted\n");
}

#[test]
fn test_emit_summary_nothing() {
    let text = render(|out| {
        let mut emitter = TerminalEmitter::with_color_mode(out, ColorMode::Never, false);
        emitter.emit_summary(0, 0);
    });

    assert!(text.is_empty());
}

#[test]
fn test_color_mode() {
    assert!(ColorMode::Auto.should_use_colors(true));
    assert!(!ColorMode::Auto.should_use_colors(false));
    assert!(ColorMode::Always.should_use_colors(false));
    assert!(!ColorMode::Never.should_use_colors(true));
    assert_eq!(ColorMode::default(), ColorMode::Auto);
}
