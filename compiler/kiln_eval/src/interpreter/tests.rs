#![allow(clippy::unwrap_used, reason = "tests use unwrap for brevity")]

use std::cell::RefCell;

use super::*;
use crate::print_handler::buffer_handler;
use kiln_diagnostic::span_utils::offset_to_line_col;
use kiln_diagnostic::ErrorCode;
use kiln_hooks::HookError;
use pretty_assertions::assert_eq;

fn interpreter() -> Interpreter {
    Interpreter::builder()
        .injection(InjectionMode::Precise)
        .print_handler(buffer_handler())
        .build()
}

fn output(interp: &Interpreter) -> String {
    interp.print_handler().take_output()
}

#[test]
fn builder_defaults() {
    let interp = interpreter();
    assert_eq!(interp.injection_mode(), InjectionMode::Precise);
    assert_eq!(interp.construction_depth(), 0);
    assert!(interp.pending_depths().is_empty());
    assert_eq!(interp.dispatch_binding(), None);
    assert_eq!(interp.interner().lookup(interp.main_unit), "main");
    assert!(interp.global("print").is_some());
    assert!(interp.global(kiln_hooks::CLEAR_NAME).is_some());
}

#[test]
fn builder_overrides() {
    let interp = Interpreter::builder()
        .injection(InjectionMode::Line)
        .unit_name("script")
        .print_handler(buffer_handler())
        .build();
    assert_eq!(interp.injection_mode(), InjectionMode::Line);
    assert_eq!(interp.interner().lookup(interp.main_unit), "script");
}

#[test]
fn expressions_and_control_flow() {
    let mut interp = interpreter();
    let value = interp
        .run_source(
            "let total = 0; let i = 0;
             while (i < 5) { total = total + i; i = i + 1; }
             if (total == 10 && !(i != 5)) { total = total * 2; }
             total;",
        )
        .unwrap();
    assert_eq!(value, Value::Int(20));
}

#[test]
fn subs_closures_and_recursion() {
    let mut interp = interpreter();
    interp
        .run_source(
            "sub fact(n) { if (n <= 1) { return 1; } return n * fact(n - 1); }
             let make = fn(base) { fn(x) { return base + x; }; };
             let add = fn(base) { return fn(x) { return base + x; }; };
             print(fact(5), \" \", add(2)(3), \" \", make(1));",
        )
        .unwrap();
    assert_eq!(output(&interp), "120 5 nil\n");
}

#[test]
fn short_circuit_returns_deciding_operand() {
    let mut interp = interpreter();
    let value = interp.run_source("nil || \"x\";").unwrap();
    assert_eq!(value, Value::string("x"));
    let value = interp.run_source("0 && die(\"never\");").unwrap();
    assert_eq!(value, Value::Int(0));
}

#[test]
fn begin_runs_at_construction() {
    let mut interp = interpreter();
    let unit = interp
        .compile("print(\"runtime\"); begin { print(\"construction\"); }")
        .unwrap();
    assert_eq!(output(&interp), "construction\n");
    interp.execute(&unit).unwrap();
    assert_eq!(output(&interp), "runtime\n");
}

#[test]
fn begin_does_not_see_enclosing_lexicals() {
    let mut interp = interpreter();
    let err = interp.compile("let x = 1; begin { print(x); }").unwrap_err();
    let CompileError::Begin { error, .. } = err else {
        panic!("expected begin failure");
    };
    assert_eq!(
        error.kind,
        EvalErrorKind::UndefinedVariable {
            name: "x".to_owned()
        }
    );
}

#[test]
fn depth_tracks_nested_begin() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut interp = interpreter();
    let record = Rc::clone(&seen);
    interp.define_native("depth", move |interp, _, _| {
        record.borrow_mut().push(interp.construction_depth());
        Ok(Value::Nil)
    });
    interp.add_module("Inner", "begin { depth(); }");
    interp
        .run_source("depth(); begin { depth(); require(\"Inner\"); depth(); }")
        .unwrap();
    assert_eq!(*seen.borrow(), vec![1, 2, 1, 0]);
    assert_eq!(interp.construction_depth(), 0);
}

#[test]
fn depth_restored_after_failed_begin() {
    let mut interp = interpreter();
    assert!(interp.compile("begin { die(\"no\"); }").is_err());
    assert_eq!(interp.construction_depth(), 0);
    assert!(interp.exit_actions.is_empty());
    assert!(interp.call_stack.is_empty());
}

#[test]
fn hook_labels_name_the_unit() {
    let labels = Rc::new(RefCell::new(Vec::new()));
    let mut interp = interpreter();
    let record = Rc::clone(&labels);
    interp.define_native("label", move |interp, _, _| {
        let at = interp.hook_label(false);
        let after = interp.hook_label(true);
        record.borrow_mut().push(interp.interner().lookup(at));
        record.borrow_mut().push(interp.interner().lookup(after));
        Ok(Value::Nil)
    });
    interp.compile_named("Widget", "begin { label(); }").unwrap();
    assert_eq!(
        *labels.borrow(),
        vec!["Widget::(at_runtime)", "Widget::(after_runtime)"]
    );
}

#[test]
fn rust_api_defer_outside_construction() {
    let mut interp = interpreter();
    let print = interp.global("print").unwrap();
    let err = interp.at_runtime(print).unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::Hook(HookError::NotConstructing));
    assert_eq!(err.code(), ErrorCode::E3001);
    assert!(interp.pending_depths().is_empty());
}

#[test]
fn defer_rejects_non_callables() {
    let mut interp = interpreter();
    let err = interp.compile("begin { at_runtime(42); }").unwrap_err();
    let CompileError::Begin { error, .. } = err else {
        panic!("expected begin failure");
    };
    assert_eq!(error.kind, EvalErrorKind::NotCallable { type_name: "int" });
    assert!(interp.pending_depths().is_empty());
}

#[test]
fn clear_without_slot() {
    let mut interp = interpreter();
    let err = interp.compile("begin { at_runtime::clear(3); }").unwrap_err();
    assert_eq!(err.hook_error(), Some(HookError::NoSlot { depth: 3 }));
}

#[test]
fn builtin_argument_checks() {
    let mut interp = interpreter();
    let err = interp.run_source("len(1);").unwrap_err();
    let KilnError::Runtime(err) = err else {
        panic!("expected runtime error");
    };
    assert_eq!(err.code(), ErrorCode::E4003);

    let err = interp.run_source("str();").unwrap_err();
    let KilnError::Runtime(err) = err else {
        panic!("expected runtime error");
    };
    assert_eq!(
        err.kind,
        EvalErrorKind::ArityMismatch {
            name: "str".to_owned(),
            expected: 1,
            got: 0
        }
    );
}

#[test]
fn arithmetic_errors() {
    let mut interp = interpreter();
    let Err(KilnError::Runtime(err)) = interp.run_source("1 / 0;") else {
        panic!("expected runtime error");
    };
    assert_eq!(err.code(), ErrorCode::E4007);
    assert!(err.span.is_some());

    let Err(KilnError::Runtime(err)) = interp.run_source("9223372036854775807 + 1;") else {
        panic!("expected runtime error");
    };
    assert_eq!(err.code(), ErrorCode::E4008);
}

#[test]
fn call_depth_limit() {
    let mut interp = Interpreter::builder()
        .print_handler(buffer_handler())
        .max_call_depth(Some(50))
        .build();
    let Err(KilnError::Runtime(err)) = interp.run_source("sub f() { f(); } f();") else {
        panic!("expected runtime error");
    };
    assert_eq!(err.kind, EvalErrorKind::StackOverflow { depth: 50 });
    assert_eq!(err.backtrace.unwrap().len(), 50);
    assert!(interp.call_stack.is_empty());
}

#[test]
fn die_concatenates_arguments() {
    let mut interp = interpreter();
    let Err(KilnError::Runtime(err)) = interp.run_source("die(\"bad \", 7);") else {
        panic!("expected runtime error");
    };
    assert_eq!(err.to_string(), "bad 7");
    assert_eq!(err.code(), ErrorCode::E4001);
}

#[test]
fn callers_at_top_level_and_in_begin() {
    let mut interp = interpreter();
    interp
        .run_source("begin { print(callers()); } print(callers());")
        .unwrap();
    assert_eq!(output(&interp), "[main::BEGIN]\n[main]\n");
}

#[test]
fn eval_returns_value() {
    let mut interp = interpreter();
    let value = interp.run_source("eval(\"1 + 2;\");").unwrap();
    assert_eq!(value, Value::Int(3));
}

#[test]
fn require_runs_module_once() {
    let mut interp = interpreter();
    interp.add_module("Once", "print(\"loaded\");");
    interp
        .run_source("require(\"Once\"); require(\"Once\");")
        .unwrap();
    assert_eq!(output(&interp), "loaded\n");

    let Err(KilnError::Runtime(err)) = interp.run_source("require(\"Missing\");") else {
        panic!("expected runtime error");
    };
    assert_eq!(err.code(), ErrorCode::E2002);
}

#[test]
fn failed_require_can_be_retried() {
    let mut interp = interpreter();
    interp.add_module("Flaky", "if (!ready) { die(\"not ready\"); } print(\"ok\");");
    assert!(interp.run_source("ready = false; require(\"Flaky\");").is_err());
    interp
        .run_source("ready = true; require(\"Flaky\");")
        .unwrap();
    assert_eq!(output(&interp), "ok\n");
}

#[test]
fn runtime_errors_record_the_unit_they_were_raised_in() {
    let mut interp = interpreter();
    interp.add_module("Mod", "print(1);\n\ndie(\"in module\");\n");
    interp.add_module("Subs", "sub boom() {\n  die(\"boom\");\n}\n");

    let Err(KilnError::Runtime(err)) = interp.run_source("print(0);\nrequire(\"Mod\");") else {
        panic!("expected runtime error");
    };
    let source = interp.sources().get(err.unit.unwrap()).unwrap();
    assert_eq!(source.name(), "Mod");
    assert_eq!(offset_to_line_col(source.text(), err.span.unwrap().start), (3, 1));

    let err = interp.run_source("require(\"Subs\");\nboom();").unwrap_err();
    let source = interp.sources().get(err.unit().unwrap()).unwrap();
    assert_eq!(source.name(), "Subs");
    let KilnError::Runtime(err) = err else {
        panic!("expected runtime error");
    };
    assert_eq!(offset_to_line_col(source.text(), err.span.unwrap().start), (2, 3));
}

#[test]
fn begin_failure_is_tied_to_the_unit_under_construction() {
    let mut interp = interpreter();
    let err = interp
        .compile_named("Widget", "begin { at_runtime(fn() { }); }\nbegin { die(\"late\"); }")
        .unwrap_err();
    let CompileError::Begin { error, unit, .. } = &err else {
        panic!("expected begin failure");
    };
    assert_eq!(*unit, error.unit);
    let source = interp.sources().get(unit.unwrap()).unwrap();
    assert_eq!(source.name(), "Widget");
    assert!(source.text().contains(kiln_hooks::DISPATCH_NAME));
    assert_eq!(err.to_diagnostic().labels.len(), 2);
}

#[test]
fn dispatch_called_from_rust_runs_after_runtime_hooks_on_return() {
    let saved = Rc::new(RefCell::new(None));
    let mut interp = interpreter();
    let keep = Rc::clone(&saved);
    interp.define_native("keep_dispatch", move |interp, _, _| {
        *keep.borrow_mut() = interp.global(kiln_hooks::DISPATCH_NAME);
        Ok(Value::Nil)
    });
    let _unit = interp
        .compile(
            "begin {
                after_runtime(fn() { print(\"after\"); });
                at_runtime(fn() { print(\"at\"); });
                keep_dispatch();
            }",
        )
        .unwrap();

    let dispatch = saved.borrow_mut().take().unwrap();
    assert!(matches!(dispatch, Value::Dispatch(_)));
    assert!(interp.exit_actions.is_empty());
    interp.call(&dispatch, &[]).unwrap();
    assert_eq!(output(&interp), "at\nafter\n");
    assert!(interp.exit_actions.is_empty());
    assert!(interp.call_stack.is_empty());
}
