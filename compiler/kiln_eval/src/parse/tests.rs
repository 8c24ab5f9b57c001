#![allow(clippy::unwrap_used, reason = "tests use unwrap for brevity")]

use super::*;
use crate::ast::{BinaryOp, Expr, ExprKind};
use crate::stash::Stash;
use kiln_ir::SharedInterner;
use pretty_assertions::assert_eq;

/// Records construction events and optionally splices text after each
/// `begin`, the way `lex_stuff` does.
struct MockHost {
    lexer: Rc<RefCell<Lexer>>,
    stash: Stash,
    begins: Vec<usize>,
    subs: Vec<Name>,
    splice: Option<&'static str>,
}

impl ConstructionHost for MockHost {
    fn resolve_global(&mut self, name: Name) -> Rc<Glob> {
        self.stash.resolve(name)
    }

    fn install_sub(&mut self, name: Name, def: FunctionDef) {
        assert_eq!(def.name, Some(name));
        self.subs.push(name);
    }

    fn run_begin(&mut self, body: Block, _span: Span) -> Result<(), CompileError> {
        self.begins.push(body.stmts.len());
        if let Some(text) = self.splice {
            let _ = self.lexer.borrow_mut().insert_at_cursor(text);
        }
        Ok(())
    }
}

fn setup(source: &str) -> (SharedInterner, MockHost) {
    let interner = SharedInterner::new();
    let lexer = Rc::new(RefCell::new(Lexer::new(source, interner.clone())));
    let host = MockHost {
        lexer,
        stash: Stash::new(),
        begins: Vec::new(),
        subs: Vec::new(),
        splice: None,
    };
    (interner, host)
}

fn parse(host: &mut MockHost) -> ParseResult<Block> {
    let lexer = Rc::clone(&host.lexer);
    Parser::new(lexer, host).parse_unit()
}

fn syntax_code(result: ParseResult<Block>) -> ErrorCode {
    match result {
        Err(CompileError::Syntax { error, .. }) => error.code,
        other => panic!("expected syntax error, got {other:?}"),
    }
}

#[test]
fn statements_and_precedence() {
    let (_, mut host) = setup("let x = 1 + 2 * 3; if (x > 6) { x = 0; } else { x = 1; } while (x) { x = x - 1; }");
    let unit = parse(&mut host).unwrap();
    assert_eq!(unit.stmts.len(), 3);

    let StmtKind::Let { value, .. } = &unit.stmts[0].kind else {
        panic!("expected let");
    };
    let ExprKind::Binary { op, right, .. } = &value.kind else {
        panic!("expected binary");
    };
    assert_eq!(*op, BinaryOp::Add);
    assert!(matches!(right.kind, ExprKind::Binary { op: BinaryOp::Mul, .. }));
    assert!(matches!(unit.stmts[1].kind, StmtKind::If { else_branch: Some(_), .. }));
    assert!(matches!(unit.stmts[2].kind, StmtKind::While { .. }));
}

#[test]
fn lexicals_and_globals() {
    let (interner, mut host) = setup("let x = 1; x; y; x = 2; y = 3;");
    let unit = parse(&mut host).unwrap();

    assert!(matches!(&unit.stmts[1].kind, StmtKind::Expr(e) if matches!(e.kind, ExprKind::Local(_))));
    assert!(matches!(&unit.stmts[2].kind, StmtKind::Expr(e) if matches!(e.kind, ExprKind::Global(_))));
    assert!(matches!(unit.stmts[3].kind, StmtKind::AssignLocal { .. }));
    assert!(matches!(unit.stmts[4].kind, StmtKind::AssignGlobal { .. }));
    assert!(host.stash.contains(interner.intern("y")));
    assert!(!host.stash.contains(interner.intern("x")));
}

#[test]
fn closures_capture_but_subs_and_begin_do_not() {
    let (interner, mut host) =
        setup("let x = 1; let f = fn() { x; }; sub g() { x; } begin { x; }");
    parse(&mut host).unwrap();
    // `x` became a global only through the sub and the begin block.
    assert!(host.stash.contains(interner.intern("x")));
    assert_eq!(host.subs, vec![interner.intern("g")]);
    assert_eq!(host.begins, vec![1]);
}

#[test]
fn closure_params_are_local() {
    let (interner, mut host) = setup("let f = fn(a, b) { a + b; };");
    parse(&mut host).unwrap();
    assert!(!host.stash.contains(interner.intern("a")));
}

#[test]
fn paths_cannot_name_lexicals() {
    for source in [
        "sub f(at_runtime::dispatch) { }",
        "let f = fn(a, Util::x) { };",
        "let at_runtime::dispatch = 1;",
    ] {
        let (_, mut host) = setup(source);
        assert_eq!(syntax_code(parse(&mut host)), ErrorCode::E1004, "{source}");
    }

    let (_, mut host) = setup("sub f(at_runtime::dispatch) { }");
    let Err(CompileError::Syntax { error, .. }) = parse(&mut host) else {
        panic!("expected syntax error");
    };
    assert_eq!(error.message, "expected identifier, found path `at_runtime::dispatch`");
    assert!(host.subs.is_empty());
}

#[test]
fn begin_and_sub_leave_no_statement() {
    let (_, mut host) = setup("begin { 1; 2; } sub f(a) { return a; } 3;");
    let unit = parse(&mut host).unwrap();
    assert_eq!(unit.stmts.len(), 1);
    assert_eq!(host.begins, vec![2]);
    assert_eq!(host.subs.len(), 1);
}

#[test]
fn text_spliced_by_begin_is_parsed_next() {
    let (interner, mut host) = setup("begin { } after;");
    host.splice = Some("spliced;");
    let unit = parse(&mut host).unwrap();

    let names: Vec<_> = unit
        .stmts
        .iter()
        .map(|stmt| match &stmt.kind {
            StmtKind::Expr(Expr {
                kind: ExprKind::Global(glob),
                ..
            }) => interner.lookup(glob.name()),
            other => panic!("unexpected {other:?}"),
        })
        .collect();
    assert_eq!(names, vec!["spliced", "after"]);
}

#[test]
fn injected_marker_shape_parses() {
    let (_, mut host) = setup("at_runtime::dispatch(); begin { at_runtime::clear(1) }");
    let unit = parse(&mut host).unwrap();
    assert_eq!(unit.stmts.len(), 1);
    assert_eq!(host.begins, vec![1]);
}

#[test]
fn else_if_chains() {
    let (_, mut host) = setup("if (a) { 1; } else if (b) { 2; } else { 3; }");
    let unit = parse(&mut host).unwrap();
    let StmtKind::If {
        else_branch: Some(else_branch),
        ..
    } = &unit.stmts[0].kind
    else {
        panic!("expected if/else");
    };
    assert!(matches!(else_branch.stmts[0].kind, StmtKind::If { .. }));
}

#[test]
fn return_outside_callable() {
    let (_, mut host) = setup("return 1;");
    assert_eq!(syntax_code(parse(&mut host)), ErrorCode::E1005);

    let (_, mut host) = setup("begin { return; }");
    assert_eq!(syntax_code(parse(&mut host)), ErrorCode::E1005);
}

#[test]
fn syntax_errors() {
    let (_, mut host) = setup("let x = 1 let y = 2;");
    assert_eq!(syntax_code(parse(&mut host)), ErrorCode::E1001);

    let (_, mut host) = setup("let x = ;");
    assert_eq!(syntax_code(parse(&mut host)), ErrorCode::E1002);

    let (_, mut host) = setup("{ 1;");
    assert_eq!(syntax_code(parse(&mut host)), ErrorCode::E1003);

    let (_, mut host) = setup("let = 1;");
    assert_eq!(syntax_code(parse(&mut host)), ErrorCode::E1004);

    let (_, mut host) = setup("\"open");
    assert_eq!(syntax_code(parse(&mut host)), ErrorCode::E0001);

    let (_, mut host) = setup("1 = 2;");
    assert_eq!(syntax_code(parse(&mut host)), ErrorCode::E1001);
}

#[test]
fn begin_after_syntax_error_never_runs() {
    let (_, mut host) = setup("let = 1; begin { }");
    assert!(parse(&mut host).is_err());
    assert!(host.begins.is_empty());
}

#[test]
fn unclosed_brace_points_at_opener() {
    let (_, mut host) = setup("sub f() { 1;");
    let Err(CompileError::Syntax { error: err, .. }) = parse(&mut host) else {
        panic!("expected syntax error");
    };
    assert_eq!(err.opened_at, Some(Span::new(8, 9)));
    assert_eq!(err.to_diagnostic().labels.len(), 2);
}
