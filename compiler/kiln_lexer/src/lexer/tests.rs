#![allow(clippy::unwrap_used, reason = "tests use unwrap for brevity")]

use super::*;
use kiln_diagnostic::ErrorCode;
use pretty_assertions::assert_eq;

fn lexer(source: &str) -> Lexer {
    Lexer::new(source, SharedInterner::new())
}

fn kinds(lexer: &mut Lexer) -> Vec<TokenKind> {
    let mut out = Vec::new();
    loop {
        let token = lexer.next_token();
        if token.kind == TokenKind::Eof {
            return out;
        }
        out.push(token.kind);
    }
}

/// Remaining tokens rendered back to source text.
fn rest(lexer: &mut Lexer) -> Vec<String> {
    let mut out = Vec::new();
    loop {
        let token = lexer.next_token();
        if token.kind == TokenKind::Eof {
            return out;
        }
        out.push(lexer.slice(token.span).to_owned());
    }
}

#[test]
fn test_keywords_and_punctuation() {
    let mut lx = lexer("begin { sub f() { return nil; } }");
    let f = lx.interner().intern("f");
    assert_eq!(
        kinds(&mut lx),
        vec![
            TokenKind::Begin,
            TokenKind::LBrace,
            TokenKind::Sub,
            TokenKind::Ident(f),
            TokenKind::LParen,
            TokenKind::RParen,
            TokenKind::LBrace,
            TokenKind::Return,
            TokenKind::Nil,
            TokenKind::Semicolon,
            TokenKind::RBrace,
            TokenKind::RBrace,
        ]
    );
}

#[test]
fn test_path_identifiers() {
    let mut lx = lexer("at_runtime::dispatch(); beginning");
    let interner = lx.interner().clone();
    assert_eq!(
        kinds(&mut lx),
        vec![
            TokenKind::Ident(interner.intern("at_runtime::dispatch")),
            TokenKind::LParen,
            TokenKind::RParen,
            TokenKind::Semicolon,
            TokenKind::Ident(interner.intern("beginning")),
        ]
    );
}

#[test]
fn test_literals_and_comments() {
    let mut lx = lexer("1_000 // comment\n\"a\\tb\" <= != && ||");
    let interner = lx.interner().clone();
    assert_eq!(
        kinds(&mut lx),
        vec![
            TokenKind::Int(1000),
            TokenKind::Str(interner.intern("a\tb")),
            TokenKind::LtEq,
            TokenKind::NotEq,
            TokenKind::AmpAmp,
            TokenKind::PipePipe,
        ]
    );
}

#[test]
fn test_lex_errors() {
    let mut lx = lexer("\"open\n99999999999999999999 @");
    assert_eq!(
        kinds(&mut lx),
        vec![
            TokenKind::Error(LexError::UnterminatedString),
            TokenKind::Error(LexError::InvalidInt),
            TokenKind::Error(LexError::InvalidChar),
        ]
    );
}

#[test]
fn test_peek_does_not_consume() {
    let mut lx = lexer("a b");
    let peeked = lx.peek();
    assert_eq!(lx.cursor(), 0);
    assert_eq!(lx.next_token(), peeked);
    assert_eq!(lx.cursor(), 1);
}

#[test]
fn test_insert_at_cursor_lands_after_consumed_token() {
    let mut lx = lexer("begin { } print(1);");
    for _ in 0..3 {
        lx.next_token();
    }
    // Parser peeked `print` before the injection.
    lx.peek();

    let injection = lx.insert_at_cursor("f();");
    assert_eq!(injection.offset, 9);
    assert_eq!(injection.warning, None);
    assert_eq!(rest(&mut lx), vec!["f", "(", ")", ";", "print", "(", "1", ")", ";"]);
}

#[test]
fn test_insert_at_cursor_separates_words() {
    let mut lx = lexer("a b");
    lx.next_token();
    let _ = lx.insert_at_cursor("c");
    assert_eq!(lx.source(), "a c b");
    assert_eq!(rest(&mut lx), vec!["c", "b"]);
}

#[test]
fn test_insert_at_cursor_keeps_line_numbers() {
    let mut lx = lexer("x;\ny;");
    lx.next_token();
    let _ = lx.insert_at_cursor("at_runtime::dispatch(); begin { at_runtime::clear(1) }");
    assert_eq!(lx.source().lines().count(), 2);
}

#[test]
fn test_insert_next_line_without_trailing_code() {
    let mut lx = lexer("begin { }  // trailing comment\nprint(2);\n");
    for _ in 0..3 {
        lx.next_token();
    }

    let injection = lx.insert_next_line("f();");
    assert_eq!(injection.warning, None);
    assert_eq!(injection.offset, 31);
    assert_eq!(rest(&mut lx), vec!["f", "(", ")", ";", "print", "(", "2", ")", ";"]);
}

#[test]
fn test_insert_next_line_warns_about_trailing_code() {
    let mut lx = lexer("begin { } print(1);\nprint(2);\n");
    for _ in 0..3 {
        lx.next_token();
    }

    let injection = lx.insert_next_line("f();");
    let warning = injection.warning.unwrap();
    assert_eq!(warning.code, ErrorCode::W4001);
    assert_eq!(warning.message, "extra text 'print(1);' after call to lex_stuff");
    assert_eq!(warning.primary_span(), Some(Span::new(10, 19)));

    // The trailing code still runs first.
    assert_eq!(
        rest(&mut lx),
        vec!["print", "(", "1", ")", ";", "f", "(", ")", ";", "print", "(", "2", ")", ";"]
    );
}

#[test]
fn test_insert_next_line_at_end_of_input() {
    let mut lx = lexer("x;");
    lx.next_token();
    lx.next_token();
    let injection = lx.insert_next_line("y;");
    assert_eq!(injection.offset, 3);
    assert_eq!(lx.source(), "x;\ny;");
}
