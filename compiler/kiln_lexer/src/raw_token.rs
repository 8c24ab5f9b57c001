//! Token patterns for logos.
//!
//! The lexer runs logos from an arbitrary offset each time it needs a
//! token, because injection may have rewritten everything past the cursor.
//! These variants carry no interned data; [`Lexer`](crate::Lexer) turns
//! them into [`TokenKind`](crate::TokenKind).

use logos::Logos;

#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\r\n]+|//[^\n]*")]
pub(crate) enum RawToken {
    // Keywords
    #[token("begin")] Begin,
    #[token("sub")] Sub,
    #[token("fn")] Fn,
    #[token("let")] Let,
    #[token("if")] If,
    #[token("else")] Else,
    #[token("while")] While,
    #[token("return")] Return,
    #[token("true")] True,
    #[token("false")] False,
    #[token("nil")] Nil,

    // Delimiters
    #[token("(")] LParen,
    #[token(")")] RParen,
    #[token("{")] LBrace,
    #[token("}")] RBrace,
    #[token("[")] LBracket,
    #[token("]")] RBracket,
    #[token(",")] Comma,
    #[token(";")] Semicolon,

    // Operators
    #[token("=")] Eq,
    #[token("==")] EqEq,
    #[token("!=")] NotEq,
    #[token("<")] Lt,
    #[token("<=")] LtEq,
    #[token(">")] Gt,
    #[token(">=")] GtEq,
    #[token("+")] Plus,
    #[token("-")] Minus,
    #[token("*")] Star,
    #[token("/")] Slash,
    #[token("%")] Percent,
    #[token("!")] Bang,
    #[token("&&")] AmpAmp,
    #[token("||")] PipePipe,

    /// Digits with optional `_` separators. `None` (a lex error) when the
    /// value does not fit in an `i64`.
    #[regex(r"[0-9][0-9_]*", |lex| lex.slice().replace('_', "").parse::<i64>().ok())]
    Int(i64),

    /// Single-line string literal; escapes are resolved later.
    #[regex(r#""([^"\\\n\r]|\\.)*""#)]
    String,

    #[regex(r#""([^"\\\n\r]|\\.)*"#)]
    UnterminatedString,

    /// A name or a glob path: `x`, `at_runtime::dispatch`, `Util::Log`.
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*(::[a-zA-Z_][a-zA-Z0-9_]*)*")]
    Ident,
}
