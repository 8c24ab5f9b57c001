//! On-demand lexer over a spliceable source buffer.

use kiln_diagnostic::{extra_text_after_injection, Diagnostic};
use kiln_ir::{SharedInterner, Span};
use logos::Logos;

use crate::escape::unescape_string;
use crate::raw_token::RawToken;
use crate::token::{LexError, Token, TokenKind};

/// Result of splicing text into the source buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
#[must_use]
pub struct Injection {
    /// Byte offset the text was inserted at.
    pub offset: u32,
    /// Set when line-granular injection left code on the current line.
    pub warning: Option<Diagnostic>,
}

/// Lexer for one unit.
///
/// `pos` is the byte offset just past the last consumed token; it is the
/// only position the parser has committed to. Everything after it may be
/// rewritten by an injection.
pub struct Lexer {
    source: String,
    pos: usize,
    peeked: Option<Token>,
    interner: SharedInterner,
}

impl Lexer {
    pub fn new(source: impl Into<String>, interner: SharedInterner) -> Self {
        Lexer {
            source: source.into(),
            pos: 0,
            peeked: None,
            interner,
        }
    }

    /// Current source buffer, including injected text.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn into_source(self) -> String {
        self.source
    }

    pub fn interner(&self) -> &SharedInterner {
        &self.interner
    }

    /// Offset just past the last consumed token.
    pub fn cursor(&self) -> u32 {
        offset_u32(self.pos)
    }

    /// Source text covered by `span`, or `""` if it is out of range.
    pub fn slice(&self, span: Span) -> &str {
        self.source.get(span.to_range()).unwrap_or("")
    }

    /// Look at the next token without consuming it.
    pub fn peek(&mut self) -> Token {
        if let Some(token) = self.peeked {
            return token;
        }
        let token = self.lex_at(self.pos);
        self.peeked = Some(token);
        token
    }

    /// Consume and return the next token.
    pub fn next_token(&mut self) -> Token {
        let token = match self.peeked.take() {
            Some(token) => token,
            None => self.lex_at(self.pos),
        };
        self.pos = token.span.end as usize;
        token
    }

    fn lex_at(&self, pos: usize) -> Token {
        let rest = &self.source[pos..];
        let mut raw = RawToken::lexer(rest);

        let Some(result) = raw.next() else {
            return Token::new(TokenKind::Eof, Span::point(offset_u32(self.source.len())));
        };

        let range = raw.span();
        let span = Span::from_range(pos + range.start..pos + range.end);
        let slice = raw.slice();

        let kind = match result {
            Ok(raw) => self.convert(raw, slice),
            Err(()) if slice.starts_with(|c: char| c.is_ascii_digit()) => {
                TokenKind::Error(LexError::InvalidInt)
            }
            Err(()) => TokenKind::Error(LexError::InvalidChar),
        };
        Token::new(kind, span)
    }

    fn convert(&self, raw: RawToken, slice: &str) -> TokenKind {
        match raw {
            RawToken::Int(n) => TokenKind::Int(n),
            RawToken::String => {
                let content = &slice[1..slice.len() - 1];
                TokenKind::Str(self.interner.intern(&unescape_string(content)))
            }
            RawToken::UnterminatedString => TokenKind::Error(LexError::UnterminatedString),
            RawToken::Ident => TokenKind::Ident(self.interner.intern(slice)),

            RawToken::Begin => TokenKind::Begin,
            RawToken::Sub => TokenKind::Sub,
            RawToken::Fn => TokenKind::Fn,
            RawToken::Let => TokenKind::Let,
            RawToken::If => TokenKind::If,
            RawToken::Else => TokenKind::Else,
            RawToken::While => TokenKind::While,
            RawToken::Return => TokenKind::Return,
            RawToken::True => TokenKind::True,
            RawToken::False => TokenKind::False,
            RawToken::Nil => TokenKind::Nil,

            RawToken::LParen => TokenKind::LParen,
            RawToken::RParen => TokenKind::RParen,
            RawToken::LBrace => TokenKind::LBrace,
            RawToken::RBrace => TokenKind::RBrace,
            RawToken::LBracket => TokenKind::LBracket,
            RawToken::RBracket => TokenKind::RBracket,
            RawToken::Comma => TokenKind::Comma,
            RawToken::Semicolon => TokenKind::Semicolon,

            RawToken::Eq => TokenKind::Eq,
            RawToken::EqEq => TokenKind::EqEq,
            RawToken::NotEq => TokenKind::NotEq,
            RawToken::Lt => TokenKind::Lt,
            RawToken::LtEq => TokenKind::LtEq,
            RawToken::Gt => TokenKind::Gt,
            RawToken::GtEq => TokenKind::GtEq,
            RawToken::Plus => TokenKind::Plus,
            RawToken::Minus => TokenKind::Minus,
            RawToken::Star => TokenKind::Star,
            RawToken::Slash => TokenKind::Slash,
            RawToken::Percent => TokenKind::Percent,
            RawToken::Bang => TokenKind::Bang,
            RawToken::AmpAmp => TokenKind::AmpAmp,
            RawToken::PipePipe => TokenKind::PipePipe,
        }
    }

    /// Splice `text` in right after the last consumed token.
    ///
    /// A peeked token is discarded first, so the parser's next token comes
    /// from `text`. A space is added on either side where the fragment would
    /// otherwise fuse with a neighbouring identifier.
    pub fn insert_at_cursor(&mut self, text: &str) -> Injection {
        self.peeked = None;
        let at = self.pos;
        self.splice(at, text);
        tracing::debug!(offset = at, fragment = text, "injected at cursor");
        Injection {
            offset: offset_u32(at),
            warning: None,
        }
    }

    /// Splice `text` in at the start of the next source line.
    ///
    /// Code remaining on the current line after the cursor is still parsed
    /// before `text`; when there is any, the returned injection carries a
    /// `W4001` warning naming it. Comments and whitespace do not count.
    pub fn insert_next_line(&mut self, text: &str) -> Injection {
        self.peeked = None;
        let line_end = self.source[self.pos..]
            .find('\n')
            .map_or(self.source.len(), |i| self.pos + i);

        let warning = self.trailing_code(self.pos, line_end).map(|span| {
            let extra = self.slice(span).to_owned();
            tracing::warn!(text = %extra, "extra text after call to lex_stuff");
            extra_text_after_injection(span, &extra)
        });

        let at = if line_end < self.source.len() {
            line_end + 1
        } else {
            self.source.push('\n');
            self.source.len()
        };
        self.splice(at, text);
        tracing::debug!(offset = at, fragment = text, "injected at next line");

        Injection {
            offset: offset_u32(at),
            warning,
        }
    }

    /// Span from the first to the last token in `start..end`, if any.
    fn trailing_code(&self, start: usize, end: usize) -> Option<Span> {
        let region = &self.source[start..end];
        let mut raw = RawToken::lexer(region);
        let mut first = None;
        let mut last = 0;
        while raw.next().is_some() {
            let range = raw.span();
            first.get_or_insert(range.start);
            last = range.end;
        }
        first.map(|first| Span::from_range(start + first..start + last))
    }

    fn splice(&mut self, at: usize, text: &str) {
        let before = self.source[..at].chars().next_back();
        let after = self.source[at..].chars().next();

        let mut fragment = String::with_capacity(text.len() + 2);
        if fuses(before, text.chars().next()) {
            fragment.push(' ');
        }
        fragment.push_str(text);
        if fuses(text.chars().next_back(), after) {
            fragment.push(' ');
        }
        self.source.insert_str(at, &fragment);
    }
}

/// Whether two adjacent characters would lex as one word.
fn fuses(left: Option<char>, right: Option<char>) -> bool {
    let word = |c: Option<char>| c.is_some_and(|c| c.is_ascii_alphanumeric() || c == '_');
    word(left) && word(right)
}

fn offset_u32(offset: usize) -> u32 {
    u32::try_from(offset).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests;
