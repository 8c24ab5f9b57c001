//! Lexer for Kiln.
//!
//! Unlike a batch lexer, [`Lexer`] tokenizes on demand from a source buffer
//! that can change while the unit is being parsed. Code running at
//! construction time (a `begin` block) may splice text into the buffer:
//!
//! - [`Lexer::insert_at_cursor`] puts text right after the last token the
//!   parser consumed, so the parser reads it next.
//! - [`Lexer::insert_next_line`] puts text at the start of the next source
//!   line, and reports any code left on the current line as a warning.
//!
//! Tokens are produced one at a time by the logos-derived [`RawToken`]
//! automaton, restarted at the cursor. Nothing past the cursor is ever
//! cached except a single peeked token, which injection discards.

mod escape;
mod lexer;
mod raw_token;
mod token;

pub use lexer::{Injection, Lexer};
pub use token::{LexError, Token, TokenKind};
