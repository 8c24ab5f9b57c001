//! Recursive-descent parser for Kiln.
//!
//! The parser does more than build a tree: it drives construction. As soon
//! as a `begin` block's closing brace is consumed, the block is handed to
//! the [`ConstructionHost`] and runs before another token is read. Whatever
//! the block splices into the lexer is therefore the very next thing parsed.
//!
//! The lexer is shared with the host (which splices into it), so the parser
//! only ever borrows it for a single token operation and never across a
//! host callback.

mod error;
mod expr;

use std::cell::RefCell;
use std::rc::Rc;

use kiln_diagnostic::ErrorCode;
use kiln_ir::{Name, Span};
use kiln_lexer::{Lexer, Token, TokenKind};

use crate::ast::{Block, FunctionDef, Stmt, StmtKind};
use crate::errors::CompileError;
use crate::stash::Glob;

pub use error::ParseError;

pub(crate) type ParseResult<T> = Result<T, CompileError>;

/// What the parser needs from the interpreter while constructing a unit.
pub trait ConstructionHost {
    /// The glob a non-lexical name refers to.
    fn resolve_global(&mut self, name: Name) -> Rc<Glob>;

    /// Install a `sub` the moment its body has been parsed.
    fn install_sub(&mut self, name: Name, def: FunctionDef);

    /// Run a `begin` block the moment its closing brace has been consumed.
    fn run_begin(&mut self, body: Block, span: Span) -> Result<(), CompileError>;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ScopeKind {
    /// Top level of the unit.
    Unit,
    /// Braced block, `if` or `while` body.
    Block,
    /// Closure body. Sees enclosing lexicals.
    Closure,
    /// Sub body. Sees only its own lexicals.
    Sub,
    /// `begin` body. Runs before any enclosing lexical exists.
    Begin,
}

impl ScopeKind {
    fn is_opaque(self) -> bool {
        matches!(self, ScopeKind::Sub | ScopeKind::Begin)
    }
}

struct ParseScope {
    kind: ScopeKind,
    locals: Vec<Name>,
}

enum Lookup {
    Local,
    Global,
}

pub struct Parser<'h, H: ConstructionHost + ?Sized> {
    lexer: Rc<RefCell<Lexer>>,
    host: &'h mut H,
    scopes: Vec<ParseScope>,
}

impl<'h, H: ConstructionHost + ?Sized> Parser<'h, H> {
    pub fn new(lexer: Rc<RefCell<Lexer>>, host: &'h mut H) -> Self {
        Parser {
            lexer,
            host,
            scopes: Vec::new(),
        }
    }

    /// Parse statements up to end of input, running `begin` blocks and
    /// installing subs as they complete.
    pub fn parse_unit(&mut self) -> ParseResult<Block> {
        self.scopes.push(ParseScope {
            kind: ScopeKind::Unit,
            locals: Vec::new(),
        });
        let result = self.parse_unit_body();
        self.scopes.pop();
        result
    }

    fn parse_unit_body(&mut self) -> ParseResult<Block> {
        let mut stmts = Vec::new();
        loop {
            let token = self.peek();
            match token.kind {
                TokenKind::Eof => {
                    let span = Span::new(0, token.span.end);
                    return Ok(Block { stmts, span });
                }
                TokenKind::RBrace => {
                    return Err(self.unexpected("statement", token).into());
                }
                _ => {
                    if let Some(stmt) = self.parse_stmt()? {
                        stmts.push(stmt);
                    }
                }
            }
        }
    }

    // ===== Token access =====

    fn peek(&self) -> Token {
        self.lexer.borrow_mut().peek()
    }

    fn advance(&mut self) -> Token {
        self.lexer.borrow_mut().next_token()
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        let token = self.peek();
        if token.kind == kind {
            Ok(self.advance())
        } else {
            Err(self.unexpected(kind.describe(), token))
        }
    }

    fn expect_ident(&mut self) -> Result<(Name, Span), ParseError> {
        let token = self.peek();
        if let TokenKind::Ident(name) = token.kind {
            self.advance();
            Ok((name, token.span))
        } else {
            let mut err = self.unexpected("identifier", token);
            if err.code == ErrorCode::E1001 {
                err.code = ErrorCode::E1004;
            }
            Err(err)
        }
    }

    /// A name for a lexical: a `let` or a parameter. Paths such as
    /// `at_runtime::dispatch` always name globals, so they are refused.
    fn expect_lexical_name(&mut self) -> Result<Name, ParseError> {
        let (name, span) = self.expect_ident()?;
        let text = self.text(span);
        if text.contains("::") {
            return Err(ParseError::new(
                ErrorCode::E1004,
                format!("expected identifier, found path `{text}`"),
                span,
            )
            .with_label("lexical names cannot contain `::`"));
        }
        Ok(name)
    }

    fn text(&self, span: Span) -> String {
        self.lexer.borrow().slice(span).to_owned()
    }

    fn unexpected(&self, expected: &str, found: Token) -> ParseError {
        ParseError::unexpected(expected, found.kind, &self.text(found.span), found.span)
    }

    /// `;` ends a statement; it may be left out before `}` or end of input.
    fn expect_terminator(&mut self) -> Result<(), ParseError> {
        if self.eat(TokenKind::Semicolon) {
            return Ok(());
        }
        let token = self.peek();
        match token.kind {
            TokenKind::RBrace | TokenKind::Eof => Ok(()),
            _ => Err(self.unexpected("`;`", token)),
        }
    }

    // ===== Lexical scopes =====

    fn declare(&mut self, name: Name) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.locals.push(name);
        }
    }

    fn lookup(&self, name: Name) -> Lookup {
        for scope in self.scopes.iter().rev() {
            if scope.locals.contains(&name) {
                return Lookup::Local;
            }
            if scope.kind.is_opaque() {
                break;
            }
        }
        Lookup::Global
    }

    fn in_callable(&self) -> bool {
        for scope in self.scopes.iter().rev() {
            match scope.kind {
                ScopeKind::Closure | ScopeKind::Sub => return true,
                ScopeKind::Begin | ScopeKind::Unit => return false,
                ScopeKind::Block => {}
            }
        }
        false
    }

    // ===== Statements =====

    /// Parse one statement. `sub` and `begin` act at construction time and
    /// leave nothing in the tree.
    fn parse_stmt(&mut self) -> ParseResult<Option<Stmt>> {
        let token = self.peek();
        let stmt = match token.kind {
            TokenKind::Semicolon => {
                self.advance();
                return Ok(None);
            }
            TokenKind::Begin => {
                self.parse_begin()?;
                return Ok(None);
            }
            TokenKind::Sub => {
                self.parse_sub()?;
                return Ok(None);
            }
            TokenKind::Let => self.parse_let()?,
            TokenKind::Return => self.parse_return()?,
            TokenKind::If => self.parse_if()?,
            TokenKind::While => self.parse_while()?,
            TokenKind::LBrace => {
                let block = self.parse_block(ScopeKind::Block)?;
                let span = block.span;
                Stmt::new(StmtKind::Block(block), span)
            }
            _ => self.parse_expr_stmt()?,
        };
        Ok(Some(stmt))
    }

    fn parse_block(&mut self, kind: ScopeKind) -> ParseResult<Block> {
        let open = self.expect(TokenKind::LBrace)?;
        self.scopes.push(ParseScope {
            kind,
            locals: Vec::new(),
        });
        let result = kiln_stack::ensure_sufficient_stack(|| self.parse_block_body(open.span));
        self.scopes.pop();
        result
    }

    /// Statements up to and including the closing brace. Nothing after the
    /// brace is looked at, so a `begin` that ends here can still splice
    /// text right behind it.
    fn parse_block_body(&mut self, open: Span) -> ParseResult<Block> {
        let mut stmts = Vec::new();
        loop {
            let token = self.peek();
            match token.kind {
                TokenKind::RBrace => {
                    self.advance();
                    return Ok(Block {
                        stmts,
                        span: open.merge(token.span),
                    });
                }
                TokenKind::Eof => return Err(ParseError::unclosed('{', open, token.span).into()),
                _ => {
                    if let Some(stmt) = self.parse_stmt()? {
                        stmts.push(stmt);
                    }
                }
            }
        }
    }

    fn parse_begin(&mut self) -> ParseResult<()> {
        let keyword = self.advance();
        let body = self.parse_block(ScopeKind::Begin)?;
        let span = keyword.span.merge(body.span);
        self.host.run_begin(body, span)
    }

    fn parse_sub(&mut self) -> ParseResult<()> {
        let keyword = self.advance();
        let (name, _) = self.expect_ident()?;
        let def = self.parse_function(Some(name), ScopeKind::Sub, keyword.span)?;
        self.host.install_sub(name, def);
        Ok(())
    }

    /// Parameter list and body of a `sub` or `fn`.
    fn parse_function(
        &mut self,
        name: Option<Name>,
        kind: ScopeKind,
        start: Span,
    ) -> ParseResult<FunctionDef> {
        let params = self.parse_params()?;

        // Parameters live in a scope of their own kind so that the body
        // block and its lookups see them.
        self.scopes.push(ParseScope {
            kind,
            locals: params.clone(),
        });
        let body = self.parse_block(ScopeKind::Block);
        self.scopes.pop();
        let body = body?;

        let span = start.merge(body.span);
        Ok(FunctionDef {
            name,
            params,
            body,
            span,
        })
    }

    fn parse_params(&mut self) -> ParseResult<Vec<Name>> {
        let open = self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        loop {
            let token = self.peek();
            match token.kind {
                TokenKind::RParen => {
                    self.advance();
                    return Ok(params);
                }
                TokenKind::Eof => return Err(ParseError::unclosed('(', open.span, token.span).into()),
                _ => {
                    let param = self.expect_lexical_name()?;
                    params.push(param);
                    if !self.check(TokenKind::RParen) {
                        self.expect(TokenKind::Comma)?;
                    }
                }
            }
        }
    }

    fn parse_let(&mut self) -> ParseResult<Stmt> {
        let keyword = self.advance();
        let name = self.expect_lexical_name()?;
        self.expect(TokenKind::Eq)?;
        let value = self.parse_expr()?;
        let span = keyword.span.merge(value.span);
        self.expect_terminator()?;
        self.declare(name);
        Ok(Stmt::new(StmtKind::Let { name, value }, span))
    }

    fn parse_return(&mut self) -> ParseResult<Stmt> {
        let keyword = self.advance();
        if !self.in_callable() {
            return Err(ParseError::new(
                ErrorCode::E1005,
                "`return` outside of a sub or closure",
                keyword.span,
            )
            .with_label("not inside a sub or closure")
            .into());
        }
        let value = match self.peek().kind {
            TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof => None,
            _ => Some(self.parse_expr()?),
        };
        let span = value
            .as_ref()
            .map_or(keyword.span, |value| keyword.span.merge(value.span));
        self.expect_terminator()?;
        Ok(Stmt::new(StmtKind::Return(value), span))
    }

    fn parse_if(&mut self) -> ParseResult<Stmt> {
        let keyword = self.advance();
        let cond = self.parse_condition()?;
        let then_branch = self.parse_block(ScopeKind::Block)?;
        let mut span = keyword.span.merge(then_branch.span);

        let else_branch = if self.eat(TokenKind::Else) {
            let block = if self.check(TokenKind::If) {
                let nested = self.parse_if()?;
                let span = nested.span;
                Block {
                    stmts: vec![nested],
                    span,
                }
            } else {
                self.parse_block(ScopeKind::Block)?
            };
            span = span.merge(block.span);
            Some(block)
        } else {
            None
        };

        Ok(Stmt::new(
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            },
            span,
        ))
    }

    fn parse_while(&mut self) -> ParseResult<Stmt> {
        let keyword = self.advance();
        let cond = self.parse_condition()?;
        let body = self.parse_block(ScopeKind::Block)?;
        let span = keyword.span.merge(body.span);
        Ok(Stmt::new(StmtKind::While { cond, body }, span))
    }

    fn parse_condition(&mut self) -> ParseResult<crate::ast::Expr> {
        self.expect(TokenKind::LParen)?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        Ok(cond)
    }

    /// `expr;` or `name = expr;`.
    fn parse_expr_stmt(&mut self) -> ParseResult<Stmt> {
        use crate::ast::ExprKind;

        let expr = self.parse_expr()?;
        if !self.check(TokenKind::Eq) {
            let span = expr.span;
            self.expect_terminator()?;
            return Ok(Stmt::new(StmtKind::Expr(expr), span));
        }

        self.advance();
        let value = self.parse_expr()?;
        let span = expr.span.merge(value.span);
        let kind = match expr.kind {
            ExprKind::Local(name) => StmtKind::AssignLocal { name, value },
            ExprKind::Global(glob) => StmtKind::AssignGlobal { glob, value },
            _ => {
                return Err(ParseError::new(
                    ErrorCode::E1001,
                    "invalid assignment target",
                    expr.span,
                )
                .with_label("only variables can be assigned to")
                .into())
            }
        };
        self.expect_terminator()?;
        Ok(Stmt::new(kind, span))
    }
}

#[cfg(test)]
mod tests;
