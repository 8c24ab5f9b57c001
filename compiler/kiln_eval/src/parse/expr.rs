//! Expression parsing, lowest precedence first.
//!
//! ```text
//! expr     := or
//! or       := and ("||" and)*
//! and      := equality ("&&" equality)*
//! equality := compare (("==" | "!=") compare)*
//! compare  := sum (("<" | "<=" | ">" | ">=") sum)*
//! sum      := product (("+" | "-") product)*
//! product  := unary (("*" | "/" | "%") unary)*
//! unary    := ("-" | "!") unary | call
//! call     := primary ("(" args ")")*
//! ```

use std::rc::Rc;

use kiln_lexer::TokenKind;

use super::{ConstructionHost, Lookup, ParseError, ParseResult, Parser, ScopeKind};
use crate::ast::{BinaryOp, Expr, ExprKind, UnaryOp};

impl<H: ConstructionHost + ?Sized> Parser<'_, H> {
    pub(super) fn parse_expr(&mut self) -> ParseResult<Expr> {
        kiln_stack::ensure_sufficient_stack(|| self.parse_or())
    }

    /// One left-associative precedence level.
    fn parse_binary_level(
        &mut self,
        operand: fn(&mut Self) -> ParseResult<Expr>,
        operator: fn(TokenKind) -> Option<BinaryOp>,
    ) -> ParseResult<Expr> {
        let mut left = operand(self)?;
        while let Some(op) = operator(self.peek().kind) {
            self.advance();
            let right = operand(self)?;
            let span = left.span.merge(right.span);
            left = Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }
        Ok(left)
    }

    fn parse_or(&mut self) -> ParseResult<Expr> {
        self.parse_binary_level(Self::parse_and, |kind| {
            (kind == TokenKind::PipePipe).then_some(BinaryOp::Or)
        })
    }

    fn parse_and(&mut self) -> ParseResult<Expr> {
        self.parse_binary_level(Self::parse_equality, |kind| {
            (kind == TokenKind::AmpAmp).then_some(BinaryOp::And)
        })
    }

    fn parse_equality(&mut self) -> ParseResult<Expr> {
        self.parse_binary_level(Self::parse_comparison, |kind| match kind {
            TokenKind::EqEq => Some(BinaryOp::Eq),
            TokenKind::NotEq => Some(BinaryOp::NotEq),
            _ => None,
        })
    }

    fn parse_comparison(&mut self) -> ParseResult<Expr> {
        self.parse_binary_level(Self::parse_sum, |kind| match kind {
            TokenKind::Lt => Some(BinaryOp::Lt),
            TokenKind::LtEq => Some(BinaryOp::LtEq),
            TokenKind::Gt => Some(BinaryOp::Gt),
            TokenKind::GtEq => Some(BinaryOp::GtEq),
            _ => None,
        })
    }

    fn parse_sum(&mut self) -> ParseResult<Expr> {
        self.parse_binary_level(Self::parse_product, |kind| match kind {
            TokenKind::Plus => Some(BinaryOp::Add),
            TokenKind::Minus => Some(BinaryOp::Sub),
            _ => None,
        })
    }

    fn parse_product(&mut self) -> ParseResult<Expr> {
        self.parse_binary_level(Self::parse_unary, |kind| match kind {
            TokenKind::Star => Some(BinaryOp::Mul),
            TokenKind::Slash => Some(BinaryOp::Div),
            TokenKind::Percent => Some(BinaryOp::Mod),
            _ => None,
        })
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        let op = match self.peek().kind {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Bang => UnaryOp::Not,
            _ => return self.parse_call(),
        };
        let token = self.advance();
        let operand = kiln_stack::ensure_sufficient_stack(|| self.parse_unary())?;
        let span = token.span.merge(operand.span);
        Ok(Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            span,
        ))
    }

    fn parse_call(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_primary()?;
        while self.check(TokenKind::LParen) {
            let (args, close) = self.parse_delimited(TokenKind::LParen, TokenKind::RParen, '(')?;
            let span = expr.span.merge(close);
            expr = Expr::new(
                ExprKind::Call {
                    callee: Box::new(expr),
                    args,
                },
                span,
            );
        }
        Ok(expr)
    }

    /// Comma-separated expressions between `open` and `close`, with an
    /// optional trailing comma. Returns the span of the closing token.
    fn parse_delimited(
        &mut self,
        open: TokenKind,
        close: TokenKind,
        delimiter: char,
    ) -> ParseResult<(Vec<Expr>, kiln_ir::Span)> {
        let open_token = self.expect(open)?;
        let mut items = Vec::new();
        loop {
            let token = self.peek();
            if token.kind == close {
                self.advance();
                return Ok((items, token.span));
            }
            if token.kind == TokenKind::Eof {
                return Err(ParseError::unclosed(delimiter, open_token.span, token.span).into());
            }
            items.push(self.parse_expr()?);
            if !self.check(close) {
                self.expect(TokenKind::Comma)?;
            }
        }
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let token = self.peek();
        let kind = match token.kind {
            TokenKind::Int(n) => ExprKind::Int(n),
            TokenKind::Str(s) => ExprKind::Str(s),
            TokenKind::True => ExprKind::Bool(true),
            TokenKind::False => ExprKind::Bool(false),
            TokenKind::Nil => ExprKind::Nil,
            TokenKind::Ident(name) => match self.lookup(name) {
                Lookup::Local => ExprKind::Local(name),
                Lookup::Global => ExprKind::Global(self.host.resolve_global(name)),
            },
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                let close = self.expect(TokenKind::RParen)?;
                return Ok(Expr::new(inner.kind, token.span.merge(close.span)));
            }
            TokenKind::LBracket => {
                let (items, close) =
                    self.parse_delimited(TokenKind::LBracket, TokenKind::RBracket, '[')?;
                return Ok(Expr::new(ExprKind::List(items), token.span.merge(close)));
            }
            TokenKind::Fn => {
                self.advance();
                let def = self.parse_function(None, ScopeKind::Closure, token.span)?;
                let span = def.span;
                return Ok(Expr::new(ExprKind::Closure(Rc::new(def)), span));
            }
            _ => {
                let text = self.text(token.span);
                return Err(ParseError::expected_expression(token.kind, &text, token.span).into());
            }
        };
        self.advance();
        Ok(Expr::new(kind, token.span))
    }
}
