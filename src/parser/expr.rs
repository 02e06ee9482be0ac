//! Expression grammar: precedence climbing over `or`, `and`, comparison,
//! additive, multiplicative, unary, and postfix, per spec §4.2.

use super::{describe_kind, Parser, ParseError};
use crate::ast::{BinOp, Expr, UnOp, ARRAY_CALLEE};
use crate::lexer::{Keyword, Op, Punct, TokenKind};

impl Parser {
    pub(super) fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_and()?;
        while self.at_keyword(Keyword::Or) {
            let loc = self.cur_loc();
            self.advance();
            let right = self.parse_and()?;
            left = Expr::Binary(BinOp::Or, Box::new(left), Box::new(right), loc);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_comparison()?;
        while self.at_keyword(Keyword::And) {
            let loc = self.cur_loc();
            self.advance();
            let right = self.parse_comparison()?;
            left = Expr::Binary(BinOp::And, Box::new(left), Box::new(right), loc);
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.cur_kind() {
                TokenKind::Op(Op::Eq) => BinOp::Eq,
                TokenKind::Op(Op::NotEq) => BinOp::NotEq,
                TokenKind::Op(Op::Lt) => BinOp::Lt,
                TokenKind::Op(Op::Le) => BinOp::Le,
                TokenKind::Op(Op::Gt) => BinOp::Gt,
                TokenKind::Op(Op::Ge) => BinOp::Ge,
                TokenKind::Keyword(Keyword::In) => BinOp::In,
                TokenKind::Keyword(Keyword::With) => BinOp::With,
                _ => break,
            };
            let loc = self.cur_loc();
            self.advance();
            let right = self.parse_additive()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right), loc);
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.cur_kind() {
                TokenKind::Op(Op::Plus) => BinOp::Add,
                TokenKind::Op(Op::Minus) => BinOp::Sub,
                _ => break,
            };
            let loc = self.cur_loc();
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right), loc);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.cur_kind() {
                TokenKind::Op(Op::Star) => BinOp::Mul,
                TokenKind::Op(Op::Slash) => BinOp::Div,
                _ => break,
            };
            let loc = self.cur_loc();
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right), loc);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        if self.at_keyword(Keyword::Not) {
            let loc = self.cur_loc();
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary(UnOp::Not, Box::new(operand), loc));
        }
        if matches!(self.cur_kind(), TokenKind::Op(Op::Minus)) {
            let loc = self.cur_loc();
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary(UnOp::Neg, Box::new(operand), loc));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.cur_kind() {
                TokenKind::Punct(Punct::Dot) => {
                    let loc = self.cur_loc();
                    self.advance();
                    let (field, _) = self.expect_ident("field name")?;
                    if self.at_punct(Punct::LParen) {
                        self.advance();
                        let args = self.parse_call_args()?;
                        self.expect_punct(Punct::RParen)?;
                        let callee = Expr::FieldAccess(Box::new(expr), field, loc);
                        expr = Expr::Call(Box::new(callee), args, loc);
                    } else {
                        expr = Expr::FieldAccess(Box::new(expr), field, loc);
                    }
                }
                TokenKind::Punct(Punct::LParen) => {
                    let loc = self.cur_loc();
                    self.advance();
                    let args = self.parse_call_args()?;
                    self.expect_punct(Punct::RParen)?;
                    expr = Expr::Call(Box::new(expr), args, loc);
                }
                TokenKind::Punct(Punct::LBrace) => {
                    let loc = self.cur_loc();
                    if let Expr::Ident(entity, _) = &expr {
                        let entity = entity.clone();
                        self.advance();
                        let pairs = self.parse_kv_pairs(Punct::RBrace)?;
                        self.expect_punct(Punct::RBrace)?;
                        expr = Expr::JoinLookup(entity, pairs, loc);
                    } else {
                        return Err(
                            self.error_here("join lookup requires an entity identifier".to_string())
                        );
                    }
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let loc = self.cur_loc();
        match self.cur_kind().clone() {
            TokenKind::Punct(Punct::LParen) => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect_punct(Punct::RParen)?;
                Ok(inner)
            }
            TokenKind::Number(n) => {
                self.advance();
                Ok(Expr::Number(n, loc))
            }
            TokenKind::String(s) => {
                self.advance();
                Ok(Expr::Str(s, loc))
            }
            TokenKind::Keyword(Keyword::True) => {
                self.advance();
                Ok(Expr::Bool(true, loc))
            }
            TokenKind::Keyword(Keyword::False) => {
                self.advance();
                Ok(Expr::Bool(false, loc))
            }
            TokenKind::Keyword(Keyword::Null) => {
                self.advance();
                Ok(Expr::Null(loc))
            }
            TokenKind::Keyword(Keyword::Now) => {
                self.advance();
                Ok(Expr::Ident("now".to_string(), loc))
            }
            TokenKind::Keyword(Keyword::Config)
                if matches!(self.peek_kind(1), TokenKind::Op(Op::Slash)) =>
            {
                self.advance();
                self.advance();
                let (name, _) = self.expect_ident("config identifier")?;
                Ok(Expr::Ident(format!("config/{name}"), loc))
            }
            TokenKind::Punct(Punct::LBracket) => {
                self.advance();
                let mut items = Vec::new();
                while !self.at_punct(Punct::RBracket) && !self.at_eof() {
                    items.push(self.parse_expr()?);
                    if self.at_punct(Punct::Comma) {
                        self.advance();
                    } else {
                        break;
                    }
                }
                self.expect_punct(Punct::RBracket)?;
                Ok(Expr::Call(Box::new(Expr::Ident(ARRAY_CALLEE.to_string(), loc)), items, loc))
            }
            TokenKind::Ident(name) => {
                if matches!(self.peek_kind(1), TokenKind::Op(Op::FatArrow)) {
                    self.advance();
                    self.advance();
                    let body = self.parse_expr()?;
                    Ok(Expr::Lambda(name, Box::new(body), loc))
                } else if matches!(self.peek_kind(1), TokenKind::Punct(Punct::Dot))
                    && matches!(self.peek_kind(2), TokenKind::Keyword(Keyword::Created))
                    && matches!(self.peek_kind(3), TokenKind::Punct(Punct::LParen))
                {
                    self.advance(); // name
                    self.advance(); // .
                    self.advance(); // created
                    self.advance(); // (
                    let inits = self.parse_kv_pairs(Punct::RParen)?;
                    self.expect_punct(Punct::RParen)?;
                    Ok(Expr::EntityCreated(name, inits, loc))
                } else {
                    self.advance();
                    Ok(Expr::Ident(name, loc))
                }
            }
            other => Err(self.error_here(format!("unexpected {}", describe_kind(&other)))),
        }
    }

    fn parse_call_args(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = Vec::new();
        while !self.at_punct(Punct::RParen) && !self.at_eof() {
            args.push(self.parse_expr()?);
            if self.at_punct(Punct::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        Ok(args)
    }

    /// `name` or `name : expr` pairs separated by commas, terminated by
    /// `terminator` (spec §4.2: entity-created field inits, join-lookup
    /// keys, and `default`'s value list all share this shape). A bare
    /// `name` is shorthand for `name: name`.
    pub(super) fn parse_kv_pairs(
        &mut self,
        terminator: Punct,
    ) -> Result<Vec<(String, Expr)>, ParseError> {
        let mut pairs = Vec::new();
        while !self.at_punct(terminator) && !self.at_eof() {
            let (name, loc) = self.expect_ident("field name")?;
            let value = if self.at_punct(Punct::Colon) {
                self.advance();
                self.parse_expr()?
            } else {
                Expr::Ident(name.clone(), loc)
            };
            pairs.push((name, value));
            if self.at_punct(Punct::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        Ok(pairs)
    }
}
