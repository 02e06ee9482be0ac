//! Rule bodies and trigger disambiguation (spec §4.2).

use super::{describe_kind, Parser, ParseError};
use crate::ast::{BinOp, Expr, LetBinding, Param, Rule, Trigger};
use crate::lexer::{Keyword, Punct, TokenKind};

impl Parser {
    pub(super) fn parse_rule(&mut self) -> Result<Rule, ParseError> {
        let (name, loc) = self.expect_ident("rule name")?;
        self.expect_punct(Punct::LBrace)?;

        let mut trigger = None;
        let mut lets = Vec::new();
        let mut requires = Vec::new();
        let mut ensures = Vec::new();

        while !self.at_punct(Punct::RBrace) && !self.at_eof() {
            match self.cur_kind().clone() {
                TokenKind::Keyword(Keyword::When) => {
                    self.advance();
                    self.expect_punct(Punct::Colon)?;
                    trigger = Some(self.parse_trigger()?);
                }
                TokenKind::Keyword(Keyword::Let) => {
                    self.advance();
                    let (bname, bloc) = self.expect_ident("let binding name")?;
                    self.expect_punct(Punct::Colon)?;
                    let expr = self.parse_expr()?;
                    lets.push(LetBinding { name: bname, expr, loc: bloc });
                }
                TokenKind::Keyword(Keyword::Requires) => {
                    self.advance();
                    self.expect_punct(Punct::Colon)?;
                    requires.push(self.parse_expr()?);
                }
                TokenKind::Keyword(Keyword::Ensures) => {
                    self.advance();
                    self.expect_punct(Punct::Colon)?;
                    ensures.push(self.parse_expr()?);
                }
                other => {
                    return Err(self.error_here(format!(
                        "unexpected {} in rule body",
                        describe_kind(&other)
                    )));
                }
            }
        }
        self.expect_punct(Punct::RBrace)?;

        let trigger = trigger.ok_or_else(|| ParseError {
            loc,
            message: format!("rule '{name}' has no trigger"),
        })?;

        Ok(Rule { name, trigger, lets, requires, ensures, loc })
    }

    /// Disambiguates among the five trigger shapes (spec §4.2):
    /// `ident : ident . created`, `ident : ident . field becomes <expr>`,
    /// `ident ( params )`, and otherwise an expression classified as
    /// temporal or derived by its top-level shape. `chained` is reserved
    /// and has no parser production (see `DESIGN.md`).
    fn parse_trigger(&mut self) -> Result<Trigger, ParseError> {
        let loc = self.cur_loc();

        if self.at_ident() && self.at_punct_at(1, Punct::Colon) {
            let (binding, _) = self.expect_ident("trigger binding")?;
            self.advance(); // colon
            let (entity, _) = self.expect_ident("trigger entity")?;
            self.expect_punct(Punct::Dot)?;
            if self.at_keyword(Keyword::Created) {
                self.advance();
                return Ok(Trigger::Created { binding, entity, loc });
            }
            let (field, _) = self.expect_ident("trigger field")?;
            self.expect_keyword(Keyword::Becomes)?;
            let value = self.parse_expr()?;
            return Ok(Trigger::StateChange { binding, entity, field, value, loc });
        }

        if self.at_ident() && self.at_punct_at(1, Punct::LParen) {
            let (name, _) = self.expect_ident("stimulus name")?;
            self.advance(); // (
            let mut params = Vec::new();
            while !self.at_punct(Punct::RParen) && !self.at_eof() {
                let (pname, _) = self.expect_ident("stimulus parameter")?;
                let optional = if self.at_punct(Punct::Question) {
                    self.advance();
                    true
                } else {
                    false
                };
                params.push(Param { name: pname, optional });
                if self.at_punct(Punct::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
            self.expect_punct(Punct::RParen)?;
            return Ok(Trigger::Stimulus { name, params, loc });
        }

        let expr = self.parse_expr()?;
        let is_comparison =
            matches!(&expr, Expr::Binary(op, ..) if matches!(op, BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge));
        if is_comparison && contains_now(&expr) {
            Ok(Trigger::Temporal { expr, loc })
        } else {
            Ok(Trigger::Derived { expr, loc })
        }
    }

    fn at_punct_at(&self, offset: usize, p: Punct) -> bool {
        matches!(self.peek_kind(offset), TokenKind::Punct(x) if *x == p)
    }
}

/// Whether `now` occurs anywhere inside `expr` (spec §4.2's temporal vs.
/// derived trigger distinction).
fn contains_now(expr: &Expr) -> bool {
    match expr {
        Expr::Ident(name, _) => name == "now",
        Expr::Number(..) | Expr::Str(..) | Expr::Bool(..) | Expr::Null(_) => false,
        Expr::FieldAccess(obj, _, _) => contains_now(obj),
        Expr::Call(callee, args, _) => contains_now(callee) || args.iter().any(contains_now),
        Expr::Binary(_, l, r, _) => contains_now(l) || contains_now(r),
        Expr::Unary(_, e, _) => contains_now(e),
        Expr::Lambda(_, body, _) => contains_now(body),
        Expr::JoinLookup(_, pairs, _) | Expr::EntityCreated(_, pairs, _) => {
            pairs.iter().any(|(_, e)| contains_now(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::parse;
    use crate::ast::Trigger;

    #[test]
    fn parses_created_trigger() {
        let file = parse(
            "t.allium",
            "rule WelcomeEmail { when: u: User.created ensures: true }",
        )
        .unwrap();
        assert!(matches!(
            &file.rules[0].trigger,
            Trigger::Created { binding, entity, .. } if binding == "u" && entity == "User"
        ));
    }

    #[test]
    fn parses_state_change_trigger() {
        let file = parse(
            "t.allium",
            "rule Suspend { when: u: User.status becomes suspended ensures: true }",
        )
        .unwrap();
        assert!(matches!(
            &file.rules[0].trigger,
            Trigger::StateChange { binding, entity, field, .. }
                if binding == "u" && entity == "User" && field == "status"
        ));
    }

    #[test]
    fn parses_stimulus_trigger_with_optional_param() {
        let file = parse(
            "t.allium",
            "rule Signup { when: signup(email, referrer?) ensures: true }",
        )
        .unwrap();
        match &file.rules[0].trigger {
            Trigger::Stimulus { name, params, .. } => {
                assert_eq!(name, "signup");
                assert_eq!(params.len(), 2);
                assert!(!params[0].optional);
                assert!(params[1].optional);
            }
            other => panic!("expected stimulus trigger, got {other:?}"),
        }
    }

    #[test]
    fn classifies_comparison_against_now_as_temporal() {
        let file = parse(
            "t.allium",
            "rule Expire { when: expiresAt < now ensures: true }",
        )
        .unwrap();
        assert!(matches!(&file.rules[0].trigger, Trigger::Temporal { .. }));
    }

    #[test]
    fn classifies_other_expressions_as_derived_triggers() {
        let file = parse(
            "t.allium",
            "rule Flag { when: attemptCount > 3 ensures: true }",
        )
        .unwrap();
        assert!(matches!(&file.rules[0].trigger, Trigger::Derived { .. }));
    }

    #[test]
    fn rule_without_trigger_is_a_syntax_error() {
        let err = parse("t.allium", "rule Broken { ensures: true }").unwrap_err();
        assert!(err.message.contains("no trigger"));
    }
}
