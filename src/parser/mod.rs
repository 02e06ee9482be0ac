//! Recursive-descent parser producing an [`AlliumFile`].
//!
//! On the first syntactic error, parsing halts and returns a single
//! [`Diagnostic`]; no recovery is attempted (spec §4.2). Every
//! recursive-descent function returns an explicit `Result` — there is no
//! exception-style early exit (spec §9).

mod expr;
mod rule;

use crate::ast::*;
use crate::infrastructure::diagnostics::Diagnostic;
use crate::lexer::{lex, Keyword, Loc, Op, Punct, Token, TokenKind};

/// One syntax error: a location and a message naming the token kind
/// actually seen, per spec §4.2's "Failure" contract.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub loc: Loc,
    pub message: String,
}

/// Lexes and parses `source`, returning an [`AlliumFile`] or the single
/// diagnostic produced by the first syntax error.
pub fn parse(filename: &str, source: &str) -> Result<AlliumFile, Diagnostic> {
    let tokens = lex(source);
    let mut parser = Parser { tokens, pos: 0 };
    parser
        .parse_file()
        .map_err(|e| Diagnostic::new(filename, e.loc, e.message))
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn last_index(&self) -> usize {
        self.tokens.len() - 1
    }

    fn cur(&self) -> &Token {
        &self.tokens[self.pos.min(self.last_index())]
    }

    fn cur_kind(&self) -> &TokenKind {
        &self.cur().kind
    }

    fn cur_loc(&self) -> Loc {
        self.cur().loc
    }

    fn peek_kind(&self, offset: usize) -> &TokenKind {
        let idx = (self.pos + offset).min(self.last_index());
        &self.tokens[idx].kind
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos.min(self.last_index())].clone();
        if self.pos < self.last_index() {
            self.pos += 1;
        }
        tok
    }

    fn at_eof(&self) -> bool {
        matches!(self.cur_kind(), TokenKind::Eof)
    }

    fn at_punct(&self, p: Punct) -> bool {
        matches!(self.cur_kind(), TokenKind::Punct(x) if *x == p)
    }

    fn at_keyword(&self, k: Keyword) -> bool {
        matches!(self.cur_kind(), TokenKind::Keyword(x) if *x == k)
    }

    fn at_ident(&self) -> bool {
        matches!(self.cur_kind(), TokenKind::Ident(_))
    }

    fn error_here(&self, message: String) -> ParseError {
        ParseError { loc: self.cur_loc(), message }
    }

    fn expect_punct(&mut self, p: Punct) -> Result<Loc, ParseError> {
        if self.at_punct(p) {
            let loc = self.cur_loc();
            self.advance();
            Ok(loc)
        } else {
            Err(self.error_here(format!(
                "expected '{}', found {}",
                punct_str(p),
                describe_kind(self.cur_kind())
            )))
        }
    }

    fn expect_keyword(&mut self, k: Keyword) -> Result<Loc, ParseError> {
        if self.at_keyword(k) {
            let loc = self.cur_loc();
            self.advance();
            Ok(loc)
        } else {
            Err(self.error_here(format!(
                "expected '{}', found {}",
                k.as_str(),
                describe_kind(self.cur_kind())
            )))
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<(String, Loc), ParseError> {
        if let TokenKind::Ident(name) = self.cur_kind().clone() {
            let loc = self.cur_loc();
            self.advance();
            Ok((name, loc))
        } else {
            Err(self.error_here(format!(
                "expected {what}, found {}",
                describe_kind(self.cur_kind())
            )))
        }
    }

    fn optional_string_note(&mut self) -> Option<String> {
        if let TokenKind::String(s) = self.cur_kind().clone() {
            self.advance();
            Some(s)
        } else {
            None
        }
    }

    // ---- top level -------------------------------------------------

    fn parse_file(&mut self) -> Result<AlliumFile, ParseError> {
        let loc = self.cur_loc();
        let mut file = AlliumFile {
            externals: Vec::new(),
            values: Vec::new(),
            entities: Vec::new(),
            defaults: Vec::new(),
            rules: Vec::new(),
            deferred: Vec::new(),
            open_questions: Vec::new(),
            loc,
        };

        while !self.at_eof() {
            match self.cur_kind().clone() {
                TokenKind::Keyword(Keyword::External) => {
                    self.advance();
                    file.externals.push(self.parse_entity_like()?);
                }
                TokenKind::Keyword(Keyword::Value) => {
                    self.advance();
                    file.values.push(self.parse_entity_like()?);
                }
                TokenKind::Keyword(Keyword::Entity) => {
                    self.advance();
                    file.entities.push(self.parse_entity()?);
                }
                TokenKind::Keyword(Keyword::Default) => {
                    self.advance();
                    file.defaults.push(self.parse_default()?);
                }
                TokenKind::Keyword(Keyword::Rule) => {
                    self.advance();
                    file.rules.push(self.parse_rule()?);
                }
                TokenKind::Keyword(Keyword::Deferred) => {
                    self.advance();
                    file.deferred.push(self.parse_deferred()?);
                }
                TokenKind::Keyword(Keyword::Open) => {
                    self.advance();
                    file.open_questions.push(self.parse_open_question()?);
                }
                other => {
                    return Err(self.error_here(format!(
                        "unexpected {} at top level",
                        describe_kind(&other)
                    )));
                }
            }
        }

        Ok(file)
    }

    fn parse_entity_like(&mut self) -> Result<EntityLike, ParseError> {
        let (name, loc) = self.expect_ident("declaration name")?;
        let fields = self.parse_fields_block()?;
        Ok(EntityLike { name, fields, loc })
    }

    fn parse_fields_block(&mut self) -> Result<Vec<Field>, ParseError> {
        self.expect_punct(Punct::LBrace)?;
        let mut fields = Vec::new();
        while !self.at_punct(Punct::RBrace) && !self.at_eof() {
            let (name, _) = self.expect_ident("field name")?;
            self.expect_punct(Punct::Colon)?;
            let (ty, ty_loc) = self.parse_type()?;
            fields.push(Field { name, ty, loc: ty_loc });
        }
        self.expect_punct(Punct::RBrace)?;
        Ok(fields)
    }

    fn parse_entity(&mut self) -> Result<Entity, ParseError> {
        let (name, loc) = self.expect_ident("entity name")?;
        self.expect_punct(Punct::LBrace)?;

        let mut fields = Vec::new();
        let mut relationships = Vec::new();
        let mut projections = Vec::new();
        let mut derived = Vec::new();

        while !self.at_punct(Punct::RBrace) && !self.at_eof() {
            let (member_name, member_loc) = self.expect_ident("member name")?;
            self.expect_punct(Punct::Colon)?;
            match self.classify_member() {
                MemberShape::Relationship => {
                    let (target, target_loc) = self.expect_ident("relationship target")?;
                    self.expect_keyword(Keyword::For)?;
                    self.expect_keyword(Keyword::This)?;
                    let (condition, _) = self.expect_ident("relationship condition")?;
                    relationships.push(Relationship {
                        name: member_name,
                        target,
                        condition,
                        loc: target_loc,
                    });
                }
                MemberShape::Projection => {
                    let (source, _) = self.expect_ident("projection source")?;
                    self.expect_keyword(Keyword::With)?;
                    let filter = self.parse_expr()?;
                    projections.push(Projection {
                        name: member_name,
                        source,
                        filter,
                        loc: member_loc,
                    });
                }
                MemberShape::Field => {
                    let (ty, ty_loc) = self.parse_type()?;
                    fields.push(Field { name: member_name, ty, loc: ty_loc });
                }
                MemberShape::Derived => {
                    let expr = self.parse_expr()?;
                    derived.push(Derived { name: member_name, expr, loc: member_loc });
                }
            }
        }

        self.expect_punct(Punct::RBrace)?;
        Ok(Entity { name, fields, relationships, projections, derived, loc })
    }

    /// Two-token lookahead disambiguation for entity members (spec
    /// §4.2's hotspot table). The member name and its colon have
    /// already been consumed; `self.cur_kind()` is the first token of
    /// the remainder.
    fn classify_member(&self) -> MemberShape {
        if self.at_ident() {
            match self.peek_kind(1) {
                TokenKind::Keyword(Keyword::For) => return MemberShape::Relationship,
                TokenKind::Keyword(Keyword::With) => return MemberShape::Projection,
                _ => {}
            }

            let is_collection_ident =
                matches!(self.cur_kind(), TokenKind::Ident(n) if n == "Set" || n == "List");
            let looks_like_type = matches!(
                self.peek_kind(1),
                TokenKind::Punct(Punct::RBrace)
                    | TokenKind::Eof
                    | TokenKind::Ident(_)
                    | TokenKind::Punct(Punct::Question)
                    | TokenKind::Punct(Punct::Pipe)
            ) || (is_collection_ident && matches!(self.peek_kind(1), TokenKind::Op(Op::Lt)));

            if looks_like_type {
                return MemberShape::Field;
            }
        }
        MemberShape::Derived
    }

    /// Parses a type expression, returning it alongside the location of
    /// the name that determines whether it resolves (the entity-ref's own
    /// token for a plain or optional reference, the element type's token
    /// for `Set`/`List`, since that is what a diagnostic on an unresolved
    /// reference should point at).
    fn parse_type(&mut self) -> Result<(TypeExpr, Loc), ParseError> {
        let (name, name_loc) = self.expect_ident("type")?;

        if (name == "Set" || name == "List") && matches!(self.cur_kind(), TokenKind::Op(Op::Lt)) {
            self.advance();
            let (inner, inner_loc) = self.parse_type()?;
            if !matches!(self.cur_kind(), TokenKind::Op(Op::Gt)) {
                return Err(self.error_here(format!(
                    "expected '>', found {}",
                    describe_kind(self.cur_kind())
                )));
            }
            self.advance();
            let collection = if name == "Set" {
                TypeExpr::Set(Box::new(inner))
            } else {
                TypeExpr::List(Box::new(inner))
            };
            return Ok((collection, inner_loc));
        }

        let base = if self.at_punct(Punct::Pipe) {
            let mut members = vec![name];
            while self.at_punct(Punct::Pipe) {
                self.advance();
                let (member, _) = self.expect_ident("enum member")?;
                members.push(member);
            }
            TypeExpr::Enum(members)
        } else {
            primitive_or_ref(&name)
        };

        if self.at_punct(Punct::Question) {
            self.advance();
            Ok((TypeExpr::Optional(Box::new(base)), name_loc))
        } else {
            Ok((base, name_loc))
        }
    }

    fn parse_default(&mut self) -> Result<DefaultDecl, ParseError> {
        let (name, loc) = self.expect_ident("default name")?;
        self.expect_punct(Punct::LBrace)?;
        let values = self.parse_kv_pairs(Punct::RBrace)?;
        self.expect_punct(Punct::RBrace)?;
        Ok(DefaultDecl { name, values, loc })
    }

    fn parse_deferred(&mut self) -> Result<Deferred, ParseError> {
        let (name, loc) = self.expect_ident("deferred specification name")?;
        let note = self.optional_string_note();
        Ok(Deferred { name, note, loc })
    }

    fn parse_open_question(&mut self) -> Result<OpenQuestion, ParseError> {
        self.expect_keyword(Keyword::Question)?;
        let (name, loc) = self.expect_ident("open question name")?;
        let note = self.optional_string_note();
        Ok(OpenQuestion { name, note, loc })
    }
}

enum MemberShape {
    Relationship,
    Projection,
    Field,
    Derived,
}

/// `String`, `Integer`, `Decimal`, `Boolean`, `Timestamp`, `Duration`,
/// `Email`, `URL` are recognised primitives (spec §4.2); anything else is
/// an entity reference.
fn primitive_or_ref(name: &str) -> TypeExpr {
    const PRIMITIVES: &[&str] = &[
        "String", "Integer", "Decimal", "Boolean", "Timestamp", "Duration", "Email", "URL",
    ];
    if PRIMITIVES.contains(&name) {
        TypeExpr::Primitive(name.to_string())
    } else {
        TypeExpr::EntityRef(name.to_string())
    }
}

fn punct_str(p: Punct) -> &'static str {
    match p {
        Punct::LBrace => "{",
        Punct::RBrace => "}",
        Punct::LParen => "(",
        Punct::RParen => ")",
        Punct::LBracket => "[",
        Punct::RBracket => "]",
        Punct::Colon => ":",
        Punct::Comma => ",",
        Punct::Pipe => "|",
        Punct::Question => "?",
        Punct::Dot => ".",
    }
}

/// Names the token kind actually seen, for syntax-error messages (spec
/// §4.2).
fn describe_kind(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Keyword(k) => format!("keyword '{}'", k.as_str()),
        TokenKind::Ident(name) => format!("identifier '{name}'"),
        TokenKind::Number(n) => format!("number '{n}'"),
        TokenKind::String(s) => format!("string '{s}'"),
        TokenKind::Punct(p) => format!("'{}'", punct_str(*p)),
        TokenKind::Op(op) => format!("'{}'", op_str(*op)),
        TokenKind::Eof => "end of file".to_string(),
    }
}

fn op_str(op: Op) -> &'static str {
    match op {
        Op::Plus => "+",
        Op::Minus => "-",
        Op::Star => "*",
        Op::Slash => "/",
        Op::Eq => "=",
        Op::FatArrow => "=>",
        Op::NotEq => "!=",
        Op::Le => "<=",
        Op::Ge => ">=",
        Op::Lt => "<",
        Op::Gt => ">",
        Op::Bang => "!",
    }
}
