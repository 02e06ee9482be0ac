//! Abstract syntax tree produced by [`crate::parser`].
//!
//! The tree is rooted at [`AlliumFile`] and is immutable once built (spec
//! §3). Every node carries a [`Loc`]. Names are plain `String`s compared
//! exactly as written (spec §9: "no interning... string equality
//! semantics must match the source").

use crate::lexer::Loc;

/// The root of a parsed source file.
#[derive(Debug, Clone)]
pub struct AlliumFile {
    pub externals: Vec<EntityLike>,
    pub values: Vec<EntityLike>,
    pub entities: Vec<Entity>,
    pub defaults: Vec<DefaultDecl>,
    pub rules: Vec<Rule>,
    pub deferred: Vec<Deferred>,
    pub open_questions: Vec<OpenQuestion>,
    pub loc: Loc,
}

/// An `external entity` or `value` declaration: a name plus an ordered
/// list of fields, nothing more (unlike [`Entity`], which additionally
/// carries relationships, projections, and derived values).
#[derive(Debug, Clone)]
pub struct EntityLike {
    pub name: String,
    pub fields: Vec<Field>,
    pub loc: Loc,
}

/// A full `entity` declaration.
#[derive(Debug, Clone)]
pub struct Entity {
    pub name: String,
    pub fields: Vec<Field>,
    pub relationships: Vec<Relationship>,
    pub projections: Vec<Projection>,
    pub derived: Vec<Derived>,
    pub loc: Loc,
}

/// A named member of an entity-like declaration's fields block. `loc` is
/// the location of the type expression itself (what diagnostics about an
/// unresolved reference point at), not the field name.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub ty: TypeExpr,
    pub loc: Loc,
}

/// A type expression as it appears after the colon in a field
/// declaration.
#[derive(Debug, Clone)]
pub enum TypeExpr {
    Primitive(String),
    EntityRef(String),
    Enum(Vec<String>),
    Optional(Box<TypeExpr>),
    Set(Box<TypeExpr>),
    List(Box<TypeExpr>),
}

/// A named navigation from an entity to another entity:
/// `name : Target for this condition`. `loc` is the location of `Target`.
#[derive(Debug, Clone)]
pub struct Relationship {
    pub name: String,
    pub target: String,
    pub condition: String,
    pub loc: Loc,
}

/// A filtered view of a relationship: `name : source with <filter-expr>`.
#[derive(Debug, Clone)]
pub struct Projection {
    pub name: String,
    pub source: String,
    pub filter: Expr,
    pub loc: Loc,
}

/// A computed entity member: `name : <expression>`.
#[derive(Debug, Clone)]
pub struct Derived {
    pub name: String,
    pub expr: Expr,
    pub loc: Loc,
}

/// `default Name { field: value, ... }` — indexed by name but never
/// cross-checked (spec §4.3).
#[derive(Debug, Clone)]
pub struct DefaultDecl {
    pub name: String,
    pub values: Vec<(String, Expr)>,
    pub loc: Loc,
}

/// `deferred Name ["note"]` — indexed by name but never cross-checked.
#[derive(Debug, Clone)]
pub struct Deferred {
    pub name: String,
    pub note: Option<String>,
    pub loc: Loc,
}

/// `open question Name ["note"]` — indexed by name but never
/// cross-checked.
#[derive(Debug, Clone)]
pub struct OpenQuestion {
    pub name: String,
    pub note: Option<String>,
    pub loc: Loc,
}

/// A rule: a trigger, ordered `let` bindings, `requires` expressions,
/// and `ensures` expressions.
#[derive(Debug, Clone)]
pub struct Rule {
    pub name: String,
    pub trigger: Trigger,
    pub lets: Vec<LetBinding>,
    pub requires: Vec<Expr>,
    pub ensures: Vec<Expr>,
    pub loc: Loc,
}

/// `let name : <expr>` inside a rule body.
#[derive(Debug, Clone)]
pub struct LetBinding {
    pub name: String,
    pub expr: Expr,
    pub loc: Loc,
}

/// A stimulus-trigger parameter: `ident` or `ident?`.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub optional: bool,
}

/// The condition under which a rule fires.
#[derive(Debug, Clone)]
pub enum Trigger {
    Stimulus { name: String, params: Vec<Param>, loc: Loc },
    StateChange { binding: String, entity: String, field: String, value: Expr, loc: Loc },
    Created { binding: String, entity: String, loc: Loc },
    Temporal { expr: Expr, loc: Loc },
    Derived { expr: Expr, loc: Loc },
    /// Reserved: no parser production constructs this today. See
    /// `DESIGN.md`, open question (a).
    Chained { name: String, params: Vec<String>, loc: Loc },
}

impl Trigger {
    pub fn loc(&self) -> Loc {
        match self {
            Trigger::Stimulus { loc, .. }
            | Trigger::StateChange { loc, .. }
            | Trigger::Created { loc, .. }
            | Trigger::Temporal { loc, .. }
            | Trigger::Derived { loc, .. }
            | Trigger::Chained { loc, .. } => *loc,
        }
    }
}

/// Binary operators, ordered here by ascending precedence (see
/// `parser::expr`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Or,
    And,
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    With,
    Add,
    Sub,
    Mul,
    Div,
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Not,
    Neg,
}

/// Name for the synthetic callee used to represent a bracketed array
/// literal as a call (spec §4.2).
pub const ARRAY_CALLEE: &str = "__array";

/// An expression. A bare lowercase-looking identifier is not
/// syntactically distinguished from an enum-member reference — the
/// distinction is made by the checkers from context (spec §4.4's "enum
/// context" flag), so there is no separate enum-value-literal
/// constructor: both read as `Expr::Ident`.
#[derive(Debug, Clone)]
pub enum Expr {
    Ident(String, Loc),
    Number(String, Loc),
    Str(String, Loc),
    Bool(bool, Loc),
    Null(Loc),
    FieldAccess(Box<Expr>, String, Loc),
    Call(Box<Expr>, Vec<Expr>, Loc),
    Binary(BinOp, Box<Expr>, Box<Expr>, Loc),
    Unary(UnOp, Box<Expr>, Loc),
    Lambda(String, Box<Expr>, Loc),
    JoinLookup(String, Vec<(String, Expr)>, Loc),
    EntityCreated(String, Vec<(String, Expr)>, Loc),
}

impl Expr {
    pub fn loc(&self) -> Loc {
        match self {
            Expr::Ident(_, loc)
            | Expr::Number(_, loc)
            | Expr::Str(_, loc)
            | Expr::Bool(_, loc)
            | Expr::Null(loc)
            | Expr::FieldAccess(_, _, loc)
            | Expr::Call(_, _, loc)
            | Expr::Binary(_, _, _, loc)
            | Expr::Unary(_, _, loc)
            | Expr::Lambda(_, _, loc)
            | Expr::JoinLookup(_, _, loc)
            | Expr::EntityCreated(_, _, loc) => *loc,
        }
    }
}

/// Union of an entity's members: field, relationship, projection, or
/// derived value (spec's "getAllMembers").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Field,
    Relationship,
    Projection,
    Derived,
}

impl Entity {
    /// Returns a mapping from member name to its category. Collisions
    /// across categories are resolved by later insertion overwriting
    /// earlier, in precedence order field, relationship, projection,
    /// derived (spec §3).
    pub fn all_members(&self) -> std::collections::HashMap<String, MemberKind> {
        let mut members = std::collections::HashMap::new();
        for f in &self.fields {
            members.insert(f.name.clone(), MemberKind::Field);
        }
        for r in &self.relationships {
            members.insert(r.name.clone(), MemberKind::Relationship);
        }
        for p in &self.projections {
            members.insert(p.name.clone(), MemberKind::Projection);
        }
        for d in &self.derived {
            members.insert(d.name.clone(), MemberKind::Derived);
        }
        members
    }

    /// All member names in declaration order (fields, then
    /// relationships, then projections, then derived), for callers that
    /// need a deterministic candidate sequence rather than the category
    /// lookup `all_members` provides.
    pub fn all_member_names_ordered(&self) -> Vec<String> {
        let mut names = Vec::new();
        names.extend(self.fields.iter().map(|f| f.name.clone()));
        names.extend(self.relationships.iter().map(|r| r.name.clone()));
        names.extend(self.projections.iter().map(|p| p.name.clone()));
        names.extend(self.derived.iter().map(|d| d.name.clone()));
        names
    }
}
