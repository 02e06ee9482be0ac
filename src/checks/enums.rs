//! Enum-value checker (spec §4.5): verifies equality/assignment against
//! enum-typed fields names a declared member. Runs independently of the
//! reference checker and does not use a bound-variable set.

use super::is_lowercase_ident;
use crate::ast::{AlliumFile, BinOp, Expr, Trigger, TypeExpr};
use crate::infrastructure::diagnostics::Diagnostic;
use crate::infrastructure::editdistance::suggest;
use crate::lexer::Loc;
use crate::symbols::SymbolTable;

pub fn check(filename: &str, file: &AlliumFile, table: &SymbolTable) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    for rule in &file.rules {
        if let Trigger::StateChange { entity, field, value, .. } = &rule.trigger {
            check_direct_assignment(filename, table, entity, field, value, &mut diagnostics);
        }
        for expr in rule.requires.iter().chain(rule.ensures.iter()) {
            walk(filename, table, expr, &mut diagnostics);
        }
    }

    for entity in &file.entities {
        for derived in &entity.derived {
            walk(filename, table, &derived.expr, &mut diagnostics);
        }
        for projection in &entity.projections {
            walk(filename, table, &projection.filter, &mut diagnostics);
        }
    }

    diagnostics
}

/// Recurses through an expression collecting enum-comparison patterns
/// and entity-creation initialisers wherever they occur, not only at
/// the top level (spec §4.5).
fn walk(filename: &str, table: &SymbolTable, expr: &Expr, diagnostics: &mut Vec<Diagnostic>) {
    match expr {
        Expr::Binary(op, left, right, _loc) if matches!(op, BinOp::Eq | BinOp::NotEq) => {
            check_comparison(filename, table, left, right, diagnostics);
            check_comparison(filename, table, right, left, diagnostics);
            walk(filename, table, left, diagnostics);
            walk(filename, table, right, diagnostics);
        }
        Expr::Binary(_, left, right, _loc) => {
            walk(filename, table, left, diagnostics);
            walk(filename, table, right, diagnostics);
        }
        Expr::Unary(_, operand, _loc) => walk(filename, table, operand, diagnostics),
        Expr::FieldAccess(obj, _field, _loc) => walk(filename, table, obj, diagnostics),
        Expr::Call(callee, args, _loc) => {
            walk(filename, table, callee, diagnostics);
            for a in args {
                walk(filename, table, a, diagnostics);
            }
        }
        Expr::Lambda(_, body, _loc) => walk(filename, table, body, diagnostics),
        Expr::JoinLookup(_, pairs, _loc) => {
            for (_, v) in pairs {
                walk(filename, table, v, diagnostics);
            }
        }
        Expr::EntityCreated(entity, pairs, _loc) => {
            check_entity_creation(filename, table, entity, pairs, diagnostics);
            for (_, v) in pairs {
                walk(filename, table, v, diagnostics);
            }
        }
        Expr::Ident(..) | Expr::Number(..) | Expr::Str(..) | Expr::Bool(..) | Expr::Null(_) => {}
    }
}

/// The enum-comparison pattern: `left` is `object.field` where `object`
/// is a bare identifier naming a declared type, and `right` is an
/// identifier. Only the trivial bare-identifier object is resolved;
/// anything deeper is skipped silently (spec §4.5).
fn check_comparison(
    filename: &str,
    table: &SymbolTable,
    left: &Expr,
    right: &Expr,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let Expr::FieldAccess(object, field, _) = left else { return };
    let Expr::Ident(value, value_loc) = right else { return };
    let Expr::Ident(object_name, _) = object.as_ref() else { return };

    let Some(info) = resolve_bare_type(table, object_name) else { return };
    let Some(field_info) = info.fields().get(field) else { return };
    let Some(members) = enum_members(&field_info.ty) else { return };

    if members.iter().any(|m| m == value) {
        return;
    }

    // A lowercase-looking identifier with no plausible enum-member
    // reading is assumed to be a variable and left unflagged; one close
    // enough to a declared member (by edit distance) is still treated
    // as a likely typo and reported (see `DESIGN.md`).
    let suggestion = suggest(value, members.iter().map(String::as_str));
    if is_lowercase_ident(value) && suggestion.is_none() {
        return;
    }

    diagnostics.push(invalid_enum_diagnostic(filename, *value_loc, value, field, &members));
}

/// `entity-created` field initialisers: only flagged when a similarity
/// suggestion exists (spec §4.5's deliberate asymmetry).
fn check_entity_creation(
    filename: &str,
    table: &SymbolTable,
    entity: &str,
    pairs: &[(String, Expr)],
    diagnostics: &mut Vec<Diagnostic>,
) {
    let Some(info) = table.types.get(entity) else { return };
    for (field, value) in pairs {
        let Expr::Ident(name, loc) = value else { continue };
        let Some(field_info) = info.fields().get(field) else { continue };
        let Some(members) = enum_members(&field_info.ty) else { continue };
        if members.iter().any(|m| m == name) {
            continue;
        }
        if let Some(suggestion) = suggest(name, members.iter().map(String::as_str)) {
            diagnostics.push(
                invalid_enum_diagnostic(filename, *loc, name, field, &members)
                    .with_suggestion(suggestion),
            );
        }
    }
}

/// The state-change trigger's value, checked unconditionally on failure
/// (spec §4.5's "direct enum assignment").
fn check_direct_assignment(
    filename: &str,
    table: &SymbolTable,
    entity: &str,
    field: &str,
    value: &Expr,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let Expr::Ident(name, loc) = value else { return };
    let Some(info) = table.types.get(entity) else { return };
    let Some(field_info) = info.fields().get(field) else { return };
    let Some(members) = enum_members(&field_info.ty) else { return };
    if members.iter().any(|m| m == name) {
        return;
    }
    diagnostics.push(invalid_enum_diagnostic(filename, *loc, name, field, &members));
}

/// Resolves a bare identifier used as an enum-comparison's object to a
/// declared type. Tried verbatim first, then with its first letter
/// titlecased — rule bodies conventionally bind an entity's instance to
/// the lowercase of its type name (e.g. `user` for `User`), and spec.md
/// §8 scenario 5/6 rely on that convention resolving (see `DESIGN.md`).
fn resolve_bare_type<'a>(
    table: &'a SymbolTable,
    name: &str,
) -> Option<&'a crate::symbols::TypeInfo> {
    table.types.get(name).or_else(|| {
        let mut chars = name.chars();
        let titlecased = match chars.next() {
            Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
            None => return None,
        };
        table.types.get(&titlecased)
    })
}

fn enum_members(ty: &TypeExpr) -> Option<Vec<String>> {
    match ty {
        TypeExpr::Enum(members) => Some(members.clone()),
        TypeExpr::Optional(inner) | TypeExpr::Set(inner) | TypeExpr::List(inner) => {
            enum_members(inner)
        }
        _ => None,
    }
}

fn invalid_enum_diagnostic(
    filename: &str,
    loc: Loc,
    value: &str,
    field: &str,
    members: &[String],
) -> Diagnostic {
    let expected = members.join(" | ");
    let mut d = Diagnostic::new(
        filename,
        loc,
        format!("invalid enum value '{value}' for field '{field}' (expected: {expected})"),
    );
    if let Some(s) = suggest(value, members.iter().map(String::as_str)) {
        d = d.with_suggestion(s);
    }
    d
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::symbols::SymbolTable;

    fn diagnostics(source: &str) -> Vec<Diagnostic> {
        let file = parse("t.allium", source).unwrap();
        let table = SymbolTable::build(&file);
        check("t.allium", &file, &table)
    }

    #[test]
    fn flags_invalid_enum_value_on_state_change() {
        let diags = diagnostics(
            "entity User { status: active | suspended }\n\
             rule Suspend { when: u: User.status becomes suspendd ensures: true }",
        );
        assert_eq!(diags.len(), 1);
        assert_eq!(
            diags[0].message,
            "invalid enum value 'suspendd' for field 'status' (expected: active | suspended)"
        );
        assert_eq!(diags[0].suggestion.as_deref(), Some("suspended"));
    }

    #[test]
    fn flags_invalid_enum_value_in_equality_comparison() {
        let diags = diagnostics(
            "entity User { status: active | suspended }\n\
             rule R { when: X(user) ensures: user.status = suspendd }",
        );
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].suggestion.as_deref(), Some("suspended"));
    }

    #[test]
    fn accepts_lowercase_identifier_as_a_bound_variable_not_an_enum_typo() {
        let diags = diagnostics(
            "entity User { status: active | suspended }\n\
             rule R { when: X(user, other_user) ensures: user.status = other_user }",
        );
        assert!(diags.is_empty(), "{diags:?}");
    }

    #[test]
    fn entity_creation_only_flags_when_a_suggestion_exists() {
        let diags = diagnostics(
            "entity User { status: active | suspended }\n\
             rule R { when: X(user) ensures: user = User.created(status: suspendd) }",
        );
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].suggestion.as_deref(), Some("suspended"));
    }

    #[test]
    fn entity_creation_does_not_flag_an_implausible_identifier() {
        let diags = diagnostics(
            "entity User { status: active | suspended }\n\
             rule R { when: X(user) ensures: user = User.created(status: somethingElseEntirely) }",
        );
        assert!(diags.is_empty(), "{diags:?}");
    }
}
