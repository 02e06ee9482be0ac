//! Reference checker (spec §4.4): verifies every name in use resolves to
//! a declared type, a bound variable, or a builtin.

use std::collections::HashSet;

use super::{is_builtin, is_lowercase_ident};
use crate::ast::{AlliumFile, BinOp, Entity, EntityLike, Expr, Rule, Trigger, ARRAY_CALLEE};
use crate::infrastructure::diagnostics::Diagnostic;
use crate::infrastructure::editdistance::suggest;
use crate::lexer::Loc;
use crate::symbols::SymbolTable;

pub fn check(filename: &str, file: &AlliumFile, table: &SymbolTable) -> Vec<Diagnostic> {
    let mut checker = Checker {
        filename,
        table,
        bound: HashSet::new(),
        bound_order: Vec::new(),
        diagnostics: Vec::new(),
    };

    for decl in file.externals.iter().chain(file.values.iter()) {
        checker.check_entity_like(decl);
    }
    for entity in &file.entities {
        checker.check_entity(entity);
    }
    for rule in &file.rules {
        checker.check_rule(rule);
    }

    checker.diagnostics
}

struct Checker<'a> {
    filename: &'a str,
    table: &'a SymbolTable,
    /// Bound variables for the scope currently being walked. Cleared at
    /// the start of each rule and at the start of each entity's
    /// projection/derived phase (spec §4.4).
    bound: HashSet<String>,
    /// `bound`'s members in the order they were first bound, so
    /// suggestion candidates drawn from it are deterministic (spec §4.6).
    bound_order: Vec<String>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Checker<'a> {
    fn bind(&mut self, name: &str) {
        if self.bound.insert(name.to_string()) {
            self.bound_order.push(name.to_string());
        }
    }

    fn unbind(&mut self, name: &str) {
        if self.bound.remove(name) {
            if let Some(pos) = self.bound_order.iter().rposition(|n| n == name) {
                self.bound_order.remove(pos);
            }
        }
    }

    fn clear_bound(&mut self) {
        self.bound.clear();
        self.bound_order.clear();
    }

    fn check_entity_like(&mut self, decl: &EntityLike) {
        for field in &decl.fields {
            self.resolve_type(&field.ty, field.loc, "type");
        }
    }

    fn check_entity(&mut self, entity: &Entity) {
        self.clear_bound();

        for field in &entity.fields {
            self.resolve_type(&field.ty, field.loc, "entity");
        }

        for rel in &entity.relationships {
            if !self.table.types.contains_key(&rel.target) {
                self.emit_undefined_entity(&rel.target, rel.loc);
            }
        }

        for proj in &entity.projections {
            let is_relationship = entity.relationships.iter().any(|r| r.name == proj.source);
            if !is_relationship {
                self.emit_undefined_relationship(entity, &proj.source, proj.loc);
            }
        }

        for name in entity.all_member_names_ordered() {
            self.bind(&name);
        }
        for proj in &entity.projections {
            self.check_expr(&proj.filter, false);
        }
        for derived in &entity.derived {
            self.check_expr(&derived.expr, false);
        }

        self.clear_bound();
    }

    fn check_rule(&mut self, rule: &Rule) {
        self.clear_bound();

        match &rule.trigger {
            Trigger::Stimulus { params, .. } => {
                for p in params {
                    self.bind(&p.name);
                }
            }
            Trigger::StateChange { binding, entity, field, value, loc } => {
                if !self.table.types.contains_key(entity) {
                    self.emit_undefined_entity(entity, *loc);
                } else if !self.table.types[entity].members().contains_key(field) {
                    self.emit_undefined_field(entity, field, *loc);
                }
                self.bind(binding);
                self.check_expr(value, true);
            }
            Trigger::Created { binding, entity, loc } => {
                if !self.table.types.contains_key(entity) {
                    self.emit_undefined_entity(entity, *loc);
                }
                self.bind(binding);
            }
            Trigger::Temporal { expr, .. } | Trigger::Derived { expr, .. } => {
                self.check_expr(expr, false);
            }
            Trigger::Chained { params, .. } => {
                for p in params {
                    self.bind(p);
                }
            }
        }

        for binding in &rule.lets {
            self.check_expr(&binding.expr, false);
            self.bind(&binding.name);
        }
        for expr in &rule.requires {
            self.check_expr(expr, false);
        }
        for expr in &rule.ensures {
            self.check_expr(expr, false);
        }
    }

    /// `primitive`/`enum` are always valid; `entity-ref` resolves
    /// against the symbol table's types; wrappers delegate to their
    /// inner type using the containing field's location (spec §4.4).
    /// `category_word` is `"type"` for value/external fields and
    /// `"entity"` for entity fields, matching the two distinct
    /// diagnostic wordings in spec §7 (see `DESIGN.md`).
    fn resolve_type(&mut self, ty: &crate::ast::TypeExpr, field_loc: Loc, category_word: &str) {
        use crate::ast::TypeExpr;
        match ty {
            TypeExpr::Primitive(_) | TypeExpr::Enum(_) => {}
            TypeExpr::EntityRef(name) => {
                if !self.table.types.contains_key(name) {
                    let suggestion =
                        suggest(name, self.table.type_order.iter().map(String::as_str));
                    let mut d = Diagnostic::new(
                        self.filename,
                        field_loc,
                        format!("undefined {category_word} '{name}'"),
                    );
                    if let Some(s) = suggestion {
                        d = d.with_suggestion(s);
                    }
                    self.diagnostics.push(d);
                }
            }
            TypeExpr::Optional(inner) | TypeExpr::Set(inner) | TypeExpr::List(inner) => {
                self.resolve_type(inner, field_loc, category_word);
            }
        }
    }

    fn check_expr(&mut self, expr: &Expr, enum_ctx: bool) {
        match expr {
            Expr::Ident(name, loc) => {
                if self.bound.contains(name) || self.table.types.contains_key(name) || is_builtin(name)
                {
                    return;
                }
                if enum_ctx && is_lowercase_ident(name) {
                    return;
                }
                let pool: Vec<&str> = self
                    .bound_order
                    .iter()
                    .map(String::as_str)
                    .chain(self.table.type_order.iter().map(String::as_str))
                    .collect();
                let suggestion = suggest(name, pool);
                let mut d =
                    Diagnostic::new(self.filename, *loc, format!("undefined identifier '{name}'"));
                if let Some(s) = suggestion {
                    d = d.with_suggestion(s);
                }
                self.diagnostics.push(d);
            }
            Expr::Number(..) | Expr::Str(..) | Expr::Bool(..) | Expr::Null(_) => {}
            Expr::FieldAccess(obj, _field, _loc) => self.check_expr(obj, enum_ctx),
            Expr::Call(callee, args, _loc) => {
                self.check_expr(callee, enum_ctx);
                let is_array_call = matches!(&**callee, Expr::Ident(name, _) if name == ARRAY_CALLEE);
                for arg in args {
                    self.check_expr(arg, enum_ctx || is_array_call);
                }
            }
            Expr::Binary(op, left, right, _loc) => {
                self.check_expr(left, enum_ctx);
                let forces_enum_ctx = matches!(op, BinOp::Eq | BinOp::NotEq | BinOp::In);
                self.check_expr(right, enum_ctx || forces_enum_ctx);
            }
            Expr::Unary(_, operand, _loc) => self.check_expr(operand, enum_ctx),
            Expr::Lambda(param, body, _loc) => {
                let previously_present = self.bound.contains(param);
                self.bind(param);
                self.check_expr(body, enum_ctx);
                if !previously_present {
                    self.unbind(param);
                }
            }
            Expr::JoinLookup(entity, pairs, loc) => {
                if !self.table.types.contains_key(entity) {
                    self.emit_undefined_entity(entity, *loc);
                }
                for (_, value) in pairs {
                    self.check_expr(value, enum_ctx);
                }
            }
            Expr::EntityCreated(entity, pairs, loc) => {
                if !self.table.types.contains_key(entity) {
                    self.emit_undefined_entity(entity, *loc);
                }
                for (_, value) in pairs {
                    self.check_expr(value, true);
                }
            }
        }
    }

    fn emit_undefined_entity(&mut self, name: &str, loc: Loc) {
        let suggestion = suggest(name, self.table.type_order.iter().map(String::as_str));
        let mut d = Diagnostic::new(self.filename, loc, format!("undefined entity '{name}'"));
        if let Some(s) = suggestion {
            d = d.with_suggestion(s);
        }
        self.diagnostics.push(d);
    }

    fn emit_undefined_relationship(&mut self, entity: &Entity, name: &str, loc: Loc) {
        let names: Vec<&str> = entity.relationships.iter().map(|r| r.name.as_str()).collect();
        let suggestion = suggest(name, names);
        let mut d = Diagnostic::new(self.filename, loc, format!("undefined relationship '{name}'"));
        if let Some(s) = suggestion {
            d = d.with_suggestion(s);
        }
        self.diagnostics.push(d);
    }

    fn emit_undefined_field(&mut self, entity_name: &str, field: &str, loc: Loc) {
        let ordered = self.table.types[entity_name].members_ordered();
        let suggestion = suggest(field, ordered.iter().map(String::as_str));
        let mut d = Diagnostic::new(
            self.filename,
            loc,
            format!("undefined field '{field}' on entity '{entity_name}'"),
        );
        if let Some(s) = suggestion {
            d = d.with_suggestion(s);
        }
        self.diagnostics.push(d);
    }
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
    fn valid_spec_produces_no_reference_diagnostics() {
        let diags = diagnostics(
            "entity User { email: Email  status: active | suspended }\n\
             entity Post { author: User }\n\
             rule SuspendUser {\n\
               when: AdminSuspends(user)\n\
               ensures: user.status = suspended\n\
             }",
        );
        assert!(diags.is_empty(), "{diags:?}");
    }

    #[test]
    fn flags_undefined_entity_on_relationship_target() {
        let diags = diagnostics(
            "entity User { email: Email }\nentity Post { author: Usr for this authorship }",
        );
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "undefined entity 'Usr'");
        assert_eq!(diags[0].suggestion.as_deref(), Some("User"));
    }

    #[test]
    fn flags_undefined_type_on_value_field() {
        let diags = diagnostics("value Account { profile: Proflie }");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "undefined type 'Proflie'");
        assert_eq!(diags[0].suggestion, None);
    }

    #[test]
    fn flags_undefined_identifier_in_a_rule_with_suggestion() {
        let diags = diagnostics(
            "entity User { status: active | suspended }\n\
             rule R {\n\
               when: X(user)\n\
               requires: usr.exists\n\
               ensures: user.status = suspended\n\
             }",
        );
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "undefined identifier 'usr'");
        assert_eq!(diags[0].suggestion.as_deref(), Some("user"));
    }

    #[test]
    fn lambda_parameter_does_not_leak_outside_its_body() {
        let diags = diagnostics(
            "entity User { status: active | suspended }\n\
             rule R {\n\
               when: X(users)\n\
               ensures: users(u => u.status = active)\n\
               requires: u.status = active\n\
             }",
        );
        assert!(diags.iter().any(|d| d.message == "undefined identifier 'u'"));
    }

    #[test]
    fn enum_context_exempts_lowercase_identifier_on_rhs_of_equality() {
        let diags = diagnostics(
            "entity User { status: active | suspended }\n\
             rule R { when: X(user) ensures: user.status = suspended }",
        );
        assert!(diags.is_empty(), "{diags:?}");
    }
}
