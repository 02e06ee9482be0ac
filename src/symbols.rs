//! Symbol table construction: a dedicated pass over a parsed
//! [`AlliumFile`] that both checkers consult (spec §4.3).
//!
//! Top-level names are not required to be unique. When two declarations
//! share a name, the later one silently overwrites the earlier in every
//! index below — a deliberate `HashMap::insert` semantics, not an error
//! (see `DESIGN.md`, open question (c)).

use std::collections::HashMap;

use crate::ast::{AlliumFile, Entity, Field, MemberKind, TypeExpr};

/// What a top-level name resolves to: either a plain fields-only
/// declaration (`external`/`value`) or a full entity.
#[derive(Debug, Clone)]
pub enum TypeInfo {
    Plain { fields: HashMap<String, FieldInfo>, field_order: Vec<String> },
    Entity { fields: HashMap<String, FieldInfo>, entity: Entity },
}

impl TypeInfo {
    pub fn fields(&self) -> &HashMap<String, FieldInfo> {
        match self {
            TypeInfo::Plain { fields, .. } | TypeInfo::Entity { fields, .. } => fields,
        }
    }

    /// All member names and kinds, for entities; `Field` for everything
    /// else's fields.
    pub fn members(&self) -> HashMap<String, MemberKind> {
        match self {
            TypeInfo::Plain { fields, .. } => {
                fields.keys().map(|n| (n.clone(), MemberKind::Field)).collect()
            }
            TypeInfo::Entity { entity, .. } => entity.all_members(),
        }
    }

    /// All member names in declaration order — the deterministic
    /// candidate sequence `did you mean` suggestions are drawn from
    /// (spec §4.6).
    pub fn members_ordered(&self) -> Vec<String> {
        match self {
            TypeInfo::Plain { field_order, .. } => field_order.clone(),
            TypeInfo::Entity { entity, .. } => entity.all_member_names_ordered(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldInfo {
    pub ty: TypeExpr,
}

/// Indexes over a parsed file, used by both the reference checker and
/// the enum checker. `type_order` mirrors `types`' keys in declaration
/// order, so suggestion candidates can be drawn deterministically
/// instead of from `HashMap`'s randomized iteration (spec §4.6, §8).
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    pub types: HashMap<String, TypeInfo>,
    pub type_order: Vec<String>,
    pub defaults: std::collections::HashSet<String>,
    pub rules: std::collections::HashSet<String>,
}

impl SymbolTable {
    pub fn build(file: &AlliumFile) -> Self {
        let mut types = HashMap::new();
        let mut type_order = Vec::new();

        for decl in file.externals.iter().chain(file.values.iter()) {
            types.insert(
                decl.name.clone(),
                TypeInfo::Plain {
                    fields: field_map(&decl.fields),
                    field_order: decl.fields.iter().map(|f| f.name.clone()).collect(),
                },
            );
            type_order.push(decl.name.clone());
        }

        for entity in &file.entities {
            types.insert(
                entity.name.clone(),
                TypeInfo::Entity { fields: field_map(&entity.fields), entity: entity.clone() },
            );
            type_order.push(entity.name.clone());
        }

        let defaults = file.defaults.iter().map(|d| d.name.clone()).collect();
        let rules = file.rules.iter().map(|r| r.name.clone()).collect();

        Self { types, type_order, defaults, rules }
    }

    pub fn is_entity(&self, name: &str) -> bool {
        matches!(self.types.get(name), Some(TypeInfo::Entity { .. }))
    }

    pub fn entity(&self, name: &str) -> Option<&Entity> {
        match self.types.get(name) {
            Some(TypeInfo::Entity { entity, .. }) => Some(entity),
            _ => None,
        }
    }
}

fn field_map(fields: &[Field]) -> HashMap<String, FieldInfo> {
    let mut map = HashMap::new();
    for f in fields {
        map.insert(f.name.clone(), FieldInfo { ty: f.ty.clone() });
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn later_declaration_overwrites_earlier_with_the_same_name() {
        let file = parse(
            "t.allium",
            "value Money { amount: Decimal }\n\
             value Money { cents: Integer }",
        )
        .unwrap();
        let table = SymbolTable::build(&file);
        let fields = table.types["Money"].fields();
        assert!(!fields.contains_key("amount"));
        assert!(fields.contains_key("cents"));
    }

    #[test]
    fn entity_members_merge_across_categories() {
        let file = parse(
            "t.allium",
            "entity User { email: Email }\n\
             entity Post {\n\
               author: User for this authorship\n\
               title: String\n\
             }",
        )
        .unwrap();
        let table = SymbolTable::build(&file);
        assert!(table.is_entity("Post"));
        let members = table.types["Post"].members();
        assert_eq!(members["author"], MemberKind::Relationship);
        assert_eq!(members["title"], MemberKind::Field);
    }
}
