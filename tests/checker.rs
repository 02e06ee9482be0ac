//! Library-level integration tests: the six concrete end-to-end scenarios
//! and the universal invariants from the checking contract.

use allium_check::check;

#[test]
fn valid_spec_with_two_entities_and_one_rule_is_clean() {
    let source = "entity User { email: Email  status: active | suspended }\n\
                  entity Post { author: User }\n\
                  rule SuspendUser {\n\
                    when: AdminSuspends(user)\n\
                    ensures: user.status = suspended\n\
                  }";
    assert!(check("foo.allium", source).is_empty());
}

#[test]
fn typo_in_a_field_type_has_no_suggestion() {
    let source = "value Unrelated { a: String }\n\
                  value Other { b: Integer }\n\
                  value Account {\n\
                  profile: Proflie\n\
                  }";
    let diags = check("foo.allium", source);
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].message, "undefined type 'Proflie'");
    assert_eq!(diags[0].suggestion, None);
    assert_eq!(diags[0].line, 4);
    assert_eq!(diags[0].col, 10);
}

#[test]
fn entity_reference_with_a_close_typo_suggests_the_declared_name() {
    let source = "entity User { email: Email }\n\
                  entity Post { author: Usr for this authorship }";
    let diags = check("foo.allium", source);
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].message, "undefined entity 'Usr'");
    assert_eq!(diags[0].suggestion.as_deref(), Some("User"));
}

#[test]
fn undefined_identifier_in_a_rule_suggests_the_bound_variable() {
    let source = "entity User { status: active | suspended }\n\
                  rule R {\n\
                    when: X(user)\n\
                    requires: usr.exists\n\
                    ensures: user.status = suspended\n\
                  }";
    let diags = check("foo.allium", source);
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].message, "undefined identifier 'usr'");
    assert_eq!(diags[0].suggestion.as_deref(), Some("user"));
}

#[test]
fn invalid_enum_member_on_state_change_is_flagged_with_a_suggestion() {
    let source = "entity User { status: active | suspended }\n\
                  rule Suspend {\n\
                    when: u: User.status becomes suspendd\n\
                    ensures: true\n\
                  }";
    let diags = check("foo.allium", source);
    assert_eq!(diags.len(), 1);
    assert_eq!(
        diags[0].message,
        "invalid enum value 'suspendd' for field 'status' (expected: active | suspended)"
    );
    assert_eq!(diags[0].suggestion.as_deref(), Some("suspended"));
}

#[test]
fn enum_assignment_with_a_plausible_variable_rhs_is_not_flagged() {
    let source = "entity User { status: active | suspended }\n\
                  rule R {\n\
                    when: X(user, other_user)\n\
                    ensures: user.status = other_user\n\
                  }";
    assert!(check("foo.allium", source).is_empty());
}

#[test]
fn parse_error_yields_exactly_one_diagnostic() {
    let diags = check("foo.allium", "entity User { email: Email ");
    assert_eq!(diags.len(), 1);
}

#[test]
fn every_diagnostic_location_is_a_real_in_range_position() {
    let source = "value Account { profile: Proflie }";
    let diags = check("foo.allium", source);
    for d in &diags {
        assert!(d.line >= 1);
        assert!(d.col >= 1);
    }
}

#[test]
fn every_suggestion_is_within_edit_distance_two() {
    use allium_check::infrastructure::editdistance::distance;

    let source = "entity User { email: Email }\n\
                  entity Post { author: Usr for this authorship }";
    let diags = check("foo.allium", source);
    for d in &diags {
        if let Some(s) = &d.suggestion {
            let queried = d.message.split('\'').nth(1).unwrap();
            assert!(distance(queried, s) <= 2);
        }
    }
}
