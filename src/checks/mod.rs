//! The two semantic passes: reference resolution and enum-value
//! validation (spec §4.4, §4.5). Both are total functions over an
//! already-parsed [`crate::ast::AlliumFile`]; neither returns a
//! `Result`.

pub mod enums;
pub mod reference;

use std::sync::OnceLock;

/// Names treated as predefined regardless of what the file declares
/// (spec §4.4). Any identifier beginning with the literal prefix
/// `config/` is also a builtin — checked separately by callers.
const BUILTINS: &[&str] = &["now", "true", "false", "null", "verify", "send", "notify", "__array"];

pub(crate) fn is_builtin(name: &str) -> bool {
    BUILTINS.contains(&name) || name.starts_with("config/")
}

static LOWERCASE_IDENT: OnceLock<regex::Regex> = OnceLock::new();

/// The enum-context exemption pattern: a lowercase letter followed by
/// zero or more lowercase letters or underscores (spec §4.4, §4.5).
/// Compiled once and cached, since this runs once per identifier visited
/// by either checker.
pub(crate) fn is_lowercase_ident(name: &str) -> bool {
    let re = LOWERCASE_IDENT
        .get_or_init(|| regex::Regex::new(r"^[a-z][a-z_]*$").expect("static pattern is valid"));
    re.is_match(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_builtins_and_config_prefix() {
        assert!(is_builtin("now"));
        assert!(is_builtin("__array"));
        assert!(is_builtin("config/retryLimit"));
        assert!(!is_builtin("User"));
    }

    #[test]
    fn lowercase_ident_pattern_matches_snake_case_only() {
        assert!(is_lowercase_ident("suspended"));
        assert!(is_lowercase_ident("active_user"));
        assert!(!is_lowercase_ident("Suspended"));
        assert!(!is_lowercase_ident("user1"));
        assert!(!is_lowercase_ident(""));
    }
}
