//! Diagnostics and their wire format (spec §3, §6).

use std::fmt;

use crate::lexer::Loc;

/// A single reportable issue. `suggestion`, when present, names one
/// candidate the checker believes the author meant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub file: String,
    pub line: u32,
    pub col: u32,
    pub message: String,
    pub suggestion: Option<String>,
}

impl Diagnostic {
    pub fn new(file: impl Into<String>, loc: Loc, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line: loc.line,
            col: loc.col,
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    /// `<file>:<line>:<col>: <message>[ (did you mean '<suggestion>'?)]`
    /// (spec §6, wire-exact).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}: {}", self.file, self.line, self.col, self.message)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, " (did you mean '{suggestion}'?)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_without_suggestion() {
        let d = Diagnostic::new("foo.allium", Loc::new(4, 14), "undefined type 'Proflie'");
        assert_eq!(d.to_string(), "foo.allium:4:14: undefined type 'Proflie'");
    }

    #[test]
    fn renders_with_suggestion() {
        let d = Diagnostic::new("foo.allium", Loc::new(8, 23), "undefined entity 'Usr'")
            .with_suggestion("User");
        assert_eq!(
            d.to_string(),
            "foo.allium:8:23: undefined entity 'Usr' (did you mean 'User'?)"
        );
    }
}
