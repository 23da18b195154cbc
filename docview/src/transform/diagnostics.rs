//! Non-fatal conditions observed while transforming a document

use std::fmt;

/// A recoverable problem found in a document
///
/// Diagnostics never change the rendered output; they are collected so
/// callers such as `docview check` can report them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A reference to a label that was never declared
    UnresolvedReference { id: String },

    /// A footnote reference with no matching definition
    MissingAnnotation { identifier: String },

    /// A label declared more than once (the first declaration is kept)
    DuplicateLabel { id: String },

    /// A directive closer with no matching opener
    StrayDirectiveCloser,

    /// A formula that could not be typeset
    MathFailed { source: String, message: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnresolvedReference { id } => {
                write!(f, "unresolved reference: @{}", id)
            }
            Diagnostic::MissingAnnotation { identifier } => {
                write!(f, "annotation definition not found: {}", identifier)
            }
            Diagnostic::DuplicateLabel { id } => {
                write!(f, "duplicate label (first declaration kept): {}", id)
            }
            Diagnostic::StrayDirectiveCloser => write!(f, "stray directive closer removed"),
            Diagnostic::MathFailed { source, message } => {
                write!(f, "math typesetting failed for `{}`: {}", source, message)
            }
        }
    }
}

/// Ordered list of diagnostics for one document
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
    quiet: bool,
}

impl Diagnostics {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a list that records without logging
    pub fn quiet() -> Self {
        Self {
            entries: Vec::new(),
            quiet: true,
        }
    }

    /// Record a diagnostic and log it as a warning
    pub fn push(&mut self, diagnostic: Diagnostic) {
        if !self.quiet {
            log::warn!("{}", diagnostic);
        }
        self.entries.push(diagnostic);
    }

    /// Whether nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Recorded diagnostics in order
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// Take the recorded diagnostics
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let unresolved = Diagnostic::UnresolvedReference {
            id: "sec-x".to_string(),
        };
        assert_eq!(unresolved.to_string(), "unresolved reference: @sec-x");

        let missing = Diagnostic::MissingAnnotation {
            identifier: "n1".to_string(),
        };
        assert_eq!(missing.to_string(), "annotation definition not found: n1");
    }

    #[test]
    fn test_push_keeps_order() {
        let mut diagnostics = Diagnostics::new();
        assert!(diagnostics.is_empty());

        diagnostics.push(Diagnostic::StrayDirectiveCloser);
        diagnostics.push(Diagnostic::DuplicateLabel {
            id: "a".to_string(),
        });

        let entries = diagnostics.into_vec();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], Diagnostic::StrayDirectiveCloser);
    }
}
