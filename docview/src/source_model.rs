//! Source model for the parsing stage
//!
//! This module defines the document tree produced from a Markdown file
//! with the viewer's extensions (directives, labels, references) and the
//! parser that builds it. The transformation passes in
//! [`crate::transform`] rewrite this tree in place.

// Submodules
pub mod blocks;
pub mod directive;
pub mod fence;
pub mod inline;
pub mod parser;
pub mod types;

// Re-export public types
pub use blocks::{Block, ListItem};
pub use directive::{DirectiveContent, DirectiveKind, DirectiveName, DirectiveNode, Spacing};
pub use inline::{plain_text, Inline, Link};
pub use types::{Alignment, Attributes};

/// A parsed Markdown document
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    /// Top-level blocks in reading order
    pub blocks: Vec<Block>,
}

impl Document {
    /// Parse Markdown source (with directive extensions) into a document
    ///
    /// # Parameters
    /// * `source` - Raw Markdown text
    ///
    /// # Returns
    /// * `Document` - The parsed tree; parsing never fails
    pub fn parse(source: &str) -> Self {
        Self {
            blocks: parser::parse_document(source),
        }
    }

    /// Whether the document has no content at all
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Plain text of the first heading, at any level
    pub fn first_heading_text(&self) -> Option<String> {
        self.blocks.iter().find_map(|block| match block {
            Block::Heading { content, .. } => Some(plain_text(content).trim().to_string()),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_source_is_empty_document() {
        assert!(Document::parse("").is_empty());
        assert!(Document::parse("\n\n  \n").is_empty());
    }

    #[test]
    fn test_first_heading_text() {
        let document = Document::parse("Intro\n\n## Second *level*\n\n# First\n");
        assert_eq!(
            document.first_heading_text().as_deref(),
            Some("Second level")
        );
    }
}
