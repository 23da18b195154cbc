//! Block-level markdown elements

use super::directive::{DirectiveKind, DirectiveNode};
use super::inline::{plain_text, Inline};
use super::types::{Alignment, Attributes};

/// Block-level markdown element
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Heading with level (1-6)
    Heading {
        level: u8,
        content: Vec<Inline>,
        attrs: Attributes,
    },

    /// Paragraph
    Paragraph(Vec<Inline>),

    /// Fenced or indented code block
    CodeBlock {
        /// Info string language, if any
        language: Option<String>,
        code: String,
    },

    /// Block quote
    BlockQuote(Vec<Block>),

    /// Ordered (`start` is set) or bullet list
    List {
        start: Option<u64>,
        items: Vec<ListItem>,
        attrs: Attributes,
    },

    /// GFM table
    Table {
        alignments: Vec<Alignment>,
        headers: Vec<Vec<Inline>>,
        rows: Vec<Vec<Vec<Inline>>>,
    },

    /// Thematic break
    Rule,

    /// Raw HTML block (never rendered)
    Html(String),

    /// Classic footnote definition (`[^id]: ...`)
    FootnoteDefinition { label: String, content: Vec<Block> },

    /// Container or leaf directive
    Directive(DirectiveNode),
}

/// List item
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListItem {
    /// Task list state (`Some(true)` for `[x]`)
    pub task: Option<bool>,

    /// Item content
    pub content: Vec<Block>,

    /// Output attributes (annotation entries carry an id)
    pub attrs: Attributes,
}

impl ListItem {
    /// Create a plain list item from blocks
    pub fn new(content: Vec<Block>) -> Self {
        Self {
            task: None,
            content,
            attrs: Attributes::new(),
        }
    }
}

impl Block {
    /// Create a heading without output attributes
    pub fn heading(level: u8, content: Vec<Inline>) -> Self {
        Block::Heading {
            level,
            content,
            attrs: Attributes::new(),
        }
    }

    /// Whether this is a container directive
    pub fn is_container_directive(&self) -> bool {
        matches!(self, Block::Directive(directive) if directive.kind == DirectiveKind::Container)
    }
}

/// Plain text of the first paragraph found in `blocks`, depth first
///
/// Used as the preview summary of annotations.
pub fn first_paragraph_text(blocks: &[Block]) -> Option<String> {
    for block in blocks {
        let found = match block {
            Block::Paragraph(inlines) => Some(plain_text(inlines).trim().to_string()),
            Block::BlockQuote(children) | Block::FootnoteDefinition { content: children, .. } => {
                first_paragraph_text(children)
            }
            Block::List { items, .. } => items
                .iter()
                .find_map(|item| first_paragraph_text(&item.content)),
            Block::Directive(directive) => first_paragraph_text(directive.blocks()),
            _ => None,
        };
        if found.is_some() {
            return found;
        }
    }
    None
}
