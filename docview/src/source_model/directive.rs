//! Directive nodes and the directive attribute micro-syntax
//!
//! Directives come in three shapes:
//!
//! ```text
//! :::column{label=sec-a}     container, block content, closed by `:::`
//! ::note[inline content]     leaf, a single line of inline content
//! :annotation[aside]{.x}     text, inline inside running prose
//! ```

use super::blocks::Block;
use super::inline::{plain_text, Inline};
use super::types::Attributes;
use std::collections::BTreeMap;

/// Shape of a directive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    /// Fenced block directive (`:::name` .. `:::`)
    Container,
    /// Single-line block directive (`::name[..]`)
    Leaf,
    /// Inline directive (`:name[..]`)
    Text,
}

impl DirectiveKind {
    /// HTML element the directive renders as
    pub fn tag(&self) -> &'static str {
        match self {
            DirectiveKind::Container | DirectiveKind::Leaf => "div",
            DirectiveKind::Text => "span",
        }
    }
}

/// Known directive names
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectiveName {
    /// Side column / callout box
    Column,
    /// Column that also contributes a TOC entry
    ColumnToc,
    /// Inline aside hoisted into the notes section
    Annotation,
    /// Any other name, rendered generically
    Other(String),
}

impl DirectiveName {
    /// Map a source name onto the closed set of known directives
    pub fn parse(name: &str) -> Self {
        match name {
            "column" => DirectiveName::Column,
            "column-toc" => DirectiveName::ColumnToc,
            "annotation" => DirectiveName::Annotation,
            other => DirectiveName::Other(other.to_string()),
        }
    }

    /// Name as written in the source
    pub fn as_str(&self) -> &str {
        match self {
            DirectiveName::Column => "column",
            DirectiveName::ColumnToc => "column-toc",
            DirectiveName::Annotation => "annotation",
            DirectiveName::Other(name) => name,
        }
    }

    /// Name used for the `directive-<name>` class
    ///
    /// `column-toc` styles exactly like `column`.
    pub fn class_name(&self) -> &str {
        match self {
            DirectiveName::ColumnToc => "column",
            other => other.as_str(),
        }
    }

    /// Whether this is one of the column variants
    pub fn is_column(&self) -> bool {
        matches!(self, DirectiveName::Column | DirectiveName::ColumnToc)
    }
}

/// Child content of a directive
#[derive(Debug, Clone, PartialEq)]
pub enum DirectiveContent {
    /// Block children (container directives)
    Blocks(Vec<Block>),
    /// Inline children (leaf and text directives)
    Inlines(Vec<Inline>),
}

/// Blank-line context of a block directive in its parent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Spacing {
    /// A blank line (or the start of the parent) precedes the opener
    pub blank_before: bool,
    /// A blank line (or the end of the parent) follows the closer
    pub blank_after: bool,
}

/// A directive in the document tree
#[derive(Debug, Clone, PartialEq)]
pub struct DirectiveNode {
    /// Container, leaf or text
    pub kind: DirectiveKind,

    /// Directive name
    pub name: DirectiveName,

    /// Source attributes from the `{..}` block
    pub attributes: BTreeMap<String, String>,

    /// Child content
    pub content: DirectiveContent,

    /// Blank-line context (block directives only)
    pub spacing: Spacing,

    /// Output attributes synthesized by the transformation passes
    pub attrs: Attributes,

    /// Title extracted from `@title:` metadata
    pub title: Option<String>,
}

impl DirectiveNode {
    /// Create a container directive
    pub fn container(
        name: &str,
        attributes: BTreeMap<String, String>,
        blocks: Vec<Block>,
        spacing: Spacing,
    ) -> Self {
        Self {
            kind: DirectiveKind::Container,
            name: DirectiveName::parse(name),
            attributes,
            content: DirectiveContent::Blocks(blocks),
            spacing,
            attrs: Attributes::new(),
            title: None,
        }
    }

    /// Create a leaf directive
    pub fn leaf(
        name: &str,
        attributes: BTreeMap<String, String>,
        inlines: Vec<Inline>,
        spacing: Spacing,
    ) -> Self {
        Self {
            kind: DirectiveKind::Leaf,
            name: DirectiveName::parse(name),
            attributes,
            content: DirectiveContent::Inlines(inlines),
            spacing,
            attrs: Attributes::new(),
            title: None,
        }
    }

    /// Create a text directive
    pub fn text(name: &str, attributes: BTreeMap<String, String>, inlines: Vec<Inline>) -> Self {
        Self {
            kind: DirectiveKind::Text,
            name: DirectiveName::parse(name),
            attributes,
            content: DirectiveContent::Inlines(inlines),
            spacing: Spacing::default(),
            attrs: Attributes::new(),
            title: None,
        }
    }

    /// Source attribute by key
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Block children, empty for inline directives
    pub fn blocks(&self) -> &[Block] {
        match &self.content {
            DirectiveContent::Blocks(blocks) => blocks,
            DirectiveContent::Inlines(_) => &[],
        }
    }

    /// Plain text of inline content (empty for containers)
    pub fn inline_text(&self) -> String {
        match &self.content {
            DirectiveContent::Inlines(inlines) => plain_text(inlines),
            DirectiveContent::Blocks(_) => String::new(),
        }
    }
}

/// Whether `name` is a valid directive name (`[A-Za-z][A-Za-z0-9_-]*`)
pub fn is_directive_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Length in bytes of the directive name at the start of `text`
pub fn name_len(text: &str) -> usize {
    let mut len = 0;
    for (index, c) in text.char_indices() {
        let valid = if index == 0 {
            c.is_ascii_alphabetic()
        } else {
            c.is_ascii_alphanumeric() || c == '_' || c == '-'
        };
        if !valid {
            break;
        }
        len = index + c.len_utf8();
    }
    len
}

/// Find the `]` matching a `[` at the start of `text`
///
/// Returns the byte offset of the closing bracket. Nested brackets are
/// balanced and `\]` is skipped.
pub fn matching_bracket(text: &str) -> Option<usize> {
    if !text.starts_with('[') {
        return None;
    }
    let mut depth = 0usize;
    let mut escaped = false;
    for (index, c) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(index);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse a `{key=value key2="quoted" .class #id}` attribute block
///
/// `text` must start with `{`. Returns the attributes and the number of
/// bytes consumed (including both braces), or `None` when the block is
/// unterminated or malformed. `.class` entries accumulate into `class`,
/// `#id` sets `id`, and a bare key maps to the empty string.
pub fn parse_attributes(text: &str) -> Option<(BTreeMap<String, String>, usize)> {
    let body = text.strip_prefix('{')?;
    let mut attributes = BTreeMap::new();
    let mut classes: Vec<String> = Vec::new();
    let bytes = body.as_bytes();
    let mut pos = 0;

    loop {
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if pos >= bytes.len() {
            return None;
        }
        match bytes[pos] {
            b'}' => break,
            b'.' | b'#' => {
                let sigil = bytes[pos];
                let start = pos + 1;
                let end = token_end(body, start);
                if end == start {
                    return None;
                }
                let value = &body[start..end];
                if sigil == b'.' {
                    classes.push(value.to_string());
                } else {
                    attributes.insert("id".to_string(), value.to_string());
                }
                pos = end;
            }
            _ => {
                let start = pos;
                let end = key_end(body, start);
                if end == start {
                    return None;
                }
                let key = body[start..end].to_string();
                pos = end;
                if pos < bytes.len() && bytes[pos] == b'=' {
                    let (value, next) = attribute_value(body, pos + 1)?;
                    attributes.insert(key, value);
                    pos = next;
                } else {
                    attributes.insert(key, String::new());
                }
            }
        }
    }

    if !classes.is_empty() {
        let mut all = attributes
            .remove("class")
            .map(|existing| vec![existing])
            .unwrap_or_default();
        all.extend(classes);
        attributes.insert("class".to_string(), all.join(" "));
    }

    // `pos` indexes the closing brace inside `body`; add both braces
    Some((attributes, pos + 2))
}

fn token_end(body: &str, start: usize) -> usize {
    body[start..]
        .find(|c: char| c.is_whitespace() || c == '}' || c == '.' || c == '#')
        .map_or(body.len(), |offset| start + offset)
}

fn key_end(body: &str, start: usize) -> usize {
    body[start..]
        .find(|c: char| c.is_whitespace() || c == '}' || c == '=' || c == '"' || c == '\'')
        .map_or(body.len(), |offset| start + offset)
}

fn attribute_value(body: &str, start: usize) -> Option<(String, usize)> {
    let rest = &body[start..];
    let quote = rest.chars().next()?;
    if quote == '"' || quote == '\'' {
        let close = rest[1..].find(quote)?;
        let value = rest[1..1 + close].to_string();
        return Some((value, start + close + 2));
    }
    let end = rest
        .find(|c: char| c.is_whitespace() || c == '}')
        .unwrap_or(rest.len());
    Some((rest[..end].to_string(), start + end))
}
