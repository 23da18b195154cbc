//! Directive transformer
//!
//! Tags every directive with its output classes and, for column
//! directives, consumes the `@key: value` metadata lines found in the
//! directive's paragraphs.

use super::slug::slugify;
use crate::source_model::inline::{join_lines, split_lines};
use crate::source_model::{plain_text, Block, DirectiveContent, DirectiveName, DirectiveNode, Inline};

/// Metadata keys recognised on `@key:` lines, written to `data-<key>`
pub const METADATA_KEYS: [&str; 7] = [
    "title",
    "title-color",
    "color",
    "background",
    "border-color",
    "border-width",
    "border-style",
];

/// Transform every directive in the tree, at any depth
pub fn transform_directives(blocks: &mut [Block]) {
    for block in blocks {
        transform_block(block);
    }
}

fn transform_block(block: &mut Block) {
    match block {
        Block::Directive(directive) => transform_directive(directive),
        Block::Heading { content, .. } | Block::Paragraph(content) => transform_inlines(content),
        Block::BlockQuote(children) | Block::FootnoteDefinition { content: children, .. } => {
            transform_directives(children)
        }
        Block::List { items, .. } => {
            for item in items {
                transform_directives(&mut item.content);
            }
        }
        Block::Table { headers, rows, .. } => {
            for cell in headers.iter_mut().chain(rows.iter_mut().flatten()) {
                transform_inlines(cell);
            }
        }
        Block::CodeBlock { .. } | Block::Rule | Block::Html(_) => {}
    }
}

fn transform_inlines(inlines: &mut [Inline]) {
    for inline in inlines {
        match inline {
            Inline::Directive(directive) => transform_directive(directive),
            Inline::Emphasis(children)
            | Inline::Strong(children)
            | Inline::Strikethrough(children)
            | Inline::Superscript(children)
            | Inline::Subscript(children) => transform_inlines(children),
            Inline::Link(link) => transform_inlines(&mut link.children),
            _ => {}
        }
    }
}

/// Attach classes, metadata and the synthesized anchor to one directive
pub fn transform_directive(directive: &mut DirectiveNode) {
    directive.attrs.add_class("directive");
    // Unnamed nesting levels (a malformed `:::` line) get the base class only
    if !directive.name.class_name().is_empty() {
        directive
            .attrs
            .add_class(format!("directive-{}", directive.name.class_name()));
    }

    let user_classes: Vec<String> = directive
        .attribute("class")
        .map(|classes| classes.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default();
    for class in user_classes {
        directive.attrs.add_class(class);
    }
    if let Some(id) = directive.attributes.get("id") {
        directive.attrs.id = Some(id.clone());
    }

    if directive.name.is_column() {
        if let DirectiveContent::Blocks(blocks) = &mut directive.content {
            for (key, value) in extract_metadata(blocks) {
                if key == "title" {
                    directive.title = (!value.is_empty()).then(|| value.clone());
                }
                directive.attrs.set_data(key, value);
            }
        }
        if directive.name == DirectiveName::ColumnToc && directive.attrs.id.is_none() {
            directive.attrs.id = directive.title.as_deref().map(slugify);
        }
    }

    match &mut directive.content {
        DirectiveContent::Blocks(blocks) => transform_directives(blocks),
        DirectiveContent::Inlines(inlines) => transform_inlines(inlines),
    }
}

/// Parse an `@key: value` line with a recognised key
pub fn parse_metadata_line(line: &str) -> Option<(&'static str, String)> {
    let rest = line.trim().strip_prefix('@')?;
    let (key, value) = rest.split_once(':')?;
    let key = METADATA_KEYS.iter().find(|known| **known == key)?;
    Some((key, value.trim().to_string()))
}

/// Strip metadata lines from the direct child paragraphs of a column
///
/// Returns the `(key, value)` pairs in source order. A paragraph left
/// without content is removed; otherwise only its non-metadata lines
/// remain, with their inline formatting intact.
fn extract_metadata(blocks: &mut Vec<Block>) -> Vec<(&'static str, String)> {
    let mut metadata = Vec::new();

    *blocks = std::mem::take(blocks)
        .into_iter()
        .filter_map(|block| {
            let Block::Paragraph(inlines) = block else {
                return Some(block);
            };

            let mut found = false;
            let mut kept = Vec::new();
            for line in split_lines(inlines.clone()) {
                let text = plain_text(&line.content);
                if let Some(entry) = parse_metadata_line(&text) {
                    metadata.push(entry);
                    found = true;
                } else if !text.trim().is_empty() {
                    kept.push(line);
                }
            }

            if !found {
                return Some(Block::Paragraph(inlines));
            }
            let remaining = join_lines(kept);
            (!remaining.is_empty()).then_some(Block::Paragraph(remaining))
        })
        .collect();

    metadata
}
