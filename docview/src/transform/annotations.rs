//! Annotation extractor
//!
//! Turns classic footnotes (`[^id]` with `[^id]: ...` definitions) and
//! `annotation` directives into numbered marker links, and appends a
//! notes section holding an independent copy of every annotation's
//! content in first-appearance order.

use super::diagnostics::{Diagnostic, Diagnostics};
use super::labels::{LabelIndex, LabelInfo, LabelKind};
use crate::config::AnnotationsConfig;
use crate::source_model::blocks::first_paragraph_text;
use crate::source_model::inline::{trim_end, trim_start};
use crate::source_model::{
    Attributes, Block, DirectiveContent, DirectiveKind, DirectiveName, DirectiveNode, Inline,
    Link, ListItem,
};
use std::collections::HashMap;

/// A numbered annotation
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationInfo {
    /// Footnote identifier (`None` for directive annotations)
    pub identifier: Option<String>,

    /// Anchor of the entry in the notes section (`annotation-<n>`)
    pub element_id: String,

    /// Display ordinal, 1-based
    pub number: usize,

    /// Label title (`<prefix> <n>`)
    pub title: String,

    /// Plain text of the first paragraph
    pub summary: String,

    /// Archived copy of the annotation body
    pub content: Vec<Block>,
}

/// Extracts annotations from one document
pub struct AnnotationExtractor<'a> {
    config: &'a AnnotationsConfig,
    index: &'a mut LabelIndex,
    diagnostics: &'a mut Diagnostics,
    definitions: HashMap<String, Vec<Block>>,
    annotations: Vec<AnnotationInfo>,
    by_identifier: HashMap<String, usize>,
}

impl<'a> AnnotationExtractor<'a> {
    /// Create an extractor registering annotation labels into `index`
    pub fn new(
        config: &'a AnnotationsConfig,
        index: &'a mut LabelIndex,
        diagnostics: &'a mut Diagnostics,
    ) -> Self {
        Self {
            config,
            index,
            diagnostics,
            definitions: HashMap::new(),
            annotations: Vec::new(),
            by_identifier: HashMap::new(),
        }
    }

    /// Rewrite markers in `blocks`, append the notes section and return the
    /// annotations in numbering order
    pub fn extract(mut self, blocks: &mut Vec<Block>) -> Vec<AnnotationInfo> {
        *blocks = self.take_definitions(std::mem::take(blocks));
        *blocks = self.process_blocks(std::mem::take(blocks));

        if self.annotations.is_empty() {
            return Vec::new();
        }

        for info in &self.annotations {
            let mut label = LabelInfo::new(
                info.element_id.clone(),
                LabelKind::Annotation,
                info.title.clone(),
            );
            label.summary = Some(info.summary.clone());
            if !self.index.add(label) {
                self.diagnostics.push(Diagnostic::DuplicateLabel {
                    id: info.element_id.clone(),
                });
            }
        }

        blocks.extend(self.notes_section());
        log::debug!("Extracted {} annotations", self.annotations.len());
        self.annotations
    }

    /// Remove footnote definitions anywhere in the tree, keeping their bodies
    fn take_definitions(&mut self, blocks: Vec<Block>) -> Vec<Block> {
        let mut out = Vec::with_capacity(blocks.len());
        for block in blocks {
            match block {
                Block::FootnoteDefinition { label, content } => {
                    let content = self.take_definitions(content);
                    self.definitions
                        .entry(footnote_key(&label))
                        .or_insert(content);
                }
                Block::BlockQuote(children) => {
                    out.push(Block::BlockQuote(self.take_definitions(children)))
                }
                Block::List {
                    start,
                    items,
                    attrs,
                } => {
                    let items = items
                        .into_iter()
                        .map(|mut item| {
                            item.content = self.take_definitions(item.content);
                            item
                        })
                        .collect();
                    out.push(Block::List {
                        start,
                        items,
                        attrs,
                    });
                }
                Block::Directive(mut directive) => {
                    if let DirectiveContent::Blocks(children) = directive.content {
                        directive.content =
                            DirectiveContent::Blocks(self.take_definitions(children));
                    }
                    out.push(Block::Directive(directive));
                }
                other => out.push(other),
            }
        }
        out
    }

    /// Rebuild a block list with annotation directives replaced by markers
    fn process_blocks(&mut self, blocks: Vec<Block>) -> Vec<Block> {
        let mut out: Vec<Block> = Vec::with_capacity(blocks.len());
        let mut pending: Vec<Inline> = Vec::new();
        let mut iter = blocks.into_iter().peekable();

        while let Some(block) = iter.next() {
            match block {
                Block::Directive(directive)
                    if directive.name == DirectiveName::Annotation
                        && directive.kind != DirectiveKind::Text =>
                {
                    let blank_after = directive.spacing.blank_after;
                    let marker = self.annotate_directive(directive);
                    let next_is_paragraph = matches!(iter.peek(), Some(Block::Paragraph(_)));

                    if !blank_after && next_is_paragraph {
                        pending.push(marker);
                    } else if let Some(Block::Paragraph(previous)) = out.last_mut() {
                        trim_end(previous);
                        previous.append(&mut pending);
                        previous.push(marker);
                    } else {
                        pending.push(marker);
                        out.push(Block::Paragraph(std::mem::take(&mut pending)));
                    }
                }
                Block::Paragraph(inlines) => {
                    let mut inlines = self.process_inlines(inlines);
                    if !pending.is_empty() {
                        trim_start(&mut inlines);
                        pending.append(&mut inlines);
                        inlines = std::mem::take(&mut pending);
                    }
                    out.push(Block::Paragraph(inlines));
                }
                other => out.push(self.process_block(other)),
            }
        }

        if !pending.is_empty() {
            out.push(Block::Paragraph(pending));
        }
        out
    }

    fn process_block(&mut self, block: Block) -> Block {
        match block {
            Block::Heading {
                level,
                content,
                attrs,
            } => Block::Heading {
                level,
                content: self.process_inlines(content),
                attrs,
            },
            Block::BlockQuote(children) => Block::BlockQuote(self.process_blocks(children)),
            Block::List {
                start,
                items,
                attrs,
            } => Block::List {
                start,
                items: items
                    .into_iter()
                    .map(|mut item| {
                        item.content = self.process_blocks(item.content);
                        item
                    })
                    .collect(),
                attrs,
            },
            Block::Table {
                alignments,
                headers,
                rows,
            } => Block::Table {
                alignments,
                headers: headers
                    .into_iter()
                    .map(|cell| self.process_inlines(cell))
                    .collect(),
                rows: rows
                    .into_iter()
                    .map(|row| {
                        row.into_iter()
                            .map(|cell| self.process_inlines(cell))
                            .collect()
                    })
                    .collect(),
            },
            Block::Directive(mut directive) => {
                directive.content = match directive.content {
                    DirectiveContent::Blocks(children) => {
                        DirectiveContent::Blocks(self.process_blocks(children))
                    }
                    DirectiveContent::Inlines(inlines) => {
                        DirectiveContent::Inlines(self.process_inlines(inlines))
                    }
                };
                Block::Directive(directive)
            }
            other => other,
        }
    }

    /// Rebuild inline content with footnote references and inline
    /// annotation directives replaced by markers
    fn process_inlines(&mut self, inlines: Vec<Inline>) -> Vec<Inline> {
        inlines
            .into_iter()
            .map(|inline| match inline {
                Inline::FootnoteReference(label) => self.annotate_reference(label),
                Inline::Directive(directive) if directive.name == DirectiveName::Annotation => {
                    self.annotate_directive(directive)
                }
                Inline::Directive(mut directive) => {
                    if let DirectiveContent::Inlines(children) = directive.content {
                        directive.content =
                            DirectiveContent::Inlines(self.process_inlines(children));
                    }
                    Inline::Directive(directive)
                }
                Inline::Emphasis(children) => Inline::Emphasis(self.process_inlines(children)),
                Inline::Strong(children) => Inline::Strong(self.process_inlines(children)),
                Inline::Strikethrough(children) => {
                    Inline::Strikethrough(self.process_inlines(children))
                }
                Inline::Superscript(children) => {
                    Inline::Superscript(self.process_inlines(children))
                }
                Inline::Subscript(children) => Inline::Subscript(self.process_inlines(children)),
                other => other,
            })
            .collect()
    }

    /// Marker for a footnote reference; repeated identifiers share a number
    fn annotate_reference(&mut self, label: String) -> Inline {
        let key = footnote_key(&label);
        if let Some(&position) = self.by_identifier.get(&key) {
            return self.marker(position);
        }

        let position = self.reserve(Some(label.clone()));
        self.by_identifier.insert(key.clone(), position);

        let content = match self.definitions.remove(&key) {
            Some(definition) => self.process_blocks(definition),
            None => {
                self.diagnostics.push(Diagnostic::MissingAnnotation {
                    identifier: label.clone(),
                });
                vec![Block::Paragraph(vec![Inline::Text(format!(
                    "Annotation \"{}\" has no definition.",
                    label
                ))])]
            }
        };
        self.complete(position, content);
        self.marker(position)
    }

    /// Marker for an annotation directive; every occurrence is a new note
    fn annotate_directive(&mut self, directive: DirectiveNode) -> Inline {
        let position = self.reserve(None);
        let content = match directive.content {
            DirectiveContent::Blocks(blocks) => self.process_blocks(blocks),
            DirectiveContent::Inlines(inlines) => {
                vec![Block::Paragraph(self.process_inlines(inlines))]
            }
        };
        self.complete(position, content);
        self.marker(position)
    }

    /// Allocate the next number before the body is processed, so nested
    /// annotations are numbered after their parent
    fn reserve(&mut self, identifier: Option<String>) -> usize {
        let number = self.annotations.len() + 1;
        self.annotations.push(AnnotationInfo {
            identifier,
            element_id: format!("annotation-{}", number),
            number,
            title: format!("{} {}", self.config.title_prefix, number),
            summary: String::new(),
            content: Vec::new(),
        });
        number - 1
    }

    fn complete(&mut self, position: usize, content: Vec<Block>) {
        let info = &mut self.annotations[position];
        info.summary = first_paragraph_text(&content).unwrap_or_default();
        info.content = content;
    }

    fn marker(&self, position: usize) -> Inline {
        let info = &self.annotations[position];
        let mut attrs = Attributes::new();
        attrs.add_class("ref-link");
        attrs.add_class("annotation-marker");
        attrs.set_data("ref", info.element_id.as_str());
        attrs.set_data("ref-type", LabelKind::Annotation.as_str());
        attrs.set_data("ref-title", info.title.as_str());

        Inline::Link(Link {
            url: format!("#{}", info.element_id),
            title: String::new(),
            children: vec![Inline::Text(info.number.to_string())],
            attrs,
        })
    }

    /// Rule, heading and ordered list holding a copy of every annotation
    fn notes_section(&self) -> Vec<Block> {
        let mut heading_attrs = Attributes::new();
        heading_attrs.id = Some(self.config.section_id.clone());

        let items = self
            .annotations
            .iter()
            .map(|info| {
                let mut item = ListItem::new(info.content.clone());
                item.attrs.id = Some(info.element_id.clone());
                item.attrs.add_class("annotation-entry");
                item
            })
            .collect();

        let mut list_attrs = Attributes::new();
        list_attrs.add_class("annotation-list");

        vec![
            Block::Rule,
            Block::Heading {
                level: 2,
                content: vec![Inline::Text(self.config.heading.clone())],
                attrs: heading_attrs,
            },
            Block::List {
                start: Some(1),
                items,
                attrs: list_attrs,
            },
        ]
    }
}

/// Footnote labels match case-insensitively, with inner whitespace collapsed
fn footnote_key(label: &str) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
