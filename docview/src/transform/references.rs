//! Reference resolver
//!
//! Rewrites `[text](@id)` links and bare `@id` tokens in running prose
//! into links to the labelled element. Runs after collection has
//! completed, so forward references resolve.

use super::diagnostics::{Diagnostic, Diagnostics};
use super::labels::{normalize_id, LabelIndex, LabelInfo};
use crate::source_model::inline::push_text;
use crate::source_model::{Attributes, Block, DirectiveContent, Inline, Link};
use regex::Regex;
use std::sync::LazyLock;

/// Bare reference token in prose: `@sec:intro`
static REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@([a-z][a-z0-9\-:]*)").expect("reference pattern is valid")
});

/// Output attributes of a resolved reference link
fn reference_attrs(id: &str, info: &LabelInfo) -> Attributes {
    let mut attrs = Attributes::new();
    attrs.add_class("ref-link");
    attrs.set_data("ref", id);
    attrs.set_data("ref-type", info.kind.as_str());
    attrs.set_data("ref-title", info.title.as_str());
    attrs
}

/// Rewrites references against a complete [`LabelIndex`]
pub struct ReferenceResolver<'a> {
    index: &'a LabelIndex,
    diagnostics: &'a mut Diagnostics,
}

impl<'a> ReferenceResolver<'a> {
    /// Create a resolver reading from `index`
    pub fn new(index: &'a LabelIndex, diagnostics: &'a mut Diagnostics) -> Self {
        Self { index, diagnostics }
    }

    /// Resolve references in every block, at any depth
    pub fn resolve(&mut self, blocks: &mut [Block]) {
        for block in blocks {
            self.resolve_block(block);
        }
    }

    fn resolve_block(&mut self, block: &mut Block) {
        match block {
            // Headings only take explicit links; bare tokens stay literal
            Block::Heading { content, .. } => self.rewrite(content, false),
            Block::Paragraph(inlines) => self.rewrite(inlines, true),
            Block::BlockQuote(children) | Block::FootnoteDefinition { content: children, .. } => {
                self.resolve(children)
            }
            Block::List { items, .. } => {
                for item in items {
                    self.resolve(&mut item.content);
                }
            }
            Block::Table { headers, rows, .. } => {
                for cell in headers.iter_mut().chain(rows.iter_mut().flatten()) {
                    self.rewrite(cell, true);
                }
            }
            Block::Directive(directive) => match &mut directive.content {
                DirectiveContent::Blocks(children) => self.resolve(children),
                DirectiveContent::Inlines(inlines) => self.rewrite(inlines, true),
            },
            Block::CodeBlock { .. } | Block::Rule | Block::Html(_) => {}
        }
    }

    fn rewrite(&mut self, inlines: &mut Vec<Inline>, bare: bool) {
        *inlines = self.resolve_inlines(std::mem::take(inlines), bare);
    }

    /// Rebuild an inline list with references resolved
    ///
    /// `bare` enables detection of `@id` tokens inside text nodes.
    fn resolve_inlines(&mut self, inlines: Vec<Inline>, bare: bool) -> Vec<Inline> {
        let mut out = Vec::with_capacity(inlines.len());
        for inline in inlines {
            match inline {
                Inline::Text(text) if bare => self.split_references(&text, &mut out),
                Inline::Emphasis(children) => {
                    out.push(Inline::Emphasis(self.resolve_inlines(children, bare)))
                }
                Inline::Strong(children) => {
                    out.push(Inline::Strong(self.resolve_inlines(children, bare)))
                }
                Inline::Strikethrough(children) => {
                    out.push(Inline::Strikethrough(self.resolve_inlines(children, bare)))
                }
                Inline::Superscript(children) => {
                    out.push(Inline::Superscript(self.resolve_inlines(children, bare)))
                }
                Inline::Subscript(children) => {
                    out.push(Inline::Subscript(self.resolve_inlines(children, bare)))
                }
                Inline::Link(link) => out.push(Inline::Link(self.resolve_link(link))),
                Inline::Directive(mut directive) => {
                    if let DirectiveContent::Inlines(children) = &mut directive.content {
                        self.rewrite(children, bare);
                    }
                    out.push(Inline::Directive(directive));
                }
                other => out.push(other),
            }
        }
        out
    }

    /// Resolve an explicit `[text](@id)` link
    fn resolve_link(&mut self, mut link: Link) -> Link {
        let Some(raw) = link.url.strip_prefix('@') else {
            return link;
        };

        let id = normalize_id(raw);
        match self.index.get(&id) {
            Some(info) => {
                link.url = format!("#{}", info.element_id);
                for (key, value) in reference_attrs(&id, info).data {
                    link.attrs.set_data(key, value);
                }
                link.attrs.add_class("ref-link");
                if link.children.is_empty() {
                    link.children.push(Inline::Text(info.title.clone()));
                }
            }
            None => self.diagnostics.push(Diagnostic::UnresolvedReference { id }),
        }
        link
    }

    /// Split a text run at bare `@id` tokens, appending the pieces to `out`
    ///
    /// Surrounding text is kept byte for byte and in order. A token preceded
    /// by a word character (as in an e-mail address) is not a reference, and
    /// a trailing `-` or `:` is not part of the id.
    fn split_references(&mut self, text: &str, out: &mut Vec<Inline>) {
        let mut last = 0;
        for captures in REFERENCE.captures_iter(text) {
            let (Some(whole), Some(token)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            let preceded_by_word = text[..whole.start()]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '.');
            if whole.start() < last || preceded_by_word {
                continue;
            }

            let raw = token.as_str().trim_end_matches(['-', ':']);
            let end = token.start() + raw.len();
            push_text(out, &text[last..whole.start()]);

            let id = normalize_id(raw);
            match self.index.get(&id) {
                Some(info) => out.push(Inline::Link(Link {
                    url: format!("#{}", info.element_id),
                    title: String::new(),
                    children: vec![Inline::Text(info.title.clone())],
                    attrs: reference_attrs(&id, info),
                })),
                None => {
                    push_text(out, &text[whole.start()..end]);
                    self.diagnostics.push(Diagnostic::UnresolvedReference { id });
                }
            }
            last = end;
        }
        push_text(out, &text[last..]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::labels::LabelKind;

    fn index_with(labels: &[(&str, LabelKind, &str)]) -> LabelIndex {
        let mut index = LabelIndex::new();
        for (id, kind, title) in labels {
            index.add(LabelInfo::new(*id, *kind, *title));
        }
        index
    }

    fn text(value: &str) -> Inline {
        Inline::Text(value.to_string())
    }

    #[test]
    fn test_bare_reference_round_trip() {
        // Arrange
        let index = index_with(&[("sec-a", LabelKind::Heading, "Section A")]);
        let mut diagnostics = Diagnostics::new();
        let mut blocks = vec![Block::Paragraph(vec![text("See @sec-a for details.")])];

        // Act
        ReferenceResolver::new(&index, &mut diagnostics).resolve(&mut blocks);

        // Assert
        let Block::Paragraph(inlines) = &blocks[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(inlines.len(), 3);
        assert_eq!(inlines[0], text("See "));
        let Inline::Link(link) = &inlines[1] else {
            panic!("expected link, got {:?}", inlines[1]);
        };
        assert_eq!(link.url, "#sec-a");
        assert_eq!(link.children, vec![text("Section A")]);
        assert_eq!(link.attrs.data("ref"), Some("sec-a"));
        assert_eq!(link.attrs.data("ref-type"), Some("heading"));
        assert_eq!(link.attrs.data("ref-title"), Some("Section A"));
        assert_eq!(inlines[2], text(" for details."));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_multiple_references_in_one_run() {
        // Arrange
        let index = index_with(&[
            ("a", LabelKind::Heading, "Alpha"),
            ("b-c", LabelKind::Column, "Beta"),
        ]);
        let mut diagnostics = Diagnostics::new();
        let mut blocks = vec![Block::Paragraph(vec![text(
            "@a, then @b:c and @missing; end",
        )])];

        // Act
        ReferenceResolver::new(&index, &mut diagnostics).resolve(&mut blocks);

        // Assert
        let Block::Paragraph(inlines) = &blocks[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(inlines.len(), 4);
        assert!(matches!(&inlines[0], Inline::Link(link) if link.url == "#a"));
        assert_eq!(inlines[1], text(", then "));
        assert!(matches!(&inlines[2], Inline::Link(link) if link.url == "#b-c"));
        assert_eq!(inlines[3], text(" and @missing; end"));
        assert_eq!(
            diagnostics.into_vec(),
            vec![Diagnostic::UnresolvedReference {
                id: "missing".to_string()
            }]
        );
    }

    #[test]
    fn test_explicit_link_keeps_its_text() {
        // Arrange
        let index = index_with(&[("fig-1", LabelKind::Column, "Figure")]);
        let mut diagnostics = Diagnostics::new();
        let mut blocks = vec![Block::Paragraph(vec![
            Inline::Link(Link::with_text("@fig:1", "the figure")),
            Inline::Link(Link {
                url: "@fig:1".to_string(),
                title: String::new(),
                children: Vec::new(),
                attrs: Attributes::new(),
            }),
        ])];

        // Act
        ReferenceResolver::new(&index, &mut diagnostics).resolve(&mut blocks);

        // Assert
        let Block::Paragraph(inlines) = &blocks[0] else {
            panic!("expected paragraph");
        };
        let Inline::Link(first) = &inlines[0] else {
            panic!("expected link");
        };
        assert_eq!(first.url, "#fig-1");
        assert_eq!(first.children, vec![text("the figure")]);
        assert_eq!(first.attrs.data("ref"), Some("fig-1"));
        let Inline::Link(second) = &inlines[1] else {
            panic!("expected link");
        };
        assert_eq!(second.children, vec![text("Figure")]);
    }

    #[test]
    fn test_unresolved_explicit_link_left_literal() {
        let index = LabelIndex::new();
        let mut diagnostics = Diagnostics::new();
        let mut blocks = vec![Block::Paragraph(vec![Inline::Link(Link::with_text(
            "@nowhere", "gone",
        ))])];

        ReferenceResolver::new(&index, &mut diagnostics).resolve(&mut blocks);

        let Block::Paragraph(inlines) = &blocks[0] else {
            panic!("expected paragraph");
        };
        let Inline::Link(link) = &inlines[0] else {
            panic!("expected link");
        };
        assert_eq!(link.url, "@nowhere");
        assert!(link.attrs.is_empty());
        assert!(!diagnostics.is_empty());
    }

    #[test]
    fn test_code_email_and_headings_untouched() {
        // Arrange
        let index = index_with(&[("x", LabelKind::Heading, "X")]);
        let mut diagnostics = Diagnostics::new();
        let mut blocks = vec![
            Block::Paragraph(vec![
                text("mail me@x or "),
                Inline::Code("@x".to_string()),
            ]),
            Block::heading(2, vec![text("About @x")]),
        ];
        let expected = blocks.clone();

        // Act
        ReferenceResolver::new(&index, &mut diagnostics).resolve(&mut blocks);

        // Assert
        assert_eq!(blocks, expected);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_trailing_separator_not_part_of_id() {
        let index = index_with(&[("sec", LabelKind::Heading, "Sec")]);
        let mut diagnostics = Diagnostics::new();
        let mut blocks = vec![Block::Paragraph(vec![text("(see @sec-)")])];

        ReferenceResolver::new(&index, &mut diagnostics).resolve(&mut blocks);

        let Block::Paragraph(inlines) = &blocks[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(inlines[0], text("(see "));
        assert!(matches!(&inlines[1], Inline::Link(link) if link.url == "#sec"));
        assert_eq!(inlines[2], text("-)"));
    }
}
