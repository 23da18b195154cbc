//! TOC extractor
//!
//! Derives the heading outline from the same segmenter, Markdown parser,
//! directive transformer and label collector the full pipeline runs, but
//! stops before annotations, references and math. Headings that the
//! renderer never shows (code, raw HTML, lazy list lines) therefore never
//! reach the outline, and every id is the anchor the rendered page
//! carries.

use super::collect::LabelCollector;
use super::diagnostics::Diagnostics;
use super::directives::transform_directives;
use super::labels::LabelIndex;
use crate::config::{Config, TocConfig};
use crate::source_model::{plain_text, Block, DirectiveKind, DirectiveName, Document};

/// One entry of the outline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocItem {
    pub id: String,
    pub text: String,
    pub level: u8,
    pub children: Vec<TocItem>,
}

impl TocItem {
    fn new(id: String, text: String, level: u8) -> Self {
        Self {
            id,
            text,
            level,
            children: Vec::new(),
        }
    }
}

/// Extract the outline of `source` as a forest
///
/// Diagnostics raised on the way are discarded; the full pipeline
/// reports them.
pub fn extract_toc(source: &str, config: &Config) -> Vec<TocItem> {
    let mut document = Document::parse(source);
    transform_directives(&mut document.blocks);

    let mut labels = LabelIndex::new();
    let mut diagnostics = Diagnostics::quiet();
    LabelCollector::new(&mut labels, &mut diagnostics)
        .reserving(&config.annotations.section_id)
        .collect(&mut document.blocks);

    outline(&document.blocks, &config.toc)
}

/// Outline of a tree whose anchors are already assigned
pub fn outline(blocks: &[Block], config: &TocConfig) -> Vec<TocItem> {
    let mut flat = Vec::new();
    collect_entries(blocks, config, &mut flat);
    build_forest(flat)
}

/// Headings in reading order, plus one entry per titled `column-toc`
///
/// Quotes, lists and footnote bodies are not part of the outline, and
/// nothing inside a column is either.
fn collect_entries(blocks: &[Block], config: &TocConfig, flat: &mut Vec<TocItem>) {
    for block in blocks {
        match block {
            Block::Heading {
                level,
                content,
                attrs,
            } if *level <= config.max_level => {
                if let Some(id) = &attrs.id {
                    flat.push(TocItem::new(
                        id.clone(),
                        plain_text(content).trim().to_string(),
                        *level,
                    ));
                }
            }
            Block::Directive(directive) if directive.name.is_column() => {
                let is_entry = directive.name == DirectiveName::ColumnToc
                    && directive.kind != DirectiveKind::Text;
                if let (true, Some(id), Some(title)) =
                    (is_entry, &directive.attrs.id, &directive.title)
                {
                    flat.push(TocItem::new(id.clone(), title.clone(), config.column_level));
                }
            }
            Block::Directive(directive) => collect_entries(directive.blocks(), config, flat),
            _ => {}
        }
    }
}

/// Nest a flat, document-ordered list of entries by level
///
/// Each entry pops every open entry of the same or deeper level, then
/// becomes a child of whatever remains on top (or a root).
pub fn build_forest(flat: Vec<TocItem>) -> Vec<TocItem> {
    let mut roots = Vec::new();
    let mut stack: Vec<TocItem> = Vec::new();

    for item in flat {
        while stack.last().is_some_and(|top| top.level >= item.level) {
            if let Some(done) = stack.pop() {
                attach(done, &mut stack, &mut roots);
            }
        }
        stack.push(item);
    }
    while let Some(done) = stack.pop() {
        attach(done, &mut stack, &mut roots);
    }

    roots
}

fn attach(item: TocItem, stack: &mut [TocItem], roots: &mut Vec<TocItem>) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(item),
        None => roots.push(item),
    }
}

/// Flatten a forest back into `(id, text, level)` triples in document order
pub fn flatten(forest: &[TocItem]) -> Vec<(String, String, u8)> {
    let mut out = Vec::new();
    for item in forest {
        out.push((item.id.clone(), item.text.clone(), item.level));
        out.extend(flatten(&item.children));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toc(source: &str) -> Vec<TocItem> {
        extract_toc(source, &Config::default())
    }

    fn triple(id: &str, text: &str, level: u8) -> (String, String, u8) {
        (id.to_string(), text.to_string(), level)
    }

    #[test]
    fn test_nested_outline() {
        // Arrange
        let source = "# One\n\n## One A\n\n### Deep\n\n## One B\n\n# Two\n";

        // Act
        let forest = toc(source);

        // Assert
        assert_eq!(forest.len(), 2);
        assert_eq!(forest[0].id, "one");
        assert_eq!(forest[0].children.len(), 2);
        assert_eq!(forest[0].children[0].text, "One A");
        assert_eq!(forest[0].children[0].children[0].id, "deep");
        assert_eq!(forest[0].children[1].id, "one-b");
        assert_eq!(forest[1].id, "two");
    }

    #[test]
    fn test_labelled_heading_uses_normalized_id() {
        let forest = toc("## (sec:intro)= Introduction\n");

        assert_eq!(flatten(&forest), vec![triple("sec-intro", "Introduction", 2)]);
    }

    #[test]
    fn test_deep_headings_discarded() {
        let forest = toc("#### Four\n\n##### Five\n\n###### Six\n");
        assert!(forest.is_empty());
    }

    #[test]
    fn test_code_fences_and_blockquotes_skipped() {
        // Arrange
        let source = "```md\n# Not a heading\n```\n\n> # Quoted\n\n~~~~\n## Also code\n~~~\n## Still code\n~~~~\n\n# Real\n";

        // Act
        let forest = toc(source);

        // Assert
        assert_eq!(flatten(&forest), vec![triple("real", "Real", 1)]);
    }

    #[test]
    fn test_column_toc_entry_with_label() {
        // Arrange
        let source = "# Top\n\n:::column-toc\n(box:one)=\n@title: Side Box\n## Hidden heading\n:::\n";

        // Act
        let forest = toc(source);

        // Assert
        assert_eq!(
            flatten(&forest),
            vec![triple("top", "Top", 1), triple("box-one", "Side Box", 4)]
        );
    }

    #[test]
    fn test_column_toc_entry_slug_and_nesting() {
        // Arrange: the inner closer must not end the outer column
        let source = ":::column-toc\n@title: Outer Box\n:::tip\n@title: Inner\n:::\n# Inside\n:::\n\n# After\n";

        // Act
        let forest = toc(source);

        // Assert
        assert_eq!(
            flatten(&forest),
            vec![triple("outer-box", "Outer Box", 4), triple("after", "After", 1)]
        );
    }

    #[test]
    fn test_unnamed_and_spaced_openers_nest_inside_column() {
        // Arrange
        let source = ":::column-toc\n@title: Outer\n::: note\n@title: Inner\n:::\n:::!\n# Hidden\n:::\n:::\n\n# After\n";

        // Act
        let forest = toc(source);

        // Assert
        assert_eq!(
            flatten(&forest),
            vec![triple("outer", "Outer", 4), triple("after", "After", 1)]
        );
    }

    #[test]
    fn test_plain_column_contributes_nothing() {
        let forest = toc(":::column\n@title: Quiet\n# Hidden\n:::\n");
        assert!(forest.is_empty());
    }

    #[test]
    fn test_title_inside_list_is_not_metadata() {
        let forest = toc(":::column-toc\n- @title: Lazy\n:::\n");
        assert!(forest.is_empty());
    }

    #[test]
    fn test_heading_markup_flattened() {
        let forest = toc("# Using `cargo` *fast* ##\n");

        assert_eq!(forest[0].text, "Using cargo fast");
        assert_eq!(forest[0].id, "using-cargo-fast");
    }

    #[test]
    fn test_reference_link_in_heading() {
        let forest = toc("# See [the docs][d]\n\n[d]: http://example.com\n");

        assert_eq!(flatten(&forest), vec![triple("see-the-docs", "See the docs", 1)]);
    }

    #[test]
    fn test_heading_inside_html_block_skipped() {
        let forest = toc("<div>\n# Hidden\n</div>\n\n# Shown\n");

        assert_eq!(flatten(&forest), vec![triple("shown", "Shown", 1)]);
    }

    #[test]
    fn test_setext_heading_included() {
        let forest = toc("Overview\n========\n\nDetails\n-------\n");

        assert_eq!(
            flatten(&forest),
            vec![triple("overview", "Overview", 1), triple("details", "Details", 2)]
        );
    }

    #[test]
    fn test_repeated_titles_get_unique_ids() {
        // Arrange: `annotations` belongs to the notes section
        let source = "# Intro\n\n# Intro\n\n## Annotations\n";

        // Act
        let forest = toc(source);

        // Assert
        assert_eq!(
            flatten(&forest),
            vec![
                triple("intro", "Intro", 1),
                triple("intro-1", "Intro", 1),
                triple("annotations-1", "Annotations", 2),
            ]
        );
    }

    #[test]
    fn test_heading_text_that_looks_like_a_list() {
        let forest = toc("## 1. Getting started\n");

        assert_eq!(forest[0].text, "1. Getting started");
        assert_eq!(forest[0].id, "1-getting-started");
    }

    #[test]
    fn test_empty_document() {
        assert!(toc("").is_empty());
    }
}
