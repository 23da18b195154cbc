//! Directive closer cleanup
//!
//! A `:::` closer with no opener survives parsing as paragraph text. This
//! pass strips such closer lines wherever they sit in a paragraph. Prose
//! before the last closer is moved back into the nearest preceding
//! container directive; prose after it stays in place. Without a
//! container the paragraph keeps all of its prose.

use super::diagnostics::{Diagnostic, Diagnostics};
use crate::source_model::fence::{classify_line, FenceLine};
use crate::source_model::inline::{join_lines, split_lines, Line};
use crate::source_model::{plain_text, Block, DirectiveContent, Inline};

/// Remove stray closers from every paragraph in the tree
pub fn clean_directive_closers(blocks: &mut Vec<Block>, diagnostics: &mut Diagnostics) {
    *blocks = clean_blocks(std::mem::take(blocks), diagnostics);
}

fn clean_blocks(blocks: Vec<Block>, diagnostics: &mut Diagnostics) -> Vec<Block> {
    let mut out: Vec<Block> = Vec::with_capacity(blocks.len());

    for block in blocks {
        let block = match block {
            Block::Paragraph(inlines) => {
                let Some((before, after)) = split_at_closers(&inlines) else {
                    out.push(Block::Paragraph(inlines));
                    continue;
                };
                diagnostics.push(Diagnostic::StrayDirectiveCloser);
                clean_paragraph(&mut out, before, after);
                continue;
            }
            Block::BlockQuote(children) => Block::BlockQuote(clean_blocks(children, diagnostics)),
            Block::List {
                start,
                items,
                attrs,
            } => Block::List {
                start,
                items: items
                    .into_iter()
                    .map(|mut item| {
                        item.content = clean_blocks(item.content, diagnostics);
                        item
                    })
                    .collect(),
                attrs,
            },
            Block::Directive(mut directive) => {
                if let DirectiveContent::Blocks(children) = directive.content {
                    directive.content = DirectiveContent::Blocks(clean_blocks(children, diagnostics));
                }
                Block::Directive(directive)
            }
            other => other,
        };
        out.push(block);
    }

    out
}

/// Split a paragraph around its closer lines
///
/// Returns `None` when the paragraph has no closer line. Otherwise the
/// lines before and after the last closer, with every closer removed.
fn split_at_closers(inlines: &[Inline]) -> Option<(Vec<Line>, Vec<Line>)> {
    let lines = split_lines(inlines.to_vec());
    let last = lines.iter().rposition(is_closer_line)?;

    let mut before = Vec::new();
    let mut after = Vec::new();
    for (index, line) in lines.into_iter().enumerate() {
        if is_closer_line(&line) {
            continue;
        }
        if index < last {
            before.push(line);
        } else {
            after.push(line);
        }
    }
    Some((before, after))
}

fn is_closer_line(line: &Line) -> bool {
    line.content.iter().all(|inline| matches!(inline, Inline::Text(_)))
        && classify_line(plain_text(&line.content).trim()) == FenceLine::Close
}

fn clean_paragraph(out: &mut Vec<Block>, before: Vec<Line>, after: Vec<Line>) {
    let Some(position) = container_target(out) else {
        let remaining = join_lines(before.into_iter().chain(after).collect());
        if !remaining.is_empty() {
            out.push(Block::Paragraph(remaining));
        }
        return;
    };

    let before = join_lines(before);
    if !before.is_empty() {
        reattach(out, position, Block::Paragraph(before));
    }
    let after = join_lines(after);
    if !after.is_empty() {
        out.push(Block::Paragraph(after));
    }
}

/// Position of the nearest preceding container directive; headings bound
/// the search
fn container_target(out: &[Block]) -> Option<usize> {
    out.iter()
        .rposition(|block| block.is_container_directive() || matches!(block, Block::Heading { .. }))
        .filter(|&position| out[position].is_container_directive())
}

/// Move `remainder` (and the blocks after `position`) into the directive
/// at `position`
fn reattach(out: &mut Vec<Block>, position: usize, remainder: Block) {
    let mut moved: Vec<Block> = out.drain(position + 1..).collect();
    moved.push(remainder);
    if let Some(Block::Directive(directive)) = out.get_mut(position) {
        if let DirectiveContent::Blocks(children) = &mut directive.content {
            log::debug!("Re-attached {} blocks to '{}'", moved.len(), directive.name.as_str());
            children.append(&mut moved);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_model::Document;

    fn cleaned(source: &str) -> (Document, Diagnostics) {
        let mut document = Document::parse(source);
        let mut diagnostics = Diagnostics::new();
        clean_directive_closers(&mut document.blocks, &mut diagnostics);
        (document, diagnostics)
    }

    #[test]
    fn test_stray_trailing_closer_removed() {
        // Arrange
        let source = "# Title\n\nSome text.\n\n:::\n";

        // Act
        let (document, diagnostics) = cleaned(source);

        // Assert
        assert_eq!(document.blocks.len(), 2);
        assert_eq!(
            document.blocks[1],
            Block::Paragraph(vec![Inline::Text("Some text.".to_string())])
        );
        assert_eq!(diagnostics.into_vec(), vec![Diagnostic::StrayDirectiveCloser]);
    }

    #[test]
    fn test_closer_trailing_prose_kept_without_container() {
        // Arrange: closer glued to the end of a paragraph, no directive
        let source = "Line one\nLine two\n:::\n::::\n";

        // Act
        let (document, _) = cleaned(source);

        // Assert
        assert_eq!(
            document.blocks,
            vec![Block::Paragraph(vec![
                Inline::Text("Line one".to_string()),
                Inline::SoftBreak,
                Inline::Text("Line two".to_string()),
            ])]
        );
    }

    #[test]
    fn test_remainder_reattached_to_preceding_container() {
        // Arrange: the second closer has no opener
        let source = ":::column\nInside\n:::\nOverflow\n:::\n";

        // Act
        let (document, diagnostics) = cleaned(source);

        // Assert
        assert_eq!(document.blocks.len(), 1);
        let Block::Directive(directive) = &document.blocks[0] else {
            panic!("expected directive, got {:?}", document.blocks[0]);
        };
        assert_eq!(
            directive.blocks(),
            &[
                Block::Paragraph(vec![Inline::Text("Inside".to_string())]),
                Block::Paragraph(vec![Inline::Text("Overflow".to_string())]),
            ]
        );
        assert_eq!(diagnostics.iter().count(), 1);
    }

    #[test]
    fn test_heading_bounds_reattachment() {
        let source = ":::column\nInside\n:::\n\n## Later\n\nTail\n:::\n";

        let (document, _) = cleaned(source);

        assert_eq!(document.blocks.len(), 3);
        assert_eq!(
            document.blocks[2],
            Block::Paragraph(vec![Inline::Text("Tail".to_string())])
        );
    }

    #[test]
    fn test_closer_in_middle_removed() {
        // Arrange
        let source = "Before\n:::\nafter\n\n```\n:::\n```\n";

        // Act
        let (document, diagnostics) = cleaned(source);

        // Assert
        assert_eq!(document.blocks.len(), 2);
        assert_eq!(
            document.blocks[0],
            Block::Paragraph(vec![
                Inline::Text("Before".to_string()),
                Inline::SoftBreak,
                Inline::Text("after".to_string()),
            ])
        );
        assert!(matches!(document.blocks[1], Block::CodeBlock { .. }));
        assert_eq!(diagnostics.into_vec(), vec![Diagnostic::StrayDirectiveCloser]);
    }

    #[test]
    fn test_mid_paragraph_closer_splits_around_container() {
        // Arrange: "Overflow" belongs to the column, "Outside" follows it
        let source = ":::column\nInside\n:::\nOverflow\n:::\nOutside\n";

        // Act
        let (document, diagnostics) = cleaned(source);

        // Assert
        assert_eq!(document.blocks.len(), 2);
        let Block::Directive(directive) = &document.blocks[0] else {
            panic!("expected directive, got {:?}", document.blocks[0]);
        };
        assert_eq!(
            directive.blocks().last(),
            Some(&Block::Paragraph(vec![Inline::Text("Overflow".to_string())]))
        );
        assert_eq!(
            document.blocks[1],
            Block::Paragraph(vec![Inline::Text("Outside".to_string())])
        );
        assert_eq!(diagnostics.iter().count(), 1);
    }
}
