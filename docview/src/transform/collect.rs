//! Label collector
//!
//! Finds `(id)=` label declarations on headings and column directives,
//! strips the declaration syntax from the visible content, assigns the
//! normalized id as the element anchor and registers the label. Once
//! every explicit id is known, unlabelled headings and `column-toc`
//! directives get unique slugs.

use super::diagnostics::{Diagnostic, Diagnostics};
use super::labels::{normalize_id, LabelIndex, LabelInfo, LabelKind, LABEL_LINE, LABEL_PREFIX};
use super::slug::Slugger;
use crate::source_model::inline::{join_lines, split_lines, trim_start};
use crate::source_model::{
    plain_text, Attributes, Block, DirectiveContent, DirectiveKind, DirectiveName, DirectiveNode,
    Inline,
};

/// Walks a document, populating a [`LabelIndex`] and assigning anchors
pub struct LabelCollector<'a> {
    index: &'a mut LabelIndex,
    diagnostics: &'a mut Diagnostics,
    slugger: Slugger,
}

impl<'a> LabelCollector<'a> {
    /// Create a collector writing into `index`
    pub fn new(index: &'a mut LabelIndex, diagnostics: &'a mut Diagnostics) -> Self {
        Self {
            index,
            diagnostics,
            slugger: Slugger::new(),
        }
    }

    /// Keep generated slugs clear of an id used elsewhere on the page
    pub fn reserving(mut self, id: &str) -> Self {
        self.slugger.reserve(id);
        self
    }

    /// Collect labels from every block, at any depth, then slug the rest
    pub fn collect(&mut self, blocks: &mut [Block]) {
        self.collect_labels(blocks);
        self.assign_slugs(blocks);
    }

    fn collect_labels(&mut self, blocks: &mut [Block]) {
        for block in blocks {
            match block {
                Block::Heading { content, attrs, .. } => self.collect_heading(content, attrs),
                Block::Directive(directive) => {
                    if directive.name.is_column() && directive.kind != DirectiveKind::Text {
                        self.collect_directive(directive);
                    }
                    if let DirectiveContent::Blocks(children) = &mut directive.content {
                        self.collect_labels(children);
                    }
                }
                _ => for_each_child_list(block, |children| self.collect_labels(children)),
            }
        }
    }

    fn assign_slugs(&mut self, blocks: &mut [Block]) {
        for block in blocks {
            match block {
                Block::Heading { content, attrs, .. } => {
                    if attrs.id.is_none() {
                        let slug = self.slugger.slug(&plain_text(content));
                        attrs.id = (!slug.is_empty()).then_some(slug);
                    }
                }
                Block::Directive(directive) => {
                    if directive.name == DirectiveName::ColumnToc
                        && directive.kind != DirectiveKind::Text
                        && directive.attrs.id.is_none()
                    {
                        if let Some(title) = &directive.title {
                            let slug = self.slugger.slug(title);
                            directive.attrs.id = (!slug.is_empty()).then_some(slug);
                        }
                    }
                    if let DirectiveContent::Blocks(children) = &mut directive.content {
                        self.assign_slugs(children);
                    }
                }
                _ => for_each_child_list(block, |children| self.assign_slugs(children)),
            }
        }
    }

    fn collect_heading(&mut self, content: &mut Vec<Inline>, attrs: &mut Attributes) {
        let Some(raw) = strip_heading_label(content) else {
            return;
        };

        let id = normalize_id(&raw);
        let title = plain_text(content).trim().to_string();
        attrs.id = Some(id.clone());
        self.register(LabelInfo::new(id, LabelKind::Heading, title));
    }

    fn collect_directive(&mut self, directive: &mut DirectiveNode) {
        let line_label = match &mut directive.content {
            DirectiveContent::Blocks(blocks) => take_label_line(blocks),
            DirectiveContent::Inlines(_) => None,
        };
        let Some(raw) = directive.attribute("label").map(str::to_string).or(line_label) else {
            match directive.attribute("id").map(str::to_string) {
                Some(id) => self.slugger.reserve(&id),
                // The title slug is re-derived once every explicit id is taken
                None if directive.name == DirectiveName::ColumnToc => directive.attrs.id = None,
                None => {}
            }
            return;
        };

        let id = normalize_id(&raw);
        let title = directive.title.clone().unwrap_or_else(|| id.clone());
        directive.attrs.id = Some(id.clone());
        self.register(LabelInfo::new(id, LabelKind::Column, title));
    }

    fn register(&mut self, info: LabelInfo) {
        let id = info.id.clone();
        self.slugger.reserve(&id);
        if self.index.add(info) {
            log::debug!("Registered label '{}'", id);
        } else {
            self.diagnostics.push(Diagnostic::DuplicateLabel { id });
        }
    }
}

/// Run `visit` over the nested block lists of quotes, notes and list items
fn for_each_child_list(block: &mut Block, mut visit: impl FnMut(&mut [Block])) {
    match block {
        Block::BlockQuote(children) | Block::FootnoteDefinition { content: children, .. } => {
            visit(children.as_mut_slice())
        }
        Block::List { items, .. } => {
            for item in items {
                visit(item.content.as_mut_slice());
            }
        }
        _ => {}
    }
}

/// Remove a leading `(id)=` from heading content, returning the raw id
///
/// The first text node loses the declaration; if nothing of it remains
/// the node itself is dropped.
pub fn strip_heading_label(content: &mut Vec<Inline>) -> Option<String> {
    let Some(Inline::Text(text)) = content.first_mut() else {
        return None;
    };
    let captures = LABEL_PREFIX.captures(text)?;
    let raw = captures[1].to_string();
    let matched_len = captures[0].len();

    text.replace_range(..matched_len, "");
    if text.is_empty() {
        content.remove(0);
        trim_start(content);
    }
    Some(raw)
}

/// Remove the first standalone `(id)=` line from the direct paragraphs
fn take_label_line(blocks: &mut Vec<Block>) -> Option<String> {
    for position in 0..blocks.len() {
        let Block::Paragraph(inlines) = &blocks[position] else {
            continue;
        };

        let lines = split_lines(inlines.clone());
        let found = lines.iter().position(|line| {
            line.content.iter().all(|inline| matches!(inline, Inline::Text(_)))
                && LABEL_LINE.is_match(plain_text(&line.content).trim())
        });
        let Some(line_index) = found else {
            continue;
        };

        let raw = LABEL_LINE
            .captures(plain_text(&lines[line_index].content).trim())
            .map(|captures| captures[1].to_string())?;

        let kept: Vec<_> = lines
            .into_iter()
            .enumerate()
            .filter_map(|(index, line)| (index != line_index).then_some(line))
            .collect();
        let remaining = join_lines(kept);
        if remaining.is_empty() {
            blocks.remove(position);
        } else {
            blocks[position] = Block::Paragraph(remaining);
        }
        return Some(raw);
    }
    None
}
