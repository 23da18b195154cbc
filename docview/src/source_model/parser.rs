//! Markdown event stream parser
//!
//! The document is first split into markdown runs and directive segments
//! by the fence scanner; each markdown run is then converted from
//! pulldown-cmark's event stream into blocks and inline trees.

use super::blocks::{Block, ListItem};
use super::directive::{matching_bracket, name_len, parse_attributes, DirectiveNode};
use super::fence::{segment, Segment};
use super::inline::{plain_text, push_inline, push_text, Inline, Link};
use super::types::Alignment;
use pulldown_cmark::{CodeBlockKind, Event, Options, Tag, TagEnd};
use std::collections::{BTreeMap, VecDeque};

/// pulldown-cmark options shared by every Markdown run of a document
///
/// Old-style footnotes are used so that a reference is emitted even when
/// its definition lives in another segment or is missing altogether.
pub fn parser_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_OLD_FOOTNOTES
        | Options::ENABLE_MATH
}

/// Parse a full document (directives included) into blocks
pub fn parse_document(source: &str) -> Vec<Block> {
    parse_segments(segment(source))
}

fn parse_segments(segments: Vec<Segment>) -> Vec<Block> {
    let mut blocks = Vec::new();
    for segment in segments {
        match segment {
            Segment::Markdown(text) => blocks.extend(MarkdownParser::parse(&text)),
            Segment::Container {
                name,
                label,
                attributes,
                children,
                spacing,
            } => {
                // A bracket label becomes the leading paragraph of the content
                let mut content = Vec::new();
                if let Some(label) = label.filter(|label| !label.trim().is_empty()) {
                    content.push(Block::Paragraph(parse_inline(&label)));
                }
                content.extend(parse_segments(children));
                blocks.push(Block::Directive(DirectiveNode::container(
                    &name, attributes, content, spacing,
                )));
            }
            Segment::Leaf {
                name,
                content,
                attributes,
                spacing,
            } => blocks.push(Block::Directive(DirectiveNode::leaf(
                &name,
                attributes,
                parse_inline(&content),
                spacing,
            ))),
        }
    }
    blocks
}

/// Parse a single line of markdown into inline content
///
/// The line is parsed as heading content so that leading list or quote
/// markers (`1.`, `-`, `>`) stay literal text.
pub fn parse_inline(text: &str) -> Vec<Inline> {
    let line = text.lines().next().unwrap_or_default().trim();
    if line.is_empty() {
        return Vec::new();
    }
    MarkdownParser::parse(&format!("# {}", line))
        .into_iter()
        .find_map(|block| match block {
            Block::Heading { content, .. } => Some(content),
            _ => None,
        })
        .unwrap_or_default()
}

/// Kinds of formatting span
#[derive(Debug, Clone, Copy)]
enum SpanKind {
    Emphasis,
    Strong,
    Strikethrough,
    Superscript,
    Subscript,
}

/// Open construct on the parser stack
enum Frame {
    BlockQuote(Vec<Block>),
    FootnoteDefinition {
        label: String,
        blocks: Vec<Block>,
    },
    List {
        start: Option<u64>,
        items: Vec<ListItem>,
    },
    /// List item; tight items receive inline content directly
    Item {
        task: Option<bool>,
        blocks: Vec<Block>,
        inlines: Vec<Inline>,
    },
    Paragraph(Vec<Inline>),
    Heading {
        level: u8,
        inlines: Vec<Inline>,
    },
    CodeBlock {
        language: Option<String>,
        code: String,
    },
    HtmlBlock(String),
    Table {
        alignments: Vec<Alignment>,
        headers: Vec<Vec<Inline>>,
        rows: Vec<Vec<Vec<Inline>>>,
        current_row: Vec<Vec<Inline>>,
    },
    Cell(Vec<Inline>),
    Span(SpanKind, Vec<Inline>),
    Link {
        url: String,
        title: String,
        inlines: Vec<Inline>,
    },
    Image {
        url: String,
        title: String,
        inlines: Vec<Inline>,
    },
    /// Construct this model does not represent (content is discarded)
    Ignored,
}

/// Parser state for converting markdown events to blocks
pub struct MarkdownParser {
    /// Completed top-level blocks
    blocks: Vec<Block>,

    /// Open constructs, innermost last
    stack: Vec<Frame>,
}

impl MarkdownParser {
    /// Create a new parser
    pub fn new() -> Self {
        Self {
            blocks: Vec::new(),
            stack: Vec::new(),
        }
    }

    /// Parse a markdown run (no directive fences) into blocks
    ///
    /// # Parameters
    /// * `content` - Raw markdown content to parse
    ///
    /// # Returns
    /// * `Vec<Block>` - Parsed blocks in document order
    pub fn parse(content: &str) -> Vec<Block> {
        let mut parser = Self::new();
        for event in pulldown_cmark::Parser::new_ext(content, parser_options()) {
            parser.process_event(event);
        }
        parser.finalize()
    }

    /// Process a single markdown event
    fn process_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.handle_start_tag(tag),
            Event::End(tag_end) => self.handle_end_tag(tag_end),
            Event::Text(text) => self.handle_text(&text),
            Event::Code(code) => self.add_inline(Inline::Code(code.to_string())),
            Event::InlineMath(math) => self.add_inline(Inline::Math {
                source: math.to_string(),
                display: false,
                svg: None,
            }),
            Event::DisplayMath(math) => self.add_inline(Inline::Math {
                source: math.to_string(),
                display: true,
                svg: None,
            }),
            Event::Html(html) | Event::InlineHtml(html) => self.handle_html(&html),
            Event::FootnoteReference(label) => {
                self.add_inline(Inline::FootnoteReference(label.to_string()))
            }
            Event::SoftBreak => self.add_inline(Inline::SoftBreak),
            Event::HardBreak => self.add_inline(Inline::HardBreak),
            Event::Rule => self.add_block(Block::Rule),
            Event::TaskListMarker(checked) => self.handle_task_marker(checked),
        }
    }

    /// Handle opening tags
    fn handle_start_tag(&mut self, tag: Tag<'_>) {
        let frame = match tag {
            Tag::Paragraph => Frame::Paragraph(Vec::new()),
            Tag::Heading { level, .. } => Frame::Heading {
                level: level as u8,
                inlines: Vec::new(),
            },
            Tag::BlockQuote(_) => Frame::BlockQuote(Vec::new()),
            Tag::CodeBlock(kind) => Frame::CodeBlock {
                language: match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .map(str::to_string),
                    CodeBlockKind::Indented => None,
                },
                code: String::new(),
            },
            Tag::HtmlBlock => Frame::HtmlBlock(String::new()),
            Tag::List(start) => Frame::List {
                start,
                items: Vec::new(),
            },
            Tag::Item => Frame::Item {
                task: None,
                blocks: Vec::new(),
                inlines: Vec::new(),
            },
            Tag::FootnoteDefinition(label) => Frame::FootnoteDefinition {
                label: label.to_string(),
                blocks: Vec::new(),
            },
            Tag::Table(alignments) => Frame::Table {
                alignments: alignments.into_iter().map(Alignment::from).collect(),
                headers: Vec::new(),
                rows: Vec::new(),
                current_row: Vec::new(),
            },
            Tag::TableHead | Tag::TableRow => return,
            Tag::TableCell => Frame::Cell(Vec::new()),
            Tag::Emphasis => Frame::Span(SpanKind::Emphasis, Vec::new()),
            Tag::Strong => Frame::Span(SpanKind::Strong, Vec::new()),
            Tag::Strikethrough => Frame::Span(SpanKind::Strikethrough, Vec::new()),
            Tag::Superscript => Frame::Span(SpanKind::Superscript, Vec::new()),
            Tag::Subscript => Frame::Span(SpanKind::Subscript, Vec::new()),
            Tag::Link {
                dest_url, title, ..
            } => Frame::Link {
                url: dest_url.to_string(),
                title: title.to_string(),
                inlines: Vec::new(),
            },
            Tag::Image {
                dest_url, title, ..
            } => Frame::Image {
                url: dest_url.to_string(),
                title: title.to_string(),
                inlines: Vec::new(),
            },
            Tag::DefinitionList
            | Tag::DefinitionListTitle
            | Tag::DefinitionListDefinition
            | Tag::MetadataBlock(_) => Frame::Ignored,
        };
        self.stack.push(frame);
    }

    /// Handle closing tags
    fn handle_end_tag(&mut self, tag_end: TagEnd) {
        match tag_end {
            TagEnd::TableHead => {
                if let Some(Frame::Table {
                    headers,
                    current_row,
                    ..
                }) = self.stack.last_mut()
                {
                    *headers = std::mem::take(current_row);
                }
                return;
            }
            TagEnd::TableRow => {
                if let Some(Frame::Table {
                    rows, current_row, ..
                }) = self.stack.last_mut()
                {
                    rows.push(std::mem::take(current_row));
                }
                return;
            }
            _ => {}
        }

        let Some(frame) = self.stack.pop() else {
            return;
        };

        match frame {
            Frame::Paragraph(inlines) => {
                let inlines = extract_text_directives(inlines);
                if !inlines.is_empty() {
                    self.add_block(Block::Paragraph(inlines));
                }
            }
            Frame::Heading { level, inlines } => {
                self.add_block(Block::heading(level, extract_text_directives(inlines)));
            }
            Frame::BlockQuote(blocks) => self.add_block(Block::BlockQuote(blocks)),
            Frame::FootnoteDefinition { label, blocks } => {
                self.add_block(Block::FootnoteDefinition {
                    label,
                    content: blocks,
                })
            }
            Frame::CodeBlock { language, code } => {
                self.add_block(Block::CodeBlock { language, code })
            }
            Frame::HtmlBlock(html) => self.add_block(Block::Html(html)),
            Frame::List { start, items } => self.add_block(Block::List {
                start,
                items,
                attrs: Default::default(),
            }),
            Frame::Item {
                task,
                mut blocks,
                inlines,
            } => {
                let inlines = extract_text_directives(inlines);
                if !inlines.is_empty() {
                    blocks.push(Block::Paragraph(inlines));
                }
                if let Some(Frame::List { items, .. }) = self.stack.last_mut() {
                    let mut item = ListItem::new(blocks);
                    item.task = task;
                    items.push(item);
                }
            }
            Frame::Table {
                alignments,
                headers,
                rows,
                ..
            } => self.add_block(Block::Table {
                alignments,
                headers,
                rows,
            }),
            Frame::Cell(inlines) => {
                if let Some(Frame::Table { current_row, .. }) = self.stack.last_mut() {
                    current_row.push(extract_text_directives(inlines));
                }
            }
            Frame::Span(kind, inlines) => self.add_inline(match kind {
                SpanKind::Emphasis => Inline::Emphasis(inlines),
                SpanKind::Strong => Inline::Strong(inlines),
                SpanKind::Strikethrough => Inline::Strikethrough(inlines),
                SpanKind::Superscript => Inline::Superscript(inlines),
                SpanKind::Subscript => Inline::Subscript(inlines),
            }),
            Frame::Link {
                url,
                title,
                inlines,
            } => self.add_inline(Inline::Link(Link {
                url,
                title,
                children: inlines,
                attrs: Default::default(),
            })),
            Frame::Image {
                url,
                title,
                inlines,
            } => self.add_inline(Inline::Image {
                url,
                title,
                alt: plain_text(&inlines),
            }),
            Frame::Ignored => {}
        }
    }

    /// Handle text content
    fn handle_text(&mut self, text: &str) {
        if let Some(Frame::CodeBlock { code, .. }) = self.stack.last_mut() {
            code.push_str(text);
            return;
        }
        if let Some(inlines) = self.inline_target() {
            push_text(inlines, text);
        }
    }

    /// Handle HTML content (kept in the tree, dropped by the renderer)
    fn handle_html(&mut self, html: &str) {
        if let Some(Frame::HtmlBlock(buffer)) = self.stack.last_mut() {
            buffer.push_str(html);
            return;
        }
        self.add_inline(Inline::Html(html.to_string()));
    }

    /// Handle task list marker
    fn handle_task_marker(&mut self, checked: bool) {
        let item = self.stack.iter_mut().rev().find_map(|frame| match frame {
            Frame::Item { task, .. } => Some(task),
            _ => None,
        });
        if let Some(task) = item {
            *task = Some(checked);
        }
    }

    /// Innermost inline container, if the innermost frame accepts inlines
    fn inline_target(&mut self) -> Option<&mut Vec<Inline>> {
        match self.stack.last_mut()? {
            Frame::Paragraph(inlines)
            | Frame::Heading { inlines, .. }
            | Frame::Cell(inlines)
            | Frame::Span(_, inlines)
            | Frame::Link { inlines, .. }
            | Frame::Image { inlines, .. }
            | Frame::Item { inlines, .. } => Some(inlines),
            _ => None,
        }
    }

    fn add_inline(&mut self, inline: Inline) {
        if let Some(inlines) = self.inline_target() {
            push_inline(inlines, inline);
        }
    }

    /// Add a finished block to the innermost block container
    fn add_block(&mut self, block: Block) {
        for frame in self.stack.iter_mut().rev() {
            match frame {
                Frame::BlockQuote(blocks) | Frame::FootnoteDefinition { blocks, .. } => {
                    blocks.push(block);
                    return;
                }
                Frame::Item {
                    blocks, inlines, ..
                } => {
                    // Text seen so far in a tight item forms its own paragraph
                    if !inlines.is_empty() {
                        let pending = extract_text_directives(std::mem::take(inlines));
                        blocks.push(Block::Paragraph(pending));
                    }
                    blocks.push(block);
                    return;
                }
                _ => {}
            }
        }
        self.blocks.push(block);
    }

    /// Close anything left open and return the blocks
    fn finalize(mut self) -> Vec<Block> {
        while !self.stack.is_empty() {
            self.handle_end_tag(TagEnd::Paragraph);
        }
        self.blocks
    }
}

impl Default for MarkdownParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Recognise text directives (`:name[content]{attrs}`) inside inline content
///
/// Bracket content may span several inline nodes, so `:note[some *em* text]`
/// keeps its formatting. At least one of `[..]` and `{..}` must follow the
/// name.
pub fn extract_text_directives(inlines: Vec<Inline>) -> Vec<Inline> {
    let inlines = rejoin_footnote_links(inlines);
    let mut input: VecDeque<Inline> = inlines.into_iter().map(descend).collect();
    let mut out = Vec::new();

    while let Some(node) = input.pop_front() {
        let Inline::Text(text) = node else {
            out.push(node);
            continue;
        };

        let Some((start, name_end)) = find_directive_start(&text) else {
            push_text(&mut out, &text);
            continue;
        };

        push_text(&mut out, &text[..start]);
        let name = &text[start + 1..name_end];
        match take_text_directive(name, &text[name_end..], &mut input) {
            Some((directive, remainder)) => {
                out.push(Inline::Directive(directive));
                if !remainder.is_empty() {
                    input.push_front(Inline::Text(remainder));
                }
            }
            None => {
                push_text(&mut out, &text[start..name_end]);
                input.push_front(Inline::Text(text[name_end..].to_string()));
            }
        }
    }

    out
}

/// Rebuild `[text[^a]](url)` as a link followed by its footnote references
///
/// pulldown-cmark resolves the reference first and then refuses the outer
/// link, leaving `[text`, the reference and `](url)` side by side.
fn rejoin_footnote_links(inlines: Vec<Inline>) -> Vec<Inline> {
    if !inlines
        .iter()
        .any(|inline| matches!(inline, Inline::FootnoteReference(_)))
    {
        return inlines;
    }

    let mut input: VecDeque<Inline> = inlines.into();
    let mut out: Vec<Inline> = Vec::new();

    while let Some(node) = input.pop_front() {
        if !matches!(node, Inline::FootnoteReference(_)) {
            out.push(node);
            continue;
        }

        let mut references = vec![node];
        while matches!(input.front(), Some(Inline::FootnoteReference(_))) {
            references.extend(input.pop_front());
        }

        let destination = match input.front() {
            Some(Inline::Text(text)) => link_destination(text),
            _ => None,
        };
        let (Some((url, consumed)), Some((index, offset))) = (destination, open_bracket(&out))
        else {
            out.extend(references);
            continue;
        };

        let rest = match input.pop_front() {
            Some(Inline::Text(text)) => text[consumed..].to_string(),
            _ => String::new(),
        };
        let mut children = out.split_off(index);
        if let Some(Inline::Text(first)) = children.first_mut() {
            let head = first[..offset].to_string();
            let tail = first[offset + 1..].to_string();
            push_text(&mut out, &head);
            if tail.is_empty() {
                children.remove(0);
            } else {
                *first = tail;
            }
        }

        let mut link = Link::with_text(url, "");
        link.children = children;
        out.push(Inline::Link(link));
        out.extend(references);
        if !rest.is_empty() {
            input.push_front(Inline::Text(rest));
        }
    }

    out
}

/// Position of the last unclosed `[` among text nodes, as (node, byte offset)
fn open_bracket(inlines: &[Inline]) -> Option<(usize, usize)> {
    inlines
        .iter()
        .enumerate()
        .rev()
        .find_map(|(index, inline)| match inline {
            Inline::Text(text) => text.rfind('[').map(|offset| (index, offset)),
            _ => None,
        })
        .filter(|(index, offset)| match &inlines[*index] {
            Inline::Text(text) => !text[*offset..].contains(']'),
            _ => false,
        })
}

/// Parse a leading `](url)`, returning the url and the bytes consumed
fn link_destination(text: &str) -> Option<(String, usize)> {
    let rest = text.strip_prefix("](")?;
    let close = rest.find(')')?;
    let raw = rest[..close].trim();
    let url = raw
        .strip_prefix('<')
        .and_then(|inner| inner.strip_suffix('>'))
        .unwrap_or(raw);
    if url.is_empty() || url.contains(char::is_whitespace) {
        return None;
    }
    Some((url.to_string(), 2 + close + 1))
}

fn descend(inline: Inline) -> Inline {
    match inline {
        Inline::Emphasis(children) => Inline::Emphasis(extract_text_directives(children)),
        Inline::Strong(children) => Inline::Strong(extract_text_directives(children)),
        Inline::Strikethrough(children) => {
            Inline::Strikethrough(extract_text_directives(children))
        }
        Inline::Superscript(children) => Inline::Superscript(extract_text_directives(children)),
        Inline::Subscript(children) => Inline::Subscript(extract_text_directives(children)),
        Inline::Link(mut link) => {
            link.children = extract_text_directives(link.children);
            Inline::Link(link)
        }
        other => other,
    }
}

/// Find `:name` followed by `[` or `{`, not preceded by a word character
///
/// Returns the byte offsets of the colon and of the end of the name.
fn find_directive_start(text: &str) -> Option<(usize, usize)> {
    let mut previous: Option<char> = None;
    for (index, c) in text.char_indices() {
        let preceded_by_word = previous.is_some_and(|p| p.is_alphanumeric() || p == ':');
        previous = Some(c);
        if c != ':' || preceded_by_word {
            continue;
        }
        let rest = &text[index + 1..];
        let len = name_len(rest);
        if len == 0 {
            continue;
        }
        let after = &rest[len..];
        if after.starts_with('[') || after.starts_with('{') {
            return Some((index, index + 1 + len));
        }
    }
    None
}

/// Parse the `[content]{attrs}` tail of a text directive
///
/// `rest` is the text immediately after the name. When the bracket does
/// not close within `rest`, following nodes of `input` are consumed up to
/// the text node holding the closing bracket. Returns the directive and
/// the text left over after it.
fn take_text_directive(
    name: &str,
    rest: &str,
    input: &mut VecDeque<Inline>,
) -> Option<(DirectiveNode, String)> {
    let mut content = Vec::new();
    let mut after: String;

    if rest.starts_with('[') {
        if let Some(close) = matching_bracket(rest) {
            push_text(&mut content, &rest[1..close]);
            after = rest[close + 1..].to_string();
        } else {
            let (node_index, offset) = find_spanning_close(&rest[1..], input)?;
            push_text(&mut content, &rest[1..]);
            for _ in 0..node_index {
                if let Some(node) = input.pop_front() {
                    push_inline(&mut content, node);
                }
            }
            let Some(Inline::Text(closing)) = input.pop_front() else {
                return None;
            };
            push_text(&mut content, &closing[..offset]);
            after = closing[offset + 1..].to_string();
        }
    } else {
        after = rest.to_string();
    }

    let mut attributes = BTreeMap::new();
    if after.starts_with('{') {
        if let Some((parsed, consumed)) = parse_attributes(&after) {
            attributes = parsed;
            after = after[consumed..].to_string();
        } else if !rest.starts_with('[') {
            return None;
        }
    }

    let content = extract_text_directives(content);
    Some((DirectiveNode::text(name, attributes, content), after))
}

/// Locate the closing bracket of an unbalanced `[` across following nodes
///
/// `open` is the text after the opening bracket in the first node. Returns
/// the index in `input` of the text node holding the close, and its byte
/// offset within that node.
fn find_spanning_close(open: &str, input: &VecDeque<Inline>) -> Option<(usize, usize)> {
    let mut depth = 1usize + bracket_balance(open);
    for (node_index, node) in input.iter().enumerate() {
        let Inline::Text(text) = node else {
            continue;
        };
        for (offset, c) in text.char_indices() {
            match c {
                '[' => depth += 1,
                ']' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some((node_index, offset));
                    }
                }
                _ => {}
            }
        }
    }
    None
}

/// Net count of unclosed `[` in `text` (never negative)
fn bracket_balance(text: &str) -> usize {
    let mut depth = 0usize;
    for c in text.chars() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    depth
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_model::directive::{DirectiveContent, DirectiveKind, DirectiveName};
    use pulldown_cmark::Parser;

    fn text(value: &str) -> Inline {
        Inline::Text(value.to_string())
    }

    #[test]
    fn test_standalone_image_wrapped_in_paragraph() {
        // Arrange: Markdown with only an image
        let markdown = "![alt text](image.png)";

        // Act: Parse markdown into events
        let events: Vec<Event> = Parser::new(markdown).collect();

        // Assert: Standalone images are wrapped in paragraph tags
        assert_eq!(events.len(), 5);
        assert!(matches!(events[0], Event::Start(Tag::Paragraph)));
        assert!(matches!(events[1], Event::Start(Tag::Image { .. })));
    }

    #[test]
    fn test_soft_breaks_kept_as_nodes() {
        // Arrange
        let markdown = "first line\nsecond line";

        // Act
        let blocks = MarkdownParser::parse(markdown);

        // Assert
        assert_eq!(
            blocks,
            vec![Block::Paragraph(vec![
                text("first line"),
                Inline::SoftBreak,
                text("second line"),
            ])]
        );
    }

    #[test]
    fn test_footnote_inside_link_text_keeps_the_link() {
        // Arrange
        let markdown = "Read [the *guide*[^g]](http://example.com) first.";

        // Act
        let blocks = MarkdownParser::parse(markdown);

        // Assert
        let Block::Paragraph(inlines) = &blocks[0] else {
            panic!("expected paragraph, got {:?}", blocks[0]);
        };
        assert_eq!(inlines.len(), 4, "{:?}", inlines);
        assert_eq!(inlines[0], text("Read "));
        let Inline::Link(link) = &inlines[1] else {
            panic!("expected link, got {:?}", inlines[1]);
        };
        assert_eq!(link.url, "http://example.com");
        assert_eq!(plain_text(&link.children), "the guide");
        assert_eq!(inlines[2], Inline::FootnoteReference("g".to_string()));
        assert_eq!(inlines[3], text(" first."));
    }

    #[test]
    fn test_footnote_after_plain_brackets_untouched() {
        let blocks = MarkdownParser::parse("[draft] then[^d]](x) tail");

        let Block::Paragraph(inlines) = &blocks[0] else {
            panic!("expected paragraph");
        };
        assert!(!inlines.iter().any(|inline| matches!(inline, Inline::Link(_))));
        assert!(inlines.contains(&Inline::FootnoteReference("d".to_string())));
    }

    #[test]
    fn test_adjacent_text_events_merged() {
        // Arrange: brackets without a link definition arrive as separate events
        let markdown = "a [b] c";

        // Act
        let blocks = MarkdownParser::parse(markdown);

        // Assert
        assert_eq!(blocks, vec![Block::Paragraph(vec![text("a [b] c")])]);
    }

    #[test]
    fn test_tight_list_items_get_paragraphs() {
        // Arrange
        let markdown = "- [x] done\n- plain\n  - nested\n";

        // Act
        let blocks = MarkdownParser::parse(markdown);

        // Assert
        let Block::List { start, items, .. } = &blocks[0] else {
            panic!("expected list, got {:?}", blocks);
        };
        assert_eq!(*start, None);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].task, Some(true));
        assert_eq!(items[0].content, vec![Block::Paragraph(vec![text("done")])]);
        assert_eq!(items[1].content.len(), 2);
        assert!(matches!(items[1].content[1], Block::List { .. }));
    }

    #[test]
    fn test_footnote_reference_without_definition() {
        // Arrange
        let markdown = "See[^missing] here.";

        // Act
        let blocks = MarkdownParser::parse(markdown);

        // Assert
        assert_eq!(
            blocks,
            vec![Block::Paragraph(vec![
                text("See"),
                Inline::FootnoteReference("missing".to_string()),
                text(" here."),
            ])]
        );
    }

    #[test]
    fn test_footnote_definition_block() {
        let blocks = MarkdownParser::parse("Text[^a]\n\n[^a]: The note.\n");

        assert_eq!(blocks.len(), 2);
        match &blocks[1] {
            Block::FootnoteDefinition { label, content } => {
                assert_eq!(label, "a");
                assert_eq!(content, &vec![Block::Paragraph(vec![text("The note.")])]);
            }
            other => panic!("expected footnote definition, got {:?}", other),
        }
    }

    #[test]
    fn test_table_cells() {
        let blocks = MarkdownParser::parse("| A | B |\n|:--|--:|\n| 1 | 2 |\n");

        match &blocks[0] {
            Block::Table {
                alignments,
                headers,
                rows,
            } => {
                assert_eq!(alignments, &vec![Alignment::Left, Alignment::Right]);
                assert_eq!(headers, &vec![vec![text("A")], vec![text("B")]]);
                assert_eq!(rows, &vec![vec![vec![text("1")], vec![text("2")]]]);
            }
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn test_math_events() {
        let blocks = MarkdownParser::parse("Inline $x^2$ math");

        assert_eq!(
            blocks,
            vec![Block::Paragraph(vec![
                text("Inline "),
                Inline::Math {
                    source: "x^2".to_string(),
                    display: false,
                    svg: None,
                },
                text(" math"),
            ])]
        );
    }

    #[test]
    fn test_parse_document_with_container() {
        // Arrange
        let source = "Intro\n\n:::column{label=side}\nInside **bold**\n:::\n";

        // Act
        let blocks = parse_document(source);

        // Assert
        assert_eq!(blocks.len(), 2);
        let Block::Directive(directive) = &blocks[1] else {
            panic!("expected directive, got {:?}", blocks[1]);
        };
        assert_eq!(directive.kind, DirectiveKind::Container);
        assert_eq!(directive.name, DirectiveName::Column);
        assert_eq!(directive.attribute("label"), Some("side"));
        assert_eq!(
            directive.blocks(),
            &[Block::Paragraph(vec![
                text("Inside "),
                Inline::Strong(vec![text("bold")]),
            ])]
        );
    }

    #[test]
    fn test_text_directive_in_single_node() {
        // Arrange
        let inlines = vec![text("Before :annotation[an aside]{.x} after")];

        // Act
        let result = extract_text_directives(inlines);

        // Assert
        assert_eq!(result.len(), 3);
        assert_eq!(result[0], text("Before "));
        let Inline::Directive(directive) = &result[1] else {
            panic!("expected directive, got {:?}", result[1]);
        };
        assert_eq!(directive.kind, DirectiveKind::Text);
        assert_eq!(directive.name, DirectiveName::Annotation);
        assert_eq!(
            directive.content,
            DirectiveContent::Inlines(vec![text("an aside")])
        );
        assert_eq!(directive.attribute("class"), Some("x"));
        assert_eq!(result[2], text(" after"));
    }

    #[test]
    fn test_text_directive_spanning_formatting() {
        // Arrange: pulldown-cmark splits the bracket content around the emphasis
        let blocks = MarkdownParser::parse("See :annotation[some *em* text] end");

        // Act
        let Block::Paragraph(inlines) = &blocks[0] else {
            panic!("expected paragraph, got {:?}", blocks);
        };

        // Assert
        assert_eq!(inlines.len(), 3);
        let Inline::Directive(directive) = &inlines[1] else {
            panic!("expected directive, got {:?}", inlines[1]);
        };
        assert_eq!(
            directive.content,
            DirectiveContent::Inlines(vec![
                text("some "),
                Inline::Emphasis(vec![text("em")]),
                text(" text"),
            ])
        );
        assert_eq!(inlines[2], text(" end"));
    }

    #[test]
    fn test_prose_colons_are_not_directives() {
        let inlines = vec![text("At 10:30 note: see http://x.y and a:b[c]")];

        let result = extract_text_directives(inlines.clone());

        assert_eq!(result, inlines);
    }

    #[test]
    fn test_unclosed_bracket_left_literal() {
        let inlines = vec![text("Open :note[never closed")];

        let result = extract_text_directives(inlines.clone());

        assert_eq!(result, inlines);
    }
}
