//! Line-level directive fence recognition
//!
//! The segmenter and the stray-closer cleanup both classify lines with
//! [`classify_line`], so a line the segmenter leaves as text is judged by
//! the same rules when it is cleaned up.

use super::directive::{matching_bracket, name_len, parse_attributes, Spacing};
use std::collections::BTreeMap;

/// Classification of a single source line
#[derive(Debug, Clone, PartialEq)]
pub enum FenceLine<'a> {
    /// Code fence (```` ``` ```` or `~~~` run of at least three)
    CodeFence { marker: char, len: usize },

    /// Container directive opener (`:::name[label]{attrs}`)
    Open {
        name: &'a str,
        label: Option<&'a str>,
        attributes: BTreeMap<String, String>,
    },

    /// Leaf directive (`::name[content]{attrs}`)
    Leaf {
        name: &'a str,
        content: &'a str,
        attributes: BTreeMap<String, String>,
    },

    /// Container closer (three or more `:` and nothing else)
    Close,

    /// Anything else
    Other,
}

/// Classify one line (without its line ending)
///
/// Code fences may be indented. Directive fences must start in the first
/// column: an indented `:::` line is list or code content and stays text.
pub fn classify_line(line: &str) -> FenceLine<'_> {
    let trimmed = line.trim();

    if let Some(marker) = trimmed.chars().next().filter(|c| *c == '`' || *c == '~') {
        let len = trimmed.chars().take_while(|c| *c == marker).count();
        if len >= 3 {
            return FenceLine::CodeFence { marker, len };
        }
        return FenceLine::Other;
    }

    if line.starts_with(char::is_whitespace) {
        return FenceLine::Other;
    }

    let colons = trimmed.chars().take_while(|c| *c == ':').count();
    if colons >= 3 && colons == trimmed.len() {
        return FenceLine::Close;
    }

    match colons {
        2 => classify_leaf(&trimmed[2..]),
        n if n >= 3 => classify_open(&trimmed[n..]),
        _ => FenceLine::Other,
    }
}

/// Whether `line` closes the code fence opened with `marker` x `len`
pub fn closes_code_fence(line: &str, marker: char, len: usize) -> bool {
    match classify_line(line) {
        FenceLine::CodeFence {
            marker: closing,
            len: closing_len,
        } => closing == marker && closing_len >= len && line.trim().len() == closing_len,
        _ => false,
    }
}

fn classify_open(rest: &str) -> FenceLine<'_> {
    // `::: name` is accepted as well as `:::name`
    let rest = rest.trim_start();
    let name_end = name_len(rest);
    if name_end == 0 {
        return FenceLine::Other;
    }
    let name = &rest[..name_end];
    let mut tail = &rest[name_end..];

    let mut label = None;
    if tail.starts_with('[') {
        match matching_bracket(tail) {
            Some(close) => {
                label = Some(&tail[1..close]);
                tail = &tail[close + 1..];
            }
            None => return FenceLine::Other,
        }
    }

    let tail = tail.trim_start();
    let attributes = if tail.starts_with('{') {
        match parse_attributes(tail) {
            Some((attributes, consumed)) if tail[consumed..].trim().is_empty() => attributes,
            _ => return FenceLine::Other,
        }
    } else if tail.is_empty() {
        BTreeMap::new()
    } else {
        return FenceLine::Other;
    };

    FenceLine::Open {
        name,
        label,
        attributes,
    }
}

fn classify_leaf(rest: &str) -> FenceLine<'_> {
    let name_end = name_len(rest);
    if name_end == 0 {
        return FenceLine::Other;
    }
    let name = &rest[..name_end];
    let mut tail = &rest[name_end..];

    let mut content = "";
    let mut has_brackets = false;
    if tail.starts_with('[') {
        let Some(close) = matching_bracket(tail) else {
            return FenceLine::Other;
        };
        content = &tail[1..close];
        tail = &tail[close + 1..];
        has_brackets = true;
    }

    let mut attributes = BTreeMap::new();
    if tail.starts_with('{') {
        match parse_attributes(tail) {
            Some((parsed, consumed)) => {
                attributes = parsed;
                tail = &tail[consumed..];
            }
            None => return FenceLine::Other,
        }
    } else if !has_brackets {
        // `::name` alone is prose, not a directive
        return FenceLine::Other;
    }

    if !tail.trim().is_empty() {
        return FenceLine::Other;
    }

    FenceLine::Leaf {
        name,
        content,
        attributes,
    }
}

/// A piece of the document as split by the fence scanner
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Plain markdown, handed to the markdown parser
    Markdown(String),

    /// Container directive with recursively segmented content
    Container {
        name: String,
        label: Option<String>,
        attributes: BTreeMap<String, String>,
        children: Vec<Segment>,
        spacing: Spacing,
    },

    /// Leaf directive with its raw inline content
    Leaf {
        name: String,
        content: String,
        attributes: BTreeMap<String, String>,
        spacing: Spacing,
    },
}

struct Frame {
    name: String,
    label: Option<String>,
    attributes: BTreeMap<String, String>,
    blank_before: bool,
    children: Vec<Segment>,
    buffer: String,
}

impl Frame {
    fn new(
        name: String,
        label: Option<String>,
        attributes: BTreeMap<String, String>,
        blank_before: bool,
    ) -> Self {
        Self {
            name,
            label,
            attributes,
            blank_before,
            children: Vec::new(),
            buffer: String::new(),
        }
    }

    fn flush(&mut self) {
        if !self.buffer.trim().is_empty() {
            self.children
                .push(Segment::Markdown(std::mem::take(&mut self.buffer)));
        }
        self.buffer.clear();
    }

    fn into_segment(mut self, blank_after: bool) -> Segment {
        self.flush();
        Segment::Container {
            name: self.name,
            label: self.label,
            attributes: self.attributes,
            children: self.children,
            spacing: Spacing {
                blank_before: self.blank_before,
                blank_after,
            },
        }
    }
}

/// Split a document into markdown runs and directive segments
///
/// A closer with no open container stays in the markdown run as text; an
/// opener with no closer extends to the end of the document.
pub fn segment(source: &str) -> Vec<Segment> {
    let lines: Vec<&str> = source.split_inclusive('\n').collect();
    let is_blank = |index: usize| lines.get(index).is_none_or(|line| line.trim().is_empty());

    let mut root = Frame::new(String::new(), None, BTreeMap::new(), true);
    let mut stack: Vec<Frame> = Vec::new();
    let mut code_fence: Option<(char, usize)> = None;

    for (index, raw) in lines.iter().enumerate() {
        let line = raw.trim_end_matches(['\n', '\r']);
        let nested = !stack.is_empty();
        let frame = stack.last_mut().unwrap_or(&mut root);

        if let Some((marker, len)) = code_fence {
            frame.buffer.push_str(raw);
            if closes_code_fence(line, marker, len) {
                code_fence = None;
            }
            continue;
        }

        // Start of a container counts as a blank line for spacing purposes
        let blank_before = index == 0
            || is_blank(index - 1)
            || (frame.buffer.is_empty() && frame.children.is_empty() && nested);

        match classify_line(line) {
            FenceLine::CodeFence { marker, len } => {
                code_fence = Some((marker, len));
                frame.buffer.push_str(raw);
            }
            FenceLine::Open {
                name,
                label,
                attributes,
            } => {
                frame.flush();
                stack.push(Frame::new(
                    name.to_string(),
                    label.map(str::to_string),
                    attributes,
                    blank_before,
                ));
            }
            FenceLine::Leaf {
                name,
                content,
                attributes,
            } => {
                frame.flush();
                frame.children.push(Segment::Leaf {
                    name: name.to_string(),
                    content: content.to_string(),
                    attributes,
                    spacing: Spacing {
                        blank_before,
                        blank_after: is_blank(index + 1),
                    },
                });
            }
            FenceLine::Close => match stack.pop() {
                Some(closed) => {
                    let segment = closed.into_segment(is_blank(index + 1));
                    stack.last_mut().unwrap_or(&mut root).children.push(segment);
                }
                None => root.buffer.push_str(raw),
            },
            // Any other `:::` line inside a container still opens a level
            FenceLine::Other if nested && line.starts_with(":::") => {
                frame.flush();
                stack.push(Frame::new(String::new(), None, BTreeMap::new(), blank_before));
            }
            FenceLine::Other => frame.buffer.push_str(raw),
        }
    }

    while let Some(unterminated) = stack.pop() {
        let segment = unterminated.into_segment(true);
        stack.last_mut().unwrap_or(&mut root).children.push(segment);
    }

    root.flush();
    root.children
}
