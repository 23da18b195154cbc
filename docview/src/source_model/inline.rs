//! Inline (phrasing) content
//!
//! Inline nodes form a small tree: formatting containers and links own
//! their children, everything else is a leaf. Line structure inside a
//! paragraph is kept through explicit break nodes because the directive
//! metadata and label rules are line based.

use super::directive::DirectiveNode;
use super::types::Attributes;

/// Inline markdown element
#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    /// Plain text (adjacent text is always merged into one node)
    Text(String),

    /// Inline code span
    Code(String),

    /// Emphasised content (`*x*`)
    Emphasis(Vec<Inline>),

    /// Strong content (`**x**`)
    Strong(Vec<Inline>),

    /// Struck-through content (`~~x~~`)
    Strikethrough(Vec<Inline>),

    /// Superscript content
    Superscript(Vec<Inline>),

    /// Subscript content
    Subscript(Vec<Inline>),

    /// A hyperlink, including resolved references and annotation markers
    Link(Link),

    /// An image
    Image {
        /// Image source URL
        url: String,
        /// Optional title text
        title: String,
        /// Alternative text (plain)
        alt: String,
    },

    /// Math, inline (`$..$`) or display (`$$..$$`)
    Math {
        /// Formula source
        source: String,
        /// Whether this is display math
        display: bool,
        /// Typeset vector graphic, once the math pass has run
        svg: Option<String>,
    },

    /// Classic footnote reference (`[^id]`)
    FootnoteReference(String),

    /// Line break from a single newline in the source
    SoftBreak,

    /// Explicit line break (two trailing spaces or backslash)
    HardBreak,

    /// Inline raw HTML (never rendered)
    Html(String),

    /// Text directive (`:name[content]{attrs}`)
    Directive(DirectiveNode),
}

/// A hyperlink with its visible content and output attributes
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    /// Link target
    pub url: String,

    /// Link title (tooltip)
    pub title: String,

    /// Visible content
    pub children: Vec<Inline>,

    /// Output attributes (reference metadata, classes)
    pub attrs: Attributes,
}

impl Link {
    /// Create a link with plain-text content
    pub fn with_text(url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: String::new(),
            children: vec![Inline::Text(text.into())],
            attrs: Attributes::new(),
        }
    }
}

impl Inline {
    /// Whether this node is a line break of either kind
    pub fn is_break(&self) -> bool {
        matches!(self, Inline::SoftBreak | Inline::HardBreak)
    }
}

/// One line of a paragraph together with the break that ended it
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    /// Inline content of the line
    pub content: Vec<Inline>,

    /// Break node that terminated the line (`None` for the last line)
    pub terminator: Option<Inline>,
}

/// Append text to an inline list, merging with a trailing text node
pub fn push_text(inlines: &mut Vec<Inline>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Inline::Text(last)) = inlines.last_mut() {
        last.push_str(text);
        return;
    }
    inlines.push(Inline::Text(text.to_string()));
}

/// Push an inline node, merging text into a trailing text node
pub fn push_inline(inlines: &mut Vec<Inline>, inline: Inline) {
    match inline {
        Inline::Text(text) => push_text(inlines, &text),
        other => inlines.push(other),
    }
}

/// Plain text of an inline list (formatting stripped, breaks as spaces)
pub fn plain_text(inlines: &[Inline]) -> String {
    let mut out = String::new();
    for inline in inlines {
        write_plain_text(&mut out, inline);
    }
    out
}

fn write_plain_text(out: &mut String, inline: &Inline) {
    match inline {
        Inline::Text(text) | Inline::Code(text) => out.push_str(text),
        Inline::Emphasis(children)
        | Inline::Strong(children)
        | Inline::Strikethrough(children)
        | Inline::Superscript(children)
        | Inline::Subscript(children) => {
            for child in children {
                write_plain_text(out, child);
            }
        }
        Inline::Link(link) => {
            for child in &link.children {
                write_plain_text(out, child);
            }
        }
        Inline::Image { alt, .. } => out.push_str(alt),
        Inline::Math { source, .. } => out.push_str(source),
        Inline::SoftBreak | Inline::HardBreak => out.push(' '),
        Inline::Directive(directive) => out.push_str(&directive.inline_text()),
        Inline::FootnoteReference(_) | Inline::Html(_) => {}
    }
}

/// Split a paragraph's inline content into lines at break nodes
pub fn split_lines(inlines: Vec<Inline>) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut current = Vec::new();
    for inline in inlines {
        if inline.is_break() {
            lines.push(Line {
                content: std::mem::take(&mut current),
                terminator: Some(inline),
            });
        } else {
            current.push(inline);
        }
    }
    lines.push(Line {
        content: current,
        terminator: None,
    });
    lines
}

/// Join lines back into inline content, dropping the final terminator
/// and trimming whitespace at both ends
pub fn join_lines(lines: Vec<Line>) -> Vec<Inline> {
    let count = lines.len();
    let mut out = Vec::new();
    for (index, line) in lines.into_iter().enumerate() {
        for inline in line.content {
            push_inline(&mut out, inline);
        }
        if index + 1 < count {
            if let Some(terminator) = line.terminator {
                out.push(terminator);
            }
        }
    }
    trim_inlines(out)
}

/// Remove leading/trailing breaks and whitespace from inline content
pub fn trim_inlines(mut inlines: Vec<Inline>) -> Vec<Inline> {
    while inlines.last().is_some_and(Inline::is_break) {
        inlines.pop();
    }
    while inlines.first().is_some_and(Inline::is_break) {
        inlines.remove(0);
    }
    trim_start(&mut inlines);
    trim_end(&mut inlines);
    inlines
}

/// Trim leading whitespace from the first text node, dropping it if emptied
pub fn trim_start(inlines: &mut Vec<Inline>) {
    if let Some(Inline::Text(text)) = inlines.first_mut() {
        let trimmed = text.trim_start();
        if trimmed.is_empty() {
            inlines.remove(0);
        } else if trimmed.len() != text.len() {
            *text = trimmed.to_string();
        }
    }
}

/// Trim trailing whitespace from the last text node, dropping it if emptied
pub fn trim_end(inlines: &mut Vec<Inline>) {
    if let Some(Inline::Text(text)) = inlines.last_mut() {
        let trimmed_len = text.trim_end().len();
        if trimmed_len == 0 {
            inlines.pop();
        } else {
            text.truncate(trimmed_len);
        }
    }
}
