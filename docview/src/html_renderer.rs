//! HTML renderer for transformed documents
//!
//! This module turns a [`RenderedDocument`] into a standalone HTML page
//! with:
//! - A TOC sidebar built from the outline
//! - `id`, `class` and `data-*` attributes attached by the passes
//! - Typeset math inlined as SVG
//!
//! Output follows a fixed allow-list: raw HTML is never emitted, link and
//! image URLs with unknown schemes are dropped, and all text is escaped.

use crate::pipeline::RenderedDocument;
use crate::source_model::{
    Alignment, Attributes, Block, DirectiveContent, DirectiveKind, DirectiveNode, Inline, ListItem,
};
use crate::transform::TocItem;
use std::fs;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// URL schemes links and images may use; scheme-less URLs are always kept
const ALLOWED_SCHEMES: [&str; 3] = ["http", "https", "mailto"];

/// Errors that can occur while writing rendered HTML
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error writing {path}: {source}", path = .path.display())]
    IoError {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Render a document to an HTML file
///
/// # Parameters
/// * `rendered` - Output of the pipeline
/// * `site_title` - Site name shown in the sidebar and page title
/// * `output_path` - Path where the HTML file will be written
///
/// # Returns
/// * `Ok(())` - Successfully written
/// * `Err(RenderError)` - Error creating directories or writing the file
pub fn write_page(
    rendered: &RenderedDocument,
    site_title: &str,
    output_path: &Path,
) -> Result<(), RenderError> {
    let output = render_page(rendered, site_title);
    let io_error = |source| RenderError::IoError {
        path: output_path.to_path_buf(),
        source,
    };

    // Create parent directories if they don't exist
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent).map_err(io_error)?;
    }
    let mut file = fs::File::create(output_path).map_err(io_error)?;
    file.write_all(output.as_bytes()).map_err(io_error)?;

    Ok(())
}

/// Render a complete HTML page
pub fn render_page(rendered: &RenderedDocument, site_title: &str) -> String {
    let mut output = String::new();

    let page_title = if rendered.title.is_empty() {
        site_title.to_string()
    } else {
        format!("{} - {}", rendered.title, site_title)
    };
    write_html_header(&mut output, &page_title);

    output.push_str("<body>\n<div class=\"layout\">\n");

    output.push_str("<nav class=\"toc-sidebar\">\n");
    output.push_str(&format!(
        "<p class=\"site-title\">{}</p>\n",
        escape_html(site_title)
    ));
    if !rendered.toc.is_empty() {
        write_toc(&mut output, &rendered.toc);
    }
    output.push_str("</nav>\n");

    output.push_str("<main class=\"container\">\n<article class=\"content\">\n");
    output.push_str(&render_blocks(&rendered.document.blocks));
    output.push_str("</article>\n</main>\n");

    output.push_str("</div>\n</body>\n</html>\n");
    output
}

/// Render blocks as an HTML fragment
pub fn render_blocks(blocks: &[Block]) -> String {
    let mut output = String::new();
    for block in blocks {
        write_block(&mut output, block);
    }
    output
}

/// Write HTML header with CSS styling
fn write_html_header(output: &mut String, title: &str) {
    output.push_str("<!DOCTYPE html>\n");
    output.push_str("<html lang=\"en\">\n");
    output.push_str("<head>\n");
    output.push_str("<meta charset=\"UTF-8\">\n");
    output.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
    output.push_str(&format!("<title>{}</title>\n", escape_html(title)));
    output.push_str("<style>\n");
    output.push_str(CSS_STYLES);
    output.push_str("</style>\n");
    output.push_str("</head>\n");
}

/// Write the outline as nested lists
fn write_toc(output: &mut String, items: &[TocItem]) {
    output.push_str("<ul class=\"toc\">\n");
    for item in items {
        output.push_str(&format!(
            "<li class=\"toc-level-{}\"><a href=\"#{}\">{}</a>",
            item.level,
            escape_html(&item.id),
            escape_html(&item.text)
        ));
        if !item.children.is_empty() {
            output.push('\n');
            write_toc(output, &item.children);
        }
        output.push_str("</li>\n");
    }
    output.push_str("</ul>\n");
}

fn write_block(output: &mut String, block: &Block) {
    match block {
        Block::Heading {
            level,
            content,
            attrs,
        } => {
            let h_level = (*level).clamp(1, 6);
            output.push_str(&format!(
                "<h{}{}>{}</h{}>\n",
                h_level,
                attrs_html(attrs),
                inlines_to_html(content),
                h_level
            ));
        }

        Block::Paragraph(content) => {
            output.push_str(&format!("<p>{}</p>\n", inlines_to_html(content)));
        }

        Block::CodeBlock { language, code } => {
            if let Some(lang) = language {
                output.push_str(&format!(
                    "<pre><code class=\"language-{}\">{}</code></pre>\n",
                    escape_html(lang),
                    escape_html(code)
                ));
            } else {
                output.push_str(&format!("<pre><code>{}</code></pre>\n", escape_html(code)));
            }
        }

        Block::BlockQuote(blocks) => {
            output.push_str("<blockquote>\n");
            for inner_block in blocks {
                write_block(output, inner_block);
            }
            output.push_str("</blockquote>\n");
        }

        Block::List {
            start,
            items,
            attrs,
        } => write_list(output, *start, items, attrs),

        Block::Table {
            alignments,
            headers,
            rows,
        } => write_table(output, alignments, headers, rows),

        Block::Rule => output.push_str("<hr>\n"),

        Block::FootnoteDefinition { label, content } => {
            output.push_str(&format!(
                "<div class=\"footnote-definition\" id=\"fn-{}\">\n",
                escape_html(label)
            ));
            for inner_block in content {
                write_block(output, inner_block);
            }
            output.push_str("</div>\n");
        }

        Block::Directive(directive) => write_directive(output, directive),

        // Raw HTML is outside the allow-list
        Block::Html(_) => {}
    }
}

/// Write a container or leaf directive
fn write_directive(output: &mut String, directive: &DirectiveNode) {
    let tag = directive.kind.tag();
    output.push_str(&format!(
        "<{}{}{}>\n",
        tag,
        attrs_html(&directive.attrs),
        style_html(&directive.attrs)
    ));

    if directive.name.is_column() {
        if let Some(title) = directive.title.as_deref().filter(|title| !title.is_empty()) {
            let title_style = directive
                .attrs
                .data("title-color")
                .filter(|value| is_safe_style_value(value))
                .map(|value| format!(" style=\"background-color: {};\"", escape_html(value)))
                .unwrap_or_default();
            output.push_str(&format!(
                "<div class=\"directive-title\"{}>{}</div>\n",
                title_style,
                escape_html(title)
            ));
        }
    }

    match directive.kind {
        DirectiveKind::Container => {
            output.push_str("<div class=\"directive-content\">\n");
            for block in directive.blocks() {
                write_block(output, block);
            }
            output.push_str("</div>\n");
        }
        DirectiveKind::Leaf | DirectiveKind::Text => {
            if let DirectiveContent::Inlines(inlines) = &directive.content {
                output.push_str(&inlines_to_html(inlines));
                output.push('\n');
            }
        }
    }

    output.push_str(&format!("</{}>\n", tag));
}

/// Write a list to output
fn write_list(output: &mut String, start: Option<u64>, items: &[ListItem], attrs: &Attributes) {
    let is_task_list = items.iter().any(|item| item.task.is_some());
    let mut list_attrs = attrs.clone();
    if is_task_list {
        list_attrs.add_class("task-list");
    }

    match start {
        Some(start_num) => output.push_str(&format!(
            "<ol start=\"{}\"{}>\n",
            start_num,
            attrs_html(&list_attrs)
        )),
        None => output.push_str(&format!("<ul{}>\n", attrs_html(&list_attrs))),
    }

    for item in items {
        write_list_item(output, item);
    }

    if start.is_some() {
        output.push_str("</ol>\n");
    } else {
        output.push_str("</ul>\n");
    }
}

/// Write a single list item to output
fn write_list_item(output: &mut String, item: &ListItem) {
    let mut attrs = item.attrs.clone();
    let checkbox = match item.task {
        Some(true) => {
            attrs.add_class("task-list-item");
            "<input type=\"checkbox\" checked disabled> "
        }
        Some(false) => {
            attrs.add_class("task-list-item");
            "<input type=\"checkbox\" disabled> "
        }
        None => "",
    };
    output.push_str(&format!("<li{}>{}", attrs_html(&attrs), checkbox));

    // Write first paragraph inline with <li>
    let mut blocks = item.content.iter();
    if let Some(first_block) = blocks.next() {
        match first_block {
            Block::Paragraph(content) => output.push_str(&inlines_to_html(content)),
            other => {
                output.push('\n');
                write_block(output, other);
            }
        }
    }

    // Write remaining blocks as nested content
    for block in blocks {
        output.push('\n');
        write_block(output, block);
    }

    output.push_str("</li>\n");
}

/// Write a table as HTML
fn write_table(
    output: &mut String,
    alignments: &[Alignment],
    headers: &[Vec<Inline>],
    rows: &[Vec<Vec<Inline>>],
) {
    output.push_str("<table>\n<thead>\n<tr>\n");

    // Write header row
    for (i, header) in headers.iter().enumerate() {
        let align = alignments.get(i).copied().unwrap_or(Alignment::None);
        output.push_str(&format!(
            "<th{}>{}</th>\n",
            get_align_attr(align),
            inlines_to_html(header)
        ));
    }

    output.push_str("</tr>\n</thead>\n<tbody>\n");

    // Write data rows
    for row in rows {
        output.push_str("<tr>\n");
        for (i, cell) in row.iter().enumerate() {
            let align = alignments.get(i).copied().unwrap_or(Alignment::None);
            output.push_str(&format!(
                "<td{}>{}</td>\n",
                get_align_attr(align),
                inlines_to_html(cell)
            ));
        }
        output.push_str("</tr>\n");
    }

    output.push_str("</tbody>\n</table>\n");
}

/// Convert inline content to an HTML string
fn inlines_to_html(inlines: &[Inline]) -> String {
    let mut result = String::new();
    for inline in inlines {
        write_inline(&mut result, inline);
    }
    result
}

fn write_inline(output: &mut String, inline: &Inline) {
    match inline {
        Inline::Text(text) => output.push_str(&text_to_html(text)),
        Inline::Code(code) => output.push_str(&format!("<code>{}</code>", escape_html(code))),
        Inline::Emphasis(children) => wrap(output, "em", children),
        Inline::Strong(children) => wrap(output, "strong", children),
        Inline::Strikethrough(children) => wrap(output, "del", children),
        Inline::Superscript(children) => wrap(output, "sup", children),
        Inline::Subscript(children) => wrap(output, "sub", children),
        Inline::Link(link) => {
            let content = inlines_to_html(&link.children);
            if !is_allowed_url(&link.url) {
                output.push_str(&content);
                return;
            }
            let title = if link.title.is_empty() {
                String::new()
            } else {
                format!(" title=\"{}\"", escape_html(&link.title))
            };
            output.push_str(&format!(
                "<a href=\"{}\"{}{}>{}</a>",
                escape_html(&link.url),
                title,
                attrs_html(&link.attrs),
                content
            ));
        }
        Inline::Image { url, title, alt } => {
            if !is_allowed_url(url) {
                output.push_str(&escape_html(alt));
                return;
            }
            let title = if title.is_empty() {
                String::new()
            } else {
                format!(" title=\"{}\"", escape_html(title))
            };
            output.push_str(&format!(
                "<img src=\"{}\" alt=\"{}\"{}>",
                escape_html(url),
                escape_html(alt),
                title
            ));
        }
        Inline::Math {
            source,
            display,
            svg,
        } => {
            let class = if *display { "math math-display" } else { "math math-inline" };
            let body = match svg {
                Some(svg) => svg.clone(),
                None => escape_html(source),
            };
            output.push_str(&format!("<span class=\"{}\">{}</span>", class, body));
        }
        Inline::FootnoteReference(label) => {
            output.push_str(&format!(
                "<sup class=\"footnote-ref\"><a href=\"#fn-{}\">{}</a></sup>",
                escape_html(label),
                escape_html(label)
            ));
        }
        Inline::SoftBreak | Inline::HardBreak => output.push_str("<br>\n"),
        Inline::Html(_) => {}
        Inline::Directive(directive) => {
            output.push_str(&format!(
                "<span{}{}>",
                attrs_html(&directive.attrs),
                style_html(&directive.attrs)
            ));
            if let DirectiveContent::Inlines(children) = &directive.content {
                output.push_str(&inlines_to_html(children));
            }
            output.push_str("</span>");
        }
    }
}

fn wrap(output: &mut String, tag: &str, children: &[Inline]) {
    output.push_str(&format!("<{}>{}</{}>", tag, inlines_to_html(children), tag));
}

/// Escape text and turn `✅` into a styled icon
fn text_to_html(text: &str) -> String {
    escape_html(text).replace('✅', "<span class=\"check-icon\" aria-label=\"done\">✓</span>")
}

/// Render `id`, `class` and `data-*` attributes
fn attrs_html(attrs: &Attributes) -> String {
    let mut out = String::new();
    if let Some(id) = &attrs.id {
        out.push_str(&format!(" id=\"{}\"", escape_html(id)));
    }
    if !attrs.classes.is_empty() {
        out.push_str(&format!(" class=\"{}\"", escape_html(&attrs.class_list())));
    }
    for (key, value) in &attrs.data {
        if key.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            out.push_str(&format!(" data-{}=\"{}\"", key, escape_html(value)));
        }
    }
    out
}

/// Inline style derived from column metadata
fn style_html(attrs: &Attributes) -> String {
    let properties = [
        ("color", "color"),
        ("background", "background"),
        ("border-color", "border-color"),
        ("border-width", "border-width"),
        ("border-style", "border-style"),
    ];
    let declarations: Vec<String> = properties
        .iter()
        .filter_map(|(key, property)| {
            let value = attrs.data(key).filter(|value| is_safe_style_value(value))?;
            Some(format!("{}: {};", property, value))
        })
        .collect();

    if declarations.is_empty() {
        String::new()
    } else {
        format!(" style=\"{}\"", escape_html(&declarations.join(" ")))
    }
}

/// Colors, lengths and keywords only
fn is_safe_style_value(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '#' | '%' | '.' | ',' | ' ' | '-'))
}

/// Whether a URL passes the allow-list (known scheme or no scheme)
fn is_allowed_url(url: &str) -> bool {
    // Browsers drop tabs and newlines inside a URL and trim controls and spaces at its ends
    if url.chars().any(|c| c.is_ascii_control()) {
        return false;
    }
    let url = url.trim_start_matches(' ');
    let Some((scheme, _)) = url.split_once(':') else {
        return true;
    };
    let is_scheme = scheme.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if !is_scheme {
        return true;
    }
    ALLOWED_SCHEMES
        .iter()
        .any(|allowed| scheme.eq_ignore_ascii_case(allowed))
}

/// Get HTML align attribute for table cells
fn get_align_attr(align: Alignment) -> String {
    match align {
        Alignment::Left => " style=\"text-align: left;\"".to_string(),
        Alignment::Center => " style=\"text-align: center;\"".to_string(),
        Alignment::Right => " style=\"text-align: right;\"".to_string(),
        Alignment::None => String::new(),
    }
}

/// Escape HTML special characters
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Page styles
const CSS_STYLES: &str = r#"
* {
    margin: 0;
    padding: 0;
    box-sizing: border-box;
}

body {
    font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', 'Roboto', 'Oxygen',
                 'Ubuntu', 'Cantarell', 'Fira Sans', 'Droid Sans', 'Helvetica Neue',
                 sans-serif;
    line-height: 1.7;
    color: #333;
    background-color: #f5f5f5;
}

.layout {
    display: flex;
    align-items: flex-start;
    max-width: 1200px;
    margin: 0 auto;
    padding: 20px;
    gap: 24px;
}

.toc-sidebar {
    position: sticky;
    top: 20px;
    flex: 0 0 240px;
    max-height: calc(100vh - 40px);
    overflow-y: auto;
    font-size: 0.9em;
}

.site-title {
    font-weight: 700;
    margin-bottom: 12px;
}

.toc {
    list-style: none;
}

.toc .toc {
    padding-left: 14px;
}

.toc a {
    color: #555;
    text-decoration: none;
}

.toc a:hover {
    color: #0066cc;
}

.container {
    flex: 1;
    min-width: 0;
    background: white;
    padding: 48px;
    box-shadow: 0 2px 4px rgba(0, 0, 0, 0.1);
    border-radius: 4px;
}

.content h1, .content h2, .content h3, .content h4, .content h5, .content h6 {
    margin: 1.4em 0 0.6em;
    color: #1a1a1a;
    scroll-margin-top: 16px;
}

.content p, .content ul, .content ol, .content table, .content pre, .content blockquote {
    margin-bottom: 1em;
}

.content ul, .content ol {
    padding-left: 1.6em;
}

.content ul.task-list {
    list-style: none;
    padding-left: 0.4em;
}

.content pre {
    background: #f6f8fa;
    padding: 12px 16px;
    border-radius: 4px;
    overflow-x: auto;
}

.content code {
    font-family: 'SFMono-Regular', Consolas, 'Liberation Mono', Menlo, monospace;
    font-size: 0.9em;
}

.content blockquote {
    border-left: 4px solid #ddd;
    padding-left: 16px;
    color: #666;
}

.content table {
    border-collapse: collapse;
}

.content th, .content td {
    border: 1px solid #ddd;
    padding: 6px 12px;
}

.directive-column {
    border: 1px solid #cbd5e1;
    border-radius: 4px;
    margin-bottom: 1em;
    overflow: hidden;
}

.directive-column .directive-title {
    background-color: #cbd5e1;
    font-weight: 700;
    padding: 6px 14px;
}

.directive-column .directive-content {
    padding: 12px 14px 0;
}

.ref-link {
    color: #0066cc;
    text-decoration: none;
    border-bottom: 1px dotted #0066cc;
}

.annotation-marker {
    font-size: 0.75em;
    vertical-align: super;
    border-bottom: none;
    padding: 0 1px;
}

.annotation-marker::before {
    content: "[";
}

.annotation-marker::after {
    content: "]";
}

.annotation-list {
    font-size: 0.9em;
}

.annotation-entry:target {
    background-color: #fff8c5;
}

.check-icon {
    color: #1a7f37;
    font-weight: 700;
}

.math-display {
    display: block;
    text-align: center;
    margin: 1em 0;
}

.math-inline svg {
    vertical-align: middle;
}

@media (max-width: 800px) {
    .layout {
        flex-direction: column;
    }

    .toc-sidebar {
        position: static;
        flex: none;
        max-height: none;
    }

    .container {
        padding: 20px;
    }
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_model::Link;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<div>"), "&lt;div&gt;");
        assert_eq!(escape_html("a & b"), "a &amp; b");
        assert_eq!(escape_html("\"quoted\""), "&quot;quoted&quot;");
    }

    #[test]
    fn test_heading_carries_anchor() {
        let mut attrs = Attributes::new();
        attrs.id = Some("sec-intro".to_string());
        let block = Block::Heading {
            level: 2,
            content: vec![Inline::Text("Intro".to_string())],
            attrs,
        };

        assert_eq!(render_blocks(&[block]), "<h2 id=\"sec-intro\">Intro</h2>\n");
    }

    #[test]
    fn test_reference_link_attributes() {
        // Arrange
        let mut link = Link::with_text("#sec-a", "Section A");
        link.attrs.add_class("ref-link");
        link.attrs.set_data("ref", "sec-a");
        link.attrs.set_data("ref-type", "heading");

        // Act
        let html = inlines_to_html(&[Inline::Link(link)]);

        // Assert
        assert_eq!(
            html,
            "<a href=\"#sec-a\" class=\"ref-link\" data-ref=\"sec-a\" data-ref-type=\"heading\">Section A</a>"
        );
    }

    #[test]
    fn test_disallowed_schemes_dropped() {
        let inlines = vec![
            Inline::Link(Link::with_text("javascript:alert(1)", "click")),
            Inline::Text(" ".to_string()),
            Inline::Link(Link::with_text("@unknown:id", "@unknown:id")),
        ];

        let html = inlines_to_html(&inlines);

        assert_eq!(html, "click <a href=\"@unknown:id\">@unknown:id</a>");
    }

    #[test]
    fn test_allowed_urls() {
        assert!(is_allowed_url("https://example.com"));
        assert!(is_allowed_url("MAILTO:someone@example.com"));
        assert!(is_allowed_url("#annotation-1"));
        assert!(is_allowed_url("../guide/setup.html"));
        assert!(!is_allowed_url("data:text/html,hi"));
        assert!(!is_allowed_url("vbscript:x"));
    }

    #[test]
    fn test_scheme_hidden_by_whitespace_dropped() {
        // Arrange
        let inlines = vec![
            Inline::Link(Link::with_text("java\tscript:alert(1)", "tab")),
            Inline::Link(Link::with_text("javascript\n:alert(1)", "newline")),
            Inline::Link(Link::with_text(" javascript:alert(1)", "space")),
            Inline::Image {
                url: "java\r\nscript:alert(1)".to_string(),
                title: String::new(),
                alt: "img".to_string(),
            },
        ];

        // Act
        let html = inlines_to_html(&inlines);

        // Assert
        assert_eq!(html, "tabnewlinespaceimg");
        assert!(!html.contains("href"));
    }

    #[test]
    fn test_entity_encoded_tab_in_scheme_dropped() {
        // Arrange
        let blocks = crate::source_model::Document::parse(
            "[x](java&#9;script:alert(1)) [y](<javascript&#10;:alert(1)>)\n",
        )
        .blocks;

        // Act
        let html = render_blocks(&blocks);

        // Assert
        assert!(!html.contains("href"), "unexpected link in {}", html);
        assert!(html.contains("x"));
    }

    #[test]
    fn test_raw_html_not_emitted() {
        let blocks = vec![
            Block::Html("<script>alert(1)</script>".to_string()),
            Block::Paragraph(vec![
                Inline::Text("a ".to_string()),
                Inline::Html("<b>".to_string()),
                Inline::Text("<b>".to_string()),
            ]),
        ];

        assert_eq!(render_blocks(&blocks), "<p>a &lt;b&gt;</p>\n");
    }

    #[test]
    fn test_check_icon_and_task_items() {
        // Arrange
        let mut done = ListItem::new(vec![Block::Paragraph(vec![Inline::Text(
            "Ship ✅".to_string(),
        )])]);
        done.task = Some(true);
        let mut open = ListItem::new(vec![Block::Paragraph(vec![Inline::Text(
            "Test".to_string(),
        )])]);
        open.task = Some(false);
        let list = Block::List {
            start: None,
            items: vec![done, open],
            attrs: Attributes::new(),
        };

        // Act
        let html = render_blocks(&[list]);

        // Assert
        assert!(html.starts_with("<ul class=\"task-list\">"));
        assert!(html.contains(
            "<li class=\"task-list-item\"><input type=\"checkbox\" checked disabled> Ship <span class=\"check-icon\""
        ));
        assert!(html.contains("<input type=\"checkbox\" disabled> Test</li>"));
    }

    #[test]
    fn test_column_title_bar_and_style() {
        // Arrange
        let mut directive = DirectiveNode::container(
            "column",
            Default::default(),
            vec![Block::Paragraph(vec![Inline::Text("Body".to_string())])],
            Default::default(),
        );
        directive.title = Some("Side".to_string());
        directive.attrs.add_class("directive");
        directive.attrs.add_class("directive-column");
        directive.attrs.set_data("title", "Side");
        directive.attrs.set_data("border-color", "#f00");
        directive.attrs.set_data("background", "url(evil)");

        // Act
        let html = render_blocks(&[Block::Directive(directive)]);

        // Assert
        assert!(html.starts_with(
            "<div class=\"directive directive-column\" data-background=\"url(evil)\" data-border-color=\"#f00\" data-title=\"Side\" style=\"border-color: #f00;\">"
        ));
        assert!(html.contains("<div class=\"directive-title\">Side</div>"));
        assert!(html.contains("<div class=\"directive-content\">\n<p>Body</p>\n</div>"));
    }

    #[test]
    fn test_math_fallback_and_svg() {
        let inlines = vec![
            Inline::Math {
                source: "a<b".to_string(),
                display: false,
                svg: None,
            },
            Inline::Math {
                source: "x".to_string(),
                display: true,
                svg: Some("<svg></svg>".to_string()),
            },
        ];

        assert_eq!(
            inlines_to_html(&inlines),
            "<span class=\"math math-inline\">a&lt;b</span><span class=\"math math-display\"><svg></svg></span>"
        );
    }

    #[test]
    fn test_toc_nested_lists() {
        let toc = vec![TocItem {
            id: "one".to_string(),
            text: "One".to_string(),
            level: 1,
            children: vec![TocItem {
                id: "two".to_string(),
                text: "Two & more".to_string(),
                level: 2,
                children: Vec::new(),
            }],
        }];
        let mut output = String::new();

        write_toc(&mut output, &toc);

        assert_eq!(
            output,
            "<ul class=\"toc\">\n<li class=\"toc-level-1\"><a href=\"#one\">One</a>\n<ul class=\"toc\">\n<li class=\"toc-level-2\"><a href=\"#two\">Two &amp; more</a></li>\n</ul>\n</li>\n</ul>\n"
        );
    }
}
