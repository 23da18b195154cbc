//! Math typesetting
//!
//! Formulas are handed to a [`MathRenderer`] which turns their source into
//! an SVG fragment. The default implementation compiles each formula as a
//! one-page Typst document and converts that page to SVG.

use crate::source_model::{Block, DirectiveContent, Inline};
use crate::transform::{Diagnostic, Diagnostics};
use thiserror::Error;

/// Math typesetting errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Typst compilation failed: {0}")]
    CompilationError(String),

    #[error("Typst produced no page for the formula")]
    EmptyOutput,
}

/// Renders one formula to an SVG fragment
pub trait MathRenderer: Send + Sync {
    /// Typeset `source`; `display` selects block rather than inline style
    fn render(&self, source: &str, display: bool) -> Result<String, MathError>;
}

/// Typeset every math node in the tree
///
/// A formula that fails keeps its source (rendered as text) and records a
/// [`Diagnostic::MathFailed`].
pub fn typeset_math(blocks: &mut [Block], renderer: &dyn MathRenderer, diagnostics: &mut Diagnostics) {
    for block in blocks {
        match block {
            Block::Heading { content, .. } | Block::Paragraph(content) => {
                typeset_inlines(content, renderer, diagnostics)
            }
            Block::BlockQuote(children) | Block::FootnoteDefinition { content: children, .. } => {
                typeset_math(children, renderer, diagnostics)
            }
            Block::List { items, .. } => {
                for item in items {
                    typeset_math(&mut item.content, renderer, diagnostics);
                }
            }
            Block::Table { headers, rows, .. } => {
                for cell in headers.iter_mut().chain(rows.iter_mut().flatten()) {
                    typeset_inlines(cell, renderer, diagnostics);
                }
            }
            Block::Directive(directive) => match &mut directive.content {
                DirectiveContent::Blocks(children) => typeset_math(children, renderer, diagnostics),
                DirectiveContent::Inlines(inlines) => {
                    typeset_inlines(inlines, renderer, diagnostics)
                }
            },
            Block::CodeBlock { .. } | Block::Rule | Block::Html(_) => {}
        }
    }
}

fn typeset_inlines(inlines: &mut [Inline], renderer: &dyn MathRenderer, diagnostics: &mut Diagnostics) {
    for inline in inlines {
        match inline {
            Inline::Math {
                source,
                display,
                svg,
            } => match renderer.render(source, *display) {
                Ok(rendered) => *svg = Some(rendered),
                Err(e) => diagnostics.push(Diagnostic::MathFailed {
                    source: source.clone(),
                    message: e.to_string(),
                }),
            },
            Inline::Emphasis(children)
            | Inline::Strong(children)
            | Inline::Strikethrough(children)
            | Inline::Superscript(children)
            | Inline::Subscript(children) => typeset_inlines(children, renderer, diagnostics),
            Inline::Link(link) => typeset_inlines(&mut link.children, renderer, diagnostics),
            Inline::Directive(directive) => {
                if let DirectiveContent::Inlines(children) = &mut directive.content {
                    typeset_inlines(children, renderer, diagnostics);
                }
            }
            _ => {}
        }
    }
}

#[cfg(feature = "typst-math")]
pub use typst_backend::TypstMath;

#[cfg(feature = "typst-math")]
mod typst_backend {
    use super::{MathError, MathRenderer};
    use std::collections::HashMap;
    use std::sync::{Mutex, OnceLock};
    use typst::diag::{FileError, FileResult};
    use typst::foundations::{Bytes, Datetime};
    use typst::layout::PagedDocument;
    use typst::syntax::{FileId, Source, VirtualPath};
    use typst::text::{Font, FontBook};
    use typst::utils::LazyHash;
    use typst::{Library, World};
    use typst_kit::fonts::{FontSearcher, FontSlot};

    /// Static library instance (created once, reused)
    static LIBRARY: OnceLock<LazyHash<Library>> = OnceLock::new();

    /// Embedded fonts, searched once per process
    static FONTS: OnceLock<FontStore> = OnceLock::new();

    struct FontStore {
        book: LazyHash<FontBook>,
        slots: Vec<FontSlot>,
    }

    fn get_library() -> &'static LazyHash<Library> {
        LIBRARY.get_or_init(|| LazyHash::new(Library::builder().build()))
    }

    fn get_fonts() -> &'static FontStore {
        FONTS.get_or_init(|| {
            let fonts = FontSearcher::new().include_system_fonts(false).search();
            log::debug!("Loaded {} embedded fonts for math", fonts.fonts.len());
            FontStore {
                book: LazyHash::new(fonts.book),
                slots: fonts.fonts,
            }
        })
    }

    /// The World holding a single formula document
    struct FormulaWorld {
        main_source: Source,
    }

    impl FormulaWorld {
        fn new(markup: String) -> Self {
            let main_id = FileId::new(None, VirtualPath::new("formula.typ"));
            Self {
                main_source: Source::new(main_id, markup),
            }
        }
    }

    impl World for FormulaWorld {
        fn library(&self) -> &LazyHash<Library> {
            get_library()
        }

        fn book(&self) -> &LazyHash<FontBook> {
            &get_fonts().book
        }

        fn main(&self) -> FileId {
            self.main_source.id()
        }

        fn source(&self, id: FileId) -> FileResult<Source> {
            if id == self.main_source.id() {
                Ok(self.main_source.clone())
            } else {
                Err(FileError::NotFound(id.vpath().as_rootless_path().into()))
            }
        }

        fn file(&self, id: FileId) -> FileResult<Bytes> {
            Err(FileError::NotFound(id.vpath().as_rootless_path().into()))
        }

        fn font(&self, index: usize) -> Option<Font> {
            get_fonts().slots.get(index)?.get()
        }

        fn today(&self, _offset: Option<i64>) -> Option<Datetime> {
            None
        }
    }

    /// Typst-backed formula renderer with a per-instance result cache
    pub struct TypstMath {
        font_size: f64,
        cache: Mutex<HashMap<(String, bool), Result<String, MathError>>>,
    }

    impl TypstMath {
        /// Create a renderer typesetting at `font_size` points
        pub fn new(font_size: f64) -> Self {
            Self {
                font_size,
                cache: Mutex::new(HashMap::new()),
            }
        }

        fn markup(&self, source: &str, display: bool) -> String {
            let formula = if display {
                format!("$ {} $", source.trim())
            } else {
                format!("${}$", source.trim())
            };
            format!(
                "#set page(width: auto, height: auto, margin: 0pt, fill: none)\n#set text(size: {}pt)\n{}\n",
                self.font_size, formula
            )
        }

        fn compile(&self, source: &str, display: bool) -> Result<String, MathError> {
            let world = FormulaWorld::new(self.markup(source, display));

            let document: PagedDocument = typst::compile(&world).output.map_err(|errors| {
                let messages: Vec<String> =
                    errors.iter().map(|e| e.message.to_string()).collect();
                MathError::CompilationError(messages.join("; "))
            })?;

            let page = document.pages.first().ok_or(MathError::EmptyOutput)?;
            Ok(typst_svg::svg(page))
        }
    }

    impl MathRenderer for TypstMath {
        fn render(&self, source: &str, display: bool) -> Result<String, MathError> {
            let key = (source.to_string(), display);
            if let Ok(cache) = self.cache.lock() {
                if let Some(cached) = cache.get(&key) {
                    return cached.clone();
                }
            }

            let result = self.compile(source, display);
            if let Ok(mut cache) = self.cache.lock() {
                cache.insert(key, result.clone());
            }
            result
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_markup_inline_and_display() {
            let math = TypstMath::new(12.0);

            let inline = math.markup(" x^2 ", false);
            let display = math.markup("sum_(i=1)^n i", true);

            assert!(inline.ends_with("$x^2$\n"));
            assert!(inline.contains("#set text(size: 12pt)"));
            assert!(display.ends_with("$ sum_(i=1)^n i $\n"));
        }

        #[test]
        fn test_render_simple_formula() {
            let math = TypstMath::new(11.0);

            let svg = math.render("a + b", false).unwrap();

            assert!(svg.starts_with("<svg"));
        }

        #[test]
        fn test_invalid_formula_is_error_and_cached() {
            let math = TypstMath::new(11.0);

            let first = math.render("#unknown-function()", false);
            let second = math.render("#unknown-function()", false);

            assert!(matches!(first, Err(MathError::CompilationError(_))));
            assert_eq!(first, second);
        }
    }
}
