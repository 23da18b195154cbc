//! Per-document processing pipeline
//!
//! This module runs the transformation passes over one document in a
//! fixed order:
//! 1. **Parsing**: Markdown and directive fences into the block tree
//! 2. **Directives**: classes and `@key:` metadata
//! 3. **Labels**: `(id)=` declarations and heading anchors
//! 4. **Annotations**: numbered markers and the trailing notes section
//! 5. **References**: `@id` and `[text](@id)` against the complete index
//! 6. **Cleanup**: stray directive closers
//! 7. **Math**: formulas typeset to SVG
//!
//! The outline is read off the tree as soon as every anchor is assigned;
//! [`extract_toc`](crate::transform::extract_toc) produces the same one
//! from source alone.

use crate::config::{Config, MathConfig};
use crate::math::{typeset_math, MathRenderer};
use crate::source_model::Document;
use crate::transform::{
    clean_directive_closers, outline, title_from_slug, transform_directives,
    AnnotationExtractor, AnnotationInfo, Diagnostic, Diagnostics, LabelCollector, LabelIndex,
    ReferenceResolver, TocItem,
};
use std::sync::Arc;

/// Everything produced by one pipeline run
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    /// The transformed tree, ready for the HTML renderer
    pub document: Document,

    /// Every label declared in the document (annotations included)
    pub labels: LabelIndex,

    /// Annotations in numbering order
    pub annotations: Vec<AnnotationInfo>,

    /// Heading outline
    pub toc: Vec<TocItem>,

    /// Non-fatal problems observed while transforming
    pub diagnostics: Vec<Diagnostic>,

    /// Document title (first heading, else derived from the file stem)
    pub title: String,
}

/// Single-use pipeline owning the state of one document render
///
/// Independent instances share nothing mutable, so documents can be
/// processed concurrently.
pub struct Pipeline<'a> {
    config: &'a Config,
    stem: Option<String>,
    math: Option<Arc<dyn MathRenderer>>,
    labels: LabelIndex,
    diagnostics: Diagnostics,
}

impl<'a> Pipeline<'a> {
    /// Create a pipeline using the math renderer the configuration selects
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            stem: None,
            math: default_math_renderer(&config.math),
            labels: LabelIndex::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    /// File stem used for the title when the document has no heading
    pub fn with_stem(mut self, stem: impl Into<String>) -> Self {
        self.stem = Some(stem.into());
        self
    }

    /// Replace the math renderer (`None` leaves formulas as source text)
    pub fn with_math_renderer(mut self, renderer: Option<Arc<dyn MathRenderer>>) -> Self {
        self.math = renderer;
        self
    }

    /// Run every pass over `source`
    ///
    /// # Parameters
    /// * `source` - Raw Markdown text of one document
    ///
    /// # Returns
    /// * `RenderedDocument` - The transformed tree and its side products;
    ///   the pipeline never fails, problems end up in `diagnostics`
    pub fn run(mut self, source: &str) -> RenderedDocument {
        let mut document = Document::parse(source);
        log::debug!("Parsed {} top-level blocks", document.blocks.len());

        transform_directives(&mut document.blocks);

        LabelCollector::new(&mut self.labels, &mut self.diagnostics)
            .reserving(&self.config.annotations.section_id)
            .collect(&mut document.blocks);
        log::debug!("Collected {} labels", self.labels.len());

        let toc = outline(&document.blocks, &self.config.toc);

        let title = document
            .first_heading_text()
            .filter(|title| !title.is_empty())
            .or_else(|| self.stem.as_deref().map(title_from_slug))
            .unwrap_or_default();

        let annotations = AnnotationExtractor::new(
            &self.config.annotations,
            &mut self.labels,
            &mut self.diagnostics,
        )
        .extract(&mut document.blocks);

        ReferenceResolver::new(&self.labels, &mut self.diagnostics).resolve(&mut document.blocks);

        clean_directive_closers(&mut document.blocks, &mut self.diagnostics);

        if let Some(renderer) = &self.math {
            typeset_math(&mut document.blocks, renderer.as_ref(), &mut self.diagnostics);
        }

        RenderedDocument {
            document,
            labels: self.labels,
            annotations,
            toc,
            diagnostics: self.diagnostics.into_vec(),
            title,
        }
    }
}

/// Math renderer for the given settings, if typesetting is available
#[cfg(feature = "typst-math")]
pub fn default_math_renderer(config: &MathConfig) -> Option<Arc<dyn MathRenderer>> {
    use crate::math::TypstMath;

    config
        .enabled
        .then(|| Arc::new(TypstMath::new(config.font_size)) as Arc<dyn MathRenderer>)
}

/// Math renderer for the given settings, if typesetting is available
#[cfg(not(feature = "typst-math"))]
pub fn default_math_renderer(config: &MathConfig) -> Option<Arc<dyn MathRenderer>> {
    if config.enabled {
        log::debug!("Built without typst-math; formulas render as source text");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_model::{Block, Inline};
    use crate::transform::LabelKind;

    fn run(source: &str) -> RenderedDocument {
        let config = Config::default();
        Pipeline::new(&config).with_math_renderer(None).run(source)
    }

    #[test]
    fn test_title_from_first_heading() {
        let rendered = run("Intro text\n\n## (sec:a)= Section A\n");
        assert_eq!(rendered.title, "Section A");
    }

    #[test]
    fn test_title_falls_back_to_stem() {
        let config = Config::default();

        let rendered = Pipeline::new(&config)
            .with_math_renderer(None)
            .with_stem("getting-started")
            .run("No headings here.\n\n[^a]\n\n[^a]: Note.\n");

        assert_eq!(rendered.title, "Getting Started");
    }

    #[test]
    fn test_annotation_reference_resolves_after_extraction() {
        // Arrange
        let source = "Claim[^src].\n\nSee @annotation-1.\n\n[^src]: Source text.\n";

        // Act
        let rendered = run(source);

        // Assert
        let Block::Paragraph(inlines) = &rendered.document.blocks[1] else {
            panic!("expected paragraph");
        };
        let Inline::Link(link) = &inlines[1] else {
            panic!("expected reference link, got {:?}", inlines[1]);
        };
        assert_eq!(link.url, "#annotation-1");
        assert_eq!(link.attrs.data("ref-type"), Some("annotation"));
        assert_eq!(
            rendered.labels.get("annotation-1").map(|label| label.kind),
            Some(LabelKind::Annotation)
        );
        assert!(rendered.diagnostics.is_empty());
    }

    #[test]
    fn test_diagnostics_collected_from_every_pass() {
        // Arrange
        let source = "# (x)= One\n\n# (x)= Two\n\nSee @nowhere[^gone].\n\n:::\n";

        // Act
        let rendered = run(source);

        // Assert
        assert_eq!(
            rendered.diagnostics,
            vec![
                Diagnostic::DuplicateLabel { id: "x".to_string() },
                Diagnostic::MissingAnnotation {
                    identifier: "gone".to_string()
                },
                Diagnostic::UnresolvedReference {
                    id: "nowhere".to_string()
                },
                Diagnostic::StrayDirectiveCloser,
            ]
        );
    }

    #[test]
    fn test_math_disabled_keeps_source() {
        // Arrange
        let mut config = Config::default();
        config.math.enabled = false;

        // Act
        let rendered = Pipeline::new(&config).run("Euler $e^(i pi) + 1 = 0$\n");

        // Assert
        let Block::Paragraph(inlines) = &rendered.document.blocks[0] else {
            panic!("expected paragraph");
        };
        assert!(matches!(&inlines[1], Inline::Math { svg: None, .. }));
    }
}
