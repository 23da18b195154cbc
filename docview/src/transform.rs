//! Tree transformation passes
//!
//! Each pass walks the parsed document and rewrites it in place:
//! directives are tagged, labels collected, annotations hoisted,
//! references resolved and stray closers cleaned up. The TOC extractor
//! reads the outline off a tree that has been through the label pass.

pub mod annotations;
pub mod closers;
pub mod collect;
pub mod diagnostics;
pub mod directives;
pub mod labels;
pub mod references;
pub mod slug;
pub mod toc;

pub use annotations::{AnnotationExtractor, AnnotationInfo};
pub use closers::clean_directive_closers;
pub use collect::LabelCollector;
pub use diagnostics::{Diagnostic, Diagnostics};
pub use directives::transform_directives;
pub use labels::{normalize_id, LabelIndex, LabelInfo, LabelKind};
pub use references::ReferenceResolver;
pub use slug::{slugify, title_from_slug};
pub use toc::{extract_toc, outline, TocItem};
