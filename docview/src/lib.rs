//! docview - Markdown documentation viewer
//!
//! Parses Markdown with `:::column`, `:::column-toc` and `:::annotation`
//! directives, collects `(id)=` labels, resolves `@id` references,
//! hoists footnotes and annotations into a numbered notes section and
//! renders the result to HTML with a table of contents.

#![deny(unsafe_code)]
#![cfg_attr(all(not(debug_assertions), not(test)), deny(clippy::all))]
#![cfg_attr(all(not(debug_assertions), not(test)), deny(clippy::pedantic))]
// Allow some pedantic lints that are too strict for this project
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::enum_variant_names)]

pub mod config;
pub mod html_renderer;
pub mod math;
pub mod pipeline;
pub mod site;
pub mod source_model;
pub mod transform;

pub use config::Config;
pub use pipeline::{Pipeline, RenderedDocument};
