//! Directory build: every Markdown file under a docs root to HTML
//!
//! Each file gets its own [`Pipeline`]; nothing mutable is shared between
//! documents, so files are rendered in parallel when the `parallel`
//! feature is enabled.

use crate::config::Config;
use crate::html_renderer::{write_page, RenderError};
use crate::math::MathRenderer;
use crate::pipeline::{default_math_renderer, Pipeline};
use crate::transform::Diagnostic;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use walkdir::WalkDir;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Site build errors
#[derive(Error, Debug)]
pub enum SiteError {
    #[error("Error walking {path}: {source}", path = .0.display(), source = .1)]
    WalkError(PathBuf, #[source] walkdir::Error),

    #[error("IO error reading {path}: {source}", path = .0.display(), source = .1)]
    ReadError(PathBuf, #[source] std::io::Error),

    #[error(transparent)]
    RenderError(#[from] RenderError),
}

/// Outcome of rendering one page
#[derive(Debug)]
pub struct PageReport {
    /// Markdown source file
    pub source: PathBuf,

    /// Written HTML file
    pub output: PathBuf,

    /// Diagnostics of this document only
    pub diagnostics: Vec<Diagnostic>,
}

/// Outcome of a whole build
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Pages written successfully, in source path order
    pub pages: Vec<PageReport>,

    /// Files that could not be read or written
    pub failures: Vec<SiteError>,
}

impl BuildReport {
    /// Total number of diagnostics across all pages
    pub fn diagnostic_count(&self) -> usize {
        self.pages.iter().map(|page| page.diagnostics.len()).sum()
    }
}

/// Find every `.md` file under `root`, sorted by path
///
/// # Parameters
/// * `root` - Docs directory to walk
///
/// # Returns
/// * `Ok(Vec<PathBuf>)` - Markdown files in path order
/// * `Err(SiteError)` - The directory could not be walked
pub fn discover_sources(root: &Path) -> Result<Vec<PathBuf>, SiteError> {
    let mut sources = Vec::new();
    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|e| SiteError::WalkError(root.to_path_buf(), e))?;
        let path = entry.path();
        if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("md") {
            sources.push(path.to_path_buf());
        }
    }
    sources.sort();
    Ok(sources)
}

/// Mirrored `.html` path of `source` under `out_dir`
///
/// `index.md` becomes `index.html`; so does `README.md` unless an
/// `index.md` sits next to it.
pub fn output_path(root: &Path, source: &Path, out_dir: &Path) -> PathBuf {
    let relative = source.strip_prefix(root).unwrap_or(source);
    let mut target = out_dir.join(relative);

    let is_readme = source
        .file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|stem| stem.eq_ignore_ascii_case("readme"));
    if is_readme && !source.with_file_name("index.md").exists() {
        target.set_file_name("index.html");
    } else {
        target.set_extension("html");
    }
    target
}

/// Render every Markdown file under `root` into `out_dir`
///
/// # Parameters
/// * `root` - Docs directory
/// * `out_dir` - Output directory (created as needed)
/// * `config` - Viewer configuration shared by all pages
///
/// # Returns
/// * `Ok(BuildReport)` - Pages written and per-file failures
/// * `Err(SiteError)` - The docs directory could not be walked
pub fn build_site(root: &Path, out_dir: &Path, config: &Config) -> Result<BuildReport, SiteError> {
    let sources = discover_sources(root)?;
    log::info!("Found {} Markdown files in {}", sources.len(), root.display());

    let math = default_math_renderer(&config.math);

    #[cfg(feature = "parallel")]
    let results: Vec<Result<PageReport, SiteError>> = sources
        .par_iter()
        .map(|source| build_page(root, source, out_dir, config, math.clone()))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let results: Vec<Result<PageReport, SiteError>> = sources
        .iter()
        .map(|source| build_page(root, source, out_dir, config, math.clone()))
        .collect();

    let mut report = BuildReport::default();
    for result in results {
        match result {
            Ok(page) => report.pages.push(page),
            Err(e) => report.failures.push(e),
        }
    }
    Ok(report)
}

/// Render a single Markdown file to its mirrored HTML path
pub fn build_page(
    root: &Path,
    source: &Path,
    out_dir: &Path,
    config: &Config,
    math: Option<Arc<dyn MathRenderer>>,
) -> Result<PageReport, SiteError> {
    let content = std::fs::read_to_string(source)
        .map_err(|e| SiteError::ReadError(source.to_path_buf(), e))?;

    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();
    let rendered = Pipeline::new(config)
        .with_math_renderer(math)
        .with_stem(stem)
        .run(&content);

    let output = output_path(root, source, out_dir);
    write_page(&rendered, &config.site.title, &output)?;
    log::info!("Rendered {} -> {}", source.display(), output.display());

    Ok(PageReport {
        source: source.to_path_buf(),
        output,
        diagnostics: rendered.diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_output_path_mirrors_tree() {
        let root = Path::new("/docs");
        let out = Path::new("/site");

        assert_eq!(
            output_path(root, Path::new("/docs/guide/setup.md"), out),
            PathBuf::from("/site/guide/setup.html")
        );
        assert_eq!(
            output_path(root, Path::new("/docs/index.md"), out),
            PathBuf::from("/site/index.html")
        );
        assert_eq!(
            output_path(root, Path::new("/docs/api/README.md"), out),
            PathBuf::from("/site/api/index.html")
        );
    }

    #[test]
    fn test_readme_next_to_index_keeps_its_name() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.md"), "# Home\n").unwrap();
        fs::write(dir.path().join("README.md"), "# Readme\n").unwrap();

        // Act
        let target = output_path(dir.path(), &dir.path().join("README.md"), Path::new("out"));

        // Assert
        assert_eq!(target, PathBuf::from("out/README.html"));
    }

    #[test]
    fn test_discover_sources_sorted_and_filtered() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("b")).unwrap();
        fs::write(dir.path().join("b/two.md"), "").unwrap();
        fs::write(dir.path().join("a.md"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();

        // Act
        let sources = discover_sources(dir.path()).unwrap();

        // Assert
        assert_eq!(
            sources,
            vec![dir.path().join("a.md"), dir.path().join("b/two.md")]
        );
    }

    #[test]
    fn test_missing_root_is_walk_error() {
        let result = discover_sources(Path::new("/nonexistent/docs/root"));
        assert!(matches!(result, Err(SiteError::WalkError(..))));
    }
}
