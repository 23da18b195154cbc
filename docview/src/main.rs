//! docview - Markdown documentation viewer
//!
//! A CLI tool for rendering Markdown documentation with labels,
//! cross-references, annotations and math to HTML.

#![deny(unsafe_code)]
#![cfg_attr(all(not(debug_assertions), not(test)), deny(clippy::all))]
#![cfg_attr(all(not(debug_assertions), not(test)), deny(clippy::pedantic))]
#![cfg_attr(all(not(debug_assertions), not(test)), deny(missing_docs))]
// Allow some pedantic lints that are too strict for this project
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use docview::config::{Config, DEFAULT_CONFIG_FILE};
use docview::html_renderer::write_page;
use docview::site::build_site;
use docview::transform::{extract_toc, TocItem};
use docview::{Pipeline, RenderedDocument};
use std::path::{Path, PathBuf};

/// Main entry point for the docview CLI application
fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:?}", e);
        std::process::exit(1);
    }
}

/// Run the CLI application
fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            input,
            output,
            config,
            verbose,
        } => {
            init_logging(verbose);
            handle_render_command(&input, output, config.as_deref())?;
        }

        Commands::Build {
            root,
            output,
            config,
            verbose,
        } => {
            init_logging(verbose);
            handle_build_command(root, &output, config.as_deref())?;
        }

        Commands::Toc { input, config } => {
            init_logging(false);
            handle_toc_command(&input, config.as_deref())?;
        }

        Commands::Check {
            input,
            config,
            verbose,
        } => {
            init_logging(verbose);
            handle_check_command(&input, config.as_deref())?;
        }

        Commands::InitConfig { path, force } => {
            handle_init_config_command(path, force)?;
        }
    }

    Ok(())
}

/// Initialize logging; `RUST_LOG` applies unless verbose raises it to Info
fn init_logging(verbose: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if verbose {
        builder.filter_level(log::LevelFilter::Info);
    }
    builder.init();
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    Config::discover(path).with_context(|| match path {
        Some(path) => format!("Failed to load configuration from {}", path.display()),
        None => format!("Failed to load {}", DEFAULT_CONFIG_FILE),
    })
}

/// Read and transform a single Markdown file
fn render_file(input: &Path, config: &Config) -> Result<RenderedDocument> {
    let content = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();
    Ok(Pipeline::new(config).with_stem(stem).run(&content))
}

/// Handle the render command
fn handle_render_command(
    input: &Path,
    output: Option<PathBuf>,
    config: Option<&Path>,
) -> Result<()> {
    let config = load_config(config)?;
    let rendered = render_file(input, &config)?;

    let output = output.unwrap_or_else(|| input.with_extension("html"));
    write_page(&rendered, &config.site.title, &output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!("✓ Successfully wrote: {}", output.display());
    if !rendered.diagnostics.is_empty() {
        println!(
            "  {} diagnostics (run 'docview check {}' for details)",
            rendered.diagnostics.len(),
            input.display()
        );
    }

    Ok(())
}

/// Handle the build command
fn handle_build_command(
    root: Option<PathBuf>,
    output: &Path,
    config: Option<&Path>,
) -> Result<()> {
    let config = load_config(config)?;
    let root = root.unwrap_or_else(|| config.site.docs_root.clone());

    println!("Building documentation...");
    println!("Input: {}", root.display());
    println!("Output: {}", output.display());

    let report = build_site(&root, output, &config)
        .with_context(|| format!("Failed to build site from {}", root.display()))?;

    println!(
        "✓ Rendered {} pages ({} diagnostics)",
        report.pages.len(),
        report.diagnostic_count()
    );

    if !report.failures.is_empty() {
        for failure in &report.failures {
            eprintln!("  ✗ {}", failure);
        }
        anyhow::bail!("{} files could not be rendered", report.failures.len());
    }

    Ok(())
}

/// Handle the toc command
fn handle_toc_command(input: &Path, config: Option<&Path>) -> Result<()> {
    let config = load_config(config)?;
    let content = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let toc = extract_toc(&content, &config);
    print!("{}", format_outline(&toc, 0));

    Ok(())
}

/// Indented `- text (#id)` outline, two spaces per nesting level
fn format_outline(items: &[TocItem], depth: usize) -> String {
    let mut out = String::new();
    for item in items {
        out.push_str(&format!(
            "{}- {} (#{})\n",
            "  ".repeat(depth),
            item.text,
            item.id
        ));
        out.push_str(&format_outline(&item.children, depth + 1));
    }
    out
}

/// Handle the check command
fn handle_check_command(input: &Path, config: Option<&Path>) -> Result<()> {
    let config = load_config(config)?;
    let rendered = render_file(input, &config)?;

    if rendered.diagnostics.is_empty() {
        println!("✓ {}: no problems found", input.display());
        return Ok(());
    }

    for diagnostic in &rendered.diagnostics {
        println!("{}: {}", input.display(), diagnostic);
    }
    anyhow::bail!(
        "{} problems found in {}",
        rendered.diagnostics.len(),
        input.display()
    );
}

/// Handle the init-config command
fn handle_init_config_command(path: Option<PathBuf>, force: bool) -> Result<()> {
    let path = path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    Config::default()
        .save(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("✓ Wrote default configuration to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_outline() {
        let toc = vec![TocItem {
            id: "intro".to_string(),
            text: "Intro".to_string(),
            level: 1,
            children: vec![TocItem {
                id: "sec-a".to_string(),
                text: "Section A".to_string(),
                level: 2,
                children: Vec::new(),
            }],
        }];

        assert_eq!(
            format_outline(&toc, 0),
            "- Intro (#intro)\n  - Section A (#sec-a)\n"
        );
    }
}
