//! Command-line interface definitions for docview

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI structure for the docview application
#[derive(Parser)]
#[command(name = "docview")]
#[command(version)]
#[command(about = "Markdown documentation viewer with labels, references and annotations", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for docview
#[derive(Subcommand)]
pub enum Commands {
    /// Render one Markdown file to a standalone HTML page
    Render {
        /// Markdown file to render
        input: PathBuf,

        /// Output HTML file (defaults to the input path with .html)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Configuration file (defaults to ./docview.toml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Render every Markdown file under a docs directory
    Build {
        /// Docs directory (defaults to `site.docs_root` from the config)
        #[arg(value_name = "ROOT")]
        root: Option<PathBuf>,

        /// Output directory
        #[arg(short, long, default_value = "site")]
        output: PathBuf,

        /// Configuration file (defaults to ./docview.toml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print the table of contents of a Markdown file
    Toc {
        /// Markdown file
        input: PathBuf,

        /// Configuration file (defaults to ./docview.toml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Report unresolved references, missing annotations and other problems
    Check {
        /// Markdown file
        input: PathBuf,

        /// Configuration file (defaults to ./docview.toml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Write a default configuration file
    InitConfig {
        /// Where to write (defaults to ./docview.toml)
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}
