//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Generate structured documentation from web application codebases
#[derive(Parser, Debug)]
#[command(name = "codescribe")]
#[command(about = "Generate structured documentation from web application codebases")]
#[command(version)]
pub struct Args {
    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze a codebase and regenerate its documentation
    Generate {
        /// Path to the codebase to analyze
        path: PathBuf,

        /// Output directory (default: ./docs-output)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Glob patterns to exclude (can be repeated)
        #[arg(long)]
        exclude: Vec<String>,

        /// Config file path (default: <path>/codescribe.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Project name shown in the documentation
        #[arg(long)]
        name: Option<String>,

        /// Skip diagram generation
        #[arg(long)]
        no_diagrams: bool,
    },

    /// Summarize previously generated documentation
    Show {
        /// Output directory holding documentation.json
        path: PathBuf,
    },

    /// Show version information
    Version,
}
