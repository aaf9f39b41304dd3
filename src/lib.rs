//! Codescribe - Generate structured documentation from web application codebases
//!
//! Scans a JavaScript/TypeScript project, extracts functions, UI components,
//! HTTP routes and database queries, links them into one snapshot, and
//! persists a documentation model as `documentation.json`.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod parser;
pub mod pipeline;

// Re-export main types
pub use analysis::{Analyzer, CodebaseAnalysis, FileInfo, FileType};
pub use config::Config;
pub use error::{Error, Result};
pub use output::{DocumentationGenerator, DocumentationStore, GeneratedDocumentation, ProgressSink};
pub use pipeline::{DocEvent, DocService};
