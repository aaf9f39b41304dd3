// Structural extraction from classified source files

pub mod ast;
mod javascript;

pub use ast::*;
pub use javascript::{normalize_url, JavaScriptExtractor, JsVariant};

use crate::analysis::classify::FileType;
use crate::error::Result;
use std::path::Path;

/// Per-file record extractor
///
/// Only the JavaScript family yields records; every other file produces an
/// empty extraction.
pub struct StructuralExtractor {
    javascript: JavaScriptExtractor,
}

impl StructuralExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            javascript: JavaScriptExtractor::new()?,
        })
    }

    /// Whether records can be extracted from this path
    pub fn supports(&self, relative: &str) -> bool {
        Path::new(relative)
            .extension()
            .and_then(|e| e.to_str())
            .and_then(JsVariant::from_extension)
            .is_some()
    }

    /// Extract the records local to one file
    pub fn extract(
        &self,
        relative: &str,
        file_type: FileType,
        content: &str,
    ) -> Result<FileExtraction> {
        if !self.supports(relative) {
            return Ok(FileExtraction::default());
        }
        self.javascript.extract(relative, file_type, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_files_yield_nothing() {
        let extractor = StructuralExtractor::new().unwrap();
        let result = extractor
            .extract("README.md", FileType::Other, "router.get('/x', h)")
            .unwrap();
        assert_eq!(result, FileExtraction::default());
        assert!(!extractor.supports("styles/main.css"));
        assert!(extractor.supports("src/App.tsx"));
    }

    #[test]
    fn test_extract_dispatches_to_javascript() {
        let extractor = StructuralExtractor::new().unwrap();
        let result = extractor
            .extract("routes/users.js", FileType::Route, "router.get('/users', listUsers);\n")
            .unwrap();
        assert_eq!(result.routes.len(), 1);
    }
}
