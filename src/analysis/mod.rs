// Codebase analysis: scan, extract, and resolve into one snapshot

pub mod classify;
pub mod graph;
pub mod resolve;
pub mod scanner;

pub use classify::{FileClassifier, FileType};
pub use graph::*;
pub use scanner::{Candidate, ScanWarning, SourceScanner};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::parser::{
    ComponentInfo, ComponentKind, DatabaseQuery, FileExtraction, FunctionInfo, RouteInfo,
    StructuralExtractor,
};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A scanned file; the content is not retained after extraction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    /// Path relative to the project root, `/`-separated; unique per snapshot
    pub path: String,
    pub file_type: FileType,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

/// One complete, immutable analysis snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodebaseAnalysis {
    pub project_name: String,
    pub root: PathBuf,
    pub generated_at: DateTime<Utc>,
    /// SHA-256 over the sorted (path, size, mtime) of every scanned file
    pub fingerprint: String,
    /// Sorted by path
    pub files: Vec<FileInfo>,
    pub functions: Vec<FunctionInfo>,
    pub components: Vec<ComponentInfo>,
    pub routes: Vec<RouteInfo>,
    pub queries: Vec<DatabaseQuery>,
    /// Environment variables referenced anywhere, sorted
    pub env_vars: Vec<String>,
    pub warnings: Vec<ScanWarning>,
}

impl CodebaseAnalysis {
    /// Equality on everything except the generation timestamp
    pub fn same_snapshot(&self, other: &CodebaseAnalysis) -> bool {
        self.project_name == other.project_name
            && self.root == other.root
            && self.fingerprint == other.fingerprint
            && self.files == other.files
            && self.functions == other.functions
            && self.components == other.components
            && self.routes == other.routes
            && self.queries == other.queries
            && self.env_vars == other.env_vars
            && self.warnings == other.warnings
    }

    /// Look up a file by relative path
    pub fn file(&self, path: &str) -> Option<&FileInfo> {
        self.files
            .binary_search_by(|f| f.path.as_str().cmp(path))
            .ok()
            .map(|i| &self.files[i])
    }

    pub fn has_file(&self, path: &str) -> bool {
        self.file(path).is_some()
    }

    pub fn has_file_type(&self, file_type: FileType) -> bool {
        self.files.iter().any(|f| f.file_type == file_type)
    }

    /// Files of each type, in display order, omitting empty types
    pub fn file_type_counts(&self) -> Vec<(FileType, usize)> {
        FileType::ALL
            .iter()
            .map(|t| (*t, self.files.iter().filter(|f| f.file_type == *t).count()))
            .filter(|(_, n)| *n > 0)
            .collect()
    }

    pub fn ui_components(&self) -> impl Iterator<Item = &ComponentInfo> {
        self.components.iter().filter(|c| c.kind == ComponentKind::Ui)
    }

    /// Function declared under `name` in `file`
    pub fn function(&self, file: &str, name: &str) -> Option<&FunctionInfo> {
        self.functions.iter().find(|f| f.file == file && f.name == name)
    }

    /// Whether a file with this name exists anywhere in the tree
    pub fn has_file_named(&self, name: &str) -> bool {
        self.files
            .iter()
            .any(|f| f.path.rsplit('/').next() == Some(name))
    }
}

/// Result of processing one candidate
enum Outcome {
    Analyzed {
        file: FileInfo,
        extraction: FileExtraction,
        warning: Option<ScanWarning>,
    },
    Skipped(ScanWarning),
}

/// Orchestrates scanning, extraction, and resolution
pub struct Analyzer {
    config: Config,
    extractor: StructuralExtractor,
}

impl Analyzer {
    /// Create a new analyzer with the given configuration
    pub fn new(config: Config) -> Result<Self> {
        Ok(Self {
            config,
            extractor: StructuralExtractor::new()?,
        })
    }

    /// Analyze the codebase at `root` into a fresh snapshot
    pub fn analyze(&self, root: &Path) -> Result<CodebaseAnalysis> {
        let root = validate_root(root)?;
        info!("Analyzing {}", root.display());

        let scanner = self.scanner(&root)?;
        let (candidates, mut warnings) = scanner.candidates().collect_sorted();
        let fingerprint = scanner::fingerprint_of(&candidates);
        debug!("Found {} candidate files", candidates.len());

        // Join point: resolution needs every file's extraction
        let outcomes: Vec<Outcome> = candidates
            .par_iter()
            .map(|candidate| self.process(&scanner, candidate))
            .collect();

        let mut analysis = CodebaseAnalysis {
            project_name: self.config.project_name(&root),
            root: root.clone(),
            generated_at: Utc::now(),
            fingerprint,
            files: Vec::new(),
            functions: Vec::new(),
            components: Vec::new(),
            routes: Vec::new(),
            queries: Vec::new(),
            env_vars: Vec::new(),
            warnings: Vec::new(),
        };
        let mut env_vars = BTreeSet::new();

        for outcome in outcomes {
            match outcome {
                Outcome::Analyzed {
                    file,
                    extraction,
                    warning,
                } => {
                    analysis.files.push(file);
                    analysis.functions.extend(extraction.functions);
                    analysis.components.extend(extraction.components);
                    analysis.routes.extend(extraction.routes);
                    analysis.queries.extend(extraction.queries);
                    env_vars.extend(extraction.env_vars);
                    warnings.extend(warning);
                }
                Outcome::Skipped(warning) => warnings.push(warning),
            }
        }

        warnings.sort();
        analysis.env_vars = env_vars.into_iter().collect();
        analysis.warnings = warnings;

        resolve::resolve(&mut analysis);

        info!(
            "Analyzed {} files: {} functions, {} components, {} routes, {} queries",
            analysis.files.len(),
            analysis.functions.len(),
            analysis.components.len(),
            analysis.routes.len(),
            analysis.queries.len()
        );

        Ok(analysis)
    }

    /// Fingerprint of the files `analyze` would read, without reading them
    pub fn fingerprint(&self, root: &Path) -> Result<String> {
        let root = validate_root(root)?;
        let (candidates, _) = self.scanner(&root)?.candidates().collect_sorted();
        Ok(scanner::fingerprint_of(&candidates))
    }

    fn scanner(&self, root: &Path) -> Result<SourceScanner> {
        let scanner = SourceScanner::new(root, &self.config.analysis)?;
        Ok(match self.config.output.directory.canonicalize() {
            Ok(output) => scanner.with_excluded_dir(output),
            Err(_) => scanner,
        })
    }

    /// Load, classify, and extract one file; failures stay local to it
    fn process(&self, scanner: &SourceScanner, candidate: &Candidate) -> Outcome {
        let source = match scanner.load(candidate) {
            Ok(source) => source,
            Err(warning) => {
                warn!("Skipping unreadable file {}: {}", warning.path, warning.message);
                return Outcome::Skipped(warning);
            }
        };

        let file = FileInfo {
            path: candidate.relative.clone(),
            file_type: source.file_type,
            size: candidate.size,
            modified: candidate.modified,
        };

        let Some(content) = source.content.as_deref() else {
            return Outcome::Analyzed {
                file,
                extraction: FileExtraction::default(),
                warning: None,
            };
        };

        let attempt = panic::catch_unwind(AssertUnwindSafe(|| {
            self.extractor
                .extract(&candidate.relative, source.file_type, content)
        }));

        let (extraction, warning) = match attempt {
            Ok(Ok(extraction)) => (extraction, None),
            Ok(Err(e)) => {
                warn!("Extraction failed for {}: {}", candidate.relative, e);
                (
                    FileExtraction::default(),
                    Some(ScanWarning::new(&candidate.relative, e.to_string())),
                )
            }
            Err(payload) => {
                let e = Error::analysis(format!(
                    "extraction panicked: {}",
                    panic_message(payload.as_ref())
                ));
                warn!("Extraction failed for {}: {}", candidate.relative, e);
                (
                    FileExtraction::default(),
                    Some(ScanWarning::new(&candidate.relative, e.to_string())),
                )
            }
        };

        Outcome::Analyzed {
            file,
            extraction,
            warning,
        }
    }
}

/// Canonical form of an existing root directory
fn validate_root(root: &Path) -> Result<PathBuf> {
    if !root.exists() {
        return Err(Error::invalid_root(root, "does not exist"));
    }
    if !root.is_dir() {
        return Err(Error::invalid_root(root, "not a directory"));
    }
    root.canonicalize()
        .map_err(|e| Error::invalid_root(root, e.to_string()))
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown cause")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_panic_message() {
        let payload = panic::catch_unwind(|| panic!("bad offset {}", 3)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "bad offset 3");
        let payload = panic::catch_unwind(|| panic!("static")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "static");
    }

    fn write(dir: &Path, path: &str, content: &str) {
        let full = dir.join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, content).unwrap();
    }

    fn analyzer() -> Analyzer {
        Analyzer::new(Config::default()).unwrap()
    }

    #[test]
    fn test_missing_root_is_configuration_error() {
        let err = analyzer().analyze(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, Error::InvalidRoot { .. }));
    }

    #[test]
    fn test_file_root_is_rejected() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.js", "");
        let err = analyzer().analyze(&dir.path().join("a.js")).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_collects_files_and_records() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "routes/users.js",
            "const router = require('express').Router();\nrouter.get('/users', listUsers);\n",
        );
        write(
            dir.path(),
            "services/users.js",
            "export function listUsers() {\n  return User.find();\n}\nconst key = process.env.API_KEY;\n",
        );
        write(dir.path(), "node_modules/x/index.js", "router.get('/no', x);\n");

        let analysis = analyzer().analyze(dir.path()).unwrap();
        let paths: Vec<&str> = analysis.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["routes/users.js", "services/users.js"]);
        assert_eq!(analysis.routes.len(), 1);
        assert_eq!(analysis.env_vars, vec!["API_KEY".to_string()]);
        assert_eq!(analysis.file("routes/users.js").unwrap().file_type, FileType::Route);
        assert!(analysis.routes[0].handler_link.is_linked());
        assert_eq!(analysis.routes[0].query_ids, vec![0]);
    }

    #[test]
    fn test_binary_file_contributes_warning_only() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "src/blob.js", "abc\0def");
        write(dir.path(), "src/ok.js", "export function ok() {}\n");

        let analysis = analyzer().analyze(dir.path()).unwrap();
        assert_eq!(analysis.files.len(), 2);
        assert_eq!(analysis.functions.len(), 1);
        assert_eq!(analysis.warnings.len(), 1);
        assert_eq!(analysis.warnings[0].path, "src/blob.js");
    }

    #[test]
    fn test_same_snapshot_ignores_timestamp() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "app.js", "const app = express();\napp.get('/', home);\n");

        let first = analyzer().analyze(dir.path()).unwrap();
        let mut second = analyzer().analyze(dir.path()).unwrap();
        second.generated_at = first.generated_at + chrono::Duration::seconds(5);
        assert!(first.same_snapshot(&second));
        assert_ne!(first, second);
    }

    #[test]
    fn test_fingerprint_tracks_changes() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.js", "export function a() {}\n");

        let analyzer = analyzer();
        let before = analyzer.fingerprint(dir.path()).unwrap();
        assert_eq!(before, analyzer.analyze(dir.path()).unwrap().fingerprint);

        write(dir.path(), "b.js", "export function b() {}\n");
        assert_ne!(before, analyzer.fingerprint(dir.path()).unwrap());
    }

    #[test]
    fn test_file_type_counts() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "styles/main.css", "body {}");
        write(dir.path(), "src/a.test.js", "");
        write(dir.path(), "README.md", "# x");

        let analysis = analyzer().analyze(dir.path()).unwrap();
        let counts = analysis.file_type_counts();
        assert_eq!(
            counts,
            vec![(FileType::Test, 1), (FileType::Style, 1), (FileType::Other, 1)]
        );
        assert!(analysis.has_file_named("README.md"));
    }
}
