// Source tree scanning
//
// Walks a project root with walkdir, prunes ignored directories, and yields
// candidate files. Every call to `candidates()` starts a fresh traversal.
// Walk errors (symlink loops, permission problems) become warnings.

use crate::analysis::classify::{FileClassifier, FileType, EXTRACTABLE_EXTENSIONS};
use crate::config::AnalysisConfig;
use crate::error::Result;
use chrono::{DateTime, Utc};
use glob::Pattern;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Dependency, build output and version-control entries skipped by default
pub const DEFAULT_IGNORES: &[&str] = &[
    "node_modules",
    "bower_components",
    "jspm_packages",
    ".git",
    ".hg",
    ".svn",
    "dist",
    "build",
    "out",
    "target",
    "coverage",
    ".next",
    ".nuxt",
    ".cache",
    ".turbo",
    "vendor",
    "__pycache__",
    ".venv",
    "venv",
    "*.min.js",
    "*.map",
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
];

/// A file or walk entry that could not be processed
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ScanWarning {
    pub path: String,
    pub message: String,
}

impl ScanWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A file found by the walk, not yet read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Path relative to the root, `/`-separated
    pub relative: String,
    pub absolute: PathBuf,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

/// A classified file with its content loaded when extraction needs it
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub candidate: Candidate,
    pub file_type: FileType,
    pub content: Option<String>,
}

/// Compiled ignore globs
///
/// Patterns containing `/` match the relative path; all others match the
/// entry's file name.
#[derive(Debug, Clone, Default)]
pub struct IgnoreRules {
    name_patterns: Vec<Pattern>,
    path_patterns: Vec<Pattern>,
}

impl IgnoreRules {
    pub fn new(patterns: &[String]) -> Result<Self> {
        let mut rules = Self::default();
        for raw in patterns {
            let pattern = Pattern::new(raw)?;
            if raw.contains('/') {
                rules.path_patterns.push(pattern);
            } else {
                rules.name_patterns.push(pattern);
            }
        }
        Ok(rules)
    }

    /// Build rules from analysis settings
    pub fn from_config(config: &AnalysisConfig) -> Result<Self> {
        let mut patterns: Vec<String> = Vec::new();
        if config.use_default_ignores {
            patterns.extend(DEFAULT_IGNORES.iter().map(|s| s.to_string()));
        }
        patterns.extend(config.exclude.iter().cloned());
        Self::new(&patterns)
    }

    pub fn is_ignored(&self, relative: &str) -> bool {
        let name = relative.rsplit('/').next().unwrap_or(relative);
        self.name_patterns.iter().any(|p| p.matches(name))
            || self.path_patterns.iter().any(|p| p.matches(relative))
    }
}

/// Walks a project root and yields candidate files
#[derive(Debug, Clone)]
pub struct SourceScanner {
    root: PathBuf,
    rules: IgnoreRules,
    max_file_size: u64,
    follow_links: bool,
    excluded_dirs: Vec<PathBuf>,
    classifier: FileClassifier,
}

impl SourceScanner {
    /// Create a scanner for an existing root directory
    pub fn new(root: impl Into<PathBuf>, config: &AnalysisConfig) -> Result<Self> {
        Ok(Self {
            root: root.into(),
            rules: IgnoreRules::from_config(config)?,
            max_file_size: config.max_file_size,
            follow_links: config.follow_links,
            excluded_dirs: Vec::new(),
            classifier: FileClassifier::new(),
        })
    }

    /// Skip an absolute directory (e.g. the documentation output directory)
    pub fn with_excluded_dir(mut self, dir: PathBuf) -> Self {
        self.excluded_dirs.push(dir);
        self
    }

    /// Start a fresh traversal
    pub fn candidates(&self) -> Candidates {
        let root = self.root.clone();
        let rules = self.rules.clone();
        let excluded = self.excluded_dirs.clone();

        let walker = WalkDir::new(&self.root)
            .follow_links(self.follow_links)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| keep_entry(entry, &root, &rules, &excluded));

        Candidates {
            root: self.root.clone(),
            inner: Box::new(walker),
            max_file_size: self.max_file_size,
            warnings: Vec::new(),
        }
    }

    /// Lazy `(relative path, FileType)` sequence; unreadable files are skipped
    pub fn scan(&self) -> impl Iterator<Item = (PathBuf, FileType)> + '_ {
        self.candidates().filter_map(move |candidate| match self.load(&candidate) {
            Ok(file) => Some((PathBuf::from(&file.candidate.relative), file.file_type)),
            Err(warning) => {
                warn!("Skipping {}: {}", warning.path, warning.message);
                None
            }
        })
    }

    /// Read (when needed) and classify a candidate
    pub fn load(&self, candidate: &Candidate) -> std::result::Result<SourceFile, ScanWarning> {
        let relative = Path::new(&candidate.relative);
        let wants_content = self.classifier.needs_content(relative) || is_extractable(relative);

        let content = if wants_content {
            match std::fs::read_to_string(&candidate.absolute) {
                Ok(text) => Some(text),
                Err(e) => return Err(ScanWarning::new(&candidate.relative, e.to_string())),
            }
        } else {
            None
        };

        let file_type = self.classifier.classify(relative, content.as_deref());

        Ok(SourceFile {
            candidate: candidate.clone(),
            file_type,
            content,
        })
    }

    /// SHA-256 over the sorted (path, size, mtime) of every candidate
    pub fn fingerprint(&self) -> String {
        let mut candidates: Vec<Candidate> = self.candidates().collect();
        candidates.sort_by(|a, b| a.relative.cmp(&b.relative));
        fingerprint_of(&candidates)
    }
}

/// Fingerprint a sorted candidate list
pub fn fingerprint_of(candidates: &[Candidate]) -> String {
    let mut hasher = Sha256::new();
    for c in candidates {
        hasher.update(c.relative.as_bytes());
        hasher.update([0u8]);
        hasher.update(c.size.to_le_bytes());
        let stamp = c.modified.map(|m| m.timestamp_nanos_opt().unwrap_or_default()).unwrap_or(0);
        hasher.update(stamp.to_le_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}

fn is_extractable(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| EXTRACTABLE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn keep_entry(entry: &DirEntry, root: &Path, rules: &IgnoreRules, excluded: &[PathBuf]) -> bool {
    if entry.depth() == 0 {
        return true;
    }
    if excluded.iter().any(|dir| entry.path() == dir.as_path()) {
        debug!("Skipping output directory {}", entry.path().display());
        return false;
    }
    let relative = relative_path(entry.path(), root);
    !rules.is_ignored(&relative)
}

/// Relative, `/`-separated form of a path under root
pub fn relative_path(path: &Path, root: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .iter()
        .filter_map(|c| c.to_str())
        .collect::<Vec<_>>()
        .join("/")
}

/// Iterator over one traversal's candidate files
pub struct Candidates {
    root: PathBuf,
    inner: Box<dyn Iterator<Item = walkdir::Result<DirEntry>> + Send>,
    max_file_size: u64,
    warnings: Vec<ScanWarning>,
}

impl Candidates {
    /// Drain the traversal, returning candidates sorted by path plus warnings
    pub fn collect_sorted(mut self) -> (Vec<Candidate>, Vec<ScanWarning>) {
        let mut files: Vec<Candidate> = self.by_ref().collect();
        files.sort_by(|a, b| a.relative.cmp(&b.relative));
        let mut warnings = self.warnings;
        warnings.sort();
        (files, warnings)
    }

    fn record(&mut self, warning: ScanWarning) {
        warn!("Scan warning for {}: {}", warning.path, warning.message);
        self.warnings.push(warning);
    }
}

impl Iterator for Candidates {
    type Item = Candidate;

    fn next(&mut self) -> Option<Candidate> {
        loop {
            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e
                        .path()
                        .map(|p| relative_path(p, &self.root))
                        .unwrap_or_default();
                    let message = match e.loop_ancestor() {
                        Some(ancestor) => format!(
                            "symlink cycle back to {}",
                            relative_path(ancestor, &self.root)
                        ),
                        None => e.to_string(),
                    };
                    self.record(ScanWarning::new(path, message));
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let relative = relative_path(entry.path(), &self.root);
            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(e) => {
                    self.record(ScanWarning::new(relative, e.to_string()));
                    continue;
                }
            };

            if metadata.len() > self.max_file_size {
                debug!("Skipping oversized file {} ({} bytes)", relative, metadata.len());
                continue;
            }

            return Some(Candidate {
                relative,
                absolute: entry.path().to_path_buf(),
                size: metadata.len(),
                modified: metadata.modified().ok().map(DateTime::<Utc>::from),
            });
        }
    }
}
