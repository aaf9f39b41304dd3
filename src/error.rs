use std::path::PathBuf;
use thiserror::Error;

/// Codescribe error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config validation error: {0}")]
    ConfigValidation(String),

    #[error("Invalid project root: {path}: {reason}")]
    InvalidRoot { path: PathBuf, reason: String },

    #[error("Invalid output path: {path}: {reason}")]
    InvalidOutput { path: PathBuf, reason: String },

    #[error("Parse error in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Pattern compile error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Glob pattern error: {0}")]
    GlobPattern(#[from] glob::PatternError),

    #[error("Failed to persist documentation: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("Analysis error: {0}")]
    Analysis(String),

    #[error("A regeneration is already in progress")]
    RegenerationInProgress,

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for Codescribe operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a config validation error
    pub fn config_validation(msg: impl Into<String>) -> Self {
        Error::ConfigValidation(msg.into())
    }

    /// Create an invalid root error
    pub fn invalid_root(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::InvalidRoot {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid output path error
    pub fn invalid_output(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::InvalidOutput {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a parse error
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an analysis error
    pub fn analysis(msg: impl Into<String>) -> Self {
        Error::Analysis(msg.into())
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// True for errors caused by bad configuration rather than a failed run
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::ConfigParse(_)
                | Error::ConfigValidation(_)
                | Error::InvalidRoot { .. }
                | Error::InvalidOutput { .. }
                | Error::GlobPattern(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("IO error"));
    }

    #[test]
    fn test_invalid_root_display() {
        let err = Error::invalid_root("/some/path", "does not exist");
        assert_eq!(
            err.to_string(),
            "Invalid project root: /some/path: does not exist"
        );
        assert!(err.is_configuration());
    }

    #[test]
    fn test_invalid_output_display() {
        let err = Error::invalid_output("/out/file.txt", "not a directory");
        assert!(err.to_string().contains("/out/file.txt"));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_parse_error_display() {
        let err = Error::parse("src/app.js", "binary content");
        assert!(err.to_string().contains("src/app.js"));
        assert!(err.to_string().contains("binary content"));
    }

    #[test]
    fn test_config_validation_display() {
        let err = Error::config_validation("max_file_size must be positive");
        assert_eq!(
            err.to_string(),
            "Config validation error: max_file_size must be positive"
        );
    }

    #[test]
    fn test_analysis_error() {
        let err = Error::analysis("no files");
        assert_eq!(err.to_string(), "Analysis error: no files");
        assert!(!err.is_configuration());
    }

    #[test]
    fn test_regeneration_in_progress() {
        let err = Error::RegenerationInProgress;
        assert!(err.to_string().contains("already in progress"));
    }

    #[test]
    fn test_other_error() {
        let err = Error::other("something went wrong");
        assert_eq!(err.to_string(), "something went wrong");
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
