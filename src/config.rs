use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the persisted documentation artifact inside the output directory
pub const ARTIFACT_FILE_NAME: &str = "documentation.json";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub project: ProjectConfig,
    pub analysis: AnalysisConfig,
    pub output: OutputConfig,
    pub diagrams: DiagramConfig,
}

/// Project metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Display name; the root directory name is used when empty
    pub name: String,
    pub description: Option<String>,
}

/// Analysis settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Extra ignore globs on top of the defaults
    pub exclude: Vec<String>,
    /// Apply the built-in dependency/build/VCS ignore list
    pub use_default_ignores: bool,
    /// Files larger than this many bytes are skipped
    pub max_file_size: u64,
    pub follow_links: bool,
}

/// Output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: PathBuf,
}

/// Diagram settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagramConfig {
    pub enabled: bool,
    pub direction: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            exclude: Vec::new(),
            use_default_ignores: true,
            max_file_size: 1_048_576,
            follow_links: true,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./docs-output"),
        }
    }
}

impl Default for DiagramConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            direction: "LR".to_string(),
        }
    }
}

impl OutputConfig {
    /// Full path of the persisted artifact
    pub fn artifact_path(&self) -> PathBuf {
        self.directory.join(ARTIFACT_FILE_NAME)
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from file or return defaults
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(Error::Io(_)) => Self::default(),
            Err(e) => {
                tracing::warn!("Ignoring config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Merge CLI arguments into config (CLI takes precedence)
    pub fn merge_cli(
        &mut self,
        output: Option<PathBuf>,
        exclude: Vec<String>,
        name: Option<String>,
        no_diagrams: bool,
    ) {
        if let Some(out) = output {
            self.output.directory = out;
        }

        if !exclude.is_empty() {
            self.analysis.exclude.extend(exclude);
        }

        if let Some(name) = name {
            self.project.name = name;
        }

        if no_diagrams {
            self.diagrams.enabled = false;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.analysis.max_file_size == 0 {
            return Err(Error::config_validation("max_file_size must be at least 1"));
        }

        for pattern in &self.analysis.exclude {
            glob::Pattern::new(pattern)?;
        }

        if !matches!(self.diagrams.direction.as_str(), "TB" | "TD" | "BT" | "LR" | "RL") {
            return Err(Error::config_validation(format!(
                "unknown diagram direction '{}'",
                self.diagrams.direction
            )));
        }

        if self.output.directory.as_os_str().is_empty() {
            return Err(Error::config_validation("output directory must not be empty"));
        }

        Ok(())
    }

    /// Project name, falling back to the root directory name
    pub fn project_name(&self, root: &Path) -> String {
        if !self.project.name.trim().is_empty() {
            return self.project.name.clone();
        }
        root.file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("Project")
            .to_string()
    }
}
