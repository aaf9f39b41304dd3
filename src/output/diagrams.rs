// Diagram generation
//
// Projects the relationship graph into a Mermaid flowchart: one node per
// file grouped by file type, one edge per resolved relationship.

use crate::analysis::{CodebaseAnalysis, FileType, RelationGraph};
use crate::config::DiagramConfig;
use sha2::{Digest, Sha256};

/// Diagram generator for Mermaid flowcharts
pub struct DiagramGenerator {
    /// Layout direction (TB, TD, BT, LR, RL)
    direction: String,
    enabled: bool,
}

impl DiagramGenerator {
    /// Create a new diagram generator
    pub fn new() -> Self {
        Self {
            direction: "LR".to_string(),
            enabled: true,
        }
    }

    pub fn from_config(config: &DiagramConfig) -> Self {
        Self {
            direction: config.direction.clone(),
            enabled: config.enabled,
        }
    }

    /// Set layout direction
    pub fn with_direction(mut self, dir: &str) -> Self {
        self.direction = dir.to_string();
        self
    }

    /// Architecture flowchart; empty when diagrams are disabled
    pub fn generate(&self, analysis: &CodebaseAnalysis, graph: &RelationGraph) -> String {
        if !self.enabled {
            return String::new();
        }

        let mut lines = vec![format!("flowchart {}", self.direction)];

        for file_type in FileType::ALL {
            let files: Vec<&str> = analysis
                .files
                .iter()
                .filter(|f| f.file_type == file_type)
                .map(|f| f.path.as_str())
                .collect();
            if files.is_empty() {
                continue;
            }

            lines.push(format!(
                "    subgraph group_{}[\"{}\"]",
                file_type.as_str(),
                file_type.label()
            ));
            for path in files {
                lines.push(format!("        {}[\"{}\"]", slug(path), escape_label(path)));
            }
            lines.push("    end".to_string());
        }

        for (from, to, label) in graph.file_edges(analysis) {
            lines.push(format!(
                "    {} -->|\"{}\"| {}",
                slug(&from),
                escape_label(&label),
                slug(&to)
            ));
        }

        lines.join("\n")
    }
}

impl Default for DiagramGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Stable Mermaid node id for a file path
///
/// The sanitized path keeps ids readable; the hash suffix keeps paths that
/// sanitize to the same text apart.
pub fn slug(path: &str) -> String {
    let digest = Sha256::digest(path.as_bytes());
    let suffix: String = digest.iter().take(4).map(|b| format!("{:02x}", b)).collect();
    format!("n_{}_{}", sanitize_id(path), suffix)
}

/// Sanitize a string for use as a Mermaid node ID
fn sanitize_id(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn escape_label(s: &str) -> String {
    s.replace('"', "#quot;")
}
