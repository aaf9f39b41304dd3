// File classification
//
// Assigns every scanned file exactly one FileType. Path rules are checked
// first in a fixed order. A database-client import outranks the weaker
// service-directory rule. Content heuristics run only for script files no
// rule claimed and for ambiguous extensions (.json, dotfiles).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Closed set of file categories
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Component,
    Route,
    Service,
    Database,
    Config,
    Test,
    Style,
    #[default]
    Other,
}

impl FileType {
    /// All variants in display order
    pub const ALL: [FileType; 8] = [
        FileType::Component,
        FileType::Route,
        FileType::Service,
        FileType::Database,
        FileType::Config,
        FileType::Test,
        FileType::Style,
        FileType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Component => "component",
            FileType::Route => "route",
            FileType::Service => "service",
            FileType::Database => "database",
            FileType::Config => "config",
            FileType::Test => "test",
            FileType::Style => "style",
            FileType::Other => "other",
        }
    }

    /// Human-readable plural label
    pub fn label(&self) -> &'static str {
        match self {
            FileType::Component => "Components",
            FileType::Route => "Routes",
            FileType::Service => "Services",
            FileType::Database => "Database",
            FileType::Config => "Configuration",
            FileType::Test => "Tests",
            FileType::Style => "Styles",
            FileType::Other => "Other",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Script extensions the extractor understands
pub const SCRIPT_EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx", "mjs", "cjs", "mts", "cts"];

/// Extensions whose content the extractor reads
pub const EXTRACTABLE_EXTENSIONS: &[&str] = &[
    "js", "jsx", "ts", "tsx", "mjs", "cjs", "mts", "cts", "vue", "svelte",
];

const UI_EXTENSIONS: &[&str] = &["jsx", "tsx", "vue", "svelte"];
const STYLE_EXTENSIONS: &[&str] = &["css", "scss", "sass", "less", "styl"];
const CONFIG_EXTENSIONS: &[&str] = &["yml", "yaml", "toml", "ini", "conf"];

const COMPONENT_DIRS: &[&str] = &["components", "pages", "views", "layouts", "screens"];
const ROUTE_DIRS: &[&str] = &["routes", "api", "controllers", "endpoints", "handlers"];
const DATABASE_DIRS: &[&str] = &[
    "models",
    "db",
    "database",
    "migrations",
    "schemas",
    "repositories",
    "prisma",
];
const SERVICE_DIRS: &[&str] = &["services", "service", "lib", "utils", "helpers", "middleware"];
const TEST_DIRS: &[&str] = &["__tests__", "tests", "test", "spec", "e2e", "cypress"];

const CONFIG_FILE_NAMES: &[&str] = &[
    "package.json",
    "tsconfig.json",
    "jsconfig.json",
    "dockerfile",
    "docker-compose.yml",
    "docker-compose.yaml",
    "compose.yml",
    "compose.yaml",
    "procfile",
    "makefile",
    "vercel.json",
    "netlify.toml",
    "app.json",
    "nodemon.json",
];

/// Module names whose import marks a file as database access
pub const DATABASE_CLIENTS: &[&str] = &[
    "mongoose",
    "mongodb",
    "@prisma/client",
    "prisma",
    "pg",
    "mysql",
    "mysql2",
    "sqlite3",
    "better-sqlite3",
    "sequelize",
    "knex",
    "typeorm",
    "redis",
    "ioredis",
    "drizzle-orm",
    "@supabase/supabase-js",
    "firebase-admin",
];

const CONFIG_JSON_KEYS: &[&str] = &[
    "scripts",
    "dependencies",
    "devDependencies",
    "compilerOptions",
    "extends",
    "plugins",
    "presets",
    "rules",
];

/// One path-based classification rule
#[derive(Clone, Copy)]
pub struct ClassifyRule {
    pub name: &'static str,
    pub file_type: FileType,
    matches: fn(&PathFacts) -> bool,
}

/// Pre-computed facts about a relative path
#[derive(Debug)]
struct PathFacts {
    file_name: String,
    stem: String,
    extension: String,
    dirs: Vec<String>,
}

impl PathFacts {
    fn new(path: &Path) -> Self {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
            .to_lowercase();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        let stem = file_name
            .split('.')
            .next()
            .unwrap_or("")
            .to_string();
        let dirs = path
            .parent()
            .map(|p| {
                p.iter()
                    .filter_map(|c| c.to_str())
                    .map(|c| c.to_lowercase())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            file_name,
            stem,
            extension,
            dirs,
        }
    }

    fn is_script(&self) -> bool {
        SCRIPT_EXTENSIONS.contains(&self.extension.as_str())
    }

    fn in_dir(&self, names: &[&str]) -> bool {
        self.dirs.iter().any(|d| names.contains(&d.as_str()))
    }

    fn is_dotfile(&self) -> bool {
        self.file_name.starts_with('.')
    }
}

/// Ordered path rules; the first match wins
pub const PATH_RULES: &[ClassifyRule] = &[
    ClassifyRule {
        name: "test-file",
        file_type: FileType::Test,
        matches: |f| {
            f.file_name.contains(".test.")
                || f.file_name.contains(".spec.")
                || (f.in_dir(TEST_DIRS) && f.is_script())
        },
    },
    ClassifyRule {
        name: "stylesheet",
        file_type: FileType::Style,
        matches: |f| STYLE_EXTENSIONS.contains(&f.extension.as_str()),
    },
    ClassifyRule {
        name: "known-config-file",
        file_type: FileType::Config,
        matches: |f| {
            CONFIG_FILE_NAMES.contains(&f.file_name.as_str())
                || f.file_name.starts_with(".env")
                || f.file_name.starts_with("dockerfile")
                || (f.is_script() && f.file_name.contains(".config."))
                || CONFIG_EXTENSIONS.contains(&f.extension.as_str())
        },
    },
    ClassifyRule {
        name: "component-directory",
        file_type: FileType::Component,
        matches: |f| matches!(f.extension.as_str(), "jsx" | "tsx") && f.in_dir(COMPONENT_DIRS),
    },
    ClassifyRule {
        name: "ui-extension",
        file_type: FileType::Component,
        matches: |f| UI_EXTENSIONS.contains(&f.extension.as_str()),
    },
    ClassifyRule {
        name: "route-directory",
        file_type: FileType::Route,
        matches: |f| {
            f.is_script()
                && (f.in_dir(ROUTE_DIRS)
                    || f.file_name.contains(".routes.")
                    || f.file_name.contains(".route.")
                    || f.stem == "routes"
                    || f.stem == "router")
        },
    },
    ClassifyRule {
        name: "database-directory",
        file_type: FileType::Database,
        matches: |f| {
            f.extension == "prisma"
                || f.extension == "sql"
                || (f.is_script()
                    && (f.in_dir(DATABASE_DIRS)
                        || f.file_name.contains(".model.")
                        || f.file_name.contains(".schema.")
                        || f.stem == "db"
                        || f.stem == "database"))
        },
    },
];

/// Path rules that yield to a database-client import in the file
pub const WEAK_PATH_RULES: &[ClassifyRule] = &[ClassifyRule {
    name: "service-directory",
    file_type: FileType::Service,
    matches: |f| f.is_script() && (f.in_dir(SERVICE_DIRS) || f.file_name.contains(".service.")),
}];

/// Deterministic, side-effect-free file classifier
#[derive(Debug, Clone, Copy, Default)]
pub struct FileClassifier;

impl FileClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify a path relative to the project root, consulting content
    /// only when the path alone is ambiguous
    pub fn classify(&self, path: &Path, content: Option<&str>) -> FileType {
        let facts = PathFacts::new(path);

        if let Some(rule) = PATH_RULES.iter().find(|r| (r.matches)(&facts)) {
            tracing::trace!("{} matched rule {}", path.display(), rule.name);
            return rule.file_type;
        }

        if facts.is_script() && content.is_some_and(imports_database_client) {
            return FileType::Database;
        }

        if let Some(rule) = WEAK_PATH_RULES.iter().find(|r| (r.matches)(&facts)) {
            tracing::trace!("{} matched rule {}", path.display(), rule.name);
            return rule.file_type;
        }

        let Some(content) = content else {
            return FileType::Other;
        };

        if facts.is_script() {
            classify_script_content(content)
        } else if facts.extension == "json" {
            classify_json_content(content)
        } else if facts.is_dotfile() {
            classify_dotfile_content(content)
        } else {
            FileType::Other
        }
    }

    /// Whether classification of this path may depend on its content
    ///
    /// Scripts claimed only by a weak rule still need it for the import check.
    pub fn needs_content(&self, path: &Path) -> bool {
        let facts = PathFacts::new(path);
        if PATH_RULES.iter().any(|r| (r.matches)(&facts)) {
            return false;
        }
        facts.is_script() || facts.extension == "json" || facts.is_dotfile()
    }
}

fn classify_script_content(content: &str) -> FileType {
    if imports_database_client(content) {
        return FileType::Database;
    }
    if (content.contains("express()") || content.contains("Router()"))
        && [".get(", ".post(", ".put(", ".patch(", ".delete("]
            .iter()
            .any(|m| content.contains(m))
    {
        return FileType::Route;
    }
    if content.contains("from 'react'")
        || content.contains("from \"react\"")
        || content.contains("return (\n    <")
        || content.contains("return <")
    {
        return FileType::Component;
    }
    if content.contains("export ") || content.contains("module.exports") {
        return FileType::Service;
    }
    FileType::Other
}

/// True when the source imports or requires a known database client
pub fn imports_database_client(content: &str) -> bool {
    DATABASE_CLIENTS.iter().any(|client| {
        [
            format!("from '{}'", client),
            format!("from \"{}\"", client),
            format!("require('{}')", client),
            format!("require(\"{}\")", client),
        ]
        .iter()
        .any(|needle| content.contains(needle.as_str()))
    })
}

fn classify_json_content(content: &str) -> FileType {
    match serde_json::from_str::<serde_json::Value>(content) {
        Ok(serde_json::Value::Object(map)) => {
            if CONFIG_JSON_KEYS.iter().any(|k| map.contains_key(*k)) {
                FileType::Config
            } else {
                FileType::Other
            }
        }
        Ok(_) => FileType::Other,
        Err(e) => {
            tracing::debug!("Unparseable JSON treated as other: {}", e);
            FileType::Other
        }
    }
}

fn classify_dotfile_content(content: &str) -> FileType {
    let meaningful: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .collect();

    if meaningful.is_empty() {
        return FileType::Other;
    }

    let looks_like_settings = meaningful
        .iter()
        .all(|l| l.contains('=') || l.contains(':') || l.starts_with('{') || l.starts_with('}'));

    if looks_like_settings {
        FileType::Config
    } else {
        FileType::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(path: &str) -> FileType {
        FileClassifier::new().classify(Path::new(path), None)
    }

    #[test]
    fn test_path_rules() {
        assert_eq!(classify("src/components/UserList.jsx"), FileType::Component);
        assert_eq!(classify("src/App.tsx"), FileType::Component);
        assert_eq!(classify("pages/api/users.js"), FileType::Route);
        assert_eq!(classify("server/routes/users.js"), FileType::Route);
        assert_eq!(classify("server/api/users.ts"), FileType::Route);
        assert_eq!(classify("server/users.routes.ts"), FileType::Route);
        assert_eq!(classify("server/models/User.js"), FileType::Database);
        assert_eq!(classify("prisma/schema.prisma"), FileType::Database);
        assert_eq!(classify("server/services/userService.js"), FileType::Service);
        assert_eq!(classify("src/styles/main.scss"), FileType::Style);
        assert_eq!(classify("Dockerfile"), FileType::Config);
        assert_eq!(classify("docker-compose.yml"), FileType::Config);
        assert_eq!(classify(".env.example"), FileType::Config);
        assert_eq!(classify("vite.config.ts"), FileType::Config);
        assert_eq!(classify("README.md"), FileType::Other);
    }

    #[test]
    fn test_test_rule_takes_precedence() {
        assert_eq!(classify("src/components/Button.test.jsx"), FileType::Test);
        assert_eq!(classify("__tests__/routes/users.js"), FileType::Test);
        assert_eq!(classify("server/routes/users.spec.ts"), FileType::Test);
    }

    #[test]
    fn test_component_directory_needs_x_extension() {
        let classifier = FileClassifier::new();
        assert_eq!(classify("src/components/Button.js"), FileType::Other);
        assert_eq!(classify("src/pages/Home.tsx"), FileType::Component);

        let react = "import React from 'react';\nexport const Button = () => <button />;\n";
        assert_eq!(
            classifier.classify(Path::new("src/components/Button.js"), Some(react)),
            FileType::Component
        );
    }

    #[test]
    fn test_database_import_beats_service_directory() {
        let classifier = FileClassifier::new();
        let repo = "const mongoose = require('mongoose');\nexports.findUser = (id) => User.findById(id);\n";
        assert_eq!(classifier.classify(Path::new("services/userRepo.js"), Some(repo)), FileType::Database);
        assert_eq!(classifier.classify(Path::new("services/userRepo.js"), None), FileType::Service);

        // Stronger path rules are not overridden
        assert_eq!(classifier.classify(Path::new("routes/users.js"), Some(repo)), FileType::Route);
    }

    #[test]
    fn test_content_heuristics_for_scripts() {
        let classifier = FileClassifier::new();
        let db = "const mongoose = require('mongoose');\nmodule.exports = mongoose.model('User', s);";
        assert_eq!(classifier.classify(Path::new("src/user.js"), Some(db)), FileType::Database);

        let route = "const app = express();\napp.get('/health', (req, res) => res.send('ok'));";
        assert_eq!(classifier.classify(Path::new("server.js"), Some(route)), FileType::Route);

        let service = "export function add(a, b) { return a + b; }";
        assert_eq!(classifier.classify(Path::new("src/math.js"), Some(service)), FileType::Service);

        assert_eq!(classifier.classify(Path::new("src/empty.js"), Some("")), FileType::Other);
    }

    #[test]
    fn test_json_heuristics() {
        let classifier = FileClassifier::new();
        let tsconfig = r#"{"compilerOptions": {"strict": true}}"#;
        assert_eq!(classifier.classify(Path::new("tsconfig.base.json"), Some(tsconfig)), FileType::Config);

        let data = r#"[{"id": 1}]"#;
        assert_eq!(classifier.classify(Path::new("data/users.json"), Some(data)), FileType::Other);

        assert_eq!(classifier.classify(Path::new("broken.json"), Some("{ nope")), FileType::Other);
    }

    #[test]
    fn test_dotfile_heuristics() {
        let classifier = FileClassifier::new();
        assert_eq!(
            classifier.classify(Path::new(".npmrc"), Some("registry=https://example.org\n")),
            FileType::Config
        );
        assert_eq!(
            classifier.classify(Path::new(".notes"), Some("remember the milk\n")),
            FileType::Other
        );
    }

    #[test]
    fn test_classification_is_deterministic() {
        let classifier = FileClassifier::new();
        let path = Path::new("server/routes/users.js");
        let first = classifier.classify(path, None);
        for _ in 0..10 {
            assert_eq!(classifier.classify(path, None), first);
        }
    }

    #[test]
    fn test_needs_content() {
        let classifier = FileClassifier::new();
        assert!(!classifier.needs_content(Path::new("src/components/A.jsx")));
        assert!(classifier.needs_content(Path::new("src/index.js")));
        assert!(classifier.needs_content(Path::new("settings.json")));
        assert!(!classifier.needs_content(Path::new("README.md")));
        assert!(classifier.needs_content(Path::new("server/services/userRepo.js")));
        assert!(!classifier.needs_content(Path::new("server/routes/users.js")));
    }

    #[test]
    fn test_file_type_serde() {
        let json = serde_json::to_string(&FileType::Component).unwrap();
        assert_eq!(json, "\"component\"");
        assert_eq!(FileType::Route.to_string(), "route");
    }
}
