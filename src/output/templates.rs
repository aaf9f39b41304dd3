// Template engine for narrative documentation sections

use crate::error::Result;
use std::collections::HashMap;
use tera::{Context, Tera, Value};

/// Tera wrapper with the embedded narrative templates and custom filters
pub struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    /// Create a new template engine with embedded templates
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_templates(vec![
            ("overview.md", include_str!("../../templates/overview.md.tera")),
            ("frontend.md", include_str!("../../templates/frontend.md.tera")),
            ("backend.md", include_str!("../../templates/backend.md.tera")),
            ("database.md", include_str!("../../templates/database.md.tera")),
            ("deployment.md", include_str!("../../templates/deployment.md.tera")),
            (
                "troubleshooting.md",
                include_str!("../../templates/troubleshooting.md.tera"),
            ),
        ])?;

        tera.register_filter("pluralize", pluralize);
        tera.register_filter("truncate_words", truncate_words);
        tera.register_filter("slugify", slugify_filter);

        Ok(Self { tera })
    }

    /// Render a template and normalize its whitespace
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        let text = self.tera.render(template_name, context)?;
        Ok(tidy(&text))
    }
}

/// Trim trailing spaces, collapse runs of blank lines, and trim the ends
pub fn tidy(text: &str) -> String {
    let mut out = String::new();
    let mut blank_run = 0;
    for line in text.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }
    out.trim().to_string()
}

/// Truncate text to a number of words
fn truncate_words(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = value.as_str().unwrap_or("");
    let max_words = args
        .get("count")
        .and_then(|v| v.as_u64())
        .unwrap_or(50) as usize;

    let words: Vec<&str> = s.split_whitespace().collect();
    if words.len() <= max_words {
        Ok(Value::String(s.to_string()))
    } else {
        let truncated: String = words[..max_words].join(" ");
        Ok(Value::String(format!("{}...", truncated)))
    }
}

/// Count followed by the singular or plural noun
fn pluralize(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let count = value.as_u64().unwrap_or(0);
    let singular = args
        .get("singular")
        .and_then(|v| v.as_str())
        .unwrap_or("item");
    let default_plural = format!("{}s", singular);
    let plural = args
        .get("plural")
        .and_then(|v| v.as_str())
        .unwrap_or(&default_plural);

    if count == 1 {
        Ok(Value::String(format!("{} {}", count, singular)))
    } else {
        Ok(Value::String(format!("{} {}", count, plural)))
    }
}

fn slugify_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = value.as_str().unwrap_or("");
    Ok(Value::String(slugify(s)))
}

/// Convert text to a lowercase, dash-separated slug
pub fn slugify(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
