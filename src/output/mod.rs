// Documentation generation and persistence

pub mod diagrams;
pub mod docs;
pub mod store;
pub mod templates;

pub use diagrams::{slug, DiagramGenerator};
pub use docs::*;
pub use store::DocumentationStore;
pub use templates::TemplateEngine;
