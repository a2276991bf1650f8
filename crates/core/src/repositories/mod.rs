//! Storage behind trait seams.
//!
//! The assembler and the API layers only ever see [`templates::TemplateRepository`]
//! and [`documents::DocumentRepository`]; the concrete storage (in memory, YAML
//! directory, JSON files) is chosen once at startup.

pub mod documents;
pub mod templates;
