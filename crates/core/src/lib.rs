//! # Askara Core
//!
//! Core logic for Askara's medical document templating:
//! - The template catalog (built-in or loaded from YAML) and its consistency checks
//! - Placeholder substitution and the highlighted HTML preview
//! - Editing sessions and voice dictation into template fields
//! - Saved documents with in-memory or sharded JSON storage
//! - Styling preferences, A4 PDF export and e-mail hand-off
//!
//! **No API concerns**: HTTP servers and command-line parsing belong in
//! `api-rest` and `cli`. Both talk to the core through [`DocumentService`].

pub mod assembler;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod dictation;
pub mod document;
pub mod email;
pub mod error;
pub mod export;
pub mod preferences;
pub mod repositories;
pub mod sanitize;
pub mod service;
pub mod session;
pub mod template;
pub mod validation;

pub use askara_types::{EmailAddress, FieldName, NonEmptyText, TextError};
pub use askara_uuid::RecordId;

pub use assembler::{DocumentAssembler, EmptyValuePolicy, FieldValues, PlaceholderSyntax};
pub use config::CoreConfig;
pub use document::{Document, DocumentKind, DocumentStatus, DocumentUpdate, NewDocument, PatientRef};
pub use error::{AskaraError, AskaraResult};
pub use preferences::DocumentPreferences;
pub use service::{DocumentService, RenderedTemplate};
pub use session::{EditingSession, SaveMeta};
pub use template::{DocumentTemplate, FieldKind, FieldSchema};
