//! Constants used throughout the Askara core crate.
//!
//! Path and filename constants live here so storage layout stays consistent
//! across repositories and binaries.

/// Default directory for all Askara data when no explicit directory is configured.
pub const DEFAULT_DATA_DIR: &str = "askara_data";

/// Directory name (under the data directory) for saved documents.
pub const DOCUMENTS_DIR_NAME: &str = "documents";

/// Filename of each stored document.
pub const DOCUMENT_FILENAME: &str = "document.json";

/// Filename of the preferences blob (under the data directory).
pub const PREFERENCES_FILENAME: &str = "preferences.json";

/// Fixed key under which document styling preferences are stored.
pub const PREFERENCES_KEY: &str = "askara-document-preferences";

/// A4 page size in PDF points (1/72 inch).
pub const A4_WIDTH_PT: f32 = 595.0;
pub const A4_HEIGHT_PT: f32 = 842.0;
