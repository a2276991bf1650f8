//! Document styling preferences.
//!
//! Preferences are a single JSON blob stored under a fixed key
//! ([`PREFERENCES_KEY`]) in one file. Loading never fails the caller: a missing
//! or unreadable blob yields the defaults.

use crate::constants::PREFERENCES_KEY;
use crate::error::{AskaraError, AskaraResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Page margins in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageMargins {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Default for PageMargins {
    fn default() -> Self {
        Self {
            top: 20.0,
            right: 20.0,
            bottom: 20.0,
            left: 20.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DocumentPreferences {
    /// Body font size in points.
    pub font_size: f32,
    /// Line height as a multiple of the font size.
    pub line_height: f32,
    pub margins: PageMargins,
    pub header_text: String,
    pub footer_text: String,
}

impl Default for DocumentPreferences {
    fn default() -> Self {
        Self {
            font_size: 11.0,
            line_height: 1.4,
            margins: PageMargins::default(),
            header_text: String::new(),
            footer_text: String::new(),
        }
    }
}

impl DocumentPreferences {
    /// Checks the values a renderer relies on.
    ///
    /// # Errors
    ///
    /// Returns `AskaraError::InvalidInput` for non-positive or absurd sizes.
    pub fn validate(&self) -> AskaraResult<()> {
        if !(4.0..=72.0).contains(&self.font_size) {
            return Err(AskaraError::InvalidInput(format!(
                "font size must be between 4 and 72 points, got {}",
                self.font_size
            )));
        }
        if !(1.0..=3.0).contains(&self.line_height) {
            return Err(AskaraError::InvalidInput(format!(
                "line height must be between 1.0 and 3.0, got {}",
                self.line_height
            )));
        }
        let m = self.margins;
        if [m.top, m.right, m.bottom, m.left]
            .iter()
            .any(|v| !(0.0..=80.0).contains(v))
        {
            return Err(AskaraError::InvalidInput(
                "page margins must be between 0 and 80 mm".into(),
            ));
        }
        Ok(())
    }
}

/// File-backed preferences blob.
#[derive(Debug, Clone)]
pub struct PreferencesStore {
    path: PathBuf,
}

impl PreferencesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the stored preferences, falling back to defaults.
    pub fn load(&self) -> DocumentPreferences {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return DocumentPreferences::default();
            }
            Err(e) => {
                tracing::warn!("failed to read preferences {}: {}", self.path.display(), e);
                return DocumentPreferences::default();
            }
        };

        let mut blob: BTreeMap<String, serde_json::Value> = match serde_json::from_str(&raw) {
            Ok(blob) => blob,
            Err(e) => {
                tracing::warn!("ignoring invalid preferences file {}: {}", self.path.display(), e);
                return DocumentPreferences::default();
            }
        };

        match blob.remove(PREFERENCES_KEY).map(serde_json::from_value) {
            Some(Ok(prefs)) => prefs,
            Some(Err(e)) => {
                tracing::warn!("ignoring invalid stored preferences: {}", e);
                DocumentPreferences::default()
            }
            None => DocumentPreferences::default(),
        }
    }

    /// Overwrites the stored blob with `prefs`.
    pub fn save(&self, prefs: &DocumentPreferences) -> AskaraResult<()> {
        prefs.validate()?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(AskaraError::StorageDirCreation)?;
        }

        let mut blob = BTreeMap::new();
        blob.insert(
            PREFERENCES_KEY,
            serde_json::to_value(prefs).map_err(AskaraError::Serialization)?,
        );
        let json = serde_json::to_string_pretty(&blob).map_err(AskaraError::Serialization)?;
        fs::write(&self.path, json).map_err(AskaraError::FileWrite)?;
        tracing::debug!("saved preferences to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let store = PreferencesStore::new(dir.path().join("preferences.json"));
        assert_eq!(store.load(), DocumentPreferences::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let store = PreferencesStore::new(dir.path().join("nested").join("preferences.json"));
        let prefs = DocumentPreferences {
            font_size: 12.5,
            header_text: "Cabinet du Dr Martin".into(),
            ..DocumentPreferences::default()
        };
        store.save(&prefs).unwrap();
        assert_eq!(store.load(), prefs);

        let raw = fs::read_to_string(store.path()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json[PREFERENCES_KEY]["fontSize"], 12.5);
    }

    #[test]
    fn test_invalid_blob_yields_defaults() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("preferences.json");
        fs::write(&path, "{not json").unwrap();
        assert_eq!(PreferencesStore::new(&path).load(), DocumentPreferences::default());

        fs::write(&path, format!(r#"{{"{PREFERENCES_KEY}": {{"fontSize": "big"}}}}"#)).unwrap();
        assert_eq!(PreferencesStore::new(&path).load(), DocumentPreferences::default());
    }

    #[test]
    fn test_partial_blob_fills_defaults() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("preferences.json");
        fs::write(&path, format!(r#"{{"{PREFERENCES_KEY}": {{"footerText": "Page"}}}}"#)).unwrap();
        let prefs = PreferencesStore::new(&path).load();
        assert_eq!(prefs.footer_text, "Page");
        assert_eq!(prefs.font_size, 11.0);
    }

    #[test]
    fn test_save_rejects_invalid_values() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let store = PreferencesStore::new(dir.path().join("preferences.json"));
        let prefs = DocumentPreferences {
            font_size: 0.0,
            ..DocumentPreferences::default()
        };
        assert!(matches!(store.save(&prefs), Err(AskaraError::InvalidInput(_))));
        assert!(!store.path().exists());
    }
}
