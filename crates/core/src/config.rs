//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and passed into core
//! services, so request handling never reads process-wide environment variables.
//! The `*_from_env_value` helpers take the raw `Option<String>` a binary read
//! from its environment and turn it into a typed value.

use crate::assembler::{DocumentAssembler, EmptyValuePolicy, PlaceholderSyntax};
use crate::constants::{DOCUMENTS_DIR_NAME, PREFERENCES_FILENAME};
use crate::error::{AskaraError, AskaraResult};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    template_dir: Option<PathBuf>,
    placeholder_syntax: PlaceholderSyntax,
    empty_value_policy: EmptyValuePolicy,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// `template_dir` is `None` to use the built-in catalog.
    ///
    /// # Errors
    ///
    /// Returns `AskaraError::InvalidInput` if `data_dir` is empty.
    pub fn new(
        data_dir: PathBuf,
        template_dir: Option<PathBuf>,
        placeholder_syntax: PlaceholderSyntax,
        empty_value_policy: EmptyValuePolicy,
    ) -> AskaraResult<Self> {
        if data_dir.as_os_str().is_empty() {
            return Err(AskaraError::InvalidInput("data_dir cannot be empty".into()));
        }

        Ok(Self {
            data_dir,
            template_dir,
            placeholder_syntax,
            empty_value_policy,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn documents_dir(&self) -> PathBuf {
        self.data_dir.join(DOCUMENTS_DIR_NAME)
    }

    pub fn preferences_path(&self) -> PathBuf {
        self.data_dir.join(PREFERENCES_FILENAME)
    }

    pub fn template_dir(&self) -> Option<&Path> {
        self.template_dir.as_deref()
    }

    pub fn placeholder_syntax(&self) -> PlaceholderSyntax {
        self.placeholder_syntax
    }

    pub fn empty_value_policy(&self) -> EmptyValuePolicy {
        self.empty_value_policy
    }

    /// An assembler configured with this config's syntax and empty-value policy.
    pub fn assembler(&self) -> DocumentAssembler {
        DocumentAssembler::new(self.placeholder_syntax, self.empty_value_policy)
    }
}

/// Resolve the template directory override.
///
/// `None` means "use the built-in catalog". An override must be an existing directory.
///
/// # Errors
///
/// Returns `AskaraError::InvalidInput` if the override is not a directory.
pub fn resolve_template_dir(override_dir: Option<PathBuf>) -> AskaraResult<Option<PathBuf>> {
    match override_dir {
        None => Ok(None),
        Some(dir) if dir.as_os_str().is_empty() => Ok(None),
        Some(dir) if dir.is_dir() => Ok(Some(dir)),
        Some(dir) => Err(AskaraError::InvalidInput(format!(
            "ASKARA_TEMPLATE_DIR override is not a directory: {}",
            dir.display()
        ))),
    }
}

/// Parse the placeholder syntax from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns the default (`{{name}}`).
pub fn placeholder_syntax_from_env_value(value: Option<String>) -> AskaraResult<PlaceholderSyntax> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    let parsed = value.map(|v| v.parse::<PlaceholderSyntax>()).transpose()?;

    Ok(parsed.unwrap_or_default())
}

/// Parse the empty-value policy from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns the default (`[name]`).
pub fn empty_value_policy_from_env_value(value: Option<String>) -> AskaraResult<EmptyValuePolicy> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    let parsed = value.map(|v| v.parse::<EmptyValuePolicy>()).transpose()?;

    Ok(parsed.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_new_rejects_empty_data_dir() {
        let err = CoreConfig::new(
            PathBuf::new(),
            None,
            PlaceholderSyntax::Curly,
            EmptyValuePolicy::Bracketed,
        )
        .expect_err("empty data_dir should be rejected");
        assert!(matches!(err, AskaraError::InvalidInput(_)));
    }

    #[test]
    fn test_derived_paths() {
        let cfg = CoreConfig::new(
            PathBuf::from("/srv/askara"),
            None,
            PlaceholderSyntax::Curly,
            EmptyValuePolicy::Bracketed,
        )
        .unwrap();
        assert_eq!(cfg.documents_dir(), PathBuf::from("/srv/askara/documents"));
        assert_eq!(cfg.preferences_path(), PathBuf::from("/srv/askara/preferences.json"));
        assert!(cfg.template_dir().is_none());
    }

    #[test]
    fn test_env_value_parsing_defaults_and_overrides() {
        assert_eq!(placeholder_syntax_from_env_value(None).unwrap(), PlaceholderSyntax::Curly);
        assert_eq!(
            placeholder_syntax_from_env_value(Some("  ".into())).unwrap(),
            PlaceholderSyntax::Curly
        );
        assert_eq!(
            placeholder_syntax_from_env_value(Some("square".into())).unwrap(),
            PlaceholderSyntax::Square
        );
        assert!(placeholder_syntax_from_env_value(Some("angle".into())).is_err());

        assert_eq!(empty_value_policy_from_env_value(None).unwrap(), EmptyValuePolicy::Bracketed);
        assert_eq!(
            empty_value_policy_from_env_value(Some("keep".into())).unwrap(),
            EmptyValuePolicy::Keep
        );
    }

    #[test]
    fn test_resolve_template_dir() {
        assert_eq!(resolve_template_dir(None).unwrap(), None);
        let dir = TempDir::new().expect("Failed to create temp dir");
        assert_eq!(
            resolve_template_dir(Some(dir.path().to_path_buf())).unwrap(),
            Some(dir.path().to_path_buf())
        );
        assert!(resolve_template_dir(Some(dir.path().join("missing"))).is_err());
    }
}
