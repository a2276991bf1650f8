//! Template catalog repositories.
//!
//! Templates are read-only catalog data: repositories expose lookups and
//! nothing else. Two implementations share the [`TemplateRepository`] contract:
//!
//! - [`InMemoryTemplateRepository`] holds a fixed list (the built-in catalog by default).
//! - [`YamlTemplateRepository`] loads a directory of `*.yaml` / `*.yml` files once at startup.
//!
//! Both validate templates on construction and log any [`TemplateWarning`]s.

use crate::assembler::PlaceholderSyntax;
use crate::catalog::{builtin_templates, parse_catalog};
use crate::error::{AskaraError, AskaraResult};
use crate::template::DocumentTemplate;
use crate::validation::{validate_template, validate_template_identity, TemplateWarning};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Read access to the template catalog.
///
/// Unknown ids and unmatched tags are ordinary outcomes (`None` / empty), not errors.
pub trait TemplateRepository: Send + Sync {
    /// Every template, in catalog order.
    fn all(&self) -> Vec<DocumentTemplate>;

    /// Exact id lookup.
    fn by_id(&self, id: &str) -> Option<DocumentTemplate>;

    /// Templates carrying `tag`, compared case-insensitively and exactly.
    fn by_tag(&self, tag: &str) -> Vec<DocumentTemplate> {
        self.all().into_iter().filter(|t| t.has_tag(tag)).collect()
    }
}

/// A catalog held entirely in memory.
#[derive(Debug, Clone)]
pub struct InMemoryTemplateRepository {
    templates: Vec<DocumentTemplate>,
}

impl InMemoryTemplateRepository {
    /// Builds a repository from `templates`. Templates that do not pin their
    /// own syntax are checked against `syntax`.
    ///
    /// # Errors
    ///
    /// Returns `AskaraError::InvalidInput` if a template has an invalid id or
    /// name, or if two templates share an id.
    pub fn new(templates: Vec<DocumentTemplate>, syntax: PlaceholderSyntax) -> AskaraResult<Self> {
        let mut ids = HashSet::new();
        for template in &templates {
            validate_template_identity(template)?;
            if !ids.insert(template.id.as_str()) {
                return Err(AskaraError::InvalidInput(format!(
                    "duplicate template id '{}'",
                    template.id
                )));
            }
            let warnings = validate_template(template, template.syntax_or(syntax))?;
            log_warnings(template, &warnings);
        }
        Ok(Self { templates })
    }

    /// The catalog shipped with Askara.
    ///
    /// # Errors
    ///
    /// Returns `AskaraError::InvalidInput` if the embedded catalog has an
    /// invalid or duplicated template id.
    pub fn builtin() -> AskaraResult<Self> {
        Self::new(builtin_templates(), PlaceholderSyntax::Curly)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl TemplateRepository for InMemoryTemplateRepository {
    fn all(&self) -> Vec<DocumentTemplate> {
        self.templates.clone()
    }

    fn by_id(&self, id: &str) -> Option<DocumentTemplate> {
        self.templates.iter().find(|t| t.id == id).cloned()
    }
}

/// A catalog loaded from a directory of YAML files.
///
/// Each file may hold one template or several separated by `---`. Files are
/// read in file-name order; other extensions are ignored.
#[derive(Debug, Clone)]
pub struct YamlTemplateRepository {
    dir: PathBuf,
    inner: InMemoryTemplateRepository,
}

impl YamlTemplateRepository {
    /// Loads every `*.yaml` / `*.yml` file directly inside `dir`.
    ///
    /// # Errors
    ///
    /// Returns `AskaraError` if:
    /// - the directory or a file cannot be read,
    /// - a file is larger than the size limit or the directory holds too many files,
    /// - a file is not a valid template,
    /// - template ids are invalid or duplicated.
    pub fn load(dir: &Path, syntax: PlaceholderSyntax) -> AskaraResult<Self> {
        const MAX_FILES: usize = 500;
        const MAX_FILE_BYTES: u64 = 1024 * 1024;

        let mut paths = Vec::new();
        for entry in fs::read_dir(dir).map_err(AskaraError::FileRead)? {
            let path = entry.map_err(AskaraError::FileRead)?.path();
            let is_yaml = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e == "yaml" || e == "yml");
            if path.is_file() && is_yaml {
                paths.push(path);
            }
        }
        if paths.len() > MAX_FILES {
            return Err(AskaraError::InvalidInput(format!(
                "template directory holds more than {MAX_FILES} files"
            )));
        }
        paths.sort();

        let mut templates = Vec::new();
        for path in &paths {
            let len = fs::metadata(path).map_err(AskaraError::FileRead)?.len();
            if len > MAX_FILE_BYTES {
                return Err(AskaraError::InvalidInput(format!(
                    "template file {} exceeds {} bytes",
                    path.display(),
                    MAX_FILE_BYTES
                )));
            }
            let raw = fs::read_to_string(path).map_err(AskaraError::FileRead)?;
            templates.extend(parse_catalog(&raw, path)?);
        }

        tracing::info!(
            "loaded {} templates from {}",
            templates.len(),
            dir.display()
        );

        Ok(Self {
            dir: dir.to_path_buf(),
            inner: InMemoryTemplateRepository::new(templates, syntax)?,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl TemplateRepository for YamlTemplateRepository {
    fn all(&self) -> Vec<DocumentTemplate> {
        self.inner.all()
    }

    fn by_id(&self, id: &str) -> Option<DocumentTemplate> {
        self.inner.by_id(id)
    }
}

fn log_warnings(template: &DocumentTemplate, warnings: &[TemplateWarning]) {
    for warning in warnings {
        tracing::warn!("template '{}': {}", template.id, warning);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_builtin_all_and_by_id() {
        let repo = InMemoryTemplateRepository::builtin().unwrap();
        assert_eq!(repo.all().len(), repo.len());
        let t = repo.by_id("ordonnance").expect("ordonnance should exist");
        assert_eq!(t.name, "Ordonnance");
    }

    #[test]
    fn test_by_id_unknown_is_none() {
        let repo = InMemoryTemplateRepository::builtin().unwrap();
        assert!(repo.by_id("does-not-exist").is_none());
        assert!(repo.by_id("").is_none());
        assert!(repo.by_id("ORDONNANCE").is_none(), "id lookup is exact");
    }

    #[test]
    fn test_by_tag_case_insensitive() {
        let repo = InMemoryTemplateRepository::builtin().unwrap();
        let admin: Vec<String> = repo.by_tag("administratif").into_iter().map(|t| t.id).collect();
        assert_eq!(admin, vec!["certificat-medical", "arret-travail"]);
        assert!(repo.by_tag("admin").is_empty());
    }

    #[test]
    fn test_new_rejects_duplicate_ids() {
        let mut templates = builtin_templates();
        templates.push(templates[0].clone());
        let err = InMemoryTemplateRepository::new(templates, PlaceholderSyntax::Curly).unwrap_err();
        assert!(matches!(err, AskaraError::InvalidInput(msg) if msg.contains("duplicate")));
    }

    #[test]
    fn test_new_keeps_templates_with_warnings() {
        let mut t = builtin_templates().remove(0);
        t.content.push_str(" {{signature_electronique}}");
        let repo = InMemoryTemplateRepository::new(vec![t], PlaceholderSyntax::Curly).unwrap();
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn test_yaml_repository_loads_directory() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        fs::write(
            dir.path().join("b.yaml"),
            "id: b\nname: B\ncontent: \"{{x}}\"\nfields: [{name: x}]\ntags: [Lettre]\n---\nid: c\nname: C\ncontent: texte\n",
        )
        .unwrap();
        fs::write(dir.path().join("a.yml"), "id: a\nname: A\ncontent: A\ntags: [lettre]\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let repo = YamlTemplateRepository::load(dir.path(), PlaceholderSyntax::Curly).unwrap();
        let ids: Vec<String> = repo.all().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(repo.by_tag("LETTRE").len(), 2);
        assert_eq!(repo.dir(), dir.path());
    }

    #[test]
    fn test_yaml_template_can_pin_square_syntax() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        fs::write(
            dir.path().join("rdv.yaml"),
            "id: rdv\nname: RDV\nsyntax: square\ncontent: \"Bonjour [nom]\"\nfields: [{name: nom}]\n",
        )
        .unwrap();

        let repo = YamlTemplateRepository::load(dir.path(), PlaceholderSyntax::Curly).unwrap();
        let t = repo.by_id("rdv").unwrap();
        assert_eq!(t.syntax_or(PlaceholderSyntax::Curly), PlaceholderSyntax::Square);
        assert!(validate_template(&t, t.syntax_or(PlaceholderSyntax::Curly)).unwrap().is_empty());
    }

    #[test]
    fn test_yaml_repository_reports_bad_file() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        fs::write(dir.path().join("bad.yaml"), "id: [").unwrap();
        let err = YamlTemplateRepository::load(dir.path(), PlaceholderSyntax::Curly).unwrap_err();
        assert!(matches!(err, AskaraError::TemplateParse { .. }));
    }

    #[test]
    fn test_yaml_repository_missing_dir() {
        let err = YamlTemplateRepository::load(Path::new("/nonexistent/askara"), PlaceholderSyntax::Curly)
            .unwrap_err();
        assert!(matches!(err, AskaraError::FileRead(_)));
    }
}
