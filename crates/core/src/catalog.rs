//! Built-in template catalog and YAML catalog parsing.
//!
//! The default catalog ships inside the binary (`templates/builtin.yaml`). A
//! practice can replace it with its own directory of YAML files, see
//! [`crate::repositories::templates::YamlTemplateRepository`].

use crate::assembler::PlaceholderSyntax;
use crate::error::{AskaraError, AskaraResult};
use crate::template::DocumentTemplate;
use serde::Deserialize;
use std::path::Path;

const BUILTIN_CATALOG: &str = include_str!("../templates/builtin.yaml");

/// Parses a YAML stream containing one or more `---`-separated templates.
///
/// `origin` is only used in error messages.
pub fn parse_catalog(yaml: &str, origin: &Path) -> AskaraResult<Vec<DocumentTemplate>> {
    serde_yaml::Deserializer::from_str(yaml)
        .map(|doc| {
            DocumentTemplate::deserialize(doc).map_err(|source| AskaraError::TemplateParse {
                path: origin.to_path_buf(),
                source,
            })
        })
        .collect()
}

/// The templates shipped with Askara, all written with `{{name}}` placeholders.
pub fn builtin_templates() -> Vec<DocumentTemplate> {
    // The embedded catalog is covered by tests; a parse failure here is a build defect.
    parse_catalog(BUILTIN_CATALOG, Path::new("builtin.yaml"))
        .expect("embedded builtin.yaml must be a valid template catalog")
        .into_iter()
        .map(|template| DocumentTemplate {
            syntax: Some(PlaceholderSyntax::Curly),
            ..template
        })
        .collect()
}
