//! Template consistency checks.
//!
//! A template's `content` and its declared `fields` are written by hand and can
//! drift apart. These checks run when a catalog is loaded and report problems as
//! warnings; they never reject a template. An undeclared placeholder is left in
//! the output verbatim by the assembler, so the warning is the only signal an
//! author gets.

use crate::assembler::PlaceholderSyntax;
use crate::error::{AskaraError, AskaraResult};
use crate::template::DocumentTemplate;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// A non-fatal inconsistency in a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "field", rename_all = "snake_case")]
pub enum TemplateWarning {
    /// `content` uses a placeholder whose name is not in `fields`.
    UndeclaredPlaceholder(String),
    /// A field is declared but never appears in `content`.
    UnusedField(String),
    /// The same field name is declared more than once.
    DuplicateField(String),
}

impl fmt::Display for TemplateWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateWarning::UndeclaredPlaceholder(n) => {
                write!(f, "placeholder '{n}' is not declared and will be left as literal text")
            }
            TemplateWarning::UnusedField(n) => write!(f, "field '{n}' is declared but never used"),
            TemplateWarning::DuplicateField(n) => write!(f, "field '{n}' is declared more than once"),
        }
    }
}

/// Compares the placeholders in `template.content` with its declared fields.
///
/// # Errors
///
/// Returns `AskaraError::Pattern` only if the placeholder pattern cannot be compiled.
pub fn validate_template(
    template: &DocumentTemplate,
    syntax: PlaceholderSyntax,
) -> AskaraResult<Vec<TemplateWarning>> {
    let pattern = syntax.any_placeholder()?;
    let used: BTreeSet<&str> = pattern
        .captures_iter(&template.content)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();

    let mut warnings = Vec::new();
    let mut declared = BTreeSet::new();
    for field in &template.fields {
        if !declared.insert(field.name.as_str()) {
            warnings.push(TemplateWarning::DuplicateField(field.name.to_string()));
        }
    }

    for name in &used {
        if !declared.contains(name) {
            warnings.push(TemplateWarning::UndeclaredPlaceholder((*name).to_owned()));
        }
    }
    for name in &declared {
        if !used.contains(name) {
            warnings.push(TemplateWarning::UnusedField((*name).to_owned()));
        }
    }
    Ok(warnings)
}

/// Checks the identity fields every catalog entry needs.
///
/// # Errors
///
/// Returns `AskaraError::InvalidInput` if the id or name is blank, or the id
/// contains characters other than ASCII alphanumerics, `-` and `_`.
pub fn validate_template_identity(template: &DocumentTemplate) -> AskaraResult<()> {
    const MAX_ID_LEN: usize = 128;

    if template.id.trim().is_empty() {
        return Err(AskaraError::InvalidInput("template id cannot be empty".into()));
    }
    if template.id.len() > MAX_ID_LEN {
        return Err(AskaraError::InvalidInput(format!(
            "template id exceeds maximum length of {} characters",
            MAX_ID_LEN
        )));
    }
    let ok = template
        .id
        .bytes()
        .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z' | b'-' | b'_'));
    if !ok {
        return Err(AskaraError::InvalidInput(format!(
            "template id '{}' contains invalid characters (only alphanumeric, '-', '_' allowed)",
            template.id
        )));
    }
    if template.name.trim().is_empty() {
        return Err(AskaraError::InvalidInput(format!(
            "template '{}' has an empty name",
            template.id
        )));
    }
    Ok(())
}
