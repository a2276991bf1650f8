//! Document template model.
//!
//! A template is literal text with embedded placeholder tokens (`{{nom}}` by
//! default) plus an ordered schema describing the fields the text expects.
//! A template may pin its own [`PlaceholderSyntax`]; otherwise the configured
//! default applies.
//! The schema is the single source of truth for both substitution and for
//! building input forms.

use crate::assembler::PlaceholderSyntax;
use askara_types::FieldName;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// What kind of input a field expects. Substitution treats every kind as text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    #[default]
    Text,
    Multiline,
    Date,
    Number,
}

/// One declared template field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: FieldName,
    /// Human-readable label shown next to the input. Falls back to the name.
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub kind: FieldKind,
}

impl FieldSchema {
    pub fn new(name: FieldName, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name,
            label: label.into(),
            kind,
        }
    }

    pub fn display_label(&self) -> &str {
        if self.label.trim().is_empty() {
            self.name.as_str()
        } else {
            &self.label
        }
    }
}

/// A catalog entry: immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentTemplate {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    pub content: String,
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Delimiters used in `content`. `None` defers to the configured syntax.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub syntax: Option<PlaceholderSyntax>,
}

impl DocumentTemplate {
    /// The syntax `content` is written in, given the configured default.
    pub fn syntax_or(&self, default: PlaceholderSyntax) -> PlaceholderSyntax {
        self.syntax.unwrap_or(default)
    }

    /// Distinct declared field names, in first-declaration order.
    ///
    /// `fields` may repeat a name; the value map is keyed by this list.
    pub fn field_names(&self) -> Vec<&FieldName> {
        let mut seen = BTreeSet::new();
        self.fields
            .iter()
            .map(|f| &f.name)
            .filter(|name| seen.insert(name.as_str()))
            .collect()
    }

    /// First schema entry declared for `name`.
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name.as_str() == name)
    }

    /// Case-insensitive exact match against any of the template's tags.
    pub fn has_tag(&self, tag: &str) -> bool {
        let wanted = tag.trim().to_lowercase();
        self.tags.iter().any(|t| t.trim().to_lowercase() == wanted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str) -> FieldSchema {
        FieldSchema::new(FieldName::new(name).unwrap(), "", FieldKind::Text)
    }

    fn template() -> DocumentTemplate {
        DocumentTemplate {
            id: "rdv".into(),
            name: "Rappel de rendez-vous".into(),
            description: String::new(),
            category: String::new(),
            content: "Bonjour {{nom}}, RDV le {{date}}. {{nom}}".into(),
            fields: vec![field("nom"), field("date"), field("nom")],
            tags: vec!["Rappel".into(), "Secrétariat".into()],
            syntax: None,
        }
    }

    #[test]
    fn test_field_names_are_distinct_and_ordered() {
        let t = template();
        let names: Vec<&str> = t.field_names().into_iter().map(|n| n.as_str()).collect();
        assert_eq!(names, vec!["nom", "date"]);
    }

    #[test]
    fn test_has_tag_is_case_insensitive_exact() {
        let t = template();
        assert!(t.has_tag("rappel"));
        assert!(t.has_tag("SECRÉTARIAT"));
        assert!(!t.has_tag("rapp"));
    }

    #[test]
    fn test_display_label_falls_back_to_name() {
        let mut f = field("date_rdv");
        assert_eq!(f.display_label(), "date_rdv");
        f.label = "Date du rendez-vous".into();
        assert_eq!(f.display_label(), "Date du rendez-vous");
    }

    #[test]
    fn test_yaml_defaults() {
        let yaml = "id: t\nname: T\ncontent: \"{{x}}\"\nfields:\n  - name: x\n";
        let t: DocumentTemplate = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(t.fields[0].kind, FieldKind::Text);
        assert!(t.tags.is_empty());
        assert_eq!(t.syntax_or(PlaceholderSyntax::Square), PlaceholderSyntax::Square);
    }

    #[test]
    fn test_pinned_syntax_wins_over_default() {
        let yaml = "id: t\nname: T\nsyntax: square\ncontent: \"[x]\"\nfields:\n  - name: x\n";
        let t: DocumentTemplate = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(t.syntax_or(PlaceholderSyntax::Curly), PlaceholderSyntax::Square);
    }
}
