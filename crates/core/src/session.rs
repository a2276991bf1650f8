//! Template-filling sessions.
//!
//! An [`EditingSession`] owns the transient value map for one template while a
//! user fills it in. The map starts with one empty entry per declared field;
//! every change can be followed by a fresh preview. Nothing here is persisted
//! until the session is turned into a [`NewDocument`].

use crate::assembler::{DocumentAssembler, FieldValues};
use crate::document::{DocumentKind, DocumentStatus, NewDocument, PatientRef};
use crate::error::{AskaraError, AskaraResult};
use crate::template::DocumentTemplate;
use askara_types::FieldName;
use serde::{Deserialize, Serialize};

/// Metadata supplied when a session is saved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveMeta {
    /// Defaults to the template name.
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub patient: Option<PatientRef>,
    pub created_by: String,
    #[serde(default)]
    pub status: DocumentStatus,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct EditingSession {
    template: DocumentTemplate,
    values: FieldValues,
    active: Option<FieldName>,
    assembler: DocumentAssembler,
}

impl EditingSession {
    pub fn new(template: DocumentTemplate, assembler: DocumentAssembler) -> Self {
        let values = FieldValues::for_template(&template);
        let assembler = assembler.for_template(&template);
        Self {
            template,
            values,
            active: None,
            assembler,
        }
    }

    pub fn template(&self) -> &DocumentTemplate {
        &self.template
    }

    pub fn values(&self) -> &FieldValues {
        &self.values
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.values.get(name)
    }

    pub fn active(&self) -> Option<&FieldName> {
        self.active.as_ref()
    }

    /// Replaces the value of a declared field.
    ///
    /// # Errors
    ///
    /// Returns `AskaraError::InvalidInput` if `name` is not declared by the template.
    pub fn set_value(&mut self, name: &str, value: impl Into<String>) -> AskaraResult<()> {
        let field = self.declared(name)?;
        self.values.set(field, value);
        Ok(())
    }

    /// Sets several values at once. Either all are applied or none.
    pub fn apply(&mut self, values: &FieldValues) -> AskaraResult<()> {
        for (name, _) in values.iter() {
            self.declared(name.as_str())?;
        }
        for (name, value) in values.iter() {
            self.values.set(name.clone(), value);
        }
        Ok(())
    }

    /// Selects the field the user is editing, or clears the selection.
    pub fn set_active(&mut self, name: Option<&str>) -> AskaraResult<()> {
        self.active = name.map(|n| self.declared(n)).transpose()?;
        Ok(())
    }

    /// Declared fields whose value is still blank.
    pub fn missing_fields(&self) -> Vec<&FieldName> {
        self.values
            .iter()
            .filter(|(_, v)| v.trim().is_empty())
            .map(|(k, _)| k)
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Final text with every declared placeholder substituted.
    pub fn assembled_text(&self) -> AskaraResult<String> {
        self.assembler.render(&self.template, &self.values)
    }

    /// Escaped preview markup with the active field highlighted.
    pub fn preview_html(&self) -> AskaraResult<String> {
        self.assembler.highlight_active_field(
            &self.template.content,
            &self.values,
            self.active.as_ref().map(FieldName::as_str),
        )
    }

    /// Assembles the text and packages it for a [`DocumentRepository`](crate::repositories::documents::DocumentRepository).
    pub fn to_new_document(&self, meta: SaveMeta) -> AskaraResult<NewDocument> {
        let title = meta
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| self.template.name.clone());
        let tags = if meta.tags.is_empty() {
            self.template.tags.clone()
        } else {
            meta.tags
        };

        Ok(NewDocument {
            title,
            kind: DocumentKind::from_category(&self.template.category),
            status: meta.status,
            content: self.assembled_text()?,
            patient: meta.patient,
            template_id: Some(self.template.id.clone()),
            tags,
            created_by: meta.created_by,
        })
    }

    fn declared(&self, name: &str) -> AskaraResult<FieldName> {
        self.template
            .field(name.trim())
            .map(|f| f.name.clone())
            .ok_or_else(|| {
                AskaraError::InvalidInput(format!(
                    "field '{}' is not declared by template '{}'",
                    name, self.template.id
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::builtin_templates;

    fn session(id: &str) -> EditingSession {
        let template = builtin_templates().into_iter().find(|t| t.id == id).unwrap();
        EditingSession::new(template, DocumentAssembler::default())
    }

    #[test]
    fn test_new_session_has_empty_value_per_field() {
        let s = session("rappel-rdv");
        assert_eq!(s.values().len(), 4);
        assert!(s.values().iter().all(|(_, v)| v.is_empty()));
        assert!(!s.is_complete());
    }

    #[test]
    fn test_set_value_updates_text_and_preview() {
        let mut s = session("rappel-rdv");
        s.set_value("nom_patient", "Mme Durand").unwrap();
        s.set_value("date_rdv", "12/06").unwrap();
        s.set_active(Some("date_rdv")).unwrap();

        let text = s.assembled_text().unwrap();
        assert!(text.starts_with("Bonjour Mme Durand, vous avez rendez-vous le 12/06 à [heure_rdv]"));

        let html = s.preview_html().unwrap();
        assert!(html.contains(r#"<mark class="active-field" data-field="date_rdv">12/06</mark>"#));
        assert!(html.contains(r#"<span class="placeholder" data-field="cabinet">[cabinet]</span>"#));
        assert!(html.contains("d&#39;empêchement"));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let mut s = session("rappel-rdv");
        assert!(matches!(s.set_value("inconnu", "x"), Err(AskaraError::InvalidInput(_))));
        assert!(s.set_active(Some("inconnu")).is_err());
    }

    #[test]
    fn test_apply_is_all_or_nothing() {
        let mut s = session("rappel-rdv");
        let values: FieldValues = [
            (FieldName::new("nom_patient").unwrap(), "Durand".to_string()),
            (FieldName::new("inconnu").unwrap(), "x".to_string()),
        ]
        .into_iter()
        .collect();
        assert!(s.apply(&values).is_err());
        assert_eq!(s.value("nom_patient"), Some(""));
    }

    #[test]
    fn test_to_new_document_defaults() {
        let mut s = session("certificat-medical");
        s.set_value("nom_patient", "M. Petit").unwrap();
        let new = s
            .to_new_document(SaveMeta {
                created_by: "dr.martin".into(),
                ..SaveMeta::default()
            })
            .unwrap();
        assert_eq!(new.title, "Certificat médical");
        assert_eq!(new.kind, DocumentKind::MedicalCertificate);
        assert_eq!(new.template_id.as_deref(), Some("certificat-medical"));
        assert_eq!(new.tags, vec!["Certificat", "Administratif"]);
        assert!(new.content.contains("M. Petit"));
        assert!(new.content.contains("[medecin]"));
    }
}
