//! Request and response bodies shared by the API surfaces.
//!
//! These are the wire shapes; conversions to and from `askara_core` types live
//! next to them so every surface maps fields the same way.

use askara_core::preferences::PageMargins;
use askara_core::{
    AskaraError, AskaraResult, DocumentKind, DocumentPreferences, DocumentStatus, DocumentTemplate,
    DocumentUpdate, FieldName, FieldSchema, FieldValues, PatientRef, RenderedTemplate,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
}

// ============================================================================
// TEMPLATES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FieldDef {
    pub name: String,
    pub label: String,
    /// `text`, `multiline`, `date` or `number`.
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Template {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub content: String,
    pub fields: Vec<FieldDef>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ListTemplatesRes {
    pub templates: Vec<Template>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RenderTemplateReq {
    #[serde(default)]
    pub values: BTreeMap<String, String>,
    /// Field to highlight in the HTML preview.
    #[serde(default)]
    pub active: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RenderTemplateRes {
    pub template_id: String,
    pub text: String,
    pub html: String,
    pub missing_fields: Vec<String>,
}

impl From<&FieldSchema> for FieldDef {
    fn from(f: &FieldSchema) -> Self {
        let kind = match f.kind {
            askara_core::FieldKind::Text => "text",
            askara_core::FieldKind::Multiline => "multiline",
            askara_core::FieldKind::Date => "date",
            askara_core::FieldKind::Number => "number",
        };
        Self {
            name: f.name.to_string(),
            label: f.display_label().to_owned(),
            kind: kind.to_owned(),
        }
    }
}

impl From<DocumentTemplate> for Template {
    fn from(t: DocumentTemplate) -> Self {
        Self {
            fields: t.fields.iter().map(FieldDef::from).collect(),
            id: t.id,
            name: t.name,
            description: t.description,
            category: t.category,
            content: t.content,
            tags: t.tags,
        }
    }
}

impl From<RenderedTemplate> for RenderTemplateRes {
    fn from(r: RenderedTemplate) -> Self {
        Self {
            template_id: r.template_id,
            text: r.text,
            html: r.html,
            missing_fields: r.missing_fields.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Converts a raw name/value map into validated field values.
///
/// # Errors
///
/// Returns `AskaraError::Text` if a name is not a valid field name.
pub fn field_values(raw: BTreeMap<String, String>) -> AskaraResult<FieldValues> {
    raw.into_iter()
        .map(|(name, value)| -> AskaraResult<_> { Ok((FieldName::new(name)?, value)) })
        .collect()
}

// ============================================================================
// DOCUMENTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Patient {
    pub id: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Document {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
    pub content: String,
    /// `content` as escaped HTML paragraphs.
    pub html: String,
    pub patient: Option<Patient>,
    pub template_id: Option<String>,
    pub tags: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
    pub created_by: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ListDocumentsRes {
    pub documents: Vec<Document>,
}

/// Creates a document from a template (`template_id` + `values`) or from
/// free text (`content`). An unknown template falls back to `content`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CreateDocumentReq {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub template_id: Option<String>,
    #[serde(default)]
    pub values: BTreeMap<String, String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub patient: Option<Patient>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_by: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UpdateDocumentReq {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub patient: Option<Patient>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DeleteDocumentRes {
    pub deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EmailDocumentReq {
    pub to: String,
    #[serde(default)]
    pub subject: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EmailDocumentRes {
    pub message_id: String,
    pub queued_at: String,
    pub document: Document,
}

impl From<Patient> for PatientRef {
    fn from(p: Patient) -> Self {
        PatientRef {
            id: p.id,
            display_name: p.display_name,
        }
    }
}

impl From<PatientRef> for Patient {
    fn from(p: PatientRef) -> Self {
        Patient {
            id: p.id,
            display_name: p.display_name,
        }
    }
}

impl From<askara_core::Document> for Document {
    fn from(d: askara_core::Document) -> Self {
        let html = d.content_html();
        Self {
            id: d.id.to_string(),
            title: d.title,
            kind: d.kind.to_string(),
            status: d.status.to_string(),
            html,
            content: d.content,
            patient: d.patient.map(Patient::from),
            template_id: d.template_id,
            tags: d.tags,
            created_at: d.created_at.to_rfc3339(),
            updated_at: d.updated_at.to_rfc3339(),
            created_by: d.created_by,
        }
    }
}

/// Parses an optional `type` string.
pub fn parse_kind(kind: Option<&str>) -> AskaraResult<Option<DocumentKind>> {
    kind.map(str::parse).transpose()
}

/// Parses an optional `status` string.
pub fn parse_status(status: Option<&str>) -> AskaraResult<Option<DocumentStatus>> {
    status.map(str::parse).transpose()
}

impl TryFrom<UpdateDocumentReq> for DocumentUpdate {
    type Error = AskaraError;

    fn try_from(req: UpdateDocumentReq) -> Result<Self, Self::Error> {
        Ok(DocumentUpdate {
            kind: parse_kind(req.kind.as_deref())?,
            status: parse_status(req.status.as_deref())?,
            title: req.title,
            content: req.content,
            patient: req.patient.map(PatientRef::from),
            tags: req.tags,
        })
    }
}

// ============================================================================
// PREFERENCES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Margins {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub font_size: f32,
    pub line_height: f32,
    /// Millimetres.
    pub margins: Margins,
    pub header_text: String,
    pub footer_text: String,
}

impl From<DocumentPreferences> for Preferences {
    fn from(p: DocumentPreferences) -> Self {
        Self {
            font_size: p.font_size,
            line_height: p.line_height,
            margins: Margins {
                top: p.margins.top,
                right: p.margins.right,
                bottom: p.margins.bottom,
                left: p.margins.left,
            },
            header_text: p.header_text,
            footer_text: p.footer_text,
        }
    }
}

impl From<Preferences> for DocumentPreferences {
    fn from(p: Preferences) -> Self {
        Self {
            font_size: p.font_size,
            line_height: p.line_height,
            margins: PageMargins {
                top: p.margins.top,
                right: p.margins.right,
                bottom: p.margins.bottom,
                left: p.margins.left,
            },
            header_text: p.header_text,
            footer_text: p.footer_text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use askara_core::repositories::documents::{DocumentRepository, InMemoryDocumentRepository};

    #[test]
    fn test_template_conversion_uses_display_labels() {
        let t = askara_core::catalog::builtin_templates()
            .into_iter()
            .find(|t| t.id == "rappel-rdv")
            .unwrap();
        let dto = Template::from(t);
        assert_eq!(dto.fields.len(), 4);
        assert!(dto.fields.iter().all(|f| !f.label.is_empty()));
    }

    #[test]
    fn test_field_values_rejects_bad_names() {
        let mut raw = BTreeMap::new();
        raw.insert("nom patient".to_string(), "x".to_string());
        assert!(field_values(raw).is_err());

        let mut raw = BTreeMap::new();
        raw.insert("nom".to_string(), "Durand".to_string());
        assert_eq!(field_values(raw).unwrap().get("nom"), Some("Durand"));
    }

    #[test]
    fn test_update_request_parses_enums() {
        let req: UpdateDocumentReq =
            serde_json::from_str(r#"{"status": "finalized", "type": "prescription"}"#).unwrap();
        let update = DocumentUpdate::try_from(req).unwrap();
        assert_eq!(update.status, Some(DocumentStatus::Finalized));
        assert_eq!(update.kind, Some(DocumentKind::Prescription));

        let bad = UpdateDocumentReq {
            status: Some("archived".into()),
            ..UpdateDocumentReq::default()
        };
        assert!(DocumentUpdate::try_from(bad).is_err());
    }

    #[test]
    fn test_document_conversion_carries_escaped_html() {
        let doc = InMemoryDocumentRepository::new()
            .create(askara_core::NewDocument {
                title: "Courrier".into(),
                content: "Avis <urgent>".into(),
                created_by: "dr.martin".into(),
                ..askara_core::NewDocument::default()
            })
            .unwrap();
        let dto = Document::from(doc);
        assert_eq!(dto.title, "Courrier");
        assert_eq!(dto.content, "Avis <urgent>");
        assert_eq!(dto.html, "<p>Avis &lt;urgent&gt;</p>");
        assert_eq!(dto.kind, "other");
    }

    #[test]
    fn test_preferences_json_matches_stored_shape() {
        let json = serde_json::to_value(Preferences::from(DocumentPreferences::default())).unwrap();
        assert_eq!(json["fontSize"], 11.0);
        assert_eq!(json["margins"]["top"], 20.0);
    }
}
