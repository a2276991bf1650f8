//! Saved document model.
//!
//! A [`Document`] holds assembled text. Once saved, its content is a plain
//! string: `template_id` only records where it came from and editing the
//! document never re-runs substitution.

use askara_types::NonEmptyText;
use askara_uuid::RecordId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AskaraError;
use crate::sanitize::text_to_html;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    #[default]
    Draft,
    Finalized,
    Sent,
    Signed,
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DocumentStatus::Draft => "draft",
            DocumentStatus::Finalized => "finalized",
            DocumentStatus::Sent => "sent",
            DocumentStatus::Signed => "signed",
        })
    }
}

impl FromStr for DocumentStatus {
    type Err = AskaraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(DocumentStatus::Draft),
            "finalized" => Ok(DocumentStatus::Finalized),
            "sent" => Ok(DocumentStatus::Sent),
            "signed" => Ok(DocumentStatus::Signed),
            other => Err(AskaraError::InvalidInput(format!(
                "unknown document status '{other}'"
            ))),
        }
    }
}

/// Broad document category, used for filtering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    ConsultationReport,
    Prescription,
    MedicalCertificate,
    ReferralLetter,
    SickNote,
    #[default]
    Other,
}

impl DocumentKind {
    /// Best-effort mapping from a template category.
    pub fn from_category(category: &str) -> Self {
        match category.trim().to_lowercase().as_str() {
            "consultation" => DocumentKind::ConsultationReport,
            "prescription" => DocumentKind::Prescription,
            "certificat" => DocumentKind::MedicalCertificate,
            "courrier" => DocumentKind::ReferralLetter,
            "arrêt de travail" | "arret de travail" => DocumentKind::SickNote,
            _ => DocumentKind::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::ConsultationReport => "consultation_report",
            DocumentKind::Prescription => "prescription",
            DocumentKind::MedicalCertificate => "medical_certificate",
            DocumentKind::ReferralLetter => "referral_letter",
            DocumentKind::SickNote => "sick_note",
            DocumentKind::Other => "other",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentKind {
    type Err = AskaraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        [
            DocumentKind::ConsultationReport,
            DocumentKind::Prescription,
            DocumentKind::MedicalCertificate,
            DocumentKind::ReferralLetter,
            DocumentKind::SickNote,
            DocumentKind::Other,
        ]
        .into_iter()
        .find(|k| k.as_str() == wanted)
        .ok_or_else(|| AskaraError::InvalidInput(format!("unknown document type '{}'", s.trim())))
    }
}

/// Reference to the patient a document is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientRef {
    pub id: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: RecordId,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: DocumentKind,
    pub status: DocumentStatus,
    pub content: String,
    pub patient: Option<PatientRef>,
    pub template_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: String,
}

impl Document {
    /// The stored text as escaped HTML paragraphs, for read-only display.
    pub fn content_html(&self) -> String {
        text_to_html(&self.content)
    }
}

/// Everything needed to create a document; the repository assigns id and timestamps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDocument {
    pub title: String,
    #[serde(rename = "type", default)]
    pub kind: DocumentKind,
    #[serde(default)]
    pub status: DocumentStatus,
    pub content: String,
    #[serde(default)]
    pub patient: Option<PatientRef>,
    #[serde(default)]
    pub template_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_by: String,
}

impl NewDocument {
    pub(crate) fn into_document(self, id: RecordId, now: DateTime<Utc>) -> Document {
        Document {
            id,
            title: self.title,
            kind: self.kind,
            status: self.status,
            content: self.content,
            patient: self.patient,
            template_id: self.template_id,
            tags: self.tags,
            created_at: now,
            updated_at: now,
            created_by: self.created_by,
        }
    }
}

/// Partial update. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<DocumentKind>,
    #[serde(default)]
    pub status: Option<DocumentStatus>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub patient: Option<PatientRef>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl DocumentUpdate {
    pub fn status(status: DocumentStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Applies the patch and bumps `updated_at`. The id, template link and
    /// creation metadata are never touched.
    pub(crate) fn apply_to(self, doc: &mut Document, now: DateTime<Utc>) {
        if let Some(title) = self.title {
            doc.title = title;
        }
        if let Some(kind) = self.kind {
            doc.kind = kind;
        }
        if let Some(status) = self.status {
            doc.status = status;
        }
        if let Some(content) = self.content {
            doc.content = content;
        }
        if let Some(patient) = self.patient {
            doc.patient = Some(patient);
        }
        if let Some(tags) = self.tags {
            doc.tags = tags;
        }
        doc.updated_at = now.max(doc.updated_at);
    }
}

/// Validates the fields a caller must supply on create.
pub(crate) fn validate_new_document(new: &NewDocument) -> Result<(), AskaraError> {
    required(&new.title, "document title")?;
    required(&new.created_by, "created_by")?;
    Ok(())
}

fn required(value: &str, what: &str) -> Result<NonEmptyText, AskaraError> {
    NonEmptyText::new(value).map_err(|_| AskaraError::InvalidInput(format!("{what} cannot be empty")))
}
