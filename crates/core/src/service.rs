//! Application service tying the catalog, the document store, preferences,
//! export and e-mail together.
//!
//! API layers (`api-rest`, the CLI) hold a [`DocumentService`] and never touch
//! repositories directly.

use crate::assembler::{DocumentAssembler, FieldValues};
use crate::config::CoreConfig;
use crate::document::{Document, DocumentStatus, DocumentUpdate, NewDocument};
use crate::email::{EmailMessage, EmailReceipt, LoggingMailer, Mailer};
use crate::error::{AskaraError, AskaraResult};
use crate::export::{pdf_filename, ExportedPdf, PdfExporter};
use crate::preferences::{DocumentPreferences, PreferencesStore};
use crate::repositories::documents::{DocumentRepository, FileDocumentRepository};
use crate::repositories::templates::{
    InMemoryTemplateRepository, TemplateRepository, YamlTemplateRepository,
};
use crate::session::{EditingSession, SaveMeta};
use crate::template::DocumentTemplate;
use askara_types::{EmailAddress, FieldName};
use askara_uuid::RecordId;
use serde::Serialize;
use std::sync::Arc;

/// Output of a one-shot template render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedTemplate {
    pub template_id: String,
    pub text: String,
    pub html: String,
    pub missing_fields: Vec<FieldName>,
}

#[derive(Clone)]
pub struct DocumentService {
    templates: Arc<dyn TemplateRepository>,
    documents: Arc<dyn DocumentRepository>,
    preferences: PreferencesStore,
    mailer: Arc<dyn Mailer>,
    assembler: DocumentAssembler,
    exporter: PdfExporter,
}

impl DocumentService {
    pub fn new(
        templates: Arc<dyn TemplateRepository>,
        documents: Arc<dyn DocumentRepository>,
        preferences: PreferencesStore,
        mailer: Arc<dyn Mailer>,
        assembler: DocumentAssembler,
    ) -> Self {
        Self {
            templates,
            documents,
            preferences,
            mailer,
            assembler,
            exporter: PdfExporter::new(),
        }
    }

    /// Builds the service described by `cfg`: the YAML catalog when a template
    /// directory is configured (otherwise the built-in one), file-backed
    /// documents and preferences under the data directory, and the logging mailer.
    ///
    /// # Errors
    ///
    /// Returns `AskaraError` if the template catalog cannot be loaded or the
    /// documents directory cannot be created.
    pub fn from_config(cfg: &CoreConfig) -> AskaraResult<Self> {
        let templates: Arc<dyn TemplateRepository> = match cfg.template_dir() {
            Some(dir) => Arc::new(YamlTemplateRepository::load(dir, cfg.placeholder_syntax())?),
            None => Arc::new(InMemoryTemplateRepository::builtin()?),
        };
        let documents = Arc::new(FileDocumentRepository::new(cfg.documents_dir())?);

        Ok(Self::new(
            templates,
            documents,
            PreferencesStore::new(cfg.preferences_path()),
            Arc::new(LoggingMailer),
            cfg.assembler(),
        ))
    }

    pub fn assembler(&self) -> DocumentAssembler {
        self.assembler
    }

    // ========================================================================
    // TEMPLATES
    // ========================================================================

    pub fn templates(&self) -> Vec<DocumentTemplate> {
        self.templates.all()
    }

    pub fn templates_by_tag(&self, tag: &str) -> Vec<DocumentTemplate> {
        self.templates.by_tag(tag)
    }

    pub fn template(&self, id: &str) -> Option<DocumentTemplate> {
        self.templates.by_id(id)
    }

    /// Starts filling a template. `None` if the id is unknown, in which case
    /// the caller falls back to free text.
    pub fn open_session(&self, template_id: &str) -> Option<EditingSession> {
        self.templates
            .by_id(template_id)
            .map(|t| EditingSession::new(t, self.assembler))
    }

    /// Renders a template with `values` in one step.
    ///
    /// Returns `Ok(None)` for an unknown template.
    ///
    /// # Errors
    ///
    /// Returns `AskaraError::InvalidInput` if `values` or `active` name a field
    /// the template does not declare.
    pub fn render(
        &self,
        template_id: &str,
        values: &FieldValues,
        active: Option<&str>,
    ) -> AskaraResult<Option<RenderedTemplate>> {
        let Some(mut session) = self.open_session(template_id) else {
            return Ok(None);
        };
        session.apply(values)?;
        session.set_active(active)?;

        Ok(Some(RenderedTemplate {
            template_id: template_id.to_owned(),
            text: session.assembled_text()?,
            html: session.preview_html()?,
            missing_fields: session.missing_fields().into_iter().cloned().collect(),
        }))
    }

    /// Persists the assembled text of `session` as a new document.
    pub fn save_session(&self, session: &EditingSession, meta: SaveMeta) -> AskaraResult<Document> {
        let doc = self.documents.create(session.to_new_document(meta)?)?;
        tracing::info!(
            "saved document {} from template '{}'",
            doc.id,
            session.template().id
        );
        Ok(doc)
    }

    // ========================================================================
    // DOCUMENTS
    // ========================================================================

    pub fn create_document(&self, new: NewDocument) -> AskaraResult<Document> {
        self.documents.create(new)
    }

    pub fn update_document(&self, id: &RecordId, patch: DocumentUpdate) -> AskaraResult<Document> {
        self.documents.update(id, patch)
    }

    pub fn delete_document(&self, id: &RecordId) -> AskaraResult<bool> {
        self.documents.delete(id)
    }

    pub fn documents(&self) -> AskaraResult<Vec<Document>> {
        self.documents.all()
    }

    pub fn document(&self, id: &RecordId) -> AskaraResult<Option<Document>> {
        self.documents.by_id(id)
    }

    fn existing(&self, id: &RecordId) -> AskaraResult<Document> {
        self.documents
            .by_id(id)?
            .ok_or_else(|| AskaraError::DocumentNotFound(id.to_string()))
    }

    /// Renders a stored document to PDF with the current preferences.
    pub fn export_pdf(&self, id: &RecordId) -> AskaraResult<ExportedPdf> {
        let doc = self.existing(id)?;
        let bytes = self
            .exporter
            .export(&doc.title, &doc.content, &self.preferences.load())?;
        Ok(ExportedPdf {
            filename: pdf_filename(&doc.title),
            bytes,
        })
    }

    /// Sends a stored document's text by e-mail and marks it sent.
    ///
    /// The subject defaults to the document title. The message is sent before
    /// the status changes. If the status update then fails, the receipt is
    /// still returned with the document as it was, and the failure is logged.
    pub fn email_document(
        &self,
        id: &RecordId,
        to: EmailAddress,
        subject: Option<String>,
    ) -> AskaraResult<(Document, EmailReceipt)> {
        let doc = self.existing(id)?;
        let subject = subject
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| doc.title.clone());
        let receipt = self
            .mailer
            .send(&EmailMessage::new(to, subject, doc.content.clone())?)?;
        match self
            .documents
            .update(id, DocumentUpdate::status(DocumentStatus::Sent))
        {
            Ok(sent) => Ok((sent, receipt)),
            Err(e) => {
                tracing::error!(
                    "document {} was e-mailed (message {}) but could not be marked sent: {}",
                    id,
                    receipt.id,
                    e
                );
                Ok((doc, receipt))
            }
        }
    }

    // ========================================================================
    // PREFERENCES
    // ========================================================================

    pub fn preferences(&self) -> DocumentPreferences {
        self.preferences.load()
    }

    pub fn set_preferences(&self, prefs: &DocumentPreferences) -> AskaraResult<()> {
        self.preferences.save(prefs)
    }
}
