//! # API REST
//!
//! REST API implementation for Askara.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, status codes)
//!
//! Uses `api-shared` for request/response bodies and `askara-core` for all
//! document logic. [`router`] builds the full application so the binaries and
//! the tests serve exactly the same routes.

#![warn(rust_2018_idioms)]

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::{IntoParams, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use api_shared::dto;
use api_shared::HealthService;
use askara_core::config::{
    empty_value_policy_from_env_value, placeholder_syntax_from_env_value, resolve_template_dir,
};
use askara_core::constants::DEFAULT_DATA_DIR;
use askara_core::{
    AskaraError, CoreConfig, DocumentPreferences, DocumentService, DocumentUpdate, EmailAddress, NewDocument,
    PatientRef, RecordId, SaveMeta,
};

/// Application state for the REST API server
///
/// Contains shared state that needs to be accessible to all request handlers.
#[derive(Clone)]
pub struct AppState {
    service: Arc<DocumentService>,
}

impl AppState {
    pub fn new(service: Arc<DocumentService>) -> Self {
        Self { service }
    }
}

/// Error returned by handlers: a status code and a JSON body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<AskaraError> for ApiError {
    fn from(e: AskaraError) -> Self {
        let status = match &e {
            AskaraError::InvalidInput(_) | AskaraError::Text(_) | AskaraError::Uuid(_) => {
                StatusCode::BAD_REQUEST
            }
            AskaraError::DocumentNotFound(_) | AskaraError::TemplateNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            _ => {
                tracing::error!("Request failed: {:?}", e);
                return Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: "Internal error".into(),
                };
            }
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(dto::ErrorRes { error: self.message })).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Resolves [`CoreConfig`] from the process environment.
///
/// # Environment Variables
/// - `ASKARA_DATA_DIR`: data directory (default: `askara_data`)
/// - `ASKARA_TEMPLATE_DIR`: directory of YAML templates (default: built-in catalog)
/// - `ASKARA_PLACEHOLDER_SYNTAX`: `curly` or `square` (default: `curly`)
/// - `ASKARA_EMPTY_FIELDS`: `bracketed`, `blank` or `keep` (default: `bracketed`)
///
/// # Errors
///
/// Returns an error if a variable holds an unsupported value or the template
/// directory override is not a directory.
pub fn core_config_from_env() -> anyhow::Result<CoreConfig> {
    let data_dir = std::env::var("ASKARA_DATA_DIR")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_DATA_DIR.into());
    let template_dir =
        resolve_template_dir(std::env::var("ASKARA_TEMPLATE_DIR").ok().map(PathBuf::from))?;
    let syntax = placeholder_syntax_from_env_value(std::env::var("ASKARA_PLACEHOLDER_SYNTAX").ok())?;
    let policy = empty_value_policy_from_env_value(std::env::var("ASKARA_EMPTY_FIELDS").ok())?;

    Ok(CoreConfig::new(PathBuf::from(data_dir), template_dir, syntax, policy)?)
}

fn parse_id(id: &str) -> ApiResult<RecordId> {
    Ok(RecordId::parse(id).map_err(AskaraError::from)?)
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TemplateQuery {
    /// Only templates carrying this tag (case-insensitive).
    pub tag: Option<String>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        list_templates,
        get_template,
        render_template,
        list_documents,
        create_document,
        get_document,
        update_document,
        delete_document,
        export_document_pdf,
        email_document,
        get_preferences,
        put_preferences,
    ),
    components(schemas(
        dto::HealthRes,
        dto::ErrorRes,
        dto::FieldDef,
        dto::Template,
        dto::ListTemplatesRes,
        dto::RenderTemplateReq,
        dto::RenderTemplateRes,
        dto::Patient,
        dto::Document,
        dto::ListDocumentsRes,
        dto::CreateDocumentReq,
        dto::UpdateDocumentReq,
        dto::DeleteDocumentRes,
        dto::EmailDocumentReq,
        dto::EmailDocumentRes,
        dto::Margins,
        dto::Preferences,
    ))
)]
pub struct ApiDoc;

/// Builds the REST application with Swagger UI and permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/templates", get(list_templates))
        .route("/templates/:id", get(get_template))
        .route("/templates/:id/render", post(render_template))
        .route("/documents", get(list_documents).post(create_document))
        .route(
            "/documents/:id",
            get(get_document).put(update_document).delete(delete_document),
        )
        .route("/documents/:id/pdf", get(export_document_pdf))
        .route("/documents/:id/email", post(email_document))
        .route("/preferences", get(get_preferences).put(put_preferences))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = dto::HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<dto::HealthRes> {
    Json(HealthService::check_health())
}

// ============================================================================
// TEMPLATES
// ============================================================================

#[utoipa::path(
    get,
    path = "/templates",
    params(TemplateQuery),
    responses(
        (status = 200, description = "Template catalog", body = dto::ListTemplatesRes)
    )
)]
/// List the template catalog, optionally filtered by tag
#[axum::debug_handler]
async fn list_templates(
    State(state): State<AppState>,
    Query(query): Query<TemplateQuery>,
) -> Json<dto::ListTemplatesRes> {
    let templates = match query.tag.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        Some(tag) => state.service.templates_by_tag(tag),
        None => state.service.templates(),
    };
    Json(dto::ListTemplatesRes {
        templates: templates.into_iter().map(dto::Template::from).collect(),
    })
}

#[utoipa::path(
    get,
    path = "/templates/{id}",
    params(("id" = String, Path, description = "Template id")),
    responses(
        (status = 200, description = "Template", body = dto::Template),
        (status = 404, description = "Unknown template", body = dto::ErrorRes)
    )
)]
#[axum::debug_handler]
async fn get_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<dto::Template>> {
    let template = state
        .service
        .template(&id)
        .ok_or(AskaraError::TemplateNotFound(id))?;
    Ok(Json(template.into()))
}

#[utoipa::path(
    post,
    path = "/templates/{id}/render",
    params(("id" = String, Path, description = "Template id")),
    request_body = dto::RenderTemplateReq,
    responses(
        (status = 200, description = "Assembled text and highlighted preview", body = dto::RenderTemplateRes),
        (status = 400, description = "Unknown or invalid field", body = dto::ErrorRes),
        (status = 404, description = "Unknown template", body = dto::ErrorRes)
    )
)]
/// Fill a template with values and return the text and an HTML preview
///
/// Missing values never fail the request; they are reported in
/// `missing_fields` and rendered with the configured empty-value policy.
#[axum::debug_handler]
async fn render_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<dto::RenderTemplateReq>,
) -> ApiResult<Json<dto::RenderTemplateRes>> {
    let values = dto::field_values(req.values)?;
    let rendered = state
        .service
        .render(&id, &values, req.active.as_deref())?
        .ok_or(AskaraError::TemplateNotFound(id))?;
    Ok(Json(rendered.into()))
}

// ============================================================================
// DOCUMENTS
// ============================================================================

#[utoipa::path(
    get,
    path = "/documents",
    responses(
        (status = 200, description = "Saved documents, most recently updated first", body = dto::ListDocumentsRes),
        (status = 500, description = "Internal server error", body = dto::ErrorRes)
    )
)]
#[axum::debug_handler]
async fn list_documents(State(state): State<AppState>) -> ApiResult<Json<dto::ListDocumentsRes>> {
    let documents = state.service.documents()?;
    Ok(Json(dto::ListDocumentsRes {
        documents: documents.into_iter().map(dto::Document::from).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/documents",
    request_body = dto::CreateDocumentReq,
    responses(
        (status = 201, description = "Document created", body = dto::Document),
        (status = 400, description = "Bad request", body = dto::ErrorRes),
        (status = 500, description = "Internal server error", body = dto::ErrorRes)
    )
)]
/// Create a document from a template or from free text
///
/// With a known `template_id`, `values` are substituted into the template and
/// the assembled text is stored. Otherwise `content` is stored as given.
#[axum::debug_handler]
async fn create_document(
    State(state): State<AppState>,
    Json(req): Json<dto::CreateDocumentReq>,
) -> ApiResult<(StatusCode, Json<dto::Document>)> {
    let kind = dto::parse_kind(req.kind.as_deref())?;
    let status = dto::parse_status(req.status.as_deref())?.unwrap_or_default();
    let patient = req.patient.map(PatientRef::from);

    let session = req.template_id.as_deref().and_then(|id| {
        let session = state.service.open_session(id);
        if session.is_none() {
            tracing::warn!("Unknown template '{}', storing free text", id);
        }
        session
    });

    let new = match session {
        Some(mut session) => {
            session.apply(&dto::field_values(req.values)?)?;
            let mut new = session.to_new_document(SaveMeta {
                title: req.title,
                patient,
                created_by: req.created_by,
                status,
                tags: req.tags,
            })?;
            if let Some(kind) = kind {
                new.kind = kind;
            }
            new
        }
        None => NewDocument {
            title: req.title.unwrap_or_default(),
            kind: kind.unwrap_or_default(),
            status,
            content: req.content.ok_or_else(|| {
                AskaraError::InvalidInput("content is required without a known template".into())
            })?,
            patient,
            template_id: None,
            tags: req.tags,
            created_by: req.created_by,
        },
    };

    let doc = state.service.create_document(new)?;
    Ok((StatusCode::CREATED, Json(doc.into())))
}

#[utoipa::path(
    get,
    path = "/documents/{id}",
    params(("id" = String, Path, description = "Document id")),
    responses(
        (status = 200, description = "Document", body = dto::Document),
        (status = 400, description = "Invalid id", body = dto::ErrorRes),
        (status = 404, description = "Unknown document", body = dto::ErrorRes)
    )
)]
#[axum::debug_handler]
async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<dto::Document>> {
    let id = parse_id(&id)?;
    let doc = state
        .service
        .document(&id)?
        .ok_or_else(|| AskaraError::DocumentNotFound(id.to_string()))?;
    Ok(Json(doc.into()))
}

#[utoipa::path(
    put,
    path = "/documents/{id}",
    params(("id" = String, Path, description = "Document id")),
    request_body = dto::UpdateDocumentReq,
    responses(
        (status = 200, description = "Document updated", body = dto::Document),
        (status = 400, description = "Bad request", body = dto::ErrorRes),
        (status = 404, description = "Unknown document", body = dto::ErrorRes)
    )
)]
#[axum::debug_handler]
async fn update_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<dto::UpdateDocumentReq>,
) -> ApiResult<Json<dto::Document>> {
    let id = parse_id(&id)?;
    let patch = DocumentUpdate::try_from(req)?;
    let doc = state.service.update_document(&id, patch)?;
    Ok(Json(doc.into()))
}

#[utoipa::path(
    delete,
    path = "/documents/{id}",
    params(("id" = String, Path, description = "Document id")),
    responses(
        (status = 200, description = "Document deleted", body = dto::DeleteDocumentRes),
        (status = 404, description = "Unknown document", body = dto::ErrorRes)
    )
)]
/// Delete a document permanently
#[axum::debug_handler]
async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<dto::DeleteDocumentRes>> {
    let id = parse_id(&id)?;
    if !state.service.delete_document(&id)? {
        return Err(AskaraError::DocumentNotFound(id.to_string()).into());
    }
    Ok(Json(dto::DeleteDocumentRes { deleted: true }))
}

#[utoipa::path(
    get,
    path = "/documents/{id}/pdf",
    params(("id" = String, Path, description = "Document id")),
    responses(
        (status = 200, description = "A4 PDF", body = Vec<u8>, content_type = "application/pdf"),
        (status = 404, description = "Unknown document", body = dto::ErrorRes)
    )
)]
/// Export a document as an A4 PDF using the current preferences
#[axum::debug_handler]
async fn export_document_pdf(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    let pdf = state.service.export_pdf(&id)?;
    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (header::CONTENT_DISPOSITION, content_disposition(&pdf.filename)),
    ];
    Ok((headers, pdf.bytes).into_response())
}

/// `attachment` disposition with an ASCII fallback name and the UTF-8 name.
fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| if c.is_ascii_graphic() && c != '"' && c != '\\' { c } else { '_' })
        .collect();
    let mut encoded = String::new();
    for b in filename.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-' | b'_') {
            encoded.push(b as char);
        } else {
            encoded.push_str(&format!("%{b:02X}"));
        }
    }
    format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
}

#[utoipa::path(
    post,
    path = "/documents/{id}/email",
    params(("id" = String, Path, description = "Document id")),
    request_body = dto::EmailDocumentReq,
    responses(
        (status = 200, description = "E-mail queued and document marked sent", body = dto::EmailDocumentRes),
        (status = 400, description = "Invalid address", body = dto::ErrorRes),
        (status = 404, description = "Unknown document", body = dto::ErrorRes)
    )
)]
#[axum::debug_handler]
async fn email_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<dto::EmailDocumentReq>,
) -> ApiResult<Json<dto::EmailDocumentRes>> {
    let id = parse_id(&id)?;
    let to = EmailAddress::parse(&req.to).map_err(AskaraError::from)?;
    let (doc, receipt) = state.service.email_document(&id, to, req.subject)?;
    Ok(Json(dto::EmailDocumentRes {
        message_id: receipt.id,
        queued_at: receipt.queued_at.to_rfc3339(),
        document: doc.into(),
    }))
}

// ============================================================================
// PREFERENCES
// ============================================================================

#[utoipa::path(
    get,
    path = "/preferences",
    responses(
        (status = 200, description = "Current document preferences", body = dto::Preferences)
    )
)]
#[axum::debug_handler]
async fn get_preferences(State(state): State<AppState>) -> Json<dto::Preferences> {
    Json(state.service.preferences().into())
}

#[utoipa::path(
    put,
    path = "/preferences",
    request_body = dto::Preferences,
    responses(
        (status = 200, description = "Preferences saved", body = dto::Preferences),
        (status = 400, description = "Invalid values", body = dto::ErrorRes)
    )
)]
/// Replace the stored preferences as a whole
#[axum::debug_handler]
async fn put_preferences(
    State(state): State<AppState>,
    Json(req): Json<dto::Preferences>,
) -> ApiResult<Json<dto::Preferences>> {
    let prefs = DocumentPreferences::from(req);
    state.service.set_preferences(&prefs)?;
    Ok(Json(prefs.into()))
}
