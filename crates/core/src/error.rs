#[derive(Debug, thiserror::Error)]
pub enum AskaraError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("document not found: {0}")]
    DocumentNotFound(String),
    #[error("template not found: {0}")]
    TemplateNotFound(String),
    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to write file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to delete file: {0}")]
    FileDelete(std::io::Error),
    #[error("failed to serialize JSON: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize JSON: {0}")]
    Deserialization(serde_json::Error),
    #[error("failed to deserialize YAML template {path}: {source}", path = path.display())]
    TemplateParse {
        path: std::path::PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("failed to build placeholder pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("failed to build PDF: {0}")]
    Pdf(String),
    #[error("e-mail delivery failed: {0}")]
    Email(String),
    #[error("repository lock poisoned")]
    LockPoisoned,

    #[error(transparent)]
    Text(#[from] askara_types::TextError),
    #[error(transparent)]
    Uuid(#[from] askara_uuid::UuidError),
}

pub type AskaraResult<T> = std::result::Result<T, AskaraError>;
