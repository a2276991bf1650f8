//! Document repositories.
//!
//! [`DocumentRepository`] is the storage contract for saved documents. Two
//! implementations are provided:
//!
//! - [`InMemoryDocumentRepository`] keeps documents in a map guarded by an `RwLock`.
//! - [`FileDocumentRepository`] writes one JSON file per document under a sharded
//!   directory layout:
//!
//! ```text
//! documents/
//!   <s1>/
//!     <s2>/
//!       <id>/
//!         document.json
//! ```
//!
//! Deletion is final in both: there is no soft delete and no undo.

use crate::constants::DOCUMENT_FILENAME;
use crate::document::{validate_new_document, Document, DocumentUpdate, NewDocument};
use crate::error::{AskaraError, AskaraResult};
use askara_uuid::RecordId;
use chrono::Utc;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Storage contract for saved documents.
pub trait DocumentRepository: Send + Sync {
    /// Stores a new document and returns it with its id and timestamps.
    fn create(&self, new: NewDocument) -> AskaraResult<Document>;

    /// Applies `patch` to an existing document.
    ///
    /// # Errors
    ///
    /// Returns `AskaraError::DocumentNotFound` if `id` is unknown.
    fn update(&self, id: &RecordId, patch: DocumentUpdate) -> AskaraResult<Document>;

    /// Removes a document. Returns `false` if it did not exist.
    fn delete(&self, id: &RecordId) -> AskaraResult<bool>;

    /// Every stored document, most recently updated first.
    fn all(&self) -> AskaraResult<Vec<Document>>;

    fn by_id(&self, id: &RecordId) -> AskaraResult<Option<Document>>;
}

fn newest_first(docs: &mut [Document]) {
    docs.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(a.id.cmp(&b.id)));
}

#[derive(Debug, Default)]
pub struct InMemoryDocumentRepository {
    documents: RwLock<BTreeMap<RecordId, Document>>,
}

impl InMemoryDocumentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentRepository for InMemoryDocumentRepository {
    fn create(&self, new: NewDocument) -> AskaraResult<Document> {
        validate_new_document(&new)?;
        let mut documents = self.documents.write().map_err(|_| AskaraError::LockPoisoned)?;

        let mut id = RecordId::new();
        while documents.contains_key(&id) {
            id = RecordId::new();
        }
        let doc = new.into_document(id, Utc::now());
        documents.insert(id, doc.clone());
        tracing::debug!("created document {}", id);
        Ok(doc)
    }

    fn update(&self, id: &RecordId, patch: DocumentUpdate) -> AskaraResult<Document> {
        let mut documents = self.documents.write().map_err(|_| AskaraError::LockPoisoned)?;
        let doc = documents
            .get_mut(id)
            .ok_or_else(|| AskaraError::DocumentNotFound(id.to_string()))?;
        patch.apply_to(doc, Utc::now());
        Ok(doc.clone())
    }

    fn delete(&self, id: &RecordId) -> AskaraResult<bool> {
        let mut documents = self.documents.write().map_err(|_| AskaraError::LockPoisoned)?;
        Ok(documents.remove(id).is_some())
    }

    fn all(&self) -> AskaraResult<Vec<Document>> {
        let documents = self.documents.read().map_err(|_| AskaraError::LockPoisoned)?;
        let mut docs: Vec<Document> = documents.values().cloned().collect();
        newest_first(&mut docs);
        Ok(docs)
    }

    fn by_id(&self, id: &RecordId) -> AskaraResult<Option<Document>> {
        let documents = self.documents.read().map_err(|_| AskaraError::LockPoisoned)?;
        Ok(documents.get(id).cloned())
    }
}

/// JSON-file storage under `<base_dir>/<s1>/<s2>/<id>/document.json`.
///
/// Writes are serialised through an internal lock so concurrent updates to the
/// same document cannot interleave a read-modify-write.
#[derive(Debug)]
pub struct FileDocumentRepository {
    base_dir: PathBuf,
    write_lock: RwLock<()>,
}

impl FileDocumentRepository {
    /// # Errors
    ///
    /// Returns `AskaraError::StorageDirCreation` if `base_dir` cannot be created.
    pub fn new(base_dir: impl Into<PathBuf>) -> AskaraResult<Self> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir).map_err(AskaraError::StorageDirCreation)?;
        Ok(Self {
            base_dir,
            write_lock: RwLock::new(()),
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn document_path(&self, id: &RecordId) -> PathBuf {
        id.sharded_dir(&self.base_dir).join(DOCUMENT_FILENAME)
    }

    fn read(&self, id: &RecordId) -> AskaraResult<Option<Document>> {
        let path = self.document_path(id);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AskaraError::FileRead(e)),
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(AskaraError::Deserialization)
    }

    fn write(&self, doc: &Document) -> AskaraResult<()> {
        let path = self.document_path(&doc.id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(AskaraError::StorageDirCreation)?;
        }
        let json = serde_json::to_string_pretty(doc).map_err(AskaraError::Serialization)?;
        // Write to a sibling file first so a crash never leaves a truncated document.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(AskaraError::FileWrite)?;
        fs::rename(&tmp, &path).map_err(AskaraError::FileWrite)
    }

    /// Walks the three shard levels and collects every `document.json` path.
    fn document_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        let Ok(s1_iter) = fs::read_dir(&self.base_dir) else {
            return files;
        };
        for s1 in s1_iter.flatten() {
            let Ok(s2_iter) = fs::read_dir(s1.path()) else {
                continue;
            };
            for s2 in s2_iter.flatten() {
                let Ok(id_iter) = fs::read_dir(s2.path()) else {
                    continue;
                };
                for id_ent in id_iter.flatten() {
                    let candidate = id_ent.path().join(DOCUMENT_FILENAME);
                    if candidate.is_file() {
                        files.push(candidate);
                    }
                }
            }
        }
        files
    }
}

impl DocumentRepository for FileDocumentRepository {
    fn create(&self, new: NewDocument) -> AskaraResult<Document> {
        validate_new_document(&new)?;
        let _guard = self.write_lock.write().map_err(|_| AskaraError::LockPoisoned)?;

        // Guard against pathological id collisions by limiting retries.
        let id = (0..5)
            .map(|_| RecordId::new())
            .find(|id| !self.document_path(id).exists())
            .ok_or_else(|| {
                AskaraError::StorageDirCreation(std::io::Error::new(
                    ErrorKind::AlreadyExists,
                    "failed to allocate a unique document id after 5 attempts",
                ))
            })?;

        let doc = new.into_document(id, Utc::now());
        self.write(&doc)?;
        tracing::debug!("created document {} in {}", id, self.base_dir.display());
        Ok(doc)
    }

    fn update(&self, id: &RecordId, patch: DocumentUpdate) -> AskaraResult<Document> {
        let _guard = self.write_lock.write().map_err(|_| AskaraError::LockPoisoned)?;
        let mut doc = self
            .read(id)?
            .ok_or_else(|| AskaraError::DocumentNotFound(id.to_string()))?;
        patch.apply_to(&mut doc, Utc::now());
        self.write(&doc)?;
        Ok(doc)
    }

    fn delete(&self, id: &RecordId) -> AskaraResult<bool> {
        let _guard = self.write_lock.write().map_err(|_| AskaraError::LockPoisoned)?;
        let dir = id.sharded_dir(&self.base_dir);
        match fs::remove_dir_all(&dir) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(AskaraError::FileDelete(e)),
        }
    }

    fn all(&self) -> AskaraResult<Vec<Document>> {
        let _guard = self.write_lock.read().map_err(|_| AskaraError::LockPoisoned)?;
        let mut docs = Vec::new();
        for path in self.document_files() {
            let parsed = fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|raw| serde_json::from_str::<Document>(&raw).map_err(|e| e.to_string()));
            match parsed {
                Ok(doc) => docs.push(doc),
                Err(e) => tracing::warn!("skipping unreadable document {}: {}", path.display(), e),
            }
        }
        newest_first(&mut docs);
        Ok(docs)
    }

    fn by_id(&self, id: &RecordId) -> AskaraResult<Option<Document>> {
        let _guard = self.write_lock.read().map_err(|_| AskaraError::LockPoisoned)?;
        self.read(id)
    }
}
