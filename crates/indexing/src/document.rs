use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The view of a repository document that indexing needs.
pub trait Document {
    fn id(&self) -> Option<&str>;
    fn repository_name(&self) -> &str;
    fn path(&self) -> Option<&str>;
    fn is_folder(&self) -> bool;
    /// Every schema the document carries; a full reindex covers all of them.
    fn schemas(&self) -> Vec<String>;
}

/// Owned snapshot of a document, held as the target of a command.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DocumentRef {
    pub repository: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default)]
    pub folder: bool,
    #[serde(default)]
    pub schemas: Vec<String>,
}

impl DocumentRef {
    pub fn new(repository: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            id: id.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_folder(mut self, folder: bool) -> Self {
        self.folder = folder;
        self
    }

    #[must_use]
    pub fn with_schemas<I, S>(mut self, schemas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.schemas = schemas.into_iter().map(Into::into).collect();
        self
    }

    /// Snapshot any document. Fails when the document has no id yet.
    pub fn snapshot(doc: &(impl Document + ?Sized)) -> Result<Self> {
        let id = doc
            .id()
            .filter(|id| !id.is_empty())
            .ok_or(crate::IndexingError::MissingDocumentId)?;
        Ok(Self {
            repository: doc.repository_name().to_string(),
            id: id.to_string(),
            path: doc.path().map(str::to_string),
            folder: doc.is_folder(),
            schemas: doc.schemas(),
        })
    }
}

impl Document for DocumentRef {
    fn id(&self) -> Option<&str> {
        Some(self.id.as_str())
    }

    fn repository_name(&self) -> &str {
        &self.repository
    }

    fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    fn is_folder(&self) -> bool {
        self.folder
    }

    fn schemas(&self) -> Vec<String> {
        self.schemas.clone()
    }
}

/// Repository session used to re-resolve command targets.
pub trait DocumentSession {
    fn repository_name(&self) -> &str;

    /// `Ok(None)` when the document no longer exists.
    fn fetch(&self, id: &str) -> Result<Option<DocumentRef>>;
}

/// In-memory session keyed by document id.
#[derive(Debug, Clone, Default)]
pub struct MemorySession {
    repository: String,
    documents: HashMap<String, DocumentRef>,
}

impl MemorySession {
    pub fn new(repository: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            documents: HashMap::new(),
        }
    }

    pub fn insert(&mut self, doc: DocumentRef) -> Option<DocumentRef> {
        self.documents.insert(doc.id.clone(), doc)
    }

    pub fn remove(&mut self, id: &str) -> Option<DocumentRef> {
        self.documents.remove(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl DocumentSession for MemorySession {
    fn repository_name(&self) -> &str {
        &self.repository
    }

    fn fetch(&self, id: &str) -> Result<Option<DocumentRef>> {
        Ok(self.documents.get(id).cloned())
    }
}
