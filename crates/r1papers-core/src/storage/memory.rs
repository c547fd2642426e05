use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{CoreError, Result};
use crate::storage::{DocumentStore, DocumentVersion, LoadedDocument};

/// In-memory store, used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: Mutex<HashMap<PathBuf, String>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        let store = Self::new();
        store.put(path, content);
        store
    }

    /// Replaces a document without any version check.
    pub fn put(&self, path: impl Into<PathBuf>, content: impl Into<String>) {
        if let Ok(mut documents) = self.documents.lock() {
            documents.insert(path.into(), content.into());
        }
    }

    pub fn get(&self, path: &Path) -> Option<String> {
        self.documents
            .lock()
            .ok()
            .and_then(|documents| documents.get(path).cloned())
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn load(&self, path: &Path) -> Result<LoadedDocument> {
        Ok(match self.get(path) {
            Some(content) => LoadedDocument::present(content),
            None => LoadedDocument::absent(),
        })
    }

    fn save(
        &self,
        path: &Path,
        content: &str,
        base_version: DocumentVersion,
    ) -> Result<DocumentVersion> {
        let mut documents = self
            .documents
            .lock()
            .map_err(|_| CoreError::StoreUnavailable("lock poisoned".to_string()))?;

        let current = documents
            .get(path)
            .map(|existing| DocumentVersion::of(existing))
            .unwrap_or(DocumentVersion::Absent);
        if current != base_version {
            return Err(CoreError::PersistenceConflict {
                path: path.display().to_string(),
            });
        }

        documents.insert(path.to_path_buf(), content.to_string());
        Ok(DocumentVersion::of(content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_version_is_rejected() {
        let store = MemoryDocumentStore::with_document("README.md", "v1");
        let path = Path::new("README.md");
        let loaded = store.load(path).unwrap();

        let v2 = store.save(path, "v2", loaded.version).unwrap();
        assert!(store.save(path, "v3", loaded.version).unwrap_err().is_conflict());
        store.save(path, "v3", v2).unwrap();
        assert_eq!(store.get(path).as_deref(), Some("v3"));
    }
}
