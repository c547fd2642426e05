//! Where the catalog document lives.
//!
//! Stores hand out a [`DocumentVersion`] on load and refuse to save over a
//! document that changed since.

mod file_store;
mod memory;

pub use file_store::FileDocumentStore;
pub use memory::MemoryDocumentStore;

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentVersion {
    /// The document did not exist.
    Absent,
    /// Hash of the document content.
    Content(u64),
}

impl DocumentVersion {
    pub fn of(content: &str) -> Self {
        let mut hasher = DefaultHasher::new();
        content.hash(&mut hasher);
        Self::Content(hasher.finish())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedDocument {
    /// Empty when the document does not exist.
    pub content: String,
    pub exists: bool,
    pub version: DocumentVersion,
}

impl LoadedDocument {
    pub fn absent() -> Self {
        Self {
            content: String::new(),
            exists: false,
            version: DocumentVersion::Absent,
        }
    }

    pub fn present(content: String) -> Self {
        let version = DocumentVersion::of(&content);
        Self {
            content,
            exists: true,
            version,
        }
    }
}

pub trait DocumentStore: Send + Sync {
    fn load(&self, path: &Path) -> Result<LoadedDocument>;

    /// Writes `content` if the stored document is still at `base_version`,
    /// otherwise fails with [`CoreError::PersistenceConflict`].
    ///
    /// [`CoreError::PersistenceConflict`]: crate::error::CoreError::PersistenceConflict
    fn save(&self, path: &Path, content: &str, base_version: DocumentVersion)
    -> Result<DocumentVersion>;
}
