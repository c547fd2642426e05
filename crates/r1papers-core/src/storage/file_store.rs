use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{CoreError, Result};
use crate::storage::{DocumentStore, DocumentVersion, LoadedDocument};

/// Catalog document on the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileDocumentStore;

impl FileDocumentStore {
    pub fn new() -> Self {
        Self
    }

    fn temp_path(path: &Path) -> PathBuf {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "catalog".to_string());
        path.with_file_name(format!(".{name}.r1papers.tmp"))
    }
}

impl DocumentStore for FileDocumentStore {
    fn load(&self, path: &Path) -> Result<LoadedDocument> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(LoadedDocument::present(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Catalog document {} does not exist yet", path.display());
                Ok(LoadedDocument::absent())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn save(
        &self,
        path: &Path,
        content: &str,
        base_version: DocumentVersion,
    ) -> Result<DocumentVersion> {
        let current = self.load(path)?.version;
        if current != base_version {
            return Err(CoreError::PersistenceConflict {
                path: path.display().to_string(),
            });
        }

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let tmp = Self::temp_path(path);
        fs::write(&tmp, content)?;
        if let Err(e) = fs::rename(&tmp, path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }

        debug!("Wrote catalog document {} ({} bytes)", path.display(), content.len());
        Ok(DocumentVersion::of(content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_loads_as_absent() {
        let dir = TempDir::new().unwrap();
        let loaded = FileDocumentStore::new()
            .load(&dir.path().join("README.md"))
            .unwrap();
        assert!(!loaded.exists);
        assert_eq!(loaded.version, DocumentVersion::Absent);
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("docs").join("README.md");
        let store = FileDocumentStore::new();

        let version = store.save(&path, "# R1\n", DocumentVersion::Absent).unwrap();
        let loaded = store.load(&path).unwrap();
        assert!(loaded.exists);
        assert_eq!(loaded.content, "# R1\n");
        assert_eq!(loaded.version, version);
        assert!(!FileDocumentStore::temp_path(&path).exists());
    }

    #[test]
    fn concurrent_edit_is_a_conflict() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("README.md");
        fs::write(&path, "original\n").unwrap();

        let store = FileDocumentStore::new();
        let loaded = store.load(&path).unwrap();
        fs::write(&path, "edited elsewhere\n").unwrap();

        let err = store.save(&path, "ours\n", loaded.version).unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(fs::read_to_string(&path).unwrap(), "edited elsewhere\n");
    }
}
