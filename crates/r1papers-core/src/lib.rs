pub mod catalog;
pub mod config;
pub mod error;
pub mod identifiers;
pub mod models;
pub mod normalize;
pub mod storage;

pub use config::AppConfig;
pub use error::{CoreError, ExitCode, Result};
pub use identifiers::{ArxivId, abs_url, canonical_paper_id, paper_id_from_url};
pub use models::*;
pub use normalize::normalize_title;
pub use storage::{
    DocumentStore, DocumentVersion, FileDocumentStore, LoadedDocument, MemoryDocumentStore,
};
