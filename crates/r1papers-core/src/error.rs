use thiserror::Error;

/// All errors that can occur in r1papers-core.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid arXiv ID: {0}")]
    InvalidArxivId(String),

    #[error("Catalog document changed since it was loaded: {path}")]
    PersistenceConflict { path: String },

    #[error("Document store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl CoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::PersistenceConflict { .. })
    }
}

/// Exit codes used by the CLI.
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    NotFound = 2,
    InvalidArgs = 3,
    FileSystemError = 4,
    NetworkError = 6,
    Conflict = 7,
}

pub type Result<T> = std::result::Result<T, CoreError>;
