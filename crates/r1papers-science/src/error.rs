use r1papers_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScienceError {
    #[error("invalid arXiv ID: {0}")]
    InvalidArxivId(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error from {0}: {1}")]
    ApiError(String, String),

    #[error("rate limit from {0}, retry after {1}s")]
    RateLimit(String, u64),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("candidate rejected: {0}")]
    Validation(#[from] ValidationRejection),

    #[error("enrichment error: {0}")]
    Enrichment(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Why a candidate cannot become a catalog row.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationRejection {
    #[error("title is empty")]
    EmptyTitle,

    #[error("title is {len} characters long, limit is {max}")]
    TitleTooLong { len: usize, max: usize },

    #[error("paper id is empty")]
    MissingId,
}

impl ScienceError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Core(e) if e.is_conflict())
    }
}

pub type Result<T> = std::result::Result<T, ScienceError>;
