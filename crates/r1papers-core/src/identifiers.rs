use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

// New format: YYMM.NNNNN or YYMM.NNNNNN (with optional version)
static NEW_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4}\.\d{4,5})(v(\d+))?$").expect("valid regex"));

// Old format: category/YYMMNNN
static OLD_FORMAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([a-zA-Z\-]+(?:\.[A-Z]{2})?/\d{7})(v(\d+))?$").expect("valid regex")
});

// Any arxiv.org abs/pdf link; the capture is whatever follows the path prefix.
static ARXIV_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)https?://(?:www\.|export\.)?arxiv\.org/(?:abs|pdf)/([^\s)\]?#]+)")
        .expect("valid regex")
});

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArxivId {
    pub raw: String,
    pub id: String,
    pub version: Option<u8>,
    pub abs_url: String,
    pub pdf_url: String,
    pub category: Option<String>,
}

impl ArxivId {
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();

        let stripped = if let Some(s) = input.strip_prefix("https://arxiv.org/abs/") {
            s
        } else if let Some(s) = input.strip_prefix("http://arxiv.org/abs/") {
            s
        } else if let Some(s) = input.strip_prefix("https://arxiv.org/pdf/") {
            s.trim_end_matches(".pdf")
        } else if let Some(s) = input.strip_prefix("http://arxiv.org/pdf/") {
            s.trim_end_matches(".pdf")
        } else if let Some(s) = input.strip_prefix("arXiv:") {
            s
        } else if let Some(s) = input.strip_prefix("arxiv:") {
            s
        } else {
            input
        };

        if let Some(caps) = NEW_FORMAT.captures(stripped)
            && let Some(id) = caps.get(1)
        {
            let id = id.as_str().to_string();
            let version = caps.get(3).and_then(|v| v.as_str().parse::<u8>().ok());
            return Ok(Self {
                raw: input.to_string(),
                abs_url: abs_url(&id),
                pdf_url: format!("https://arxiv.org/pdf/{id}"),
                id,
                version,
                category: None,
            });
        }

        if let Some(caps) = OLD_FORMAT.captures(stripped)
            && let Some(full_id) = caps.get(1)
        {
            let id = full_id.as_str().to_string();
            let version = caps.get(3).and_then(|v| v.as_str().parse::<u8>().ok());
            let category = id.split('/').next().map(str::to_string);
            return Ok(Self {
                raw: input.to_string(),
                abs_url: abs_url(&id),
                pdf_url: format!("https://arxiv.org/pdf/{id}"),
                id,
                version,
                category,
            });
        }

        Err(CoreError::InvalidArxivId(input.to_string()))
    }
}

/// Stable catalog key for an external paper id.
///
/// arXiv ids lose their version suffix so `2501.12948v1` and `2501.12948v3`
/// collapse to the same key; anything else is kept as given (trimmed).
pub fn canonical_paper_id(raw: &str) -> String {
    match ArxivId::parse(raw) {
        Ok(parsed) => parsed.id,
        Err(_) => raw.trim().to_string(),
    }
}

/// Canonical abstract page for an id, as written into the paper cell.
pub fn abs_url(id: &str) -> String {
    format!("https://arxiv.org/abs/{id}")
}

/// Extracts the canonical paper id from an arxiv.org abs/pdf link.
///
/// Returns `None` for links that do not point at arxiv.org.
pub fn paper_id_from_url(url: &str) -> Option<String> {
    let caps = ARXIV_LINK.captures(url)?;
    let tail = caps.get(1)?.as_str();
    let tail = tail.strip_suffix(".pdf").unwrap_or(tail);
    let tail = tail.trim_end_matches('/');
    if tail.is_empty() {
        return None;
    }
    Some(canonical_paper_id(tail))
}
