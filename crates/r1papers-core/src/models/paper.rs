use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::identifiers::canonical_paper_id;

/// A paper discovered by the upstream search, not yet reconciled against the
/// catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidatePaper {
    pub id: String,
    pub title: String,
    #[serde(default, rename = "abstract")]
    pub abstract_text: String,
    #[serde(default)]
    pub categories: Vec<String>,
    pub published_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abs_url: Option<String>,
}

impl CandidatePaper {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        abstract_text: impl Into<String>,
        published_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            abstract_text: abstract_text.into(),
            categories: Vec::new(),
            published_at,
            authors: Vec::new(),
            abs_url: None,
        }
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for category in categories {
            let category = category.into();
            if !self.categories.contains(&category) {
                self.categories.push(category);
            }
        }
        self
    }

    /// Catalog key of this candidate (arXiv version suffix dropped).
    pub fn canonical_id(&self) -> String {
        canonical_paper_id(&self.id)
    }

    /// Publication day as written into the date column.
    pub fn publication_date(&self) -> NaiveDate {
        self.published_at.date_naive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn canonical_id_and_date() {
        let published = Utc.with_ymd_and_hms(2025, 1, 22, 23, 59, 0).unwrap();
        let paper = CandidatePaper::new("2501.12948v1", "DeepSeek-R1", "", published)
            .with_categories(["cs.CL", "cs.AI", "cs.CL"]);

        assert_eq!(paper.canonical_id(), "2501.12948");
        assert_eq!(paper.publication_date().to_string(), "2025-01-22");
        assert_eq!(paper.categories, vec!["cs.CL", "cs.AI"]);
    }

    #[test]
    fn deserializes_feed_json() {
        let json = r#"{
            "id": "X9",
            "title": "R1-Lite: A Small Model",
            "abstract": "code at https://github.com/acme/r1lite",
            "categories": ["cs.CL"],
            "published_at": "2025-03-01T10:00:00Z"
        }"#;
        let paper: CandidatePaper = serde_json::from_str(json).unwrap();
        assert_eq!(paper.abstract_text, "code at https://github.com/acme/r1lite");
        assert!(paper.authors.is_empty());
    }
}
