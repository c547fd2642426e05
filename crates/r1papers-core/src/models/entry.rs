use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::identifiers::abs_url;
use crate::models::paper::CandidatePaper;
use crate::normalize::normalize_title;

pub const MAX_MODELS: usize = 3;
pub const MAX_DATASETS: usize = 2;

/// One paper as it lives in the catalog table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Canonical external id; `None` when the paper cell links somewhere
    /// other than arXiv. Such entries never take part in matching.
    pub id: Option<String>,
    pub title: String,
    pub paper_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_url: Option<String>,
    #[serde(default)]
    pub models: Vec<String>,
    #[serde(default)]
    pub dataset: Vec<String>,
    pub date: NaiveDate,
}

impl CatalogEntry {
    /// Builds the entry for an accepted candidate. Optional fields start
    /// empty; the enricher fills them.
    ///
    /// The title links to the candidate's own page when it has one, else to
    /// the arXiv abstract for its id.
    pub fn from_candidate(candidate: &CandidatePaper) -> Self {
        let id = candidate.canonical_id();
        let paper_url = candidate
            .abs_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| abs_url(&id));
        Self {
            paper_url,
            id: Some(id),
            title: candidate.title.trim().to_string(),
            code_url: None,
            project_url: None,
            models: Vec::new(),
            dataset: Vec::new(),
            date: candidate.publication_date(),
        }
    }

    pub fn normalized_title(&self) -> String {
        normalize_title(&self.title)
    }

    /// Whether this entry can take part in duplicate matching.
    pub fn is_matchable(&self) -> bool {
        self.id.is_some()
    }

    pub fn with_models(mut self, models: Vec<String>) -> Self {
        self.models = models;
        self.models.truncate(MAX_MODELS);
        self
    }

    pub fn with_dataset(mut self, dataset: Vec<String>) -> Self {
        self.dataset = dataset;
        self.dataset.truncate(MAX_DATASETS);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn from_candidate_uses_canonical_id_and_day() {
        let published = Utc.with_ymd_and_hms(2025, 2, 3, 4, 5, 6).unwrap();
        let candidate = CandidatePaper::new("2502.00001v2", "  Some R1 Paper ", "", published);
        let entry = CatalogEntry::from_candidate(&candidate);

        assert_eq!(entry.id.as_deref(), Some("2502.00001"));
        assert_eq!(entry.paper_url, "https://arxiv.org/abs/2502.00001");
        assert_eq!(entry.title, "Some R1 Paper");
        assert_eq!(entry.date.to_string(), "2025-02-03");
        assert_eq!(entry.normalized_title(), "some r1 paper");
    }

    #[test]
    fn from_candidate_prefers_the_candidate_link() {
        let published = Utc.with_ymd_and_hms(2025, 2, 3, 0, 0, 0).unwrap();
        let mut candidate = CandidatePaper::new("openreview-abc", "Some R1 Paper", "", published);
        candidate.abs_url = Some("https://openreview.net/forum?id=abc".to_string());
        let entry = CatalogEntry::from_candidate(&candidate);
        assert_eq!(entry.paper_url, "https://openreview.net/forum?id=abc");

        candidate.abs_url = Some("  ".to_string());
        let entry = CatalogEntry::from_candidate(&candidate);
        assert_eq!(entry.paper_url, "https://arxiv.org/abs/openreview-abc");
    }

    #[test]
    fn list_fields_are_capped() {
        let published = Utc.with_ymd_and_hms(2025, 2, 3, 0, 0, 0).unwrap();
        let entry = CatalogEntry::from_candidate(&CandidatePaper::new("1", "t", "", published))
            .with_models(vec!["A".into(), "B".into(), "C".into(), "D".into()])
            .with_dataset(vec!["X".into(), "Y".into(), "Z".into()]);
        assert_eq!(entry.models.len(), MAX_MODELS);
        assert_eq!(entry.dataset.len(), MAX_DATASETS);
    }
}
