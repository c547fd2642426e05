use std::collections::HashSet;

use serde::Serialize;
use tracing::debug;

use r1papers_core::{Catalog, CandidatePaper, CatalogEntry, normalize_title};

use crate::similarity::TitleIndex;

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchReason {
    Id,
    NormalizedTitle,
    SimilarTitle { ratio: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum MatchDecision {
    Duplicate {
        /// Id of the catalog entry the candidate matched.
        existing_id: String,
        reason: MatchReason,
    },
    Accepted,
}

impl MatchDecision {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }
}

/// Ids and normalized titles of every matchable catalog entry.
#[derive(Debug, Clone)]
pub struct CatalogIndex {
    ids: HashSet<String>,
    titles: TitleIndex,
    threshold: f64,
}

impl Default for CatalogIndex {
    fn default() -> Self {
        Self {
            ids: HashSet::new(),
            titles: TitleIndex::new(),
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

impl CatalogIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_catalog(catalog: &Catalog) -> Self {
        let mut index = Self::new();
        for entry in catalog.matchable_entries() {
            index.insert(entry);
        }
        debug!("Indexed {} catalog entries for matching", index.len());
        index
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    /// Adds an entry; entries without an id are ignored.
    pub fn insert(&mut self, entry: &CatalogEntry) {
        let Some(id) = entry.id.as_deref() else {
            return;
        };
        self.ids.insert(id.to_string());
        self.titles.insert(id, entry.normalized_title());
    }

    /// First rule that fires wins: id, exact normalized title, then similar
    /// title.
    pub fn classify(&self, candidate: &CandidatePaper) -> MatchDecision {
        let id = candidate.canonical_id();
        if self.ids.contains(&id) {
            return MatchDecision::Duplicate {
                existing_id: id,
                reason: MatchReason::Id,
            };
        }

        let normalized = normalize_title(&candidate.title);
        if let Some(hit) = self.titles.find_exact(&normalized) {
            return MatchDecision::Duplicate {
                existing_id: hit.id.clone(),
                reason: MatchReason::NormalizedTitle,
            };
        }

        if let Some((hit, ratio)) = self.titles.find_similar(&normalized, self.threshold) {
            return MatchDecision::Duplicate {
                existing_id: hit.id.clone(),
                reason: MatchReason::SimilarTitle { ratio },
            };
        }

        MatchDecision::Accepted
    }
}

pub fn classify(candidate: &CandidatePaper, index: &CatalogIndex) -> MatchDecision {
    index.classify(candidate)
}
