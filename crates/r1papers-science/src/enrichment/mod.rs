//! Fills the optional catalog fields from a candidate's title and abstract.

pub mod probe;
pub mod validate;

pub use probe::{HttpLinkProbe, LinkProbe, Reachability};
pub use validate::{DEFAULT_MAX_TITLE_LEN, validate};

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::time::{Instant, timeout};
use tracing::{debug, info, warn};

use r1papers_core::{CandidatePaper, CatalogEntry};

use crate::patterns::PatternLibrary;

pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(5_000);

/// Outcome of checking the extracted code link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LinkCheck {
    /// No code link was extracted.
    NoLink,
    /// Verification disabled or no probe configured.
    Skipped,
    Verified,
    /// The probe said the link is gone; it was cleared.
    Removed { url: String },
    /// The probe could not decide; the link was kept.
    Inconclusive { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrichedFields {
    pub code_url: Option<String>,
    pub project_url: Option<String>,
    pub models: Vec<String>,
    pub dataset: Vec<String>,
    pub link_check: LinkCheck,
}

impl EnrichedFields {
    /// Catalog entry for the candidate carrying these fields.
    pub fn into_entry(self, candidate: &CandidatePaper) -> CatalogEntry {
        let mut entry = CatalogEntry::from_candidate(candidate)
            .with_models(self.models)
            .with_dataset(self.dataset);
        entry.code_url = self.code_url;
        entry.project_url = self.project_url;
        entry
    }
}

pub struct Enricher {
    patterns: PatternLibrary,
    probe: Option<Arc<dyn LinkProbe>>,
    probe_timeout: Duration,
}

impl Enricher {
    pub fn new(patterns: PatternLibrary) -> Self {
        Self {
            patterns,
            probe: None,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    pub fn with_probe(mut self, probe: Arc<dyn LinkProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn with_probe_timeout(mut self, probe_timeout: Duration) -> Self {
        self.probe_timeout = probe_timeout;
        self
    }

    pub fn patterns(&self) -> &PatternLibrary {
        &self.patterns
    }

    /// Pattern extraction only, no network.
    pub fn extract(&self, candidate: &CandidatePaper) -> EnrichedFields {
        let text = format!("{} {}", candidate.title, candidate.abstract_text);

        let code_url = self.patterns.code_link(&text).map(|(host, url)| {
            debug!("Found {} link for '{}': {}", host, candidate.title, url);
            url
        });
        let project_url = self.patterns.project_link(&text);
        let models = self
            .patterns
            .models(&candidate.title, &candidate.abstract_text);
        let dataset = self.patterns.datasets(&text);

        EnrichedFields {
            link_check: if code_url.is_some() {
                LinkCheck::Skipped
            } else {
                LinkCheck::NoLink
            },
            code_url,
            project_url,
            models,
            dataset,
        }
    }

    pub async fn enrich(&self, candidate: &CandidatePaper) -> EnrichedFields {
        self.enrich_until(candidate, None).await
    }

    /// Extracts fields, then probes the code link. The probe is bounded by
    /// the probe timeout and by `deadline`, whichever comes first.
    pub async fn enrich_until(
        &self,
        candidate: &CandidatePaper,
        deadline: Option<Instant>,
    ) -> EnrichedFields {
        let mut fields = self.extract(candidate);
        let (Some(url), Some(probe)) = (fields.code_url.clone(), self.probe.as_ref()) else {
            return fields;
        };

        let mut budget = self.probe_timeout;
        if let Some(deadline) = deadline {
            budget = budget.min(deadline.saturating_duration_since(Instant::now()));
        }

        fields.link_check = match timeout(budget, probe.probe(&url)).await {
            Ok(Ok(Reachability::NotFound)) => {
                info!("Code link not found, dropping it: {}", url);
                fields.code_url = None;
                LinkCheck::Removed { url }
            }
            Ok(Ok(Reachability::Reachable)) => LinkCheck::Verified,
            Ok(Ok(Reachability::Unknown)) => LinkCheck::Inconclusive {
                reason: "server error".to_string(),
            },
            Ok(Err(e)) => {
                warn!("Cannot verify code link {}: {}", url, e);
                LinkCheck::Inconclusive {
                    reason: e.to_string(),
                }
            }
            Err(_) => {
                warn!("Code link check timed out after {:?}: {}", budget, url);
                LinkCheck::Inconclusive {
                    reason: format!("timed out after {} ms", budget.as_millis()),
                }
            }
        };
        fields
    }
}
