//! One reconciliation run: candidates in, accepted catalog entries out.

use std::path::Path;

use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use r1papers_core::catalog::{CatalogParser, bootstrap_document, merge, serialize};
use r1papers_core::{
    AppConfig, CandidatePaper, Catalog, CatalogEntry, DocumentStore, DocumentVersion,
};

use crate::dedup::{CatalogIndex, MatchDecision, MatchReason};
use crate::enrichment::{DEFAULT_MAX_TITLE_LEN, Enricher, LinkCheck, validate};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateHit {
    pub id: String,
    pub title: String,
    pub existing_id: String,
    pub reason: MatchReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub id: String,
    pub title: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcceptedPaper {
    pub entry: CatalogEntry,
    pub link_check: LinkCheck,
    /// Feed categories of the candidate; not stored in the catalog.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconcileOutcome {
    pub accepted: Vec<AcceptedPaper>,
    pub duplicates: Vec<DuplicateHit>,
    pub rejected: Vec<Rejection>,
    /// Candidates never looked at because the deadline passed.
    pub skipped: usize,
    pub deadline_hit: bool,
}

impl ReconcileOutcome {
    pub fn entries(&self) -> Vec<CatalogEntry> {
        self.accepted.iter().map(|a| a.entry.clone()).collect()
    }
}

pub struct Reconciler {
    index: CatalogIndex,
    enricher: Enricher,
    max_title_len: usize,
}

impl Reconciler {
    pub fn new(catalog: &Catalog, enricher: Enricher) -> Self {
        Self {
            index: CatalogIndex::from_catalog(catalog),
            enricher,
            max_title_len: DEFAULT_MAX_TITLE_LEN,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.index = self.index.with_threshold(threshold);
        self
    }

    pub fn with_max_title_len(mut self, max_title_len: usize) -> Self {
        self.max_title_len = max_title_len;
        self
    }

    /// Processes candidates strictly in order. When `deadline` passes, the
    /// remaining candidates are skipped and everything accepted so far is
    /// returned.
    pub async fn run(
        &mut self,
        candidates: &[CandidatePaper],
        deadline: Option<Instant>,
    ) -> ReconcileOutcome {
        let mut outcome = ReconcileOutcome::default();

        for (idx, candidate) in candidates.iter().enumerate() {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                outcome.deadline_hit = true;
                outcome.skipped = candidates.len() - idx;
                warn!(
                    "Deadline reached, skipping {} remaining candidates",
                    outcome.skipped
                );
                break;
            }

            let id = candidate.canonical_id();
            if let MatchDecision::Duplicate {
                existing_id,
                reason,
            } = self.index.classify(candidate)
            {
                debug!("Duplicate of {} ({:?}): {}", existing_id, reason, candidate.title);
                outcome.duplicates.push(DuplicateHit {
                    id,
                    title: candidate.title.clone(),
                    existing_id,
                    reason,
                });
                continue;
            }

            let fields = self.enricher.enrich_until(candidate, deadline).await;
            let link_check = fields.link_check.clone();
            let mut entry = fields.into_entry(candidate);

            match validate(&mut entry, self.max_title_len) {
                Ok(()) => {
                    info!("Accepted {}: {}", id, entry.title);
                    self.index.insert(&entry);
                    outcome.accepted.push(AcceptedPaper {
                        entry,
                        link_check,
                        categories: candidate.categories.clone(),
                    });
                }
                Err(rejection) => {
                    warn!("Rejected {}: {}", id, rejection);
                    outcome.rejected.push(Rejection {
                        id,
                        title: candidate.title.clone(),
                        reason: rejection.to_string(),
                    });
                }
            }
        }

        outcome
    }
}

/// Catalog document settings for a run.
#[derive(Debug, Clone)]
pub struct UpdateSettings {
    pub heading: String,
    pub family_token: String,
    pub similarity_threshold: f64,
    pub max_title_len: usize,
    pub dry_run: bool,
}

impl UpdateSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            heading: config.catalog.section_heading.clone(),
            family_token: config.catalog.family_token.clone(),
            similarity_threshold: config.matching.similarity_threshold,
            max_title_len: config.enrichment.max_title_len,
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateReport {
    pub outcome: ReconcileOutcome,
    /// The merged document; `None` when nothing was accepted.
    #[serde(skip)]
    pub document: Option<String>,
    pub written: bool,
}

impl UpdateReport {
    pub fn added(&self) -> usize {
        self.outcome.accepted.len()
    }
}

/// Load, reconcile, merge and save the catalog document.
///
/// Nothing is written when no candidate is accepted or on a dry run. A save
/// against a document that changed since it was loaded fails with a
/// persistence conflict and leaves the stored document alone.
pub async fn update_catalog(
    store: &dyn DocumentStore,
    path: &Path,
    settings: &UpdateSettings,
    enricher: Enricher,
    candidates: &[CandidatePaper],
    deadline: Option<Instant>,
) -> Result<UpdateReport> {
    let loaded = store.load(path)?;
    let content = if loaded.exists {
        loaded.content
    } else {
        info!("{} does not exist, starting a new catalog", path.display());
        bootstrap_document(&settings.heading, &settings.family_token)
    };

    let catalog = CatalogParser::new(&settings.heading).parse(&content);
    info!(
        "Loaded catalog with {} entries ({} unreadable rows)",
        catalog.entry_count(),
        catalog.issues().filter(|(_, issue)| issue.is_structural()).count()
    );

    let mut reconciler = Reconciler::new(&catalog, enricher)
        .with_threshold(settings.similarity_threshold)
        .with_max_title_len(settings.max_title_len);
    let outcome = reconciler.run(candidates, deadline).await;

    if outcome.accepted.is_empty() {
        info!("No new papers to add");
        return Ok(UpdateReport {
            outcome,
            document: None,
            written: false,
        });
    }

    let document = serialize(&merge(catalog, outcome.entries()));
    let written = if settings.dry_run {
        false
    } else {
        save(store, path, &document, loaded.version)?;
        true
    };

    Ok(UpdateReport {
        outcome,
        document: Some(document),
        written,
    })
}

fn save(
    store: &dyn DocumentStore,
    path: &Path,
    document: &str,
    base: DocumentVersion,
) -> Result<DocumentVersion> {
    let version = store.save(path, document, base)?;
    info!("Saved {}", path.display());
    Ok(version)
}
