//! Reconciliation engine for the paper catalog: pattern rules, matching,
//! enrichment, the arXiv feed and change summaries.

pub mod arxiv;
pub mod dedup;
pub mod enrichment;
pub mod error;
pub mod http;
pub mod patterns;
pub mod reconcile;
pub mod report;
pub mod similarity;

pub use dedup::{CatalogIndex, MatchDecision, MatchReason, classify};
pub use enrichment::{EnrichedFields, Enricher, HttpLinkProbe, LinkCheck, LinkProbe, Reachability};
pub use error::{Result, ScienceError, ValidationRejection};
pub use patterns::PatternLibrary;
pub use reconcile::{ReconcileOutcome, Reconciler, UpdateReport, UpdateSettings, update_catalog};
pub use similarity::{TitleIndex, is_similar, similarity};
