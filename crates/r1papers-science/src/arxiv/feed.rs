//! Periodic search for new family papers.

use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, info, warn};

use r1papers_core::config::FeedConfig;
use r1papers_core::{CandidatePaper, normalize_title};

use crate::arxiv::client::ArxivClient;
use crate::arxiv::types::{ArxivSearchQuery, family_queries};
use crate::error::Result;
use crate::patterns::PatternLibrary;

const MAX_LOOKBACK_DAYS: i64 = 3_650;

pub struct ArxivFeed {
    client: ArxivClient,
    patterns: PatternLibrary,
    categories: Vec<String>,
    lookback: TimeDelta,
    max_results: u32,
}

impl ArxivFeed {
    pub fn new(config: &FeedConfig, patterns: PatternLibrary) -> Result<Self> {
        let client = ArxivClient::new(
            &config.base_url,
            Duration::from_millis(config.request_interval_ms),
            &config.user_agent,
        )?;
        Ok(Self {
            client,
            patterns,
            categories: config.categories.clone(),
            lookback: TimeDelta::days(config.lookback_days.clamp(0, MAX_LOOKBACK_DAYS)),
            max_results: config.max_results,
        })
    }

    pub fn queries(&self) -> Vec<ArxivSearchQuery> {
        family_queries(self.patterns.family_token(), &self.categories)
            .into_iter()
            .map(|q| ArxivSearchQuery::new(q).with_max_results(self.max_results))
            .collect()
    }

    /// Runs every query, keeps papers published since `now - lookback`, and
    /// returns valid family papers newest first.
    ///
    /// A failing query is logged and skipped; the call only fails when every
    /// query failed.
    pub async fn fetch_candidates(&self, now: DateTime<Utc>) -> Result<Vec<CandidatePaper>> {
        let since = now - self.lookback;
        let queries = self.queries();
        let total = queries.len();

        let mut found = Vec::new();
        let mut last_error = None;
        let mut succeeded = 0usize;
        for (idx, query) in queries.iter().enumerate() {
            match self.client.search(query).await {
                Ok(entries) => {
                    succeeded += 1;
                    let before = found.len();
                    found.extend(
                        entries
                            .into_iter()
                            .filter(|entry| entry.published >= since)
                            .map(|entry| entry.into_candidate()),
                    );
                    info!(
                        "Query {}/{} returned {} recent papers",
                        idx + 1,
                        total,
                        found.len() - before
                    );
                }
                Err(e) => {
                    warn!("Query {}/{} failed: {}", idx + 1, total, e);
                    last_error = Some(e);
                }
            }
        }

        if succeeded == 0
            && let Some(e) = last_error
        {
            return Err(e);
        }

        let candidates = select_candidates(found, &self.patterns, &self.categories);
        info!("Feed produced {} candidate papers", candidates.len());
        Ok(candidates)
    }
}

/// Drops repeats of an earlier candidate by id or normalized title.
pub fn dedup_batch(candidates: Vec<CandidatePaper>) -> Vec<CandidatePaper> {
    let mut seen_ids = HashSet::new();
    let mut seen_titles = HashSet::new();
    candidates
        .into_iter()
        .filter(|candidate| {
            let id = candidate.canonical_id();
            let title = normalize_title(&candidate.title);
            if seen_ids.contains(&id) || seen_titles.contains(&title) {
                return false;
            }
            seen_ids.insert(id);
            seen_titles.insert(title);
            true
        })
        .collect()
}

/// In-batch dedup, newest first, then the family validity filter.
pub fn select_candidates(
    candidates: Vec<CandidatePaper>,
    patterns: &PatternLibrary,
    categories: &[String],
) -> Vec<CandidatePaper> {
    let mut unique = dedup_batch(candidates);
    unique.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    unique
        .into_iter()
        .filter(|candidate| {
            let keep = patterns.is_family_paper(candidate, categories);
            if !keep {
                debug!("Rejected by family filter: {}", candidate.title);
            }
            keep
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mockito::{Matcher, Server};

    fn paper(id: &str, title: &str, day: u32) -> CandidatePaper {
        let published = Utc.with_ymd_and_hms(2025, 3, day, 12, 0, 0).unwrap();
        CandidatePaper::new(id, title, "a reasoning model", published).with_categories(["cs.CL"])
    }

    #[test]
    fn batch_dedup_by_id_and_title() {
        let batch = vec![
            paper("2503.00001v1", "Alpha-R1", 1),
            paper("2503.00001v2", "Alpha-R1 (revised)", 2),
            paper("2503.00002", "alpha-r1", 2),
            paper("2503.00003", "Beta-R1", 3),
        ];
        let ids: Vec<String> = dedup_batch(batch).iter().map(|c| c.id.clone()).collect();
        assert_eq!(ids, vec!["2503.00001v1", "2503.00003"]);
    }

    #[test]
    fn selection_sorts_and_filters() {
        let categories = vec!["cs.CL".to_string()];
        let batch = vec![
            paper("1", "Alpha-R1 Reasoning", 1),
            paper("2", "Unrelated Physics", 3),
            paper("3", "Beta-R1 Agents", 2),
        ];
        let selected = select_candidates(batch, &PatternLibrary::default(), &categories);
        let ids: Vec<&str> = selected.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "1"]);
    }

    fn feed_xml() -> String {
        r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:arxiv="http://arxiv.org/schemas/atom">
  <entry>
    <id>http://arxiv.org/abs/2503.10001v1</id>
    <published>2025-03-09T10:00:00Z</published>
    <title>Med-R1: Reinforcement Learning for Medical Reasoning</title>
    <summary>A vision-language model trained with RL.</summary>
    <arxiv:primary_category term="cs.CV"/>
    <category term="cs.CV"/>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2502.00001v1</id>
    <published>2025-02-01T10:00:00Z</published>
    <title>Old-R1: A Model From Last Month</title>
    <summary>Too old for the window.</summary>
    <category term="cs.CL"/>
  </entry>
</feed>"#
            .to_string()
    }

    #[tokio::test]
    async fn fetch_candidates_applies_window_and_filters() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/query")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(feed_xml())
            .expect_at_least(1)
            .create_async()
            .await;

        let config = FeedConfig {
            base_url: format!("{}/query", server.url()),
            categories: vec!["cs.CV".to_string(), "cs.CL".to_string()],
            request_interval_ms: 0,
            ..FeedConfig::default()
        };
        let feed = ArxivFeed::new(&config, PatternLibrary::default()).unwrap();
        assert_eq!(feed.queries().len(), 3);

        let now = Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap();
        let candidates = feed.fetch_candidates(now).await.unwrap();

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id, "2503.10001");
        assert_eq!(candidates[0].categories, vec!["cs.CV"]);
    }

    #[tokio::test]
    async fn all_queries_failing_is_an_error() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/query")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let config = FeedConfig {
            base_url: format!("{}/query", server.url()),
            request_interval_ms: 0,
            ..FeedConfig::default()
        };
        let feed = ArxivFeed::new(&config, PatternLibrary::default()).unwrap();
        assert!(feed.fetch_candidates(Utc::now()).await.is_err());
    }
}
