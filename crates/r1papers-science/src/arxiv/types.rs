use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use r1papers_core::{ArxivId, CandidatePaper};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArxivEntry {
    pub arxiv_id: ArxivId,
    pub title: String,
    pub authors: Vec<ArxivAuthor>,
    pub abstract_text: String,
    pub published: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub categories: Vec<String>,
    pub primary_category: String,
    pub pdf_url: String,
    pub abs_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArxivAuthor {
    pub name: String,
    pub affiliation: Option<String>,
}

impl ArxivEntry {
    pub fn into_candidate(self) -> CandidatePaper {
        let mut categories = Vec::with_capacity(self.categories.len() + 1);
        if !self.primary_category.is_empty() {
            categories.push(self.primary_category);
        }
        categories.extend(self.categories);

        let mut candidate =
            CandidatePaper::new(self.arxiv_id.id, self.title, self.abstract_text, self.published)
                .with_categories(categories);
        candidate.authors = self.authors.into_iter().map(|a| a.name).collect();
        candidate.abs_url = Some(self.abs_url);
        candidate
    }
}

#[derive(Debug, Clone)]
pub struct ArxivSearchQuery {
    /// Raw arXiv search expression, e.g. `ti:"R1" AND (cat:cs.AI OR cat:cs.CL)`.
    pub search_query: String,
    pub start: u32,
    pub max_results: u32,
    pub sort_by: String,
    pub sort_order: String,
}

impl ArxivSearchQuery {
    pub fn new(search_query: impl Into<String>) -> Self {
        Self {
            search_query: search_query.into(),
            start: 0,
            max_results: 100,
            sort_by: "lastUpdatedDate".to_string(),
            sort_order: "descending".to_string(),
        }
    }

    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn to_query_string(&self) -> String {
        format!(
            "search_query={}&start={}&max_results={}&sortBy={}&sortOrder={}",
            urlencoding::encode(&self.search_query),
            self.start,
            self.max_results,
            urlencoding::encode(&self.sort_by),
            urlencoding::encode(&self.sort_order),
        )
    }
}

/// Title searches for the family token, each restricted to `categories`.
pub fn family_queries(token: &str, categories: &[String]) -> Vec<String> {
    let cats = categories
        .iter()
        .map(|c| format!("cat:{c}"))
        .collect::<Vec<_>>()
        .join(" OR ");
    let scope = if cats.is_empty() {
        String::new()
    } else {
        format!(" AND ({cats})")
    };

    vec![
        format!(r#"ti:"{token}"{scope}"#),
        format!(r#"(ti:"{token}-" OR ti:"-{token}"){scope}"#),
        format!(r#"all:"{token}" AND ti:(model OR method OR network OR approach){scope}"#),
    ]
}
