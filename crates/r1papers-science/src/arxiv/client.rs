use std::time::Duration;

use tracing::debug;

use crate::arxiv::parser::parse_atom_response;
use crate::arxiv::types::{ArxivEntry, ArxivSearchQuery};
use crate::error::Result;
use crate::http::RateLimitedClient;

pub struct ArxivClient {
    client: RateLimitedClient,
    base_url: String,
}

impl ArxivClient {
    pub fn new(base_url: &str, min_interval: Duration, user_agent: &str) -> Result<Self> {
        Ok(Self {
            client: RateLimitedClient::new(min_interval, 3, user_agent)?,
            base_url: base_url.to_string(),
        })
    }

    pub async fn search(&self, query: &ArxivSearchQuery) -> Result<Vec<ArxivEntry>> {
        let separator = if self.base_url.contains('?') { '&' } else { '?' };
        let url = format!("{}{}{}", self.base_url, separator, query.to_query_string());

        let xml = self.client.get(&url).await?;
        let results = parse_atom_response(&xml)?;
        debug!("arXiv query '{}' returned {} entries", query.search_query, results.len());
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn search_sends_encoded_query() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/query")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("search_query".into(), r#"ti:"R1""#.into()),
                Matcher::UrlEncoded("sortBy".into(), "lastUpdatedDate".into()),
                Matcher::UrlEncoded("max_results".into(), "10".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/atom+xml")
            .with_body(
                r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <entry>
    <id>http://arxiv.org/abs/2501.12948v1</id>
    <updated>2025-01-22T18:00:00Z</updated>
    <published>2025-01-22T18:00:00Z</published>
    <title>DeepSeek-R1: Incentivizing Reasoning Capability in LLMs via Reinforcement Learning</title>
    <summary>We introduce our first-generation reasoning models.</summary>
    <author><name>DeepSeek-AI</name></author>
    <category term="cs.CL"/>
  </entry>
</feed>"#,
            )
            .create_async()
            .await;

        let client = ArxivClient::new(
            &format!("{}/query", server.url()),
            Duration::ZERO,
            "r1papers-test",
        )
        .unwrap();
        let query = ArxivSearchQuery::new(r#"ti:"R1""#).with_max_results(10);
        let results = client.search(&query).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].arxiv_id.id, "2501.12948");
        assert_eq!(results[0].primary_category, "cs.CL");
    }
}
