use chrono::{DateTime, Utc};
use quick_xml::de::from_str;
use serde::Deserialize;
use tracing::warn;

use r1papers_core::ArxivId;

use crate::arxiv::types::{ArxivAuthor, ArxivEntry};
use crate::error::{Result, ScienceError};

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    id: String,
    title: String,
    #[serde(default)]
    summary: String,
    published: String,
    updated: Option<String>,
    #[serde(rename = "author", default)]
    authors: Vec<AtomAuthor>,
    #[serde(rename = "category", default)]
    categories: Vec<AtomCategory>,
    #[serde(rename = "arxiv:primary_category", alias = "primary_category")]
    primary_category: Option<AtomCategory>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
}

#[derive(Debug, Deserialize)]
struct AtomAuthor {
    name: String,
    #[serde(rename = "arxiv:affiliation", alias = "affiliation")]
    affiliation: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomCategory {
    #[serde(rename = "@term")]
    term: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@type")]
    link_type: Option<String>,
}

/// Parses an Atom feed. Entries that cannot be read are skipped with a
/// warning; a feed that is not Atom at all is an error.
pub fn parse_atom_response(xml: &str) -> Result<Vec<ArxivEntry>> {
    let feed: AtomFeed =
        from_str(xml).map_err(|e| ScienceError::Parse(format!("invalid atom xml: {e}")))?;

    let mut entries = Vec::with_capacity(feed.entries.len());
    for entry in feed.entries {
        let raw_id = entry.id.clone();
        match parse_entry(entry) {
            Ok(parsed) => entries.push(parsed),
            Err(e) => warn!("Skipping feed entry {}: {}", raw_id.trim(), e),
        }
    }
    Ok(entries)
}

fn parse_entry(entry: AtomEntry) -> Result<ArxivEntry> {
    let arxiv_id = ArxivId::parse(entry.id.trim())
        .map_err(|_| ScienceError::InvalidArxivId(entry.id.trim().to_string()))?;

    let title = clean_text(&entry.title);
    if title.is_empty() {
        return Err(ScienceError::Parse("entry has no title".to_string()));
    }
    let abstract_text = clean_text(&entry.summary);

    let published = parse_rfc3339(&entry.published, "published")?;
    let updated = match entry.updated.as_deref() {
        Some(value) => parse_rfc3339(value, "updated")?,
        None => published,
    };

    let authors = entry
        .authors
        .into_iter()
        .map(|author| ArxivAuthor {
            name: clean_text(&author.name),
            affiliation: clean_optional(author.affiliation),
        })
        .collect::<Vec<_>>();

    let categories = entry
        .categories
        .into_iter()
        .filter_map(|category| clean_optional(category.term))
        .collect::<Vec<_>>();

    let primary_category = entry
        .primary_category
        .and_then(|category| clean_optional(category.term))
        .or_else(|| categories.first().cloned())
        .unwrap_or_default();

    let pdf_url = entry
        .links
        .iter()
        .find(|link| link.link_type.as_deref() == Some("application/pdf"))
        .and_then(|link| link.href.as_ref())
        .map(|url| normalize_arxiv_url(url))
        .unwrap_or_else(|| arxiv_id.pdf_url.clone());

    Ok(ArxivEntry {
        abs_url: arxiv_id.abs_url.clone(),
        arxiv_id,
        title,
        authors,
        abstract_text,
        published,
        updated,
        categories,
        primary_category,
        pdf_url,
    })
}

fn parse_rfc3339(value: &str, field_name: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ScienceError::Parse(format!("invalid {field_name} datetime: {e}")))
}

fn clean_text(input: &str) -> String {
    input
        .split_whitespace()
        .filter(|chunk| !chunk.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn clean_optional(value: Option<String>) -> Option<String> {
    value.map(|v| clean_text(&v)).filter(|v| !v.is_empty())
}

fn normalize_arxiv_url(url: &str) -> String {
    if let Some(rest) = url.strip_prefix("http://arxiv.org/") {
        return format!("https://arxiv.org/{rest}");
    }
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const R1_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom"
      xmlns:opensearch="http://a9.com/-/spec/opensearch/1.1/"
      xmlns:arxiv="http://arxiv.org/schemas/atom">
  <id>http://arxiv.org/api/query?search_query=ti:R1</id>
  <updated>2025-03-02T00:00:00Z</updated>
  <entry>
    <id>http://arxiv.org/abs/2503.06749v2</id>
    <updated>2025-03-02T17:54:37Z</updated>
    <published>2025-03-01T17:57:40Z</published>
    <title>
      Vision-R1: Incentivizing Reasoning Capability
      in Multimodal Large Language Models
    </title>
    <summary>
      We present a multimodal reasoning model. Code is available at
      https://github.com/Osilly/Vision-R1.
    </summary>
    <author>
      <name>Wenxuan Huang</name>
      <arxiv:affiliation>ECNU</arxiv:affiliation>
    </author>
    <author>
      <name>Bohan Jia</name>
    </author>
    <link rel="alternate" type="text/html" href="http://arxiv.org/abs/2503.06749v2" />
    <link title="pdf" rel="related" type="application/pdf" href="http://arxiv.org/pdf/2503.06749v2" />
    <arxiv:primary_category term="cs.CV" scheme="http://arxiv.org/schemas/atom"/>
    <category term="cs.CV" scheme="http://arxiv.org/schemas/atom"/>
    <category term="cs.AI" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/not-an-id</id>
    <published>2025-03-01T00:00:00Z</published>
    <title>Broken</title>
    <summary>x</summary>
  </entry>
</feed>
"#;

    #[test]
    fn parses_feed_entry() {
        let entries = parse_atom_response(R1_FEED).unwrap();
        assert_eq!(entries.len(), 1);

        let item = &entries[0];
        assert_eq!(item.arxiv_id.id, "2503.06749");
        assert_eq!(item.arxiv_id.version, Some(2));
        assert_eq!(
            item.title,
            "Vision-R1: Incentivizing Reasoning Capability in Multimodal Large Language Models"
        );
        assert!(item.abstract_text.ends_with("https://github.com/Osilly/Vision-R1."));
        assert_eq!(item.authors.len(), 2);
        assert_eq!(item.authors[0].affiliation.as_deref(), Some("ECNU"));
        assert_eq!(item.authors[1].affiliation, None);
        assert_eq!(item.primary_category, "cs.CV");
        assert_eq!(item.categories, vec!["cs.CV".to_string(), "cs.AI".to_string()]);
        assert_eq!(item.pdf_url, "https://arxiv.org/pdf/2503.06749v2");
        assert_eq!(item.abs_url, "https://arxiv.org/abs/2503.06749");
        assert_eq!(item.published.to_rfc3339(), "2025-03-01T17:57:40+00:00");
    }

    #[test]
    fn candidate_conversion() {
        let candidate = parse_atom_response(R1_FEED)
            .unwrap()
            .remove(0)
            .into_candidate();
        assert_eq!(candidate.id, "2503.06749");
        assert_eq!(candidate.categories, vec!["cs.CV", "cs.AI"]);
        assert_eq!(candidate.authors, vec!["Wenxuan Huang", "Bohan Jia"]);
        assert_eq!(candidate.abs_url.as_deref(), Some("https://arxiv.org/abs/2503.06749"));
    }

    #[test]
    fn empty_feed_and_garbage() {
        let empty = r#"<feed xmlns="http://www.w3.org/2005/Atom"><id>x</id></feed>"#;
        assert!(parse_atom_response(empty).unwrap().is_empty());
        assert!(parse_atom_response("not xml at all <<<").is_err());
    }
}
