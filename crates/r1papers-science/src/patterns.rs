//! Recognizer rules for family papers and the fields extracted from their
//! prose.
//!
//! Every rule is built from the family token (`R1` by default), so a catalog
//! for another naming family only changes configuration.

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;

use r1papers_core::CandidatePaper;
use r1papers_core::models::{MAX_DATASETS, MAX_MODELS};
use r1papers_core::normalize::collapse_whitespace;

use crate::error::{Result, ScienceError};

pub const DEFAULT_FAMILY_TOKEN: &str = "R1";

/// Abstract matches kept per model or dataset rule.
const MATCHES_PER_RULE: usize = 2;
const DATASET_MIN_LEN: usize = 3;
const DATASET_MAX_LEN: usize = 30;

const KNOWN_DATASETS: &[&str] = &[
    "imagenet",
    "coco",
    "cifar",
    "mnist",
    "glue",
    "squad",
    "wmt",
    "conll",
    "openwebtext",
    "pile",
    "commoncrawl",
];

const AI_KEYWORDS: &[&str] = &[
    "neural",
    "model",
    "learning",
    "network",
    "algorithm",
    "training",
    "inference",
    "transformer",
    "attention",
    "deep",
    "machine",
    "artificial",
    "intelligence",
    "classification",
    "regression",
    "prediction",
    "optimization",
    "embedding",
    "representation",
    "feature",
    "performance",
];

/// Hosts that never count as a project page.
const NON_PROJECT_HOSTS: &[&str] = &["github.com", "gitlab.com", "arxiv.org", "doi.org"];

static DEFAULT_LIBRARY: Lazy<PatternLibrary> =
    Lazy::new(|| PatternLibrary::new(DEFAULT_FAMILY_TOKEN).expect("valid regex"));

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| ScienceError::Parse(format!("pattern {pattern}: {e}")))
}

/// A named rule that pulls one URL out of free text.
#[derive(Debug, Clone)]
pub struct LinkRule {
    pub name: &'static str,
    pattern: Regex,
}

impl LinkRule {
    fn new(name: &'static str, pattern: &str) -> Result<Self> {
        Ok(Self {
            name,
            pattern: compile(pattern)?,
        })
    }

    pub fn find(&self, text: &str) -> Option<String> {
        self.pattern
            .find_iter(text)
            .map(|m| strip_trailing_punctuation(m.as_str()))
            .find(|url| !url.is_empty())
    }
}

#[derive(Debug, Clone)]
struct DatasetRule {
    name: &'static str,
    pattern: Regex,
    /// Capture group holding the dataset name; 0 takes the whole match.
    group: usize,
}

#[derive(Debug, Clone)]
pub struct PatternLibrary {
    family_token: String,
    code_hosts: Vec<LinkRule>,
    project_link: Regex,
    model_rules: Vec<Regex>,
    dataset_rules: Vec<DatasetRule>,
    family_title: Vec<Regex>,
    family_abstract: Regex,
    exclusions: Vec<Regex>,
}

impl Default for PatternLibrary {
    fn default() -> Self {
        DEFAULT_LIBRARY.clone()
    }
}

impl PatternLibrary {
    pub fn new(family_token: &str) -> Result<Self> {
        let token = family_token.trim();
        if token.is_empty() {
            return Err(ScienceError::Parse("family token is empty".to_string()));
        }
        let t = regex::escape(&token.to_lowercase());

        let code_hosts = vec![
            LinkRule::new("github", r"(?i)https?://(?:www\.)?github\.com/[^\s)\],|]+")?,
            LinkRule::new("gitlab", r"(?i)https?://(?:www\.)?gitlab\.com/[^\s)\],|]+")?,
        ];

        let model_rules = vec![
            compile(&format!(r"\b[\w\-]*{t}[\w\-]*\b"))?,
            compile(&format!(r"\b{t}[_\-]?\w+"))?,
            compile(&format!(r"\w+[_\-]?{t}\b"))?,
        ];

        let dataset_rules = vec![
            DatasetRule {
                name: "known",
                pattern: compile(&format!(r"(?i)\b(?:{})\b", KNOWN_DATASETS.join("|")))?,
                group: 0,
            },
            DatasetRule {
                name: "named-dataset",
                pattern: compile(r"(?i)\b\w+\s*dataset\b")?,
                group: 0,
            },
            DatasetRule {
                name: "evaluated-on",
                pattern: compile(r"(?i:\bevaluated?\s+on)\s+([A-Z][A-Za-z0-9\-]+)")?,
                group: 1,
            },
        ];

        let family_title = vec![
            compile(&format!(r"\b{t}[-_\s]"))?,
            compile(&format!(r"[-_\s]{t}\b"))?,
            compile(&format!(r"\b{t}\b"))?,
            compile(&format!(r"\b{t}:\s"))?,
            compile(&format!(r#"["']{t}["']"#))?,
        ];

        let nouns = "model|method|approach|framework";
        let family_abstract = compile(&format!(r"(?:{nouns}).*{t}|{t}.*(?:{nouns})"))?;

        let exclusions = [
            format!(r"version\s+{t}"),
            format!(r"revision\s+{t}"),
            format!(r"{t}\s+error"),
            format!(r"{t}\s+squared"),
            r"round\s+1".to_string(),
            r"reviewer\s+1".to_string(),
            r"requirement\s+1".to_string(),
            r"rule\s+1".to_string(),
            r"region\s+1".to_string(),
            r"response\s+1".to_string(),
            format!(r"\b{t}\s*=\s*\d"),
            format!(r"coefficient.*{t}"),
            format!(r"correlation.*{t}"),
        ]
        .iter()
        .map(|p| compile(p))
        .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            family_token: token.to_string(),
            code_hosts,
            project_link: compile(r"(?i)https?://[^\s)\],|]+\.(?:io|com|org|net)/[^\s)\],|]*")?,
            model_rules,
            dataset_rules,
            family_title,
            family_abstract,
            exclusions,
        })
    }

    pub fn family_token(&self) -> &str {
        &self.family_token
    }

    pub fn code_hosts(&self) -> &[LinkRule] {
        &self.code_hosts
    }

    /// First code-host link in the text; rules are tried in order.
    pub fn code_link(&self, text: &str) -> Option<(&'static str, String)> {
        self.code_hosts
            .iter()
            .find_map(|rule| rule.find(text).map(|url| (rule.name, url)))
    }

    /// First path-bearing link on a project-style host that is not a code
    /// host, the paper archive, or a DOI resolver.
    pub fn project_link(&self, text: &str) -> Option<String> {
        self.project_link
            .find_iter(text)
            .map(|m| strip_trailing_punctuation(m.as_str()))
            .find(|url| !is_non_project_url(url))
    }

    /// Upper-cased model tokens: every title match, then up to two abstract
    /// matches per rule. Distinct, at most three.
    pub fn models(&self, title: &str, abstract_text: &str) -> Vec<String> {
        let title = title.to_lowercase();
        let abstract_text = abstract_text.to_lowercase();

        let title_hits = self
            .model_rules
            .iter()
            .flat_map(|rule| rule.find_iter(&title).map(|m| m.as_str().to_string()));
        let abstract_hits = self.model_rules.iter().flat_map(|rule| {
            rule.find_iter(&abstract_text)
                .take(MATCHES_PER_RULE)
                .map(|m| m.as_str().to_string())
        });

        let mut models: Vec<String> = Vec::new();
        for hit in title_hits.chain(abstract_hits) {
            let hit = hit.trim_matches(|c| c == '-' || c == '_').to_uppercase();
            if !hit.is_empty() && !models.contains(&hit) {
                models.push(hit);
            }
            if models.len() == MAX_MODELS {
                break;
            }
        }
        models
    }

    /// Dataset names in original casing. Distinct ignoring case, at most two.
    pub fn datasets(&self, text: &str) -> Vec<String> {
        let mut datasets: Vec<String> = Vec::new();
        'rules: for rule in &self.dataset_rules {
            let hits = rule
                .pattern
                .captures_iter(text)
                .filter_map(|caps| caps.get(rule.group))
                .take(MATCHES_PER_RULE);
            for hit in hits {
                let name = collapse_whitespace(hit.as_str());
                let len = name.chars().count();
                if !(DATASET_MIN_LEN..DATASET_MAX_LEN).contains(&len) {
                    tracing::trace!("Dropping {} dataset match '{}'", rule.name, name);
                    continue;
                }
                if datasets.iter().any(|d| d.eq_ignore_ascii_case(&name)) {
                    continue;
                }
                datasets.push(name);
                if datasets.len() == MAX_DATASETS {
                    break 'rules;
                }
            }
        }
        datasets
    }

    pub fn title_names_family(&self, title: &str) -> bool {
        let title = title.to_lowercase();
        self.family_title.iter().any(|rule| rule.is_match(&title))
    }

    pub fn abstract_names_family(&self, abstract_text: &str) -> bool {
        self.family_abstract.is_match(&abstract_text.to_lowercase())
    }

    /// Phrases where the token means something else (revisions, statistics).
    pub fn is_excluded(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        self.exclusions.iter().any(|rule| rule.is_match(&text))
    }

    pub fn has_ai_keyword(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        AI_KEYWORDS.iter().any(|keyword| text.contains(keyword))
    }

    /// Whether a search hit really is a family paper in one of `categories`.
    pub fn is_family_paper(&self, candidate: &CandidatePaper, categories: &[String]) -> bool {
        let title = &candidate.title;
        let abstract_text = &candidate.abstract_text;

        if !self.title_names_family(title) && !self.abstract_names_family(abstract_text) {
            return false;
        }
        if !candidate.categories.iter().any(|c| categories.contains(c)) {
            return false;
        }
        if self.is_excluded(title) || self.is_excluded(abstract_text) {
            return false;
        }
        self.has_ai_keyword(title) || self.has_ai_keyword(abstract_text)
    }
}

pub fn strip_trailing_punctuation(url: &str) -> String {
    url.trim_end_matches(['.', ',', ';', ':']).to_string()
}

fn host_matches(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

fn is_non_project_url(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => parsed.host_str().is_some_and(|host| {
            let host = host.to_ascii_lowercase();
            NON_PROJECT_HOSTS.iter().any(|d| host_matches(&host, d))
        }),
        Err(_) => {
            let lower = url.to_ascii_lowercase();
            NON_PROJECT_HOSTS.iter().any(|d| lower.contains(d))
        }
    }
}

/// Absolute `http`/`https` URL with a host.
pub fn is_well_formed_url(url: &str) -> bool {
    Url::parse(url).is_ok_and(|parsed| {
        matches!(parsed.scheme(), "http" | "https") && parsed.host_str().is_some()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn lib() -> PatternLibrary {
        PatternLibrary::default()
    }

    #[test]
    fn code_link_prefers_github_and_strips_punctuation() {
        let text = "See https://gitlab.com/a/b and https://github.com/acme/r1lite.";
        assert_eq!(
            lib().code_link(text),
            Some(("github", "https://github.com/acme/r1lite".to_string()))
        );
        assert_eq!(
            lib().code_link("mirror at https://gitlab.com/grp/proj;").map(|(_, u)| u),
            Some("https://gitlab.com/grp/proj".to_string())
        );
        assert_eq!(lib().code_link("no links here"), None);
    }

    #[test]
    fn links_stop_at_table_pipes() {
        assert_eq!(
            lib().code_link("Code: https://github.com/a/b|mirror").map(|(_, u)| u),
            Some("https://github.com/a/b".to_string())
        );
        assert_eq!(
            lib().project_link("Demo https://r1.github.io/x|y").as_deref(),
            Some("https://r1.github.io/x")
        );
    }

    #[test]
    fn project_link_skips_code_hosts_and_archives() {
        let text = "Code: https://github.com/a/b. Paper https://arxiv.org/abs/1. \
                    DOI https://doi.org/10.1/x. Demo at https://r1-demo.github.io/site/, enjoy";
        assert_eq!(
            lib().project_link(text).as_deref(),
            Some("https://r1-demo.github.io/site/")
        );
        assert_eq!(lib().project_link("https://example.com"), None);
    }

    #[test]
    fn models_from_title_then_abstract() {
        let models = lib().models(
            "R1-Lite: A Small Model",
            "code at https://github.com/acme/r1lite",
        );
        assert_eq!(models, vec!["R1-LITE", "R1LITE"]);
    }

    #[test]
    fn models_are_capped() {
        let models = lib().models(
            "Vision-R1 meets Med-R1 and R1-Zero with Audio-R1",
            "Deep-R1, R1-Omni and more",
        );
        assert_eq!(models.len(), MAX_MODELS);
        assert_eq!(models[0], "VISION-R1");
    }

    #[test]
    fn datasets_known_named_and_evaluated() {
        let found = lib().datasets("We train on ImageNet and COCO then evaluated on GSM8K.");
        assert_eq!(found, vec!["ImageNet", "COCO"]);

        let found = lib().datasets("A new reasoning dataset, evaluated on MATH500 too.");
        assert_eq!(found, vec!["reasoning dataset", "MATH500"]);

        let found = lib().datasets("imagenet then ImageNet again");
        assert_eq!(found, vec!["imagenet"]);
    }

    #[test]
    fn datasets_are_length_filtered() {
        assert!(lib().datasets("evaluated on AB only").is_empty());
    }

    #[test]
    fn family_validity() {
        let published = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let cats = vec!["cs.CL".to_string()];

        let good = CandidatePaper::new("1", "Med-R1: Reasoning for Medical Models", "", published)
            .with_categories(["cs.CL"]);
        assert!(lib().is_family_paper(&good, &cats));

        let mut only_math = good.clone();
        only_math.categories = vec!["math.ST".to_string()];
        assert!(!lib().is_family_paper(&only_math, &cats));

        let statistic = CandidatePaper::new(
            "2",
            "Bounds on R1 squared for learning",
            "",
            published,
        )
        .with_categories(["cs.CL"]);
        assert!(!lib().is_family_paper(&statistic, &cats));

        let no_ai = CandidatePaper::new("3", "The R1 Bridge", "civil works", published)
            .with_categories(["cs.CL"]);
        assert!(!lib().is_family_paper(&no_ai, &cats));

        let via_abstract = CandidatePaper::new(
            "4",
            "Reasoning at Scale",
            "We propose a framework that distills r1 traces into neural policies.",
            published,
        )
        .with_categories(["cs.LG"]);
        assert!(lib().is_family_paper(&via_abstract, &["cs.LG".to_string()]));
    }

    #[test]
    fn other_family_token() {
        let lib = PatternLibrary::new("O1").unwrap();
        assert!(lib.title_names_family("Marco-o1: Open Reasoning"));
        assert_eq!(lib.models("Marco-o1", ""), vec!["MARCO-O1"]);
        assert!(PatternLibrary::new("  ").is_err());
    }

    #[test]
    fn url_well_formedness() {
        assert!(is_well_formed_url("https://github.com/a/b"));
        assert!(!is_well_formed_url("ftp://host/x"));
        assert!(!is_well_formed_url("github.com/a/b"));
    }
}
