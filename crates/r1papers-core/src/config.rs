use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Root application configuration, loaded from `~/.config/r1papers/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub catalog: CatalogConfig,
    pub matching: MatchingConfig,
    pub enrichment: EnrichmentConfig,
    pub feed: FeedConfig,
    pub run: RunConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Path of the markdown document holding the catalog table.
    pub document_path: String,
    /// Heading text of the section that owns the table (`## <heading>`).
    pub section_heading: String,
    /// Literal token that defines the paper family, e.g. `R1`.
    pub family_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    pub similarity_threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    pub verify_code_links: bool,
    pub probe_timeout_ms: u64,
    pub max_title_len: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub base_url: String,
    pub categories: Vec<String>,
    pub lookback_days: i64,
    pub max_results: u32,
    pub request_interval_ms: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline_secs: Option<u64>,
}

// ─── Defaults ──────────────────────────────────────────────

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog: CatalogConfig::default(),
            matching: MatchingConfig::default(),
            enrichment: EnrichmentConfig::default(),
            feed: FeedConfig::default(),
            run: RunConfig::default(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            document_path: "README.md".to_string(),
            section_heading: "Papers".to_string(),
            family_token: "R1".to_string(),
        }
    }
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.9,
        }
    }
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            verify_code_links: true,
            probe_timeout_ms: 5_000,
            max_title_len: 200,
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        let categories = [
            "cs.AI", "cs.CL", "cs.LG", "cs.CV", "cs.RO", "cs.NE", "cs.IR", "cs.MM", "cs.HC",
            "cs.CR", "cs.DC", "cs.DS", "cs.IT", "cs.MA", "cs.NI", "cs.PL", "cs.SE", "cs.SY",
        ];
        Self {
            base_url: "http://export.arxiv.org/api/query".to_string(),
            categories: categories.iter().map(|c| c.to_string()).collect(),
            lookback_days: 3,
            max_results: 100,
            request_interval_ms: 1_000,
            user_agent: "r1papers/0.1".to_string(),
        }
    }
}

// ─── Load / Save ───────────────────────────────────────────

impl AppConfig {
    /// Standard config file path: `~/.config/r1papers/config.toml`
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("R1PAPERS_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("r1papers")
            .join("config.toml")
    }

    /// Load config from disk, falling back to defaults if file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        Self::load_from(&path)
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let threshold = self.matching.similarity_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(crate::CoreError::ConfigError(format!(
                "matching.similarity_threshold must be within [0, 1], got {threshold}"
            )));
        }
        if self.catalog.family_token.trim().is_empty() {
            return Err(crate::CoreError::ConfigError(
                "catalog.family_token must not be empty".to_string(),
            ));
        }
        if self.catalog.section_heading.trim().is_empty() {
            return Err(crate::CoreError::ConfigError(
                "catalog.section_heading must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn document_path(&self) -> PathBuf {
        PathBuf::from(&self.catalog.document_path)
    }

    pub fn set_document_path(&mut self, path: PathBuf) {
        self.catalog.document_path = path.to_string_lossy().to_string();
    }
}
