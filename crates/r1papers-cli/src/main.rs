use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use r1papers_core::catalog::CatalogParser;
use r1papers_core::{AppConfig, CandidatePaper, DocumentStore, ExitCode, FileDocumentStore};
use r1papers_science::arxiv::ArxivFeed;
use r1papers_science::report::{change_summary, commit_message};
use r1papers_science::{
    CatalogIndex, Enricher, HttpLinkProbe, MatchDecision, PatternLibrary, UpdateSettings,
    update_catalog,
};

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "r1papers",
    about = "Keeps a curated R1 paper catalog up to date",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format (for scripts and CI).
    /// Also enabled by setting R1PAPERS_JSON=1.
    #[arg(long, global = true)]
    json: bool,

    /// Debug logging on stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Catalog document to work on. Also R1PAPERS_README.
    #[arg(long, global = true)]
    readme: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile new papers into the catalog and save it.
    Update {
        /// JSON file with candidate papers instead of querying arXiv.
        #[arg(long)]
        candidates: Option<PathBuf>,
        /// Report what would be added without writing.
        #[arg(long)]
        dry_run: bool,
        /// Do not probe extracted code links.
        #[arg(long)]
        no_verify: bool,
        /// Stop after this many seconds, keeping what was accepted.
        #[arg(long)]
        deadline: Option<u64>,
    },

    /// Parse the catalog and report its state.
    Check,

    /// Classify one paper against the catalog.
    Match {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        id: String,
    },

    /// Print the candidates the arXiv feed currently yields.
    Search {
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Config management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show version information.
    Version,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show all config values.
    List,
    /// Get a specific config key.
    Get { key: String },
}

// ─── Main ────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let start = Instant::now();
    let cli = Cli::parse();

    init_logging(cli.verbose);

    // ── Env var overrides ──────────────────────────────────────────────────
    let json_output = cli.json || std::env::var("R1PAPERS_JSON").as_deref() == Ok("1");

    let mut config = AppConfig::load()?;
    if let Ok(readme) = std::env::var("R1PAPERS_README") {
        config.set_document_path(readme.into());
    }
    if let Some(readme) = cli.readme {
        config.set_document_path(readme);
    }

    match cli.command {
        // ── Update ─────────────────────────────────────────────────────────
        Commands::Update {
            candidates,
            dry_run,
            no_verify,
            deadline,
        } => {
            let patterns = PatternLibrary::new(&config.catalog.family_token)?;
            let candidates = match candidates {
                Some(path) => read_candidates(&path)?,
                None => {
                    ArxivFeed::new(&config.feed, patterns.clone())?
                        .fetch_candidates(chrono::Utc::now())
                        .await?
                }
            };
            info!("Reconciling {} candidate papers", candidates.len());

            let enricher = build_enricher(&config, patterns, !no_verify)?;
            let mut settings = UpdateSettings::from_config(&config);
            settings.dry_run = dry_run;
            let deadline = deadline
                .or(config.run.deadline_secs)
                .map(|secs| tokio::time::Instant::now() + Duration::from_secs(secs));

            let path = config.document_path();
            let store = FileDocumentStore::new();
            let report =
                match update_catalog(&store, &path, &settings, enricher, &candidates, deadline)
                    .await
                {
                    Ok(report) => report,
                    Err(e) if e.is_conflict() => {
                        let dur = start.elapsed().as_millis();
                        if json_output {
                            print_json(&serde_json::json!({"status":"error","error":"conflict","message":e.to_string(),"meta":{"duration_ms":dur}}))?;
                        } else {
                            eprintln!("{e}");
                            eprintln!("Catalog changed during the run; nothing was written.");
                        }
                        std::process::exit(ExitCode::Conflict as i32);
                    }
                    Err(e) => return Err(e.into()),
                };

            let entries = report.outcome.entries();
            let dur = start.elapsed().as_millis();
            if json_output {
                let commits: Vec<String> = entries.iter().map(commit_message).collect();
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": {
                        "added": report.added(),
                        "written": report.written,
                        "dry_run": dry_run,
                        "outcome": report.outcome,
                        "commit_messages": commits,
                    },
                    "meta": { "duration_ms": dur }
                }))?;
            } else {
                let outcome = &report.outcome;
                println!(
                    "Added {} papers ({} duplicates, {} rejected).",
                    report.added(),
                    outcome.duplicates.len(),
                    outcome.rejected.len()
                );
                if outcome.deadline_hit {
                    println!("Deadline reached, {} candidates not examined.", outcome.skipped);
                }
                if entries.is_empty() {
                    return Ok(());
                }
                if dry_run {
                    println!("Dry run, {} left untouched.", path.display());
                }
                for entry in &entries {
                    println!("\n{}", commit_message(entry));
                }
                println!(
                    "\n{}",
                    change_summary(
                        &report.outcome.accepted,
                        chrono::Local::now().date_naive(),
                        &config.catalog.family_token
                    )
                );
            }
        }

        // ── Check ──────────────────────────────────────────────────────────
        Commands::Check => {
            let path = config.document_path();
            let content = load_document(&path)?;
            let catalog = CatalogParser::new(&config.catalog.section_heading).parse(&content);
            let issues: Vec<serde_json::Value> = catalog
                .issues()
                .filter(|(_, issue)| issue.is_structural())
                .map(|(line, issue)| serde_json::json!({"line":line,"issue":issue.to_string()}))
                .collect();
            let sorted = catalog.is_sorted_by_date_desc();
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": {
                        "path": path,
                        "has_table": catalog.has_table(),
                        "entries": catalog.entry_count(),
                        "matchable": catalog.matchable_entries().count(),
                        "sorted": sorted,
                        "issues": issues,
                    },
                    "meta": { "duration_ms": dur }
                }))?;
            } else {
                println!("Catalog: {}", path.display());
                if !catalog.has_table() {
                    println!("  No '## {}' table yet", catalog.heading);
                }
                println!("  Entries:   {}", catalog.entry_count());
                println!("  Matchable: {}", catalog.matchable_entries().count());
                println!("  Sorted:    {}", if sorted { "yes" } else { "no" });
                for issue in &issues {
                    println!("  ! {}  {}", issue["issue"], issue["line"]);
                }
            }
        }

        // ── Match ──────────────────────────────────────────────────────────
        Commands::Match { title, id } => {
            let path = config.document_path();
            let content = load_document(&path)?;
            let catalog = CatalogParser::new(&config.catalog.section_heading).parse(&content);
            let index = CatalogIndex::from_catalog(&catalog)
                .with_threshold(config.matching.similarity_threshold);
            let candidate = CandidatePaper::new(id, title, "", chrono::Utc::now());
            let decision = index.classify(&candidate);
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({"status":"ok","data":decision,"meta":{"duration_ms":dur}}))?;
            } else {
                match &decision {
                    MatchDecision::Duplicate {
                        existing_id,
                        reason,
                    } => println!("Duplicate of {existing_id} ({reason:?})"),
                    MatchDecision::Accepted => println!("New paper"),
                }
            }
        }

        // ── Search ─────────────────────────────────────────────────────────
        Commands::Search { limit } => {
            let patterns = PatternLibrary::new(&config.catalog.family_token)?;
            let feed = ArxivFeed::new(&config.feed, patterns)?;
            let mut candidates = feed.fetch_candidates(chrono::Utc::now()).await?;
            let total = candidates.len();
            candidates.truncate(limit);
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "items": candidates, "total": total },
                    "meta": { "duration_ms": dur }
                }))?;
            } else if candidates.is_empty() {
                println!("No new {} papers on arXiv.", config.catalog.family_token);
            } else {
                for paper in &candidates {
                    println!(
                        "{id:<14}  {date}  {title}",
                        id = paper.canonical_id(),
                        date = paper.publication_date(),
                        title = paper.title,
                    );
                }
            }
        }

        // ── Config ─────────────────────────────────────────────────────────
        Commands::Config { action } => {
            let dur = start.elapsed().as_millis();
            let kv = config_key_values(&config);
            match action {
                ConfigAction::List => {
                    if json_output {
                        print_json(&serde_json::json!({"status":"ok","data":kv,"meta":{"duration_ms":dur}}))?;
                    } else {
                        for (k, v) in &kv {
                            println!("{k} = {v}");
                        }
                    }
                }
                ConfigAction::Get { key } => match kv.get(key.as_str()) {
                    Some(val) => {
                        if json_output {
                            print_json(&serde_json::json!({"status":"ok","data":{"key":key,"value":val},"meta":{"duration_ms":dur}}))?;
                        } else {
                            println!("{val}");
                        }
                    }
                    None => {
                        eprintln!("Unknown config key: {key}");
                        std::process::exit(ExitCode::NotFound as i32);
                    }
                },
            }
        }

        // ── Version ────────────────────────────────────────────────────────
        Commands::Version => {
            let version = env!("CARGO_PKG_VERSION");
            let dur = start.elapsed().as_millis();
            if json_output {
                print_json(&serde_json::json!({"status":"ok","data":{"version":version},"meta":{"duration_ms":dur}}))?;
            } else {
                println!("r1papers v{version}");
            }
        }
    }

    Ok(())
}

// ─── Helpers ────────────────────────────────────────────────────────────────

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json(val: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(val)?);
    Ok(())
}

fn read_candidates(path: &Path) -> Result<Vec<CandidatePaper>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading candidates from {}", path.display()))?;
    let candidates: Vec<CandidatePaper> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing candidates in {}", path.display()))?;
    Ok(candidates)
}

fn load_document(path: &Path) -> Result<String> {
    let loaded = FileDocumentStore::new().load(path)?;
    if !loaded.exists {
        warn!("{} does not exist", path.display());
    }
    Ok(loaded.content)
}

fn build_enricher(config: &AppConfig, patterns: PatternLibrary, verify: bool) -> Result<Enricher> {
    let timeout = Duration::from_millis(config.enrichment.probe_timeout_ms);
    let enricher = Enricher::new(patterns).with_probe_timeout(timeout);
    if !(verify && config.enrichment.verify_code_links) {
        return Ok(enricher);
    }
    let probe = HttpLinkProbe::new(timeout, &config.feed.user_agent)?;
    Ok(enricher.with_probe(Arc::new(probe)))
}

fn config_key_values(config: &AppConfig) -> std::collections::BTreeMap<&'static str, String> {
    let mut map = std::collections::BTreeMap::new();
    map.insert("catalog.document_path", config.catalog.document_path.clone());
    map.insert("catalog.section_heading", config.catalog.section_heading.clone());
    map.insert("catalog.family_token", config.catalog.family_token.clone());
    map.insert(
        "matching.similarity_threshold",
        config.matching.similarity_threshold.to_string(),
    );
    map.insert(
        "enrichment.verify_code_links",
        config.enrichment.verify_code_links.to_string(),
    );
    map.insert(
        "enrichment.probe_timeout_ms",
        config.enrichment.probe_timeout_ms.to_string(),
    );
    map.insert(
        "enrichment.max_title_len",
        config.enrichment.max_title_len.to_string(),
    );
    map.insert("feed.base_url", config.feed.base_url.clone());
    map.insert("feed.categories", config.feed.categories.join(","));
    map.insert("feed.lookback_days", config.feed.lookback_days.to_string());
    map.insert("feed.max_results", config.feed.max_results.to_string());
    map.insert(
        "feed.request_interval_ms",
        config.feed.request_interval_ms.to_string(),
    );
    map.insert("feed.user_agent", config.feed.user_agent.clone());
    map.insert(
        "run.deadline_secs",
        config
            .run
            .deadline_secs
            .map(|s| s.to_string())
            .unwrap_or_default(),
    );
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_flags_parse() {
        let cli = Cli::try_parse_from([
            "r1papers",
            "update",
            "--candidates",
            "new.json",
            "--dry-run",
            "--no-verify",
            "--deadline",
            "30",
            "--json",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Update {
                candidates,
                dry_run,
                no_verify,
                deadline,
            } => {
                assert_eq!(candidates, Some(PathBuf::from("new.json")));
                assert!(dry_run);
                assert!(no_verify);
                assert_eq!(deadline, Some(30));
            }
            _ => panic!("expected update"),
        }
    }

    #[test]
    fn match_requires_title() {
        assert!(Cli::try_parse_from(["r1papers", "match", "--id", "2501.00001"]).is_err());
        assert!(Cli::try_parse_from(["r1papers", "match", "--title", "Foo R1"]).is_ok());
    }

    #[test]
    fn config_keys_cover_every_section() {
        let kv = config_key_values(&AppConfig::default());
        assert_eq!(kv["catalog.family_token"], "R1");
        assert_eq!(kv["matching.similarity_threshold"], "0.9");
        assert_eq!(kv["run.deadline_secs"], "");
        assert!(kv.contains_key("feed.base_url"));
    }

    #[test]
    fn enricher_without_verification_has_no_probe() {
        let config = AppConfig::default();
        assert!(build_enricher(&config, PatternLibrary::default(), false).is_ok());
    }

    #[test]
    fn candidates_file_is_read() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("candidates.json");
        std::fs::write(
            &path,
            r#"[{"id":"2503.00001v1","title":"Foo R1","abstract":"","published_at":"2025-03-01T00:00:00Z"}]"#,
        )
        .unwrap();
        let candidates = read_candidates(&path).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].canonical_id(), "2503.00001");
    }
}
