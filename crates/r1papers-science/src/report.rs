//! Text handed to the version-control side: commit messages and the review
//! summary for a batch of added papers.

use std::fmt::Write as _;

use chrono::NaiveDate;

use r1papers_core::CatalogEntry;

use crate::reconcile::AcceptedPaper;

const COMMIT_TITLE_MAX: usize = 50;

fn short_title(title: &str) -> String {
    if title.chars().count() <= COMMIT_TITLE_MAX {
        return title.to_string();
    }
    let head: String = title.chars().take(COMMIT_TITLE_MAX - 3).collect();
    format!("{head}...")
}

/// `Add: <title>` plus the paper id and date.
pub fn commit_message(entry: &CatalogEntry) -> String {
    format!(
        "Add: {}\n\nArXiv ID: {}\nDate: {}",
        short_title(&entry.title),
        entry.id.as_deref().unwrap_or("-"),
        entry.date.format("%Y-%m-%d"),
    )
}

/// Markdown summary of one update run.
pub fn change_summary(
    papers: &[AcceptedPaper],
    run_date: NaiveDate,
    family_token: &str,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "## Daily {family_token} Papers Update - {run_date}\n");
    let _ = writeln!(
        out,
        "Adds **{} new {family_token}-related paper(s)** found on arXiv.\n",
        papers.len()
    );

    out.push_str("### Papers Added\n\n");
    for (idx, paper) in papers.iter().enumerate() {
        let entry = &paper.entry;
        let _ = writeln!(out, "{}. **{}**", idx + 1, entry.title);
        if let Some(id) = entry.id.as_deref() {
            let _ = writeln!(out, "   - arXiv ID: [{id}]({})", entry.paper_url);
        }
        if !paper.categories.is_empty() {
            let _ = writeln!(out, "   - Categories: {}", paper.categories.join(", "));
        }
        let _ = writeln!(out, "   - Published: {}", entry.date);
        if let Some(code) = entry.code_url.as_deref() {
            let _ = writeln!(out, "   - Code: {code}");
        }
        if let Some(project) = entry.project_url.as_deref() {
            let _ = writeln!(out, "   - Project: {project}");
        }
        out.push('\n');
    }

    out.push_str("### Review Checklist\n\n");
    out.push_str("- [ ] Paper titles are correctly formatted\n");
    out.push_str("- [ ] Code links are accurate\n");
    let _ = writeln!(out, "- [ ] Papers are genuinely {family_token}-related");
    out.push_str("- [ ] No duplicates were added\n");
    out
}
