use tracing::debug;

use r1papers_core::CatalogEntry;

use crate::error::ValidationRejection;
use crate::patterns::is_well_formed_url;

pub const DEFAULT_MAX_TITLE_LEN: usize = 200;

/// Hard checks before an entry may enter the catalog.
///
/// Malformed optional links are cleared in place; only the title and id can
/// reject the entry.
pub fn validate(
    entry: &mut CatalogEntry,
    max_title_len: usize,
) -> Result<(), ValidationRejection> {
    let title = entry.title.trim();
    if title.is_empty() {
        return Err(ValidationRejection::EmptyTitle);
    }
    let len = title.chars().count();
    if len > max_title_len {
        return Err(ValidationRejection::TitleTooLong {
            len,
            max: max_title_len,
        });
    }
    if entry.id.as_deref().is_none_or(|id| id.trim().is_empty()) {
        return Err(ValidationRejection::MissingId);
    }

    for link in [&mut entry.code_url, &mut entry.project_url] {
        if let Some(url) = link.as_deref()
            && !is_well_formed_url(url)
        {
            debug!("Clearing malformed link '{}' on '{}'", url, entry.title);
            *link = None;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn entry(title: &str) -> CatalogEntry {
        CatalogEntry {
            id: Some("2501.00001".to_string()),
            title: title.to_string(),
            paper_url: "https://arxiv.org/abs/2501.00001".to_string(),
            code_url: None,
            project_url: None,
            models: Vec::new(),
            dataset: Vec::new(),
            date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        }
    }

    #[test]
    fn title_limits() {
        assert_eq!(
            validate(&mut entry("   "), DEFAULT_MAX_TITLE_LEN),
            Err(ValidationRejection::EmptyTitle)
        );
        assert!(validate(&mut entry(&"x".repeat(200)), DEFAULT_MAX_TITLE_LEN).is_ok());
        assert_eq!(
            validate(&mut entry(&"x".repeat(201)), DEFAULT_MAX_TITLE_LEN),
            Err(ValidationRejection::TitleTooLong { len: 201, max: 200 })
        );
    }

    #[test]
    fn missing_id_is_rejected() {
        let mut e = entry("Ok");
        e.id = Some(" ".to_string());
        assert_eq!(validate(&mut e, 200), Err(ValidationRejection::MissingId));
    }

    #[test]
    fn malformed_links_are_cleared_not_rejected() {
        let mut e = entry("Ok");
        e.code_url = Some("github.com/no-scheme".to_string());
        e.project_url = Some("https://proj.io/x".to_string());
        assert!(validate(&mut e, 200).is_ok());
        assert_eq!(e.code_url, None);
        assert_eq!(e.project_url.as_deref(), Some("https://proj.io/x"));
    }
}
