use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::catalog::format::{
    DATE_FORMAT, is_header_row, is_separator_row, is_table_line, parse_link_cell,
    parse_list_cell, parse_url_cell, split_row,
};
use crate::identifiers::paper_id_from_url;
use crate::models::{
    Catalog, CatalogEntry, CatalogRow, Column, ColumnMap, DEFAULT_HEADING, RowIssue, TableLayout,
};

/// Reads a catalog document into rows plus the surrounding text.
#[derive(Debug, Clone)]
pub struct CatalogParser {
    heading: String,
}

impl Default for CatalogParser {
    fn default() -> Self {
        Self::new(DEFAULT_HEADING)
    }
}

struct Line<'a> {
    start: usize,
    /// Line without its trailing `\n` (a `\r` is kept).
    text: &'a str,
    end: usize,
    terminated: bool,
}

fn split_lines(document: &str) -> Vec<Line<'_>> {
    let mut lines = Vec::new();
    let mut start = 0;
    for chunk in document.split_inclusive('\n') {
        let end = start + chunk.len();
        let terminated = chunk.ends_with('\n');
        let text = chunk.strip_suffix('\n').unwrap_or(chunk);
        lines.push(Line {
            start,
            text,
            end,
            terminated,
        });
        start = end;
    }
    lines
}

impl CatalogParser {
    pub fn new(heading: &str) -> Self {
        Self {
            heading: heading.trim().to_string(),
        }
    }

    fn is_section_heading(&self, line: &str) -> bool {
        let line = line.trim();
        match line.strip_prefix("##") {
            Some(rest) if !rest.starts_with('#') => rest.trim().eq_ignore_ascii_case(&self.heading),
            _ => false,
        }
    }

    /// Never fails: rows that do not parse are kept verbatim as
    /// [`CatalogRow::Unparsed`] and logged.
    pub fn parse(&self, document: &str) -> Catalog {
        let lines = split_lines(document);
        let base = Catalog {
            heading: self.heading.clone(),
            ..Catalog::default()
        };

        let Some(heading_idx) = lines.iter().position(|l| self.is_section_heading(l.text)) else {
            debug!("No '## {}' section found, catalog is empty", self.heading);
            return Catalog {
                prologue: document.to_string(),
                layout: TableLayout::Missing,
                ..base
            };
        };

        let section_end = lines
            .iter()
            .enumerate()
            .skip(heading_idx + 1)
            .find(|(_, l)| l.text.trim_start().starts_with('#'))
            .map(|(idx, _)| idx)
            .unwrap_or(lines.len());

        let header_idx = (heading_idx + 1..section_end).find(|&idx| is_table_line(lines[idx].text));
        let separator_ok = header_idx
            .and_then(|idx| lines.get(idx + 1).filter(|_| idx + 1 < section_end))
            .and_then(|line| split_row(line.text))
            .is_some_and(|cells| is_separator_row(&cells));

        let header_idx = match header_idx {
            Some(idx) if separator_ok => idx,
            _ => {
                warn!("Section '## {}' has no table, one will be created on write", self.heading);
                let split_at = lines[heading_idx].end;
                return Catalog {
                    prologue: document[..split_at].to_string(),
                    epilogue: document[split_at..].to_string(),
                    layout: TableLayout::EmptySection,
                    ..base
                };
            }
        };

        let header_cells = split_row(lines[header_idx].text).unwrap_or_default();
        let columns = ColumnMap::from_header(header_cells.iter().copied()).unwrap_or_else(|| {
            warn!(
                "Catalog header does not name every column, assuming canonical order: {}",
                lines[header_idx].text.trim()
            );
            ColumnMap::canonical()
        });

        let body_start_idx = header_idx + 2;
        let body_start = lines
            .get(body_start_idx)
            .map(|l| l.start)
            .unwrap_or(document.len());

        let mut rows = Vec::new();
        let mut body_end = body_start;
        let mut body_terminated = true;
        for (idx, line) in lines
            .iter()
            .enumerate()
            .take(section_end)
            .skip(body_start_idx)
        {
            if !is_table_line(line.text) {
                break;
            }
            let row = parse_row(line.text, &columns);
            if let CatalogRow::Unparsed { issue, .. } = &row
                && issue.is_structural()
            {
                warn!("Skipping catalog row {}: {}", idx + 1, issue);
            }
            rows.push(row);
            body_end = line.end;
            body_terminated = line.terminated;
        }

        debug!("Parsed {} catalog rows", rows.len());

        Catalog {
            prologue: document[..body_start].to_string(),
            rows,
            epilogue: document[body_end..].to_string(),
            layout: TableLayout::Table { columns },
            body_terminated,
            ..base
        }
    }
}

/// Parses with the default `## Papers` heading.
pub fn parse(document: &str) -> Catalog {
    CatalogParser::default().parse(document)
}

fn unparsed(line: &str, issue: RowIssue) -> CatalogRow {
    CatalogRow::Unparsed {
        line: line.to_string(),
        issue,
    }
}

fn parse_row(line: &str, columns: &ColumnMap) -> CatalogRow {
    let Some(cells) = split_row(line) else {
        return unparsed(line, RowIssue::CellCount {
            expected: columns.width(),
            found: 0,
        });
    };

    if is_separator_row(&cells) {
        return unparsed(line, RowIssue::Separator);
    }
    if is_header_row(&cells) {
        return unparsed(line, RowIssue::Header);
    }
    if cells.len() != columns.width() {
        return unparsed(line, RowIssue::CellCount {
            expected: columns.width(),
            found: cells.len(),
        });
    }

    let cell = |column: Column| columns.position(column).map(|pos| cells[pos]).unwrap_or("");

    let Some((title, paper_url)) = parse_link_cell(cell(Column::Paper)) else {
        return unparsed(line, RowIssue::TitleCell);
    };

    let date_cell = cell(Column::Date);
    let Ok(date) = NaiveDate::parse_from_str(date_cell, DATE_FORMAT) else {
        return unparsed(line, RowIssue::Date(date_cell.to_string()));
    };

    let entry = CatalogEntry {
        id: paper_id_from_url(&paper_url),
        title,
        paper_url,
        code_url: parse_url_cell(cell(Column::Code)),
        project_url: parse_url_cell(cell(Column::ProjectPage)),
        models: parse_list_cell(cell(Column::Models)),
        dataset: parse_list_cell(cell(Column::Dataset)),
        date,
    };

    CatalogRow::Entry {
        entry,
        source: Some(line.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const README: &str = "# Awesome R1\n\
\n\
Intro text.\n\
\n\
## Papers\n\
\n\
| Paper | Code | Models | Dataset | Project Page | Date |\n\
|-------|------|--------|---------|--------------|------|\n\
| [Vision-R1: Reasoning](https://arxiv.org/abs/2503.06749v2) | [Code](https://github.com/x/vision-r1) | VISION-R1 | COCO | [Project](https://vision.github.io/r1/) | 2025-03-10 |\n\
| [DeepSeek-R1](https://arxiv.org/abs/2501.12948) | - | DEEPSEEK-R1, R1-ZERO | - | - | 2025-01-22 |\n\
\n\
## Contributing\n\
\n\
PRs welcome.\n";

    #[test]
    fn parses_rows_and_surrounding_text() {
        let catalog = parse(README);

        assert!(catalog.has_table());
        assert_eq!(catalog.entry_count(), 2);
        assert!(catalog.prologue.ends_with("|------|\n"));
        assert!(catalog.epilogue.starts_with("\n## Contributing"));

        let first = catalog.entries().next().unwrap();
        assert_eq!(first.id.as_deref(), Some("2503.06749"));
        assert_eq!(first.title, "Vision-R1: Reasoning");
        assert_eq!(first.code_url.as_deref(), Some("https://github.com/x/vision-r1"));
        assert_eq!(first.project_url.as_deref(), Some("https://vision.github.io/r1/"));
        assert_eq!(first.dataset, vec!["COCO"]);
        assert_eq!(first.date.to_string(), "2025-03-10");

        let second = catalog.find_by_id("2501.12948").unwrap();
        assert_eq!(second.models, vec!["DEEPSEEK-R1", "R1-ZERO"]);
        assert_eq!(second.code_url, None);
    }

    #[test]
    fn missing_section_keeps_whole_document() {
        let doc = "# Something else\n\nNo table here.\n";
        let catalog = parse(doc);
        assert_eq!(catalog.layout, TableLayout::Missing);
        assert_eq!(catalog.prologue, doc);
        assert_eq!(catalog.entry_count(), 0);
    }

    #[test]
    fn section_without_table() {
        let doc = "# R1\n\n## Papers\n\nComing soon.\n\n## License\n";
        let catalog = parse(doc);
        assert_eq!(catalog.layout, TableLayout::EmptySection);
        assert_eq!(catalog.prologue, "# R1\n\n## Papers\n");
        assert_eq!(catalog.epilogue, "\nComing soon.\n\n## License\n");
    }

    #[test]
    fn bad_rows_are_kept_but_not_entries() {
        let doc = "## Papers\n\
| Paper | Code | Models | Dataset | Project Page | Date |\n\
|---|---|---|---|---|---|\n\
| [Ok R1](https://arxiv.org/abs/2501.00001) | - | - | - | - | 2025-01-01 |\n\
| too | few |\n\
| no link | - | - | - | - | 2025-01-01 |\n\
| [Bad Date](https://arxiv.org/abs/2501.00002) | - | - | - | - | someday |\n\
| [Blog R1](https://example.com/post) | - | - | - | - | 2024-12-31 |\n";
        let catalog = parse(doc);

        let issues: Vec<&RowIssue> = catalog.issues().map(|(_, issue)| issue).collect();
        assert_eq!(issues.len(), 3);
        assert!(matches!(issues[0], RowIssue::CellCount { expected: 6, found: 2 }));
        assert_eq!(issues[1], &RowIssue::TitleCell);
        assert_eq!(issues[2], &RowIssue::Date("someday".to_string()));

        assert_eq!(catalog.entry_count(), 2);
        assert_eq!(catalog.matchable_entries().count(), 1);
    }

    #[test]
    fn header_order_drives_cell_mapping() {
        let doc = "## Papers\n\
| Date | Paper | Code | Models | Dataset | Project Page |\n\
|---|---|---|---|---|---|\n\
| 2025-02-02 | [Reordered R1](https://arxiv.org/abs/2502.00002) | - | R1 | - | - |\n";
        let catalog = parse(doc);
        let entry = catalog.entries().next().unwrap();
        assert_eq!(entry.date.to_string(), "2025-02-02");
        assert_eq!(entry.title, "Reordered R1");
        assert_eq!(entry.models, vec!["R1"]);
    }

    #[test]
    fn custom_heading() {
        let doc = "## Reading List\n\
| Paper | Code | Models | Dataset | Project Page | Date |\n\
|---|---|---|---|---|---|\n\
| [A](https://arxiv.org/abs/2501.00003) | - | - | - | - | 2025-01-03 |\n";
        assert_eq!(CatalogParser::new("Reading List").parse(doc).entry_count(), 1);
        assert_eq!(parse(doc).entry_count(), 0);
    }

    #[test]
    fn crlf_rows_keep_their_source() {
        let doc = "## Papers\r\n| Paper | Code | Models | Dataset | Project Page | Date |\r\n|---|---|---|---|---|---|\r\n| [A](https://arxiv.org/abs/2501.00003) | - | - | - | - | 2025-01-03 |\r\n";
        let catalog = parse(doc);
        assert_eq!(catalog.entry_count(), 1);
        match &catalog.rows[0] {
            CatalogRow::Entry { source, .. } => {
                assert!(source.as_deref().unwrap().ends_with('\r'));
            }
            other => panic!("unexpected row {other:?}"),
        }
    }
}
