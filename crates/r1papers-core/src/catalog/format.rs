//! Cell-level grammar of the catalog table.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{Column, ColumnMap};

pub const EMPTY_CELL: &str = "-";
pub const CODE_LABEL: &str = "Code";
pub const PROJECT_LABEL: &str = "Project";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

static LINK_CELL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[(.+)\]\(\s*([^()\s]+)\s*\)$").expect("valid regex"));

/// Splits a `| a | b |` line into trimmed inner cells.
///
/// Returns `None` when the line is not a table row at all.
pub fn split_row(line: &str) -> Option<Vec<&str>> {
    let trimmed = line.trim();
    let inner = trimmed.strip_prefix('|')?;
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    Some(inner.split('|').map(str::trim).collect())
}

pub fn is_table_line(line: &str) -> bool {
    line.trim_start().starts_with('|')
}

/// `|---|:---:|` style rows.
pub fn is_separator_row(cells: &[&str]) -> bool {
    !cells.is_empty()
        && cells.iter().all(|cell| {
            !cell.is_empty()
                && cell.contains('-')
                && cell.chars().all(|c| c == '-' || c == ':' || c == ' ')
        })
}

pub fn is_header_row(cells: &[&str]) -> bool {
    cells
        .iter()
        .any(|cell| Column::from_header(cell) == Some(Column::Paper))
        && cells
            .iter()
            .any(|cell| Column::from_header(cell) == Some(Column::Date))
}

/// `[label](url)` → `(label, url)`.
pub fn parse_link_cell(cell: &str) -> Option<(String, String)> {
    let caps = LINK_CELL.captures(cell.trim())?;
    let label = caps.get(1)?.as_str().trim();
    let url = caps.get(2)?.as_str();
    if label.is_empty() {
        return None;
    }
    Some((label.to_string(), url.to_string()))
}

/// Optional URL cell: `-` or empty → `None`, `[label](url)` or a bare URL →
/// the URL.
pub fn parse_url_cell(cell: &str) -> Option<String> {
    let cell = cell.trim();
    if cell.is_empty() || cell == EMPTY_CELL {
        return None;
    }
    if let Some((_, url)) = parse_link_cell(cell) {
        return Some(url);
    }
    if cell.starts_with("http://") || cell.starts_with("https://") {
        return Some(cell.to_string());
    }
    None
}

/// Comma separated list cell; `-` means empty.
pub fn parse_list_cell(cell: &str) -> Vec<String> {
    let cell = cell.trim();
    if cell.is_empty() || cell == EMPTY_CELL {
        return Vec::new();
    }
    cell.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Makes free text safe for a single cell.
pub fn cell_text(text: &str) -> String {
    crate::normalize::collapse_whitespace(&text.replace('|', "/"))
}

/// Percent-encodes the characters that would end the cell or the link.
pub fn cell_url(url: &str) -> String {
    let mut out = String::with_capacity(url.len());
    for c in url.trim().chars() {
        match c {
            '|' => out.push_str("%7C"),
            '(' => out.push_str("%28"),
            ')' => out.push_str("%29"),
            c if c.is_whitespace() => out.push_str("%20"),
            c => out.push(c),
        }
    }
    out
}

pub fn render_link(label: &str, url: &str) -> String {
    format!("[{}]({})", cell_text(label), cell_url(url))
}

pub fn render_optional_link(label: &str, url: Option<&str>) -> String {
    match url.map(str::trim).filter(|u| !u.is_empty()) {
        Some(url) => render_link(label, url),
        None => EMPTY_CELL.to_string(),
    }
}

pub fn render_list(items: &[String]) -> String {
    let rendered: Vec<String> = items
        .iter()
        .map(|item| cell_text(&item.replace(',', " ")))
        .filter(|item| !item.is_empty())
        .collect();
    if rendered.is_empty() {
        EMPTY_CELL.to_string()
    } else {
        rendered.join(", ")
    }
}

pub fn render_cells(cells: &[String]) -> String {
    format!("| {} |", cells.join(" | "))
}

pub fn header_row(columns: &ColumnMap) -> String {
    let cells: Vec<String> = columns
        .columns()
        .map(|column| column.map(|c| c.header_name()).unwrap_or("").to_string())
        .collect();
    render_cells(&cells)
}

pub fn separator_row(columns: &ColumnMap) -> String {
    let cells: Vec<String> = columns
        .columns()
        .map(|column| {
            let width = column.map(|c| c.header_name().len()).unwrap_or(1) + 2;
            "-".repeat(width)
        })
        .collect();
    format!("|{}|", cells.join("|"))
}

/// Document written when the catalog does not exist yet.
pub fn bootstrap_document(heading: &str, family_token: &str) -> String {
    let columns = ColumnMap::canonical();
    format!(
        "# Awesome {family_token}\n\n\
         A curated list of awesome {family_token} related papers, code, and resources.\n\n\
         ## {heading}\n\n\
         {header}\n\
         {separator}\n\n\
         ## Contributing\n\n\
         Contributions are welcome! Please read the [contributing guidelines](CONTRIBUTING.md) first.\n\n\
         ## License\n\n\
         MIT License\n",
        header = header_row(&columns),
        separator = separator_row(&columns),
    )
}
