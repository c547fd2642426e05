use crate::catalog::format::{
    CODE_LABEL, DATE_FORMAT, EMPTY_CELL, PROJECT_LABEL, header_row, render_cells, render_link,
    render_list, render_optional_link, separator_row,
};
use crate::models::{Catalog, CatalogEntry, CatalogRow, Column, ColumnMap, TableLayout};

/// Adds `new_entries` to the catalog and re-sorts rows newest first.
///
/// Sorting is stable, so rows sharing a date keep their relative order and
/// undated rows stay at the bottom. Merging nothing returns the catalog
/// unchanged.
pub fn merge(mut catalog: Catalog, new_entries: Vec<CatalogEntry>) -> Catalog {
    if new_entries.is_empty() {
        return catalog;
    }
    catalog
        .rows
        .extend(new_entries.into_iter().map(CatalogRow::new_entry));
    catalog.rows.sort_by(|a, b| b.date().cmp(&a.date()));
    catalog
}

/// Renders one entry as a table line for the given column order.
pub fn render_row(entry: &CatalogEntry, columns: &ColumnMap) -> String {
    let cells: Vec<String> = columns
        .columns()
        .map(|column| match column {
            Some(Column::Paper) => render_link(&entry.title, &entry.paper_url),
            Some(Column::Code) => render_optional_link(CODE_LABEL, entry.code_url.as_deref()),
            Some(Column::Models) => render_list(&entry.models),
            Some(Column::Dataset) => render_list(&entry.dataset),
            Some(Column::ProjectPage) => {
                render_optional_link(PROJECT_LABEL, entry.project_url.as_deref())
            }
            Some(Column::Date) => entry.date.format(DATE_FORMAT).to_string(),
            None => EMPTY_CELL.to_string(),
        })
        .collect();
    render_cells(&cells)
}

fn row_line(row: &CatalogRow, columns: &ColumnMap) -> String {
    match row {
        CatalogRow::Entry {
            source: Some(source),
            ..
        } => source.clone(),
        CatalogRow::Entry { entry, source: None } => render_row(entry, columns),
        CatalogRow::Unparsed { line, .. } => line.clone(),
    }
}

fn push_rows(out: &mut String, rows: &[CatalogRow], columns: &ColumnMap, terminated: bool) {
    if rows.is_empty() {
        return;
    }
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    for (idx, row) in rows.iter().enumerate() {
        out.push_str(&row_line(row, columns));
        if idx + 1 < rows.len() || terminated {
            out.push('\n');
        }
    }
}

fn push_new_table(out: &mut String, rows: &[CatalogRow]) {
    let columns = ColumnMap::canonical();
    out.push_str(&header_row(&columns));
    out.push('\n');
    out.push_str(&separator_row(&columns));
    out.push('\n');
    push_rows(out, rows, &columns, true);
}

/// Writes the catalog back to document text.
///
/// A parsed catalog with no added rows serializes to exactly the text it was
/// parsed from.
pub fn serialize(catalog: &Catalog) -> String {
    let mut out = String::with_capacity(
        catalog.prologue.len() + catalog.epilogue.len() + catalog.rows.len() * 160,
    );
    out.push_str(&catalog.prologue);

    match &catalog.layout {
        TableLayout::Table { columns } => {
            push_rows(&mut out, &catalog.rows, columns, catalog.body_terminated);
        }
        TableLayout::EmptySection if !catalog.rows.is_empty() => {
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push('\n');
            push_new_table(&mut out, &catalog.rows);
        }
        TableLayout::Missing if !catalog.rows.is_empty() => {
            if !out.is_empty() {
                if !out.ends_with('\n') {
                    out.push('\n');
                }
                out.push('\n');
            }
            out.push_str(&format!("## {}\n\n", catalog.heading));
            push_new_table(&mut out, &catalog.rows);
        }
        TableLayout::EmptySection | TableLayout::Missing => {}
    }

    out.push_str(&catalog.epilogue);
    out
}
