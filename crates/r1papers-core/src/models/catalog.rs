use chrono::NaiveDate;
use thiserror::Error;

use crate::models::entry::CatalogEntry;

pub const DEFAULT_HEADING: &str = "Papers";

/// Columns of the catalog table, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Paper,
    Code,
    Models,
    Dataset,
    ProjectPage,
    Date,
}

impl Column {
    pub const CANONICAL: [Column; 6] = [
        Column::Paper,
        Column::Code,
        Column::Models,
        Column::Dataset,
        Column::ProjectPage,
        Column::Date,
    ];

    pub fn header_name(&self) -> &'static str {
        match self {
            Self::Paper => "Paper",
            Self::Code => "Code",
            Self::Models => "Models",
            Self::Dataset => "Dataset",
            Self::ProjectPage => "Project Page",
            Self::Date => "Date",
        }
    }

    pub fn from_header(cell: &str) -> Option<Self> {
        let cell = cell.trim();
        Self::CANONICAL
            .into_iter()
            .find(|column| column.header_name().eq_ignore_ascii_case(cell))
    }
}

/// Position of every known column inside a table row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    order: Vec<Option<Column>>,
}

impl ColumnMap {
    pub fn canonical() -> Self {
        Self {
            order: Column::CANONICAL.into_iter().map(Some).collect(),
        }
    }

    /// Builds the map from header cells. Returns `None` unless every known
    /// column appears exactly once.
    pub fn from_header<'a, I>(cells: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let order: Vec<Option<Column>> = cells.into_iter().map(Column::from_header).collect();
        let complete = Column::CANONICAL
            .iter()
            .all(|column| order.iter().filter(|c| c.as_ref() == Some(column)).count() == 1);
        complete.then_some(Self { order })
    }

    pub fn width(&self) -> usize {
        self.order.len()
    }

    pub fn position(&self, column: Column) -> Option<usize> {
        self.order.iter().position(|c| *c == Some(column))
    }

    pub fn columns(&self) -> impl Iterator<Item = Option<Column>> + '_ {
        self.order.iter().copied()
    }
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self::canonical()
    }
}

/// Where the catalog table sits in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableLayout {
    /// A header row was found; rows follow its column order.
    Table { columns: ColumnMap },
    /// The section heading exists but has no table under it.
    EmptySection,
    /// No section at all; a new one is appended when rows are added.
    Missing,
}

/// Why a table row could not be read as a catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowIssue {
    #[error("expected {expected} cells, found {found}")]
    CellCount { expected: usize, found: usize },

    #[error("paper cell is not a [title](url) link")]
    TitleCell,

    #[error("invalid date cell: {0}")]
    Date(String),

    #[error("repeated header row")]
    Header,

    #[error("separator row")]
    Separator,
}

impl RowIssue {
    /// Issues that indicate a damaged row rather than table furniture.
    pub fn is_structural(&self) -> bool {
        !matches!(self, Self::Header | Self::Separator)
    }
}

/// One line of the table body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogRow {
    Entry {
        entry: CatalogEntry,
        /// The line this entry was parsed from; re-emitted verbatim.
        source: Option<String>,
    },
    Unparsed {
        line: String,
        issue: RowIssue,
    },
}

impl CatalogRow {
    pub fn new_entry(entry: CatalogEntry) -> Self {
        Self::Entry {
            entry,
            source: None,
        }
    }

    pub fn entry(&self) -> Option<&CatalogEntry> {
        match self {
            Self::Entry { entry, .. } => Some(entry),
            Self::Unparsed { .. } => None,
        }
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.entry().map(|entry| entry.date)
    }
}

/// The parsed catalog document: table rows plus the untouched text around
/// them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    /// Section heading text (`## <heading>`) the table lives under.
    pub heading: String,
    pub prologue: String,
    pub rows: Vec<CatalogRow>,
    pub epilogue: String,
    pub layout: TableLayout,
    /// Whether the last source row ended with a line break.
    pub(crate) body_terminated: bool,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            heading: DEFAULT_HEADING.to_string(),
            prologue: String::new(),
            rows: Vec::new(),
            epilogue: String::new(),
            layout: TableLayout::Missing,
            body_terminated: true,
        }
    }
}

impl Catalog {
    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> + '_ {
        self.rows.iter().filter_map(CatalogRow::entry)
    }

    /// Entries that take part in duplicate matching.
    pub fn matchable_entries(&self) -> impl Iterator<Item = &CatalogEntry> + '_ {
        self.entries().filter(|entry| entry.is_matchable())
    }

    pub fn issues(&self) -> impl Iterator<Item = (&str, &RowIssue)> + '_ {
        self.rows.iter().filter_map(|row| match row {
            CatalogRow::Unparsed { line, issue } => Some((line.as_str(), issue)),
            CatalogRow::Entry { .. } => None,
        })
    }

    pub fn entry_count(&self) -> usize {
        self.entries().count()
    }

    pub fn has_table(&self) -> bool {
        matches!(self.layout, TableLayout::Table { .. })
    }

    pub fn find_by_id(&self, id: &str) -> Option<&CatalogEntry> {
        self.entries().find(|entry| entry.id.as_deref() == Some(id))
    }

    /// True when every dated row is no newer than the one before it.
    pub fn is_sorted_by_date_desc(&self) -> bool {
        let dates: Vec<NaiveDate> = self.rows.iter().filter_map(CatalogRow::date).collect();
        dates.windows(2).all(|pair| pair[0] >= pair[1])
    }
}
