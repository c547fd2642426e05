//! The markdown catalog: cell grammar, parsing and writing.

pub mod format;
pub mod parser;
pub mod writer;

pub use format::bootstrap_document;
pub use parser::{CatalogParser, parse};
pub use writer::{merge, render_row, serialize};
