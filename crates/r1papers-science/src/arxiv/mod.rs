pub mod client;
pub mod feed;
pub mod parser;
pub mod types;

pub use client::ArxivClient;
pub use feed::{ArxivFeed, dedup_batch, select_candidates};
pub use types::{ArxivEntry, ArxivSearchQuery};
