pub mod catalog;
pub mod entry;
pub mod paper;

pub use catalog::*;
pub use entry::*;
pub use paper::*;
