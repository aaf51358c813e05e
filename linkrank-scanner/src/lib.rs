pub mod crawler;
pub mod error;
pub mod extractor;
pub mod result;

pub use crawler::{Crawler, EdgeCallback, ProgressCallback};
pub use error::ScanError;
pub use result::{CrawlSummary, Edge};
