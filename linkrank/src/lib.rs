pub mod commands;
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{deliver_report, expand_path, parse_report_format};

// Re-export crawl functionality from linkrank-core
pub use linkrank_core::crawl::{CrawlOptions, CrawlProgressCallback, execute_crawl, rank_edge_list};
pub use linkrank_core::report::{RankReport, ReportFormat, format_rank_line};
