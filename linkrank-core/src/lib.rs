pub mod crawl;
pub mod edgelist;
pub mod error;
pub mod graph;
pub mod rank;
pub mod report;

pub use crawl::{CrawlOptions, CrawlOutcome, CrawlParams, execute_crawl, rank_edge_list};
pub use error::CoreError;
pub use graph::Graph;
pub use rank::{PageRankConfig, RankEntry, RankTable, pagerank, pagerank_with};
