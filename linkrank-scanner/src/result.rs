use serde::{Deserialize, Serialize};
use std::fmt;

/// A directed link discovered while crawling: `source` links to `target`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.target)
    }
}

/// What a finished crawl leaves behind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrawlSummary {
    pub start_url: String,
    /// Edges in the order they were emitted.
    pub edges: Vec<Edge>,
    /// Pages marked visited, in visiting order. Includes pages whose fetch failed.
    pub visited: Vec<String>,
    pub failed_fetches: usize,
}

impl CrawlSummary {
    pub fn new(start_url: String) -> Self {
        Self {
            start_url,
            ..Self::default()
        }
    }

    pub fn edges_from<'a>(&'a self, source: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |edge| edge.source == source)
    }
}
