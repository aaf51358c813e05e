//! PageRank by power iteration.
//!
//! Every iteration reads only the previous iteration's scores, so updates are
//! synchronous. Mass held by dangling vertices (no outbound edges) is spread
//! evenly over all vertices, which keeps the scores summing to one.

use crate::graph::Graph;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

pub const DEFAULT_DAMPING: f64 = 0.85;
pub const DEFAULT_TOLERANCE: f64 = 1e-6;
pub const DEFAULT_MAX_ITERATIONS: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageRankConfig {
    /// Probability of following an outbound link rather than jumping.
    pub damping: f64,
    /// Largest per-vertex change still counted as converged.
    pub tolerance: f64,
    /// Safety cap against floating-point non-termination.
    pub max_iterations: usize,
}

impl Default for PageRankConfig {
    fn default() -> Self {
        Self {
            damping: DEFAULT_DAMPING,
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankEntry {
    pub vertex: String,
    pub score: f64,
}

/// Scores ordered by descending score, ties by ascending vertex id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankTable {
    entries: Vec<RankEntry>,
    iterations: usize,
    converged: bool,
}

impl RankTable {
    fn empty() -> Self {
        Self {
            entries: Vec::new(),
            iterations: 0,
            converged: true,
        }
    }

    pub fn entries(&self) -> &[RankEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &RankEntry> {
        self.entries.iter()
    }

    /// The first `n` entries, or all of them if there are fewer.
    pub fn top(&self, n: usize) -> &[RankEntry] {
        &self.entries[..n.min(self.entries.len())]
    }

    pub fn get(&self, vertex: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|entry| entry.vertex == vertex)
            .map(|entry| entry.score)
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|entry| entry.score).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// False only when the iteration cap was hit before the tolerance was met.
    pub fn converged(&self) -> bool {
        self.converged
    }
}

pub fn pagerank(graph: &Graph) -> RankTable {
    pagerank_with(graph, PageRankConfig::default())
}

/// Ranks every vertex of `graph`. An empty graph yields an empty table.
pub fn pagerank_with(graph: &Graph, config: PageRankConfig) -> RankTable {
    let ids: Vec<&str> = graph.vertices().collect();
    let n = ids.len();
    if n == 0 {
        debug!("Nothing to rank: graph has no vertices");
        return RankTable::empty();
    }

    let index: HashMap<&str, usize> = ids.iter().enumerate().map(|(i, v)| (*v, i)).collect();
    let inbound: Vec<Vec<usize>> = ids
        .iter()
        .map(|v| graph.in_neighbors(v).map(|u| index[u]).collect())
        .collect();
    let out_degree: Vec<f64> = ids.iter().map(|v| graph.out_degree(v) as f64).collect();
    let dangling: Vec<usize> = (0..n).filter(|&i| out_degree[i] == 0.0).collect();

    let count = n as f64;
    let damping = config.damping;
    let teleport = (1.0 - damping) / count;

    let mut prev = vec![1.0 / count; n];
    let mut next = vec![0.0; n];
    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iterations.max(1) {
        let dangling_mass: f64 = dangling.iter().map(|&i| prev[i]).sum();

        for (p, score) in next.iter_mut().enumerate() {
            let inbound_sum: f64 = inbound[p]
                .iter()
                .map(|&u| prev[u] / out_degree[u])
                .sum();
            *score = teleport + damping * (inbound_sum + dangling_mass / count);
        }
        iterations += 1;

        let delta = prev
            .iter()
            .zip(&next)
            .map(|(old, new)| (old - new).abs())
            .fold(0.0, f64::max);
        std::mem::swap(&mut prev, &mut next);

        if delta <= config.tolerance {
            converged = true;
            break;
        }
    }

    if converged {
        info!("PageRank converged after {} iterations over {} vertices", iterations, n);
    } else {
        warn!(
            "PageRank stopped at the {} iteration cap without meeting tolerance {}",
            iterations, config.tolerance
        );
    }

    let mut entries: Vec<RankEntry> = ids
        .into_iter()
        .zip(prev)
        .map(|(vertex, score)| RankEntry {
            vertex: vertex.to_string(),
            score,
        })
        .collect();
    entries.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.vertex.cmp(&b.vertex))
    });

    RankTable {
        entries,
        iterations,
        converged,
    }
}
