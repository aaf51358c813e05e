//! Directed link graph built from edge lists or crawl output.
//!
//! Adjacency is kept in both directions. Ordered collections keep iteration,
//! and therefore ranking, deterministic.

use crate::edgelist::parse_edge_line;
use linkrank_scanner::Edge;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Graph {
    out_adj: BTreeMap<String, BTreeSet<String>>,
    in_adj: BTreeMap<String, BTreeSet<String>>,
    vertices: BTreeSet<String>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from `source -> target` lines, skipping malformed ones.
    pub fn build<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut graph = Self::new();
        for line in lines {
            if let Some((source, target)) = parse_edge_line(line.as_ref()) {
                graph.add_edge(&source, &target);
            }
        }
        graph
    }

    pub fn from_edges<'a, I>(edges: I) -> Self
    where
        I: IntoIterator<Item = &'a Edge>,
    {
        let mut graph = Self::new();
        for edge in edges {
            graph.add_edge(&edge.source, &edge.target);
        }
        graph
    }

    /// Records `source -> target`. Returns `false` if the edge was already
    /// present or either side is empty.
    pub fn add_edge(&mut self, source: &str, target: &str) -> bool {
        if source.is_empty() || target.is_empty() {
            return false;
        }

        let inserted = self
            .out_adj
            .entry(source.to_string())
            .or_default()
            .insert(target.to_string());
        if inserted {
            self.in_adj
                .entry(target.to_string())
                .or_default()
                .insert(source.to_string());
        }

        self.vertices.insert(source.to_string());
        self.vertices.insert(target.to_string());
        inserted
    }

    /// Declares a vertex without any edges. Unless an edge later touches it,
    /// it stays isolated.
    pub fn add_vertex(&mut self, vertex: &str) -> bool {
        if vertex.is_empty() {
            return false;
        }
        self.vertices.insert(vertex.to_string())
    }

    pub fn vertices(&self) -> impl Iterator<Item = &str> {
        self.vertices.iter().map(String::as_str)
    }

    pub fn contains(&self, vertex: &str) -> bool {
        self.vertices.contains(vertex)
    }

    pub fn has_edge(&self, source: &str, target: &str) -> bool {
        self.out_adj
            .get(source)
            .is_some_and(|targets| targets.contains(target))
    }

    pub fn out_neighbors(&self, vertex: &str) -> impl Iterator<Item = &str> {
        self.out_adj
            .get(vertex)
            .into_iter()
            .flat_map(|targets| targets.iter().map(String::as_str))
    }

    pub fn in_neighbors(&self, vertex: &str) -> impl Iterator<Item = &str> {
        self.in_adj
            .get(vertex)
            .into_iter()
            .flat_map(|sources| sources.iter().map(String::as_str))
    }

    pub fn out_degree(&self, vertex: &str) -> usize {
        self.out_adj.get(vertex).map_or(0, BTreeSet::len)
    }

    pub fn in_degree(&self, vertex: &str) -> usize {
        self.in_adj.get(vertex).map_or(0, BTreeSet::len)
    }

    /// Vertices with no outbound edges: sinks and isolated vertices.
    pub fn dangling_vertices(&self) -> impl Iterator<Item = &str> {
        self.vertices
            .iter()
            .filter(|v| !self.out_adj.contains_key(v.as_str()))
            .map(String::as_str)
    }

    /// Vertices that take part in no edge at all.
    pub fn isolated(&self) -> BTreeSet<&str> {
        self.vertices
            .iter()
            .filter(|v| !self.out_adj.contains_key(v.as_str()) && !self.in_adj.contains_key(v.as_str()))
            .map(String::as_str)
            .collect()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.out_adj.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// All edges, ordered by source then target.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.out_adj.iter().flat_map(|(source, targets)| {
            targets
                .iter()
                .map(move |target| Edge::new(source.clone(), target.clone()))
        })
    }
}

impl<'a> Extend<&'a Edge> for Graph {
    fn extend<I: IntoIterator<Item = &'a Edge>>(&mut self, edges: I) {
        for edge in edges {
            self.add_edge(&edge.source, &edge.target);
        }
    }
}
