//! Directed weighted networks with per-node scores.
//!
//! [`NetworkBuilder`] collects a coordinate list of `(source, target, weight)`
//! entries against a fixed, pre-sized node set and produces an immutable
//! [`PlantedNetwork`] backed by a petgraph [`DiGraph`]. Node `i` of the
//! builder is always `NodeIndex::new(i)` of the graph, and entries are merged
//! and sorted before insertion, so the result does not depend on the order in
//! which edges were added.

use std::collections::BTreeMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

use crate::adjacency::AdjacencyMatrix;
use crate::error::{SpringRankError, ValidationError};

/// Node attributes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    /// Latent score the node was generated from.
    pub score: f64,
}

/// Edge attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeData {
    /// Number of sampled interactions `i -> j`.
    pub weight: u64,
}

/// Pre-sized builder for a [`PlantedNetwork`].
#[derive(Debug, Clone)]
pub struct NetworkBuilder {
    scores: Vec<f64>,
    entries: BTreeMap<(usize, usize), u64>,
}

impl NetworkBuilder {
    /// Start a network whose node `i` carries `scores[i]`.
    pub fn new(scores: Vec<f64>) -> Self {
        Self {
            scores,
            entries: BTreeMap::new(),
        }
    }

    /// Number of nodes.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.scores.len()
    }

    /// Add `weight` interactions from `source` to `target`.
    ///
    /// Zero weights are ignored; repeated pairs accumulate. Self-loops are
    /// kept.
    ///
    /// # Errors
    ///
    /// [`SpringRankError::InvalidInput`] if an endpoint is not a node.
    pub fn add_edge(&mut self, source: usize, target: usize, weight: u64) -> Result<(), SpringRankError> {
        let n = self.node_count();
        if source >= n || target >= n {
            return Err(ValidationError::IndexOutOfBounds {
                index: source.max(target),
                nodes: n,
            }
            .into());
        }
        if weight > 0 {
            *self.entries.entry((source, target)).or_insert(0) += weight;
        }
        Ok(())
    }

    /// Freeze into a [`PlantedNetwork`].
    pub fn build(self) -> PlantedNetwork {
        let mut graph = DiGraph::with_capacity(self.scores.len(), self.entries.len());
        for score in self.scores {
            graph.add_node(NodeData { score });
        }
        for ((source, target), weight) in self.entries {
            graph.add_edge(
                NodeIndex::new(source),
                NodeIndex::new(target),
                EdgeData { weight },
            );
        }
        PlantedNetwork { graph }
    }
}

/// Immutable directed weighted network with a `score` on every node.
#[derive(Debug, Clone)]
pub struct PlantedNetwork {
    graph: DiGraph<NodeData, EdgeData>,
}

impl PlantedNetwork {
    /// Number of nodes.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of distinct directed edges (including self-loops).
    #[inline]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Score of node `i`, if it exists.
    pub fn score(&self, i: usize) -> Option<f64> {
        self.graph.node_weight(NodeIndex::new(i)).map(|d| d.score)
    }

    /// Scores in node order.
    pub fn scores(&self) -> Vec<f64> {
        self.nodes().map(|(_, score)| score).collect()
    }

    /// Iterate over `(node, score)`.
    pub fn nodes(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.graph
            .node_indices()
            .map(move |idx| (idx.index(), self.graph[idx].score))
    }

    /// Iterate over `(source, target, weight)`.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize, u64)> + '_ {
        self.graph
            .edge_references()
            .map(|e| (e.source().index(), e.target().index(), e.weight().weight))
    }

    /// Sum of all edge weights.
    pub fn total_weight(&self) -> u64 {
        self.edges().map(|(_, _, w)| w).sum()
    }

    /// Total weight divided by the node count.
    pub fn average_out_degree(&self) -> f64 {
        match self.node_count() {
            0 => 0.0,
            n => self.total_weight() as f64 / n as f64,
        }
    }

    /// Weighted adjacency matrix for [`SpringRank`](crate::rank::SpringRank).
    ///
    /// # Errors
    ///
    /// [`SpringRankError::InvalidInput`] for an empty network.
    pub fn adjacency(&self) -> Result<AdjacencyMatrix, SpringRankError> {
        AdjacencyMatrix::from_edges(
            self.node_count(),
            self.edges().map(|(i, j, w)| (i, j, w as f64)),
        )
    }

    /// Borrow the underlying petgraph graph.
    #[inline]
    pub fn graph(&self) -> &DiGraph<NodeData, EdgeData> {
        &self.graph
    }

    /// Take the underlying petgraph graph.
    pub fn into_graph(self) -> DiGraph<NodeData, EdgeData> {
        self.graph
    }
}
