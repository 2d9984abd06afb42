pub mod diffuser;
pub mod generators;
pub mod loader;
pub mod reversible;

pub use self::diffuser::Diffuser;
pub use self::reversible::ReversibleDiffuser;

use crate::error::{HeuristicGenError, HgResult};
use std::collections::BTreeSet;

/// Immutable undirected graph with per-node activation thresholds.
///
/// Threshold is the majority rule `ceil(degree / 2)`. Nodes with threshold 0
/// (isolated nodes) are never reached by a cascade and must be seeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Graph {
    adjacency: Vec<BTreeSet<usize>>,
    degrees: Vec<usize>,
    thresholds: Vec<usize>,
    zero_threshold_nodes: Vec<usize>,
    edge_count: usize,
}

impl Graph {
    /// Builds from adjacency sets, rejecting asymmetric or looped input.
    pub fn new(adjacency: Vec<BTreeSet<usize>>) -> HgResult<Self> {
        let n = adjacency.len();
        for (u, neighbors) in adjacency.iter().enumerate() {
            for &v in neighbors {
                if v >= n {
                    return Err(HeuristicGenError::Validation(format!(
                        "Node {} has neighbor {} outside 0..{}",
                        u, v, n
                    )));
                }
                if v == u {
                    return Err(HeuristicGenError::Validation(format!(
                        "Node {} has a self-loop",
                        u
                    )));
                }
                if !adjacency[v].contains(&u) {
                    return Err(HeuristicGenError::Validation(format!(
                        "Edge {}-{} is not symmetric",
                        u, v
                    )));
                }
            }
        }
        Ok(Self::from_symmetric(adjacency))
    }

    /// Builds from an edge list; loops are dropped and duplicates merged.
    pub fn from_edges<I>(node_count: usize, edges: I) -> Self
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let mut adjacency = vec![BTreeSet::new(); node_count];
        for (u, v) in edges {
            debug_assert!(u < node_count && v < node_count);
            if u != v {
                adjacency[u].insert(v);
                adjacency[v].insert(u);
            }
        }
        Self::from_symmetric(adjacency)
    }

    pub(crate) fn from_symmetric(adjacency: Vec<BTreeSet<usize>>) -> Self {
        let degrees: Vec<usize> = adjacency.iter().map(BTreeSet::len).collect();
        let thresholds: Vec<usize> = degrees.iter().map(|&d| d.div_ceil(2)).collect();
        let zero_threshold_nodes = thresholds
            .iter()
            .enumerate()
            .filter(|&(_, &t)| t == 0)
            .map(|(i, _)| i)
            .collect();
        let edge_count = degrees.iter().sum::<usize>() / 2;

        Self {
            adjacency,
            degrees,
            thresholds,
            zero_threshold_nodes,
            edge_count,
        }
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn neighbors(&self, node: usize) -> &BTreeSet<usize> {
        &self.adjacency[node]
    }

    pub fn adjacency(&self) -> &[BTreeSet<usize>] {
        &self.adjacency
    }

    pub fn degrees(&self) -> &[usize] {
        &self.degrees
    }

    pub fn thresholds(&self) -> &[usize] {
        &self.thresholds
    }

    pub fn zero_threshold_nodes(&self) -> &[usize] {
        &self.zero_threshold_nodes
    }

    /// True if forward diffusion from `seeds` activates every node.
    pub fn is_target_set<I>(&self, seeds: I) -> bool
    where
        I: IntoIterator<Item = usize>,
    {
        Diffuser::new(self).activate_nodes(seeds).len() == self.node_count()
    }
}
