use crate::error::{HeuristicGenError, HgResult};
use crate::network::{Diffuser, Graph, ReversibleDiffuser};
use serde::Serialize;
use std::collections::BTreeSet;

/// Target-set nodes ordered by ascending degree, ties by id.
fn by_ascending_degree(graph: &Graph, target_set: &BTreeSet<usize>) -> Vec<usize> {
    let mut nodes: Vec<usize> = target_set.iter().copied().collect();
    nodes.sort_by_key(|&v| graph.degrees()[v]);
    nodes
}

/// Reverse-MDG (Doerr, Krejca & Vu, GECCO 2024).
///
/// Tries to drop each seed in ascending degree order, keeping it only when
/// the remaining seeds no longer activate the whole graph. Each check re-runs
/// the forward cascade.
pub fn min_degree_prune(graph: &Graph, target_set: &BTreeSet<usize>) -> BTreeSet<usize> {
    let mut pruned = target_set.clone();
    for node in by_ascending_degree(graph, target_set) {
        pruned.remove(&node);
        if !graph.is_target_set(pruned.iter().copied()) {
            pruned.insert(node);
        }
    }
    pruned
}

/// Same decisions as [`min_degree_prune`], driven by a [`ReversibleDiffuser`]
/// so every candidate removal is an incremental undo.
pub fn min_degree_fast_prune(
    graph: &Graph,
    target_set: &BTreeSet<usize>,
) -> HgResult<BTreeSet<usize>> {
    if !graph.is_target_set(target_set.iter().copied()) {
        return Err(HeuristicGenError::Validation(
            "Given set is not a valid target set".to_string(),
        ));
    }

    let nodes = by_ascending_degree(graph, target_set);
    let mut pruned = target_set.clone();
    let mut diffuser = ReversibleDiffuser::new(graph);
    for &node in nodes.iter().rev() {
        diffuser.activate_node(node);
    }

    for &node in &nodes {
        let deactivated = diffuser.undo_activation(node)?;
        if deactivated.is_empty() {
            pruned.remove(&node);
        } else {
            diffuser.activate_node(node);
        }
    }

    Ok(pruned)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PruneRecord {
    pub target_set_size: usize,
    pub round: usize,
}

#[derive(Debug, Clone)]
pub struct ShapleyOutcome {
    pub trace: Vec<PruneRecord>,
    pub target_set: BTreeSet<usize>,
    pub deflation_factor: f64,
}

/// Crude-Shapley pruning, trying every deflation factor and keeping the smallest result.
///
/// Each round replays the seeds in order of accumulated marginal
/// contribution, keeps only those that still activate something new, and
/// credits each kept seed with the size of its cascade.
pub fn shapley_prune(
    graph: &Graph,
    target_set: &BTreeSet<usize>,
    rounds: usize,
    deflation_factors: &[f64],
) -> ShapleyOutcome {
    let mut best = ShapleyOutcome {
        trace: Vec::new(),
        target_set: target_set.clone(),
        deflation_factor: 0.0,
    };

    for &factor in deflation_factors {
        let (trace, pruned) = shapley_prune_with(graph, target_set, rounds, factor);
        if pruned.len() <= best.target_set.len() {
            best = ShapleyOutcome {
                trace,
                target_set: pruned,
                deflation_factor: factor,
            };
        }
    }

    best
}

fn shapley_prune_with(
    graph: &Graph,
    target_set: &BTreeSet<usize>,
    rounds: usize,
    deflation_factor: f64,
) -> (Vec<PruneRecord>, BTreeSet<usize>) {
    let n = graph.node_count();
    let degrees = graph.degrees();
    let mut values = vec![0.0f64; n];
    let mut tie_breakers = vec![0usize; n];
    let mut nodes: Vec<usize> = target_set.iter().copied().collect();
    let mut smallest = target_set.clone();

    let mut trace = vec![PruneRecord {
        target_set_size: smallest.len(),
        round: 0,
    }];

    for round in 1..=rounds {
        nodes.sort_by(|&u, &v| {
            values[v]
                .total_cmp(&values[u])
                .then_with(|| degrees[v].cmp(&degrees[u]))
                .then_with(|| tie_breakers[v].cmp(&tie_breakers[u]))
        });

        let mut diffuser = Diffuser::new(graph);
        let mut pruned = BTreeSet::new();
        let mut activated_count = 0;
        for &node in &nodes {
            if !diffuser.is_active(node) {
                let newly = diffuser.activate_node(node);
                activated_count += newly.len();
                values[node] += newly.len() as f64;
                pruned.insert(node);
            }
            if activated_count == n {
                break;
            }
        }

        if pruned.len() < smallest.len() {
            smallest = pruned;
            for (rank, &node) in nodes.iter().enumerate() {
                tie_breakers[node] = nodes.len() - rank;
                values[node] *= deflation_factor;
            }
        }

        trace.push(PruneRecord {
            target_set_size: smallest.len(),
            round,
        });
    }

    (trace, smallest)
}
