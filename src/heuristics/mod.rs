//! Hand-written Target Set Selection heuristics and target-set pruners.
//!
//! These serve as the evaluation baseline for evolved programs and as the
//! reference field in the `benchmark` command.

pub mod cordasco;
pub mod max_degree;
pub mod pruning;
pub mod tip_decomp;

pub use self::cordasco::{CgmrvTssHeuristic, CgrMtsHeuristic};
pub use self::max_degree::MaxDegreeHeuristic;
pub use self::pruning::{
    min_degree_fast_prune, min_degree_prune, shapley_prune, PruneRecord, ShapleyOutcome,
};
pub use self::tip_decomp::TipDecompHeuristic;

use crate::network::Graph;
use std::collections::BTreeSet;

pub trait TssHeuristic: Send + Sync {
    fn find_target_set(&self, graph: &Graph) -> BTreeSet<usize>;
}

/// Size of the pruned max-degree target set; the fitness baseline per graph.
pub fn baseline_cost(graph: &Graph) -> usize {
    let target_set = MaxDegreeHeuristic.find_target_set(graph);
    min_degree_prune(graph, &target_set).len()
}
