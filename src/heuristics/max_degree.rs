use super::TssHeuristic;
use crate::network::{Diffuser, Graph};
use crate::pqueue::UpdatableMaxPriorityQueue;
use std::collections::BTreeSet;

/// Greedily seeds the highest-degree inactive node until the cascade covers the graph.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaxDegreeHeuristic;

impl TssHeuristic for MaxDegreeHeuristic {
    fn find_target_set(&self, graph: &Graph) -> BTreeSet<usize> {
        let n = graph.node_count();
        let mut target_set = BTreeSet::new();
        let mut diffuser = Diffuser::new(graph);
        let mut inactive_count = n;

        let zero = graph.zero_threshold_nodes();
        if !zero.is_empty() {
            target_set.extend(zero.iter().copied());
            inactive_count -= diffuser.activate_nodes(zero.iter().copied()).len();
        }

        let mut queue = UpdatableMaxPriorityQueue::new(n);
        for node in (0..n).filter(|&v| !diffuser.is_active(v)) {
            queue.enqueue_or_update(node, graph.degrees()[node] as f64);
        }

        while inactive_count > 0 {
            let Some((node, _)) = queue.dequeue() else {
                break;
            };
            target_set.insert(node);
            let activated = diffuser.activate_node(node);
            inactive_count -= activated.len();
            for v in activated {
                queue.remove(v);
            }
        }

        target_set
    }
}
