use super::TssHeuristic;
use crate::network::Graph;
use crate::pqueue::UpdatableMaxPriorityQueue;
use std::collections::BTreeSet;

/// TIP_DECOMP (Shakarian, Eyre & Paulo, 2013).
///
/// Starts from the whole vertex set and repeatedly discards the node with the
/// least slack `degree - threshold`. Removing a node costs each remaining
/// neighbor one unit of slack; neighbors out of slack are locked in.
/// Zero-threshold nodes are isolated and locked in from the start.
#[derive(Debug, Clone, Copy, Default)]
pub struct TipDecompHeuristic;

impl TssHeuristic for TipDecompHeuristic {
    fn find_target_set(&self, graph: &Graph) -> BTreeSet<usize> {
        let n = graph.node_count();
        let mut target_set: BTreeSet<usize> = (0..n).collect();
        let mut queue = UpdatableMaxPriorityQueue::new(n);

        // Max-queue on (threshold - degree) pops the minimum slack.
        for node in (0..n).filter(|&v| graph.thresholds()[v] > 0) {
            let dist = graph.thresholds()[node] as f64 - graph.degrees()[node] as f64;
            queue.enqueue_or_update(node, dist);
        }

        while let Some((node, _)) = queue.dequeue() {
            target_set.remove(&node);
            for &neighbor in graph.neighbors(node) {
                if let Some(dist) = queue.priority(neighbor) {
                    if dist < 0.0 {
                        queue.enqueue_or_update(neighbor, dist + 1.0);
                    } else {
                        queue.remove(neighbor);
                    }
                }
            }
        }

        target_set
    }
}
