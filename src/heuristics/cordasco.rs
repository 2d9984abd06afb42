//! The two Cordasco et al. greedy algorithms.
//!
//! - C-TSS: "Discovering small target sets in social networks: a fast and
//!   effective algorithm", Algorithmica 80 (2018).
//! - MTS: "On finding small sets that influence large networks",
//!   Social Network Analysis and Mining 6 (2016).
//!
//! Both process the undecided set U with three cases in order: a node with no
//! residual threshold is removed for free, a node that cannot be satisfied by
//! its remaining neighbors is seeded, otherwise the node maximising
//! `k / (delta * (delta + 1))` is discarded. Isolated nodes start out seeded,
//! since no cascade can reach them.

use super::TssHeuristic;
use crate::network::Graph;
use crate::pqueue::UpdatableMaxPriorityQueue;
use std::collections::BTreeSet;

fn removal_priority(k: isize, delta: isize) -> f64 {
    if delta <= 0 {
        return if k > 0 { f64::INFINITY } else { 0.0 };
    }
    k as f64 / (delta * (delta + 1)) as f64
}

struct ResidualState {
    ks: Vec<isize>,
    deltas: Vec<isize>,
    in_u: Vec<bool>,
    u_count: usize,
    // Only MTS ever sets these.
    in_l: Vec<bool>,
    zero_k: BTreeSet<usize>,
    delta_less_k: BTreeSet<usize>,
    queue: UpdatableMaxPriorityQueue,
}

impl ResidualState {
    fn new(graph: &Graph) -> Self {
        let n = graph.node_count();
        let ks: Vec<isize> = graph.thresholds().iter().map(|&t| t as isize).collect();
        let deltas: Vec<isize> = graph.degrees().iter().map(|&d| d as isize).collect();
        let mut queue = UpdatableMaxPriorityQueue::new(n);
        let mut zero_k = BTreeSet::new();
        let mut delta_less_k = BTreeSet::new();

        for node in 0..n {
            if ks[node] == 0 {
                zero_k.insert(node);
            }
            if deltas[node] < ks[node] {
                delta_less_k.insert(node);
            }
            queue.enqueue_or_update(node, removal_priority(ks[node], deltas[node]));
        }

        Self {
            ks,
            deltas,
            in_u: vec![true; n],
            u_count: n,
            in_l: vec![false; n],
            zero_k,
            delta_less_k,
            queue,
        }
    }

    fn is_candidate(&self, node: usize) -> bool {
        self.in_u[node] && !self.in_l[node]
    }

    fn leave_u(&mut self, node: usize) {
        if self.in_u[node] {
            self.in_u[node] = false;
            self.u_count -= 1;
        }
        self.queue.remove(node);
    }

    fn maintain(&mut self, node: usize) {
        let k = self.ks[node];
        let delta = self.deltas[node];

        if k == 0 {
            self.zero_k.insert(node);
        } else {
            self.zero_k.remove(&node);
        }

        if delta < k {
            self.delta_less_k.insert(node);
        } else {
            self.delta_less_k.remove(&node);
        }

        if self.is_candidate(node) {
            self.queue
                .enqueue_or_update(node, removal_priority(k, delta));
        } else {
            self.queue.remove(node);
        }
    }

    fn pop_zero_k(&mut self) -> Option<usize> {
        while let Some(v) = self.zero_k.pop_first() {
            if self.in_u[v] {
                return Some(v);
            }
        }
        None
    }

    fn pop_delta_less_k(&mut self) -> Option<usize> {
        while let Some(v) = self.delta_less_k.pop_first() {
            if self.is_candidate(v) {
                return Some(v);
            }
        }
        None
    }

    fn pop_max_priority(&mut self) -> Option<usize> {
        while let Some((v, _)) = self.queue.dequeue() {
            if self.is_candidate(v) {
                return Some(v);
            }
        }
        None
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CgmrvTssHeuristic;

impl TssHeuristic for CgmrvTssHeuristic {
    fn find_target_set(&self, graph: &Graph) -> BTreeSet<usize> {
        let mut state = ResidualState::new(graph);
        let mut target_set: BTreeSet<usize> = graph.zero_threshold_nodes().iter().copied().collect();
        let mut inactive_neighbors: Vec<BTreeSet<usize>> = graph.adjacency().to_vec();

        while state.u_count > 0 {
            if let Some(v) = state.pop_zero_k() {
                for neighbor in std::mem::take(&mut inactive_neighbors[v]) {
                    state.ks[neighbor] = (state.ks[neighbor] - 1).max(0);
                    state.deltas[neighbor] -= 1;
                    inactive_neighbors[neighbor].remove(&v);
                    state.maintain(neighbor);
                }
                state.leave_u(v);
                continue;
            }

            if let Some(v) = state.pop_delta_less_k() {
                target_set.insert(v);
                for neighbor in std::mem::take(&mut inactive_neighbors[v]) {
                    state.ks[neighbor] = (state.ks[neighbor] - 1).max(0);
                    state.deltas[neighbor] -= 1;
                    inactive_neighbors[neighbor].remove(&v);
                    state.maintain(neighbor);
                }
                state.leave_u(v);
                continue;
            }

            let Some(v) = state.pop_max_priority() else {
                break;
            };
            for neighbor in std::mem::take(&mut inactive_neighbors[v]) {
                state.deltas[neighbor] -= 1;
                inactive_neighbors[neighbor].remove(&v);
                state.maintain(neighbor);
            }
            state.leave_u(v);
        }

        target_set
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CgrMtsHeuristic;

impl TssHeuristic for CgrMtsHeuristic {
    fn find_target_set(&self, graph: &Graph) -> BTreeSet<usize> {
        let mut state = ResidualState::new(graph);
        let mut target_set: BTreeSet<usize> = graph.zero_threshold_nodes().iter().copied().collect();

        while state.u_count > 0 {
            if let Some(v) = state.pop_zero_k() {
                let v_not_in_l = !state.in_l[v];
                for &neighbor in graph.neighbors(v) {
                    if state.in_u[neighbor] {
                        state.ks[neighbor] = (state.ks[neighbor] - 1).max(0);
                        if v_not_in_l {
                            state.deltas[neighbor] -= 1;
                        }
                        state.maintain(neighbor);
                    }
                }
                state.leave_u(v);
                continue;
            }

            if let Some(v) = state.pop_delta_less_k() {
                target_set.insert(v);
                for &neighbor in graph.neighbors(v) {
                    if state.in_u[neighbor] {
                        state.ks[neighbor] = (state.ks[neighbor] - 1).max(0);
                        state.deltas[neighbor] -= 1;
                        state.maintain(neighbor);
                    }
                }
                state.leave_u(v);
                continue;
            }

            let Some(v) = state.pop_max_priority() else {
                break;
            };
            for &neighbor in graph.neighbors(v) {
                if state.in_u[neighbor] {
                    state.deltas[neighbor] -= 1;
                    state.maintain(neighbor);
                }
            }
            state.in_l[v] = true;
            state.queue.remove(v);
        }

        target_set
    }
}
