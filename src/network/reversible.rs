use super::Graph;
use crate::error::{HeuristicGenError, HgResult};
use std::collections::{BTreeSet, VecDeque};

#[derive(Debug, Clone)]
struct VoteNode {
    threshold: usize,
    // Sorted by id so a reverse lookup is a binary search.
    neighbors: Vec<usize>,
    voted_for: Vec<bool>,
    is_active: bool,
    votes_received: usize,
    was_directly_activated: bool,
}

/// Vote-counting diffuser that can undo a direct activation.
///
/// Every active node casts one vote per incident edge towards neighbors that
/// were inactive when it activated. Undoing a seed withdraws votes along the
/// cascade it supported, then lets the deactivated nodes ask their remaining
/// active neighbors for votes. Votes never support a zero-threshold node, so
/// such a node is active only while it is a direct activation.
#[derive(Debug, Clone)]
pub struct ReversibleDiffuser {
    nodes: Vec<VoteNode>,
}

impl ReversibleDiffuser {
    pub fn new(graph: &Graph) -> Self {
        let nodes = (0..graph.node_count())
            .map(|id| {
                let neighbors: Vec<usize> = graph.neighbors(id).iter().copied().collect();
                VoteNode {
                    threshold: graph.thresholds()[id],
                    voted_for: vec![false; neighbors.len()],
                    neighbors,
                    is_active: false,
                    votes_received: 0,
                    was_directly_activated: false,
                }
            })
            .collect();
        Self { nodes }
    }

    pub fn is_active(&self, id: usize) -> bool {
        self.nodes[id].is_active
    }

    pub fn was_directly_activated(&self, id: usize) -> bool {
        self.nodes[id].was_directly_activated
    }

    pub fn active_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_active).count()
    }

    pub fn active_nodes(&self) -> BTreeSet<usize> {
        (0..self.nodes.len())
            .filter(|&id| self.nodes[id].is_active)
            .collect()
    }

    /// Marks `id` as a direct activation and propagates.
    /// Returns the ids that switched from inactive to active.
    pub fn activate_node(&mut self, id: usize) -> Vec<usize> {
        let was_active = self.nodes[id].is_active;
        self.nodes[id].was_directly_activated = true;
        let mut activated = self.propagate_activation(id);
        if was_active && activated.first() == Some(&id) {
            activated.remove(0);
        }
        activated
    }

    /// Reverts a direct activation. Returns the nodes that ended up inactive.
    pub fn undo_activation(&mut self, id: usize) -> HgResult<Vec<usize>> {
        if !self.nodes[id].was_directly_activated {
            return Err(HeuristicGenError::InvalidOperation(format!(
                "Node {} was not directly activated",
                id
            )));
        }

        self.nodes[id].was_directly_activated = false;
        let deactivated = self.propagate_vote_withdrawal(id);

        let mut reactivated = BTreeSet::new();
        for &node in &deactivated {
            if !reactivated.contains(&node) && self.solicit_votes(node) {
                reactivated.extend(self.propagate_activation(node));
            }
        }

        Ok(deactivated
            .into_iter()
            .filter(|node| !reactivated.contains(node))
            .collect())
    }

    fn propagate_activation(&mut self, id: usize) -> Vec<usize> {
        let mut queue = VecDeque::new();
        let mut activated = Vec::new();

        if self.nodes[id].was_directly_activated || self.is_supported(id) {
            self.nodes[id].is_active = true;
            queue.push_back(id);
            activated.push(id);
        }

        while let Some(current) = queue.pop_front() {
            for index in 0..self.nodes[current].neighbors.len() {
                let neighbor = self.nodes[current].neighbors[index];
                if self.nodes[neighbor].is_active {
                    continue;
                }
                if self.vote_for(current, index) && self.is_supported(neighbor) {
                    self.nodes[neighbor].is_active = true;
                    queue.push_back(neighbor);
                    activated.push(neighbor);
                }
            }
        }

        activated
    }

    fn propagate_vote_withdrawal(&mut self, id: usize) -> Vec<usize> {
        let mut queue = VecDeque::new();
        let mut deactivated = Vec::new();

        if self.loses_support(id) {
            self.nodes[id].is_active = false;
            queue.push_back(id);
            deactivated.push(id);
        }

        while let Some(current) = queue.pop_front() {
            for index in 0..self.nodes[current].neighbors.len() {
                let neighbor = self.nodes[current].neighbors[index];
                if self.withdraw_vote_for(current, index) && self.loses_support(neighbor) {
                    self.nodes[neighbor].is_active = false;
                    queue.push_back(neighbor);
                    deactivated.push(neighbor);
                }
            }
        }

        deactivated
    }

    /// Asks active neighbors for missing votes. True once the threshold is met.
    fn solicit_votes(&mut self, id: usize) -> bool {
        for index in 0..self.nodes[id].neighbors.len() {
            let neighbor = self.nodes[id].neighbors[index];
            if !self.nodes[neighbor].is_active {
                continue;
            }
            let Ok(back_index) = self.nodes[neighbor].neighbors.binary_search(&id) else {
                continue;
            };
            if self.vote_for(neighbor, back_index) && self.is_supported(id) {
                return true;
            }
        }
        false
    }

    fn is_supported(&self, id: usize) -> bool {
        let node = &self.nodes[id];
        node.threshold > 0 && node.votes_received >= node.threshold
    }

    fn loses_support(&self, id: usize) -> bool {
        let node = &self.nodes[id];
        node.is_active && !node.was_directly_activated && !self.is_supported(id)
    }

    fn vote_for(&mut self, voter: usize, index: usize) -> bool {
        if self.nodes[voter].voted_for[index] {
            return false;
        }
        self.nodes[voter].voted_for[index] = true;
        let target = self.nodes[voter].neighbors[index];
        self.nodes[target].votes_received += 1;
        true
    }

    fn withdraw_vote_for(&mut self, voter: usize, index: usize) -> bool {
        if !self.nodes[voter].voted_for[index] {
            return false;
        }
        self.nodes[voter].voted_for[index] = false;
        let target = self.nodes[voter].neighbors[index];
        self.nodes[target].votes_received -= 1;
        true
    }
}
