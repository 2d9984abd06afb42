use super::Graph;
use std::collections::VecDeque;

/// Forward threshold cascade. Activation is permanent.
pub struct Diffuser<'g> {
    graph: &'g Graph,
    is_active: Vec<bool>,
    active_neighbor_counts: Vec<usize>,
}

impl<'g> Diffuser<'g> {
    pub fn new(graph: &'g Graph) -> Self {
        let n = graph.node_count();
        Self {
            graph,
            is_active: vec![false; n],
            active_neighbor_counts: vec![0; n],
        }
    }

    pub fn graph(&self) -> &'g Graph {
        self.graph
    }

    pub fn is_active(&self, node: usize) -> bool {
        self.is_active[node]
    }

    pub fn active_neighbor_counts(&self) -> &[usize] {
        &self.active_neighbor_counts
    }

    pub fn activate_node(&mut self, node: usize) -> Vec<usize> {
        self.activate_nodes([node])
    }

    /// Activates the seeds and runs the cascade to its fixpoint.
    /// Returns every node activated by this call, seeds included.
    pub fn activate_nodes<I>(&mut self, seeds: I) -> Vec<usize>
    where
        I: IntoIterator<Item = usize>,
    {
        let mut queue = VecDeque::new();
        let mut activated = Vec::new();

        for seed in seeds {
            if !self.is_active[seed] {
                self.is_active[seed] = true;
                queue.push_back(seed);
                activated.push(seed);
            }
        }

        let thresholds = self.graph.thresholds();
        while let Some(node) = queue.pop_front() {
            for &neighbor in self.graph.neighbors(node) {
                self.active_neighbor_counts[neighbor] += 1;
                if !self.is_active[neighbor]
                    && self.active_neighbor_counts[neighbor] >= thresholds[neighbor]
                {
                    self.is_active[neighbor] = true;
                    queue.push_back(neighbor);
                    activated.push(neighbor);
                }
            }
        }

        activated
    }
}
