use super::solution::Solution;
use crate::pqueue::UpdatableMaxPriorityQueue;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Smallest capacity a population is built with.
pub const MIN_CAPACITY: usize = 8;

/// Outcome of [`Population::try_add`].
#[derive(Debug, Clone)]
pub enum Admission {
    Rejected,
    Inserted,
    /// The candidate took over a slot; the previous occupant is returned.
    Replaced {
        ejected: Arc<Solution>,
        cost_vector: Vec<usize>,
        fitness: f64,
    },
}

impl Admission {
    pub fn is_accepted(&self) -> bool {
        !matches!(self, Admission::Rejected)
    }
}

/// Bounded elite set with one slot per distinct cost vector.
#[derive(Debug, Clone)]
pub struct Population {
    capacity: usize,
    solutions: Vec<Arc<Solution>>,
    cost_vectors: Vec<Vec<usize>>,
    fitnesses: Vec<f64>,
    slot_of: HashMap<Vec<usize>, usize>,
    /// Keyed by negative fitness, so the head is the worst occupant.
    eviction_queue: UpdatableMaxPriorityQueue,
}

/// Higher fitness wins; equal fitness goes to the shorter program.
fn is_better(fitness: f64, length: usize, rival_fitness: f64, rival_length: usize) -> bool {
    match fitness.total_cmp(&rival_fitness) {
        Ordering::Greater => true,
        Ordering::Equal => length < rival_length,
        Ordering::Less => false,
    }
}

impl Population {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(MIN_CAPACITY);
        Self {
            capacity,
            solutions: Vec::with_capacity(capacity),
            cost_vectors: Vec::with_capacity(capacity),
            fitnesses: Vec::with_capacity(capacity),
            slot_of: HashMap::with_capacity(capacity),
            eviction_queue: UpdatableMaxPriorityQueue::new(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.solutions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solutions.is_empty()
    }

    pub fn solutions(&self) -> &[Arc<Solution>] {
        &self.solutions
    }

    pub fn cost_vectors(&self) -> &[Vec<usize>] {
        &self.cost_vectors
    }

    pub fn fitnesses(&self) -> &[f64] {
        &self.fitnesses
    }

    pub fn clear(&mut self) {
        self.solutions.clear();
        self.cost_vectors.clear();
        self.fitnesses.clear();
        self.slot_of.clear();
        self.eviction_queue.clear();
    }

    /// Offers a candidate.
    ///
    /// A new cost vector fills a free slot, or at capacity competes with the
    /// worst occupant. A known cost vector competes with the occupant holding
    /// it. Either way the candidate must be strictly better to get in.
    pub fn try_add(&mut self, solution: Arc<Solution>, cost_vector: Vec<usize>, fitness: f64) -> Admission {
        let (slot, duplicate) = match self.slot_of.get(&cost_vector) {
            Some(&slot) => (slot, true),
            None if self.len() < self.capacity => {
                let slot = self.len();
                debug!(
                    "Admitted a program of length {} into slot {} (fitness {:.4})",
                    solution.program_length(),
                    slot,
                    fitness
                );
                self.slot_of.insert(cost_vector.clone(), slot);
                self.solutions.push(solution);
                self.cost_vectors.push(cost_vector);
                self.fitnesses.push(fitness);
                self.eviction_queue.enqueue_or_update(slot, -fitness);
                return Admission::Inserted;
            }
            None => match self.eviction_queue.peek() {
                Some((slot, _)) => (slot, false),
                None => return Admission::Rejected,
            },
        };

        let rival = &self.solutions[slot];
        if !is_better(
            fitness,
            solution.program_length(),
            self.fitnesses[slot],
            rival.program_length(),
        ) {
            debug!(
                "Rejected a program of length {} (fitness {:.4}): {} in slot {} has fitness {:.4} and length {}",
                solution.program_length(),
                fitness,
                if duplicate { "the duplicate" } else { "the worst occupant" },
                slot,
                self.fitnesses[slot],
                rival.program_length()
            );
            return Admission::Rejected;
        }

        let ejected = std::mem::replace(&mut self.solutions[slot], solution);
        let old_cost = std::mem::replace(&mut self.cost_vectors[slot], cost_vector.clone());
        let old_fitness = std::mem::replace(&mut self.fitnesses[slot], fitness);
        self.slot_of.remove(&old_cost);
        self.slot_of.insert(cost_vector, slot);
        self.eviction_queue.enqueue_or_update(slot, -fitness);
        debug!(
            "{} slot {}: fitness {:.4} -> {:.4}, length {} -> {}",
            if duplicate { "Replaced the duplicate in" } else { "Evicted the worst occupant of" },
            slot,
            old_fitness,
            fitness,
            ejected.program_length(),
            self.solutions[slot].program_length()
        );

        Admission::Replaced {
            ejected,
            cost_vector: old_cost,
            fitness: old_fitness,
        }
    }

    /// Index of the fittest solution; ties go to the shorter program.
    pub fn best_index(&self) -> Option<usize> {
        (0..self.len()).reduce(|best, i| {
            if is_better(
                self.fitnesses[i],
                self.solutions[i].program_length(),
                self.fitnesses[best],
                self.solutions[best].program_length(),
            ) {
                i
            } else {
                best
            }
        })
    }

    pub fn best(&self) -> Option<(&Arc<Solution>, f64)> {
        self.best_index().map(|i| (&self.solutions[i], self.fitnesses[i]))
    }

    pub fn average_fitness(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        self.fitnesses.iter().sum::<f64>() / self.len() as f64
    }

    /// Slot indices ordered best first.
    pub fn ranking(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by(|&a, &b| {
            self.fitnesses[b].total_cmp(&self.fitnesses[a]).then_with(|| {
                self.solutions[a]
                    .program_length()
                    .cmp(&self.solutions[b].program_length())
            })
        });
        order
    }

    /// Current occupants, cheap to hand to a checkpoint.
    pub fn snapshot(&self) -> Vec<Arc<Solution>> {
        self.solutions.clone()
    }
}
