use super::checkpoint::Checkpoint;
use super::model::Model;
use super::population::{Admission, Population};
use super::solution::Solution;
use crate::config::FitnessParams;
use crate::error::{HeuristicGenError, HgResult};
use crate::network::Graph;
use rayon::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// One run segment: seeds, then iterations `starting_iteration..=ending_iteration`.
#[derive(Debug, Clone, Copy)]
pub struct SearchConfiguration<'a> {
    pub solutions: &'a [Arc<Solution>],
    pub starting_iteration: u64,
    pub ending_iteration: u64,
    pub checkpoint_period: u64,
}

/// Receives every checkpoint a segment emits.
pub trait CheckpointCallback {
    fn on_checkpoint(&mut self, population: &Population, checkpoint: &Checkpoint);
}

impl<F> CheckpointCallback for F
where
    F: FnMut(&Population, &Checkpoint),
{
    fn on_checkpoint(&mut self, population: &Population, checkpoint: &Checkpoint) {
        self(population, checkpoint)
    }
}

pub struct Searcher {
    model: Model,
    graphs: Vec<Graph>,
    baseline_costs: Vec<usize>,
    population: Population,
    fitness: FitnessParams,
}

impl Searcher {
    pub fn new(
        model: Model,
        graphs: Vec<Graph>,
        baseline_costs: Vec<usize>,
        population_size: usize,
        fitness: FitnessParams,
    ) -> HgResult<Self> {
        if graphs.is_empty() {
            return Err(HeuristicGenError::Config(
                "The search needs at least one graph".to_string(),
            ));
        }
        if graphs.len() != baseline_costs.len() {
            return Err(HeuristicGenError::Config(format!(
                "{} graphs but {} baseline costs",
                graphs.len(),
                baseline_costs.len()
            )));
        }
        fitness.validate()?;
        Ok(Self {
            model,
            graphs,
            baseline_costs,
            population: Population::new(population_size),
            fitness,
        })
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn graphs(&self) -> &[Graph] {
        &self.graphs
    }

    /// Runs one segment and returns its final checkpoint.
    ///
    /// Model weights and population are rebuilt from `config.solutions`, so
    /// a segment depends only on its inputs and the current graphs.
    pub fn start<C: CheckpointCallback>(
        &mut self,
        rng: &mut fastrand::Rng,
        config: &SearchConfiguration<'_>,
        callback: &mut C,
    ) -> HgResult<Checkpoint> {
        if config.checkpoint_period == 0 {
            return Err(HeuristicGenError::Config(
                "checkpoint_period must be at least 1".to_string(),
            ));
        }

        self.model.reset();
        self.population.clear();

        for solution in config.solutions {
            let costs = self.evaluate_costs(solution);
            self.offer(solution.clone(), costs);
        }
        debug!(
            "Seeded population with {} of {} solutions",
            self.population.len(),
            config.solutions.len()
        );

        let segment_start = Instant::now();
        for iteration in config.starting_iteration..=config.ending_iteration {
            let tree = self.model.sample(rng, Some(&self.population));
            let solution = Arc::new(Solution::from_tree(tree)?);
            let costs = self.evaluate_costs(&solution);
            self.offer(solution, costs);

            if iteration % config.checkpoint_period == 0 {
                callback.on_checkpoint(&self.population, &self.checkpoint(iteration));
            }
        }

        let iterations = (config.ending_iteration + 1).saturating_sub(config.starting_iteration);
        info!(
            "Segment {}..={} finished: {} iterations in {:.2?}, average fitness {:.4}",
            config.starting_iteration,
            config.ending_iteration,
            iterations,
            segment_start.elapsed(),
            self.population.average_fitness()
        );

        let last = self.checkpoint(config.ending_iteration);
        callback.on_checkpoint(&self.population, &last);
        Ok(last)
    }

    fn checkpoint(&self, iteration: u64) -> Checkpoint {
        Checkpoint {
            iteration,
            solutions: self.population.snapshot(),
        }
    }

    fn offer(&mut self, solution: Arc<Solution>, costs: Vec<usize>) {
        let fitness = self.compute_fitness(&solution, &costs);
        match self.population.try_add(solution.clone(), costs, fitness) {
            Admission::Rejected => {}
            Admission::Inserted => self.model.solution_accepted(&solution),
            Admission::Replaced { ejected, .. } => {
                self.model.solution_accepted(&solution);
                self.model.solution_ejected(&ejected);
            }
        }
    }

    /// Target-set size on every graph, evaluated in parallel.
    pub fn evaluate_costs(&self, solution: &Solution) -> Vec<usize> {
        self.graphs
            .par_iter()
            .map(|graph| solution.evaluate_on(graph))
            .collect()
    }

    /// Sum of `baseline / max(1, cost)` over graphs, minus the length penalty
    /// once the program exceeds the activation length.
    pub fn compute_fitness(&self, solution: &Solution, costs: &[usize]) -> f64 {
        let mut fitness: f64 = self
            .baseline_costs
            .iter()
            .zip(costs)
            .map(|(&baseline, &cost)| baseline as f64 / cost.max(1) as f64)
            .sum();

        let length = solution.program_length();
        if length > self.fitness.penalty_activation_program_length {
            fitness -= self.fitness.program_length_penalty * length as f64;
        }
        fitness
    }
}
