mod tables;

pub use self::tables::{benchmark as print_benchmark_report, ranking as print_solution_ranking};

use heurigen::benchmark::baseline_comparison;
use heurigen::evolution::{Checkpoint, Population};
use tracing::info;

/// Progress summary for one search checkpoint.
pub fn log_progress(population: &Population, checkpoint: &Checkpoint, baseline: &[usize]) {
    let Some(best) = population.best_index() else {
        info!("📈 Iteration {}: population is empty", checkpoint.iteration);
        return;
    };

    let (matched, surpassed) = baseline_comparison(&population.cost_vectors()[best], baseline);
    info!(
        "📈 Iteration {}: {} solutions, average fitness {:.4}, best fitness {:.4}",
        checkpoint.iteration,
        population.len(),
        population.average_fitness(),
        population.fitnesses()[best]
    );
    info!(
        "\tBest matches the baseline on {}/{} graphs and beats it on {}",
        matched,
        baseline.len(),
        surpassed
    );
    info!(
        "\tBest solution (length {}):\n{}",
        population.solutions()[best].program_length(),
        population.solutions()[best].to_string_with_prefix("\t\t")
    );
}
