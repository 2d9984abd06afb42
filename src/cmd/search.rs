use crate::reports;
use clap::Args;
use heurigen::benchmark;
use heurigen::config::Config;
use heurigen::error::{HeuristicGenError, HgResult};
use heurigen::evolution::{
    Checkpoint, CheckpointStore, Model, Population, SearchConfiguration, Searcher,
};
use std::time::Instant;
use tracing::{info, warn};

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    #[command(flatten)]
    pub config: Config,

    #[arg(short = 'S', long)]
    pub seed: Option<u64>,
}

pub fn run(config: &Config, seed: Option<u64>, store: &CheckpointStore) -> HgResult<()> {
    let mut rng = match seed {
        Some(s) => fastrand::Rng::with_seed(s),
        None => fastrand::Rng::new(),
    };

    let mut checkpoint = match store.load()? {
        Some(checkpoint) => checkpoint,
        None => {
            info!("🌱 No checkpoint found, starting from the seed heuristics");
            Checkpoint::seed()?
        }
    };

    let params = &config.search;
    let period = params.graph_change_period;
    if checkpoint.iteration >= params.iterations {
        info!(
            "Checkpoint is already at iteration {} of {}",
            checkpoint.iteration, params.iterations
        );
        return Ok(());
    }

    let generators = benchmark::battery_generators(&config.battery)?;
    let started = Instant::now();

    // Segments are aligned to multiples of the period, so a resumed run
    // switches graphs at the same iterations as an uninterrupted one.
    let mut segment_start = checkpoint.iteration / period * period;
    let mut next_iteration = checkpoint.iteration + 1;
    while segment_start <= params.iterations {
        let segment_end = params
            .iterations
            .min(segment_start.saturating_add(period - 1));
        if next_iteration <= segment_end {
            info!(
                "🔄 Iterations {}..={}: sampling a new graph battery",
                next_iteration, segment_end
            );
            let graphs = benchmark::sample_battery(&generators, &mut rng);
            let baseline = benchmark::baseline_costs(&graphs);
            let model = Model::new(&config.model)?;
            let mut searcher = Searcher::new(
                model,
                graphs,
                baseline.clone(),
                params.population_size,
                config.fitness.clone(),
            )?;

            let solutions = checkpoint.solutions.clone();
            let segment = SearchConfiguration {
                solutions: &solutions,
                starting_iteration: next_iteration,
                ending_iteration: segment_end,
                checkpoint_period: params.checkpoint_period,
            };

            let mut save_error: Option<HeuristicGenError> = None;
            let mut on_checkpoint = |population: &Population, checkpoint: &Checkpoint| {
                if let Err(e) = store.save(checkpoint) {
                    warn!("⚠️  Checkpoint at iteration {} not saved: {}", checkpoint.iteration, e);
                    save_error.get_or_insert(e);
                }
                reports::log_progress(population, checkpoint, &baseline);
            };
            checkpoint = searcher.start(&mut rng, &segment, &mut on_checkpoint)?;
            if let Some(e) = save_error {
                return Err(e);
            }
            next_iteration = segment_end + 1;
        }
        segment_start = segment_start.saturating_add(period);
    }

    info!(
        "🏁 Search finished at iteration {} in {:.2?}",
        checkpoint.iteration,
        started.elapsed()
    );
    Ok(())
}
