use crate::reports;
use clap::Args;
use heurigen::benchmark;
use heurigen::config::Config;
use heurigen::error::HgResult;
use heurigen::evolution::{Checkpoint, CheckpointStore};
use heurigen::network::loader::{list_network_directory, load_graph_file};
use heurigen::network::Graph;
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct ShowArgs {
    #[command(flatten)]
    pub config: Config,

    /// Rank on every *.graph.txt in this directory instead of a synthetic battery.
    #[arg(long)]
    pub networks: Option<PathBuf>,

    /// How many solutions to print.
    #[arg(short = 'n', long, default_value_t = 10)]
    pub top: usize,

    #[arg(short = 'S', long)]
    pub seed: Option<u64>,
}

type NamedGraphs<'a> = Box<dyn Iterator<Item = (String, HgResult<Graph>)> + 'a>;

pub fn run(args: &ShowArgs, config: &Config, store: &CheckpointStore) -> HgResult<()> {
    let checkpoint = match store.load()? {
        Some(checkpoint) => checkpoint,
        None => {
            info!("No checkpoint found, showing the seed heuristics");
            Checkpoint::seed()?
        }
    };

    let mut rng = match args.seed {
        Some(s) => fastrand::Rng::with_seed(s),
        None => fastrand::Rng::new(),
    };

    let generators;
    let networks: NamedGraphs<'_> = match &args.networks {
        Some(dir) => {
            let files = list_network_directory(dir)?;
            info!("📂 Found {} networks in {}", files.len(), dir.display());
            Box::new(
                files
                    .into_iter()
                    .map(|(name, path)| (name, load_graph_file(path).map(|loaded| loaded.graph))),
            )
        }
        None => {
            generators = benchmark::battery_generators(&config.battery)?;
            Box::new(generators.iter().enumerate().map(move |(i, generator)| {
                let graph = generator.sample(&mut rng);
                info!("Sampled {} as Synth{:02}", generator.name(), i + 1);
                (format!("Synth{:02}", i + 1), Ok(graph))
            }))
        }
    };

    let ranking = benchmark::rank_solutions(&checkpoint.solutions, networks)?;
    info!(
        "Ranked {} solutions from iteration {} on {} networks",
        checkpoint.solutions.len(),
        checkpoint.iteration,
        ranking.network_names.len()
    );
    reports::print_solution_ranking(&checkpoint.solutions, &ranking, args.top);
    Ok(())
}
