use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser, Subcommand};
use heurigen::config::Config;
use heurigen::error::HgResult;
use heurigen::evolution::CheckpointStore;
use std::path::{Path, PathBuf};
use std::process;
use tracing::{error, info, Level};

mod cmd;
mod reports;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding checkpoint.json.
    #[arg(global = true, short = 'c', long, default_value = "checkpoints")]
    checkpoint_dir: PathBuf,

    /// JSON file with search parameters; explicit flags override it.
    #[arg(global = true, long = "config")]
    config_file: Option<PathBuf>,

    #[arg(global = true, long, default_value_t = false)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evolve heuristics, resuming from the last checkpoint.
    Search(cmd::search::SearchArgs),
    /// Rank the checkpointed heuristics on a set of networks.
    Show(cmd::show::ShowArgs),
    /// Compare the hand-written heuristics and pruners on real networks.
    Benchmark(cmd::benchmark::BenchmarkArgs),
    /// Delete the checkpoint so the next search starts from the seeds.
    Reset,
}

/// File parameters first, then every flag typed on the command line.
fn resolve_config(cli_config: &Config, path: Option<&Path>, matches: &ArgMatches) -> HgResult<Config> {
    let config = match path {
        Some(path) => {
            info!("⚖️  Loading parameters from {}", path.display());
            let mut config = Config::load_from_file(path)?;
            config.merge_from_cli(cli_config, matches);
            config
        }
        None => cli_config.clone(),
    };
    config.validate()?;
    Ok(config)
}

fn run(cli: Cli, matches: &ArgMatches) -> HgResult<()> {
    let store = CheckpointStore::new(&cli.checkpoint_dir)?;
    let config_file = cli.config_file.as_deref();

    match cli.command {
        Commands::Search(args) => {
            let sub_matches = matches.subcommand_matches("search").unwrap_or(matches);
            let config = resolve_config(&args.config, config_file, sub_matches)?;
            cmd::search::run(&config, args.seed, &store)
        }
        Commands::Show(args) => {
            let sub_matches = matches.subcommand_matches("show").unwrap_or(matches);
            let config = resolve_config(&args.config, config_file, sub_matches)?;
            cmd::show::run(&args, &config, &store)
        }
        Commands::Benchmark(args) => cmd::benchmark::run(&args),
        Commands::Reset => cmd::reset::run(&store),
    }
}

fn main() {
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    let level = if cli.debug { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();

    if let Err(e) = run(cli, &matches) {
        error!("❌ {}", e);
        process::exit(1);
    }
}
