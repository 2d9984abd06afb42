use crate::reports;
use clap::{Args, ValueEnum};
use heurigen::error::HgResult;
use heurigen::evolution::{seeds, Solution};
use heurigen::heuristics::{
    min_degree_fast_prune, shapley_prune, CgmrvTssHeuristic, CgrMtsHeuristic,
    MaxDegreeHeuristic, TipDecompHeuristic, TssHeuristic,
};
use heurigen::network::loader::{list_network_directory, load_graph_file};
use heurigen::network::Graph;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Display, EnumIter)]
pub enum HeuristicKind {
    #[value(name = "mdg")]
    #[strum(serialize = "MDG")]
    MaxDegree,
    #[value(name = "tip-decomp")]
    #[strum(serialize = "TIP_DECOMP")]
    TipDecomp,
    #[value(name = "mts")]
    #[strum(serialize = "MTS")]
    Mts,
    #[value(name = "c-tss")]
    #[strum(serialize = "C-TSS")]
    CTss,
    #[value(name = "elph")]
    #[strum(serialize = "ELPH")]
    Evolved,
}

impl HeuristicKind {
    fn build(self) -> HgResult<Box<dyn TssHeuristic>> {
        Ok(match self {
            Self::MaxDegree => Box::new(MaxDegreeHeuristic),
            Self::TipDecomp => Box::new(TipDecompHeuristic),
            Self::Mts => Box::new(CgrMtsHeuristic),
            Self::CTss => Box::new(CgmrvTssHeuristic),
            Self::Evolved => Box::new(Solution::from_tree(seeds::evolved_heuristic())?),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, Serialize)]
pub enum Variant {
    #[strum(serialize = "Base")]
    #[serde(rename = "Base")]
    Base,
    #[strum(serialize = "Base+Shapley")]
    #[serde(rename = "Base+Shapley")]
    Shapley,
    #[strum(serialize = "Base+Rev")]
    #[serde(rename = "Base+Rev")]
    Rev,
    #[strum(serialize = "Base+Shapley+Rev")]
    #[serde(rename = "Base+Shapley+Rev")]
    ShapleyRev,
    #[strum(serialize = "Base+Rev+Shapley")]
    #[serde(rename = "Base+Rev+Shapley")]
    RevShapley,
}

/// One heuristic/variant outcome on one network; also the CSV row.
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkRecord {
    pub network: String,
    pub heuristic: String,
    pub variant: Variant,
    pub target_set_size: usize,
    /// Includes the time of every stage the variant builds on.
    pub elapsed_ms: u64,
    pub valid: bool,
    pub deflation_factor: Option<f64>,
}

#[derive(Args, Debug, Clone)]
pub struct BenchmarkArgs {
    /// Directory of *.graph.txt edge lists.
    #[arg(long)]
    pub networks: PathBuf,

    /// Heuristics to run (all when omitted).
    #[arg(long, value_enum, value_delimiter = ',')]
    pub heuristics: Vec<HeuristicKind>,

    #[arg(long, default_value_t = 10)]
    pub shapley_rounds: usize,

    /// Deflation factors tried are i / (k - 1) for i in 0..k.
    #[arg(long, default_value_t = 5)]
    pub deflation_factor_count: usize,

    /// Also write every record to this CSV file.
    #[arg(long)]
    pub csv: Option<PathBuf>,
}

pub fn deflation_factors(count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![0.0],
        k => (0..k).map(|i| i as f64 / (k - 1) as f64).collect(),
    }
}

struct Recorder<'a> {
    network: &'a str,
    heuristic: HeuristicKind,
    graph: &'a Graph,
    records: Vec<BenchmarkRecord>,
}

impl Recorder<'_> {
    fn record(
        &mut self,
        variant: Variant,
        target_set: &BTreeSet<usize>,
        elapsed: Duration,
        deflation_factor: Option<f64>,
    ) -> bool {
        let valid = self.graph.is_target_set(target_set.iter().copied());
        if !valid {
            warn!(
                "⚠️  {} {} on {} does not activate the whole graph",
                self.heuristic, variant, self.network
            );
        }
        info!(
            "\t{} {}: {} seeds in {:.2?}",
            self.heuristic,
            variant,
            target_set.len(),
            elapsed
        );
        self.records.push(BenchmarkRecord {
            network: self.network.to_string(),
            heuristic: self.heuristic.to_string(),
            variant,
            target_set_size: target_set.len(),
            elapsed_ms: elapsed.as_millis() as u64,
            valid,
            deflation_factor,
        });
        valid
    }
}

fn run_heuristic(
    network: &str,
    graph: &Graph,
    kind: HeuristicKind,
    rounds: usize,
    factors: &[f64],
) -> HgResult<Vec<BenchmarkRecord>> {
    let heuristic = kind.build()?;
    let mut recorder = Recorder {
        network,
        heuristic: kind,
        graph,
        records: Vec::new(),
    };

    let timer = Instant::now();
    let base = heuristic.find_target_set(graph);
    let base_time = timer.elapsed();
    if !recorder.record(Variant::Base, &base, base_time, None) {
        return Ok(recorder.records);
    }

    let timer = Instant::now();
    let shapley = shapley_prune(graph, &base, rounds, factors);
    let shapley_time = base_time + timer.elapsed();
    recorder.record(
        Variant::Shapley,
        &shapley.target_set,
        shapley_time,
        Some(shapley.deflation_factor),
    );

    let timer = Instant::now();
    let rev = min_degree_fast_prune(graph, &base)?;
    let rev_time = base_time + timer.elapsed();
    recorder.record(Variant::Rev, &rev, rev_time, None);

    let timer = Instant::now();
    let shapley_rev = min_degree_fast_prune(graph, &shapley.target_set)?;
    recorder.record(
        Variant::ShapleyRev,
        &shapley_rev,
        shapley_time + timer.elapsed(),
        None,
    );

    let timer = Instant::now();
    let rev_shapley = shapley_prune(graph, &rev, rounds, factors);
    recorder.record(
        Variant::RevShapley,
        &rev_shapley.target_set,
        rev_time + timer.elapsed(),
        Some(rev_shapley.deflation_factor),
    );

    Ok(recorder.records)
}

pub fn run(args: &BenchmarkArgs) -> HgResult<()> {
    let heuristics: Vec<HeuristicKind> = if args.heuristics.is_empty() {
        HeuristicKind::iter().collect()
    } else {
        args.heuristics.clone()
    };
    let factors = deflation_factors(args.deflation_factor_count);
    let networks = list_network_directory(&args.networks)?;
    info!(
        "🏎️  Benchmarking {} heuristics on {} networks",
        heuristics.len(),
        networks.len()
    );

    let mut records = Vec::new();
    for (name, path) in &networks {
        let graph = load_graph_file(path)?.graph;
        for &kind in &heuristics {
            info!("Starting {} on {}", kind, name);
            records.extend(run_heuristic(name, &graph, kind, args.shapley_rounds, &factors)?);
        }
    }

    reports::print_benchmark_report(&records, &heuristics);

    if let Some(path) = &args.csv {
        let mut writer = csv::Writer::from_path(path)?;
        for record in &records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        info!("💾 Wrote {} records to {}", records.len(), path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deflation_factors_span_unit_interval() {
        assert_eq!(deflation_factors(3), vec![0.0, 0.5, 1.0]);
        assert_eq!(deflation_factors(1), vec![0.0]);
        assert!(deflation_factors(0).is_empty());
    }

    #[test]
    fn test_variant_labels() {
        let labels: Vec<String> = Variant::iter().map(|v| v.to_string()).collect();
        assert_eq!(
            labels,
            ["Base", "Base+Shapley", "Base+Rev", "Base+Shapley+Rev", "Base+Rev+Shapley"]
        );
        assert_eq!(HeuristicKind::CTss.to_string(), "C-TSS");
    }
}
