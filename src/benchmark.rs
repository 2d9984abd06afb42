use crate::config::BatteryParams;
use crate::error::HgResult;
use crate::evolution::Solution;
use crate::heuristics::baseline_cost;
use crate::network::generators::{ChungLu, ErdosRenyi, GraphGenerator};
use crate::network::Graph;
use rayon::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// One generator per Erdős–Rényi probability, then one per Chung–Lu exponent.
pub fn battery_generators(params: &BatteryParams) -> HgResult<Vec<Box<dyn GraphGenerator>>> {
    params.validate()?;
    let mut generators: Vec<Box<dyn GraphGenerator>> = Vec::new();
    for &p in &params.erdos_renyi_probabilities {
        generators.push(Box::new(ErdosRenyi::new(params.node_count, p)));
    }
    for &exponent in &params.chung_lu_exponents {
        generators.push(Box::new(ChungLu::new(
            params.node_count,
            params.chung_lu_min_degree,
            params.chung_lu_max_degree,
            exponent,
        )?));
    }
    Ok(generators)
}

/// Samples every generator in parallel, each from its own seed drawn from `rng`.
pub fn sample_battery(generators: &[Box<dyn GraphGenerator>], rng: &mut fastrand::Rng) -> Vec<Graph> {
    let seeds: Vec<u64> = generators.iter().map(|_| rng.u64(..)).collect();
    generators
        .par_iter()
        .zip(seeds)
        .map(|(generator, seed)| generator.sample(&mut fastrand::Rng::with_seed(seed)))
        .collect()
}

pub fn standard_battery(params: &BatteryParams, rng: &mut fastrand::Rng) -> HgResult<Vec<Graph>> {
    let start = Instant::now();
    let generators = battery_generators(params)?;
    let graphs = sample_battery(&generators, rng);
    info!(
        "Generated {} graphs ({} edges in total) in {:.2?}",
        graphs.len(),
        graphs.iter().map(Graph::edge_count).sum::<usize>(),
        start.elapsed()
    );
    Ok(graphs)
}

pub fn baseline_costs(graphs: &[Graph]) -> Vec<usize> {
    let start = Instant::now();
    let costs: Vec<usize> = graphs.par_iter().map(baseline_cost).collect();
    info!("Computed baseline cost vector {:?} in {:.2?}", costs, start.elapsed());
    costs
}

/// Graphs on which `costs` matches (`<=`) and surpasses (`<`) the baseline.
pub fn baseline_comparison(costs: &[usize], baseline: &[usize]) -> (usize, usize) {
    costs
        .iter()
        .zip(baseline)
        .fold((0, 0), |(matched, surpassed), (&c, &b)| {
            (matched + usize::from(c <= b), surpassed + usize::from(c < b))
        })
}

/// 1-based ranks where tied values all take the highest rank of their group.
pub fn rank_max(values: &[usize]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by_key(|&i| values[i]);

    let mut ranks = vec![0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start;
        while end + 1 < order.len() && values[order[end + 1]] == values[order[start]] {
            end += 1;
        }
        for &i in &order[start..=end] {
            ranks[i] = end + 1;
        }
        start = end + 1;
    }
    ranks
}

/// Per-network costs and ranks for a set of solutions.
#[derive(Debug, Clone)]
pub struct Ranking {
    pub network_names: Vec<String>,
    /// `costs[network][solution]`
    pub costs: Vec<Vec<usize>>,
    pub average_ranks: Vec<f64>,
    /// Solution indices, best average rank first.
    pub order: Vec<usize>,
}

/// Evaluates every solution on every network and ranks them per network.
///
/// Networks are produced lazily so only one is held in memory at a time.
pub fn rank_solutions<I>(solutions: &[Arc<Solution>], networks: I) -> HgResult<Ranking>
where
    I: IntoIterator<Item = (String, HgResult<Graph>)>,
{
    let mut network_names = Vec::new();
    let mut costs = Vec::new();
    let mut rank_totals = vec![0usize; solutions.len()];

    for (name, graph) in networks {
        let graph = graph?;
        info!("Evaluating {} solutions on the {} network", solutions.len(), name);
        let network_costs: Vec<usize> = solutions
            .par_iter()
            .map(|solution| solution.evaluate_on(&graph))
            .collect();
        for (total, rank) in rank_totals.iter_mut().zip(rank_max(&network_costs)) {
            *total += rank;
        }
        network_names.push(name);
        costs.push(network_costs);
    }

    let network_count = network_names.len().max(1) as f64;
    let average_ranks: Vec<f64> = rank_totals
        .iter()
        .map(|&total| total as f64 / network_count)
        .collect();
    let mut order: Vec<usize> = (0..solutions.len()).collect();
    order.sort_by_key(|&i| rank_totals[i]);

    Ok(Ranking {
        network_names,
        costs,
        average_ranks,
        order,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_max_ties_take_highest_rank() {
        assert_eq!(rank_max(&[5, 3, 5, 1]), vec![4, 2, 4, 1]);
        assert_eq!(rank_max(&[7, 7, 7]), vec![3, 3, 3]);
        assert!(rank_max(&[]).is_empty());
    }

    #[test]
    fn test_baseline_comparison() {
        assert_eq!(baseline_comparison(&[3, 5, 9], &[4, 5, 8]), (2, 1));
    }
}
