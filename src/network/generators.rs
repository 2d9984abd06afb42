use super::Graph;
use crate::error::{HeuristicGenError, HgResult};
use std::collections::BTreeSet;

pub trait GraphGenerator: Send + Sync {
    fn name(&self) -> String;
    fn sample(&self, rng: &mut fastrand::Rng) -> Graph;
}

/// Number of candidate pairs to skip before the next accepted one,
/// or `None` if the skip runs past `remaining`.
fn geometric_skip(rng: &mut fastrand::Rng, log_1mp: f64, remaining: usize) -> Option<usize> {
    let r = 1.0 - rng.f64();
    let skip = (r.ln() / log_1mp).floor();
    if skip >= remaining as f64 {
        None
    } else {
        Some(skip.max(0.0) as usize)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ErdosRenyi {
    pub node_count: usize,
    pub edge_probability: f64,
}

impl ErdosRenyi {
    pub fn new(node_count: usize, edge_probability: f64) -> Self {
        Self {
            node_count,
            edge_probability,
        }
    }
}

impl GraphGenerator for ErdosRenyi {
    fn name(&self) -> String {
        format!("ER(n={}, p={})", self.node_count, self.edge_probability)
    }

    fn sample(&self, rng: &mut fastrand::Rng) -> Graph {
        let n = self.node_count;
        let mut adjacency = vec![BTreeSet::new(); n];
        let log_1mp = (1.0 - self.edge_probability.clamp(0.0, 1.0)).ln();

        if log_1mp.abs() > 0.0 {
            for u in 0..n.saturating_sub(1) {
                let mut v = u + 1;
                while v < n {
                    match geometric_skip(rng, log_1mp, n - v) {
                        Some(skip) => v += skip,
                        None => break,
                    }
                    adjacency[u].insert(v);
                    adjacency[v].insert(u);
                    v += 1;
                }
            }
        }

        Graph::from_symmetric(adjacency)
    }
}

/// Continuous power law truncated to `[lower_bound, upper_bound]`, sampled by inversion.
#[derive(Debug, Clone, Copy)]
pub struct TruncatedPowerLaw {
    exponent: f64,
    lower_bound: f64,
    upper_bound: f64,
    inv_t: f64,
    lb_pow: f64,
    z: f64,
}

impl TruncatedPowerLaw {
    pub fn new(exponent: f64, lower_bound: usize, upper_bound: usize) -> HgResult<Self> {
        if exponent >= -1.0 {
            return Err(HeuristicGenError::Config(format!(
                "Power-law exponent must be less than -1 (got {})",
                exponent
            )));
        }
        if lower_bound < 1 {
            return Err(HeuristicGenError::Config(
                "Power-law lower bound must be at least 1".to_string(),
            ));
        }
        if lower_bound > upper_bound {
            return Err(HeuristicGenError::Config(format!(
                "Power-law upper bound {} is below lower bound {}",
                upper_bound, lower_bound
            )));
        }

        let lb = lower_bound as f64;
        let ub = upper_bound as f64;
        let lb_pow = lb.powf(1.0 + exponent);
        Ok(Self {
            exponent,
            lower_bound: lb,
            upper_bound: ub,
            inv_t: 1.0 / (1.0 + exponent),
            lb_pow,
            z: ub.powf(1.0 + exponent) - lb_pow,
        })
    }

    pub fn exponent(&self) -> f64 {
        self.exponent
    }

    pub fn sample(&self, rng: &mut fastrand::Rng) -> f64 {
        let u = rng.f64();
        let x = (u * self.z + self.lb_pow).powf(self.inv_t);
        x.clamp(self.lower_bound, self.upper_bound)
    }
}

/// Chung–Lu graph with expected degrees drawn from a truncated power law,
/// generated with the Miller–Hagberg skipping scheme.
#[derive(Debug, Clone, Copy)]
pub struct ChungLu {
    pub node_count: usize,
    pub expected_min_degree: usize,
    pub expected_max_degree: usize,
    pub exponent: f64,
    weights: TruncatedPowerLaw,
}

impl ChungLu {
    pub fn new(
        node_count: usize,
        expected_min_degree: usize,
        expected_max_degree: usize,
        exponent: f64,
    ) -> HgResult<Self> {
        let weights = TruncatedPowerLaw::new(exponent, expected_min_degree, expected_max_degree)?;
        Ok(Self {
            node_count,
            expected_min_degree,
            expected_max_degree,
            exponent,
            weights,
        })
    }
}

impl GraphGenerator for ChungLu {
    fn name(&self) -> String {
        format!(
            "ChungLu(n={}, d={}..{}, e={})",
            self.node_count, self.expected_min_degree, self.expected_max_degree, self.exponent
        )
    }

    fn sample(&self, rng: &mut fastrand::Rng) -> Graph {
        let n = self.node_count;
        let mut adjacency = vec![BTreeSet::new(); n];

        let mut weights: Vec<f64> = (0..n).map(|_| self.weights.sample(rng)).collect();
        let total_weight: f64 = weights.iter().sum();
        weights.sort_by(|a, b| b.total_cmp(a));

        for u in 0..n.saturating_sub(1) {
            let mut v = u + 1;
            let mut p = (weights[u] * weights[v] / total_weight).min(1.0);
            while v < n && p > 0.0 {
                let log_1mp = (1.0 - p).ln();
                match geometric_skip(rng, log_1mp, n - v) {
                    Some(skip) => v += skip,
                    None => break,
                }

                let q = (weights[u] * weights[v] / total_weight).min(1.0);
                if rng.f64() < q / p {
                    adjacency[u].insert(v);
                    adjacency[v].insert(u);
                }
                v += 1;
                p = q;
            }
        }

        Graph::from_symmetric(adjacency)
    }
}
