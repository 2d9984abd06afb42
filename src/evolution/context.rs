use std::collections::BTreeSet;

/// Read-only view of the diffusion state a program is scored against.
///
/// Inactive-neighbor sets are only kept current for nodes that are still
/// inactive; programs can't reach active nodes.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext<'a> {
    pub active_neighbor_counts: &'a [usize],
    pub degrees: &'a [usize],
    pub thresholds: &'a [usize],
    pub neighbors: &'a [BTreeSet<usize>],
    pub inactive_neighbors: &'a [BTreeSet<usize>],
}

impl<'a> EvaluationContext<'a> {
    pub fn degree(&self, node: usize) -> f64 {
        self.degrees[node] as f64
    }

    pub fn threshold(&self, node: usize) -> f64 {
        self.thresholds[node] as f64
    }

    pub fn active_neighbors_count(&self, node: usize) -> f64 {
        self.active_neighbor_counts[node] as f64
    }

    /// Active neighbors still missing before `node` activates.
    pub fn deficit(&self, node: usize) -> f64 {
        self.thresholds[node].saturating_sub(self.active_neighbor_counts[node]) as f64
    }

    pub fn inactive_neighbors_count(&self, node: usize) -> f64 {
        self.degrees[node].saturating_sub(self.active_neighbor_counts[node]) as f64
    }
}

/// Replacement for NaN so scores always order totally.
pub const NAN_REPLACEMENT: f64 = f64::NEG_INFINITY;

#[inline]
pub fn saturate_nan(x: f64) -> f64 {
    if x.is_nan() {
        NAN_REPLACEMENT
    } else {
        x
    }
}

pub fn divide(a: f64, b: f64) -> f64 {
    saturate_nan(a / b)
}

pub fn reciprocal(a: f64) -> f64 {
    saturate_nan(1.0 / a)
}

pub fn square_root(a: f64) -> f64 {
    saturate_nan(a.sqrt())
}

pub fn log(a: f64) -> f64 {
    saturate_nan(a.ln())
}

pub fn pow(a: f64, b: f64) -> f64 {
    saturate_nan(a.powf(b))
}

pub fn square(a: f64) -> f64 {
    a * a
}

pub fn exp(a: f64) -> f64 {
    a.exp()
}

pub fn maximum(a: f64, b: f64) -> f64 {
    a.max(b)
}

pub fn minimum(a: f64, b: f64) -> f64 {
    a.min(b)
}

pub fn union(a: &BTreeSet<usize>, b: &BTreeSet<usize>) -> BTreeSet<usize> {
    a.union(b).copied().collect()
}

pub fn intersection(a: &BTreeSet<usize>, b: &BTreeSet<usize>) -> BTreeSet<usize> {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small.iter().filter(|x| large.contains(x)).copied().collect()
}

pub fn set_difference(a: &BTreeSet<usize>, b: &BTreeSet<usize>) -> BTreeSet<usize> {
    a.difference(b).copied().collect()
}

pub fn symmetric_set_difference(a: &BTreeSet<usize>, b: &BTreeSet<usize>) -> BTreeSet<usize> {
    a.symmetric_difference(b).copied().collect()
}
