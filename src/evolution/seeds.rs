//! Hand-written starting programs.

use super::checkpoint::Checkpoint;
use super::grammar::{AGGREGATE_RULE, BINARY_RULE};
use super::solution::Solution;
use super::symbol::Symbol;
use super::tree::DerivationNode;
use crate::error::HgResult;
use std::sync::Arc;

const PROPERTY_RULE: usize = 2;
const DEGREE_RULE: usize = 30;
const THRESHOLD_RULE: usize = 31;
const DEFICIT_RULE: usize = 33;
const INACTIVE_COUNT_RULE: usize = 34;
const ADD_RULE: usize = 15;
const DIVIDE_RULE: usize = 18;
const SUM_RULE: usize = 26;

fn property(rule_index: usize, terminal: Symbol) -> DerivationNode {
    DerivationNode::expand(
        Symbol::Expression,
        PROPERTY_RULE,
        vec![DerivationNode::expand(
            Symbol::NodeScalarProperty,
            rule_index,
            vec![DerivationNode::terminal(terminal)],
        )],
    )
}

fn binary(rule_index: usize, op: Symbol, left: DerivationNode, right: DerivationNode) -> DerivationNode {
    DerivationNode::expand(
        Symbol::Expression,
        BINARY_RULE,
        vec![
            DerivationNode::expand(
                Symbol::BinaryOperation,
                rule_index,
                vec![DerivationNode::terminal(op)],
            ),
            left,
            right,
        ],
    )
}

/// `degree(node)`
pub fn degree_heuristic() -> DerivationNode {
    property(DEGREE_RULE, Symbol::DegreeInCurrentScope)
}

/// `threshold(node)`
pub fn threshold_heuristic() -> DerivationNode {
    property(THRESHOLD_RULE, Symbol::ThresholdInCurrentScope)
}

/// `num_inactive_neighbors(node)`
pub fn inactive_neighbors_heuristic() -> DerivationNode {
    property(INACTIVE_COUNT_RULE, Symbol::InactiveNeighborsCountInCurrentScope)
}

/// `deficit(node)`
pub fn deficit_heuristic() -> DerivationNode {
    property(DEFICIT_RULE, Symbol::DeficitInCurrentScope)
}

/// `deficit(node) + sum_over_inactive_neighbors[num_inactive_neighbors(neighbor) / deficit(neighbor)]`
pub fn evolved_heuristic() -> DerivationNode {
    let ratio = binary(
        DIVIDE_RULE,
        Symbol::Divide,
        property(INACTIVE_COUNT_RULE, Symbol::InactiveNeighborsCountInCurrentScope),
        property(DEFICIT_RULE, Symbol::DeficitInCurrentScope),
    );
    let aggregate = DerivationNode::expand(
        Symbol::Expression,
        AGGREGATE_RULE,
        vec![
            DerivationNode::expand(
                Symbol::AggregateOperation,
                SUM_RULE,
                vec![DerivationNode::terminal(Symbol::SumOverInactiveNeighbors)],
            ),
            ratio,
            DerivationNode::terminal(Symbol::AggregationScopeMarker),
        ],
    );
    binary(ADD_RULE, Symbol::Add, deficit_heuristic(), aggregate)
}

pub fn seed_solutions() -> HgResult<Vec<Arc<Solution>>> {
    [
        degree_heuristic(),
        threshold_heuristic(),
        inactive_neighbors_heuristic(),
        deficit_heuristic(),
    ]
    .into_iter()
    .map(|tree| Solution::from_tree(tree).map(Arc::new))
    .collect()
}

impl Checkpoint {
    /// Iteration-zero checkpoint holding the single-property seeds.
    pub fn seed() -> HgResult<Self> {
        Ok(Checkpoint {
            iteration: 0,
            solutions: seed_solutions()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_rendering() {
        let rendered: Vec<String> = seed_solutions()
            .unwrap()
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            rendered,
            [
                "degree(node)",
                "threshold(node)",
                "num_inactive_neighbors(node)",
                "deficit(node)"
            ]
        );
    }

    #[test]
    fn test_evolved_heuristic_wraps_past_max_width() {
        let solution = Solution::from_tree(evolved_heuristic()).unwrap();
        assert_eq!(
            solution.pretty().lines(),
            [
                "deficit(node) + ",
                "sum_over_inactive_neighbors[num_inactive_neighbors(neighbor) / deficit(neighbor)]"
            ]
        );
    }
}
