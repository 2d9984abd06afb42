//! The fixed substitution grammar.
//!
//! Rules are globally indexed and every non-terminal owns one contiguous
//! index range. The table is a compile-time constant.

use super::symbol::Symbol;
use super::symbol::Symbol::*;
use std::ops::RangeInclusive;

#[derive(Debug, Clone, Copy)]
pub struct SubstitutionRule {
    pub symbol: Symbol,
    pub children: &'static [Symbol],
}

const fn rule(symbol: Symbol, children: &'static [Symbol]) -> SubstitutionRule {
    SubstitutionRule { symbol, children }
}

pub const SAMPLE_POPULATION_RULE: usize = 0;
pub const UNARY_RULE: usize = 3;
pub const BINARY_RULE: usize = 4;
pub const AGGREGATE_RULE: usize = 5;
pub const CARDINALITY_RULE: usize = 6;
/// Position of the scoped sub-expression within [`AGGREGATE_RULE`].
pub const AGGREGATE_BODY_POSITION: usize = 1;

pub const SUBSTITUTION_RULES: [SubstitutionRule; 55] = [
    // 0..=6 Expression
    rule(Expression, &[SamplePopulation]),
    rule(Expression, &[Constant]),
    rule(Expression, &[NodeScalarProperty]),
    rule(Expression, &[UnaryOperation, Expression]),
    rule(Expression, &[BinaryOperation, Expression, Expression]),
    rule(
        Expression,
        &[AggregateOperation, Expression, AggregationScopeMarker],
    ),
    rule(Expression, &[Cardinality, SetExpression]),
    // 7..=8 SetExpression
    rule(SetExpression, &[NodeSetProperty]),
    rule(SetExpression, &[SetOperation, SetExpression, SetExpression]),
    // 9..=14 UnaryOperation
    rule(UnaryOperation, &[Negate]),
    rule(UnaryOperation, &[Exp]),
    rule(UnaryOperation, &[SquareRoot]),
    rule(UnaryOperation, &[Square]),
    rule(UnaryOperation, &[Log]),
    rule(UnaryOperation, &[Reciprocal]),
    // 15..=21 BinaryOperation
    rule(BinaryOperation, &[Add]),
    rule(BinaryOperation, &[Subtract]),
    rule(BinaryOperation, &[Multiply]),
    rule(BinaryOperation, &[Divide]),
    rule(BinaryOperation, &[Pow]),
    rule(BinaryOperation, &[Maximum]),
    rule(BinaryOperation, &[Minimum]),
    // 22..=25 SetOperation
    rule(SetOperation, &[Union]),
    rule(SetOperation, &[Intersection]),
    rule(SetOperation, &[SetDifference]),
    rule(SetOperation, &[SymmetricSetDifference]),
    // 26..=29 AggregateOperation
    rule(AggregateOperation, &[SumOverInactiveNeighbors]),
    rule(AggregateOperation, &[AverageOverInactiveNeighbors]),
    rule(AggregateOperation, &[MinimumOverInactiveNeighbors]),
    rule(AggregateOperation, &[MaximumOverInactiveNeighbors]),
    // 30..=39 NodeScalarProperty, current scope first
    rule(NodeScalarProperty, &[DegreeInCurrentScope]),
    rule(NodeScalarProperty, &[ThresholdInCurrentScope]),
    rule(NodeScalarProperty, &[ActiveNeighborsCountInCurrentScope]),
    rule(NodeScalarProperty, &[DeficitInCurrentScope]),
    rule(NodeScalarProperty, &[InactiveNeighborsCountInCurrentScope]),
    rule(NodeScalarProperty, &[DegreeInOuterScope]),
    rule(NodeScalarProperty, &[ThresholdInOuterScope]),
    rule(NodeScalarProperty, &[ActiveNeighborsCountInOuterScope]),
    rule(NodeScalarProperty, &[DeficitInOuterScope]),
    rule(NodeScalarProperty, &[InactiveNeighborsCountInOuterScope]),
    // 40..=43 NodeSetProperty
    rule(NodeSetProperty, &[NeighborsInCurrentScope]),
    rule(NodeSetProperty, &[InactiveNeighborsInCurrentScope]),
    rule(NodeSetProperty, &[NeighborsInOuterScope]),
    rule(NodeSetProperty, &[InactiveNeighborsInOuterScope]),
    // 44..=53 Constant
    rule(Constant, &[OneSixteenth]),
    rule(Constant, &[OneEighth]),
    rule(Constant, &[OneQuarter]),
    rule(Constant, &[OneHalf]),
    rule(Constant, &[Zero]),
    rule(Constant, &[One]),
    rule(Constant, &[Two]),
    rule(Constant, &[Four]),
    rule(Constant, &[Eight]),
    rule(Constant, &[Sixteen]),
    // 54 SamplePopulation
    rule(SamplePopulation, &[Expression]),
];

pub fn rule_count() -> usize {
    SUBSTITUTION_RULES.len()
}

pub fn rule_at(index: usize) -> Option<&'static SubstitutionRule> {
    SUBSTITUTION_RULES.get(index)
}

/// Restrictions on which productions are legal at a given position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuleConstraints {
    /// Near the depth limit: only leaf-producing expansions.
    pub forbid_recursion: bool,
    /// No population to graft from.
    pub forbid_population_sampling: bool,
    /// Outside any aggregation scope there is no outer node to refer to.
    pub forbid_outer_scope_variables: bool,
}

/// Legal rule indices for `symbol`, or `None` for terminals.
pub fn rule_range(symbol: Symbol, c: RuleConstraints) -> Option<RangeInclusive<usize>> {
    let range = match symbol {
        Expression => match (c.forbid_recursion, c.forbid_population_sampling) {
            (true, true) => 1..=2,
            (true, false) => 0..=2,
            (false, true) => 1..=6,
            (false, false) => 0..=6,
        },
        SetExpression if c.forbid_recursion => 7..=7,
        SetExpression => 7..=8,
        UnaryOperation => 9..=14,
        BinaryOperation => 15..=21,
        SetOperation => 22..=25,
        AggregateOperation => 26..=29,
        NodeScalarProperty if c.forbid_outer_scope_variables => 30..=34,
        NodeScalarProperty => 30..=39,
        NodeSetProperty if c.forbid_outer_scope_variables => 40..=41,
        NodeSetProperty => 40..=43,
        Constant => 44..=53,
        SamplePopulation => 54..=54,
        _ => return None,
    };
    Some(range)
}

/// Whether child `position` of a node expanded with `rule_index` lies inside an aggregation scope.
pub fn child_in_scope(parent_in_scope: bool, rule_index: usize, position: usize) -> bool {
    parent_in_scope || (rule_index == AGGREGATE_RULE && position == AGGREGATE_BODY_POSITION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_ranges_cover_only_matching_rules() {
        let all = RuleConstraints::default();
        for symbol in Symbol::iter().filter(|s| s.is_non_terminal()) {
            let range = rule_range(symbol, all).unwrap();
            for index in range {
                assert_eq!(SUBSTITUTION_RULES[index].symbol, symbol, "rule {}", index);
            }
        }
    }

    #[test]
    fn test_every_rule_reachable() {
        let mut covered = vec![false; rule_count()];
        for symbol in Symbol::iter().filter(|s| s.is_non_terminal()) {
            for index in rule_range(symbol, RuleConstraints::default()).unwrap() {
                covered[index] = true;
            }
        }
        assert!(covered.iter().all(|&c| c));
    }

    #[test]
    fn test_recursion_forbidden_leaves_only_leaves() {
        let c = RuleConstraints {
            forbid_recursion: true,
            forbid_population_sampling: true,
            forbid_outer_scope_variables: true,
        };
        assert_eq!(rule_range(Expression, c), Some(1..=2));
        assert_eq!(rule_range(SetExpression, c), Some(7..=7));
        assert_eq!(rule_range(NodeScalarProperty, c), Some(30..=34));
        assert_eq!(rule_range(Add, c), None);
    }
}
