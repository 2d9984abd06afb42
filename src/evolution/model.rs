use super::grammar::{self, RuleConstraints, SUBSTITUTION_RULES};
use super::population::Population;
use super::solution::Solution;
use super::symbol::Symbol;
use super::tree::DerivationNode;
use crate::config::ModelParams;
use crate::error::{HeuristicGenError, HgResult};
use std::sync::Arc;
use tracing::trace;

/// A position still waiting for a production.
#[derive(Debug, Clone, Copy)]
struct Pending {
    symbol: Symbol,
    depth: usize,
    in_scope: bool,
}

/// One sampled node before its children exist.
enum Draft {
    Terminal(Symbol),
    Graft(usize, Arc<DerivationNode>),
    Expand {
        symbol: Symbol,
        rule_index: usize,
        arity: usize,
    },
}

/// Probabilistic grammar over derivation trees.
///
/// Keeps one row of rule weights per depth. Rows are reinforced by solutions
/// entering the population and weakened by solutions leaving it.
#[derive(Debug, Clone)]
pub struct Model {
    max_depth: usize,
    tournament_size: usize,
    mixture_weight_for_rules: f64,
    rule_weights: Vec<Vec<f64>>,
}

impl Model {
    pub fn new(params: &ModelParams) -> HgResult<Self> {
        params.validate()?;
        Ok(Self {
            max_depth: params.max_depth,
            tournament_size: params.tournament_size,
            mixture_weight_for_rules: params.mixture_weight_for_rules,
            rule_weights: vec![vec![0.0; grammar::rule_count()]; params.max_depth + 1],
        })
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn rule_weights(&self) -> &[Vec<f64>] {
        &self.rule_weights
    }

    /// Draws a fresh derivation tree rooted at `Expression`.
    ///
    /// With a non-empty population, any `Expression` may expand into
    /// `SamplePopulation` and graft a tournament winner's tree by reference.
    pub fn sample(&self, rng: &mut fastrand::Rng, population: Option<&Population>) -> DerivationNode {
        let donors = population.filter(|p| !p.is_empty());

        // Drafted in pre-order: the first child is always the next one popped.
        let mut drafts = Vec::new();
        let mut pending = vec![Pending {
            symbol: Symbol::Expression,
            depth: 0,
            in_scope: false,
        }];
        while let Some(next) = pending.pop() {
            drafts.push(self.draft(rng, next, donors, &mut pending));
        }

        // Reverse pre-order finishes every subtree before its parent, leaving
        // the first child on top of the stack.
        let mut built: Vec<DerivationNode> = Vec::with_capacity(drafts.len());
        for draft in drafts.into_iter().rev() {
            let node = match draft {
                Draft::Terminal(symbol) => DerivationNode::terminal(symbol),
                Draft::Graft(rule_index, donor) => DerivationNode::graft(rule_index, donor),
                Draft::Expand {
                    symbol,
                    rule_index,
                    arity,
                } => {
                    let mut children = built.split_off(built.len().saturating_sub(arity));
                    children.reverse();
                    DerivationNode::expand(symbol, rule_index, children)
                }
            };
            built.push(node);
        }
        debug_assert_eq!(built.len(), 1);
        built.swap_remove(0)
    }

    fn draft(
        &self,
        rng: &mut fastrand::Rng,
        at: Pending,
        donors: Option<&Population>,
        pending: &mut Vec<Pending>,
    ) -> Draft {
        let constraints = RuleConstraints {
            forbid_recursion: at.depth + 2 >= self.max_depth,
            forbid_population_sampling: donors.is_none(),
            forbid_outer_scope_variables: !at.in_scope,
        };
        let Some(range) = grammar::rule_range(at.symbol, constraints) else {
            return Draft::Terminal(at.symbol);
        };
        let rule_index = self.select_rule_index(rng, at.depth, *range.start(), *range.end());

        if at.symbol == Symbol::SamplePopulation {
            if let Some(population) = donors {
                let winner = self.tournament(rng, population);
                return Draft::Graft(rule_index, population.solutions()[winner].root().clone());
            }
        }

        let children = SUBSTITUTION_RULES[rule_index].children;
        for (position, &child) in children.iter().enumerate().rev() {
            pending.push(Pending {
                symbol: child,
                depth: at.depth + 1,
                in_scope: grammar::child_in_scope(at.in_scope, rule_index, position),
            });
        }
        Draft::Expand {
            symbol: at.symbol,
            rule_index,
            arity: children.len(),
        }
    }

    /// Uniform over `start..=end`, or with probability `mixture_weight_for_rules`
    /// a Gumbel-max draw proportional to the weights at `depth`.
    fn select_rule_index(&self, rng: &mut fastrand::Rng, depth: usize, start: usize, end: usize) -> usize {
        let use_weights = rng.f64() <= self.mixture_weight_for_rules;
        let Some(weights) = self.rule_weights.get(depth).filter(|_| use_weights) else {
            return rng.usize(start..=end);
        };

        let mut best_z = f64::MIN;
        let mut selected = start;
        for (index, &weight) in weights.iter().enumerate().take(end + 1).skip(start) {
            let z = (1.0 - rng.f64()).ln() / weight.max(1e-8);
            if z > best_z {
                best_z = z;
                selected = index;
            }
        }
        selected
    }

    /// Tournament with replacement. Later draws win ties.
    fn tournament(&self, rng: &mut fastrand::Rng, population: &Population) -> usize {
        let count = population.len();
        let fitnesses = population.fitnesses();
        let mut chosen = rng.usize(..count);
        for _ in 1..self.tournament_size {
            let index = rng.usize(..count);
            if fitnesses[index] >= fitnesses[chosen] {
                chosen = index;
            }
        }
        chosen
    }

    pub fn solution_accepted(&mut self, solution: &Solution) {
        self.reinforce(solution, 1.0);
    }

    pub fn solution_ejected(&mut self, solution: &Solution) {
        self.reinforce(solution, -1.0);
    }

    fn reinforce(&mut self, solution: &Solution, delta: f64) {
        for node in solution.nodes() {
            let Some(rule_index) = node.rule_index else {
                continue;
            };
            if let Some(row) = self.rule_weights.get_mut(node.depth) {
                row[rule_index] += delta;
            }
        }
        trace!(
            "Rule weights {} by a program of length {}",
            if delta > 0.0 { "reinforced" } else { "weakened" },
            solution.program_length()
        );
    }

    pub fn reset(&mut self) {
        for row in &mut self.rule_weights {
            row.fill(0.0);
        }
    }

    pub fn is_valid_program(root: &DerivationNode) -> bool {
        validate_program(root).is_ok()
    }
}

/// Checks that every expansion uses a rule legal for its symbol and scope and
/// that children match the rule's right-hand side.
///
/// Depth limits and population availability only constrain sampling and are
/// not checked here.
pub fn validate_program(root: &DerivationNode) -> HgResult<()> {
    if root.symbol != Symbol::Expression {
        return Err(HeuristicGenError::MalformedProgram(format!(
            "Root must be Expression, found {}",
            root.symbol.name()
        )));
    }

    let mut stack = vec![(root, false)];
    while let Some((node, in_scope)) = stack.pop() {
        if node.symbol.is_terminal() {
            if node.rule_index.is_some() || !node.children.is_empty() {
                return Err(HeuristicGenError::MalformedProgram(format!(
                    "Terminal {} carries an expansion",
                    node.symbol.name()
                )));
            }
            continue;
        }

        let constraints = RuleConstraints {
            forbid_outer_scope_variables: !in_scope,
            ..RuleConstraints::default()
        };
        let Some(range) = grammar::rule_range(node.symbol, constraints) else {
            return Err(HeuristicGenError::MalformedProgram(format!(
                "{} has no rules",
                node.symbol.name()
            )));
        };
        let rule_index = node.rule_index.ok_or_else(|| {
            HeuristicGenError::MalformedProgram(format!(
                "{} was never expanded",
                node.symbol.name()
            ))
        })?;
        if !range.contains(&rule_index) {
            return Err(HeuristicGenError::MalformedProgram(format!(
                "Rule {} is not allowed for {}{}",
                rule_index,
                node.symbol.name(),
                if in_scope { "" } else { " outside an aggregation scope" }
            )));
        }

        let expected = SUBSTITUTION_RULES[rule_index].children;
        if expected.len() != node.children.len() {
            return Err(HeuristicGenError::MalformedProgram(format!(
                "Rule {} expects {} children, found {}",
                rule_index,
                expected.len(),
                node.children.len()
            )));
        }
        for (position, (child, &symbol)) in node.children().zip(expected).enumerate() {
            if child.symbol != symbol {
                return Err(HeuristicGenError::MalformedProgram(format!(
                    "Rule {} expects {} at position {}, found {}",
                    rule_index,
                    symbol.name(),
                    position,
                    child.symbol.name()
                )));
            }
            stack.push((child, grammar::child_in_scope(in_scope, rule_index, position)));
        }
    }
    Ok(())
}
