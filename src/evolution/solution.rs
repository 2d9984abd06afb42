use super::context::{saturate_nan, EvaluationContext};
use super::model::validate_program;
use super::pretty::PrettyString;
use super::program::{self, ScalarExpr};
use super::symbol::Symbol;
use super::tree::DerivationNode;
use crate::error::HgResult;
use crate::heuristics::TssHeuristic;
use crate::network::{Diffuser, Graph};
use crate::pqueue::UpdatableMaxPriorityQueue;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// A flattened tree position. Depth is relative to this solution's root,
/// so a shared subtree reports different depths in different hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeInfo {
    pub symbol: Symbol,
    pub rule_index: Option<usize>,
    pub depth: usize,
}

/// A compiled, immutable scoring program.
#[derive(Debug, Clone)]
pub struct Solution {
    root: Arc<DerivationNode>,
    nodes: Vec<NodeInfo>,
    expression_depth: usize,
    program_length: usize,
    expr: ScalarExpr,
    pretty: PrettyString,
}

struct Walk {
    nodes: Vec<NodeInfo>,
    max_depth: usize,
    program_length: usize,
}

/// Pre-order walk with the last child visited first, which puts the terminals
/// in postfix order for the stack machine.
fn walk(root: &DerivationNode) -> Walk {
    let mut nodes = Vec::new();
    let mut max_depth = 0;
    let mut program_length = 0;
    let mut scope_counter = 0usize;
    let mut stack = Vec::with_capacity(32);
    stack.push((root, 0usize));

    while let Some((node, depth)) = stack.pop() {
        nodes.push(NodeInfo {
            symbol: node.symbol,
            rule_index: node.rule_index,
            depth,
        });
        max_depth = max_depth.max(depth);

        let symbol = node.symbol;
        if symbol == Symbol::AggregationScopeMarker {
            scope_counter += 1;
        } else if symbol.is_aggregate_operation() {
            scope_counter = scope_counter.saturating_sub(1);
            if scope_counter == 0 {
                program_length += 1;
            }
        } else if symbol.is_terminal() && scope_counter == 0 {
            program_length += 1;
        }

        for child in node.children() {
            stack.push((child, depth + 1));
        }
    }

    Walk {
        nodes,
        max_depth,
        program_length,
    }
}

impl Solution {
    pub fn new(root: Arc<DerivationNode>) -> HgResult<Self> {
        validate_program(&root)?;
        let walk = walk(&root);
        let (expr, pretty) = program::compile(walk.nodes.iter().map(|n| n.symbol))?;
        Ok(Self {
            root,
            nodes: walk.nodes,
            expression_depth: walk.max_depth,
            program_length: walk.program_length,
            expr,
            pretty,
        })
    }

    pub fn from_tree(root: DerivationNode) -> HgResult<Self> {
        Self::new(Arc::new(root))
    }

    pub fn root(&self) -> &Arc<DerivationNode> {
        &self.root
    }

    pub fn nodes(&self) -> &[NodeInfo] {
        &self.nodes
    }

    pub fn expression_depth(&self) -> usize {
        self.expression_depth
    }

    /// Terminal count, with each outermost aggregation charged as one unit.
    pub fn program_length(&self) -> usize {
        self.program_length
    }

    pub fn expression(&self) -> &ScalarExpr {
        &self.expr
    }

    pub fn pretty(&self) -> &PrettyString {
        &self.pretty
    }

    pub fn to_string_with_prefix(&self, prefix: &str) -> String {
        self.pretty.to_string_with_prefix(prefix)
    }

    /// Priority of `node`. Never NaN.
    pub fn score(&self, node: usize, ctx: &EvaluationContext<'_>) -> f64 {
        saturate_nan(self.expr.evaluate(node, ctx))
    }

    /// Greedy target set: repeatedly seeds the highest-scoring inactive node.
    ///
    /// After each activation only the inactive neighbors of newly active nodes
    /// are rescored. Nodes further away whose aggregates changed keep their
    /// previous priority.
    pub fn find_target_set(&self, graph: &Graph) -> BTreeSet<usize> {
        let n = graph.node_count();
        let mut target_set = BTreeSet::new();
        let mut diffuser = Diffuser::new(graph);
        let mut inactive_neighbors: Vec<BTreeSet<usize>> = graph.adjacency().to_vec();
        let mut inactive_count = n;

        let zero = graph.zero_threshold_nodes();
        if !zero.is_empty() {
            target_set.extend(zero.iter().copied());
            for v in diffuser.activate_nodes(zero.iter().copied()) {
                inactive_count -= 1;
                for &u in graph.neighbors(v) {
                    inactive_neighbors[u].remove(&v);
                }
            }
        }

        let mut queue = UpdatableMaxPriorityQueue::new(n);
        {
            let ctx = evaluation_context(graph, &diffuser, &inactive_neighbors);
            for node in (0..n).filter(|&v| !diffuser.is_active(v)) {
                queue.enqueue_or_update(node, self.score(node, &ctx));
            }
        }

        let mut touched = BTreeSet::new();
        while inactive_count > 0 {
            let Some((node, _)) = queue.dequeue() else {
                break;
            };
            target_set.insert(node);
            let activated = diffuser.activate_node(node);
            inactive_count -= activated.len();

            for &v in &activated {
                queue.remove(v);
                for u in std::mem::take(&mut inactive_neighbors[v]) {
                    if !diffuser.is_active(u) {
                        inactive_neighbors[u].remove(&v);
                        touched.insert(u);
                    }
                }
            }

            let ctx = evaluation_context(graph, &diffuser, &inactive_neighbors);
            for u in std::mem::take(&mut touched) {
                queue.enqueue_or_update(u, self.score(u, &ctx));
            }
        }

        target_set
    }

    /// Size of [`Self::find_target_set`]; the per-graph cost.
    pub fn evaluate_on(&self, graph: &Graph) -> usize {
        self.find_target_set(graph).len()
    }
}

fn evaluation_context<'a>(
    graph: &'a Graph,
    diffuser: &'a Diffuser<'_>,
    inactive_neighbors: &'a [BTreeSet<usize>],
) -> EvaluationContext<'a> {
    EvaluationContext {
        active_neighbor_counts: diffuser.active_neighbor_counts(),
        degrees: graph.degrees(),
        thresholds: graph.thresholds(),
        neighbors: graph.adjacency(),
        inactive_neighbors,
    }
}

impl TssHeuristic for Solution {
    fn find_target_set(&self, graph: &Graph) -> BTreeSet<usize> {
        Solution::find_target_set(self, graph)
    }
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pretty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evolution::seeds;

    #[test]
    fn test_walk_counts_scope_once() {
        let solution = Solution::from_tree(seeds::evolved_heuristic()).unwrap();
        // deficit(node), +, and one unit for the whole aggregation.
        assert_eq!(solution.program_length(), 3);
        assert_eq!(solution.nodes()[0].symbol, Symbol::Expression);
        assert_eq!(solution.nodes()[0].depth, 0);
    }

    #[test]
    fn test_shared_subtree_depth_is_per_host() {
        let donor = Arc::new(seeds::degree_heuristic());
        let host = DerivationNode::expand(
            Symbol::Expression,
            0,
            vec![DerivationNode::graft(54, donor.clone())],
        );
        let alone = Solution::new(donor).unwrap();
        let grafted = Solution::from_tree(host).unwrap();
        assert_eq!(grafted.expression_depth(), alone.expression_depth() + 2);
        assert_eq!(grafted.to_string(), alone.to_string());
    }
}
