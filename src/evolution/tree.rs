use super::symbol::Symbol;
use std::ops::Deref;
use std::sync::Arc;

/// One position of a derivation tree.
///
/// Children are owned, except under `SamplePopulation` where the child is
/// another solution's root, shared read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivationNode {
    pub symbol: Symbol,
    pub rule_index: Option<usize>,
    pub children: Vec<DerivationChild>,
}

#[derive(Debug, Clone)]
pub enum DerivationChild {
    Owned(DerivationNode),
    Shared(Arc<DerivationNode>),
}

impl Deref for DerivationChild {
    type Target = DerivationNode;

    fn deref(&self) -> &DerivationNode {
        match self {
            DerivationChild::Owned(node) => node,
            DerivationChild::Shared(node) => node,
        }
    }
}

impl PartialEq for DerivationChild {
    fn eq(&self, other: &Self) -> bool {
        **self == **other
    }
}

impl DerivationNode {
    pub fn terminal(symbol: Symbol) -> Self {
        Self {
            symbol,
            rule_index: None,
            children: Vec::new(),
        }
    }

    pub fn expand(symbol: Symbol, rule_index: usize, children: Vec<DerivationNode>) -> Self {
        Self {
            symbol,
            rule_index: Some(rule_index),
            children: children.into_iter().map(DerivationChild::Owned).collect(),
        }
    }

    /// `SamplePopulation` node grafting `donor` by reference.
    pub fn graft(rule_index: usize, donor: Arc<DerivationNode>) -> Self {
        Self {
            symbol: Symbol::SamplePopulation,
            rule_index: Some(rule_index),
            children: vec![DerivationChild::Shared(donor)],
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.symbol.is_terminal()
    }

    pub fn children(&self) -> impl Iterator<Item = &DerivationNode> {
        self.children.iter().map(|c| &**c)
    }

    /// Total number of positions, counting shared subtrees once per occurrence.
    pub fn size(&self) -> usize {
        1 + self.children().map(DerivationNode::size).sum::<usize>()
    }
}
