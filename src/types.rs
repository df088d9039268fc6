//! Type tags for SPN nodes.
//!
//! Every node in a network belongs to exactly one [`NodeType`]. The tags are
//! plain `Copy` values, so they can key dispatch tables (see
//! [`crate::dispatch`]) without looking at node contents.

use std::fmt;

/// Concrete kind of a leaf distribution.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum LeafType {
    /// A leaf that carries no distribution at all.
    Unparameterized,
    Gaussian,
    Bernoulli,
    Binomial,
    Hypergeometric,
    LogNormal,
    Poisson,
    NegativeBinomial,
    Exponential,
    Gamma,
    Geometric,
}

impl LeafType {
    /// All leaf types, in declaration order.
    pub const ALL: [LeafType; 11] = [
        LeafType::Unparameterized,
        LeafType::Gaussian,
        LeafType::Bernoulli,
        LeafType::Binomial,
        LeafType::Hypergeometric,
        LeafType::LogNormal,
        LeafType::Poisson,
        LeafType::NegativeBinomial,
        LeafType::Exponential,
        LeafType::Gamma,
        LeafType::Geometric,
    ];

    /// Returns `true` for distributions whose support is a set of integers.
    pub fn is_discrete(self) -> bool {
        matches!(
            self,
            LeafType::Bernoulli
                | LeafType::Binomial
                | LeafType::Hypergeometric
                | LeafType::Poisson
                | LeafType::NegativeBinomial
                | LeafType::Geometric
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            LeafType::Unparameterized => "Leaf",
            LeafType::Gaussian => "Gaussian",
            LeafType::Bernoulli => "Bernoulli",
            LeafType::Binomial => "Binomial",
            LeafType::Hypergeometric => "Hypergeometric",
            LeafType::LogNormal => "LogNormal",
            LeafType::Poisson => "Poisson",
            LeafType::NegativeBinomial => "NegativeBinomial",
            LeafType::Exponential => "Exponential",
            LeafType::Gamma => "Gamma",
            LeafType::Geometric => "Geometric",
        }
    }
}

impl fmt::Display for LeafType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Concrete kind of a node.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum NodeType {
    Sum,
    Product,
    Leaf(LeafType),
}

impl NodeType {
    pub fn is_leaf(self) -> bool {
        matches!(self, NodeType::Leaf(_))
    }

    pub fn leaf_type(self) -> Option<LeafType> {
        match self {
            NodeType::Leaf(t) => Some(t),
            _ => None,
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeType::Sum => f.write_str("SumNode"),
            NodeType::Product => f.write_str("ProductNode"),
            NodeType::Leaf(t) => write!(f, "{}", t),
        }
    }
}

impl From<LeafType> for NodeType {
    fn from(t: LeafType) -> Self {
        NodeType::Leaf(t)
    }
}
