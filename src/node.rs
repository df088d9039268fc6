use std::cell::Cell;
use std::fmt;

use crate::leaves::Leaf;
use crate::reference::NodeId;
use crate::types::NodeType;

/// Kind-specific payload of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Weighted mixture of children over the same scope.
    Sum { weights: Vec<f64> },
    /// Factorization over children with disjoint scopes.
    Product,
    /// Univariate distribution over a single variable.
    Leaf(Leaf),
}

/// A node stored in an [`Spn`][crate::spn::Spn] arena.
///
/// Scope and children are fixed at construction. The scratch `value` and the
/// topological `id` are interior-mutable so that evaluation can annotate the
/// graph through a shared reference.
#[derive(Debug, Clone)]
pub struct Node {
    kind: NodeKind,
    scope: Vec<usize>,
    children: Vec<NodeId>,
    value: Cell<f64>,
    id: Cell<Option<usize>>,
}

impl Node {
    pub(crate) fn new(kind: NodeKind, scope: Vec<usize>, children: Vec<NodeId>) -> Self {
        Self {
            kind,
            scope,
            children,
            value: Cell::new(f64::NAN),
            id: Cell::new(None),
        }
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn node_type(&self) -> NodeType {
        match &self.kind {
            NodeKind::Sum { .. } => NodeType::Sum,
            NodeKind::Product => NodeType::Product,
            NodeKind::Leaf(leaf) => NodeType::Leaf(leaf.leaf_type()),
        }
    }

    pub fn scope(&self) -> &[usize] {
        &self.scope
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf(_))
    }
    pub fn is_sum(&self) -> bool {
        matches!(self.kind, NodeKind::Sum { .. })
    }
    pub fn is_product(&self) -> bool {
        matches!(self.kind, NodeKind::Product)
    }

    /// Mixture weights of a sum node.
    pub fn weights(&self) -> Option<&[f64]> {
        match &self.kind {
            NodeKind::Sum { weights } => Some(weights),
            _ => None,
        }
    }

    pub fn leaf(&self) -> Option<&Leaf> {
        match &self.kind {
            NodeKind::Leaf(leaf) => Some(leaf),
            _ => None,
        }
    }

    pub(crate) fn kind_mut(&mut self) -> &mut NodeKind {
        &mut self.kind
    }

    pub(crate) fn leaf_mut(&mut self) -> Option<&mut Leaf> {
        match &mut self.kind {
            NodeKind::Leaf(leaf) => Some(leaf),
            _ => None,
        }
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<NodeId> {
        &mut self.children
    }

    /// Scratch value written by the last single-row evaluation, `NaN` if none.
    pub fn value(&self) -> f64 {
        self.value.get()
    }
    pub fn set_value(&self, value: f64) {
        self.value.set(value);
    }

    /// Position in topological order, once assigned by
    /// [`Spn::set_node_ids`][crate::spn::Spn::set_node_ids].
    pub fn id(&self) -> Option<usize> {
        self.id.get()
    }
    pub(crate) fn set_id(&self, id: usize) {
        self.id.set(Some(id));
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            NodeKind::Leaf(leaf) => {
                write!(f, "{}: {:?}", leaf.leaf_type(), self.scope)?;
                if let Some(adapter) = leaf.adapter() {
                    match adapter.parameters() {
                        Ok(params) => write!(f, " - Param.: {:?}", params)?,
                        Err(_) => write!(f, " - Param.: <unset>")?,
                    }
                }
                Ok(())
            }
            _ => write!(f, "{}: {:?}", self.node_type(), self.scope),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::leaves::{Bernoulli, Gaussian};
    use crate::types::LeafType;

    #[test]
    fn test_display() {
        let sum = Node::new(
            NodeKind::Sum {
                weights: vec![0.5, 0.5],
            },
            vec![0, 1],
            vec![NodeId::new(0), NodeId::new(1)],
        );
        assert_eq!(sum.to_string(), "SumNode: [0, 1]");

        let leaf = Node::new(
            NodeKind::Leaf(Bernoulli::new(0.5).unwrap().into()),
            vec![2],
            vec![],
        );
        assert_eq!(leaf.to_string(), "Bernoulli: [2] - Param.: {\"p\": 0.5}");

        let bare = Node::new(NodeKind::Leaf(Leaf::Unparameterized), vec![0], vec![]);
        assert_eq!(bare.to_string(), "Leaf: [0]");
    }

    #[test]
    fn test_accessors() {
        let leaf = Node::new(
            NodeKind::Leaf(Gaussian::new(0.0, 1.0).unwrap().into()),
            vec![0],
            vec![],
        );
        assert!(leaf.is_leaf());
        assert!(!leaf.is_sum());
        assert_eq!(leaf.node_type(), NodeType::Leaf(LeafType::Gaussian));
        assert!(leaf.weights().is_none());
        assert!(leaf.value().is_nan());
        assert_eq!(leaf.id(), None);

        leaf.set_value(0.25);
        leaf.set_id(3);
        assert_eq!(leaf.value(), 0.25);
        assert_eq!(leaf.id(), Some(3));
    }
}
