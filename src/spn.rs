//! The [`Spn`] manager: an arena owning every node of a network.
//!
//! Nodes are created bottom-up through the `mk_*` constructors, which check
//! the structural invariants of the node being built and hand back a
//! [`NodeId`]. Children are referenced by handle, so a node may be shared by
//! several parents (the graph is a DAG, not necessarily a tree).
//!
//! ```
//! use spn_rs::leaves::Gaussian;
//! use spn_rs::spn::Spn;
//!
//! let mut spn = Spn::default();
//! let x = spn.mk_leaf(&[0], Gaussian::new(0.0, 1.0)?)?;
//! let y = spn.mk_leaf(&[1], Gaussian::new(1.0, 2.0)?)?;
//! let p = spn.mk_product(&[x, y], &[0, 1])?;
//! assert_eq!(spn.node(p).scope(), &[0, 1]);
//! # Ok::<(), spn_rs::error::SpnError>(())
//! ```

use std::collections::{BTreeSet, HashMap};
use std::fmt::{Debug, Formatter};

use log::debug;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::{Result, SpnError};
use crate::leaves::Leaf;
use crate::node::{Node, NodeKind};
use crate::reference::NodeId;
use crate::utils::all_close;

/// Configuration for an [`Spn`] manager.
#[derive(Debug, Clone)]
pub struct SpnConfig {
    /// Initial node capacity of the arena (default: 1024)
    pub capacity: usize,
    /// Floor added to randomly drawn sum weights before normalization (default: 1e-8)
    pub weight_epsilon: f64,
    /// Tolerance on the sum of explicit weights and on weight comparison (default: 1e-5)
    pub weight_tolerance: f64,
    /// Seed for random initialization, drawn from entropy if `None` (default: `None`)
    pub seed: Option<u64>,
}

impl Default for SpnConfig {
    fn default() -> Self {
        Self {
            capacity: 1024,
            weight_epsilon: 1e-8,
            weight_tolerance: 1e-5,
            seed: None,
        }
    }
}

impl SpnConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

pub struct Spn {
    nodes: Vec<Node>,
    config: SpnConfig,
    rng: ChaCha8Rng,
}

impl Spn {
    pub fn new() -> Self {
        Self::with_config(SpnConfig::default())
    }

    pub fn with_config(config: SpnConfig) -> Self {
        assert!(
            config.weight_epsilon >= 0.0 && config.weight_tolerance >= 0.0,
            "Weight epsilon and tolerance should be non-negative"
        );
        let seed = config.seed.unwrap_or_else(rand::random);
        debug!("Spn::with_config(config = {:?}, seed = {})", config, seed);
        Self {
            nodes: Vec::with_capacity(config.capacity),
            rng: ChaCha8Rng::seed_from_u64(seed),
            config,
        }
    }
}

impl Default for Spn {
    fn default() -> Self {
        Spn::new()
    }
}

impl Debug for Spn {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Spn")
            .field("capacity", &self.nodes.capacity())
            .field("size", &self.nodes.len())
            .finish()
    }
}

impl Spn {
    pub fn config(&self) -> &SpnConfig {
        &self.config
    }

    /// Number of nodes in the arena, reachable or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        assert!(
            id.index() < self.nodes.len(),
            "Node {} does not belong to this network",
            id
        );
        &self.nodes[id.index()]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).children()
    }
    pub fn scope(&self, id: NodeId) -> &[usize] {
        self.node(id).scope()
    }

    /// Mutable access to the distribution of a leaf, `None` for inner nodes.
    pub fn leaf_mut(&mut self, id: NodeId) -> Option<&mut Leaf> {
        assert!(
            id.index() < self.nodes.len(),
            "Node {} does not belong to this network",
            id
        );
        self.nodes[id.index()].leaf_mut()
    }

    /// The generator used for random weight initialization.
    pub fn rng(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    fn push(&mut self, node: Node) -> NodeId {
        let index = self.nodes.len();
        assert!(index < u32::MAX as usize, "Too many nodes");
        self.nodes.push(node);
        NodeId::new(index as u32)
    }

    fn check_children(&self, children: &[NodeId]) -> Result<()> {
        if children.is_empty() {
            return Err(SpnError::structural("Inner node must have at least one child"));
        }
        for &c in children {
            assert!(
                c.index() < self.nodes.len(),
                "Node {} does not belong to this network",
                c
            );
        }
        Ok(())
    }

    /// Create a leaf over a single variable.
    pub fn mk_leaf(&mut self, scope: &[usize], leaf: impl Into<Leaf>) -> Result<NodeId> {
        if scope.len() != 1 {
            return Err(SpnError::structural(format!(
                "Scope size for a leaf should be 1, but was: {}",
                scope.len()
            )));
        }
        let leaf = leaf.into();
        debug!("mk_leaf(scope = {:?}, leaf = {})", scope, leaf);
        Ok(self.push(Node::new(NodeKind::Leaf(leaf), scope.to_vec(), vec![])))
    }

    /// Create a product node.
    ///
    /// Children must have pairwise disjoint scopes whose union is `scope`.
    pub fn mk_product(&mut self, children: &[NodeId], scope: &[usize]) -> Result<NodeId> {
        debug!("mk_product(children = {:?}, scope = {:?})", children, scope);
        self.check_children(children)?;
        let own = scope_set(scope)?;

        let mut union = BTreeSet::new();
        for &c in children {
            for &v in self.scope(c) {
                if !union.insert(v) {
                    return Err(SpnError::structural(format!(
                        "Children of a product node must have disjoint scopes, variable {} appears twice",
                        v
                    )));
                }
            }
        }
        if union != own {
            return Err(SpnError::structural(format!(
                "Scope {:?} of a product node must be the union of its children's scopes {:?}",
                scope, union
            )));
        }

        Ok(self.push(Node::new(NodeKind::Product, scope.to_vec(), children.to_vec())))
    }

    /// Create a sum node.
    ///
    /// Every child must have the same scope as the node. Explicit `weights`
    /// must match the number of children, be non-negative and sum to one;
    /// omitted weights are drawn at random and normalized.
    pub fn mk_sum(
        &mut self,
        children: &[NodeId],
        scope: &[usize],
        weights: Option<&[f64]>,
    ) -> Result<NodeId> {
        debug!(
            "mk_sum(children = {:?}, scope = {:?}, weights = {:?})",
            children, scope, weights
        );
        self.check_children(children)?;
        let own = scope_set(scope)?;
        for &c in children {
            let child = scope_set(self.scope(c))?;
            if child != own {
                return Err(SpnError::structural(format!(
                    "Children of a sum node must have scope {:?}, but {} has {:?}",
                    scope,
                    c,
                    self.scope(c)
                )));
            }
        }

        let weights = match weights {
            Some(w) => {
                self.check_weights(w, children.len())?;
                w.to_vec()
            }
            None => self.random_weights(children.len()),
        };

        Ok(self.push(Node::new(
            NodeKind::Sum { weights },
            scope.to_vec(),
            children.to_vec(),
        )))
    }

    fn check_weights(&self, weights: &[f64], n: usize) -> Result<()> {
        if weights.len() != n {
            return Err(SpnError::structural(format!(
                "Number of weights ({}) must match the number of children ({})",
                weights.len(),
                n
            )));
        }
        if let Some(w) = weights.iter().find(|&&w| !(w >= 0.0) || !w.is_finite()) {
            return Err(SpnError::structural(format!(
                "Weights must be finite and non-negative, got {}",
                w
            )));
        }
        let total: f64 = weights.iter().sum();
        if (total - 1.0).abs() > self.config.weight_tolerance {
            return Err(SpnError::structural(format!(
                "Weights must sum to 1, but sum to {}",
                total
            )));
        }
        Ok(())
    }

    fn random_weights(&mut self, n: usize) -> Vec<f64> {
        let eps = self.config.weight_epsilon;
        let mut weights: Vec<f64> = (0..n).map(|_| self.rng.random::<f64>() + eps).collect();
        let total: f64 = weights.iter().sum();
        for w in weights.iter_mut() {
            *w /= total;
        }
        debug!("random weights: {:?}", weights);
        weights
    }

    /// Replace the weights of a sum node.
    pub fn set_weights(&mut self, id: NodeId, weights: &[f64]) -> Result<()> {
        let n = self.children(id).len();
        if !self.node(id).is_sum() {
            return Err(SpnError::structural(format!(
                "{} is not a sum node",
                self.node(id)
            )));
        }
        self.check_weights(weights, n)?;
        if let NodeKind::Sum { weights: w } = self.nodes[id.index()].kind_mut() {
            *w = weights.to_vec();
        }
        Ok(())
    }

    /// Swap the `index`-th child of `parent` for `child`.
    ///
    /// The new child must cover the same variables as the one it replaces, so
    /// the scope invariants of `parent` keep holding. Nothing prevents the
    /// replacement from closing a cycle; the topological sort reports it.
    pub fn replace_child(&mut self, parent: NodeId, index: usize, child: NodeId) -> Result<()> {
        debug!(
            "replace_child(parent = {}, index = {}, child = {})",
            parent, index, child
        );
        let old = match self.children(parent).get(index) {
            Some(&old) => old,
            None => {
                return Err(SpnError::structural(format!(
                    "{} has no child at position {}",
                    parent, index
                )));
            }
        };
        if scope_set(self.scope(old))? != scope_set(self.scope(child))? {
            return Err(SpnError::structural(format!(
                "Replacement child {} has scope {:?}, expected {:?}",
                child,
                self.scope(child),
                self.scope(old)
            )));
        }
        self.nodes[parent.index()].children_mut()[index] = child;
        Ok(())
    }

    /// Structural comparison: same kind, same scope, pairwise equal children,
    /// same leaf parameters, and sum weights equal within the configured tolerance.
    pub fn equals(&self, a: NodeId, b: NodeId) -> bool {
        let mut memo = HashMap::new();
        self.equals_rec(self, a, b, &mut memo)
    }

    /// Like [`equals`](Spn::equals), for nodes living in different managers.
    pub fn equals_in(&self, a: NodeId, other: &Spn, b: NodeId) -> bool {
        let mut memo = HashMap::new();
        self.equals_rec(other, a, b, &mut memo)
    }

    fn equals_rec(
        &self,
        other: &Spn,
        a: NodeId,
        b: NodeId,
        memo: &mut HashMap<(NodeId, NodeId), bool>,
    ) -> bool {
        if let Some(&res) = memo.get(&(a, b)) {
            return res;
        }
        let x = self.node(a);
        let y = other.node(b);
        let same_kind = match (x.kind(), y.kind()) {
            (NodeKind::Sum { weights: u }, NodeKind::Sum { weights: v }) => {
                all_close(u, v, self.config.weight_tolerance, 1e-8)
            }
            (NodeKind::Product, NodeKind::Product) => true,
            (NodeKind::Leaf(u), NodeKind::Leaf(v)) => u == v,
            _ => false,
        };
        // Assume equal while comparing the children, so a cycle terminates.
        memo.insert((a, b), same_kind);
        let res = same_kind
            && x.scope() == y.scope()
            && x.children().len() == y.children().len()
            && x
                .children()
                .iter()
                .zip(y.children())
                .all(|(&c, &d)| self.equals_rec(other, c, d, memo));
        memo.insert((a, b), res);
        res
    }
}

fn scope_set(scope: &[usize]) -> Result<BTreeSet<usize>> {
    let mut set = BTreeSet::new();
    for &v in scope {
        if !set.insert(v) {
            return Err(SpnError::structural(format!(
                "Scope {:?} contains variable {} more than once",
                scope, v
            )));
        }
    }
    Ok(set)
}
