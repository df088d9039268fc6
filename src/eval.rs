//! Generic bottom-up and top-down evaluation over a network.
//!
//! Both evaluators look up a handler for each node by its [`NodeType`]. A
//! handler registered for an exact type wins; leaves without one fall back to
//! the generic leaf handler, if any.
//!
//! The bottom-up evaluator visits nodes in [topological
//! order][Spn::topological_order] and hands every inner node the results of
//! its children, so each unique node is computed exactly once even when it is
//! shared by several parents.
//!
//! The top-down evaluator visits the [layers][Spn::layered_topological_order]
//! from the root down. Each node receives the list of messages sent to it by
//! its parents and answers with messages for its own children.

use std::collections::HashMap;

use log::debug;

use crate::error::{Result, SpnError};
use crate::reference::NodeId;
use crate::spn::Spn;
use crate::types::NodeType;

/// Bottom-up handler: computes the result of a node from the results of its
/// children (empty for leaves).
pub type BottomUpFn<'a, R> = Box<dyn Fn(&Spn, NodeId, &[&R]) -> Result<R> + 'a>;

/// Top-down handler: receives the messages sent to a node and returns messages
/// for its children. The answer of a leaf is ignored.
pub type TopDownFn<'a, M> = Box<dyn Fn(&Spn, NodeId, &[M]) -> Result<Vec<(NodeId, M)>> + 'a>;

/// A table of handlers keyed by node type, with an optional fallback for leaves.
pub struct Handlers<F> {
    table: HashMap<NodeType, F>,
    leaf: Option<F>,
}

impl<F> Default for Handlers<F> {
    fn default() -> Self {
        Self {
            table: HashMap::new(),
            leaf: None,
        }
    }
}

impl<F> Handlers<F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `f` for nodes of exactly `node_type`.
    pub fn insert(&mut self, node_type: NodeType, f: F) {
        self.table.insert(node_type, f);
    }

    /// Register `f` for every leaf type without a handler of its own.
    pub fn insert_leaf(&mut self, f: F) {
        self.leaf = Some(f);
    }

    pub fn with(mut self, node_type: NodeType, f: F) -> Self {
        self.insert(node_type, f);
        self
    }

    pub fn with_leaf(mut self, f: F) -> Self {
        self.insert_leaf(f);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty() && self.leaf.is_none()
    }

    /// The handler applying to nodes of `node_type`.
    pub fn resolve(&self, node_type: NodeType) -> Option<&F> {
        self.table.get(&node_type).or_else(|| {
            if node_type.is_leaf() {
                self.leaf.as_ref()
            } else {
                None
            }
        })
    }
}

pub type BottomUpHandlers<'a, R> = Handlers<BottomUpFn<'a, R>>;
pub type TopDownHandlers<'a, M> = Handlers<TopDownFn<'a, M>>;

impl Spn {
    /// Fold the network rooted at `root` from the leaves up.
    ///
    /// Per-node results are stored in `results`, which is cleared first. Pass
    /// `None` to use a temporary map. Fails with [`SpnError::MissingHandler`]
    /// for a node whose type has no applicable handler.
    pub fn evaluate_bottom_up<R>(
        &self,
        root: NodeId,
        handlers: &BottomUpHandlers<'_, R>,
        results: Option<&mut HashMap<NodeId, R>>,
    ) -> Result<R>
    where
        R: Clone,
    {
        debug!("evaluate_bottom_up(root = {})", root);
        let order = self.topological_order(root)?;

        let mut local = HashMap::new();
        let keep = results.is_some();
        let results = match results {
            Some(results) => {
                results.clear();
                results
            }
            None => &mut local,
        };

        for id in order {
            let node = self.node(id);
            let node_type = node.node_type();
            let handler = handlers
                .resolve(node_type)
                .ok_or(SpnError::MissingHandler { node_type })?;
            let children: Vec<&R> = node.children().iter().map(|c| &results[c]).collect();
            let result = handler(self, id, &children)?;
            results.insert(id, result);
        }

        let res = if keep {
            results[&root].clone()
        } else {
            results.remove(&root).ok_or_else(|| {
                SpnError::structural(format!("No result computed for root {}", root))
            })?
        };
        Ok(res)
    }

    /// Propagate messages from `root` down to the leaves.
    ///
    /// The root starts with `[initial]`. Every node runs once, after all of its
    /// parents, and its handler's messages are appended to the lists of the
    /// addressed children. Returns the message lists of every node that
    /// received any.
    pub fn evaluate_top_down<M>(
        &self,
        root: NodeId,
        handlers: &TopDownHandlers<'_, M>,
        initial: M,
    ) -> Result<HashMap<NodeId, Vec<M>>> {
        debug!("evaluate_top_down(root = {})", root);
        let layers = self.layered_topological_order(root)?;

        let mut messages: HashMap<NodeId, Vec<M>> = HashMap::new();
        messages.insert(root, vec![initial]);

        for layer in layers.iter().rev() {
            for &id in layer {
                let node = self.node(id);
                let node_type = node.node_type();
                let handler = handlers
                    .resolve(node_type)
                    .ok_or(SpnError::MissingHandler { node_type })?;
                let inbox = messages.get(&id).map(Vec::as_slice).unwrap_or(&[]);
                let outgoing = handler(self, id, inbox)?;
                if node.is_leaf() {
                    continue;
                }
                for (child, message) in outgoing {
                    messages.entry(child).or_default().push(message);
                }
            }
        }

        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::RefCell;

    use test_log::test;

    use crate::leaves::{Gaussian, Leaf};
    use crate::types::LeafType;

    /// Sum over two products sharing the leaf for variable 0.
    fn diamond(spn: &mut Spn) -> NodeId {
        let x = spn.mk_leaf(&[0], Gaussian::new(0.0, 1.0).unwrap()).unwrap();
        let y1 = spn.mk_leaf(&[1], Gaussian::new(0.0, 1.0).unwrap()).unwrap();
        let y2 = spn.mk_leaf(&[1], Leaf::Unparameterized).unwrap();
        let p1 = spn.mk_product(&[x, y1], &[0, 1]).unwrap();
        let p2 = spn.mk_product(&[x, y2], &[0, 1]).unwrap();
        spn.mk_sum(&[p1, p2], &[0, 1], Some(&[0.5, 0.5])).unwrap()
    }

    fn counting<'a>(calls: &'a RefCell<usize>) -> BottomUpHandlers<'a, usize> {
        let sum: BottomUpFn<'a, usize> = Box::new(move |_: &Spn, _: NodeId, cs: &[&usize]| {
            *calls.borrow_mut() += 1;
            Ok(cs.iter().copied().sum::<usize>() + 1)
        });
        let product: BottomUpFn<'a, usize> = Box::new(move |_: &Spn, _: NodeId, cs: &[&usize]| {
            *calls.borrow_mut() += 1;
            Ok(cs.iter().copied().sum::<usize>() + 1)
        });
        let leaf: BottomUpFn<'a, usize> = Box::new(move |_: &Spn, _: NodeId, _: &[&usize]| {
            *calls.borrow_mut() += 1;
            Ok(1)
        });
        Handlers::new()
            .with(NodeType::Sum, sum)
            .with(NodeType::Product, product)
            .with_leaf(leaf)
    }

    #[test]
    fn test_bottom_up_memoized() {
        let mut spn = Spn::default();
        let root = diamond(&mut spn);
        let calls = RefCell::new(0);
        let handlers = counting(&calls);
        // Tree-size count: the shared leaf contributes once per path.
        let size = spn.evaluate_bottom_up(root, &handlers, None).unwrap();
        assert_eq!(size, 7);
        // ...but each unique node is computed once.
        assert_eq!(*calls.borrow(), 6);
    }

    #[test]
    fn test_bottom_up_results_map() {
        let mut spn = Spn::default();
        let root = diamond(&mut spn);
        let calls = RefCell::new(0);
        let handlers = counting(&calls);
        let mut results = HashMap::new();
        results.insert(NodeId::new(999), 0);
        let size = spn.evaluate_bottom_up(root, &handlers, Some(&mut results)).unwrap();
        assert_eq!(size, 7);
        assert_eq!(results.len(), 6);
        assert!(!results.contains_key(&NodeId::new(999)));
        assert_eq!(results[&root], 7);
    }

    #[test]
    fn test_exact_type_wins_over_leaf_fallback() {
        let mut spn = Spn::default();
        let root = diamond(&mut spn);
        let calls = RefCell::new(0);
        let handlers = counting(&calls).with(
            NodeType::Leaf(LeafType::Unparameterized),
            Box::new(|_: &Spn, _: NodeId, _: &[&usize]| Ok(100)),
        );
        let size = spn.evaluate_bottom_up(root, &handlers, None).unwrap();
        assert_eq!(size, 106);
    }

    #[test]
    fn test_missing_handler() {
        let mut spn = Spn::default();
        let root = diamond(&mut spn);
        let zero = |_: &Spn, _: NodeId, _: &[&usize]| Ok(0);
        let handlers: BottomUpHandlers<'_, usize> = BottomUpHandlers::new()
            .with(NodeType::Product, Box::new(zero))
            .with_leaf(Box::new(zero));
        let err = spn.evaluate_bottom_up(root, &handlers, None).unwrap_err();
        assert_eq!(
            err,
            SpnError::MissingHandler {
                node_type: NodeType::Sum
            }
        );

        // Leaves without a fallback are reported with their concrete type.
        let handlers: BottomUpHandlers<'_, usize> =
            Handlers::new().with(NodeType::Leaf(LeafType::Gaussian), Box::new(zero));
        let err = spn.evaluate_bottom_up(root, &handlers, None).unwrap_err();
        assert!(matches!(err, SpnError::MissingHandler { node_type } if node_type.is_leaf()));
    }

    #[test]
    fn test_top_down_accumulates_messages() {
        let mut spn = Spn::default();
        let root = diamond(&mut spn);
        // Every inner node forwards the sum of its inbox to each child.
        let forward: fn(&Spn, NodeId, &[u32]) -> Result<Vec<(NodeId, u32)>> = |spn, id, inbox| {
            let total: u32 = inbox.iter().sum();
            Ok(spn.children(id).iter().map(|&c| (c, total)).collect())
        };
        let handlers: TopDownHandlers<'_, u32> = TopDownHandlers::new()
            .with(NodeType::Sum, Box::new(forward))
            .with(NodeType::Product, Box::new(forward))
            .with_leaf(Box::new(|_: &Spn, _: NodeId, _: &[u32]| Ok(vec![])));
        let messages = spn.evaluate_top_down(root, &handlers, 1).unwrap();

        assert_eq!(messages[&root], vec![1]);
        let shared = spn.children(spn.children(root)[0])[0];
        assert_eq!(messages[&shared], vec![1, 1]);
        for &p in spn.children(root) {
            assert_eq!(messages[&p], vec![1]);
        }
    }

    #[test]
    fn test_top_down_order() {
        let mut spn = Spn::default();
        let root = diamond(&mut spn);
        let seen = RefCell::new(Vec::new());
        let record = |spn: &Spn, id: NodeId, _: &[()]| {
            seen.borrow_mut().push(id);
            Ok(spn.children(id).iter().map(|&c| (c, ())).collect())
        };
        let handlers: TopDownHandlers<'_, ()> = TopDownHandlers::new()
            .with(NodeType::Sum, Box::new(record))
            .with(NodeType::Product, Box::new(record))
            .with_leaf(Box::new(record));
        spn.evaluate_top_down(root, &handlers, ()).unwrap();
        drop(handlers);
        let seen = seen.into_inner();
        assert_eq!(seen.len(), 6);
        assert_eq!(seen[0], root);
        // Every node runs after all of its parents.
        for (i, &id) in seen.iter().enumerate() {
            for &c in spn.children(id) {
                assert!(seen.iter().position(|&s| s == c).unwrap() > i);
            }
        }
    }
}
