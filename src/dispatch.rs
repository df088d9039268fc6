//! Routing of inference requests to handler families.
//!
//! A [`Registry`] maps `(network type, inference kind, node type)` to a plain
//! handler function. [`Registry::bottom_up`] turns the entries of one network
//! type into the [`BottomUpHandlers`] consumed by
//! [`Spn::evaluate_bottom_up`], binding the data matrix to every handler.
//!
//! Leaves are matched by their concrete [`LeafType`][crate::types::LeafType]
//! first and by [`HandlerKey::AnyLeaf`] otherwise. The default handlers for
//! leaves go through the leaf adapters ([`crate::leaves`]), which tell apart a
//! leaf without a distribution from a node that is not a leaf at all.

use std::collections::HashMap;
use std::fmt;

use log::debug;

use crate::data::DataMatrix;
use crate::error::{Result, SpnError};
use crate::eval::{BottomUpFn, BottomUpHandlers, Handlers};
use crate::leaves;
use crate::reference::NodeId;
use crate::spn::Spn;
use crate::types::NodeType;
use crate::utils::log_sum_exp;

/// Evaluation context selecting a family of handlers.
///
/// The context never changes how the graph is traversed, only which handlers run.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum NetworkType {
    /// Plain Sum-Product Networks.
    Spn,
    /// Conditional SPNs. No handlers are registered for it by default.
    Conditional,
}

impl fmt::Display for NetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkType::Spn => f.write_str("SPN"),
            NetworkType::Conditional => f.write_str("CSPN"),
        }
    }
}

/// The quantity computed by an inference handler.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Inference {
    Likelihood,
    LogLikelihood,
}

/// Which nodes a handler applies to.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum HandlerKey {
    /// Nodes of exactly this type.
    Node(NodeType),
    /// Every leaf without a handler for its concrete type.
    AnyLeaf,
}

impl From<NodeType> for HandlerKey {
    fn from(t: NodeType) -> Self {
        HandlerKey::Node(t)
    }
}

/// A per-row inference handler. Receives the per-row results of the
/// children (empty for leaves) and the data matrix.
pub type InferenceFn = fn(&Spn, NodeId, &[&Vec<f64>], &DataMatrix) -> Result<Vec<f64>>;

/// Handler table keyed by `(network type, inference, node kind)`.
#[derive(Clone)]
pub struct Registry {
    table: HashMap<(NetworkType, Inference, HandlerKey), InferenceFn>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.table.keys()).finish()
    }
}

impl Default for Registry {
    /// A registry with the SPN handler family.
    fn default() -> Self {
        let mut registry = Registry::empty();
        let ctx = NetworkType::Spn;
        registry.register(ctx, Inference::Likelihood, NodeType::Sum, sum_likelihood);
        registry.register(ctx, Inference::Likelihood, NodeType::Product, prod_likelihood);
        registry.register(ctx, Inference::Likelihood, HandlerKey::AnyLeaf, leaf_likelihood);
        registry.register(ctx, Inference::LogLikelihood, NodeType::Sum, sum_log_likelihood);
        registry.register(ctx, Inference::LogLikelihood, NodeType::Product, prod_log_likelihood);
        registry.register(ctx, Inference::LogLikelihood, HandlerKey::AnyLeaf, leaf_log_likelihood);
        registry
    }
}

impl Registry {
    pub fn empty() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    /// Register (or replace) a handler.
    pub fn register(
        &mut self,
        context: NetworkType,
        inference: Inference,
        key: impl Into<HandlerKey>,
        f: InferenceFn,
    ) {
        let key = key.into();
        debug!("register({}, {:?}, {:?})", context, inference, key);
        self.table.insert((context, inference, key), f);
    }

    /// The handler applying to nodes of `node_type`, falling back to
    /// [`HandlerKey::AnyLeaf`] for leaves.
    pub fn resolve(
        &self,
        context: NetworkType,
        inference: Inference,
        node_type: NodeType,
    ) -> Option<InferenceFn> {
        self.table
            .get(&(context, inference, HandlerKey::Node(node_type)))
            .or_else(|| {
                if node_type.is_leaf() {
                    self.table.get(&(context, inference, HandlerKey::AnyLeaf))
                } else {
                    None
                }
            })
            .copied()
    }

    /// Bottom-up handlers for `inference` in `context`, bound to `data`.
    ///
    /// Fails with [`SpnError::NotImplemented`] if nothing at all is registered
    /// for the pair. Node types left uncovered surface later as
    /// [`SpnError::MissingHandler`] from the evaluator.
    pub fn bottom_up<'a>(
        &self,
        context: NetworkType,
        inference: Inference,
        data: &'a DataMatrix,
    ) -> Result<BottomUpHandlers<'a, Vec<f64>>> {
        let mut handlers = Handlers::new();
        for (&(ctx, inf, key), &f) in &self.table {
            if ctx != context || inf != inference {
                continue;
            }
            let bound: BottomUpFn<'a, Vec<f64>> =
                Box::new(move |spn: &Spn, id: NodeId, children: &[&Vec<f64>]| {
                    f(spn, id, children, data)
                });
            match key {
                HandlerKey::Node(t) => handlers.insert(t, bound),
                HandlerKey::AnyLeaf => handlers.insert_leaf(bound),
            }
        }
        if handlers.is_empty() {
            return Err(SpnError::not_implemented(format!(
                "No {:?} handlers registered for network type {}",
                inference, context
            )));
        }
        Ok(handlers)
    }
}

fn weights(spn: &Spn, id: NodeId) -> Result<&[f64]> {
    spn.node(id)
        .weights()
        .ok_or_else(|| SpnError::structural(format!("{} is not a sum node", spn.node(id))))
}

fn rows(children: &[&Vec<f64>], data: &DataMatrix) -> Result<usize> {
    let n = data.rows();
    if let Some(c) = children.iter().find(|c| c.len() != n) {
        return Err(SpnError::shape(format!(
            "child result has {} rows, expected {}",
            c.len(),
            n
        )));
    }
    Ok(n)
}

/// `sum_i w_i * P_i(x)` per row.
pub fn sum_likelihood(
    spn: &Spn,
    id: NodeId,
    children: &[&Vec<f64>],
    data: &DataMatrix,
) -> Result<Vec<f64>> {
    let w = weights(spn, id)?;
    let n = rows(children, data)?;
    Ok((0..n)
        .map(|r| w.iter().zip(children).map(|(w, c)| w * c[r]).sum::<f64>())
        .collect())
}

/// `ln sum_i exp(ln w_i + ln P_i(x))` per row.
pub fn sum_log_likelihood(
    spn: &Spn,
    id: NodeId,
    children: &[&Vec<f64>],
    data: &DataMatrix,
) -> Result<Vec<f64>> {
    let log_w: Vec<f64> = weights(spn, id)?.iter().map(|w| w.ln()).collect();
    let n = rows(children, data)?;
    let mut terms = vec![0.0; children.len()];
    Ok((0..n)
        .map(|r| {
            for (t, (lw, c)) in terms.iter_mut().zip(log_w.iter().zip(children)) {
                *t = lw + c[r];
            }
            log_sum_exp(&terms)
        })
        .collect())
}

/// `prod_i P_i(x)` per row.
pub fn prod_likelihood(
    _spn: &Spn,
    _id: NodeId,
    children: &[&Vec<f64>],
    data: &DataMatrix,
) -> Result<Vec<f64>> {
    let n = rows(children, data)?;
    Ok((0..n).map(|r| children.iter().map(|c| c[r]).product::<f64>()).collect())
}

/// `sum_i ln P_i(x)` per row.
pub fn prod_log_likelihood(
    _spn: &Spn,
    _id: NodeId,
    children: &[&Vec<f64>],
    data: &DataMatrix,
) -> Result<Vec<f64>> {
    let n = rows(children, data)?;
    Ok((0..n).map(|r| children.iter().map(|c| c[r]).sum::<f64>()).collect())
}

pub fn leaf_likelihood(
    spn: &Spn,
    id: NodeId,
    _children: &[&Vec<f64>],
    data: &DataMatrix,
) -> Result<Vec<f64>> {
    leaves::probability(spn, id, data)
}

pub fn leaf_log_likelihood(
    spn: &Spn,
    id: NodeId,
    _children: &[&Vec<f64>],
    data: &DataMatrix,
) -> Result<Vec<f64>> {
    leaves::log_probability(spn, id, data)
}
