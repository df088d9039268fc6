//! Log-space gradients of the root likelihood with respect to every node.
//!
//! The gradient of the root with respect to a node is the sum, over all of its
//! parents, of the parent's gradient times the partial derivative along the
//! edge. For a sum parent that derivative is the edge weight; for a product
//! parent it is the product of the likelihoods of the other children. Both
//! are accumulated in log-space by the top-down evaluator.

use std::collections::HashMap;

use log::debug;

use crate::data::DataMatrix;
use crate::error::{Result, SpnError};
use crate::eval::{Handlers, TopDownFn};
use crate::reference::NodeId;
use crate::spn::Spn;
use crate::types::NodeType;
use crate::utils::log_sum_exp;

/// Row-wise log-sum-exp over the messages received by a node.
fn combine(inbox: &[Vec<f64>], rows: usize) -> Result<Vec<f64>> {
    if let Some(m) = inbox.iter().find(|m| m.len() != rows) {
        return Err(SpnError::shape(format!(
            "gradient message has {} rows, expected {}",
            m.len(),
            rows
        )));
    }
    let mut terms = Vec::with_capacity(inbox.len());
    Ok((0..rows)
        .map(|r| {
            terms.clear();
            terms.extend(inbox.iter().map(|m| m[r]));
            log_sum_exp(&terms)
        })
        .collect())
}

impl Spn {
    /// Per-row `ln(d root / d node)` for every node under `root`.
    ///
    /// The root's own entry is all zeros. Node likelihoods are those of
    /// [`log_likelihood`](Spn::log_likelihood) in the SPN context, so missing
    /// cells are marginalized as usual.
    pub fn log_gradients(
        &self,
        root: NodeId,
        data: &DataMatrix,
    ) -> Result<HashMap<NodeId, Vec<f64>>> {
        debug!("log_gradients(root = {}, rows = {})", root, data.rows());
        let rows = data.rows();
        let lls = self.all_log_likelihoods(root, data)?;

        let sum: TopDownFn<'_, Vec<f64>> =
            Box::new(|spn: &Spn, id: NodeId, inbox: &[Vec<f64>]| {
                let g = combine(inbox, rows)?;
                let node = spn.node(id);
                let weights = node.weights().unwrap_or_default();
                Ok(node
                    .children()
                    .iter()
                    .zip(weights)
                    .map(|(&c, w)| {
                        let lw = w.ln();
                        (c, g.iter().map(|g| g + lw).collect())
                    })
                    .collect())
            });
        let product: TopDownFn<'_, Vec<f64>> =
            Box::new(|spn: &Spn, id: NodeId, inbox: &[Vec<f64>]| {
                let g = combine(inbox, rows)?;
                let children = spn.children(id);
                Ok(children
                    .iter()
                    .enumerate()
                    .map(|(i, &c)| {
                        let message = (0..rows)
                            .map(|r| {
                                let others: f64 = children
                                    .iter()
                                    .enumerate()
                                    .filter(|&(j, _)| j != i)
                                    .map(|(_, o)| lls[o][r])
                                    .sum();
                                g[r] + others
                            })
                            .collect();
                        (c, message)
                    })
                    .collect())
            });
        let leaf: TopDownFn<'_, Vec<f64>> =
            Box::new(|_: &Spn, _: NodeId, _: &[Vec<f64>]| Ok(Vec::new()));

        let handlers = Handlers::new()
            .with(NodeType::Sum, sum)
            .with(NodeType::Product, product)
            .with_leaf(leaf);
        let messages = self.evaluate_top_down(root, &handlers, vec![0.0; rows])?;

        messages
            .into_iter()
            .map(|(id, inbox)| Ok((id, combine(&inbox, rows)?)))
            .collect()
    }
}
