//! Conditional sampling of missing values.
//!
//! Rows with missing cells are routed top-down through the network. A sum node
//! sends each row to one child, drawn with probability proportional to
//! `w_i * P_i(evidence)`; a product node sends every row to all of its
//! children. Each leaf then draws a value for its column wherever the row is
//! still missing. Observed cells are never changed.

use std::cell::RefCell;

use log::debug;
use rand::Rng;

use crate::data::DataMatrix;
use crate::error::{Result, SpnError};
use crate::eval::{Handlers, TopDownFn};
use crate::leaves;
use crate::reference::NodeId;
use crate::spn::Spn;
use crate::types::NodeType;

/// Pick an index with probability proportional to `exp(log_weights[i])`.
///
/// Returns `None` if every weight is zero.
fn draw_index<R>(log_weights: &[f64], rng: &mut R) -> Option<usize>
where
    R: Rng + ?Sized,
{
    let max = log_weights.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return None;
    }
    let weights: Vec<f64> = log_weights.iter().map(|lw| (lw - max).exp()).collect();
    let total: f64 = weights.iter().sum();
    let mut u = rng.random::<f64>() * total;
    for (i, w) in weights.iter().enumerate() {
        if u < *w {
            return Some(i);
        }
        u -= w;
    }
    // Rounding left `u` past the last bucket.
    weights.iter().rposition(|&w| w > 0.0)
}

impl Spn {
    /// Complete the missing cells of `data` with values sampled from the
    /// network rooted at `root`, conditioned on the observed cells of each row.
    ///
    /// Fails with [`SpnError::Domain`] if a row has zero likelihood, and with
    /// [`SpnError::NotImplemented`] if a leaf that must fill a cell has no
    /// distribution.
    pub fn sample<R>(&self, root: NodeId, data: &DataMatrix, rng: &mut R) -> Result<DataMatrix>
    where
        R: Rng,
    {
        let scope = self.scope(root);
        for &col in scope {
            data.check_column(col)?;
        }
        let rows: Vec<usize> = (0..data.rows())
            .filter(|&r| scope.iter().any(|&col| data.is_missing(r, col)))
            .collect();
        debug!("sample(root = {}, incomplete rows = {})", root, rows.len());
        if rows.is_empty() {
            return Ok(data.clone());
        }

        let lls = self.all_log_likelihoods(root, data)?;
        let rng = RefCell::new(rng);
        let output = RefCell::new(data.clone());

        let sum: TopDownFn<'_, Vec<usize>> =
            Box::new(|spn: &Spn, id: NodeId, inbox: &[Vec<usize>]| {
                let node = spn.node(id);
                let children = node.children();
                let log_w: Vec<f64> = node
                    .weights()
                    .unwrap_or_default()
                    .iter()
                    .map(|w| w.ln())
                    .collect();
                let mut routed = vec![Vec::new(); children.len()];
                let mut terms = vec![0.0; children.len()];
                let mut rng = rng.borrow_mut();
                for &r in inbox.iter().flatten() {
                    for (t, (lw, c)) in terms.iter_mut().zip(log_w.iter().zip(children)) {
                        *t = lw + lls[c][r];
                    }
                    let i = draw_index(&terms, &mut **rng).ok_or_else(|| {
                        SpnError::domain(format!(
                            "Row {} has zero likelihood under {}, cannot sample",
                            r, node
                        ))
                    })?;
                    routed[i].push(r);
                }
                Ok(children.iter().copied().zip(routed).collect())
            });
        let product: TopDownFn<'_, Vec<usize>> =
            Box::new(|spn: &Spn, id: NodeId, inbox: &[Vec<usize>]| {
                let rows: Vec<usize> = inbox.iter().flatten().copied().collect();
                Ok(spn.children(id).iter().map(|&c| (c, rows.clone())).collect())
            });
        let leaf: TopDownFn<'_, Vec<usize>> =
            Box::new(|spn: &Spn, id: NodeId, inbox: &[Vec<usize>]| {
                let col = spn.scope(id)[0];
                let mut output = output.borrow_mut();
                let missing: Vec<usize> = inbox
                    .iter()
                    .flatten()
                    .copied()
                    .filter(|&r| output.is_missing(r, col))
                    .collect();
                if missing.is_empty() {
                    return Ok(Vec::new());
                }
                let adapter = leaves::adapter(spn, id, "samples")?;
                let mut rng = rng.borrow_mut();
                for r in missing {
                    output.set(r, col, adapter.sample(&mut **rng)?);
                }
                Ok(Vec::new())
            });

        let handlers = Handlers::new()
            .with(NodeType::Sum, sum)
            .with(NodeType::Product, product)
            .with_leaf(leaf);
        self.evaluate_top_down(root, &handlers, rows)?;
        drop(handlers);

        Ok(output.into_inner())
    }
}
