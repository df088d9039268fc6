//! Likelihood queries and other bottom-up folds over a network.
//!
//! [`Spn::likelihood`] and [`Spn::log_likelihood`] evaluate every row of a
//! [`DataMatrix`] at once and return one value per row. Missing (`NaN`) cells
//! are marginalized by the leaves, so a fully missing row has likelihood 1.

use std::collections::HashMap;

use log::debug;
use num_bigint::BigUint;

use crate::data::DataMatrix;
use crate::dispatch::{Inference, NetworkType, Registry};
use crate::error::Result;
use crate::eval::{BottomUpFn, Handlers};
use crate::leaves;
use crate::reference::NodeId;
use crate::spn::Spn;
use crate::types::NodeType;

impl Spn {
    /// Per-row probabilities of `data` under the network rooted at `root`.
    pub fn likelihood(
        &self,
        context: NetworkType,
        root: NodeId,
        data: &DataMatrix,
    ) -> Result<Vec<f64>> {
        self.infer_with(&Registry::default(), context, Inference::Likelihood, root, data)
    }

    /// Per-row log-probabilities; `exp` of the result equals [`likelihood`](Spn::likelihood).
    pub fn log_likelihood(
        &self,
        context: NetworkType,
        root: NodeId,
        data: &DataMatrix,
    ) -> Result<Vec<f64>> {
        self.infer_with(&Registry::default(), context, Inference::LogLikelihood, root, data)
    }

    /// Run `inference` with the handlers of a custom `registry`.
    ///
    /// After a single-row query, every node under `root` holds its own result
    /// in its scratch [`value`][crate::node::Node::value]; otherwise the
    /// scratch values are reset to `NaN`.
    pub fn infer_with(
        &self,
        registry: &Registry,
        context: NetworkType,
        inference: Inference,
        root: NodeId,
        data: &DataMatrix,
    ) -> Result<Vec<f64>> {
        debug!(
            "infer_with(context = {}, inference = {:?}, root = {}, rows = {})",
            context,
            inference,
            root,
            data.rows()
        );
        let handlers = registry.bottom_up(context, inference, data)?;
        let mut results = HashMap::new();
        let res = self.evaluate_bottom_up(root, &handlers, Some(&mut results))?;

        let single = data.rows() == 1;
        for (id, values) in &results {
            self.node(*id)
                .set_value(if single { values[0] } else { f64::NAN });
        }
        Ok(res)
    }

    /// Per-row log-likelihoods of every node under `root`, with the SPN handlers.
    pub(crate) fn all_log_likelihoods(
        &self,
        root: NodeId,
        data: &DataMatrix,
    ) -> Result<HashMap<NodeId, Vec<f64>>> {
        let registry = Registry::default();
        let handlers = registry.bottom_up(NetworkType::Spn, Inference::LogLikelihood, data)?;
        let mut results = HashMap::new();
        self.evaluate_bottom_up(root, &handlers, Some(&mut results))?;
        Ok(results)
    }

    /// Per-row probabilities of a single leaf.
    pub fn node_likelihood(&self, id: NodeId, data: &DataMatrix) -> Result<Vec<f64>> {
        leaves::probability(self, id, data)
    }

    /// Per-row log-probabilities of a single leaf.
    pub fn node_log_likelihood(&self, id: NodeId, data: &DataMatrix) -> Result<Vec<f64>> {
        leaves::log_probability(self, id, data)
    }

    /// Number of induced trees of the network: sums add the counts of their
    /// children, products multiply them, and each leaf counts as one.
    pub fn count_induced_trees(&self, root: NodeId) -> Result<BigUint> {
        let sum: BottomUpFn<'_, BigUint> =
            Box::new(|_: &Spn, _: NodeId, children: &[&BigUint]| {
                Ok(children.iter().copied().sum())
            });
        let product: BottomUpFn<'_, BigUint> =
            Box::new(|_: &Spn, _: NodeId, children: &[&BigUint]| {
                Ok(children.iter().copied().product())
            });
        let leaf: BottomUpFn<'_, BigUint> =
            Box::new(|_: &Spn, _: NodeId, _: &[&BigUint]| Ok(BigUint::from(1u32)));
        let handlers = Handlers::new()
            .with(NodeType::Sum, sum)
            .with(NodeType::Product, product)
            .with_leaf(leaf);
        self.evaluate_bottom_up(root, &handlers, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    use crate::dispatch::HandlerKey;
    use crate::leaves::{Gaussian, Leaf};

    fn normal(spn: &mut Spn, v: usize) -> NodeId {
        spn.mk_leaf(&[v], Gaussian::new(0.0, 1.0).unwrap()).unwrap()
    }

    fn two_component_mixture(spn: &mut Spn) -> NodeId {
        let x1 = normal(spn, 0);
        let y1 = normal(spn, 1);
        let p1 = spn.mk_product(&[x1, y1], &[0, 1]).unwrap();
        let x2 = spn.mk_leaf(&[0], Gaussian::new(1.0, 2.0).unwrap()).unwrap();
        let y2 = spn.mk_leaf(&[1], Gaussian::new(-1.0, 1.0).unwrap()).unwrap();
        let p2 = spn.mk_product(&[x2, y2], &[0, 1]).unwrap();
        spn.mk_sum(&[p1, p2], &[0, 1], Some(&[0.3, 0.7])).unwrap()
    }

    #[test]
    fn test_likelihood_matches_log_likelihood() {
        let mut spn = Spn::default();
        let root = two_component_mixture(&mut spn);
        let data =
            DataMatrix::from_rows([[0.5, -0.2], [f64::NAN, 1.0], [2.0, f64::NAN]]).unwrap();
        let lik = spn.likelihood(NetworkType::Spn, root, &data).unwrap();
        let log_lik = spn.log_likelihood(NetworkType::Spn, root, &data).unwrap();
        assert_eq!(lik.len(), 3);
        for (l, ll) in lik.iter().zip(&log_lik) {
            assert!((l - ll.exp()).abs() <= 1e-6 * l.abs());
        }
    }

    #[test]
    fn test_fully_missing_row() {
        let mut spn = Spn::default();
        let root = two_component_mixture(&mut spn);
        let data = DataMatrix::missing(2, 2);
        let lik = spn.likelihood(NetworkType::Spn, root, &data).unwrap();
        let log_lik = spn.log_likelihood(NetworkType::Spn, root, &data).unwrap();
        for r in 0..2 {
            assert!((lik[r] - 1.0).abs() < 1e-12);
            assert!(log_lik[r].abs() < 1e-12);
        }
    }

    #[test]
    fn test_scratch_values() {
        let mut spn = Spn::default();
        let root = two_component_mixture(&mut spn);
        let data = DataMatrix::from_rows([[0.0, 0.0]]).unwrap();
        let lik = spn.likelihood(NetworkType::Spn, root, &data).unwrap();
        assert_eq!(spn.node(root).value(), lik[0]);
        let leaf = spn.leaves(root)[0];
        assert!(spn.node(leaf).value() > 0.0);

        let data = DataMatrix::from_rows([[0.0, 0.0], [1.0, 1.0]]).unwrap();
        spn.likelihood(NetworkType::Spn, root, &data).unwrap();
        assert!(spn.node(root).value().is_nan());
    }

    #[test]
    fn test_conditional_context_not_implemented() {
        let mut spn = Spn::default();
        let root = two_component_mixture(&mut spn);
        let data = DataMatrix::from_rows([[0.0, 0.0]]).unwrap();
        let err = spn
            .likelihood(NetworkType::Conditional, root, &data)
            .unwrap_err();
        assert!(err.is_not_implemented());
    }

    #[test]
    fn test_custom_context_handlers() {
        let mut registry = Registry::default();
        let ctx = NetworkType::Conditional;
        let inf = Inference::Likelihood;
        registry.register(ctx, inf, NodeType::Sum, crate::dispatch::sum_likelihood);
        registry.register(ctx, inf, NodeType::Product, crate::dispatch::prod_likelihood);
        registry.register(ctx, inf, HandlerKey::AnyLeaf, crate::dispatch::leaf_likelihood);

        let mut spn = Spn::default();
        let root = two_component_mixture(&mut spn);
        let data = DataMatrix::from_rows([[0.0, 0.0]]).unwrap();
        let expected = spn.likelihood(NetworkType::Spn, root, &data).unwrap();
        let res = spn.infer_with(&registry, ctx, inf, root, &data).unwrap();
        assert_eq!(res, expected);
    }

    #[test]
    fn test_leaf_without_distribution() {
        let mut spn = Spn::default();
        let x = spn.mk_leaf(&[0], Leaf::Unparameterized).unwrap();
        let y = normal(&mut spn, 1);
        let p = spn.mk_product(&[x, y], &[0, 1]).unwrap();
        let data = DataMatrix::from_rows([[0.0, 0.0]]).unwrap();
        let err = spn.likelihood(NetworkType::Spn, p, &data).unwrap_err();
        assert!(err.is_not_implemented());
        assert!(err.to_string().contains("does not provide"));

        let err = spn.node_likelihood(p, &data).unwrap_err();
        assert!(err.to_string().contains("cannot provide"));
        assert!(spn.node_log_likelihood(y, &data).is_ok());
    }

    #[test]
    fn test_count_induced_trees() {
        let mut spn = Spn::default();
        let root = two_component_mixture(&mut spn);
        assert_eq!(spn.count_induced_trees(root).unwrap(), BigUint::from(2u32));

        // Product of two binary mixtures: 2 * 2 trees.
        let a1 = normal(&mut spn, 0);
        let a2 = normal(&mut spn, 0);
        let a = spn.mk_sum(&[a1, a2], &[0], None).unwrap();
        let b1 = normal(&mut spn, 1);
        let b2 = normal(&mut spn, 1);
        let b = spn.mk_sum(&[b1, b2], &[1], None).unwrap();
        let p = spn.mk_product(&[a, b], &[0, 1]).unwrap();
        let s = spn.mk_sum(&[p, root], &[0, 1], None).unwrap();
        assert_eq!(spn.count_induced_trees(s).unwrap(), BigUint::from(6u32));
    }
}
