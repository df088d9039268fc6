//! Traversal and structure tests.
//!
//! Tests cover shared subgraphs, cycles introduced by graph surgery, node ids
//! and structural equality.

use std::collections::HashMap;

use spn_rs::data::DataMatrix;
use spn_rs::dispatch::NetworkType;
use spn_rs::leaves::{Bernoulli, Gaussian};
use spn_rs::node::Node;
use spn_rs::reference::NodeId;
use spn_rs::spn::Spn;

/// Chain of `depth` sum nodes, each mixing a fresh product with the previous
/// level, all sharing the same two leaves.
fn ladder(spn: &mut Spn, depth: usize) -> (NodeId, NodeId, NodeId) {
    let x = spn.mk_leaf(&[0], Gaussian::new(0.0, 1.0).unwrap()).unwrap();
    let y = spn.mk_leaf(&[1], Bernoulli::new(0.3).unwrap()).unwrap();
    let mut top = spn.mk_product(&[x, y], &[0, 1]).unwrap();
    for _ in 0..depth {
        let p = spn.mk_product(&[x, y], &[0, 1]).unwrap();
        top = spn.mk_sum(&[p, top], &[0, 1], Some(&[0.5, 0.5])).unwrap();
    }
    (top, x, y)
}

// ─── Shared subgraphs ──────────────────────────────────────────────────────────

#[test]
fn shared_leaves_visited_once() {
    let mut spn = Spn::default();
    let (root, x, y) = ladder(&mut spn, 10);
    // 10 sums + 11 products + 2 leaves.
    assert_eq!(spn.descendants(root).len(), 23);
    assert_eq!(spn.node_counts(root), (10, 11, 2));
    let leaves = spn.leaves(root);
    assert_eq!(leaves.len(), 2);
    assert!(leaves.contains(&x) && leaves.contains(&y));
}

#[test]
fn topological_order_respects_edges() {
    let mut spn = Spn::default();
    let (root, _, _) = ladder(&mut spn, 6);
    let order = spn.topological_order(root).unwrap();
    assert_eq!(order.len(), spn.descendants(root).len());
    assert_eq!(*order.last().unwrap(), root);
    let position: HashMap<NodeId, usize> =
        order.iter().enumerate().map(|(i, &id)| (id, i)).collect();
    for &n in &order {
        for c in spn.children(n) {
            assert!(position[c] < position[&n]);
        }
    }
}

#[test]
fn layers_start_with_leaves() {
    let mut spn = Spn::default();
    let (root, _, _) = ladder(&mut spn, 3);
    let layers = spn.layered_topological_order(root).unwrap();
    assert!(layers[0].iter().all(|&id| spn.node(id).is_leaf()));
    assert_eq!(layers.last().unwrap(), &vec![root]);
    let total: usize = layers.iter().map(Vec::len).sum();
    assert_eq!(total, spn.descendants(root).len());
}

#[test]
fn deep_ladder_likelihood() {
    let mut spn = Spn::default();
    let (root, _, _) = ladder(&mut spn, 50);
    // Every level mixes identical components, so the root equals one product.
    let data = DataMatrix::from_rows([[0.0, 1.0]]).unwrap();
    let lik = spn.likelihood(NetworkType::Spn, root, &data).unwrap();
    let expected = 0.398_942_280_401_432_7 * 0.3;
    assert!((lik[0] - expected).abs() < 1e-12);
}

// ─── Cycles ────────────────────────────────────────────────────────────────────

#[test]
fn cycle_is_reported_not_hung() {
    let mut spn = Spn::default();
    let (root, _, _) = ladder(&mut spn, 3);
    let below = spn.children(root)[1];
    // Point the inner sum back at the root.
    spn.replace_child(below, 1, root).unwrap();

    assert!(spn.topological_order(root).unwrap_err().is_structural());
    assert!(spn.layered_topological_order(root).unwrap_err().is_structural());
    let data = DataMatrix::from_rows([[0.0, 1.0]]).unwrap();
    assert!(spn
        .likelihood(NetworkType::Spn, root, &data)
        .unwrap_err()
        .is_structural());
    assert!(spn.log_gradients(root, &data).unwrap_err().is_structural());
    // Structural equality and traversals still terminate.
    assert!(spn.equals(root, root));
    assert!(!spn.descendants(root).is_empty());
}

#[test]
fn replace_child_keeps_scope() {
    let mut spn = Spn::default();
    let (root, x, _) = ladder(&mut spn, 1);
    let err = spn.replace_child(root, 0, x).unwrap_err();
    assert!(err.is_structural());
    assert!(spn.replace_child(root, 5, x).unwrap_err().is_structural());
}

// ─── Ids and equality ──────────────────────────────────────────────────────────

#[test]
fn node_ids_follow_topological_order() {
    let mut spn = Spn::default();
    let (root, _, _) = ladder(&mut spn, 4);
    spn.set_node_ids(root).unwrap();
    let order = spn.topological_order(root).unwrap();
    for (i, &id) in order.iter().enumerate() {
        assert_eq!(spn.node(id).id(), Some(i));
    }
}

#[test]
fn structural_equality_across_managers() {
    let mut a = Spn::default();
    let mut b = Spn::default();
    let (ra, _, _) = ladder(&mut a, 4);
    let (rb, _, _) = ladder(&mut b, 4);
    assert!(a.equals_in(ra, &b, rb));

    let (rc, _, _) = ladder(&mut b, 3);
    assert!(!a.equals_in(ra, &b, rc));

    b.set_weights(rb, &[0.5 + 1e-9, 0.5 - 1e-9]).unwrap();
    assert!(a.equals_in(ra, &b, rb));
    b.set_weights(rb, &[0.25, 0.75]).unwrap();
    assert!(!a.equals_in(ra, &b, rb));

    let products = a.collect_by_type(ra, Node::is_product);
    assert_eq!(products.len(), 5);
}
