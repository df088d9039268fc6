//! Graph traversals over the nodes reachable from a root.
//!
//! Every traversal deduplicates nodes by identity ([`NodeId`]), so shared
//! subgraphs are visited once no matter how many parents reference them.

use std::collections::{HashMap, HashSet, VecDeque};

use log::debug;

use crate::error::{Result, SpnError};
use crate::node::Node;
use crate::reference::NodeId;
use crate::spn::Spn;

type Parents = HashMap<NodeId, Vec<NodeId>>;

impl Spn {
    /// Visit every node reachable from `root` exactly once, in breadth-first order.
    pub fn breadth_first<F>(&self, root: NodeId, visit: F)
    where
        F: FnMut(NodeId, &Node),
    {
        self.breadth_first_from(&[root], visit)
    }

    /// Like [`breadth_first`][Spn::breadth_first], starting from several roots
    /// at once. A node shared between roots is visited once.
    pub fn breadth_first_from<F>(&self, roots: &[NodeId], mut visit: F)
    where
        F: FnMut(NodeId, &Node),
    {
        let mut seen = HashSet::new();
        let mut queue: VecDeque<NodeId> =
            roots.iter().copied().filter(|&r| seen.insert(r)).collect();
        while let Some(id) = queue.pop_front() {
            let node = self.node(id);
            visit(id, node);
            for &c in node.children() {
                if seen.insert(c) {
                    queue.push_back(c);
                }
            }
        }
    }

    /// All unique nodes reachable from `root` that satisfy `predicate`, in BFS order.
    pub fn collect_by_type<P>(&self, root: NodeId, predicate: P) -> Vec<NodeId>
    where
        P: Fn(&Node) -> bool,
    {
        let mut result = Vec::new();
        self.breadth_first(root, |id, node| {
            if predicate(node) {
                result.push(id);
            }
        });
        result
    }

    /// All unique nodes reachable from `root`, in BFS order.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        self.collect_by_type(root, |_| true)
    }

    /// Leaves reachable from `root`, in BFS order.
    pub fn leaves(&self, root: NodeId) -> Vec<NodeId> {
        self.leaves_from(&[root])
    }

    /// Unique leaves reachable from any of `roots`, in BFS order.
    pub fn leaves_from(&self, roots: &[NodeId]) -> Vec<NodeId> {
        let mut result = Vec::new();
        self.breadth_first_from(roots, |id, node| {
            if node.is_leaf() {
                result.push(id);
            }
        });
        result
    }

    /// Number of unique `(sum, product, leaf)` nodes reachable from `root`.
    pub fn node_counts(&self, root: NodeId) -> (usize, usize, usize) {
        self.node_counts_from(&[root])
    }

    /// Number of unique `(sum, product, leaf)` nodes reachable from any of `roots`.
    pub fn node_counts_from(&self, roots: &[NodeId]) -> (usize, usize, usize) {
        let mut counts = (0, 0, 0);
        self.breadth_first_from(roots, |_, node| {
            if node.is_sum() {
                counts.0 += 1;
            } else if node.is_product() {
                counts.1 += 1;
            } else {
                counts.2 += 1;
            }
        });
        counts
    }

    /// Parent links and child counts within `nodes`.
    fn in_degrees(&self, nodes: &[NodeId]) -> (Parents, HashMap<NodeId, usize>) {
        let mut parents = Parents::new();
        let mut in_degree = HashMap::new();
        for &n in nodes {
            let children = self.children(n);
            in_degree.insert(n, children.len());
            for &c in children {
                parents.entry(c).or_default().push(n);
            }
        }
        (parents, in_degree)
    }

    /// Nodes under `root` ordered so that every node comes after all of its children.
    ///
    /// Kahn's algorithm over parent links. Fails with [`SpnError::Structural`]
    /// if some node is never released, i.e. the graph has a cycle.
    pub fn topological_order(&self, root: NodeId) -> Result<Vec<NodeId>> {
        let nodes = self.descendants(root);
        let (parents, mut in_degree) = self.in_degrees(&nodes);

        let mut queue: VecDeque<NodeId> = nodes
            .iter()
            .copied()
            .filter(|n| in_degree[n] == 0)
            .collect();
        let mut order = Vec::with_capacity(nodes.len());
        while let Some(n) = queue.pop_front() {
            order.push(n);
            for &m in parents.get(&n).into_iter().flatten() {
                let d = in_degree.entry(m).or_default();
                *d -= 1;
                if *d == 0 {
                    queue.push_back(m);
                }
            }
        }

        if order.len() != nodes.len() {
            return Err(SpnError::structural(format!(
                "Graph is not a DAG, it has at least one cycle ({} of {} nodes sorted)",
                order.len(),
                nodes.len()
            )));
        }
        debug!("topological_order(root = {}) -> {} nodes", root, order.len());
        Ok(order)
    }

    /// Nodes under `root` grouped into layers.
    ///
    /// Layer 0 holds the nodes without children (leaves); a node lands in
    /// the layer right after the last of its children has been released, so
    /// the root is alone in the last layer.
    pub fn layered_topological_order(&self, root: NodeId) -> Result<Vec<Vec<NodeId>>> {
        let nodes = self.descendants(root);
        let (parents, mut in_degree) = self.in_degrees(&nodes);

        let first: Vec<NodeId> = nodes
            .iter()
            .copied()
            .filter(|n| in_degree[n] == 0)
            .collect();
        let mut added = first.len();
        let mut layers = vec![first];
        loop {
            let mut layer = Vec::new();
            for n in layers.last().into_iter().flatten() {
                for &m in parents.get(n).into_iter().flatten() {
                    let d = in_degree.entry(m).or_default();
                    *d -= 1;
                    if *d == 0 {
                        layer.push(m);
                    }
                }
            }
            if layer.is_empty() {
                break;
            }
            added += layer.len();
            layers.push(layer);
        }

        if added != nodes.len() {
            return Err(SpnError::structural(format!(
                "Graph is not a DAG, it has at least one cycle ({} of {} nodes layered)",
                added,
                nodes.len()
            )));
        }
        debug!(
            "layered_topological_order(root = {}) -> {} layers",
            root,
            layers.len()
        );
        Ok(layers)
    }

    /// Number nodes under `root` sequentially in topological order.
    ///
    /// The numbering depends only on the structure, so repeated calls assign
    /// the same ids.
    pub fn set_node_ids(&self, root: NodeId) -> Result<()> {
        for (i, id) in self.topological_order(root)?.into_iter().enumerate() {
            self.node(id).set_id(i);
        }
        Ok(())
    }
}
