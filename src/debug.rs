//! Debug utilities for inspecting network structure.
//!
//! These helpers are primarily useful in tests and during development.

use std::collections::HashSet;
use std::fmt;

use crate::reference::NodeId;
use crate::spn::Spn;

/// Summary of a single node, as listed by [`Spn::debug_graph`].
#[derive(Debug, Clone)]
pub struct NodeInfo {
    pub node: NodeId,
    /// Topological id, if assigned
    pub id: Option<usize>,
    /// `Display` of the node (type, scope and parameters)
    pub label: String,
    pub children: Vec<NodeId>,
}

impl fmt::Display for NodeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.node)?;
        if let Some(id) = self.id {
            write!(f, " (id={})", id)?;
        }
        write!(f, " {}", self.label)?;
        if !self.children.is_empty() {
            let children: Vec<String> = self.children.iter().map(|c| c.to_string()).collect();
            write!(f, " -> [{}]", children.join(", "))?;
        }
        Ok(())
    }
}

/// Flat BFS listing of the unique nodes under one or more roots.
#[derive(Debug, Clone)]
pub struct SpnGraph {
    pub roots: Vec<NodeId>,
    pub nodes: Vec<NodeInfo>,
}

impl fmt::Display for SpnGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let roots: Vec<String> = self.roots.iter().map(|r| r.to_string()).collect();
        writeln!(
            f,
            "SPN graph (roots = [{}], size = {}):",
            roots.join(", "),
            self.nodes.len()
        )?;
        for node in &self.nodes {
            writeln!(f, "  {}", node)?;
        }
        Ok(())
    }
}

/// Indented rendering of the subtree under a node, see [`Spn::tree`].
pub struct Tree<'a> {
    spn: &'a Spn,
    root: NodeId,
}

impl Tree<'_> {
    fn write_node(
        &self,
        f: &mut fmt::Formatter<'_>,
        id: NodeId,
        depth: usize,
        path: &mut HashSet<NodeId>,
    ) -> fmt::Result {
        let indent = "  ".repeat(depth);
        if !path.insert(id) {
            return writeln!(f, "{}<cycle at {}>", indent, id);
        }
        writeln!(f, "{}{}", indent, self.spn.node(id))?;
        for &c in self.spn.children(id) {
            self.write_node(f, c, depth + 1, path)?;
        }
        path.remove(&id);
        Ok(())
    }
}

impl fmt::Display for Tree<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_node(f, self.root, 0, &mut HashSet::new())
    }
}

impl Spn {
    pub fn node_info(&self, node: NodeId) -> NodeInfo {
        let n = self.node(node);
        NodeInfo {
            node,
            id: n.id(),
            label: n.to_string(),
            children: n.children().to_vec(),
        }
    }

    /// All unique nodes reachable from `root`, in BFS order.
    pub fn debug_graph(&self, root: NodeId) -> SpnGraph {
        self.debug_graph_from(&[root])
    }

    pub fn debug_graph_from(&self, roots: &[NodeId]) -> SpnGraph {
        let mut nodes = Vec::new();
        self.breadth_first_from(roots, |id, _| nodes.push(self.node_info(id)));
        SpnGraph {
            roots: roots.to_vec(),
            nodes,
        }
    }

    /// The subtree under `root`, one node per line, indented by depth.
    ///
    /// Shared nodes are repeated under every parent.
    pub fn tree(&self, root: NodeId) -> Tree<'_> {
        Tree { spn: self, root }
    }

    pub fn to_tree_string(&self, root: NodeId) -> String {
        self.tree(root).to_string()
    }

    /// Print the subtree under `root` to stdout.
    pub fn print_treelike(&self, root: NodeId) {
        print!("{}", self.tree(root));
    }

    /// Print the BFS node listing under `root` to stdout.
    pub fn print_node_graph(&self, root: NodeId) {
        print!("{}", self.debug_graph(root));
    }

    /// Print one BFS node listing covering all of `roots` to stdout.
    pub fn print_node_graph_from(&self, roots: &[NodeId]) {
        print!("{}", self.debug_graph_from(roots));
    }
}
