use std::fmt::{Display, Formatter};

/// Handle to a node stored in an [`Spn`][crate::spn::Spn] arena.
///
/// Two handles are equal iff they point to the same node. Structural
/// comparison is a separate operation, see [`Spn::equals`][crate::spn::Spn::equals].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Return the index of the node in the arena.
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Return the internal representation of the handle.
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "@{}", self.0)
    }
}
