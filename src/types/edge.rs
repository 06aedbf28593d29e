//! Edge types for the opening graph.

use serde::{Deserialize, Serialize};

use super::node::NodeId;

/// Directed parent→child edge, ranked among its siblings.
///
/// Unique per (parent, child); the rank is upserted on re-observation.
/// Multiple parents per child are legal; that is how transpositions
/// appear in the link structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChildEdge {
    /// Parent node (position before the move).
    pub parent: NodeId,
    /// Child node (position after the move).
    pub child: NodeId,
    /// Sibling order as reported by the statistics source.
    pub rank: u32,
}

impl ChildEdge {
    /// Create a ranked parent→child edge.
    pub fn new(parent: NodeId, child: NodeId, rank: u32) -> Self {
        Self { parent, child, rank }
    }
}

// Canonical ordering: parent, then rank, then child.
impl PartialOrd for ChildEdge {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ChildEdge {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.parent
            .cmp(&other.parent)
            .then_with(|| self.rank.cmp(&other.rank))
            .then_with(|| self.child.cmp(&other.child))
    }
}

/// Undirected transposition link between two nodes.
///
/// Stored as an ordered pair (smaller id first) so re-insertion in either
/// orientation is idempotent. Self-pairs are invalid and cannot be
/// constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TranspositionEdge {
    /// Smaller endpoint.
    pub a: NodeId,
    /// Larger endpoint.
    pub b: NodeId,
}

impl TranspositionEdge {
    /// Canonicalize an unordered pair. Returns `None` for self-pairs.
    pub fn new(x: NodeId, y: NodeId) -> Option<Self> {
        if x == y {
            return None;
        }
        let (a, b) = if x < y { (x, y) } else { (y, x) };
        Some(Self { a, b })
    }

    /// The endpoint opposite `id`, if `id` is an endpoint.
    pub fn other(&self, id: &NodeId) -> Option<NodeId> {
        if *id == self.a {
            Some(self.b)
        } else if *id == self.b {
            Some(self.a)
        } else {
            None
        }
    }
}
