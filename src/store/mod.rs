//! Graph storage: the canonical position store and the link registry.
//!
//! Both traits are implemented by the same backend and shared, behind an
//! `Arc`, by every component that mutates or reads the graph. All writes
//! are idempotent at the key level; that is what makes concurrent and
//! duplicate writers safe without a global lock.

pub mod memory;

use async_trait::async_trait;

use crate::types::{ChildEdge, Evaluation, Fingerprint, NodeDraft, NodeId, OpeningEntry, PositionNode};

/// Canonical position store keyed by fingerprint.
///
/// One node per position: `upsert` creates on first observation and
/// merges attributes thereafter, under the precedence documented on
/// [`PositionNode::merge_from`]. Readers always see either a well-formed
/// node or a typed "not found" (`Ok(None)`), never a partial record.
#[async_trait]
pub trait PositionStore: Send + Sync {
    /// Error type for store operations.
    type Error: std::error::Error + Send + Sync;

    /// Create-or-merge a position observation. Returns the node with
    /// durable identity.
    async fn upsert(&self, draft: NodeDraft) -> Result<PositionNode, Self::Error>;

    /// Fetch a node by fingerprint.
    async fn lookup(&self, fingerprint: &Fingerprint) -> Result<Option<PositionNode>, Self::Error>;

    /// Fetch a node by id.
    async fn get(&self, id: &NodeId) -> Result<Option<PositionNode>, Self::Error>;

    /// Parent-less nodes carrying a taxonomy code, i.e. the crawl seeds.
    async fn taxonomy_roots(&self) -> Result<Vec<PositionNode>, Self::Error>;

    /// OR-set the branching flag.
    async fn mark_branching(&self, id: &NodeId) -> Result<(), Self::Error>;

    /// OR-set the leaf flag.
    async fn mark_leaf(&self, id: &NodeId) -> Result<(), Self::Error>;

    /// Record an evaluation and its derived soundness flags. Fill-once:
    /// returns `false` without writing when an evaluation is already
    /// present.
    async fn set_evaluation(
        &self,
        id: &NodeId,
        evaluation: Evaluation,
        dubious: bool,
        busted: bool,
    ) -> Result<bool, Self::Error>;

    /// Record a terminal-structure label. Fill-once: returns `false`
    /// without writing when a label is already present.
    async fn set_structure(&self, id: &NodeId, label: &str) -> Result<bool, Self::Error>;

    /// Evaluation candidates: branching nodes and graph leaves without a
    /// recorded evaluation, most popular first.
    async fn unevaluated(&self) -> Result<Vec<PositionNode>, Self::Error>;

    /// Graph leaves (no recorded continuations) without a structure label.
    async fn unlabeled_leaves(&self) -> Result<Vec<PositionNode>, Self::Error>;

    /// Every node, in fingerprint order.
    async fn all_nodes(&self) -> Result<Vec<PositionNode>, Self::Error>;

    /// Create-or-refresh a named opening entry keyed by (code, name).
    async fn upsert_entry(&self, code: &str, name: &str, root: NodeId) -> Result<OpeningEntry, Self::Error>;

    /// Every opening entry, in (code, name) order.
    async fn entries(&self) -> Result<Vec<OpeningEntry>, Self::Error>;

    /// Durability checkpoint. Called once per fully-processed parent
    /// during the crawl; a no-op for backends that are always durable
    /// (or never are, like the in-memory one).
    async fn commit(&self) -> Result<(), Self::Error>;
}

/// Parent→child edges (ranked) and transposition links (unordered pairs).
#[async_trait]
pub trait LinkRegistry: Send + Sync {
    /// Error type for registry operations.
    type Error: std::error::Error + Send + Sync;

    /// Idempotent upsert of a ranked parent→child edge. Re-observation
    /// refreshes the rank.
    async fn add_edge(&self, parent: NodeId, child: NodeId, rank: u32) -> Result<(), Self::Error>;

    /// Insert a transposition link. The pair is canonicalized; self-pairs
    /// are dropped. Returns whether a new link was stored.
    async fn add_transposition(&self, a: NodeId, b: NodeId) -> Result<bool, Self::Error>;

    /// Child edges of a parent, ascending by rank.
    async fn children_of(&self, parent: &NodeId) -> Result<Vec<ChildEdge>, Self::Error>;

    /// Distinct parents of a child, ascending by id.
    async fn parents_of(&self, child: &NodeId) -> Result<Vec<NodeId>, Self::Error>;

    /// Symmetric closure over stored transposition pairs for a node.
    async fn transpositions_of(&self, id: &NodeId) -> Result<Vec<NodeId>, Self::Error>;

    /// Children with more than one distinct parent, with their parents:
    /// the batch transposition detector's input.
    async fn multi_parent_children(&self) -> Result<Vec<(NodeId, Vec<NodeId>)>, Self::Error>;
}

pub use memory::{MemoryGraphStore, MemoryStoreError};
