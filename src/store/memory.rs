//! In-memory graph store.
//!
//! Uses BTree collections for deterministic iteration order and a
//! `parking_lot::RwLock` so the explorer's concurrent workers can share
//! one handle. Guards are never held across an await point.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::types::{
    ChildEdge, Evaluation, Fingerprint, NodeDraft, NodeId, OpeningEntry, PositionNode,
    TranspositionEdge,
};

use super::{LinkRegistry, PositionStore};

/// Error type for the in-memory store.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MemoryStoreError {
    /// Node not found.
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),
}

#[derive(Debug, Default)]
struct Inner {
    nodes: BTreeMap<NodeId, PositionNode>,
    by_fingerprint: BTreeMap<Fingerprint, NodeId>,
    /// parent → child → rank
    children: BTreeMap<NodeId, BTreeMap<NodeId, u32>>,
    parents: BTreeMap<NodeId, BTreeSet<NodeId>>,
    transpositions: BTreeSet<TranspositionEdge>,
    entries: BTreeMap<(String, String), OpeningEntry>,
}

impl Inner {
    fn has_children(&self, id: &NodeId) -> bool {
        self.children.get(id).is_some_and(|c| !c.is_empty())
    }
}

/// In-memory implementation of [`PositionStore`] and [`LinkRegistry`].
#[derive(Debug, Default)]
pub struct MemoryGraphStore {
    inner: RwLock<Inner>,
}

impl MemoryGraphStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.inner.read().nodes.len()
    }

    /// Number of parent→child edges.
    pub fn num_edges(&self) -> usize {
        self.inner.read().children.values().map(|c| c.len()).sum()
    }

    /// Number of transposition links.
    pub fn num_transpositions(&self) -> usize {
        self.inner.read().transpositions.len()
    }
}

#[async_trait]
impl PositionStore for MemoryGraphStore {
    type Error = MemoryStoreError;

    async fn upsert(&self, draft: NodeDraft) -> Result<PositionNode, Self::Error> {
        let mut inner = self.inner.write();
        if let Some(id) = inner.by_fingerprint.get(&draft.fingerprint).copied() {
            let node = inner
                .nodes
                .get_mut(&id)
                .ok_or(MemoryStoreError::NodeNotFound(id))?;
            if node.merge_from(&draft) {
                node.updated_at = Utc::now();
            }
            Ok(node.clone())
        } else {
            let node = PositionNode::from_draft(draft, Utc::now());
            inner.by_fingerprint.insert(node.fingerprint.clone(), node.id);
            inner.nodes.insert(node.id, node.clone());
            Ok(node)
        }
    }

    async fn lookup(&self, fingerprint: &Fingerprint) -> Result<Option<PositionNode>, Self::Error> {
        let inner = self.inner.read();
        Ok(inner
            .by_fingerprint
            .get(fingerprint)
            .and_then(|id| inner.nodes.get(id))
            .cloned())
    }

    async fn get(&self, id: &NodeId) -> Result<Option<PositionNode>, Self::Error> {
        Ok(self.inner.read().nodes.get(id).cloned())
    }

    async fn taxonomy_roots(&self) -> Result<Vec<PositionNode>, Self::Error> {
        Ok(self
            .inner
            .read()
            .nodes
            .values()
            .filter(|n| n.parent.is_none() && !n.code.is_empty())
            .cloned()
            .collect())
    }

    async fn mark_branching(&self, id: &NodeId) -> Result<(), Self::Error> {
        let mut inner = self.inner.write();
        let node = inner
            .nodes
            .get_mut(id)
            .ok_or(MemoryStoreError::NodeNotFound(*id))?;
        if !node.branching {
            node.branching = true;
            node.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn mark_leaf(&self, id: &NodeId) -> Result<(), Self::Error> {
        let mut inner = self.inner.write();
        let node = inner
            .nodes
            .get_mut(id)
            .ok_or(MemoryStoreError::NodeNotFound(*id))?;
        if !node.leaf {
            node.leaf = true;
            node.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn set_evaluation(
        &self,
        id: &NodeId,
        evaluation: Evaluation,
        dubious: bool,
        busted: bool,
    ) -> Result<bool, Self::Error> {
        let mut inner = self.inner.write();
        let node = inner
            .nodes
            .get_mut(id)
            .ok_or(MemoryStoreError::NodeNotFound(*id))?;
        if node.evaluation.is_some() {
            return Ok(false);
        }
        node.evaluation = Some(evaluation);
        node.dubious |= dubious;
        node.busted |= busted;
        node.updated_at = Utc::now();
        Ok(true)
    }

    async fn set_structure(&self, id: &NodeId, label: &str) -> Result<bool, Self::Error> {
        let mut inner = self.inner.write();
        let node = inner
            .nodes
            .get_mut(id)
            .ok_or(MemoryStoreError::NodeNotFound(*id))?;
        if node.structure.is_some() {
            return Ok(false);
        }
        node.structure = Some(label.to_string());
        node.updated_at = Utc::now();
        Ok(true)
    }

    async fn unevaluated(&self) -> Result<Vec<PositionNode>, Self::Error> {
        let inner = self.inner.read();
        let mut candidates: Vec<PositionNode> = inner
            .nodes
            .values()
            .filter(|n| n.evaluation.is_none() && (n.branching || !inner.has_children(&n.id)))
            .cloned()
            .collect();
        candidates.sort_by(|a, b| b.game_count.cmp(&a.game_count).then_with(|| a.id.cmp(&b.id)));
        Ok(candidates)
    }

    async fn unlabeled_leaves(&self) -> Result<Vec<PositionNode>, Self::Error> {
        let inner = self.inner.read();
        Ok(inner
            .nodes
            .values()
            .filter(|n| n.structure.is_none() && !inner.has_children(&n.id))
            .cloned()
            .collect())
    }

    async fn all_nodes(&self) -> Result<Vec<PositionNode>, Self::Error> {
        let inner = self.inner.read();
        Ok(inner
            .by_fingerprint
            .values()
            .filter_map(|id| inner.nodes.get(id))
            .cloned()
            .collect())
    }

    async fn upsert_entry(&self, code: &str, name: &str, root: NodeId) -> Result<OpeningEntry, Self::Error> {
        let mut inner = self.inner.write();
        let key = (code.to_string(), name.to_string());
        let entry = inner
            .entries
            .entry(key)
            .and_modify(|e| e.root = root)
            .or_insert_with(|| OpeningEntry {
                id: NodeId::generate(),
                code: code.to_string(),
                name: name.to_string(),
                root,
                resolution_nodes: Vec::new(),
            });
        Ok(entry.clone())
    }

    async fn entries(&self) -> Result<Vec<OpeningEntry>, Self::Error> {
        Ok(self.inner.read().entries.values().cloned().collect())
    }

    async fn commit(&self) -> Result<(), Self::Error> {
        Ok(())
    }
}

#[async_trait]
impl LinkRegistry for MemoryGraphStore {
    type Error = MemoryStoreError;

    async fn add_edge(&self, parent: NodeId, child: NodeId, rank: u32) -> Result<(), Self::Error> {
        let mut inner = self.inner.write();
        inner.children.entry(parent).or_default().insert(child, rank);
        inner.parents.entry(child).or_default().insert(parent);
        Ok(())
    }

    async fn add_transposition(&self, a: NodeId, b: NodeId) -> Result<bool, Self::Error> {
        let Some(edge) = TranspositionEdge::new(a, b) else {
            return Ok(false);
        };
        Ok(self.inner.write().transpositions.insert(edge))
    }

    async fn children_of(&self, parent: &NodeId) -> Result<Vec<ChildEdge>, Self::Error> {
        let inner = self.inner.read();
        let mut edges: Vec<ChildEdge> = inner
            .children
            .get(parent)
            .map(|m| {
                m.iter()
                    .map(|(child, rank)| ChildEdge::new(*parent, *child, *rank))
                    .collect()
            })
            .unwrap_or_default();
        edges.sort();
        Ok(edges)
    }

    async fn parents_of(&self, child: &NodeId) -> Result<Vec<NodeId>, Self::Error> {
        Ok(self
            .inner
            .read()
            .parents
            .get(child)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default())
    }

    async fn transpositions_of(&self, id: &NodeId) -> Result<Vec<NodeId>, Self::Error> {
        Ok(self
            .inner
            .read()
            .transpositions
            .iter()
            .filter_map(|edge| edge.other(id))
            .collect())
    }

    async fn multi_parent_children(&self) -> Result<Vec<(NodeId, Vec<NodeId>)>, Self::Error> {
        Ok(self
            .inner
            .read()
            .parents
            .iter()
            .filter(|(_, parents)| parents.len() > 1)
            .map(|(child, parents)| (*child, parents.iter().copied().collect()))
            .collect())
    }
}
