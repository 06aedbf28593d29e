//! Tree materialization: recursive graph-to-artifact projection.
//!
//! One traversal serves every output format. At each node the kept
//! children are those meeting the popularity floor, sorted descending by
//! popularity (ties by sibling rank), each weighted by its share of the
//! kept popularity mass. Encoders differ only in how they serialize the
//! resulting weighted tree.

pub mod book;
pub mod document;
pub mod movetext;
pub mod tabular;

use std::future::Future;
use std::pin::Pin;

use crate::policy::MaterializePolicy;
use crate::store::{LinkRegistry, PositionStore};
use crate::types::{NodeId, PositionNode};

pub use book::{collect_records, write_book, BookRecord, BOOK_RECORD_LEN};
pub use document::{document, write_document, DocumentNode, OpeningDocument};
pub use movetext::write_movetext;
pub use tabular::write_tabular;

/// Error type for materialization.
#[derive(Debug, thiserror::Error)]
pub enum MaterializeError {
    /// The requested node does not exist.
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),
    /// Store or registry failure.
    #[error("store error: {0}")]
    Store(String),
}

impl MaterializeError {
    fn from_store<E: std::error::Error>(e: E) -> Self {
        Self::Store(e.to_string())
    }
}

/// A node in a materialized tree with its edge weight.
///
/// `weight` is this node's share of its parent's kept popularity mass;
/// the root carries 1.0. Children are ordered descending by popularity.
#[derive(Debug, Clone)]
pub struct TreeNode {
    /// The underlying graph node.
    pub node: PositionNode,
    /// Popularity share of the edge leading here, in [0, 1].
    pub weight: f64,
    /// Kept children, descending by popularity.
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Total nodes in the subtree, this node included.
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(TreeNode::len).sum::<usize>()
    }

    /// Whether the subtree is a single node.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Child moves in order, standard notation.
    pub fn responses(&self) -> Vec<&str> {
        self.children.iter().map(|c| c.node.san.as_str()).collect()
    }

    /// Child weights, in response order.
    pub fn weights(&self) -> Vec<f64> {
        self.children.iter().map(|c| c.weight).collect()
    }
}

/// Project the graph below `root` into a weighted, depth-bounded tree.
pub async fn materialize<S>(
    store: &S,
    root: &NodeId,
    policy: &MaterializePolicy,
) -> Result<TreeNode, MaterializeError>
where
    S: PositionStore + LinkRegistry + Sync,
{
    build(store, root, 0, policy).await
}

fn build<'a, S>(
    store: &'a S,
    id: &'a NodeId,
    depth: u32,
    policy: &'a MaterializePolicy,
) -> Pin<Box<dyn Future<Output = Result<TreeNode, MaterializeError>> + Send + 'a>>
where
    S: PositionStore + LinkRegistry + Sync,
{
    Box::pin(async move {
        let node = store
            .get(id)
            .await
            .map_err(MaterializeError::from_store)?
            .ok_or(MaterializeError::NodeNotFound(*id))?;
        let mut tree = TreeNode { node, weight: 1.0, children: Vec::new() };

        if depth >= policy.max_depth {
            return Ok(tree);
        }

        let edges = store
            .children_of(id)
            .await
            .map_err(MaterializeError::from_store)?;
        let mut kept: Vec<(PositionNode, u32)> = Vec::with_capacity(edges.len());
        for edge in edges {
            if let Some(child) = store
                .get(&edge.child)
                .await
                .map_err(MaterializeError::from_store)?
            {
                if child.game_count >= policy.popularity_floor {
                    kept.push((child, edge.rank));
                }
            }
        }
        if kept.is_empty() {
            return Ok(tree);
        }

        kept.sort_by(|a, b| {
            b.0.game_count
                .cmp(&a.0.game_count)
                .then_with(|| a.1.cmp(&b.1))
        });

        let total: u64 = kept.iter().map(|(child, _)| child.game_count).sum();
        let mut weights: Vec<f64> = if total > 0 {
            kept.iter()
                .map(|(child, _)| child.game_count as f64 / total as f64)
                .collect()
        } else {
            // Floor of zero can keep children with no recorded games.
            vec![1.0 / kept.len() as f64; kept.len()]
        };

        let sum: f64 = weights.iter().sum();
        if (sum - 1.0).abs() > policy.weight_tolerance && sum > 0.0 {
            for w in &mut weights {
                *w /= sum;
            }
        }

        for ((child, _), weight) in kept.into_iter().zip(weights) {
            let mut subtree = build(store, &child.id, depth + 1, policy).await?;
            subtree.weight = weight;
            tree.children.push(subtree);
        }
        Ok(tree)
    })
}
