//! Hierarchical document encoding of a materialized tree.

use std::io;

use serde::Serialize;

use crate::types::OpeningEntry;

use super::TreeNode;

/// Root document: entry metadata plus the weighted move tree.
#[derive(Debug, Clone, Serialize)]
pub struct OpeningDocument {
    /// Version of the exported shape.
    pub schema_version: String,
    /// Stable lowercase slug.
    pub id: String,
    /// Opening name.
    pub name: String,
    /// Taxonomy code.
    pub code: String,
    /// Canonical text of the root position.
    pub root_fingerprint: String,
    /// Root continuations, standard notation, most popular first.
    pub root_responses: Vec<String>,
    /// Root continuation weights, same order.
    pub root_weights: Vec<f64>,
    /// Nested move tree below the root.
    pub moves: Vec<DocumentNode>,
}

/// One move in the document tree.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentNode {
    /// The move, standard notation.
    pub san: String,
    /// Canonical text of the resulting position.
    pub fingerprint: String,
    /// Popularity share among kept siblings.
    pub weight: f64,
    /// White-relative evaluation in centipawns, when annotated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eval_cp: Option<i32>,
    /// Best reply, when annotated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_move: Option<String>,
    /// Dubious flag, omitted when false.
    #[serde(skip_serializing_if = "is_false")]
    pub dubious: bool,
    /// Busted flag, omitted when false.
    #[serde(skip_serializing_if = "is_false")]
    pub busted: bool,
    /// Aggregated game count, omitted when zero.
    #[serde(skip_serializing_if = "is_zero")]
    pub game_count: u64,
    /// White score percentage, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub white_win_pct: Option<f64>,
    /// Terminal structure label, when labeled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structure: Option<String>,
    /// Continuations of this move, most popular first.
    pub responses: Vec<String>,
    /// Continuation weights, same order.
    pub weights: Vec<f64>,
    /// Nested children.
    pub children: Vec<DocumentNode>,
}

fn is_false(v: &bool) -> bool {
    !v
}

fn is_zero(v: &u64) -> bool {
    *v == 0
}

fn document_node(tree: &TreeNode) -> DocumentNode {
    DocumentNode {
        san: tree.node.san.clone(),
        fingerprint: tree.node.fingerprint.as_str().to_string(),
        weight: tree.weight,
        eval_cp: tree.node.evaluation.as_ref().map(|e| e.score_cp),
        best_move: tree.node.evaluation.as_ref().and_then(|e| e.best_move.clone()),
        dubious: tree.node.dubious,
        busted: tree.node.busted,
        game_count: tree.node.game_count,
        white_win_pct: tree.node.white_win_pct,
        structure: tree.node.structure.clone(),
        responses: tree.responses().iter().map(|s| s.to_string()).collect(),
        weights: tree.weights(),
        children: tree.children.iter().map(document_node).collect(),
    }
}

/// Build the document for an entry from its materialized tree.
pub fn document(entry: &OpeningEntry, tree: &TreeNode) -> OpeningDocument {
    OpeningDocument {
        schema_version: crate::GRAPH_SCHEMA_VERSION.to_string(),
        id: entry.slug(),
        name: entry.name.clone(),
        code: entry.code.clone(),
        root_fingerprint: tree.node.fingerprint.as_str().to_string(),
        root_responses: tree.responses().iter().map(|s| s.to_string()).collect(),
        root_weights: tree.weights(),
        moves: tree.children.iter().map(document_node).collect(),
    }
}

/// Serialize a document as pretty-printed JSON.
pub fn write_document<W: io::Write>(document: &OpeningDocument, writer: W) -> io::Result<()> {
    serde_json::to_writer_pretty(writer, document).map_err(io::Error::from)
}
