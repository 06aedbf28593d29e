//! # opening-graph
//!
//! Position-graph construction and consolidation for chess opening
//! theory.
//!
//! The engine maintains one canonical node per board position, merges
//! every later observation into it without losing recorded data, links
//! positions reachable by more than one move order, grows the graph
//! against an external statistics source under rate and time budgets,
//! and projects the finished graph into weighted, depth-bounded output
//! trees.
//!
//! ## Architecture
//!
//! ```text
//! Taxonomy rows → Importer ─┐
//!                           ├→ PositionStore + LinkRegistry ←─ FrontierExplorer ←→ StatsSource
//! Evaluator / Labeler ──────┘              ↑
//!                                TranspositionDetector
//!                                          ↓
//!                                   materialize() → document | book | movetext | tabular
//! ```
//!
//! ## Invariants
//!
//! - A fingerprint maps to exactly one node; creation happens once,
//!   everything after is an attribute merge.
//! - Merges never discard data: fill-once identity, OR'd flags,
//!   max'd popularity, first-writer-wins evaluation.
//! - Every write is idempotent, so an interrupted crawl resumes by
//!   re-walking the frontier.
//! - Transposition pairs are stored smaller-id-first; self-pairs are
//!   dropped.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod annotator;
pub mod canonical;
pub mod detector;
pub mod engine;
pub mod eval;
pub mod explorer;
pub mod importer;
pub mod materialize;
pub mod policy;
pub mod stats;
pub mod store;
pub mod types;

// Re-exports
pub use types::{
    ChildEdge, Evaluation, Fingerprint, NodeDraft, NodeId, OpeningEntry, PositionNode, Side,
    TranspositionEdge, MATE_CAP_CP,
};
pub use canonical::{position_key, position_key_hex};
pub use engine::{MoveCoords, MoveEngine, MoveError, PlayedMove, Promotion};
pub use stats::{ContinuationReport, ContinuationStat, StatsError, StatsSource};
pub use eval::{EvalError, Evaluator, StructureLabeler};
pub use store::{LinkRegistry, MemoryGraphStore, MemoryStoreError, PositionStore};
pub use policy::{AnnotatePolicy, CrawlPolicy, MaterializePolicy};
pub use importer::{import_taxonomy, ImportError, ImportReport, TaxonomyRecord};
pub use explorer::{CrawlReport, ExplorerError, FrontierExplorer};
pub use detector::{resolve_transpositions, DetectorError, DetectorReport};
pub use annotator::{
    is_busted, is_dubious, AnnotateError, EvaluationPass, EvaluationReport, LabelPass, LabelReport,
};
pub use materialize::{
    collect_records, document, materialize, write_book, write_document, write_movetext,
    write_tabular, BookRecord, DocumentNode, MaterializeError, OpeningDocument, TreeNode,
    BOOK_RECORD_LEN,
};

/// Schema version for persisted artifacts.
/// Increment on breaking changes to any exported shape.
pub const GRAPH_SCHEMA_VERSION: &str = "1.0.0";
