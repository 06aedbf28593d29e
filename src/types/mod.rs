//! Core types for the opening graph.

pub mod edge;
pub mod entry;
pub mod node;

pub use edge::{ChildEdge, TranspositionEdge};
pub use entry::OpeningEntry;
pub use node::{Evaluation, Fingerprint, NodeDraft, NodeId, PositionNode, Side, MATE_CAP_CP};
