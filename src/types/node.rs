//! Position node types for the opening graph.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::canonical::position_key;

/// Evaluation scores at or beyond this magnitude represent forced mate.
pub const MATE_CAP_CP: i32 = 1000;

/// Unique identifier for a node in the opening graph.
///
/// Wraps a UUID and implements `Ord` for canonical pair ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(Uuid);

impl NodeId {
    /// Create a NodeId from a UUID.
    pub fn new(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Generate a fresh random NodeId.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a NodeId from a UUID string.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }

    /// Get the inner UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for NodeId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Canonical, content-derived identifier for a board position.
///
/// Two move sequences reaching the same position produce the same
/// fingerprint, independent of the path taken. The inner text is the
/// canonical position encoding supplied by the move engine.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Create a fingerprint from canonical position text.
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// The canonical position text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Position-derived 64-bit key for compact book records.
    ///
    /// Independent of the store-assigned [`NodeId`].
    pub fn key64(&self) -> u64 {
        position_key(&self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Fingerprint {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The side that played the move producing a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// White just moved.
    White,
    /// Black just moved.
    Black,
}

impl Side {
    /// The opposite side.
    pub fn other(&self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }

    /// Parse from the single-letter form used in tabular dumps.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "W" | "w" => Some(Self::White),
            "B" | "b" => Some(Self::Black),
            _ => None,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::White => write!(f, "W"),
            Self::Black => write!(f, "B"),
        }
    }
}

/// Engine evaluation of a position, White-relative centipawns.
///
/// Immutable once recorded on a node: later annotation attempts are
/// no-ops by policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Score in centipawns from White's perspective, mate capped at ±1000.
    pub score_cp: i32,
    /// Search depth the score was produced at.
    pub depth: u32,
    /// Best reply in standard notation, when the evaluator reported one.
    pub best_move: Option<String>,
}

impl Evaluation {
    /// Create an evaluation, capping mate-range scores at ±1000.
    pub fn new(score_cp: i32, depth: u32, best_move: Option<String>) -> Self {
        Self {
            score_cp: score_cp.clamp(-MATE_CAP_CP, MATE_CAP_CP),
            depth,
            best_move,
        }
    }
}

/// Incoming observation of a position, before durable identity is assigned.
///
/// Drafts are what the importer and the frontier explorer hand to
/// [`PositionStore::upsert`](crate::store::PositionStore::upsert). The store
/// either creates a node from the draft or merges the draft into the
/// existing node for the same fingerprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDraft {
    /// Canonical position identity.
    pub fingerprint: Fingerprint,
    /// Move that produced this position, standard notation.
    pub san: String,
    /// Full-move number of the producing move.
    pub move_number: u16,
    /// Side that just moved.
    pub side: Side,
    /// Taxonomy code (e.g. "C50").
    pub code: String,
    /// Opening name.
    pub name: String,
    /// Variation label, when the name carries one.
    pub variation: Option<String>,
    /// First-observed parent lineage.
    pub parent: Option<NodeId>,
    /// ≥2 continuations met the popularity floor at crawl time.
    pub branching: bool,
    /// No continuations met the popularity floor at crawl time.
    pub leaf: bool,
    /// Aggregated games observed through this position.
    pub game_count: u64,
    /// White score percentage over the aggregated games.
    pub white_win_pct: Option<f64>,
    /// Draw percentage over the aggregated games.
    pub draw_pct: Option<f64>,
}

impl NodeDraft {
    /// Create a minimal draft for a position.
    pub fn new(fingerprint: Fingerprint, san: impl Into<String>, move_number: u16, side: Side) -> Self {
        Self {
            fingerprint,
            san: san.into(),
            move_number,
            side,
            code: String::new(),
            name: String::new(),
            variation: None,
            parent: None,
            branching: false,
            leaf: false,
            game_count: 0,
            white_win_pct: None,
            draw_pct: None,
        }
    }

    /// Attach taxonomy identity.
    pub fn with_taxonomy(mut self, code: impl Into<String>, name: impl Into<String>) -> Self {
        self.code = code.into();
        self.name = name.into();
        self
    }

    /// Attach a variation label.
    pub fn with_variation(mut self, variation: Option<String>) -> Self {
        self.variation = variation;
        self
    }

    /// Attach the observed parent lineage.
    pub fn with_parent(mut self, parent: NodeId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Attach aggregated popularity statistics.
    pub fn with_stats(mut self, game_count: u64, white_win_pct: Option<f64>, draw_pct: Option<f64>) -> Self {
        self.game_count = game_count;
        self.white_win_pct = white_win_pct;
        self.draw_pct = draw_pct;
        self
    }
}

/// A tracked position in the opening graph.
///
/// Created once on first observation; thereafter only attribute-merged.
/// The fingerprint uniquely identifies a node for the lifetime of the
/// graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionNode {
    /// Durable store-assigned identity.
    pub id: NodeId,
    /// Canonical position identity.
    pub fingerprint: Fingerprint,
    /// Move that produced this position, standard notation.
    pub san: String,
    /// Full-move number of the producing move.
    pub move_number: u16,
    /// Side that just moved.
    pub side: Side,
    /// Taxonomy code (e.g. "C50").
    pub code: String,
    /// Opening name.
    pub name: String,
    /// Variation label.
    pub variation: Option<String>,
    /// First-observed parent lineage.
    pub parent: Option<NodeId>,
    /// ≥2 continuations met the popularity floor at crawl time.
    pub branching: bool,
    /// No continuations met the popularity floor at crawl time.
    pub leaf: bool,
    /// Engine evaluation, filled out-of-band after crawl. Fill-once.
    pub evaluation: Option<Evaluation>,
    /// The producing move loses ≥0.5 pawns for the mover.
    pub dubious: bool,
    /// The producing move loses ≥1.5 pawns for the mover.
    pub busted: bool,
    /// Aggregated games observed through this position.
    pub game_count: u64,
    /// White score percentage over the aggregated games.
    pub white_win_pct: Option<f64>,
    /// Draw percentage over the aggregated games.
    pub draw_pct: Option<f64>,
    /// Terminal structure label, filled out-of-band. Fill-once.
    pub structure: Option<String>,
    /// First observation time.
    pub created_at: DateTime<Utc>,
    /// Last merge that changed an attribute.
    pub updated_at: DateTime<Utc>,
}

impl PositionNode {
    /// Materialize a draft into a node with fresh identity.
    pub fn from_draft(draft: NodeDraft, now: DateTime<Utc>) -> Self {
        Self {
            id: NodeId::generate(),
            fingerprint: draft.fingerprint,
            san: draft.san,
            move_number: draft.move_number,
            side: draft.side,
            code: draft.code,
            name: draft.name,
            variation: draft.variation,
            parent: draft.parent,
            branching: draft.branching,
            leaf: draft.leaf,
            evaluation: None,
            dubious: false,
            busted: false,
            game_count: draft.game_count,
            white_win_pct: draft.white_win_pct,
            draw_pct: draft.draw_pct,
            structure: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge an incoming observation into this node.
    ///
    /// Precedence, per field class:
    /// - identifying fields (san, move number, taxonomy code, name,
    ///   variation, parent) fill only if currently empty;
    /// - boolean flags merge by logical OR;
    /// - popularity merges by max, never sum: the win/draw percentages
    ///   travel with the game count, so a strictly larger incoming count
    ///   brings its percentages and an equal-or-smaller one only fills
    ///   percentages still empty.
    ///
    /// Returns whether any attribute changed. Re-applying an identical
    /// draft is a no-op; non-conflicting drafts converge to the same node
    /// in any application order.
    pub fn merge_from(&mut self, draft: &NodeDraft) -> bool {
        debug_assert_eq!(self.fingerprint, draft.fingerprint);
        let mut changed = false;

        if self.san.is_empty() && !draft.san.is_empty() {
            self.san = draft.san.clone();
            changed = true;
        }
        if self.move_number == 0 && draft.move_number != 0 {
            self.move_number = draft.move_number;
            changed = true;
        }
        if self.code.is_empty() && !draft.code.is_empty() {
            self.code = draft.code.clone();
            changed = true;
        }
        if self.name.is_empty() && !draft.name.is_empty() {
            self.name = draft.name.clone();
            changed = true;
        }
        if self.variation.is_none() && draft.variation.is_some() {
            self.variation = draft.variation.clone();
            changed = true;
        }
        if self.parent.is_none() && draft.parent.is_some() {
            self.parent = draft.parent;
            changed = true;
        }

        if draft.branching && !self.branching {
            self.branching = true;
            changed = true;
        }
        if draft.leaf && !self.leaf {
            self.leaf = true;
            changed = true;
        }

        if draft.game_count > self.game_count {
            self.game_count = draft.game_count;
            if draft.white_win_pct.is_some() {
                self.white_win_pct = draft.white_win_pct;
            }
            if draft.draw_pct.is_some() {
                self.draw_pct = draft.draw_pct;
            }
            changed = true;
        } else {
            if self.white_win_pct.is_none() && draft.white_win_pct.is_some() {
                self.white_win_pct = draft.white_win_pct;
                changed = true;
            }
            if self.draw_pct.is_none() && draft.draw_pct.is_some() {
                self.draw_pct = draft.draw_pct;
                changed = true;
            }
        }

        changed
    }
}

impl PartialEq for PositionNode {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for PositionNode {}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(fp: &str) -> NodeDraft {
        NodeDraft::new(Fingerprint::new(fp), "e4", 1, Side::White)
    }

    #[test]
    fn test_node_id_ordering() {
        let a = NodeId::new(Uuid::from_u128(1));
        let b = NodeId::new(Uuid::from_u128(2));
        assert!(a < b);
    }

    #[test]
    fn test_fingerprint_key64_stable() {
        let fp = Fingerprint::new("rnbqkbnr/pppppppp 0 1");
        assert_eq!(fp.key64(), fp.key64());
        assert_ne!(fp.key64(), Fingerprint::new("other").key64());
    }

    #[test]
    fn test_evaluation_mate_cap() {
        assert_eq!(Evaluation::new(32_000, 22, None).score_cp, MATE_CAP_CP);
        assert_eq!(Evaluation::new(-32_000, 22, None).score_cp, -MATE_CAP_CP);
        assert_eq!(Evaluation::new(35, 22, None).score_cp, 35);
    }

    #[test]
    fn test_merge_fill_only_if_empty() {
        let now = Utc::now();
        let mut node = PositionNode::from_draft(draft("fp").with_taxonomy("C50", "Italian Game"), now);

        let other = draft("fp").with_taxonomy("C51", "Evans Gambit");
        node.merge_from(&other);

        assert_eq!(node.code, "C50");
        assert_eq!(node.name, "Italian Game");
    }

    #[test]
    fn test_merge_flags_or() {
        let now = Utc::now();
        let mut node = PositionNode::from_draft(draft("fp"), now);
        assert!(!node.branching);

        let mut branching = draft("fp");
        branching.branching = true;
        assert!(node.merge_from(&branching));
        assert!(node.branching);

        // OR never clears
        assert!(!node.merge_from(&draft("fp")));
        assert!(node.branching);
    }

    #[test]
    fn test_merge_popularity_max_not_sum() {
        let now = Utc::now();
        let mut node = PositionNode::from_draft(draft("fp").with_stats(100, Some(52.0), Some(30.0)), now);

        // Independent crawl path re-observes the same aggregate
        node.merge_from(&draft("fp").with_stats(100, Some(52.0), Some(30.0)));
        assert_eq!(node.game_count, 100);

        // Larger aggregate wins and brings its percentages
        node.merge_from(&draft("fp").with_stats(250, Some(55.0), Some(28.0)));
        assert_eq!(node.game_count, 250);
        assert_eq!(node.white_win_pct, Some(55.0));

        // Smaller aggregate changes nothing
        assert!(!node.merge_from(&draft("fp").with_stats(10, Some(99.0), Some(1.0))));
        assert_eq!(node.game_count, 250);
        assert_eq!(node.white_win_pct, Some(55.0));
    }

    #[test]
    fn test_merge_idempotent() {
        let now = Utc::now();
        let base = draft("fp")
            .with_taxonomy("B20", "Sicilian Defense")
            .with_stats(40, Some(48.5), Some(33.0));
        let mut node = PositionNode::from_draft(base.clone(), now);

        assert!(!node.merge_from(&base));
        let snapshot = node.clone();
        node.merge_from(&base);
        assert_eq!(node.game_count, snapshot.game_count);
        assert_eq!(node.code, snapshot.code);
        assert_eq!(node.white_win_pct, snapshot.white_win_pct);
    }
}
