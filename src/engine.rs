//! Move/position engine collaborator.
//!
//! Move legality and notation live outside this crate. The engine maps a
//! position plus a move in standard notation to the resulting position,
//! its fingerprint, and the move's board coordinates. Invalid and
//! ambiguous moves come back as typed errors, never panics.

use crate::types::{Fingerprint, Side};

/// Promotion piece of a pawn move, when any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Promotion {
    /// Promotion to knight.
    Knight,
    /// Promotion to bishop.
    Bishop,
    /// Promotion to rook.
    Rook,
    /// Promotion to queen.
    Queen,
}

impl Promotion {
    /// Packed-descriptor index (knight = 1 … queen = 4).
    pub fn index(&self) -> u16 {
        match self {
            Self::Knight => 1,
            Self::Bishop => 2,
            Self::Rook => 3,
            Self::Queen => 4,
        }
    }
}

/// Board coordinates of a move, squares numbered 0–63 (a1 = 0, h8 = 63).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MoveCoords {
    /// Origin square.
    pub from: u8,
    /// Target square.
    pub to: u8,
    /// Promotion piece, if the move promotes.
    pub promotion: Option<Promotion>,
}

impl MoveCoords {
    /// Pack into the 16-bit book descriptor:
    /// `to | from << 6 | promotion_index << 12`.
    pub fn packed(&self) -> u16 {
        let promo = self.promotion.map(|p| p.index()).unwrap_or(0);
        (self.to as u16) | ((self.from as u16) << 6) | (promo << 12)
    }
}

/// Result of applying a legal move to a position.
#[derive(Debug, Clone)]
pub struct PlayedMove {
    /// Fingerprint of the resulting position.
    pub fingerprint: Fingerprint,
    /// Board coordinates of the move.
    pub coords: MoveCoords,
    /// Full-move number of the move just played.
    pub move_number: u16,
    /// Side that just moved.
    pub side_moved: Side,
}

/// Error applying a move to a position.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MoveError {
    /// The move is not legal in the given position.
    #[error("illegal move {san} in position {fingerprint}")]
    Illegal {
        /// The rejected move.
        san: String,
        /// Position the move was attempted in.
        fingerprint: Fingerprint,
    },
    /// The notation matches more than one legal move.
    #[error("ambiguous move {san} in position {fingerprint}")]
    Ambiguous {
        /// The ambiguous move.
        san: String,
        /// Position the move was attempted in.
        fingerprint: Fingerprint,
    },
}

/// Move-legality/notation collaborator.
///
/// Implementations are pure: the same (position, move) pair always
/// produces the same result.
pub trait MoveEngine: Send + Sync {
    /// Fingerprint of the starting position.
    fn initial(&self) -> Fingerprint;

    /// Apply a move in standard notation to a position.
    fn apply(&self, position: &Fingerprint, san: &str) -> Result<PlayedMove, MoveError>;
}
