//! External strength-evaluator and terminal-structure collaborators.

use async_trait::async_trait;

use crate::types::{Evaluation, Fingerprint};

/// Error reported by the strength evaluator.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EvalError {
    /// The evaluator is temporarily unavailable. Retryable.
    #[error("evaluator unavailable")]
    Unavailable,
    /// The evaluator rejected the position.
    #[error("evaluation failed: {0}")]
    Failed(String),
}

/// External strength evaluator.
///
/// Scores are White-relative centipawns with mate capped at ±1000; the
/// cap is enforced again by [`Evaluation::new`] on the way in.
#[async_trait]
pub trait Evaluator: Send + Sync {
    /// Evaluate a position under a depth budget.
    async fn evaluate(&self, position: &Fingerprint, depth: u32) -> Result<Evaluation, EvalError>;
}

/// Rule-based terminal-structure labeler.
///
/// Maps a position with no recorded continuations to a descriptive label,
/// or `None` when no rule matches.
pub trait StructureLabeler: Send + Sync {
    /// Label a terminal position.
    fn label(&self, position: &Fingerprint) -> Option<String>;
}
