//! External position-statistics collaborator.
//!
//! The statistics source aggregates game outcomes per continuation of a
//! position. Failures are typed: rate limiting and timeouts are retryable
//! and must never be treated as fatal; an unknown position means zero
//! continuations, not an error worth aborting over.

use async_trait::async_trait;

use crate::types::Fingerprint;

/// Aggregated outcome counts for one continuation of a position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContinuationStat {
    /// The continuation in standard notation.
    pub san: String,
    /// Games White won.
    pub white: u64,
    /// Drawn games.
    pub draws: u64,
    /// Games Black won.
    pub black: u64,
}

impl ContinuationStat {
    /// Total games observed through this continuation.
    pub fn total(&self) -> u64 {
        self.white + self.draws + self.black
    }

    /// White score percentage, `None` when no games were observed.
    pub fn white_win_pct(&self) -> Option<f64> {
        let total = self.total();
        (total > 0).then(|| self.white as f64 / total as f64 * 100.0)
    }

    /// Draw percentage, `None` when no games were observed.
    pub fn draw_pct(&self) -> Option<f64> {
        let total = self.total();
        (total > 0).then(|| self.draws as f64 / total as f64 * 100.0)
    }
}

/// Continuations reported for a position, in source order.
///
/// Source order is meaningful: it becomes the sibling rank of the
/// resulting edges.
#[derive(Debug, Clone, Default)]
pub struct ContinuationReport {
    /// Reported continuations, most popular first.
    pub moves: Vec<ContinuationStat>,
}

impl ContinuationReport {
    /// A report with zero continuations.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Error reported by the statistics source.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StatsError {
    /// The source asked us to slow down. Retry after a delay.
    #[error("statistics source rate limited")]
    RateLimited,
    /// The request timed out. Treated identically to rate limiting.
    #[error("statistics request timed out")]
    Timeout,
    /// The position is unknown to the source. Zero continuations.
    #[error("position not found in statistics source")]
    NotFound,
    /// Permanent transport or protocol failure.
    #[error("statistics transport failure: {0}")]
    Transport(String),
}

impl StatsError {
    /// Whether the failure should be retried rather than dropped.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited | Self::Timeout)
    }
}

/// External statistics source.
#[async_trait]
pub trait StatsSource: Send + Sync {
    /// Fetch aggregated continuations for a position.
    async fn continuations(&self, position: &Fingerprint) -> Result<ContinuationReport, StatsError>;
}
