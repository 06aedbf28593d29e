//! Decoupled annotation passes.
//!
//! Both passes run strictly after crawl completion, never concurrently
//! with graph mutation, and never overwrite a populated field: the
//! store's fill-once writes make a repeated pass a no-op.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::eval::{EvalError, Evaluator, StructureLabeler};
use crate::policy::AnnotatePolicy;
use crate::store::PositionStore;
use crate::types::{PositionNode, Side};

/// Error type for annotation passes.
#[derive(Debug, thiserror::Error)]
pub enum AnnotateError {
    /// Store failure.
    #[error("store error: {0}")]
    Store(String),
}

impl AnnotateError {
    fn from_store<E: std::error::Error>(e: E) -> Self {
        Self::Store(e.to_string())
    }
}

/// Counters for one evaluation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluationReport {
    /// Nodes evaluated and written.
    pub evaluated: usize,
    /// Nodes skipped (already evaluated, or evaluator gave up).
    pub skipped: usize,
    /// Unavailable-evaluator retries.
    pub retries: usize,
}

/// Counters for one labeling pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelReport {
    /// Leaves labeled.
    pub labeled: usize,
}

/// A move is dubious when it concedes ≥0.5 pawns from the mover's
/// perspective. The score is White-relative; `side` is who just moved.
pub fn is_dubious(score_cp: i32, side: Side) -> bool {
    match side {
        Side::White => score_cp <= -50,
        Side::Black => score_cp >= 50,
    }
}

/// A move is busted when it concedes ≥1.5 pawns from the mover's
/// perspective.
pub fn is_busted(score_cp: i32, side: Side) -> bool {
    match side {
        Side::White => score_cp <= -150,
        Side::Black => score_cp >= 150,
    }
}

/// Strength-evaluation pass over branching nodes and graph leaves.
pub struct EvaluationPass<S, E> {
    store: Arc<S>,
    evaluator: Arc<E>,
    policy: AnnotatePolicy,
}

impl<S, E> EvaluationPass<S, E>
where
    S: PositionStore,
    E: Evaluator,
{
    /// Create an evaluation pass.
    pub fn new(store: Arc<S>, evaluator: Arc<E>, policy: AnnotatePolicy) -> Self {
        Self { store, evaluator, policy }
    }

    fn depth_for(&self, node: &PositionNode) -> u32 {
        if node.branching {
            if node.game_count >= self.policy.high_traffic_threshold {
                self.policy.depth_high_traffic
            } else {
                self.policy.depth_branching
            }
        } else {
            self.policy.depth_leaf
        }
    }

    /// Annotate every candidate the store reports, most popular first.
    pub async fn run(&self) -> Result<EvaluationReport, AnnotateError> {
        let candidates = self
            .store
            .unevaluated()
            .await
            .map_err(AnnotateError::from_store)?;
        let mut report = EvaluationReport::default();
        let started = Instant::now();

        'nodes: for node in candidates {
            let budget_exhausted = || {
                self.policy
                    .time_budget
                    .is_some_and(|b| started.elapsed() >= b)
            };
            if budget_exhausted() {
                info!(evaluated = report.evaluated, "evaluation pass budget exhausted");
                break;
            }

            let depth = self.depth_for(&node);
            let mut attempted_retry = false;
            let evaluation = loop {
                match self.evaluator.evaluate(&node.fingerprint, depth).await {
                    Ok(evaluation) => break evaluation,
                    Err(EvalError::Unavailable) => {
                        // Never drop without at least one retry; with a
                        // budget, keep retrying until it runs out.
                        if attempted_retry && (self.policy.time_budget.is_none() || budget_exhausted()) {
                            warn!(position = %node.fingerprint, "evaluator unavailable, node skipped");
                            report.skipped += 1;
                            continue 'nodes;
                        }
                        attempted_retry = true;
                        report.retries += 1;
                        tokio::time::sleep(self.policy.retry_delay).await;
                    }
                    Err(e) => {
                        warn!(position = %node.fingerprint, error = %e, "evaluation failed, node skipped");
                        report.skipped += 1;
                        continue 'nodes;
                    }
                }
            };

            let dubious = is_dubious(evaluation.score_cp, node.side);
            let busted = is_busted(evaluation.score_cp, node.side);
            let written = self
                .store
                .set_evaluation(&node.id, evaluation, dubious, busted)
                .await
                .map_err(AnnotateError::from_store)?;
            if written {
                report.evaluated += 1;
            } else {
                report.skipped += 1;
            }
        }

        info!(
            evaluated = report.evaluated,
            skipped = report.skipped,
            retries = report.retries,
            "evaluation pass complete"
        );
        Ok(report)
    }
}

/// Terminal-structure labeling pass over unlabeled graph leaves.
pub struct LabelPass<S, L> {
    store: Arc<S>,
    labeler: Arc<L>,
}

impl<S, L> LabelPass<S, L>
where
    S: PositionStore,
    L: StructureLabeler,
{
    /// Create a labeling pass.
    pub fn new(store: Arc<S>, labeler: Arc<L>) -> Self {
        Self { store, labeler }
    }

    /// Label every unlabeled leaf. Positions no rule matches are
    /// recorded as "Unknown".
    pub async fn run(&self) -> Result<LabelReport, AnnotateError> {
        let leaves = self
            .store
            .unlabeled_leaves()
            .await
            .map_err(AnnotateError::from_store)?;
        let mut report = LabelReport::default();

        for node in leaves {
            let label = self
                .labeler
                .label(&node.fingerprint)
                .unwrap_or_else(|| "Unknown".to_string());
            let written = self
                .store
                .set_structure(&node.id, &label)
                .await
                .map_err(AnnotateError::from_store)?;
            if written {
                report.labeled += 1;
            }
        }

        info!(labeled = report.labeled, "labeling pass complete");
        Ok(report)
    }
}
