//! Frontier explorer: bounded-concurrency breadth-first graph expansion.
//!
//! Grows the graph from all taxonomy roots against the external
//! statistics source. Each frontier item moves through
//! Queued → Requesting → {Applied | Retrying | Dropped}: the request is
//! gated by a counting permit, a rate-limit or timeout re-enqueues the
//! item unchanged after a fixed delay, and all writes for one parent are
//! applied and committed before its children enter the frontier. Every
//! write is an idempotent upsert, so an interrupted crawl re-walks the
//! frontier without corrupting committed state.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::engine::MoveEngine;
use crate::policy::CrawlPolicy;
use crate::stats::{ContinuationReport, StatsError, StatsSource};
use crate::store::{LinkRegistry, PositionStore};
use crate::types::{Fingerprint, NodeDraft, PositionNode};

/// Error type for the explorer.
#[derive(Debug, thiserror::Error)]
pub enum ExplorerError {
    /// Store or registry failure.
    #[error("store error: {0}")]
    Store(String),
    /// A crawl task failed to complete.
    #[error("crawl task failed: {0}")]
    Task(String),
}

impl ExplorerError {
    /// Create a store error from any error type.
    pub fn from_store<E: std::error::Error>(e: E) -> Self {
        Self::Store(e.to_string())
    }
}

/// Counters for a finished (or interrupted) crawl.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    /// Parents fully processed and committed.
    pub parents_processed: usize,
    /// New nodes created.
    pub nodes_created: usize,
    /// Transposition links recorded inline.
    pub transpositions_linked: usize,
    /// Rate-limit/timeout re-enqueues.
    pub retries: usize,
    /// Items dropped: depth-capped or permanently failed.
    pub dropped: usize,
    /// Continuations rejected by the move engine.
    pub moves_skipped: usize,
    /// Items still queued when the time budget ran out.
    pub frontier_remaining: usize,
}

/// A node queued for expansion, with its distance from the seed roots.
#[derive(Debug, Clone)]
struct FrontierItem {
    node: PositionNode,
    depth: u32,
}

enum ParentOutcome {
    Applied {
        enqueue: Vec<FrontierItem>,
        created: usize,
        transpositions: usize,
        skipped: usize,
    },
    Retry(FrontierItem),
    Dropped {
        fingerprint: Fingerprint,
        reason: String,
    },
}

/// Breadth-first frontier explorer.
pub struct FrontierExplorer<S, M, X> {
    store: Arc<S>,
    engine: Arc<M>,
    source: Arc<X>,
    policy: CrawlPolicy,
    permits: Arc<Semaphore>,
}

impl<S, M, X> FrontierExplorer<S, M, X>
where
    S: PositionStore + LinkRegistry + Send + Sync + 'static,
    M: MoveEngine + 'static,
    X: StatsSource + 'static,
{
    /// Create an explorer. The permit pool size is taken from the policy;
    /// a zero pool is treated as one.
    pub fn new(store: Arc<S>, engine: Arc<M>, source: Arc<X>, mut policy: CrawlPolicy) -> Self {
        policy.max_concurrency = policy.max_concurrency.max(1);
        let permits = Arc::new(Semaphore::new(policy.max_concurrency));
        Self { store, engine, source, policy, permits }
    }

    /// The crawl policy.
    pub fn policy(&self) -> &CrawlPolicy {
        &self.policy
    }

    /// Run the crawl to frontier exhaustion or the time budget, whichever
    /// comes first.
    pub async fn crawl(&self) -> Result<CrawlReport, ExplorerError> {
        let roots = self
            .store
            .taxonomy_roots()
            .await
            .map_err(ExplorerError::from_store)?;
        if roots.is_empty() {
            warn!("no taxonomy roots in store; nothing to crawl");
            return Ok(CrawlReport::default());
        }

        let mut frontier: VecDeque<FrontierItem> = roots
            .into_iter()
            .map(|node| FrontierItem { node, depth: 0 })
            .collect();
        let mut report = CrawlReport::default();
        let started = Instant::now();
        let mut inflight: JoinSet<Result<ParentOutcome, ExplorerError>> = JoinSet::new();

        loop {
            let budget_exhausted = self
                .policy
                .time_budget
                .is_some_and(|b| started.elapsed() >= b);

            if !budget_exhausted {
                while inflight.len() < self.policy.max_concurrency {
                    match frontier.pop_front() {
                        Some(item) if item.depth >= self.policy.max_depth => {
                            report.dropped += 1;
                        }
                        Some(item) => {
                            inflight.spawn(Self::expand_parent(
                                Arc::clone(&self.store),
                                Arc::clone(&self.engine),
                                Arc::clone(&self.source),
                                Arc::clone(&self.permits),
                                self.policy.clone(),
                                item,
                            ));
                        }
                        None => break,
                    }
                }
            }

            match inflight.join_next().await {
                Some(joined) => {
                    let outcome = joined.map_err(|e| ExplorerError::Task(e.to_string()))??;
                    match outcome {
                        ParentOutcome::Applied { enqueue, created, transpositions, skipped } => {
                            report.parents_processed += 1;
                            report.nodes_created += created;
                            report.transpositions_linked += transpositions;
                            report.moves_skipped += skipped;
                            frontier.extend(enqueue);
                        }
                        ParentOutcome::Retry(item) => {
                            report.retries += 1;
                            frontier.push_back(item);
                        }
                        ParentOutcome::Dropped { fingerprint, reason } => {
                            warn!(position = %fingerprint, reason = %reason, "frontier item dropped");
                            report.dropped += 1;
                        }
                    }
                }
                None => {
                    if budget_exhausted || frontier.is_empty() {
                        break;
                    }
                }
            }
        }

        report.frontier_remaining = frontier.len();
        info!(
            parents = report.parents_processed,
            created = report.nodes_created,
            transpositions = report.transpositions_linked,
            retries = report.retries,
            dropped = report.dropped,
            remaining = report.frontier_remaining,
            "frontier crawl finished"
        );
        Ok(report)
    }

    /// Expand one parent: request continuations, apply children, commit.
    async fn expand_parent(
        store: Arc<S>,
        engine: Arc<M>,
        source: Arc<X>,
        permits: Arc<Semaphore>,
        policy: CrawlPolicy,
        item: FrontierItem,
    ) -> Result<ParentOutcome, ExplorerError> {
        // The permit gates the outstanding request only; it is released
        // before the retry sleep and before store writes.
        let requested = {
            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|_| ExplorerError::Task("permit pool closed".to_string()))?;
            source.continuations(&item.node.fingerprint).await
        };

        let report = match requested {
            Ok(report) => report,
            Err(StatsError::NotFound) => ContinuationReport::empty(),
            Err(e) if e.is_retryable() => {
                debug!(position = %item.node.fingerprint, error = %e, "re-enqueueing after delay");
                tokio::time::sleep(policy.retry_delay).await;
                return Ok(ParentOutcome::Retry(item));
            }
            Err(e) => {
                return Ok(ParentOutcome::Dropped {
                    fingerprint: item.node.fingerprint.clone(),
                    reason: e.to_string(),
                })
            }
        };

        let kept: Vec<_> = report
            .moves
            .into_iter()
            .filter(|m| !m.san.is_empty() && m.total() >= policy.popularity_floor)
            .collect();

        if kept.len() >= 2 {
            store
                .mark_branching(&item.node.id)
                .await
                .map_err(ExplorerError::from_store)?;
        } else if kept.is_empty() {
            store
                .mark_leaf(&item.node.id)
                .await
                .map_err(ExplorerError::from_store)?;
        }

        let mut enqueue = Vec::with_capacity(kept.len());
        let mut created = 0;
        let mut transpositions = 0;
        let mut skipped = 0;

        for (rank, stat) in kept.iter().enumerate() {
            let played = match engine.apply(&item.node.fingerprint, &stat.san) {
                Ok(played) => played,
                Err(e) => {
                    warn!(position = %item.node.fingerprint, san = %stat.san, error = %e,
                        "continuation rejected by move engine");
                    skipped += 1;
                    continue;
                }
            };

            let child = match store
                .lookup(&played.fingerprint)
                .await
                .map_err(ExplorerError::from_store)?
            {
                Some(existing) => {
                    // Same position reached along a different lineage.
                    // Best-effort inline link; the batch detector is
                    // authoritative for anything missed here.
                    if existing.parent != Some(item.node.id)
                        && store
                            .add_transposition(item.node.id, existing.id)
                            .await
                            .map_err(ExplorerError::from_store)?
                    {
                        transpositions += 1;
                    }
                    existing
                }
                None => {
                    created += 1;
                    let draft = NodeDraft::new(
                        played.fingerprint,
                        stat.san.as_str(),
                        played.move_number,
                        played.side_moved,
                    )
                    .with_parent(item.node.id)
                    .with_taxonomy(item.node.code.as_str(), item.node.name.as_str())
                    .with_stats(stat.total(), stat.white_win_pct(), stat.draw_pct());
                    store.upsert(draft).await.map_err(ExplorerError::from_store)?
                }
            };

            store
                .add_edge(item.node.id, child.id, rank as u32)
                .await
                .map_err(ExplorerError::from_store)?;
            enqueue.push(FrontierItem { node: child, depth: item.depth + 1 });
        }

        store.commit().await.map_err(ExplorerError::from_store)?;
        Ok(ParentOutcome::Applied { enqueue, created, transpositions, skipped })
    }
}
