//! Typed configuration for the crawl, annotation, and materialization
//! passes.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Frontier crawl configuration.
///
/// Pool size is the sole throttle against the statistics source; rate
/// limits get a fixed retry delay, no adaptive back-off.
#[derive(Debug, Clone)]
pub struct CrawlPolicy {
    /// Items dequeued at this depth are dropped without requesting.
    pub max_depth: u32,
    /// Minimum aggregated game count for a continuation to be kept.
    pub popularity_floor: u64,
    /// Maximum concurrent outstanding statistics requests.
    pub max_concurrency: usize,
    /// Fixed delay before re-enqueueing a rate-limited item.
    pub retry_delay: Duration,
    /// Overall crawl time budget. `None` runs the frontier to exhaustion.
    pub time_budget: Option<Duration>,
}

impl Default for CrawlPolicy {
    fn default() -> Self {
        Self {
            max_depth: 15,
            popularity_floor: 50,
            max_concurrency: 4,
            retry_delay: Duration::from_secs(2),
            time_budget: None,
        }
    }
}

/// Annotation pass configuration.
///
/// Depth budgets follow traffic: heavily-played branching nodes get the
/// deepest searches, terminal nodes the shallowest.
#[derive(Debug, Clone)]
pub struct AnnotatePolicy {
    /// Game count at which a branching node is considered high-traffic.
    pub high_traffic_threshold: u64,
    /// Search depth for high-traffic branching nodes.
    pub depth_high_traffic: u32,
    /// Search depth for branching nodes.
    pub depth_branching: u32,
    /// Search depth for terminal nodes.
    pub depth_leaf: u32,
    /// Fixed delay before retrying an unavailable evaluator.
    pub retry_delay: Duration,
    /// Overall pass time budget. With `None`, an unavailable evaluator is
    /// retried once per node before the node is skipped.
    pub time_budget: Option<Duration>,
}

impl Default for AnnotatePolicy {
    fn default() -> Self {
        Self {
            high_traffic_threshold: 1000,
            depth_high_traffic: 26,
            depth_branching: 22,
            depth_leaf: 18,
            retry_delay: Duration::from_secs(2),
            time_budget: None,
        }
    }
}

/// Tree materialization configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterializePolicy {
    /// Recursion stops at this depth below the root.
    pub max_depth: u32,
    /// Minimum aggregated game count for a child to be kept.
    pub popularity_floor: u64,
    /// Kept-child weights are renormalized when their sum drifts further
    /// than this from 1.0.
    pub weight_tolerance: f64,
}

impl Default for MaterializePolicy {
    fn default() -> Self {
        Self {
            max_depth: 15,
            popularity_floor: 50,
            weight_tolerance: 1e-3,
        }
    }
}
