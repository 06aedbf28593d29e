//! Batch transposition detection.
//!
//! Complement to the explorer's inline check: any child with more than
//! one distinct parent was reached by more than one move order, so every
//! unordered pair of its parents gets a transposition link. Re-running
//! the scan is a no-op thanks to the registry's idempotent insert.

use tracing::info;

use crate::store::LinkRegistry;

/// Counters for one detector run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectorReport {
    /// Multi-parent children examined.
    pub children_scanned: usize,
    /// New transposition links stored.
    pub links_created: usize,
}

/// Error type for the detector.
#[derive(Debug, thiserror::Error)]
pub enum DetectorError {
    /// Registry failure.
    #[error("registry error: {0}")]
    Registry(String),
}

/// Scan the registry and link every pair of parents sharing a child.
///
/// n parents yield C(n, 2) links, deduplicated by the registry.
pub async fn resolve_transpositions<R>(registry: &R) -> Result<DetectorReport, DetectorError>
where
    R: LinkRegistry,
{
    let groups = registry
        .multi_parent_children()
        .await
        .map_err(|e| DetectorError::Registry(e.to_string()))?;

    let mut report = DetectorReport::default();
    for (_, parents) in groups {
        report.children_scanned += 1;
        for i in 0..parents.len() {
            for j in (i + 1)..parents.len() {
                let inserted = registry
                    .add_transposition(parents[i], parents[j])
                    .await
                    .map_err(|e| DetectorError::Registry(e.to_string()))?;
                if inserted {
                    report.links_created += 1;
                }
            }
        }
    }

    info!(
        children = report.children_scanned,
        links = report.links_created,
        "transposition scan complete"
    );
    Ok(report)
}
