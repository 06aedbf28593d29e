//! Named opening entries.

use serde::{Deserialize, Serialize};

use super::node::NodeId;

/// Named grouping from a root node to one or more resolution nodes.
///
/// Entries are keyed by (taxonomy code, name); re-import refreshes the
/// root reference without duplicating the entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpeningEntry {
    /// Durable store-assigned identity.
    pub id: NodeId,
    /// Taxonomy code (e.g. "C50").
    pub code: String,
    /// Opening name.
    pub name: String,
    /// Root node of the grouping.
    pub root: NodeId,
    /// Nodes where the opening is considered resolved.
    pub resolution_nodes: Vec<NodeId>,
}

impl OpeningEntry {
    /// Stable lowercase slug for artifact file naming.
    pub fn slug(&self) -> String {
        let mut out = String::with_capacity(self.code.len() + self.name.len() + 1);
        for c in self.code.chars().chain(['-']).chain(self.name.chars()) {
            match c {
                c if c.is_ascii_alphanumeric() => out.push(c.to_ascii_lowercase()),
                ' ' | '/' | ':' | '-' | '_' => {
                    if !out.ends_with('-') {
                        out.push('-');
                    }
                }
                _ => {}
            }
        }
        out.trim_matches('-').chars().take(60).collect()
    }
}
