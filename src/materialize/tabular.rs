//! Flat tabular dump of node attributes.
//!
//! Tab-separated, one row per node, header first. Empty cells stand for
//! absent optional values.

use std::io;

use crate::types::PositionNode;

/// Column names, in row order.
pub const COLUMNS: [&str; 21] = [
    "node_id",
    "fingerprint",
    "san",
    "move_number",
    "side",
    "code",
    "name",
    "variation",
    "parent_id",
    "branching",
    "leaf",
    "eval_cp",
    "eval_depth",
    "best_move",
    "dubious",
    "busted",
    "game_count",
    "white_win_pct",
    "draw_pct",
    "structure",
    "updated_at",
];

fn opt<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(T::to_string).unwrap_or_default()
}

/// Write all nodes as a TSV table.
pub fn write_tabular<W: io::Write>(nodes: &[PositionNode], mut writer: W) -> io::Result<()> {
    writeln!(writer, "{}", COLUMNS.join("\t"))?;
    for node in nodes {
        let row = [
            node.id.to_string(),
            node.fingerprint.as_str().to_string(),
            node.san.clone(),
            node.move_number.to_string(),
            node.side.to_string(),
            node.code.clone(),
            node.name.clone(),
            opt(&node.variation),
            opt(&node.parent),
            node.branching.to_string(),
            node.leaf.to_string(),
            opt(&node.evaluation.as_ref().map(|e| e.score_cp)),
            opt(&node.evaluation.as_ref().map(|e| e.depth)),
            opt(&node.evaluation.as_ref().and_then(|e| e.best_move.clone())),
            node.dubious.to_string(),
            node.busted.to_string(),
            node.game_count.to_string(),
            opt(&node.white_win_pct),
            opt(&node.draw_pct),
            opt(&node.structure),
            node.updated_at.to_rfc3339(),
        ];
        writeln!(writer, "{}", row.join("\t"))?;
    }
    Ok(())
}
