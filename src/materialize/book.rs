//! Compact binary move-table encoding.
//!
//! Fixed-width 16-byte records, big-endian: 8-byte position key (derived
//! from the parent position text, independent of store ids), 2-byte
//! packed move descriptor, 2-byte weight in [1, 65535], 4 reserved zero
//! bytes. Records are sorted by key before serialization so readers can
//! binary-search.

use std::io;

use tracing::warn;

use crate::engine::MoveEngine;

use super::TreeNode;

/// Serialized length of one book record.
pub const BOOK_RECORD_LEN: usize = 16;

/// One entry of the binary move table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct BookRecord {
    /// 64-bit key of the position the move is played in.
    pub key: u64,
    /// Packed move descriptor: `to | from << 6 | promotion << 12`.
    pub packed_move: u16,
    /// Popularity weight scaled into [1, 65535].
    pub weight: u16,
}

fn scale_weight(weight: f64) -> u16 {
    ((weight * 65535.0) as i64).clamp(1, 65535) as u16
}

fn collect<M: MoveEngine>(engine: &M, tree: &TreeNode, records: &mut Vec<BookRecord>) {
    let key = tree.node.fingerprint.key64();
    for child in &tree.children {
        match engine.apply(&tree.node.fingerprint, &child.node.san) {
            Ok(played) => records.push(BookRecord {
                key,
                packed_move: played.coords.packed(),
                weight: scale_weight(child.weight),
            }),
            Err(e) => {
                warn!(position = %tree.node.fingerprint, san = %child.node.san, error = %e,
                    "book record skipped");
            }
        }
        collect(engine, child, records);
    }
}

/// Collect the book records of a materialized tree, sorted ascending by
/// key and deduplicated.
pub fn collect_records<M: MoveEngine>(engine: &M, tree: &TreeNode) -> Vec<BookRecord> {
    let mut records = Vec::new();
    collect(engine, tree, &mut records);
    records.sort();
    records.dedup();
    records
}

/// Serialize book records in fixed-width binary form.
pub fn write_book<W: io::Write>(records: &[BookRecord], mut writer: W) -> io::Result<()> {
    for record in records {
        writer.write_all(&record.key.to_be_bytes())?;
        writer.write_all(&record.packed_move.to_be_bytes())?;
        writer.write_all(&record.weight.to_be_bytes())?;
        writer.write_all(&[0u8; 4])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_weight_clamps() {
        assert_eq!(scale_weight(0.0), 1);
        assert_eq!(scale_weight(1.0), 65535);
        assert_eq!(scale_weight(2.0), 65535);
        assert_eq!(scale_weight(0.5), 32767);
    }

    #[test]
    fn test_record_layout() {
        let record = BookRecord { key: 0x0102030405060708, packed_move: 0x0a0b, weight: 0x0c0d };
        let mut out = Vec::new();
        write_book(&[record], &mut out).unwrap();

        assert_eq!(out.len(), BOOK_RECORD_LEN);
        assert_eq!(&out[..8], &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(&out[8..10], &[0x0a, 0x0b]);
        assert_eq!(&out[10..12], &[0x0c, 0x0d]);
        assert_eq!(&out[12..], &[0, 0, 0, 0]);
    }
}
