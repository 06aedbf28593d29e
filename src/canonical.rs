//! Position-key derivation for compact book records.
//!
//! The 64-bit key is derived from the canonical position text alone, so it
//! is stable across runs and independent of store-assigned node ids. Book
//! records sort by this key.

use xxhash_rust::xxh64::xxh64;

/// Derive the 64-bit position key from canonical position text.
pub fn position_key(text: &str) -> u64 {
    xxh64(text.as_bytes(), 0)
}

/// Hex form of the position key, for diagnostics.
pub fn position_key_hex(text: &str) -> String {
    format!("{:016x}", position_key(text))
}
