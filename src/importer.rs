//! Taxonomy bootstrap importer.
//!
//! Seeds the graph with one root node per taxonomy record. A record is a
//! (code, name, move-sequence) row; the move sequence is walked through
//! the move engine and an illegal or ambiguous move truncates the walk to
//! its last legal prefix. Records with zero legal moves are skipped with
//! a diagnostic; malformed input never aborts the import.

use std::sync::OnceLock;

use regex_lite::Regex;
use tracing::{info, warn};

use crate::engine::{MoveEngine, PlayedMove};
use crate::store::PositionStore;
use crate::types::NodeDraft;

/// One taxonomy row: code, name, and the movetext reaching the root
/// position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxonomyRecord {
    /// Taxonomy code (e.g. "C50").
    pub code: String,
    /// Opening name, optionally "Name: Variation".
    pub name: String,
    /// Move sequence, e.g. `1. e4 e5 2. Nf3 Nc6 3. Bc4`.
    pub movetext: String,
}

impl TaxonomyRecord {
    /// Parse a tab-separated `code\tname\tmovetext` line. Returns `None`
    /// when any field is missing or empty.
    pub fn from_tsv_line(line: &str) -> Option<Self> {
        let mut fields = line.splitn(3, '\t').map(str::trim);
        let code = fields.next().filter(|s| !s.is_empty())?;
        let name = fields.next().filter(|s| !s.is_empty())?;
        let movetext = fields.next().filter(|s| !s.is_empty())?;
        Some(Self {
            code: code.to_string(),
            name: name.to_string(),
            movetext: movetext.to_string(),
        })
    }
}

/// Outcome of a taxonomy import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Root nodes created or re-observed.
    pub roots: usize,
    /// Opening entries created or refreshed.
    pub entries: usize,
    /// Records skipped (no legal move at all).
    pub skipped: usize,
    /// Records whose move sequence was truncated to a legal prefix.
    pub truncated: usize,
}

/// Error type for the importer.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// Store failure.
    #[error("store error: {0}")]
    Store(String),
}

impl ImportError {
    fn from_store<E: std::error::Error>(e: E) -> Self {
        Self::Store(e.to_string())
    }
}

fn is_move_number(token: &str) -> bool {
    static MOVE_NUMBER: OnceLock<Regex> = OnceLock::new();
    MOVE_NUMBER
        .get_or_init(|| Regex::new(r"^\d+\.+$").unwrap())
        .is_match(token)
}

fn strip_move_number(token: &str) -> &str {
    static PREFIX: OnceLock<Regex> = OnceLock::new();
    let re = PREFIX.get_or_init(|| Regex::new(r"^\d+\.+").unwrap());
    match re.find(token) {
        Some(m) => &token[m.end()..],
        None => token,
    }
}

/// Extract SAN tokens from movetext, dropping move numbers, results, and
/// comment/variation openers.
pub fn san_tokens(movetext: &str) -> Vec<String> {
    movetext
        .split_whitespace()
        .filter(|t| !t.starts_with('{') && !t.starts_with('('))
        .filter(|t| !is_move_number(t))
        .map(strip_move_number)
        .filter(|t| !t.is_empty() && !matches!(*t, "1-0" | "0-1" | "1/2-1/2" | "*"))
        .map(str::to_string)
        .collect()
}

/// Variation label: the part of the name after the first ':'.
fn variation_of(name: &str) -> Option<String> {
    name.split_once(':')
        .map(|(_, v)| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Import taxonomy records, creating one root node and one opening entry
/// per record that yields at least one legal move.
pub async fn import_taxonomy<S, M>(
    store: &S,
    engine: &M,
    records: impl IntoIterator<Item = TaxonomyRecord>,
) -> Result<ImportReport, ImportError>
where
    S: PositionStore,
    M: MoveEngine,
{
    let mut report = ImportReport::default();

    for record in records {
        let tokens = san_tokens(&record.movetext);
        if tokens.is_empty() {
            warn!(code = %record.code, name = %record.name, "record has no moves, skipped");
            report.skipped += 1;
            continue;
        }

        let mut position = engine.initial();
        let mut last: Option<(PlayedMove, String)> = None;
        let mut truncated = false;
        for san in &tokens {
            match engine.apply(&position, san) {
                Ok(played) => {
                    position = played.fingerprint.clone();
                    last = Some((played, san.clone()));
                }
                Err(e) => {
                    warn!(code = %record.code, name = %record.name, error = %e, "move sequence truncated");
                    truncated = true;
                    break;
                }
            }
        }

        let Some((played, san)) = last else {
            warn!(code = %record.code, name = %record.name, "no legal prefix, record skipped");
            report.skipped += 1;
            continue;
        };
        if truncated {
            report.truncated += 1;
        }

        let draft = NodeDraft::new(played.fingerprint, san, played.move_number, played.side_moved)
            .with_taxonomy(record.code.as_str(), record.name.as_str())
            .with_variation(variation_of(&record.name));
        let root = store.upsert(draft).await.map_err(ImportError::from_store)?;
        report.roots += 1;

        store
            .upsert_entry(&record.code, &record.name, root.id)
            .await
            .map_err(ImportError::from_store)?;
        report.entries += 1;
    }

    info!(
        roots = report.roots,
        skipped = report.skipped,
        truncated = report.truncated,
        "taxonomy import complete"
    );
    Ok(report)
}
