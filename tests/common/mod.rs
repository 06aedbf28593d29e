//! Shared collaborator doubles for integration tests.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use opening_graph::{
    ContinuationReport, ContinuationStat, EvalError, Evaluation, Evaluator, Fingerprint,
    MoveCoords, MoveEngine, MoveError, PlayedMove, Side, StatsError, StatsSource,
    StructureLabeler,
};

/// Fingerprint of the scripted engine's start position.
pub const START: &str = "start";

/// Install a test subscriber once so `RUST_LOG=debug cargo test` shows
/// crawl diagnostics.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Debug, Clone)]
struct Transition {
    to: String,
    ply: u16,
}

/// Move engine scripted over an explicit (position, move) table.
///
/// Coordinates are derived deterministically from the move text so book
/// encoding is exercisable without a real board.
#[derive(Debug, Default)]
pub struct ScriptedEngine {
    moves: HashMap<(String, String), Transition>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a single transition. `ply` is 1-based: ply 1 is White's
    /// first move.
    pub fn add(&mut self, from: &str, san: &str, to: &str, ply: u16) {
        self.moves
            .insert((from.to_string(), san.to_string()), Transition { to: to.to_string(), ply });
    }

    /// Register a full line from the start position. Intermediate
    /// positions are named by their move path.
    pub fn line(&mut self, sans: &[&str]) -> String {
        let mut from = START.to_string();
        for (i, san) in sans.iter().enumerate() {
            let to = format!("{from}/{san}");
            self.add(&from, san, &to, (i + 1) as u16);
            from = to;
        }
        from
    }
}

impl MoveEngine for ScriptedEngine {
    fn initial(&self) -> Fingerprint {
        Fingerprint::new(START)
    }

    fn apply(&self, position: &Fingerprint, san: &str) -> Result<PlayedMove, MoveError> {
        let key = (position.as_str().to_string(), san.to_string());
        let transition = self.moves.get(&key).ok_or_else(|| MoveError::Illegal {
            san: san.to_string(),
            fingerprint: position.clone(),
        })?;

        let h = opening_graph::position_key(san);
        Ok(PlayedMove {
            fingerprint: Fingerprint::new(transition.to.as_str()),
            coords: MoveCoords {
                from: (h % 64) as u8,
                to: ((h >> 6) % 64) as u8,
                promotion: None,
            },
            move_number: (transition.ply + 1) / 2,
            side_moved: if transition.ply % 2 == 1 { Side::White } else { Side::Black },
        })
    }
}

/// Build a continuation stat from outcome counts.
pub fn stat(san: &str, white: u64, draws: u64, black: u64) -> ContinuationStat {
    ContinuationStat { san: san.to_string(), white, draws, black }
}

/// Statistics source scripted per position, with programmable one-shot
/// rate limiting.
#[derive(Debug, Default)]
pub struct ScriptedStats {
    moves: HashMap<String, Vec<ContinuationStat>>,
    rate_limit_once: Mutex<HashSet<String>>,
    calls: AtomicUsize,
}

impl ScriptedStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the continuations reported for a position.
    pub fn set(&mut self, position: &str, stats: Vec<ContinuationStat>) {
        self.moves.insert(position.to_string(), stats);
    }

    /// Make the first request for a position fail with a rate limit.
    pub fn rate_limit_first(&mut self, position: &str) {
        self.rate_limit_once
            .lock()
            .unwrap()
            .insert(position.to_string());
    }

    /// Total requests observed.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StatsSource for ScriptedStats {
    async fn continuations(&self, position: &Fingerprint) -> Result<ContinuationReport, StatsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.rate_limit_once.lock().unwrap().remove(position.as_str()) {
            return Err(StatsError::RateLimited);
        }
        match self.moves.get(position.as_str()) {
            Some(stats) => Ok(ContinuationReport { moves: stats.clone() }),
            None => Err(StatsError::NotFound),
        }
    }
}

/// Evaluator returning scripted scores, with programmable one-shot
/// unavailability.
#[derive(Debug, Default)]
pub struct ScriptedEvaluator {
    scores: HashMap<String, i32>,
    default_cp: i32,
    unavailable_once: Mutex<HashSet<String>>,
    calls: AtomicUsize,
}

impl ScriptedEvaluator {
    pub fn new(default_cp: i32) -> Self {
        Self { default_cp, ..Self::default() }
    }

    pub fn score(&mut self, position: &str, cp: i32) {
        self.scores.insert(position.to_string(), cp);
    }

    /// Make the first evaluation of a position fail as unavailable.
    pub fn unavailable_first(&mut self, position: &str) {
        self.unavailable_once
            .lock()
            .unwrap()
            .insert(position.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Evaluator for ScriptedEvaluator {
    async fn evaluate(&self, position: &Fingerprint, depth: u32) -> Result<Evaluation, EvalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable_once.lock().unwrap().remove(position.as_str()) {
            return Err(EvalError::Unavailable);
        }
        let cp = self
            .scores
            .get(position.as_str())
            .copied()
            .unwrap_or(self.default_cp);
        Ok(Evaluation::new(cp, depth, Some("best".to_string())))
    }
}

/// Labeler backed by a position → label table.
#[derive(Debug, Default)]
pub struct TableLabeler {
    labels: HashMap<String, String>,
}

impl TableLabeler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, position: &str, label: &str) {
        self.labels.insert(position.to_string(), label.to_string());
    }
}

impl StructureLabeler for TableLabeler {
    fn label(&self, position: &Fingerprint) -> Option<String> {
        self.labels.get(position.as_str()).cloned()
    }
}
