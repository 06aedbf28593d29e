//! Integration tests for the frontier explorer and the batch
//! transposition detector.

mod common;

use std::sync::Arc;
use std::time::Duration;

use opening_graph::{
    resolve_transpositions, CrawlPolicy, Fingerprint, FrontierExplorer, LinkRegistry,
    MemoryGraphStore, NodeDraft, PositionStore, Side,
};

use common::{stat, ScriptedEngine, ScriptedStats};

fn fast_policy() -> CrawlPolicy {
    CrawlPolicy {
        max_depth: 5,
        popularity_floor: 50,
        max_concurrency: 1,
        retry_delay: Duration::from_millis(1),
        time_budget: None,
    }
}

async fn seed_root(store: &MemoryGraphStore, fp: &str, code: &str) -> opening_graph::PositionNode {
    store
        .upsert(
            NodeDraft::new(Fingerprint::new(fp), "Bc4", 3, Side::White).with_taxonomy(code, "Test Opening"),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn test_crawl_expands_and_filters_by_floor() {
    common::init_tracing();
    let store = Arc::new(MemoryGraphStore::new());
    let root = seed_root(&store, "R", "C50").await;

    let mut engine = ScriptedEngine::new();
    engine.add("R", "a", "A", 9);
    engine.add("R", "b", "B", 9);
    engine.add("R", "c", "C", 9);

    let mut stats = ScriptedStats::new();
    stats.set(
        "R",
        vec![stat("a", 60, 20, 20), stat("b", 30, 20, 10), stat("c", 5, 5, 5)],
    );

    let explorer = FrontierExplorer::new(
        Arc::clone(&store),
        Arc::new(engine),
        Arc::new(stats),
        fast_policy(),
    );
    let report = explorer.crawl().await.unwrap();

    // "c" (15 games) missed the floor of 50
    assert_eq!(report.nodes_created, 2);
    assert_eq!(report.parents_processed, 3);
    assert_eq!(store.num_nodes(), 3);

    let root_after = store.get(&root.id).await.unwrap().unwrap();
    assert!(root_after.branching);
    assert!(!root_after.leaf);

    let children = store.children_of(&root.id).await.unwrap();
    assert_eq!(children.len(), 2);
    assert_eq!(children[0].rank, 0);
    assert_eq!(children[1].rank, 1);

    let a = store.lookup(&Fingerprint::new("A")).await.unwrap().unwrap();
    assert_eq!(a.game_count, 100);
    assert_eq!(a.white_win_pct, Some(60.0));
    assert_eq!(a.side, Side::White);
    assert_eq!(a.move_number, 5);
    assert_eq!(a.parent, Some(root.id));
    assert_eq!(a.code, "C50");
    // continuations for "A" came back not-found: zero continuations
    assert!(a.leaf);
}

#[tokio::test]
async fn test_below_floor_continuations_add_zero_children() {
    let store = Arc::new(MemoryGraphStore::new());
    let root = seed_root(&store, "R", "C50").await;

    let mut engine = ScriptedEngine::new();
    engine.add("R", "a", "A", 9);
    let mut stats = ScriptedStats::new();
    stats.set("R", vec![stat("a", 10, 10, 10)]);

    let explorer = FrontierExplorer::new(
        Arc::clone(&store),
        Arc::new(engine),
        Arc::new(stats),
        fast_policy(),
    );
    let report = explorer.crawl().await.unwrap();

    assert_eq!(report.nodes_created, 0);
    assert_eq!(store.num_nodes(), 1);
    let root_after = store.get(&root.id).await.unwrap().unwrap();
    assert!(root_after.leaf);
    assert!(!root_after.branching);
    assert!(store.children_of(&root.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_rate_limit_retries_then_applies_once() {
    let store = Arc::new(MemoryGraphStore::new());
    let root = seed_root(&store, "R", "C50").await;

    let mut engine = ScriptedEngine::new();
    engine.add("R", "a", "A", 9);
    engine.add("R", "b", "B", 9);

    let mut stats = ScriptedStats::new();
    stats.set("R", vec![stat("a", 100, 0, 0), stat("b", 60, 0, 0)]);
    stats.rate_limit_first("R");

    let explorer = FrontierExplorer::new(
        Arc::clone(&store),
        Arc::new(engine),
        Arc::new(stats),
        fast_policy(),
    );
    let report = explorer.crawl().await.unwrap();

    assert_eq!(report.retries, 1);
    // The aborted attempt applied nothing: one node per fingerprint,
    // one edge per child.
    assert_eq!(report.nodes_created, 2);
    assert_eq!(store.num_nodes(), 3);
    assert_eq!(store.num_edges(), 2);
    assert_eq!(store.children_of(&root.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_depth_cap_drops_without_requesting() {
    let store = Arc::new(MemoryGraphStore::new());
    seed_root(&store, "R", "C50").await;

    let mut engine = ScriptedEngine::new();
    engine.add("R", "a", "A", 9);
    engine.add("A", "b", "AA", 10);
    engine.add("AA", "c", "AAA", 11);

    let mut stats = ScriptedStats::new();
    stats.set("R", vec![stat("a", 100, 0, 0)]);
    stats.set("A", vec![stat("b", 100, 0, 0)]);
    stats.set("AA", vec![stat("c", 100, 0, 0)]);

    let mut policy = fast_policy();
    policy.max_depth = 2;

    let stats = Arc::new(stats);
    let explorer = FrontierExplorer::new(
        Arc::clone(&store),
        Arc::new(engine),
        Arc::clone(&stats),
        policy,
    );
    let report = explorer.crawl().await.unwrap();

    // R (depth 0) and A (depth 1) were requested; AA (depth 2) was
    // dequeued at the cap and dropped unrequested.
    assert_eq!(stats.calls(), 2);
    assert_eq!(report.dropped, 1);
    assert_eq!(report.frontier_remaining, 0);
    assert!(store.lookup(&Fingerprint::new("AAA")).await.unwrap().is_none());
}

#[tokio::test]
async fn test_inline_transposition_then_batch_detector() {
    let store = Arc::new(MemoryGraphStore::new());
    let r1 = seed_root(&store, "R1", "A00").await;
    let r2 = seed_root(&store, "R2", "A01").await;

    let mut engine = ScriptedEngine::new();
    engine.add("R1", "x", "X", 5);
    engine.add("R2", "y", "X", 5);

    let mut stats = ScriptedStats::new();
    stats.set("R1", vec![stat("x", 100, 0, 0)]);
    stats.set("R2", vec![stat("y", 100, 0, 0)]);

    let explorer = FrontierExplorer::new(
        Arc::clone(&store),
        Arc::new(engine),
        Arc::new(stats),
        fast_policy(),
    );
    let report = explorer.crawl().await.unwrap();

    // One shared child, created once; the second observation linked a
    // transposition inline.
    assert_eq!(report.nodes_created, 1);
    assert_eq!(report.transpositions_linked, 1);

    let x = store.lookup(&Fingerprint::new("X")).await.unwrap().unwrap();
    let parents = store.parents_of(&x.id).await.unwrap();
    assert_eq!(parents.len(), 2);

    // The batch pass links the parent pair the inline check cannot see.
    let detector = resolve_transpositions(store.as_ref()).await.unwrap();
    assert_eq!(detector.links_created, 1);
    assert_eq!(store.num_transpositions(), 2);

    let linked: Vec<_> = store.transpositions_of(&r1.id).await.unwrap();
    assert!(linked.contains(&r2.id) || linked.contains(&x.id));
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let store = Arc::new(MemoryGraphStore::new());
    seed_root(&store, "R", "C50").await;

    let mut engine = ScriptedEngine::new();
    engine.add("R", "a", "A", 9);
    engine.add("R", "b", "B", 9);
    let mut stats = ScriptedStats::new();
    stats.set("R", vec![stat("a", 100, 0, 0), stat("b", 60, 0, 0)]);

    let engine = Arc::new(engine);
    let stats = Arc::new(stats);

    let first = FrontierExplorer::new(
        Arc::clone(&store),
        Arc::clone(&engine),
        Arc::clone(&stats),
        fast_policy(),
    )
    .crawl()
    .await
    .unwrap();
    assert_eq!(first.nodes_created, 2);

    let second = FrontierExplorer::new(
        Arc::clone(&store),
        Arc::clone(&engine),
        Arc::clone(&stats),
        fast_policy(),
    )
    .crawl()
    .await
    .unwrap();

    assert_eq!(second.nodes_created, 0);
    assert_eq!(second.transpositions_linked, 0);
    assert_eq!(store.num_nodes(), 3);
    assert_eq!(store.num_edges(), 2);
}

#[tokio::test]
async fn test_malformed_continuation_skipped() {
    let store = Arc::new(MemoryGraphStore::new());
    seed_root(&store, "R", "C50").await;

    let mut engine = ScriptedEngine::new();
    engine.add("R", "a", "A", 9);
    let mut stats = ScriptedStats::new();
    stats.set("R", vec![stat("zz", 100, 0, 0), stat("a", 80, 0, 0)]);

    let explorer = FrontierExplorer::new(
        Arc::clone(&store),
        Arc::new(engine),
        Arc::new(stats),
        fast_policy(),
    );
    let report = explorer.crawl().await.unwrap();

    assert_eq!(report.moves_skipped, 1);
    assert_eq!(report.nodes_created, 1);
    assert_eq!(store.num_nodes(), 2);
}

#[tokio::test]
async fn test_empty_store_crawls_nothing() {
    let store = Arc::new(MemoryGraphStore::new());
    let explorer = FrontierExplorer::new(
        Arc::clone(&store),
        Arc::new(ScriptedEngine::new()),
        Arc::new(ScriptedStats::new()),
        fast_policy(),
    );
    let report = explorer.crawl().await.unwrap();
    assert_eq!(report, opening_graph::CrawlReport::default());
}
