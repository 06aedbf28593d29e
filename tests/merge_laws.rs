//! Property tests for the upsert merge laws.
//!
//! Any two non-conflicting updates to the same fingerprint converge to
//! the same node in either application order, and re-applying an update
//! is a no-op.

use chrono::Utc;
use proptest::prelude::*;

use opening_graph::{Fingerprint, NodeDraft, PositionNode, Side};

fn base_node() -> PositionNode {
    PositionNode::from_draft(
        NodeDraft::new(Fingerprint::new("fp"), "e4", 1, Side::White),
        Utc::now(),
    )
}

fn arb_pct() -> impl Strategy<Value = Option<f64>> {
    proptest::option::of((0u32..=1000).prop_map(|n| n as f64 / 10.0))
}

fn arb_draft() -> impl Strategy<Value = NodeDraft> {
    (
        0u64..100_000,
        arb_pct(),
        arb_pct(),
        any::<bool>(),
        any::<bool>(),
        proptest::option::of("[a-z]{1,8}"),
    )
        .prop_map(|(game_count, white, draw, branching, leaf, variation)| {
            let mut draft = NodeDraft::new(Fingerprint::new("fp"), "e4", 1, Side::White)
                .with_stats(game_count, white, draw)
                .with_variation(variation);
            draft.branching = branching;
            draft.leaf = leaf;
            draft
        })
}

/// Updates that carry conflicting values for fill-once fields are
/// order-dependent by design; everything else must commute.
fn conflicting(a: &NodeDraft, b: &NodeDraft) -> bool {
    let stats_conflict = a.game_count == b.game_count
        && (a.white_win_pct != b.white_win_pct || a.draw_pct != b.draw_pct);
    let variation_conflict =
        a.variation.is_some() && b.variation.is_some() && a.variation != b.variation;
    stats_conflict || variation_conflict
}

proptest! {
    #[test]
    fn merge_commutes(a in arb_draft(), b in arb_draft()) {
        prop_assume!(!conflicting(&a, &b));

        let mut ab = base_node();
        ab.merge_from(&a);
        ab.merge_from(&b);

        let mut ba = base_node();
        ba.merge_from(&b);
        ba.merge_from(&a);

        prop_assert_eq!(ab.game_count, ba.game_count);
        prop_assert_eq!(ab.white_win_pct, ba.white_win_pct);
        prop_assert_eq!(ab.draw_pct, ba.draw_pct);
        prop_assert_eq!(ab.branching, ba.branching);
        prop_assert_eq!(ab.leaf, ba.leaf);
        prop_assert_eq!(ab.variation.clone(), ba.variation.clone());
    }

    #[test]
    fn merge_idempotent(a in arb_draft()) {
        let mut node = base_node();
        node.merge_from(&a);

        let before = serde_json::to_value(&node).unwrap();
        let changed = node.merge_from(&a);
        let after = serde_json::to_value(&node).unwrap();

        prop_assert!(!changed);
        prop_assert_eq!(before, after);
    }

    #[test]
    fn merge_never_loses_popularity(a in arb_draft(), b in arb_draft()) {
        let mut node = base_node();
        node.merge_from(&a);
        node.merge_from(&b);

        prop_assert_eq!(node.game_count, a.game_count.max(b.game_count));
    }
}
