use std::collections::HashSet;

use proptest::prelude::*;

use crate::tree::{
    cache::{Resolution, Toggle, TreeCache},
    ids::NodeKey,
    snapshot::WireNode,
};

/// Random well-formed trees with small, frequently repeated raw ids.
fn arb_tree() -> impl Strategy<Value = WireNode> {
    let leaf = (0u64..4, 1u64..50, -1.0f64..1.0).prop_map(|(id, n, v)| WireNode::leaf(id, n, v));
    leaf.prop_recursive(4, 32, 4, |inner| {
        ((0u64..4, 1u64..50, -1.0f64..1.0), prop::collection::vec(inner, 0..4)).prop_map(
            |((id, n, v), children)| {
                // Sibling ids must be distinct for the keys to be.
                let mut seen = HashSet::new();
                let children = children.into_iter().filter(|c| seen.insert(c.id)).collect();
                WireNode::leaf(id, n, v).with_children(children)
            },
        )
    })
}

fn visible_shape(cache: &TreeCache) -> Vec<(NodeKey, usize)> {
    cache
        .visible()
        .into_iter()
        .map(|id| {
            let node = cache.node(id).expect("visible node exists");
            (node.key().clone(), node.children().len())
        })
        .collect()
}

proptest! {
    #[test]
    fn expand_then_collapse_restores_the_visible_tree(root in arb_tree(), pick in any::<prop::sample::Index>()) {
        let (mut cache, _) = TreeCache::from_snapshot(root, 8).expect("generated trees are well formed");
        let expanded: Vec<_> = cache
            .visible()
            .into_iter()
            .filter(|id| cache.node(*id).is_ok_and(|n| n.is_expanded()))
            .collect();
        prop_assume!(!expanded.is_empty());
        let target = expanded[pick.index(expanded.len())];
        let before = visible_shape(&cache);
        let hidden = cache.node(target).expect("target exists").children().to_vec();

        prop_assert_eq!(cache.toggle(target).expect("collapse"), Toggle::Collapsed);
        prop_assert_eq!(cache.node(target).expect("target").collapsed_children(), hidden.as_slice());
        prop_assert_eq!(cache.toggle(target).expect("expand"), Toggle::Expanded);
        prop_assert_eq!(visible_shape(&cache), before);
    }

    #[test]
    fn keys_from_separate_fetches_never_collide(left in arb_tree(), right in arb_tree()) {
        let root = WireNode::leaf(0, 100, 0.0)
            .with_children(vec![WireNode::leaf(1, 50, 0.1), WireNode::leaf(2, 50, -0.1)]);
        let (mut cache, _) = TreeCache::from_snapshot(root, 1).expect("root is well formed");

        for (key, mut fragment) in [("0/1", left), ("0/2", right)] {
            let id = cache.find(&NodeKey::from(key)).expect("child exists");
            let Toggle::Fetch(ticket) = cache.toggle(id).expect("toggle") else {
                panic!("frontier node should fetch");
            };
            // Re-root the generated fragment at the requested node.
            fragment.id = ticket.engine_id;
            let resolution = cache.resolve(&ticket, Ok(Some(fragment)));
            prop_assert!(matches!(resolution, Resolution::Applied { dropped: 0, .. }), "{:?}", resolution);
        }

        let keys: Vec<&NodeKey> = cache.nodes().map(|(_, node)| node.key()).collect();
        let unique: HashSet<&NodeKey> = keys.iter().copied().collect();
        prop_assert_eq!(unique.len(), keys.len());
        prop_assert_eq!(cache.materialized().len(), cache.len());
    }
}
