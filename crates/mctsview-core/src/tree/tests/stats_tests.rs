use crate::tree::{cache::TreeCache, snapshot::WireNode, stats::TreeStats};

#[test]
fn scan_covers_the_scenario_tree() {
    let root = WireNode::leaf(0, 10, 0.2).with_children(vec![
        WireNode::leaf(1, 4, -0.5).with_action(0, 0),
        WireNode::leaf(2, 6, 0.1).with_action(1, 1),
    ]);
    let (cache, _) = TreeCache::from_snapshot(root, 3).expect("snapshot is well formed");
    let stats = TreeStats::scan(&cache);

    assert_eq!(stats.count, 3);
    assert_eq!(stats.max_visits, 10);
    assert_eq!(stats.min_visits, 4);
    assert_eq!(stats.max_abs_value, 0.5);
    assert!((stats.mean_visits - 20.0 / 3.0).abs() < 1e-12);
    assert!((stats.mean_value - (-0.2 / 3.0)).abs() < 1e-12);
}

#[test]
fn root_only_tree_reports_its_own_values() {
    let (cache, _) = TreeCache::from_snapshot(WireNode::leaf(4, 7, -0.25), 3).expect("root is well formed");
    let stats = TreeStats::scan(&cache);
    assert_eq!(stats.count, 1);
    assert_eq!(stats.mean_visits, 7.0);
    assert_eq!(stats.mean_value, -0.25);
}

#[test]
fn collapsed_nodes_still_count() {
    let root = WireNode::leaf(0, 10, 0.2).with_children(vec![
        WireNode::leaf(1, 4, -0.5).with_children(vec![WireNode::leaf(3, 40, 0.9)]),
    ]);
    let (mut cache, _) = TreeCache::from_snapshot(root, 3).expect("snapshot is well formed");
    let child = cache.find(&"0/1".into()).expect("child exists");
    let _ = cache.toggle(child).expect("collapse");

    let stats = TreeStats::scan(&cache);
    assert_eq!(cache.visible().len(), 2);
    assert_eq!(stats.count, 3);
    assert_eq!(stats.max_visits, 40);
    assert_eq!(stats.max_abs_value, 0.9);
}

#[test]
fn absent_tree_scans_to_zero() {
    assert_eq!(TreeStats::scan_opt(None), TreeStats::default());
}
