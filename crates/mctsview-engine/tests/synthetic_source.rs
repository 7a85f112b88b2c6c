use mctsview_core::{
    Action, EngineNodeId, ExpansionState, Explorer, ExplorerConfig, FetchFailure, Resolution,
    ToggleRequest,
};
use mctsview_engine::{EngineError, GameClient, SyntheticEngine, TreeSource, fetch_ticket};

fn frontier_key(explorer: &Explorer) -> mctsview_core::NodeKey {
    let tree = explorer.tree().expect("tree loaded");
    tree.visible()
        .into_iter()
        .filter_map(|id| tree.node(id).ok())
        .find(|node| node.expansion_state() == ExpansionState::Unfetched)
        .map(|node| node.key().clone())
        .expect("a depth-1 snapshot leaves unfetched children")
}

#[tokio::test]
async fn no_search_means_no_tree() {
    let engine = SyntheticEngine::new(1);
    assert_eq!(engine.snapshot(3).await.expect("snapshot"), None);
    assert_eq!(engine.summary().await.expect("summary"), None);
    assert_eq!(engine.subtree(EngineNodeId::from(1), 2).await.expect("subtree"), None);
}

#[tokio::test]
async fn same_seed_same_tree() {
    let a = SyntheticEngine::new(42);
    let b = SyntheticEngine::new(42);
    a.search();
    b.search();
    assert_eq!(a.snapshot(4).await.expect("snapshot"), b.snapshot(4).await.expect("snapshot"));
}

#[tokio::test]
async fn lazy_expansion_against_the_synthetic_engine() {
    let engine = SyntheticEngine::new(5);
    engine.search();

    let mut explorer = Explorer::new(ExplorerConfig::default());
    explorer.set_snapshot_depth(1);
    let snapshot = engine.snapshot(explorer.snapshot_depth()).await.expect("snapshot");
    explorer.replace_snapshot(snapshot).expect("snapshot loads");
    explorer.set_summary(engine.summary().await.expect("summary"));
    let before = explorer.tree().expect("tree").len();

    let key = frontier_key(&explorer);
    let ToggleRequest::Fetch(ticket) = explorer.toggle(&key).expect("toggle") else {
        panic!("unfetched node should fetch");
    };
    let outcome = fetch_ticket(&engine, &ticket).await;
    assert!(matches!(explorer.resolve(&ticket, outcome), Resolution::Applied { .. }));
    assert_eq!(explorer.details(&key).expect("node").state, ExpansionState::Expanded);
    assert!(explorer.tree().expect("tree").len() >= before);

    // Engine extrema cover the whole tree, so they bound the local scan.
    let summary = explorer.engine_summary().copied().expect("summary present");
    let extrema = summary.extrema().expect("synthetic engine reports extrema");
    assert_eq!(explorer.scales().extrema, extrema);
    assert!(explorer.local_summary().max_visits <= extrema.max_visits);
}

#[tokio::test]
async fn unknown_node_is_an_engine_error() {
    let engine = SyntheticEngine::new(9);
    engine.search();
    let err = engine
        .subtree(EngineNodeId::from(u64::MAX), 2)
        .await
        .expect_err("id was never generated");
    assert!(matches!(err, EngineError::Engine(_)));
    assert_eq!(
        FetchFailure::from(err).message,
        "engine error: Node not found"
    );
}

#[tokio::test]
async fn moves_replace_the_search_tree() {
    let engine = SyntheticEngine::new(3);
    let started = engine.start_game().await.expect("start");
    assert_eq!(started.player, Some(1));

    let after_human = engine.make_move(Action::new(0, 0)).await.expect("legal move");
    assert_eq!(after_human.player, Some(-1));
    let err = engine.make_move(Action::new(0, 0)).await.expect_err("cell is taken");
    assert!(matches!(err, EngineError::InvalidMove { .. }));

    let ai = engine.ai_move().await.expect("ai move");
    let played = ai.last_move.expect("ai reports its move");
    assert_ne!(played, Action::new(0, 0));

    let snapshot = engine.snapshot(1).await.expect("snapshot").expect("ai searched");
    let children = snapshot.children.expect("root lists children");
    assert!(children.iter().any(|c| c.action == Some(played) && c.is_best_path));

    let probability = engine.win_probability().await.expect("probability");
    let p = probability.probability_of_winning.expect("game in progress");
    assert!((0.0..=1.0).contains(&p));
}
