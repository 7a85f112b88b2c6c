use mctsview_core::{Action, EngineNodeId, Explorer, ExplorerConfig, NodeKey};
use mctsview_engine::{
    EngineError, decode_body, decode_tree,
    wire::{GameStatus, Stone, SummaryEnvelope},
};

const TREE: &[u8] = include_bytes!("fixtures/tree.json");
const SUBTREE_ERROR: &[u8] = include_bytes!("fixtures/subtree_error.json");
const SUMMARY: &[u8] = include_bytes!("fixtures/summary.json");
const AI_MOVE: &[u8] = include_bytes!("fixtures/ai_move.json");

#[test]
fn snapshot_fixture_decodes_and_loads() {
    let tree = decode_tree("/get_mcts_tree", TREE)
        .expect("fixture decodes")
        .expect("fixture has a tree");
    assert_eq!(tree.id, EngineNodeId::from(140245));
    assert_eq!(tree.node_count(), 4);

    let mut explorer = Explorer::new(ExplorerConfig::default());
    explorer.set_snapshot_depth(2);
    let report = explorer.replace_snapshot(Some(tree)).expect("snapshot loads");
    assert_eq!(report.added, 4);

    let details = explorer
        .select_action(Action::new(0, 5))
        .expect("move (0, 5) is in the tree");
    assert_eq!(details.key, NodeKey::from("140245/140302"));
    assert_eq!(details.prior, None);
    assert_eq!(details.exploration, Some(0.44));
    assert_eq!(
        explorer.best_path(),
        vec![
            NodeKey::from("140245"),
            NodeKey::from("140245/140301"),
            NodeKey::from("140245/140301/140377"),
        ]
    );
}

#[test]
fn null_tree_is_no_tree() {
    assert_eq!(decode_tree("/get_mcts_tree", br#"{"tree": null}"#).expect("decodes"), None);
}

#[test]
fn error_field_becomes_an_engine_error() {
    let err = decode_tree("/get_mcts_subtree", SUBTREE_ERROR).expect_err("engine reported an error");
    assert!(matches!(err, EngineError::Engine(ref message) if message == "Node not found"));
}

#[test]
fn garbage_is_a_decode_error() {
    let err = decode_tree("/get_mcts_tree", b"<html>").expect_err("not json");
    assert!(matches!(err, EngineError::Decode { endpoint: "/get_mcts_tree", .. }));
}

#[test]
fn summary_without_extrema_decodes() {
    let envelope: SummaryEnvelope = decode_body("/get_mcts_summary", SUMMARY).expect("fixture decodes");
    let summary = envelope.summary.expect("summary present");
    assert_eq!(summary.total_nodes, 812);
    assert_eq!(summary.max_visits, None);
    assert_eq!(summary.extrema(), None);
}

#[test]
fn ai_move_fixture_carries_board_and_move() {
    let status: GameStatus = decode_body("/ai_move", AI_MOVE).expect("fixture decodes");
    assert_eq!(status.last_move, Some(Action::new(2, 3)));
    assert!(!status.is_over());
    let board = status.board.expect("board present");
    assert_eq!(board.rows(), 6);
    assert_eq!(board.get(Action::new(2, 2)), Some(Stone::First));
    assert_eq!(board.get(Action::new(2, 3)), Some(Stone::Second));
    assert_eq!(board.get(Action::new(9, 9)), None);
}

#[test]
fn game_over_body_is_recognised() {
    let status: GameStatus =
        decode_body("/make_move", br#"{"status": "Game over", "winner": -1}"#).expect("decodes");
    assert!(status.is_over());
    assert_eq!(status.winner, Some(-1));
    assert!(status.board.is_none());
}
