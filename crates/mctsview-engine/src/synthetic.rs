//! A seeded stand-in for the engine, used for offline sessions and tests.
//!
//! Trees are generated rather than searched, but they have the shape a real
//! search leaves behind: visit counts shrink with depth and split unevenly
//! between siblings, values alternate sign between plies, and the best path
//! follows the most visited child.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use mctsview_core::{Action, EngineNodeId, EngineSummary, WireNode};
use rand::{Rng, SeedableRng, seq::SliceRandom};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::EngineError,
    source::{GameClient, TreeSource},
    wire::{Board, GameStatus, ProbabilityResponse, Stone},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticConfig {
    pub rows: usize,
    pub cols: usize,
    /// Stones in a row needed to win.
    pub connect: usize,
    /// Most children any generated node gets.
    pub branching: usize,
    /// Deepest ply the generator grows.
    pub depth: usize,
    /// Visit count of each generated root.
    pub root_visits: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        SyntheticConfig {
            rows: 6,
            cols: 6,
            connect: 4,
            branching: 4,
            depth: 6,
            root_visits: 400,
        }
    }
}

#[derive(Debug, Clone)]
struct SearchNode {
    id: u64,
    action: Option<Action>,
    visits: u64,
    value: f64,
    prob: f64,
    exploration: f64,
    children: Vec<usize>,
}

#[derive(Debug, Clone)]
struct SearchTree {
    /// Root first.
    nodes: Vec<SearchNode>,
    by_id: HashMap<u64, usize>,
    best_path: Vec<usize>,
}

impl SearchTree {
    fn grow(rng: &mut ChaCha8Rng, config: &SyntheticConfig, board: &Board, next_id: &mut u64) -> Self {
        let mut nodes = vec![SearchNode {
            id: *next_id,
            action: None,
            visits: config.root_visits.max(1),
            value: rng.gen_range(-0.2..0.2),
            prob: 1.0,
            exploration: 0.0,
            children: Vec::new(),
        }];
        *next_id += 1;

        // (node, depth, actions taken on the way down)
        let mut pending = vec![(0usize, 0usize, Vec::<Action>::new())];
        while let Some((index, depth, taken)) = pending.pop() {
            let parent_visits = nodes[index].visits;
            if depth >= config.depth || parent_visits < 2 {
                continue;
            }
            let mut moves: Vec<Action> = board.empty_cells().filter(|a| !taken.contains(a)).collect();
            moves.shuffle(rng);
            moves.truncate(config.branching.max(1));
            if moves.is_empty() {
                continue;
            }

            let weights: Vec<f64> = moves.iter().map(|_| rng.gen_range(0.05..1.0_f64).powi(2)).collect();
            let total: f64 = weights.iter().sum();
            let budget = parent_visits - 1;
            let parent_value = nodes[index].value;

            for (action, weight) in moves.into_iter().zip(weights) {
                let prob = weight / total;
                let visits = (budget as f64 * prob).floor() as u64;
                if visits == 0 {
                    continue;
                }
                let value = (-0.6 * parent_value + rng.gen_range(-0.5..0.5)).clamp(-1.0, 1.0);
                let exploration = 1.4 * prob * (parent_visits as f64).sqrt() / (1.0 + visits as f64);
                let child = nodes.len();
                nodes.push(SearchNode {
                    id: *next_id,
                    action: Some(action),
                    visits,
                    value,
                    prob,
                    exploration,
                    children: Vec::new(),
                });
                *next_id += 1;
                nodes[index].children.push(child);

                let mut path = taken.clone();
                path.push(action);
                pending.push((child, depth + 1, path));
            }
        }

        let by_id = nodes.iter().enumerate().map(|(i, n)| (n.id, i)).collect();
        let mut best_path = vec![0];
        let mut current = 0;
        while let Some(&next) = nodes[current].children.iter().max_by_key(|&&c| nodes[c].visits) {
            best_path.push(next);
            current = next;
        }
        SearchTree {
            nodes,
            by_id,
            best_path,
        }
    }

    fn root(&self) -> &SearchNode {
        &self.nodes[0]
    }

    /// Wire form of the subtree at `index`. Nodes `max_depth` levels down
    /// report an empty child list.
    fn to_wire(&self, index: usize, max_depth: usize) -> WireNode {
        let build = |node: &SearchNode| WireNode {
            id: EngineNodeId::from(node.id),
            action: node.action,
            visits: Some(node.visits),
            value: Some(node.value),
            exploration: Some(node.exploration),
            prob: Some(node.prob),
            is_best_path: self.best_path.iter().any(|&i| self.nodes[i].id == node.id),
            children: Some(Vec::new()),
        };

        let mut root = build(&self.nodes[index]);
        self.fill(&mut root, index, 0, max_depth, &build);
        root
    }

    fn fill<F>(&self, wire: &mut WireNode, index: usize, depth: usize, max_depth: usize, build: &F)
    where
        F: Fn(&SearchNode) -> WireNode,
    {
        if depth >= max_depth {
            return;
        }
        let children = self.nodes[index]
            .children
            .iter()
            .map(|&child| {
                let mut node = build(&self.nodes[child]);
                self.fill(&mut node, child, depth + 1, max_depth, build);
                node
            })
            .collect();
        wire.children = Some(children);
    }

    fn summary(&self) -> EngineSummary {
        let count = self.nodes.len() as f64;
        let visit_sum: u64 = self.nodes.iter().map(|n| n.visits).sum();
        let value_sum: f64 = self.nodes.iter().map(|n| n.value).sum();
        EngineSummary {
            total_nodes: self.nodes.len() as u64,
            average_visits: visit_sum as f64 / count,
            average_value: value_sum / count,
            max_visits: self.nodes.iter().map(|n| n.visits).max(),
            max_abs_value: self.nodes.iter().map(|n| n.value.abs()).reduce(f64::max),
        }
    }
}

#[derive(Debug)]
struct SyntheticState {
    config: SyntheticConfig,
    rng: ChaCha8Rng,
    board: Board,
    /// 1 moves first, -1 second.
    player: i32,
    winner: Option<i32>,
    next_id: u64,
    tree: Option<SearchTree>,
}

impl SyntheticState {
    fn status(&self, status: &str) -> GameStatus {
        GameStatus {
            status: Some(status.to_string()),
            board: Some(self.board.clone()),
            player: Some(self.player),
            winner: self.winner,
            last_move: None,
        }
    }

    fn game_over(&self) -> Option<GameStatus> {
        self.winner.map(|winner| GameStatus {
            status: Some(GameStatus::GAME_OVER.to_string()),
            winner: Some(winner),
            ..GameStatus::default()
        })
    }

    fn play(&mut self, action: Action) -> bool {
        let stone = if self.player > 0 { Stone::First } else { Stone::Second };
        if !self.board.place(action, stone) {
            return false;
        }
        if completes_line(&self.board, action, stone, self.config.connect) {
            self.winner = Some(self.player);
        } else if self.board.is_full() {
            self.winner = Some(0);
        }
        self.player = -self.player;
        true
    }
}

/// Seeded in-process engine. Clones share one game.
#[derive(Debug, Clone)]
pub struct SyntheticEngine {
    state: Arc<Mutex<SyntheticState>>,
}

impl SyntheticEngine {
    pub fn new(seed: u64) -> Self {
        Self::with_config(seed, SyntheticConfig::default())
    }

    pub fn with_config(seed: u64, config: SyntheticConfig) -> Self {
        let board = Board::empty(config.rows, config.cols);
        SyntheticEngine {
            state: Arc::new(Mutex::new(SyntheticState {
                config,
                rng: ChaCha8Rng::seed_from_u64(seed),
                board,
                player: 1,
                winner: None,
                next_id: 1,
                tree: None,
            })),
        }
    }

    /// Grow a search tree for the current position without playing a move.
    pub fn search(&self) -> usize {
        let mut guard = self.lock();
        let state = &mut *guard;
        let tree = SearchTree::grow(&mut state.rng, &state.config, &state.board, &mut state.next_id);
        let size = tree.nodes.len();
        debug!(nodes = size, "grew synthetic search tree");
        state.tree = Some(tree);
        size
    }

    fn lock(&self) -> MutexGuard<'_, SyntheticState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TreeSource for SyntheticEngine {
    async fn snapshot(&self, max_depth: usize) -> Result<Option<WireNode>, EngineError> {
        let state = self.lock();
        Ok(state.tree.as_ref().map(|tree| tree.to_wire(0, max_depth)))
    }

    async fn subtree(&self, node: EngineNodeId, max_depth: usize) -> Result<Option<WireNode>, EngineError> {
        let state = self.lock();
        let Some(tree) = state.tree.as_ref() else {
            return Ok(None);
        };
        match tree.by_id.get(&node.value()) {
            Some(&index) => Ok(Some(tree.to_wire(index, max_depth))),
            None => Err(EngineError::Engine("Node not found".to_string())),
        }
    }

    async fn summary(&self) -> Result<Option<EngineSummary>, EngineError> {
        let state = self.lock();
        Ok(state.tree.as_ref().map(SearchTree::summary))
    }
}

impl GameClient for SyntheticEngine {
    async fn start_game(&self) -> Result<GameStatus, EngineError> {
        let mut state = self.lock();
        state.board = Board::empty(state.config.rows, state.config.cols);
        state.player = 1;
        state.winner = None;
        state.tree = None;
        Ok(state.status("Game started"))
    }

    async fn make_move(&self, action: Action) -> Result<GameStatus, EngineError> {
        let mut state = self.lock();
        if let Some(over) = state.game_over() {
            return Ok(over);
        }
        if !state.play(action) {
            return Err(EngineError::InvalidMove { action });
        }
        Ok(state.status("success"))
    }

    async fn ai_move(&self) -> Result<GameStatus, EngineError> {
        let mut guard = self.lock();
        if let Some(over) = guard.game_over() {
            return Ok(over);
        }
        let state = &mut *guard;
        let tree = SearchTree::grow(&mut state.rng, &state.config, &state.board, &mut state.next_id);
        let choice = tree
            .best_path
            .get(1)
            .and_then(|&index| tree.nodes[index].action)
            .or_else(|| state.board.empty_cells().next());
        let Some(action) = choice else {
            return Err(EngineError::Engine("AI move failed".to_string()));
        };
        state.tree = Some(tree);
        if !state.play(action) {
            return Err(EngineError::Engine("AI move failed".to_string()));
        }
        let mut status = state.status("success");
        status.last_move = Some(action);
        Ok(status)
    }

    async fn board(&self) -> Result<GameStatus, EngineError> {
        let state = self.lock();
        let mut status = state.status("success");
        status.status = None;
        Ok(status)
    }

    async fn win_probability(&self) -> Result<ProbabilityResponse, EngineError> {
        let state = self.lock();
        if let Some(winner) = state.winner {
            return Ok(ProbabilityResponse {
                status: Some(GameStatus::GAME_OVER.to_string()),
                probability_of_winning: None,
                winner: Some(winner),
            });
        }
        let value = state.tree.as_ref().map_or(0.0, |tree| tree.root().value);
        Ok(ProbabilityResponse {
            status: Some("In progress".to_string()),
            probability_of_winning: Some((value + 1.0) / 2.0),
            winner: None,
        })
    }
}

/// Whether `stone` at `action` sits on a line of at least `connect`.
fn completes_line(board: &Board, action: Action, stone: Stone, connect: usize) -> bool {
    const DIRECTIONS: [(i32, i32); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];
    DIRECTIONS.iter().any(|&(dr, dc)| {
        let run = |sign: i32| {
            (1..)
                .take_while(|step| {
                    let at = Action::new(action.row + sign * step * dr, action.col + sign * step * dc);
                    board.get(at) == Some(stone)
                })
                .count()
        };
        1 + run(1) + run(-1) >= connect
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_trees_split_visits_below_the_parent() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let config = SyntheticConfig::default();
        let mut next_id = 1;
        let tree = SearchTree::grow(&mut rng, &config, &Board::empty(6, 6), &mut next_id);

        for node in &tree.nodes {
            let child_visits: u64 = node.children.iter().map(|&c| tree.nodes[c].visits).sum();
            assert!(child_visits < node.visits.max(1));
        }
        assert_eq!(tree.root().action, None);
        assert_eq!(next_id as usize, tree.nodes.len() + 1);
    }

    #[test]
    fn best_path_follows_the_most_visited_child() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut next_id = 1;
        let tree = SearchTree::grow(&mut rng, &SyntheticConfig::default(), &Board::empty(6, 6), &mut next_id);
        for pair in tree.best_path.windows(2) {
            let parent = &tree.nodes[pair[0]];
            let max = parent.children.iter().map(|&c| tree.nodes[c].visits).max();
            assert_eq!(Some(tree.nodes[pair[1]].visits), max);
        }
    }

    #[test]
    fn wire_frontier_reports_empty_children() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut next_id = 1;
        let tree = SearchTree::grow(&mut rng, &SyntheticConfig::default(), &Board::empty(6, 6), &mut next_id);
        let wire = tree.to_wire(0, 1);
        let children = wire.children.expect("root lists children");
        assert!(!children.is_empty());
        assert!(children.iter().all(|c| c.children == Some(Vec::new())));
    }

    #[test]
    fn four_in_a_row_wins() {
        let mut board = Board::empty(6, 6);
        for col in 0..4 {
            assert!(board.place(Action::new(2, col), Stone::First));
        }
        assert!(completes_line(&board, Action::new(2, 3), Stone::First, 4));
        assert!(!completes_line(&board, Action::new(2, 3), Stone::First, 5));
        assert!(!completes_line(&board, Action::new(2, 3), Stone::Second, 4));
    }
}
