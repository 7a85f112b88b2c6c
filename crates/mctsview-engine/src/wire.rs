//! JSON bodies exchanged with the engine.

use std::fmt;

use mctsview_core::{Action, EngineSummary, WireNode};
use serde::{Deserialize, Serialize};

/// Body of the snapshot and subtree endpoints.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TreeEnvelope {
    #[serde(default)]
    pub tree: Option<WireNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SummaryEnvelope {
    #[serde(default)]
    pub summary: Option<EngineSummary>,
}

/// One board cell as seen by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stone {
    Empty,
    First,
    Second,
}

impl From<f64> for Stone {
    fn from(value: f64) -> Self {
        if value > 0.0 {
            Stone::First
        } else if value < 0.0 {
            Stone::Second
        } else {
            Stone::Empty
        }
    }
}

impl From<Stone> for f64 {
    fn from(stone: Stone) -> Self {
        match stone {
            Stone::Empty => 0.0,
            Stone::First => 1.0,
            Stone::Second => -1.0,
        }
    }
}

/// Row-major board. The engine sends cells as numbers signed by player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>")]
pub struct Board {
    rows: Vec<Vec<Stone>>,
}

impl Board {
    pub fn empty(rows: usize, cols: usize) -> Self {
        Board {
            rows: vec![vec![Stone::Empty; cols]; rows],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows.len()
    }

    pub fn cols(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    pub fn get(&self, action: Action) -> Option<Stone> {
        let row = usize::try_from(action.row).ok()?;
        let col = usize::try_from(action.col).ok()?;
        self.rows.get(row)?.get(col).copied()
    }

    /// Place a stone on an empty cell. Returns false for occupied or
    /// off-board cells.
    pub fn place(&mut self, action: Action, stone: Stone) -> bool {
        let (Ok(row), Ok(col)) = (usize::try_from(action.row), usize::try_from(action.col)) else {
            return false;
        };
        match self.rows.get_mut(row).and_then(|r| r.get_mut(col)) {
            Some(cell) if *cell == Stone::Empty => {
                *cell = stone;
                true
            }
            _ => false,
        }
    }

    pub fn empty_cells(&self) -> impl Iterator<Item = Action> + '_ {
        self.rows.iter().enumerate().flat_map(|(r, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, stone)| **stone == Stone::Empty)
                .map(move |(c, _)| Action::new(r as i32, c as i32))
        })
    }

    pub fn is_full(&self) -> bool {
        self.empty_cells().next().is_none()
    }
}

impl From<Vec<Vec<f64>>> for Board {
    fn from(cells: Vec<Vec<f64>>) -> Self {
        Board {
            rows: cells
                .into_iter()
                .map(|row| row.into_iter().map(Stone::from).collect())
                .collect(),
        }
    }
}

impl From<Board> for Vec<Vec<f64>> {
    fn from(board: Board) -> Self {
        board
            .rows
            .into_iter()
            .map(|row| row.into_iter().map(f64::from).collect())
            .collect()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  ")?;
        for c in 0..self.cols() {
            write!(f, " {c}")?;
        }
        writeln!(f)?;
        for (r, row) in self.rows.iter().enumerate() {
            write!(f, "{r:>2}")?;
            for stone in row {
                let ch = match stone {
                    Stone::Empty => '.',
                    Stone::First => 'X',
                    Stone::Second => 'O',
                };
                write!(f, " {ch}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
    pub row: i32,
    pub col: i32,
}

impl From<Action> for MoveRequest {
    fn from(action: Action) -> Self {
        MoveRequest {
            row: action.row,
            col: action.col,
        }
    }
}

/// Body shared by the game endpoints; each fills in the fields it knows.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GameStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board: Option<Board>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<i32>,
    /// Move the engine just played, on `/ai_move` only.
    #[serde(rename = "move", default, skip_serializing_if = "Option::is_none")]
    pub last_move: Option<Action>,
}

impl GameStatus {
    pub const GAME_OVER: &'static str = "Game over";

    pub fn is_over(&self) -> bool {
        self.status.as_deref() == Some(Self::GAME_OVER) || self.winner.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProbabilityResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub probability_of_winning: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<i32>,
}

/// Error body of a rejected request.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorDetail {
    pub(crate) detail: String,
}
