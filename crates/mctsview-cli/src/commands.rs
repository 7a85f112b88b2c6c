use std::str::FromStr;

use kurbo::Point;
use mctsview_core::{Action, NodeKey};
use thiserror::Error;

/// A node as typed by the user: a path key like `0/3/7`, or `#n` for the
/// n-th row of the last printed tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeRef {
    Key(NodeKey),
    Row(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Fetch a fresh snapshot, optionally at a new depth.
    Refresh { depth: Option<usize> },
    Tree,
    Toggle(NodeRef),
    Select(NodeRef),
    /// Select the node drawn under a view-space point.
    Click(Point),
    Show,
    Summary,
    Zoom { factor: f64, anchor: Option<Point> },
    Pan { dx: f64, dy: f64 },
    Reset,
    Layout,
    Start,
    Move(Action),
    Ai,
    Board,
    Help,
    Quit,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CommandError {
    #[error("unknown command '{0}', try 'help'")]
    Unknown(String),
    #[error("'{command}' expects {expected}")]
    Usage {
        command: &'static str,
        expected: &'static str,
    },
}

pub const HELP: &str = "\
commands:
  refresh [depth]     fetch a new snapshot (depth 1..=5)
  tree                print the visible tree
  toggle <node>       expand or collapse a node (key like 0/3 or row like #2)
  select <node>       show a node's details
  click <x> <y>       select the node under a view point
  show                details of the selected node
  summary             local and engine summaries, win probability
  zoom <f> [x y]      zoom by a factor, optionally about a view point
  pan <dx> <dy>       move the view
  reset               reset zoom and pan
  layout              print node positions in view coordinates
  start               start a new game
  move <row> <col>    play a move
  ai                  let the engine move
  board               print the board
  quit";

fn number<T: FromStr>(word: Option<&str>, command: &'static str, expected: &'static str) -> Result<T, CommandError> {
    word.and_then(|w| w.parse().ok())
        .ok_or(CommandError::Usage { command, expected })
}

fn node_ref(word: Option<&str>, command: &'static str) -> Result<NodeRef, CommandError> {
    let usage = CommandError::Usage {
        command,
        expected: "a node key or #row",
    };
    let word = word.ok_or_else(|| usage.clone())?;
    match word.strip_prefix('#') {
        Some(row) => row.parse().map(NodeRef::Row).map_err(|_| usage),
        None => Ok(NodeRef::Key(NodeKey::from(word))),
    }
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Ok(Command::Tree);
        };
        let command = match head {
            "refresh" | "r" => Command::Refresh {
                depth: match words.next() {
                    Some(word) => Some(number(Some(word), "refresh", "a depth")?),
                    None => None,
                },
            },
            "tree" | "t" => Command::Tree,
            "toggle" | "x" => Command::Toggle(node_ref(words.next(), "toggle")?),
            "select" | "s" => Command::Select(node_ref(words.next(), "select")?),
            "click" => Command::Click(Point::new(
                number(words.next(), "click", "two coordinates")?,
                number(words.next(), "click", "two coordinates")?,
            )),
            "show" => Command::Show,
            "summary" => Command::Summary,
            "zoom" | "z" => {
                let factor = number(words.next(), "zoom", "a factor")?;
                let anchor = match words.next() {
                    Some(x) => Some(Point::new(
                        number(Some(x), "zoom", "an anchor point")?,
                        number(words.next(), "zoom", "an anchor point")?,
                    )),
                    None => None,
                };
                Command::Zoom { factor, anchor }
            }
            "pan" | "p" => Command::Pan {
                dx: number(words.next(), "pan", "dx and dy")?,
                dy: number(words.next(), "pan", "dx and dy")?,
            },
            "reset" => Command::Reset,
            "layout" => Command::Layout,
            "start" => Command::Start,
            "move" | "m" => Command::Move(Action::new(
                number(words.next(), "move", "a row and a column")?,
                number(words.next(), "move", "a row and a column")?,
            )),
            "ai" => Command::Ai,
            "board" | "b" => Command::Board,
            "help" | "?" => Command::Help,
            "quit" | "q" | "exit" => Command::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_node_refs() {
        assert_eq!(
            "toggle 0/2/9".parse(),
            Ok(Command::Toggle(NodeRef::Key(NodeKey::from("0/2/9"))))
        );
        assert_eq!("s #4".parse(), Ok(Command::Select(NodeRef::Row(4))));
        assert!(matches!("toggle #x".parse::<Command>(), Err(CommandError::Usage { .. })));
    }

    #[test]
    fn parses_numbers() {
        assert_eq!("move 2 3".parse(), Ok(Command::Move(Action::new(2, 3))));
        assert_eq!("pan -10 4.5".parse(), Ok(Command::Pan { dx: -10.0, dy: 4.5 }));
        assert_eq!(
            "zoom 0.5 100 40".parse(),
            Ok(Command::Zoom {
                factor: 0.5,
                anchor: Some(Point::new(100.0, 40.0))
            })
        );
        assert_eq!("refresh".parse(), Ok(Command::Refresh { depth: None }));
        assert_eq!("refresh 4".parse(), Ok(Command::Refresh { depth: Some(4) }));
    }

    #[test]
    fn blank_line_reprints_the_tree() {
        assert_eq!("   ".parse(), Ok(Command::Tree));
    }

    #[test]
    fn rejects_unknown_and_incomplete_commands() {
        assert_eq!("fly".parse::<Command>(), Err(CommandError::Unknown("fly".to_string())));
        assert!(matches!("move 2".parse::<Command>(), Err(CommandError::Usage { command: "move", .. })));
    }
}
