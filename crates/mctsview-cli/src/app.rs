use std::io::Write;

use anyhow::Result;
use mctsview_core::{
    Action, Explorer, FetchFailure, FetchTicket, NodeKey, Resolution, Toggle, ToggleRequest, WireNode,
};
use mctsview_engine::{GameClient, TreeSource, fetch_ticket, wire::GameStatus};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use tracing::{debug, info, warn};

use crate::{
    commands::{Command, HELP, NodeRef},
    config::AppConfig,
    render,
};

type FetchDone = (FetchTicket, Result<Option<WireNode>, FetchFailure>);

/// Interactive session: one explorer, one engine, and any number of
/// subtree fetches in flight.
pub struct Session<E> {
    engine: E,
    explorer: Explorer,
    /// Keys of the last printed tree, for `#row` references.
    rows: Vec<NodeKey>,
    fetches: mpsc::UnboundedSender<FetchDone>,
}

impl<E> Session<E>
where
    E: TreeSource + GameClient + Clone + Send + Sync + 'static,
{
    fn new(engine: E, config: AppConfig, fetches: mpsc::UnboundedSender<FetchDone>) -> Self {
        Session {
            engine,
            explorer: Explorer::new(config.explorer),
            rows: Vec::new(),
            fetches,
        }
    }

    /// Replace the whole tree with a fresh snapshot and summary.
    async fn refresh(&mut self) {
        let depth = self.explorer.snapshot_depth();
        let snapshot = match self.engine.snapshot(depth).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(error = %err, "snapshot request failed");
                println!("could not fetch the tree: {err}");
                return;
            }
        };
        if snapshot.is_none() {
            println!("the engine has no search tree yet; try 'ai'");
        }
        match self.explorer.replace_snapshot(snapshot) {
            Ok(report) if report.dropped > 0 => {
                println!("{} malformed node(s) were skipped", report.dropped);
            }
            Ok(_) => {}
            Err(err) => debug!(error = %err, "snapshot rejected"),
        }
        match self.engine.summary().await {
            Ok(summary) => self.explorer.set_summary(summary),
            Err(err) => warn!(error = %err, "summary request failed"),
        }
    }

    fn resolve_ref(&self, node: NodeRef) -> Option<NodeKey> {
        match node {
            NodeRef::Key(key) => Some(key),
            NodeRef::Row(row) => self.rows.get(row).cloned(),
        }
    }

    fn print_tree(&mut self) {
        let rows = render::tree_rows(&self.explorer);
        if rows.is_empty() {
            println!("(no tree)");
        }
        for row in &rows {
            println!("{}", row.text);
        }
        self.rows = rows.into_iter().map(|row| row.key).collect();
    }

    fn print_notice(&mut self) {
        if let Some(notice) = self.explorer.take_notice() {
            println!("! {notice}");
        }
    }

    fn spawn_fetch(&self, ticket: FetchTicket) {
        let engine = self.engine.clone();
        let done = self.fetches.clone();
        tokio::spawn(async move {
            let outcome = fetch_ticket(&engine, &ticket).await;
            // The receiver only goes away when the session ends.
            let _ = done.send((ticket, outcome));
        });
    }

    fn toggle(&mut self, key: &NodeKey) {
        match self.explorer.toggle(key) {
            Ok(ToggleRequest::Fetch(ticket)) => {
                println!("loading {key} ...");
                self.spawn_fetch(ticket);
            }
            Ok(ToggleRequest::Done(Toggle::Cancelled)) => println!("stopped waiting for {key}"),
            Ok(ToggleRequest::Done(_)) => self.print_tree(),
            Err(err) => println!("{err}"),
        }
    }

    fn on_fetch(&mut self, (ticket, outcome): FetchDone) {
        match self.explorer.resolve(&ticket, outcome) {
            Resolution::Applied { added, .. } => {
                debug!(key = %ticket.key, added, "subtree applied");
                self.print_notice();
                self.print_tree();
            }
            Resolution::Failed(_) => self.print_notice(),
            Resolution::Stale => debug!(key = %ticket.key, "ignored stale subtree"),
        }
    }

    fn after_move(&mut self, status: &GameStatus) {
        if let Some(board) = &status.board {
            print!("{board}");
        }
        if let Some(action) = status.last_move {
            println!("engine played {action}");
        }
        if status.is_over() {
            match status.winner {
                Some(0) => println!("game over: draw"),
                Some(winner) => println!("game over: player {winner} wins"),
                None => println!("game over"),
            }
        }
    }

    /// Show the outcome of a move, then reload the tree or drop it once the
    /// game is over.
    async fn after_turn(&mut self, status: &GameStatus, played: Option<Action>) {
        self.after_move(status);
        if status.is_over() {
            self.explorer.clear();
            self.rows.clear();
            return;
        }
        self.refresh().await;
        if let Some(action) = played {
            self.explorer.select_action(action);
        }
    }

    /// Run one command. Returns false when the session should end.
    async fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::Refresh { depth } => {
                if let Some(depth) = depth {
                    let depth = self.explorer.set_snapshot_depth(depth);
                    println!("snapshot depth {depth}");
                }
                self.refresh().await;
                self.print_notice();
                self.print_tree();
            }
            Command::Tree => self.print_tree(),
            Command::Toggle(node) => match self.resolve_ref(node) {
                Some(key) => self.toggle(&key),
                None => println!("no such row"),
            },
            Command::Select(node) => {
                let details = self.resolve_ref(node).and_then(|key| self.explorer.select(&key));
                match details {
                    Some(details) => println!("{}", render::details(&details)),
                    None => println!("no such node"),
                }
            }
            Command::Click(point) => match self.explorer.select_at(point) {
                Some(details) => println!("{}", render::details(&details)),
                None => println!("nothing there"),
            },
            Command::Show => match self.explorer.selection_details() {
                Some(details) => println!("{}", render::details(&details)),
                None => println!("nothing selected"),
            },
            Command::Summary => {
                let probability = match self.engine.win_probability().await {
                    Ok(response) => response.probability_of_winning,
                    Err(err) => {
                        warn!(error = %err, "win probability request failed");
                        None
                    }
                };
                let text = render::summaries(
                    self.explorer.local_summary(),
                    self.explorer.engine_summary(),
                    probability,
                );
                println!("{text}");
            }
            Command::Zoom { factor, anchor } => {
                match anchor {
                    Some(anchor) => self.explorer.zoom_about(anchor, factor),
                    None => self.explorer.zoom_by(factor),
                }
                println!("zoom {:.2}", self.explorer.viewport().zoom());
            }
            Command::Pan { dx, dy } => {
                self.explorer.pan_by(dx, dy);
                let pan = self.explorer.viewport().pan();
                println!("pan ({:.1}, {:.1})", pan.x, pan.y);
            }
            Command::Reset => {
                self.explorer.reset_view();
                println!("view reset");
            }
            Command::Layout => {
                for line in render::layout_lines(&self.explorer) {
                    println!("{line}");
                }
            }
            Command::Start => match self.engine.start_game().await {
                Ok(status) => {
                    self.explorer.clear();
                    self.after_move(&status);
                }
                Err(err) => println!("{err}"),
            },
            Command::Move(action) => match self.engine.make_move(action).await {
                Ok(status) => self.after_turn(&status, Some(action)).await,
                Err(err) => println!("{err}"),
            },
            Command::Ai => match self.engine.ai_move().await {
                Ok(status) => {
                    self.after_turn(&status, status.last_move).await;
                    self.print_tree();
                }
                Err(err) => println!("{err}"),
            },
            Command::Board => match self.engine.board().await {
                Ok(status) => self.after_move(&status),
                Err(err) => println!("{err}"),
            },
            Command::Help => println!("{HELP}"),
            Command::Quit => return false,
        }
        true
    }
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

/// Drive a session from stdin until `quit` or end of input.
pub async fn run<E>(engine: E, config: AppConfig) -> Result<()>
where
    E: TreeSource + GameClient + Clone + Send + Sync + 'static,
{
    let (sender, mut done) = mpsc::unbounded_channel();
    let mut session = Session::new(engine, config, sender);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    session.refresh().await;
    session.print_tree();
    prompt();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match line.parse::<Command>() {
                    Ok(command) => {
                        if !session.handle(command).await {
                            break;
                        }
                    }
                    Err(err) => println!("{err}"),
                }
                prompt();
            }
            Some(fetched) = done.recv() => {
                println!();
                session.on_fetch(fetched);
                prompt();
            }
        }
    }
    info!("session ended");
    Ok(())
}

#[cfg(test)]
mod tests {
    use mctsview_engine::SyntheticEngine;

    use super::*;

    #[tokio::test]
    async fn game_over_drops_the_last_search_tree() {
        let engine = SyntheticEngine::new(3);
        let (sender, _done) = mpsc::unbounded_channel();
        let mut session = Session::new(engine.clone(), AppConfig::default(), sender);

        for (row, col) in [(0, 0), (1, 0), (0, 1), (1, 1), (0, 2)] {
            assert!(session.handle(Command::Move(Action::new(row, col))).await);
        }
        engine.search();
        assert!(session.handle(Command::Move(Action::new(1, 2))).await);
        assert!(session.explorer.tree().is_some());
        assert!(session.explorer.engine_summary().is_some());

        assert!(session.handle(Command::Move(Action::new(0, 3))).await);
        assert!(session.explorer.tree().is_none());
        assert!(session.explorer.engine_summary().is_none());
        assert!(session.rows.is_empty());
    }
}
