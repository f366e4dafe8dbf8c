//! Event-driven UCI engine: commands on the main thread, search on a worker.

use std::io::{self, BufRead};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::time::Duration;

use tracing::{debug, info, warn};

use kestrel_core::{Board, Move, move_to_uci};
use kestrel_engine::{
    DEFAULT_HASH_MB, MATE, MATE_THRESHOLD, MAX_PLY, PARAM_SPECS, SearchResult, Searcher,
    limits_from_go,
};

use crate::command::{Command, GoParams, SetOption, parse_command};
use crate::error::UciError;

const MAX_HASH_MB: usize = 65_536;

/// Internal engine state: idle or searching.
enum EngineState {
    Idle,
    Searching,
}

/// Events processed by the main engine loop.
enum EngineEvent {
    UciCommand(Result<Command, UciError>),
    SearchDone(SearchDone),
    InputClosed,
}

/// Payload returned by the search thread when it finishes.
struct SearchDone {
    result: SearchResult,
    searcher: Searcher,
}

/// The UCI engine, holding the current game and the searcher.
///
/// Runs an event-driven loop on the main thread, handing the searcher to a
/// worker thread for each `go` so `stop` and `quit` stay responsive.
pub struct UciEngine {
    board: Board,
    searcher: Option<Searcher>,
    state: EngineState,
    stop_flag: Arc<AtomicBool>,
    /// Options received while the searcher was away on the worker thread.
    pending_options: Vec<SetOption>,
    pending_clear: bool,
}

impl UciEngine {
    /// Create a new engine with the starting position.
    pub fn new() -> Self {
        Self {
            board: Board::starting_position(),
            searcher: Some(Searcher::new()),
            state: EngineState::Idle,
            stop_flag: Arc::new(AtomicBool::new(false)),
            pending_options: Vec::new(),
            pending_clear: false,
        }
    }

    /// Run the UCI event loop, reading from stdin until `quit` or input closes.
    pub fn run(mut self) -> Result<(), UciError> {
        let (tx, rx) = mpsc::channel::<EngineEvent>();

        let stdin_tx = tx.clone();
        std::thread::spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else {
                    break;
                };
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                debug!(cmd = %trimmed, "received UCI command");
                if stdin_tx
                    .send(EngineEvent::UciCommand(parse_command(trimmed)))
                    .is_err()
                {
                    return;
                }
            }
            let _ = stdin_tx.send(EngineEvent::InputClosed);
        });

        info!("kestrel ready");
        for event in &rx {
            match event {
                EngineEvent::UciCommand(Ok(cmd)) => match cmd {
                    Command::Uci => self.handle_uci(),
                    Command::IsReady => println!("readyok"),
                    Command::UciNewGame => self.handle_ucinewgame(),
                    Command::Position(board) => self.board = board,
                    Command::Go(params) => self.handle_go(params, &tx),
                    Command::SetOption(option) => self.handle_setoption(option),
                    Command::Stop => self.stop_flag.store(true, Ordering::Release),
                    Command::Quit => {
                        self.abort_search(&rx);
                        break;
                    }
                    Command::Unknown(token) => {
                        if !token.is_empty() {
                            debug!(%token, "ignoring unknown command");
                        }
                    }
                },
                EngineEvent::UciCommand(Err(e)) => {
                    warn!(error = %e, "ignoring malformed UCI command");
                }
                EngineEvent::SearchDone(done) => self.finish_search(done),
                EngineEvent::InputClosed => {
                    self.abort_search(&rx);
                    break;
                }
            }
        }

        info!("kestrel shutting down");
        Ok(())
    }

    /// Stop a running search and wait for the worker to hand the searcher back.
    fn abort_search(&mut self, rx: &mpsc::Receiver<EngineEvent>) {
        if !matches!(self.state, EngineState::Searching) {
            return;
        }
        self.stop_flag.store(true, Ordering::Release);
        for event in rx {
            if let EngineEvent::SearchDone(done) = event {
                self.finish_search(done);
                return;
            }
        }
    }

    fn handle_uci(&self) {
        println!("id name kestrel");
        println!("id author the kestrel developers");
        println!(
            "option name Hash type spin default {DEFAULT_HASH_MB} min 1 max {MAX_HASH_MB}"
        );
        println!("option name Clear Hash type button");
        for spec in &PARAM_SPECS {
            println!(
                "option name {} type spin default {} min {} max {}",
                spec.name, spec.default, spec.min, spec.max
            );
        }
        println!("uciok");
    }

    fn handle_ucinewgame(&mut self) {
        self.board = Board::starting_position();
        match self.searcher.as_mut() {
            Some(searcher) => searcher.clear(),
            None => self.pending_clear = true,
        }
    }

    fn handle_setoption(&mut self, option: SetOption) {
        match self.searcher.as_mut() {
            Some(searcher) => {
                if let Err(e) = apply_option(searcher, &option) {
                    warn!(error = %e, "setoption rejected");
                }
            }
            None => self.pending_options.push(option),
        }
    }

    fn handle_go(&mut self, params: GoParams, tx: &mpsc::Sender<EngineEvent>) {
        if !matches!(self.state, EngineState::Idle) {
            warn!("go received while searching, ignoring");
            return;
        }
        let Some(mut searcher) = self.searcher.take() else {
            warn!("searcher unavailable, ignoring go");
            return;
        };

        self.stop_flag = Arc::new(AtomicBool::new(false));

        let mut control = limits_from_go(
            params.wtime,
            params.btime,
            params.winc,
            params.binc,
            params.movestogo,
            params.movetime,
            params.infinite,
            self.board.side_to_move(),
            Arc::clone(&self.stop_flag),
            searcher.params(),
        );
        if let Some(nodes) = params.nodes {
            control = control.with_node_limit(nodes);
        }
        debug!(?control, "starting search");

        let max_depth = params.depth.unwrap_or((MAX_PLY - 1) as u8);
        let mut board = self.board.clone();
        let tx = tx.clone();

        std::thread::spawn(move || {
            let result = searcher.search(&mut board, max_depth, &control, |depth, score, nodes, pv| {
                println!("{}", format_info(depth, score, nodes, control.elapsed(), pv));
            });
            let _ = tx.send(EngineEvent::SearchDone(SearchDone { result, searcher }));
        });

        self.state = EngineState::Searching;
    }

    fn finish_search(&mut self, done: SearchDone) {
        let mut searcher = done.searcher;

        if self.pending_clear {
            searcher.clear();
            self.pending_clear = false;
        }
        for option in self.pending_options.drain(..) {
            if let Err(e) = apply_option(&mut searcher, &option) {
                warn!(error = %e, "setoption rejected");
            }
        }
        self.searcher = Some(searcher);

        let best = done
            .result
            .best_move
            .as_ref()
            .map_or_else(|| "0000".to_string(), move_to_uci);
        println!("bestmove {best}");

        self.state = EngineState::Idle;
    }
}

impl Default for UciEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply one `setoption` to the searcher.
fn apply_option(searcher: &mut Searcher, option: &SetOption) -> Result<(), UciError> {
    if option.name.eq_ignore_ascii_case("Clear Hash") {
        searcher.clear();
        return Ok(());
    }

    let raw = option.value.as_deref().unwrap_or_default();
    let invalid = || UciError::InvalidOptionValue {
        name: option.name.clone(),
        value: raw.to_string(),
    };
    let value: i64 = raw.trim().parse().map_err(|_| invalid())?;

    if option.name.eq_ignore_ascii_case("Hash") {
        let mb = usize::try_from(value).map_err(|_| invalid())?;
        searcher.resize_tt(mb.clamp(1, MAX_HASH_MB));
        debug!(mb, "transposition table resized");
        return Ok(());
    }

    let value = i32::try_from(value).map_err(|_| invalid())?;
    searcher.params_mut().set(&option.name, value)?;
    debug!(name = %option.name, value, "parameter updated");
    Ok(())
}

/// Format a score the way UCI expects: `cp <n>` or `mate <moves>`.
pub fn format_score(score: i32) -> String {
    if score.abs() >= MATE_THRESHOLD {
        let plies = MATE - score.abs();
        let moves = (plies + 1) / 2;
        if score > 0 {
            format!("mate {moves}")
        } else {
            format!("mate -{moves}")
        }
    } else {
        format!("cp {score}")
    }
}

/// Build an `info` line for a completed iteration.
pub fn format_info(depth: u8, score: i32, nodes: u64, elapsed: Duration, pv: &[Move]) -> String {
    let elapsed_ms = elapsed.as_millis().max(1);
    let nps = (nodes as u128 * 1000) / elapsed_ms;
    let pv_str: Vec<String> = pv.iter().map(move_to_uci).collect();
    format!(
        "info depth {depth} score {} nodes {nodes} nps {nps} time {elapsed_ms} pv {}",
        format_score(score),
        pv_str.join(" ")
    )
}
