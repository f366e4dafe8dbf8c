//! Iterative-deepening driver over the alpha-beta core.

pub mod control;
pub mod heuristics;
pub mod negamax;
pub mod ordering;
pub mod tt;

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};

use tracing::debug;

use kestrel_core::{Board, Move, move_to_uci};

use crate::params::SearchParams;
use control::SearchControl;
use heuristics::{HistoryTable, KillerTable};
use negamax::{MATE, MAX_PLY, PvTable, SearchContext, aspiration_search};
use tt::TranspositionTable;

/// Default transposition table size in megabytes.
pub const DEFAULT_HASH_MB: usize = 16;

/// Result of a completed search.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Best move of the deepest completed iteration, or the first legal move
    /// if none completed. `None` only when the root has no legal move.
    pub best_move: Option<Move>,
    /// Full principal variation line.
    pub pv: Vec<Move>,
    /// Score in centipawns from the side to move's perspective.
    pub score: i32,
    /// Total nodes visited during the search.
    pub nodes: u64,
    /// Depth of the deepest completed iteration (0 if none completed).
    pub depth: u8,
}

/// Iterative-deepening searcher.
///
/// Owns the transposition table, killer and history tables, and tunables.
/// The transposition table survives between searches; history is halved and
/// killers are cleared at the start of each one.
pub struct Searcher {
    tt: TranspositionTable,
    killers: KillerTable,
    history: HistoryTable,
    params: SearchParams,
}

impl Searcher {
    /// Create a fresh searcher with a 16 MB transposition table.
    pub fn new() -> Self {
        Self::with_table(TranspositionTable::new(DEFAULT_HASH_MB))
    }

    /// Create a searcher around an existing transposition table.
    pub fn with_table(tt: TranspositionTable) -> Self {
        Self {
            tt,
            killers: KillerTable::new(),
            history: HistoryTable::new(),
            params: SearchParams::default(),
        }
    }

    /// Current tunables.
    pub fn params(&self) -> &SearchParams {
        &self.params
    }

    /// Mutable access to the tunables.
    pub fn params_mut(&mut self) -> &mut SearchParams {
        &mut self.params
    }

    /// Forget everything learned: transposition table, killers, history.
    pub fn clear(&mut self) {
        self.tt.clear();
        self.killers.clear();
        self.history.clear();
    }

    /// Replace the transposition table with a fresh one of `mb` megabytes.
    pub fn resize_tt(&mut self, mb: usize) {
        self.tt = TranspositionTable::new(mb);
    }

    /// Transposition table occupancy in permille.
    pub fn hashfull(&self) -> u32 {
        self.tt.hashfull()
    }

    /// Run iterative-deepening search up to `max_depth`.
    ///
    /// Calls `on_iter(depth, score, nodes, pv)` after each completed
    /// iteration. An iteration interrupted by `control` is discarded. The
    /// board is left exactly as it was passed in.
    pub fn search<F>(
        &mut self,
        board: &mut Board,
        max_depth: u8,
        control: &SearchControl,
        mut on_iter: F,
    ) -> SearchResult
    where
        F: FnMut(u8, i32, u64, &[Move]),
    {
        self.history.age();
        self.killers.clear();

        let root_moves = board.legal_moves();
        let mut result = SearchResult {
            best_move: root_moves.first().cloned(),
            pv: Vec::new(),
            score: 0,
            nodes: 0,
            depth: 0,
        };

        if root_moves.is_empty() {
            result.score = if board.in_check() { -MATE } else { 0 };
            debug!(score = result.score, "no legal moves at root");
            return result;
        }

        let root_draw = board.is_threefold_repetition() || board.is_fifty_move_draw();
        let max_depth = max_depth.clamp(1, (MAX_PLY - 1) as u8);

        let mut ctx = SearchContext {
            nodes: 0,
            aborted: false,
            tt: &mut self.tt,
            killers: &mut self.killers,
            history: &mut self.history,
            params: &self.params,
            pv: PvTable::new(),
            control,
        };

        let mut prev_score = 0;
        let mut last_iteration = Duration::ZERO;

        for depth in 1..=max_depth {
            if depth > 1 && !control.can_start_iteration(last_iteration) {
                break;
            }

            let started = Instant::now();
            let score = aspiration_search(board, depth as i32, prev_score, &mut ctx);

            // An interrupted pass is discarded in favour of the last completed one
            if ctx.aborted {
                debug!(depth, nodes = ctx.nodes, "iteration aborted");
                break;
            }
            last_iteration = started.elapsed();
            prev_score = score;

            let pv = ctx.pv.root_pv();
            if let Some(first) = pv.first() {
                result.best_move = Some(first.clone());
                result.pv = pv.to_vec();
            }
            result.score = if root_draw { 0 } else { score };
            result.depth = depth;

            debug!(
                depth,
                score = result.score,
                nodes = ctx.nodes,
                best = %result.best_move.as_ref().map_or_else(|| "0000".to_string(), move_to_uci),
                "iteration complete"
            );
            on_iter(depth, result.score, ctx.nodes, &result.pv);

            if root_draw {
                debug!("root position is a claimable draw");
                break;
            }
        }

        result.nodes = ctx.nodes;
        result
    }

    /// Choose a move within `budget` of wall-clock time.
    ///
    /// Always answers if a legal move exists, even when the budget is too
    /// small to complete a single iteration.
    pub fn think(&mut self, board: &mut Board, budget: Duration) -> Option<Move> {
        let soft = budget * self.params.soft_time_percent as u32 / 100;
        let control = SearchControl::new_timed(Arc::new(AtomicBool::new(false)), soft, budget);
        self.search(board, MAX_PLY as u8 - 1, &control, |_, _, _, _| {})
            .best_move
    }

    /// Choose a move by searching exactly to `depth`, ignoring the clock.
    pub fn think_depth(&mut self, board: &mut Board, depth: u8) -> Option<Move> {
        let control = SearchControl::new_infinite(Arc::new(AtomicBool::new(false)));
        self.search(board, depth, &control, |_, _, _, _| {}).best_move
    }
}

impl std::fmt::Debug for Searcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Searcher")
            .field("tt", &self.tt)
            .field("params", &self.params)
            .finish()
    }
}

impl Default for Searcher {
    fn default() -> Self {
        Self::new()
    }
}
