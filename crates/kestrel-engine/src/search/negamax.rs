//! Negamax alpha-beta search with quiescence.

use arrayvec::ArrayVec;
use tracing::trace;

use kestrel_core::{Board, Move};

use crate::eval::evaluate;
use crate::params::SearchParams;
use crate::search::control::SearchControl;
use crate::search::heuristics::{HistoryTable, KillerTable};
use crate::search::ordering::{MovePicker, is_quiet, lmr_reduction};
use crate::search::tt::{Bound, TranspositionTable};

/// Score representing an unreachable upper/lower bound.
pub const INF: i32 = 30_000;

/// Base score for checkmate (adjusted by ply for mate distance).
pub const MATE: i32 = 29_000;

/// Scores above this threshold indicate a forced mate.
pub const MATE_THRESHOLD: i32 = 28_000;

/// Maximum search depth (in plies) for array sizing and recursion limits.
pub const MAX_PLY: usize = 128;

/// Quiet moves remembered per node for the history penalty.
const MAX_QUIETS: usize = 64;

/// Aspiration-window search around the previous iteration's score.
///
/// Depth 1 and mate scores use the full window. A result on or outside the
/// window is re-searched with the full window.
pub(super) fn aspiration_search(
    board: &mut Board,
    depth: i32,
    prev_score: i32,
    ctx: &mut SearchContext<'_>,
) -> i32 {
    if depth <= 1 || prev_score.abs() >= MATE_THRESHOLD {
        return negamax(board, depth, 0, -INF, INF, true, ctx);
    }

    let window = ctx.params.aspiration_window;
    let alpha = prev_score - window;
    let beta = prev_score + window;
    let score = negamax(board, depth, 0, alpha, beta, true, ctx);
    if ctx.aborted {
        return score;
    }

    if score <= alpha || score >= beta {
        trace!(depth, score, alpha, beta, "aspiration window missed, re-searching");
        return negamax(board, depth, 0, -INF, INF, true, ctx);
    }
    score
}

/// Negamax alpha-beta search.
///
/// Returns the best score for the side to move; the principal variation is
/// collected into `ctx.pv`. Once the control signals a stop, every frame
/// returns 0 and `ctx.aborted` tells the caller to discard the result. The
/// board is always restored before returning.
pub(super) fn negamax(
    board: &mut Board,
    mut depth: i32,
    ply: usize,
    mut alpha: i32,
    beta: i32,
    null_allowed: bool,
    ctx: &mut SearchContext<'_>,
) -> i32 {
    ctx.pv.clear_ply(ply);
    if ctx.aborted {
        return 0;
    }

    let in_check = board.in_check();
    if in_check && depth >= 0 {
        depth += 1;
    }

    if depth <= 0 {
        return qsearch(board, ply, alpha, beta, ctx);
    }

    ctx.nodes += 1;
    if ctx.control.should_stop(ctx.nodes) {
        ctx.aborted = true;
        return 0;
    }

    let root = ply == 0;
    let params = ctx.params;

    if !root {
        if board.is_repetition() || board.is_fifty_move_draw() || board.is_insufficient_material()
        {
            return 0;
        }
        if ply >= MAX_PLY {
            return evaluate(board, params.tempo);
        }
    }

    // Probe transposition table
    let hash = board.hash();
    let mut hash_move: Option<Move> = None;
    if let Some(entry) = ctx.tt.probe(hash, ply) {
        if !root && entry.depth >= depth && entry.bound.allows_cutoff(entry.score, alpha, beta) {
            return entry.score;
        }
        hash_move = entry.best_move;
    }

    let static_eval = if in_check {
        -INF
    } else {
        evaluate(board, params.tempo)
    };

    // Reverse futility pruning
    if !in_check
        && !root
        && depth <= params.rfp_depth
        && beta.abs() < MATE_THRESHOLD
        && static_eval - params.rfp_margin * depth >= beta
    {
        return static_eval - params.rfp_margin * depth;
    }

    // Null-move pruning
    if null_allowed
        && !in_check
        && !root
        && depth >= 3
        && static_eval >= beta
        && board.has_non_pawn_material(board.side_to_move())
        && board.skip_turn()
    {
        let reduced = depth - 1 - params.null_move_reduction;
        let score = -negamax(board, reduced, ply + 1, -beta, -beta + 1, false, ctx);
        board.undo_skip_turn();
        if ctx.aborted {
            return 0;
        }
        if score >= beta {
            return if score >= MATE_THRESHOLD { beta } else { score };
        }
    }

    let moves = board.legal_moves();
    if moves.is_empty() {
        return if in_check { -(MATE - ply as i32) } else { 0 };
    }

    let original_alpha = alpha;
    let mut best_score = -INF;
    let mut best_move: Option<Move> = None;
    let mut quiets: ArrayVec<Move, MAX_QUIETS> = ArrayVec::new();
    let mut picker = MovePicker::new(moves, hash_move.as_ref(), ctx.killers, ctx.history, ply);
    let futile = !root
        && !in_check
        && depth <= params.futility_depth
        && alpha.abs() < MATE_THRESHOLD
        && static_eval + params.futility_margin * depth <= alpha;
    let mut move_index = 0usize;

    while let Some(mv) = picker.pick_next() {
        let quiet = is_quiet(&mv);
        board.make_move(&mv);
        let gives_check = board.in_check();

        // Futility pruning: late quiet moves cannot lift a hopeless node.
        if futile && quiet && !gives_check && move_index > 0 {
            board.undo_move();
            move_index += 1;
            continue;
        }

        let new_depth = depth - 1;
        let score = if move_index == 0 || root {
            -negamax(board, new_depth, ply + 1, -beta, -alpha, true, ctx)
        } else {
            let reduction = if quiet
                && move_index >= params.lmr_min_moves as usize
                && depth >= 3
                && !in_check
                && !gives_check
            {
                lmr_reduction(move_index, depth).clamp(0, new_depth - 1)
            } else {
                0
            };

            let mut s = -negamax(board, new_depth - reduction, ply + 1, -alpha - 1, -alpha, true, ctx);
            if reduction > 0 && s > alpha {
                s = -negamax(board, new_depth, ply + 1, -alpha - 1, -alpha, true, ctx);
            }
            if s > alpha && s < beta {
                s = -negamax(board, new_depth, ply + 1, -beta, -alpha, true, ctx);
            }
            s
        };
        board.undo_move();

        if ctx.aborted {
            return 0;
        }

        if score > best_score {
            best_score = score;
            best_move = Some(mv.clone());
            if score > alpha {
                alpha = score;
                ctx.pv.update(ply, &mv);
            }
        }

        if alpha >= beta {
            if quiet {
                ctx.killers.store(ply, &mv);
                ctx.history.update_good(&mv, depth);
                for tried in &quiets {
                    ctx.history.update_bad(tried, depth);
                }
            }
            break;
        }

        if quiet {
            let _ = quiets.try_push(mv);
        }
        move_index += 1;
    }

    let bound = if best_score >= beta {
        Bound::LowerBound
    } else if alpha > original_alpha {
        Bound::Exact
    } else {
        Bound::UpperBound
    };
    ctx.tt.store(hash, depth, best_score, bound, best_move.or(hash_move), ply);

    best_score
}

/// Quiescence search: resolve captures and promotions before trusting the
/// static evaluation.
///
/// In check there is no stand-pat; every evasion is searched and having
/// none is mate.
fn qsearch(
    board: &mut Board,
    ply: usize,
    mut alpha: i32,
    beta: i32,
    ctx: &mut SearchContext<'_>,
) -> i32 {
    ctx.pv.clear_ply(ply);
    if ctx.aborted {
        return 0;
    }

    ctx.nodes += 1;
    if ctx.control.should_stop(ctx.nodes) {
        ctx.aborted = true;
        return 0;
    }

    if board.is_repetition() || board.is_fifty_move_draw() || board.is_insufficient_material() {
        return 0;
    }

    let tempo = ctx.params.tempo;
    if ply >= MAX_PLY {
        return evaluate(board, tempo);
    }

    let in_check = board.in_check();
    let (moves, mut best_score) = if in_check {
        let evasions = board.legal_moves();
        if evasions.is_empty() {
            return -(MATE - ply as i32);
        }
        (evasions, -INF)
    } else {
        let stand_pat = evaluate(board, tempo);
        if stand_pat >= beta {
            return stand_pat;
        }
        if stand_pat > alpha {
            alpha = stand_pat;
        }
        (board.noisy_moves(), stand_pat)
    };

    let mut picker = MovePicker::new_qsearch(moves);
    while let Some(mv) = picker.pick_next() {
        board.make_move(&mv);
        let score = -qsearch(board, ply + 1, -beta, -alpha, ctx);
        board.undo_move();

        if ctx.aborted {
            return 0;
        }

        if score > best_score {
            best_score = score;
            if score > alpha {
                alpha = score;
                if alpha >= beta {
                    break;
                }
            }
        }
    }

    best_score
}

/// Triangular PV table for collecting principal variation lines.
///
/// Row `ply` holds the best line found from that ply onward.
pub struct PvTable {
    lines: Vec<Vec<Move>>,
}

impl PvTable {
    /// Create an empty PV table.
    pub fn new() -> Self {
        Self {
            lines: vec![Vec::new(); MAX_PLY + 1],
        }
    }

    /// Clear the PV line at `ply` (called at the top of each node).
    pub fn clear_ply(&mut self, ply: usize) {
        if let Some(line) = self.lines.get_mut(ply) {
            line.clear();
        }
    }

    /// Set `mv` as the best move at `ply`, followed by the line from `ply + 1`.
    pub fn update(&mut self, ply: usize, mv: &Move) {
        if ply >= MAX_PLY {
            return;
        }
        let (head, tail) = self.lines.split_at_mut(ply + 1);
        let line = &mut head[ply];
        line.clear();
        line.push(mv.clone());
        line.extend_from_slice(&tail[0]);
    }

    /// The principal variation from the root.
    pub fn root_pv(&self) -> &[Move] {
        &self.lines[0]
    }
}

impl Default for PvTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Search state threaded through negamax calls.
pub(super) struct SearchContext<'a> {
    /// Total nodes visited.
    pub nodes: u64,
    /// Set once the control signals a stop; the running pass is void.
    pub aborted: bool,
    /// Transposition table.
    pub tt: &'a mut TranspositionTable,
    /// Killer moves per ply.
    pub killers: &'a mut KillerTable,
    /// Quiet-move history.
    pub history: &'a mut HistoryTable,
    /// Tunable margins and reductions.
    pub params: &'a SearchParams,
    /// Principal variation table.
    pub pv: PvTable,
    /// Search control (stop flag + limits).
    pub control: &'a SearchControl,
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_core::{Board, move_to_uci};

    fn line(board: &Board, moves: &[&str]) -> Vec<Move> {
        let mut board = board.clone();
        moves
            .iter()
            .map(|uci| {
                let mv = board.parse_uci_move(uci).unwrap();
                board.make_move(&mv);
                mv
            })
            .collect()
    }

    #[test]
    fn pv_update_prepends_to_child_line() {
        let board = Board::starting_position();
        let moves = line(&board, &["e2e4", "e7e5", "g1f3"]);
        let mut pv = PvTable::new();
        pv.update(2, &moves[2]);
        pv.update(1, &moves[1]);
        pv.update(0, &moves[0]);
        let uci: Vec<String> = pv.root_pv().iter().map(move_to_uci).collect();
        assert_eq!(uci, vec!["e2e4", "e7e5", "g1f3"]);
    }

    #[test]
    fn pv_clear_drops_stale_continuation() {
        let board = Board::starting_position();
        let moves = line(&board, &["e2e4", "e7e5"]);
        let mut pv = PvTable::new();
        pv.update(1, &moves[1]);
        pv.clear_ply(1);
        pv.update(0, &moves[0]);
        assert_eq!(pv.root_pv().len(), 1);
    }

    #[test]
    fn pv_update_past_max_ply_ignored() {
        let board = Board::starting_position();
        let moves = line(&board, &["e2e4"]);
        let mut pv = PvTable::new();
        pv.update(MAX_PLY, &moves[0]);
        pv.clear_ply(MAX_PLY + 10);
        assert!(pv.root_pv().is_empty());
    }
}
