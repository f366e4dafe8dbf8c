//! Move ordering: hash move, queen promotions, MVV-LVA captures, killers,
//! then quiet moves by history.

use std::sync::OnceLock;

use kestrel_core::{Move, MoveList, Role};

use crate::eval::pst::role_index;
use crate::search::heuristics::{HistoryTable, KillerTable};

/// MVV-LVA scores indexed by `[victim][attacker]`.
///
/// Weights: Pawn=1, Knight=3, Bishop=3, Rook=5, Queen=9, King=0.
/// Formula: `victim_weight * 16 - attacker_weight`.
const MVV_LVA: [[i32; 6]; 6] = [
    [15, 13, 13, 11, 7, 16],
    [47, 45, 45, 43, 39, 48],
    [47, 45, 45, 43, 39, 48],
    [79, 77, 77, 75, 71, 80],
    [143, 141, 141, 139, 135, 144],
    [-1, -3, -3, -5, -9, 0],
];

const HASH_MOVE: i32 = 1_000_000;
const QUEEN_PROMOTION: i32 = 900_000;
const CAPTURE: i32 = 800_000;
const KILLER: i32 = 700_000;

/// Whether a move is quiet: neither a capture nor a promotion.
#[inline]
pub fn is_quiet(mv: &Move) -> bool {
    !mv.is_capture() && !mv.is_promotion()
}

fn mvv_lva(mv: &Move) -> i32 {
    mv.capture()
        .map_or(0, |victim| MVV_LVA[role_index(victim)][role_index(mv.role())])
}

/// Tactical score shared by both pickers: queen promotions, then captures.
fn tactical_score(mv: &Move) -> Option<i32> {
    if mv.promotion() == Some(Role::Queen) {
        Some(QUEEN_PROMOTION + mvv_lva(mv))
    } else if mv.is_capture() {
        Some(CAPTURE + mvv_lva(mv))
    } else {
        None
    }
}

/// Score a move for the main search.
///
/// Score bands, strictly descending:
/// - hash move: 1,000,000 (assigned by [`MovePicker::new`])
/// - queen promotions: 900,000 + MVV-LVA of any capture
/// - captures: 800,000 + MVV-LVA
/// - killers: 700,000 (most recent) and 699,999
/// - everything else: history score, within ±16,384
fn score_move(mv: &Move, killers: &KillerTable, history: &HistoryTable, ply: usize) -> i32 {
    if let Some(score) = tactical_score(mv) {
        return score;
    }
    if let Some(slot) = killers.slot_of(ply, mv) {
        return KILLER - slot as i32;
    }
    history.score(mv)
}

// ── LMR Table ─────────────────────────────────────────────────────────────────

/// LMR reduction table in whole plies, indexed by `[move_index][depth]`.
static LMR_TABLE: OnceLock<[[i32; 64]; 64]> = OnceLock::new();

fn lmr_table() -> &'static [[i32; 64]; 64] {
    LMR_TABLE.get_or_init(|| {
        let mut t = [[0i32; 64]; 64];
        for (i, row) in t.iter_mut().enumerate().skip(1) {
            for (d, cell) in row.iter_mut().enumerate().skip(1) {
                *cell = (0.76 + (i as f64).ln() * (d as f64).ln() / 2.32) as i32;
            }
        }
        t
    })
}

/// Late-move reduction for the given move index and depth, in plies.
pub fn lmr_reduction(move_index: usize, depth: i32) -> i32 {
    let depth = depth.clamp(0, 63) as usize;
    lmr_table()[move_index.min(63)][depth]
}

// ── Move Picker ────────────────────────────────────────────────────────────────

/// Incremental move picker using selection sort.
///
/// Every move is yielded exactly once, in descending score order. Equal
/// scores keep generation order: the earliest maximum is selected and the
/// skipped moves are shifted rather than swapped.
pub struct MovePicker {
    moves: MoveList,
    scores: [i32; 256],
    cursor: usize,
}

impl MovePicker {
    /// Create a picker over all of `moves` for a full-width node.
    ///
    /// A `hash_move` found in the list is searched first.
    pub fn new(
        moves: MoveList,
        hash_move: Option<&Move>,
        killers: &KillerTable,
        history: &HistoryTable,
        ply: usize,
    ) -> Self {
        let mut scores = [0; 256];
        for (score, mv) in scores.iter_mut().zip(moves.iter()) {
            *score = if hash_move == Some(mv) {
                HASH_MOVE
            } else {
                score_move(mv, killers, history, ply)
            };
        }
        Self {
            moves,
            scores,
            cursor: 0,
        }
    }

    /// Create a picker for quiescence: tactical moves by MVV-LVA, any other
    /// move (check evasions) after them in generation order.
    pub fn new_qsearch(moves: MoveList) -> Self {
        let mut scores = [0; 256];
        for (score, mv) in scores.iter_mut().zip(moves.iter()) {
            *score = tactical_score(mv).unwrap_or(0);
        }
        Self {
            moves,
            scores,
            cursor: 0,
        }
    }

    /// Yield the next highest-scored move.
    pub fn pick_next(&mut self) -> Option<Move> {
        let len = self.moves.len();
        if self.cursor >= len {
            return None;
        }

        let mut best_idx = self.cursor;
        for i in (self.cursor + 1)..len {
            if self.scores[i] > self.scores[best_idx] {
                best_idx = i;
            }
        }

        self.moves[self.cursor..=best_idx].rotate_right(1);
        self.scores[self.cursor..=best_idx].rotate_right(1);

        let mv = self.moves[self.cursor].clone();
        self.cursor += 1;
        Some(mv)
    }
}
