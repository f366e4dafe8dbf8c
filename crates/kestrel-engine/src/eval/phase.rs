//! Game phase from the non-pawn material left on the board.

use kestrel_core::{Board, Position, Role};

/// Phase of a full starting complement of minor and major pieces.
///
/// Weights: Knight=1, Bishop=1, Rook=2, Queen=4.
/// Starting totals: 4×1 + 4×1 + 4×2 + 2×4 = 24.
pub const MAX_PHASE: i32 = 24;

/// Phase contribution per role (pawn first, king last).
const PHASE_WEIGHT: [i32; 6] = [0, 1, 1, 2, 4, 0];

/// Calculate the game phase of `board`.
///
/// Returns a value in `0..=MAX_PHASE`: [`MAX_PHASE`] is a full middlegame
/// material set, 0 a pure king-and-pawn ending. Promoted pieces cannot push
/// the result past the maximum.
pub fn game_phase(board: &Board) -> i32 {
    let pieces = board.position().board();
    let phase: i32 = [Role::Knight, Role::Bishop, Role::Rook, Role::Queen]
        .into_iter()
        .map(|role| pieces.by_role(role).count() as i32 * PHASE_WEIGHT[role as usize - 1])
        .sum();
    phase.min(MAX_PHASE)
}
