//! Perft (performance test): counts leaf nodes through make/undo.
//!
//! Exercises the same `make_move` / `undo_move` path the search uses, so a
//! correct count also shows the stack is balanced on every branch.

use crate::board::{Board, move_to_uci};

/// Count the number of leaf nodes at the given depth.
///
/// Depth 0 returns 1 (the current position). Depth 1 returns the number
/// of legal moves without recursing.
pub fn perft(board: &mut Board, depth: usize) -> u64 {
    if depth == 0 {
        return 1;
    }

    let moves = board.legal_moves();

    if depth == 1 {
        return moves.len() as u64;
    }

    let mut nodes = 0u64;
    for mv in &moves {
        board.make_move(mv);
        nodes += perft(board, depth - 1);
        board.undo_move();
    }
    nodes
}

/// Run perft with per-move breakdown (useful for debugging).
///
/// Returns a vector of `(uci_move, node_count)` pairs sorted alphabetically.
pub fn divide(board: &mut Board, depth: usize) -> Vec<(String, u64)> {
    let moves = board.legal_moves();
    let mut results: Vec<(String, u64)> = Vec::with_capacity(moves.len());
    for mv in &moves {
        board.make_move(mv);
        let count = if depth <= 1 { 1 } else { perft(board, depth - 1) };
        board.undo_move();
        results.push((move_to_uci(mv), count));
    }
    results.sort_by(|a, b| a.0.cmp(&b.0));
    results
}
