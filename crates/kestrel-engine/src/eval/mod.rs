//! Tapered piece-square evaluation.
//!
//! Each piece contributes a middlegame and an endgame value from
//! [`pst::pst_value`]; the two totals are blended by [`phase::game_phase`].

pub mod phase;
pub mod pst;

use kestrel_core::{Board, Color, Position, Role};

use phase::{MAX_PHASE, game_phase};
use pst::pst_value;

const ROLES: [Role; 6] = [
    Role::Pawn,
    Role::Knight,
    Role::Bishop,
    Role::Rook,
    Role::Queen,
    Role::King,
];

/// Static score from White's point of view, without tempo.
///
/// Mirroring the position (ranks flipped, colors swapped) negates the result
/// exactly.
pub fn evaluate_white(board: &Board) -> i32 {
    let pieces = board.position().board();
    let mut mg = 0;
    let mut eg = 0;

    for color in [Color::White, Color::Black] {
        let sign = if color == Color::White { 1 } else { -1 };
        let own = pieces.by_color(color);
        for role in ROLES {
            for sq in own & pieces.by_role(role) {
                let (m, e) = pst_value(role, color, sq);
                mg += sign * m;
                eg += sign * e;
            }
        }
    }

    let phase = game_phase(board);
    (mg * phase + eg * (MAX_PHASE - phase)) / MAX_PHASE
}

/// Static score for the side to move, plus `tempo`.
pub fn evaluate(board: &Board, tempo: i32) -> i32 {
    let white = evaluate_white(board);
    let relative = match board.side_to_move() {
        Color::White => white,
        Color::Black => -white,
    };
    relative + tempo
}

#[cfg(test)]
mod tests {
    use kestrel_core::Board;

    use super::{evaluate, evaluate_white};

    fn swap_case(s: &str) -> String {
        s.chars()
            .map(|c| {
                if c.is_ascii_uppercase() {
                    c.to_ascii_lowercase()
                } else {
                    c.to_ascii_uppercase()
                }
            })
            .collect()
    }

    /// Flip ranks and swap colors: the same game seen from the other side.
    fn mirror_fen(fen: &str) -> String {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        let placement: Vec<String> = fields[0].split('/').rev().map(swap_case).collect();
        let side = if fields[1] == "w" { "b" } else { "w" };
        let castling = if fields[2] == "-" {
            "-".to_string()
        } else {
            let mut rights: Vec<char> = swap_case(fields[2]).chars().collect();
            rights.sort_by_key(|c| "KQkq".find(*c));
            rights.into_iter().collect()
        };
        let ep = if fields[3] == "-" {
            "-".to_string()
        } else {
            let mut chars = fields[3].chars();
            let file = chars.next().unwrap_or('a');
            let rank = if chars.next() == Some('3') { '6' } else { '3' };
            format!("{file}{rank}")
        };
        format!(
            "{} {side} {castling} {ep} {} {}",
            placement.join("/"),
            fields[4],
            fields[5]
        )
    }

    const POSITIONS: [&str; 5] = [
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        "r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4",
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
        "rnbqkbnr/ppp1pppp/8/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 3",
    ];

    #[test]
    fn mirror_fen_helper() {
        assert_eq!(
            mirror_fen("rnbqkbnr/ppp1pppp/8/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 3"),
            "rnbqkbnr/pppp1ppp/8/8/3Pp3/8/PPP1PPPP/RNBQKBNR b KQkq d3 0 3"
        );
    }

    #[test]
    fn starting_position_is_balanced() {
        assert_eq!(evaluate_white(&Board::starting_position()), 0);
        assert_eq!(evaluate(&Board::starting_position(), 10), 10);
    }

    #[test]
    fn mirrored_positions_negate() {
        for fen in POSITIONS {
            let board: Board = fen.parse().unwrap();
            let mirrored: Board = mirror_fen(fen).parse().unwrap();
            assert_eq!(
                evaluate_white(&board),
                -evaluate_white(&mirrored),
                "asymmetric evaluation for {fen}"
            );
        }
    }

    #[test]
    fn side_relative_score_survives_mirror() {
        for fen in POSITIONS {
            let board: Board = fen.parse().unwrap();
            let mirrored: Board = mirror_fen(fen).parse().unwrap();
            assert_eq!(evaluate(&board, 10), evaluate(&mirrored, 10), "{fen}");
        }
    }

    #[test]
    fn extra_queen_is_winning() {
        let board: Board = "4k3/8/8/8/8/8/8/3QK3 w - - 0 1".parse().unwrap();
        assert!(evaluate_white(&board) > 800);
        let black_to_move: Board = "4k3/8/8/8/8/8/8/3QK3 b - - 0 1".parse().unwrap();
        assert!(evaluate(&black_to_move, 0) < -800);
    }

    #[test]
    fn deterministic() {
        let board: Board = POSITIONS[2].parse().unwrap();
        assert_eq!(evaluate(&board, 10), evaluate(&board, 10));
    }
}
