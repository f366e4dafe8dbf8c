//! End-to-end search behaviour: mates, draws, time limits, cache collisions,
//! and determinism.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};

use kestrel_core::{Board, move_to_uci};
use kestrel_engine::{MATE_THRESHOLD, SearchControl, SearchResult, Searcher, TranspositionTable};

const KQ_MATE_FEN: &str = "7k/8/6K1/8/8/8/8/1Q6 w - - 0 1";

const BACK_RANK_FEN: &str = "2r3k1/5ppp/8/8/8/8/3R1PPP/3R2K1 w - - 0 1";

const KIWIPETE_FEN: &str =
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

fn search_depth(searcher: &mut Searcher, board: &mut Board, depth: u8) -> SearchResult {
    let control = SearchControl::new_infinite(Arc::new(AtomicBool::new(false)));
    searcher.search(board, depth, &control, |_, _, _, _| {})
}

fn best_uci(result: &SearchResult) -> String {
    result
        .best_move
        .as_ref()
        .map_or_else(|| "0000".to_string(), move_to_uci)
}

// ── Mate detection ────────────────────────────────────────────────────────────

#[test]
fn queen_mate_found_at_depth_3() {
    let mut board: Board = KQ_MATE_FEN.parse().unwrap();
    let result = search_depth(&mut Searcher::new(), &mut board, 3);
    assert_eq!(best_uci(&result), "b1b8");
    assert!(result.score > MATE_THRESHOLD, "score {}", result.score);
}

#[test]
fn back_rank_mate_in_two_played_out() {
    let mut board: Board = BACK_RANK_FEN.parse().unwrap();
    let mut white = Searcher::new();
    let mut black = Searcher::new();

    for ply in 0..6 {
        if board.is_checkmate() {
            break;
        }
        let searcher = if ply % 2 == 0 { &mut white } else { &mut black };
        let mv = searcher
            .think_depth(&mut board, 6)
            .expect("side to move should have a legal move");
        board.make_move(&mv);
    }

    assert!(board.is_checkmate(), "line should end in mate: {board:?}");
    assert_eq!(board.ply(), 3, "mate should take three plies");
}

#[test]
fn back_rank_first_move_is_the_sacrifice() {
    let mut board: Board = BACK_RANK_FEN.parse().unwrap();
    let result = search_depth(&mut Searcher::new(), &mut board, 6);
    assert_eq!(best_uci(&result), "d2d8");
    assert!(result.score > MATE_THRESHOLD);
}

// ── Draws ─────────────────────────────────────────────────────────────────────

#[test]
fn threefold_repetition_scores_zero_despite_material() {
    // Black is a queen down but the position has occurred three times.
    let mut board: Board = "4k1n1/8/8/8/8/8/8/3QK1N1 w - - 0 1".parse().unwrap();
    for step in ["g1f3", "g8f6", "f3g1", "f6g8", "g1f3", "g8f6", "f3g1", "f6g8", "g1f3"] {
        board.play_uci(step).unwrap();
    }
    board.play_uci("g8f6").unwrap();
    board.play_uci("f3g1").unwrap();
    assert!(board.is_threefold_repetition());

    let result = search_depth(&mut Searcher::new(), &mut board, 5);
    assert_eq!(result.score, 0);
    assert!(result.best_move.is_some());
}

#[test]
fn fifty_move_rule_scores_zero() {
    let mut board: Board = "4k3/8/8/8/8/8/8/3QK3 w - - 100 80".parse().unwrap();
    let result = search_depth(&mut Searcher::new(), &mut board, 4);
    assert_eq!(result.score, 0);
}

// ── Time budget ───────────────────────────────────────────────────────────────

#[test]
fn one_millisecond_budget_still_answers() {
    for fen in [kestrel_core::STARTING_FEN, KIWIPETE_FEN, BACK_RANK_FEN] {
        let mut board: Board = fen.parse().unwrap();
        let started = Instant::now();
        let mv = Searcher::new()
            .think(&mut board, Duration::from_millis(1))
            .expect("a legal move must always be returned");
        assert!(started.elapsed() < Duration::from_millis(500), "overran on {fen}");
        assert!(board.legal_moves().contains(&mv));
        assert_eq!(board.ply(), 0, "board left unbalanced on {fen}");
    }
}

#[test]
fn timed_search_respects_hard_limit() {
    let mut board: Board = KIWIPETE_FEN.parse().unwrap();
    let control = SearchControl::new_timed(
        Arc::new(AtomicBool::new(false)),
        Duration::from_millis(50),
        Duration::from_millis(100),
    );
    let started = Instant::now();
    let result = Searcher::new().search(&mut board, 64, &control, |_, _, _, _| {});
    assert!(started.elapsed() < Duration::from_millis(600));
    assert!(result.depth >= 1);
    assert!(result.best_move.is_some());
}

// ── Transposition collisions ─────────────────────────────────────────────────

#[test]
fn single_slot_table_still_finds_mates() {
    for (fen, depth, expected) in [(KQ_MATE_FEN, 3, "b1b8"), (BACK_RANK_FEN, 6, "d2d8")] {
        let mut board: Board = fen.parse().unwrap();
        let mut searcher = Searcher::with_table(TranspositionTable::with_capacity(1));
        let result = search_depth(&mut searcher, &mut board, depth);
        assert_eq!(best_uci(&result), expected, "collision broke {fen}");
        assert!(result.score > MATE_THRESHOLD);
    }
}

#[test]
fn tiny_table_agrees_on_forced_mate_score() {
    let mut board: Board = BACK_RANK_FEN.parse().unwrap();
    let big = search_depth(&mut Searcher::new(), &mut board, 6);
    let mut tiny = Searcher::with_table(TranspositionTable::with_capacity(2));
    let small = search_depth(&mut tiny, &mut board, 6);
    assert_eq!(big.score, small.score);
    assert_eq!(best_uci(&big), best_uci(&small));
}

// ── Determinism ───────────────────────────────────────────────────────────────

#[test]
fn fixed_depth_search_is_deterministic() {
    for fen in [kestrel_core::STARTING_FEN, KIWIPETE_FEN] {
        let mut board: Board = fen.parse().unwrap();
        let first = search_depth(&mut Searcher::new(), &mut board, 5);
        let second = search_depth(&mut Searcher::new(), &mut board, 5);
        assert_eq!(best_uci(&first), best_uci(&second), "{fen}");
        assert_eq!(first.score, second.score, "{fen}");
        assert_eq!(first.nodes, second.nodes, "{fen}");
        assert_eq!(first.pv, second.pv, "{fen}");
    }
}

#[test]
fn search_preserves_game_history() {
    let mut board = Board::starting_position();
    for step in ["e2e4", "e7e5", "g1f3"] {
        board.play_uci(step).unwrap();
    }
    let hash = board.hash();
    let mv = Searcher::new().think_depth(&mut board, 4).unwrap();
    assert_eq!(board.hash(), hash);
    assert_eq!(board.ply(), 3);
    assert!(board.legal_moves().contains(&mv));
}

#[test]
fn narrow_aspiration_window_finds_same_mate() {
    let mut board: Board = BACK_RANK_FEN.parse().unwrap();
    let wide = search_depth(&mut Searcher::new(), &mut board, 6);

    let mut narrow_searcher = Searcher::new();
    narrow_searcher.params_mut().set("AspirationWindow", 5).unwrap();
    let mut scores = Vec::new();
    let control = SearchControl::new_infinite(Arc::new(AtomicBool::new(false)));
    let narrow = narrow_searcher.search(&mut board, 6, &control, |_, score, _, _| scores.push(score));

    // The score leaves the window on the way to the mate.
    assert!(scores.windows(2).any(|pair| (pair[1] - pair[0]).abs() > 5));
    assert_eq!(best_uci(&narrow), "d2d8");
    assert_eq!(narrow.score, wide.score);
    assert!(narrow.score >= MATE_THRESHOLD);
}
