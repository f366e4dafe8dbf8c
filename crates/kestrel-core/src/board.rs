//! The position oracle: a make/undo stack over `shakmaty` positions.
//!
//! `shakmaty` owns legality, check detection, and Zobrist hashing. This
//! module adds what a tree search needs on top of it: reversible move
//! application, a skip-turn (null move) operation, and repetition detection
//! across both game history and the current search path.

use std::fmt;
use std::str::FromStr;

use shakmaty::fen::Fen;
use shakmaty::uci::UciMove;
use shakmaty::zobrist::{Zobrist64, ZobristHash};
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, Move, MoveList, Position, Role};

use tracing::trace;

use crate::error::BoardError;

/// FEN of the standard starting position.
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// One entry of the make/undo stack.
#[derive(Clone)]
struct Frame {
    position: Chess,
    hash: u64,
    /// This frame was reached by [`Board::skip_turn`] rather than a real move.
    skip_turn: bool,
}

impl Frame {
    fn new(position: Chess, skip_turn: bool) -> Self {
        let hash = fingerprint(&position);
        Self {
            position,
            hash,
            skip_turn,
        }
    }
}

/// 64-bit Zobrist fingerprint of a position.
fn fingerprint(position: &Chess) -> u64 {
    position.zobrist_hash::<Zobrist64>(EnPassantMode::Legal).0
}

/// Board state with full history.
///
/// The bottom frame is the setup position; every move played afterwards,
/// whether from the game record or from the search, pushes a frame. Undoing
/// pops it, so `make_move(m); undo_move()` restores the exact prior state.
#[derive(Clone)]
pub struct Board {
    frames: Vec<Frame>,
}

impl Board {
    /// Return the standard starting position.
    pub fn starting_position() -> Self {
        Self::from_position(Chess::default())
    }

    /// Wrap an existing `shakmaty` position as a fresh board with no history.
    pub fn from_position(position: Chess) -> Self {
        let mut frames = Vec::with_capacity(256);
        frames.push(Frame::new(position, false));
        Self { frames }
    }

    /// Parse a FEN string into a board.
    pub fn from_fen(fen: &str) -> Result<Self, BoardError> {
        let parsed: Fen = fen.trim().parse().map_err(|_| BoardError::InvalidFen {
            fen: fen.to_string(),
        })?;
        let position: Chess =
            parsed
                .into_position(CastlingMode::Standard)
                .map_err(|_| BoardError::IllegalPosition {
                    fen: fen.to_string(),
                })?;
        trace!(fen = fen.trim(), "position set up");
        Ok(Self::from_position(position))
    }

    fn top(&self) -> &Frame {
        // The setup frame is never popped, so the stack is never empty.
        &self.frames[self.frames.len() - 1]
    }

    /// The current `shakmaty` position.
    #[inline]
    pub fn position(&self) -> &Chess {
        &self.top().position
    }

    /// Zobrist fingerprint of the current position.
    #[inline]
    pub fn hash(&self) -> u64 {
        self.top().hash
    }

    /// Which side moves next.
    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.position().turn()
    }

    /// Whether the side to move is in check.
    #[inline]
    pub fn in_check(&self) -> bool {
        self.position().is_check()
    }

    /// Plies since the last capture or pawn move.
    #[inline]
    pub fn halfmove_clock(&self) -> u32 {
        self.position().halfmoves()
    }

    /// Number of moves (including skip-turns) played since the setup position.
    #[inline]
    pub fn ply(&self) -> usize {
        self.frames.len() - 1
    }

    /// All legal moves for the side to move.
    pub fn legal_moves(&self) -> MoveList {
        self.position().legal_moves()
    }

    /// Legal captures and promotions only.
    pub fn noisy_moves(&self) -> MoveList {
        let mut moves = self.legal_moves();
        moves.retain(|mv| mv.is_capture() || mv.is_promotion());
        moves
    }

    /// Play a legal move, pushing a new frame.
    ///
    /// The move must come from [`legal_moves`](Self::legal_moves) of the
    /// current position; legality is not rechecked.
    pub fn make_move(&mut self, mv: &Move) {
        let mut next = self.position().clone();
        next.play_unchecked(mv);
        self.frames.push(Frame::new(next, false));
    }

    /// Take back the last move played with [`make_move`](Self::make_move).
    pub fn undo_move(&mut self) {
        debug_assert!(self.frames.len() > 1, "undo_move on the setup position");
        debug_assert!(!self.top().skip_turn, "undo_move after skip_turn");
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// Pass the turn to the opponent without moving.
    ///
    /// Returns `false` and leaves the board untouched when the side to move
    /// is in check, since passing would leave the king capturable.
    pub fn skip_turn(&mut self) -> bool {
        if self.in_check() {
            return false;
        }
        match self.position().clone().swap_turn() {
            Ok(next) => {
                self.frames.push(Frame::new(next, true));
                true
            }
            Err(_) => false,
        }
    }

    /// Take back a pass made with [`skip_turn`](Self::skip_turn).
    pub fn undo_skip_turn(&mut self) {
        debug_assert!(self.top().skip_turn, "undo_skip_turn without skip_turn");
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// Count earlier occurrences of the current position.
    ///
    /// Only frames with the same side to move, reachable through reversible
    /// moves, are compared. The scan stops at a skip-turn frame so a null
    /// move never manufactures a repetition.
    pub fn repetitions(&self) -> usize {
        let top = self.frames.len() - 1;
        let current = self.top().hash;
        let window = (self.halfmove_clock() as usize).min(top);

        let mut count = 0;
        for back in 1..=window {
            if self.frames[top - back + 1].skip_turn {
                break;
            }
            if back % 2 == 0 && self.frames[top - back].hash == current {
                count += 1;
            }
        }
        count
    }

    /// The current position occurred before (twofold repetition).
    #[inline]
    pub fn is_repetition(&self) -> bool {
        self.repetitions() >= 1
    }

    /// The current position occurred at least twice before (claimable draw).
    #[inline]
    pub fn is_threefold_repetition(&self) -> bool {
        self.repetitions() >= 2
    }

    /// The fifty-move rule allows a draw claim.
    #[inline]
    pub fn is_fifty_move_draw(&self) -> bool {
        self.halfmove_clock() >= 100
    }

    /// Neither side has enough material to deliver mate.
    pub fn is_insufficient_material(&self) -> bool {
        self.position().is_insufficient_material()
    }

    /// The side to move is checkmated.
    pub fn is_checkmate(&self) -> bool {
        self.position().is_checkmate()
    }

    /// Whether `color` owns any knight, bishop, rook, or queen.
    pub fn has_non_pawn_material(&self, color: Color) -> bool {
        let board = self.position().board();
        let pieces = board.by_role(Role::Knight)
            | board.by_role(Role::Bishop)
            | board.by_role(Role::Rook)
            | board.by_role(Role::Queen);
        !(pieces & board.by_color(color)).is_empty()
    }

    /// Resolve a UCI move string (e.g. `e2e4`, `e7e8q`) against the current position.
    pub fn parse_uci_move(&self, uci_move: &str) -> Result<Move, BoardError> {
        let invalid = || BoardError::InvalidMove {
            uci_move: uci_move.to_string(),
        };
        let parsed: UciMove = uci_move.parse().map_err(|_| invalid())?;
        parsed.to_move(self.position()).map_err(|_| invalid())
    }

    /// Parse and play a UCI move.
    pub fn play_uci(&mut self, uci_move: &str) -> Result<(), BoardError> {
        let mv = self.parse_uci_move(uci_move)?;
        self.make_move(&mv);
        Ok(())
    }

    /// FEN of the current position.
    pub fn fen(&self) -> String {
        Fen::from_position(self.position().clone(), EnPassantMode::Legal).to_string()
    }
}

/// Encode a move the way the text protocol expects it (`e2e4`, `e1g1`, `a7a8q`).
pub fn move_to_uci(mv: &Move) -> String {
    mv.to_uci(CastlingMode::Standard).to_string()
}

impl FromStr for Board {
    type Err = BoardError;

    fn from_str(fen: &str) -> Result<Self, Self::Err> {
        Self::from_fen(fen)
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::starting_position()
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Board")
            .field("fen", &self.fen())
            .field("hash", &format_args!("{:#018x}", self.hash()))
            .field("ply", &self.ply())
            .finish()
    }
}
