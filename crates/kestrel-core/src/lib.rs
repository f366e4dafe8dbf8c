//! Position oracle for kestrel: board state, legal moves, make/undo, and game rules.
//!
//! Move generation and hashing come from `shakmaty`; the types the engine
//! needs are re-exported so downstream crates depend on this crate only.

mod board;
mod error;
mod perft;

pub use board::{Board, STARTING_FEN, move_to_uci};
pub use error::BoardError;
pub use perft::{divide, perft};
pub use shakmaty::{Chess, Color, Move, MoveList, Piece, Position, Role, Square};
