//! Error types for position setup and move parsing.

/// Errors raised while building a [`Board`](crate::Board) from external input.
///
/// The search never sees these: a board that exists is always valid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    /// The FEN string could not be parsed.
    #[error("invalid FEN: {fen}")]
    InvalidFen {
        /// The FEN string that failed to parse.
        fen: String,
    },

    /// The FEN parsed but describes an impossible position.
    #[error("illegal position: {fen}")]
    IllegalPosition {
        /// The offending FEN string.
        fen: String,
    },

    /// A UCI move string is malformed or not legal in the current position.
    #[error("invalid move: {uci_move}")]
    InvalidMove {
        /// The UCI move string that was rejected.
        uci_move: String,
    },
}
