//! UCI protocol errors.

use kestrel_core::BoardError;
use kestrel_engine::ParamError;

/// Errors that can occur during UCI protocol handling.
///
/// None of these are fatal: the engine logs them and keeps reading input.
#[derive(Debug, thiserror::Error)]
pub enum UciError {
    /// The `position` command is missing `startpos` or `fen` keyword.
    #[error("malformed position command: missing startpos or fen keyword")]
    MalformedPosition,

    /// The FEN or a move of a `position` command was rejected.
    #[error(transparent)]
    Board(#[from] BoardError),

    /// A `go` parameter was given without a value.
    #[error("missing value for go parameter {param}")]
    MissingGoValue {
        /// The parameter name.
        param: String,
    },

    /// A `go` parameter value could not be parsed.
    #[error("invalid value for go parameter {param}: {value}")]
    InvalidGoValue {
        /// The parameter name.
        param: String,
        /// The offending value.
        value: String,
    },

    /// `setoption` without a `name` clause.
    #[error("malformed setoption command")]
    MalformedSetOption,

    /// An option value is not a number.
    #[error("invalid value for option {name}: {value}")]
    InvalidOptionValue {
        /// The option name.
        name: String,
        /// The offending value.
        value: String,
    },

    /// A tunable rejected its new value.
    #[error(transparent)]
    Param(#[from] ParamError),

    /// An I/O error occurred while reading from stdin.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn board_error_passes_through() {
        let err: UciError = BoardError::InvalidMove {
            uci_move: "e2e5".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "invalid move: e2e5");
    }

    #[test]
    fn go_value_display() {
        let err = UciError::InvalidGoValue {
            param: "depth".to_string(),
            value: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "invalid value for go parameter depth: abc");
    }
}
