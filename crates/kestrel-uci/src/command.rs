//! UCI command parsing.

use std::time::Duration;

use kestrel_core::Board;

use crate::error::UciError;

/// Parameters for the `go` command.
///
/// All fields are optional; a bare `go` searches until `stop`.
#[derive(Debug, Clone, Default)]
pub struct GoParams {
    /// White's remaining time.
    pub wtime: Option<Duration>,
    /// Black's remaining time.
    pub btime: Option<Duration>,
    /// White's increment per move.
    pub winc: Option<Duration>,
    /// Black's increment per move.
    pub binc: Option<Duration>,
    /// Moves until next time control.
    pub movestogo: Option<u32>,
    /// Search to this depth only.
    pub depth: Option<u8>,
    /// Search for exactly this duration.
    pub movetime: Option<Duration>,
    /// Search this many nodes only.
    pub nodes: Option<u64>,
    /// Search until `stop` (no time limit).
    pub infinite: bool,
}

/// A `setoption` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetOption {
    /// Option name, possibly containing spaces.
    pub name: String,
    /// Raw value, absent for button-type options.
    pub value: Option<String>,
}

/// A parsed UCI command.
#[derive(Debug)]
pub enum Command {
    /// `uci` -- identify the engine.
    Uci,
    /// `isready` -- synchronization ping.
    IsReady,
    /// `ucinewgame` -- reset engine state.
    UciNewGame,
    /// `position` -- the resulting board, game moves included as history.
    Position(Board),
    /// `go` -- start searching with given parameters.
    Go(GoParams),
    /// `setoption name <K> [value <V>]`.
    SetOption(SetOption),
    /// `stop` -- halt the current search.
    Stop,
    /// `quit` -- exit the engine.
    Quit,
    /// Unrecognized command (silently ignored per UCI convention).
    Unknown(String),
}

/// Parse a single line of UCI input into a [`Command`].
pub fn parse_command(line: &str) -> Result<Command, UciError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some((&head, args)) = tokens.split_first() else {
        return Ok(Command::Unknown(String::new()));
    };

    match head {
        "uci" => Ok(Command::Uci),
        "isready" => Ok(Command::IsReady),
        "ucinewgame" => Ok(Command::UciNewGame),
        "stop" => Ok(Command::Stop),
        "quit" => Ok(Command::Quit),
        "position" => parse_position(args),
        "go" => parse_go(args),
        "setoption" => parse_setoption(args),
        _ => Ok(Command::Unknown(head.to_string())),
    }
}

/// Parse the `position` command arguments.
///
/// Supports:
/// - `position startpos [moves e2e4 d7d5 ...]`
/// - `position fen <fen-string> [moves e2e4 d7d5 ...]`
fn parse_position(tokens: &[&str]) -> Result<Command, UciError> {
    let moves_at = tokens.iter().position(|&t| t == "moves").unwrap_or(tokens.len());
    let (setup, rest) = tokens.split_at(moves_at);

    let mut board = match setup.split_first() {
        Some((&"startpos", _)) => Board::starting_position(),
        Some((&"fen", fields)) => Board::from_fen(&fields.join(" "))?,
        _ => return Err(UciError::MalformedPosition),
    };

    for uci_move in rest.iter().skip(1) {
        board.play_uci(uci_move)?;
    }

    Ok(Command::Position(board))
}

/// Parse the `go` command arguments.
///
/// Supports: wtime, btime, winc, binc, movestogo, depth, movetime,
/// nodes, infinite. Unknown tokens are silently skipped.
fn parse_go(tokens: &[&str]) -> Result<Command, UciError> {
    let mut params = GoParams::default();

    let mut i = 0;
    while i < tokens.len() {
        let value = tokens.get(i + 1);
        match tokens[i] {
            "wtime" => params.wtime = Some(parse_millis(value, "wtime")?),
            "btime" => params.btime = Some(parse_millis(value, "btime")?),
            "winc" => params.winc = Some(parse_millis(value, "winc")?),
            "binc" => params.binc = Some(parse_millis(value, "binc")?),
            "movestogo" => params.movestogo = Some(parse_int(value, "movestogo")?),
            "depth" => params.depth = Some(parse_int(value, "depth")?),
            "movetime" => params.movetime = Some(parse_millis(value, "movetime")?),
            "nodes" => params.nodes = Some(parse_int(value, "nodes")?),
            "infinite" => {
                params.infinite = true;
                i += 1;
                continue;
            }
            _ => {
                i += 1;
                continue;
            }
        }
        i += 2;
    }

    Ok(Command::Go(params))
}

/// Parse `name <K...> [value <V...>]`; both parts may contain spaces.
fn parse_setoption(tokens: &[&str]) -> Result<Command, UciError> {
    let Some((&"name", rest)) = tokens.split_first() else {
        return Err(UciError::MalformedSetOption);
    };
    let value_at = rest.iter().position(|&t| t == "value");
    let (name, value) = match value_at {
        Some(at) => (&rest[..at], Some(rest[at + 1..].join(" "))),
        None => (rest, None),
    };
    if name.is_empty() {
        return Err(UciError::MalformedSetOption);
    }
    Ok(Command::SetOption(SetOption {
        name: name.join(" "),
        value,
    }))
}

/// Parse a millisecond value from a token.
///
/// GUIs sometimes send negative clocks after a flag fall; those clamp to zero.
fn parse_millis(token: Option<&&str>, param: &str) -> Result<Duration, UciError> {
    let ms: i64 = parse_int(token, param)?;
    Ok(Duration::from_millis(ms.max(0) as u64))
}

/// Parse an integer value from a token.
fn parse_int<T: std::str::FromStr>(token: Option<&&str>, param: &str) -> Result<T, UciError> {
    let value = token.ok_or_else(|| UciError::MissingGoValue {
        param: param.to_string(),
    })?;
    value.parse().map_err(|_| UciError::InvalidGoValue {
        param: param.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn go(line: &str) -> GoParams {
        match parse_command(line).unwrap() {
            Command::Go(params) => params,
            other => panic!("expected Go, got {other:?}"),
        }
    }

    fn position(line: &str) -> Board {
        match parse_command(line).unwrap() {
            Command::Position(board) => board,
            other => panic!("expected Position, got {other:?}"),
        }
    }

    #[test]
    fn parse_simple_commands() {
        assert!(matches!(parse_command("uci").unwrap(), Command::Uci));
        assert!(matches!(parse_command("isready").unwrap(), Command::IsReady));
        assert!(matches!(parse_command("ucinewgame").unwrap(), Command::UciNewGame));
        assert!(matches!(parse_command("stop").unwrap(), Command::Stop));
        assert!(matches!(parse_command("quit").unwrap(), Command::Quit));
    }

    #[test]
    fn parse_position_startpos() {
        assert_eq!(position("position startpos").hash(), Board::starting_position().hash());
    }

    #[test]
    fn parse_position_startpos_with_moves_keeps_history() {
        let board = position("position startpos moves e2e4 e7e5 g1f3");
        assert_eq!(board.ply(), 3);
        assert_eq!(board.side_to_move(), kestrel_core::Color::Black);
    }

    #[test]
    fn parse_position_fen_with_moves() {
        let board = position(
            "position fen rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1 moves e7e5",
        );
        assert_eq!(board.ply(), 1);
    }

    #[test]
    fn parse_position_repetition_visible() {
        let board = position("position startpos moves g1f3 g8f6 f3g1 f6g8 g1f3 g8f6 f3g1 f6g8");
        assert!(board.is_threefold_repetition());
    }

    #[test]
    fn parse_position_errors() {
        assert!(matches!(parse_command("position"), Err(UciError::MalformedPosition)));
        assert!(parse_command("position fen invalid").is_err());
        assert!(parse_command("position startpos moves e2e5").is_err());
    }

    #[test]
    fn parse_go_bare_defaults() {
        let params = go("go");
        assert!(params.depth.is_none());
        assert!(params.wtime.is_none());
        assert!(!params.infinite);
    }

    #[test]
    fn parse_go_clock() {
        let params = go("go wtime 300000 btime 290000 winc 2000 binc 1000 movestogo 20");
        assert_eq!(params.wtime, Some(Duration::from_millis(300_000)));
        assert_eq!(params.btime, Some(Duration::from_millis(290_000)));
        assert_eq!(params.winc, Some(Duration::from_millis(2_000)));
        assert_eq!(params.binc, Some(Duration::from_millis(1_000)));
        assert_eq!(params.movestogo, Some(20));
    }

    #[test]
    fn parse_go_limits() {
        assert_eq!(go("go depth 6").depth, Some(6));
        assert_eq!(go("go movetime 5000").movetime, Some(Duration::from_millis(5000)));
        assert_eq!(go("go nodes 1000000").nodes, Some(1_000_000));
        assert!(go("go infinite").infinite);
    }

    #[test]
    fn parse_go_negative_clock_clamps() {
        assert_eq!(go("go wtime -50 btime 1000").wtime, Some(Duration::ZERO));
    }

    #[test]
    fn parse_go_skips_unknown_tokens() {
        let params = go("go ponder depth 3");
        assert_eq!(params.depth, Some(3));
    }

    #[test]
    fn parse_go_errors() {
        assert!(matches!(
            parse_command("go wtime"),
            Err(UciError::MissingGoValue { .. })
        ));
        assert!(matches!(
            parse_command("go depth abc"),
            Err(UciError::InvalidGoValue { .. })
        ));
    }

    #[test]
    fn parse_setoption_with_value() {
        match parse_command("setoption name Hash value 64").unwrap() {
            Command::SetOption(opt) => {
                assert_eq!(opt.name, "Hash");
                assert_eq!(opt.value.as_deref(), Some("64"));
            }
            other => panic!("expected SetOption, got {other:?}"),
        }
    }

    #[test]
    fn parse_setoption_multiword_name_and_button() {
        match parse_command("setoption name Clear Hash").unwrap() {
            Command::SetOption(opt) => {
                assert_eq!(opt.name, "Clear Hash");
                assert_eq!(opt.value, None);
            }
            other => panic!("expected SetOption, got {other:?}"),
        }
        assert!(matches!(
            parse_command("setoption value 3"),
            Err(UciError::MalformedSetOption)
        ));
    }

    #[test]
    fn parse_unknown_and_empty() {
        assert!(matches!(parse_command("foobar").unwrap(), Command::Unknown(_)));
        assert!(matches!(parse_command("").unwrap(), Command::Unknown(_)));
    }
}
