//! Time management: convert clock parameters to search limits.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use kestrel_core::Color;

use crate::params::SearchParams;
use crate::search::control::SearchControl;

/// Time kept back for protocol and process overhead.
const OVERHEAD_MS: u64 = 10;

/// Compute soft and hard time limits from remaining time and increment.
///
/// The move is budgeted as one share of the remaining clock, where the
/// number of shares is `moves_to_go` when the GUI sends it and `divisor`
/// otherwise:
///
/// | Quantity | Value                                                    |
/// |----------|----------------------------------------------------------|
/// | usable   | `remaining - 10 ms`                                      |
/// | hard     | `usable / shares + 3/4 × increment`, at most `usable / 2` |
/// | soft     | `hard × soft_percent / 100`                              |
///
/// Below 10 ms remaining both limits are 1 ms. Neither limit is ever zero.
pub fn compute_limits(
    remaining: Duration,
    increment: Duration,
    moves_to_go: Option<u32>,
    divisor: u32,
    soft_percent: u32,
) -> (Duration, Duration) {
    let remaining_ms = remaining.as_millis() as u64;
    let one_ms = Duration::from_millis(1);

    if remaining_ms < OVERHEAD_MS {
        return (one_ms, one_ms);
    }

    let usable = (remaining_ms - OVERHEAD_MS).max(1);
    let shares = moves_to_go.unwrap_or(divisor).max(1) as u64;
    let inc_ms = increment.as_millis() as u64;

    let hard = (usable / shares + inc_ms * 3 / 4).min(usable / 2).max(1);
    let soft = (hard * soft_percent as u64 / 100).max(1);

    (Duration::from_millis(soft), Duration::from_millis(hard))
}

/// Build a [`SearchControl`] from UCI `go` parameters and the side to move.
///
/// Priority order:
/// 1. `infinite: true` -> `SearchControl::new_infinite`
/// 2. `movetime: Some(d)` -> `SearchControl::new_timed(d, d)`
/// 3. clock of the side to move present -> `compute_limits()` then `SearchControl::new_timed`
/// 4. `depth` only / bare `go` -> `SearchControl::new_infinite`
#[allow(clippy::too_many_arguments)]
pub fn limits_from_go(
    wtime: Option<Duration>,
    btime: Option<Duration>,
    winc: Option<Duration>,
    binc: Option<Duration>,
    movestogo: Option<u32>,
    movetime: Option<Duration>,
    infinite: bool,
    side: Color,
    stopped: Arc<AtomicBool>,
    params: &SearchParams,
) -> SearchControl {
    let (remaining, increment) = match side {
        Color::White => (wtime, winc),
        Color::Black => (btime, binc),
    };

    if infinite {
        return SearchControl::new_infinite(stopped);
    }

    if let Some(mt) = movetime {
        return SearchControl::new_timed(stopped, mt, mt);
    }

    if let Some(rem) = remaining {
        let (soft, hard) = compute_limits(
            rem,
            increment.unwrap_or(Duration::ZERO),
            movestogo,
            params.time_divisor.max(1) as u32,
            params.soft_time_percent.max(1) as u32,
        );
        return SearchControl::new_timed(stopped, soft, hard);
    }

    SearchControl::new_infinite(stopped)
}
