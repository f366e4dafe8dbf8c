//! Search and evaluation for kestrel.

pub mod error;
pub mod eval;
pub mod params;
pub mod search;
pub mod time;

pub use error::ParamError;
pub use eval::{evaluate, evaluate_white};
pub use params::{PARAM_SPECS, ParamSpec, SearchParams};
pub use search::control::SearchControl;
pub use search::negamax::{INF, MATE, MATE_THRESHOLD, MAX_PLY};
pub use search::tt::TranspositionTable;
pub use search::{DEFAULT_HASH_MB, SearchResult, Searcher};
pub use time::{compute_limits, limits_from_go};
