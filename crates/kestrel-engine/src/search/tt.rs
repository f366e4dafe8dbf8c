//! Transposition table: fixed-capacity, always-replace, fingerprint-verified.
//!
//! Slots are addressed by `hash & mask` with a power-of-two capacity, so two
//! different positions may share a slot. Every probe compares the full
//! 64-bit fingerprint before trusting the entry; a mismatch is a miss.

use kestrel_core::Move;

use crate::search::negamax::MATE_THRESHOLD;

/// Bound type stored in a TT entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// The stored score is exact (PV node).
    Exact,
    /// The stored score is a lower bound (failed high / beta cutoff).
    LowerBound,
    /// The stored score is an upper bound (failed low / all-node).
    UpperBound,
}

impl Bound {
    /// Whether a score carrying this bound settles a node searched with
    /// window `(alpha, beta)`.
    pub fn allows_cutoff(self, score: i32, alpha: i32, beta: i32) -> bool {
        match self {
            Bound::Exact => true,
            Bound::LowerBound => score >= beta,
            Bound::UpperBound => score <= alpha,
        }
    }
}

/// Convert a search score to TT-storable form.
///
/// Mate scores are path-dependent: `MATE - ply` changes based on the search
/// path. They are stored as distance-from-node instead of distance-from-root.
pub fn score_to_tt(score: i32, ply: usize) -> i32 {
    let ply = ply as i32;
    if score > MATE_THRESHOLD {
        score + ply
    } else if score < -MATE_THRESHOLD {
        score - ply
    } else {
        score
    }
}

/// Convert a TT-stored score back to search-usable form.
///
/// Reverses the mate-distance adjustment applied by [`score_to_tt`].
pub fn score_from_tt(score: i32, ply: usize) -> i32 {
    let ply = ply as i32;
    if score > MATE_THRESHOLD {
        score - ply
    } else if score < -MATE_THRESHOLD {
        score + ply
    } else {
        score
    }
}

#[derive(Debug, Clone)]
struct Entry {
    key: u64,
    depth: i32,
    score: i32,
    bound: Bound,
    best_move: Option<Move>,
}

/// Result of a successful TT probe.
#[derive(Debug, Clone)]
pub struct TtProbe {
    /// Best move from a previous search of this position, if any.
    pub best_move: Option<Move>,
    /// Search depth of the stored entry.
    pub depth: i32,
    /// Bound type (exact, lower, or upper).
    pub bound: Bound,
    /// Score, already adjusted back to root-relative.
    pub score: i32,
}

/// Single-threaded transposition table owned by one searcher.
pub struct TranspositionTable {
    slots: Vec<Option<Entry>>,
    mask: u64,
}

impl TranspositionTable {
    /// Create a table of roughly `mb` megabytes.
    ///
    /// The slot count is rounded down to a power of two.
    pub fn new(mb: usize) -> Self {
        let bytes = mb.max(1) * 1024 * 1024;
        let slot_size = std::mem::size_of::<Option<Entry>>();
        Self::with_capacity((bytes / slot_size).max(1))
    }

    /// Create a table with at most `capacity` slots (rounded down to a power
    /// of two, minimum one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let slots = if capacity.is_power_of_two() {
            capacity
        } else {
            capacity.next_power_of_two() >> 1
        };
        Self {
            slots: vec![None; slots],
            mask: (slots - 1) as u64,
        }
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Empty every slot, keeping the allocation.
    pub fn clear(&mut self) {
        self.slots.fill(None);
    }

    /// Occupancy in permille, sampled over the first thousand slots.
    pub fn hashfull(&self) -> u32 {
        let sample = self.slots.len().min(1000);
        let used = self.slots[..sample].iter().filter(|slot| slot.is_some()).count();
        (used * 1000 / sample) as u32
    }

    fn index(&self, hash: u64) -> usize {
        (hash & self.mask) as usize
    }

    /// Probe the table for a position.
    ///
    /// Returns `None` on an empty slot or when the slot holds a different
    /// position.
    pub fn probe(&self, hash: u64, ply: usize) -> Option<TtProbe> {
        let entry = self.slots[self.index(hash)].as_ref()?;
        if entry.key != hash {
            return None;
        }
        Some(TtProbe {
            best_move: entry.best_move.clone(),
            depth: entry.depth,
            bound: entry.bound,
            score: score_from_tt(entry.score, ply),
        })
    }

    /// Store a search result, overwriting whatever occupied the slot.
    pub fn store(
        &mut self,
        hash: u64,
        depth: i32,
        score: i32,
        bound: Bound,
        best_move: Option<Move>,
        ply: usize,
    ) {
        let index = self.index(hash);
        self.slots[index] = Some(Entry {
            key: hash,
            depth,
            score: score_to_tt(score, ply),
            bound,
            best_move,
        });
    }
}

impl std::fmt::Debug for TranspositionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranspositionTable")
            .field("slots", &self.slots.len())
            .field("hashfull", &self.hashfull())
            .finish()
    }
}
