//! Killer move table and history heuristic for quiet move ordering.

use kestrel_core::Move;

use crate::eval::pst::role_index;
use crate::search::negamax::MAX_PLY;

/// Two killer moves per ply: quiet moves that caused beta cutoffs.
pub struct KillerTable {
    slots: Vec<[Option<Move>; 2]>,
}

impl KillerTable {
    /// Create an empty killer table.
    pub fn new() -> Self {
        Self {
            slots: vec![[None, None]; MAX_PLY + 1],
        }
    }

    /// Forget every killer.
    pub fn clear(&mut self) {
        self.slots.fill([None, None]);
    }

    /// Store a killer move at the given ply.
    ///
    /// Shifts slot 0 to slot 1 if the new move differs from slot 0.
    pub fn store(&mut self, ply: usize, mv: &Move) {
        let Some(slots) = self.slots.get_mut(ply) else {
            return;
        };
        if slots[0].as_ref() != Some(mv) {
            slots[1] = slots[0].take();
            slots[0] = Some(mv.clone());
        }
    }

    /// Which slot (0 = most recent) holds `mv` at `ply`, if any.
    pub fn slot_of(&self, ply: usize, mv: &Move) -> Option<usize> {
        let slots = self.slots.get(ply)?;
        slots.iter().position(|k| k.as_ref() == Some(mv))
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.slots.iter().all(|pair| pair.iter().all(Option::is_none))
    }
}

impl Default for KillerTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Maximum absolute value for history scores.
const HISTORY_MAX: i32 = 16_384;

/// History heuristic table, indexed by `[moving role][to square]`.
///
/// Rewards quiet moves that cause beta cutoffs, penalises those that don't.
pub struct HistoryTable {
    table: [[i32; 64]; 6],
}

impl HistoryTable {
    /// Create a zeroed history table.
    pub fn new() -> Self {
        Self {
            table: [[0; 64]; 6],
        }
    }

    fn entry(&mut self, mv: &Move) -> &mut i32 {
        &mut self.table[role_index(mv.role())][mv.to() as usize]
    }

    /// Reward a quiet move that caused a beta cutoff.
    pub fn update_good(&mut self, mv: &Move, depth: i32) {
        let bonus = depth * depth;
        let entry = self.entry(mv);
        *entry = (*entry + bonus).min(HISTORY_MAX);
    }

    /// Penalise a quiet move that was searched but did not cause a cutoff.
    pub fn update_bad(&mut self, mv: &Move, depth: i32) {
        let penalty = depth * depth;
        let entry = self.entry(mv);
        *entry = (*entry - penalty).max(-HISTORY_MAX);
    }

    /// Get the history score for a quiet move.
    pub fn score(&self, mv: &Move) -> i32 {
        self.table[role_index(mv.role())][mv.to() as usize]
    }

    /// Halve every entry so older searches fade without being forgotten.
    pub fn age(&mut self) {
        for row in &mut self.table {
            for value in row.iter_mut() {
                *value /= 2;
            }
        }
    }

    /// Zero every entry.
    pub fn clear(&mut self) {
        self.table = [[0; 64]; 6];
    }
}

impl Default for HistoryTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_core::Board;

    fn mv(uci: &str) -> Move {
        Board::starting_position().parse_uci_move(uci).unwrap()
    }

    #[test]
    fn killer_store_and_check() {
        let mut kt = KillerTable::new();
        let e4 = mv("e2e4");
        let d4 = mv("d2d4");

        kt.store(5, &e4);
        assert!(kt.slot_of(5, &e4).is_some());
        assert_eq!(kt.slot_of(5, &d4), None);

        kt.store(5, &d4);
        assert_eq!(kt.slot_of(5, &d4), Some(0));
        assert_eq!(kt.slot_of(5, &e4), Some(1));
    }

    #[test]
    fn killer_same_move_no_shift() {
        let mut kt = KillerTable::new();
        let e4 = mv("e2e4");
        let d4 = mv("d2d4");

        kt.store(0, &e4);
        kt.store(0, &d4);
        kt.store(0, &d4);
        assert!(kt.slot_of(0, &e4).is_some());
        assert!(kt.slot_of(0, &d4).is_some());
    }

    #[test]
    fn killer_plies_independent_and_cleared() {
        let mut kt = KillerTable::new();
        let e4 = mv("e2e4");
        kt.store(3, &e4);
        assert!(kt.slot_of(3, &e4).is_some());
        assert_eq!(kt.slot_of(4, &e4), None);
        kt.clear();
        assert_eq!(kt.slot_of(3, &e4), None);
        assert!(kt.is_empty());
    }

    #[test]
    fn killer_out_of_range_ignored() {
        let mut kt = KillerTable::new();
        let e4 = mv("e2e4");
        kt.store(10_000, &e4);
        assert_eq!(kt.slot_of(10_000, &e4), None);
    }

    #[test]
    fn history_update_good_and_bad() {
        let mut ht = HistoryTable::new();
        let nf3 = mv("g1f3");
        assert_eq!(ht.score(&nf3), 0);

        ht.update_good(&nf3, 4);
        assert_eq!(ht.score(&nf3), 16);

        ht.update_bad(&nf3, 3);
        assert_eq!(ht.score(&nf3), 7);
    }

    #[test]
    fn history_keyed_by_role_and_target() {
        let mut ht = HistoryTable::new();
        ht.update_good(&mv("g1f3"), 5);
        // Same target, different piece.
        assert_eq!(ht.score(&mv("f2f3")), 0);
    }

    #[test]
    fn history_clamped_and_aged() {
        let mut ht = HistoryTable::new();
        let a3 = mv("a2a3");
        for _ in 0..400 {
            ht.update_good(&a3, 10);
        }
        assert_eq!(ht.score(&a3), 16_384);
        ht.age();
        assert_eq!(ht.score(&a3), 8_192);

        for _ in 0..800 {
            ht.update_bad(&a3, 10);
        }
        assert_eq!(ht.score(&a3), -16_384);
        ht.clear();
        assert_eq!(ht.score(&a3), 0);
    }
}
