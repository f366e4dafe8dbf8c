//! Tunable search parameters, settable by name through `setoption`.

use crate::error::ParamError;

/// Name, default, and accepted range of one tunable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    /// Name as shown in the UCI `option` line.
    pub name: &'static str,
    /// Default value.
    pub default: i32,
    /// Smallest accepted value.
    pub min: i32,
    /// Largest accepted value.
    pub max: i32,
}

const fn spec(name: &'static str, default: i32, min: i32, max: i32) -> ParamSpec {
    ParamSpec { name, default, min, max }
}

/// Every tunable in declaration order.
pub const PARAM_SPECS: [ParamSpec; 10] = [
    spec("Tempo", 10, 0, 100),
    spec("AspirationWindow", 35, 5, 500),
    spec("RfpMargin", 80, 0, 500),
    spec("RfpDepth", 6, 0, 16),
    spec("FutilityMargin", 110, 0, 1000),
    spec("FutilityDepth", 3, 0, 16),
    spec("NullMoveReduction", 3, 1, 6),
    spec("LmrMinMoves", 4, 1, 64),
    spec("TimeDivisor", 30, 5, 200),
    spec("SoftTimePercent", 50, 10, 100),
];

/// Numeric knobs consulted by the evaluator, search, and time manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    /// Bonus for the side to move, in centipawns.
    pub tempo: i32,
    /// Half-width of the aspiration window.
    pub aspiration_window: i32,
    /// Reverse futility margin per ply of depth.
    pub rfp_margin: i32,
    /// Deepest node where reverse futility pruning applies.
    pub rfp_depth: i32,
    /// Futility margin per ply of depth.
    pub futility_margin: i32,
    /// Deepest node where futility pruning applies.
    pub futility_depth: i32,
    /// Extra depth reduction for the null-move search.
    pub null_move_reduction: i32,
    /// Moves searched at full depth before late-move reduction kicks in.
    pub lmr_min_moves: i32,
    /// Expected moves left when the GUI does not send `movestogo`.
    pub time_divisor: i32,
    /// Soft limit as a percentage of the hard limit.
    pub soft_time_percent: i32,
}

impl SearchParams {
    /// Look up a parameter by name (case-insensitive).
    pub fn get(&self, name: &str) -> Option<i32> {
        let index = Self::index_of(name)?;
        Some(*self.slots()[index])
    }

    /// Set a parameter by name (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::Unknown`] if no such parameter exists and
    /// [`ParamError::OutOfRange`] if `value` is outside its range. The
    /// parameter is left unchanged on error.
    pub fn set(&mut self, name: &str, value: i32) -> Result<(), ParamError> {
        let index = Self::index_of(name).ok_or_else(|| ParamError::Unknown {
            name: name.to_string(),
        })?;
        let spec = PARAM_SPECS[index];
        if !(spec.min..=spec.max).contains(&value) {
            return Err(ParamError::OutOfRange {
                name: spec.name,
                value,
                min: spec.min,
                max: spec.max,
            });
        }
        *self.slots_mut()[index] = value;
        Ok(())
    }

    fn index_of(name: &str) -> Option<usize> {
        PARAM_SPECS
            .iter()
            .position(|spec| spec.name.eq_ignore_ascii_case(name))
    }

    fn slots(&self) -> [&i32; 10] {
        [
            &self.tempo,
            &self.aspiration_window,
            &self.rfp_margin,
            &self.rfp_depth,
            &self.futility_margin,
            &self.futility_depth,
            &self.null_move_reduction,
            &self.lmr_min_moves,
            &self.time_divisor,
            &self.soft_time_percent,
        ]
    }

    fn slots_mut(&mut self) -> [&mut i32; 10] {
        [
            &mut self.tempo,
            &mut self.aspiration_window,
            &mut self.rfp_margin,
            &mut self.rfp_depth,
            &mut self.futility_margin,
            &mut self.futility_depth,
            &mut self.null_move_reduction,
            &mut self.lmr_min_moves,
            &mut self.time_divisor,
            &mut self.soft_time_percent,
        ]
    }
}

impl Default for SearchParams {
    fn default() -> Self {
        let d = |i: usize| PARAM_SPECS[i].default;
        Self {
            tempo: d(0),
            aspiration_window: d(1),
            rfp_margin: d(2),
            rfp_depth: d(3),
            futility_margin: d(4),
            futility_depth: d(5),
            null_move_reduction: d(6),
            lmr_min_moves: d(7),
            time_divisor: d(8),
            soft_time_percent: d(9),
        }
    }
}
