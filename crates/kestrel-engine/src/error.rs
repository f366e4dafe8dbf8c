//! Engine-side errors.

/// Errors raised when adjusting a tunable search parameter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParamError {
    /// No parameter with this name exists.
    #[error("unknown parameter: {name}")]
    Unknown {
        /// The name that was looked up.
        name: String,
    },

    /// The value lies outside the parameter's allowed range.
    #[error("value {value} for {name} outside {min}..={max}")]
    OutOfRange {
        /// Canonical parameter name.
        name: &'static str,
        /// Rejected value.
        value: i32,
        /// Smallest accepted value.
        min: i32,
        /// Largest accepted value.
        max: i32,
    },
}

#[cfg(test)]
mod tests {
    use super::ParamError;

    #[test]
    fn out_of_range_display() {
        let err = ParamError::OutOfRange {
            name: "Tempo",
            value: 500,
            min: 0,
            max: 100,
        };
        assert_eq!(format!("{err}"), "value 500 for Tempo outside 0..=100");
    }
}
