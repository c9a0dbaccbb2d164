//! Errors produced by the simulation core.

/// Errors that can occur while generating or processing a population.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimError {
    #[error("invalid parameter {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("division by zero: {name} is 0")]
    DivisionByZero { name: &'static str },

    #[error("group {group} has no molt times")]
    EmptyInput { group: usize },

    #[error("two-sample test needs at least 2 values per side, but got {len_a} and {len_b}")]
    InsufficientSampleSize { len_a: usize, len_b: usize },
}

/// Require `value` to be finite and strictly positive.
pub fn require_positive(name: &'static str, value: f64) -> Result<(), SimError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(SimError::InvalidParameter { name, value });
    }
    Ok(())
}
