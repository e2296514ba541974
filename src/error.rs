//! Error types for the stack planner.
//!
//! Infeasibility is deliberately absent from this module: an infeasible
//! instance is a regular outcome (see [`crate::optimizer::PackingOutcome`]).

use std::time::Duration;

use thiserror::Error;

/// Malformed input, detected before any model variable is created.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("item dimension lists differ in length: m={m}, n={n}, l={l}")]
    MismatchedLengths { m: usize, n: usize, l: usize },

    #[error("{name} must be positive and finite, got: {value}")]
    InvalidDimension { name: String, value: f64 },

    #[error("margin must be non-negative and finite, got: {0}")]
    InvalidMargin(f64),

    #[error("selector tolerance must lie strictly between 0 and 0.5, got: {0}")]
    InvalidTolerance(f64),
}

/// Failure of the external solver itself (never used for infeasibility).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverError {
    #[error("solver exceeded its time limit of {0:?}")]
    TimedOut(Duration),

    #[error("solver backend failed: {0}")]
    Backend(String),
}

/// Solved selector values that do not describe a valid orientation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("item {item}: no axis selector for raw dimension '{dimension}' is within {tolerance} of zero")]
    UnresolvedSlot {
        item: usize,
        dimension: char,
        tolerance: f64,
    },

    #[error("item {item}: decoded orientation {labels:?} is not a permutation of x, y, z")]
    NotAPermutation { item: usize, labels: [char; 3] },
}

/// Umbrella error returned by [`crate::optimizer::plan_packing`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PackingError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Solver(#[from] SolverError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl PackingError {
    /// Stable machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            PackingError::Config(_) => "invalid_configuration",
            PackingError::Solver(SolverError::TimedOut(_)) => "solver_timeout",
            PackingError::Solver(_) => "solver_error",
            PackingError::Decode(_) => "decode_error",
        }
    }
}
