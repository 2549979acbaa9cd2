//! Error types for the springrank crate.
//!
//! [`SpringRankError`] covers invalid input, linear-solver failures and
//! sampling failures. Input problems are reported eagerly as
//! [`ValidationError`] before any solve or generation work starts. All
//! errors implement `std::error::Error` via `thiserror`.

use std::time::Duration;

/// Primary error type for ranking, solving and generation.
#[derive(Debug, thiserror::Error)]
pub enum SpringRankError {
    /// The caller supplied invalid input (shape, entries, parameters).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] ValidationError),

    /// The direct solver could not find a usable pivot.
    #[error("matrix is singular: pivot {pivot:.2e} at column {column}")]
    SingularMatrix {
        /// Column being eliminated when no pivot was found.
        column: usize,
        /// Largest candidate pivot magnitude in that column.
        pivot: f64,
    },

    /// The iterative solver did not converge within the allowed iteration budget.
    #[error(
        "solver did not converge after {iterations} iterations (residual={residual:.2e}, tol={tolerance:.2e})"
    )]
    NonConvergence {
        /// Number of iterations completed before the budget was exhausted.
        iterations: usize,
        /// Final residual norm at termination.
        residual: f64,
        /// Absolute residual target that was not reached.
        tolerance: f64,
    },

    /// A numerical breakdown was detected (NaN, Inf, or vanishing inner product).
    #[error("numerical instability at iteration {iteration}: {detail}")]
    NumericalInstability {
        /// Iteration at which the instability was detected.
        iteration: usize,
        /// Human-readable explanation.
        detail: String,
    },

    /// The wall-time budget was exhausted.
    #[error("compute budget exhausted: {reason}")]
    BudgetExhausted {
        /// Which budget limit was hit.
        reason: String,
        /// Wall-clock time elapsed before the budget was hit.
        elapsed: Duration,
    },

    /// A sampling distribution rejected its parameters.
    #[error("distribution error: {0}")]
    Distribution(String),
}

/// Validation errors for adjacency matrices and model parameters.
///
/// These are raised before any computation begins so that callers get
/// clear diagnostics rather than mysterious numerical failures.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// Matrix or vector dimensions are inconsistent.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// The network has no nodes.
    #[error("network must have at least one node")]
    EmptyNetwork,

    /// A value is NaN or infinite where a finite number is required.
    #[error("non-finite value detected: {0}")]
    NonFiniteValue(String),

    /// An adjacency entry is negative.
    #[error("negative weight {value} at ({row}, {col})")]
    NegativeWeight {
        /// Row of the offending entry.
        row: usize,
        /// Column of the offending entry.
        col: usize,
        /// The offending weight.
        value: f64,
    },

    /// An index is out of bounds for the declared number of nodes.
    #[error("index {index} out of bounds for {nodes} nodes")]
    IndexOutOfBounds {
        /// Offending index.
        index: usize,
        /// Declared node count.
        nodes: usize,
    },

    /// A parameter is outside its valid range.
    #[error("parameter out of range: {name} = {value} (expected {expected})")]
    ParameterOutOfRange {
        /// Name of the parameter.
        name: String,
        /// The invalid value (as a string for flexibility).
        value: String,
        /// Human-readable description of the valid range.
        expected: String,
    },

    /// Matrix size exceeds the implementation limit.
    #[error("network size {nodes} nodes / {edges} edges exceeds limit {max_nodes} / {max_edges}")]
    TooLarge {
        /// Number of nodes.
        nodes: usize,
        /// Number of stored edges.
        edges: usize,
        /// Maximum supported node count.
        max_nodes: usize,
        /// Maximum supported edge count.
        max_edges: usize,
    },
}
