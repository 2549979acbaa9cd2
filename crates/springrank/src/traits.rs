//! Linear solver trait.
//!
//! The rank solver only needs two primitives from its linear-algebra
//! backend, a direct solve and an iterative solve. Both implement
//! [`SolverEngine`] so a different backend can be swapped in per call.

use crate::error::SpringRankError;
use crate::types::{Algorithm, ComputeBudget, CsrMatrix, SolverResult};

/// Core trait that every linear solver implements.
///
/// A `SolverEngine` accepts a sparse matrix system and a compute budget,
/// returning either a [`SolverResult`] or a structured [`SpringRankError`].
pub trait SolverEngine: Send + Sync {
    /// Solve the linear system `A x = b` subject to the given compute budget.
    ///
    /// # Arguments
    ///
    /// * `matrix` - the sparse coefficient matrix.
    /// * `rhs` - the right-hand side vector `b`.
    /// * `budget` - resource limits for this invocation.
    ///
    /// # Errors
    ///
    /// Returns [`SpringRankError`] on singularity, non-convergence,
    /// numerical issues, budget exhaustion, or invalid input.
    fn solve(
        &self,
        matrix: &CsrMatrix,
        rhs: &[f64],
        budget: &ComputeBudget,
    ) -> Result<SolverResult, SpringRankError>;

    /// Return the algorithm identifier for this engine.
    fn algorithm(&self) -> Algorithm;
}
