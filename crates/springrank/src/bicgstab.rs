//! Stabilized bi-conjugate gradient (BiCGSTAB) solver.
//!
//! Solves `Ax = b` for general (non-symmetric) sparse matrices in CSR format.
//! The pinned SpringRank system is not symmetric, so plain CG does not apply.
//!
//! # Algorithm
//!
//! Right-preconditioned BiCGSTAB (van der Vorst, 1992):
//!
//! ```text
//! r = b - A*x,  r_hat = r,  rho_prev = alpha = omega = 1,  v = p = 0
//!
//! for k in 0..max_iterations:
//!     rho   = r_hat . r
//!     beta  = (rho / rho_prev) * (alpha / omega)
//!     p     = r + beta * (p - omega * v)
//!     y     = M^{-1} p
//!     v     = A * y
//!     alpha = rho / (r_hat . v)
//!     s     = r - alpha * v
//!     if ||s|| < tol * ||b||:  x += alpha * y; converged
//!     z     = M^{-1} s
//!     t     = A * z
//!     omega = (t . s) / (t . t)
//!     x     = x + alpha * y + omega * z
//!     r     = s - omega * t
//!     if ||r|| < tol * ||b||:  converged
//! ```
//!
//! The recurrence residual drifts away from `b - A*x` in finite precision,
//! so every convergence claim is confirmed against the true residual. When
//! the true residual misses the target the iteration restarts from it with
//! a fresh shadow vector, at most [`MAX_RESTARTS`] times.
//!
//! # Best-effort results
//!
//! [`SolverEngine::solve`] is strict: anything short of convergence is an
//! error. [`BiCgStabSolver::solve_best_effort`] instead always hands back the
//! last finite iterate together with the reason it stopped, which is what a
//! fallback path wants.

use std::time::Instant;

use tracing::{debug, trace, warn};

use crate::error::{SpringRankError, ValidationError};
use crate::traits::SolverEngine;
use crate::types::{Algorithm, ComputeBudget, ConvergenceInfo, CsrMatrix, SolverResult};
use crate::validation::validate_system;

/// Restarts allowed after the recurrence residual disagrees with the true one.
pub const MAX_RESTARTS: usize = 8;

// ═══════════════════════════════════════════════════════════════════════════
// Helper functions
// ═══════════════════════════════════════════════════════════════════════════

/// Dot product of two `f64` slices with 4-wide accumulation.
#[inline]
pub(crate) fn dot(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len(), "dot: length mismatch");

    let n = a.len();
    let chunks = n / 4;

    let mut acc0: f64 = 0.0;
    let mut acc1: f64 = 0.0;
    let mut acc2: f64 = 0.0;
    let mut acc3: f64 = 0.0;

    for i in 0..chunks {
        let j = i * 4;
        acc0 += a[j] * b[j];
        acc1 += a[j + 1] * b[j + 1];
        acc2 += a[j + 2] * b[j + 2];
        acc3 += a[j + 3] * b[j + 3];
    }
    for i in (chunks * 4)..n {
        acc0 += a[i] * b[i];
    }

    (acc0 + acc1) + (acc2 + acc3)
}

/// L2 norm of an `f64` slice.
#[inline]
pub(crate) fn norm2(x: &[f64]) -> f64 {
    dot(x, x).sqrt()
}

/// `y[i] += alpha * x[i]` (AXPY).
#[inline]
fn axpy(alpha: f64, x: &[f64], y: &mut [f64]) {
    assert_eq!(x.len(), y.len(), "axpy: length mismatch");
    for (yi, xi) in y.iter_mut().zip(x) {
        *yi += alpha * xi;
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// BiCgStabSolver
// ═══════════════════════════════════════════════════════════════════════════

/// Outcome of [`BiCgStabSolver::solve_best_effort`].
#[derive(Debug)]
pub struct BestEffort {
    /// The last finite iterate and its residual.
    pub result: SolverResult,
    /// Why the solver stopped short of convergence, if it did.
    pub failure: Option<SpringRankError>,
}

impl BestEffort {
    /// `true` when the relative residual target was met.
    #[inline]
    pub fn converged(&self) -> bool {
        self.failure.is_none()
    }
}

/// BiCGSTAB solver for general sparse systems.
///
/// Holds configuration only; a solve is stateless and may run concurrently
/// on different inputs.
#[derive(Debug, Clone)]
pub struct BiCgStabSolver {
    /// Relative residual convergence tolerance: stop when
    /// `||r||_2 < tolerance * ||b||_2`.
    tolerance: f64,

    /// Maximum number of iterations before declaring non-convergence.
    max_iterations: usize,

    /// Whether to apply diagonal (Jacobi) preconditioning.
    use_preconditioner: bool,
}

impl Default for BiCgStabSolver {
    fn default() -> Self {
        Self::new(1e-10, 10_000, true)
    }
}

impl BiCgStabSolver {
    /// Create a new BiCGSTAB solver.
    ///
    /// # Arguments
    ///
    /// * `tolerance` -- Relative residual threshold. Must be positive and finite.
    /// * `max_iterations` -- Upper bound on iterations. Must be >= 1.
    /// * `use_preconditioner` -- Enable diagonal (Jacobi) preconditioning.
    pub fn new(tolerance: f64, max_iterations: usize, use_preconditioner: bool) -> Self {
        Self {
            tolerance,
            max_iterations,
            use_preconditioner,
        }
    }

    /// Return the configured tolerance.
    #[inline]
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Return the configured maximum iterations.
    #[inline]
    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Return whether preconditioning is enabled.
    #[inline]
    pub fn use_preconditioner(&self) -> bool {
        self.use_preconditioner
    }

    fn validate(&self, matrix: &CsrMatrix, rhs: &[f64]) -> Result<(), SpringRankError> {
        validate_system(matrix, rhs)?;

        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(ValidationError::ParameterOutOfRange {
                name: "tolerance".into(),
                value: self.tolerance.to_string(),
                expected: "positive finite value".into(),
            }
            .into());
        }

        if self.max_iterations == 0 {
            return Err(ValidationError::ParameterOutOfRange {
                name: "max_iterations".into(),
                value: "0".into(),
                expected: ">= 1".into(),
            }
            .into());
        }

        Ok(())
    }

    /// Build `inv_diag[i] = 1 / A_ii`; zero or tiny diagonals map to `1.0`.
    fn build_jacobi_preconditioner(matrix: &CsrMatrix) -> Vec<f64> {
        let mut inv_diag = vec![1.0f64; matrix.rows];
        for (row, slot) in inv_diag.iter_mut().enumerate() {
            let diag = matrix.get(row, row);
            if diag.abs() > f64::EPSILON {
                *slot = 1.0 / diag;
            }
        }
        inv_diag
    }

    #[inline]
    fn apply_preconditioner(inv_diag: Option<&[f64]>, src: &[f64], dst: &mut [f64]) {
        match inv_diag {
            Some(diag) => {
                for ((d, s), m) in dst.iter_mut().zip(src).zip(diag) {
                    *d = m * s;
                }
            }
            None => dst.copy_from_slice(src),
        }
    }

    /// Reset the Krylov state so the next iteration starts from `r`.
    fn restart(r: &[f64], r_hat: &mut [f64], p: &mut [f64], v: &mut [f64]) {
        r_hat.copy_from_slice(r);
        p.fill(0.0);
        v.fill(0.0);
    }

    fn drift_failure(iteration: usize, residual: f64, tolerance: f64) -> SpringRankError {
        SpringRankError::NumericalInstability {
            iteration,
            detail: format!(
                "true residual {residual:.3e} stays above {tolerance:.3e} after {MAX_RESTARTS} restarts"
            ),
        }
    }

    /// Run BiCGSTAB and always return the last finite iterate.
    ///
    /// A converged outcome always satisfies `||b - A*x|| < tol * ||b||` for
    /// the returned `x`.
    ///
    /// # Errors
    ///
    /// Only [`SpringRankError::InvalidInput`] is returned as `Err`; every
    /// other failure is reported through [`BestEffort::failure`].
    pub fn solve_best_effort(
        &self,
        matrix: &CsrMatrix,
        rhs: &[f64],
        budget: &ComputeBudget,
    ) -> Result<BestEffort, SpringRankError> {
        self.validate(matrix, rhs)?;

        let start_time = Instant::now();
        let n = matrix.rows;
        let max_iter = self.max_iterations.min(budget.max_iterations);
        let tol = self.tolerance.min(budget.tolerance);

        let b_norm = norm2(rhs);
        if n == 0 || b_norm < f64::MIN_POSITIVE {
            debug!("BiCGSTAB: zero RHS detected, returning zero solution");
            return Ok(BestEffort {
                result: SolverResult {
                    solution: vec![0.0; n],
                    iterations: 0,
                    residual_norm: 0.0,
                    wall_time: start_time.elapsed(),
                    convergence_history: Vec::new(),
                    algorithm: Algorithm::BiCgStab,
                },
                failure: None,
            });
        }
        let abs_tolerance = tol * b_norm;

        let inv_diag = self
            .use_preconditioner
            .then(|| Self::build_jacobi_preconditioner(matrix));
        let inv_diag = inv_diag.as_deref();

        let mut x = vec![0.0f64; n];
        let mut r = rhs.to_vec();
        let mut r_hat = r.clone();
        let mut p = vec![0.0f64; n];
        let mut v = vec![0.0f64; n];
        let mut y = vec![0.0f64; n];
        let mut s = vec![0.0f64; n];
        let mut z = vec![0.0f64; n];
        let mut t = vec![0.0f64; n];

        let mut rho_prev = 1.0f64;
        let mut alpha = 1.0f64;
        let mut omega = 1.0f64;
        let breakdown = f64::EPSILON * f64::EPSILON * b_norm * b_norm;

        let mut history = Vec::with_capacity(max_iter.min(256));
        let mut failure = None;
        let mut converged = false;
        let mut restarts = 0usize;

        debug!(
            n,
            nnz = matrix.nnz(),
            tol,
            max_iter,
            precond = self.use_preconditioner,
            "BiCGSTAB: starting"
        );

        for k in 0..max_iter {
            if start_time.elapsed() > budget.max_time {
                warn!("BiCGSTAB: wall-time budget exhausted at iteration {k}");
                failure = Some(SpringRankError::BudgetExhausted {
                    reason: format!(
                        "wall-time limit {:?} exceeded at iteration {k}",
                        budget.max_time,
                    ),
                    elapsed: start_time.elapsed(),
                });
                break;
            }

            let rho = dot(&r_hat, &r);
            if rho.abs() < breakdown {
                failure = Some(SpringRankError::NumericalInstability {
                    iteration: k,
                    detail: format!("rho = {rho:.3e} vanished; shadow residual orthogonal"),
                });
                break;
            }

            let beta = (rho / rho_prev) * (alpha / omega);
            for i in 0..n {
                p[i] = r[i] + beta * (p[i] - omega * v[i]);
            }

            Self::apply_preconditioner(inv_diag, &p, &mut y);
            matrix.spmv(&y, &mut v);

            let r_hat_v = dot(&r_hat, &v);
            if r_hat_v.abs() < breakdown {
                failure = Some(SpringRankError::NumericalInstability {
                    iteration: k,
                    detail: format!("r_hat . v = {r_hat_v:.3e} vanished"),
                });
                break;
            }
            alpha = rho / r_hat_v;

            s.copy_from_slice(&r);
            axpy(-alpha, &v, &mut s);

            let s_norm = norm2(&s);
            if s_norm < abs_tolerance {
                axpy(alpha, &y, &mut x);
                history.push(ConvergenceInfo {
                    iteration: k,
                    residual_norm: s_norm,
                });
                let true_norm = matrix.residual_norm(&x, rhs, &mut r);
                if true_norm < abs_tolerance {
                    converged = true;
                    break;
                }
                if restarts == MAX_RESTARTS {
                    failure = Some(Self::drift_failure(k, true_norm, abs_tolerance));
                    break;
                }
                restarts += 1;
                debug!(iteration = k, true_norm, restarts, "BiCGSTAB: residual drift, restarting");
                Self::restart(&r, &mut r_hat, &mut p, &mut v);
                (rho_prev, alpha, omega) = (1.0, 1.0, 1.0);
                continue;
            }

            Self::apply_preconditioner(inv_diag, &s, &mut z);
            matrix.spmv(&z, &mut t);

            let t_t = dot(&t, &t);
            if t_t == 0.0 {
                axpy(alpha, &y, &mut x);
                r.copy_from_slice(&s);
                failure = Some(SpringRankError::NumericalInstability {
                    iteration: k,
                    detail: "t . t = 0 while s is non-zero".into(),
                });
                break;
            }
            omega = dot(&t, &s) / t_t;

            axpy(alpha, &y, &mut x);
            axpy(omega, &z, &mut x);
            r.copy_from_slice(&s);
            axpy(-omega, &t, &mut r);

            let r_norm = norm2(&r);
            history.push(ConvergenceInfo {
                iteration: k,
                residual_norm: r_norm,
            });
            trace!(
                "BiCGSTAB iter {k}: ||r|| = {r_norm:.6e}, rel = {:.6e}",
                r_norm / b_norm,
            );

            if !r_norm.is_finite() || x.iter().any(|xi| !xi.is_finite()) {
                warn!("BiCGSTAB: non-finite iterate at iteration {k}");
                failure = Some(SpringRankError::NumericalInstability {
                    iteration: k,
                    detail: "non-finite iterate".into(),
                });
                break;
            }

            if r_norm < abs_tolerance {
                let true_norm = matrix.residual_norm(&x, rhs, &mut r);
                if true_norm < abs_tolerance {
                    converged = true;
                    break;
                }
                if restarts == MAX_RESTARTS {
                    failure = Some(Self::drift_failure(k, true_norm, abs_tolerance));
                    break;
                }
                restarts += 1;
                debug!(iteration = k, true_norm, restarts, "BiCGSTAB: residual drift, restarting");
                Self::restart(&r, &mut r_hat, &mut p, &mut v);
                (rho_prev, alpha, omega) = (1.0, 1.0, 1.0);
                continue;
            }

            if omega.abs() < f64::MIN_POSITIVE {
                failure = Some(SpringRankError::NumericalInstability {
                    iteration: k,
                    detail: "omega vanished; solver stagnated".into(),
                });
                break;
            }

            rho_prev = rho;
        }

        // Never hand back NaN/Inf: fall back to the zero vector in the
        // (pathological) case the last update poisoned the iterate.
        if x.iter().any(|xi| !xi.is_finite()) {
            x.iter_mut().for_each(|xi| *xi = 0.0);
        }

        // Recompute the true residual; the recurrence may drift.
        let mut scratch = vec![0.0f64; n];
        let residual_norm = matrix.residual_norm(&x, rhs, &mut scratch);

        if !converged && failure.is_none() {
            debug!(
                "BiCGSTAB: non-convergence after {max_iter} iterations, ||r|| = {residual_norm:.6e}"
            );
            failure = Some(SpringRankError::NonConvergence {
                iterations: max_iter,
                residual: residual_norm,
                tolerance: abs_tolerance,
            });
        } else if converged {
            debug!(
                iterations = history.len(),
                residual = residual_norm,
                "BiCGSTAB: converged"
            );
        }

        Ok(BestEffort {
            result: SolverResult {
                solution: x,
                iterations: history.len(),
                residual_norm,
                wall_time: start_time.elapsed(),
                convergence_history: history,
                algorithm: Algorithm::BiCgStab,
            },
            failure,
        })
    }
}

impl SolverEngine for BiCgStabSolver {
    /// Solve `Ax = b` using BiCGSTAB.
    ///
    /// # Errors
    ///
    /// * [`SpringRankError::InvalidInput`] -- dimension mismatch or invalid params.
    /// * [`SpringRankError::NumericalInstability`] -- breakdown.
    /// * [`SpringRankError::NonConvergence`] -- iteration limit exceeded.
    /// * [`SpringRankError::BudgetExhausted`] -- wall-time limit exceeded.
    fn solve(
        &self,
        matrix: &CsrMatrix,
        rhs: &[f64],
        budget: &ComputeBudget,
    ) -> Result<SolverResult, SpringRankError> {
        let outcome = self.solve_best_effort(matrix, rhs, budget)?;
        match outcome.failure {
            None => Ok(outcome.result),
            Some(err) => Err(err),
        }
    }

    fn algorithm(&self) -> Algorithm {
        Algorithm::BiCgStab
    }
}
