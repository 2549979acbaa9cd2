//! SpringRank inference.
//!
//! Treats every weighted edge `i -> j` as a spring with rest length `l1` and
//! stiffness `A[i, j]` and returns the minimum-energy positions of the nodes.
//! Setting the gradient of the energy to zero yields a sparse linear system
//! `M r = B` built from the degree vectors:
//!
//! | Branch | `M` | `B` |
//! |--------|-----|-----|
//! | `alpha > 0` | `alpha I + D1 - C` | `alpha l0 1 + D2 1` |
//! | `alpha = 0` | `D1 - C'` | `D2 1 + D3 1` |
//!
//! with `D1 = diag(k_out + k_in)`, `D2 = diag(l1 (k_out - k_in))` and
//! `C = A + A^T`. Without regularization `D1 - C` is singular (a global shift
//! of all ranks costs no energy). The unregularized branch removes that
//! direction by pinning the last node: its combined row `C[N-1, :]` is
//! broadcast into every row, `C'[i, j] = C[i, j] + A[N-1, j] + A[j, N-1]`,
//! and `D3 = l1 (k_out[N-1] - k_in[N-1]) I`.
//!
//! # Solve policy
//!
//! The system is solved with [`SparseDirectSolver`] first. If it reports a
//! singular pivot, runs into its fill-in, work or time limit, or its
//! relative residual exceeds
//! [`RankConfig::residual_threshold`], [`BiCgStabSolver`] takes over and its
//! best-effort answer is returned. The [`RankResult`] records which path was
//! taken and whether the answer converged.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::adjacency::AdjacencyMatrix;
use crate::bicgstab::{norm2, BiCgStabSolver};
use crate::degrees::{interaction_entries, pinned_boundary_weights, DegreeVectors};
use crate::direct::SparseDirectSolver;
use crate::error::{SpringRankError, ValidationError};
use crate::traits::SolverEngine;
use crate::types::{ComputeBudget, CsrMatrix};
use crate::validation::{require_non_negative, require_positive};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Per-call SpringRank parameters.
///
/// # Example
///
/// ```rust
/// use springrank::rank::RankConfig;
///
/// let config = RankConfig::new(2.0, 1.0, 1.0).with_residual_threshold(1e-6);
/// assert_eq!(config.alpha, 2.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankConfig {
    /// Stiffness of the anchor spring pulling every node toward `l0`.
    ///
    /// `0.0` disables regularization and pins the last node instead.
    ///
    /// Default: `0.0`.
    pub alpha: f64,

    /// Rest length of the anchor spring.
    ///
    /// Default: `1.0`.
    pub l0: f64,

    /// Rest length of the interaction springs.
    ///
    /// Default: `1.0`.
    pub l1: f64,

    /// Limits for the iterative fallback.
    pub budget: ComputeBudget,

    /// Largest acceptable `||M r - B|| / ||B||` for a direct solution before
    /// the iterative solver is consulted.
    ///
    /// Default: `1e-8`.
    pub residual_threshold: f64,
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            alpha: 0.0,
            l0: 1.0,
            l1: 1.0,
            budget: ComputeBudget::default(),
            residual_threshold: 1e-8,
        }
    }
}

impl RankConfig {
    /// Configuration with explicit spring parameters and default solver limits.
    pub fn new(alpha: f64, l0: f64, l1: f64) -> Self {
        Self {
            alpha,
            l0,
            l1,
            ..Self::default()
        }
    }

    /// Replace the iterative solver budget.
    pub fn with_budget(mut self, budget: ComputeBudget) -> Self {
        self.budget = budget;
        self
    }

    /// Replace the direct-solve reliability threshold.
    pub fn with_residual_threshold(mut self, threshold: f64) -> Self {
        self.residual_threshold = threshold;
        self
    }

    /// `true` when the anchor spring is active.
    #[inline]
    pub fn is_regularized(&self) -> bool {
        self.alpha != 0.0
    }

    /// Check every parameter.
    ///
    /// # Errors
    ///
    /// [`SpringRankError::InvalidInput`] when `alpha < 0`, `l0 <= 0`,
    /// `l1 <= 0`, the tolerance or threshold is not positive, the iteration
    /// budget is zero, or any value is non-finite.
    pub fn validate(&self) -> Result<(), SpringRankError> {
        require_non_negative("alpha", self.alpha)?;
        require_positive("l0", self.l0)?;
        require_positive("l1", self.l1)?;
        require_positive("tolerance", self.budget.tolerance)?;
        require_positive("residual_threshold", self.residual_threshold)?;
        if self.budget.max_iterations == 0 {
            return Err(ValidationError::ParameterOutOfRange {
                name: "max_iterations".into(),
                value: "0".into(),
                expected: ">= 1".into(),
            }
            .into());
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Which solver produced the returned ranks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SolveMethod {
    /// The sparse direct solve succeeded with an acceptable residual.
    Direct,
    /// The direct solve failed or was unreliable; BiCGSTAB was used.
    Iterative,
}

impl std::fmt::Display for SolveMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolveMethod::Direct => write!(f, "direct"),
            SolveMethod::Iterative => write!(f, "iterative"),
        }
    }
}

/// Ranks plus the provenance needed to judge how far to trust them.
#[derive(Debug, Clone)]
pub struct RankResult {
    /// One rank per node, in adjacency order.
    pub ranks: Vec<f64>,
    /// Solver that produced `ranks`.
    pub method: SolveMethod,
    /// `false` when the iterative fallback stopped short of its tolerance.
    pub converged: bool,
    /// `||M r - B||_2` for the returned ranks.
    pub residual_norm: f64,
    /// Iterations spent by the solver that produced `ranks`.
    pub iterations: usize,
    /// Wall-clock time for assembly and solving.
    pub wall_time: Duration,
}

impl RankResult {
    /// Number of ranked nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    /// `true` when there are no ranks.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }

    /// Ranks shifted so the lowest one is zero.
    ///
    /// Unregularized ranks are only defined up to a constant; this gives a
    /// canonical representative for comparisons.
    pub fn shifted_to_min_zero(&self) -> Vec<f64> {
        let min = self.ranks.iter().copied().fold(f64::INFINITY, f64::min);
        self.ranks.iter().map(|r| r - min).collect()
    }

    /// Node indices ordered from highest to lowest rank. Ties keep index order.
    pub fn ordering(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.ranks.len()).collect();
        order.sort_by(|&a, &b| self.ranks[b].total_cmp(&self.ranks[a]));
        order
    }
}

/// An assembled SpringRank system `M r = B`.
#[derive(Debug, Clone)]
pub struct LinearSystem {
    /// System matrix `M`.
    pub matrix: CsrMatrix,
    /// Right-hand side `B`.
    pub rhs: Vec<f64>,
    /// Node whose row/column was broadcast, when unregularized.
    pub pinned: Option<usize>,
}

impl LinearSystem {
    /// `||M x - B||_2`.
    pub fn residual_norm(&self, x: &[f64]) -> f64 {
        let mut scratch = vec![0.0f64; self.matrix.rows];
        self.matrix.residual_norm(x, &self.rhs, &mut scratch)
    }

    /// `||M x - B||_2 / ||B||_2`, or the absolute residual when `B = 0`.
    pub fn relative_residual(&self, x: &[f64]) -> f64 {
        let residual = self.residual_norm(x);
        let b_norm = norm2(&self.rhs);
        if b_norm > 0.0 {
            residual / b_norm
        } else {
            residual
        }
    }
}

// ---------------------------------------------------------------------------
// Solver
// ---------------------------------------------------------------------------

/// SpringRank solver: system assembly plus the direct/iterative policy.
///
/// # Example
///
/// ```rust
/// use springrank::adjacency::AdjacencyMatrix;
/// use springrank::rank::{RankConfig, SpringRank};
///
/// // 0 beats 1, 1 beats 2.
/// let a = AdjacencyMatrix::from_edges(3, vec![(0, 1, 1.0), (1, 2, 1.0)]).unwrap();
/// let result = SpringRank::new(RankConfig::default()).unwrap().solve(&a).unwrap();
/// assert!(result.ranks[0] > result.ranks[1]);
/// assert!(result.ranks[1] > result.ranks[2]);
/// ```
#[derive(Debug, Clone)]
pub struct SpringRank {
    config: RankConfig,
    direct: SparseDirectSolver,
    iterative: BiCgStabSolver,
}

impl SpringRank {
    /// Validate `config` and build a solver around it.
    ///
    /// # Errors
    ///
    /// [`SpringRankError::InvalidInput`] if the configuration is invalid.
    pub fn new(config: RankConfig) -> Result<Self, SpringRankError> {
        config.validate()?;
        let iterative = BiCgStabSolver::new(
            config.budget.tolerance,
            config.budget.max_iterations,
            true,
        );
        Ok(Self {
            config,
            direct: SparseDirectSolver::default(),
            iterative,
        })
    }

    /// Return the active configuration.
    #[inline]
    pub fn config(&self) -> &RankConfig {
        &self.config
    }

    /// Build `M` and `B` for `adjacency` without solving.
    pub fn assemble(&self, adjacency: &AdjacencyMatrix) -> LinearSystem {
        let n = adjacency.node_count();
        let degrees = DegreeVectors::from_adjacency(adjacency);
        let RankConfig { alpha, l0, l1, .. } = self.config;

        let mut entries: Vec<(usize, usize, f64)> = Vec::with_capacity(n + 2 * adjacency.nnz());
        entries.extend(interaction_entries(adjacency).map(|(i, j, w)| (i, j, -w)));

        if self.config.is_regularized() {
            entries.extend((0..n).map(|i| (i, i, alpha + degrees.total(i))));
            let rhs = (0..n)
                .map(|i| alpha * l0 + l1 * degrees.imbalance(i))
                .collect();
            return LinearSystem {
                matrix: CsrMatrix::from_coo(n, n, entries),
                rhs,
                pinned: None,
            };
        }

        let pin = n - 1;
        let boundary = pinned_boundary_weights(adjacency, pin);
        entries.reserve(n * (boundary.len() + 1));
        entries.extend((0..n).map(|i| (i, i, degrees.total(i))));
        for i in 0..n {
            entries.extend(boundary.iter().map(|&(j, w)| (i, j, -w)));
        }

        let d3 = l1 * degrees.imbalance(pin);
        let rhs = (0..n).map(|i| l1 * degrees.imbalance(i) + d3).collect();

        LinearSystem {
            matrix: CsrMatrix::from_coo(n, n, entries),
            rhs,
            pinned: Some(pin),
        }
    }

    /// Compute SpringRank scores for `adjacency`.
    ///
    /// # Errors
    ///
    /// Only input problems abort the call. Singular systems and iterative
    /// non-convergence are absorbed into the [`RankResult`] (`method` and
    /// `converged`).
    pub fn solve(&self, adjacency: &AdjacencyMatrix) -> Result<RankResult, SpringRankError> {
        let start = Instant::now();
        let system = self.assemble(adjacency);

        info!(
            nodes = adjacency.node_count(),
            edges = adjacency.nnz(),
            system_nnz = system.matrix.nnz(),
            alpha = self.config.alpha,
            pinned = ?system.pinned,
            "springrank: solving"
        );

        match self.direct.solve(&system.matrix, &system.rhs, &self.config.budget) {
            Ok(result) => {
                let relative = system.relative_residual(&result.solution);
                if relative <= self.config.residual_threshold {
                    debug!(relative, "springrank: direct solve accepted");
                    return Ok(RankResult {
                        ranks: result.solution,
                        method: SolveMethod::Direct,
                        converged: true,
                        residual_norm: result.residual_norm,
                        iterations: result.iterations,
                        wall_time: start.elapsed(),
                    });
                }
                warn!(
                    relative,
                    threshold = self.config.residual_threshold,
                    "springrank: direct solution unreliable, falling back to BiCGSTAB"
                );
            }
            Err(SpringRankError::InvalidInput(e)) => return Err(e.into()),
            Err(e) => {
                warn!(error = %e, "springrank: direct solve failed, falling back to BiCGSTAB");
            }
        }

        let outcome =
            self.iterative
                .solve_best_effort(&system.matrix, &system.rhs, &self.config.budget)?;
        let converged = outcome.converged();
        if let Some(failure) = &outcome.failure {
            warn!(error = %failure, "springrank: returning best-effort iterative ranks");
        }

        Ok(RankResult {
            ranks: outcome.result.solution,
            method: SolveMethod::Iterative,
            converged,
            residual_norm: outcome.result.residual_norm,
            iterations: outcome.result.iterations,
            wall_time: start.elapsed(),
        })
    }
}

/// One-shot convenience wrapper around [`SpringRank`].
///
/// # Errors
///
/// See [`SpringRank::new`] and [`SpringRank::solve`].
pub fn springrank(
    adjacency: &AdjacencyMatrix,
    config: &RankConfig,
) -> Result<RankResult, SpringRankError> {
    SpringRank::new(config.clone())?.solve(adjacency)
}
