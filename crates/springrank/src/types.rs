//! Core types shared by the linear solvers and the rank solver.
//!
//! Provides [`CsrMatrix`] for compressed sparse row storage, the
//! [`ComputeBudget`] consumed by iterative solvers and the raw
//! [`SolverResult`] returned by every [`SolverEngine`].
//!
//! [`SolverEngine`]: crate::traits::SolverEngine

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CsrMatrix
// ---------------------------------------------------------------------------

/// Compressed Sparse Row (CSR) matrix of `f64` values.
///
/// Stores only non-zero entries so that matrix-vector products cost O(nnz).
///
/// # Layout
///
/// For a matrix with `m` rows and `nnz` non-zeros:
/// - `row_ptr` has length `m + 1`
/// - `col_indices` and `values` each have length `nnz`
/// - Row `i` spans indices `row_ptr[i]..row_ptr[i+1]`
/// - Column indices are strictly increasing within a row when the matrix was
///   built through [`from_coo`](Self::from_coo)
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix {
    /// Row pointers: `row_ptr[i]` is the start index in `col_indices`/`values`
    /// for row `i`.
    pub row_ptr: Vec<usize>,
    /// Column indices for each non-zero entry.
    pub col_indices: Vec<usize>,
    /// Values for each non-zero entry.
    pub values: Vec<f64>,
    /// Number of rows.
    pub rows: usize,
    /// Number of columns.
    pub cols: usize,
}

impl CsrMatrix {
    /// Build a CSR matrix from COO (coordinate) triplets.
    ///
    /// Entries are sorted by `(row, col)` and duplicate positions are summed,
    /// so callers may push the same coordinate several times while assembling
    /// a system.
    ///
    /// # Panics
    ///
    /// Panics if a triplet lies outside `rows x cols`. Callers validate
    /// indices before assembly.
    pub fn from_coo(
        rows: usize,
        cols: usize,
        entries: impl IntoIterator<Item = (usize, usize, f64)>,
    ) -> Self {
        let mut sorted: Vec<_> = entries.into_iter().collect();
        sorted.sort_unstable_by_key(|(r, c, _)| (*r, *c));

        let mut row_ptr = vec![0usize; rows + 1];
        let mut col_indices: Vec<usize> = Vec::with_capacity(sorted.len());
        let mut values: Vec<f64> = Vec::with_capacity(sorted.len());
        let mut last: Option<(usize, usize)> = None;

        for (r, c, v) in sorted {
            assert!(r < rows, "row index {} out of bounds (rows={})", r, rows);
            assert!(c < cols, "col index {} out of bounds (cols={})", c, cols);

            if last == Some((r, c)) {
                if let Some(tail) = values.last_mut() {
                    *tail += v;
                }
                continue;
            }
            row_ptr[r + 1] += 1;
            col_indices.push(c);
            values.push(v);
            last = Some((r, c));
        }

        for i in 1..=rows {
            row_ptr[i] += row_ptr[i - 1];
        }

        Self {
            row_ptr,
            col_indices,
            values,
            rows,
            cols,
        }
    }

    /// Build a square identity matrix of dimension `n`.
    pub fn identity(n: usize) -> Self {
        Self {
            row_ptr: (0..=n).collect(),
            col_indices: (0..n).collect(),
            values: vec![1.0; n],
            rows: n,
            cols: n,
        }
    }

    /// Sparse matrix-vector multiply: `y = A * x`.
    ///
    /// # Panics
    ///
    /// Debug-asserts that `x.len() >= self.cols` and `y.len() >= self.rows`.
    #[inline]
    pub fn spmv(&self, x: &[f64], y: &mut [f64]) {
        debug_assert!(
            x.len() >= self.cols,
            "spmv: x.len()={} < cols={}",
            x.len(),
            self.cols,
        );
        debug_assert!(
            y.len() >= self.rows,
            "spmv: y.len()={} < rows={}",
            y.len(),
            self.rows,
        );

        for i in 0..self.rows {
            let mut sum = 0.0f64;
            for idx in self.row_ptr[i]..self.row_ptr[i + 1] {
                sum += self.values[idx] * x[self.col_indices[idx]];
            }
            y[i] = sum;
        }
    }

    /// Compute `r = b - A x` into `residual` and return `||r||_2`.
    pub fn residual_norm(&self, x: &[f64], rhs: &[f64], residual: &mut [f64]) -> f64 {
        debug_assert!(rhs.len() >= self.rows);
        debug_assert!(residual.len() >= self.rows);

        self.spmv(x, residual);
        let mut norm_sq = 0.0f64;
        for i in 0..self.rows {
            let r_i = rhs[i] - residual[i];
            residual[i] = r_i;
            norm_sq += r_i * r_i;
        }
        norm_sq.sqrt()
    }

    /// Number of non-zero entries.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Iterate over `(col_index, value)` pairs for the given row.
    #[inline]
    pub fn row_entries(&self, row: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let start = self.row_ptr[row];
        let end = self.row_ptr[row + 1];
        self.col_indices[start..end]
            .iter()
            .copied()
            .zip(self.values[start..end].iter().copied())
    }

    /// Iterate over every stored `(row, col, value)` triplet in row-major
    /// order.
    pub fn triplets(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        (0..self.rows).flat_map(move |row| {
            self.row_entries(row).map(move |(col, v)| (row, col, v))
        })
    }

    /// Look up a single entry. Returns `0.0` for positions that are not
    /// stored.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        let start = self.row_ptr[row];
        let end = self.row_ptr[row + 1];
        match self.col_indices[start..end].binary_search(&col) {
            Ok(pos) => self.values[start + pos],
            Err(_) => 0.0,
        }
    }

    /// Transpose: produces `A^T` in CSR form.
    ///
    /// Two-pass counting sort in O(nnz + rows + cols) time. Column order
    /// within each output row stays sorted because rows are scanned in order.
    pub fn transpose(&self) -> CsrMatrix {
        let nnz = self.nnz();
        let t_rows = self.cols;

        // Pass 1: count entries per new row (= old column).
        let mut row_ptr = vec![0usize; t_rows + 1];
        for &c in &self.col_indices {
            row_ptr[c + 1] += 1;
        }
        for i in 1..=t_rows {
            row_ptr[i] += row_ptr[i - 1];
        }

        // Pass 2: scatter entries into the transposed arrays.
        let mut col_indices = vec![0usize; nnz];
        let mut values = vec![0.0f64; nnz];
        let mut cursor = row_ptr.clone();

        for row in 0..self.rows {
            for idx in self.row_ptr[row]..self.row_ptr[row + 1] {
                let c = self.col_indices[idx];
                let dest = cursor[c];
                col_indices[dest] = row;
                values[dest] = self.values[idx];
                cursor[c] += 1;
            }
        }

        CsrMatrix {
            row_ptr,
            col_indices,
            values,
            rows: t_rows,
            cols: self.rows,
        }
    }
}

// ---------------------------------------------------------------------------
// Solver result types
// ---------------------------------------------------------------------------

/// Linear solver algorithm identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    /// Sparse Gaussian elimination with threshold partial pivoting.
    ///
    /// Exact up to rounding. Fails on (numerically) singular matrices.
    SparseDirect,
    /// Stabilized bi-conjugate gradient (BiCGSTAB).
    ///
    /// Handles non-symmetric systems such as the pinned SpringRank system.
    BiCgStab,
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Algorithm::SparseDirect => write!(f, "sparse-direct"),
            Algorithm::BiCgStab => write!(f, "bicgstab"),
        }
    }
}

/// Budget constraints for iterative solver execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputeBudget {
    /// Maximum wall-clock time allowed.
    pub max_time: Duration,
    /// Maximum number of iterations.
    pub max_iterations: usize,
    /// Target relative residual tolerance.
    pub tolerance: f64,
}

impl Default for ComputeBudget {
    fn default() -> Self {
        Self {
            max_time: Duration::from_secs(30),
            max_iterations: 10_000,
            tolerance: 1e-10,
        }
    }
}

/// Per-iteration convergence snapshot.
#[derive(Debug, Clone)]
pub struct ConvergenceInfo {
    /// Iteration index (0-based).
    pub iteration: usize,
    /// Residual L2 norm at this iteration.
    pub residual_norm: f64,
}

/// Result returned by a successful solver invocation.
#[derive(Debug, Clone)]
pub struct SolverResult {
    /// Solution vector x.
    pub solution: Vec<f64>,
    /// Number of iterations performed (1 for the direct solver).
    pub iterations: usize,
    /// Final residual L2 norm `||b - A x||_2`.
    pub residual_norm: f64,
    /// Wall-clock time taken.
    pub wall_time: Duration,
    /// Per-iteration convergence history.
    pub convergence_history: Vec<ConvergenceInfo>,
    /// Algorithm used.
    pub algorithm: Algorithm,
}
