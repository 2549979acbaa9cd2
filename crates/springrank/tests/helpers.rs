//! Shared test helpers for the springrank integration test suite.
//!
//! Provides deterministic random network generators, a dense reference
//! solver and floating-point comparison utilities.

#![allow(dead_code)]

use springrank::types::CsrMatrix;
use springrank::AdjacencyMatrix;

// ---------------------------------------------------------------------------
// Random number generator (simple LCG for deterministic reproducibility)
// ---------------------------------------------------------------------------

/// A minimal linear congruential generator for deterministic test data.
pub struct Lcg {
    state: u64,
}

impl Lcg {
    /// Create a new LCG with the given seed.
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Generate the next u64 value.
    pub fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state
    }

    /// Generate a uniform f64 in [0, 1).
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Generate a uniform f64 in [lo, hi).
    pub fn next_f64_range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }
}

// ---------------------------------------------------------------------------
// Network generators
// ---------------------------------------------------------------------------

/// Random weighted directed network on `n` nodes.
///
/// Each ordered pair (self-loops included) carries an edge with probability
/// `density` and a weight in `[0.5, 3.0)`. A directed cycle
/// `0 -> 1 -> ... -> n-1 -> 0` is always added so the network is connected.
pub fn random_connected_network(n: usize, density: f64, seed: u64) -> AdjacencyMatrix {
    let mut rng = Lcg::new(seed);
    let mut edges = Vec::new();
    for i in 0..n {
        for j in 0..n {
            if rng.next_f64() < density {
                edges.push((i, j, rng.next_f64_range(0.5, 3.0)));
            }
        }
    }
    if n > 1 {
        for i in 0..n {
            edges.push((i, (i + 1) % n, 1.0));
        }
    }
    AdjacencyMatrix::from_edges(n, edges).expect("valid random network")
}

/// Sparse random weighted network with about `avg_out_degree` edges per node.
///
/// Endpoints are drawn uniformly, so construction is linear in the edge
/// count. The directed cycle of [`random_connected_network`] is added on top.
pub fn random_sparse_network(n: usize, avg_out_degree: f64, seed: u64) -> AdjacencyMatrix {
    let mut rng = Lcg::new(seed);
    let extra = ((avg_out_degree - 1.0).max(0.0) * n as f64) as usize;
    let mut edges = Vec::with_capacity(extra + n);
    for _ in 0..extra {
        let i = (rng.next_u64() >> 33) as usize % n;
        let j = (rng.next_u64() >> 33) as usize % n;
        edges.push((i, j, rng.next_f64_range(0.5, 3.0)));
    }
    if n > 1 {
        for i in 0..n {
            edges.push((i, (i + 1) % n, 1.0));
        }
    }
    AdjacencyMatrix::from_edges(n, edges).expect("valid sparse network")
}

/// Directed path `0 -> 1 -> ... -> n-1` with unit weights.
pub fn path_network(n: usize) -> AdjacencyMatrix {
    AdjacencyMatrix::from_edges(n, (1..n).map(|i| (i - 1, i, 1.0))).expect("valid path")
}

// ---------------------------------------------------------------------------
// Dense reference solver
// ---------------------------------------------------------------------------

/// Solve `Ax = b` using dense Gaussian elimination with partial pivoting.
///
/// O(n^3) reference used only for small test problems.
///
/// # Panics
///
/// Panics if the matrix is singular or dimensions are inconsistent.
pub fn dense_solve(matrix: &CsrMatrix, rhs: &[f64]) -> Vec<f64> {
    let n = matrix.rows;
    assert_eq!(n, matrix.cols, "dense_solve requires a square matrix");
    assert_eq!(rhs.len(), n, "rhs length must match matrix dimension");

    let mut aug = vec![vec![0.0f64; n + 1]; n];
    for (i, row) in aug.iter_mut().enumerate() {
        row[n] = rhs[i];
    }
    for (i, j, v) in matrix.triplets() {
        aug[i][j] += v;
    }

    for col in 0..n {
        let mut max_row = col;
        let mut max_val = aug[col][col].abs();
        for row in (col + 1)..n {
            if aug[row][col].abs() > max_val {
                max_val = aug[row][col].abs();
                max_row = row;
            }
        }
        assert!(max_val > 1e-13, "matrix is singular or near-singular");
        aug.swap(col, max_row);

        let pivot = aug[col][col];
        for row in (col + 1)..n {
            let factor = aug[row][col] / pivot;
            for j in col..=n {
                aug[row][j] -= factor * aug[col][j];
            }
        }
    }

    let mut x = vec![0.0f64; n];
    for i in (0..n).rev() {
        let mut sum = aug[i][n];
        for j in (i + 1)..n {
            sum -= aug[i][j] * x[j];
        }
        x[i] = sum / aug[i][i];
    }
    x
}

// ---------------------------------------------------------------------------
// Floating-point comparison utilities
// ---------------------------------------------------------------------------

/// Compute the L2 norm of a vector.
pub fn l2_norm(v: &[f64]) -> f64 {
    v.iter().map(|&x| x * x).sum::<f64>().sqrt()
}

/// Compute the relative error ||approx - exact|| / ||exact||.
pub fn relative_error(approx: &[f64], exact: &[f64]) -> f64 {
    assert_eq!(approx.len(), exact.len(), "vectors must have same length");
    let error = approx
        .iter()
        .zip(exact)
        .map(|(a, e)| (a - e) * (a - e))
        .sum::<f64>()
        .sqrt();
    let exact_norm = l2_norm(exact);
    if exact_norm > 1e-15 {
        error / exact_norm
    } else {
        error
    }
}

/// Largest deviation of `a - b` from its own mean, i.e. how far two vectors
/// are from differing by a constant shift.
pub fn max_offset_deviation(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len(), "vectors must have same length");
    let mean = a.iter().zip(b).map(|(x, y)| x - y).sum::<f64>() / a.len() as f64;
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y - mean).abs())
        .fold(0.0, f64::max)
}

/// Install a test subscriber once so `RUST_LOG=springrank=debug` shows solver
/// traces.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
