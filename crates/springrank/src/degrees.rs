//! Degree accumulation for SpringRank systems.
//!
//! Derives the in/out strength vectors and the symmetrized interaction
//! matrix `C = A + A^T` in a single O(nnz) pass over the sparse adjacency.

use crate::adjacency::AdjacencyMatrix;
use crate::types::CsrMatrix;

/// Weighted in- and out-degree (strength) of every node.
#[derive(Debug, Clone, PartialEq)]
pub struct DegreeVectors {
    /// Column sums: total weight of edges pointing into each node.
    pub k_in: Vec<f64>,
    /// Row sums: total weight of edges leaving each node.
    pub k_out: Vec<f64>,
}

impl DegreeVectors {
    /// Accumulate degrees from an adjacency matrix.
    pub fn from_adjacency(adjacency: &AdjacencyMatrix) -> Self {
        let n = adjacency.node_count();
        let mut k_in = vec![0.0f64; n];
        let mut k_out = vec![0.0f64; n];
        for (i, j, w) in adjacency.edges() {
            k_out[i] += w;
            k_in[j] += w;
        }
        Self { k_in, k_out }
    }

    /// Number of nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.k_in.len()
    }

    /// `true` when there are no nodes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.k_in.is_empty()
    }

    /// `k_out[i] + k_in[i]`, the diagonal of `D1`.
    #[inline]
    pub fn total(&self, i: usize) -> f64 {
        self.k_out[i] + self.k_in[i]
    }

    /// `k_out[i] - k_in[i]`; scaled by `l1` this is the diagonal of `D2`.
    #[inline]
    pub fn imbalance(&self, i: usize) -> f64 {
        self.k_out[i] - self.k_in[i]
    }

    /// `true` when node `i` has no incident weight at all.
    #[inline]
    pub fn is_isolated(&self, i: usize) -> bool {
        self.total(i) == 0.0
    }
}

/// Stream the triplets of `C = A + A^T`.
///
/// Each stored `A[i, j]` contributes `(i, j)` and `(j, i)`; a self-loop
/// therefore contributes twice to `C[i, i]`. Duplicates are summed by
/// [`CsrMatrix::from_coo`].
pub fn interaction_entries(
    adjacency: &AdjacencyMatrix,
) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
    adjacency
        .edges()
        .flat_map(|(i, j, w)| [(i, j, w), (j, i, w)])
}

/// Materialize `C = A + A^T` as a CSR matrix.
pub fn interaction_matrix(adjacency: &AdjacencyMatrix) -> CsrMatrix {
    let n = adjacency.node_count();
    CsrMatrix::from_coo(n, n, interaction_entries(adjacency))
}

/// Combined weight `A[pin, j] + A[j, pin]` for every `j` touching `pin`.
///
/// This is row `pin` of `C`, the vector broadcast into every row of the
/// pinned interaction matrix. Returned sorted by `j`, zero entries omitted.
pub fn pinned_boundary_weights(adjacency: &AdjacencyMatrix, pin: usize) -> Vec<(usize, f64)> {
    let mut weights = vec![0.0f64; adjacency.node_count()];
    for (col, w) in adjacency.as_csr().row_entries(pin) {
        weights[col] += w;
    }
    for (row, col, w) in adjacency.edges() {
        if col == pin {
            weights[row] += w;
        }
    }
    weights
        .into_iter()
        .enumerate()
        .filter(|&(_, w)| w != 0.0)
        .collect()
}
