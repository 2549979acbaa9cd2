//! Validated sparse adjacency matrix of a directed weighted network.

use crate::error::{SpringRankError, ValidationError};
use crate::types::CsrMatrix;
use crate::validation::{validate_adjacency, validate_dense_shape};

/// Square, non-negative, finite adjacency matrix stored in CSR form.
///
/// `A[i, j]` is the weight of the directed interaction `i -> j`. Self-loops
/// are allowed. The invariant is checked once at construction, so the rank
/// solver can trust every `AdjacencyMatrix` it receives.
#[derive(Debug, Clone, PartialEq)]
pub struct AdjacencyMatrix {
    inner: CsrMatrix,
}

impl AdjacencyMatrix {
    /// Wrap an existing CSR matrix after validating it.
    ///
    /// # Errors
    ///
    /// [`SpringRankError::InvalidInput`] if the matrix is empty, non-square,
    /// malformed, or has a negative or non-finite entry.
    pub fn from_csr(matrix: CsrMatrix) -> Result<Self, SpringRankError> {
        validate_adjacency(&matrix)?;
        Ok(Self { inner: matrix })
    }

    /// Build from dense rows. Zero entries are not stored.
    ///
    /// # Errors
    ///
    /// [`SpringRankError::InvalidInput`] if `rows` is empty or ragged, or an
    /// entry is negative or non-finite.
    pub fn from_dense(rows: &[Vec<f64>]) -> Result<Self, SpringRankError> {
        let n = validate_dense_shape(rows)?;
        let entries = rows.iter().enumerate().flat_map(|(i, row)| {
            row.iter()
                .enumerate()
                .filter(|&(_, &w)| w != 0.0)
                .map(move |(j, &w)| (i, j, w))
        });
        Self::from_csr(CsrMatrix::from_coo(n, n, entries))
    }

    /// Build from a weighted edge list `(source, target, weight)`.
    ///
    /// Repeated edges accumulate their weights.
    ///
    /// # Errors
    ///
    /// [`SpringRankError::InvalidInput`] if `n == 0`, an endpoint is
    /// `>= n`, or a weight is negative or non-finite.
    pub fn from_edges(
        n: usize,
        edges: impl IntoIterator<Item = (usize, usize, f64)>,
    ) -> Result<Self, SpringRankError> {
        if n == 0 {
            return Err(ValidationError::EmptyNetwork.into());
        }
        let edges: Vec<_> = edges.into_iter().collect();
        if let Some(&(u, v, _)) = edges.iter().find(|(u, v, _)| *u >= n || *v >= n) {
            return Err(ValidationError::IndexOutOfBounds {
                index: u.max(v),
                nodes: n,
            }
            .into());
        }
        Self::from_csr(CsrMatrix::from_coo(n, n, edges))
    }

    /// Number of nodes `N`.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.inner.rows
    }

    /// Number of stored (non-zero) entries.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.inner.nnz()
    }

    /// Weight of the edge `i -> j` (zero when absent).
    #[inline]
    pub fn weight(&self, i: usize, j: usize) -> f64 {
        self.inner.get(i, j)
    }

    /// Borrow the underlying CSR storage.
    #[inline]
    pub fn as_csr(&self) -> &CsrMatrix {
        &self.inner
    }

    /// Iterate over stored `(source, target, weight)` entries.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.inner.triplets()
    }

    /// Expand into dense rows. Intended for small matrices and tests.
    pub fn to_dense(&self) -> Vec<Vec<f64>> {
        let n = self.node_count();
        let mut dense = vec![vec![0.0; n]; n];
        for (i, j, w) in self.edges() {
            dense[i][j] = w;
        }
        dense
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dense_round_trip_drops_zeros() {
        let dense = vec![
            vec![0.0, 2.0, 0.0],
            vec![0.0, 0.0, 1.0],
            vec![3.0, 0.0, 1.0],
        ];
        let a = AdjacencyMatrix::from_dense(&dense).unwrap();
        assert_eq!(a.node_count(), 3);
        assert_eq!(a.nnz(), 4);
        assert_eq!(a.to_dense(), dense);
    }

    #[test]
    fn edges_accumulate_duplicates() {
        let a = AdjacencyMatrix::from_edges(2, vec![(0, 1, 1.0), (0, 1, 2.0)]).unwrap();
        assert_eq!(a.weight(0, 1), 3.0);
        assert_eq!(a.weight(1, 0), 0.0);
    }

    #[test]
    fn out_of_range_edge_is_rejected() {
        let err = AdjacencyMatrix::from_edges(2, vec![(0, 2, 1.0)]).unwrap_err();
        assert!(matches!(
            err,
            SpringRankError::InvalidInput(ValidationError::IndexOutOfBounds { index: 2, nodes: 2 })
        ));
    }

    #[test]
    fn zero_nodes_is_rejected() {
        assert!(AdjacencyMatrix::from_edges(0, Vec::new()).is_err());
        assert!(AdjacencyMatrix::from_dense(&[]).is_err());
    }

    #[test]
    fn negative_dense_entry_is_rejected() {
        let err = AdjacencyMatrix::from_dense(&[vec![0.0, -1.0], vec![0.0, 0.0]]).unwrap_err();
        assert!(matches!(
            err,
            SpringRankError::InvalidInput(ValidationError::NegativeWeight { .. })
        ));
    }
}
