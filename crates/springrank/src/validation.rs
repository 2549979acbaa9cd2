//! Input validation for ranking and generation.
//!
//! All validation functions run eagerly before any computation begins, so
//! callers receive clear diagnostics instead of numerical garbage. Every
//! function returns [`ValidationError`], which converts into
//! [`SpringRankError::InvalidInput`](crate::error::SpringRankError::InvalidInput)
//! via `From`.
//!
//! # Limits
//!
//! | Resource      | Limit         | Constant      |
//! |---------------|---------------|---------------|
//! | Nodes         | 10,000,000    | [`MAX_NODES`] |
//! | Stored edges  | 100,000,000   | [`MAX_EDGES`] |

use crate::error::ValidationError;
use crate::types::CsrMatrix;

/// Maximum number of nodes in a network.
pub const MAX_NODES: usize = 10_000_000;

/// Maximum number of stored (non-zero) adjacency entries.
pub const MAX_EDGES: usize = 100_000_000;

// ---------------------------------------------------------------------------
// Adjacency validation
// ---------------------------------------------------------------------------

/// Validate that a CSR matrix is a well-formed adjacency matrix.
///
/// Checks, in order:
///
/// 1. At least one node, and the matrix is square.
/// 2. Node and edge counts are within [`MAX_NODES`] / [`MAX_EDGES`].
/// 3. `row_ptr` has length `rows + 1`, starts at 0, is non-decreasing and
///    ends at `nnz`; `col_indices` has length `nnz`.
/// 4. Every column index is `< cols`.
/// 5. Every weight is finite and non-negative.
///
/// # Errors
///
/// Returns [`ValidationError`] describing the first violation found.
///
/// # Examples
///
/// ```
/// use springrank::types::CsrMatrix;
/// use springrank::validation::validate_adjacency;
///
/// let m = CsrMatrix::from_coo(2, 2, vec![(0, 1, 1.0), (1, 1, 2.0)]);
/// assert!(validate_adjacency(&m).is_ok());
/// ```
pub fn validate_adjacency(matrix: &CsrMatrix) -> Result<(), ValidationError> {
    if matrix.rows == 0 || matrix.cols == 0 {
        return Err(ValidationError::EmptyNetwork);
    }

    if matrix.rows != matrix.cols {
        return Err(ValidationError::DimensionMismatch(format!(
            "adjacency matrix must be square, got {}x{}",
            matrix.rows, matrix.cols,
        )));
    }

    let nnz = matrix.values.len();
    if matrix.rows > MAX_NODES || nnz > MAX_EDGES {
        return Err(ValidationError::TooLarge {
            nodes: matrix.rows,
            edges: nnz,
            max_nodes: MAX_NODES,
            max_edges: MAX_EDGES,
        });
    }

    if matrix.row_ptr.len() != matrix.rows + 1 {
        return Err(ValidationError::DimensionMismatch(format!(
            "row_ptr length {} does not equal rows + 1 = {}",
            matrix.row_ptr.len(),
            matrix.rows + 1,
        )));
    }

    if matrix.row_ptr[0] != 0 || matrix.row_ptr[matrix.rows] != nnz {
        return Err(ValidationError::DimensionMismatch(format!(
            "row_ptr spans {}..{} but there are {} values",
            matrix.row_ptr[0], matrix.row_ptr[matrix.rows], nnz,
        )));
    }

    if matrix.row_ptr.windows(2).any(|w| w[1] < w[0]) {
        return Err(ValidationError::DimensionMismatch(
            "row_ptr is not monotonically non-decreasing".into(),
        ));
    }

    if matrix.col_indices.len() != nnz {
        return Err(ValidationError::DimensionMismatch(format!(
            "col_indices length {} does not match values length {}",
            matrix.col_indices.len(),
            nnz,
        )));
    }

    for (row, col, value) in matrix.triplets() {
        if col >= matrix.cols {
            return Err(ValidationError::IndexOutOfBounds {
                index: col,
                nodes: matrix.cols,
            });
        }
        if !value.is_finite() {
            return Err(ValidationError::NonFiniteValue(format!(
                "A[{row}, {col}] = {value}"
            )));
        }
        if value < 0.0 {
            return Err(ValidationError::NegativeWeight { row, col, value });
        }
    }

    Ok(())
}

/// Validate that a dense matrix given as rows is square and non-empty.
pub fn validate_dense_shape(rows: &[Vec<f64>]) -> Result<usize, ValidationError> {
    let n = rows.len();
    if n == 0 {
        return Err(ValidationError::EmptyNetwork);
    }
    if n > MAX_NODES {
        return Err(ValidationError::TooLarge {
            nodes: n,
            edges: 0,
            max_nodes: MAX_NODES,
            max_edges: MAX_EDGES,
        });
    }
    if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != n) {
        return Err(ValidationError::DimensionMismatch(format!(
            "adjacency matrix must be square: row {i} has {} entries, expected {n}",
            row.len(),
        )));
    }
    Ok(n)
}

// ---------------------------------------------------------------------------
// Parameter validation
// ---------------------------------------------------------------------------

/// Require `value` to be finite and strictly positive.
pub fn require_positive(name: &str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ValidationError::ParameterOutOfRange {
            name: name.into(),
            value: value.to_string(),
            expected: "positive finite value".into(),
        });
    }
    Ok(())
}

/// Require `value` to be finite and non-negative.
pub fn require_non_negative(name: &str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::ParameterOutOfRange {
            name: name.into(),
            value: value.to_string(),
            expected: "non-negative finite value".into(),
        });
    }
    Ok(())
}

/// Require `value` to be finite (any sign).
pub fn require_finite(name: &str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::ParameterOutOfRange {
            name: name.into(),
            value: value.to_string(),
            expected: "finite value".into(),
        });
    }
    Ok(())
}

/// Validate a right-hand-side vector against the expected system size.
pub fn validate_rhs(rhs: &[f64], expected_len: usize) -> Result<(), ValidationError> {
    if rhs.len() != expected_len {
        return Err(ValidationError::DimensionMismatch(format!(
            "rhs length {} does not match expected {}",
            rhs.len(),
            expected_len,
        )));
    }
    if let Some((i, v)) = rhs.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(ValidationError::NonFiniteValue(format!("rhs[{i}] = {v}")));
    }
    Ok(())
}

/// Validate that a system matrix is square and matches the RHS.
pub fn validate_system(matrix: &CsrMatrix, rhs: &[f64]) -> Result<(), ValidationError> {
    if matrix.rows != matrix.cols {
        return Err(ValidationError::DimensionMismatch(format!(
            "system matrix must be square but got {}x{}",
            matrix.rows, matrix.cols,
        )));
    }
    if matrix.row_ptr.len() != matrix.rows + 1 {
        return Err(ValidationError::DimensionMismatch(format!(
            "row_ptr length {} does not equal rows + 1 = {}",
            matrix.row_ptr.len(),
            matrix.rows + 1,
        )));
    }
    validate_rhs(rhs, matrix.rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_weighted_adjacency_with_self_loops() {
        let m = CsrMatrix::from_coo(3, 3, vec![(0, 0, 1.0), (0, 1, 2.5), (2, 1, 4.0)]);
        assert!(validate_adjacency(&m).is_ok());
    }

    #[test]
    fn rejects_non_square() {
        let m = CsrMatrix::from_coo(2, 3, vec![(0, 2, 1.0)]);
        let err = validate_adjacency(&m).unwrap_err();
        assert!(matches!(err, ValidationError::DimensionMismatch(_)));
    }

    #[test]
    fn rejects_empty() {
        let m = CsrMatrix::from_coo(0, 0, Vec::new());
        assert!(matches!(
            validate_adjacency(&m),
            Err(ValidationError::EmptyNetwork)
        ));
    }

    #[test]
    fn rejects_negative_weight() {
        let m = CsrMatrix::from_coo(2, 2, vec![(1, 0, -0.5)]);
        match validate_adjacency(&m) {
            Err(ValidationError::NegativeWeight { row, col, .. }) => {
                assert_eq!((row, col), (1, 0));
            }
            other => panic!("expected NegativeWeight, got {other:?}"),
        }
    }

    #[test]
    fn rejects_nan_weight() {
        let m = CsrMatrix::from_coo(2, 2, vec![(0, 1, f64::NAN)]);
        assert!(matches!(
            validate_adjacency(&m),
            Err(ValidationError::NonFiniteValue(_))
        ));
    }

    #[test]
    fn rejects_broken_row_ptr() {
        let m = CsrMatrix {
            row_ptr: vec![0, 2, 1],
            col_indices: vec![0],
            values: vec![1.0],
            rows: 2,
            cols: 2,
        };
        assert!(validate_adjacency(&m).is_err());
    }

    #[test]
    fn dense_shape_checks_every_row() {
        let ok = vec![vec![0.0, 1.0], vec![1.0, 0.0]];
        assert_eq!(validate_dense_shape(&ok).unwrap(), 2);

        let ragged = vec![vec![0.0, 1.0], vec![1.0]];
        assert!(validate_dense_shape(&ragged).is_err());
        assert!(validate_dense_shape(&[]).is_err());
    }

    #[test]
    fn parameter_checks() {
        assert!(require_positive("beta", 1.0).is_ok());
        assert!(require_positive("beta", 0.0).is_err());
        assert!(require_positive("beta", f64::INFINITY).is_err());
        assert!(require_non_negative("alpha", 0.0).is_ok());
        assert!(require_non_negative("alpha", -1e-9).is_err());
        assert!(require_finite("l0", -3.0).is_ok());
        assert!(require_finite("l0", f64::NAN).is_err());
    }

    #[test]
    fn rhs_checks_length_and_finiteness() {
        assert!(validate_rhs(&[1.0, 2.0], 2).is_ok());
        assert!(validate_rhs(&[1.0], 2).is_err());
        assert!(validate_rhs(&[1.0, f64::INFINITY], 2).is_err());
    }
}
