//! Evaluation helpers for inferred hierarchies.
//!
//! [`energy`] scores a rank vector under the SpringRank Hamiltonian and
//! [`spearman`] compares an inferred ranking with planted scores.

use crate::adjacency::AdjacencyMatrix;
use crate::error::{SpringRankError, ValidationError};

/// SpringRank energy `H(r) = 1/2 sum_ij A_ij (r_i - r_j - l1)^2`.
///
/// # Errors
///
/// [`SpringRankError::InvalidInput`] if `ranks.len()` differs from the node
/// count.
pub fn energy(adjacency: &AdjacencyMatrix, ranks: &[f64], l1: f64) -> Result<f64, SpringRankError> {
    check_len(ranks.len(), adjacency.node_count())?;
    Ok(adjacency
        .edges()
        .map(|(i, j, w)| {
            let gap = ranks[i] - ranks[j] - l1;
            0.5 * w * gap * gap
        })
        .sum())
}

/// Energy including the anchor term `alpha/2 sum_i (r_i - l0)^2`.
///
/// # Errors
///
/// Same as [`energy`].
pub fn regularized_energy(
    adjacency: &AdjacencyMatrix,
    ranks: &[f64],
    alpha: f64,
    l0: f64,
    l1: f64,
) -> Result<f64, SpringRankError> {
    let anchor: f64 = ranks.iter().map(|r| (r - l0) * (r - l0)).sum();
    Ok(energy(adjacency, ranks, l1)? + 0.5 * alpha * anchor)
}

/// Fractional ranks (1-based, ties share their average position).
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0f64; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // Positions start..end (0-based) share rank mean(start+1 ..= end).
        let shared = (start + end + 1) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = shared;
        }
        start = end;
    }
    ranks
}

/// Pearson correlation. Returns `0.0` when either input has zero variance.
///
/// # Errors
///
/// [`SpringRankError::InvalidInput`] on length mismatch or empty input.
pub fn pearson(x: &[f64], y: &[f64]) -> Result<f64, SpringRankError> {
    check_len(y.len(), x.len())?;
    if x.is_empty() {
        return Err(ValidationError::EmptyNetwork.into());
    }
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return Ok(0.0);
    }
    Ok(cov / (var_x.sqrt() * var_y.sqrt()))
}

/// Spearman rank correlation: Pearson correlation of [`average_ranks`].
///
/// # Errors
///
/// [`SpringRankError::InvalidInput`] on length mismatch or empty input.
pub fn spearman(x: &[f64], y: &[f64]) -> Result<f64, SpringRankError> {
    check_len(y.len(), x.len())?;
    pearson(&average_ranks(x), &average_ranks(y))
}

fn check_len(got: usize, expected: usize) -> Result<(), ValidationError> {
    if got != expected {
        return Err(ValidationError::DimensionMismatch(format!(
            "vector length {got} does not match {expected}"
        )));
    }
    Ok(())
}
