//! Integration tests for SpringRank inference.
//!
//! Covers residuals of the assembled systems, agreement with a dense
//! reference, energy optimality, shift invariance of the pinned branch,
//! idempotence and the degenerate-topology edge cases.

mod helpers;

use approx::assert_relative_eq;
use springrank::metrics::{energy, regularized_energy, spearman};
use springrank::rank::{springrank, RankConfig, SolveMethod, SpringRank};
use springrank::{AdjacencyMatrix, SpringRankError, ValidationError};

use std::time::{Duration, Instant};

use helpers::{
    dense_solve, init_tracing, l2_norm, max_offset_deviation, path_network,
    random_connected_network, random_sparse_network, relative_error,
};

// ---------------------------------------------------------------------------
// Residual and reference checks
// ---------------------------------------------------------------------------

#[test]
fn test_regularized_residual_is_small() {
    init_tracing();
    for seed in 0..5 {
        let a = random_connected_network(40, 0.08, seed);
        let solver = SpringRank::new(RankConfig::new(0.5, 1.0, 1.0)).unwrap();
        let system = solver.assemble(&a);
        let result = solver.solve(&a).unwrap();

        assert_eq!(result.method, SolveMethod::Direct);
        assert!(result.converged);
        let residual = system.residual_norm(&result.ranks);
        assert!(
            residual < 1e-9 * (1.0 + l2_norm(&system.rhs)),
            "seed {seed}: residual {residual:.3e}"
        );
    }
}

#[test]
fn test_matches_dense_reference() {
    let a = random_connected_network(25, 0.15, 7);
    for config in [RankConfig::new(2.0, 0.5, 1.0), RankConfig::new(0.0, 1.0, 1.5)] {
        let solver = SpringRank::new(config).unwrap();
        let system = solver.assemble(&a);
        let reference = dense_solve(&system.matrix, &system.rhs);
        let result = solver.solve(&a).unwrap();
        let err = relative_error(&result.ranks, &reference);
        assert!(err < 1e-8, "relative error vs dense solve: {err:.3e}");
    }
}

#[test]
fn test_output_is_aligned_with_input_order() {
    let a = path_network(6);
    let result = springrank(&a, &RankConfig::default()).unwrap();
    assert_eq!(result.len(), 6);
    assert_eq!(result.ordering(), vec![0, 1, 2, 3, 4, 5]);
    for i in 1..6 {
        assert_relative_eq!(result.ranks[i - 1] - result.ranks[i], 1.0, epsilon = 1e-9);
    }
}

#[test]
fn test_large_sparse_network_solves_within_seconds() {
    init_tracing();
    let a = random_sparse_network(5_000, 5.0, 31);
    let solver = SpringRank::new(RankConfig::new(1.0, 1.0, 1.0)).unwrap();
    let system = solver.assemble(&a);

    let start = Instant::now();
    let result = solver.solve(&a).unwrap();
    let elapsed = start.elapsed();

    assert!(result.converged);
    assert!(result.ranks.iter().all(|r| r.is_finite()));
    let residual = system.residual_norm(&result.ranks);
    assert!(
        residual < 1e-8 * (1.0 + l2_norm(&system.rhs)),
        "residual {residual:.3e}"
    );
    assert!(elapsed < Duration::from_secs(20), "took {elapsed:?}");
}

// ---------------------------------------------------------------------------
// Energy optimality
// ---------------------------------------------------------------------------

#[test]
fn test_regularized_ranks_minimize_energy() {
    let a = random_connected_network(20, 0.2, 3);
    let (alpha, l0, l1) = (0.7, 0.3, 1.2);
    let result = springrank(&a, &RankConfig::new(alpha, l0, l1)).unwrap();
    let base = regularized_energy(&a, &result.ranks, alpha, l0, l1).unwrap();

    for k in 0..a.node_count() {
        for delta in [-1e-3, 1e-3] {
            let mut perturbed = result.ranks.clone();
            perturbed[k] += delta;
            let e = regularized_energy(&a, &perturbed, alpha, l0, l1).unwrap();
            assert!(e >= base - 1e-12, "node {k}: {e} < {base}");
        }
    }
}

#[test]
fn test_pinned_ranks_minimize_unregularized_energy() {
    let a = random_connected_network(20, 0.2, 5);
    let pinned = springrank(&a, &RankConfig::default()).unwrap();
    let base = energy(&a, &pinned.ranks, 1.0).unwrap();

    let regularized = springrank(&a, &RankConfig::new(1e-2, 1.0, 1.0)).unwrap();
    assert!(base <= energy(&a, &regularized.ranks, 1.0).unwrap() + 1e-9);

    for k in 0..a.node_count() {
        let mut perturbed = pinned.ranks.clone();
        perturbed[k] += 1e-3;
        assert!(energy(&a, &perturbed, 1.0).unwrap() >= base - 1e-12);
    }
}

#[test]
fn test_pinned_matches_vanishing_regularization_up_to_shift() {
    let a = random_connected_network(30, 0.1, 11);
    let pinned = springrank(&a, &RankConfig::default()).unwrap();
    let weak = springrank(&a, &RankConfig::new(1e-7, 1.0, 1.0)).unwrap();
    let dev = max_offset_deviation(&pinned.ranks, &weak.ranks);
    assert!(dev < 1e-4, "deviation from constant shift: {dev:.3e}");
}

// ---------------------------------------------------------------------------
// Determinism
// ---------------------------------------------------------------------------

#[test]
fn test_repeated_solves_are_identical() {
    let a = random_connected_network(35, 0.1, 21);
    for config in [RankConfig::default(), RankConfig::new(1.0, 0.5, 1.0)] {
        let solver = SpringRank::new(config).unwrap();
        let first = solver.solve(&a).unwrap();
        let second = solver.solve(&a).unwrap();
        assert_eq!(first.ranks, second.ranks);
        assert_eq!(first.method, second.method);
        assert_eq!(first.ordering(), second.ordering());
    }
}

#[test]
fn test_unregularized_repeated_solves_agree_up_to_offset() {
    let a = random_connected_network(35, 0.1, 22);
    let first = springrank(&a, &RankConfig::default()).unwrap();
    let second = springrank(&a, &RankConfig::default()).unwrap();
    assert!(max_offset_deviation(&first.ranks, &second.ranks) < 1e-12);
    assert_relative_eq!(spearman(&first.ranks, &second.ranks).unwrap(), 1.0, epsilon = 1e-12);
}

// ---------------------------------------------------------------------------
// Boundary cases
// ---------------------------------------------------------------------------

#[test]
fn test_single_node() {
    let lonely = AdjacencyMatrix::from_dense(&[vec![0.0]]).unwrap();
    let looped = AdjacencyMatrix::from_dense(&[vec![3.0]]).unwrap();
    for a in [&lonely, &looped] {
        for config in [RankConfig::default(), RankConfig::new(1.0, 2.0, 1.0)] {
            let result = springrank(a, &config).unwrap();
            assert_eq!(result.len(), 1);
            assert!(result.ranks[0].is_finite());
        }
    }
    let result = springrank(&looped, &RankConfig::new(1.0, 2.0, 1.0)).unwrap();
    assert_relative_eq!(result.ranks[0], 2.0, epsilon = 1e-12);
}

#[test]
fn test_empty_network_is_invalid() {
    let err = AdjacencyMatrix::from_dense(&[]).unwrap_err();
    assert!(matches!(
        err,
        SpringRankError::InvalidInput(ValidationError::EmptyNetwork)
    ));
}

#[test]
fn test_non_square_and_negative_inputs_are_invalid() {
    let err = AdjacencyMatrix::from_dense(&[vec![0.0, 1.0]]).unwrap_err();
    assert!(matches!(err, SpringRankError::InvalidInput(_)));

    let err = AdjacencyMatrix::from_dense(&[vec![0.0, -1.0], vec![1.0, 0.0]]).unwrap_err();
    assert!(matches!(err, SpringRankError::InvalidInput(_)));
}

#[test]
fn test_isolated_node_regularized_sits_at_anchor() {
    // Node 1 has no edges at all.
    let a = AdjacencyMatrix::from_edges(4, vec![(0, 2, 1.0), (2, 3, 2.0), (3, 0, 1.0)]).unwrap();
    let result = springrank(&a, &RankConfig::new(0.5, 1.5, 1.0)).unwrap();
    assert!(result.ranks.iter().all(|r| r.is_finite()));
    assert_relative_eq!(result.ranks[1], 1.5, epsilon = 1e-12);
}

#[test]
fn test_isolated_node_unregularized_is_finite() {
    let a = AdjacencyMatrix::from_edges(4, vec![(0, 2, 1.0), (2, 3, 2.0), (3, 0, 1.0)]).unwrap();
    let result = springrank(&a, &RankConfig::default()).unwrap();
    assert_eq!(result.method, SolveMethod::Iterative);
    assert!(result.ranks.iter().all(|r| r.is_finite()));
}

#[test]
fn test_isolated_pinned_node_falls_back() {
    // The pinned node (last) is isolated, so pinning removes nothing.
    let a = AdjacencyMatrix::from_edges(3, vec![(0, 1, 1.0)]).unwrap();
    let result = springrank(&a, &RankConfig::default()).unwrap();
    assert_eq!(result.method, SolveMethod::Iterative);
    assert!(result.ranks.iter().all(|r| r.is_finite()));
    assert!(result.ranks[0] > result.ranks[1]);
}

#[test]
fn test_empty_edge_set_returns_anchor_or_zero() {
    let a = AdjacencyMatrix::from_edges(3, Vec::new()).unwrap();

    let regularized = springrank(&a, &RankConfig::new(2.0, 0.25, 1.0)).unwrap();
    for r in &regularized.ranks {
        assert_relative_eq!(*r, 0.25, epsilon = 1e-12);
    }

    let pinned = springrank(&a, &RankConfig::default()).unwrap();
    assert_eq!(pinned.method, SolveMethod::Iterative);
    assert!(pinned.converged);
    assert!(pinned.ranks.iter().all(|r| *r == 0.0));
}

#[test]
fn test_invalid_rank_parameters() {
    let a = path_network(3);
    for config in [
        RankConfig::new(-0.1, 1.0, 1.0),
        RankConfig::new(0.0, -1.0, 1.0),
        RankConfig::new(0.0, 1.0, 0.0),
        RankConfig::new(0.0, 1.0, 1.0).with_residual_threshold(0.0),
    ] {
        let err = springrank(&a, &config).unwrap_err();
        assert!(matches!(err, SpringRankError::InvalidInput(_)), "{config:?}");
    }
}
