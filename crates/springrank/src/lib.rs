//! SpringRank: hierarchy inference and planted-network generation.
//!
//! Nodes of a directed, weighted network are modelled as particles joined by
//! springs. Each edge `i -> j` prefers `i` to sit `l1` above `j`; the
//! minimum-energy configuration is the SpringRank score vector. This crate
//! provides:
//!
//! | Component | Module | Role |
//! |-----------|--------|------|
//! | [`DegreeVectors`](degrees::DegreeVectors) | [`degrees`] | in/out strengths, `C = A + A^T` |
//! | [`SpringRank`](rank::SpringRank) | [`rank`] | assemble and solve `M r = B` |
//! | [`NetworkGenerator`](generator::NetworkGenerator) | [`generator`] | sample planted networks |
//! | [`SparseDirectSolver`](direct::SparseDirectSolver) | [`direct`] | sparse Gaussian elimination |
//! | [`BiCgStabSolver`](bicgstab::BiCgStabSolver) | [`bicgstab`] | iterative fallback |
//!
//! # Example
//!
//! ```rust
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//! use springrank::generator::{planted_network, PlantedConfig};
//! use springrank::metrics::spearman;
//! use springrank::rank::{springrank, RankConfig};
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let network = planted_network(&PlantedConfig::new(40, 2.0, 1.0, 6.0), &mut rng).unwrap();
//!
//! let config = RankConfig::new(1.0, 0.5, 1.0);
//! let result = springrank(&network.adjacency().unwrap(), &config).unwrap();
//! assert!(result.converged);
//!
//! let rho = spearman(&result.ranks, &network.scores()).unwrap();
//! assert!(rho > 0.5);
//! ```

pub mod adjacency;
pub mod bicgstab;
pub mod degrees;
pub mod direct;
pub mod error;
pub mod generator;
pub mod metrics;
pub mod network;
pub mod rank;
pub mod traits;
pub mod types;
pub mod validation;

pub use adjacency::AdjacencyMatrix;
pub use error::{SpringRankError, ValidationError};
pub use generator::{planted_network, NetworkGenerator, PlantedConfig};
pub use network::PlantedNetwork;
pub use rank::{springrank, RankConfig, RankResult, SolveMethod, SpringRank};
