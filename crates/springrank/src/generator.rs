//! Planted-score network generator.
//!
//! Samples a directed multigraph from the SpringRank generative model:
//!
//! 1. `s_i ~ Normal(l0, 1 / sqrt(alpha * beta))` for every node.
//! 2. `Z = sum_{i,j} exp(-beta/2 (s_i - s_j - l1)^2)` over all ordered pairs,
//!    self-pairs included.
//! 3. `c = K N / Z`, so the expected total weight is `K N`.
//! 4. `A_ij ~ Poisson(c exp(-beta/2 (s_i - s_j - l1)^2))` for every ordered
//!    pair in row-major order; positive draws become edges.
//!
//! The random source is injected by the caller and advanced sequentially:
//! `N` normal draws, then one Poisson draw per ordered pair with a positive
//! rate. Identical parameters and RNG state therefore give identical
//! networks. Work is `O(N^2)` by construction.

use rand::Rng;
use rand_distr::{Distribution, Normal, Poisson};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{SpringRankError, ValidationError};
use crate::network::{NetworkBuilder, PlantedNetwork};
use crate::validation::{require_finite, require_positive, MAX_NODES};

/// Parameters of the planted model.
///
/// # Example
///
/// ```rust
/// use springrank::generator::PlantedConfig;
///
/// let config = PlantedConfig::new(100, 1.0, 1.0, 5.0).with_rest_lengths(0.0, 2.0);
/// assert_eq!(config.l1, 2.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantedConfig {
    /// Number of nodes `N`.
    pub n: usize,
    /// Inverse temperature; larger values give cleaner hierarchies.
    pub beta: f64,
    /// Prior precision of the scores (together with `beta`).
    pub alpha: f64,
    /// Target average out-degree `K = E / N`.
    pub k: f64,
    /// Prior mean of the scores.
    ///
    /// Default: `0.5`.
    pub l0: f64,
    /// Preferred score gap along an edge.
    ///
    /// Default: `1.0`.
    pub l1: f64,
}

impl PlantedConfig {
    /// Configuration with default rest lengths (`l0 = 0.5`, `l1 = 1.0`).
    pub fn new(n: usize, beta: f64, alpha: f64, k: f64) -> Self {
        Self {
            n,
            beta,
            alpha,
            k,
            l0: 0.5,
            l1: 1.0,
        }
    }

    /// Replace both rest lengths.
    pub fn with_rest_lengths(mut self, l0: f64, l1: f64) -> Self {
        self.l0 = l0;
        self.l1 = l1;
        self
    }

    /// Standard deviation of the planted scores, `1 / sqrt(alpha * beta)`.
    #[inline]
    pub fn score_std(&self) -> f64 {
        1.0 / (self.alpha * self.beta).sqrt()
    }

    /// Check every parameter.
    ///
    /// # Errors
    ///
    /// [`SpringRankError::InvalidInput`] if `n < 1`, `n` exceeds
    /// [`MAX_NODES`], `beta`, `alpha` or `k` is not positive and finite, or
    /// a rest length is non-finite.
    pub fn validate(&self) -> Result<(), SpringRankError> {
        if self.n == 0 {
            return Err(ValidationError::EmptyNetwork.into());
        }
        if self.n > MAX_NODES {
            return Err(ValidationError::ParameterOutOfRange {
                name: "n".into(),
                value: self.n.to_string(),
                expected: format!("1..={MAX_NODES}"),
            }
            .into());
        }
        require_positive("beta", self.beta)?;
        require_positive("alpha", self.alpha)?;
        require_positive("k", self.k)?;
        require_finite("l0", self.l0)?;
        require_finite("l1", self.l1)?;
        Ok(())
    }
}

/// Generator for planted SpringRank networks.
#[derive(Debug, Clone)]
pub struct NetworkGenerator {
    config: PlantedConfig,
}

impl NetworkGenerator {
    /// Validate `config` and build a generator.
    ///
    /// # Errors
    ///
    /// See [`PlantedConfig::validate`].
    pub fn new(config: PlantedConfig) -> Result<Self, SpringRankError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Return the active configuration.
    #[inline]
    pub fn config(&self) -> &PlantedConfig {
        &self.config
    }

    /// Step 1: draw one score per node.
    fn sample_scores<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Vec<f64>, SpringRankError> {
        let normal = Normal::new(self.config.l0, self.config.score_std())
            .map_err(|e| SpringRankError::Distribution(e.to_string()))?;
        Ok((0..self.config.n).map(|_| normal.sample(rng)).collect())
    }

    /// `H_ij = 1/2 (s_i - s_j - l1)^2`.
    #[inline]
    fn pair_energy(&self, si: f64, sj: f64) -> f64 {
        let gap = si - sj - self.config.l1;
        0.5 * gap * gap
    }

    /// Steps 2 and 3: normalizer `Z` and the sparsity constant `c = K N / Z`.
    fn sparsity_constant(&self, scores: &[f64]) -> Result<f64, SpringRankError> {
        let beta = self.config.beta;
        let z: f64 = scores
            .iter()
            .map(|&si| {
                scores
                    .iter()
                    .map(|&sj| (-beta * self.pair_energy(si, sj)).exp())
                    .sum::<f64>()
            })
            .sum();

        if !(z.is_finite() && z > 0.0) {
            return Err(SpringRankError::NumericalInstability {
                iteration: 0,
                detail: format!("pair normalizer Z = {z:.3e}; beta * l1^2 too large"),
            });
        }

        let c = self.config.k * self.config.n as f64 / z;
        debug!(z, c, "planted network: sparsity constant");
        Ok(c)
    }

    /// Sample a network.
    ///
    /// # Errors
    ///
    /// [`SpringRankError::NumericalInstability`] if every pair weight
    /// underflows, or [`SpringRankError::Distribution`] if a sampler rejects
    /// its parameters.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<PlantedNetwork, SpringRankError> {
        let scores = self.sample_scores(rng)?;
        let c = self.sparsity_constant(&scores)?;
        let beta = self.config.beta;

        let mut builder = NetworkBuilder::new(scores.clone());
        for (i, &si) in scores.iter().enumerate() {
            for (j, &sj) in scores.iter().enumerate() {
                let lambda = c * (-beta * self.pair_energy(si, sj)).exp();
                // Poisson(0) is degenerate; skip the draw rather than sample it.
                if !(lambda > 0.0) {
                    continue;
                }
                let poisson = Poisson::new(lambda)
                    .map_err(|e| SpringRankError::Distribution(e.to_string()))?;
                let a_ij = poisson.sample(rng) as u64;
                builder.add_edge(i, j, a_ij)?;
            }
        }

        let network = builder.build();
        info!(
            nodes = network.node_count(),
            edges = network.edge_count(),
            total_weight = network.total_weight(),
            "planted network generated"
        );
        Ok(network)
    }
}

/// One-shot convenience wrapper around [`NetworkGenerator`].
///
/// # Errors
///
/// See [`NetworkGenerator::new`] and [`NetworkGenerator::generate`].
pub fn planted_network<R: Rng + ?Sized>(
    config: &PlantedConfig,
    rng: &mut R,
) -> Result<PlantedNetwork, SpringRankError> {
    NetworkGenerator::new(config.clone())?.generate(rng)
}
