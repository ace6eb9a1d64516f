use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::pointcloud::PointCloud;

/// Default number of points kept by [`PointCloudSampler`].
pub const DEFAULT_TARGET_POINTS: usize = 100_000;

/// Error types for the sampling module.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SamplingError {
    /// The target number of points must be strictly positive.
    #[error("Invalid target number of points: {0}. It must be greater than zero")]
    InvalidTarget(usize),
}

/// Parameters for random point cloud downsampling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Maximum number of points kept after sampling.
    pub target_points: usize,
    /// Optional fixed seed for reproducible sampling.
    pub seed: Option<u64>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            target_points: DEFAULT_TARGET_POINTS,
            seed: None,
        }
    }
}

/// Reduces a point cloud to a bounded number of points by uniform random selection without
/// replacement.
#[derive(Debug, Clone)]
pub struct PointCloudSampler {
    target_points: usize,
    seed: Option<u64>,
}

impl PointCloudSampler {
    /// Create a sampler keeping at most `target_points` points.
    ///
    /// Fails with [`SamplingError::InvalidTarget`] when `target_points` is zero.
    pub fn new(target_points: usize) -> Result<Self, SamplingError> {
        if target_points == 0 {
            return Err(SamplingError::InvalidTarget(target_points));
        }
        Ok(Self {
            target_points,
            seed: None,
        })
    }

    /// Create a sampler from its configuration.
    pub fn from_config(config: &SamplerConfig) -> Result<Self, SamplingError> {
        let sampler = Self::new(config.target_points)?;
        Ok(match config.seed {
            Some(seed) => sampler.with_seed(seed),
            None => sampler,
        })
    }

    /// Fix the seed of the random source so that repeated calls draw the same sample.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// The maximum number of points kept by this sampler.
    #[inline]
    pub fn target_points(&self) -> usize {
        self.target_points
    }

    /// Downsample the point cloud.
    ///
    /// Uses a [`StdRng`] seeded with the configured seed, or the thread-local generator
    /// when no seed was given.
    pub fn sample(&self, pointcloud: &PointCloud) -> PointCloud {
        match self.seed {
            Some(seed) => self.sample_with_rng(pointcloud, &mut StdRng::seed_from_u64(seed)),
            None => self.sample_with_rng(pointcloud, &mut rand::rng()),
        }
    }

    /// Downsample the point cloud drawing indices from the given random source.
    ///
    /// If the point cloud holds at most `target_points` points it is returned unchanged.
    /// Otherwise exactly `target_points` distinct points are selected, kept in their original
    /// relative order, with their colors and normals.
    pub fn sample_with_rng<R: Rng + ?Sized>(
        &self,
        pointcloud: &PointCloud,
        rng: &mut R,
    ) -> PointCloud {
        let num_points = pointcloud.len();
        if num_points <= self.target_points {
            log::info!("Kept {} points", num_points);
            return pointcloud.clone();
        }

        let indices = sample_indices(num_points, self.target_points, rng);
        log::info!("Downsampled from {} to {}", num_points, indices.len());

        pointcloud.select_by_index(&indices)
    }
}

/// Draw `amount` distinct indices uniformly at random from `[0, length)`.
///
/// The indices are returned in ascending order. When `amount >= length` all indices are
/// returned.
pub fn sample_indices<R: Rng + ?Sized>(length: usize, amount: usize, rng: &mut R) -> Vec<usize> {
    if amount >= length {
        return (0..length).collect();
    }
    let mut indices = rand::seq::index::sample(rng, length, amount).into_vec();
    indices.sort_unstable();
    indices
}
