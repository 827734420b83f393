//! K-means clustering over cosine distance
//!
//! Centroids are seeded k-means++ style from a seeded ChaCha generator, so a
//! given window always clusters the same way. Points are assigned to the
//! centroid with the highest cosine similarity and centroids are recomputed
//! as the L2-normalized mean of their members.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::curator::types::{CurationError, Result};
use crate::embedding::{cosine_similarity, normalized_mean};

/// Default seed for centroid sampling
pub const DEFAULT_SEED: u64 = 42;

/// Default cap on refinement rounds
pub const DEFAULT_MAX_ITERATIONS: usize = 20;

/// Cluster assignment for a set of points
#[derive(Debug, Clone, PartialEq)]
pub struct Clustering {
    /// Cluster index for each input point
    pub assignments: Vec<usize>,
    /// One unit-length centroid per cluster
    pub centroids: Vec<Vec<f32>>,
}

impl Clustering {
    /// Treat every point as a member of one cluster centred on their mean
    pub fn single(points: &[&[f32]]) -> Self {
        Self {
            assignments: vec![0; points.len()],
            centroids: vec![normalized_mean(points.iter().copied())],
        }
    }

    pub fn k(&self) -> usize {
        self.centroids.len()
    }

    /// Indices of the points assigned to `cluster`
    pub fn members(&self, cluster: usize) -> impl Iterator<Item = usize> + '_ {
        self.assignments
            .iter()
            .enumerate()
            .filter(move |(_, a)| **a == cluster)
            .map(|(i, _)| i)
    }
}

/// Cosine k-means with deterministic k-means++ seeding
#[derive(Debug, Clone)]
pub struct KMeans {
    k: usize,
    max_iterations: usize,
    seed: u64,
}

impl KMeans {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            seed: DEFAULT_SEED,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Cluster `points` into `k` groups.
    ///
    /// Fails when there are no points, when `k` is zero, or when `k` exceeds
    /// the number of points.
    pub fn fit(&self, points: &[&[f32]]) -> Result<Clustering> {
        let n = points.len();
        if n == 0 {
            return Err(CurationError::Clustering("no points to cluster".to_string()));
        }
        if self.k == 0 || self.k > n {
            return Err(CurationError::Clustering(format!(
                "cannot form {} clusters from {} points",
                self.k, n
            )));
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut centroids = self.seed_centroids(points, &mut rng);
        let mut assignments = vec![usize::MAX; n];

        for round in 0..self.max_iterations {
            let mut changed = false;
            for (i, point) in points.iter().enumerate() {
                let nearest = nearest_centroid(point, &centroids);
                if assignments[i] != nearest {
                    assignments[i] = nearest;
                    changed = true;
                }
            }

            if !changed {
                debug!("K-means converged after {} rounds (k={}, n={})", round, self.k, n);
                break;
            }

            for (cluster, centroid) in centroids.iter_mut().enumerate() {
                let members = points
                    .iter()
                    .zip(&assignments)
                    .filter(|(_, a)| **a == cluster)
                    .map(|(p, _)| *p);
                let mean = normalized_mean(members);
                // Empty clusters keep their previous centroid
                if !mean.is_empty() {
                    *centroid = mean;
                }
            }
        }

        Ok(Clustering {
            assignments,
            centroids,
        })
    }

    /// Pick `k` starting centroids, k-means++ style.
    ///
    /// The first centroid is uniform at random. Each further centroid is
    /// drawn with probability proportional to the squared cosine distance of
    /// a point to its nearest chosen centroid.
    fn seed_centroids(&self, points: &[&[f32]], rng: &mut ChaCha8Rng) -> Vec<Vec<f32>> {
        let n = points.len();
        let mut centroids: Vec<Vec<f32>> = Vec::with_capacity(self.k);
        centroids.push(points[rng.gen_range(0..n)].to_vec());

        let mut weights = vec![0.0_f32; n];
        for _ in 1..self.k {
            let mut total = 0.0_f32;
            for (weight, point) in weights.iter_mut().zip(points) {
                let nearest = centroids
                    .iter()
                    .map(|c| 1.0 - cosine_similarity(point, c))
                    .fold(f32::INFINITY, f32::min);
                *weight = nearest * nearest;
                total += *weight;
            }

            let threshold = rng.gen_range(0.0_f32..1.0) * total;
            let mut cumulative = 0.0_f32;
            let mut chosen = None;
            for (i, weight) in weights.iter().enumerate() {
                cumulative += weight;
                if cumulative > threshold {
                    chosen = Some(i);
                    break;
                }
            }

            let index = chosen.unwrap_or_else(|| rng.gen_range(0..n));
            centroids.push(points[index].to_vec());
        }

        centroids
    }
}

/// Index of the centroid most similar to `point`; ties go to the lower index
fn nearest_centroid(point: &[f32], centroids: &[Vec<f32>]) -> usize {
    let mut best = 0;
    let mut best_similarity = f32::NEG_INFINITY;
    for (i, centroid) in centroids.iter().enumerate() {
        let similarity = cosine_similarity(point, centroid);
        if similarity > best_similarity {
            best_similarity = similarity;
            best = i;
        }
    }
    best
}
