//! K-Means clustering with k-means++ initialization.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const DEFAULT_MAX_ITER: usize = 100;

pub struct KMeans {
    k: usize,
    max_iter: usize,
    seed: Option<u64>,
    centroids: Vec<Vec<f64>>,
    assignments: Vec<usize>,
    iterations: usize,
    inertia: f64,
}

impl KMeans {
    pub fn new(k: usize) -> Self {
        Self {
            k: k.max(1),
            max_iter: DEFAULT_MAX_ITER,
            seed: None,
            centroids: Vec::new(),
            assignments: Vec::new(),
            iterations: 0,
            inertia: f64::INFINITY,
        }
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter.max(1);
        self
    }

    /// Fixes the initialization seed. Without one, each fit draws a fresh seed.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn fit(&mut self, data: &[Vec<f64>]) {
        self.iterations = 0;
        if data.is_empty() || data[0].is_empty() {
            self.centroids.clear();
            self.assignments.clear();
            self.inertia = 0.0;
            return;
        }

        // Not enough points for k groups: every point is its own cluster.
        if data.len() <= self.k {
            self.centroids = data.to_vec();
            self.assignments = (0..data.len()).collect();
            self.inertia = 0.0;
            return;
        }

        let n_features = data[0].len();
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::seed_from_u64(rand::random()),
        };

        self.centroids = self.init_centroids(data, &mut rng);
        self.assignments = vec![usize::MAX; data.len()];

        while self.iterations < self.max_iter {
            self.iterations += 1;

            let mut changed = false;
            for (i, sample) in data.iter().enumerate() {
                let c = self.nearest_centroid(sample);
                if self.assignments[i] != c {
                    self.assignments[i] = c;
                    changed = true;
                }
            }
            if !changed {
                break;
            }

            let mut sums = vec![vec![0.0; n_features]; self.k];
            let mut counts = vec![0usize; self.k];
            for (sample, &c) in data.iter().zip(&self.assignments) {
                counts[c] += 1;
                for (acc, &val) in sums[c].iter_mut().zip(sample) {
                    *acc += val;
                }
            }

            // Empty clusters keep their previous centroid.
            for (c, count) in counts.into_iter().enumerate() {
                if count > 0 {
                    self.centroids[c] = sums[c].iter().map(|s| s / count as f64).collect();
                }
            }
        }

        self.inertia = data
            .iter()
            .zip(&self.assignments)
            .map(|(sample, &c)| distance_squared(sample, &self.centroids[c]))
            .sum();
    }

    fn init_centroids(&self, data: &[Vec<f64>], rng: &mut StdRng) -> Vec<Vec<f64>> {
        let mut centroids = Vec::with_capacity(self.k);
        centroids.push(data[rng.random_range(0..data.len())].clone());

        while centroids.len() < self.k {
            let distances: Vec<f64> = data
                .iter()
                .map(|sample| {
                    centroids
                        .iter()
                        .map(|c| distance_squared(sample, c))
                        .fold(f64::INFINITY, f64::min)
                })
                .collect();

            let total: f64 = distances.iter().sum();
            if total <= 0.0 {
                // All remaining points coincide with a centroid.
                centroids.push(centroids[centroids.len() - 1].clone());
                continue;
            }

            let target = rng.random::<f64>() * total;
            let mut cumsum = 0.0;
            let mut chosen = data.len() - 1;
            for (i, &d) in distances.iter().enumerate() {
                cumsum += d;
                if cumsum >= target && d > 0.0 {
                    chosen = i;
                    break;
                }
            }
            centroids.push(data[chosen].clone());
        }

        centroids
    }

    /// Ties go to the lowest centroid index.
    fn nearest_centroid(&self, sample: &[f64]) -> usize {
        let mut best = 0;
        let mut best_dist = f64::INFINITY;
        for (i, c) in self.centroids.iter().enumerate() {
            let d = distance_squared(sample, c);
            if d < best_dist {
                best = i;
                best_dist = d;
            }
        }
        best
    }

    pub fn labels(&self) -> &[usize] {
        &self.assignments
    }

    pub fn centroids(&self) -> &[Vec<f64>] {
        &self.centroids
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn inertia(&self) -> f64 {
        self.inertia
    }
}

fn distance_squared(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
