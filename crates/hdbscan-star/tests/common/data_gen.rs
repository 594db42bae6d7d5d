//! Data generation utilities for testing.

use rand::{rngs::StdRng, Rng, SeedableRng};

/// Two dense, evenly spaced 1-d blobs far apart: `0, 1, 2` and `100, 101, 102`.
pub fn two_line_blobs() -> Vec<Vec<f64>> {
    [0.0, 1.0, 2.0, 100.0, 101.0, 102.0].into_iter().map(|x| vec![x]).collect()
}

/// Three 1-d blobs where the first two are close: `A = 0..=2`, `B = 10..=12`
/// and `C = 100..=102`, in that order.
pub fn nested_line_blobs() -> Vec<Vec<f64>> {
    [0.0, 1.0, 2.0, 10.0, 11.0, 12.0, 100.0, 101.0, 102.0]
        .into_iter()
        .map(|x| vec![x])
        .collect()
}

/// Two 1-d blobs and a point halfway between them, at index 6.
pub fn line_blobs_with_outlier() -> Vec<Vec<f64>> {
    [0.0, 1.0, 2.0, 100.0, 101.0, 102.0, 50.0].into_iter().map(|x| vec![x]).collect()
}

/// Gaussian-ish blobs of `per_blob` points around each center.
pub fn blobs(centers: &[Vec<f64>], per_blob: usize, spread: f64, seed: u64) -> Vec<Vec<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    centers
        .iter()
        .flat_map(|c| {
            (0..per_blob)
                .map(|_| c.iter().map(|&x| x + rng.gen_range(-spread..spread)).collect::<Vec<_>>())
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Uniformly random points in the unit hypercube.
pub fn tabular(car: usize, dim: usize, seed: u64) -> Vec<Vec<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..car)
        .map(|_| (0..dim).map(|_| rng.gen_range(0.0..1.0)).collect())
        .collect()
}
