//! Core distances, the per-point density estimates of HDBSCAN*.
//!
//! The core distance of a point is small where the data are dense. Two
//! estimates are offered:
//!
//! - k-NN: the distance to the `(min_points - 1)`-th nearest *other* point, so
//!   that a point together with its neighbors makes `min_points` points.
//! - all-points: a parameter-free harmonic-style mean over all other points,
//!   `(sum_q (1 / d(p, q))^dim / (n - 1))^(-1 / dim)`.
//!
//! Every function has a `par_` twin computing the same values with `rayon`.

use rayon::prelude::*;

use crate::{core::metric::ParMetric, FlatVec, Metric};

/// Computes the k-NN core distance of every point.
///
/// With `min_points == 1` every core distance is zero. A point with fewer
/// than `min_points - 1` other points gets an infinite core distance.
///
/// # Errors
///
/// - If `min_points` is zero.
pub fn knn_core_distances<I, M: Metric<I, f64>>(
    data: &FlatVec<I>,
    metric: &M,
    min_points: usize,
) -> Result<Vec<f64>, String> {
    let k = check_min_points(min_points)?;
    let n = data.cardinality();
    let core_distances = (0..n)
        .map(|p| kth_smallest(others(n, p).map(|q| metric.distance(data.get(p), data.get(q))), k))
        .collect::<Vec<_>>();
    Ok(warn_degenerate(core_distances))
}

/// Parallel version of [`knn_core_distances`](knn_core_distances).
///
/// # Errors
///
/// See [`knn_core_distances`](knn_core_distances).
pub fn par_knn_core_distances<I: Send + Sync, M: ParMetric<I, f64>>(
    data: &FlatVec<I>,
    metric: &M,
    min_points: usize,
) -> Result<Vec<f64>, String> {
    let k = check_min_points(min_points)?;
    let n = data.cardinality();
    let core_distances = (0..n)
        .into_par_iter()
        .map(|p| kth_smallest(others(n, p).map(|q| metric.par_distance(data.get(p), data.get(q))), k))
        .collect::<Vec<_>>();
    Ok(warn_degenerate(core_distances))
}

/// Computes k-NN core distances from precomputed neighbor lists.
///
/// `neighbors[p]` holds `(index, distance)` pairs of the nearest other points
/// of `p`. The lists need not be sorted and may include `p` itself, which is
/// ignored.
///
/// # Errors
///
/// - If `min_points` is zero.
/// - If a neighbor list is shorter than `min_points - 1`.
pub fn core_distances_from_neighbors(neighbors: &[Vec<(usize, f64)>], min_points: usize) -> Result<Vec<f64>, String> {
    let k = check_min_points(min_points)?;
    neighbors
        .iter()
        .enumerate()
        .map(|(p, list)| {
            let distances = list.iter().filter(|&&(q, _)| q != p).map(|&(_, d)| d).collect::<Vec<_>>();
            if distances.len() < k {
                Err(format!(
                    "Point {p} has {} neighbors but min_points = {min_points} needs {k}.",
                    distances.len()
                ))
            } else {
                Ok(kth_smallest(distances.into_iter(), k))
            }
        })
        .collect::<Result<Vec<_>, _>>()
        .map(warn_degenerate)
}

/// Computes the all-points core distance of every point.
///
/// No parameter is needed; the dimensionality of the dataset is the exponent
/// of the density kernel. A single point has a core distance of zero.
pub fn all_points_core_distances<I, M: Metric<I, f64>>(data: &FlatVec<I>, metric: &M) -> Vec<f64> {
    weighted_all_points_core_distances(data, metric, |_, _| 1.0)
}

/// Parallel version of [`all_points_core_distances`](all_points_core_distances).
pub fn par_all_points_core_distances<I: Send + Sync, M: ParMetric<I, f64>>(data: &FlatVec<I>, metric: &M) -> Vec<f64> {
    par_weighted_all_points_core_distances(data, metric, |_, _| 1.0)
}

/// Computes the all-points core distance with every pairwise distance
/// multiplied by `weight(p, q)` first.
pub fn weighted_all_points_core_distances<I, M, W>(data: &FlatVec<I>, metric: &M, weight: W) -> Vec<f64>
where
    M: Metric<I, f64>,
    W: Fn(usize, usize) -> f64,
{
    let (n, dim) = (data.cardinality(), data.dimensionality());
    let core_distances = (0..n)
        .map(|p| {
            let distances = others(n, p).map(|q| metric.distance(data.get(p), data.get(q)) * weight(p, q));
            all_points_mean(distances, n, dim)
        })
        .collect::<Vec<_>>();
    warn_degenerate(core_distances)
}

/// Parallel version of [`weighted_all_points_core_distances`](weighted_all_points_core_distances).
pub fn par_weighted_all_points_core_distances<I, M, W>(data: &FlatVec<I>, metric: &M, weight: W) -> Vec<f64>
where
    I: Send + Sync,
    M: ParMetric<I, f64>,
    W: Fn(usize, usize) -> f64 + Send + Sync,
{
    let (n, dim) = (data.cardinality(), data.dimensionality());
    let core_distances = (0..n)
        .into_par_iter()
        .map(|p| {
            let distances = others(n, p).map(|q| metric.par_distance(data.get(p), data.get(q)) * weight(p, q));
            all_points_mean(distances, n, dim)
        })
        .collect::<Vec<_>>();
    warn_degenerate(core_distances)
}

/// Returns the number of other points a k-NN core distance looks at.
fn check_min_points(min_points: usize) -> Result<usize, String> {
    if min_points == 0 {
        Err("min_points must be at least 1.".to_string())
    } else {
        Ok(min_points - 1)
    }
}

/// The indices `0..n` without `p`.
fn others(n: usize, p: usize) -> impl Iterator<Item = usize> {
    (0..n).filter(move |&q| q != p)
}

/// The `k`-th smallest distance (1-based), `0` for `k == 0` and `+inf` if
/// there are fewer than `k` distances.
fn kth_smallest(distances: impl Iterator<Item = f64>, k: usize) -> f64 {
    if k == 0 {
        return 0.0;
    }
    let mut distances = distances.collect::<Vec<_>>();
    if distances.len() < k {
        return f64::INFINITY;
    }
    let (_, &mut kth, _) = distances.select_nth_unstable_by(k - 1, f64::total_cmp);
    kth
}

/// The all-points density kernel.
#[allow(clippy::cast_precision_loss)]
fn all_points_mean(distances: impl Iterator<Item = f64>, n: usize, dim: usize) -> f64 {
    if n < 2 {
        return 0.0;
    }
    let dim = dim as f64;
    let sum = distances.map(|d| d.recip().powf(dim)).sum::<f64>();
    (sum / (n - 1) as f64).powf(-dim.recip())
}

/// The number of zero and of non-finite core distances.
fn degenerate_counts(core_distances: &[f64]) -> (usize, usize) {
    let zeros = core_distances.iter().filter(|&&d| d == 0.0).count();
    let non_finite = core_distances.iter().filter(|d| !d.is_finite()).count();
    (zeros, non_finite)
}

/// Logs a warning if some core distances are zero or not finite.
fn warn_degenerate(core_distances: Vec<f64>) -> Vec<f64> {
    let (zeros, non_finite) = degenerate_counts(&core_distances);
    if zeros > 0 {
        ftlog::warn!("{zeros} points have a core distance of zero, cluster stabilities may be infinite.");
    }
    if non_finite > 0 {
        ftlog::warn!("{non_finite} points have a non-finite core distance.");
    }
    core_distances
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::{degenerate_counts, knn_core_distances, kth_smallest};
    use crate::{metric::Euclidean, FlatVec};

    #[test]
    fn kth() {
        let distances = [4.0, 1.0, 3.0, 2.0];
        assert_approx_eq!(f64, kth_smallest(distances.into_iter(), 0), 0.0);
        assert_approx_eq!(f64, kth_smallest(distances.into_iter(), 1), 1.0);
        assert_approx_eq!(f64, kth_smallest(distances.into_iter(), 3), 3.0);
        assert!(kth_smallest(distances.into_iter(), 5).is_infinite());
    }

    #[test]
    fn all_duplicates_are_degenerate() -> Result<(), String> {
        let data = FlatVec::new_array(vec![vec![1.0]; 3])?;
        let core_distances = knn_core_distances(&data, &Euclidean, 2)?;
        assert_eq!(degenerate_counts(&core_distances), (3, 0));
        assert_eq!(degenerate_counts(&[0.0, 1.0, f64::INFINITY]), (1, 1));
        Ok(())
    }
}
