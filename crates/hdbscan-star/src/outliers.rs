//! GLOSH outlier scores.
//!
//! A point that becomes noise at density level `eps`, out of a cluster whose
//! densest part dies at `eps_max`, gets the score `1 - eps_max / eps`. Points
//! in the core of a cluster score close to `0`, isolated points close to `1`.

use serde::{Deserialize, Serialize};

use crate::ClusterTree;

/// The outlier score of a point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutlierScore {
    /// The score, in `[0, 1]`.
    pub score: f64,
    /// The core distance of the point, kept for reporting.
    pub core_distance: f64,
    /// The index of the point.
    pub id: usize,
}

/// Computes the outlier score of every point, sorted by ascending score.
///
/// Points with equal scores keep their index order. A point whose noise
/// level is `0` scores `0`.
///
/// # Errors
///
/// - If the per-point slices do not all have one entry per point.
///
/// # Panics
///
/// - If the tree has not been propagated.
/// - If a last cluster is not a cluster label.
pub fn outlier_scores(
    tree: &ClusterTree,
    noise_levels: &[f64],
    last_clusters: &[usize],
    core_distances: &[f64],
) -> Result<Vec<OutlierScore>, String> {
    assert!(
        tree.is_propagated(),
        "The cluster tree must be propagated before computing outlier scores."
    );
    let n = tree.num_points();
    if noise_levels.len() != n || last_clusters.len() != n || core_distances.len() != n {
        return Err(format!(
            "Expected {n} noise levels, last clusters and core distances, got {}, {} and {}.",
            noise_levels.len(),
            last_clusters.len(),
            core_distances.len()
        ));
    }

    let mut scores = noise_levels
        .iter()
        .zip(last_clusters)
        .zip(core_distances)
        .enumerate()
        .map(|(id, ((&eps, &last), &core_distance))| {
            let eps_max = tree.get(last).propagated_lowest_child_death_level();
            let score = if eps == 0.0 { 0.0 } else { 1.0 - eps_max / eps };
            OutlierScore {
                score,
                core_distance,
                id,
            }
        })
        .collect::<Vec<_>>();

    scores.sort_by(|a, b| a.score.total_cmp(&b.score));
    Ok(scores)
}
