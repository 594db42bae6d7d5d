//! The consistency index: how well a cluster agrees with labeled points.

use std::collections::{BTreeMap, BTreeSet};

use crate::{graph::UndirectedGraph, ClusterTree};

/// Computes the consistency index of every non-root cluster.
///
/// From each labeled point, the MST is explored in minimax order (always
/// following the lightest edge out of the explored region) until a point with
/// a different class is reached. The walk is then cut just before its
/// heaviest edge, leaving a group of points that the labels say belong
/// together, and the density level of that edge.
///
/// A cluster's consistency is the largest overlap between its points at birth
/// and any such group that was cut at or above the cluster's death level,
/// divided by the number of points.
///
/// `mst` must still hold all its edges: pass a clone taken before building
/// the hierarchy.
///
/// # Errors
///
/// - If a labeled point is not a vertex of the MST.
/// - If some non-root cluster has already been released.
#[allow(clippy::cast_precision_loss)]
pub fn consistency_indices(
    mst: &UndirectedGraph,
    tree: &mut ClusterTree,
    labeled: &BTreeMap<usize, usize>,
) -> Result<(), String> {
    let n = mst.num_vertices();
    if let Some(&p) = labeled.keys().find(|&&p| p >= n) {
        return Err(format!("Labeled point {p} is not in the MST."));
    }

    let groups = labeled
        .iter()
        .map(|(&start, &class)| reach(mst, labeled, start, class))
        .collect::<Vec<_>>();

    let mut indices = Vec::new();
    for cluster in tree.clusters().filter(|c| c.parent().is_some()) {
        let members = cluster
            .members()
            .ok_or_else(|| format!("Cluster {} has been released.", cluster.label()))?;
        let (birth, death) = (cluster.birth_level(), cluster.death_level());

        let overlap = groups
            .iter()
            .filter(|(level, _)| birth <= *level || (birth > *level && *level > death))
            .map(|(_, group)| group.intersection(members).count())
            .max()
            .unwrap_or(0);

        indices.push((cluster.label(), overlap as f64 / n as f64));
    }

    for (label, index) in indices {
        tree.get_mut(label).consistency_index = index;
    }
    Ok(())
}

/// Explores the MST from `start` until a point of another class is met.
///
/// Returns the heaviest edge weight on the kept walk and the kept points.
fn reach(mst: &UndirectedGraph, labeled: &BTreeMap<usize, usize>, start: usize, class: usize) -> (f64, BTreeSet<usize>) {
    let n = mst.num_vertices();
    let mut distances = vec![f64::MAX; n];
    let mut predecessors = vec![start; n];
    let mut visited = vec![false; n];
    let mut walk = Vec::new();

    let mut heaviest: Option<usize> = None;
    let mut max_level = 0.0;
    let mut conflict = false;

    distances[start] = 0.0;
    while let Some(next) = closest_unvisited(&distances, &visited) {
        visited[next] = true;
        walk.push(next);

        if next != start {
            let level = mst.weight_between(next, predecessors[next]).unwrap_or(distances[next]);
            if heaviest.is_none() || level > max_level {
                heaviest = Some(next);
                max_level = level;
            }
        }

        if labeled.get(&next).is_some_and(|&c| c != class) {
            conflict = true;
            break;
        }

        for (v, w) in mst.neighbors_with_weights(next) {
            if !visited[v] && w < distances[v] {
                distances[v] = w;
                predecessors[v] = next;
            }
        }
    }

    if conflict {
        while let Some(p) = walk.pop() {
            if Some(p) == heaviest {
                break;
            }
        }
    }

    (max_level, walk.into_iter().collect())
}

/// The unvisited vertex with the smallest finite tentative distance.
fn closest_unvisited(distances: &[f64], visited: &[bool]) -> Option<usize> {
    distances
        .iter()
        .enumerate()
        .filter(|&(v, &d)| !visited[v] && d < f64::MAX)
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(v, _)| v)
}
