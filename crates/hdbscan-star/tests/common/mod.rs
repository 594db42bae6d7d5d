//! Shared helpers for the integration tests.

#![allow(dead_code)]

pub mod data_gen;

use hdbscan_star::{
    graph::{prim_mst, UndirectedGraph},
    hierarchy::{Hierarchy, HierarchyBuilder},
    metric::Euclidean,
    FlatVec,
};

/// Builds the sorted mutual-reachability MST of the data with k-NN core distances.
pub fn sorted_mst(data: &FlatVec<Vec<f64>>, min_points: usize, self_edges: bool) -> Result<UndirectedGraph, String> {
    let core_distances = hdbscan_star::core_distance::knn_core_distances(data, &Euclidean, min_points)?;
    let mut mst = prim_mst(data, &Euclidean, &core_distances, self_edges)?;
    mst.sort_by_weight_descending();
    Ok(mst)
}

/// Builds the hierarchy of the data with k-NN core distances.
pub fn hierarchy(data: &FlatVec<Vec<f64>>, min_points: usize, min_cluster_size: usize) -> Result<Hierarchy, String> {
    HierarchyBuilder::new(min_cluster_size)?.build(sorted_mst(data, min_points, false)?)
}

/// The distinct non-noise labels of a partition.
pub fn distinct_labels(partition: &[usize]) -> Vec<usize> {
    let mut labels = partition.iter().copied().filter(|&l| l != 0).collect::<Vec<_>>();
    labels.sort_unstable();
    labels.dedup();
    labels
}
