//! Tests for saving and loading the outputs of a run.

#![cfg(feature = "disk-io")]

mod common;

use hdbscan_star::{
    graph::UndirectedGraph, hierarchy::HierarchyMatrix, metric::Euclidean, ClusterTree, DiskIO, FlatVec, Hdbscan,
    HdbscanParams,
};

#[test]
fn round_trip() -> Result<(), String> {
    let data = FlatVec::new_array(common::data_gen::nested_line_blobs())?;
    let params = HdbscanParams::default().with_min_points(1).with_min_cluster_size(1);
    let result = Hdbscan::new(params)?.fit(&data, &Euclidean, None, None)?;

    let tmp_dir = tempdir::TempDir::new("hdbscan-disk-io").map_err(|e| e.to_string())?;

    let tree_path = tmp_dir.path().join("tree.shm");
    result.tree.write_to(&tree_path)?;
    let tree = ClusterTree::read_from(&tree_path)?;
    assert_eq!(tree.len(), result.tree.len());
    assert!(tree.is_propagated());
    for (a, b) in tree.clusters().zip(result.tree.clusters()) {
        assert_eq!(a.label(), b.label());
        assert_eq!(a.parent(), b.parent());
        assert_eq!(a.children(), b.children());
        assert_eq!(a.birth_level().to_bits(), b.birth_level().to_bits());
        assert_eq!(a.stability().to_bits(), b.stability().to_bits());
        assert_eq!(a.propagated_descendants(), b.propagated_descendants());
    }

    let mst_path = tmp_dir.path().join("mst.mst");
    result.mst.write_to(&mst_path)?;
    let mst = UndirectedGraph::read_from(&mst_path)?;
    assert!(mst.is_sorted());
    assert_eq!(mst.edges(), result.mst.edges());

    let matrix_path = tmp_dir.path().join("matrix.bin");
    result.matrix.write_to(&matrix_path)?;
    let matrix = HierarchyMatrix::read_from(&matrix_path)?;
    assert_eq!(matrix.densities(), result.matrix.densities());
    assert_eq!(matrix.order(), result.matrix.order());

    assert!(ClusterTree::read_from(&tmp_dir.path().join("missing.shm")).is_err());

    Ok(())
}
