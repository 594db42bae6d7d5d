//! End-to-end tests of the HDBSCAN* runner.

mod common;

use std::{collections::BTreeMap, io::Cursor};

use hdbscan_star::{
    extraction::{partition_from_hierarchy_csv, ExtractionMode},
    metric::{Cosine, Euclidean, Manhattan},
    propagation::Propagation,
    Constraint, CoreDistanceKind, FlatVec, Hdbscan, HdbscanParams, Metric,
};
use test_case::test_case;

fn blob_data(per_blob: usize, seed: u64) -> Result<FlatVec<Vec<f64>>, String> {
    let centers = [vec![0.0, 0.0, 0.0], vec![25.0, 0.0, 0.0], vec![0.0, 25.0, 25.0]];
    FlatVec::new_array(common::data_gen::blobs(&centers, per_blob, 1.5, seed))
}

#[test_case(CoreDistanceKind::Knn, 4, 4; "knn")]
#[test_case(CoreDistanceKind::Knn, 8, 10; "knn_large")]
#[test_case(CoreDistanceKind::AllPoints, 1, 5; "all_points")]
fn finds_blobs(kind: CoreDistanceKind, min_points: usize, min_cluster_size: usize) -> Result<(), String> {
    let data = blob_data(40, 3)?;
    let params = HdbscanParams::default()
        .with_min_points(min_points)
        .with_min_cluster_size(min_cluster_size)
        .with_core_distance(kind);
    let result = Hdbscan::new(params)?.fit(&data, &Euclidean, None, None)?;

    let n = data.cardinality();
    assert_eq!(result.core_distances.len(), n);
    assert_eq!(result.partition.len(), n);
    assert_eq!(result.outlier_scores.len(), n);
    assert_eq!(result.noise_levels.len(), n);
    assert!(result.mst.is_sorted());
    assert!(!result.infinite_stability);
    assert!(result.tree.is_propagated());

    // Selected clusters never mix blobs, and every blob has some clustered point.
    let per_blob = (0..3)
        .map(|b| common::distinct_labels(&result.partition[b * 40..(b + 1) * 40]))
        .collect::<Vec<_>>();
    for (i, a) in per_blob.iter().enumerate() {
        assert!(!a.is_empty());
        for b in &per_blob[i + 1..] {
            assert!(a.iter().all(|l| !b.contains(l)));
        }
    }

    // Every selected label is a cluster of the tree, and no two selected
    // clusters are nested.
    let selected = common::distinct_labels(&result.partition);
    for &a in &selected {
        assert!(result.tree.try_get(a).is_some());
        for &b in &selected {
            assert!(a == b || !result.tree.is_ancestor_of(a, b));
        }
    }

    Ok(())
}

#[test]
fn parallel_matches_serial() -> Result<(), String> {
    let data = FlatVec::new_array(common::data_gen::tabular(1_000, 2, 9))?;
    let params = HdbscanParams::default().with_min_points(5).with_min_cluster_size(10);
    let hdbscan = Hdbscan::new(params)?;

    // 1000 points run in parallel, the first 999 serially.
    let parallel = hdbscan.fit(&data, &Euclidean, None, None)?;
    let core = hdbscan_star::core_distance::knn_core_distances(&data, &Euclidean, 5)?;
    assert_eq!(parallel.core_distances, core);

    let mut serial_mst = hdbscan_star::graph::prim_mst(&data, &Euclidean, &core, false)?;
    serial_mst.sort_by_weight_descending();
    assert_eq!(parallel.mst.edges(), serial_mst.edges());
    Ok(())
}

#[test]
fn other_metrics() -> Result<(), String> {
    let data = blob_data(20, 8)?;
    let params = HdbscanParams::default();
    let hdbscan = Hdbscan::new(params)?;

    let manhattan = hdbscan.fit(&data, &Manhattan, None, None)?;
    assert_eq!(manhattan.partition.len(), data.cardinality());

    let boxed = hdbscan_star::metric::from_name::<Vec<f64>>("supremum")?;
    assert_eq!(boxed.name(), "supremum");
    let supremum = hdbscan.fit(&data, &boxed, None, None)?;
    assert_eq!(supremum.partition.len(), data.cardinality());

    let positive = FlatVec::new_array(common::data_gen::tabular(50, 4, 1))?;
    let cosine = hdbscan.fit(&positive, &Cosine, None, None)?;
    assert!(cosine.outlier_scores.iter().all(|s| (0.0..=1.0).contains(&s.score)));

    Ok(())
}

#[test]
fn degenerate_data() -> Result<(), String> {
    let data = FlatVec::new_array(vec![vec![1.0, 1.0]; 5])?;
    let params = HdbscanParams::default().with_min_points(2).with_min_cluster_size(2);
    let result = Hdbscan::new(params)?.fit(&data, &Euclidean, None, None)?;

    assert!(result.infinite_stability);
    assert!(result.tree.has_infinite_stability());
    assert!(result.outlier_scores.iter().all(|s| s.score == 0.0));
    Ok(())
}

#[test]
fn released_tree() -> Result<(), String> {
    let data = blob_data(10, 2)?;
    let mut result = Hdbscan::new(HdbscanParams::default())?.fit(&data, &Euclidean, None, None)?;
    assert!(result.tree.clusters().all(|c| c.members().is_none()));

    // Releasing again is harmless.
    result.tree.release_all();
    assert!(result.tree.clusters().all(|c| c.members().is_none()));
    Ok(())
}

#[test]
fn hierarchy_file_reproduces_partition() -> Result<(), String> {
    let data = blob_data(30, 12)?;
    for compact in [false, true] {
        let params = HdbscanParams::default().with_compact(compact);
        let mut rows = Vec::new();
        let result = Hdbscan::new(params)?.fit_with_writer(&data, &Euclidean, None, None, &mut rows)?;

        let selected = result.tree.root().propagated_descendants().to_vec();
        let mut reader = Cursor::new(rows);
        let from_file = partition_from_hierarchy_csv(&mut reader, &result.tree, &selected)?;
        assert_eq!(from_file, result.partition);
    }
    Ok(())
}

#[test]
fn semi_supervised_and_constraints() -> Result<(), String> {
    let data = FlatVec::new_array(common::data_gen::nested_line_blobs())?;
    let params = HdbscanParams::default()
        .with_min_points(1)
        .with_min_cluster_size(1)
        .with_propagation(Propagation::Supervised);

    let constraints = [Constraint::must_link(0, 3)];
    let supervised = Hdbscan::new(params.clone())?.fit(&data, &Euclidean, Some(&constraints), None)?;
    assert_eq!(supervised.partition, vec![2, 2, 2, 2, 2, 2, 3, 3, 3]);

    let labeled = [(0, 0), (3, 0), (6, 1)].into_iter().collect::<BTreeMap<_, _>>();
    let mixed = Hdbscan::new(params.clone().with_propagation(Propagation::Mixed { alpha: 0.0 }))?.fit(
        &data,
        &Euclidean,
        None,
        Some(&labeled),
    )?;
    assert_eq!(mixed.partition, vec![2, 2, 2, 2, 2, 2, 3, 3, 3]);

    let labeled = [(0, 0), (6, 1)].into_iter().collect::<BTreeMap<_, _>>();
    let semi = Hdbscan::new(
        params
            .with_propagation(Propagation::Unsupervised)
            .with_semi_supervised(Some(ExtractionMode::ClassBased)),
    )?
    .fit(&data, &Euclidean, None, Some(&labeled))?;
    assert_eq!(semi.partition, vec![2, 2, 2, 2, 2, 2, 3, 3, 3]);

    Ok(())
}

#[test_case(0, 4; "zero_min_points")]
#[test_case(4, 0; "zero_min_cluster_size")]
fn invalid_params(min_points: usize, min_cluster_size: usize) {
    let params = HdbscanParams::default()
        .with_min_points(min_points)
        .with_min_cluster_size(min_cluster_size);
    assert!(Hdbscan::new(params).is_err());
}

#[test]
fn invalid_alpha() {
    let params = HdbscanParams::default().with_propagation(Propagation::Mixed { alpha: 2.0 });
    assert!(Hdbscan::new(params).is_err());
}
