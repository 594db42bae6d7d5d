//! Tests for building the cluster hierarchy.

mod common;

use std::io::Cursor;

use float_cmp::assert_approx_eq;
use hdbscan_star::{
    extraction::partition_from_hierarchy_csv,
    graph::{Edge, UndirectedGraph},
    hierarchy::HierarchyBuilder,
    propagation::{propagate_tree, Propagation},
    Constraint, FlatVec,
};
use test_case::test_case;

#[test]
fn two_blobs() -> Result<(), String> {
    let data = FlatVec::new_array(common::data_gen::two_line_blobs())?;
    let hierarchy = common::hierarchy(&data, 1, 1)?;
    let tree = &hierarchy.tree;

    assert_eq!(tree.len(), 3);
    let root = tree.root();
    assert!(root.birth_level().is_infinite());
    assert_approx_eq!(f64, root.death_level(), 98.0);
    assert_eq!(root.size(), 6);
    assert_eq!(root.children(), &[2, 3]);
    assert_approx_eq!(f64, root.stability(), 6.0 / 98.0);

    for (label, members) in [(2, [0, 1, 2]), (3, [3, 4, 5])] {
        let child = tree.get(label);
        assert_eq!(child.parent(), Some(1));
        assert_approx_eq!(f64, child.birth_level(), 98.0);
        assert_approx_eq!(f64, child.death_level(), 1.0);
        assert_eq!(child.size(), 3);
        assert_approx_eq!(f64, child.stability(), 3.0 * (1.0 - 1.0 / 98.0));
        for p in members {
            assert_eq!(hierarchy.last_clusters[p], label);
            assert_eq!(hierarchy.matrix.last_cluster(p), label);
            assert_eq!(hierarchy.matrix.label_at(p, 1.0), label);
        }
    }

    assert_eq!(hierarchy.matrix.densities(), &[98.0, 1.0, 0.0]);
    for p in 0..6 {
        assert_approx_eq!(f64, hierarchy.noise_levels[p], 1.0);
        assert_eq!(hierarchy.matrix.label_at(p, 98.0), 1);
        assert_eq!(hierarchy.matrix.label_at(p, 0.0), 0);
    }
    assert_eq!(hierarchy.matrix.order(), &[0, 1, 2, 3, 4, 5]);

    Ok(())
}

#[test]
fn nested_blobs() -> Result<(), String> {
    let data = FlatVec::new_array(common::data_gen::nested_line_blobs())?;
    let hierarchy = common::hierarchy(&data, 1, 1)?;
    let tree = &hierarchy.tree;

    assert_eq!(tree.len(), 5);
    assert_eq!(tree.root().children(), &[2, 3]);
    assert_eq!(tree.get(2).children(), &[4, 5]);
    assert_approx_eq!(f64, tree.get(2).birth_level(), 88.0);
    assert_approx_eq!(f64, tree.get(2).death_level(), 8.0);
    assert_approx_eq!(f64, tree.get(4).birth_level(), 8.0);
    assert_eq!(tree.leaves(), vec![3, 4, 5]);
    assert_eq!(tree.subtree(2), vec![2, 4, 5]);
    assert!(tree.is_ancestor_of(1, 5));
    assert!(!tree.is_ancestor_of(3, 5));

    for p in 0..3 {
        assert_eq!(hierarchy.matrix.label_at(p, 88.0), 1);
        assert_eq!(hierarchy.matrix.label_at(p, 8.0), 2);
        assert_eq!(hierarchy.matrix.label_at(p, 1.0), 4);
    }

    Ok(())
}

#[test_case(20, 4, 4, 1; "k4_m4")]
#[test_case(30, 2, 5, 2; "k2_m5")]
#[test_case(25, 6, 3, 3; "k6_m3")]
fn random_blobs_invariants(per_blob: usize, min_points: usize, min_cluster_size: usize, seed: u64) -> Result<(), String> {
    let centers = [vec![0.0, 0.0], vec![20.0, 0.0], vec![0.0, 20.0]];
    let data = FlatVec::new_array(common::data_gen::blobs(&centers, per_blob, 2.0, seed))?;
    let hierarchy = common::hierarchy(&data, min_points, min_cluster_size)?;
    let tree = &hierarchy.tree;
    let n = data.cardinality();

    assert_eq!(tree.root().size(), n);
    for cluster in tree.clusters() {
        assert!(cluster.death_level() <= cluster.birth_level());
        assert!(cluster.stability() >= 0.0);
        assert_eq!(cluster.num_points(), 0, "cluster {} still holds points", cluster.label());
        if let Some(parent) = cluster.parent() {
            assert!(cluster.size() >= min_cluster_size);
            assert_approx_eq!(f64, cluster.birth_level(), tree.get(parent).death_level());
            assert!(tree.get(parent).children().contains(&cluster.label()));
        }
        if cluster.has_children() {
            assert!(cluster.children().len() >= 2);
            let sizes = cluster.children().iter().map(|&c| tree.get(c).size()).sum::<usize>();
            assert!(sizes <= cluster.size());
        }
    }

    let densities = hierarchy.matrix.densities();
    assert!(densities.windows(2).all(|w| w[0] > w[1]));
    assert_approx_eq!(f64, densities[densities.len() - 1], 0.0);
    for p in 0..n {
        assert_eq!(hierarchy.matrix.label_at(p, densities[0]), 1);
        assert_eq!(hierarchy.matrix.label_at(p, 0.0), 0);
        assert!(hierarchy.noise_levels[p] > 0.0);
    }

    Ok(())
}

#[test]
fn constraint_counts() -> Result<(), String> {
    let data = FlatVec::new_array(common::data_gen::two_line_blobs())?;
    let constraints = [
        Constraint::must_link(0, 1),
        Constraint::must_link(3, 4),
        Constraint::cannot_link(0, 3),
    ];
    let hierarchy = HierarchyBuilder::new(1)?
        .with_constraints(&constraints)
        .build(common::sorted_mst(&data, 1, false)?)?;
    let tree = &hierarchy.tree;

    assert_eq!(tree.num_constraints(), 3);
    assert_eq!(tree.root().num_constraints_satisfied(), 4);
    assert_eq!(tree.get(2).num_constraints_satisfied(), 3);
    assert_eq!(tree.get(3).num_constraints_satisfied(), 3);

    let row = tree.csv_row(tree.get(2));
    assert_eq!(row.split(',').nth(4), Some("0.5"));

    Ok(())
}

/// The constraint score columns of a tree row.
fn score_columns(row: &str) -> Vec<String> {
    row.split(',').skip(4).take(2).map(ToString::to_string).collect()
}

#[test]
fn virtual_child_constraint_column() -> Result<(), String> {
    // Blobs at 0..=2 and 10..=12 join before point 9 at 50, which leaves
    // their parent as noise before the parent splits. Blob 100..=102 is
    // cut off first.
    let points = [0.0, 1.0, 2.0, 10.0, 11.0, 12.0, 100.0, 101.0, 102.0, 50.0];
    let data = FlatVec::new_array(points.into_iter().map(|x| vec![x]).collect())?;
    let constraints = [Constraint::cannot_link(9, 0), Constraint::cannot_link(9, 6)];
    let mut hierarchy = HierarchyBuilder::new(3)?
        .with_constraints(&constraints)
        .build(common::sorted_mst(&data, 1, false)?)?;

    let leaf = hierarchy.last_clusters[0];
    let parent = hierarchy.tree.get(leaf).parent().ok_or("leaf has no parent")?;
    assert_eq!(hierarchy.tree.get(parent).parent(), Some(1));
    assert_approx_eq!(f64, hierarchy.tree.get(parent).birth_level(), 50.0);
    assert_approx_eq!(f64, hierarchy.tree.get(parent).death_level(), 8.0);

    let before = hierarchy.tree.clusters().map(|c| hierarchy.tree.csv_row(c)).collect::<Vec<_>>();
    assert_eq!(score_columns(&hierarchy.tree.csv_row(hierarchy.tree.root())), ["0", "0"]);
    assert_eq!(score_columns(&hierarchy.tree.csv_row(hierarchy.tree.get(parent))), ["0.25", "0.5"]);
    assert_eq!(score_columns(&hierarchy.tree.csv_row(hierarchy.tree.get(leaf))), ["0.25", "0"]);

    propagate_tree(&mut hierarchy.tree, &Propagation::Supervised);
    let after = hierarchy.tree.clusters().map(|c| hierarchy.tree.csv_row(c)).collect::<Vec<_>>();
    assert_eq!(before, after);

    Ok(())
}

#[test]
fn out_of_range_constraints_are_ignored() -> Result<(), String> {
    let data = FlatVec::new_array(common::data_gen::two_line_blobs())?;
    let constraints = [Constraint::must_link(0, 1), Constraint::must_link(3, 40)];
    let hierarchy = HierarchyBuilder::new(1)?
        .with_constraints(&constraints)
        .build(common::sorted_mst(&data, 1, false)?)?;
    assert_eq!(hierarchy.tree.num_constraints(), 1);
    Ok(())
}

#[test]
fn hierarchy_rows() -> Result<(), String> {
    let data = FlatVec::new_array(common::data_gen::two_line_blobs())?;
    let mut rows = Vec::new();
    let hierarchy = HierarchyBuilder::new(1)?.build_with_writer(common::sorted_mst(&data, 1, false)?, &mut rows)?;

    let text = String::from_utf8(rows).map_err(|e| e.to_string())?;
    assert_eq!(text, "98,1,1,1,1,1,1\n1,2,2,2,3,3,3\n0,0,0,0,0,0,0\n");
    assert_eq!(hierarchy.tree.get(2).file_offset(), 15);
    assert_eq!(hierarchy.tree.get(3).file_offset(), 15);

    let mut reader = Cursor::new(text.into_bytes());
    let partition = partition_from_hierarchy_csv(&mut reader, &hierarchy.tree, &[2, 3])?;
    assert_eq!(partition, vec![2, 2, 2, 3, 3, 3]);

    Ok(())
}

#[test]
fn compact_rows() -> Result<(), String> {
    let data = FlatVec::new_array(common::data_gen::nested_line_blobs())?;
    let mut full = Vec::new();
    HierarchyBuilder::new(1)?.build_with_writer(common::sorted_mst(&data, 1, false)?, &mut full)?;
    let mut compact = Vec::new();
    let hierarchy = HierarchyBuilder::new(1)?
        .with_compact(true)
        .build_with_writer(common::sorted_mst(&data, 1, false)?, &mut compact)?;

    assert!(compact.len() <= full.len());
    let mut reader = Cursor::new(compact);
    let partition = partition_from_hierarchy_csv(&mut reader, &hierarchy.tree, &[3, 4, 5])?;
    assert_eq!(partition, vec![4, 4, 4, 5, 5, 5, 3, 3, 3]);

    Ok(())
}

#[test]
fn self_edges_keep_singletons() -> Result<(), String> {
    let data = FlatVec::new_array(common::data_gen::two_line_blobs())?;
    let mut rows = Vec::new();
    let hierarchy = HierarchyBuilder::new(1)?.build_with_writer(common::sorted_mst(&data, 1, true)?, &mut rows)?;
    let tree = &hierarchy.tree;

    // Zero core distances give zero-weight self-edges, so every point is a
    // cluster of its own between the blob level and density zero.
    assert_eq!(tree.len(), 9);
    assert_eq!(tree.leaves().len(), 6);
    assert_eq!(hierarchy.matrix.densities(), &[98.0, 1.0, 0.0]);
    for p in 0..data.cardinality() {
        assert_approx_eq!(f64, hierarchy.noise_levels[p], 0.0);
        let singleton = hierarchy.last_clusters[p];
        assert_eq!(tree.get(singleton).size(), 1);
        assert_eq!(hierarchy.matrix.label_at(p, 0.0), singleton);
    }

    let mut reader = Cursor::new(rows);
    let partition = partition_from_hierarchy_csv(&mut reader, tree, &tree.leaves())?;
    assert_eq!(partition, hierarchy.last_clusters);

    Ok(())
}

#[test]
fn rejects_bad_input() -> Result<(), String> {
    assert!(HierarchyBuilder::new(0).is_err());

    let unsorted = UndirectedGraph::new(2, vec![Edge::new(0, 1, 1.0)])?;
    assert!(HierarchyBuilder::new(1)?.build(unsorted).is_err());

    let mut empty = UndirectedGraph::new(0, Vec::new())?;
    empty.sort_by_weight_descending();
    assert!(HierarchyBuilder::new(1)?.build(empty).is_err());

    Ok(())
}
