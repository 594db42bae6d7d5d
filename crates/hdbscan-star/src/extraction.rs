//! Flat partitions extracted from a propagated cluster tree.
//!
//! Every function returns one label per point, `0` meaning noise.

use std::{
    collections::{BTreeMap, BTreeSet, VecDeque},
    io::{Read, Seek, SeekFrom},
};

use serde::{Deserialize, Serialize};

use crate::{
    hierarchy::HierarchyMatrix,
    propagation::{propagate_sub_tree, Propagation},
    ClusterTree,
};

/// How semi-supervised extraction treats clusters under the class-pure frontier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExtractionMode {
    /// Refine every frontier cluster with unsupervised FOSC below it.
    #[default]
    ClassAgnostic,
    /// Keep the frontier clusters that hold exactly one class.
    ClassBased,
}

/// The FOSC partition: the clusters selected at the root by propagation.
///
/// # Panics
///
/// - If the tree has not been propagated.
#[must_use]
pub fn fosc_partition(tree: &ClusterTree, matrix: &HierarchyMatrix) -> Vec<usize> {
    assert!(
        tree.is_propagated(),
        "The cluster tree must be propagated before extracting a partition."
    );
    partition_from_clusters(tree, matrix, tree.root().propagated_descendants())
}

/// Labels every point with the selected cluster that holds it, if any.
///
/// Each cluster is looked up at the first recorded level after its birth,
/// i.e. the first level at which it holds its points. The root is looked up
/// at the first level.
#[must_use]
pub fn partition_from_clusters(tree: &ClusterTree, matrix: &HierarchyMatrix, selected: &[usize]) -> Vec<usize> {
    let mut by_level = BTreeMap::<usize, BTreeSet<usize>>::new();
    for &label in selected {
        let cluster = tree.get(label);
        let level = if cluster.parent().is_none() {
            Some(0)
        } else {
            matrix.level_index_of(cluster.birth_level()).map(|i| i + 1)
        };
        match level {
            Some(level) => {
                by_level.entry(level).or_default().insert(label);
            }
            None => ftlog::warn!("Cluster {label} was born at an unrecorded level and is skipped."),
        }
    }

    let mut labels = vec![0; matrix.num_points()];
    for (level, clusters) in by_level {
        let Some(&density) = matrix.densities().get(level) else {
            continue;
        };
        for (point, label) in labels.iter_mut().enumerate() {
            let l = matrix.label_at(point, density);
            if clusters.contains(&l) {
                *label = l;
            }
        }
    }
    labels
}

/// Extracts a partition guided by a few labeled points.
///
/// The classes of the labeled points are propagated from the last cluster of
/// each point up to the root. Starting from the root, clusters that mix
/// several classes are replaced by their children; the others form the
/// frontier, which is then resolved according to `mode`.
///
/// # Errors
///
/// - If no point is labeled.
/// - If a labeled point is out of range.
pub fn semi_supervised_partition(
    tree: &mut ClusterTree,
    matrix: &HierarchyMatrix,
    labeled: &BTreeMap<usize, usize>,
    mode: ExtractionMode,
) -> Result<Vec<usize>, String> {
    if labeled.is_empty() {
        return Err("Semi-supervised extraction needs at least one labeled point.".to_string());
    }
    if let Some(&p) = labeled.keys().find(|&&p| p >= matrix.num_points()) {
        return Err(format!("Labeled point {p} is out of range."));
    }

    for cluster in tree.clusters_mut() {
        cluster.class_information.clear();
    }
    for (&point, &class) in labeled {
        let mut current = Some(matrix.last_cluster(point));
        while let Some(label) = current {
            let cluster = tree.get_mut(label);
            *cluster.class_information.entry(class).or_insert(0) += 1;
            current = cluster.parent;
        }
    }

    let mut frontier = Vec::new();
    let mut queue = VecDeque::from([1]);
    while let Some(label) = queue.pop_front() {
        let cluster = tree.get(label);
        if cluster.class_information().len() > 1 && cluster.has_children() {
            queue.extend(cluster.children());
        } else {
            frontier.push(label);
        }
    }

    let selected = match mode {
        ExtractionMode::ClassAgnostic => {
            let mut selected = Vec::new();
            for label in frontier {
                if tree.get(label).has_children() {
                    propagate_sub_tree(tree, label, &Propagation::Unsupervised);
                    selected.extend_from_slice(tree.get(label).propagated_descendants());
                } else {
                    selected.push(label);
                }
            }
            selected
        }
        ExtractionMode::ClassBased => frontier
            .into_iter()
            .filter(|&l| tree.get(l).class_information().len() == 1)
            .collect(),
    };

    Ok(partition_from_clusters(tree, matrix, &selected))
}

/// Reproduces a partition from a written hierarchy file.
///
/// For every selected cluster, the row at the cluster's recorded file offset
/// is read and the points carrying the cluster's label there are assigned to
/// it.
///
/// # Errors
///
/// - If the reader cannot seek to an offset or read a row.
/// - If a row is malformed or has the wrong number of labels.
pub fn partition_from_hierarchy_csv<R: Read + Seek>(
    reader: &mut R,
    tree: &ClusterTree,
    selected: &[usize],
) -> Result<Vec<usize>, String> {
    let mut labels = vec![0; tree.num_points()];
    let mut record = csv::StringRecord::new();

    for &label in selected {
        reader
            .seek(SeekFrom::Start(tree.get(label).file_offset()))
            .map_err(|e| e.to_string())?;
        let found = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(&mut *reader)
            .read_record(&mut record)
            .map_err(|e| e.to_string())?;
        if !found {
            return Err(format!("No hierarchy row at offset {}.", tree.get(label).file_offset()));
        }

        let row = record
            .iter()
            .skip(1)
            .map(|l| l.parse::<usize>().map_err(|e| format!("Malformed hierarchy row: {e}")))
            .collect::<Result<Vec<_>, _>>()?;
        if row.len() != labels.len() {
            return Err(format!(
                "Hierarchy row at offset {} has {} labels, expected {}.",
                tree.get(label).file_offset(),
                row.len(),
                labels.len()
            ));
        }

        for (point, &l) in row.iter().enumerate() {
            if l == label {
                labels[point] = label;
            }
        }
    }

    Ok(labels)
}
