//! The arena of clusters produced by the hierarchy builder.

use serde::{Deserialize, Serialize};

use super::Cluster;

/// The tree of clusters, stored as an arena indexed by label.
///
/// Slot `0` is always empty: label `0` is noise and never names a cluster.
/// Slot `1` is the root. Parents always have smaller labels than their
/// children.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterTree {
    /// The clusters, indexed by label.
    pub(crate) clusters: Vec<Option<Cluster>>,
    /// The number of points in the dataset.
    pub(crate) num_points: usize,
    /// The number of constraints used while building the tree.
    pub(crate) num_constraints: usize,
    /// Whether a propagation pass has been run.
    pub(crate) propagated: bool,
    /// Whether any cluster had infinite stability during the last propagation.
    pub(crate) infinite_stability: bool,
}

impl ClusterTree {
    /// Creates a tree holding only the root cluster over `num_points` points.
    pub(crate) fn new(num_points: usize, num_constraints: usize) -> Self {
        let root = Cluster::new(1, None, f64::INFINITY, num_points, None);
        Self {
            clusters: vec![None, Some(root)],
            num_points,
            num_constraints,
            propagated: false,
            infinite_stability: false,
        }
    }

    /// The next unused label.
    pub(crate) fn next_label(&self) -> usize {
        self.clusters.len()
    }

    /// Adds a new child cluster and returns its label.
    pub(crate) fn add_child(&mut self, parent: usize, birth_level: f64, members: std::collections::BTreeSet<usize>) -> usize {
        let label = self.next_label();
        let cluster = Cluster::new(label, Some(parent), birth_level, members.len(), Some(members));
        self.get_mut(parent).children.push(label);
        self.clusters.push(Some(cluster));
        label
    }

    /// Returns the cluster with the given label.
    ///
    /// # Panics
    ///
    /// - If the label is `0` (noise) or no cluster has the label.
    #[must_use]
    pub fn get(&self, label: usize) -> &Cluster {
        self.try_get(label)
            .unwrap_or_else(|| panic!("There is no cluster with label {label}."))
    }

    /// Returns the cluster with the given label, or `None` for noise and unknown labels.
    #[must_use]
    pub fn try_get(&self, label: usize) -> Option<&Cluster> {
        self.clusters.get(label).and_then(Option::as_ref)
    }

    /// Mutable version of [`get`](Self::get).
    ///
    /// # Panics
    ///
    /// - If the label is `0` (noise) or no cluster has the label.
    pub fn get_mut(&mut self, label: usize) -> &mut Cluster {
        self.clusters
            .get_mut(label)
            .and_then(Option::as_mut)
            .unwrap_or_else(|| panic!("There is no cluster with label {label}."))
    }

    /// The root cluster.
    #[must_use]
    pub fn root(&self) -> &Cluster {
        self.get(1)
    }

    /// All clusters, in label order.
    pub fn clusters(&self) -> impl Iterator<Item = &Cluster> {
        self.clusters.iter().flatten()
    }

    /// All clusters, mutably, in label order.
    pub(crate) fn clusters_mut(&mut self) -> impl Iterator<Item = &mut Cluster> {
        self.clusters.iter_mut().flatten()
    }

    /// The number of clusters, the root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clusters.len() - 1
    }

    /// Always `false`: a tree has at least its root.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// The number of points in the dataset.
    #[must_use]
    pub const fn num_points(&self) -> usize {
        self.num_points
    }

    /// The number of constraints the tree was built with.
    #[must_use]
    pub const fn num_constraints(&self) -> usize {
        self.num_constraints
    }

    /// Whether a propagation pass has been run.
    #[must_use]
    pub const fn is_propagated(&self) -> bool {
        self.propagated
    }

    /// Whether any cluster had infinite stability during the last propagation.
    ///
    /// This happens when points are duplicated, making some density level
    /// zero. Results remain usable but cluster scores are not comparable.
    #[must_use]
    pub const fn has_infinite_stability(&self) -> bool {
        self.infinite_stability
    }

    /// The labels of the leaves, in increasing order.
    #[must_use]
    pub fn leaves(&self) -> Vec<usize> {
        self.clusters().filter(|c| !c.has_children()).map(Cluster::label).collect()
    }

    /// The labels of `label` and all its descendants, in increasing order.
    #[must_use]
    pub fn subtree(&self, label: usize) -> Vec<usize> {
        let mut labels = vec![label];
        let mut frontier = vec![label];
        while let Some(l) = frontier.pop() {
            let children = self.get(l).children();
            labels.extend_from_slice(children);
            frontier.extend_from_slice(children);
        }
        labels.sort_unstable();
        labels
    }

    /// Whether `ancestor` is `label` or one of its ancestors.
    #[must_use]
    pub fn is_ancestor_of(&self, ancestor: usize, label: usize) -> bool {
        let mut current = Some(label);
        while let Some(l) = current {
            if l == ancestor {
                return true;
            }
            current = self.get(l).parent();
        }
        false
    }

    /// Drops the transient member sets of all clusters.
    pub fn release_all(&mut self) {
        self.clusters_mut().for_each(Cluster::release);
    }
}
