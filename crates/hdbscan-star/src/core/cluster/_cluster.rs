//! A single cluster of the HDBSCAN* hierarchy.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// A cluster in the HDBSCAN* hierarchy.
///
/// A cluster is born at the density level at which it splits off its parent
/// and dies at the level at which its last point becomes noise or it splits
/// into child clusters. Density levels are mutual-reachability distances, so
/// they *decrease* over the lifetime of a cluster: `birth_level >= death_level`.
///
/// Clusters are referred to by their label. Label `0` is reserved for noise
/// and label `1` for the root, which covers every point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    /// The unique label of the cluster.
    pub(crate) label: usize,
    /// The label of the parent cluster, `None` for the root.
    pub(crate) parent: Option<usize>,
    /// The labels of the child clusters, in order of creation.
    pub(crate) children: Vec<usize>,
    /// The density level at which the cluster appears.
    pub(crate) birth_level: f64,
    /// The density level at which the cluster disappears.
    pub(crate) death_level: f64,
    /// The number of points at birth.
    pub(crate) size: usize,
    /// The number of points that have not yet been detached.
    pub(crate) num_points: usize,
    /// The excess of mass of the cluster.
    pub(crate) stability: f64,
    /// The points at birth, kept until the cluster is released.
    pub(crate) members: Option<BTreeSet<usize>>,
    /// Points that became noise out of this cluster since the last constraint count.
    pub(crate) virtual_child: BTreeSet<usize>,
    /// The number of constraint endpoints satisfied by this cluster.
    pub(crate) num_constraints_satisfied: usize,
    /// The number of cannot-link endpoints satisfied by points that fell out as noise.
    pub(crate) virtual_child_constraints_satisfied: usize,
    /// The byte offset of the first hierarchy row in which the cluster appears.
    pub(crate) file_offset: u64,
    /// The fraction of labeled-object groups captured by the cluster.
    pub(crate) consistency_index: f64,
    /// The value of the cluster under the last propagation policy.
    pub(crate) objective: f64,
    /// The sum of the stabilities of the selected descendants.
    pub(crate) propagated_stability: f64,
    /// The number of constraints satisfied by the selected descendants.
    pub(crate) propagated_num_constraints_satisfied: usize,
    /// The sum of the objectives of the selected descendants.
    pub(crate) propagated_objective: f64,
    /// The smallest death level among the cluster and its descendants.
    pub(crate) propagated_lowest_child_death_level: f64,
    /// The labels of the selected descendants.
    pub(crate) propagated_descendants: Vec<usize>,
    /// Class id to the number of labeled points in the subtree with that class.
    pub(crate) class_information: BTreeMap<usize, usize>,
}

impl Cluster {
    /// Creates a new cluster born at `birth_level` with the given points.
    pub(crate) fn new(label: usize, parent: Option<usize>, birth_level: f64, size: usize, members: Option<BTreeSet<usize>>) -> Self {
        Self {
            label,
            parent,
            children: Vec::new(),
            birth_level,
            death_level: 0.0,
            size,
            num_points: size,
            stability: 0.0,
            members,
            virtual_child: BTreeSet::new(),
            num_constraints_satisfied: 0,
            virtual_child_constraints_satisfied: 0,
            file_offset: 0,
            consistency_index: 0.0,
            objective: 0.0,
            propagated_stability: 0.0,
            propagated_num_constraints_satisfied: 0,
            propagated_objective: 0.0,
            propagated_lowest_child_death_level: f64::MAX,
            propagated_descendants: Vec::new(),
            class_information: BTreeMap::new(),
        }
    }

    /// Removes `count` points from the cluster at the given density `level`.
    ///
    /// Each removed point adds `1 / level - 1 / birth_level` to the
    /// stability. When the last point is removed, the cluster dies at `level`.
    ///
    /// # Panics
    ///
    /// - If more points are detached than the cluster holds.
    pub(crate) fn detach_points(&mut self, count: usize, level: f64) {
        assert!(
            count <= self.num_points,
            "Cluster {} cannot detach {count} points, it only has {}.",
            self.label,
            self.num_points
        );
        self.num_points -= count;
        #[allow(clippy::cast_precision_loss)]
        let mass = count as f64 * (level.recip() - self.birth_level.recip());
        self.stability += mass;

        if self.num_points == 0 {
            self.death_level = level;
        }
    }

    /// Records points that fell out of this cluster as noise.
    pub(crate) fn add_points_to_virtual_child(&mut self, points: &BTreeSet<usize>) {
        self.virtual_child.extend(points);
    }

    /// Whether the point fell out of this cluster as noise since the last release.
    pub(crate) fn virtual_child_contains(&self, point: usize) -> bool {
        self.virtual_child.contains(&point)
    }

    /// Forgets the noise points recorded since the last constraint count.
    pub(crate) fn release_virtual_child(&mut self) {
        self.virtual_child.clear();
    }

    /// Drops the transient member sets.
    ///
    /// Stability, constraint counts and indices are left untouched, so this
    /// may be called any number of times.
    pub fn release(&mut self) {
        self.members = None;
        self.virtual_child.clear();
    }

    /// The unique label of the cluster.
    #[must_use]
    pub const fn label(&self) -> usize {
        self.label
    }

    /// The label of the parent cluster, `None` for the root.
    #[must_use]
    pub const fn parent(&self) -> Option<usize> {
        self.parent
    }

    /// The labels of the child clusters.
    #[must_use]
    pub fn children(&self) -> &[usize] {
        &self.children
    }

    /// Whether the cluster has child clusters.
    #[must_use]
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// The density level at which the cluster appears. `+inf` for the root.
    #[must_use]
    pub const fn birth_level(&self) -> f64 {
        self.birth_level
    }

    /// The density level at which the cluster disappears.
    #[must_use]
    pub const fn death_level(&self) -> f64 {
        self.death_level
    }

    /// The number of points at birth.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// The number of points not yet detached. Zero once the tree is built.
    #[must_use]
    pub const fn num_points(&self) -> usize {
        self.num_points
    }

    /// The excess of mass of the cluster.
    #[must_use]
    pub const fn stability(&self) -> f64 {
        self.stability
    }

    /// The points at birth, or `None` for the root and released clusters.
    #[must_use]
    pub const fn members(&self) -> Option<&BTreeSet<usize>> {
        self.members.as_ref()
    }

    /// The number of constraint endpoints satisfied by this cluster.
    #[must_use]
    pub const fn num_constraints_satisfied(&self) -> usize {
        self.num_constraints_satisfied
    }

    /// The number of constraint endpoints satisfied by the selected descendants.
    #[must_use]
    pub const fn propagated_num_constraints_satisfied(&self) -> usize {
        self.propagated_num_constraints_satisfied
    }

    /// The byte offset of the first hierarchy row in which the cluster appears.
    #[must_use]
    pub const fn file_offset(&self) -> u64 {
        self.file_offset
    }

    /// The consistency index, `0` until computed.
    #[must_use]
    pub const fn consistency_index(&self) -> f64 {
        self.consistency_index
    }

    /// The value of the cluster under the last propagation policy.
    ///
    /// Under the mixed policy this is the mixed index.
    #[must_use]
    pub const fn objective(&self) -> f64 {
        self.objective
    }

    /// The sum of the stabilities of the selected descendants.
    #[must_use]
    pub const fn propagated_stability(&self) -> f64 {
        self.propagated_stability
    }

    /// The sum of the objectives of the selected descendants.
    #[must_use]
    pub const fn propagated_objective(&self) -> f64 {
        self.propagated_objective
    }

    /// The smallest death level among the cluster and its descendants.
    #[must_use]
    pub const fn propagated_lowest_child_death_level(&self) -> f64 {
        self.propagated_lowest_child_death_level
    }

    /// The labels of the descendants selected by propagation.
    #[must_use]
    pub fn propagated_descendants(&self) -> &[usize] {
        &self.propagated_descendants
    }

    /// Class id to the number of labeled points with that class in the subtree.
    #[must_use]
    pub const fn class_information(&self) -> &BTreeMap<usize, usize> {
        &self.class_information
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::Cluster;

    #[test]
    fn detach() {
        let mut c = Cluster::new(2, Some(1), 2.0, 3, None);
        c.detach_points(1, 1.0);
        assert_eq!(c.num_points(), 2);
        assert_approx_eq!(f64, c.stability(), 0.5);
        assert_approx_eq!(f64, c.death_level(), 0.0);

        c.detach_points(2, 0.5);
        assert_eq!(c.num_points(), 0);
        assert_approx_eq!(f64, c.stability(), 0.5 + 2.0 * 1.5);
        assert_approx_eq!(f64, c.death_level(), 0.5);
    }

    #[test]
    fn root_born_at_infinity() {
        let mut root = Cluster::new(1, None, f64::INFINITY, 2, None);
        root.detach_points(2, 4.0);
        assert_approx_eq!(f64, root.stability(), 0.5);

        let mut root = Cluster::new(1, None, f64::INFINITY, 1, None);
        root.detach_points(1, 0.0);
        assert!(root.stability().is_infinite());
    }

    #[test]
    #[should_panic(expected = "cannot detach")]
    fn detach_too_many() {
        let mut c = Cluster::new(2, Some(1), 2.0, 1, None);
        c.detach_points(2, 1.0);
    }

    #[test]
    fn release_is_idempotent() {
        let mut c = Cluster::new(2, Some(1), 2.0, 2, Some([3, 4].into_iter().collect()));
        c.detach_points(2, 1.0);
        c.consistency_index = 0.25;
        let stability = c.stability();

        c.release();
        c.release();
        assert!(c.members().is_none());
        assert_approx_eq!(f64, c.stability(), stability);
        assert_approx_eq!(f64, c.consistency_index(), 0.25);
    }
}
