//! Propagating cluster scores bottom-up to select the best set of clusters.
//!
//! Every cluster compares its own objective against the sum of the best
//! selection among its descendants. The better of the two is handed up to the
//! parent. At the root, `propagated_descendants` is the optimal set of
//! non-overlapping clusters (FOSC).

mod consistency;
mod policy;

use std::collections::BTreeSet;

pub use consistency::consistency_indices;
pub use policy::Propagation;

pub(crate) use policy::constraint_ratio;

use crate::{utils, ClusterTree};

/// Propagates scores through the whole tree, leaves first.
///
/// Any previous propagation is discarded first. Policies that need
/// constraints fall back to [`Propagation::Unsupervised`] when the tree was
/// built without any.
///
/// Returns whether any cluster has infinite stability.
pub fn propagate_tree(tree: &mut ClusterTree, policy: &Propagation) -> bool {
    let policy = effective_policy(tree, policy);
    let labels = tree.clusters().map(crate::Cluster::label).collect::<Vec<_>>();
    reset(tree, &labels, &policy);

    let mut queue = tree.leaves().into_iter().collect::<BTreeSet<_>>();
    while let Some(label) = queue.pop_last() {
        if let Some(parent) = propagate_cluster(tree, label, &policy) {
            queue.insert(parent);
        }
    }

    let infinite = tree.clusters().any(|c| c.stability.is_infinite());
    if infinite {
        ftlog::warn!("{}", utils::INFINITE_STABILITY_WARNING);
    }
    tree.propagated = true;
    tree.infinite_stability = infinite;
    infinite
}

/// Propagates scores through the subtree rooted at `root`, stopping there.
///
/// Afterwards, the `propagated_descendants` of `root` are the best selection
/// strictly below it. Clusters outside the subtree are left untouched.
///
/// Returns whether any cluster in the subtree has infinite stability.
///
/// # Panics
///
/// - If `root` is not a cluster label.
pub fn propagate_sub_tree(tree: &mut ClusterTree, root: usize, policy: &Propagation) -> bool {
    let policy = effective_policy(tree, policy);
    let labels = tree.subtree(root);
    reset(tree, &labels, &policy);

    let mut queue = labels
        .iter()
        .copied()
        .filter(|&l| !tree.get(l).has_children())
        .collect::<BTreeSet<_>>();
    while let Some(label) = queue.pop_last() {
        if label == root {
            let cluster = tree.get_mut(root);
            if cluster.propagated_lowest_child_death_level == f64::MAX {
                cluster.propagated_lowest_child_death_level = cluster.death_level;
            }
            continue;
        }
        if let Some(parent) = propagate_cluster(tree, label, &policy) {
            queue.insert(parent);
        }
    }

    labels.iter().any(|&l| tree.get(l).stability.is_infinite())
}

/// Falls back to the unsupervised policy when constraints are needed but absent.
fn effective_policy(tree: &ClusterTree, policy: &Propagation) -> Propagation {
    if policy.uses_constraints() && tree.num_constraints() == 0 {
        ftlog::warn!(
            "The {} policy needs constraints but none were given, using unsupervised propagation.",
            policy.name()
        );
        Propagation::Unsupervised
    } else {
        *policy
    }
}

/// Clears the propagated fields of the given clusters and scores them.
fn reset(tree: &mut ClusterTree, labels: &[usize], policy: &Propagation) {
    // Stabilities are normalized by the most stable non-root cluster.
    let max_stability = utils::max_finite(tree.clusters().filter(|c| c.parent.is_some()).map(|c| c.stability))
        .filter(|&s| s > 0.0)
        .unwrap_or(1.0);
    let num_constraints = tree.num_constraints();

    for &label in labels {
        let cluster = tree.get_mut(label);
        cluster.objective = policy.objective(cluster, max_stability, num_constraints);
        cluster.propagated_objective = policy.noise_credit(cluster, num_constraints);
        cluster.propagated_stability = 0.0;
        cluster.propagated_num_constraints_satisfied = cluster.virtual_child_constraints_satisfied;
        cluster.propagated_lowest_child_death_level = f64::MAX;
        cluster.propagated_descendants.clear();
    }
}

/// Hands the better of a cluster and its descendants up to its parent.
///
/// Returns the label of the parent, if any.
fn propagate_cluster(tree: &mut ClusterTree, label: usize, policy: &Propagation) -> Option<usize> {
    let cluster = tree.get_mut(label);
    if cluster.propagated_lowest_child_death_level == f64::MAX {
        cluster.propagated_lowest_child_death_level = cluster.death_level;
    }
    let parent = cluster.parent?;

    let cluster = tree.get(label);
    let lowest_death_level = cluster.propagated_lowest_child_death_level;
    let (constraints, stability, objective, descendants) = if !cluster.has_children() || policy.prefers_cluster(cluster) {
        (
            cluster.num_constraints_satisfied,
            cluster.stability,
            cluster.objective,
            vec![label],
        )
    } else {
        (
            cluster.propagated_num_constraints_satisfied,
            cluster.propagated_stability,
            cluster.propagated_objective,
            cluster.propagated_descendants.clone(),
        )
    };

    let parent_cluster = tree.get_mut(parent);
    parent_cluster.propagated_lowest_child_death_level =
        parent_cluster.propagated_lowest_child_death_level.min(lowest_death_level);
    parent_cluster.propagated_num_constraints_satisfied += constraints;
    parent_cluster.propagated_stability += stability;
    parent_cluster.propagated_objective += objective;
    parent_cluster.propagated_descendants.extend(descendants);

    Some(parent)
}
