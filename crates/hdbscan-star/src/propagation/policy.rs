//! The policies that decide, for every cluster, whether it beats the best
//! selection among its descendants.

use serde::{Deserialize, Serialize};

use crate::Cluster;

/// How clusters are scored against their descendants during propagation.
///
/// Whatever the policy, a cluster's `stability` is always its excess of mass;
/// the policy only decides the *objective* that is compared. Ties always
/// favor the cluster over its descendants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum Propagation {
    /// Compare satisfied constraints first, then stability.
    #[default]
    Unsupervised,
    /// Compare the fraction of satisfied constraints only.
    Supervised,
    /// Blend normalized stability with the consistency index.
    Mixed {
        /// The weight of stability, in `[0, 1]`.
        alpha: f64,
    },
    /// Blend normalized stability with the fraction of satisfied constraints.
    ConstraintMixed {
        /// The weight of stability, in `[0, 1]`.
        alpha: f64,
    },
}

impl Propagation {
    /// Looks up a policy by name: `unsupervised`, `supervised`, `mixed` or
    /// `mc` (constraint-mixed). `alpha` is only used by the mixed policies.
    ///
    /// # Errors
    ///
    /// - If the name is unknown.
    /// - If a mixed policy is requested with `alpha` outside `[0, 1]`.
    pub fn from_name(name: &str, alpha: f64) -> Result<Self, String> {
        let policy = match name.trim().to_lowercase().as_str() {
            "unsupervised" => Self::Unsupervised,
            "supervised" => Self::Supervised,
            "mixed" => Self::Mixed { alpha },
            "mc" | "constraint-mixed" | "constraint_mixed" => Self::ConstraintMixed { alpha },
            _ => return Err(format!("Unknown propagation policy: {name}")),
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Checks the blending weight of the mixed policies.
    ///
    /// # Errors
    ///
    /// - If `alpha` is outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Self::Mixed { alpha } | Self::ConstraintMixed { alpha } if !(0.0..=1.0).contains(alpha) => {
                Err(format!("alpha must be in [0, 1], got {alpha}."))
            }
            _ => Ok(()),
        }
    }

    /// The name of the policy.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Unsupervised => "unsupervised",
            Self::Supervised => "supervised",
            Self::Mixed { .. } => "mixed",
            Self::ConstraintMixed { .. } => "mc",
        }
    }

    /// Whether the policy scores clusters by constraints.
    #[must_use]
    pub const fn uses_constraints(&self) -> bool {
        matches!(self, Self::Supervised | Self::ConstraintMixed { .. })
    }

    /// The objective of a cluster.
    ///
    /// `max_stability` normalizes stabilities for the mixed policies and
    /// `num_constraints` normalizes constraint counts.
    pub(crate) fn objective(&self, cluster: &Cluster, max_stability: f64, num_constraints: usize) -> f64 {
        let ratio = constraint_ratio(cluster.num_constraints_satisfied, num_constraints);
        match *self {
            Self::Unsupervised => cluster.stability,
            Self::Supervised => ratio,
            Self::Mixed { alpha } => alpha * cluster.stability / max_stability + (1.0 - alpha) * cluster.consistency_index,
            Self::ConstraintMixed { alpha } => alpha * cluster.stability / max_stability + (1.0 - alpha) * ratio,
        }
    }

    /// The objective credited to a cluster for constraints satisfied by
    /// points that fell out of it as noise.
    pub(crate) fn noise_credit(&self, cluster: &Cluster, num_constraints: usize) -> f64 {
        let ratio = constraint_ratio(cluster.virtual_child_constraints_satisfied, num_constraints);
        match *self {
            Self::Supervised => ratio,
            Self::ConstraintMixed { alpha } => (1.0 - alpha) * ratio,
            Self::Unsupervised | Self::Mixed { .. } => 0.0,
        }
    }

    /// Whether the cluster is preferred over its selected descendants.
    pub(crate) fn prefers_cluster(&self, cluster: &Cluster) -> bool {
        match self {
            Self::Unsupervised => match cluster
                .num_constraints_satisfied
                .cmp(&cluster.propagated_num_constraints_satisfied)
            {
                std::cmp::Ordering::Greater => true,
                std::cmp::Ordering::Less => false,
                std::cmp::Ordering::Equal => cluster.stability >= cluster.propagated_stability,
            },
            Self::Supervised => cluster.num_constraints_satisfied >= cluster.propagated_num_constraints_satisfied,
            Self::Mixed { .. } | Self::ConstraintMixed { .. } => cluster.objective >= cluster.propagated_objective,
        }
    }
}

impl std::str::FromStr for Propagation {
    type Err = String;

    /// Parses `name` or `name:alpha`, e.g. `mixed:0.3`. Mixed policies
    /// default to `alpha = 0.5`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((name, alpha)) => {
                let alpha = alpha
                    .trim()
                    .parse::<f64>()
                    .map_err(|e| format!("Invalid alpha {alpha}: {e}"))?;
                Self::from_name(name, alpha)
            }
            None => Self::from_name(s, 0.5),
        }
    }
}

impl std::fmt::Display for Propagation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mixed { alpha } | Self::ConstraintMixed { alpha } => write!(f, "{}:{alpha}", self.name()),
            _ => write!(f, "{}", self.name()),
        }
    }
}

/// Half the number of satisfied constraint endpoints over the number of
/// constraints, `0` without constraints.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn constraint_ratio(satisfied: usize, num_constraints: usize) -> f64 {
    if num_constraints == 0 {
        0.0
    } else {
        0.5 * satisfied as f64 / num_constraints as f64
    }
}
