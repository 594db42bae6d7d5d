//! The commands under the `hdbscan` CLI.

pub mod extract;
pub mod run;

use clap::Subcommand;
use hdbscan_star::{hierarchy::HierarchyMatrix, ClusterTree, DiskIO};

pub use extract::ExtractArgs;
pub use run::RunArgs;

/// The subcommands of the CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Cluster a dataset and write the hierarchy, tree, partition and outlier scores.
    Run(RunArgs),
    /// Re-extract a partition from a saved run with another propagation policy.
    Extract(ExtractArgs),
}

/// The cluster tree and hierarchy matrix of a run, saved together as `<name>.shm`.
#[derive(serde::Serialize, serde::Deserialize)]
pub struct HierarchyBundle {
    /// The cluster tree.
    pub tree: ClusterTree,
    /// The per-point label histories.
    pub matrix: HierarchyMatrix,
}

impl DiskIO for HierarchyBundle {}
