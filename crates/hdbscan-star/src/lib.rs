#![doc = include_str!("../README.md")]

mod core;
pub mod core_distance;
pub mod extraction;
pub mod graph;
pub mod hierarchy;
pub mod io;
pub mod outliers;
pub mod propagation;
mod runner;
pub mod utils;

pub use core::{cluster, constraint, dataset, metric, Cluster, ClusterTree, Constraint, ConstraintKind, FlatVec, Metric};
pub use runner::{CoreDistanceKind, Hdbscan, HdbscanParams, HdbscanResult};

#[cfg(feature = "disk-io")]
pub use core::DiskIO;

/// The current version of the crate.
pub const VERSION: &str = "0.1.0";
