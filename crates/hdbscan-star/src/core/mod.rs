//! The core data types: metrics, datasets, constraints and clusters.

pub mod cluster;
pub mod constraint;
pub mod dataset;
pub mod metric;

#[cfg(feature = "disk-io")]
mod io;

pub use cluster::{Cluster, ClusterTree};
pub use constraint::{Constraint, ConstraintKind};
pub use dataset::FlatVec;
pub use metric::Metric;

#[cfg(feature = "disk-io")]
pub use io::DiskIO;
