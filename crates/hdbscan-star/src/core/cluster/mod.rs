//! Clusters of the HDBSCAN* hierarchy and the arena that holds them.

mod _cluster;
mod csv;
mod tree;

pub use _cluster::Cluster;
pub use tree::ClusterTree;
