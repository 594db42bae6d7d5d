//! The HDBSCAN* hierarchy: the per-level labels of every point and the tree
//! of clusters that emerges from them.

mod builder;
mod matrix;

pub use builder::{Hierarchy, HierarchyBuilder};
pub use matrix::HierarchyMatrix;
