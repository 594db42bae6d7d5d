//! The read-only point sets that HDBSCAN* clusters.

mod flat_vec;

pub use flat_vec::FlatVec;
