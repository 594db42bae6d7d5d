//! The mutual-reachability minimum spanning tree.
//!
//! The MST is stored as an [`UndirectedGraph`]: an arena of weighted edges
//! plus, for every vertex, the list of indices of its incident edges.
//! Building the hierarchy consumes the graph by removing edges in order of
//! decreasing weight; clone it first if it is needed afterwards.

mod mst;
mod undirected;

pub use mst::{par_prim_mst, par_weighted_prim_mst, prim_mst, weighted_prim_mst};
pub use undirected::{Edge, UndirectedGraph};
