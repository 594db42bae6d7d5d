//! An undirected, weighted graph with removable edges.

use serde::{Deserialize, Serialize};

/// A weighted, undirected edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// One endpoint.
    pub first: usize,
    /// The other endpoint. Equal to `first` for a self-edge.
    pub second: usize,
    /// The weight of the edge.
    pub weight: f64,
}

impl Edge {
    /// Creates a new edge.
    #[must_use]
    pub const fn new(first: usize, second: usize, weight: f64) -> Self {
        Self { first, second, weight }
    }

    /// The endpoint opposite to `vertex`.
    #[must_use]
    pub const fn other(&self, vertex: usize) -> usize {
        if self.first == vertex {
            self.second
        } else {
            self.first
        }
    }
}

/// An undirected graph whose adjacency lists hold indices into an edge arena.
///
/// Removing an edge deletes its index from both endpoints' lists; the edge
/// itself stays in the arena so that indices remain stable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UndirectedGraph {
    /// The number of vertices.
    num_vertices: usize,
    /// All edges, removed or not.
    edges: Vec<Edge>,
    /// For each vertex, the indices of its live incident edges.
    adjacency: Vec<Vec<usize>>,
    /// Whether the edges are sorted by descending weight.
    sorted: bool,
}

impl UndirectedGraph {
    /// Creates a new graph over `num_vertices` vertices.
    ///
    /// # Errors
    ///
    /// - If an edge refers to a vertex outside `0..num_vertices`.
    pub fn new(num_vertices: usize, edges: Vec<Edge>) -> Result<Self, String> {
        if let Some(e) = edges.iter().find(|e| e.first >= num_vertices || e.second >= num_vertices) {
            return Err(format!(
                "Edge ({}, {}) refers to a vertex outside of 0..{num_vertices}.",
                e.first, e.second
            ));
        }
        let mut graph = Self {
            num_vertices,
            edges,
            adjacency: Vec::new(),
            sorted: false,
        };
        graph.index_edges();
        Ok(graph)
    }

    /// Rebuilds the adjacency lists from the edge arena.
    fn index_edges(&mut self) {
        self.adjacency = vec![Vec::new(); self.num_vertices];
        for (i, e) in self.edges.iter().enumerate() {
            self.adjacency[e.first].push(i);
            if e.first != e.second {
                self.adjacency[e.second].push(i);
            }
        }
    }

    /// Sorts the edges by descending weight, ready for hierarchy construction.
    ///
    /// The sort is stable, so edges of equal weight keep their relative order.
    /// Any previously removed edges are restored.
    pub fn sort_by_weight_descending(&mut self) {
        self.edges.sort_by(|a, b| crate::utils::descending(&a.weight, &b.weight));
        self.index_edges();
        self.sorted = true;
    }

    /// Whether the edges are sorted by descending weight.
    #[must_use]
    pub const fn is_sorted(&self) -> bool {
        self.sorted
    }

    /// The number of vertices.
    #[must_use]
    pub const fn num_vertices(&self) -> usize {
        self.num_vertices
    }

    /// The number of edges in the arena, removed ones included.
    #[must_use]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// All edges in the arena, in their current order.
    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// The edge at the given index.
    #[must_use]
    pub fn edge(&self, index: usize) -> Edge {
        self.edges[index]
    }

    /// Removes the edge at the given index from the adjacency of both endpoints.
    pub fn remove_edge(&mut self, index: usize) {
        let Edge { first, second, .. } = self.edges[index];
        for v in [first, second] {
            if let Some(pos) = self.adjacency[v].iter().position(|&i| i == index) {
                self.adjacency[v].swap_remove(pos);
            }
        }
    }

    /// The live neighbors of a vertex. A self-edge makes a vertex its own neighbor.
    pub fn neighbors(&self, vertex: usize) -> impl Iterator<Item = usize> + '_ {
        self.adjacency[vertex].iter().map(move |&i| self.edges[i].other(vertex))
    }

    /// The live neighbors of a vertex with the weights of the connecting edges.
    pub fn neighbors_with_weights(&self, vertex: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.adjacency[vertex].iter().map(move |&i| {
            let e = &self.edges[i];
            (e.other(vertex), e.weight)
        })
    }

    /// The weight of a live edge between two vertices, if there is one.
    #[must_use]
    pub fn weight_between(&self, a: usize, b: usize) -> Option<f64> {
        self.neighbors_with_weights(a).find(|&(v, _)| v == b).map(|(_, w)| w)
    }

    /// Whether any edge is still live.
    #[must_use]
    pub fn has_edges(&self) -> bool {
        self.adjacency.iter().any(|a| !a.is_empty())
    }
}
