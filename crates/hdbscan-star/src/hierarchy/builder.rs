//! Building the cluster tree by removing MST edges in decreasing weight.

use std::{
    collections::{BTreeSet, VecDeque},
    io::Write,
};

use super::HierarchyMatrix;
use crate::{graph::UndirectedGraph, ClusterTree, Constraint, ConstraintKind};

/// The output of [`HierarchyBuilder::build`](HierarchyBuilder::build).
#[derive(Debug, Clone)]
pub struct Hierarchy {
    /// The tree of clusters.
    pub tree: ClusterTree,
    /// The label of every point at every recorded density level.
    pub matrix: HierarchyMatrix,
    /// For each point, the density level at which it became noise.
    pub noise_levels: Vec<f64>,
    /// For each point, the cluster it left when it became noise.
    pub last_clusters: Vec<usize>,
}

/// Builds the HDBSCAN* hierarchy from a mutual-reachability MST.
///
/// Edges are removed from heaviest to lightest, all edges of equal weight at
/// once. After each level, every cluster that lost an edge is re-examined:
///
/// - a connected component with at least `min_cluster_size` points and at
///   least one edge is a *candidate* child;
/// - if two or more candidates appear, each becomes a new cluster;
/// - all other components of the examined cluster become noise;
/// - a single candidate keeps the label of the examined cluster, which simply
///   shrinks.
///
/// Every point ends up as noise at the density level where it falls out of
/// its last cluster.
#[derive(Debug, Clone)]
pub struct HierarchyBuilder<'a> {
    /// The smallest number of points that can form a cluster.
    min_cluster_size: usize,
    /// Whether to only record levels at which clusters are born.
    compact: bool,
    /// The pairwise constraints, counted as clusters are born.
    constraints: &'a [Constraint],
}

impl<'a> HierarchyBuilder<'a> {
    /// Creates a new builder.
    ///
    /// # Errors
    ///
    /// - If `min_cluster_size` is zero.
    pub fn new(min_cluster_size: usize) -> Result<Self, String> {
        if min_cluster_size == 0 {
            Err("min_cluster_size must be at least 1.".to_string())
        } else {
            Ok(Self {
                min_cluster_size,
                compact: false,
                constraints: &[],
            })
        }
    }

    /// Only records the levels at which new clusters appear, and the levels
    /// right after them.
    #[must_use]
    pub const fn with_compact(mut self, compact: bool) -> Self {
        self.compact = compact;
        self
    }

    /// Counts how many of the given constraints each cluster satisfies.
    #[must_use]
    pub const fn with_constraints(mut self, constraints: &'a [Constraint]) -> Self {
        self.constraints = constraints;
        self
    }

    /// Builds the hierarchy, consuming the MST.
    ///
    /// # Errors
    ///
    /// - If the MST has not been sorted with
    ///   [`sort_by_weight_descending`](UndirectedGraph::sort_by_weight_descending).
    /// - If the MST has no vertices.
    pub fn build(&self, mst: UndirectedGraph) -> Result<Hierarchy, String> {
        self.build_inner(mst, None)
    }

    /// Builds the hierarchy, writing one CSV row per recorded level.
    ///
    /// Each row is `density,label_0,...,label_n-1`, followed by a final row of
    /// zeros at density `0`. The byte offset of the first row in which each
    /// cluster appears is recorded in the cluster.
    ///
    /// # Errors
    ///
    /// - See [`build`](Self::build).
    /// - If a row cannot be written.
    pub fn build_with_writer<W: Write>(&self, mst: UndirectedGraph, writer: &mut W) -> Result<Hierarchy, String> {
        self.build_inner(mst, Some(writer as &mut dyn Write))
    }

    /// Runs the edge-removal loop.
    pub(crate) fn build_inner(&self, mst: UndirectedGraph, writer: Option<&mut dyn Write>) -> Result<Hierarchy, String> {
        if !mst.is_sorted() {
            return Err("The MST must be sorted by descending edge weight.".to_string());
        }
        let n = mst.num_vertices();
        if n == 0 {
            return Err("The MST has no vertices.".to_string());
        }

        let constraints = self
            .constraints
            .iter()
            .filter(|c| {
                let valid = c.a < n && c.b < n;
                if !valid {
                    ftlog::warn!("Ignoring constraint ({}, {}, {}) with a point outside 0..{n}.", c.a, c.b, c.kind);
                }
                valid
            })
            .copied()
            .collect::<Vec<_>>();

        let mut state = State::new(mst, constraints, writer);
        state.count_constraints(&[1]);

        let num_edges = state.mst.num_edges();
        let mut next_level_significant = true;
        let mut i = 0;
        while i < num_edges {
            let weight = state.mst.edge(i).weight;
            let mut affected_labels = BTreeSet::new();
            let mut affected_vertices = BTreeSet::new();

            while i < num_edges && state.mst.edge(i).weight.total_cmp(&weight).is_eq() {
                let edge = state.mst.edge(i);
                state.mst.remove_edge(i);
                i += 1;

                if state.current[edge.first] == 0 {
                    continue;
                }
                affected_vertices.insert(edge.first);
                affected_vertices.insert(edge.second);
                affected_labels.insert(state.current[edge.first]);
            }

            if affected_labels.is_empty() {
                continue;
            }

            let mut new_clusters = Vec::new();
            while let Some(examined) = affected_labels.pop_last() {
                state.split(examined, weight, self.min_cluster_size, &mut affected_vertices, &mut new_clusters);
            }

            if !self.compact || next_level_significant || !new_clusters.is_empty() {
                state.emit_row(weight)?;
            }

            for &label in &new_clusters {
                state.tree.get_mut(label).file_offset = state.bytes_written;
            }
            if !new_clusters.is_empty() {
                ftlog::debug!("{} clusters born at level {weight}.", new_clusters.len());
                state.count_constraints(&new_clusters);
            }

            state.previous.clone_from(&state.current);
            next_level_significant = !new_clusters.is_empty();
        }

        state.finish()
    }
}

/// The mutable state of one hierarchy construction.
struct State<'w> {
    /// The MST, losing edges as levels are processed.
    mst: UndirectedGraph,
    /// The tree of clusters built so far.
    tree: ClusterTree,
    /// The per-point label histories.
    matrix: HierarchyMatrix,
    /// The valid constraints.
    constraints: Vec<Constraint>,
    /// The labels after the current level.
    current: Vec<usize>,
    /// The labels before the current level.
    previous: Vec<usize>,
    /// The last recorded `(density, label)` of each point.
    last_values: Vec<Option<(f64, usize)>>,
    /// The level at which each point became noise.
    noise_levels: Vec<f64>,
    /// The cluster each point left when it became noise.
    last_clusters: Vec<usize>,
    /// The number of bytes of hierarchy rows produced so far.
    bytes_written: u64,
    /// Where to write the hierarchy rows.
    writer: Option<&'w mut dyn Write>,
}

impl<'w> State<'w> {
    /// Starts with every point in the root cluster.
    fn new(mst: UndirectedGraph, constraints: Vec<Constraint>, writer: Option<&'w mut dyn Write>) -> Self {
        let n = mst.num_vertices();
        Self {
            mst,
            tree: ClusterTree::new(n, constraints.len()),
            matrix: HierarchyMatrix::new(n),
            constraints,
            current: vec![1; n],
            previous: vec![1; n],
            last_values: vec![None; n],
            noise_levels: vec![0.0; n],
            last_clusters: vec![1; n],
            bytes_written: 0,
            writer,
        }
    }

    /// Re-examines the components of a cluster that lost edges at `weight`.
    fn split(
        &mut self,
        examined: usize,
        weight: f64,
        min_cluster_size: usize,
        affected_vertices: &mut BTreeSet<usize>,
        new_clusters: &mut Vec<usize>,
    ) {
        let mut examined_vertices = affected_vertices
            .iter()
            .copied()
            .filter(|&v| self.current[v] == examined)
            .collect::<BTreeSet<_>>();
        affected_vertices.retain(|v| !examined_vertices.contains(v));

        // The first candidate is only explored far enough to know it is a
        // candidate. If no other candidate shows up, it keeps the label.
        let mut first_child: Option<(BTreeSet<usize>, VecDeque<usize>)> = None;
        let mut num_children = 0_usize;

        while let Some(start) = examined_vertices.pop_last() {
            let mut component = BTreeSet::from([start]);
            let mut unexplored = VecDeque::from([start]);
            let mut any_edges = false;
            let mut counted = false;
            let mut deferred = false;

            while let Some(v) = unexplored.pop_front() {
                for neighbor in self.mst.neighbors(v) {
                    any_edges = true;
                    if component.insert(neighbor) {
                        unexplored.push_back(neighbor);
                        examined_vertices.remove(&neighbor);
                    }
                }

                if !counted && component.len() >= min_cluster_size && any_edges {
                    counted = true;
                    num_children += 1;
                    if first_child.is_none() {
                        deferred = true;
                        break;
                    }
                }
            }

            if deferred {
                first_child = Some((component, unexplored));
                continue;
            }

            let is_candidate = component.len() >= min_cluster_size && any_edges;
            if num_children >= 2 && is_candidate {
                let first_member = first_child.as_ref().and_then(|(c, _)| c.last().copied());
                if first_member.is_some_and(|m| component.contains(&m)) {
                    num_children -= 1;
                } else {
                    new_clusters.push(self.create_cluster(component, examined, weight));
                }
            } else if !is_candidate {
                self.create_noise(&component, examined, weight);
            }
        }

        if num_children >= 2 {
            if let Some((mut component, mut unexplored)) = first_child {
                if component.first().is_some_and(|&p| self.current[p] == examined) {
                    while let Some(v) = unexplored.pop_front() {
                        for neighbor in self.mst.neighbors(v) {
                            if component.insert(neighbor) {
                                unexplored.push_back(neighbor);
                            }
                        }
                    }
                    new_clusters.push(self.create_cluster(component, examined, weight));
                }
            }
        }
    }

    /// Moves the points into a new child of `parent` born at `weight`.
    fn create_cluster(&mut self, points: BTreeSet<usize>, parent: usize, weight: f64) -> usize {
        self.tree.get_mut(parent).detach_points(points.len(), weight);
        let label = self.tree.next_label();
        for &p in &points {
            self.current[p] = label;
        }
        self.tree.add_child(parent, weight, points)
    }

    /// Turns the points of `parent` into noise at `weight`.
    fn create_noise(&mut self, points: &BTreeSet<usize>, parent: usize, weight: f64) {
        for &p in points {
            self.current[p] = 0;
            self.noise_levels[p] = weight;
            self.last_clusters[p] = parent;
        }
        let cluster = self.tree.get_mut(parent);
        cluster.detach_points(points.len(), weight);
        cluster.add_points_to_virtual_child(points);
    }

    /// Counts the constraints satisfied by newly born clusters.
    ///
    /// A must-link satisfied inside a new cluster counts twice. A cannot-link
    /// counts once for each endpoint that sits in a new cluster, or that fell
    /// out as noise from the parent of a new cluster.
    fn count_constraints(&mut self, new_labels: &[usize]) {
        if self.constraints.is_empty() {
            return;
        }

        let parents = new_labels
            .iter()
            .filter_map(|&l| self.tree.get(l).parent())
            .collect::<BTreeSet<_>>();

        for c in &self.constraints {
            let (label_a, label_b) = (self.current[c.a], self.current[c.b]);
            match c.kind {
                ConstraintKind::MustLink => {
                    if label_a == label_b && new_labels.contains(&label_a) {
                        self.tree.get_mut(label_a).num_constraints_satisfied += 2;
                    }
                }
                ConstraintKind::CannotLink => {
                    if label_a != label_b || label_a == 0 {
                        for (point, label) in [(c.a, label_a), (c.b, label_b)] {
                            if label == 0 {
                                if let Some(&p) = parents.iter().find(|&&p| self.tree.get(p).virtual_child_contains(point)) {
                                    self.tree.get_mut(p).virtual_child_constraints_satisfied += 1;
                                }
                            } else if new_labels.contains(&label) {
                                self.tree.get_mut(label).num_constraints_satisfied += 1;
                            }
                        }
                    }
                }
            }
        }

        for &p in &parents {
            self.tree.get_mut(p).release_virtual_child();
        }
    }

    /// Records the labels held at `weight` as a hierarchy row.
    fn emit_row(&mut self, weight: f64) -> Result<(), String> {
        self.matrix.record_density(weight);
        for (point, (&label, last)) in self.previous.iter().zip(self.last_values.iter_mut()).enumerate() {
            if let Some((density, last_label)) = *last {
                if label != last_label {
                    self.matrix.set_label(point, density, last_label);
                }
            }
            *last = Some((weight, label));
        }

        let row = format_row(weight, &self.previous);
        self.write(&row)
    }

    /// Writes the final row of zeros and completes the matrix.
    fn finish(mut self) -> Result<Hierarchy, String> {
        let zeros = vec![0; self.previous.len()];
        self.write(&format_row(0.0, &zeros))?;
        if let Some(writer) = self.writer.as_mut() {
            writer.flush().map_err(|e| e.to_string())?;
        }

        // Zero-weight self-edges already produced a level at density zero,
        // whose labels must survive the closing row of noise.
        let zero_recorded = self.matrix.densities().last().is_some_and(|&d| d == 0.0);
        if !zero_recorded {
            self.matrix.record_density(0.0);
        }
        for (point, last) in self.last_values.iter().enumerate() {
            if let Some((density, label)) = *last {
                if label != 0 {
                    self.matrix.set_label(point, density, label);
                }
            }
            if !zero_recorded {
                self.matrix.set_label(point, 0.0, 0);
            }
        }
        self.matrix.lexicographic_sort();
        self.matrix.update_last_clusters();

        Ok(Hierarchy {
            tree: self.tree,
            matrix: self.matrix,
            noise_levels: self.noise_levels,
            last_clusters: self.last_clusters,
        })
    }

    /// Writes a row, if there is a writer, and counts its bytes.
    fn write(&mut self, row: &str) -> Result<(), String> {
        if let Some(writer) = self.writer.as_mut() {
            writer.write_all(row.as_bytes()).map_err(|e| e.to_string())?;
        }
        self.bytes_written += row.len() as u64;
        Ok(())
    }
}

/// Formats a hierarchy row as `density,label_0,...,label_n-1\n`.
fn format_row(density: f64, labels: &[usize]) -> String {
    let mut row = density.to_string();
    for label in labels {
        row.push(',');
        row.push_str(&label.to_string());
    }
    row.push('\n');
    row
}
