//! Prim's algorithm over the implicit mutual-reachability graph.
//!
//! The mutual-reachability distance between two points is
//! `max(d(p, q), core(p), core(q))`. The complete graph is never
//! materialized: Prim's algorithm grows the tree from the last point and, at
//! every step, only relaxes the edges of the point that was just attached.

use rayon::prelude::*;

use super::{Edge, UndirectedGraph};
use crate::{core::metric::ParMetric, FlatVec, Metric};

/// Builds the mutual-reachability MST with Prim's algorithm.
///
/// With `self_edges`, every point also gets an edge to itself weighted by its
/// core distance, so that a single point can be a cluster of its own until
/// that density level.
///
/// Among equally close candidates, the point with the largest index is
/// attached first.
///
/// # Errors
///
/// - If there is not exactly one core distance per point.
/// - If some point cannot be attached because its distances are all NAN.
pub fn prim_mst<I, M: Metric<I, f64>>(
    data: &FlatVec<I>,
    metric: &M,
    core_distances: &[f64],
    self_edges: bool,
) -> Result<UndirectedGraph, String> {
    weighted_prim_mst(data, metric, core_distances, self_edges, |_, _| 1.0)
}

/// Builds the MST with every distance multiplied by `weight(p, q)` before
/// taking the mutual-reachability maximum.
///
/// # Errors
///
/// See [`prim_mst`](prim_mst).
pub fn weighted_prim_mst<I, M, W>(
    data: &FlatVec<I>,
    metric: &M,
    core_distances: &[f64],
    self_edges: bool,
    weight: W,
) -> Result<UndirectedGraph, String>
where
    M: Metric<I, f64>,
    W: Fn(usize, usize) -> f64,
{
    check_core_distances(data, core_distances)?;
    let n = data.cardinality();
    let mut prim = Prim::new(n);

    for _ in 1..n {
        let current = prim.current;
        for (v, slot) in prim.nearest.iter_mut().enumerate() {
            if v != current && !prim.attached[v] {
                let distance = metric.distance(data.get(current), data.get(v)) * weight(current, v);
                relax(slot, current, mutual_reachability(distance, core_distances, current, v));
            }
        }
        prim.attach_closest()?;
    }

    prim.into_graph(core_distances, self_edges)
}

/// Parallel version of [`prim_mst`](prim_mst).
///
/// # Errors
///
/// See [`prim_mst`](prim_mst).
pub fn par_prim_mst<I: Send + Sync, M: ParMetric<I, f64>>(
    data: &FlatVec<I>,
    metric: &M,
    core_distances: &[f64],
    self_edges: bool,
) -> Result<UndirectedGraph, String> {
    par_weighted_prim_mst(data, metric, core_distances, self_edges, |_, _| 1.0)
}

/// Parallel version of [`weighted_prim_mst`](weighted_prim_mst).
///
/// # Errors
///
/// See [`prim_mst`](prim_mst).
pub fn par_weighted_prim_mst<I, M, W>(
    data: &FlatVec<I>,
    metric: &M,
    core_distances: &[f64],
    self_edges: bool,
    weight: W,
) -> Result<UndirectedGraph, String>
where
    I: Send + Sync,
    M: ParMetric<I, f64>,
    W: Fn(usize, usize) -> f64 + Send + Sync,
{
    check_core_distances(data, core_distances)?;
    let n = data.cardinality();
    let mut prim = Prim::new(n);

    for _ in 1..n {
        let current = prim.current;
        let attached = &prim.attached;
        prim.nearest
            .par_iter_mut()
            .enumerate()
            .filter(|&(v, _)| v != current && !attached[v])
            .for_each(|(v, slot)| {
                let distance = metric.par_distance(data.get(current), data.get(v)) * weight(current, v);
                relax(slot, current, mutual_reachability(distance, core_distances, current, v));
            });
        prim.attach_closest()?;
    }

    prim.into_graph(core_distances, self_edges)
}

/// The state of Prim's algorithm.
struct Prim {
    /// For each point, the smallest known mutual-reachability distance to the
    /// tree and the tree point it was measured from.
    nearest: Vec<(f64, usize)>,
    /// Whether each point is already in the tree.
    attached: Vec<bool>,
    /// The most recently attached point.
    current: usize,
}

impl Prim {
    /// Starts the tree at the last point.
    fn new(n: usize) -> Self {
        let current = n.saturating_sub(1);
        let mut attached = vec![false; n];
        if n > 0 {
            attached[current] = true;
        }
        Self {
            nearest: vec![(f64::INFINITY, current); n],
            attached,
            current,
        }
    }

    /// Attaches the unattached point closest to the tree.
    fn attach_closest(&mut self) -> Result<(), String> {
        let closest = self
            .nearest
            .iter()
            .enumerate()
            .filter(|&(v, _)| !self.attached[v])
            .fold(None, |best: Option<(usize, f64)>, (v, &(d, _))| {
                if d.is_nan() {
                    return best;
                }
                match best {
                    Some((_, b)) if b < d => best,
                    _ => Some((v, d)),
                }
            })
            .map(|(v, _)| v)
            .ok_or_else(|| "Could not attach a point to the spanning tree, are some distances NAN?".to_string())?;

        self.attached[closest] = true;
        self.current = closest;
        Ok(())
    }

    /// Collects the tree edges, one per point other than the starting point.
    fn into_graph(self, core_distances: &[f64], self_edges: bool) -> Result<UndirectedGraph, String> {
        let n = self.nearest.len();
        let mut edges = self
            .nearest
            .into_iter()
            .take(n.saturating_sub(1))
            .enumerate()
            .map(|(v, (d, from))| Edge::new(from, v, d))
            .collect::<Vec<_>>();

        if self_edges {
            edges.extend(core_distances.iter().enumerate().map(|(v, &c)| Edge::new(v, v, c)));
        }

        UndirectedGraph::new(n, edges)
    }
}

/// Lowers the recorded distance of a point if `mrd` is smaller.
fn relax(slot: &mut (f64, usize), from: usize, mrd: f64) {
    if mrd < slot.0 {
        *slot = (mrd, from);
    }
}

/// The mutual-reachability distance between `a` and `b`.
fn mutual_reachability(distance: f64, core_distances: &[f64], a: usize, b: usize) -> f64 {
    distance.max(core_distances[a]).max(core_distances[b])
}

/// Checks that there is one core distance per point.
fn check_core_distances<I>(data: &FlatVec<I>, core_distances: &[f64]) -> Result<(), String> {
    if core_distances.len() == data.cardinality() {
        Ok(())
    } else {
        Err(format!(
            "Expected {} core distances but got {}.",
            data.cardinality(),
            core_distances.len()
        ))
    }
}
