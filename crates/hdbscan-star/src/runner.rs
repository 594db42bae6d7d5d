//! The end-to-end HDBSCAN* pipeline.

use std::{collections::BTreeMap, io::Write, time::Instant};

use serde::{Deserialize, Serialize};

use crate::{
    core::metric::ParMetric,
    core_distance,
    extraction::{fosc_partition, semi_supervised_partition, ExtractionMode},
    graph::{self, UndirectedGraph},
    hierarchy::{HierarchyBuilder, HierarchyMatrix},
    outliers::{outlier_scores, OutlierScore},
    propagation::{consistency_indices, propagate_tree, Propagation},
    ClusterTree, Constraint, FlatVec,
};

/// Datasets at least this large use the parallel core-distance and MST routines.
const PAR_CARDINALITY: usize = 1_000;

/// How core distances are estimated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CoreDistanceKind {
    /// The distance to the `(min_points - 1)`-th nearest other point.
    #[default]
    Knn,
    /// The parameter-free all-points estimate.
    AllPoints,
}

/// The parameters of an HDBSCAN* run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HdbscanParams {
    /// The number of points, itself included, that make a point a core point.
    pub min_points: usize,
    /// The smallest number of points that can form a cluster.
    pub min_cluster_size: usize,
    /// Whether to only record the hierarchy levels at which clusters are born.
    pub compact: bool,
    /// Whether to add a self-edge weighted by the core distance to every point.
    pub self_edges: bool,
    /// How core distances are estimated.
    pub core_distance: CoreDistanceKind,
    /// How cluster scores are propagated.
    pub propagation: Propagation,
    /// If set, and labeled points are given, extract a semi-supervised
    /// partition instead of the FOSC one.
    pub semi_supervised: Option<ExtractionMode>,
}

impl Default for HdbscanParams {
    fn default() -> Self {
        Self {
            min_points: 4,
            min_cluster_size: 4,
            compact: false,
            self_edges: false,
            core_distance: CoreDistanceKind::Knn,
            propagation: Propagation::Unsupervised,
            semi_supervised: None,
        }
    }
}

impl HdbscanParams {
    /// Sets `min_points`.
    #[must_use]
    pub const fn with_min_points(mut self, min_points: usize) -> Self {
        self.min_points = min_points;
        self
    }

    /// Sets `min_cluster_size`.
    #[must_use]
    pub const fn with_min_cluster_size(mut self, min_cluster_size: usize) -> Self {
        self.min_cluster_size = min_cluster_size;
        self
    }

    /// Sets whether the hierarchy is compact.
    #[must_use]
    pub const fn with_compact(mut self, compact: bool) -> Self {
        self.compact = compact;
        self
    }

    /// Sets whether every point gets a self-edge.
    #[must_use]
    pub const fn with_self_edges(mut self, self_edges: bool) -> Self {
        self.self_edges = self_edges;
        self
    }

    /// Sets how core distances are estimated.
    #[must_use]
    pub const fn with_core_distance(mut self, core_distance: CoreDistanceKind) -> Self {
        self.core_distance = core_distance;
        self
    }

    /// Sets the propagation policy.
    #[must_use]
    pub const fn with_propagation(mut self, propagation: Propagation) -> Self {
        self.propagation = propagation;
        self
    }

    /// Sets the semi-supervised extraction mode.
    #[must_use]
    pub const fn with_semi_supervised(mut self, mode: Option<ExtractionMode>) -> Self {
        self.semi_supervised = mode;
        self
    }

    /// Checks the parameters.
    ///
    /// # Errors
    ///
    /// - If `min_points` or `min_cluster_size` is zero.
    /// - If the propagation policy is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.min_points == 0 {
            return Err("min_points must be at least 1.".to_string());
        }
        if self.min_cluster_size == 0 {
            return Err("min_cluster_size must be at least 1.".to_string());
        }
        self.propagation.validate()
    }
}

/// Everything computed by an HDBSCAN* run.
#[derive(Debug, Clone)]
pub struct HdbscanResult {
    /// The core distance of every point.
    pub core_distances: Vec<f64>,
    /// The mutual-reachability MST, sorted by descending weight.
    pub mst: UndirectedGraph,
    /// The propagated cluster tree, with member sets released.
    pub tree: ClusterTree,
    /// The label of every point at every recorded level.
    pub matrix: HierarchyMatrix,
    /// The level at which each point became noise.
    pub noise_levels: Vec<f64>,
    /// The cluster each point left when it became noise.
    pub last_clusters: Vec<usize>,
    /// The flat partition, `0` meaning noise.
    pub partition: Vec<usize>,
    /// The outlier scores, sorted by ascending score.
    pub outlier_scores: Vec<OutlierScore>,
    /// Whether some cluster had infinite stability.
    pub infinite_stability: bool,
}

/// Runs HDBSCAN* with fixed parameters.
#[derive(Debug, Clone)]
pub struct Hdbscan {
    /// The parameters of the run.
    params: HdbscanParams,
}

impl Hdbscan {
    /// Creates a new runner.
    ///
    /// # Errors
    ///
    /// - If the parameters are invalid. See [`HdbscanParams::validate`].
    pub fn new(params: HdbscanParams) -> Result<Self, String> {
        params.validate()?;
        Ok(Self { params })
    }

    /// The parameters of the run.
    #[must_use]
    pub const fn params(&self) -> &HdbscanParams {
        &self.params
    }

    /// Clusters the data.
    ///
    /// `constraints` feed the constraint-based policies; `labeled` maps point
    /// indices to classes and feeds the mixed policy and semi-supervised
    /// extraction.
    ///
    /// # Errors
    ///
    /// - If any stage fails. See the functions of each module.
    pub fn fit<I: Send + Sync, M: ParMetric<I, f64>>(
        &self,
        data: &FlatVec<I>,
        metric: &M,
        constraints: Option<&[Constraint]>,
        labeled: Option<&BTreeMap<usize, usize>>,
    ) -> Result<HdbscanResult, String> {
        self.fit_inner(data, metric, constraints, labeled, None)
    }

    /// Clusters the data, writing the hierarchy rows to `writer`.
    ///
    /// # Errors
    ///
    /// - See [`fit`](Self::fit).
    /// - If the hierarchy cannot be written.
    pub fn fit_with_writer<I: Send + Sync, M: ParMetric<I, f64>, W: Write>(
        &self,
        data: &FlatVec<I>,
        metric: &M,
        constraints: Option<&[Constraint]>,
        labeled: Option<&BTreeMap<usize, usize>>,
        writer: &mut W,
    ) -> Result<HdbscanResult, String> {
        self.fit_inner(data, metric, constraints, labeled, Some(writer as &mut dyn Write))
    }

    /// Runs every stage in order.
    fn fit_inner<I: Send + Sync, M: ParMetric<I, f64>>(
        &self,
        data: &FlatVec<I>,
        metric: &M,
        constraints: Option<&[Constraint]>,
        labeled: Option<&BTreeMap<usize, usize>>,
        writer: Option<&mut dyn Write>,
    ) -> Result<HdbscanResult, String> {
        let p = &self.params;
        let parallel = metric.is_expensive() || data.cardinality() >= PAR_CARDINALITY;
        ftlog::info!(
            "Clustering {} ({} points) with {}, min_points = {}, min_cluster_size = {}, {:?} core distances, {} propagation.",
            data.name(),
            data.cardinality(),
            metric.name(),
            p.min_points,
            p.min_cluster_size,
            p.core_distance,
            p.propagation
        );

        let start = Instant::now();
        let core_distances = match (p.core_distance, parallel) {
            (CoreDistanceKind::Knn, false) => core_distance::knn_core_distances(data, metric, p.min_points)?,
            (CoreDistanceKind::Knn, true) => core_distance::par_knn_core_distances(data, metric, p.min_points)?,
            (CoreDistanceKind::AllPoints, false) => core_distance::all_points_core_distances(data, metric),
            (CoreDistanceKind::AllPoints, true) => core_distance::par_all_points_core_distances(data, metric),
        };
        ftlog::info!("Computed core distances in {:.2e} seconds.", start.elapsed().as_secs_f64());

        let start = Instant::now();
        let mut mst = if parallel {
            graph::par_prim_mst(data, metric, &core_distances, p.self_edges)?
        } else {
            graph::prim_mst(data, metric, &core_distances, p.self_edges)?
        };
        mst.sort_by_weight_descending();
        ftlog::info!(
            "Built the MST with {} edges in {:.2e} seconds.",
            mst.num_edges(),
            start.elapsed().as_secs_f64()
        );

        let start = Instant::now();
        let builder = HierarchyBuilder::new(p.min_cluster_size)?
            .with_compact(p.compact)
            .with_constraints(constraints.unwrap_or_default());
        let hierarchy = builder.build_inner(mst.clone(), writer)?;
        let mut tree = hierarchy.tree;
        ftlog::info!(
            "Built the hierarchy with {} clusters in {:.2e} seconds.",
            tree.len(),
            start.elapsed().as_secs_f64()
        );

        if let Propagation::Mixed { .. } = p.propagation {
            match labeled {
                Some(labeled) => consistency_indices(&mst, &mut tree, labeled)?,
                None => ftlog::warn!("The mixed policy needs labeled points, consistency indices are all 0."),
            }
        }

        let start = Instant::now();
        let infinite_stability = propagate_tree(&mut tree, &p.propagation);
        let partition = match (p.semi_supervised, labeled) {
            (Some(mode), Some(labeled)) => semi_supervised_partition(&mut tree, &hierarchy.matrix, labeled, mode)?,
            _ => fosc_partition(&tree, &hierarchy.matrix),
        };
        let outlier_scores = outlier_scores(&tree, &hierarchy.noise_levels, &hierarchy.last_clusters, &core_distances)?;
        tree.release_all();
        ftlog::info!(
            "Propagated, extracted {} clusters and scored outliers in {:.2e} seconds.",
            partition.iter().filter(|&&l| l != 0).collect::<std::collections::BTreeSet<_>>().len(),
            start.elapsed().as_secs_f64()
        );

        Ok(HdbscanResult {
            core_distances,
            mst,
            tree,
            matrix: hierarchy.matrix,
            noise_levels: hierarchy.noise_levels,
            last_clusters: hierarchy.last_clusters,
            partition,
            outlier_scores,
            infinite_stability,
        })
    }
}
