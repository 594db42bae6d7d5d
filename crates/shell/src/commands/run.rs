//! Clustering a dataset end to end.

use std::{
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
};

use clap::Args;
use hdbscan_star::{
    extraction::ExtractionMode, io, propagation::Propagation, CoreDistanceKind, DiskIO, Hdbscan, HdbscanParams,
};

use super::HierarchyBundle;
use crate::{data, metrics::Metric};

/// How core distances are estimated.
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
pub enum CoreDistance {
    /// The distance to the `(min_pts - 1)`-th nearest neighbor.
    #[clap(name = "knn")]
    Knn,
    /// The parameter-free all-points estimate.
    #[clap(name = "all-points")]
    AllPoints,
}

impl From<CoreDistance> for CoreDistanceKind {
    fn from(kind: CoreDistance) -> Self {
        match kind {
            CoreDistance::Knn => Self::Knn,
            CoreDistance::AllPoints => Self::AllPoints,
        }
    }
}

/// How a semi-supervised partition is extracted.
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
pub enum Extraction {
    /// Refine label-pure clusters with unsupervised selection below them.
    #[clap(name = "class-agnostic")]
    ClassAgnostic,
    /// Keep the clusters holding exactly one class.
    #[clap(name = "class-based")]
    ClassBased,
}

impl From<Extraction> for ExtractionMode {
    fn from(mode: Extraction) -> Self {
        match mode {
            Extraction::ClassAgnostic => Self::ClassAgnostic,
            Extraction::ClassBased => Self::ClassBased,
        }
    }
}

/// Arguments of the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// The path to the input dataset, `.csv` or `.npy`.
    #[arg(short('i'), long)]
    inp_path: PathBuf,

    /// The number of points, itself included, that make a point a core point.
    #[arg(long, default_value_t = 4)]
    min_pts: usize,

    /// The smallest number of points that can form a cluster.
    #[arg(long, default_value_t = 4)]
    min_cl_size: usize,

    /// The name of the distance function to use.
    #[arg(short('m'), long, default_value = "euclidean")]
    metric: Metric,

    /// How core distances are estimated.
    #[arg(short('c'), long, default_value = "knn")]
    core_distance: CoreDistance,

    /// The propagation policy: `unsupervised`, `supervised`, `mixed[:alpha]` or `mc[:alpha]`.
    #[arg(short('p'), long, default_value = "unsupervised")]
    propagation: Propagation,

    /// A file of `a,b,ml|cl` pairwise constraints.
    #[arg(long)]
    constraints: Option<PathBuf>,

    /// A file of `point,class` labels.
    #[arg(long)]
    labels: Option<PathBuf>,

    /// Extract a semi-supervised partition from the labels.
    #[arg(short('s'), long)]
    semi_supervised: Option<Extraction>,

    /// Only record the hierarchy levels at which clusters are born.
    #[arg(long, default_value_t = false)]
    compact: bool,

    /// Give every point a self-edge weighted by its core distance.
    #[arg(long, default_value_t = false)]
    self_edges: bool,
}

/// Clusters the dataset and writes every output file into `out_dir`.
pub fn run(args: &RunArgs, out_dir: &Path) -> Result<(), String> {
    let data = data::read(&args.inp_path)?;
    let name = data.name().to_string();
    let metric = args.metric.shell_metric()?;

    let constraints = args
        .constraints
        .as_ref()
        .map(|path| io::read_constraints(path, data.cardinality()))
        .transpose()?;
    let labeled = args.labels.as_ref().map(io::read_labels).transpose()?;

    let params = HdbscanParams::default()
        .with_min_points(args.min_pts)
        .with_min_cluster_size(args.min_cl_size)
        .with_compact(args.compact)
        .with_self_edges(args.self_edges)
        .with_core_distance(args.core_distance.into())
        .with_propagation(args.propagation)
        .with_semi_supervised(args.semi_supervised.map(Into::into));
    let hdbscan = Hdbscan::new(params)?;

    let hierarchy_path = if args.compact {
        out_dir.join(format!("{name}_compact_hierarchy.csv"))
    } else {
        out_dir.join(format!("{name}_hierarchy.csv"))
    };
    let mut hierarchy_writer = BufWriter::new(File::create(&hierarchy_path).map_err(|e| e.to_string())?);
    let result = hdbscan.fit_with_writer(
        &data,
        &metric,
        constraints.as_deref(),
        labeled.as_ref(),
        &mut hierarchy_writer,
    )?;
    drop(hierarchy_writer);

    result.tree.write_to_csv(&out_dir.join(format!("{name}_tree.csv")))?;

    let mut writer = create(&out_dir.join(format!("{name}_partition.csv")))?;
    io::write_partition(&mut writer, &result.partition, result.infinite_stability)?;

    let mut writer = create(&out_dir.join(format!("{name}_outlier_scores.csv")))?;
    io::write_outlier_scores(&mut writer, &result.outlier_scores, result.infinite_stability)?;

    let mut writer = create(&out_dir.join(format!("{name}_visualization.vis")))?;
    io::write_visualization(&mut writer, args.compact)?;

    result.mst.write_to(&out_dir.join(format!("{name}_MST.mst")))?;
    let bundle = HierarchyBundle {
        tree: result.tree,
        matrix: result.matrix,
    };
    bundle.write_to(&out_dir.join(format!("{name}.shm")))?;

    let num_clusters = result
        .partition
        .iter()
        .filter(|&&l| l != 0)
        .collect::<std::collections::BTreeSet<_>>()
        .len();
    ftlog::info!("Found {num_clusters} clusters in {name}, outputs written to {}.", out_dir.display());
    println!("Found {num_clusters} clusters in {name}.");

    Ok(())
}

/// Creates a buffered file writer.
fn create(path: &Path) -> Result<BufWriter<File>, String> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| format!("Could not create {}: {e}", path.display()))
}
