//! Re-extracting a partition from the saved outputs of a run.

use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use clap::Args;
use hdbscan_star::{
    extraction::partition_from_hierarchy_csv,
    io,
    propagation::{propagate_tree, Propagation},
    DiskIO,
};

use super::HierarchyBundle;

/// Arguments of the `extract` subcommand.
#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// The `<name>.shm` file written by `run`.
    #[arg(short('b'), long)]
    bundle: PathBuf,

    /// The hierarchy csv written by the same run.
    #[arg(short('i'), long)]
    hierarchy: PathBuf,

    /// The propagation policy: `unsupervised`, `supervised`, `mixed[:alpha]` or `mc[:alpha]`.
    #[arg(short('p'), long, default_value = "unsupervised")]
    propagation: Propagation,

    /// The name of the output partition file, without extension.
    #[arg(short('n'), long, default_value = "extracted")]
    name: String,
}

/// Re-propagates the saved tree and reads the selected clusters back from the
/// hierarchy file.
pub fn extract(args: &ExtractArgs, out_dir: &Path) -> Result<(), String> {
    let HierarchyBundle { mut tree, .. } = HierarchyBundle::read_from(&args.bundle)?;
    let infinite_stability = propagate_tree(&mut tree, &args.propagation);
    let selected = tree.root().propagated_descendants().to_vec();
    ftlog::info!(
        "Selected {} clusters with {} propagation.",
        selected.len(),
        args.propagation
    );

    let file = File::open(&args.hierarchy).map_err(|e| format!("Could not open {}: {e}", args.hierarchy.display()))?;
    let partition = partition_from_hierarchy_csv(&mut BufReader::new(file), &tree, &selected)?;

    let path = out_dir.join(format!("{}_partition.csv", args.name));
    let mut writer = std::io::BufWriter::new(File::create(&path).map_err(|e| e.to_string())?);
    io::write_partition(&mut writer, &partition, infinite_stability)?;
    println!("Wrote {} clusters to {}.", selected.len(), path.display());

    Ok(())
}
