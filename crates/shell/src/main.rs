//! CLI for HDBSCAN*, density-based hierarchical clustering.

mod commands;
mod data;
mod metrics;
mod utils;

use std::path::PathBuf;

use clap::Parser;

use commands::Commands;

/// Command line arguments.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The directory in which to write the output files.
    #[arg(short('o'), long, default_value = ".")]
    out_dir: PathBuf,

    /// The name of the log file, without extension.
    #[arg(short('l'), long, default_value = "hdbscan")]
    log_name: String,

    /// The subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

fn main() -> Result<(), String> {
    let args = Args::parse();
    let (_guard, log_path) = utils::configure_logger(&args.log_name)?;
    println!("Logging to {}", log_path.display());
    ftlog::info!("Args: {args:?}");

    if !args.out_dir.exists() {
        std::fs::create_dir_all(&args.out_dir).map_err(|e| e.to_string())?;
    }

    match args.command {
        Commands::Run(run) => commands::run::run(&run, &args.out_dir)?,
        Commands::Extract(extract) => commands::extract::extract(&extract, &args.out_dir)?,
    }

    Ok(())
}
