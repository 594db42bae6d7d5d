//! Data formats supported in the CLI.

mod npy;

use std::path::Path;

use hdbscan_star::FlatVec;

/// Data formats supported in the CLI.
pub enum Format {
    /// Npy array format, one point per row.
    Npy,
    /// Comma-separated text, one point per line.
    Csv,
}

impl TryFrom<&Path> for Format {
    type Error = String;

    fn try_from(path: &Path) -> Result<Self, Self::Error> {
        match path.extension().and_then(|s| s.to_str()) {
            Some("npy") => Ok(Self::Npy),
            Some("csv" | "txt") => Ok(Self::Csv),
            Some(ext) => Err(format!("Unknown data format {ext} for path: {}", path.display())),
            None => Err(format!(
                "Could not determine data format without extension for path: {}",
                path.display()
            )),
        }
    }
}

/// Reads the data from the file at the given path, named after the file stem.
pub fn read<P: AsRef<Path>>(path: P) -> Result<FlatVec<Vec<f64>>, String> {
    let path = path.as_ref();
    let instances = match Format::try_from(path)? {
        Format::Npy => npy::read(path)?,
        Format::Csv => hdbscan_star::io::read_dataset(&path)?,
    };
    let data = FlatVec::new_array(instances)?;
    Ok(data.with_name(&dataset_name(path)))
}

/// The file stem of a path, used to name the output files.
pub fn dataset_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map_or_else(|| "dataset".to_string(), ToString::to_string)
}
