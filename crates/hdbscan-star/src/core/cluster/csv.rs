//! Writing the `ClusterTree` to a CSV file.

use std::io::Write;

use super::{Cluster, ClusterTree};
use crate::propagation::constraint_ratio;

impl ClusterTree {
    /// Returns the CSV fields for the cluster.
    ///
    /// The columns are: label, birth level, death level, stability, constraint
    /// score, virtual-child constraint score, hierarchy file offset and parent
    /// label (`0` for the root). Constraint scores are `0.5 * satisfied / total`.
    #[must_use]
    pub fn csv_record(&self, cluster: &Cluster) -> [String; 8] {
        let score = |satisfied| constraint_ratio(satisfied, self.num_constraints).to_string();
        [
            cluster.label.to_string(),
            cluster.birth_level.to_string(),
            cluster.death_level.to_string(),
            cluster.stability.to_string(),
            score(cluster.num_constraints_satisfied),
            score(cluster.virtual_child_constraints_satisfied),
            cluster.file_offset.to_string(),
            cluster.parent.unwrap_or(0).to_string(),
        ]
    }

    /// Returns the CSV row for the cluster. See [`csv_record`](Self::csv_record).
    #[must_use]
    pub fn csv_row(&self, cluster: &Cluster) -> String {
        self.csv_record(cluster).join(",")
    }

    /// Writes one row per cluster, in label order.
    ///
    /// # Errors
    ///
    /// - If any row cannot be written.
    pub fn write_csv<W: Write>(&self, writer: &mut W) -> Result<(), String> {
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
        for cluster in self.clusters() {
            writer.write_record(self.csv_record(cluster)).map_err(|e| e.to_string())?;
        }
        writer.flush().map_err(|e| e.to_string())
    }

    /// Writes the tree to a CSV file at the given path.
    ///
    /// # Errors
    ///
    /// - If the file cannot be created.
    /// - If any row cannot be written to the file.
    pub fn write_to_csv<P: AsRef<std::path::Path>>(&self, path: &P) -> Result<(), String> {
        let file = std::fs::File::create(path).map_err(|e| e.to_string())?;
        self.write_csv(&mut std::io::BufWriter::new(file))
    }
}
