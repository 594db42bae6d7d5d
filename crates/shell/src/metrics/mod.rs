//! Distance functions selectable from the command line.

use hdbscan_star::metric::ParMetric;

/// The available distance functions.
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
pub enum Metric {
    /// The L2 distance.
    #[clap(name = "euclidean")]
    Euclidean,
    /// One minus the cosine similarity.
    #[clap(name = "cosine")]
    Cosine,
    /// One minus the Pearson correlation.
    #[clap(name = "pearson")]
    Pearson,
    /// The L1 distance.
    #[clap(name = "manhattan")]
    Manhattan,
    /// The L-infinity distance.
    #[clap(name = "supremum")]
    Supremum,
    /// One minus the Tanimoto coefficient.
    #[clap(name = "tanimoto")]
    Tanimoto,
}

impl Metric {
    /// The name of the distance function.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Euclidean => "euclidean",
            Self::Cosine => "cosine",
            Self::Pearson => "pearson",
            Self::Manhattan => "manhattan",
            Self::Supremum => "supremum",
            Self::Tanimoto => "tanimoto",
        }
    }

    /// Get the `Metric` for the distance function.
    pub fn shell_metric(self) -> Result<Box<dyn ParMetric<Vec<f64>, f64>>, String> {
        hdbscan_star::metric::from_name(self.name())
    }
}
