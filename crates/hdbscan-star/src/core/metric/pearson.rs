//! The `Pearson` correlation distance.

use super::{Metric, ParMetric};

/// The `Pearson` correlation distance, `1 - r(a, b)`.
///
/// Vectors with zero variance have no defined correlation; their distance
/// to anything is `1`.
pub struct Pearson;

impl<I: AsRef<[f64]>> Metric<I, f64> for Pearson {
    #[allow(clippy::cast_precision_loss)]
    fn distance(&self, a: &I, b: &I) -> f64 {
        let (a, b) = (a.as_ref(), b.as_ref());
        let n = a.len().min(b.len());
        if n == 0 {
            return 1.0;
        }

        let mean_a = a[..n].iter().sum::<f64>() / n as f64;
        let mean_b = b[..n].iter().sum::<f64>() / n as f64;

        let (cov, var_a, var_b) = a
            .iter()
            .zip(b)
            .map(|(&x, &y)| (x - mean_a, y - mean_b))
            .fold((0.0, 0.0, 0.0), |(c, va, vb), (x, y)| (c + x * y, va + x * x, vb + y * y));

        let denominator = (var_a * var_b).sqrt();
        if denominator == 0.0 {
            1.0
        } else {
            1.0 - cov / denominator
        }
    }

    fn name(&self) -> &str {
        "pearson"
    }

    fn has_symmetry(&self) -> bool {
        true
    }

    fn is_expensive(&self) -> bool {
        false
    }
}

impl<I: AsRef<[f64]> + Send + Sync> ParMetric<I, f64> for Pearson {}
