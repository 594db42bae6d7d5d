//! The `Tanimoto` distance.

use super::{Metric, ParMetric};

/// The `Tanimoto` distance, `1 - a.b / (|a|^2 + |b|^2 - a.b)`.
///
/// Two all-zero vectors are at distance `0`.
pub struct Tanimoto;

impl<I: AsRef<[f64]>> Metric<I, f64> for Tanimoto {
    fn distance(&self, a: &I, b: &I) -> f64 {
        let (dot, aa, bb) = a
            .as_ref()
            .iter()
            .zip(b.as_ref())
            .fold((0.0, 0.0, 0.0), |(d, aa, bb), (&x, &y)| (d + x * y, aa + x * x, bb + y * y));

        let denominator = aa + bb - dot;
        if denominator == 0.0 {
            0.0
        } else {
            1.0 - dot / denominator
        }
    }

    fn name(&self) -> &str {
        "tanimoto"
    }

    fn has_symmetry(&self) -> bool {
        true
    }

    fn is_expensive(&self) -> bool {
        false
    }
}

impl<I: AsRef<[f64]> + Send + Sync> ParMetric<I, f64> for Tanimoto {}
