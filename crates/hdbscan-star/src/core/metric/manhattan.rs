//! The `Manhattan` distance metric.

use distances::Number;

use super::{Metric, ParMetric};

/// The `Manhattan` distance metric, the sum of absolute coordinate differences.
pub struct Manhattan;

impl<I: AsRef<[T]>, T: Number> Metric<I, T> for Manhattan {
    fn distance(&self, a: &I, b: &I) -> T {
        distances::vectors::manhattan(a.as_ref(), b.as_ref())
    }

    fn name(&self) -> &str {
        "manhattan"
    }

    fn has_symmetry(&self) -> bool {
        true
    }

    fn is_expensive(&self) -> bool {
        false
    }
}

impl<I: AsRef<[U]> + Send + Sync, U: Number> ParMetric<I, U> for Manhattan {}
