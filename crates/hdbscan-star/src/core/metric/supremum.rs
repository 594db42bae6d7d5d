//! The `Supremum` (Chebyshev) distance metric.

use distances::Number;

use super::{Metric, ParMetric};

/// The `Supremum` distance metric, the largest absolute coordinate difference.
pub struct Supremum;

impl<I: AsRef<[T]>, T: Number> Metric<I, T> for Supremum {
    fn distance(&self, a: &I, b: &I) -> T {
        distances::vectors::chebyshev(a.as_ref(), b.as_ref())
    }

    fn name(&self) -> &str {
        "supremum"
    }

    fn has_symmetry(&self) -> bool {
        true
    }

    fn is_expensive(&self) -> bool {
        false
    }
}

impl<I: AsRef<[U]> + Send + Sync, U: Number> ParMetric<I, U> for Supremum {}
