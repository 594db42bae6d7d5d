//! Utility functions for the crate.

use std::cmp::Ordering;

/// The text prepended to partition and outlier-score reports when some
/// cluster had infinite stability.
pub const INFINITE_STABILITY_WARNING: &str = "----------------------------------------------- WARNING -----------------------------------------------
With your current settings, the density of some points is infinite (their core distance is zero).
This usually happens when there are duplicate points in the data set. Stabilities of clusters
that contain such points are infinite, and flat partitions and outlier scores are only approximate.
Consider removing duplicates, increasing min_points, or using the all-points core distance.
-------------------------------------------------------------------------------------------------------";

/// The largest finite value in the slice, or `None` if there is none.
pub fn max_finite(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    values.into_iter().filter(|v| v.is_finite()).reduce(f64::max)
}

/// Descending comparison of floats by IEEE total order.
pub fn descending(a: &f64, b: &f64) -> Ordering {
    b.total_cmp(a)
}

#[cfg(test)]
mod tests {
    use super::{descending, max_finite};

    #[test]
    fn finite_and_order() {
        assert_eq!(max_finite([1.0, f64::INFINITY, 2.0, f64::NAN]), Some(2.0));
        assert_eq!(max_finite([f64::INFINITY]), None);

        let mut values = vec![1.0, 3.0, 2.0];
        values.sort_by(descending);
        assert_eq!(values, vec![3.0, 2.0, 1.0]);
    }
}
