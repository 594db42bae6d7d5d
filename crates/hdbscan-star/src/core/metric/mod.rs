//! The `Metric` trait is used for all distance computations in HDBSCAN*.
//!
//! Any distance function may be plugged in. The density estimates assume
//! non-negativity and symmetry; the triangle inequality is not required.

use distances::Number;

mod cosine;
mod euclidean;
mod manhattan;
mod pearson;
mod supremum;
mod tanimoto;

pub use cosine::Cosine;
pub use euclidean::Euclidean;
pub use manhattan::Manhattan;
pub use pearson::Pearson;
pub use supremum::Supremum;
pub use tanimoto::Tanimoto;

/// The `Metric` trait is used for all distance computations in HDBSCAN*.
///
/// # Type Parameters
///
/// - `I`: The type of the items.
/// - `T`: The type of the distance values.
///
/// # Example
///
/// A metric for the number of differing positions between two byte strings:
///
/// ```rust
/// use hdbscan_star::metric::{Metric, ParMetric};
///
/// struct Hamming;
///
/// impl<I: AsRef<[u8]>> Metric<I, usize> for Hamming {
///     fn distance(&self, a: &I, b: &I) -> usize {
///         a.as_ref().iter().zip(b.as_ref()).filter(|(x, y)| x != y).count()
///     }
///
///     fn name(&self) -> &str {
///         "hamming"
///     }
///
///     fn has_symmetry(&self) -> bool {
///         true
///     }
///
///     fn is_expensive(&self) -> bool {
///         false
///     }
/// }
///
/// impl<I: AsRef<[u8]> + Send + Sync> ParMetric<I, usize> for Hamming {}
///
/// let metric = Hamming;
/// assert_eq!(metric.distance(&b"hello", &b"world"), 4);
/// assert_eq!(metric.par_distance(&b"hello", &b"world"), 4);
/// ```
pub trait Metric<I, T: Number> {
    /// Call the metric on two items.
    fn distance(&self, a: &I, b: &I) -> T;

    /// The name of the metric.
    fn name(&self) -> &str;

    /// Whether the metric is symmetric.
    ///
    /// Symmetry is defined as `d(a, b) = d(b, a)` for all items `a` and `b`.
    ///
    /// Mutual reachability, and hence the MST, is only well defined for
    /// symmetric metrics.
    fn has_symmetry(&self) -> bool;

    /// Whether the metric is expensive to compute.
    ///
    /// We say that a metric is expensive if it costs more than linear time in
    /// the size of the items to compute the distance between two items. The
    /// pipeline switches to the parallel core-distance and MST routines for
    /// expensive metrics.
    fn is_expensive(&self) -> bool;
}

/// Parallel version of [`Metric`](crate::core::metric::Metric).
#[allow(clippy::module_name_repetitions)]
pub trait ParMetric<I: Send + Sync, T: Number>: Metric<I, T> + Send + Sync {
    /// Parallel version of [`Metric::distance`](crate::core::metric::Metric::distance).
    ///
    /// The default implementation calls the non-parallel version of the
    /// distance function.
    fn par_distance(&self, a: &I, b: &I) -> T {
        self.distance(a, b)
    }
}

impl<I, T: Number> Metric<I, T> for Box<dyn Metric<I, T>> {
    fn distance(&self, a: &I, b: &I) -> T {
        (**self).distance(a, b)
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn has_symmetry(&self) -> bool {
        (**self).has_symmetry()
    }

    fn is_expensive(&self) -> bool {
        (**self).is_expensive()
    }
}

impl<I, T: Number> Metric<I, T> for Box<dyn ParMetric<I, T>>
where
    I: Send + Sync,
{
    fn distance(&self, a: &I, b: &I) -> T {
        (**self).distance(a, b)
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn has_symmetry(&self) -> bool {
        (**self).has_symmetry()
    }

    fn is_expensive(&self) -> bool {
        (**self).is_expensive()
    }
}

impl<I: Send + Sync, T: Number> ParMetric<I, T> for Box<dyn ParMetric<I, T>> {
    fn par_distance(&self, a: &I, b: &I) -> T {
        (**self).par_distance(a, b)
    }
}

/// Looks up one of the built-in metrics over `f64` vectors by name.
///
/// The recognized names are `euclidean`, `cosine`, `pearson`, `manhattan`,
/// `supremum` and `tanimoto`.
///
/// # Errors
///
/// - If the name is not one of the built-in metrics.
pub fn from_name<I: AsRef<[f64]> + Send + Sync + 'static>(name: &str) -> Result<Box<dyn ParMetric<I, f64>>, String> {
    match name.to_lowercase().as_str() {
        "euclidean" => Ok(Box::new(Euclidean)),
        "cosine" => Ok(Box::new(Cosine)),
        "pearson" => Ok(Box::new(Pearson)),
        "manhattan" => Ok(Box::new(Manhattan)),
        "supremum" => Ok(Box::new(Supremum)),
        "tanimoto" => Ok(Box::new(Tanimoto)),
        _ => Err(format!("Unknown distance function: {name}")),
    }
}
