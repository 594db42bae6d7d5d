//! A `FlatVec` is a dataset that is stored as a flat vector.

use serde::{Deserialize, Serialize};

/// A `FlatVec` is a dataset that is stored as a flat vector.
///
/// The points are read-only; every stage of HDBSCAN* refers to them by their
/// index in the vector.
///
/// # Type Parameters
///
/// - `I`: The type of the points in the dataset.
#[derive(Clone, Serialize, Deserialize)]
pub struct FlatVec<I> {
    /// The points in the dataset.
    pub(crate) instances: Vec<I>,
    /// The number of attributes of each point.
    pub(crate) dimensionality: usize,
    /// The name of the dataset.
    pub(crate) name: String,
}

impl<I> FlatVec<I> {
    /// Creates a new `FlatVec` with an explicit dimensionality.
    ///
    /// The dimensionality is only used by the all-points core distance, where
    /// it is the exponent of the density kernel.
    ///
    /// # Errors
    ///
    /// * If the instances are empty.
    /// * If the dimensionality is zero.
    pub fn new(instances: Vec<I>, dimensionality: usize) -> Result<Self, String> {
        if instances.is_empty() {
            Err("The instances are empty.".to_string())
        } else if dimensionality == 0 {
            Err("The dimensionality must be positive.".to_string())
        } else {
            Ok(Self {
                instances,
                dimensionality,
                name: "Unknown FlatVec".to_string(),
            })
        }
    }

    /// Sets the name of the dataset.
    #[must_use]
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// The name of the dataset.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The number of points in the dataset.
    #[must_use]
    pub fn cardinality(&self) -> usize {
        self.instances.len()
    }

    /// The number of attributes of each point.
    #[must_use]
    pub const fn dimensionality(&self) -> usize {
        self.dimensionality
    }

    /// Returns the point at the given index.
    #[must_use]
    pub fn get(&self, index: usize) -> &I {
        &self.instances[index]
    }

    /// All the points, in index order.
    #[must_use]
    pub fn instances(&self) -> &[I] {
        &self.instances
    }
}

impl<T> FlatVec<Vec<T>> {
    /// Creates a new `FlatVec` from tabular data.
    ///
    /// The data are assumed to be a 2d array where each row is a point. The
    /// dimensionality of the dataset is set to the number of columns.
    ///
    /// # Errors
    ///
    /// * If the instances are empty.
    /// * If the rows do not all have the same, non-zero, length.
    pub fn new_array(instances: Vec<Vec<T>>) -> Result<Self, String> {
        let dimensionality = instances.first().map_or(0, Vec::len);
        if let Some(i) = instances.iter().position(|row| row.len() != dimensionality) {
            return Err(format!(
                "Row {i} has {} attributes but the first row has {dimensionality}.",
                instances[i].len()
            ));
        }
        Self::new(instances, dimensionality)
    }
}
