//! A compact, sparse record of every point's label across density levels.

use serde::{Deserialize, Serialize};

/// The label of every point at every recorded density level.
///
/// Instead of a dense `levels x points` table, each point keeps the list of
/// `(density, label)` transitions, ordered by decreasing density. An entry
/// `(d, l)` means the point had label `l` at density `d` and at every level
/// above `d` up to the previous entry. Looking up a level therefore returns
/// the label of the entry with the largest density not above it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HierarchyMatrix {
    /// The density levels of the rows, in decreasing order. The last is `0`.
    densities: Vec<f64>,
    /// For each point, its `(density, label)` transitions in decreasing density.
    histories: Vec<Vec<(f64, usize)>>,
    /// The points in lexicographic order of their label histories.
    order: Vec<usize>,
    /// The position of each point in `order`.
    positions: Vec<usize>,
    /// For each point, the last cluster it belonged to before becoming noise.
    last_clusters: Vec<usize>,
    /// The largest label recorded.
    max_label: usize,
}

impl HierarchyMatrix {
    /// Creates an empty matrix over `num_points` points.
    #[must_use]
    pub fn new(num_points: usize) -> Self {
        Self {
            densities: Vec::new(),
            histories: vec![Vec::new(); num_points],
            order: (0..num_points).collect(),
            positions: (0..num_points).collect(),
            last_clusters: vec![1; num_points],
            max_label: 0,
        }
    }

    /// Appends a density level.
    pub fn record_density(&mut self, density: f64) {
        self.densities.push(density);
    }

    /// Records that `point` had `label` down to `density`.
    ///
    /// Densities must be recorded in decreasing order for each point; a repeated
    /// density overwrites the previous label.
    pub fn set_label(&mut self, point: usize, density: f64, label: usize) {
        let history = &mut self.histories[point];
        match history.last_mut() {
            Some(last) if last.0 == density => last.1 = label,
            _ => history.push((density, label)),
        }
        self.max_label = self.max_label.max(label);
    }

    /// The label of `point` at the given density level, `0` if it was noise.
    #[must_use]
    pub fn label_at(&self, point: usize, density: f64) -> usize {
        self.histories[point]
            .iter()
            .find(|&&(d, _)| d <= density)
            .map_or(0, |&(_, label)| label)
    }

    /// The recorded density levels, in decreasing order.
    #[must_use]
    pub fn densities(&self) -> &[f64] {
        &self.densities
    }

    /// The index of the first recorded level equal to `density`.
    #[must_use]
    pub fn level_index_of(&self, density: f64) -> Option<usize> {
        self.densities.iter().position(|&d| d == density)
    }

    /// The `(density, label)` transitions of a point.
    #[must_use]
    pub fn history(&self, point: usize) -> &[(f64, usize)] {
        &self.histories[point]
    }

    /// The number of points.
    #[must_use]
    pub fn num_points(&self) -> usize {
        self.histories.len()
    }

    /// The largest cluster label recorded.
    #[must_use]
    pub const fn max_label(&self) -> usize {
        self.max_label
    }

    /// The points in lexicographic order of their label histories.
    #[must_use]
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// The position of a point in [`order`](Self::order).
    #[must_use]
    pub fn position_of(&self, point: usize) -> usize {
        self.positions[point]
    }

    /// The last cluster a point belonged to before becoming noise.
    #[must_use]
    pub fn last_cluster(&self, point: usize) -> usize {
        self.last_clusters[point]
    }

    /// Orders the points by their labels at each level, the highest level
    /// being the most significant. Ties keep point order.
    pub fn lexicographic_sort(&mut self) {
        let keys = (0..self.num_points())
            .map(|p| self.densities.iter().map(|&d| self.label_at(p, d)).collect::<Vec<_>>())
            .collect::<Vec<_>>();

        let mut order = (0..self.num_points()).collect::<Vec<_>>();
        order.sort_by(|&a, &b| keys[a].cmp(&keys[b]));

        for (position, &point) in order.iter().enumerate() {
            self.positions[point] = position;
        }
        self.order = order;
    }

    /// Sets each point's last cluster to the last non-noise label in its
    /// history, or the root if it was never in another cluster.
    pub fn update_last_clusters(&mut self) {
        for (last, history) in self.last_clusters.iter_mut().zip(&self.histories) {
            *last = history
                .iter()
                .rev()
                .find(|&&(_, label)| label != 0)
                .map_or(1, |&(_, label)| label);
        }
    }
}
