//! Pairwise must-link / cannot-link constraints between points.

use serde::{Deserialize, Serialize};

/// The two kinds of pairwise constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstraintKind {
    /// The two points should end up in the same cluster.
    MustLink,
    /// The two points should not end up in the same cluster.
    CannotLink,
}

impl std::str::FromStr for ConstraintKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ml" | "must-link" | "mustlink" => Ok(Self::MustLink),
            "cl" | "cannot-link" | "cannotlink" => Ok(Self::CannotLink),
            _ => Err(format!("Unknown constraint type: {s}")),
        }
    }
}

impl std::fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MustLink => write!(f, "ml"),
            Self::CannotLink => write!(f, "cl"),
        }
    }
}

/// A constraint between two points, referred to by index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Constraint {
    /// The first point.
    pub a: usize,
    /// The second point.
    pub b: usize,
    /// Whether the points must or cannot be linked.
    pub kind: ConstraintKind,
}

impl Constraint {
    /// Creates a new must-link constraint.
    #[must_use]
    pub const fn must_link(a: usize, b: usize) -> Self {
        Self {
            a,
            b,
            kind: ConstraintKind::MustLink,
        }
    }

    /// Creates a new cannot-link constraint.
    #[must_use]
    pub const fn cannot_link(a: usize, b: usize) -> Self {
        Self {
            a,
            b,
            kind: ConstraintKind::CannotLink,
        }
    }
}
