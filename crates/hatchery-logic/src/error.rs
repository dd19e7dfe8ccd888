//! Error taxonomy shared by every module in the crate.

use serde::{Deserialize, Serialize};

/// Errors surfaced by the core.
///
/// Business edge cases (an empty roster, an empty trough) are not errors:
/// they produce neutral results. Infeasible plans are reported through
/// [`crate::planner::StockPlan::is_achievable`].
#[derive(Debug, thiserror::Error)]
pub enum HatcheryError {
    /// A rate, weight, or time constant was non-positive or non-finite.
    #[error("invalid input for `{field}`: {reason}")]
    InvalidInput {
        field: &'static str,
        reason: String,
    },

    /// A species or food name is not present in the catalog.
    #[error("unknown {kind} `{name}`")]
    Unresolvable { kind: RefKind, name: String },

    /// Catalog JSON failed to parse.
    #[error("catalog parse error: {0}")]
    Catalog(#[from] serde_json::Error),

    /// Binary snapshot failed to encode or decode.
    #[error("snapshot error: {0}")]
    Snapshot(#[from] bincode::Error),

    /// Snapshot was written by an incompatible format version.
    #[error("snapshot version {found} is not supported (expected {expected})")]
    SnapshotVersion { found: u32, expected: u32 },
}

/// Which catalog a failed lookup was made against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefKind {
    Species,
    Food,
}

impl std::fmt::Display for RefKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Species => f.write_str("species"),
            Self::Food => f.write_str("food"),
        }
    }
}

pub type Result<T> = std::result::Result<T, HatcheryError>;

impl HatcheryError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            reason: reason.into(),
        }
    }
}

/// Reject values that are not strictly positive and finite.
pub(crate) fn require_positive(field: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(HatcheryError::invalid(
            field,
            format!("must be positive and finite, got {value}"),
        ))
    }
}

/// Reject values that are negative or not finite. Zero is allowed.
pub(crate) fn require_non_negative(field: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(HatcheryError::invalid(
            field,
            format!("must be non-negative and finite, got {value}"),
        ))
    }
}

/// Reject fractions outside `[0, 1]`.
pub(crate) fn require_fraction(field: &'static str, value: f64) -> Result<f64> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(HatcheryError::invalid(
            field,
            format!("must lie in [0, 1], got {value}"),
        ))
    }
}
