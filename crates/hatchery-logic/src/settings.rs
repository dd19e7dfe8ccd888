//! Server rate settings and the rate-change events that update them.
//!
//! All speeds are multipliers on the base game rates and default to 1.0.
//! Unknown JSON fields are rejected so a typo in a settings file does not
//! silently fall back to a default.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::clock::Timestamp;
use crate::error::Result;
use crate::validation::{check_positive, ensure_valid, ValidationIssue};

/// Rate multipliers in force on a server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RateSettings {
    pub maturation_speed: f64,
    pub hatch_speed: f64,
    pub consumption_speed: f64,
    /// Opaque on/off switches owned by the host application.
    pub flags: BTreeMap<String, bool>,
    /// Caretaker effectiveness; consumption is divided by it.
    pub nursing_multiplier: Option<f64>,
    /// Creatures neither eat nor spoil food while out of render range, so
    /// every duration is measured in rendered time only.
    pub stasis_mode: bool,
}

impl Default for RateSettings {
    fn default() -> Self {
        Self {
            maturation_speed: 1.0,
            hatch_speed: 1.0,
            consumption_speed: 1.0,
            flags: BTreeMap::new(),
            nursing_multiplier: None,
            stasis_mode: false,
        }
    }
}

impl RateSettings {
    /// Settings with only the maturation speed changed.
    pub fn with_maturation(maturation_speed: f64) -> Self {
        Self {
            maturation_speed,
            ..Self::default()
        }
    }

    /// Nursing divisor, 1.0 when no caretaker is used.
    pub fn nursing_divisor(&self) -> f64 {
        self.nursing_multiplier.unwrap_or(1.0)
    }

    /// Value of a host flag; unset flags read as `false`.
    pub fn flag(&self, name: &str) -> bool {
        self.flags.get(name).copied().unwrap_or(false)
    }

    pub fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        check_positive(&mut issues, "maturation_speed", "settings", self.maturation_speed);
        check_positive(&mut issues, "hatch_speed", "settings", self.hatch_speed);
        check_positive(&mut issues, "consumption_speed", "settings", self.consumption_speed);
        if let Some(nursing) = self.nursing_multiplier {
            check_positive(&mut issues, "nursing_multiplier", "settings", nursing);
            if nursing.is_finite() && nursing > 0.0 && nursing < 1.0 {
                issues.push(ValidationIssue::warning(
                    "nursing_multiplier",
                    format!(
                        "settings: nursing_multiplier {nursing} below 1.0 increases consumption"
                    ),
                ));
            }
        }
        issues
    }

    pub fn ensure_valid(&self) -> Result<()> {
        ensure_valid(&self.validate())
    }

    /// Settings after `change` takes effect. Flags, nursing, and stasis are
    /// not part of the rate feed and carry over unchanged.
    pub fn apply(&self, change: &RateChange) -> Self {
        Self {
            maturation_speed: change.maturation_multiplier,
            hatch_speed: change.hatch_multiplier,
            consumption_speed: change.consumption_multiplier,
            ..self.clone()
        }
    }

    /// Whether `change` alters the maturation speed.
    pub fn changes_maturation(&self, change: &RateChange) -> bool {
        (self.maturation_speed - change.maturation_multiplier).abs() > f64::EPSILON
    }
}

/// An official rate change, possibly learned about after it took effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateChange {
    pub effective_at: Timestamp,
    pub maturation_multiplier: f64,
    pub hatch_multiplier: f64,
    pub consumption_multiplier: f64,
}

impl RateChange {
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        let context = "rate change";
        check_positive(&mut issues, "maturation_multiplier", context, self.maturation_multiplier);
        check_positive(&mut issues, "hatch_multiplier", context, self.hatch_multiplier);
        check_positive(&mut issues, "consumption_multiplier", context, self.consumption_multiplier);
        issues
    }
}
