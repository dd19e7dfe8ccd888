//! How much food to put in a trough.
//!
//! Everything here is derived from the closed-form drain curve: how many
//! stacks a roster eats before they rot, how many stacks cover a desired
//! duration, and what stops a full container from lasting longer. A single
//! fresh food needs no event loop, so none of it is bounded by the trough
//! simulator's horizon.

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, FoodStats};
use crate::constants::{DRAIN_SEARCH_STEPS, EPSILON};
use crate::error::{require_non_negative, require_positive, Result};
use crate::settings::RateSettings;
use crate::trough::{resolve_roster, ConsumerGroup, TroughConfig, TroughEntry};
use crate::validation::ensure_valid;

/// Why a full container falls short of the desired duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitReason {
    /// Food rots before the desired duration no matter how much is loaded.
    Spoilage,
    /// The container cannot hold enough.
    Capacity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockPlan {
    /// Stacks eaten over the desired duration.
    pub stacks: u32,
    pub is_achievable: bool,
    pub limit_reason: Option<LimitReason>,
    /// How long a completely full container lasts.
    pub max_duration_seconds: f64,
    /// Containers needed side by side when capacity is the limit.
    pub troughs_needed: u32,
    /// Extra loads of a full container to cover the desired duration.
    pub refills_needed: u32,
    /// Stacks beyond what the roster eats before food spoils.
    pub wasted_stacks: f64,
    pub max_stacks_before_waste: f64,
}

/// A default fill level: as much as gets eaten before it spoils, bounded
/// by the container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub stacks: u32,
    pub duration_seconds: f64,
    pub spoiled_points: f64,
}

/// Consumer groups that eat `food`. Entries that cannot eat it are left
/// out with a warning; a roster with no eaters plans like an empty one.
fn eaters<'a>(
    roster: &[TroughEntry],
    food: &FoodStats,
    settings: &RateSettings,
    catalog: &'a Catalog,
) -> Result<Vec<ConsumerGroup<'a>>> {
    let groups = resolve_roster(roster, settings, catalog)?;
    let total = groups.len();
    let eaters: Vec<_> = groups.into_iter().filter(|g| g.eats(food.kind)).collect();
    if eaters.len() < total {
        log::warn!(
            "{} of {total} roster entries cannot eat {} and are left out",
            total - eaters.len(),
            food.name
        );
    }
    Ok(eaters)
}

fn roster_consumed_by(groups: &[ConsumerGroup<'_>], seconds: f64) -> f64 {
    groups.iter().map(|g| g.consumed_between(0.0, seconds)).sum()
}

/// Seconds until `points` of fresh food are gone: eaten, or spoiled at
/// `spoil_seconds`, whichever comes first.
fn lasts_for(groups: &[ConsumerGroup<'_>], points: f64, spoil_seconds: f64) -> f64 {
    if points <= 0.0 {
        return 0.0;
    }
    if roster_consumed_by(groups, spoil_seconds) <= points {
        return spoil_seconds;
    }
    if let [group] = groups {
        let per_member = points / group.quantity;
        return group.profile.time_to_consume(0.0, per_member).min(spoil_seconds);
    }
    let (mut lo, mut hi) = (0.0, spoil_seconds);
    for _ in 0..DRAIN_SEARCH_STEPS {
        let mid = 0.5 * (lo + hi);
        if roster_consumed_by(groups, mid) < points {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    hi
}

/// Whole stacks holding at least `points`.
fn stacks_covering(points: f64, food: &FoodStats) -> u32 {
    let stacks = points / food.points_per_stack();
    if stacks <= EPSILON {
        0
    } else {
        (stacks - EPSILON).ceil() as u32
    }
}

/// Stacks the roster finishes within one spoil timer. Fractional.
pub fn max_stacks_before_waste(
    roster: &[TroughEntry],
    food_name: &str,
    spoil_multiplier: f64,
    settings: &RateSettings,
    catalog: &Catalog,
) -> Result<f64> {
    let spoil_multiplier = require_positive("spoil_multiplier", spoil_multiplier)?;
    let food = catalog.food(food_name)?;
    let groups = eaters(roster, food, settings, catalog)?;
    Ok(stacks_before_waste(&groups, food, spoil_multiplier))
}

fn stacks_before_waste(
    groups: &[ConsumerGroup<'_>],
    food: &FoodStats,
    spoil_multiplier: f64,
) -> f64 {
    roster_consumed_by(groups, food.spoil_seconds * spoil_multiplier) / food.points_per_stack()
}

/// Plan the stock for `desired_seconds` of feeding.
pub fn stacks_for_duration(
    roster: &[TroughEntry],
    food_name: &str,
    config: &TroughConfig,
    settings: &RateSettings,
    desired_seconds: f64,
    catalog: &Catalog,
) -> Result<StockPlan> {
    ensure_valid(&config.validate())?;
    let desired_seconds = require_non_negative("desired_seconds", desired_seconds)?;
    let food = catalog.food(food_name)?;
    let groups = eaters(roster, food, settings, catalog)?;

    if groups.is_empty() {
        return Ok(StockPlan {
            stacks: 0,
            is_achievable: true,
            limit_reason: None,
            max_duration_seconds: f64::INFINITY,
            troughs_needed: 0,
            refills_needed: 0,
            wasted_stacks: 0.0,
            max_stacks_before_waste: 0.0,
        });
    }

    let stacks = stacks_covering(roster_consumed_by(&groups, desired_seconds), food);
    let before_waste = stacks_before_waste(&groups, food, config.spoil_multiplier);
    let capacity = config.capacity_in_stacks(food);
    let spoil_seconds = config.effective_spoil_seconds(food);
    let max_duration = lasts_for(&groups, capacity * food.points_per_stack(), spoil_seconds);

    let is_achievable = desired_seconds <= max_duration + EPSILON * max_duration.max(1.0);
    let limit_reason = if is_achievable {
        None
    } else if desired_seconds > spoil_seconds {
        Some(LimitReason::Spoilage)
    } else {
        Some(LimitReason::Capacity)
    };

    let troughs_needed = match limit_reason {
        Some(LimitReason::Capacity) if capacity > 0.0 => {
            (stacks as f64 / capacity - EPSILON).ceil().max(1.0) as u32
        }
        _ if stacks == 0 => 0,
        _ => 1,
    };
    let refills_needed = if is_achievable || max_duration <= 0.0 {
        0
    } else {
        ((desired_seconds / max_duration - EPSILON).ceil() as u32).saturating_sub(1)
    };

    log::debug!(
        "{food_name}: {stacks} stacks for {desired_seconds:.0} s, \
         full container lasts {max_duration:.0} s ({limit_reason:?})"
    );

    Ok(StockPlan {
        stacks,
        is_achievable,
        limit_reason,
        max_duration_seconds: max_duration,
        troughs_needed,
        refills_needed,
        wasted_stacks: (stacks as f64 - before_waste).max(0.0),
        max_stacks_before_waste: before_waste,
    })
}

/// Fill with what the roster eats before it spoils, at least one stack and
/// at most a full container.
pub fn recommend(
    roster: &[TroughEntry],
    food_name: &str,
    config: &TroughConfig,
    settings: &RateSettings,
    catalog: &Catalog,
) -> Result<Recommendation> {
    ensure_valid(&config.validate())?;
    let food = catalog.food(food_name)?;
    let groups = eaters(roster, food, settings, catalog)?;
    if groups.is_empty() {
        return Ok(Recommendation {
            stacks: 0,
            duration_seconds: 0.0,
            spoiled_points: 0.0,
        });
    }

    let ceiling = (config.capacity_in_stacks(food) + EPSILON).floor();
    let before_waste =
        (stacks_before_waste(&groups, food, config.spoil_multiplier) + EPSILON).floor();
    let stacks = before_waste.max(1.0).min(ceiling).max(0.0) as u32;
    let points = stacks as f64 * food.points_per_stack();
    let duration = lasts_for(&groups, points, config.effective_spoil_seconds(food));
    let eaten = roster_consumed_by(&groups, duration).min(points);

    Ok(Recommendation {
        stacks,
        duration_seconds: duration,
        spoiled_points: (points - eaten).max(0.0),
    })
}
