//! Shared trough depletion simulation.
//!
//! A roster of growing creatures eats from a set of food stacks. Each stack
//! spoils all at once when its spoil timer (scaled by the container's spoil
//! multiplier) runs out. Every consumer group eats from the stack it can
//! eat that is closest to spoiling.
//!
//! The simulation is event driven. Between events each group's drain is
//! linear in time (see [`GrowthProfile`]), so the time at which a stack
//! runs dry is solved exactly. Events are:
//!
//! - a stack spoils,
//! - a stack is eaten empty,
//! - a consumer group reaches adulthood and its drain stops ramping,
//! - the safety horizon.
//!
//! A stack that runs dry at the same instant it would spoil counts as
//! eaten.

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, DietType, FoodKind, FoodStats, SpeciesStats};
use crate::constants::{EPSILON, MAX_SIMULATION_EVENTS, SIMULATION_HORIZON_SECONDS};
use crate::error::{require_non_negative, HatcheryError, Result};
use crate::maturation::{max_food_at, GrowthProfile};
use crate::settings::RateSettings;
use crate::validation::{check_positive, ensure_valid, ValidationIssue};

/// Events closer together than this are simultaneous.
const TIE_SECONDS: f64 = 1e-6;

fn one() -> f64 {
    1.0
}

// ============================================================================
// INPUT RECORDS
// ============================================================================

/// Identical creatures sharing the trough.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TroughEntry {
    pub species: String,
    pub quantity: u32,
    pub maturation_at_start: f64,
    /// Replaces the species' food stat when estimating how long the
    /// creature survives on its own reserve once the trough is empty.
    #[serde(default)]
    pub max_food_override: Option<f64>,
}

impl TroughEntry {
    pub fn new(species: impl Into<String>, quantity: u32, maturation_at_start: f64) -> Self {
        Self {
            species: species.into(),
            quantity,
            maturation_at_start,
            max_food_override: None,
        }
    }
}

/// Some number of stacks of one food.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodStack {
    pub food: String,
    /// May be fractional for a partly eaten stack.
    pub stack_count: f64,
    /// Seconds the stack has already been spoiling.
    #[serde(default)]
    pub age_seconds: f64,
}

impl FoodStack {
    pub fn fresh(food: impl Into<String>, stack_count: f64) -> Self {
        Self {
            food: food.into(),
            stack_count,
            age_seconds: 0.0,
        }
    }
}

/// What bounds how much a container holds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TroughCapacity {
    /// Inventory slots, one stack each.
    Slots(u32),
    /// Total item weight.
    Weight(f64),
}

/// Container properties.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TroughConfig {
    pub capacity: TroughCapacity,
    /// Scales every stack's spoil timer (2.0 keeps food twice as long).
    #[serde(default = "one")]
    pub spoil_multiplier: f64,
}

impl TroughConfig {
    pub fn slots(slot_count: u32) -> Self {
        Self {
            capacity: TroughCapacity::Slots(slot_count),
            spoil_multiplier: 1.0,
        }
    }

    pub fn weight(weight_capacity: f64) -> Self {
        Self {
            capacity: TroughCapacity::Weight(weight_capacity),
            spoil_multiplier: 1.0,
        }
    }

    pub fn with_spoil_multiplier(self, spoil_multiplier: f64) -> Self {
        Self {
            spoil_multiplier,
            ..self
        }
    }

    pub fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        check_positive(&mut issues, "spoil_multiplier", "trough", self.spoil_multiplier);
        match self.capacity {
            TroughCapacity::Slots(0) => issues.push(ValidationIssue::error(
                "slot_count",
                "trough: slot_count must be at least 1",
            )),
            TroughCapacity::Slots(_) => {}
            TroughCapacity::Weight(w) => {
                check_positive(&mut issues, "weight_capacity", "trough", w)
            }
        }
        issues
    }

    /// How many full stacks of `food` fit. Weight-limited containers may
    /// hold a fractional stack.
    pub fn capacity_in_stacks(&self, food: &FoodStats) -> f64 {
        match self.capacity {
            TroughCapacity::Slots(n) => n as f64,
            TroughCapacity::Weight(w) => {
                let stack_weight = food.weight * food.stack_size as f64;
                if stack_weight > 0.0 {
                    w / stack_weight
                } else {
                    0.0
                }
            }
        }
    }

    /// Spoil timer of a fresh stack of `food` in this container.
    pub fn effective_spoil_seconds(&self, food: &FoodStats) -> f64 {
        food.spoil_seconds * self.spoil_multiplier
    }
}

// ============================================================================
// OUTPUT
// ============================================================================

/// Which process ended the food supply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitingFactor {
    /// Some food rotted before it could be eaten.
    Spoilage,
    /// Everything was eaten.
    Consumption,
}

/// Result of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TroughOutcome {
    /// Seconds until the roster has no edible food left.
    pub duration_seconds: f64,
    pub eaten_points: f64,
    pub spoiled_points: f64,
    pub total_points: f64,
    pub binding: LimitingFactor,
    /// When the first creature runs out of its own food reserve after its
    /// last meal from the trough.
    pub starvation_seconds: f64,
    /// The run stopped at the safety horizon; leftover food was booked as
    /// spoiled.
    pub horizon_reached: bool,
    /// Durations count rendered time only (stasis mode).
    pub active_time_only: bool,
    pub events: usize,
}

// ============================================================================
// ROSTER
// ============================================================================

/// A resolved roster entry: `quantity` identical eaters.
#[derive(Debug, Clone)]
pub(crate) struct ConsumerGroup<'a> {
    pub species: &'a SpeciesStats,
    pub quantity: f64,
    pub profile: GrowthProfile,
    pub max_food_override: Option<f64>,
}

impl ConsumerGroup<'_> {
    pub fn diet(&self) -> DietType {
        self.species.diet
    }

    pub fn eats(&self, kind: FoodKind) -> bool {
        self.diet().can_eat(kind)
    }

    /// Points the whole group drains over `[t0, t1]`.
    pub fn consumed_between(&self, t0: f64, t1: f64) -> f64 {
        self.quantity * self.profile.consumed_between(t0, t1)
    }

    /// Seconds one member survives on its own reserve from `t`.
    fn reserve_seconds(&self, t: f64) -> f64 {
        let reserve = self
            .max_food_override
            .unwrap_or_else(|| max_food_at(self.species, self.profile.maturation_at(t)));
        self.profile.time_to_consume(t, reserve)
    }
}

/// Look up and validate every roster entry.
pub(crate) fn resolve_roster<'a>(
    entries: &[TroughEntry],
    settings: &RateSettings,
    catalog: &'a Catalog,
) -> Result<Vec<ConsumerGroup<'a>>> {
    entries
        .iter()
        .map(|entry| {
            if entry.quantity == 0 {
                return Err(HatcheryError::invalid(
                    "quantity",
                    format!("{}: quantity must be at least 1", entry.species),
                ));
            }
            if let Some(max_food) = entry.max_food_override {
                require_non_negative("max_food_override", max_food)?;
            }
            let species = catalog.species(&entry.species)?;
            Ok(ConsumerGroup {
                species,
                quantity: entry.quantity as f64,
                profile: GrowthProfile::new(species, settings, entry.maturation_at_start)?,
                max_food_override: entry.max_food_override,
            })
        })
        .collect()
}

// ============================================================================
// SIMULATION
// ============================================================================

#[derive(Debug, Clone)]
struct LiveStack {
    kind: FoodKind,
    points: f64,
    spoils_at: f64,
}

impl LiveStack {
    fn is_alive(&self, t: f64) -> bool {
        self.points > 0.0 && self.spoils_at > t
    }
}

/// Seconds for a drain of `r0 + k*s` to remove `points`, or infinity.
fn depletion_time(points: f64, r0: f64, k: f64) -> f64 {
    let disc = r0 * r0 + 2.0 * k * points;
    if disc < 0.0 {
        return f64::INFINITY;
    }
    let denom = r0 + disc.sqrt();
    if denom <= 0.0 {
        f64::INFINITY
    } else {
        2.0 * points / denom
    }
}

/// The eligible live stack closest to spoiling, first listed on ties.
fn pick_stack(group: &ConsumerGroup<'_>, stacks: &[LiveStack], t: f64) -> Option<usize> {
    stacks
        .iter()
        .enumerate()
        .filter(|(_, s)| s.is_alive(t) && group.eats(s.kind))
        .min_by(|(_, a), (_, b)| a.spoils_at.total_cmp(&b.spoils_at))
        .map(|(i, _)| i)
}

/// Run the trough until the roster has nothing edible left.
pub fn simulate_trough(
    roster: &[TroughEntry],
    stacks: &[FoodStack],
    config: &TroughConfig,
    settings: &RateSettings,
    catalog: &Catalog,
) -> Result<TroughOutcome> {
    ensure_valid(&config.validate())?;
    ensure_valid(&settings.validate())?;
    let groups = resolve_roster(roster, settings, catalog)?;

    let mut live = Vec::with_capacity(stacks.len());
    let mut slots_used = 0.0;
    for stack in stacks {
        let food = catalog.food(&stack.food)?;
        let count = require_non_negative("stack_count", stack.stack_count)?;
        let age = require_non_negative("age_seconds", stack.age_seconds)?;
        slots_used += count / config.capacity_in_stacks(food).max(EPSILON);
        live.push(LiveStack {
            kind: food.kind,
            points: count * food.points_per_stack(),
            spoils_at: config.effective_spoil_seconds(food) - age,
        });
    }
    if slots_used > 1.0 + EPSILON {
        log::warn!(
            "trough loaded to {:.0}% of capacity; simulating the full load anyway",
            slots_used * 100.0
        );
    }

    Ok(run(&groups, live, settings))
}

fn run(
    groups: &[ConsumerGroup<'_>],
    mut stacks: Vec<LiveStack>,
    settings: &RateSettings,
) -> TroughOutcome {
    let total_points: f64 = stacks.iter().map(|s| s.points).sum();
    let mut eaten = 0.0;
    let mut spoiled = 0.0;
    let mut t = 0.0;
    let mut events = 0;
    let mut horizon_reached = false;
    let mut fed_until = vec![0.0_f64; groups.len()];

    loop {
        for s in stacks.iter_mut() {
            if s.points > 0.0 && s.spoils_at <= t + TIE_SECONDS {
                log::trace!("t={t:.3}: {:.3} points spoiled", s.points);
                spoiled += s.points;
                s.points = 0.0;
            }
        }

        let targets: Vec<Option<usize>> =
            groups.iter().map(|g| pick_stack(g, &stacks, t)).collect();
        if targets.iter().all(Option::is_none) {
            break;
        }
        if t >= SIMULATION_HORIZON_SECONDS || events >= MAX_SIMULATION_EVENTS {
            horizon_reached = true;
            break;
        }
        events += 1;

        // Drain on each stack right now, and how fast it is ramping.
        let mut r0 = vec![0.0; stacks.len()];
        let mut k = vec![0.0; stacks.len()];
        for (g, target) in groups.iter().zip(&targets) {
            if let Some(i) = *target {
                r0[i] += g.quantity * g.profile.rate_at(t);
                k[i] += g.quantity * g.profile.slope_at(t);
            }
        }

        let mut next = SIMULATION_HORIZON_SECONDS;
        for g in groups {
            let adult = g.profile.adulthood_at();
            if adult > t + TIE_SECONDS {
                next = next.min(adult);
            }
        }
        for s in stacks.iter().filter(|s| s.is_alive(t)) {
            next = next.min(s.spoils_at);
        }
        let mut runs_dry_at = vec![f64::INFINITY; stacks.len()];
        for (i, s) in stacks.iter().enumerate() {
            if r0[i] > 0.0 {
                runs_dry_at[i] = t + depletion_time(s.points, r0[i], k[i]);
            }
        }
        // Running dry wins ties against spoiling.
        let earliest_dry = runs_dry_at.iter().copied().fold(f64::INFINITY, f64::min);
        if earliest_dry <= next + TIE_SECONDS {
            next = next.min(earliest_dry);
        }
        let step_end = next.max(t);

        let mut drained = vec![0.0; stacks.len()];
        for (gi, (g, target)) in groups.iter().zip(&targets).enumerate() {
            if let Some(i) = *target {
                drained[i] += g.consumed_between(t, step_end);
                fed_until[gi] = step_end;
            }
        }
        for (i, s) in stacks.iter_mut().enumerate() {
            if r0[i] <= 0.0 && drained[i] <= 0.0 {
                continue;
            }
            let bite = if runs_dry_at[i] <= step_end + TIE_SECONDS {
                s.points
            } else {
                drained[i].clamp(0.0, s.points)
            };
            eaten += bite;
            s.points -= bite;
        }
        log::trace!("t={t:.3} -> {step_end:.3}: eaten {eaten:.3}, spoiled {spoiled:.3}");
        t = step_end;
    }

    let leftover: f64 = stacks.iter().map(|s| s.points).sum();
    if horizon_reached && leftover > 0.0 {
        log::warn!(
            "trough simulation hit the {:.0} s horizon with {leftover:.1} points left; \
             counting them as spoiled",
            SIMULATION_HORIZON_SECONDS
        );
    }
    spoiled += leftover;

    let starvation_seconds = groups
        .iter()
        .zip(&fed_until)
        .map(|(g, &fed)| fed + g.reserve_seconds(fed))
        .fold(f64::INFINITY, f64::min);
    let starvation_seconds = if groups.is_empty() { 0.0 } else { starvation_seconds };

    let binding = if spoiled > EPSILON * total_points.max(1.0) {
        LimitingFactor::Spoilage
    } else {
        LimitingFactor::Consumption
    };

    log::debug!(
        "trough: {events} events, {t:.1} s, \
         eaten {eaten:.1} / spoiled {spoiled:.1} of {total_points:.1}"
    );

    TroughOutcome {
        duration_seconds: t,
        eaten_points: eaten,
        spoiled_points: spoiled,
        total_points,
        binding,
        starvation_seconds,
        horizon_reached,
        active_time_only: settings.stasis_mode,
        events,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::*;
    use crate::catalog::FoodKind;

    fn grazers(n: u32) -> Vec<TroughEntry> {
        vec![TroughEntry::new("Grazer", n, 0.5)]
    }

    fn hay() -> FoodStats {
        FoodStats {
            name: "Hay".into(),
            weight: 1.0,
            food_value: 50.0,
            stack_size: 12,
            spoil_seconds: 36_000.0,
            kind: FoodKind::Universal,
        }
    }

    fn catalog_with_hay() -> Catalog {
        Catalog::new([grazer(), stalker()], [greens(), raw_meat(), hay()]).unwrap()
    }

    fn assert_conserved(o: &TroughOutcome) {
        assert!(
            (o.eaten_points + o.spoiled_points - o.total_points).abs() < 1e-6,
            "{o:?}"
        );
    }

    #[test]
    fn test_spoilage_beats_consumption() {
        // 10 points/min, one 600-point stack spoiling after 30 minutes.
        let o = simulate_trough(
            &grazers(1),
            &[FoodStack::fresh("Greens", 1.0)],
            &TroughConfig::slots(10),
            &RateSettings::default(),
            &catalog(),
        )
        .unwrap();
        assert!((o.eaten_points - 300.0).abs() < 1e-6);
        assert!((o.spoiled_points - 300.0).abs() < 1e-6);
        assert!((o.duration_seconds - 1800.0).abs() < 1e-6);
        assert_eq!(o.binding, LimitingFactor::Spoilage);
        assert!(!o.horizon_reached);
        assert_conserved(&o);
    }

    #[test]
    fn test_consumption_finishes_first() {
        // Six grazers empty the stack in 10 minutes.
        let o = simulate_trough(
            &grazers(6),
            &[FoodStack::fresh("Greens", 1.0)],
            &TroughConfig::slots(10),
            &RateSettings::default(),
            &catalog(),
        )
        .unwrap();
        assert!((o.eaten_points - 600.0).abs() < 1e-6);
        assert!(o.spoiled_points.abs() < 1e-6);
        assert!((o.duration_seconds - 600.0).abs() < 1e-6);
        assert_eq!(o.binding, LimitingFactor::Consumption);
    }

    #[test]
    fn test_tie_counts_as_eaten() {
        // 100 points with 600 s left on the timer, eaten at 1/6 point/s.
        let aged = FoodStack {
            food: "Greens".into(),
            stack_count: 1.0 / 6.0,
            age_seconds: 1200.0,
        };
        let o = simulate_trough(
            &grazers(1),
            &[aged],
            &TroughConfig::slots(1),
            &RateSettings::default(),
            &catalog(),
        )
        .unwrap();
        assert!((o.eaten_points - 100.0).abs() < 1e-6);
        assert!(o.spoiled_points.abs() < 1e-6);
        assert_eq!(o.binding, LimitingFactor::Consumption);
        assert!((o.duration_seconds - 600.0).abs() < 1e-3);
    }

    #[test]
    fn test_eats_closest_to_spoiling_first() {
        // Greens spoil long before hay: eat them first, then switch.
        let o = simulate_trough(
            &grazers(1),
            &[FoodStack::fresh("Hay", 1.0), FoodStack::fresh("Greens", 1.0)],
            &TroughConfig::slots(10),
            &RateSettings::default(),
            &catalog_with_hay(),
        )
        .unwrap();
        // 300 greens eaten in 30 min, 300 rot; then 600 hay lasts 60 min.
        assert!((o.spoiled_points - 300.0).abs() < 1e-6, "{o:?}");
        assert!((o.eaten_points - 900.0).abs() < 1e-6);
        assert!((o.duration_seconds - 5400.0).abs() < 1e-6);
        assert_conserved(&o);
    }

    #[test]
    fn test_spoil_multiplier_extends_timer() {
        let o = simulate_trough(
            &grazers(1),
            &[FoodStack::fresh("Greens", 1.0)],
            &TroughConfig::slots(10).with_spoil_multiplier(4.0),
            &RateSettings::default(),
            &catalog(),
        )
        .unwrap();
        assert!((o.eaten_points - 600.0).abs() < 1e-6);
        assert!((o.duration_seconds - 3600.0).abs() < 1e-6);
    }

    #[test]
    fn test_growth_matches_buffer() {
        // A newborn eating 2700 points ramps from 0.25 to 0.5 points/s and
        // empties them exactly at adulthood.
        let o = simulate_trough(
            &[TroughEntry::new("Stalker", 1, 0.0)],
            &[FoodStack::fresh("Raw Meat", 1.35)],
            &TroughConfig::slots(10).with_spoil_multiplier(100.0),
            &RateSettings::default(),
            &catalog(),
        )
        .unwrap();
        assert!((o.duration_seconds - 7200.0).abs() < 1e-3, "{o:?}");
        assert!((o.eaten_points - 2700.0).abs() < 1e-6);
    }

    #[test]
    fn test_growth_crosses_adulthood() {
        // Two newborns share 6000 points: 5400 while growing, then 600 at
        // a combined 1 point/s.
        let o = simulate_trough(
            &[TroughEntry::new("Stalker", 2, 0.0)],
            &[FoodStack::fresh("Raw Meat", 3.0)],
            &TroughConfig::slots(10).with_spoil_multiplier(100.0),
            &RateSettings::default(),
            &catalog(),
        )
        .unwrap();
        assert!((o.duration_seconds - 7800.0).abs() < 1e-3, "{o:?}");
        assert!(o.events >= 2);
    }

    #[test]
    fn test_mixed_diets_draw_separately() {
        let o = simulate_trough(
            &[
                TroughEntry::new("Grazer", 1, 1.0),
                TroughEntry::new("Stalker", 1, 1.0),
            ],
            &[
                FoodStack::fresh("Greens", 0.5),
                FoodStack::fresh("Raw Meat", 0.3),
            ],
            &TroughConfig::slots(10),
            &RateSettings::default(),
            &catalog(),
        )
        .unwrap();
        // Greens: 300 points at 1/6 per s -> 1800 s, spoil at 1800 (tie).
        // Meat: 600 points at 0.5 per s -> 1200 s, spoil at 1200 (tie).
        assert!((o.eaten_points - 900.0).abs() < 1e-6, "{o:?}");
        assert!((o.duration_seconds - 1800.0).abs() < 1e-3);
        assert_conserved(&o);
    }

    #[test]
    fn test_inedible_food_spoils() {
        let o = simulate_trough(
            &[TroughEntry::new("Stalker", 1, 0.5)],
            &[FoodStack::fresh("Greens", 2.0)],
            &TroughConfig::slots(10),
            &RateSettings::default(),
            &catalog(),
        )
        .unwrap();
        assert_eq!(o.duration_seconds, 0.0);
        assert_eq!(o.eaten_points, 0.0);
        assert!((o.spoiled_points - 1200.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_roster_and_empty_trough() {
        let o = simulate_trough(
            &[],
            &[FoodStack::fresh("Greens", 1.0)],
            &TroughConfig::slots(1),
            &RateSettings::default(),
            &catalog(),
        )
        .unwrap();
        assert_eq!(o.duration_seconds, 0.0);
        assert_eq!(o.starvation_seconds, 0.0);
        assert!((o.spoiled_points - 600.0).abs() < 1e-9);

        let o = simulate_trough(
            &grazers(3),
            &[],
            &TroughConfig::slots(1),
            &RateSettings::default(),
            &catalog(),
        )
        .unwrap();
        assert_eq!(o.total_points, 0.0);
        assert_eq!(o.duration_seconds, 0.0);
        assert_eq!(o.binding, LimitingFactor::Consumption);
    }

    #[test]
    fn test_starvation_includes_own_reserve() {
        let mut entry = TroughEntry::new("Grazer", 1, 1.0);
        entry.max_food_override = Some(300.0);
        let o = simulate_trough(
            &[entry],
            &[FoodStack::fresh("Greens", 0.5)],
            &TroughConfig::slots(1),
            &RateSettings::default(),
            &catalog(),
        )
        .unwrap();
        // 300 points in the trough plus 300 of its own, at 10 points/min.
        assert!((o.duration_seconds - 1800.0).abs() < 1e-3);
        assert!((o.starvation_seconds - 3600.0).abs() < 1e-3);
    }

    #[test]
    fn test_already_spoiled_stack() {
        let stale = FoodStack {
            food: "Greens".into(),
            stack_count: 1.0,
            age_seconds: 5000.0,
        };
        let o = simulate_trough(
            &grazers(1),
            &[stale],
            &TroughConfig::slots(1),
            &RateSettings::default(),
            &catalog(),
        )
        .unwrap();
        assert_eq!(o.eaten_points, 0.0);
        assert!((o.spoiled_points - 600.0).abs() < 1e-9);
    }

    #[test]
    fn test_horizon_stops_run() {
        let o = simulate_trough(
            &grazers(1),
            &[FoodStack::fresh("Greens", 10_000.0)],
            &TroughConfig::slots(10_000).with_spoil_multiplier(1.0e6),
            &RateSettings::default(),
            &catalog(),
        )
        .unwrap();
        assert!(o.horizon_reached);
        assert!((o.duration_seconds - SIMULATION_HORIZON_SECONDS).abs() < 1e-6);
        assert_conserved(&o);
    }

    #[test]
    fn test_stasis_flag_carried() {
        let settings = RateSettings {
            stasis_mode: true,
            ..RateSettings::default()
        };
        let o = simulate_trough(
            &grazers(1),
            &[FoodStack::fresh("Greens", 1.0)],
            &TroughConfig::slots(1),
            &settings,
            &catalog(),
        )
        .unwrap();
        assert!(o.active_time_only);
    }

    #[test]
    fn test_invalid_inputs() {
        let cat = catalog();
        let s = RateSettings::default();
        let stacks = [FoodStack::fresh("Greens", 1.0)];
        let one_slot = TroughConfig::slots(1);
        let simulate = |roster: &[TroughEntry], stacks: &[FoodStack], config: &TroughConfig| {
            simulate_trough(roster, stacks, config, &s, &cat)
        };
        assert!(matches!(
            simulate(&[TroughEntry::new("Wyvern", 1, 0.0)], &stacks, &one_slot),
            Err(HatcheryError::Unresolvable { .. })
        ));
        assert!(matches!(
            simulate(&grazers(1), &[FoodStack::fresh("Moss", 1.0)], &one_slot),
            Err(HatcheryError::Unresolvable { .. })
        ));
        assert!(simulate(&grazers(0), &stacks, &one_slot).is_err());
        assert!(simulate(&grazers(1), &[FoodStack::fresh("Greens", -1.0)], &one_slot).is_err());
        assert!(simulate(&grazers(1), &stacks, &TroughConfig::slots(0)).is_err());
        assert!(simulate(&grazers(1), &stacks, &TroughConfig::weight(-5.0)).is_err());
        let no_spoil = one_slot.with_spoil_multiplier(0.0);
        assert!(simulate(&grazers(1), &stacks, &no_spoil).is_err());
    }

    #[test]
    fn test_capacity_in_stacks() {
        assert_eq!(TroughConfig::slots(8).capacity_in_stacks(&greens()), 8.0);
        // 12 greens weigh 6.0
        let w = TroughConfig::weight(15.0).capacity_in_stacks(&greens());
        assert!((w - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_config_json() {
        let c: TroughConfig =
            serde_json::from_str(r#"{"capacity": {"weight": 400.0}, "spoil_multiplier": 4.0}"#)
                .unwrap();
        assert_eq!(c.capacity, TroughCapacity::Weight(400.0));
        let c: TroughConfig = serde_json::from_str(r#"{"capacity": {"slots": 60}}"#).unwrap();
        assert_eq!(c, TroughConfig::slots(60));
    }

    #[test]
    fn test_depletion_time_forms() {
        assert!((depletion_time(100.0, 1.0, 0.0) - 100.0).abs() < 1e-12);
        // 0.5*0.02*t^2 = 100 -> t = 100
        assert!((depletion_time(100.0, 0.0, 0.02) - 100.0).abs() < 1e-9);
        assert!(depletion_time(100.0, 1.0, -0.01).is_infinite());
        assert!(depletion_time(1.0, 0.0, 0.0).is_infinite());
    }
}
