//! Growth duration, food consumption, and buffer math.
//!
//! A growing creature's food drain is linear in its maturation: a newborn
//! drains `baby_food_multiplier` times the adult rate and the multiplier
//! moves linearly to 1.0 at adulthood. Because maturation itself advances
//! linearly in time, the drain rate is piecewise linear in time (a ramp
//! while growing, flat afterwards) and every quantity here is computed in
//! closed form by integrating that curve.
//!
//! | Function | Result |
//! |----------|--------|
//! | [`total_maturation_seconds`] | Seconds from newborn to adult |
//! | [`consumption_rate_per_minute`] | Food points per minute at a maturation |
//! | [`food_capacity`] | Items a given carry weight holds |
//! | [`buffer_seconds`] | How long a stock of items lasts one creature |
//! | [`food_breakdown`] | Food needed per fixed-length band until adulthood |
//! | [`hand_feed_until`] | Maturation from which a creature's own inventory suffices |

use serde::{Deserialize, Serialize};

use crate::catalog::{FoodStats, SpeciesStats};
use crate::constants::{
    stages, EPSILON, HAND_FEED_SCAN_STEP, MAX_BREAKDOWN_BANDS, NEWBORN_STAT_FRACTION,
    SECONDS_PER_MINUTE,
};
use crate::error::{
    require_fraction, require_non_negative, require_positive, HatcheryError, Result,
};
use crate::settings::RateSettings;

// ============================================================================
// GROWTH STAGES
// ============================================================================

/// Named band of maturation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GrowthStage {
    /// Below 10%: must be hand fed.
    Baby,
    /// 10% to 50%.
    Juvenile,
    /// 50% to 100%.
    Adolescent,
    Adult,
}

impl GrowthStage {
    pub fn from_maturation(maturation: f64) -> Self {
        if maturation >= stages::ADULT_AT {
            Self::Adult
        } else if maturation >= stages::ADOLESCENT_AT {
            Self::Adolescent
        } else if maturation >= stages::JUVENILE_AT {
            Self::Juvenile
        } else {
            Self::Baby
        }
    }

    /// Maturation at which the next stage begins, `None` for adults.
    pub fn next_threshold(self) -> Option<f64> {
        match self {
            Self::Baby => Some(stages::JUVENILE_AT),
            Self::Juvenile => Some(stages::ADOLESCENT_AT),
            Self::Adolescent => Some(stages::ADULT_AT),
            Self::Adult => None,
        }
    }
}

// ============================================================================
// SCALAR MODEL
// ============================================================================

/// Seconds for a newborn to reach adulthood.
pub fn total_maturation_seconds(species: &SpeciesStats, settings: &RateSettings) -> Result<f64> {
    let age_speed = require_positive("age_speed", species.age_speed)?;
    let mult = require_positive("age_speed_multiplier", species.age_speed_multiplier)?;
    let speed = require_positive("maturation_speed", settings.maturation_speed)?;
    Ok(1.0 / (age_speed * mult * speed))
}

/// Seconds still needed to go from `current` to `target` maturation.
pub fn time_until(current: f64, target: f64, total_seconds: f64) -> f64 {
    (target.min(1.0) - current).max(0.0) * total_seconds.max(0.0)
}

/// Egg or gestation time, `None` when the species has none.
pub fn incubation_seconds(species: &SpeciesStats, settings: &RateSettings) -> Result<Option<f64>> {
    let hatch = require_positive("hatch_speed", settings.hatch_speed)?;
    match species.incubation_seconds {
        Some(base) => Ok(Some(require_positive("incubation_seconds", base)? / hatch)),
        None => Ok(None),
    }
}

/// Adult food drain in points per second after server and nursing modifiers.
pub fn adult_rate_per_second(species: &SpeciesStats, settings: &RateSettings) -> Result<f64> {
    let base = require_non_negative("food_rate", species.food_rate)?;
    let speed = require_positive("consumption_speed", settings.consumption_speed)?;
    let nursing = require_positive("nursing_multiplier", settings.nursing_divisor())?;
    Ok(base * speed / nursing)
}

/// Food points per minute drained at `maturation`. Zero when the species
/// cannot eat `food` at all.
pub fn consumption_rate_per_minute(
    species: &SpeciesStats,
    food: &FoodStats,
    settings: &RateSettings,
    maturation: f64,
) -> Result<f64> {
    let profile = GrowthProfile::for_food(species, food, settings, maturation)?;
    Ok(profile.rate_at(0.0) * SECONDS_PER_MINUTE)
}

/// Stats scale from [`NEWBORN_STAT_FRACTION`] at birth to 100% as an adult.
fn stat_scale(maturation: f64) -> f64 {
    let m = maturation.clamp(0.0, 1.0);
    NEWBORN_STAT_FRACTION + (1.0 - NEWBORN_STAT_FRACTION) * m
}

/// Carry weight at `maturation`.
pub fn carry_weight_at(species: &SpeciesStats, maturation: f64) -> f64 {
    species.weight * stat_scale(maturation)
}

/// Food stat at `maturation`.
pub fn max_food_at(species: &SpeciesStats, maturation: f64) -> f64 {
    species.max_food * stat_scale(maturation)
}

/// Whole items of `food` that fit in `carry_weight`.
pub fn food_capacity(carry_weight: f64, food: &FoodStats, species: &SpeciesStats) -> Result<u64> {
    let carry = require_non_negative("carry_weight", carry_weight)?;
    let item_weight = require_positive(
        "food_weight",
        food.weight * species.food_weight_multiplier_for(&food.name),
    )?;
    // Absorb float noise such as 200 / (0.1 * 0.5) landing on 3999.999...
    Ok((carry / item_weight + EPSILON).floor() as u64)
}

/// Seconds `item_count` items of `food` keep one creature fed, starting at
/// `maturation` and following its growth curve.
pub fn buffer_seconds(
    item_count: u64,
    food: &FoodStats,
    species: &SpeciesStats,
    maturation: f64,
    settings: &RateSettings,
) -> Result<f64> {
    let profile = GrowthProfile::for_food(species, food, settings, maturation)?;
    let points = item_count as f64 * food.food_value;
    Ok(profile.time_to_consume(0.0, points).max(0.0))
}

// ============================================================================
// GROWTH PROFILE
// ============================================================================

/// Closed-form food drain curve of one individual from a starting point.
///
/// Time `t` is measured in seconds from the profile's start. The drain rate
/// is `adult_rate * (b + (1 - b) * m(t))` with `m(t) = m0 + t / total`
/// until adulthood, then `adult_rate`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrowthProfile {
    adult_rate: f64,
    baby_multiplier: f64,
    start_maturation: f64,
    total_seconds: f64,
}

impl GrowthProfile {
    pub fn new(
        species: &SpeciesStats,
        settings: &RateSettings,
        start_maturation: f64,
    ) -> Result<Self> {
        let start_maturation = require_fraction("maturation", start_maturation)?;
        let baby_multiplier =
            require_positive("baby_food_multiplier", species.baby_food_multiplier)?;
        Ok(Self {
            adult_rate: adult_rate_per_second(species, settings)?,
            baby_multiplier,
            start_maturation,
            total_seconds: total_maturation_seconds(species, settings)?,
        })
    }

    /// Like [`GrowthProfile::new`], but drains nothing when the diet rules
    /// out `food`.
    pub fn for_food(
        species: &SpeciesStats,
        food: &FoodStats,
        settings: &RateSettings,
        start_maturation: f64,
    ) -> Result<Self> {
        let mut profile = Self::new(species, settings, start_maturation)?;
        if !species.diet.can_eat(food.kind) {
            profile.adult_rate = 0.0;
        }
        Ok(profile)
    }

    pub fn adult_rate(&self) -> f64 {
        self.adult_rate
    }

    /// Seconds from start until adulthood (zero for adults).
    pub fn adulthood_at(&self) -> f64 {
        (1.0 - self.start_maturation).max(0.0) * self.total_seconds
    }

    pub fn maturation_at(&self, t: f64) -> f64 {
        (self.start_maturation + t.max(0.0) / self.total_seconds).min(1.0)
    }

    /// Drain in points per second at time `t`.
    pub fn rate_at(&self, t: f64) -> f64 {
        let m = self.maturation_at(t);
        self.adult_rate * (self.baby_multiplier + (1.0 - self.baby_multiplier) * m)
    }

    /// Rate of change of the drain at `t` (points per second squared).
    pub fn slope_at(&self, t: f64) -> f64 {
        if t < self.adulthood_at() {
            self.growth_slope()
        } else {
            0.0
        }
    }

    fn growth_slope(&self) -> f64 {
        self.adult_rate * (1.0 - self.baby_multiplier) / self.total_seconds
    }

    /// Points drained over `[0, t]`.
    pub fn consumed_by(&self, t: f64) -> f64 {
        if t <= 0.0 || self.adult_rate == 0.0 {
            return 0.0;
        }
        let growth_end = self.adulthood_at();
        let tg = t.min(growth_end);
        let growing = self.rate_at(0.0) * tg + 0.5 * self.growth_slope() * tg * tg;
        let adult = self.adult_rate * (t - growth_end).max(0.0);
        growing + adult
    }

    /// Points drained over `[t0, t1]`.
    pub fn consumed_between(&self, t0: f64, t1: f64) -> f64 {
        if t1 <= t0 {
            return 0.0;
        }
        self.consumed_by(t1) - self.consumed_by(t0)
    }

    /// Seconds after `from` until `points` more have been drained.
    /// Infinite when the creature never eats.
    pub fn time_to_consume(&self, from: f64, points: f64) -> f64 {
        if points <= 0.0 {
            return 0.0;
        }
        if self.adult_rate == 0.0 {
            return f64::INFINITY;
        }
        let from = from.max(0.0);
        let target = self.consumed_by(from) + points;
        let growth_end = self.adulthood_at();
        let growth_total = self.consumed_by(growth_end);
        let at = if target <= growth_total {
            // Smaller root of 0.5*k*x^2 + r0*x - target = 0, in a form that
            // stays stable when k is zero or negative.
            let r0 = self.rate_at(0.0);
            let k = self.growth_slope();
            let disc = (r0 * r0 + 2.0 * k * target).max(0.0);
            2.0 * target / (r0 + disc.sqrt())
        } else {
            growth_end + (target - growth_total) / self.adult_rate
        };
        (at - from).max(0.0)
    }
}

// ============================================================================
// BANDED BREAKDOWN
// ============================================================================

/// Food needed during one fixed-length band of growth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodBand {
    pub index: usize,
    pub start_seconds: f64,
    pub end_seconds: f64,
    pub maturation_start: f64,
    pub maturation_end: f64,
    pub food_points: f64,
    /// Fractional item count (`food_points / food_value`).
    pub items: f64,
}

/// Split the remaining growth into `band_seconds`-long bands (the last one
/// may be shorter) and integrate the food drain over each. The bands sum to
/// [`food_points_to_adulthood`].
pub fn food_breakdown(
    species: &SpeciesStats,
    food: &FoodStats,
    settings: &RateSettings,
    from_maturation: f64,
    band_seconds: f64,
) -> Result<Vec<FoodBand>> {
    let band = require_positive("band_seconds", band_seconds)?;
    let profile = GrowthProfile::for_food(species, food, settings, from_maturation)?;
    let growth_end = profile.adulthood_at();
    if growth_end <= 0.0 {
        return Ok(Vec::new());
    }

    let count = (growth_end / band - EPSILON).ceil().max(1.0);
    if count > MAX_BREAKDOWN_BANDS as f64 {
        return Err(HatcheryError::invalid(
            "band_seconds",
            format!("{count} bands exceeds the limit of {MAX_BREAKDOWN_BANDS}"),
        ));
    }

    let bands = (0..count as usize)
        .map(|index| {
            let start = index as f64 * band;
            let end = ((index + 1) as f64 * band).min(growth_end);
            let food_points = profile.consumed_between(start, end);
            FoodBand {
                index,
                start_seconds: start,
                end_seconds: end,
                maturation_start: profile.maturation_at(start),
                maturation_end: profile.maturation_at(end),
                food_points,
                items: food_points / food.food_value,
            }
        })
        .collect();
    Ok(bands)
}

/// Food points needed from `from_maturation` until adulthood.
pub fn food_points_to_adulthood(
    species: &SpeciesStats,
    food: &FoodStats,
    settings: &RateSettings,
    from_maturation: f64,
) -> Result<f64> {
    let profile = GrowthProfile::for_food(species, food, settings, from_maturation)?;
    Ok(profile.consumed_by(profile.adulthood_at()))
}

/// Lowest maturation, scanned in 1% steps, at which a full personal
/// inventory of `food` lasts at least `required_buffer_seconds`. Before
/// that point the creature has to be hand fed. `None` if it never gets
/// there, or cannot eat the food.
pub fn hand_feed_until(
    species: &SpeciesStats,
    food: &FoodStats,
    settings: &RateSettings,
    required_buffer_seconds: f64,
) -> Result<Option<f64>> {
    let required = require_non_negative("required_buffer_seconds", required_buffer_seconds)?;
    if !species.diet.can_eat(food.kind) {
        return Ok(None);
    }
    let steps = (1.0 / HAND_FEED_SCAN_STEP).round() as usize;
    for step in 0..=steps {
        let maturation = (step as f64 * HAND_FEED_SCAN_STEP).min(1.0);
        let items = food_capacity(carry_weight_at(species, maturation), food, species)?;
        let buffer = buffer_seconds(items, food, species, maturation, settings)?;
        if buffer >= required {
            return Ok(Some(maturation));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::*;

    #[test]
    fn test_total_maturation_seconds() {
        let t = total_maturation_seconds(&grazer(), &RateSettings::default()).unwrap();
        assert!((t - 3600.0).abs() < 1e-6);
        let fast =
            total_maturation_seconds(&grazer(), &RateSettings::with_maturation(2.0)).unwrap();
        assert!((fast - 1800.0).abs() < 1e-6);
    }

    #[test]
    fn test_total_maturation_rejects_zero() {
        let mut s = grazer();
        s.age_speed = 0.0;
        assert!(total_maturation_seconds(&s, &RateSettings::default()).is_err());
        assert!(total_maturation_seconds(&grazer(), &RateSettings::with_maturation(0.0)).is_err());
    }

    #[test]
    fn test_growth_stages() {
        assert_eq!(GrowthStage::from_maturation(0.0), GrowthStage::Baby);
        assert_eq!(GrowthStage::from_maturation(0.099), GrowthStage::Baby);
        assert_eq!(GrowthStage::from_maturation(0.1), GrowthStage::Juvenile);
        assert_eq!(GrowthStage::from_maturation(0.5), GrowthStage::Adolescent);
        assert_eq!(GrowthStage::from_maturation(1.0), GrowthStage::Adult);
        assert_eq!(GrowthStage::Baby.next_threshold(), Some(0.1));
        assert_eq!(GrowthStage::Adult.next_threshold(), None);
    }

    #[test]
    fn test_time_until() {
        assert!((time_until(0.25, 0.5, 3600.0) - 900.0).abs() < 1e-9);
        assert_eq!(time_until(0.75, 0.5, 3600.0), 0.0);
        assert!((time_until(0.5, 2.0, 100.0) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_incubation() {
        let s = RateSettings {
            hatch_speed: 2.0,
            ..RateSettings::default()
        };
        assert_eq!(incubation_seconds(&grazer(), &s).unwrap(), Some(900.0));
        assert_eq!(incubation_seconds(&stalker(), &s).unwrap(), None);
    }

    #[test]
    fn test_consumption_rate_modifiers() {
        let food = greens();
        let base = consumption_rate_per_minute(&grazer(), &food, &RateSettings::default(), 0.3)
            .unwrap();
        assert!((base - 10.0).abs() < 1e-9);

        let doubled = RateSettings {
            consumption_speed: 2.0,
            ..RateSettings::default()
        };
        let r = consumption_rate_per_minute(&grazer(), &food, &doubled, 0.3).unwrap();
        assert!((r - 20.0).abs() < 1e-9);

        let nursed = RateSettings {
            nursing_multiplier: Some(2.0),
            ..RateSettings::default()
        };
        let r = consumption_rate_per_minute(&grazer(), &food, &nursed, 0.3).unwrap();
        assert!((r - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_consumption_rate_grows_with_maturation() {
        let s = RateSettings::default();
        let meat = raw_meat();
        let newborn = consumption_rate_per_minute(&stalker(), &meat, &s, 0.0).unwrap();
        let half = consumption_rate_per_minute(&stalker(), &meat, &s, 0.5).unwrap();
        let adult = consumption_rate_per_minute(&stalker(), &meat, &s, 1.0).unwrap();
        assert!((newborn - 15.0).abs() < 1e-9);
        assert!((half - 22.5).abs() < 1e-9);
        assert!((adult - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_consumption_zero_for_wrong_diet() {
        let r = consumption_rate_per_minute(&stalker(), &greens(), &RateSettings::default(), 0.5)
            .unwrap();
        assert_eq!(r, 0.0);
        let b = buffer_seconds(10, &greens(), &stalker(), 0.5, &RateSettings::default()).unwrap();
        assert!(b.is_infinite());
    }

    #[test]
    fn test_food_capacity() {
        assert_eq!(food_capacity(300.0, &greens(), &grazer()).unwrap(), 600);
        // 0.1 weight halved by the species multiplier
        assert_eq!(food_capacity(200.0, &raw_meat(), &stalker()).unwrap(), 4000);
        assert_eq!(food_capacity(0.4, &greens(), &grazer()).unwrap(), 0);
        assert!(food_capacity(-1.0, &greens(), &grazer()).is_err());
    }

    #[test]
    fn test_buffer_constant_rate() {
        // 6 items * 50 points at 10 points/min = 30 minutes
        let b = buffer_seconds(6, &greens(), &grazer(), 0.2, &RateSettings::default()).unwrap();
        assert!((b - 1800.0).abs() < 1e-6);
        let empty = buffer_seconds(0, &greens(), &grazer(), 0.2, &RateSettings::default()).unwrap();
        assert_eq!(empty, 0.0);
    }

    #[test]
    fn test_buffer_integrates_growth() {
        let s = RateSettings::default();
        // Newborn ramps 0.25 -> 0.5 points/s over 7200 s: 2700 points.
        let b = buffer_seconds(54, &raw_meat(), &stalker(), 0.0, &s).unwrap();
        assert!((b - 7200.0).abs() < 1e-6, "got {b}");
        // 300 more points at the adult 0.5 points/s.
        let b = buffer_seconds(60, &raw_meat(), &stalker(), 0.0, &s).unwrap();
        assert!((b - 7800.0).abs() < 1e-6, "got {b}");
        // An instantaneous-rate estimate would be far off.
        let naive = 2700.0 / 0.25;
        assert!(naive > 7200.0 * 1.4);
    }

    #[test]
    fn test_profile_inverse_matches_integral() {
        let p = GrowthProfile::new(&stalker(), &RateSettings::default(), 0.2).unwrap();
        for t in [10.0, 500.0, 3000.0, 5760.0, 9000.0] {
            let points = p.consumed_by(t);
            let back = p.time_to_consume(0.0, points);
            assert!((back - t).abs() < 1e-6, "t={t} back={back}");
        }
        let mid = p.time_to_consume(1000.0, p.consumed_between(1000.0, 4000.0));
        assert!((mid - 3000.0).abs() < 1e-6);
    }

    #[test]
    fn test_profile_shrinking_rate() {
        // Newborns that eat more than adults.
        let mut s = stalker();
        s.baby_food_multiplier = 3.0;
        let p = GrowthProfile::new(&s, &RateSettings::default(), 0.0).unwrap();
        assert!(p.slope_at(0.0) < 0.0);
        let full = p.consumed_by(p.adulthood_at());
        // Average of 1.5 and 0.5 points/s over 7200 s.
        assert!((full - 7200.0).abs() < 1e-6);
        let back = p.time_to_consume(0.0, full * 0.5);
        assert!((p.consumed_by(back) - full * 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_adult_profile_is_flat() {
        let p = GrowthProfile::new(&stalker(), &RateSettings::default(), 1.0).unwrap();
        assert_eq!(p.adulthood_at(), 0.0);
        assert_eq!(p.slope_at(0.0), 0.0);
        assert!((p.consumed_by(100.0) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_breakdown_sums_to_integral() {
        let s = RateSettings::default();
        let bands = food_breakdown(&stalker(), &raw_meat(), &s, 0.0, 3600.0).unwrap();
        assert_eq!(bands.len(), 2);
        assert!((bands[0].food_points - 1125.0).abs() < 1e-6);
        assert!((bands[1].food_points - 1575.0).abs() < 1e-6);
        assert!((bands[1].maturation_end - 1.0).abs() < 1e-12);
        let total: f64 = bands.iter().map(|b| b.food_points).sum();
        let closed = food_points_to_adulthood(&stalker(), &raw_meat(), &s, 0.0).unwrap();
        assert!((total - closed).abs() < 1e-6);
        assert!((bands[0].items - 22.5).abs() < 1e-9);
    }

    #[test]
    fn test_breakdown_short_last_band() {
        let bands =
            food_breakdown(&grazer(), &greens(), &RateSettings::default(), 0.0, 1000.0).unwrap();
        assert_eq!(bands.len(), 4);
        assert!((bands[3].end_seconds - 3600.0).abs() < 1e-9);
        assert!((bands[3].food_points - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_breakdown_limits() {
        let s = RateSettings::default();
        assert!(food_breakdown(&grazer(), &greens(), &s, 1.0, 60.0).unwrap().is_empty());
        assert!(food_breakdown(&grazer(), &greens(), &s, 0.0, 0.0).is_err());
        assert!(food_breakdown(&grazer(), &greens(), &s, 0.0, 0.1).is_err());
    }

    #[test]
    fn test_hand_feed_until() {
        let s = RateSettings::default();
        // 600 minutes at 10 points/min needs 120 greens: first reached at 12%.
        let m = hand_feed_until(&grazer(), &greens(), &s, 36_000.0).unwrap();
        assert!((m.unwrap() - 0.12).abs() < 1e-9, "got {m:?}");
        assert_eq!(hand_feed_until(&grazer(), &greens(), &s, 0.0).unwrap(), Some(0.0));
        assert_eq!(hand_feed_until(&grazer(), &greens(), &s, 1.0e9).unwrap(), None);
        assert_eq!(hand_feed_until(&stalker(), &greens(), &s, 10.0).unwrap(), None);
    }
}
