//! Species and food catalogs.
//!
//! Catalogs are loaded once from JSON by the host application, validated,
//! and then passed by reference into every computation. Lookups by name
//! fail with [`HatcheryError::Unresolvable`] rather than propagating a
//! missing value.
//!
//! ```
//! use hatchery_logic::catalog::Catalog;
//!
//! let json = r#"{
//!     "species": [{
//!         "name": "Raptor", "weight": 140.0, "age_speed": 0.000003,
//!         "diet": "carnivore", "food_rate": 0.0017, "max_food": 1200.0
//!     }],
//!     "foods": [{
//!         "name": "Raw Meat", "weight": 0.1, "food_value": 50.0,
//!         "stack_size": 40, "spoil_seconds": 1200.0, "kind": "meat"
//!     }]
//! }"#;
//! let catalog = Catalog::from_json(json).unwrap();
//! assert!(catalog.species("Raptor").is_ok());
//! assert!(catalog.food("Berries").is_err());
//! ```

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{HatcheryError, RefKind, Result};
use crate::validation::{check_positive, ensure_valid, ValidationIssue};

/// What a species is able to eat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DietType {
    Herbivore,
    Carnivore,
    Omnivore,
}

/// Broad category of a food item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FoodKind {
    Plant,
    Meat,
    /// Eaten by every diet (kibble, prepared feed).
    Universal,
}

impl DietType {
    pub fn can_eat(self, kind: FoodKind) -> bool {
        match (self, kind) {
            (_, FoodKind::Universal) => true,
            (Self::Omnivore, _) => true,
            (Self::Herbivore, FoodKind::Plant) => true,
            (Self::Carnivore, FoodKind::Meat) => true,
            _ => false,
        }
    }
}

fn one() -> f64 {
    1.0
}

/// Per-species growth and feeding stats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesStats {
    pub name: String,
    /// Adult carry weight.
    pub weight: f64,
    /// Base maturation per second at 1x rates.
    pub age_speed: f64,
    #[serde(default = "one")]
    pub age_speed_multiplier: f64,
    pub diet: DietType,
    /// Per-food multiplier on item weight in this species' inventory.
    #[serde(default)]
    pub food_weight_multiplier: HashMap<String, f64>,
    /// Adult food drain in points per second at 1x consumption.
    pub food_rate: f64,
    /// Drain multiplier for a newborn; interpolates to 1.0 at adulthood.
    #[serde(default = "one")]
    pub baby_food_multiplier: f64,
    /// Adult food stat.
    pub max_food: f64,
    /// Egg or gestation time at 1x hatch speed.
    #[serde(default)]
    pub incubation_seconds: Option<f64>,
}

impl SpeciesStats {
    /// Inventory weight multiplier for the named food (1.0 when unlisted).
    pub fn food_weight_multiplier_for(&self, food: &str) -> f64 {
        self.food_weight_multiplier.get(food).copied().unwrap_or(1.0)
    }

    fn check(&self, issues: &mut Vec<ValidationIssue>) {
        let owner = self.name.as_str();
        check_positive(issues, "weight", owner, self.weight);
        check_positive(issues, "age_speed", owner, self.age_speed);
        check_positive(issues, "age_speed_multiplier", owner, self.age_speed_multiplier);
        check_positive(issues, "max_food", owner, self.max_food);
        if !(self.food_rate.is_finite() && self.food_rate >= 0.0) {
            issues.push(ValidationIssue::error(
                "food_rate",
                format!("{owner}: food_rate must be non-negative, got {}", self.food_rate),
            ));
        } else if self.food_rate == 0.0 {
            issues.push(ValidationIssue::warning(
                "food_rate",
                format!("{owner}: food_rate is zero, it will never eat"),
            ));
        }
        check_positive(issues, "baby_food_multiplier", owner, self.baby_food_multiplier);
        for (food, mult) in &self.food_weight_multiplier {
            if !(mult.is_finite() && *mult > 0.0) {
                issues.push(ValidationIssue::error(
                    "food_weight_multiplier",
                    format!("{owner}: weight multiplier for {food} must be positive, got {mult}"),
                ));
            }
        }
        if let Some(secs) = self.incubation_seconds {
            check_positive(issues, "incubation_seconds", owner, secs);
        }
    }
}

/// Per-food inventory and spoilage stats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodStats {
    pub name: String,
    /// Inventory weight per item.
    pub weight: f64,
    /// Food points restored per item.
    pub food_value: f64,
    /// Items per inventory slot.
    pub stack_size: u32,
    /// Time until an opened stack rots.
    pub spoil_seconds: f64,
    pub kind: FoodKind,
}

impl FoodStats {
    /// Food points held by one full stack.
    pub fn points_per_stack(&self) -> f64 {
        self.stack_size as f64 * self.food_value
    }

    fn check(&self, issues: &mut Vec<ValidationIssue>) {
        let owner = self.name.as_str();
        check_positive(issues, "weight", owner, self.weight);
        check_positive(issues, "food_value", owner, self.food_value);
        check_positive(issues, "spoil_seconds", owner, self.spoil_seconds);
        if self.stack_size == 0 {
            issues.push(ValidationIssue::error(
                "stack_size",
                format!("{owner}: stack_size must be at least 1"),
            ));
        }
    }
}

/// On-disk shape: plain lists, keyed by name after loading.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    species: Vec<SpeciesStats>,
    #[serde(default)]
    foods: Vec<FoodStats>,
}

/// Read-only species and food tables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    species: BTreeMap<String, SpeciesStats>,
    foods: BTreeMap<String, FoodStats>,
}

impl Catalog {
    /// Build and validate a catalog from already-parsed records.
    pub fn new(
        species: impl IntoIterator<Item = SpeciesStats>,
        foods: impl IntoIterator<Item = FoodStats>,
    ) -> Result<Self> {
        let catalog = Self {
            species: species.into_iter().map(|s| (s.name.clone(), s)).collect(),
            foods: foods.into_iter().map(|f| (f.name.clone(), f)).collect(),
        };
        ensure_valid(&catalog.validate())?;
        log::debug!(
            "catalog loaded: {} species, {} foods",
            catalog.species.len(),
            catalog.foods.len()
        );
        Ok(catalog)
    }

    /// Parse `{"species": [...], "foods": [...]}` and validate it.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: CatalogFile = serde_json::from_str(json)?;
        Self::new(file.species, file.foods)
    }

    /// Every problem found in the tables.
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        for s in self.species.values() {
            s.check(&mut issues);
            for food in s.food_weight_multiplier.keys() {
                if !self.foods.contains_key(food) {
                    issues.push(ValidationIssue::warning(
                        "food_weight_multiplier",
                        format!("{}: weight multiplier names unknown food {food}", s.name),
                    ));
                }
            }
        }
        for f in self.foods.values() {
            f.check(&mut issues);
        }
        issues
    }

    pub fn species(&self, name: &str) -> Result<&SpeciesStats> {
        self.species.get(name).ok_or_else(|| HatcheryError::Unresolvable {
            kind: RefKind::Species,
            name: name.to_string(),
        })
    }

    pub fn food(&self, name: &str) -> Result<&FoodStats> {
        self.foods.get(name).ok_or_else(|| HatcheryError::Unresolvable {
            kind: RefKind::Food,
            name: name.to_string(),
        })
    }

    pub fn species_names(&self) -> impl Iterator<Item = &str> {
        self.species.keys().map(String::as_str)
    }

    pub fn food_names(&self) -> impl Iterator<Item = &str> {
        self.foods.keys().map(String::as_str)
    }

    /// Foods the named species can eat, in name order.
    pub fn edible_foods(&self, species: &str) -> Result<Vec<&FoodStats>> {
        let diet = self.species(species)?.diet;
        Ok(self.foods.values().filter(|f| diet.can_eat(f.kind)).collect())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Small hand-built records shared by unit tests across modules.

    use super::*;

    /// Constant-rate adult: 10 points/min, 3600 s to mature at 1x.
    pub fn grazer() -> SpeciesStats {
        SpeciesStats {
            name: "Grazer".into(),
            weight: 300.0,
            age_speed: 1.0 / 3600.0,
            age_speed_multiplier: 1.0,
            diet: DietType::Herbivore,
            food_weight_multiplier: HashMap::new(),
            food_rate: 10.0 / 60.0,
            baby_food_multiplier: 1.0,
            max_food: 600.0,
            incubation_seconds: Some(1800.0),
        }
    }

    /// Newborns eat at half the adult rate.
    pub fn stalker() -> SpeciesStats {
        SpeciesStats {
            name: "Stalker".into(),
            weight: 200.0,
            age_speed: 1.0 / 7200.0,
            age_speed_multiplier: 1.0,
            diet: DietType::Carnivore,
            food_weight_multiplier: HashMap::from([("Raw Meat".to_string(), 0.5)]),
            food_rate: 0.5,
            baby_food_multiplier: 0.5,
            max_food: 1000.0,
            incubation_seconds: None,
        }
    }

    /// 12 items of 50 points, 30 minutes to spoil.
    pub fn greens() -> FoodStats {
        FoodStats {
            name: "Greens".into(),
            weight: 0.5,
            food_value: 50.0,
            stack_size: 12,
            spoil_seconds: 1800.0,
            kind: FoodKind::Plant,
        }
    }

    pub fn raw_meat() -> FoodStats {
        FoodStats {
            name: "Raw Meat".into(),
            weight: 0.1,
            food_value: 50.0,
            stack_size: 40,
            spoil_seconds: 1200.0,
            kind: FoodKind::Meat,
        }
    }

    pub fn catalog() -> Catalog {
        Catalog::new([grazer(), stalker()], [greens(), raw_meat()])
            .expect("fixture catalog is valid")
    }
}
