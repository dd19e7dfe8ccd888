//! Pure growth and feeding logic for Hatchery.
//!
//! This crate tracks how far a juvenile creature has matured, how much it
//! eats along the way, and how long a shared trough of food lasts before it
//! is eaten or rots. Nothing here touches storage, networking or a UI:
//! functions take plain data and return results, and wall-clock time comes
//! in through an injected [`clock::Clock`].
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`catalog`] | Species and food stats, diet rules, JSON catalog loading |
//! | [`clock`] | Millisecond timestamps, system and manual clocks |
//! | [`constants`] | Time units, growth stage thresholds, simulation limits |
//! | [`downtime`] | Server online/offline tracking and outage reports |
//! | [`error`] | Crate error type |
//! | [`maturation`] | Growth durations, food drain curve, buffers, banded breakdowns |
//! | [`persistence`] | Binary snapshots of tracked sessions |
//! | [`planner`] | Stock planning for a desired feeding duration |
//! | [`session`] | Checkpointed maturation clock with retroactive corrections |
//! | [`settings`] | Server rate multipliers and rate-change events |
//! | [`trough`] | Event-driven shared trough depletion simulation |
//! | [`validation`] | Validation issues with severities |

pub mod catalog;
pub mod clock;
pub mod constants;
pub mod downtime;
pub mod error;
pub mod maturation;
pub mod persistence;
pub mod planner;
pub mod session;
pub mod settings;
pub mod trough;
pub mod validation;

pub use catalog::{Catalog, DietType, FoodKind, FoodStats, SpeciesStats};
pub use clock::{Clock, ManualClock, SystemClock, Timestamp};
pub use error::{HatcheryError, Result};
pub use session::{RetroactiveCorrection, SessionClock, SessionRecord};
pub use settings::{RateChange, RateSettings};
pub use trough::{FoodStack, TroughConfig, TroughEntry, TroughOutcome};
