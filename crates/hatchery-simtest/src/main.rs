//! Hatchery Headless Validation Harness
//!
//! Validates the growth and feeding logic against the bundled catalog.
//! Runs entirely in-process with a manual clock, no storage or networking.
//!
//! Usage:
//!   cargo run -p hatchery-simtest
//!   cargo run -p hatchery-simtest -- --verbose
//!   cargo run -p hatchery-simtest -- --json

use std::collections::HashMap;

use hatchery_logic::catalog::{Catalog, DietType, FoodKind, FoodStats, SpeciesStats};
use hatchery_logic::clock::{Clock, ManualClock, Timestamp};
use hatchery_logic::downtime::{DowntimeTracker, ServerStatus, ServerStatusEvent};
use hatchery_logic::maturation::{self, GrowthStage};
use hatchery_logic::persistence;
use hatchery_logic::planner::{self, LimitReason};
use hatchery_logic::session::SessionClock;
use hatchery_logic::settings::RateSettings;
use hatchery_logic::trough::{self, FoodStack, LimitingFactor, TroughConfig, TroughEntry};
use hatchery_logic::validation::Severity;
use serde::Serialize;

// ── Sample catalog (same JSON the tests use) ────────────────────────────
const CATALOG_JSON: &str = include_str!("../../../data/catalog.json");

// ── Test harness ────────────────────────────────────────────────────────

#[derive(Serialize)]
struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn close(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    let json = std::env::args().any(|a| a == "--json");
    if !json {
        println!("=== Hatchery Validation Harness ===\n");
    }

    let mut results = Vec::new();

    // 1. Catalog validation
    let catalog = match Catalog::from_json(CATALOG_JSON) {
        Ok(c) => Some(c),
        Err(e) => {
            results.push(TestResult {
                name: "catalog_parse".into(),
                passed: false,
                detail: format!("catalog error: {}", e),
            });
            None
        }
    };
    if let Some(catalog) = &catalog {
        results.extend(validate_catalog(catalog, verbose && !json, json));
    }

    // 2. Session clock scenarios
    results.extend(validate_session_clock(json));

    // 3. Downtime tracking
    results.extend(validate_downtime(json));

    // 4. Maturation math sweep
    if let Some(catalog) = &catalog {
        results.extend(validate_maturation(catalog, verbose && !json, json));
    }

    // 5. Trough simulation
    results.extend(validate_trough_scenario(json));
    if let Some(catalog) = &catalog {
        results.extend(validate_trough_sweep(catalog));
    }

    // 6. Planner
    results.extend(validate_planner(json));

    // 7. Snapshots
    results.extend(validate_snapshots(json));

    // ── Summary ──
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    if json {
        match serde_json::to_string_pretty(&results) {
            Ok(text) => println!("{}", text),
            Err(e) => eprintln!("failed to encode results: {}", e),
        }
    } else {
        println!();
        for r in &results {
            let icon = if r.passed { "✓" } else { "✗" };
            if !r.passed || verbose {
                println!("  {} {}: {}", icon, r.name, r.detail);
            }
        }
        println!(
            "\n=== RESULT: {}/{} passed, {} failed ===",
            passed, total, failed
        );
    }

    if failed > 0 {
        std::process::exit(1);
    }
}

fn section(title: &str, quiet: bool) {
    if !quiet {
        println!("--- {} ---", title);
    }
}

/// Two-entry catalog with round numbers for exact scenarios.
fn scenario_catalog() -> Catalog {
    let grazer = SpeciesStats {
        name: "Grazer".into(),
        weight: 300.0,
        age_speed: 1.0 / 3600.0,
        age_speed_multiplier: 1.0,
        diet: DietType::Herbivore,
        food_weight_multiplier: HashMap::new(),
        food_rate: 10.0 / 60.0,
        baby_food_multiplier: 1.0,
        max_food: 600.0,
        incubation_seconds: None,
    };
    let greens = FoodStats {
        name: "Greens".into(),
        weight: 0.5,
        food_value: 50.0,
        stack_size: 12,
        spoil_seconds: 1800.0,
        kind: FoodKind::Plant,
    };
    Catalog::new([grazer], [greens]).unwrap_or_default()
}

// ── 1. Catalog ──────────────────────────────────────────────────────────

fn validate_catalog(catalog: &Catalog, verbose: bool, quiet: bool) -> Vec<TestResult> {
    section("Catalog", quiet);
    let mut results = Vec::new();

    let species: Vec<&str> = catalog.species_names().collect();
    let foods: Vec<&str> = catalog.food_names().collect();
    results.push(TestResult {
        name: "catalog_not_empty".into(),
        passed: !species.is_empty() && !foods.is_empty(),
        detail: format!("{} species, {} foods", species.len(), foods.len()),
    });

    let warnings = catalog
        .validate()
        .iter()
        .filter(|i| i.severity == Severity::Warning)
        .count();
    results.push(TestResult {
        name: "catalog_no_warnings".into(),
        passed: warnings == 0,
        detail: format!("{} warnings", warnings),
    });

    // Every species has something to eat
    let hungry: Vec<&str> = species
        .iter()
        .copied()
        .filter(|s| catalog.edible_foods(s).map(|f| f.is_empty()).unwrap_or(true))
        .collect();
    results.push(TestResult {
        name: "catalog_every_species_eats".into(),
        passed: hungry.is_empty(),
        detail: if hungry.is_empty() {
            "all species have edible food".into()
        } else {
            format!("no food for: {}", hungry.join(", "))
        },
    });

    if verbose {
        let settings = RateSettings::default();
        println!("  Growth at 1x:");
        for name in &species {
            if let Ok(s) = catalog.species(name) {
                if let Ok(total) = maturation::total_maturation_seconds(s, &settings) {
                    println!("    {:10}: {:6.1} h", name, total / 3600.0);
                }
            }
        }
    }

    results
}

// ── 2. Session Clock ────────────────────────────────────────────────────

fn validate_session_clock(quiet: bool) -> Vec<TestResult> {
    section("Session Clock", quiet);
    let mut results = Vec::new();

    // Half the growth time elapsed → 50%
    let clock = ManualClock::at(Timestamp(0));
    let half = SessionClock::new("half", "Grazer", 3600.0, 0.0, &clock).map(|s| s.start(&clock));
    clock.advance_secs(1800.0);
    let pct = half.as_ref().map(|s| s.current_percentage(&clock)).unwrap_or(f64::NAN);
    results.push(TestResult {
        name: "clock_half_elapsed".into(),
        passed: close(pct, 0.5, 1e-3),
        detail: format!("{:.4} after 1800 s of 3600 s", pct),
    });

    // Paused clocks do not move
    let paused = half.map(|s| s.pause(&clock));
    clock.advance_secs(600.0);
    let frozen = paused.as_ref().map(|s| s.current_percentage(&clock)).unwrap_or(f64::NAN);
    let resumed = paused.map(|s| s.start(&clock));
    results.push(TestResult {
        name: "clock_pause_freezes".into(),
        passed: close(frozen, 0.5, 1e-3) && resumed.map(|s| s.is_playing()).unwrap_or(false),
        detail: format!("{:.4} after 10 min paused", frozen),
    });

    // Rate change 600 s after start, 3600 → 1800 s total
    let clock = ManualClock::at(Timestamp(0));
    let transition = Timestamp::from_secs(600.0);
    let corrected = SessionClock::new("fast", "Grazer", 3600.0, 0.0, &clock)
        .map(|s| s.start(&clock))
        .and_then(|s| {
            clock.advance_to(transition);
            s.apply_retroactive_correction(&clock, transition, 3600.0, 1800.0)
        });
    let at_transition = corrected.as_ref().map(|c| c.percentage()).unwrap_or(f64::NAN);
    let committed = corrected.map(|c| c.commit());
    clock.advance_secs(600.0);
    let later = committed.as_ref().map(|s| s.current_percentage(&clock)).unwrap_or(f64::NAN);
    results.push(TestResult {
        name: "clock_retroactive_correction".into(),
        passed: close(at_transition, 1.0 / 6.0, 1e-3) && close(later, 0.5, 1e-3),
        detail: format!("{:.4} at change, {:.4} 600 s later", at_transition, later),
    });

    // Stage boundaries
    let stages = [0.05, 0.3, 0.7, 1.0].map(GrowthStage::from_maturation);
    results.push(TestResult {
        name: "clock_growth_stages".into(),
        passed: stages
            == [
                GrowthStage::Baby,
                GrowthStage::Juvenile,
                GrowthStage::Adolescent,
                GrowthStage::Adult,
            ],
        detail: format!("{:?}", stages),
    });

    results
}

// ── 3. Downtime ─────────────────────────────────────────────────────────

fn validate_downtime(quiet: bool) -> Vec<TestResult> {
    section("Downtime", quiet);
    let mut results = Vec::new();

    let clock = ManualClock::at(Timestamp(0));
    let session = SessionClock::new("dt", "Grazer", 3600.0, 0.0, &clock).map(|s| s.start(&clock));
    let mut tracker = DowntimeTracker::new();
    let event = |status, secs| ServerStatusEvent {
        status,
        since: Timestamp::from_secs(secs),
    };

    tracker.observe(event(ServerStatus::Offline, 300.0));
    let duplicate = tracker.observe(event(ServerStatus::Offline, 400.0));
    clock.advance_secs(1800.0);
    let report = tracker.observe(event(ServerStatus::Online, 1200.0));
    results.push(TestResult {
        name: "downtime_report".into(),
        passed: duplicate.is_none()
            && report
                .map(|r| close(r.offline_seconds, 900.0, 1e-9) && r.verify_manually)
                .unwrap_or(false),
        detail: format!("{:?}", report.map(|r| r.offline_seconds)),
    });

    let pct = match (session, report) {
        (Ok(s), Some(r)) => r.apply(s, &clock).current_percentage(&clock),
        _ => f64::NAN,
    };
    results.push(TestResult {
        name: "downtime_excluded_from_growth".into(),
        passed: close(pct, 0.25, 1e-9),
        detail: format!("{:.4} after 1800 s with 900 s offline", pct),
    });

    results
}

// ── 4. Maturation Math ──────────────────────────────────────────────────

fn validate_maturation(catalog: &Catalog, verbose: bool, quiet: bool) -> Vec<TestResult> {
    section("Maturation Math", quiet);
    let mut results = Vec::new();
    let settings = RateSettings::default();

    // Banded breakdown sums to the closed-form total for every pairing
    let mut pairs = 0;
    let mut mismatches = Vec::new();
    for name in catalog.species_names() {
        let Ok(species) = catalog.species(name) else { continue };
        let Ok(foods) = catalog.edible_foods(name) else { continue };
        for food in foods {
            pairs += 1;
            let bands = maturation::food_breakdown(species, food, &settings, 0.0, 3600.0);
            let total = maturation::food_points_to_adulthood(species, food, &settings, 0.0);
            match (bands, total) {
                (Ok(bands), Ok(total)) => {
                    let sum: f64 = bands.iter().map(|b| b.food_points).sum();
                    if !close(sum, total, 1e-6 * total.max(1.0)) {
                        mismatches.push(format!("{}/{}", name, food.name));
                    }
                }
                _ => mismatches.push(format!("{}/{} errored", name, food.name)),
            }
        }
    }
    results.push(TestResult {
        name: "maturation_breakdown_sums".into(),
        passed: pairs > 0 && mismatches.is_empty(),
        detail: if mismatches.is_empty() {
            format!("{} species/food pairs consistent", pairs)
        } else {
            mismatches.join(", ")
        },
    });

    // More food never means a shorter buffer
    let mut monotone = true;
    if let (Ok(raptor), Ok(meat)) = (catalog.species("Raptor"), catalog.food("Raw Meat")) {
        let mut last = 0.0;
        for items in (0..=400).step_by(20) {
            let b = maturation::buffer_seconds(items, meat, raptor, 0.2, &settings).unwrap_or(-1.0);
            monotone &= b >= last;
            last = b;
        }
    } else {
        monotone = false;
    }
    results.push(TestResult {
        name: "maturation_buffer_monotone".into(),
        passed: monotone,
        detail: "buffer grows with item count".into(),
    });

    if verbose {
        println!("  Hand feeding (1 h buffer) until:");
        for name in catalog.species_names() {
            let Ok(species) = catalog.species(name) else { continue };
            let Ok(foods) = catalog.edible_foods(name) else { continue };
            for food in foods {
                if let Ok(until) = maturation::hand_feed_until(species, food, &settings, 3600.0) {
                    println!("    {:10} on {:12}: {:?}", name, food.name, until);
                }
            }
        }
    }

    results
}

// ── 5. Trough Simulation ────────────────────────────────────────────────

fn validate_trough_scenario(quiet: bool) -> Vec<TestResult> {
    section("Trough Simulation", quiet);
    let mut results = Vec::new();

    // 10 points/min, one 600-point stack, 30-minute spoil timer
    let outcome = trough::simulate_trough(
        &[TroughEntry::new("Grazer", 1, 0.5)],
        &[FoodStack::fresh("Greens", 1.0)],
        &TroughConfig::slots(10),
        &RateSettings::default(),
        &scenario_catalog(),
    );
    let passed = outcome
        .as_ref()
        .map(|o| {
            close(o.eaten_points, 300.0, 1e-6)
                && close(o.spoiled_points, 300.0, 1e-6)
                && close(o.duration_seconds, 1800.0, 1e-6)
                && o.binding == LimitingFactor::Spoilage
        })
        .unwrap_or(false);
    results.push(TestResult {
        name: "trough_spoilage_scenario".into(),
        passed,
        detail: match &outcome {
            Ok(o) => format!(
                "eaten {:.1}, spoiled {:.1}, {:.0} s",
                o.eaten_points, o.spoiled_points, o.duration_seconds
            ),
            Err(e) => e.to_string(),
        },
    });

    results
}

fn validate_trough_sweep(catalog: &Catalog) -> Vec<TestResult> {
    let mut results = Vec::new();
    let settings = RateSettings::default();

    // Conservation across every species/food pairing
    let mut runs = 0;
    let mut leaks = Vec::new();
    for name in catalog.species_names() {
        for food in catalog.food_names() {
            for maturation in [0.0, 0.5, 1.0] {
                runs += 1;
                let outcome = trough::simulate_trough(
                    &[TroughEntry::new(name, 3, maturation)],
                    &[FoodStack::fresh(food, 5.0)],
                    &TroughConfig::slots(20).with_spoil_multiplier(4.0),
                    &settings,
                    catalog,
                );
                match outcome {
                    Ok(o) if close(o.eaten_points + o.spoiled_points, o.total_points, 1e-6) => {}
                    _ => leaks.push(format!("{}/{}@{}", name, food, maturation)),
                }
            }
        }
    }
    results.push(TestResult {
        name: "trough_conservation".into(),
        passed: leaks.is_empty(),
        detail: if leaks.is_empty() {
            format!("{} runs conserve food", runs)
        } else {
            leaks.join(", ")
        },
    });

    results
}

// ── 6. Planner ──────────────────────────────────────────────────────────

fn validate_planner(quiet: bool) -> Vec<TestResult> {
    section("Planner", quiet);
    let mut results = Vec::new();
    let catalog = scenario_catalog();
    let settings = RateSettings::default();
    let roster = [TroughEntry::new("Grazer", 1, 1.0)];

    // 48 h requested, food spoils in 12 h
    let config = TroughConfig::slots(60).with_spoil_multiplier(24.0);
    let plan = planner::stacks_for_duration(
        &roster,
        "Greens",
        &config,
        &settings,
        48.0 * 3600.0,
        &catalog,
    );
    results.push(TestResult {
        name: "planner_spoilage_limited".into(),
        passed: plan
            .as_ref()
            .map(|p| {
                !p.is_achievable
                    && p.limit_reason == Some(LimitReason::Spoilage)
                    && close(p.max_duration_seconds, 12.0 * 3600.0, 1e-3)
            })
            .unwrap_or(false),
        detail: match &plan {
            Ok(p) => format!(
                "{} stacks, max {:.1} h, {:?}",
                p.stacks,
                p.max_duration_seconds / 3600.0,
                p.limit_reason
            ),
            Err(e) => e.to_string(),
        },
    });

    // Feasibility flips exactly at the full-container duration
    let small = TroughConfig::slots(3).with_spoil_multiplier(24.0);
    let plan_for = |desired| {
        planner::stacks_for_duration(&roster, "Greens", &small, &settings, desired, &catalog)
    };
    let flips = plan_for(0.0)
        .map(|p| p.max_duration_seconds)
        .and_then(|max| Ok((plan_for(max * 0.99)?, plan_for(max * 1.01)?)))
        .map(|(below, above)| {
            below.is_achievable
                && !above.is_achievable
                && above.limit_reason == Some(LimitReason::Capacity)
        })
        .unwrap_or(false);
    results.push(TestResult {
        name: "planner_feasibility_boundary".into(),
        passed: flips,
        detail: "achievable below max duration, capacity-limited above".into(),
    });

    // Empty roster needs nothing
    let empty = planner::stacks_for_duration(&[], "Greens", &config, &settings, 3600.0, &catalog);
    results.push(TestResult {
        name: "planner_empty_roster".into(),
        passed: empty
            .map(|p| p.stacks == 0 && p.is_achievable && p.max_duration_seconds.is_infinite())
            .unwrap_or(false),
        detail: "zero stacks, achievable, unbounded".into(),
    });

    results
}

// ── 7. Snapshots ────────────────────────────────────────────────────────

fn validate_snapshots(quiet: bool) -> Vec<TestResult> {
    section("Snapshots", quiet);
    let mut results = Vec::new();

    let clock = ManualClock::at(Timestamp(1_700_000_000_000));
    let sessions: Vec<SessionClock> = (0..5)
        .filter_map(|i| {
            let total = 3600.0 * (i + 1) as f64;
            SessionClock::new(format!("s{}", i), "Grazer", total, 0.1 * i as f64, &clock)
                .ok()
                .map(|s| if i % 2 == 0 { s.start(&clock) } else { s })
        })
        .collect();
    clock.advance_secs(1234.5);

    let mut buffer = Vec::new();
    let loaded = persistence::save_sessions(&mut buffer, &sessions, &clock)
        .and_then(|_| persistence::load_sessions(buffer.as_slice()));
    let passed = loaded
        .as_ref()
        .map(|snap| {
            snap.saved_at == clock.now()
                && snap.sessions == sessions
                && snap
                    .sessions
                    .iter()
                    .zip(&sessions)
                    .all(|(a, b)| a.current_percentage(&clock) == b.current_percentage(&clock))
        })
        .unwrap_or(false);
    results.push(TestResult {
        name: "snapshot_round_trip".into(),
        passed,
        detail: format!("{} sessions, {} bytes", sessions.len(), buffer.len()),
    });

    results
}
