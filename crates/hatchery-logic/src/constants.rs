//! Shared numeric constants.

/// Milliseconds per second; timestamps are wall-clock milliseconds.
pub const MS_PER_SECOND: f64 = 1000.0;

/// Seconds per minute.
pub const SECONDS_PER_MINUTE: f64 = 60.0;

/// Seconds per hour.
pub const SECONDS_PER_HOUR: f64 = 3600.0;

/// Seconds per day.
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Fraction of adult stats (carry weight, food) a newborn starts with.
pub const NEWBORN_STAT_FRACTION: f64 = 0.1;

/// Growth stage boundaries as maturation fractions.
pub mod stages {
    /// Baby → juvenile.
    pub const JUVENILE_AT: f64 = 0.1;
    /// Juvenile → adolescent.
    pub const ADOLESCENT_AT: f64 = 0.5;
    /// Adolescent → adult.
    pub const ADULT_AT: f64 = 1.0;
}

/// Simulated time after which the trough simulator gives up (90 days).
pub const SIMULATION_HORIZON_SECONDS: f64 = 90.0 * SECONDS_PER_DAY;

/// Hard cap on simulator events per run.
pub const MAX_SIMULATION_EVENTS: usize = 100_000;

/// Bisection steps when solving for the time a mixed roster takes to eat
/// a given amount of food.
pub const DRAIN_SEARCH_STEPS: usize = 100;

/// Maximum number of bands a food breakdown may produce.
pub const MAX_BREAKDOWN_BANDS: usize = 10_000;

/// Maturation step used when scanning for the hand-feed percentage.
pub const HAND_FEED_SCAN_STEP: f64 = 0.01;

/// Tolerance for floating-point comparisons of points and seconds.
pub const EPSILON: f64 = 1e-9;
