//! Per-creature maturation clock.
//!
//! A session stores the exact maturation at its last checkpoint plus the
//! checkpoint time; the current maturation is always derived from those and
//! the injected [`Clock`], never stored while playing. Every mutator
//! consumes the session and returns the updated value.
//!
//! Rate changes that are discovered late go through
//! [`SessionClock::apply_retroactive_correction`], which yields a
//! [`RetroactiveCorrection`]. The session only changes once that value is
//! committed, and committing also re-baselines the checkpoint, so the same
//! correction cannot be counted twice.
//!
//! ```
//! use hatchery_logic::clock::{ManualClock, Timestamp};
//! use hatchery_logic::session::SessionClock;
//!
//! let clock = ManualClock::at(Timestamp(0));
//! let session = SessionClock::new("egg-1", "Raptor", 3600.0, 0.0, &clock)
//!     .unwrap()
//!     .start(&clock);
//! clock.advance_secs(1800.0);
//! assert!((session.current_percentage(&clock) - 0.5).abs() < 1e-9);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::catalog::SpeciesStats;
use crate::clock::{Clock, Timestamp};
use crate::error::{require_fraction, require_non_negative, require_positive, Result};
use crate::maturation::{self, GrowthStage};
use crate::settings::{RateChange, RateSettings};
use crate::validation::ensure_valid;

/// Maturation clock for one creature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionClock {
    id: String,
    species: String,
    maturation_at_checkpoint: f64,
    checkpoint_time: Timestamp,
    total_maturation_seconds: f64,
    is_playing: bool,
    /// Start of the current playing stretch. Soft resets and commits move
    /// the checkpoint but not this.
    playing_since: Timestamp,
    offline_seconds: f64,
}

impl SessionClock {
    /// A paused session at `maturation`, checkpointed now.
    pub fn new(
        id: impl Into<String>,
        species: impl Into<String>,
        total_maturation_seconds: f64,
        maturation: f64,
        clock: &impl Clock,
    ) -> Result<Self> {
        let now = clock.now();
        Ok(Self {
            id: id.into(),
            species: species.into(),
            maturation_at_checkpoint: require_fraction("maturation", maturation)?,
            checkpoint_time: now,
            total_maturation_seconds: require_positive(
                "total_maturation_seconds",
                total_maturation_seconds,
            )?,
            is_playing: false,
            playing_since: now,
            offline_seconds: 0.0,
        })
    }

    /// A paused session whose total comes from the species and settings.
    pub fn for_species(
        id: impl Into<String>,
        species: &SpeciesStats,
        settings: &RateSettings,
        maturation: f64,
        clock: &impl Clock,
    ) -> Result<Self> {
        let total = maturation::total_maturation_seconds(species, settings)?;
        Self::new(id, species.name.clone(), total, maturation, clock)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn species(&self) -> &str {
        &self.species
    }

    pub fn maturation_at_checkpoint(&self) -> f64 {
        self.maturation_at_checkpoint
    }

    pub fn checkpoint_time(&self) -> Timestamp {
        self.checkpoint_time
    }

    pub fn total_maturation_seconds(&self) -> f64 {
        self.total_maturation_seconds
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn offline_seconds(&self) -> f64 {
        self.offline_seconds
    }

    // ── State transitions ───────────────────────────────────────────────

    /// Resume growth from the frozen checkpoint. No-op while playing.
    pub fn start(self, clock: &impl Clock) -> Self {
        if self.is_playing {
            return self;
        }
        let now = clock.now();
        Self {
            checkpoint_time: now,
            is_playing: true,
            playing_since: now,
            offline_seconds: 0.0,
            ..self
        }
    }

    /// Freeze growth at the current maturation. No-op while paused.
    pub fn pause(self, clock: &impl Clock) -> Self {
        if !self.is_playing {
            return self;
        }
        let now = clock.now();
        Self {
            maturation_at_checkpoint: self.percentage_at(now),
            checkpoint_time: now,
            is_playing: false,
            playing_since: now,
            offline_seconds: 0.0,
            ..self
        }
    }

    /// Fold the current maturation into the checkpoint and restart the
    /// elapsed-time count from now. Play state is unchanged.
    pub fn soft_reset(self, clock: &impl Clock) -> Self {
        let now = clock.now();
        Self {
            maturation_at_checkpoint: self.percentage_at(now),
            checkpoint_time: now,
            offline_seconds: 0.0,
            ..self
        }
    }

    /// Change the growth duration, locking in progress made so far first.
    pub fn set_total_maturation_seconds(self, clock: &impl Clock, total: f64) -> Result<Self> {
        let total = require_positive("total_maturation_seconds", total)?;
        Ok(Self {
            total_maturation_seconds: total,
            ..self.soft_reset(clock)
        })
    }

    // ── Derived values ──────────────────────────────────────────────────

    /// Maturation right now, in `[0, 1]`.
    pub fn current_percentage(&self, clock: &impl Clock) -> f64 {
        self.percentage_at(clock.now())
    }

    /// Maturation at `now`, in `[0, 1]`.
    pub fn percentage_at(&self, now: Timestamp) -> f64 {
        if !self.is_playing {
            return self.maturation_at_checkpoint;
        }
        if !(self.total_maturation_seconds.is_finite() && self.total_maturation_seconds > 0.0) {
            log::warn!(
                "session {}: total maturation {} is unusable, holding at checkpoint",
                self.id,
                self.total_maturation_seconds
            );
            return self.maturation_at_checkpoint;
        }
        let elapsed = now.seconds_since(self.checkpoint_time) - self.offline_seconds;
        let progress = (elapsed / self.total_maturation_seconds).max(0.0);
        (self.maturation_at_checkpoint + progress).clamp(0.0, 1.0)
    }

    pub fn stage(&self, clock: &impl Clock) -> GrowthStage {
        GrowthStage::from_maturation(self.current_percentage(clock))
    }

    /// Seconds of playing time left until adulthood.
    pub fn seconds_to_adult(&self, clock: &impl Clock) -> f64 {
        self.seconds_until(clock, 1.0)
    }

    /// Seconds of playing time left until `target` maturation.
    pub fn seconds_until(&self, clock: &impl Clock, target: f64) -> f64 {
        maturation::time_until(
            self.current_percentage(clock),
            target,
            self.total_maturation_seconds,
        )
    }

    // ── Rate changes ────────────────────────────────────────────────────

    /// Recompute progress for a growth-rate change that took effect at
    /// `transition`, possibly in the past.
    ///
    /// Time before the transition counts against `old_total`, time after it
    /// against `new_total`. Offline seconds are taken out of the
    /// post-transition stretch first. The session is unchanged until the
    /// returned correction is committed.
    pub fn apply_retroactive_correction(
        self,
        clock: &impl Clock,
        transition: Timestamp,
        old_total: f64,
        new_total: f64,
    ) -> Result<RetroactiveCorrection> {
        let old_total = require_positive("old_total_seconds", old_total)?;
        let new_total = require_positive("new_total_seconds", new_total)?;
        let now = clock.now();

        let corrected = if self.is_playing {
            let cp = self.checkpoint_time;
            let before = (now.min(transition).seconds_since(cp)).max(0.0);
            let after = (now.seconds_since(cp.max(transition))).max(0.0);
            let offline_after = self.offline_seconds.min(after);
            let offline_before = self.offline_seconds - offline_after;
            let before = (before - offline_before).max(0.0);
            let after = after - offline_after;
            (self.maturation_at_checkpoint + before / old_total + after / new_total).clamp(0.0, 1.0)
        } else {
            self.maturation_at_checkpoint
        };

        log::debug!(
            "session {}: correction at {:?} ({old_total} -> {new_total} s) gives {corrected:.6}",
            self.id,
            transition
        );

        Ok(RetroactiveCorrection {
            session: self,
            corrected,
            now,
            new_total,
        })
    }

    /// Apply an official rate change in one step: derive the new growth
    /// duration from `settings.apply(change)`, correct, and commit.
    pub fn apply_rate_change(
        self,
        clock: &impl Clock,
        change: &RateChange,
        species: &SpeciesStats,
        settings: &RateSettings,
    ) -> Result<Self> {
        ensure_valid(&change.validate())?;
        let new_total = maturation::total_maturation_seconds(species, &settings.apply(change))?;
        let old_total = self.total_maturation_seconds;
        Ok(self
            .apply_retroactive_correction(clock, change.effective_at, old_total, new_total)?
            .commit())
    }

    // ── Downtime ────────────────────────────────────────────────────────

    /// Exclude `seconds` of server downtime from elapsed growth. Ignored
    /// while paused, since paused time does not count anyway.
    pub fn record_offline(self, seconds: f64) -> Result<Self> {
        let seconds = require_non_negative("offline_seconds", seconds)?;
        if !self.is_playing {
            log::debug!("session {}: ignoring {seconds} s offline while paused", self.id);
            return Ok(self);
        }
        Ok(Self {
            offline_seconds: self.offline_seconds + seconds,
            ..self
        })
    }

    /// Exclude the part of the downtime window `[from, to]` that overlaps
    /// the current playing stretch `[playing_since, now]`.
    ///
    /// Downtime after the checkpoint is added to the offline seconds.
    /// Downtime between the start of play and the checkpoint was already
    /// folded into the checkpoint by a soft reset or a commit, so it is
    /// taken back out of the checkpoint maturation at the current growth
    /// duration.
    pub fn record_downtime(self, clock: &impl Clock, from: Timestamp, to: Timestamp) -> Self {
        if !self.is_playing {
            return self;
        }
        let since_checkpoint = overlap_seconds(from, to, self.checkpoint_time, clock.now());
        let before_checkpoint = overlap_seconds(from, to, self.playing_since, self.checkpoint_time);
        if since_checkpoint <= 0.0 && before_checkpoint <= 0.0 {
            return self;
        }
        let total = self.total_maturation_seconds;
        let folded = if before_checkpoint > 0.0 && total.is_finite() && total > 0.0 {
            before_checkpoint / total
        } else {
            0.0
        };
        log::debug!(
            "session {}: downtime {since_checkpoint:.1} s since checkpoint, \
             {before_checkpoint:.1} s already folded in",
            self.id
        );
        Self {
            maturation_at_checkpoint: (self.maturation_at_checkpoint - folded).max(0.0),
            offline_seconds: self.offline_seconds + since_checkpoint,
            ..self
        }
    }

    // ── Persistence ─────────────────────────────────────────────────────

    /// Flat record for an external store. `extra` holds caller-owned fields
    /// that are carried through untouched.
    pub fn to_record(&self, extra: Map<String, Value>) -> SessionRecord {
        SessionRecord {
            id: self.id.clone(),
            species: self.species.clone(),
            maturation_at_checkpoint: self.maturation_at_checkpoint,
            checkpoint_time: self.checkpoint_time,
            total_maturation_seconds: self.total_maturation_seconds,
            is_playing: self.is_playing,
            playing_since: Some(self.playing_since),
            offline_seconds: self.offline_seconds,
            extra,
        }
    }

    /// Restore a session from a record. Out-of-range values are pulled
    /// back into range rather than rejected; a non-positive total is kept
    /// and handled by the fail-soft guard in [`Self::percentage_at`].
    pub fn from_record(record: &SessionRecord) -> Self {
        let maturation = if record.maturation_at_checkpoint.is_nan() {
            0.0
        } else {
            record.maturation_at_checkpoint.clamp(0.0, 1.0)
        };
        let offline = if record.offline_seconds.is_finite() {
            record.offline_seconds.max(0.0)
        } else {
            0.0
        };
        Self {
            id: record.id.clone(),
            species: record.species.clone(),
            maturation_at_checkpoint: maturation,
            checkpoint_time: record.checkpoint_time,
            total_maturation_seconds: record.total_maturation_seconds,
            is_playing: record.is_playing,
            playing_since: record
                .playing_since
                .map_or(record.checkpoint_time, |t| t.min(record.checkpoint_time)),
            offline_seconds: offline,
        }
    }
}

/// Seconds `[from, to]` shares with `[start, end]`.
fn overlap_seconds(from: Timestamp, to: Timestamp, start: Timestamp, end: Timestamp) -> f64 {
    let (start, end) = (from.max(start), to.min(end));
    if end > start {
        end.seconds_since(start)
    } else {
        0.0
    }
}

/// A corrected maturation waiting to be committed.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "a correction changes nothing until it is committed"]
pub struct RetroactiveCorrection {
    session: SessionClock,
    corrected: f64,
    now: Timestamp,
    new_total: f64,
}

impl RetroactiveCorrection {
    /// Maturation at the evaluation instant under the corrected history.
    pub fn percentage(&self) -> f64 {
        self.corrected
    }

    /// Lock in the corrected maturation as the new checkpoint and switch
    /// the session to the new growth duration.
    pub fn commit(self) -> SessionClock {
        SessionClock {
            maturation_at_checkpoint: self.corrected,
            checkpoint_time: self.now,
            total_maturation_seconds: self.new_total,
            offline_seconds: 0.0,
            ..self.session
        }
    }

    /// Drop the correction and get the untouched session back.
    pub fn discard(self) -> SessionClock {
        self.session
    }
}

/// Flat, storage-friendly form of a [`SessionClock`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    pub species: String,
    pub maturation_at_checkpoint: f64,
    pub checkpoint_time: Timestamp,
    pub total_maturation_seconds: f64,
    pub is_playing: bool,
    /// Start of the current playing stretch. Older records without it fall
    /// back to the checkpoint time.
    #[serde(default)]
    pub playing_since: Option<Timestamp>,
    #[serde(default)]
    pub offline_seconds: f64,
    /// Caller-owned fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SessionRecord {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
