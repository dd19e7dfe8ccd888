//! Save/load of tracked sessions
//!
//! Uses bincode for a compact binary snapshot of every session. The JSON
//! [`SessionRecord`](crate::session::SessionRecord) remains the format for
//! exchanging single sessions with callers.

use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use crate::clock::{Clock, Timestamp};
use crate::error::{HatcheryError, Result};
use crate::session::SessionClock;

/// Version number for snapshot format (increment when format changes)
pub const SNAPSHOT_VERSION: u32 = 2;

/// Every tracked session at one moment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Snapshot format version
    pub version: u32,
    pub saved_at: Timestamp,
    pub sessions: Vec<SessionClock>,
}

impl SessionSnapshot {
    pub fn new(sessions: Vec<SessionClock>, clock: &impl Clock) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            saved_at: clock.now(),
            sessions,
        }
    }
}

/// Save sessions to a writer
pub fn save_sessions<W: Write>(
    writer: W,
    sessions: &[SessionClock],
    clock: &impl Clock,
) -> Result<()> {
    let snapshot = SessionSnapshot::new(sessions.to_vec(), clock);
    bincode::serialize_into(writer, &snapshot)?;
    log::debug!("saved {} sessions", snapshot.sessions.len());
    Ok(())
}

/// Load sessions from a reader
pub fn load_sessions<R: Read>(reader: R) -> Result<SessionSnapshot> {
    let snapshot: SessionSnapshot = bincode::deserialize_from(reader)?;
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(HatcheryError::SnapshotVersion {
            found: snapshot.version,
            expected: SNAPSHOT_VERSION,
        });
    }
    log::debug!(
        "loaded {} sessions saved at {:?}",
        snapshot.sessions.len(),
        snapshot.saved_at
    );
    Ok(snapshot)
}
