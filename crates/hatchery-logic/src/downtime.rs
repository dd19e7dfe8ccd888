//! Server online/offline tracking.
//!
//! An external poller pushes [`ServerStatusEvent`]s into a
//! [`DowntimeTracker`]. When a server comes back online the tracker
//! produces a [`DowntimeReport`] covering the outage; the caller applies
//! it to every session on that server so growth excludes the downtime.
//! A report always asks the owner to verify maturation by hand, since the
//! server may not have paused growth exactly when the poller noticed.

use serde::{Deserialize, Serialize};

use crate::clock::{Clock, Timestamp};
use crate::session::SessionClock;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    #[default]
    Online,
    Offline,
}

/// One observation from the status feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerStatusEvent {
    pub status: ServerStatus,
    /// When the server entered this status.
    pub since: Timestamp,
}

/// A completed outage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DowntimeReport {
    pub from: Timestamp,
    pub to: Timestamp,
    pub offline_seconds: f64,
    pub verify_manually: bool,
}

impl DowntimeReport {
    /// Exclude this outage from a session's growth.
    pub fn apply(&self, session: SessionClock, clock: &impl Clock) -> SessionClock {
        session.record_downtime(clock, self.from, self.to)
    }
}

/// Online/offline state of one server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DowntimeTracker {
    status: ServerStatus,
    offline_since: Option<Timestamp>,
    last_seen: Option<Timestamp>,
}

impl DowntimeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> ServerStatus {
        self.status
    }

    /// Seconds the server has been down as of `now`, if it is down.
    pub fn ongoing_seconds(&self, now: Timestamp) -> Option<f64> {
        self.offline_since
            .map(|since| now.seconds_since(since).max(0.0))
    }

    /// Feed one event. Returns a report when an outage ends.
    ///
    /// Repeated events for the current status are ignored, as are events
    /// older than the newest one already seen.
    pub fn observe(&mut self, event: ServerStatusEvent) -> Option<DowntimeReport> {
        if let Some(last) = self.last_seen {
            if event.since < last {
                log::debug!("ignoring out-of-order status event at {:?}", event.since);
                return None;
            }
        }

        match (self.status, event.status) {
            (ServerStatus::Online, ServerStatus::Offline) => {
                self.status = ServerStatus::Offline;
                self.offline_since = Some(event.since);
                self.last_seen = Some(event.since);
                log::info!("server went offline at {:?}", event.since);
                None
            }
            (ServerStatus::Offline, ServerStatus::Online) => {
                self.status = ServerStatus::Online;
                self.last_seen = Some(event.since);
                let from = self.offline_since.take()?;
                let report = DowntimeReport {
                    from,
                    to: event.since,
                    offline_seconds: event.since.seconds_since(from).max(0.0),
                    verify_manually: true,
                };
                log::info!(
                    "server back online after {:.0} s offline",
                    report.offline_seconds
                );
                Some(report)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn event(status: ServerStatus, secs: f64) -> ServerStatusEvent {
        ServerStatusEvent {
            status,
            since: Timestamp::from_secs(secs),
        }
    }

    #[test]
    fn test_outage_produces_report() {
        let mut t = DowntimeTracker::new();
        assert_eq!(t.status(), ServerStatus::Online);
        assert!(t.observe(event(ServerStatus::Offline, 100.0)).is_none());
        assert_eq!(t.status(), ServerStatus::Offline);
        assert_eq!(t.ongoing_seconds(Timestamp::from_secs(160.0)), Some(60.0));

        let report = t.observe(event(ServerStatus::Online, 400.0)).unwrap();
        assert_eq!(report.from, Timestamp::from_secs(100.0));
        assert_eq!(report.to, Timestamp::from_secs(400.0));
        assert!((report.offline_seconds - 300.0).abs() < 1e-9);
        assert!(report.verify_manually);
        assert_eq!(t.ongoing_seconds(Timestamp::from_secs(500.0)), None);
    }

    #[test]
    fn test_duplicate_events_are_idempotent() {
        let mut t = DowntimeTracker::new();
        assert!(t.observe(event(ServerStatus::Online, 10.0)).is_none());
        t.observe(event(ServerStatus::Offline, 100.0));
        assert!(t.observe(event(ServerStatus::Offline, 150.0)).is_none());
        let report = t.observe(event(ServerStatus::Online, 200.0)).unwrap();
        // The outage is measured from the first offline event.
        assert!((report.offline_seconds - 100.0).abs() < 1e-9);
        assert!(t.observe(event(ServerStatus::Online, 250.0)).is_none());
    }

    #[test]
    fn test_out_of_order_event_ignored() {
        let mut t = DowntimeTracker::new();
        t.observe(event(ServerStatus::Offline, 500.0));
        assert!(t.observe(event(ServerStatus::Online, 400.0)).is_none());
        assert_eq!(t.status(), ServerStatus::Offline);
    }

    #[test]
    fn test_report_applies_to_session() {
        let clock = ManualClock::at(Timestamp(0));
        let session = SessionClock::new("a", "Grazer", 3600.0, 0.0, &clock)
            .unwrap()
            .start(&clock);
        let mut t = DowntimeTracker::new();
        t.observe(event(ServerStatus::Offline, 600.0));
        clock.advance_secs(1800.0);
        let report = t.observe(event(ServerStatus::Online, 1500.0)).unwrap();
        let session = report.apply(session, &clock);
        assert!((session.current_percentage(&clock) - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_status_event_json() {
        let e: ServerStatusEvent =
            serde_json::from_str(r#"{"status": "offline", "since": 1700000000000}"#).unwrap();
        assert_eq!(e.status, ServerStatus::Offline);
        assert_eq!(e.since, Timestamp(1_700_000_000_000));
    }
}
