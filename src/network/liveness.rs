//! Liveness monitor state for a single session.
//!
//! The connection worker owns one [`Liveness`] and asks it what to do on
//! each probe tick. Any inbound line counts as traffic.

use std::time::{Duration, Instant};

/// What the worker should do on a probe tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LivenessAction {
    /// Send an unsolicited `PING :<server>` probe.
    SendPing,
    /// The peer has been silent too long; tear the session down.
    Timeout { idle_secs: u64 },
}

/// Tracks the last inbound traffic of a session.
#[derive(Debug)]
pub struct Liveness {
    last_activity: Instant,
    idle_limit: Duration,
}

impl Liveness {
    /// Start tracking at `now` with the given silence limit.
    pub fn new(now: Instant, idle_limit: Duration) -> Self {
        Self {
            last_activity: now,
            idle_limit,
        }
    }

    /// Record inbound traffic.
    pub fn touch(&mut self, now: Instant) {
        self.last_activity = now;
    }

    /// Time since the last inbound line.
    pub fn idle(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_activity)
    }

    /// Decide the action for a probe tick at `now`.
    pub fn on_tick(&self, now: Instant) -> LivenessAction {
        let idle = self.idle(now);
        if idle >= self.idle_limit {
            LivenessAction::Timeout {
                idle_secs: idle.as_secs(),
            }
        } else {
            LivenessAction::SendPing
        }
    }
}
