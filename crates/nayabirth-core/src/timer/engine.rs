//! Contraction timer state machine.
//!
//! Like the rest of the core this is wall-clock based and owns no thread:
//! the caller passes the current instant into each transition and polls
//! `tick_at()` at whatever cadence it renders.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> (start) -> Timing -> (stop) -> Idle
//! ```
//!
//! Starting while timing and stopping while idle are both no-ops.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Timing,
}

/// A contraction closed by `stop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClosedInterval {
    pub started_at: DateTime<Utc>,
    pub stopped_at: DateTime<Utc>,
    /// Whole seconds, rounded to nearest and clamped at zero.
    pub duration_secs: u64,
}

/// Timer for the contraction currently in progress, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractionTimer {
    #[serde(default)]
    started_at: Option<DateTime<Utc>>,
}

impl ContractionTimer {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        if self.started_at.is_some() {
            TimerState::Timing
        } else {
            TimerState::Idle
        }
    }

    pub fn is_timing(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Whole seconds elapsed since start (truncated), 0 while idle.
    pub fn elapsed_secs_at(&self, now: DateTime<Utc>) -> u64 {
        match self.started_at {
            Some(started) => (now - started).num_seconds().max(0) as u64,
            None => 0,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin timing. Returns `false` if a contraction is already in progress.
    pub fn start_at(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_timing() {
            return false;
        }
        self.started_at = Some(now);
        true
    }

    pub fn start(&mut self) -> bool {
        self.start_at(Utc::now())
    }

    /// Live display projection; `None` while idle.
    pub fn tick_at(&self, now: DateTime<Utc>) -> Option<u64> {
        self.started_at.map(|_| self.elapsed_secs_at(now))
    }

    /// Close the running contraction. `None` (and no state change) while idle.
    pub fn stop_at(&mut self, now: DateTime<Utc>) -> Option<ClosedInterval> {
        let started_at = self.started_at.take()?;
        Some(ClosedInterval {
            started_at,
            stopped_at: now,
            duration_secs: rounded_secs(now - started_at),
        })
    }

    pub fn stop(&mut self) -> Option<ClosedInterval> {
        self.stop_at(Utc::now())
    }

    /// Abandon the running contraction without recording it.
    pub fn cancel(&mut self) -> bool {
        self.started_at.take().is_some()
    }
}

/// Round a signed duration to the nearest whole second, clamping negatives
/// (clock skew) to zero.
fn rounded_secs(delta: chrono::Duration) -> u64 {
    let ms = delta.num_milliseconds();
    if ms <= 0 {
        0
    } else {
        ((ms + 500) / 1000) as u64
    }
}
