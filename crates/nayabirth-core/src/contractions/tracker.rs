//! Contraction tracker: timer, history and 5-1-1 alert behind one owner.
//!
//! The tracker is the only writer of the contraction log. Every transition
//! that changes the log recomputes the alert before returning, so callers
//! never observe a log and an alert that disagree.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::history::{ContractionEvent, ContractionLog, LogAverages};
use super::pattern::{DetectorConfig, PatternDetector, PatternReport};
use crate::events::Event;
use crate::storage::{Config, KeyValueStore};
use crate::timer::{ContractionTimer, TimerState};

/// What a frontend needs to render the contraction screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerSnapshot {
    pub state: TimerState,
    pub started_at: Option<DateTime<Utc>>,
    pub elapsed_secs: u64,
    pub contractions: Vec<ContractionEvent>,
    pub averages: LogAverages,
    pub alert: bool,
    pub at: DateTime<Utc>,
}

pub struct ContractionTracker<S: KeyValueStore> {
    store: S,
    timer: ContractionTimer,
    log: ContractionLog,
    detector: PatternDetector,
    alert: bool,
}

impl<S: KeyValueStore> ContractionTracker<S> {
    /// Load persisted history from `store` using the configured bounds.
    pub fn open(store: S, config: &Config) -> Self {
        Self::with_settings(store, config.contractions.max_entries, config.detector.clone())
    }

    pub fn with_settings(store: S, capacity: usize, detector: DetectorConfig) -> Self {
        let log = ContractionLog::load(&store, capacity);
        let detector = PatternDetector::new(detector);
        let alert = detector.is_alert(log.entries());
        Self {
            store,
            timer: ContractionTimer::new(),
            log,
            detector,
            alert,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn timer(&self) -> &ContractionTimer {
        &self.timer
    }

    pub fn log(&self) -> &ContractionLog {
        &self.log
    }

    pub fn alert(&self) -> bool {
        self.alert
    }

    pub fn report(&self) -> PatternReport {
        self.detector.evaluate(self.log.entries())
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Elapsed seconds of the running contraction, `None` while idle.
    pub fn tick_at(&self, now: DateTime<Utc>) -> Option<u64> {
        self.timer.tick_at(now)
    }

    pub fn snapshot_at(&self, now: DateTime<Utc>) -> TrackerSnapshot {
        TrackerSnapshot {
            state: self.timer.state(),
            started_at: self.timer.started_at(),
            elapsed_secs: self.timer.elapsed_secs_at(now),
            contractions: self.log.entries().to_vec(),
            averages: self.log.averages(),
            alert: self.alert,
            at: now,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Carry over a contraction started by an earlier process.
    pub fn resume_timer(&mut self, timer: ContractionTimer) {
        self.timer = timer;
    }

    pub fn start_at(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if !self.timer.start_at(now) {
            log::debug!("start ignored, a contraction is already being timed");
            return None;
        }
        Some(Event::ContractionStarted { at: now })
    }

    pub fn start(&mut self) -> Option<Event> {
        self.start_at(Utc::now())
    }

    /// Close the running contraction, log it and re-run detection.
    /// Does nothing while idle.
    pub fn stop_at(&mut self, now: DateTime<Utc>) -> Option<Event> {
        let closed = self.timer.stop_at(now)?;
        let contraction = self
            .log
            .next_event(closed.started_at, closed.duration_secs, now);
        self.log.append(&mut self.store, contraction.clone());
        let alert_changed = self.refresh_alert();
        log::debug!(
            "recorded contraction: {}s, interval {:?}",
            contraction.duration,
            contraction.interval
        );
        Some(Event::ContractionRecorded {
            contraction,
            alert: self.alert,
            alert_changed,
            at: now,
        })
    }

    pub fn stop(&mut self) -> Option<Event> {
        self.stop_at(Utc::now())
    }

    /// Discard the running contraction without logging it.
    pub fn cancel_at(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if !self.timer.cancel() {
            return None;
        }
        Some(Event::ContractionCancelled { at: now })
    }

    /// Remove all history. The alert always clears.
    pub fn clear_at(&mut self, now: DateTime<Utc>) -> Event {
        self.log.clear(&mut self.store);
        self.refresh_alert();
        Event::ContractionsCleared { at: now }
    }

    fn refresh_alert(&mut self) -> bool {
        let alert = self.detector.is_alert(self.log.entries());
        let changed = alert != self.alert;
        if changed {
            if alert {
                log::info!("5-1-1 pattern detected");
            } else {
                log::info!("5-1-1 pattern no longer holds");
            }
        }
        self.alert = alert;
        changed
    }
}
