//! Fetal movement (kick) counting.
//!
//! A session starts on the first kick and runs until it is saved or reset.
//! The usual guidance is 10 movements within 2 hours; the goal is
//! configurable. Saved sessions go into a bounded, newest-first history
//! persisted the same way as the contraction log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::events::Event;
use crate::storage::{self, Config, KeyValueStore, KICK_SESSIONS_KEY};

pub const DEFAULT_KICK_GOAL: u32 = 10;
pub const DEFAULT_MAX_SESSIONS: usize = 20;

/// One saved counting session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KickSession {
    /// Creation time in epoch milliseconds.
    pub id: i64,
    /// When the session was saved.
    pub date: DateTime<Utc>,
    pub kicks: u32,
    /// Seconds from the first kick to saving.
    pub duration: u64,
    pub goal_reached: bool,
}

/// The in-progress counting session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KickCounter {
    kicks: u32,
    started_at: Option<DateTime<Utc>>,
    goal: u32,
}

impl Default for KickCounter {
    fn default() -> Self {
        Self::new(DEFAULT_KICK_GOAL)
    }
}

impl KickCounter {
    pub fn new(goal: u32) -> Self {
        Self {
            kicks: 0,
            started_at: None,
            goal: goal.max(1),
        }
    }

    pub fn kicks(&self) -> u32 {
        self.kicks
    }

    pub fn goal(&self) -> u32 {
        self.goal
    }

    pub fn is_active(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn goal_reached(&self) -> bool {
        self.kicks >= self.goal
    }

    /// 0.0 .. 100.0, capped once the goal is met.
    pub fn progress_pct(&self) -> f64 {
        (self.kicks as f64 / self.goal as f64 * 100.0).min(100.0)
    }

    pub fn elapsed_secs_at(&self, now: DateTime<Utc>) -> u64 {
        self.started_at
            .map(|start| (now - start).num_seconds().max(0) as u64)
            .unwrap_or(0)
    }

    /// Count a kick, starting the session clock on the first one.
    /// Returns the new count.
    pub fn kick_at(&mut self, now: DateTime<Utc>) -> u32 {
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
        self.kicks = self.kicks.saturating_add(1);
        self.kicks
    }

    /// Close the session. `None` if nothing was counted.
    pub fn save_at(&mut self, now: DateTime<Utc>) -> Option<KickSession> {
        if self.kicks == 0 {
            return None;
        }
        let session = KickSession {
            id: now.timestamp_millis(),
            date: now,
            kicks: self.kicks,
            duration: self.elapsed_secs_at(now),
            goal_reached: self.goal_reached(),
        };
        self.reset();
        Some(session)
    }

    pub fn reset(&mut self) {
        self.kicks = 0;
        self.started_at = None;
    }
}

/// Saved sessions, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KickHistory {
    sessions: Vec<KickSession>,
    capacity: usize,
}

impl Default for KickHistory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SESSIONS)
    }
}

impl KickHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            sessions: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    /// Last persisted sessions; anything unreadable counts as none.
    pub fn load<S: KeyValueStore + ?Sized>(store: &S, capacity: usize) -> Self {
        let mut sessions: Vec<KickSession> =
            storage::read_json(store, KICK_SESSIONS_KEY).unwrap_or_default();
        let capacity = capacity.max(1);
        sessions.truncate(capacity);
        Self { sessions, capacity }
    }

    pub fn sessions(&self) -> &[KickSession] {
        &self.sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Prepend, evict past capacity and persist (best-effort).
    pub fn record<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &mut S,
        session: KickSession,
    ) -> &[KickSession] {
        self.sessions.insert(0, session);
        self.sessions.truncate(self.capacity);
        storage::write_json(store, KICK_SESSIONS_KEY, &self.sessions);
        &self.sessions
    }

    pub fn clear<S: KeyValueStore + ?Sized>(&mut self, store: &mut S) {
        self.sessions.clear();
        storage::remove_key(store, KICK_SESSIONS_KEY);
    }
}

/// Counter plus history, persisting through an injected store.
pub struct KickTracker<S: KeyValueStore> {
    store: S,
    counter: KickCounter,
    history: KickHistory,
}

impl<S: KeyValueStore> KickTracker<S> {
    pub fn open(store: S, config: &Config) -> Self {
        let history = KickHistory::load(&store, config.kicks.max_sessions);
        Self {
            store,
            counter: KickCounter::new(config.kicks.goal),
            history,
        }
    }

    pub fn counter(&self) -> &KickCounter {
        &self.counter
    }

    pub fn history(&self) -> &KickHistory {
        &self.history
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Carry over a session counted by an earlier process. The configured
    /// goal wins over the one stored with the counter.
    pub fn resume_counter(&mut self, counter: KickCounter) {
        let goal = self.counter.goal;
        self.counter = KickCounter { goal, ..counter };
    }

    pub fn kick_at(&mut self, now: DateTime<Utc>) -> Event {
        let kicks = self.counter.kick_at(now);
        if kicks == self.counter.goal {
            log::info!("kick goal of {} reached", self.counter.goal);
        }
        Event::KickRecorded {
            kicks,
            goal: self.counter.goal,
            goal_reached: self.counter.goal_reached(),
            at: now,
        }
    }

    pub fn save_at(&mut self, now: DateTime<Utc>) -> Option<Event> {
        let session = self.counter.save_at(now)?;
        self.history.record(&mut self.store, session.clone());
        Some(Event::KickSessionSaved { session, at: now })
    }

    pub fn reset_at(&mut self, now: DateTime<Utc>) -> Event {
        self.counter.reset();
        Event::KickSessionReset { at: now }
    }

    pub fn clear_history_at(&mut self, now: DateTime<Utc>) -> Event {
        self.history.clear(&mut self.store);
        Event::KickHistoryCleared { at: now }
    }
}
