//! Bounded contraction history.
//!
//! Entries are kept most-recent-first. The interval of each entry is fixed
//! at insertion time against whatever was at the head of the log then, so
//! later evictions never rewrite it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::{self, KeyValueStore, CONTRACTIONS_KEY};

/// Default number of contractions kept.
pub const DEFAULT_CAPACITY: usize = 50;

/// One completed contraction.
///
/// Field names match the JSON documents the web app kept in local storage
/// (`id`, `startTime`, `duration`, `interval`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractionEvent {
    /// Creation time in epoch milliseconds.
    pub id: i64,
    pub start_time: DateTime<Utc>,
    /// Length in whole seconds.
    pub duration: u64,
    /// Seconds since the previous contraction started; `None` for the
    /// first one recorded into an empty log.
    #[serde(default)]
    pub interval: Option<u64>,
}

/// Mean duration and interval across the whole log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogAverages {
    pub avg_duration_secs: u64,
    /// Only entries that have an interval contribute.
    pub avg_interval_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractionLog {
    entries: Vec<ContractionEvent>,
    capacity: usize,
}

impl Default for ContractionLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ContractionLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    /// Build from entries already ordered most-recent-first, dropping
    /// anything past `capacity`.
    pub fn with_entries(mut entries: Vec<ContractionEvent>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        entries.truncate(capacity);
        Self { entries, capacity }
    }

    /// Last persisted history, or an empty log.
    ///
    /// Unreadable documents and documents of the wrong shape are treated as
    /// absent. A history that isn't ordered newest-first is re-sorted by
    /// start time; stored intervals are kept as recorded.
    pub fn load<S: KeyValueStore + ?Sized>(store: &S, capacity: usize) -> Self {
        let mut entries: Vec<ContractionEvent> =
            storage::read_json(store, CONTRACTIONS_KEY).unwrap_or_default();
        if !is_newest_first(&entries) {
            log::warn!("contraction history is not ordered newest-first, re-sorting");
            entries.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        }
        Self::with_entries(entries, capacity)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn entries(&self) -> &[ContractionEvent] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Most recent contraction.
    pub fn head(&self) -> Option<&ContractionEvent> {
        self.entries.first()
    }

    pub fn averages(&self) -> LogAverages {
        if self.entries.is_empty() {
            return LogAverages::default();
        }

        let total: u64 = self.entries.iter().map(|c| c.duration).sum();
        let avg_duration_secs = rounded_mean(total, self.entries.len());

        let intervals: Vec<u64> = self.entries.iter().filter_map(|c| c.interval).collect();
        let avg_interval_secs = if intervals.is_empty() {
            None
        } else {
            Some(rounded_mean(intervals.iter().sum(), intervals.len()))
        };

        LogAverages {
            avg_duration_secs,
            avg_interval_secs,
        }
    }

    /// Build the event a contraction starting at `started_at` would become
    /// if inserted now.
    ///
    /// The interval is measured against the current head; `id` is bumped
    /// past the head's id if needed so ids stay strictly increasing. A start
    /// earlier than the head's (the clock stepped back) is clamped to the
    /// head's start so the log stays newest-first.
    pub fn next_event(
        &self,
        started_at: DateTime<Utc>,
        duration_secs: u64,
        created_at: DateTime<Utc>,
    ) -> ContractionEvent {
        let head = self.head();
        let mut id = created_at.timestamp_millis();
        let mut start_time = started_at;
        if let Some(prev) = head {
            id = id.max(prev.id.saturating_add(1));
            if start_time < prev.start_time {
                log::warn!(
                    "contraction start {} precedes the previous one at {}, clamping",
                    start_time,
                    prev.start_time
                );
                start_time = prev.start_time;
            }
        }
        ContractionEvent {
            id,
            start_time,
            duration: duration_secs,
            interval: head.map(|prev| (start_time - prev.start_time).num_seconds().max(0) as u64),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Insert at the head and evict past capacity, without persisting.
    pub fn insert(&mut self, event: ContractionEvent) -> &[ContractionEvent] {
        self.entries.insert(0, event);
        self.entries.truncate(self.capacity);
        &self.entries
    }

    /// Insert and persist. A failed write is logged and the in-memory log
    /// is kept.
    pub fn append<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &mut S,
        event: ContractionEvent,
    ) -> &[ContractionEvent] {
        self.insert(event);
        storage::write_json(store, CONTRACTIONS_KEY, &self.entries);
        &self.entries
    }

    /// Empty the log and drop the persisted copy.
    pub fn clear<S: KeyValueStore + ?Sized>(&mut self, store: &mut S) {
        self.entries.clear();
        storage::remove_key(store, CONTRACTIONS_KEY);
    }
}

fn rounded_mean(total: u64, count: usize) -> u64 {
    (total as f64 / count as f64).round() as u64
}

fn is_newest_first(entries: &[ContractionEvent]) -> bool {
    entries
        .windows(2)
        .all(|pair| pair[0].start_time >= pair[1].start_time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap()
    }

    fn record(log: &mut ContractionLog, store: &mut MemoryStore, offset_secs: i64, duration: u64) {
        let start = t0() + Duration::seconds(offset_secs);
        let end = start + Duration::seconds(duration as i64);
        let event = log.next_event(start, duration, end);
        log.append(store, event);
    }

    #[test]
    fn first_entry_has_no_interval() {
        let mut store = MemoryStore::new();
        let mut log = ContractionLog::default();
        record(&mut log, &mut store, 0, 50);
        assert_eq!(log.len(), 1);
        assert_eq!(log.head().unwrap().interval, None);
        assert_eq!(log.head().unwrap().duration, 50);
    }

    #[test]
    fn interval_measured_from_previous_head() {
        let mut store = MemoryStore::new();
        let mut log = ContractionLog::default();
        record(&mut log, &mut store, 0, 50);
        record(&mut log, &mut store, 300, 50);
        record(&mut log, &mut store, 630, 60);

        let entries = log.entries();
        assert_eq!(entries[0].interval, Some(330));
        assert_eq!(entries[1].interval, Some(300));
        assert_eq!(entries[2].interval, None);
    }

    #[test]
    fn eviction_drops_oldest_first() {
        let mut store = MemoryStore::new();
        let mut log = ContractionLog::new(3);
        for i in 0..5 {
            record(&mut log, &mut store, i * 300, 50);
        }
        assert_eq!(log.len(), 3);
        assert_eq!(log.entries()[0].start_time, t0() + Duration::seconds(1200));
        assert_eq!(log.entries()[2].start_time, t0() + Duration::seconds(600));
        // The oldest survivor keeps the interval it was recorded with.
        assert_eq!(log.entries()[2].interval, Some(300));
    }

    #[test]
    fn ids_strictly_increase_within_same_millisecond() {
        let log = ContractionLog::default();
        let a = log.next_event(t0(), 50, t0());
        let mut log = log;
        log.insert(a.clone());
        let b = log.next_event(t0(), 50, t0());
        assert!(b.id > a.id);
    }

    #[test]
    fn append_persists_and_load_restores() {
        let mut store = MemoryStore::new();
        let mut log = ContractionLog::default();
        record(&mut log, &mut store, 0, 50);
        record(&mut log, &mut store, 300, 55);

        let restored = ContractionLog::load(&store, DEFAULT_CAPACITY);
        assert_eq!(restored, log);
    }

    #[test]
    fn load_reads_web_app_format() {
        let mut store = MemoryStore::new();
        store
            .set(
                CONTRACTIONS_KEY,
                r#"[
                    {"id": 1772352350000, "startTime": "2026-03-01T08:05:00.000Z", "duration": 50, "interval": 300},
                    {"id": 1772352050000, "startTime": "2026-03-01T08:00:00.000Z", "duration": 48, "interval": null}
                ]"#,
            )
            .unwrap();
        let log = ContractionLog::load(&store, DEFAULT_CAPACITY);
        assert_eq!(log.len(), 2);
        assert_eq!(log.entries()[0].interval, Some(300));
        assert_eq!(log.entries()[1].interval, None);
    }

    #[test]
    fn load_treats_corrupt_data_as_empty() {
        let mut store = MemoryStore::new();
        store.set(CONTRACTIONS_KEY, "not json at all").unwrap();
        assert!(ContractionLog::load(&store, DEFAULT_CAPACITY).is_empty());

        store
            .set(CONTRACTIONS_KEY, r#"[{"id": 1, "startTime": 5}]"#)
            .unwrap();
        assert!(ContractionLog::load(&store, DEFAULT_CAPACITY).is_empty());
    }

    #[test]
    fn earlier_start_is_clamped_to_head() {
        let mut store = MemoryStore::new();
        let mut log = ContractionLog::default();
        record(&mut log, &mut store, 1200, 60);
        record(&mut log, &mut store, 1080, 60);

        let head = log.head().unwrap();
        assert_eq!(head.start_time, t0() + Duration::seconds(1200));
        assert_eq!(head.interval, Some(0));

        let restored = ContractionLog::load(&store, DEFAULT_CAPACITY);
        assert_eq!(restored, log);
    }

    #[test]
    fn load_reorders_misordered_history() {
        let mut store = MemoryStore::new();
        let older = ContractionEvent {
            id: 1,
            start_time: t0(),
            duration: 50,
            interval: None,
        };
        let newer = ContractionEvent {
            id: 2,
            start_time: t0() + Duration::seconds(300),
            duration: 50,
            interval: Some(300),
        };
        storage::write_json(&mut store, CONTRACTIONS_KEY, &vec![older.clone(), newer.clone()]);
        let log = ContractionLog::load(&store, DEFAULT_CAPACITY);
        assert_eq!(log.entries(), &[newer, older]);
    }

    #[test]
    fn load_truncates_to_capacity() {
        let mut store = MemoryStore::new();
        let mut log = ContractionLog::new(10);
        for i in 0..10 {
            record(&mut log, &mut store, i * 300, 50);
        }
        let small = ContractionLog::load(&store, 4);
        assert_eq!(small.len(), 4);
        assert_eq!(small.head(), log.head());
    }

    #[test]
    fn failed_write_keeps_in_memory_log() {
        let mut store = MemoryStore::failing();
        let mut log = ContractionLog::default();
        record(&mut log, &mut store, 0, 50);
        assert_eq!(log.len(), 1);
        assert!(ContractionLog::load(&store, DEFAULT_CAPACITY).is_empty());
    }

    #[test]
    fn clear_empties_log_and_store() {
        let mut store = MemoryStore::new();
        let mut log = ContractionLog::default();
        record(&mut log, &mut store, 0, 50);
        log.clear(&mut store);
        assert!(log.is_empty());
        assert!(!store.contains_key(CONTRACTIONS_KEY));
    }

    #[test]
    fn averages_skip_missing_intervals() {
        let mut store = MemoryStore::new();
        let mut log = ContractionLog::default();
        record(&mut log, &mut store, 0, 40);
        record(&mut log, &mut store, 300, 50);
        record(&mut log, &mut store, 660, 61);

        let avg = log.averages();
        // (40 + 50 + 61) / 3 = 50.33
        assert_eq!(avg.avg_duration_secs, 50);
        // (300 + 360) / 2, the first entry's missing interval is not a zero
        assert_eq!(avg.avg_interval_secs, Some(330));
    }

    #[test]
    fn averages_of_empty_log() {
        let log = ContractionLog::default();
        assert_eq!(log.averages(), LogAverages::default());

        let mut store = MemoryStore::new();
        let mut single = ContractionLog::default();
        record(&mut single, &mut store, 0, 45);
        assert_eq!(single.averages().avg_duration_secs, 45);
        assert_eq!(single.averages().avg_interval_secs, None);
    }
}
