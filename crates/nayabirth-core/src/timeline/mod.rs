//! Pregnancy timeline arithmetic.
//!
//! Everything is derived from the due date using the LMP (last menstrual
//! period) convention: the due date is 280 days after LMP, and week 1
//! starts on the LMP date.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::storage::{self, KeyValueStore, TIMELINE_KEY};

/// Days in a full-term pregnancy.
pub const PREGNANCY_DAYS: i64 = 280;
pub const FULL_TERM_WEEKS: u32 = 40;
/// Highest week tracked, post-term included.
pub const MAX_WEEKS: u32 = 42;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trimester {
    First,
    Second,
    Third,
}

impl Trimester {
    pub fn for_week(week: u32) -> Self {
        match week {
            0..=13 => Trimester::First,
            14..=26 => Trimester::Second,
            _ => Trimester::Third,
        }
    }

    pub fn number(self) -> u8 {
        match self {
            Trimester::First => 1,
            Trimester::Second => 2,
            Trimester::Third => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Trimester::First => "First",
            Trimester::Second => "Second",
            Trimester::Third => "Third",
        }
    }

    /// Inclusive first and last week.
    pub fn weeks(self) -> (u32, u32) {
        match self {
            Trimester::First => (1, 13),
            Trimester::Second => (14, 26),
            Trimester::Third => (27, FULL_TERM_WEEKS),
        }
    }
}

/// Share of a full-term pregnancy completed by `week`, 0..=100.
pub fn progress_pct(week: u32) -> u32 {
    ((week as f64 / FULL_TERM_WEEKS as f64) * 100.0)
        .round()
        .min(100.0) as u32
}

pub fn weeks_remaining(week: u32) -> u32 {
    FULL_TERM_WEEKS.saturating_sub(week)
}

fn clamp_week(week: i64) -> u32 {
    week.clamp(1, MAX_WEEKS as i64) as u32
}

/// Persisted timeline data (`{"dueDate": "YYYY-MM-DD"}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PregnancyTimeline {
    pub due_date: NaiveDate,
}

/// Everything a week view shows, computed for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineSummary {
    pub due_date: NaiveDate,
    pub lmp: NaiveDate,
    pub week: u32,
    /// Completed weeks counted back from the due date.
    pub week_from_due: u32,
    pub trimester: Trimester,
    pub trimester_number: u8,
    pub trimester_label: String,
    pub progress_pct: u32,
    pub weeks_remaining: u32,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
}

impl PregnancyTimeline {
    pub fn new(due_date: NaiveDate) -> Self {
        Self { due_date }
    }

    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Option<Self> {
        storage::read_json(store, TIMELINE_KEY)
    }

    /// Persist the due date. Returns `false` if the write failed.
    pub fn save<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> bool {
        storage::write_json(store, TIMELINE_KEY, self)
    }

    pub fn clear<S: KeyValueStore + ?Sized>(store: &mut S) -> bool {
        storage::remove_key(store, TIMELINE_KEY)
    }

    pub fn lmp(&self) -> NaiveDate {
        self.due_date - Duration::days(PREGNANCY_DAYS)
    }

    /// Week counted forward from LMP, clamped to 1..=42.
    pub fn current_week(&self, today: NaiveDate) -> u32 {
        let days = (today - self.lmp()).num_days();
        clamp_week(days.div_euclid(7) + 1)
    }

    /// Week counted back from the due date, clamped to 1..=42.
    ///
    /// This counts completed weeks, so it trails `current_week` by one.
    pub fn current_week_from_due(&self, today: NaiveDate) -> u32 {
        let days_until_due = (self.due_date - today).num_days();
        let weeks_until_due = -((-days_until_due).div_euclid(7));
        clamp_week(FULL_TERM_WEEKS as i64 - weeks_until_due)
    }

    /// First and last day of `week`.
    pub fn week_date_range(&self, week: u32) -> (NaiveDate, NaiveDate) {
        let start = self.lmp() + Duration::days((week.max(1) as i64 - 1) * 7);
        (start, start + Duration::days(6))
    }

    pub fn summary_at(&self, today: NaiveDate) -> TimelineSummary {
        let week = self.current_week(today);
        let (week_start, week_end) = self.week_date_range(week);
        let trimester = Trimester::for_week(week);
        TimelineSummary {
            due_date: self.due_date,
            lmp: self.lmp(),
            week,
            week_from_due: self.current_week_from_due(today),
            trimester,
            trimester_number: trimester.number(),
            trimester_label: trimester.label().to_string(),
            progress_pct: progress_pct(week),
            weeks_remaining: weeks_remaining(week),
            week_start,
            week_end,
        }
    }
}
