//! 5-1-1 labor pattern detection.
//!
//! The clinical rule is "contractions 5 minutes apart, 1 minute long, for
//! 1 hour". Real contractions are never that regular, so each part is a
//! tolerant inclusive band:
//!
//! - **Interval regularity**: gaps between consecutive start times within
//!   [4, 6] minutes
//! - **Duration regularity**: every duration within [45, 90] seconds
//! - **Sustained**: oldest-to-newest start span of the window at least 60
//!   minutes
//!
//! Detection looks only at the newest `window_size` entries and is a pure
//! function of the log snapshot. Too little data is a negative result, not
//! an error.

use serde::{Deserialize, Serialize};

use super::history::ContractionEvent;
use crate::error::ValidationError;

/// Which gaps inside the window the interval check covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalPolicy {
    /// Exempt the gap between the two newest entries and check the rest.
    /// With a 6-entry window this checks 4 of the 5 gaps, which is what the
    /// web app did; it is also what lets a 6-entry window span an hour.
    SkipNewestGap,
    /// Check every gap inside the window.
    AllGaps,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectorConfig {
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    #[serde(default = "default_interval_min_secs")]
    pub interval_min_secs: u64,
    #[serde(default = "default_interval_max_secs")]
    pub interval_max_secs: u64,
    #[serde(default = "default_duration_min_secs")]
    pub duration_min_secs: u64,
    #[serde(default = "default_duration_max_secs")]
    pub duration_max_secs: u64,
    #[serde(default = "default_sustained_secs")]
    pub sustained_secs: u64,
    #[serde(default = "default_interval_policy")]
    pub interval_policy: IntervalPolicy,
}

fn default_window_size() -> usize {
    6
}
fn default_interval_min_secs() -> u64 {
    4 * 60
}
fn default_interval_max_secs() -> u64 {
    6 * 60
}
fn default_duration_min_secs() -> u64 {
    45
}
fn default_duration_max_secs() -> u64 {
    90
}
fn default_sustained_secs() -> u64 {
    60 * 60
}
fn default_interval_policy() -> IntervalPolicy {
    IntervalPolicy::SkipNewestGap
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            interval_min_secs: default_interval_min_secs(),
            interval_max_secs: default_interval_max_secs(),
            duration_min_secs: default_duration_min_secs(),
            duration_max_secs: default_duration_max_secs(),
            sustained_secs: default_sustained_secs(),
            interval_policy: default_interval_policy(),
        }
    }
}

impl DetectorConfig {
    /// # Errors
    /// Returns an error for a window under 2 entries or an inverted band.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.window_size < 2 {
            return Err(ValidationError::InvalidValue {
                field: "detector.window_size".into(),
                message: "must be at least 2".into(),
            });
        }
        if self.interval_min_secs > self.interval_max_secs {
            return Err(ValidationError::InvalidRange {
                field: "detector.interval".into(),
                min: self.interval_min_secs,
                max: self.interval_max_secs,
            });
        }
        if self.duration_min_secs > self.duration_max_secs {
            return Err(ValidationError::InvalidRange {
                field: "detector.duration".into(),
                min: self.duration_min_secs,
                max: self.duration_max_secs,
            });
        }
        Ok(())
    }
}

/// Outcome of each check, for display and debugging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternReport {
    /// At least `window_size` contractions are logged.
    pub sufficient_data: bool,
    pub intervals_regular: bool,
    pub durations_regular: bool,
    pub sustained: bool,
    /// Seconds between the oldest and newest start in the window.
    pub span_secs: Option<u64>,
    pub alert: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PatternDetector {
    config: DetectorConfig,
}

impl PatternDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// `true` when the newest entries match the 5-1-1 pattern.
    pub fn is_alert(&self, entries: &[ContractionEvent]) -> bool {
        self.evaluate(entries).alert
    }

    /// Run every check against `entries` (ordered most-recent-first).
    pub fn evaluate(&self, entries: &[ContractionEvent]) -> PatternReport {
        let n = self.config.window_size;
        if n == 0 || entries.len() < n {
            return PatternReport::default();
        }
        let window = &entries[..n];

        let first_gap = match self.config.interval_policy {
            IntervalPolicy::SkipNewestGap => 1,
            IntervalPolicy::AllGaps => 0,
        };
        let min_gap_ms = secs_to_ms(self.config.interval_min_secs);
        let max_gap_ms = secs_to_ms(self.config.interval_max_secs);
        let intervals_regular = (first_gap..n.saturating_sub(1)).all(|i| {
            let gap_ms = (window[i].start_time - window[i + 1].start_time).num_milliseconds();
            (min_gap_ms..=max_gap_ms).contains(&gap_ms)
        });

        let durations_regular = window.iter().all(|c| {
            (self.config.duration_min_secs..=self.config.duration_max_secs).contains(&c.duration)
        });

        let span_ms = (window[0].start_time - window[n - 1].start_time).num_milliseconds();
        let sustained = span_ms >= secs_to_ms(self.config.sustained_secs);

        PatternReport {
            sufficient_data: true,
            intervals_regular,
            durations_regular,
            sustained,
            span_secs: Some((span_ms.max(0) / 1000) as u64),
            alert: intervals_regular && durations_regular && sustained,
        }
    }
}

fn secs_to_ms(secs: u64) -> i64 {
    i64::try_from(secs.saturating_mul(1000)).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap()
    }

    /// Build a newest-first log from (minutes after t0, duration secs)
    /// pairs given oldest-first.
    fn log_from(points: &[(i64, u64)]) -> Vec<ContractionEvent> {
        let mut entries: Vec<ContractionEvent> = Vec::new();
        for (i, &(minute, duration)) in points.iter().enumerate() {
            let start_time = t0() + Duration::minutes(minute);
            let interval = entries
                .first()
                .map(|prev| (start_time - prev.start_time).num_seconds() as u64);
            entries.insert(
                0,
                ContractionEvent {
                    id: i as i64,
                    start_time,
                    duration,
                    interval,
                },
            );
        }
        entries
    }

    /// Four checked gaps of 5 minutes, then a 40-minute newest gap the
    /// default policy exempts: span 60 minutes.
    fn hour_long_pattern() -> Vec<(i64, u64)> {
        vec![(0, 60), (5, 60), (10, 60), (15, 60), (20, 60), (60, 60)]
    }

    #[test]
    fn fewer_than_window_never_alerts() {
        let detector = PatternDetector::default();
        for len in 0..6 {
            let points: Vec<(i64, u64)> = hour_long_pattern().into_iter().take(len).collect();
            let report = detector.evaluate(&log_from(&points));
            assert!(!report.sufficient_data);
            assert!(!report.alert);
        }
    }

    #[test]
    fn hour_long_regular_pattern_alerts() {
        let detector = PatternDetector::default();
        let report = detector.evaluate(&log_from(&hour_long_pattern()));
        assert!(report.intervals_regular);
        assert!(report.durations_regular);
        assert!(report.sustained);
        assert_eq!(report.span_secs, Some(3600));
        assert!(report.alert);
    }

    #[test]
    fn newest_gap_is_exempt_by_default() {
        let mut points = hour_long_pattern();
        points[5].0 = 200;
        assert!(PatternDetector::default().is_alert(&log_from(&points)));
    }

    #[test]
    fn second_newest_gap_is_checked() {
        // Gap between e1 and e2 is 10 minutes.
        let points = vec![(0, 60), (5, 60), (10, 60), (15, 60), (25, 60), (65, 60)];
        let report = PatternDetector::default().evaluate(&log_from(&points));
        assert!(!report.intervals_regular);
        assert!(!report.alert);
    }

    #[test]
    fn gap_outside_window_is_ignored() {
        // Seventh, oldest entry is 30 minutes before the window.
        let mut points = vec![(-30, 200)];
        points.extend(hour_long_pattern());
        assert!(PatternDetector::default().is_alert(&log_from(&points)));
    }

    #[test]
    fn all_gaps_policy_checks_newest_gap() {
        let detector = PatternDetector::new(DetectorConfig {
            interval_policy: IntervalPolicy::AllGaps,
            ..DetectorConfig::default()
        });
        let report = detector.evaluate(&log_from(&hour_long_pattern()));
        assert!(!report.intervals_regular);
        assert!(!report.alert);
    }

    #[test]
    fn all_gaps_policy_with_hour_wide_window() {
        // Thirteen contractions five minutes apart cover an hour.
        let detector = PatternDetector::new(DetectorConfig {
            window_size: 13,
            interval_policy: IntervalPolicy::AllGaps,
            ..DetectorConfig::default()
        });
        let points: Vec<(i64, u64)> = (0..13).map(|i| (i * 5, 60)).collect();
        assert!(detector.is_alert(&log_from(&points)));
    }

    #[test]
    fn duration_over_band_blocks_alert() {
        let mut points = hour_long_pattern();
        points[2].1 = 91;
        let report = PatternDetector::default().evaluate(&log_from(&points));
        assert!(!report.durations_regular);
        assert!(!report.alert);
    }

    #[test]
    fn duration_band_is_inclusive() {
        let mut points = hour_long_pattern();
        points[0].1 = 45;
        points[5].1 = 90;
        assert!(PatternDetector::default().is_alert(&log_from(&points)));

        points[0].1 = 44;
        assert!(!PatternDetector::default().is_alert(&log_from(&points)));
    }

    #[test]
    fn interval_band_is_inclusive() {
        // Checked gaps at exactly 4 and 6 minutes.
        let points = vec![(0, 60), (4, 60), (10, 60), (14, 60), (20, 60), (60, 60)];
        assert!(PatternDetector::default().is_alert(&log_from(&points)));

        let points = vec![(0, 60), (3, 60), (9, 60), (13, 60), (19, 60), (60, 60)];
        assert!(!PatternDetector::default().is_alert(&log_from(&points)));
    }

    #[test]
    fn span_of_59_minutes_is_not_sustained() {
        let mut points = hour_long_pattern();
        points[5].0 = 59;
        let report = PatternDetector::default().evaluate(&log_from(&points));
        assert!(report.intervals_regular);
        assert!(report.durations_regular);
        assert!(!report.sustained);
        assert!(!report.alert);
    }

    #[test]
    fn regular_but_short_pattern_does_not_alert() {
        let points: Vec<(i64, u64)> = (0..6).map(|i| (i * 5, 50)).collect();
        let report = PatternDetector::default().evaluate(&log_from(&points));
        assert!(report.intervals_regular);
        assert!(report.durations_regular);
        assert_eq!(report.span_secs, Some(25 * 60));
        assert!(!report.alert);
    }

    #[test]
    fn validate_rejects_bad_configs() {
        assert!(DetectorConfig::default().validate().is_ok());
        let tiny = DetectorConfig {
            window_size: 1,
            ..DetectorConfig::default()
        };
        assert!(tiny.validate().is_err());
        let inverted = DetectorConfig {
            interval_min_secs: 400,
            ..DetectorConfig::default()
        };
        assert!(inverted.validate().is_err());
    }
}
