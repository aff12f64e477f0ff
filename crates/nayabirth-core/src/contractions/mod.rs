mod history;
mod pattern;
mod tracker;

pub use history::{ContractionEvent, ContractionLog, LogAverages, DEFAULT_CAPACITY};
pub use pattern::{DetectorConfig, IntervalPolicy, PatternDetector, PatternReport};
pub use tracker::{ContractionTracker, TrackerSnapshot};
