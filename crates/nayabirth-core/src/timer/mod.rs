mod engine;

pub use engine::{ClosedInterval, ContractionTimer, TimerState};
