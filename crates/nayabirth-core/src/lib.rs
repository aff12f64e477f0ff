//! # NayaBirth Core Library
//!
//! This library provides the tracking logic behind the NayaBirth pregnancy
//! companion. It follows a CLI-first philosophy: every operation is
//! available via the standalone CLI binary, and any graphical frontend is a
//! thin layer over the same core library.
//!
//! ## Architecture
//!
//! - **Contraction Timer**: A wall-clock-based Idle/Timing state machine;
//!   the caller passes the current instant into each transition
//! - **Contraction Log**: Bounded, newest-first history with intervals
//!   fixed at insertion time
//! - **Pattern Detector**: Pure 5-1-1 check over the newest contractions
//! - **Kick Counter**: Fetal movement sessions with a bounded history
//! - **Timeline**: Due-date based week and trimester arithmetic
//! - **Birth Plan**: Seven-section wizard with a write-through draft
//! - **Checklist**: Hospital bag catalog with custom items and check marks
//! - **Storage**: Key-value persistence (SQLite or in-memory) and TOML
//!   configuration
//!
//! ## Key Components
//!
//! - [`ContractionTracker`]: Timer, log and alert behind one owner
//! - [`PatternDetector`]: The 5-1-1 heuristic
//! - [`KickTracker`]: Kick counting and session history
//! - [`BirthPlanWizard`]: Birth plan answers and section navigation
//! - [`HospitalChecklist`]: Packing list progress
//! - [`KeyValueStore`]: Persistence seam, implemented by [`Database`] and
//!   [`MemoryStore`]
//! - [`Config`]: Application configuration management

pub mod birth_plan;
pub mod checklist;
pub mod contractions;
pub mod error;
pub mod events;
pub mod format;
pub mod kicks;
pub mod storage;
pub mod timeline;
pub mod timer;

pub use birth_plan::{BirthPlan, BirthPlanWizard, PlanResponses, PlanSection, SectionAnswers};
pub use checklist::{
    Catalog, ChecklistCategory, ChecklistItem, ChecklistProgress, ChecklistState, CustomItem,
    HospitalChecklist,
};
pub use contractions::{
    ContractionEvent, ContractionLog, ContractionTracker, DetectorConfig, IntervalPolicy,
    LogAverages, PatternDetector, PatternReport, TrackerSnapshot,
};
pub use error::{ConfigError, CoreError, StorageError, ValidationError};
pub use events::Event;
pub use kicks::{KickCounter, KickHistory, KickSession, KickTracker};
pub use storage::{Config, Database, KeyValueStore, MemoryStore};
pub use timeline::{PregnancyTimeline, TimelineSummary, Trimester};
pub use timer::{ClosedInterval, ContractionTimer, TimerState};
