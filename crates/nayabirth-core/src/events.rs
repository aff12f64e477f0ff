use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::birth_plan::PlanSection;
use crate::checklist::CustomItem;
use crate::contractions::ContractionEvent;
use crate::kicks::KickSession;

/// Every state change in the tracking engines produces an Event.
/// Frontends render them; the CLI prints them as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    ContractionStarted {
        at: DateTime<Utc>,
    },
    ContractionRecorded {
        contraction: ContractionEvent,
        /// 5-1-1 alert state after this contraction was logged.
        alert: bool,
        /// The alert flipped because of this contraction.
        alert_changed: bool,
        at: DateTime<Utc>,
    },
    /// Running contraction discarded without being logged.
    ContractionCancelled {
        at: DateTime<Utc>,
    },
    ContractionsCleared {
        at: DateTime<Utc>,
    },
    KickRecorded {
        kicks: u32,
        goal: u32,
        goal_reached: bool,
        at: DateTime<Utc>,
    },
    KickSessionSaved {
        session: KickSession,
        at: DateTime<Utc>,
    },
    KickSessionReset {
        at: DateTime<Utc>,
    },
    KickHistoryCleared {
        at: DateTime<Utc>,
    },
    BirthPlanAnswered {
        section: PlanSection,
        fields: Vec<String>,
        at: DateTime<Utc>,
    },
    BirthPlanSectionChanged {
        section: PlanSection,
        at: DateTime<Utc>,
    },
    BirthPlanSaved {
        /// Answered fields across all sections.
        answered: usize,
        at: DateTime<Utc>,
    },
    BirthPlanLoaded {
        answered: usize,
        at: DateTime<Utc>,
    },
    BirthPlanReset {
        at: DateTime<Utc>,
    },
    ChecklistItemToggled {
        item_id: String,
        checked: bool,
        at: DateTime<Utc>,
    },
    ChecklistItemAdded {
        category_id: String,
        item: CustomItem,
        at: DateTime<Utc>,
    },
    ChecklistItemRemoved {
        category_id: String,
        item_id: String,
        at: DateTime<Utc>,
    },
    ChecklistCategoryToggled {
        category_id: String,
        expanded: bool,
        at: DateTime<Utc>,
    },
    ChecklistReset {
        at: DateTime<Utc>,
    },
}
