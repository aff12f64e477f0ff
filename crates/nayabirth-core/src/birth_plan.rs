//! Birth plan wizard.
//!
//! Answers are grouped into seven fixed sections and walked through one
//! section at a time. The whole plan is written through to a local draft
//! after every change, so a half-finished plan survives restarts. "Saved"
//! only tracks whether the current answers have been explicitly saved
//! since the last edit.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::events::Event;
use crate::storage::{self, KeyValueStore, BIRTH_PLAN_DRAFT_KEY};

pub const SECTION_COUNT: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlanSection {
    AboutYou,
    LaborPreferences,
    PainManagement,
    DeliveryPreferences,
    CesareanPreferences,
    NewbornCare,
    Postpartum,
}

impl PlanSection {
    /// Wizard order.
    pub const ALL: [PlanSection; SECTION_COUNT] = [
        PlanSection::AboutYou,
        PlanSection::LaborPreferences,
        PlanSection::PainManagement,
        PlanSection::DeliveryPreferences,
        PlanSection::CesareanPreferences,
        PlanSection::NewbornCare,
        PlanSection::Postpartum,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Key used in the persisted draft.
    pub fn key(self) -> &'static str {
        match self {
            PlanSection::AboutYou => "aboutYou",
            PlanSection::LaborPreferences => "laborPreferences",
            PlanSection::PainManagement => "painManagement",
            PlanSection::DeliveryPreferences => "deliveryPreferences",
            PlanSection::CesareanPreferences => "cesareanPreferences",
            PlanSection::NewbornCare => "newbornCare",
            PlanSection::Postpartum => "postpartum",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            PlanSection::AboutYou => "About You",
            PlanSection::LaborPreferences => "Labor Preferences",
            PlanSection::PainManagement => "Pain Management",
            PlanSection::DeliveryPreferences => "Delivery Preferences",
            PlanSection::CesareanPreferences => "Cesarean Preferences",
            PlanSection::NewbornCare => "Newborn Care",
            PlanSection::Postpartum => "Postpartum",
        }
    }
}

/// Accepts the draft key (`painManagement`), kebab or snake case, or a
/// 1-based section number.
impl FromStr for PlanSection {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(n) = s.parse::<usize>() {
            if let Some(section) = n.checked_sub(1).and_then(Self::from_index) {
                return Ok(section);
            }
        }
        let wanted: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();
        Self::ALL
            .into_iter()
            .find(|section| section.key().to_lowercase() == wanted)
            .ok_or_else(|| ValidationError::InvalidValue {
                field: "section".into(),
                message: format!("unknown birth plan section '{s}'"),
            })
    }
}

/// Free-form answers for one section, keyed by field name.
pub type SectionAnswers = BTreeMap<String, serde_json::Value>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanResponses {
    #[serde(default)]
    pub about_you: SectionAnswers,
    #[serde(default)]
    pub labor_preferences: SectionAnswers,
    #[serde(default)]
    pub pain_management: SectionAnswers,
    #[serde(default)]
    pub delivery_preferences: SectionAnswers,
    #[serde(default)]
    pub cesarean_preferences: SectionAnswers,
    #[serde(default)]
    pub newborn_care: SectionAnswers,
    #[serde(default)]
    pub postpartum: SectionAnswers,
}

impl PlanResponses {
    pub fn section(&self, section: PlanSection) -> &SectionAnswers {
        match section {
            PlanSection::AboutYou => &self.about_you,
            PlanSection::LaborPreferences => &self.labor_preferences,
            PlanSection::PainManagement => &self.pain_management,
            PlanSection::DeliveryPreferences => &self.delivery_preferences,
            PlanSection::CesareanPreferences => &self.cesarean_preferences,
            PlanSection::NewbornCare => &self.newborn_care,
            PlanSection::Postpartum => &self.postpartum,
        }
    }

    pub fn section_mut(&mut self, section: PlanSection) -> &mut SectionAnswers {
        match section {
            PlanSection::AboutYou => &mut self.about_you,
            PlanSection::LaborPreferences => &mut self.labor_preferences,
            PlanSection::PainManagement => &mut self.pain_management,
            PlanSection::DeliveryPreferences => &mut self.delivery_preferences,
            PlanSection::CesareanPreferences => &mut self.cesarean_preferences,
            PlanSection::NewbornCare => &mut self.newborn_care,
            PlanSection::Postpartum => &mut self.postpartum,
        }
    }

    /// Number of answered fields across all sections.
    pub fn answered(&self) -> usize {
        PlanSection::ALL
            .into_iter()
            .map(|s| self.section(s).len())
            .sum()
    }
}

fn saved_by_default() -> bool {
    true
}

/// Wizard state, persisted as the draft document.
///
/// Drafts written by older frontends only carry `pin` and `responses`;
/// everything else falls back to defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BirthPlan {
    #[serde(default)]
    current_section: usize,
    #[serde(default)]
    pin: Option<String>,
    responses: PlanResponses,
    #[serde(default = "saved_by_default")]
    is_saved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_saved: Option<DateTime<Utc>>,
}

impl Default for BirthPlan {
    fn default() -> Self {
        Self {
            current_section: 0,
            pin: None,
            responses: PlanResponses::default(),
            is_saved: true,
            last_saved: None,
        }
    }
}

impl BirthPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_section(&self) -> PlanSection {
        PlanSection::from_index(self.current_section).unwrap_or(PlanSection::Postpartum)
    }

    pub fn pin(&self) -> Option<&str> {
        self.pin.as_deref()
    }

    pub fn responses(&self) -> &PlanResponses {
        &self.responses
    }

    pub fn is_saved(&self) -> bool {
        self.is_saved
    }

    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.last_saved
    }

    pub fn is_first_section(&self) -> bool {
        self.current_section == 0
    }

    pub fn is_last_section(&self) -> bool {
        self.current_section + 1 >= SECTION_COUNT
    }

    pub fn set_response(&mut self, section: PlanSection, field: &str, value: serde_json::Value) {
        self.responses
            .section_mut(section)
            .insert(field.to_string(), value);
        self.is_saved = false;
    }

    /// Merge `answers` into `section`; fields not mentioned are kept.
    pub fn set_section_responses(&mut self, section: PlanSection, answers: SectionAnswers) {
        self.responses.section_mut(section).extend(answers);
        self.is_saved = false;
    }

    /// Jump to a section by index, clamped to the last section.
    pub fn set_current_section(&mut self, index: usize) -> PlanSection {
        self.current_section = index.min(SECTION_COUNT - 1);
        self.current_section()
    }

    /// Returns `false` at the last section.
    pub fn next_section(&mut self) -> bool {
        if self.is_last_section() {
            return false;
        }
        self.current_section += 1;
        true
    }

    /// Returns `false` at the first section.
    pub fn prev_section(&mut self) -> bool {
        if self.is_first_section() {
            return false;
        }
        self.current_section = self.current_section.min(SECTION_COUNT - 1) - 1;
        true
    }

    pub fn mark_saved_at(&mut self, now: DateTime<Utc>) {
        self.is_saved = true;
        self.last_saved = Some(now);
    }

    /// Replace the plan with one fetched under `pin`.
    pub fn load(&mut self, pin: String, responses: PlanResponses) {
        self.pin = Some(pin);
        self.responses = responses;
        self.is_saved = true;
    }
}

/// Birth plan plus write-through to the draft key.
pub struct BirthPlanWizard<S: KeyValueStore> {
    store: S,
    plan: BirthPlan,
}

impl<S: KeyValueStore> BirthPlanWizard<S> {
    /// Resume from the stored draft, or start empty.
    pub fn open(store: S) -> Self {
        let plan = storage::read_json(&store, BIRTH_PLAN_DRAFT_KEY).unwrap_or_default();
        Self { store, plan }
    }

    pub fn plan(&self) -> &BirthPlan {
        &self.plan
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn persist(&mut self) {
        storage::write_json(&mut self.store, BIRTH_PLAN_DRAFT_KEY, &self.plan);
    }

    pub fn set_response_at(
        &mut self,
        section: PlanSection,
        field: &str,
        value: serde_json::Value,
        now: DateTime<Utc>,
    ) -> Event {
        self.plan.set_response(section, field, value);
        self.persist();
        Event::BirthPlanAnswered {
            section,
            fields: vec![field.to_string()],
            at: now,
        }
    }

    pub fn set_section_responses_at(
        &mut self,
        section: PlanSection,
        answers: SectionAnswers,
        now: DateTime<Utc>,
    ) -> Event {
        let fields = answers.keys().cloned().collect();
        self.plan.set_section_responses(section, answers);
        self.persist();
        Event::BirthPlanAnswered {
            section,
            fields,
            at: now,
        }
    }

    pub fn go_to_section_at(&mut self, section: PlanSection, now: DateTime<Utc>) -> Event {
        let section = self.plan.set_current_section(section.index());
        self.persist();
        Event::BirthPlanSectionChanged { section, at: now }
    }

    /// `None` when already on the last section.
    pub fn next_section_at(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if !self.plan.next_section() {
            return None;
        }
        self.persist();
        Some(Event::BirthPlanSectionChanged {
            section: self.plan.current_section(),
            at: now,
        })
    }

    /// `None` when already on the first section.
    pub fn prev_section_at(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if !self.plan.prev_section() {
            return None;
        }
        self.persist();
        Some(Event::BirthPlanSectionChanged {
            section: self.plan.current_section(),
            at: now,
        })
    }

    pub fn save_at(&mut self, now: DateTime<Utc>) -> Event {
        self.plan.mark_saved_at(now);
        self.persist();
        Event::BirthPlanSaved {
            answered: self.plan.responses.answered(),
            at: now,
        }
    }

    pub fn load_at(&mut self, pin: String, responses: PlanResponses, now: DateTime<Utc>) -> Event {
        self.plan.load(pin, responses);
        self.persist();
        Event::BirthPlanLoaded {
            answered: self.plan.responses.answered(),
            at: now,
        }
    }

    /// Start over and delete the draft.
    pub fn reset_at(&mut self, now: DateTime<Utc>) -> Event {
        self.plan = BirthPlan::default();
        storage::remove_key(&mut self.store, BIRTH_PLAN_DRAFT_KEY);
        Event::BirthPlanReset { at: now }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use chrono::TimeZone;
    use serde_json::json;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 10, 19, 30, 0).unwrap()
    }

    #[test]
    fn section_names_parse() {
        assert_eq!(
            "painManagement".parse::<PlanSection>().unwrap(),
            PlanSection::PainManagement
        );
        assert_eq!(
            "newborn-care".parse::<PlanSection>().unwrap(),
            PlanSection::NewbornCare
        );
        assert_eq!("1".parse::<PlanSection>().unwrap(), PlanSection::AboutYou);
        assert_eq!("7".parse::<PlanSection>().unwrap(), PlanSection::Postpartum);
        assert!("0".parse::<PlanSection>().is_err());
        assert!("8".parse::<PlanSection>().is_err());
        assert!("visitors".parse::<PlanSection>().is_err());
    }

    #[test]
    fn answering_marks_unsaved() {
        let mut plan = BirthPlan::new();
        assert!(plan.is_saved());
        plan.set_response(PlanSection::AboutYou, "name", json!("Amara"));
        assert!(!plan.is_saved());
        assert_eq!(
            plan.responses().about_you.get("name"),
            Some(&json!("Amara"))
        );

        plan.mark_saved_at(t0());
        assert!(plan.is_saved());
        assert_eq!(plan.last_saved(), Some(t0()));
    }

    #[test]
    fn section_answers_merge() {
        let mut plan = BirthPlan::new();
        plan.set_response(PlanSection::PainManagement, "epidural", json!("maybe"));
        let mut answers = SectionAnswers::new();
        answers.insert("nitrous".into(), json!(true));
        answers.insert("epidural".into(), json!("yes"));
        plan.set_section_responses(PlanSection::PainManagement, answers);

        let section = plan.responses().section(PlanSection::PainManagement);
        assert_eq!(section.len(), 2);
        assert_eq!(section["epidural"], json!("yes"));
        assert_eq!(plan.responses().answered(), 2);
    }

    #[test]
    fn navigation_stays_in_bounds() {
        let mut plan = BirthPlan::new();
        assert!(!plan.prev_section());
        assert_eq!(plan.current_section(), PlanSection::AboutYou);

        for _ in 0..SECTION_COUNT - 1 {
            assert!(plan.next_section());
        }
        assert_eq!(plan.current_section(), PlanSection::Postpartum);
        assert!(!plan.next_section());
        assert!(plan.is_last_section());

        assert_eq!(plan.set_current_section(42), PlanSection::Postpartum);
        assert!(plan.prev_section());
        assert_eq!(plan.current_section(), PlanSection::NewbornCare);
    }

    #[test]
    fn out_of_range_draft_cursor_is_clamped() {
        let mut plan: BirthPlan =
            serde_json::from_str(r#"{"currentSection": 12, "responses": {}}"#).unwrap();
        assert_eq!(plan.current_section(), PlanSection::Postpartum);
        assert!(!plan.next_section());
        assert!(plan.prev_section());
        assert_eq!(plan.current_section(), PlanSection::NewbornCare);
    }

    #[test]
    fn loading_a_plan_marks_saved() {
        let mut plan = BirthPlan::new();
        plan.set_response(PlanSection::AboutYou, "name", json!("draft"));
        let mut responses = PlanResponses::default();
        responses
            .postpartum
            .insert("visitors".into(), json!("family only"));
        plan.load("4821".into(), responses.clone());

        assert_eq!(plan.pin(), Some("4821"));
        assert_eq!(plan.responses(), &responses);
        assert!(plan.is_saved());
    }

    #[test]
    fn legacy_draft_without_wizard_fields_loads() {
        let mut store = MemoryStore::new();
        store
            .set(
                BIRTH_PLAN_DRAFT_KEY,
                r#"{"pin": null, "responses": {"aboutYou": {"name": "Amara"}}}"#,
            )
            .unwrap();
        let wizard = BirthPlanWizard::open(&mut store);
        let plan = wizard.plan();
        assert_eq!(plan.current_section(), PlanSection::AboutYou);
        assert!(plan.is_saved());
        assert_eq!(plan.responses().about_you["name"], json!("Amara"));
        assert!(plan.responses().postpartum.is_empty());
    }

    #[test]
    fn draft_without_responses_is_ignored() {
        let mut store = MemoryStore::new();
        store.set(BIRTH_PLAN_DRAFT_KEY, r#"{"pin": "1234"}"#).unwrap();
        let wizard = BirthPlanWizard::open(&mut store);
        assert_eq!(wizard.plan(), &BirthPlan::default());
    }

    #[test]
    fn wizard_writes_through_and_resets() {
        let mut store = MemoryStore::new();
        {
            let mut wizard = BirthPlanWizard::open(&mut store);
            let event =
                wizard.set_response_at(PlanSection::LaborPreferences, "lighting", json!("dim"), t0());
            assert!(matches!(
                event,
                Event::BirthPlanAnswered {
                    section: PlanSection::LaborPreferences,
                    ..
                }
            ));
            assert!(wizard.next_section_at(t0()).is_some());
        }

        let mut wizard = BirthPlanWizard::open(&mut store);
        assert_eq!(wizard.plan().current_section(), PlanSection::LaborPreferences);
        assert!(!wizard.plan().is_saved());
        assert_eq!(
            wizard.plan().responses().labor_preferences["lighting"],
            json!("dim")
        );

        assert!(matches!(
            wizard.reset_at(t0()),
            Event::BirthPlanReset { .. }
        ));
        assert_eq!(wizard.plan(), &BirthPlan::default());
        assert!(!wizard.store().contains_key(BIRTH_PLAN_DRAFT_KEY));
    }

    #[test]
    fn navigation_at_bounds_produces_no_event() {
        let mut wizard = BirthPlanWizard::open(MemoryStore::new());
        assert!(wizard.prev_section_at(t0()).is_none());
        assert!(!wizard.store().contains_key(BIRTH_PLAN_DRAFT_KEY));

        wizard.go_to_section_at(PlanSection::Postpartum, t0());
        assert!(wizard.next_section_at(t0()).is_none());
    }

    #[test]
    fn failing_store_keeps_in_memory_plan() {
        let mut wizard = BirthPlanWizard::open(MemoryStore::failing());
        wizard.set_response_at(PlanSection::NewbornCare, "feeding", json!("breast"), t0());
        match wizard.save_at(t0()) {
            Event::BirthPlanSaved { answered, .. } => assert_eq!(answered, 1),
            other => panic!("Expected BirthPlanSaved, got {other:?}"),
        }
        assert!(wizard.plan().is_saved());
    }
}
