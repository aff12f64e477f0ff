//! Integration tests for the birth plan wizard and hospital checklist.
//!
//! Both keep their whole state in one JSON document, so these check what
//! lands in the store and that a reopened database picks up where the
//! last session stopped.

use chrono::{TimeZone, Utc};
use nayabirth_core::storage::{BIRTH_PLAN_DRAFT_KEY, CHECKLIST_KEY};
use nayabirth_core::{
    BirthPlanWizard, Database, Event, HospitalChecklist, KeyValueStore, MemoryStore,
    PlanResponses, PlanSection, SectionAnswers,
};
use serde_json::{json, Value};
use tempfile::TempDir;

#[test]
fn test_wizard_walkthrough_survives_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nayabirth.db");
    let t0 = Utc.with_ymd_and_hms(2026, 6, 1, 20, 0, 0).unwrap();

    {
        let mut db = Database::open_at(&path).unwrap();
        let mut wizard = BirthPlanWizard::open(&mut db);
        wizard.set_response_at(PlanSection::AboutYou, "name", json!("Amara"), t0);
        wizard.next_section_at(t0);
        let mut answers = SectionAnswers::new();
        answers.insert("movement".into(), json!(true));
        answers.insert("music".into(), json!("own playlist"));
        wizard.set_section_responses_at(PlanSection::LaborPreferences, answers, t0);
        wizard.next_section_at(t0);
    }

    let mut db = Database::open_at(&path).unwrap();
    let mut wizard = BirthPlanWizard::open(&mut db);
    let plan = wizard.plan();
    assert_eq!(plan.current_section(), PlanSection::PainManagement);
    assert_eq!(plan.responses().answered(), 3);
    assert!(!plan.is_saved());

    match wizard.save_at(t0) {
        Event::BirthPlanSaved { answered, .. } => assert_eq!(answered, 3),
        other => panic!("Expected BirthPlanSaved, got {other:?}"),
    }
    drop(wizard);

    let raw = db.get(BIRTH_PLAN_DRAFT_KEY).unwrap().unwrap();
    let draft: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(draft["responses"]["aboutYou"]["name"], json!("Amara"));
    assert_eq!(draft["currentSection"], json!(2));
    assert_eq!(draft["isSaved"], json!(true));
    assert_eq!(draft["pin"], Value::Null);
}

#[test]
fn test_loaded_plan_replaces_draft() {
    let mut store = MemoryStore::new();
    let t0 = Utc.with_ymd_and_hms(2026, 6, 2, 9, 0, 0).unwrap();
    let mut wizard = BirthPlanWizard::open(&mut store);
    wizard.set_response_at(PlanSection::Postpartum, "visitors", json!("none"), t0);

    let mut responses = PlanResponses::default();
    responses.newborn_care.insert("vitaminK".into(), json!(true));
    wizard.load_at("7302".into(), responses, t0);
    assert_eq!(wizard.plan().pin(), Some("7302"));
    assert!(wizard.plan().responses().postpartum.is_empty());
    drop(wizard);

    let reopened = BirthPlanWizard::open(&mut store);
    assert_eq!(reopened.plan().pin(), Some("7302"));
    assert!(reopened.plan().is_saved());
}

#[test]
fn test_checklist_document_shape() {
    let mut store = MemoryStore::new();
    let t0 = Utc.with_ymd_and_hms(2026, 6, 3, 12, 0, 0).unwrap();
    let mut checklist = HospitalChecklist::open(&mut store);
    checklist.toggle_item_at("insurance-card", t0).unwrap();
    checklist.add_custom_item_at("documents", "Pediatrician contact", t0).unwrap();
    checklist.toggle_category_at("documents", t0).unwrap();
    drop(checklist);

    let raw = store.get(CHECKLIST_KEY).unwrap().unwrap();
    let doc: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(doc["checkedItems"], json!(["insurance-card"]));
    assert_eq!(
        doc["customItems"]["documents"][0]["label"],
        json!("Pediatrician contact")
    );
    assert!(!doc["expandedCategories"]
        .as_array()
        .unwrap()
        .contains(&json!("documents")));
}

#[test]
fn test_checked_custom_item_removed_after_restart() {
    let mut store = MemoryStore::new();
    let t0 = Utc.with_ymd_and_hms(2026, 6, 4, 8, 0, 0).unwrap();
    let id = {
        let mut checklist = HospitalChecklist::open(&mut store);
        let id = match checklist.add_custom_item_at("mom", "Heating pad", t0) {
            Some(Event::ChecklistItemAdded { item, .. }) => item.id,
            other => panic!("Expected ChecklistItemAdded, got {other:?}"),
        };
        checklist.toggle_item_at(&id, t0).unwrap();
        assert_eq!(checklist.progress().checked, 1);
        id
    };

    let mut checklist = HospitalChecklist::open(&mut store);
    assert!(checklist.state().is_checked(&id));
    checklist.remove_custom_item_at(&id, t0).unwrap();
    assert_eq!(checklist.progress().checked, 0);
    assert_eq!(
        checklist.progress().total,
        checklist.catalog().item_count()
    );
}
