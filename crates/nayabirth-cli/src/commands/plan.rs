use std::path::PathBuf;

use chrono::Utc;
use clap::Subcommand;
use nayabirth_core::storage::Database;
use nayabirth_core::{BirthPlan, BirthPlanWizard, PlanResponses, PlanSection, SectionAnswers};
use serde::{Deserialize, Serialize};

#[derive(Subcommand)]
pub enum PlanAction {
    /// Print the plan as JSON
    Show,
    /// Answer one question
    Answer {
        /// Section name or number (1-7)
        section: PlanSection,
        /// Question field name
        field: String,
        /// Answer; parsed as JSON when possible, otherwise stored as text
        value: String,
    },
    /// Merge a JSON object of answers into a section
    Fill {
        /// Section name or number (1-7)
        section: PlanSection,
        /// JSON object, e.g. '{"epidural": "yes"}'
        answers: String,
    },
    /// Jump to a section
    Goto {
        /// Section name or number (1-7)
        section: PlanSection,
    },
    /// Move to the next section
    Next,
    /// Move to the previous section
    Prev,
    /// Mark the current answers as saved
    Save,
    /// Replace the plan with a saved copy (`{"pin": ..., "responses": ...}`)
    Import {
        /// JSON file to read
        file: PathBuf,
    },
    /// Discard the plan and its draft
    Reset,
}

#[derive(Serialize)]
struct PlanView<'a> {
    #[serde(flatten)]
    plan: &'a BirthPlan,
    section_title: &'static str,
    answered: usize,
}

/// A plan as shared between devices.
#[derive(Deserialize)]
struct SharedPlan {
    pin: String,
    responses: PlanResponses,
}

fn parse_value(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
}

pub fn run(action: PlanAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let mut wizard = BirthPlanWizard::open(db);

    let now = Utc::now();
    let event = match action {
        PlanAction::Show => {
            let plan = wizard.plan();
            let view = PlanView {
                plan,
                section_title: plan.current_section().title(),
                answered: plan.responses().answered(),
            };
            println!("{}", serde_json::to_string_pretty(&view)?);
            return Ok(());
        }
        PlanAction::Answer {
            section,
            field,
            value,
        } => wizard.set_response_at(section, &field, parse_value(&value), now),
        PlanAction::Fill { section, answers } => {
            let answers: SectionAnswers = serde_json::from_str(&answers)
                .map_err(|e| format!("answers must be a JSON object: {e}"))?;
            wizard.set_section_responses_at(section, answers, now)
        }
        PlanAction::Goto { section } => wizard.go_to_section_at(section, now),
        PlanAction::Next => wizard
            .next_section_at(now)
            .ok_or("already at the last section")?,
        PlanAction::Prev => wizard
            .prev_section_at(now)
            .ok_or("already at the first section")?,
        PlanAction::Save => wizard.save_at(now),
        PlanAction::Import { file } => {
            let raw = std::fs::read_to_string(&file)
                .map_err(|e| format!("cannot read {}: {e}", file.display()))?;
            let shared: SharedPlan = serde_json::from_str(&raw)
                .map_err(|e| format!("{} is not a birth plan: {e}", file.display()))?;
            wizard.load_at(shared.pin, shared.responses, now)
        }
        PlanAction::Reset => wizard.reset_at(now),
    };
    println!("{}", serde_json::to_string_pretty(&event)?);
    Ok(())
}
