use chrono::{Local, NaiveDate};
use clap::Subcommand;
use nayabirth_core::storage::Database;
use nayabirth_core::PregnancyTimeline;

#[derive(Subcommand)]
pub enum TimelineAction {
    /// Set the due date
    SetDueDate {
        /// Due date (YYYY-MM-DD)
        date: String,
    },
    /// Print the current week summary as JSON
    Show {
        /// Compute for this day instead of today (YYYY-MM-DD)
        #[arg(long)]
        on: Option<String>,
    },
    /// Forget the due date
    Clear,
}

fn parse_date(value: &str) -> Result<NaiveDate, Box<dyn std::error::Error>> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| format!("invalid date '{value}': {e}").into())
}

pub fn run(action: TimelineAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut db = Database::open()?;

    match action {
        TimelineAction::SetDueDate { date } => {
            let timeline = PregnancyTimeline::new(parse_date(&date)?);
            if !timeline.save(&mut db) {
                return Err("failed to save due date".into());
            }
            let summary = timeline.summary_at(Local::now().date_naive());
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        TimelineAction::Show { on } => {
            let timeline = PregnancyTimeline::load(&db)
                .ok_or("no due date set; use `timeline set-due-date YYYY-MM-DD`")?;
            let today = match on {
                Some(day) => parse_date(&day)?,
                None => Local::now().date_naive(),
            };
            println!("{}", serde_json::to_string_pretty(&timeline.summary_at(today))?);
        }
        TimelineAction::Clear => {
            if !PregnancyTimeline::clear(&mut db) {
                return Err("failed to clear due date".into());
            }
            println!("due date cleared");
        }
    }
    Ok(())
}
