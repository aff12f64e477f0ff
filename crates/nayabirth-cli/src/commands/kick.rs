use chrono::{Local, Utc};
use clap::Subcommand;
use nayabirth_core::format::format_duration;
use nayabirth_core::storage::{self, Database};
use nayabirth_core::{KickCounter, KickTracker};
use serde::Serialize;

const COUNTER_KEY: &str = "nayabirth-kick-counter";

#[derive(Subcommand)]
pub enum KickAction {
    /// Count one movement
    Kick,
    /// Save the current session to history
    Save,
    /// Discard the current session
    Reset,
    /// Print the current session as JSON
    Status,
    /// List saved sessions
    History {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete all saved sessions
    Clear,
}

#[derive(Serialize)]
struct CounterView {
    kicks: u32,
    goal: u32,
    goal_reached: bool,
    progress_pct: f64,
    started_at: Option<chrono::DateTime<Utc>>,
    elapsed: String,
}

fn load_counter(db: &Database) -> Option<KickCounter> {
    let json = db.kv_get(COUNTER_KEY).ok().flatten()?;
    match serde_json::from_str::<KickCounter>(&json) {
        Ok(counter) => Some(counter),
        Err(e) => {
            log::warn!("discarding unreadable kick counter state: {e}");
            None
        }
    }
}

fn save_counter(db: &Database, counter: &KickCounter) -> Result<(), Box<dyn std::error::Error>> {
    if counter.is_active() {
        let json = serde_json::to_string(counter)?;
        db.kv_set(COUNTER_KEY, &json)?;
    } else {
        db.kv_remove(COUNTER_KEY)?;
    }
    Ok(())
}

pub fn run(action: KickAction) -> Result<(), Box<dyn std::error::Error>> {
    let (config, db) = storage::open_default()?;
    let counter = load_counter(&db);
    let mut tracker = KickTracker::open(db, &config);
    if let Some(counter) = counter {
        tracker.resume_counter(counter);
    }

    let now = Utc::now();
    match action {
        KickAction::Kick => {
            let event = tracker.kick_at(now);
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
        KickAction::Save => match tracker.save_at(now) {
            Some(event) => println!("{}", serde_json::to_string_pretty(&event)?),
            None => return Err("no kicks counted in this session".into()),
        },
        KickAction::Reset => {
            let event = tracker.reset_at(now);
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
        KickAction::Status => {
            let counter = tracker.counter();
            let view = CounterView {
                kicks: counter.kicks(),
                goal: counter.goal(),
                goal_reached: counter.goal_reached(),
                progress_pct: counter.progress_pct(),
                started_at: counter.started_at(),
                elapsed: format_duration(counter.elapsed_secs_at(now)),
            };
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        KickAction::History { json } => {
            let sessions = tracker.history().sessions();
            if json {
                println!("{}", serde_json::to_string_pretty(sessions)?);
            } else if sessions.is_empty() {
                println!("No kick sessions saved.");
            } else {
                for s in sessions {
                    println!(
                        "{}  {:>3} kicks in {:>8}{}",
                        s.date.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
                        s.kicks,
                        format_duration(s.duration),
                        if s.goal_reached { "  goal reached" } else { "" },
                    );
                }
            }
        }
        KickAction::Clear => {
            let event = tracker.clear_history_at(now);
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
    }

    save_counter(tracker.store(), tracker.counter())?;
    Ok(())
}
