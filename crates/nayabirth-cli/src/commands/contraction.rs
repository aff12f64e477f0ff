use std::future::Future;
use std::io::Write;

use chrono::{Local, Utc};
use clap::Subcommand;
use nayabirth_core::format::{format_clock, format_duration, format_interval};
use nayabirth_core::storage::{self, Database};
use nayabirth_core::{Config, ContractionTimer, ContractionTracker, PatternReport, TrackerSnapshot};
use serde::Serialize;
use tokio::time::{Duration, MissedTickBehavior};

const TIMER_KEY: &str = "nayabirth-contraction-timer";

#[derive(Subcommand)]
pub enum ContractionAction {
    /// Start timing a contraction
    Start,
    /// Stop timing and record the contraction
    Stop,
    /// Discard the contraction being timed
    Cancel,
    /// Print timer state, history and alert as JSON
    Status,
    /// List recorded contractions
    History {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the 5-1-1 check breakdown as JSON
    Report,
    /// Delete all recorded contractions
    Clear,
    /// Show a live clock for the running contraction
    Watch {
        /// Stop watching after this many seconds
        #[arg(long = "for", value_name = "SECS")]
        limit: Option<u64>,
    },
}

/// Who to call when the pattern is detected.
#[derive(Serialize)]
struct AlertContact<'a> {
    label: &'a str,
    phone: &'a str,
}

#[derive(Serialize)]
struct StatusView<'a> {
    #[serde(flatten)]
    snapshot: TrackerSnapshot,
    elapsed: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    call: Option<AlertContact<'a>>,
}

#[derive(Serialize)]
struct ReportView {
    #[serde(flatten)]
    report: PatternReport,
    contractions: usize,
    window_size: usize,
}

fn load_timer(db: &Database) -> ContractionTimer {
    if let Ok(Some(json)) = db.kv_get(TIMER_KEY) {
        if let Ok(timer) = serde_json::from_str::<ContractionTimer>(&json) {
            return timer;
        }
        log::warn!("discarding unreadable contraction timer state");
    }
    ContractionTimer::new()
}

fn save_timer(db: &Database, timer: &ContractionTimer) -> Result<(), Box<dyn std::error::Error>> {
    if timer.is_timing() {
        let json = serde_json::to_string(timer)?;
        db.kv_set(TIMER_KEY, &json)?;
    } else {
        db.kv_remove(TIMER_KEY)?;
    }
    Ok(())
}

fn alert_contact(config: &Config) -> AlertContact<'_> {
    AlertContact {
        label: &config.contractions.alert_label,
        phone: &config.contractions.alert_phone,
    }
}

pub fn run(action: ContractionAction) -> Result<(), Box<dyn std::error::Error>> {
    let (config, db) = storage::open_default()?;
    let timer = load_timer(&db);
    let mut tracker = ContractionTracker::open(db, &config);
    tracker.resume_timer(timer);

    match action {
        ContractionAction::Start => match tracker.start() {
            Some(event) => println!("{}", serde_json::to_string_pretty(&event)?),
            None => println!("{}", serde_json::to_string_pretty(&tracker.snapshot_at(Utc::now()))?),
        },
        ContractionAction::Stop => match tracker.stop() {
            Some(event) => {
                println!("{}", serde_json::to_string_pretty(&event)?);
                if tracker.alert() {
                    let contact = alert_contact(&config);
                    eprintln!(
                        "5-1-1 pattern detected: call {} at {}",
                        contact.label, contact.phone
                    );
                }
            }
            None => println!("{}", serde_json::to_string_pretty(&tracker.snapshot_at(Utc::now()))?),
        },
        ContractionAction::Cancel => match tracker.cancel_at(Utc::now()) {
            Some(event) => println!("{}", serde_json::to_string_pretty(&event)?),
            None => println!("{}", serde_json::to_string_pretty(&tracker.snapshot_at(Utc::now()))?),
        },
        ContractionAction::Status => {
            let snapshot = tracker.snapshot_at(Utc::now());
            let view = StatusView {
                elapsed: format_clock(snapshot.elapsed_secs),
                call: snapshot.alert.then(|| alert_contact(&config)),
                snapshot,
            };
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        ContractionAction::History { json } => {
            let entries = tracker.log().entries();
            if json {
                println!("{}", serde_json::to_string_pretty(entries)?);
            } else if entries.is_empty() {
                println!("No contractions recorded.");
            } else {
                println!("{:<10} {:>9} {:>9}", "Start", "Duration", "Interval");
                for c in entries {
                    println!(
                        "{:<10} {:>9} {:>9}",
                        c.start_time.with_timezone(&Local).format("%H:%M:%S"),
                        format_duration(c.duration),
                        format_interval(c.interval),
                    );
                }
                let averages = tracker.log().averages();
                println!(
                    "Avg duration {}, avg interval {}",
                    format_duration(averages.avg_duration_secs),
                    format_interval(averages.avg_interval_secs),
                );
            }
        }
        ContractionAction::Report => {
            let view = ReportView {
                report: tracker.report(),
                contractions: tracker.log().len(),
                window_size: config.detector.window_size,
            };
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        ContractionAction::Clear => {
            let event = tracker.clear_at(Utc::now());
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
        ContractionAction::Watch { limit } => {
            let tick = Duration::from_millis(config.watch.tick_ms.max(1));
            let limit = limit.map(Duration::from_secs);
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            runtime.block_on(watch(tracker.store(), tick, limit, tokio::signal::ctrl_c()))?;
            return Ok(());
        }
    }

    save_timer(tracker.store(), tracker.timer())?;
    Ok(())
}

/// Redraw the elapsed time until `shutdown` resolves or `limit` passes.
/// Timer state is re-read on every tick so a `stop` from another shell shows
/// up here.
async fn watch<F>(
    db: &Database,
    tick: Duration,
    limit: Option<Duration>,
    shutdown: F,
) -> Result<(), Box<dyn std::error::Error>>
where
    F: Future<Output = std::io::Result<()>>,
{
    let mut ticker = tokio::time::interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let deadline = async {
        match limit {
            Some(limit) => tokio::time::sleep(limit).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);
    tokio::pin!(shutdown);

    let mut stdout = std::io::stdout();
    let mut last_line = String::new();
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let line = match load_timer(db).tick_at(Utc::now()) {
                    Some(elapsed) => format!("timing  {}", format_clock(elapsed)),
                    None => "idle    --:--".to_string(),
                };
                if line != last_line {
                    write!(stdout, "\r{line}")?;
                    stdout.flush()?;
                    last_line = line;
                }
            }
            () = &mut deadline => break,
            res = &mut shutdown => {
                res?;
                log::debug!("watch interrupted");
                break;
            }
        }
    }
    writeln!(stdout)?;
    Ok(())
}
