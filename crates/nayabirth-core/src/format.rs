//! Duration rendering helpers shared by the CLI and any other frontend.

/// Render whole seconds as `M:SS`, or `H:MM:SS` once an hour is reached.
pub fn format_duration(seconds: u64) -> String {
    let hrs = seconds / 3600;
    let mins = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hrs > 0 {
        format!("{hrs}:{mins:02}:{secs:02}")
    } else {
        format!("{mins}:{secs:02}")
    }
}

/// Render whole seconds as minutes and seconds only (`M:SS`), even past an
/// hour. Used for the live contraction clock and interval columns.
pub fn format_clock(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Render an optional interval; the first entry in a log has none.
pub fn format_interval(interval: Option<u64>) -> String {
    match interval {
        Some(secs) if secs > 0 => format_clock(secs),
        _ => "--:--".to_string(),
    }
}
