//! Progress and ETA status line.

use std::time::Duration;

/// Format a duration as `[D days + ]HH:MM:SS.mmm`.
pub fn format_duration(duration: Duration) -> String {
    let mut secs = duration.as_secs_f64();
    let days = (secs / 86_400.0).floor();
    secs -= days * 86_400.0;
    let hours = (secs / 3_600.0).floor();
    secs -= hours * 3_600.0;
    let mins = (secs / 60.0).floor();
    secs -= mins * 60.0;

    let clock = format!("{:02}:{:02}:{:06.3}", hours as u32, mins as u32, secs);
    if days > 0.0 {
        format!("{} days + {clock}", days as u64)
    } else {
        clock
    }
}

/// Status text for `completed` of `total` tiles after `elapsed`.
pub fn status_line(completed: usize, total: usize, elapsed: Duration) -> String {
    if total == 0 || completed >= total {
        return format!("Render completed in {} seconds", format_duration(elapsed));
    }
    if completed == 0 {
        return "Render started".to_string();
    }

    let part = completed as f64 / total as f64;
    let remaining = elapsed.as_secs_f64() / part - elapsed.as_secs_f64();
    format!(
        "Render {:.2}% (ETA {})",
        part * 100.0,
        format_duration(Duration::from_secs_f64(remaining.max(0.0)))
    )
}
