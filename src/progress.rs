//! Progress display for slow source reads.
//!
//! Bars and spinners are hidden in log-only mode so output stays
//! tail-friendly when the CLI runs from scripts.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Global flag for log-only mode (set from args in main)
pub static LOG_ONLY: AtomicBool = AtomicBool::new(false);

const BAR_TEMPLATE: &str = "{msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len}";
const SPINNER_TEMPLATE: &str = "{msg} {spinner} [{elapsed_precise}]";

pub fn set_log_only(value: bool) {
    LOG_ONLY.store(value, Ordering::Relaxed);
}

pub fn is_log_only() -> bool {
    LOG_ONLY.load(Ordering::Relaxed)
}

pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.1}m", secs / 60.0)
    }
}

/// Bar over a known number of rows.
pub fn row_progress(rows: u64, msg: &str) -> ProgressBar {
    let style = ProgressStyle::default_bar()
        .template(BAR_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
    prepare(ProgressBar::new(rows), style, msg)
}

/// Spinner for a query whose size is unknown up front.
pub fn spinner(msg: &str) -> ProgressBar {
    let style = ProgressStyle::default_spinner()
        .template(SPINNER_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    let pb = prepare(ProgressBar::new_spinner(), style, msg);
    if !is_log_only() {
        pb.enable_steady_tick(Duration::from_millis(100));
    }
    pb
}

fn prepare(pb: ProgressBar, style: ProgressStyle, msg: &str) -> ProgressBar {
    if is_log_only() {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    } else {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb
}
