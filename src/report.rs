use std::fmt::Write;

use crate::config::Settings;
use crate::reducer::DesiredWorkerResult;

/// Renders what goes to stdout once a desired count is known.
///
/// Quiet mode is the bare integer so callers can consume it directly.
pub fn render(settings: &Settings, result: &DesiredWorkerResult) -> String {
    if !settings.verbose {
        return format!("{}\n", result.desired_workers);
    }

    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = writeln!(out, "\n--- Results ---");
    if settings.fetch_job_status {
        let _ = writeln!(
            out,
            "Job Status: {}",
            result.job_status.as_deref().unwrap_or("N/A")
        );
    }
    let _ = writeln!(out, "Latest Current Workers: {}", result.latest_current_workers);
    if settings.check_target_workers {
        let _ = writeln!(out, "Latest Target Workers: {}", result.latest_target_workers);
    }
    let _ = writeln!(out, "Min Workers: {}", settings.bounds.min);
    let _ = writeln!(out, "Max Workers: {}", settings.bounds.max);
    let _ = writeln!(out, "Latest Desired Workers: {}", result.desired_workers);
    let _ = writeln!(out, "----------------");
    out
}

pub fn fetching_events_banner(settings: &Settings) -> String {
    format!(
        "Fetching worker counts for job '{}' in project '{}' at location '{}', looking back {} minute(s)...",
        settings.job.job_id, settings.job.project_id, settings.job.location, settings.lookback_minutes
    )
}
