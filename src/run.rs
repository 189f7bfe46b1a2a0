use chrono::{DateTime, Utc};

use crate::config::Settings;
use crate::dataflow::{
    DataflowApi, JobMessageImportance, ListJobMessagesRequest, autoscaling_event_pages,
};
use crate::error::{Result, WorkerCountError};
use crate::reducer::{DesiredWorkerResult, reduce_event_pages};
use crate::report;

/// Fetches the job status if requested, then reduces the autoscaling events
/// of the lookback window ending at `now`.
///
/// `progress` receives the human readable progress lines of verbose mode.
pub async fn desired_workers<A>(
    api: &A,
    settings: &Settings,
    now: DateTime<Utc>,
    progress: &mut dyn FnMut(String),
) -> Result<DesiredWorkerResult>
where
    A: DataflowApi + ?Sized,
{
    let job_status = if settings.fetch_job_status {
        if settings.verbose {
            progress("Fetching job status...".to_string());
        }
        let job = api.get_job(&settings.job).await?;
        log::info!(
            "Job {} ({}) is {}",
            job.name.as_deref().unwrap_or(&settings.job.job_id),
            job.id.as_deref().unwrap_or("unknown id"),
            job.state_name()
        );
        Some(job.state_name().to_string())
    } else {
        None
    };

    let request = ListJobMessagesRequest {
        job: settings.job.clone(),
        start_time: settings.start_time(now),
        minimum_importance: JobMessageImportance::Basic,
    };
    if settings.verbose {
        progress(report::fetching_events_banner(settings));
    }
    log::debug!("Listing job messages since {}", request.start_time);

    let mut result = reduce_event_pages(
        autoscaling_event_pages(api, &request),
        settings.check_target_workers,
        settings.bounds,
    )
    .await?;

    if !result.has_desired {
        if result.events_seen == 0 {
            log::warn!(
                "No autoscaling events in the last {} minute(s)",
                settings.lookback_minutes
            );
        } else {
            log::warn!(
                "{} autoscaling event(s) found but none carried a positive worker count",
                result.events_seen
            );
        }
        return Err(WorkerCountError::NoData {
            minutes: settings.lookback_minutes,
            events_seen: result.events_seen,
        });
    }

    log::info!(
        "Desired workers for {}: {} (current={}, target={})",
        settings.job,
        result.desired_workers,
        result.latest_current_workers,
        result.latest_target_workers
    );
    result.job_status = job_status;
    Ok(result)
}
