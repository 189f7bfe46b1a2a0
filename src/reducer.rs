//! Reduces a job's autoscaling events to a single desired worker count.
//!
//! The latest current-worker and target-worker observations are tracked
//! independently since the service reports them in separate events. The
//! desired count is the larger of the two, clamped to [`WorkerBounds`].
//!
//! A count of zero is never treated as an observation, so a job that
//! scaled to zero is indistinguishable from one that reported nothing.

use chrono::{DateTime, Utc};
use futures::{Stream, StreamExt};

use crate::dataflow::AutoscalingEvent;

/// Operator supplied limits. Zero means unbounded on that side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerBounds {
    pub min: i64,
    pub max: i64,
}

impl WorkerBounds {
    pub fn clamp(&self, workers: i64) -> i64 {
        let mut workers = workers;
        if self.min > 0 && workers < self.min {
            workers = self.min;
        }
        if self.max > 0 && workers > self.max {
            workers = self.max;
        }
        workers
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesiredWorkerResult {
    pub latest_current_workers: i64,
    pub latest_target_workers: i64,
    pub desired_workers: i64,
    pub has_desired: bool,
    pub job_status: Option<String>,
    /// Events received from the service, including ones that did not qualify.
    pub events_seen: usize,
}

/// Most recent positive observation of one count.
#[derive(Debug, Clone, Copy)]
struct Latest {
    at: DateTime<Utc>,
    workers: i64,
}

fn observe(slot: &mut Option<Latest>, at: DateTime<Utc>, workers: Option<i64>) {
    let Some(workers) = workers.filter(|w| *w > 0) else {
        return;
    };
    // Strictly after: on equal timestamps the first event seen is kept.
    if slot.is_none_or(|latest| at > latest.at) {
        *slot = Some(Latest { at, workers });
    }
}

#[derive(Debug, Default)]
struct Accumulator {
    current: Option<Latest>,
    target: Option<Latest>,
    events_seen: usize,
}

impl Accumulator {
    fn push(&mut self, event: &AutoscalingEvent, consider_target: bool) {
        self.events_seen += 1;
        let Some(at) = event.time else {
            log::debug!("Skipping autoscaling event without a timestamp: {event:?}");
            return;
        };
        log::trace!(
            "Autoscaling event at {at}: type={:?} pool={:?} current={:?} target={:?} {:?}",
            event.event_type,
            event.worker_pool,
            event.current_num_workers,
            event.target_num_workers,
            event.description.as_ref().and_then(|d| d.message_text.as_deref())
        );

        observe(&mut self.current, at, event.current_num_workers);
        if consider_target {
            observe(&mut self.target, at, event.target_num_workers);
        }
    }

    fn finish(self, bounds: WorkerBounds) -> DesiredWorkerResult {
        let mut result = DesiredWorkerResult {
            latest_current_workers: self.current.map_or(0, |l| l.workers),
            latest_target_workers: self.target.map_or(0, |l| l.workers),
            events_seen: self.events_seen,
            ..Default::default()
        };

        let desired = match (self.current, self.target) {
            (None, None) => return result,
            (Some(current), None) => current.workers,
            (None, Some(target)) => target.workers,
            (Some(current), Some(target)) => current.workers.max(target.workers),
        };

        result.desired_workers = bounds.clamp(desired);
        result.has_desired = true;
        result
    }
}

/// Folds an already materialized sequence of events.
pub fn reduce_events<'a, I>(
    events: I,
    consider_target: bool,
    bounds: WorkerBounds,
) -> DesiredWorkerResult
where
    I: IntoIterator<Item = &'a AutoscalingEvent>,
{
    let mut acc = Accumulator::default();
    for event in events {
        acc.push(event, consider_target);
    }
    acc.finish(bounds)
}

/// Folds a stream of event pages, one page at a time.
///
/// The first error ends the reduction and is returned as is; whatever was
/// accumulated up to that point is only logged.
pub async fn reduce_event_pages<S, E>(
    pages: S,
    consider_target: bool,
    bounds: WorkerBounds,
) -> Result<DesiredWorkerResult, E>
where
    S: Stream<Item = Result<Vec<AutoscalingEvent>, E>>,
{
    let mut pages = std::pin::pin!(pages);
    let mut acc = Accumulator::default();

    while let Some(page) = pages.next().await {
        match page {
            Ok(events) => {
                for event in &events {
                    acc.push(event, consider_target);
                }
            }
            Err(e) => {
                log::warn!(
                    "Event stream aborted after {} event(s); discarding partial observations (current={:?}, target={:?})",
                    acc.events_seen,
                    acc.current.map(|l| l.workers),
                    acc.target.map(|l| l.workers)
                );
                return Err(e);
            }
        }
    }

    Ok(acc.finish(bounds))
}
