use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::cli::Args;
use crate::dataflow::JobRef;
use crate::error::WorkerCountError;
use crate::reducer::WorkerBounds;

/// Validated invocation settings. Built before any network call.
#[derive(Debug, Clone)]
pub struct Settings {
    pub job: JobRef,
    pub lookback_minutes: u64,
    pub credentials_path: Option<PathBuf>,
    pub bounds: WorkerBounds,
    pub fetch_job_status: bool,
    pub check_target_workers: bool,
    pub verbose: bool,
    pub deadline: Option<Duration>,
    pub endpoint: String,
}

impl Settings {
    /// Lower bound of the lookback window relative to `now`.
    pub fn start_time(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let minutes = i64::try_from(self.lookback_minutes).unwrap_or(i64::MAX);
        chrono::TimeDelta::try_minutes(minutes)
            .and_then(|delta| now.checked_sub_signed(delta))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

fn non_empty(name: &str, value: String) -> Result<String, WorkerCountError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(WorkerCountError::Validation(format!(
            "--{name} is required."
        )));
    }
    Ok(trimmed.to_string())
}

impl TryFrom<Args> for Settings {
    type Error = WorkerCountError;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        let job = JobRef {
            project_id: non_empty("project_id", args.project_id)?,
            location: non_empty("location", args.location)?,
            job_id: non_empty("job_id", args.job_id)?,
        };

        if args.min_worker < 0 {
            return Err(WorkerCountError::Validation(format!(
                "--min_worker ({}) cannot be negative.",
                args.min_worker
            )));
        }
        if args.max_worker < 0 {
            return Err(WorkerCountError::Validation(format!(
                "--max_worker ({}) cannot be negative.",
                args.max_worker
            )));
        }
        if args.min_worker > 0 && args.max_worker > 0 && args.min_worker > args.max_worker {
            return Err(WorkerCountError::Validation(format!(
                "--min_worker ({}) cannot be greater than --max_worker ({}).",
                args.min_worker, args.max_worker
            )));
        }
        let lookback_minutes = u64::try_from(args.time_delta_minutes).map_err(|_| {
            WorkerCountError::Validation(format!(
                "--time_delta_minutes ({}) cannot be negative.",
                args.time_delta_minutes
            ))
        })?;
        if args.deadline_seconds == Some(0) {
            return Err(WorkerCountError::Validation(
                "--deadline_seconds must be greater than 0.".to_string(),
            ));
        }

        Ok(Self {
            job,
            lookback_minutes,
            credentials_path: args.credentials_path,
            bounds: WorkerBounds {
                min: args.min_worker,
                max: args.max_worker,
            },
            fetch_job_status: args.fetch_job_status,
            check_target_workers: args.check_target_workers,
            verbose: args.verbose,
            deadline: args.deadline_seconds.map(Duration::from_secs),
            endpoint: args.endpoint,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn settings(extra: &[&str]) -> Result<Settings, WorkerCountError> {
        let mut argv = vec![
            "dataflow-workers",
            "--project_id=my-project",
            "--location=us-central1",
            "--job_id=my-job",
        ];
        argv.extend_from_slice(extra);
        Settings::try_from(Args::try_parse_from(argv).expect("clap accepts argv"))
    }

    fn validation_message(res: Result<Settings, WorkerCountError>) -> String {
        match res {
            Err(WorkerCountError::Validation(msg)) => msg,
            other => panic!("Expected validation error, found {:?}", other),
        }
    }

    #[test]
    fn test_valid_settings() {
        let s = settings(&["--min_worker=2", "--max_worker=10", "--time_delta_minutes=30"])
            .unwrap();
        assert_eq!(s.job.job_id, "my-job");
        assert_eq!(s.bounds, WorkerBounds { min: 2, max: 10 });
        assert_eq!(s.lookback_minutes, 30);
        assert!(s.deadline.is_none());
    }

    #[test]
    fn test_min_equal_max_is_allowed() {
        let s = settings(&["--min_worker=4", "--max_worker=4"]).unwrap();
        assert_eq!(s.bounds.clamp(100), 4);
    }

    #[test]
    fn test_min_greater_than_max() {
        let msg = validation_message(settings(&["--min_worker=5", "--max_worker=3"]));
        assert!(msg.contains("cannot be greater than"), "{msg}");
    }

    #[test]
    fn test_min_without_max_is_not_compared() {
        assert!(settings(&["--min_worker=50"]).is_ok());
    }

    #[test]
    fn test_negative_values() {
        for flag in [
            "--min_worker=-1",
            "--max_worker=-1",
            "--time_delta_minutes=-5",
        ] {
            let msg = validation_message(settings(&[flag]));
            assert!(msg.contains("cannot be negative"), "{flag}: {msg}");
        }
    }

    #[test]
    fn test_blank_identifiers() {
        let args = Args::try_parse_from([
            "dataflow-workers",
            "--project_id=my-project",
            "--location=us-central1",
            "--job_id=  ",
        ])
        .unwrap();
        let msg = validation_message(Settings::try_from(args));
        assert_eq!(msg, "--job_id is required.");
    }

    #[test]
    fn test_zero_deadline() {
        let msg = validation_message(settings(&["--deadline_seconds=0"]));
        assert!(msg.contains("deadline_seconds"));
    }

    #[test]
    fn test_start_time() {
        let s = settings(&["--time_delta_minutes=90"]).unwrap();
        let now: DateTime<Utc> = "2024-05-01T12:00:00Z".parse().unwrap();
        assert_eq!(
            s.start_time(now),
            "2024-05-01T10:30:00Z".parse::<DateTime<Utc>>().unwrap()
        );

        let zero = settings(&[]).unwrap();
        assert_eq!(zero.start_time(now), now);
    }
}
