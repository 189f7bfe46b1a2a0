use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::dataflow::client::DEFAULT_ENDPOINT;

/// Retrieves the latest Dataflow job worker counts within a specified time window.
#[derive(Parser, Debug, Clone)]
#[command(
    version,
    about,
    long_about = None,
    after_help = "Prerequisites:\n  - Authentication: Ensure you are authenticated.\n    e.g., 'gcloud auth application-default login' or set GOOGLE_APPLICATION_CREDENTIALS."
)]
pub struct Args {
    /// Your Google Cloud project ID.
    #[arg(long = "project_id")]
    pub project_id: String,

    /// The regional endpoint where the job is running (e.g., 'us-central1').
    #[arg(long = "location")]
    pub location: String,

    /// The ID of the Dataflow job.
    #[arg(long = "job_id")]
    pub job_id: String,

    /// The duration in minutes to look back for events.
    #[arg(long = "time_delta_minutes", default_value_t = 0, allow_negative_numbers = true)]
    pub time_delta_minutes: i64,

    /// Path to a service account JSON key file. Application default
    /// credentials are used when omitted.
    #[arg(long = "credentials_path")]
    pub credentials_path: Option<PathBuf>,

    /// Minimum number of workers to cap the desired workers. 0 disables it.
    #[arg(long = "min_worker", default_value_t = 0, allow_negative_numbers = true)]
    pub min_worker: i64,

    /// Maximum number of workers to cap the desired workers. 0 disables it.
    #[arg(long = "max_worker", default_value_t = 0, allow_negative_numbers = true)]
    pub max_worker: i64,

    /// Fetch the job's current status.
    #[arg(
        long = "fetch_job_status",
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_value_t = false,
        default_missing_value = "true"
    )]
    pub fetch_job_status: bool,

    /// Whether to consider target workers when determining desired workers,
    /// useful if the upscale event has not been actuated yet.
    #[arg(
        long = "check_target_workers",
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_value_t = true,
        default_missing_value = "true"
    )]
    pub check_target_workers: bool,

    /// If false, only prints the desired worker count.
    #[arg(
        long = "verbose",
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_value_t = true,
        default_missing_value = "true"
    )]
    pub verbose: bool,

    /// Abort the whole invocation after this many seconds.
    #[arg(long = "deadline_seconds")]
    pub deadline_seconds: Option<u64>,

    /// Base URL of the Dataflow REST API.
    #[arg(long = "endpoint", default_value = DEFAULT_ENDPOINT, hide = true)]
    pub endpoint: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUIRED: [&str; 4] = [
        "dataflow-workers",
        "--project_id=my-project",
        "--location=us-central1",
        "--job_id=my-job",
    ];

    fn parse(extra: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(REQUIRED.iter().chain(extra.iter()).copied())
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]).unwrap();
        assert_eq!(args.project_id, "my-project");
        assert_eq!(args.time_delta_minutes, 0);
        assert_eq!(args.min_worker, 0);
        assert_eq!(args.max_worker, 0);
        assert!(!args.fetch_job_status);
        assert!(args.check_target_workers);
        assert!(args.verbose);
        assert!(args.credentials_path.is_none());
        assert!(args.deadline_seconds.is_none());
        assert_eq!(args.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_bool_flag_forms() {
        let args = parse(&[
            "--fetch_job_status",
            "--check_target_workers=false",
            "--verbose=false",
        ])
        .unwrap();
        assert!(args.fetch_job_status);
        assert!(!args.check_target_workers);
        assert!(!args.verbose);
    }

    #[test]
    fn test_numeric_flags() {
        let args = parse(&[
            "--time_delta_minutes=15",
            "--min_worker",
            "2",
            "--max_worker=-4",
            "--deadline_seconds=30",
        ])
        .unwrap();
        assert_eq!(args.time_delta_minutes, 15);
        assert_eq!(args.min_worker, 2);
        assert_eq!(args.max_worker, -4);
        assert_eq!(args.deadline_seconds, Some(30));
    }

    #[test]
    fn test_missing_required_flag() {
        let res = Args::try_parse_from(["dataflow-workers", "--project_id=p", "--location=l"]);
        assert!(res.is_err());
    }
}
