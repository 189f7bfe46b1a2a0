use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

/// Identifies a single job in a regional endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRef {
    pub project_id: String,
    pub location: String,
    pub job_id: String,
}

impl std::fmt::Display for JobRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "projects/{}/locations/{}/jobs/{}",
            self.project_id, self.location, self.job_id
        )
    }
}

/// Lowest importance a listed message may have.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobMessageImportance {
    Debug,
    Detailed,
    #[default]
    Basic,
    Warning,
    Error,
}

impl AsRef<str> for JobMessageImportance {
    fn as_ref(&self) -> &str {
        match self {
            Self::Debug => "JOB_MESSAGE_DEBUG",
            Self::Detailed => "JOB_MESSAGE_DETAILED",
            Self::Basic => "JOB_MESSAGE_BASIC",
            Self::Warning => "JOB_MESSAGE_WARNING",
            Self::Error => "JOB_MESSAGE_ERROR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListJobMessagesRequest {
    pub job: JobRef,
    pub start_time: DateTime<Utc>,
    pub minimum_importance: JobMessageImportance,
}

/// Subset of the `Job` resource this tool reads.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub current_state: Option<String>,
}

impl Job {
    pub fn state_name(&self) -> &str {
        match self.current_state.as_deref() {
            Some(state) if !state.is_empty() => state,
            _ => "JOB_STATE_UNKNOWN",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListJobMessagesResponse {
    #[serde(default)]
    pub job_messages: Vec<JobMessage>,
    #[serde(default)]
    pub autoscaling_events: Vec<AutoscalingEvent>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobMessage {
    #[serde(default)]
    pub time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub message_text: Option<String>,
    #[serde(default)]
    pub message_importance: Option<String>,
}

/// A change in worker allocation reported by the service.
///
/// Either count may be missing; a missing count carries no observation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoscalingEvent {
    #[serde(default)]
    pub time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_opt_int64")]
    pub current_num_workers: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_opt_int64")]
    pub target_num_workers: Option<i64>,
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub description: Option<StructuredMessage>,
    #[serde(default)]
    pub worker_pool: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredMessage {
    #[serde(default)]
    pub message_text: Option<String>,
}

/// int64 values are JSON strings in the proto3 mapping, but emulators
/// sometimes emit plain numbers.
fn deserialize_opt_int64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Int64 {
        Number(i64),
        Text(String),
    }

    match Option::<Int64>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Int64::Number(n)) => Ok(Some(n)),
        Some(Int64::Text(s)) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|e| serde::de::Error::custom(format!("invalid int64 '{s}': {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_messages_page() {
        let body = r#"{
            "jobMessages": [
                {"id": "1", "time": "2024-05-01T10:00:00Z", "messageText": "Worker pool started.", "messageImportance": "JOB_MESSAGE_BASIC"}
            ],
            "autoscalingEvents": [
                {
                    "currentNumWorkers": "3",
                    "targetNumWorkers": "10",
                    "eventType": "TARGET_NUM_WORKERS_CHANGED",
                    "description": {"messageText": "Autoscaling: Raised the number of workers to 10."},
                    "time": "2024-05-01T10:01:02.123456Z",
                    "workerPool": "pool-0"
                },
                {"currentNumWorkers": 10, "time": "2024-05-01T10:05:00Z"}
            ],
            "nextPageToken": "abc"
        }"#;

        let page: ListJobMessagesResponse = serde_json::from_str(body).expect("valid page");
        assert_eq!(page.job_messages.len(), 1);
        assert_eq!(page.autoscaling_events.len(), 2);
        assert_eq!(page.next_page_token.as_deref(), Some("abc"));

        let first = &page.autoscaling_events[0];
        assert_eq!(first.current_num_workers, Some(3));
        assert_eq!(first.target_num_workers, Some(10));
        assert_eq!(first.event_type.as_deref(), Some("TARGET_NUM_WORKERS_CHANGED"));

        let second = &page.autoscaling_events[1];
        assert_eq!(second.current_num_workers, Some(10));
        assert_eq!(second.target_num_workers, None);
    }

    #[test]
    fn test_empty_page() {
        let page: ListJobMessagesResponse = serde_json::from_str("{}").unwrap();
        assert!(page.autoscaling_events.is_empty());
        assert!(page.next_page_token.is_none());
    }

    #[test]
    fn test_bad_int64_is_rejected() {
        let res: Result<AutoscalingEvent, _> =
            serde_json::from_str(r#"{"currentNumWorkers": "three"}"#);
        assert!(res.is_err());
    }

    #[test]
    fn test_timestamps_with_offsets_are_normalized() {
        let a: AutoscalingEvent =
            serde_json::from_str(r#"{"time": "2024-05-01T12:00:00+02:00"}"#).unwrap();
        let b: AutoscalingEvent =
            serde_json::from_str(r#"{"time": "2024-05-01T10:00:00.5Z"}"#).unwrap();
        // 12:00+02:00 is 10:00Z, half a second before b.
        assert!(a.time.unwrap() < b.time.unwrap());
    }

    #[test]
    fn test_job_state_name() {
        let job: Job =
            serde_json::from_str(r#"{"id": "j", "currentState": "JOB_STATE_RUNNING"}"#).unwrap();
        assert_eq!(job.state_name(), "JOB_STATE_RUNNING");
        assert_eq!(Job::default().state_name(), "JOB_STATE_UNKNOWN");
    }
}
