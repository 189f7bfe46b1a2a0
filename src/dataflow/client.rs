use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;

use super::auth::Authenticator;
use super::types::{Job, JobRef, ListJobMessagesRequest, ListJobMessagesResponse};
use super::{DataflowApi, DataflowError, Result};

pub const DEFAULT_ENDPOINT: &str = "https://dataflow.googleapis.com/v1b3/";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Google API error envelope.
#[derive(serde::Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(serde::Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// Talks to the Dataflow v1b3 REST surface.
pub struct RestClient {
    http: reqwest::Client,
    endpoint: Url,
    auth: Authenticator,
}

impl RestClient {
    pub fn new(endpoint: &str, auth: Authenticator) -> Result<Self> {
        let mut endpoint = Url::parse(endpoint)?;
        // `Url::join` drops the last path segment unless it ends with a slash.
        if !endpoint.path().ends_with('/') {
            let path = format!("{}/", endpoint.path());
            endpoint.set_path(&path);
        }
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            endpoint,
            auth,
        })
    }

    fn job_url(&self, job: &JobRef, suffix: &str) -> Result<Url> {
        let path = format!(
            "projects/{}/locations/{}/jobs/{}{}",
            urlencoding::encode(&job.project_id),
            urlencoding::encode(&job.location),
            urlencoding::encode(&job.job_id),
            suffix
        );
        Ok(self.endpoint.join(&path)?)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        log::trace!("GET {url}");
        let headers = self.auth.headers().await?;
        let response = self.http.get(url).headers(headers).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(status_error(status, &body));
        }
        Ok(serde_json::from_slice(&body)?)
    }
}

fn status_error(status: StatusCode, body: &[u8]) -> DataflowError {
    let message = match serde_json::from_slice::<ErrorEnvelope>(body) {
        Ok(envelope) if !envelope.error.status.is_empty() => {
            format!("{} ({})", envelope.error.message, envelope.error.status)
        }
        Ok(envelope) => envelope.error.message,
        Err(_) => String::from_utf8_lossy(body).trim().to_string(),
    };

    match status {
        StatusCode::NOT_FOUND => DataflowError::NotFound(message),
        StatusCode::FORBIDDEN => DataflowError::PermissionDenied(message),
        StatusCode::UNAUTHORIZED => DataflowError::Unauthenticated(message),
        _ => DataflowError::Status {
            code: status.as_u16(),
            message,
        },
    }
}

#[async_trait]
impl DataflowApi for RestClient {
    async fn get_job(&self, job: &JobRef) -> Result<Job> {
        let mut url = self.job_url(job, "")?;
        url.query_pairs_mut()
            .append_pair("view", "JOB_VIEW_SUMMARY");
        self.get_json(url).await
    }

    async fn list_job_messages(
        &self,
        request: &ListJobMessagesRequest,
        page_token: Option<&str>,
    ) -> Result<ListJobMessagesResponse> {
        let mut url = self.job_url(&request.job, "/messages")?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("minimumImportance", request.minimum_importance.as_ref());
            query.append_pair(
                "startTime",
                &request
                    .start_time
                    .to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            );
            if let Some(token) = page_token {
                query.append_pair("pageToken", token);
            }
        }
        self.get_json(url).await
    }
}
