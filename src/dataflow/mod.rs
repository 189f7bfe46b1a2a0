//! Access to the Dataflow job-management API.
//!
//! Only the two calls the worker count needs are modeled: job lookup and
//! the paginated job-message listing that carries autoscaling events.

pub mod auth;
pub mod client;
pub mod types;

use async_trait::async_trait;
use futures::Stream;

pub use client::RestClient;
pub use types::{AutoscalingEvent, Job, JobMessageImportance, JobRef, ListJobMessagesRequest};

use types::ListJobMessagesResponse;

#[derive(Debug, thiserror::Error)]
pub enum DataflowError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    PermissionDenied(String),
    #[error("{0}")]
    Unauthenticated(String),
    #[error("could not obtain credentials: {0}")]
    Credentials(String),
    #[error("HTTP {code}: {message}")]
    Status { code: u16, message: String },
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid request URL: {0}")]
    Url(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, DataflowError>;

#[async_trait]
pub trait DataflowApi: Send + Sync {
    async fn get_job(&self, job: &JobRef) -> Result<Job>;

    /// Fetches one page of messages. `page_token` is `None` for the first page.
    async fn list_job_messages(
        &self,
        request: &ListJobMessagesRequest,
        page_token: Option<&str>,
    ) -> Result<ListJobMessagesResponse>;
}

enum PageCursor {
    First,
    Next(String),
    Done,
}

/// Lazily walks every page of `request`, yielding the autoscaling events of
/// each page in the order the service returned them.
///
/// A page is only requested once the previous one has been consumed.
pub fn autoscaling_event_pages<'a, A>(
    api: &'a A,
    request: &'a ListJobMessagesRequest,
) -> impl Stream<Item = Result<Vec<AutoscalingEvent>>> + 'a
where
    A: DataflowApi + ?Sized,
{
    futures::stream::try_unfold(PageCursor::First, move |cursor| async move {
        let token = match cursor {
            PageCursor::First => None,
            PageCursor::Next(token) => Some(token),
            PageCursor::Done => return Ok(None),
        };

        let page = api.list_job_messages(request, token.as_deref()).await?;
        log::debug!(
            "Fetched message page for {}: {} message(s), {} autoscaling event(s)",
            request.job,
            page.job_messages.len(),
            page.autoscaling_events.len()
        );
        for message in &page.job_messages {
            log::trace!(
                "[{}] {}: {}",
                message.time.map(|t| t.to_rfc3339()).unwrap_or_default(),
                message.message_importance.as_deref().unwrap_or("JOB_MESSAGE_IMPORTANCE_UNKNOWN"),
                message.message_text.as_deref().unwrap_or_default()
            );
        }

        let next = match page.next_page_token {
            Some(token) if !token.is_empty() => PageCursor::Next(token),
            _ => PageCursor::Done,
        };
        Ok(Some((page.autoscaling_events, next)))
    })
}
