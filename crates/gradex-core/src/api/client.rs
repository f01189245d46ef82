//! HTTP client for the grading service.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Config;
use crate::job::followup::QuestionRef;

use super::stream::JobEventSource;
use super::{ApiError, ApiResult, USER_AGENT, classify_reqwest_error, resolve_server_url};

/// Decoded, stamped events off one job's stream.
pub type JobEventStream = BoxStream<'static, ApiResult<gradex_types::ReceivedEvent>>;

/// Acknowledgement for a submitted job.
#[derive(Debug, Clone, Deserialize)]
pub struct JobCreated {
    pub job_id: String,
    pub status: String,
}

/// Successful follow-up exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct FollowUpAnswer {
    pub answer: String,
}

#[derive(Debug, Serialize)]
struct FollowUpRequest<'a> {
    query: &'a str,
}

/// One file going into a submission form.
#[derive(Debug, Clone)]
pub struct FilePart {
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

impl FilePart {
    /// Reads a file from disk, guessing its MIME type from the extension.
    ///
    /// # Errors
    /// Returns an error when the file cannot be read.
    pub fn read(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let file_name = path
            .file_name()
            .map_or_else(|| "upload".to_string(), |n| n.to_string_lossy().into_owned());
        Ok(Self {
            mime: mime_for_path(path),
            file_name,
            bytes,
        })
    }

    fn into_part(self) -> ApiResult<Part> {
        Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str(self.mime)
            .map_err(|e| ApiError::parse(format!("Invalid upload part: {e}")))
    }
}

fn mime_for_path(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Client for the grading service's job API.
///
/// Carries no global request timeout: the event stream must be allowed to
/// idle for as long as the job runs. Submit and follow-up calls apply
/// per-request timeouts from config instead.
#[derive(Clone)]
pub struct GradingClient {
    http: reqwest::Client,
    base_url: String,
    submit_timeout: Option<Duration>,
    follow_up_timeout: Option<Duration>,
}

impl GradingClient {
    /// Creates a client against the configured grading service.
    ///
    /// # Errors
    /// Returns an error when the resolved server URL is invalid.
    pub fn new(config: &Config) -> Result<Self> {
        let base_url = resolve_server_url(config.server.base_url.as_deref())?;
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            submit_timeout: config.request_timeout(),
            follow_up_timeout: config.follow_up_timeout(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Submits a grading job: one answer key plus one or more student sheets.
    ///
    /// # Errors
    /// Returns an [`ApiError`] on connectivity failure, non-success status,
    /// or an acknowledgement body that does not decode.
    pub async fn submit_job(
        &self,
        answer_key: FilePart,
        student_sheets: Vec<FilePart>,
    ) -> ApiResult<JobCreated> {
        let mut form = Form::new().part("answer_key", answer_key.into_part()?);
        for sheet in student_sheets {
            form = form.part("student_sheets", sheet.into_part()?);
        }

        let url = format!("{}/api/jobs", self.base_url);
        debug!(url = %url, "submitting grading job");
        let mut request = self
            .http
            .post(&url)
            .header("user-agent", USER_AGENT)
            .multipart(form);
        if let Some(timeout) = self.submit_timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::http_status(status.as_u16(), &body));
        }
        response
            .json::<JobCreated>()
            .await
            .map_err(|e| ApiError::parse(format!("Invalid submission response: {e}")))
    }

    /// Asks the answer service about one graded question.
    ///
    /// # Errors
    /// Returns an [`ApiError`] on connectivity failure, timeout, non-success
    /// status, or a malformed body. Callers at the session boundary convert
    /// any of these into the fallback answer.
    pub async fn follow_up(
        &self,
        context: &QuestionRef,
        query: &str,
    ) -> ApiResult<FollowUpAnswer> {
        let url = format!(
            "{}/api/jobs/{}/students/{}/questions/{}/follow-up",
            self.base_url, context.job_id, context.student_id, context.question_id
        );
        let mut request = self
            .http
            .post(&url)
            .header("user-agent", USER_AGENT)
            .json(&FollowUpRequest { query });
        if let Some(timeout) = self.follow_up_timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::http_status(status.as_u16(), &body));
        }
        response
            .json::<FollowUpAnswer>()
            .await
            .map_err(|e| ApiError::parse(format!("Invalid follow-up response: {e}")))
    }

    /// Opens a job's live event stream.
    ///
    /// # Errors
    /// Returns an [`ApiError`] when the connection fails or the server
    /// refuses the stream (404 for an unknown job).
    pub async fn open_event_stream(&self, job_id: &str) -> ApiResult<JobEventStream> {
        let url = format!("{}/api/jobs/{}/stream", self.base_url, job_id);
        debug!(url = %url, "opening job event stream");
        let response = self
            .http
            .get(&url)
            .header("user-agent", USER_AGENT)
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::http_status(status.as_u16(), &body));
        }
        Ok(JobEventSource::new(response.bytes_stream()).boxed())
    }
}
