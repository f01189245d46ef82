//! Grading-job stream events.
//!
//! Each wire message is one JSON document of the form
//! `{"event": <kind>, "data": <payload>}`. Parsing never panics; malformed
//! messages come back as [`EventParseError`] and the caller decides what to
//! do with them (log and drop, typically). Timestamps are assigned locally
//! on receipt, never read from the wire.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One event on a job's stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum JobEvent {
    /// Declares the expected number of questions per student.
    JobStarted { total_questions: u32 },
    /// One graded question for one student.
    PartialResult(GradedResult),
    /// Final rollup for one student.
    StudentSummary(StudentSummary),
    /// The whole job finished.
    JobDone { job_id: String },
    /// Unrecoverable stream-level failure.
    Error { message: String },
}

/// Grade for a single `(student, question)` pair.
///
/// The same pair may recur on the stream when the grader issues a
/// correction; consumers treat the later event as a replacement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradedResult {
    pub job_id: String,
    pub student_id: String,
    pub question_id: String,
    pub score: f64,
    pub max_score: f64,
    /// Grader's reasoning for the score.
    pub justification: String,
    pub expected_answer: String,
    pub student_answer_text: String,
    /// Student-facing phrasing of the feedback, when the grader produced one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friendly_feedback: Option<String>,
    pub verifier_status: VerifierStatus,
}

/// Outcome of the automated check on a graded result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifierStatus {
    pub valid: bool,
    #[serde(default)]
    pub issues: Vec<String>,
}

/// Per-student rollup sent once the student's sheet is fully graded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentSummary {
    pub student_id: String,
    pub summary_report: String,
    pub total_score: f64,
    pub total_max_score: f64,
}

/// A malformed stream message.
///
/// Covers JSON that does not parse, an unknown `event` tag, and payloads
/// missing required fields. Carries enough context to log; the message is
/// then discarded without touching any state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventParseError {
    message: String,
}

impl EventParseError {
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<serde_json::Error> for EventParseError {
    fn from(e: serde_json::Error) -> Self {
        Self {
            message: e.to_string(),
        }
    }
}

impl fmt::Display for EventParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed job event: {}", self.message)
    }
}

impl std::error::Error for EventParseError {}

/// Parses one raw stream message into a [`JobEvent`].
///
/// # Errors
/// Returns [`EventParseError`] when the message is not valid JSON, the
/// `event` tag is unknown, or required payload fields are missing. Extra
/// fields are ignored.
pub fn parse_event(raw: &str) -> Result<JobEvent, EventParseError> {
    Ok(serde_json::from_str(raw)?)
}

/// A [`JobEvent`] stamped with its local receipt time.
///
/// The stamp is RFC 3339 UTC at second precision, taken when the event
/// crosses the transport boundary. Folding is pure; only this constructor
/// reads the clock.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedEvent {
    pub timestamp: String,
    pub event: JobEvent,
}

impl ReceivedEvent {
    /// Stamps `event` with the current time.
    pub fn received_now(event: JobEvent) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            event,
        }
    }

    /// Stamps `event` with a caller-supplied time. Intended for tests and
    /// replay, where determinism matters.
    pub fn received_at(event: JobEvent, timestamp: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            event,
        }
    }
}
