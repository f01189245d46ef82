//! Application state for the live job view.
//!
//! ## State Hierarchy
//!
//! ```text
//! AppState
//! ├── job: JobState              (folded stream events)
//! ├── stream: StreamStatus       (live / lost / ended)
//! ├── selection: Selection       (cursor into student and question lists)
//! ├── followup: Option<FollowUpPane> (chat pane for one question)
//! └── requests: LatestOnly       (stale-result guard)
//! ```
//!
//! The reducer in `update` is the only place this state is mutated.

use gradex_core::job::{FollowUpSession, JobState, QuestionRef};

use crate::request::LatestOnly;

/// Connection status of the job event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamStatus {
    /// Stream is open and may still deliver events.
    Live,
    /// Stream failed. Folded state stays on screen, marked as no longer live.
    Lost { message: String },
    /// Server closed the stream after the job finished.
    Ended,
}

impl StreamStatus {
    pub fn is_live(&self) -> bool {
        matches!(self, StreamStatus::Live)
    }
}

/// Which list has keyboard focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Students,
    Questions,
}

/// Cursor into the student and question lists.
///
/// Indices are clamped on navigation, not on fold: students and results
/// are never removed, so an index that was valid stays valid.
#[derive(Debug)]
pub struct Selection {
    pub focus: Focus,
    pub student_idx: usize,
    pub question_idx: usize,
}

impl Selection {
    fn new() -> Self {
        Self {
            focus: Focus::Students,
            student_idx: 0,
            question_idx: 0,
        }
    }
}

/// Follow-up chat pane attached to one question.
///
/// Owns the session and the input buffer; closing the pane drops both,
/// which is what discards the conversation.
#[derive(Debug)]
pub struct FollowUpPane {
    pub session: FollowUpSession,
    pub input: String,
}

impl FollowUpPane {
    pub fn open(context: QuestionRef) -> Self {
        Self {
            session: FollowUpSession::new(context),
            input: String::new(),
        }
    }
}

/// Top-level state for the watch TUI.
pub struct AppState {
    /// Flag indicating the app should quit.
    pub should_quit: bool,
    /// Job being watched.
    pub job_id: String,
    /// Folded job state, updated by stream events.
    pub job: JobState,
    /// Stream connection status.
    pub stream: StreamStatus,
    /// Cursor into the student and question lists.
    pub selection: Selection,
    /// Open follow-up pane, if any.
    pub followup: Option<FollowUpPane>,
    /// Stale-result guard for follow-up requests.
    pub requests: LatestOnly,
    /// Spinner animation frame counter, advanced on Tick.
    pub spinner_frame: usize,
}

impl AppState {
    pub fn new(job_id: String) -> Self {
        Self {
            should_quit: false,
            job_id,
            job: JobState::default(),
            stream: StreamStatus::Live,
            selection: Selection::new(),
            followup: None,
            requests: LatestOnly::default(),
            spinner_frame: 0,
        }
    }

    /// True while the stream is live and the job has not finished or failed.
    ///
    /// Drives the header spinner and the fast poll cadence.
    pub fn is_streaming(&self) -> bool {
        self.stream.is_live() && !self.job.done && self.job.fatal_error.is_none()
    }

    /// True while a follow-up answer is in flight.
    pub fn has_pending_follow_up(&self) -> bool {
        self.followup
            .as_ref()
            .is_some_and(|pane| pane.session.pending)
    }
}
