//! Per-question follow-up chat session.
//!
//! One session per rendered question, owned by whatever view displays it,
//! destroyed with that view, never shared between questions and never
//! touching job state. The session is a small state machine: idle, then
//! `pending` between dispatch and outcome, then idle again.
//!
//! Transport stays outside: [`FollowUpSession::begin`] validates and
//! records the user turn, the caller performs the HTTP exchange, and
//! [`FollowUpSession::resolve`] records the outcome. Service failures stop
//! here as a fixed fallback line in the history; they are never escalated.

use tracing::warn;

use crate::api::{ApiError, GradingClient};

/// Assistant line recorded when the answer service fails.
pub const FALLBACK_ANSWER: &str =
    "Sorry, a follow-up answer could not be generated for this question.";

/// Which `(job, student, question)` a session talks about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRef {
    pub job_id: String,
    pub student_id: String,
    pub question_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

/// One turn in a session's history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEntry {
    pub role: ChatRole,
    pub content: String,
}

/// Why an ask was refused before any network activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AskRejected {
    /// Query was empty after trimming.
    Empty,
    /// A request is already in flight; no double-submit.
    Busy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FollowUpSession {
    pub context: QuestionRef,
    pub history: Vec<ChatEntry>,
    pub pending: bool,
}

impl FollowUpSession {
    pub fn new(context: QuestionRef) -> Self {
        Self {
            context,
            history: Vec::new(),
            pending: false,
        }
    }

    /// Accepts a query for dispatch.
    ///
    /// On success the trimmed user turn is already appended and the session
    /// is `pending`; the caller owes exactly one [`resolve`] call. The
    /// caller clears its input buffer at this point, while the outcome is
    /// still unknown.
    ///
    /// # Errors
    /// [`AskRejected::Empty`] for a blank query, [`AskRejected::Busy`]
    /// while a request is in flight. Neither touches the history.
    ///
    /// [`resolve`]: FollowUpSession::resolve
    pub fn begin(&mut self, query: &str) -> Result<String, AskRejected> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Err(AskRejected::Empty);
        }
        if self.pending {
            return Err(AskRejected::Busy);
        }
        self.history.push(ChatEntry {
            role: ChatRole::User,
            content: trimmed.to_string(),
        });
        self.pending = true;
        Ok(trimmed.to_string())
    }

    /// Records the outcome of the in-flight request.
    ///
    /// Any service failure becomes the fixed [`FALLBACK_ANSWER`] line; the
    /// error itself goes no further than the log.
    pub fn resolve(&mut self, outcome: Result<String, ApiError>) {
        let content = match outcome {
            Ok(answer) => answer,
            Err(e) => {
                warn!(question_id = %self.context.question_id, error = %e, "follow-up request failed");
                FALLBACK_ANSWER.to_string()
            }
        };
        self.history.push(ChatEntry {
            role: ChatRole::Assistant,
            content,
        });
        self.pending = false;
    }

    /// One-shot ask: begin, exchange, resolve.
    ///
    /// Service failures are swallowed into the history per [`resolve`];
    /// only local rejection reaches the caller.
    ///
    /// # Errors
    /// Returns [`AskRejected`] when the query is blank or a request is
    /// already in flight.
    ///
    /// [`resolve`]: FollowUpSession::resolve
    pub async fn ask(&mut self, client: &GradingClient, query: &str) -> Result<(), AskRejected> {
        let trimmed = self.begin(query)?;
        let outcome = client
            .follow_up(&self.context, &trimmed)
            .await
            .map(|r| r.answer);
        self.resolve(outcome);
        Ok(())
    }

    /// The latest assistant turn, if any.
    pub fn last_answer(&self) -> Option<&str> {
        self.history
            .iter()
            .rev()
            .find(|e| e.role == ChatRole::Assistant)
            .map(|e| e.content.as_str())
    }
}

#[cfg(test)]
mod tests {
    use crate::api::ApiErrorKind;

    use super::*;

    fn session() -> FollowUpSession {
        FollowUpSession::new(QuestionRef {
            job_id: "job-1".to_string(),
            student_id: "s1".to_string(),
            question_id: "Q1".to_string(),
        })
    }

    #[test]
    fn blank_query_is_rejected_without_touching_history() {
        let mut s = session();
        assert_eq!(s.begin(""), Err(AskRejected::Empty));
        assert_eq!(s.begin("   \t  "), Err(AskRejected::Empty));
        assert!(s.history.is_empty());
        assert!(!s.pending);
    }

    #[test]
    fn begin_appends_trimmed_user_turn_and_sets_pending() {
        let mut s = session();
        let sent = s.begin("  why is this wrong?  ").expect("accepted");
        assert_eq!(sent, "why is this wrong?");
        assert_eq!(s.history.len(), 1);
        assert_eq!(s.history[0].role, ChatRole::User);
        assert_eq!(s.history[0].content, "why is this wrong?");
        assert!(s.pending);
    }

    #[test]
    fn second_ask_while_pending_is_rejected() {
        let mut s = session();
        s.begin("first").expect("accepted");
        assert_eq!(s.begin("second"), Err(AskRejected::Busy));
        assert_eq!(s.history.len(), 1, "rejected ask must not append");
    }

    #[test]
    fn success_appends_assistant_answer() {
        let mut s = session();
        s.begin("why?").expect("accepted");
        s.resolve(Ok("Because the units differ.".to_string()));
        assert!(!s.pending);
        assert_eq!(s.history.len(), 2);
        assert_eq!(s.history[1].role, ChatRole::Assistant);
        assert_eq!(s.last_answer(), Some("Because the units differ."));
    }

    #[test]
    fn failure_appends_exactly_one_fallback_line() {
        let mut s = session();
        s.begin("why?").expect("accepted");
        s.resolve(Err(ApiError::new(ApiErrorKind::HttpStatus, "HTTP 500")));
        assert!(!s.pending);
        let fallbacks = s
            .history
            .iter()
            .filter(|e| e.content == FALLBACK_ANSWER)
            .count();
        assert_eq!(fallbacks, 1);
        assert_eq!(s.history.len(), 2);
    }

    #[test]
    fn timeout_is_an_ordinary_failure() {
        let mut s = session();
        s.begin("why?").expect("accepted");
        s.resolve(Err(ApiError::timeout("request timed out")));
        assert!(!s.pending);
        assert_eq!(s.last_answer(), Some(FALLBACK_ANSWER));
    }

    #[test]
    fn session_is_usable_again_after_failure() {
        let mut s = session();
        s.begin("first").expect("accepted");
        s.resolve(Err(ApiError::network("connection refused")));
        s.begin("second").expect("accepted after resolve");
        s.resolve(Ok("answer".to_string()));
        assert_eq!(s.history.len(), 4);
        assert_eq!(s.last_answer(), Some("answer"));
    }
}
