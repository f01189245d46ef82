//! Event fold for one grading job.
//!
//! [`fold`] consumes stamped stream events in arrival order and maintains
//! the job's queryable state. One [`JobState`] serves exactly one job.
//!
//! Key invariants:
//! - Fold is total: any well-formed event is accepted in any order, early
//!   or late, without panicking.
//! - Fold is pure: no I/O, no clock, no randomness. Replaying the same
//!   sequence from `JobState::default()` yields an equal state.
//! - A repeated `(student, question)` pair replaces the earlier result in
//!   place; it never duplicates.
//! - `done` is monotonic and `fatal_error` keeps its first value.

use gradex_types::{GradedResult, JobEvent, ReceivedEvent, StudentSummary};

/// Aggregated state of one job's event stream.
///
/// Students are kept in first-appearance order of their `partial_result`
/// events; that order is the display order. Summaries live in a separate
/// list because a summary may arrive for a student with no results, and
/// such a student must not occupy a display slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobState {
    /// Expected questions per student; 0 until `job_started` arrives.
    pub total_questions: u32,
    pub results: Vec<StudentResults>,
    pub summaries: Vec<StudentSummary>,
    pub done: bool,
    /// Stream-level failure. Once set it is final and supersedes every
    /// projection of this state.
    pub fatal_error: Option<String>,
    /// Receipt stamp of the most recently folded event.
    pub last_event_at: Option<String>,
}

/// Graded results for one student, ordered by arrival.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentResults {
    pub student_id: String,
    pub entries: Vec<GradedResult>,
}

impl JobState {
    /// Results list for a student, if any arrived.
    pub fn results_for(&self, student_id: &str) -> Option<&StudentResults> {
        self.results.iter().find(|s| s.student_id == student_id)
    }

    /// Summary for a student, if one arrived.
    pub fn summary_for(&self, student_id: &str) -> Option<&StudentSummary> {
        self.summaries.iter().find(|s| s.student_id == student_id)
    }

    /// Student IDs in display order (first `partial_result` appearance).
    pub fn student_ids(&self) -> impl Iterator<Item = &str> {
        self.results.iter().map(|s| s.student_id.as_str())
    }
}

/// Folds one stamped event into the job state.
pub fn fold(state: &mut JobState, received: &ReceivedEvent) {
    match &received.event {
        JobEvent::JobStarted { total_questions } => {
            // Last value wins if it recurs.
            state.total_questions = *total_questions;
        }
        JobEvent::PartialResult(result) => upsert_result(state, result),
        JobEvent::StudentSummary(summary) => upsert_summary(state, summary),
        JobEvent::JobDone { .. } => {
            state.done = true;
        }
        JobEvent::Error { message } => {
            if state.fatal_error.is_none() {
                state.fatal_error = Some(message.clone());
            }
        }
    }
    state.last_event_at = Some(received.timestamp.clone());
}

fn upsert_result(state: &mut JobState, result: &GradedResult) {
    if let Some(student) = state
        .results
        .iter_mut()
        .find(|s| s.student_id == result.student_id)
    {
        if let Some(existing) = student
            .entries
            .iter_mut()
            .find(|e| e.question_id == result.question_id)
        {
            // Replacement keeps the entry's original position.
            *existing = result.clone();
        } else {
            student.entries.push(result.clone());
        }
    } else {
        state.results.push(StudentResults {
            student_id: result.student_id.clone(),
            entries: vec![result.clone()],
        });
    }
}

fn upsert_summary(state: &mut JobState, summary: &StudentSummary) {
    if let Some(existing) = state
        .summaries
        .iter_mut()
        .find(|s| s.student_id == summary.student_id)
    {
        *existing = summary.clone();
    } else {
        state.summaries.push(summary.clone());
    }
}

#[cfg(test)]
mod tests {
    use gradex_types::{JobEvent, VerifierStatus, parse_event};

    use super::*;

    fn stamped(event: JobEvent) -> ReceivedEvent {
        ReceivedEvent::received_at(event, "2026-08-21T10:00:00Z")
    }

    fn result(student_id: &str, question_id: &str, score: f64, max_score: f64) -> GradedResult {
        GradedResult {
            job_id: "job-1".to_string(),
            student_id: student_id.to_string(),
            question_id: question_id.to_string(),
            score,
            max_score,
            justification: "because".to_string(),
            expected_answer: "42".to_string(),
            student_answer_text: "41".to_string(),
            friendly_feedback: None,
            verifier_status: VerifierStatus {
                valid: true,
                issues: Vec::new(),
            },
        }
    }

    fn summary(student_id: &str, total_score: f64, total_max_score: f64) -> StudentSummary {
        StudentSummary {
            student_id: student_id.to_string(),
            summary_report: "Did fine.".to_string(),
            total_score,
            total_max_score,
        }
    }

    fn fold_all(events: &[JobEvent]) -> JobState {
        let mut state = JobState::default();
        for event in events {
            fold(&mut state, &stamped(event.clone()));
        }
        state
    }

    #[test]
    fn job_started_sets_total_and_last_value_wins() {
        let state = fold_all(&[
            JobEvent::JobStarted { total_questions: 5 },
            JobEvent::JobStarted { total_questions: 8 },
        ]);
        assert_eq!(state.total_questions, 8);
    }

    #[test]
    fn partial_results_append_in_arrival_order() {
        let state = fold_all(&[
            JobEvent::PartialResult(result("s1", "Q2", 3.0, 10.0)),
            JobEvent::PartialResult(result("s1", "Q1", 7.0, 10.0)),
        ]);
        let entries = &state.results_for("s1").unwrap().entries;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].question_id, "Q2");
        assert_eq!(entries[1].question_id, "Q1");
    }

    #[test]
    fn repeated_question_replaces_in_place_keeping_position() {
        let state = fold_all(&[
            JobEvent::PartialResult(result("s1", "Q1", 2.0, 10.0)),
            JobEvent::PartialResult(result("s1", "Q2", 5.0, 10.0)),
            JobEvent::PartialResult(result("s1", "Q1", 9.0, 10.0)),
        ]);
        let entries = &state.results_for("s1").unwrap().entries;
        assert_eq!(entries.len(), 2, "replacement must not duplicate");
        assert_eq!(entries[0].question_id, "Q1");
        assert!((entries[0].score - 9.0).abs() < f64::EPSILON, "later payload wins");
        assert_eq!(entries[1].question_id, "Q2");
    }

    #[test]
    fn same_question_for_different_students_stays_separate() {
        let state = fold_all(&[
            JobEvent::PartialResult(result("s1", "Q1", 2.0, 10.0)),
            JobEvent::PartialResult(result("s2", "Q1", 8.0, 10.0)),
        ]);
        assert_eq!(state.results.len(), 2);
        assert_eq!(state.results_for("s1").unwrap().entries.len(), 1);
        assert_eq!(state.results_for("s2").unwrap().entries.len(), 1);
    }

    #[test]
    fn student_display_order_is_first_appearance() {
        let state = fold_all(&[
            JobEvent::PartialResult(result("s2", "Q1", 1.0, 10.0)),
            JobEvent::PartialResult(result("s1", "Q1", 1.0, 10.0)),
            JobEvent::PartialResult(result("s2", "Q2", 1.0, 10.0)),
        ]);
        let ids: Vec<&str> = state.student_ids().collect();
        assert_eq!(ids, ["s2", "s1"]);
    }

    #[test]
    fn summary_overwrites_previous_summary() {
        let state = fold_all(&[
            JobEvent::StudentSummary(summary("s1", 10.0, 20.0)),
            JobEvent::StudentSummary(summary("s1", 13.0, 20.0)),
        ]);
        assert_eq!(state.summaries.len(), 1);
        assert!((state.summary_for("s1").unwrap().total_score - 13.0).abs() < f64::EPSILON);
    }

    #[test]
    fn summary_without_results_does_not_occupy_display_order() {
        let state = fold_all(&[
            JobEvent::StudentSummary(summary("ghost", 0.0, 0.0)),
            JobEvent::PartialResult(result("s1", "Q1", 5.0, 10.0)),
        ]);
        let ids: Vec<&str> = state.student_ids().collect();
        assert_eq!(ids, ["s1"]);
        assert!(state.summary_for("ghost").is_some());
    }

    #[test]
    fn done_is_monotonic_and_idempotent() {
        let mut state = JobState::default();
        fold(&mut state, &stamped(JobEvent::JobDone { job_id: "job-1".to_string() }));
        assert!(state.done);
        fold(&mut state, &stamped(JobEvent::JobDone { job_id: "job-1".to_string() }));
        assert!(state.done);
        // Late results after done still fold.
        fold(
            &mut state,
            &stamped(JobEvent::PartialResult(result("s1", "Q1", 5.0, 10.0))),
        );
        assert!(state.done);
        assert_eq!(state.results_for("s1").unwrap().entries.len(), 1);
    }

    #[test]
    fn first_error_wins() {
        let state = fold_all(&[
            JobEvent::Error { message: "A".to_string() },
            JobEvent::Error { message: "B".to_string() },
        ]);
        assert_eq!(state.fatal_error.as_deref(), Some("A"));
    }

    #[test]
    fn events_after_fatal_error_still_fold() {
        let state = fold_all(&[
            JobEvent::Error { message: "boom".to_string() },
            JobEvent::PartialResult(result("s1", "Q1", 5.0, 10.0)),
            JobEvent::JobDone { job_id: "job-1".to_string() },
        ]);
        assert_eq!(state.fatal_error.as_deref(), Some("boom"));
        assert!(state.done);
        assert_eq!(state.results_for("s1").unwrap().entries.len(), 1);
    }

    #[test]
    fn early_partial_result_before_job_started_is_accepted() {
        let state = fold_all(&[
            JobEvent::PartialResult(result("s1", "Q1", 5.0, 10.0)),
            JobEvent::JobStarted { total_questions: 3 },
        ]);
        assert_eq!(state.total_questions, 3);
        assert_eq!(state.results_for("s1").unwrap().entries.len(), 1);
    }

    #[test]
    fn replay_is_deterministic() {
        let events = vec![
            JobEvent::JobStarted { total_questions: 2 },
            JobEvent::PartialResult(result("s1", "Q1", 5.0, 10.0)),
            JobEvent::PartialResult(result("s2", "Q1", 6.0, 10.0)),
            JobEvent::PartialResult(result("s1", "Q1", 7.0, 10.0)),
            JobEvent::StudentSummary(summary("s1", 13.0, 20.0)),
            JobEvent::JobDone { job_id: "job-1".to_string() },
        ];
        assert_eq!(fold_all(&events), fold_all(&events));
    }

    #[test]
    fn distinct_questions_commute_up_to_entry_order() {
        let forward = fold_all(&[
            JobEvent::PartialResult(result("s1", "Q1", 5.0, 10.0)),
            JobEvent::PartialResult(result("s1", "Q2", 6.0, 10.0)),
        ]);
        let reversed = fold_all(&[
            JobEvent::PartialResult(result("s1", "Q2", 6.0, 10.0)),
            JobEvent::PartialResult(result("s1", "Q1", 5.0, 10.0)),
        ]);
        let ids = |state: &JobState| {
            let mut ids: Vec<String> = state
                .results_for("s1")
                .unwrap()
                .entries
                .iter()
                .map(|e| e.question_id.clone())
                .collect();
            ids.sort();
            ids
        };
        assert_eq!(ids(&forward), ids(&reversed));
        // Entry order still reflects arrival in each run.
        assert_eq!(forward.results_for("s1").unwrap().entries[0].question_id, "Q1");
        assert_eq!(reversed.results_for("s1").unwrap().entries[0].question_id, "Q2");
    }

    #[test]
    fn malformed_message_between_valid_events_is_droppable() {
        let mut state = JobState::default();
        let frames = [
            r#"{"event":"partial_result","data":{"job_id":"job-1","student_id":"s1","question_id":"Q1","score":5.0,"max_score":10.0,"justification":"j","expected_answer":"e","student_answer_text":"a","verifier_status":{"valid":true,"issues":[]}}}"#,
            "{{{ definitely not json",
            r#"{"event":"partial_result","data":{"job_id":"job-1","student_id":"s1","question_id":"Q2","score":6.0,"max_score":10.0,"justification":"j","expected_answer":"e","student_answer_text":"a","verifier_status":{"valid":true,"issues":[]}}}"#,
        ];
        for frame in frames {
            match parse_event(frame) {
                Ok(event) => fold(&mut state, &stamped(event)),
                Err(_) => {} // dropped, state untouched
            }
        }
        assert_eq!(state.results_for("s1").unwrap().entries.len(), 2);
        assert!(state.fatal_error.is_none());
    }

    #[test]
    fn last_event_at_tracks_latest_stamp() {
        let mut state = JobState::default();
        fold(
            &mut state,
            &ReceivedEvent::received_at(
                JobEvent::JobStarted { total_questions: 1 },
                "2026-08-21T10:00:00Z",
            ),
        );
        fold(
            &mut state,
            &ReceivedEvent::received_at(
                JobEvent::JobDone { job_id: "job-1".to_string() },
                "2026-08-21T10:05:00Z",
            ),
        );
        assert_eq!(state.last_event_at.as_deref(), Some("2026-08-21T10:05:00Z"));
    }
}
