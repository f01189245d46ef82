//! Read-only projections over [`JobState`].
//!
//! Everything here is a pure function of the state; nothing is cached.
//! A fatal stream error supersedes all progress: [`project`] returns
//! [`JobView::Failed`] carrying only the message, so callers cannot
//! accidentally render progress for a failed job.

use gradex_types::{GradedResult, StudentSummary};

use super::state::JobState;

/// What a frontend should show for a job right now.
#[derive(Debug, Clone, PartialEq)]
pub enum JobView<'a> {
    /// Stream reported a fatal error; show only this.
    Failed { message: &'a str },
    /// Normal life cycle, possibly still in flight.
    Active {
        students: Vec<StudentView<'a>>,
        done: bool,
        total_questions: u32,
    },
}

/// One student's slice of the view, in display order.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentView<'a> {
    pub student_id: &'a str,
    pub results: &'a [GradedResult],
    pub summary: Option<&'a StudentSummary>,
    pub progress: StudentProgress,
}

/// Progress numbers for one student.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StudentProgress {
    /// Number of graded answers held for the student. Never truncated,
    /// even when it exceeds `total_questions`.
    pub processed_count: usize,
    /// Percentage in `[0, 100]`. 0 while `total_questions` is unknown.
    pub percent: f64,
    /// True once the student's summary arrived.
    pub is_done: bool,
}

/// Projects the full state into a renderable view.
pub fn project(state: &JobState) -> JobView<'_> {
    if let Some(message) = &state.fatal_error {
        return JobView::Failed { message };
    }
    let students = state
        .results
        .iter()
        .map(|s| StudentView {
            student_id: &s.student_id,
            results: &s.entries,
            summary: state.summary_for(&s.student_id),
            progress: student_progress(state, &s.student_id),
        })
        .collect();
    JobView::Active {
        students,
        done: state.done,
        total_questions: state.total_questions,
    }
}

/// Progress for a single student. Unknown students report zero progress.
pub fn student_progress(state: &JobState, student_id: &str) -> StudentProgress {
    let processed_count = state
        .results_for(student_id)
        .map_or(0, |s| s.entries.len());
    let percent = if state.total_questions > 0 {
        (100.0 * processed_count as f64 / f64::from(state.total_questions)).clamp(0.0, 100.0)
    } else {
        0.0
    };
    StudentProgress {
        processed_count,
        percent,
        is_done: state.summary_for(student_id).is_some(),
    }
}

/// Display threshold for coloring a result, not a grading decision.
/// A tie (`score == max_score / 2`) is not pass-leaning.
pub fn is_pass_leaning(result: &GradedResult) -> bool {
    result.score > result.max_score / 2.0
}
