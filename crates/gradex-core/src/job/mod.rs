//! Job-side domain logic: event aggregation, view projection, follow-up chat.

pub mod followup;
pub mod state;
pub mod view;

pub use followup::{AskRejected, ChatEntry, ChatRole, FALLBACK_ANSWER, FollowUpSession, QuestionRef};
pub use state::{JobState, StudentResults, fold};
pub use view::{JobView, StudentProgress, StudentView, is_pass_leaning, project};
