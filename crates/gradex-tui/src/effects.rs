//! UI effect types.
//!
//! Effects are commands returned by the reducer that the runtime executes.
//! They represent I/O and task spawning only (no direct UI mutations).
//! This keeps the reducer pure: it only mutates state and returns effects,
//! never performs I/O or spawns tasks directly.

use gradex_core::job::QuestionRef;

use crate::request::RequestId;

/// Effects returned by the reducer for the runtime to execute.
#[derive(Debug)]
pub enum UiEffect {
    /// Quit the application.
    Quit,

    /// Spawn a follow-up request for the given question.
    ///
    /// The runtime answers with a `FollowUpResult` event carrying the same
    /// request id.
    AskFollowUp {
        request: RequestId,
        context: QuestionRef,
        query: String,
    },
}
