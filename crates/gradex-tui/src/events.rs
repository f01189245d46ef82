//! UI event types.
//!
//! Everything the runtime feeds into the reducer is a `UiEvent`: terminal
//! input, ticks, frame boundaries, and results arriving from spawned tasks
//! via the inbox channel.

use gradex_core::api::ApiResult;
use gradex_types::ReceivedEvent;

use crate::request::RequestId;

/// Events processed by the reducer.
#[derive(Debug)]
pub enum UiEvent {
    /// Periodic tick for animation and render pacing.
    Tick,
    /// Frame boundary carrying the current terminal dimensions.
    Frame { width: u16, height: u16 },
    /// Raw terminal input event.
    Terminal(crossterm::event::Event),
    /// Item produced by the job stream task.
    Stream(StreamItem),
    /// Outcome of a follow-up request.
    ///
    /// Applied only while `request` is still the active one; results for
    /// a closed pane are discarded.
    FollowUpResult {
        request: RequestId,
        outcome: ApiResult<String>,
    },
}

/// What the job stream task reports back to the UI.
#[derive(Debug)]
pub enum StreamItem {
    /// A decoded job event, already stamped with its receipt time.
    Event(ReceivedEvent),
    /// The connection failed and the task gave up.
    ///
    /// Folded job state stays on screen; only the live-ness is gone.
    ConnectionLost { message: String },
    /// The server closed the stream.
    Ended,
}
