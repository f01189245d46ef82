//! Request identifiers for latest-only async results.
//!
//! Follow-up answers arrive from spawned tasks after an arbitrary delay.
//! If the user has closed the chat pane in the meantime, the result must
//! be dropped, not applied to whatever pane is open now. Each dispatched
//! request gets an id; only the id that is still active may land.

/// Opaque request id for matching async results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(u64);

/// Tracks the latest active request and ignores stale results.
#[derive(Debug, Default)]
pub struct LatestOnly {
    next: u64,
    active: Option<RequestId>,
}

impl LatestOnly {
    /// Starts a new request and marks it as active.
    pub fn begin(&mut self) -> RequestId {
        let id = RequestId(self.next);
        self.next += 1;
        self.active = Some(id);
        id
    }

    /// Cancels any active request. Its result will be ignored when it lands.
    pub fn cancel(&mut self) {
        self.active = None;
    }

    /// Returns true if the provided id is still the active request.
    pub fn is_active(&self, id: RequestId) -> bool {
        self.active == Some(id)
    }

    /// Finishes the request if it's still active.
    ///
    /// Returns true exactly once per active request; stale or cancelled
    /// ids return false.
    pub fn finish_if_active(&mut self, id: RequestId) -> bool {
        if self.is_active(id) {
            self.active = None;
            true
        } else {
            false
        }
    }
}
