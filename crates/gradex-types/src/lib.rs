//! Wire-level types shared across gradex crates.

pub mod events;

pub use events::{
    EventParseError, GradedResult, JobEvent, ReceivedEvent, StudentSummary, VerifierStatus,
    parse_event,
};
