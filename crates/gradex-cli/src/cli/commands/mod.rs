//! CLI command handlers.

pub mod ask;
pub mod config;
pub mod submit;
pub mod tail;
pub mod watch;
