//! Core gradex library (job state, projections, follow-up, API client, config).

pub mod api;
pub mod config;
pub mod job;
pub mod logging;
