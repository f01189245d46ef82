//! Full-screen TUI for watching a grading job live.

pub mod effects;
pub mod events;
pub mod render;
pub mod request;
pub mod runtime;
pub mod state;
pub mod terminal;
pub mod update;

use std::io::{IsTerminal, Write, stderr};

use anyhow::Result;
use gradex_core::api::GradingClient;
use gradex_core::config::Config;
pub use runtime::TuiRuntime;

/// Runs the live job view until the user quits.
///
/// Spawns the stream subscription onto the ambient tokio runtime; the
/// caller drives this future with `block_on`.
pub async fn run_watch(config: &Config, job_id: String) -> Result<()> {
    // Watch mode requires a terminal to render the TUI
    if !stderr().is_terminal() {
        anyhow::bail!(
            "Watch mode requires a terminal.\n\
             Use `gradex tail {job_id}` for non-interactive streaming."
        );
    }

    let client = GradingClient::new(config)?;

    // Print pre-TUI info to stderr (will be replaced by alternate screen)
    let mut err = stderr();
    writeln!(err, "Gradex Watch")?;
    writeln!(err, "Job: {job_id}")?;
    writeln!(err, "Server: {}", client.base_url())?;
    err.flush()?;

    let mut runtime = TuiRuntime::new(client, job_id)?;
    runtime.run()?;

    // Print goodbye after TUI exits (terminal restored)
    writeln!(stderr(), "Stopped watching.")?;
    Ok(())
}
