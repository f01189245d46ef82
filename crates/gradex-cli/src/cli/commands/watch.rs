//! Watch command: full-screen live view of a job (optional `tui` feature).

use anyhow::Result;
use gradex_core::config::Config;

#[cfg(feature = "tui")]
pub async fn run(config: &Config, job_id: String) -> Result<()> {
    gradex_tui::run_watch(config, job_id).await
}

#[cfg(not(feature = "tui"))]
pub async fn run(_config: &Config, job_id: String) -> Result<()> {
    anyhow::bail!(
        "TUI support is disabled in this build (feature \"tui\").\nUse `gradex tail {job_id}` instead."
    );
}
