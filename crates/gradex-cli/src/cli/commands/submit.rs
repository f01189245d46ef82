//! Submit command: upload an answer key and student sheets as a new job.
//!
//! Prints the new job ID to stdout so scripts can capture it. Everything
//! else goes to stderr.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use gradex_core::api::client::{FilePart, GradingClient};
use gradex_core::config::Config;

pub async fn run(config: &Config, answer_key: &Path, sheets: &[PathBuf], watch: bool) -> Result<()> {
    let client = GradingClient::new(config)?;

    let key_part = FilePart::read(answer_key)?;
    let mut sheet_parts = Vec::with_capacity(sheets.len());
    for sheet in sheets {
        sheet_parts.push(FilePart::read(sheet)?);
    }

    let created = client
        .submit_job(key_part, sheet_parts)
        .await
        .context("submit job")?;

    eprintln!(
        "Job {} accepted (status: {})",
        created.job_id, created.status
    );
    println!("{}", created.job_id);

    if watch {
        return super::watch::run(config, created.job_id).await;
    }

    Ok(())
}
