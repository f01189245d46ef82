//! Tail command: stream a job as plain lines, one per event.
//!
//! # Output contract
//! - Event lines go to stdout, one line per folded event.
//! - Status and connectivity notices go to stderr.
//!
//! Suitable for piping and for terminals where the full-screen watch view
//! is unavailable. Exit status reflects the job outcome: nonzero when the
//! job failed, the stream was interrupted, or the stream closed before
//! `job_done`.

use std::io::{Stderr, Stdout, Write, stderr, stdout};

use anyhow::{Context, Result, bail};
use futures_util::StreamExt;
use gradex_core::api::client::GradingClient;
use gradex_core::config::Config;
use gradex_core::job::{self, JobState, JobView};
use gradex_types::{JobEvent, ReceivedEvent};
use tracing::warn;

pub async fn run(config: &Config, job_id: &str) -> Result<()> {
    let client = GradingClient::new(config)?;
    let mut renderer = TailRenderer::new();

    renderer.notice(&format!("Tailing job {} on {}", job_id, client.base_url()));

    let mut stream = client
        .open_event_stream(job_id)
        .await
        .with_context(|| format!("open event stream for job {job_id}"))?;

    let mut state = JobState::default();
    let mut transport_failure = None;

    while let Some(item) = stream.next().await {
        match item {
            Ok(received) => {
                // Capture before folding: an error event itself must still
                // print, only events after it are suppressed.
                let was_fatal = state.fatal_error.is_some();
                job::fold(&mut state, &received);
                renderer.handle_event(&received, was_fatal);
            }
            Err(e) if e.is_connectivity() => {
                renderer.notice(&format!("Connection lost: {e}"));
                transport_failure = Some(e);
                break;
            }
            Err(e) => {
                // Malformed frame; the subscription itself is still good.
                warn!(job_id = %job_id, error = %e, "Dropped malformed job event");
            }
        }
    }

    renderer.finish(&state);

    if let Some(e) = transport_failure {
        return Err(e).context("stream interrupted");
    }
    if let Some(message) = &state.fatal_error {
        bail!("job failed: {message}");
    }
    if !state.done {
        bail!("stream closed before the job finished");
    }
    Ok(())
}

/// Writes folded events as aligned plain-text lines.
struct TailRenderer {
    stdout: Stdout,
    stderr: Stderr,
}

impl TailRenderer {
    fn new() -> Self {
        Self {
            stdout: stdout(),
            stderr: stderr(),
        }
    }

    /// Status line on stderr, kept out of piped output.
    fn notice(&mut self, message: &str) {
        let _ = writeln!(self.stderr, "{message}");
    }

    /// Writes one line for the event. Events after a fatal error are
    /// folded but not shown.
    fn handle_event(&mut self, received: &ReceivedEvent, was_fatal: bool) {
        if was_fatal {
            return;
        }
        let stamp = &received.timestamp;
        match &received.event {
            JobEvent::JobStarted { total_questions } => {
                let _ = writeln!(
                    self.stdout,
                    "{stamp}  started  {total_questions} questions per student"
                );
            }
            JobEvent::PartialResult(result) => {
                let verifier = if result.verifier_status.valid {
                    "verified".to_string()
                } else if result.verifier_status.issues.is_empty() {
                    "flagged".to_string()
                } else {
                    format!("flagged: {}", result.verifier_status.issues.join("; "))
                };
                let _ = writeln!(
                    self.stdout,
                    "{stamp}  graded   {} {} {}/{} ({verifier})",
                    result.student_id, result.question_id, result.score, result.max_score
                );
            }
            JobEvent::StudentSummary(summary) => {
                let _ = writeln!(
                    self.stdout,
                    "{stamp}  summary  {} {}/{}",
                    summary.student_id, summary.total_score, summary.total_max_score
                );
            }
            JobEvent::JobDone { job_id } => {
                let _ = writeln!(self.stdout, "{stamp}  done     {job_id}");
            }
            JobEvent::Error { message } => {
                let _ = writeln!(self.stdout, "{stamp}  error    {message}");
            }
        }
        let _ = self.stdout.flush();
    }

    /// Closing per-student recap on stderr.
    fn finish(&mut self, state: &JobState) {
        match job::project(state) {
            JobView::Failed { message } => {
                let _ = writeln!(self.stderr, "Job failed: {message}");
            }
            JobView::Active {
                students,
                done,
                total_questions,
            } => {
                for student in &students {
                    let mut line = format!(
                        "{}  {}/{} graded",
                        student.student_id, student.progress.processed_count, total_questions
                    );
                    if let Some(summary) = student.summary {
                        line.push_str(&format!(
                            "  {}/{}",
                            summary.total_score, summary.total_max_score
                        ));
                    }
                    if student.progress.is_done {
                        line.push_str("  done");
                    }
                    let _ = writeln!(self.stderr, "{line}");
                }
                if done {
                    let _ = writeln!(self.stderr, "Job complete.");
                }
            }
        }
    }
}
