//! Ask command: one-shot follow-up question about a graded answer.
//!
//! Prints the answer to stdout. A grading-service failure still prints the
//! fallback line and exits zero; only local rejections (blank query) fail.

use anyhow::Result;
use gradex_core::api::client::GradingClient;
use gradex_core::config::Config;
use gradex_core::job::{AskRejected, FollowUpSession, QuestionRef};

pub async fn run(
    config: &Config,
    job_id: String,
    student_id: String,
    question_id: String,
    query: &str,
) -> Result<()> {
    let client = GradingClient::new(config)?;

    let context = QuestionRef {
        job_id,
        student_id,
        question_id,
    };
    let mut session = FollowUpSession::new(context);

    match session.ask(&client, query).await {
        Ok(()) => {}
        Err(AskRejected::Empty) => anyhow::bail!("query must not be empty"),
        Err(AskRejected::Busy) => anyhow::bail!("a follow-up request is already in flight"),
    }

    if let Some(answer) = session.last_answer() {
        println!("{answer}");
    }
    Ok(())
}
