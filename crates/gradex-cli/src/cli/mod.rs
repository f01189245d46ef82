//! CLI entry and dispatch.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use gradex_core::{config, logging};

mod commands;

#[derive(Parser)]
#[command(name = "gradex")]
#[command(version)]
#[command(about = "Live terminal view for grading jobs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Submit a grading job
    Submit {
        /// Answer key file (pdf, image, or plain text)
        #[arg(long = "answer-key", value_name = "FILE")]
        answer_key: PathBuf,

        /// Student answer sheets (one file per student)
        #[arg(value_name = "SHEETS", required = true)]
        sheets: Vec<PathBuf>,

        /// Watch the job live after submitting
        #[arg(long)]
        watch: bool,
    },

    /// Watch a job live (full-screen)
    Watch {
        /// The ID of the job to watch
        #[arg(value_name = "JOB_ID")]
        job_id: String,
    },

    /// Stream a job as plain lines (non-interactive)
    Tail {
        /// The ID of the job to tail
        #[arg(value_name = "JOB_ID")]
        job_id: String,
    },

    /// Ask a one-shot follow-up question about a graded answer
    Ask {
        #[arg(value_name = "JOB_ID")]
        job_id: String,
        #[arg(value_name = "STUDENT_ID")]
        student_id: String,
        #[arg(value_name = "QUESTION_ID")]
        question_id: String,
        /// The question to ask
        #[arg(value_name = "QUERY", required = true)]
        query: Vec<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    // File-only logging; stdout and the alternate screen belong to the views.
    let _log_guard = logging::init().context("init logging")?;

    let config = config::Config::load().context("load config")?;

    match cli.command {
        Commands::Submit {
            answer_key,
            sheets,
            watch,
        } => commands::submit::run(&config, &answer_key, &sheets, watch).await,

        Commands::Watch { job_id } => commands::watch::run(&config, job_id).await,

        Commands::Tail { job_id } => commands::tail::run(&config, &job_id).await,

        Commands::Ask {
            job_id,
            student_id,
            question_id,
            query,
        } => commands::ask::run(&config, job_id, student_id, question_id, &query.join(" ")).await,

        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
        },
    }
}
