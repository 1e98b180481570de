mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "mentor-cli")]
#[command(about = "Mentor CLI - Verify learner submissions against reference test suites", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify one submission against an exercise's reference tests
    Verify {
        /// Path to the learner's submission source
        #[arg(short, long)]
        submission: PathBuf,

        /// Path to the exercise's reference test source
        #[arg(short, long)]
        tests: PathBuf,

        /// Exercise identifier (also seeds the submission's crate name)
        #[arg(short, long)]
        exercise: String,

        /// Path to the problem statement, used as hint context
        #[arg(long)]
        statement: Option<PathBuf>,

        /// Base URL of the hint-generation service
        #[arg(long)]
        llm_url: Option<String>,

        /// Print the report as JSON instead of text
        #[arg(long, default_value = "false")]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Verify {
            submission,
            tests,
            exercise,
            statement,
            llm_url,
            json,
        } => {
            commands::verify(
                &submission,
                &tests,
                &exercise,
                statement.as_deref(),
                llm_url.as_deref(),
                json,
            )
            .await?;
        }
    }

    Ok(())
}
