// CLI commands for running verifications from the shell
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use mentor_engine::{
    EngineConfig, LlamaBackend, LlamaConfig, VerificationEngine, VerificationReport,
    VerificationRequest,
};

/// Run one verification from files on disk and print the report.
pub async fn verify(
    submission: &Path,
    tests: &Path,
    exercise: &str,
    statement: Option<&Path>,
    llm_url: Option<&str>,
    json: bool,
) -> Result<()> {
    let submission_source = fs::read_to_string(submission)
        .with_context(|| format!("failed to read submission {}", submission.display()))?;
    let reference_test_source = fs::read_to_string(tests)
        .with_context(|| format!("failed to read reference tests {}", tests.display()))?;
    let problem_statement = match statement {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read problem statement {}", path.display()))?,
        None => String::new(),
    };

    let mut llama_config = LlamaConfig::from_env();
    if let Some(url) = llm_url {
        llama_config.base_url = url.trim_end_matches('/').to_string();
    }

    let engine = VerificationEngine::new(
        EngineConfig::from_env(),
        LlamaBackend::new(llama_config),
    );

    let request = VerificationRequest::new(
        exercise,
        submission_source,
        reference_test_source,
        problem_statement,
    );

    let report = engine.verify(&request).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(exercise, &report);
    }

    // Non-zero exit when the submission does not pass, so the CLI is usable
    // from scripts.
    if !report.all_tests_passed {
        std::process::exit(1);
    }
    Ok(())
}

fn print_report(exercise: &str, report: &VerificationReport) {
    println!("→ Verification report for exercise '{}'", exercise);
    println!();

    if let Some(error) = &report.compilation_error {
        println!("  ✗ Submission did not compile");
        for line in error.lines() {
            println!("    {}", line);
        }
        return;
    }

    for outcome in &report.outcomes {
        if outcome.passed {
            println!("  ✓ {}", outcome.name);
        } else {
            println!("  ✗ {}", outcome.name);
            if let Some(message) = &outcome.failure_message {
                println!("    {}", message.lines().next().unwrap_or(""));
            }
            if let Some(hint) = &outcome.hint {
                for line in hint.lines() {
                    println!("    hint: {}", line);
                }
            }
        }
    }

    println!();
    println!(
        "→ {} of {} tests passed{}",
        report.passed_tests,
        report.total_tests,
        if report.all_tests_passed { " ✓" } else { "" }
    );
}
