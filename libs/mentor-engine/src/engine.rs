/// Verification Engine - High-Level Orchestration
///
/// **Responsibility:**
/// Coordinate workspace, compiler, runner, and hint pipeline to turn one
/// verification request into one report.
///
/// This module is the glue layer - it knows nothing about:
/// - How code compiles or executes (compiler's and runner's job)
/// - How totals are computed (aggregator's job)
/// - How hints are produced (hint pipeline's job)
///
/// **Failure contract:**
/// Nothing that is a property of the submission propagates as an error:
/// toolchain problems, compile errors, empty discovery, harness faults,
/// test failures, and hint failures all have a structured place inside the
/// report. The only `Err` this facade returns is workspace allocation
/// failure - a genuine infrastructure fault.
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::compiler::{CompileResult, CompilerAdapter};
use crate::config::EngineConfig;
use crate::hint::backend::HintBackend;
use crate::hint::HintPipeline;
use crate::report;
use crate::runner::TestRunner;
use crate::types::{VerificationReport, VerificationRequest};
use crate::workspace::{Workspace, WorkspaceManager};

pub struct VerificationEngine<B> {
    workspaces: WorkspaceManager,
    compiler: CompilerAdapter,
    runner: TestRunner,
    hints: HintPipeline<B>,
}

impl<B: HintBackend> VerificationEngine<B> {
    pub fn new(config: EngineConfig, backend: B) -> Self {
        Self {
            workspaces: WorkspaceManager::new(config.workspace_root.clone()),
            compiler: CompilerAdapter::new(Duration::from_millis(config.compile_timeout_ms)),
            runner: TestRunner::new(Duration::from_millis(config.test_timeout_ms)),
            hints: HintPipeline::new(
                backend,
                config.hint_max_attempts,
                config.hint_max_concurrent,
            ),
        }
    }

    /// Run one complete verification: compile, execute, hint, aggregate.
    /// The workspace is torn down on every path (explicit release plus a
    /// Drop backstop for panics).
    pub async fn verify(&self, request: &VerificationRequest) -> Result<VerificationReport> {
        info!(
            exercise_id = %request.exercise_id,
            submission_bytes = request.submission_source.len(),
            "Starting verification run"
        );
        let start = Instant::now();

        let mut workspace = self
            .workspaces
            .acquire()
            .context("failed to allocate verification workspace")?;

        let report = self.run_inner(request, &workspace).await;
        workspace.release();

        info!(
            exercise_id = %request.exercise_id,
            total = report.total_tests,
            passed = report.passed_tests,
            failed = report.failed_tests,
            compilation_failed = report.compilation_error.is_some(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Verification run completed"
        );
        Ok(report)
    }

    async fn run_inner(
        &self,
        request: &VerificationRequest,
        workspace: &Workspace,
    ) -> VerificationReport {
        match self.compiler.compile(request, workspace).await {
            CompileResult::Rejected(outcome) => {
                warn!(
                    exercise_id = %request.exercise_id,
                    diagnostics = outcome.diagnostics.len(),
                    "Compilation rejected submission"
                );
                report::compilation_failure(outcome.render_errors())
            }
            CompileResult::Artifact { suite, outcome } => {
                if !outcome.diagnostics.is_empty() {
                    info!(
                        exercise_id = %request.exercise_id,
                        warnings = outcome.diagnostics.len(),
                        "Compiled with warnings"
                    );
                }
                let mut outcomes = self.runner.run(&suite, workspace).await;
                self.hints.annotate(request, &mut outcomes).await;
                report::aggregate(outcomes)
            }
        }
    }
}
