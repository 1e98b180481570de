/// Compiler Adapter - rustc Invocation and Diagnostic Capture
///
/// **Core Responsibility:**
/// Materialize the submission and the reference test source in the
/// workspace, compile them, and either hand back a runnable suite binary or
/// a structured list of diagnostics.
///
/// **Compilation model:**
/// 1. The submission builds as an rlib (`rustc --crate-type lib`). Its crate
///    name comes from the submission's own `#![crate_name = "..."]` if
///    declared, else from a sanitized form of the exercise id. Diagnostics
///    always use the name as compiled.
/// 2. The reference tests build as a libtest harness binary
///    (`rustc --test`) linked against that rlib. The binary is the suite
///    artifact the Test Runner executes out of process.
///
/// Every failure mode here - missing toolchain, syntax errors, compile
/// timeout, oversized input - is expressed as diagnostics, never as a
/// propagated error.
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::types::{CompilationOutcome, Diagnostic, Severity, VerificationRequest};
use crate::workspace::Workspace;

/// Safety limits to prevent pathological inputs from reaching the toolchain
pub const MAX_SOURCE_BYTES: usize = 1024 * 1024; // 1MB

const SUBMISSION_FILE: &str = "submission.rs";
const TESTS_FILE: &str = "tests.rs";
const SUITE_BINARY: &str = "suite";

const TOOLCHAIN_UNAVAILABLE: &str =
    "Rust toolchain unavailable: `rustc` was not found on this host";

/// Result of one compilation: either a loadable suite binary (possibly with
/// warnings) or the diagnostics that rejected the submission.
#[derive(Debug)]
pub enum CompileResult {
    Artifact {
        suite: PathBuf,
        outcome: CompilationOutcome,
    },
    Rejected(CompilationOutcome),
}

pub struct CompilerAdapter {
    compile_timeout: Duration,
}

impl CompilerAdapter {
    pub fn new(compile_timeout: Duration) -> Self {
        Self { compile_timeout }
    }

    /// Compile the request's sources inside the workspace.
    pub async fn compile(&self, request: &VerificationRequest, ws: &Workspace) -> CompileResult {
        // GUARDRAIL: reject oversized inputs before spawning anything
        if request.submission_source.len() > MAX_SOURCE_BYTES {
            return CompileResult::Rejected(CompilationOutcome::failure(vec![Diagnostic::error(
                format!("submission exceeds maximum size of {} bytes", MAX_SOURCE_BYTES),
                0,
            )]));
        }
        if request.reference_test_source.len() > MAX_SOURCE_BYTES {
            return CompileResult::Rejected(CompilationOutcome::failure(vec![Diagnostic::error(
                format!(
                    "reference test source exceeds maximum size of {} bytes",
                    MAX_SOURCE_BYTES
                ),
                0,
            )]));
        }

        let declared = declared_crate_name(&request.submission_source);
        let explicit_name = declared.is_none();
        let crate_name =
            declared.unwrap_or_else(|| sanitize_crate_name(&request.exercise_id));

        let submission_path = ws.dir().join(SUBMISSION_FILE);
        let tests_path = ws.dir().join(TESTS_FILE);
        if let Err(e) = std::fs::write(&submission_path, &request.submission_source)
            .and_then(|_| std::fs::write(&tests_path, &request.reference_test_source))
        {
            return CompileResult::Rejected(CompilationOutcome::failure(vec![Diagnostic::error(
                format!("failed to materialize sources in workspace: {}", e),
                0,
            )]));
        }

        debug!(crate_name = %crate_name, "Compiling submission unit");

        // Unit 1: submission rlib
        let mut args: Vec<String> = vec![
            "--edition".into(),
            "2021".into(),
            "--crate-type".into(),
            "lib".into(),
            "--error-format".into(),
            "json".into(),
            "--out-dir".into(),
            ws.dir().display().to_string(),
        ];
        if explicit_name {
            args.push("--crate-name".into());
            args.push(crate_name.clone());
        }
        args.push(SUBMISSION_FILE.into());

        let submission_run = self.run_rustc(&args, ws).await;
        if !submission_run.succeeded {
            // The test unit would only produce "can't find crate" cascade
            // noise on top of these, so stop here.
            return CompileResult::Rejected(CompilationOutcome::failure(
                submission_run.diagnostics,
            ));
        }
        let mut diagnostics = submission_run.diagnostics;

        debug!(crate_name = %crate_name, "Compiling test harness unit");

        // Unit 2: test harness binary against the rlib
        let rlib = ws.dir().join(format!("lib{}.rlib", crate_name));
        let suite = ws.dir().join(SUITE_BINARY);
        let args: Vec<String> = vec![
            "--edition".into(),
            "2021".into(),
            "--test".into(),
            "--error-format".into(),
            "json".into(),
            "--extern".into(),
            format!("{}={}", crate_name, rlib.display()),
            "-o".into(),
            suite.display().to_string(),
            TESTS_FILE.into(),
        ];

        let tests_run = self.run_rustc(&args, ws).await;
        diagnostics.extend(tests_run.diagnostics);

        if tests_run.succeeded {
            CompileResult::Artifact {
                suite,
                outcome: CompilationOutcome::success(diagnostics),
            }
        } else {
            CompileResult::Rejected(CompilationOutcome::failure(diagnostics))
        }
    }

    /// Run one rustc invocation with a hard timeout, translating every
    /// failure shape into diagnostics.
    async fn run_rustc(&self, args: &[String], ws: &Workspace) -> RustcRun {
        let spawned = Command::new("rustc")
            .args(args)
            .current_dir(ws.dir())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.compile_timeout, spawned).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return RustcRun::failed(vec![Diagnostic::error(TOOLCHAIN_UNAVAILABLE, 0)]);
            }
            Ok(Err(e)) => {
                return RustcRun::failed(vec![Diagnostic::error(
                    format!("failed to invoke rustc: {}", e),
                    0,
                )]);
            }
            Err(_) => {
                warn!(timeout_ms = self.compile_timeout.as_millis() as u64, "Compilation timed out");
                return RustcRun::failed(vec![Diagnostic::error(
                    format!(
                        "compilation timed out after {}ms",
                        self.compile_timeout.as_millis()
                    ),
                    0,
                )]);
            }
        };

        let stderr = String::from_utf8_lossy(&output.stderr);
        let mut diagnostics = parse_rustc_diagnostics(&stderr);

        if !output.status.success()
            && !diagnostics.iter().any(|d| d.severity == Severity::Error)
        {
            // rustc failed without emitting structured errors (e.g. an ICE);
            // keep whatever text it produced so the caller sees something.
            let detail = stderr.lines().next().unwrap_or("rustc failed").to_string();
            diagnostics.push(Diagnostic::error(detail, 0));
        }

        RustcRun {
            succeeded: output.status.success(),
            diagnostics,
        }
    }
}

struct RustcRun {
    succeeded: bool,
    diagnostics: Vec<Diagnostic>,
}

impl RustcRun {
    fn failed(diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            succeeded: false,
            diagnostics,
        }
    }
}

#[derive(Deserialize)]
struct RustcMessage {
    message: String,
    level: String,
    #[serde(default)]
    spans: Vec<RustcSpan>,
}

#[derive(Deserialize)]
struct RustcSpan {
    line_start: u32,
    #[serde(default)]
    is_primary: bool,
}

/// Parse `--error-format=json` stderr (one JSON object per line) into
/// diagnostics. Summary lines ("aborting due to ...") are dropped; lines
/// that are not JSON are ignored.
fn parse_rustc_diagnostics(stderr: &str) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for line in stderr.lines() {
        let Ok(msg) = serde_json::from_str::<RustcMessage>(line) else {
            continue;
        };
        if msg.message.starts_with("aborting due to")
            || msg.message.starts_with("For more information")
        {
            continue;
        }
        let severity = match msg.level.as_str() {
            "error" | "error: internal compiler error" => Severity::Error,
            "warning" => Severity::Warning,
            _ => Severity::Note,
        };
        let line_no = msg
            .spans
            .iter()
            .find(|s| s.is_primary)
            .or_else(|| msg.spans.first())
            .map(|s| s.line_start)
            .unwrap_or(0);
        diagnostics.push(Diagnostic {
            message: msg.message,
            line: line_no,
            severity,
        });
    }
    diagnostics
}

/// Crate name the submission declares for itself, if any.
fn declared_crate_name(source: &str) -> Option<String> {
    for line in source.lines() {
        let trimmed = line.trim();
        if let Some(rest) = trimmed.strip_prefix("#![crate_name") {
            let open = rest.find('"')?;
            let rest = &rest[open + 1..];
            let close = rest.find('"')?;
            let name = &rest[..close];
            if is_valid_crate_name(name) {
                return Some(name.to_string());
            }
            return None;
        }
    }
    None
}

/// Reduce an arbitrary exercise identifier to a valid crate name.
/// `even-sum` becomes `even_sum`; anything unusable falls back to
/// `submission`.
fn sanitize_crate_name(raw: &str) -> String {
    let mut name: String = raw
        .to_lowercase()
        .chars()
        .map(|c| if c == '-' || c == ' ' { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();

    if name.chars().next().map_or(false, |c| c.is_ascii_digit()) {
        name = format!("exercise_{}", name);
    }
    if name.is_empty() || name.chars().all(|c| c == '_') {
        name = "submission".to_string();
    }
    name
}

fn is_valid_crate_name(name: &str) -> bool {
    !name.is_empty()
        && !name.chars().next().map_or(false, |c| c.is_ascii_digit())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
