/// Test Runner - Out-of-Process Suite Execution
///
/// **Core Responsibility:**
/// Discover the tests inside a compiled suite binary and execute them one at
/// a time, each in its own child process, capturing pass/fail and failure
/// detail.
///
/// **Isolation model:**
/// - Discovery and every test execution are separate invocations of the
///   suite binary; a panic, abort, or hang in one test cannot disturb any
///   other test or the engine itself.
/// - Nothing is cached between runs: each run gets a freshly compiled
///   binary in its own workspace.
///
/// **Failure classification:**
/// - Zero discovered tests is NOT "0 failures" - it becomes a single
///   synthetic failing outcome so the report stays honest.
/// - A fault in the harness itself (binary won't start, unparseable
///   discovery output) also becomes a synthetic failing outcome rather than
///   an error.
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::types::{TestCase, TestOutcome};
use crate::workspace::Workspace;

/// Name used for the synthetic outcome emitted when discovery finds nothing.
pub const NO_TESTS_NAME: &str = "no tests found";

/// Name used for the synthetic outcome emitted on a harness-level fault.
pub const HARNESS_FAULT_NAME: &str = "test harness fault";

/// Explicit discovery result, so every caller path handles the empty and
/// fault cases instead of special-casing exceptions.
enum Discovery {
    Found(Vec<TestCase>),
    Empty,
    Fault(String),
}

pub struct TestRunner {
    test_timeout: Duration,
}

impl TestRunner {
    pub fn new(test_timeout: Duration) -> Self {
        Self { test_timeout }
    }

    /// Discover and execute every test in the suite binary, sequentially,
    /// returning outcomes in discovery order.
    pub async fn run(&self, suite: &Path, ws: &Workspace) -> Vec<TestOutcome> {
        let cases = match self.discover(suite, ws).await {
            Discovery::Found(cases) => cases,
            Discovery::Empty => {
                warn!("No tests discovered in suite binary");
                let mut outcome = TestOutcome::failed(
                    NO_TESTS_NAME,
                    "No tests were discovered in the reference test suite. \
                     Check that the test functions are annotated with #[test].",
                );
                outcome.hint = Some(
                    "Make sure the reference suite contains functions annotated with #[test]."
                        .to_string(),
                );
                return vec![outcome];
            }
            Discovery::Fault(detail) => {
                warn!(detail = %detail, "Test discovery failed");
                let mut outcome = TestOutcome::failed(
                    HARNESS_FAULT_NAME,
                    format!("The test harness failed before any test could run: {}", detail),
                );
                outcome.hint =
                    Some("Check that your code does not fail at load time.".to_string());
                return vec![outcome];
            }
        };

        info!(test_count = cases.len(), "Executing test cases");

        let mut outcomes = Vec::with_capacity(cases.len());
        for case in &cases {
            let outcome = self.execute_one(suite, ws, &case.name).await;
            debug!(
                test = %case.name,
                passed = outcome.passed,
                "Test executed"
            );
            outcomes.push(outcome);
        }
        outcomes
    }

    /// List the suite's tests via the harness's own `--list` protocol
    /// (one `name: test` record per line).
    async fn discover(&self, suite: &Path, ws: &Workspace) -> Discovery {
        let spawned = Command::new(suite)
            .args(["--list", "--format", "terse"])
            .current_dir(ws.dir())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.test_timeout, spawned).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Discovery::Fault(format!("failed to launch suite binary: {}", e)),
            Err(_) => {
                return Discovery::Fault(format!(
                    "test discovery timed out after {}ms",
                    self.test_timeout.as_millis()
                ))
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = stderr.lines().next().unwrap_or("suite binary exited abnormally");
            return Discovery::Fault(detail.to_string());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let cases = parse_test_list(&stdout);
        if cases.is_empty() {
            Discovery::Empty
        } else {
            Discovery::Found(cases)
        }
    }

    /// Execute a single test in its own child process with a hard timeout.
    async fn execute_one(&self, suite: &Path, ws: &Workspace, name: &str) -> TestOutcome {
        let spawned = Command::new(suite)
            .arg(name)
            .args(["--exact", "--test-threads", "1", "--nocapture"])
            .current_dir(ws.dir())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.test_timeout, spawned).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return TestOutcome::failed(name, format!("failed to launch test process: {}", e));
            }
            Err(_) => {
                warn!(test = %name, timeout_ms = self.test_timeout.as_millis() as u64, "Test timed out");
                return TestOutcome::failed(
                    name,
                    format!("test timed out after {}ms", self.test_timeout.as_millis()),
                );
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if output.status.success() {
            if stdout.contains("running 0 tests") {
                // Discovered a moment ago but gone now - a harness fault
                // attributed to this test rather than a pass.
                return TestOutcome::failed(
                    name,
                    "test disappeared between discovery and execution",
                );
            }
            return TestOutcome::passed(name);
        }

        TestOutcome::failed(name, failure_detail(name, &stderr, output.status))
    }
}

fn parse_test_list(stdout: &str) -> Vec<TestCase> {
    stdout
        .lines()
        .filter_map(|line| line.trim().strip_suffix(": test"))
        .filter(|name| !name.is_empty())
        .map(|name| TestCase {
            name: name.to_string(),
        })
        .collect()
}

/// Distill a failing child's output into a single failure message, in order
/// of preference: panic detail, first stderr line, termination signal, exit
/// status.
fn failure_detail(name: &str, stderr: &str, status: std::process::ExitStatus) -> String {
    if let Some(message) = panic_message(stderr) {
        return message;
    }
    if let Some(line) = stderr
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with("note:"))
    {
        return line.to_string();
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return format!("test process terminated by signal {}", signal);
        }
    }
    match status.code() {
        Some(code) => format!("test '{}' failed with exit code {}", name, code),
        None => format!("test '{}' failed with unknown exit status", name),
    }
}

/// Extract the panic detail that libtest prints to stderr under
/// `--nocapture`:
///
/// ```text
/// thread 'basic' panicked at tests.rs:3:5:
/// assertion `left == right` failed
///   left: 12
///  right: 0
/// ```
fn panic_message(stderr: &str) -> Option<String> {
    let lines: Vec<&str> = stderr.lines().collect();
    let header = lines
        .iter()
        .rposition(|l| l.starts_with("thread '") && l.contains("panicked at"))?;

    let mut detail = Vec::new();
    for line in lines.iter().skip(header + 1) {
        if line.trim().is_empty() || line.starts_with("note: run with") {
            break;
        }
        detail.push(*line);
        if detail.len() == 4 {
            break;
        }
    }

    if detail.is_empty() {
        // Single-line panic format: the message is embedded in the header.
        return Some(lines[header].to_string());
    }
    Some(detail.join("\n").trim().to_string())
}
