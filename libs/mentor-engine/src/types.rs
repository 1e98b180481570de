use serde::{Deserialize, Serialize};

/// One verification run's input: a learner submission paired with the
/// exercise's reference test suite.
///
/// Constructed once per run and treated as immutable afterwards; every
/// component borrows it read-only.
#[derive(Debug, Clone)]
pub struct VerificationRequest {
    pub exercise_id: String,
    pub submission_source: String,
    pub reference_test_source: String,
    pub problem_statement: String,
}

impl VerificationRequest {
    pub fn new(
        exercise_id: impl Into<String>,
        submission_source: impl Into<String>,
        reference_test_source: impl Into<String>,
        problem_statement: impl Into<String>,
    ) -> Self {
        Self {
            exercise_id: exercise_id.into(),
            submission_source: submission_source.into(),
            reference_test_source: reference_test_source.into(),
            problem_statement: problem_statement.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Note,
}

/// A single compiler diagnostic. `line` is 0 when the compiler reported no
/// usable location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub message: String,
    pub line: u32,
    pub severity: Severity,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>, line: u32) -> Self {
        Self {
            message: message.into(),
            line,
            severity: Severity::Error,
        }
    }
}

/// Result of compiling one submission against its reference tests.
///
/// `success = false` means no test is ever run for this submission.
/// A successful outcome may still carry warning diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompilationOutcome {
    pub success: bool,
    pub diagnostics: Vec<Diagnostic>,
}

impl CompilationOutcome {
    pub fn success(diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            success: true,
            diagnostics,
        }
    }

    pub fn failure(diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            success: false,
            diagnostics,
        }
    }

    /// Render the error diagnostics into the single `compilation_error`
    /// string carried by the report, one `line N: message` entry per line.
    pub fn render_errors(&self) -> String {
        let mut out = String::from("Compilation failed:\n");
        for diag in self
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
        {
            out.push_str(&format!("line {}: {}\n", diag.line, diag.message));
        }
        out.trim_end().to_string()
    }
}

/// A discovered test identity. Ordering is discovery order and is stable
/// within one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub name: String,
}

/// Outcome of one executed (or synthetic) test. `hint` is populated only
/// for failing outcomes, by the hint pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestOutcome {
    pub name: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl TestOutcome {
    pub fn passed(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: true,
            failure_message: None,
            hint: None,
        }
    }

    pub fn failed(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: false,
            failure_message: Some(message.into()),
            hint: None,
        }
    }
}

/// The final structured report for one verification run.
///
/// Invariants: `total_tests == passed_tests + failed_tests`, and a non-null
/// `compilation_error` implies `total_tests == 0` with empty `outcomes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub all_tests_passed: bool,
    pub total_tests: usize,
    pub passed_tests: usize,
    pub failed_tests: usize,
    pub outcomes: Vec<TestOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compilation_error: Option<String>,
}
