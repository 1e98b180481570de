/// Integration tests for the end-to-end verification flow
///
/// These tests verify the full engine path against the real local rustc:
/// 1. Mixed pass/fail runs aggregate correctly and failing tests get hints
/// 2. Compilation failures short-circuit with a structured error
/// 3. A panic in one test leaves the other tests' results untouched
/// 4. Empty discovery and harness faults become synthetic failing outcomes
/// 5. Hung submissions are cut off by the per-test timeout
/// 6. Re-running an identical request reproduces the identical report
#[cfg(test)]
mod verification_scenarios {
    use std::path::Path;
    use std::time::Duration;

    use crate::config::EngineConfig;
    use crate::engine::VerificationEngine;
    use crate::hint::backend::testing::{ScriptedBackend, UnreachableBackend};
    use crate::runner::{TestRunner, HARNESS_FAULT_NAME, NO_TESTS_NAME};
    use crate::types::{TestOutcome, VerificationRequest};
    use crate::workspace::WorkspaceManager;

    const ENVELOPE: &str = "{\"problem\":\"The function ignores its input.\",\
         \"fix\":\"Accumulate the qualifying values instead of returning a constant.\",\
         \"snippet\":\"\"}";

    fn engine_with_scripted_hints() -> VerificationEngine<ScriptedBackend> {
        VerificationEngine::new(EngineConfig::default(), ScriptedBackend::always(ENVELOPE))
    }

    fn even_sum_request(submission: &str) -> VerificationRequest {
        VerificationRequest::new(
            "even-sum",
            submission,
            r#"use even_sum::sum;

#[test]
fn sums_even_values() {
    assert_eq!(12, sum(&[1, 2, 3, 4, 5, 6]));
}

#[test]
fn empty_slice_sums_to_zero() {
    assert_eq!(0, sum(&[]));
}

#[test]
fn odd_only_slice_sums_to_zero() {
    assert_eq!(0, sum(&[1, 3, 5]));
}
"#,
            "Return the sum of the even values in the slice.",
        )
    }

    fn outcome<'a>(outcomes: &'a [TestOutcome], name: &str) -> &'a TestOutcome {
        outcomes
            .iter()
            .find(|o| o.name == name)
            .unwrap_or_else(|| panic!("missing outcome for test '{}'", name))
    }

    /// Scenario: a constant-zero submission passes the two trivially-zero
    /// tests and fails the real one, with a hint attached to the failure.
    #[tokio::test]
    async fn constant_submission_yields_partial_pass_with_hint() {
        let engine = engine_with_scripted_hints();
        let request = even_sum_request("pub fn sum(_values: &[i32]) -> i32 {\n    0\n}\n");

        let report = engine.verify(&request).await.unwrap();

        assert_eq!(report.total_tests, 3);
        assert_eq!(report.passed_tests, 2);
        assert_eq!(report.failed_tests, 1);
        assert!(!report.all_tests_passed);
        assert!(report.compilation_error.is_none());

        let failing = outcome(&report.outcomes, "sums_even_values");
        assert!(!failing.passed);
        assert!(failing.failure_message.as_deref().unwrap().contains("assertion"));
        let hint = failing.hint.as_deref().unwrap();
        assert!(!hint.is_empty());
        assert!(hint.contains("Accumulate the qualifying values"));

        assert!(outcome(&report.outcomes, "empty_slice_sums_to_zero").passed);
        assert!(outcome(&report.outcomes, "odd_only_slice_sums_to_zero").passed);
    }

    /// Scenario: a correct submission passes everything; no hints anywhere.
    #[tokio::test]
    async fn correct_submission_passes_all_tests() {
        let engine = engine_with_scripted_hints();
        let request = even_sum_request(
            "pub fn sum(values: &[i32]) -> i32 {\n    values.iter().filter(|v| *v % 2 == 0).sum()\n}\n",
        );

        let report = engine.verify(&request).await.unwrap();

        assert!(report.all_tests_passed);
        assert_eq!(report.passed_tests, 3);
        assert_eq!(report.failed_tests, 0);
        assert!(report.outcomes.iter().all(|o| o.hint.is_none()));
    }

    /// Scenario: a submission with a syntax error never reaches the runner.
    #[tokio::test]
    async fn syntax_error_reports_compilation_failure() {
        let engine = engine_with_scripted_hints();
        let request = even_sum_request("pub fn sum(values: &[i32]) -> i32 {\n    values.iter(\n");

        let report = engine.verify(&request).await.unwrap();

        assert!(report.compilation_error.is_some());
        assert!(!report.all_tests_passed);
        assert_eq!(report.total_tests, 0);
        assert_eq!(report.passed_tests, 0);
        assert_eq!(report.failed_tests, 0);
        assert!(report.outcomes.is_empty());
    }

    /// Scenario: one test panics with a division by zero while the other
    /// two pass; the panic stays contained to its own outcome, and the
    /// fallback hint names the zero divisor when the collaborator is down.
    #[tokio::test]
    async fn panic_in_one_test_leaves_others_unaffected() {
        let engine: VerificationEngine<UnreachableBackend> =
            VerificationEngine::new(EngineConfig::default(), UnreachableBackend);
        let request = VerificationRequest::new(
            "integer-quotient",
            "pub fn quotient(a: i32, b: i32) -> i32 {\n    a / b\n}\n",
            r#"use integer_quotient::quotient;

#[test]
fn halves() {
    assert_eq!(5, quotient(10, 2));
}

#[test]
fn thirds() {
    assert_eq!(3, quotient(9, 3));
}

#[test]
fn zero_divisor_yields_zero() {
    assert_eq!(0, quotient(1, 0));
}
"#,
            "Divide a by b, returning 0 for a zero divisor.",
        );

        let report = engine.verify(&request).await.unwrap();

        assert_eq!(report.total_tests, 3);
        assert_eq!(report.passed_tests, 2);
        assert_eq!(report.failed_tests, 1);

        let failing = outcome(&report.outcomes, "zero_divisor_yields_zero");
        assert!(failing
            .failure_message
            .as_deref()
            .unwrap()
            .contains("divide by zero"));
        assert!(failing.hint.as_deref().unwrap().contains("zero divisor"));

        assert!(outcome(&report.outcomes, "halves").passed);
        assert!(outcome(&report.outcomes, "thirds").passed);
    }

    /// Scenario: the reference source compiles but declares no tests at
    /// all; the report carries one synthetic failing outcome instead of a
    /// silent all-green.
    #[tokio::test]
    async fn empty_discovery_becomes_synthetic_failure() {
        let engine = engine_with_scripted_hints();
        let request = VerificationRequest::new(
            "even-sum",
            "pub fn sum(_values: &[i32]) -> i32 {\n    0\n}\n",
            "pub fn not_a_test() -> i32 {\n    1\n}\n",
            "Return the sum of the even values in the slice.",
        );

        let report = engine.verify(&request).await.unwrap();

        assert_eq!(report.total_tests, 1);
        assert_eq!(report.failed_tests, 1);
        assert!(!report.all_tests_passed);
        assert_eq!(report.outcomes[0].name, NO_TESTS_NAME);
        assert!(report.outcomes[0]
            .failure_message
            .as_deref()
            .unwrap()
            .contains("#[test]"));
        // The synthetic outcome keeps its preset hint; the collaborator is
        // never consulted for it.
        assert!(report.outcomes[0]
            .hint
            .as_deref()
            .unwrap()
            .contains("annotated with #[test]"));
    }

    /// A suite binary that cannot even start is a harness fault, reported
    /// as a synthetic outcome rather than an error.
    #[tokio::test]
    async fn unlaunchable_suite_is_a_harness_fault() {
        let manager = WorkspaceManager::default();
        let ws = manager.acquire().unwrap();
        let runner = TestRunner::new(Duration::from_millis(2_000));

        let outcomes = runner.run(Path::new("/nonexistent/suite-binary"), &ws).await;

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].name, HARNESS_FAULT_NAME);
        assert!(!outcomes[0].passed);
    }

    /// Scenario: a submission that never returns is cut off by the
    /// per-test timeout and reported as a failing outcome.
    #[tokio::test]
    async fn hung_test_is_cut_off_by_timeout() {
        let config = EngineConfig {
            test_timeout_ms: 800,
            ..EngineConfig::default()
        };
        let engine = VerificationEngine::new(config, UnreachableBackend);
        let request = VerificationRequest::new(
            "spin",
            "pub fn spin() -> u64 {\n    let mut x: u64 = 0;\n    while x != u64::MAX {\n        x = x.wrapping_add(1);\n    }\n    x\n}\n",
            "use spin::spin;\n\n#[test]\nfn finishes() {\n    assert_eq!(u64::MAX, spin());\n}\n",
            "Spin until done.",
        );

        let report = engine.verify(&request).await.unwrap();

        assert_eq!(report.total_tests, 1);
        assert_eq!(report.failed_tests, 1);
        let failing = &report.outcomes[0];
        assert!(failing
            .failure_message
            .as_deref()
            .unwrap()
            .contains("timed out"));
        assert!(failing.hint.as_deref().unwrap().contains("out of time"));
    }

    /// Re-running the identical request yields the identical report when
    /// the hint source is deterministic.
    #[tokio::test]
    async fn identical_requests_reproduce_identical_reports() {
        let engine = engine_with_scripted_hints();
        let request = even_sum_request("pub fn sum(_values: &[i32]) -> i32 {\n    0\n}\n");

        let first = engine.verify(&request).await.unwrap();
        let second = engine.verify(&request).await.unwrap();

        assert_eq!(first, second);
    }
}
