/// Result Aggregator - Pure Report Construction
///
/// **Critical Properties:**
/// - Knows nothing about rustc
/// - Knows nothing about child processes
/// - Knows nothing about the hint collaborator
/// - Pure function: outcomes -> report (no side effects, no I/O)
///
/// Deliberately trivial so it is fully unit-testable in isolation.
use crate::types::{TestOutcome, VerificationReport};

/// Reduce an ordered list of per-test outcomes into the final report.
///
/// Invariants upheld: `total_tests == passed_tests + failed_tests`;
/// `all_tests_passed` is true only when nothing failed and compilation
/// succeeded (this path implies compilation succeeded).
pub fn aggregate(outcomes: Vec<TestOutcome>) -> VerificationReport {
    let total_tests = outcomes.len();
    let passed_tests = outcomes.iter().filter(|o| o.passed).count();
    let failed_tests = total_tests - passed_tests;

    VerificationReport {
        all_tests_passed: failed_tests == 0,
        total_tests,
        passed_tests,
        failed_tests,
        outcomes,
        compilation_error: None,
    }
}

/// Report for a run that never got past compilation: no tests, no outcomes,
/// the rendered diagnostics as `compilation_error`.
pub fn compilation_failure(error: String) -> VerificationReport {
    VerificationReport {
        all_tests_passed: false,
        total_tests: 0,
        passed_tests: 0,
        failed_tests: 0,
        outcomes: Vec::new(),
        compilation_error: Some(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passed(name: &str) -> TestOutcome {
        TestOutcome::passed(name)
    }

    fn failed(name: &str, message: &str) -> TestOutcome {
        TestOutcome::failed(name, message)
    }

    #[test]
    fn all_pass() {
        let report = aggregate(vec![passed("a"), passed("b")]);

        assert!(report.all_tests_passed);
        assert_eq!(report.total_tests, 2);
        assert_eq!(report.passed_tests, 2);
        assert_eq!(report.failed_tests, 0);
        assert!(report.compilation_error.is_none());
    }

    #[test]
    fn partial_pass() {
        let report = aggregate(vec![
            passed("a"),
            failed("b", "assertion failed"),
            passed("c"),
        ]);

        assert!(!report.all_tests_passed);
        assert_eq!(report.total_tests, 3);
        assert_eq!(report.passed_tests, 2);
        assert_eq!(report.failed_tests, 1);
    }

    #[test]
    fn all_fail() {
        let report = aggregate(vec![failed("a", "boom"), failed("b", "boom")]);

        assert!(!report.all_tests_passed);
        assert_eq!(report.passed_tests, 0);
        assert_eq!(report.failed_tests, 2);
    }

    #[test]
    fn totals_invariant_holds() {
        let cases = vec![
            vec![],
            vec![passed("a")],
            vec![failed("a", "m")],
            vec![passed("a"), failed("b", "m"), passed("c"), failed("d", "m")],
        ];
        for outcomes in cases {
            let report = aggregate(outcomes);
            assert_eq!(
                report.total_tests,
                report.passed_tests + report.failed_tests
            );
            assert_eq!(
                report.all_tests_passed,
                report.failed_tests == 0 && report.compilation_error.is_none()
            );
        }
    }

    #[test]
    fn discovery_order_is_preserved() {
        let report = aggregate(vec![passed("first"), failed("second", "m"), passed("third")]);
        let names: Vec<&str> = report.outcomes.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[test]
    fn compilation_failure_has_no_outcomes() {
        let report = compilation_failure("line 3: mismatched types".to_string());

        assert!(!report.all_tests_passed);
        assert_eq!(report.total_tests, 0);
        assert_eq!(report.passed_tests, 0);
        assert_eq!(report.failed_tests, 0);
        assert!(report.outcomes.is_empty());
        assert_eq!(
            report.compilation_error.as_deref(),
            Some("line 3: mismatched types")
        );
    }

    #[test]
    fn hints_survive_aggregation() {
        let mut failing = failed("b", "assertion failed");
        failing.hint = Some("Check the accumulator's starting value.".to_string());

        let report = aggregate(vec![passed("a"), failing]);
        assert_eq!(
            report.outcomes[1].hint.as_deref(),
            Some("Check the accumulator's starting value.")
        );
    }
}
