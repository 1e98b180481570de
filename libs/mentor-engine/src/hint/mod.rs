/// Hint Pipeline - From Failing Test to Safe, Bounded Hint
///
/// **Core Responsibility:**
/// Turn each failing test outcome into a short, code-free, human-readable
/// hint without ever letting a hint failure escape into the verification
/// result.
///
/// **Per-failure algorithm:**
/// 1. Focus the submission down to the material the failure is about
///    (context.rs)
/// 2. Build a bounded, structured prompt (prompt.rs)
/// 3. Call the collaborator and extract/validate one JSON envelope
///    (backend.rs, envelope.rs)
/// 4. Retry a bounded number of times with the unchanged prompt
/// 5. Fall back to a canned, failure-keyed explanation (fallback.rs)
///
/// Hints for different failing tests run concurrently behind a bounded
/// semaphore; results are written back by index so the report keeps
/// discovery order.
pub mod backend;
pub mod context;
pub mod envelope;
pub mod fallback;
pub mod prompt;

use std::sync::Arc;

use futures_util::future::join_all;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::types::{TestOutcome, VerificationRequest};
use backend::HintBackend;
use context::HintContext;

pub struct HintPipeline<B> {
    backend: B,
    max_attempts: u32,
    max_concurrent: usize,
}

impl<B: HintBackend> HintPipeline<B> {
    pub fn new(backend: B, max_attempts: u32, max_concurrent: usize) -> Self {
        Self {
            backend,
            max_attempts: max_attempts.max(1),
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Populate `hint` on every failing outcome. Passing outcomes and
    /// synthetic outcomes that already carry a preset hint are left
    /// untouched. This never fails: a hint that cannot be generated
    /// degrades to the canned fallback.
    pub async fn annotate(&self, request: &VerificationRequest, outcomes: &mut [TestOutcome]) {
        let work: Vec<(usize, HintContext)> = outcomes
            .iter()
            .enumerate()
            .filter(|(_, o)| !o.passed && o.hint.is_none())
            .map(|(idx, o)| (idx, context::build_context(request, o)))
            .collect();

        if work.is_empty() {
            return;
        }

        info!(failing = work.len(), "Generating hints for failing tests");

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let jobs = work.into_iter().map(|(idx, ctx)| {
            let semaphore = Arc::clone(&semaphore);
            async move {
                let _permit = semaphore.acquire().await.ok();
                (idx, self.hint_for(&ctx).await)
            }
        });

        for (idx, hint) in join_all(jobs).await {
            outcomes[idx].hint = Some(hint);
        }
    }

    /// One hint, with bounded retry and guaranteed fallback.
    async fn hint_for(&self, ctx: &HintContext) -> String {
        let prompt = prompt::build_prompt(ctx);

        for attempt in 1..=self.max_attempts {
            match self.backend.generate(&prompt, prompt::HINT_MAX_TOKENS).await {
                Ok(raw) => {
                    if let Some(env) = envelope::parse_envelope(&raw) {
                        debug!(test = %ctx.test_name, attempt, "Hint envelope accepted");
                        return envelope::render(&env);
                    }
                    warn!(
                        test = %ctx.test_name,
                        attempt,
                        "Hint response rejected (malformed or leaking)"
                    );
                }
                Err(e) => {
                    warn!(test = %ctx.test_name, attempt, error = %e, "Hint backend call failed");
                }
            }
        }

        debug!(test = %ctx.test_name, "Using canned fallback hint");
        fallback::canned_hint(ctx.failure_message.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::backend::testing::{ScriptedBackend, UnreachableBackend};
    use super::*;

    const GOOD_ENVELOPE: &str = "{\"problem\":\"The sum never accumulates anything.\",\
         \"fix\":\"Add each even value to the running total inside the loop.\",\
         \"snippet\":\"\"}";

    fn request() -> VerificationRequest {
        VerificationRequest::new(
            "even-sum",
            "pub fn sum(_values: &[i32]) -> i32 {\n    0\n}",
            "use even_sum::sum;\n#[test]\nfn basic() { assert_eq!(12, sum(&[1, 2, 3, 4, 5, 6])); }",
            "Sum the even values of a slice.",
        )
    }

    fn outcomes() -> Vec<TestOutcome> {
        vec![
            TestOutcome::passed("edge"),
            TestOutcome::failed("basic", "assertion `left == right` failed"),
        ]
    }

    #[tokio::test]
    async fn failing_outcome_gets_rendered_envelope() {
        let pipeline = HintPipeline::new(ScriptedBackend::always(GOOD_ENVELOPE), 2, 3);
        let request = request();
        let mut outcomes = outcomes();

        pipeline.annotate(&request, &mut outcomes).await;

        assert!(outcomes[0].hint.is_none(), "passing outcome must stay untouched");
        let hint = outcomes[1].hint.as_deref().unwrap();
        assert!(hint.starts_with("The sum never accumulates anything."));
        assert!(hint.contains("running total"));
    }

    #[tokio::test]
    async fn malformed_first_attempt_is_retried() {
        let pipeline = HintPipeline::new(
            ScriptedBackend::new(&["no json in sight", GOOD_ENVELOPE]),
            2,
            3,
        );
        let request = request();
        let mut outcomes = outcomes();

        pipeline.annotate(&request, &mut outcomes).await;

        assert!(outcomes[1]
            .hint
            .as_deref()
            .unwrap()
            .starts_with("The sum never accumulates anything."));
    }

    #[tokio::test]
    async fn exhausted_retries_fall_back_to_canned_hint() {
        let pipeline = HintPipeline::new(
            ScriptedBackend::always("still not an envelope"),
            2,
            3,
        );
        let request = request();
        let mut outcomes = outcomes();

        pipeline.annotate(&request, &mut outcomes).await;

        let hint = outcomes[1].hint.as_deref().unwrap();
        assert!(hint.contains("does not match what the test expects"));
    }

    #[tokio::test]
    async fn unreachable_backend_falls_back_to_canned_hint() {
        let pipeline = HintPipeline::new(UnreachableBackend, 2, 3);
        let request = request();
        let mut outcomes = vec![TestOutcome::failed(
            "divides",
            "attempt to divide by zero",
        )];

        pipeline.annotate(&request, &mut outcomes).await;

        let hint = outcomes[0].hint.as_deref().unwrap();
        assert!(hint.contains("zero divisor"));
    }

    #[tokio::test]
    async fn leaking_envelope_is_rejected_then_falls_back() {
        let leaking = "{\"problem\":\"The helper is missing from the build.\",\
             \"fix\":\"Write import java.util.List; before the class body.\"}";
        let pipeline = HintPipeline::new(ScriptedBackend::always(leaking), 2, 3);
        let request = request();
        let mut outcomes = outcomes();

        pipeline.annotate(&request, &mut outcomes).await;

        let hint = outcomes[1].hint.as_deref().unwrap();
        assert!(!hint.contains("import "));
    }

    #[tokio::test]
    async fn all_failing_outcomes_are_annotated_in_order() {
        let pipeline = HintPipeline::new(ScriptedBackend::always(GOOD_ENVELOPE), 2, 2);
        let request = request();
        let mut outcomes = vec![
            TestOutcome::failed("a", "assertion failed"),
            TestOutcome::passed("b"),
            TestOutcome::failed("c", "assertion failed"),
            TestOutcome::failed("d", "assertion failed"),
        ];

        pipeline.annotate(&request, &mut outcomes).await;

        let names: Vec<&str> = outcomes.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c", "d"]);
        assert!(outcomes[0].hint.is_some());
        assert!(outcomes[1].hint.is_none());
        assert!(outcomes[2].hint.is_some());
        assert!(outcomes[3].hint.is_some());
    }
}
