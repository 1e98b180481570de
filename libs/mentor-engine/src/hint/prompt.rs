/// Prompt Construction - Bounded, Structured Hint Requests
///
/// One prompt per failing test. The prompt is bounded (the context bundle is
/// already truncated) and instructs the collaborator to answer with exactly
/// one single-line JSON envelope and no code vocabulary - the validator in
/// `envelope.rs` enforces the same rules on the way back.
use super::context::HintContext;

/// Token budget handed to the collaborator per hint call.
pub const HINT_MAX_TOKENS: u32 = 300;

pub fn build_prompt(ctx: &HintContext) -> String {
    let mut prompt = String::new();

    prompt.push_str(
        "You are a programming tutor reviewing a student's Rust submission. \
         Analyze the code and produce one LOGICAL, ACTIONABLE hint.\n\n",
    );

    prompt.push_str("=== EXERCISE ===\n");
    prompt.push_str(&ctx.exercise_context);
    prompt.push_str("\n\n");

    prompt.push_str("=== STUDENT CODE (excerpt) ===\n");
    prompt.push_str(&ctx.submission_excerpt);
    prompt.push_str("\n\n");

    prompt.push_str("=== FAILURE ===\n");
    prompt.push_str(&format!("Test: {}\n", ctx.test_name));
    prompt.push_str(&format!(
        "Error: {}\n",
        ctx.failure_message.as_deref().unwrap_or("the test fails")
    ));
    if let Some(expectation) = &ctx.expectation {
        prompt.push_str(&format!("Expected: {}\n", expectation));
    }
    if let Some(issue) = &ctx.logic_issue {
        prompt.push_str(&format!("Detected issue: {}\n", issue));
    }
    prompt.push('\n');

    prompt.push_str("=== REFERENCE TEST (excerpt) ===\n");
    prompt.push_str(&ctx.reference_excerpt);
    prompt.push_str("\n\n");

    prompt.push_str(
        "=== STRICT INSTRUCTIONS ===\n\
         1. Identify the SPECIFIC problem in the code, not just \"it does not work\".\n\
         2. Say CONCRETELY how to approach the fix: which value, condition, or loop to reconsider.\n\
         3. Respond with EXACTLY ONE JSON object on a SINGLE line, and nothing else:\n\
            {\"problem\": \"...\", \"fix\": \"...\", \"snippet\": \"\"}\n\
         4. \"snippet\" may stay empty; if used it must be at most 3 short lines.\n\
         5. NEVER include import or package lines, attribute annotations, test-framework \
         vocabulary, or markdown fences in any field.\n\
         6. Do not emit more than one object and do not wrap the object in commentary.\n\n\
         JSON:",
    );

    prompt
}
