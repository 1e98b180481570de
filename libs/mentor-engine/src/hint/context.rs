/// Context Focusing - Per-Failure Prompt Material
///
/// Builds the bounded bundle of text handed to the hint collaborator for one
/// failing test. The point of the focusing heuristics is to keep unrelated
/// submission code out of the prompt: only the first type declaration plus
/// the body of the function the failing test actually calls are sent, and
/// anything that cannot be focused is truncated instead.
use crate::types::{TestOutcome, VerificationRequest};

/// Ceiling on the submission excerpt; larger material is truncated.
pub const MAX_FOCUS_CHARS: usize = 2000;

/// Ceiling on the reference-test excerpt included for context.
pub const MAX_REFERENCE_CHARS: usize = 600;

/// Call names that never identify the function under test.
const CALL_DENYLIST: &[&str] = &[
    "assert",
    "assert_eq",
    "assert_ne",
    "panic",
    "matches",
    "vec",
    "format",
    "println",
    "print",
    "write",
    "writeln",
    "Some",
    "Ok",
    "Err",
    "from",
    "new",
    "clone",
    "into",
    "iter",
    "collect",
    "len",
    "unwrap",
    "expect",
    "to_string",
    "to_owned",
    "to_vec",
    "push",
    "insert",
    "get",
    "contains",
];

/// Everything the prompt builder needs for one failing test.
#[derive(Debug, Clone)]
pub struct HintContext {
    pub test_name: String,
    pub failure_message: Option<String>,
    pub expectation: Option<String>,
    pub logic_issue: Option<String>,
    pub submission_excerpt: String,
    pub reference_excerpt: String,
    pub exercise_context: String,
}

pub fn build_context(request: &VerificationRequest, outcome: &TestOutcome) -> HintContext {
    let test_body = test_body_for(&request.reference_test_source, &outcome.name);

    HintContext {
        test_name: outcome.name.clone(),
        failure_message: outcome.failure_message.clone(),
        expectation: test_body.as_deref().and_then(extract_expectation),
        logic_issue: detect_logic_issue(&request.submission_source),
        submission_excerpt: focus_submission(&request.submission_source, test_body.as_deref()),
        reference_excerpt: truncate_chars(&request.reference_test_source, MAX_REFERENCE_CHARS),
        exercise_context: if request.problem_statement.trim().is_empty() {
            "The student must implement the function the reference tests exercise.".to_string()
        } else {
            request.problem_statement.clone()
        },
    }
}

/// Keep the first type declaration plus the body of the function the
/// failing test calls. Falls back to plain truncation when no target
/// function can be located or the submission is implausibly large.
pub fn focus_submission(source: &str, test_body: Option<&str>) -> String {
    if let Some(body) = test_body {
        for candidate in call_candidates(body) {
            if let Some(function) = extract_fn(source, &candidate) {
                let mut excerpt = String::new();
                if let Some(decl) = first_type_declaration(source) {
                    excerpt.push_str(&decl);
                    excerpt.push_str("\n\n");
                }
                excerpt.push_str(&function);
                return truncate_chars(&excerpt, MAX_FOCUS_CHARS);
            }
        }
    }
    truncate_chars(source, MAX_FOCUS_CHARS)
}

/// Names invoked as calls inside a test body, in order of appearance.
/// Macros (`assert_eq!(...)`) and denylisted utility names are skipped.
fn call_candidates(test_body: &str) -> Vec<String> {
    let mut candidates = Vec::new();
    let chars: Vec<char> = test_body.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        if chars[i].is_alphabetic() || chars[i] == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let ident: String = chars[start..i].iter().collect();

            // skip whitespace between name and the call parenthesis
            let mut j = i;
            while j < chars.len() && chars[j].is_whitespace() {
                j += 1;
            }
            let is_call = j < chars.len() && chars[j] == '(';
            let is_macro = j < chars.len() && chars[j] == '!';

            if is_call
                && !is_macro
                && !CALL_DENYLIST.contains(&ident.as_str())
                && !candidates.contains(&ident)
            {
                candidates.push(ident);
            }
        } else {
            i += 1;
        }
    }
    candidates
}

/// Locate `fn <name>` in the submission and return the full item, signature
/// through the matching closing brace (brace-balanced scan).
fn extract_fn(source: &str, name: &str) -> Option<String> {
    let mut from = 0;
    while let Some(rel) = source[from..].find("fn ") {
        let at = from + rel;
        let after = source[at + 3..].trim_start();
        if after.starts_with(name) {
            let tail = &after[name.len()..];
            if tail.starts_with('(') || tail.starts_with('<') {
                return balanced_item(source, at);
            }
        }
        from = at + 3;
    }
    None
}

/// First struct/enum/trait declaration in the submission, if any.
fn first_type_declaration(source: &str) -> Option<String> {
    let mut offset = 0;
    for line in source.lines() {
        let trimmed = line.trim_start();
        let without_pub = trimmed.strip_prefix("pub ").unwrap_or(trimmed);
        if without_pub.starts_with("struct ")
            || without_pub.starts_with("enum ")
            || without_pub.starts_with("trait ")
        {
            let start = offset + (line.len() - trimmed.len());
            // unit/tuple structs end at `;` before any block opens
            let rest = &source[start..];
            let brace = rest.find('{');
            let semi = rest.find(';');
            return match (brace, semi) {
                (Some(b), Some(s)) if s < b => Some(rest[..=s].to_string()),
                (None, Some(s)) => Some(rest[..=s].to_string()),
                (Some(_), _) => balanced_item(source, start),
                (None, None) => None,
            };
        }
        offset += line.len() + 1;
    }
    None
}

/// From the start of an item, return the text through the brace that closes
/// its block.
fn balanced_item(source: &str, start: usize) -> Option<String> {
    let open = source[start..].find('{')? + start;
    let mut depth = 0usize;
    for (i, c) in source[open..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(source[start..=open + i].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

/// Body text of the named test function inside the reference test source.
/// Handles module-qualified names (`tests::basic` matches `fn basic`).
fn test_body_for(test_source: &str, test_name: &str) -> Option<String> {
    let bare = test_name.rsplit("::").next().unwrap_or(test_name);
    extract_fn(test_source, bare)
}

/// Expected-vs-actual expression from the test body's first `assert_eq!`,
/// following the `assert_eq!(expected, actual)` convention.
pub fn extract_expectation(test_body: &str) -> Option<String> {
    let at = test_body.find("assert_eq!(")?;
    let args_start = at + "assert_eq!(".len();
    let args = balanced_parens(&test_body[args_start - 1..])?;
    let (expected, actual) = split_top_level_comma(args)?;
    Some(format!(
        "the test expects `{}` from `{}`",
        expected.trim(),
        actual.trim()
    ))
}

/// Contents of a balanced `(...)` group starting at the opening parenthesis.
fn balanced_parens(text: &str) -> Option<&str> {
    debug_assert!(text.starts_with('('));
    let mut depth = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[1..i]);
                }
            }
            _ => {}
        }
    }
    None
}

fn split_top_level_comma(args: &str) -> Option<(&str, &str)> {
    let mut depth = 0usize;
    for (i, c) in args.char_indices() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => return Some((&args[..i], &args[i + 1..])),
            _ => {}
        }
    }
    None
}

/// Static pre-analysis of the submission: the obvious "nothing implemented
/// yet" shapes the collaborator should be told about up front.
pub fn detect_logic_issue(source: &str) -> Option<String> {
    if source.contains("todo!(") || source.contains("unimplemented!(") {
        return Some("the solution still contains an unimplemented placeholder".to_string());
    }

    let first_fn = first_fn_body(source)?;
    let statements: Vec<&str> = first_fn
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if statements.len() == 1 && is_bare_constant(statements[0]) {
        return Some(
            "the function body only returns a constant instead of computing a result".to_string(),
        );
    }
    None
}

fn first_fn_body(source: &str) -> Option<String> {
    let at = source.find("fn ")?;
    let item = balanced_item(source, at)?;
    let open = item.find('{')?;
    Some(item[open + 1..item.len() - 1].to_string())
}

fn is_bare_constant(statement: &str) -> bool {
    let value = statement
        .strip_prefix("return ")
        .unwrap_or(statement)
        .trim_end_matches(';')
        .trim();
    matches!(value, "false" | "true" | "None" | "String::new()" | "Vec::new()" | "\"\"")
        || value
            .chars()
            .all(|c| c.is_ascii_digit() || c == '.' || c == '-')
            && !value.is_empty()
}

/// Char-boundary-safe truncation.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    text.chars().take(max_chars).collect()
}
