// Engine configuration, environment-driven with sane defaults
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Parent directory for per-run workspaces.
    pub workspace_root: PathBuf,
    /// Hard ceiling on each rustc invocation.
    pub compile_timeout_ms: u64,
    /// Hard ceiling on each individual test execution (and discovery).
    pub test_timeout_ms: u64,
    /// Attempts against the hint collaborator before falling back.
    pub hint_max_attempts: u32,
    /// Maximum concurrent outbound hint calls within one run.
    pub hint_max_concurrent: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workspace_root: std::env::temp_dir(),
            compile_timeout_ms: 30_000,
            test_timeout_ms: 5_000,
            hint_max_attempts: 2,
            hint_max_concurrent: 3,
        }
    }
}

impl EngineConfig {
    /// Read overrides from `MENTOR_*` environment variables, falling back
    /// to the defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            workspace_root: std::env::var("MENTOR_WORKSPACE_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.workspace_root),
            compile_timeout_ms: env_u64("MENTOR_COMPILE_TIMEOUT_MS", defaults.compile_timeout_ms),
            test_timeout_ms: env_u64("MENTOR_TEST_TIMEOUT_MS", defaults.test_timeout_ms),
            hint_max_attempts: env_u64("MENTOR_HINT_ATTEMPTS", defaults.hint_max_attempts as u64)
                as u32,
            hint_max_concurrent: env_u64(
                "MENTOR_HINT_CONCURRENCY",
                defaults.hint_max_concurrent as u64,
            ) as usize,
        }
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
