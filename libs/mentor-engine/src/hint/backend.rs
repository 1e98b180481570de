/// Hint Backend - The External Text-Generation Collaborator
///
/// The engine consumes, never implements, text generation: the contract is
/// a single completion call whose output is untrusted raw text. The
/// production backend speaks the llama.cpp `/completion` protocol over
/// HTTP; tests substitute deterministic scripted backends.
use std::future::Future;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::CONTENT_TYPE;
use hyper::{Method, Request};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tracing::debug;

/// One text-completion call. No contract on output structure: the caller
/// must treat the returned text as untrusted.
pub trait HintBackend {
    fn generate(
        &self,
        prompt: &str,
        max_tokens: u32,
    ) -> impl Future<Output = Result<String>> + Send;
}

#[derive(Debug, Clone)]
pub struct LlamaConfig {
    pub base_url: String,
    pub request_timeout: Duration,
}

impl Default for LlamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11435".to_string(),
            request_timeout: Duration::from_millis(20_000),
        }
    }
}

impl LlamaConfig {
    /// Environment-driven configuration overrides.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let base_url = std::env::var("MENTOR_LLM_BASE_URL").unwrap_or(defaults.base_url);
        let request_timeout = std::env::var("MENTOR_LLM_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.request_timeout);
        Self {
            base_url,
            request_timeout,
        }
    }
}

/// HTTP backend for a llama.cpp-compatible completion server.
pub struct LlamaBackend {
    client: Client<HttpConnector, Full<Bytes>>,
    config: LlamaConfig,
}

impl LlamaBackend {
    pub fn new(config: LlamaConfig) -> Self {
        Self {
            client: Client::builder(TokioExecutor::new()).build_http(),
            config,
        }
    }
}

impl HintBackend for LlamaBackend {
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        let body = serde_json::json!({
            "prompt": prompt,
            "n_predict": max_tokens,
            "temperature": 0.2,
            "top_p": 0.95,
            "top_k": 40,
            "repeat_penalty": 1.15,
            "stop": ["```", "\n\n\n\n"],
        });

        let request = Request::builder()
            .method(Method::POST)
            .uri(format!("{}/completion", self.config.base_url))
            .header(CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(body.to_string())))
            .context("failed to build hint request")?;

        let response = tokio::time::timeout(self.config.request_timeout, self.client.request(request))
            .await
            .context("hint request timed out")?
            .context("hint service unreachable")?;

        let status = response.status();
        if !status.is_success() {
            bail!("hint service returned status {}", status);
        }

        let bytes = response
            .into_body()
            .collect()
            .await
            .context("failed to read hint response body")?
            .to_bytes();

        let value: serde_json::Value =
            serde_json::from_slice(&bytes).context("hint response was not JSON")?;
        let content = value
            .get("content")
            .and_then(|c| c.as_str())
            .unwrap_or_default()
            .to_string();

        debug!(response_len = content.len(), "Hint backend responded");
        Ok(content)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// Deterministic backend: plays back queued responses in order, then
    /// repeats the last one.
    pub(crate) struct ScriptedBackend {
        responses: Mutex<VecDeque<String>>,
        exhausted: String,
    }

    impl ScriptedBackend {
        pub(crate) fn new(responses: &[&str]) -> Self {
            let mut queue: VecDeque<String> =
                responses.iter().map(|r| r.to_string()).collect();
            let exhausted = queue.back().cloned().unwrap_or_default();
            if !queue.is_empty() {
                // keep the final response repeatable without popping it
                queue.pop_back();
            }
            Self {
                responses: Mutex::new(queue),
                exhausted,
            }
        }

        pub(crate) fn always(response: &str) -> Self {
            Self::new(&[response])
        }
    }

    impl HintBackend for ScriptedBackend {
        async fn generate(&self, _prompt: &str, _max_tokens: u32) -> Result<String> {
            let next = self.responses.lock().unwrap().pop_front();
            Ok(next.unwrap_or_else(|| self.exhausted.clone()))
        }
    }

    /// Backend that always fails, for exercising the fallback path.
    pub(crate) struct UnreachableBackend;

    impl HintBackend for UnreachableBackend {
        async fn generate(&self, _prompt: &str, _max_tokens: u32) -> Result<String> {
            bail!("hint service unreachable")
        }
    }
}
