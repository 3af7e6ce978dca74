//! LLM client (C1): model auto-discovery against a vLLM-compatible
//! completion server, with timeout/retry bookkeeping and a best-effort
//! JSON extraction helper.
//!
//! The server's active model name is not fixed at deploy time, so every
//! completion call first confirms (or rediscovers) it via `ensure_model`.
//! Any transport or HTTP-level failure during a completion resets the
//! cached model state, which is what turns a wedged deployment into one
//! that self-heals on the next request instead of failing forever.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("model is not available")]
    ModelUnavailable,
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("could not parse JSON from response: {0}")]
    Unparseable(String),
}

#[derive(Default)]
struct ModelState {
    model_name: Option<String>,
    last_check: Option<Instant>,
    is_available: bool,
}

pub struct LlmClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
    retry_interval: Duration,
    state: Mutex<ModelState>,
}

#[derive(Deserialize)]
struct ModelsResponse {
    data: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    id: String,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    text: String,
}

/// Parameters for one completion call. `max_tokens`/`temperature` fall back
/// to the client's configured defaults when omitted.
#[derive(Debug, Clone, Default)]
pub struct CompletionParams {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub stop: Option<Vec<String>>,
    pub repetition_penalty: Option<f32>,
}

impl LlmClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration, retry_interval: Duration) -> Self {
        Self {
            http: reqwest::Client::builder()
                .pool_max_idle_per_host(5)
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            base_url: base_url.into(),
            timeout,
            retry_interval,
            state: Mutex::new(ModelState::default()),
        }
    }

    /// Queries `/v1/models` for the currently active model identifier.
    async fn get_model_name(&self) -> Option<String> {
        let url = format!("{}/v1/models", self.base_url);
        let response = self.http.get(&url).send().await.ok()?;
        let parsed: ModelsResponse = response.json().await.ok()?;
        parsed.data.into_iter().next().map(|entry| entry.id)
    }

    /// Cached model identifier and availability, refreshing first via
    /// [`Self::ensure_model`]. Backs `GET /api/v1/model-info`.
    pub async fn model_info(&self) -> (Option<String>, bool) {
        let available = self.ensure_model().await;
        let name = self.state.lock().unwrap_or_else(|e| e.into_inner()).model_name.clone();
        (name, available)
    }

    /// Ensures a model identifier is cached, rediscovering it once every
    /// `retry_interval` (or immediately if none is cached yet).
    pub async fn ensure_model(&self) -> bool {
        let should_check = {
            let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            state.model_name.is_none()
                || state
                    .last_check
                    .is_none_or(|last| last.elapsed() > self.retry_interval)
        };

        if !should_check {
            return self.state.lock().unwrap_or_else(|e| e.into_inner()).is_available;
        }

        let discovered = self.get_model_name().await;
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.last_check = Some(Instant::now());
        state.is_available = discovered.is_some();
        if discovered.is_some() {
            tracing::info!(model = ?discovered, "llm model available");
        } else {
            tracing::warn!("llm model not available, will retry");
        }
        state.model_name = discovered;
        state.is_available
    }

    /// Clears cached model state after a transport failure, so the next
    /// `ensure_model` call re-discovers rather than keeps retrying a dead
    /// cached identifier.
    fn reset_model_state(&self) {
        tracing::warn!("resetting llm model state after failure");
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.model_name = None;
        state.last_check = None;
        state.is_available = false;
    }

    pub async fn complete(
        &self,
        prompt: &str,
        params: CompletionParams,
    ) -> Result<String, LlmError> {
        if !self.ensure_model().await {
            return Err(LlmError::ModelUnavailable);
        }

        let model_name = self
            .state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .model_name
            .clone()
            .ok_or(LlmError::ModelUnavailable)?;

        let mut body = serde_json::json!({
            "model": model_name,
            "prompt": prompt,
            "max_tokens": params.max_tokens.unwrap_or(65536),
            "temperature": params.temperature.unwrap_or(0.6),
        });
        if let Some(stop) = params.stop {
            body["stop"] = serde_json::json!(stop);
        }
        if let Some(penalty) = params.repetition_penalty {
            body["repetition_penalty"] = serde_json::json!(penalty);
        }

        let url = format!("{}/v1/completions", self.base_url);
        let result = self
            .http
            .post(&url)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status);

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                self.reset_model_state();
                return Err(LlmError::Request(err));
            }
        };

        match response.json::<CompletionResponse>().await {
            Ok(parsed) => Ok(parsed
                .choices
                .into_iter()
                .next()
                .map(|choice| choice.text)
                .unwrap_or_default()),
            Err(err) => {
                self.reset_model_state();
                Err(LlmError::Request(err))
            }
        }
    }

    /// Runs a completion and parses it as JSON, tolerating a fenced code
    /// block or leading/trailing prose around the object. This is a
    /// lighter-weight recovery pass than the unified extractor's
    /// truncation healer (`kg-extractor`/`json-stream-parser`) — it does
    /// not attempt to repair an unbalanced document.
    pub async fn extract_json(
        &self,
        prompt: &str,
        params: CompletionParams,
    ) -> Result<Value, LlmError> {
        let text = self.complete(prompt, params).await?;
        let trimmed = text.trim();

        if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
            return Ok(value);
        }

        if let Some(fenced) = extract_fenced_json(trimmed) {
            if let Ok(value) = serde_json::from_str::<Value>(&fenced) {
                return Ok(value);
            }
        }

        if let Some(braces) = extract_bare_braces(trimmed) {
            if let Ok(value) = serde_json::from_str::<Value>(&braces) {
                return Ok(value);
            }
        }

        Err(LlmError::Unparseable(trimmed.chars().take(200).collect()))
    }

    pub async fn health_check(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        self.http
            .get(&url)
            .send()
            .await
            .is_ok_and(|response| response.status().is_success())
    }
}

fn extract_fenced_json(text: &str) -> Option<String> {
    let re = Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").ok()?;
    re.captures(text).map(|caps| caps[1].to_string())
}

fn extract_bare_braces(text: &str) -> Option<String> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| text[start..=end].to_string())
}
