//! `LLMProvider` adapters: one production HTTP JSON client, one
//! deterministic test double. Grounded on the teacher's
//! `llm_planner.rs`/`task_orchestrator.rs` prompt-and-parse pattern.

use async_trait::async_trait;
use serde::Deserialize;
use taskcore_kernel::error::{TaskCoreError, TaskCoreResult};
use taskcore_kernel::traits::LLMProvider;

/// Chat-completions-shaped HTTP client. Works against any provider exposing
/// an OpenAI-compatible `{choices: [{message: {content}}]}` response, since
/// that is the lowest common denominator across providers the teacher's
/// planner already targets.
pub struct HttpLLMProvider {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl HttpLLMProvider {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>, api_key: Option<String>) -> Self {
        Self { client: reqwest::Client::new(), endpoint: endpoint.into(), model: model.into(), api_key }
    }
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: String,
}

#[async_trait]
impl LLMProvider for HttpLLMProvider {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> TaskCoreResult<String> {
        let mut request = self.client.post(&self.endpoint).json(&serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_prompt},
            ],
        }));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| TaskCoreError::Network(e.to_string()))?;
        if !response.status().is_success() {
            return Err(TaskCoreError::PlannerError(format!("planner endpoint returned {}", response.status())));
        }
        let body: ChatCompletionResponse =
            response.json().await.map_err(|e| TaskCoreError::PlannerError(format!("invalid planner response: {e}")))?;
        body.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| TaskCoreError::PlannerError("planner response had no choices".to_string()))
    }
}

/// Deterministic test double: returns a fixed response (or a canned mapping
/// keyed by a substring of the user prompt), so planning logic is fully
/// testable without live network access.
pub struct StaticLLMProvider {
    default_response: String,
    canned: Vec<(String, String)>,
}

impl StaticLLMProvider {
    pub fn new(default_response: impl Into<String>) -> Self {
        Self { default_response: default_response.into(), canned: Vec::new() }
    }

    pub fn with_canned_response(mut self, contains: impl Into<String>, response: impl Into<String>) -> Self {
        self.canned.push((contains.into(), response.into()));
        self
    }
}

#[async_trait]
impl LLMProvider for StaticLLMProvider {
    async fn complete(&self, _system_prompt: &str, user_prompt: &str) -> TaskCoreResult<String> {
        for (needle, response) in &self.canned {
            if user_prompt.contains(needle.as_str()) {
                return Ok(response.clone());
            }
        }
        Ok(self.default_response.clone())
    }
}
