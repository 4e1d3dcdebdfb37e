//! LLM transport shared by the analyzer and the converter.
//!
//! [`LlmClient`] is the seam: the pipeline only ever sees a boxed client, so
//! tests substitute a stub and production uses [`HttpLlmClient`].

use crate::config::{LlmConfig, LlmProvider};
use crate::{Error, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::json;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Blocking completion interface.
pub trait LlmClient: Send + Sync {
    /// Send one system + user prompt pair and return the reply text.
    fn complete(&self, system: &str, prompt: &str) -> Result<String>;
}

/// Create the default HTTP-backed client.
///
/// Fails when a hosted provider has no API key in config or environment.
pub fn create_client(llm: &LlmConfig) -> Result<Box<dyn LlmClient>> {
    Ok(Box::new(HttpLlmClient::new(llm)?))
}

/// Pull the outermost JSON object out of a reply that may wrap it in prose
/// or markdown fences.
pub fn extract_json_object(raw: &str) -> Result<&str> {
    let start = raw.find('{').ok_or_else(|| {
        Error::MalformedResponse("response did not contain a JSON object".to_string())
    })?;
    let end = raw.rfind('}').ok_or_else(|| {
        Error::MalformedResponse("response did not contain a JSON object".to_string())
    })?;
    if end <= start {
        return Err(Error::MalformedResponse(
            "response JSON bounds are invalid".to_string(),
        ));
    }
    Ok(&raw[start..=end])
}

/// Cut `text` to at most `max_chars` characters, marking the cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> std::borrow::Cow<'_, str> {
    match text.char_indices().nth(max_chars) {
        None => std::borrow::Cow::Borrowed(text),
        Some((byte_idx, _)) => {
            std::borrow::Cow::Owned(format!("{}\n...[truncated]", &text[..byte_idx]))
        }
    }
}

/// Client for Ollama, Claude and OpenAI chat endpoints.
///
/// Calls block the caller. A one-permit semaphore keeps at most one request
/// in flight even when the client is shared.
pub struct HttpLlmClient {
    model: String,
    provider: LlmProvider,
    endpoint: String,
    api_key: Option<String>,
    max_tokens: u32,
    runtime: tokio::runtime::Runtime,
    http: reqwest::Client,
    in_flight: Semaphore,
}

impl HttpLlmClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let endpoint = config
            .endpoint
            .clone()
            .unwrap_or_else(|| config.provider.default_endpoint().to_string());
        let api_key = match config.provider.api_key_env() {
            None => None,
            Some(var) => config
                .api_key
                .clone()
                .or_else(|| std::env::var(var).ok())
                .filter(|k| !k.is_empty()),
        };

        if let (Some(var), None) = (config.provider.api_key_env(), &api_key) {
            return Err(Error::Config(format!(
                "llm.api_key (or {var}) is required"
            )));
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::Llm(format!("failed to build tokio runtime: {e}")))?;
        let timeout_secs = config.timeout_secs.max(1);
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| Error::Llm(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            model: config.model.clone(),
            provider: config.provider,
            endpoint,
            api_key,
            max_tokens: config.max_tokens,
            runtime,
            http,
            in_flight: Semaphore::new(1),
        })
    }

    async fn post(
        &self,
        label: &str,
        url: String,
        headers: HeaderMap,
        body: serde_json::Value,
    ) -> Result<serde_json::Value> {
        let resp = self
            .http
            .post(url)
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Llm(format!("{label} request failed: {e}")))?;
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| Error::Llm(format!("{label} read body failed: {e}")))?;
        if !status.is_success() {
            return Err(Error::Llm(format!(
                "{label} returned {}: {}",
                status.as_u16(),
                text
            )));
        }
        Ok(serde_json::from_str(&text)?)
    }

    async fn complete_async(&self, system: &str, prompt: &str) -> Result<String> {
        let _permit = self
            .in_flight
            .acquire()
            .await
            .map_err(|e| Error::Llm(format!("request gate closed: {e}")))?;

        let base = self.endpoint.trim_end_matches('/');
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        match self.provider {
            LlmProvider::Ollama => {
                let json = self
                    .post(
                        "ollama",
                        format!("{base}/api/generate"),
                        headers,
                        json!({
                            "model": self.model,
                            "system": system,
                            "prompt": prompt,
                            "stream": false,
                            "options": { "temperature": 0.1 },
                        }),
                    )
                    .await?;
                json.get("response")
                    .and_then(|v| v.as_str())
                    .map(ToString::to_string)
                    .ok_or_else(|| {
                        Error::Llm("ollama response missing string field `response`".to_string())
                    })
            }
            LlmProvider::Claude => {
                headers.insert(
                    "x-api-key",
                    HeaderValue::from_str(self.api_key.as_deref().unwrap_or_default())
                        .map_err(|e| Error::Llm(format!("invalid claude api key header: {e}")))?,
                );
                headers.insert("anthropic-version", HeaderValue::from_static("2023-06-01"));

                let json = self
                    .post(
                        "claude",
                        format!("{base}/v1/messages"),
                        headers,
                        json!({
                            "model": self.model,
                            "max_tokens": self.max_tokens,
                            "temperature": 0.1,
                            "system": system,
                            "messages": [{ "role": "user", "content": prompt }],
                        }),
                    )
                    .await?;
                json.get("content")
                    .and_then(|v| v.as_array())
                    .and_then(|arr| arr.first())
                    .and_then(|v| v.get("text"))
                    .and_then(|v| v.as_str())
                    .map(ToString::to_string)
                    .ok_or_else(|| Error::Llm("claude response missing content[0].text".to_string()))
            }
            LlmProvider::OpenAI => {
                headers.insert(
                    AUTHORIZATION,
                    HeaderValue::from_str(&format!(
                        "Bearer {}",
                        self.api_key.as_deref().unwrap_or_default()
                    ))
                    .map_err(|e| Error::Llm(format!("invalid auth header: {e}")))?,
                );

                let json = self
                    .post(
                        "openai",
                        format!("{base}/v1/chat/completions"),
                        headers,
                        json!({
                            "model": self.model,
                            "temperature": 0.1,
                            "max_tokens": self.max_tokens,
                            "messages": [
                                { "role": "system", "content": system },
                                { "role": "user", "content": prompt }
                            ]
                        }),
                    )
                    .await?;
                json.get("choices")
                    .and_then(|v| v.as_array())
                    .and_then(|arr| arr.first())
                    .and_then(|v| v.get("message"))
                    .and_then(|v| v.get("content"))
                    .and_then(|v| v.as_str())
                    .map(ToString::to_string)
                    .ok_or_else(|| {
                        Error::Llm("openai response missing choices[0].message.content".to_string())
                    })
            }
        }
    }
}

impl LlmClient for HttpLlmClient {
    fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        tracing::debug!(
            provider = ?self.provider,
            model = %self.model,
            prompt_chars = prompt.len(),
            "Sending completion request"
        );
        self.runtime.block_on(self.complete_async(system, prompt))
    }
}
