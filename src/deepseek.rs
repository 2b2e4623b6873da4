use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Upper bound on a single completion request
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com/v1";
pub const DEFAULT_MODEL: &str = "deepseek-chat";

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Per-call knobs forwarded to the completion endpoint
#[derive(Debug, Clone, Copy)]
pub struct CompletionParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Token counts reported by the provider, used only for cost accounting
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct UsageCounters {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

#[derive(Debug, Clone)]
pub struct CompletionResult {
    pub text: String,
    pub usage: Option<UsageCounters>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<UsageCounters>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// The pipeline's only I/O dependency, kept behind a narrow seam so tests
/// can substitute a stub provider.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: CompletionParams,
    ) -> Result<CompletionResult, ApiError>;
}

/// Client for the DeepSeek chat-completion endpoint (OpenAI-compatible).
/// One outbound call per invocation; a failed call is final, there is no
/// retry.
pub struct DeepSeekClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl DeepSeekClient {
    pub fn new(client: reqwest::Client, base_url: String, api_key: String, model: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        }
    }
}

#[async_trait]
impl CompletionProvider for DeepSeekClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: CompletionParams,
    ) -> Result<CompletionResult, ApiError> {
        debug!("Requesting completion from {} with model {}", self.base_url, self.model);

        let body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "temperature": params.temperature,
            "max_tokens": params.max_tokens,
        });

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::Upstream(format!("DeepSeek API request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Upstream(format!("DeepSeek API returned {status}: {body}")));
        }

        let parsed: ChatCompletionResponse = resp
            .json()
            .await
            .map_err(|e| ApiError::Upstream(format!("unexpected DeepSeek API response format: {e}")))?;

        first_choice(parsed)
    }
}

/// Pull the first choice's content out of a completion response, keeping
/// the usage counters alongside it.
fn first_choice(resp: ChatCompletionResponse) -> Result<CompletionResult, ApiError> {
    let usage = resp.usage;
    let text = resp
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::Upstream("No response content from DeepSeek API".to_string()))?;

    Ok(CompletionResult { text, usage })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_from(value: serde_json::Value) -> ChatCompletionResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_first_choice_with_usage() {
        let resp = response_from(serde_json::json!({
            "choices": [
                {
                    "message": {
                        "role": "assistant",
                        "content": "{\"cards\":[]}"
                    }
                }
            ],
            "usage": {
                "prompt_tokens": 1200,
                "completion_tokens": 340,
                "total_tokens": 1540
            }
        }));

        let result = first_choice(resp).unwrap();
        assert_eq!(result.text, "{\"cards\":[]}");
        let usage = result.usage.unwrap();
        assert_eq!(usage.prompt_tokens, 1200);
        assert_eq!(usage.completion_tokens, 340);
        assert_eq!(usage.total_tokens, 1540);
    }

    #[test]
    fn test_first_choice_without_usage() {
        let resp = response_from(serde_json::json!({
            "choices": [
                {"message": {"content": "hello"}}
            ]
        }));

        let result = first_choice(resp).unwrap();
        assert_eq!(result.text, "hello");
        assert!(result.usage.is_none());
    }

    #[test]
    fn test_first_choice_empty_choices() {
        let resp = response_from(serde_json::json!({"choices": []}));
        let err = first_choice(resp).unwrap_err();
        assert_eq!(err.to_string(), "No response content from DeepSeek API");
    }

    #[test]
    fn test_first_choice_null_content() {
        let resp = response_from(serde_json::json!({
            "choices": [
                {"message": {"content": null}}
            ]
        }));
        let err = first_choice(resp).unwrap_err();
        assert_eq!(err.to_string(), "No response content from DeepSeek API");
    }

    #[test]
    fn test_first_choice_empty_content() {
        let resp = response_from(serde_json::json!({
            "choices": [
                {"message": {"content": ""}}
            ]
        }));
        assert!(first_choice(resp).is_err());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = DeepSeekClient::new(
            reqwest::Client::new(),
            "https://api.deepseek.com/v1/".to_string(),
            "key".to_string(),
            DEFAULT_MODEL.to_string(),
        );
        assert_eq!(client.base_url, "https://api.deepseek.com/v1");
    }
}
