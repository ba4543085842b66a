use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// A hosted language model. Implemented by [`AnthropicClient`]; tests
/// substitute scripted models.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Send a prompt and get free text back
    async fn send_message(&self, system: &str, user: &str) -> Result<String>;

    /// Send a prompt forcing a single tool call, returning the tool input.
    ///
    /// `Ok(None)` means the model answered without calling the tool.
    async fn send_with_tool(
        &self,
        system: &str,
        user: &str,
        tool: &ToolSpec,
    ) -> Result<Option<serde_json::Value>>;
}

#[async_trait]
impl<M: LanguageModel + ?Sized> LanguageModel for Arc<M> {
    async fn send_message(&self, system: &str, user: &str) -> Result<String> {
        (**self).send_message(system, user).await
    }

    async fn send_with_tool(
        &self,
        system: &str,
        user: &str,
        tool: &ToolSpec,
    ) -> Result<Option<serde_json::Value>> {
        (**self).send_with_tool(system, user, tool).await
    }
}

/// A tool the model is forced to call for structured output
#[derive(Debug, Clone, Serialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

/// Configuration for the Anthropic API client
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// API key (from ANTHROPIC_API_KEY env var)
    pub api_key: String,
    /// Model to use (SIA_MODEL env var overrides the default)
    pub model: String,
    /// Temperature (0-1, lower = more deterministic)
    pub temperature: f64,
    /// Maximum tokens in response
    pub max_tokens: u32,
}

impl AnthropicConfig {
    /// Create config from environment variables
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .context("ANTHROPIC_API_KEY environment variable not set")?;
        let model = std::env::var("SIA_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        Ok(Self::new(api_key, model))
    }

    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            temperature: 0.4,
            max_tokens: 1024,
        }
    }
}

/// Anthropic API client
pub struct AnthropicClient {
    client: Client,
    config: AnthropicConfig,
}

impl AnthropicClient {
    pub fn new(config: AnthropicConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    async fn post(&self, request: &AnthropicRequest<'_>) -> Result<AnthropicResponse> {
        let response = self
            .client
            .post(API_URL)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await
            .context("Failed to send request to Anthropic API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Anthropic API error: {} - {}", status, body);
        }

        response
            .json()
            .await
            .context("Failed to parse Anthropic API response")
    }

    fn request<'a>(&'a self, system: &'a str, user: &'a str) -> AnthropicRequest<'a> {
        AnthropicRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            temperature: Some(self.config.temperature),
            system: Some(system),
            messages: vec![Message {
                role: "user",
                content: user,
            }],
            tools: None,
            tool_choice: None,
        }
    }
}

#[async_trait]
impl LanguageModel for AnthropicClient {
    async fn send_message(&self, system: &str, user: &str) -> Result<String> {
        let response = self.post(&self.request(system, user)).await?;

        // Extract text from the first content block
        response
            .content
            .into_iter()
            .find(|c| c.content_type == "text")
            .map(|c| c.text)
            .context("No text content in response")
    }

    async fn send_with_tool(
        &self,
        system: &str,
        user: &str,
        tool: &ToolSpec,
    ) -> Result<Option<serde_json::Value>> {
        let mut request = self.request(system, user);
        request.tools = Some(std::slice::from_ref(tool));
        request.tool_choice = Some(ToolChoice {
            choice_type: "tool",
            name: &tool.name,
        });

        let response = self.post(&request).await?;

        // Find the tool_use content block
        Ok(response
            .content
            .into_iter()
            .find(|c| c.content_type == "tool_use" && c.name.as_deref() == Some(tool.name.as_str()))
            .and_then(|c| c.input))
    }
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<Message<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolSpec]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ToolChoice<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ToolChoice<'a> {
    #[serde(rename = "type")]
    choice_type: &'a str,
    name: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    input: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_request_serialization() {
        let client = AnthropicClient::new(AnthropicConfig::new("k".to_string(), "m".to_string()));
        let tool = ToolSpec {
            name: "submit_classification".to_string(),
            description: "d".to_string(),
            input_schema: serde_json::json!({"type": "object"}),
        };

        let mut request = client.request("sys", "hello");
        request.tools = Some(std::slice::from_ref(&tool));
        request.tool_choice = Some(ToolChoice {
            choice_type: "tool",
            name: &tool.name,
        });

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "m");
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["tools"][0]["name"], "submit_classification");
        assert_eq!(value["tool_choice"]["type"], "tool");
    }

    #[test]
    fn test_plain_request_omits_tools() {
        let client = AnthropicClient::new(AnthropicConfig::new("k".to_string(), "m".to_string()));
        let value = serde_json::to_value(client.request("sys", "hello")).unwrap();

        assert!(value.get("tools").is_none());
        assert!(value.get("tool_choice").is_none());
    }

    #[test]
    fn test_parse_tool_use_response() {
        let json = r#"{
            "content": [
                {"type": "text", "text": "thinking"},
                {"type": "tool_use", "name": "submit_classification", "input": {"intent": "QUERY"}}
            ]
        }"#;
        let response: AnthropicResponse = serde_json::from_str(json).unwrap();

        assert_eq!(response.content.len(), 2);
        assert_eq!(response.content[1].input.as_ref().unwrap()["intent"], "QUERY");
    }
}
