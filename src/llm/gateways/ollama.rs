use crate::error::{Result, TravelError};
use crate::llm::gateway::{CompletionConfig, LlmGateway};
use crate::llm::models::{LlmGatewayResponse, LlmMessage, LlmToolCall, MessageRole};
use crate::llm::tools::ToolDescriptor;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, info};

/// Configuration for connecting to Ollama server
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub host: String,
    pub timeout: Option<std::time::Duration>,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("OLLAMA_HOST")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            timeout: None,
        }
    }
}

/// Gateway for a local Ollama server
///
/// Useful for running the travel agent against a local model that supports tool
/// calling instead of the hosted Gemini service.
pub struct OllamaGateway {
    client: Client,
    config: OllamaConfig,
}

impl OllamaGateway {
    /// Create a new Ollama gateway with custom configuration
    pub fn with_config(config: OllamaConfig) -> Result<Self> {
        let mut client_builder = Client::builder();

        if let Some(timeout) = config.timeout {
            client_builder = client_builder.timeout(timeout);
        }

        let client = client_builder.build()?;

        Ok(Self { client, config })
    }

    /// Create gateway with custom host
    pub fn with_host(host: impl Into<String>) -> Result<Self> {
        Self::with_config(OllamaConfig {
            host: host.into(),
            ..Default::default()
        })
    }
}

#[async_trait]
impl LlmGateway for OllamaGateway {
    async fn complete(
        &self,
        model: &str,
        messages: &[LlmMessage],
        tools: &[ToolDescriptor],
        config: &CompletionConfig,
    ) -> Result<LlmGatewayResponse> {
        info!("Delegating to Ollama for completion");
        debug!("Model: {}, Message count: {}", model, messages.len());

        let mut body = serde_json::json!({
            "model": model,
            "messages": adapt_messages_to_ollama(messages),
            "options": extract_ollama_options(config),
            "stream": false
        });

        if !tools.is_empty() {
            body["tools"] = serde_json::to_value(tools)?;
        }

        let response = self
            .client
            .post(format!("{}/api/chat", self.config.host))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TravelError::GatewayError(format!(
                "Ollama API error: {}",
                response.status()
            )));
        }

        let response_body: Value = response.json().await?;

        let content = response_body["message"]["content"]
            .as_str()
            .filter(|s| !s.is_empty())
            .map(String::from);

        let tool_calls = if let Some(calls) = response_body["message"]["tool_calls"].as_array() {
            calls
                .iter()
                .filter_map(|call| {
                    let name = call["function"]["name"].as_str()?.to_string();
                    let args = call["function"]["arguments"].as_object()?;

                    let arguments: HashMap<String, Value> =
                        args.iter().map(|(k, v)| (k.clone(), v.clone())).collect();

                    Some(LlmToolCall {
                        id: call["id"].as_str().map(String::from),
                        name,
                        arguments,
                    })
                })
                .collect()
        } else {
            vec![]
        };

        Ok(LlmGatewayResponse {
            content,
            tool_calls,
        })
    }
}

// Message adapter for Ollama format
fn adapt_messages_to_ollama(messages: &[LlmMessage]) -> Vec<Value> {
    messages
        .iter()
        .map(|msg| {
            let mut ollama_msg = serde_json::json!({
                "role": match msg.role {
                    MessageRole::System => "system",
                    MessageRole::User => "user",
                    MessageRole::Assistant => "assistant",
                    MessageRole::Tool => "tool",
                },
                "content": msg.content.as_deref().unwrap_or("")
            });

            match msg.role {
                MessageRole::Assistant => {
                    if let Some(tool_calls) = &msg.tool_calls {
                        let calls: Vec<_> = tool_calls
                            .iter()
                            .map(|tc| {
                                serde_json::json!({
                                    "type": "function",
                                    "function": {
                                        "name": tc.name,
                                        "arguments": tc.arguments
                                    }
                                })
                            })
                            .collect();
                        ollama_msg["tool_calls"] = Value::Array(calls);
                    }
                }
                MessageRole::Tool => {
                    if let Some(name) = msg.tool_name() {
                        ollama_msg["tool_name"] = Value::String(name.to_string());
                    }
                }
                _ => {}
            }

            ollama_msg
        })
        .collect()
}

// Extract Ollama-specific options from config
fn extract_ollama_options(config: &CompletionConfig) -> Value {
    let mut options = serde_json::json!({
        "temperature": config.temperature,
        "top_p": config.top_p,
    });

    if config.max_tokens > 0 {
        options["num_predict"] = serde_json::json!(config.max_tokens);
    }

    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::tools::ToolOutcome;
    use mockito::{Matcher, Server};
    use serde_json::json;

    #[test]
    fn test_gateway_with_host() {
        let gateway = OllamaGateway::with_host("http://example.com:8080").unwrap();
        assert_eq!(gateway.config.host, "http://example.com:8080");
    }

    #[test]
    fn test_adapt_messages_to_ollama_simple() {
        let messages = vec![
            LlmMessage::system("You are helpful"),
            LlmMessage::user("Hello"),
            LlmMessage::assistant("Hi there"),
        ];

        let result = adapt_messages_to_ollama(&messages);

        assert_eq!(result.len(), 3);
        assert_eq!(result[0]["role"], "system");
        assert_eq!(result[1]["content"], "Hello");
        assert_eq!(result[2]["role"], "assistant");
    }

    #[test]
    fn test_adapt_messages_with_tool_calls_and_responses() {
        let call = LlmToolCall::new("event_api", HashMap::new());
        let messages = vec![
            LlmMessage::assistant_tool_calls(None, vec![call.clone()]),
            LlmMessage::function_response(&call, &ToolOutcome::Success(json!([]))),
        ];

        let result = adapt_messages_to_ollama(&messages);

        assert_eq!(result[0]["tool_calls"][0]["function"]["name"], "event_api");
        assert_eq!(result[1]["role"], "tool");
        assert_eq!(result[1]["tool_name"], "event_api");
        assert_eq!(result[1]["content"], r#"{"result":[]}"#);
    }

    #[test]
    fn test_extract_ollama_options() {
        let options = extract_ollama_options(&CompletionConfig::default());
        assert_eq!(options["num_predict"], 128);
        assert!(options.get("top_p").is_some());
    }

    #[tokio::test]
    async fn test_complete_parses_tool_calls() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/chat")
            .match_body(Matcher::PartialJson(json!({"model": "qwen3:32b", "stream": false})))
            .with_status(200)
            .with_body(
                r#"{"message": {"role": "assistant", "content": "", "tool_calls": [
                    {"function": {"name": "event_api", "arguments": {"query": "Events in Atlanta, GA"}}}
                ]}}"#,
            )
            .create_async()
            .await;

        let gateway = OllamaGateway::with_host(server.url()).unwrap();
        let response = gateway
            .complete("qwen3:32b", &[LlmMessage::user("Hi")], &[], &CompletionConfig::default())
            .await
            .unwrap();

        assert!(response.content.is_none());
        assert_eq!(response.tool_calls.len(), 1);
        assert_eq!(response.tool_calls[0].name, "event_api");
        mock.assert_async().await;
    }
}
