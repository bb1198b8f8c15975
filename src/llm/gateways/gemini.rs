//! Gateway for Google's Gemini `generateContent` API.
//!
//! The API key is only ever sent to the configured Gemini endpoint.

use crate::error::{Result, TravelError};
use crate::llm::gateway::{CompletionConfig, LlmGateway};
use crate::llm::models::{LlmGatewayResponse, LlmMessage, LlmToolCall, MessageRole};
use crate::llm::tools::ToolDescriptor;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

const HARM_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_DANGEROUS_CONTENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
];

/// Configuration for connecting to Gemini
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_base: String,
    pub api_key: String,
    pub timeout: Option<Duration>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_base: std::env::var("GEMINI_API_BASE")
                .unwrap_or_else(|_| GEMINI_API_BASE.to_string()),
            api_key: std::env::var("GEMINI_API_KEY").unwrap_or_default(),
            timeout: None,
        }
    }
}

/// Gateway for Gemini models
///
/// Supports text generation and function calling. Function responses from
/// consecutive tool messages are merged into a single `function` turn, which is how
/// Gemini expects the answers to a multi-call turn.
pub struct GeminiGateway {
    client: Client,
    config: GeminiConfig,
}

impl GeminiGateway {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(GeminiConfig {
            api_key: api_key.into(),
            ..Default::default()
        })
    }

    pub fn with_config(config: GeminiConfig) -> Result<Self> {
        let mut client_builder = Client::builder();

        if let Some(timeout) = config.timeout {
            client_builder = client_builder.timeout(timeout);
        }

        let client = client_builder.build()?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl LlmGateway for GeminiGateway {
    async fn complete(
        &self,
        model: &str,
        messages: &[LlmMessage],
        tools: &[ToolDescriptor],
        config: &CompletionConfig,
    ) -> Result<LlmGatewayResponse> {
        info!("Delegating to Gemini for completion");
        debug!("Model: {}, Message count: {}", model, messages.len());

        let request = build_request(messages, tools, config);

        let response = self
            .client
            .post(format!(
                "{}/{}:generateContent",
                self.config.api_base.trim_end_matches('/'),
                model
            ))
            .query(&[("key", self.config.api_key.as_str())])
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(TravelError::GatewayError(format!(
                "Gemini API error ({}): {}",
                status, error_text
            )));
        }

        let body: GeminiResponse = response.json().await?;
        parse_response(body)
    }
}

fn build_request(
    messages: &[LlmMessage],
    tools: &[ToolDescriptor],
    config: &CompletionConfig,
) -> GeminiRequest {
    let (system_instruction, contents) = adapt_messages_to_gemini(messages);

    let tools = if tools.is_empty() {
        None
    } else {
        Some(vec![GeminiTools {
            function_declarations: tools
                .iter()
                .map(|t| GeminiFunctionDeclaration {
                    name: t.function.name.clone(),
                    description: t.function.description.clone(),
                    parameters: t.function.parameters.clone(),
                })
                .collect(),
        }])
    };

    GeminiRequest {
        contents,
        system_instruction: system_instruction.map(|text| GeminiSystemInstruction {
            parts: vec![GeminiPart::Text { text }],
        }),
        generation_config: GeminiGenerationConfig {
            max_output_tokens: config.max_tokens,
            temperature: config.temperature,
            top_p: config.top_p,
        },
        safety_settings: HARM_CATEGORIES
            .iter()
            .map(|category| GeminiSafetySetting {
                category: category.to_string(),
                threshold: "BLOCK_ONLY_HIGH".to_string(),
            })
            .collect(),
        tools,
    }
}

// Message adapter for Gemini format
fn adapt_messages_to_gemini(messages: &[LlmMessage]) -> (Option<String>, Vec<GeminiContent>) {
    let mut system_parts: Vec<String> = Vec::new();
    let mut contents: Vec<GeminiContent> = Vec::new();

    for msg in messages {
        match msg.role {
            MessageRole::System => {
                if let Some(text) = &msg.content {
                    system_parts.push(text.clone());
                }
            }
            MessageRole::User => {
                contents.push(GeminiContent {
                    role: "user".to_string(),
                    parts: vec![GeminiPart::Text {
                        text: msg.content.clone().unwrap_or_default(),
                    }],
                });
            }
            MessageRole::Assistant => {
                let mut parts = Vec::new();
                if let Some(text) = msg.content.as_ref().filter(|t| !t.is_empty()) {
                    parts.push(GeminiPart::Text { text: text.clone() });
                }
                for call in msg.tool_calls.iter().flatten() {
                    parts.push(GeminiPart::FunctionCall {
                        function_call: GeminiFunctionCall {
                            name: call.name.clone(),
                            args: serde_json::to_value(&call.arguments)
                                .unwrap_or_else(|_| Value::Object(Default::default())),
                        },
                    });
                }
                if !parts.is_empty() {
                    contents.push(GeminiContent {
                        role: "model".to_string(),
                        parts,
                    });
                }
            }
            MessageRole::Tool => {
                let part = GeminiPart::FunctionResponse {
                    function_response: GeminiFunctionResponse {
                        name: msg.tool_name().unwrap_or_default().to_string(),
                        response: function_response_payload(msg.content.as_deref()),
                    },
                };
                match contents.last_mut() {
                    Some(last) if last.role == "function" => last.parts.push(part),
                    _ => contents.push(GeminiContent {
                        role: "function".to_string(),
                        parts: vec![part],
                    }),
                }
            }
        }
    }

    let system_instruction =
        if system_parts.is_empty() { None } else { Some(system_parts.join("\n\n")) };

    (system_instruction, contents)
}

// Gemini wants an object here; plain text results are wrapped
fn function_response_payload(content: Option<&str>) -> Value {
    let content = content.unwrap_or_default();
    match serde_json::from_str::<Value>(content) {
        Ok(value @ Value::Object(_)) => value,
        Ok(other) => serde_json::json!({ "result": other }),
        Err(_) => serde_json::json!({ "result": content }),
    }
}

fn parse_response(body: GeminiResponse) -> Result<LlmGatewayResponse> {
    let candidate = match body.candidates.into_iter().next() {
        Some(candidate) => candidate,
        None => {
            let reason = body
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "no candidates returned".to_string());
            return Err(TravelError::GatewayError(format!(
                "Gemini returned no answer: {}",
                reason
            )));
        }
    };

    let parts = candidate.content.map(|c| c.parts).unwrap_or_default();
    if parts.is_empty() {
        warn!(finish_reason = ?candidate.finish_reason, "Gemini candidate has no parts");
    }

    let mut text = String::new();
    let mut tool_calls = Vec::new();

    for part in parts {
        match part {
            GeminiPart::Text { text: t } => text.push_str(&t),
            GeminiPart::FunctionCall { function_call } => {
                let arguments: HashMap<String, Value> = match function_call.args {
                    Value::Object(map) => map.into_iter().collect(),
                    _ => HashMap::new(),
                };
                tool_calls.push(LlmToolCall {
                    id: None,
                    name: function_call.name,
                    arguments,
                });
            }
            GeminiPart::FunctionResponse { .. } | GeminiPart::Other(_) => {}
        }
    }

    Ok(LlmGatewayResponse {
        content: if text.is_empty() { None } else { Some(text) },
        tool_calls,
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiSystemInstruction>,
    generation_config: GeminiGenerationConfig,
    safety_settings: Vec<GeminiSafetySetting>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<GeminiTools>>,
}

#[derive(Debug, Serialize)]
struct GeminiSystemInstruction {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum GeminiPart {
    Text {
        text: String,
    },
    FunctionCall {
        #[serde(rename = "functionCall")]
        function_call: GeminiFunctionCall,
    },
    FunctionResponse {
        #[serde(rename = "functionResponse")]
        function_response: GeminiFunctionResponse,
    },
    Other(Value),
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiFunctionCall {
    name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiFunctionResponse {
    name: String,
    response: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    max_output_tokens: usize,
    temperature: f32,
    top_p: f32,
}

#[derive(Debug, Serialize)]
struct GeminiSafetySetting {
    category: String,
    threshold: String,
}

#[derive(Debug, Serialize)]
struct GeminiTools {
    #[serde(rename = "functionDeclarations")]
    function_declarations: Vec<GeminiFunctionDeclaration>,
}

#[derive(Debug, Serialize)]
struct GeminiFunctionDeclaration {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}
