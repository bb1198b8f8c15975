use crate::llm::tools::ToolOutcome;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Message role in LLM conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Tool,
}

/// Tool call requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmToolCall {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub arguments: HashMap<String, serde_json::Value>,
}

impl LlmToolCall {
    pub fn new(name: impl Into<String>, arguments: HashMap<String, serde_json::Value>) -> Self {
        Self {
            id: None,
            name: name.into(),
            arguments,
        }
    }
}

/// Message in LLM conversation
///
/// Tool messages are function responses: `tool_calls` holds the single call being
/// answered (its name tags the response) and `content` holds the serialized
/// [`ToolOutcome`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmMessage {
    #[serde(default = "default_role")]
    pub role: MessageRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<LlmToolCall>>,
}

fn default_role() -> MessageRole {
    MessageRole::User
}

/// Response from LLM gateway
#[derive(Debug, Clone, Default)]
pub struct LlmGatewayResponse {
    pub content: Option<String>,
    pub tool_calls: Vec<LlmToolCall>,
}

impl LlmGatewayResponse {
    /// A plain-text response with no tool calls
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: vec![],
        }
    }

    /// A response requesting the given tool calls
    pub fn calls(tool_calls: Vec<LlmToolCall>) -> Self {
        Self {
            content: None,
            tool_calls,
        }
    }
}

impl LlmMessage {
    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: Some(content.into()),
            tool_calls: None,
        }
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: Some(content.into()),
            tool_calls: None,
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: Some(content.into()),
            tool_calls: None,
        }
    }

    /// Record the model's turn that requested tool calls
    pub fn assistant_tool_calls(content: Option<String>, tool_calls: Vec<LlmToolCall>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content,
            tool_calls: Some(tool_calls),
        }
    }

    /// Create a function-response message answering `call`
    pub fn function_response(call: &LlmToolCall, outcome: &ToolOutcome) -> Self {
        Self {
            role: MessageRole::Tool,
            content: Some(outcome.to_json_string()),
            tool_calls: Some(vec![call.clone()]),
        }
    }

    /// Name of the tool a function-response message answers
    pub fn tool_name(&self) -> Option<&str> {
        self.tool_calls.as_ref().and_then(|calls| calls.first()).map(|call| call.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_role_serialization() {
        assert_eq!(serde_json::to_string(&MessageRole::System).unwrap(), "\"system\"");
        assert_eq!(serde_json::to_string(&MessageRole::User).unwrap(), "\"user\"");
        assert_eq!(serde_json::to_string(&MessageRole::Assistant).unwrap(), "\"assistant\"");
        assert_eq!(serde_json::to_string(&MessageRole::Tool).unwrap(), "\"tool\"");
    }

    #[test]
    fn test_user_message() {
        let msg = LlmMessage::user("Hello");
        assert_eq!(msg.role, MessageRole::User);
        assert_eq!(msg.content, Some("Hello".to_string()));
        assert!(msg.tool_calls.is_none());
    }

    #[test]
    fn test_function_response_success() {
        let mut args = HashMap::new();
        args.insert("query".to_string(), json!("Events in Atlanta, GA"));
        let call = LlmToolCall::new("event_api", args);

        let msg =
            LlmMessage::function_response(&call, &ToolOutcome::Success(json!([{"title": "Jazz"}])));

        assert_eq!(msg.role, MessageRole::Tool);
        assert_eq!(msg.tool_name(), Some("event_api"));
        let content: serde_json::Value =
            serde_json::from_str(msg.content.as_deref().unwrap()).unwrap();
        assert_eq!(content, json!({"result": [{"title": "Jazz"}]}));
    }

    #[test]
    fn test_function_response_failure() {
        let call = LlmToolCall::new("hotel_api", HashMap::new());
        let msg = LlmMessage::function_response(
            &call,
            &ToolOutcome::Failure("Error: Invalid API key".to_string()),
        );

        let content: serde_json::Value =
            serde_json::from_str(msg.content.as_deref().unwrap()).unwrap();
        assert_eq!(content, json!({"error": "Error: Invalid API key"}));
    }

    #[test]
    fn test_llm_tool_call_without_id() {
        let tool_call = LlmToolCall::new("test_tool", HashMap::new());

        let json = serde_json::to_string(&tool_call).unwrap();
        // id should be omitted when None
        assert!(!json.contains("\"id\""));
        assert!(json.contains("test_tool"));
    }

    #[test]
    fn test_llm_message_default_role() {
        let json = r#"{"content":"test"}"#;
        let msg: LlmMessage = serde_json::from_str(json).unwrap();

        // Should default to User role
        assert_eq!(msg.role, MessageRole::User);
    }

    #[test]
    fn test_gateway_response_constructors() {
        let text = LlmGatewayResponse::text("done");
        assert_eq!(text.content.as_deref(), Some("done"));
        assert!(text.tool_calls.is_empty());

        let calls = LlmGatewayResponse::calls(vec![LlmToolCall::new("x", HashMap::new())]);
        assert!(calls.content.is_none());
        assert_eq!(calls.tool_calls.len(), 1);
    }
}
