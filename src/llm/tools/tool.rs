use crate::error::{Result, TravelError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Descriptor for tool function parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub r#type: String,
    pub function: FunctionDescriptor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolDescriptor {
    pub fn function(name: &str, description: &str, parameters: Value) -> Self {
        Self {
            r#type: "function".to_string(),
            function: FunctionDescriptor {
                name: name.to_string(),
                description: description.to_string(),
                parameters,
            },
        }
    }
}

/// What a tool hands back to the model.
///
/// Serializes as `{"result": ...}` or `{"error": "..."}`, which is the payload of the
/// function-response message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ToolOutcome {
    #[serde(rename = "result")]
    Success(Value),
    #[serde(rename = "error")]
    Failure(String),
}

impl ToolOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ToolOutcome::Success(_))
    }

    pub fn to_json(&self) -> Value {
        match self {
            ToolOutcome::Success(value) => serde_json::json!({ "result": value }),
            ToolOutcome::Failure(message) => serde_json::json!({ "error": message }),
        }
    }

    pub fn to_json_string(&self) -> String {
        self.to_json().to_string()
    }
}

/// Trait for LLM tools
#[async_trait]
pub trait LlmTool: Send + Sync {
    /// Execute the tool with the model-supplied arguments
    async fn run(&self, args: &HashMap<String, Value>) -> Result<ToolOutcome>;

    /// Get tool descriptor for LLM
    fn descriptor(&self) -> ToolDescriptor;

    fn name(&self) -> String {
        self.descriptor().function.name
    }

    /// Check if this tool matches the given name
    fn matches(&self, name: &str) -> bool {
        self.descriptor().function.name == name
    }
}

/// Read a required string argument
pub fn required_str(args: &HashMap<String, Value>, key: &str) -> Result<String> {
    match args.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Null) | None => {
            Err(TravelError::InvalidArgument(format!("{} parameter is required", key)))
        }
        // Dates and numbers sometimes arrive unquoted; pass them through as text
        Some(other) => Ok(other.to_string()),
    }
}

/// Read an optional string argument, falling back to `default`
pub fn optional_str(args: &HashMap<String, Value>, key: &str, default: &str) -> String {
    match args.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => default.to_string(),
        Some(other) => other.to_string(),
    }
}

/// Read an optional integer argument.
///
/// Models emit integers as `2`, `2.0` or `"2"`; all are accepted and floats are
/// truncated.
pub fn optional_int(args: &HashMap<String, Value>, key: &str, default: i64) -> Result<i64> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .ok_or_else(|| TravelError::InvalidArgument(format!("{} must be an integer", key))),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(|f| f.trunc() as i64)
            .map_err(|_| TravelError::InvalidArgument(format!("{} must be an integer", key))),
        Some(_) => Err(TravelError::InvalidArgument(format!("{} must be an integer", key))),
    }
}
