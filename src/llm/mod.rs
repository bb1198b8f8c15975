pub mod gateway;
pub mod gateways;
pub mod models;
pub mod tools;

pub use gateway::{CompletionConfig, LlmGateway};
pub use models::{LlmGatewayResponse, LlmMessage, LlmToolCall, MessageRole};
pub use tools::{FunctionDescriptor, LlmTool, ToolDescriptor, ToolOutcome, ToolRegistry};
