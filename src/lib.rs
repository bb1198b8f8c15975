pub mod agents;
pub mod api;
pub mod config;
pub mod error;
pub mod llm;
pub mod search;

pub use error::{Result, TravelError};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::agents::{
        AgentLimits, AgentRun, Conversation, ConversationId, TravelAgent, TravelCoordinator,
    };
    pub use crate::error::{Result, TravelError};
    pub use crate::llm::gateways::{GeminiGateway, OllamaGateway};
    pub use crate::llm::tools::{LlmTool, ToolDescriptor, ToolOutcome, ToolRegistry};
    pub use crate::llm::{CompletionConfig, LlmGateway, LlmMessage, MessageRole};
    pub use crate::search::SerpApiClient;
}
