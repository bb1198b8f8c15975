use crate::error::Result;
use crate::llm::models::{LlmGatewayResponse, LlmMessage};
use crate::llm::tools::ToolDescriptor;
use async_trait::async_trait;

/// Configuration for LLM completion
///
/// Defaults keep answers short and focused: low temperature, narrow nucleus
/// sampling and a small output budget.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: usize,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            temperature: 0.5,
            top_p: 0.3,
            max_tokens: 128,
        }
    }
}

/// Abstract interface for LLM providers
///
/// A gateway is stateless: the whole conversation is passed on every call, so one
/// gateway can serve any number of conversations at once.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Complete one model turn, returning text and any requested tool calls
    async fn complete(
        &self,
        model: &str,
        messages: &[LlmMessage],
        tools: &[ToolDescriptor],
        config: &CompletionConfig,
    ) -> Result<LlmGatewayResponse>;
}
