//! The tool-calling loop behind the travel chat.
//!
//! One run drives a user request to a final answer: the request is wrapped in the
//! mission prompt and sent to the model, any tool calls the model asks for are
//! executed in order and answered with function-response messages, and this repeats
//! until the model replies without tool calls. Every run is bounded by a turn limit
//! and a wall-clock deadline.

use crate::agents::conversation::Conversation;
use crate::error::{LoopLimit, Result, TravelError};
use crate::llm::gateway::{CompletionConfig, LlmGateway};
use crate::llm::models::{LlmGatewayResponse, LlmMessage, LlmToolCall};
use crate::llm::tools::{ToolOutcome, ToolRegistry, UnknownToolPolicy};
use chrono::{Local, NaiveDate};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Bounds on a single agent run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentLimits {
    /// Model round trips allowed before the run is abandoned
    pub max_turns: usize,
    /// Wall-clock budget for the whole run, tools included
    pub deadline: Duration,
}

impl Default for AgentLimits {
    fn default() -> Self {
        Self {
            max_turns: 8,
            deadline: Duration::from_secs(120),
        }
    }
}

/// Result of a completed run
#[derive(Debug, Clone)]
pub struct AgentRun {
    pub conversation: Conversation,
    pub answer: String,
    pub turns: usize,
    pub tool_invocations: usize,
}

enum LoopState {
    /// Messages waiting to be sent to the model
    AwaitingModel(Vec<LlmMessage>),
    /// The model asked for one or more tool calls
    ExecutingTools(LlmGatewayResponse),
    Done(String),
}

/// Wrap a raw user request in the agent's standing instructions
pub fn mission_prompt(prompt: &str, today: NaiveDate) -> String {
    format!(
        "Thought: I need to understand the user's request and determine if I need to use any tools to assist them.\n\
         Action:\n\
         \n\
         - If the user's request needs following APIs from available ones: weather, event, hotel, flight, and I have all the required parameters, call the corresponding API.\n\
         - Otherwise, if I need more information to call an API, I will ask the user for it.\n\
         - If the user's request doesn't need an API call or I don't have enough information to call one, respond to the user directly using the chat history.\n\
         - Respond with the final answer only\n\
         \n\
         [QUESTION]\n\
         {}\n\
         \n\
         [DATETIME]\n\
         {}",
        prompt,
        today.format("%Y-%m-%d")
    )
}

/// Tool-calling travel agent
///
/// The agent holds no conversation state; it can be shared behind an `Arc` and run
/// for many conversations at once.
///
/// # Examples
///
/// ```ignore
/// use travel_agent::agents::{Conversation, TravelAgent};
/// use travel_agent::llm::gateways::GeminiGateway;
/// use travel_agent::llm::ToolRegistry;
/// use travel_agent::search::SerpApiClient;
/// use std::sync::Arc;
///
/// let gateway = Arc::new(GeminiGateway::new(gemini_key)?);
/// let tools = ToolRegistry::travel_tools(SerpApiClient::new(serp_key)?)?;
/// let agent = TravelAgent::builder(gateway, "gemini-1.5-pro-001").tools(tools).build();
///
/// let run = agent.run(Conversation::new(), "What events are there in Atlanta?").await?;
/// println!("{}", run.answer);
/// ```
pub struct TravelAgent {
    gateway: Arc<dyn LlmGateway>,
    model: String,
    tools: ToolRegistry,
    limits: AgentLimits,
    completion: CompletionConfig,
    unknown_tool_policy: UnknownToolPolicy,
}

impl TravelAgent {
    pub fn builder(gateway: Arc<dyn LlmGateway>, model: impl Into<String>) -> TravelAgentBuilder {
        TravelAgentBuilder::new(gateway, model.into())
    }

    pub fn limits(&self) -> AgentLimits {
        self.limits
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Answer `prompt` within `conversation`.
    ///
    /// The updated conversation comes back inside [`AgentRun`]. On error the
    /// conversation passed in is consumed; callers that want to keep history across
    /// failures should pass a clone.
    pub async fn run(&self, conversation: Conversation, prompt: &str) -> Result<AgentRun> {
        self.run_on(conversation, prompt, Local::now().date_naive()).await
    }

    /// Same as [`TravelAgent::run`] with an explicit date for the mission prompt
    pub async fn run_on(
        &self,
        mut conversation: Conversation,
        prompt: &str,
        today: NaiveDate,
    ) -> Result<AgentRun> {
        let deadline = Instant::now() + self.limits.deadline;
        let descriptors = self.tools.descriptors();
        let mut turns = 0;
        let mut tool_invocations = 0;

        info!(conversation = %conversation.id(), "Starting agent run");

        let mut state = LoopState::AwaitingModel(vec![LlmMessage::user(mission_prompt(
            prompt, today,
        ))]);

        loop {
            state = match state {
                LoopState::AwaitingModel(pending) => {
                    conversation.extend(pending);
                    turns += 1;
                    debug!(turn = turns, messages = conversation.len(), "Sending turn to model");

                    let response = self
                        .bounded(
                            deadline,
                            self.gateway.complete(
                                &self.model,
                                conversation.messages(),
                                &descriptors,
                                &self.completion,
                            ),
                        )
                        .await??;

                    if response.tool_calls.is_empty() {
                        match response.content {
                            Some(text) if !text.trim().is_empty() => LoopState::Done(text),
                            _ => {
                                warn!(
                                    conversation = %conversation.id(),
                                    "Model returned an empty reply"
                                );
                                return Err(TravelError::GatewayError(
                                    "model returned neither text nor tool calls".to_string(),
                                ));
                            }
                        }
                    } else if turns >= self.limits.max_turns {
                        warn!(
                            conversation = %conversation.id(),
                            max_turns = self.limits.max_turns,
                            "Max turns reached with tool calls still pending"
                        );
                        return Err(TravelError::LoopExceeded(LoopLimit::TurnLimit { turns }));
                    } else {
                        LoopState::ExecutingTools(response)
                    }
                }
                LoopState::ExecutingTools(response) => {
                    info!("Tool calls requested: {}", response.tool_calls.len());

                    conversation.push(LlmMessage::assistant_tool_calls(
                        response.content,
                        response.tool_calls.clone(),
                    ));

                    let mut replies = Vec::with_capacity(response.tool_calls.len());
                    for call in &response.tool_calls {
                        let (outcome, invoked) = self.execute(call, deadline).await?;
                        if invoked {
                            tool_invocations += 1;
                        }
                        replies.push(LlmMessage::function_response(call, &outcome));
                    }

                    LoopState::AwaitingModel(replies)
                }
                LoopState::Done(answer) => {
                    conversation.push(LlmMessage::assistant(answer.clone()));
                    info!(
                        conversation = %conversation.id(),
                        turns,
                        tool_invocations,
                        "Agent run complete"
                    );
                    return Ok(AgentRun {
                        conversation,
                        answer,
                        turns,
                        tool_invocations,
                    });
                }
            };
        }
    }

    /// Run one tool call; the flag reports whether a tool was actually invoked
    async fn execute(&self, call: &LlmToolCall, deadline: Instant) -> Result<(ToolOutcome, bool)> {
        let Some(tool) = self.tools.get(&call.name) else {
            return match self.unknown_tool_policy {
                UnknownToolPolicy::Abort => Err(TravelError::UnknownTool(call.name.clone())),
                UnknownToolPolicy::ReportToModel => {
                    warn!("Tool not found: {}", call.name);
                    Ok((
                        ToolOutcome::Failure(format!(
                            "Unknown tool '{}'. Available tools: {}",
                            call.name,
                            self.tools.names().join(", ")
                        )),
                        false,
                    ))
                }
            };
        };

        info!("Executing tool: {}", call.name);
        let outcome = match self.bounded(deadline, tool.run(&call.arguments)).await? {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(tool = call.name.as_str(), error = %e, "Tool execution failed");
                ToolOutcome::Failure(e.to_string())
            }
        };

        Ok((outcome, true))
    }

    async fn bounded<F, T>(&self, deadline: Instant, fut: F) -> Result<T>
    where
        F: Future<Output = T>,
    {
        tokio::time::timeout_at(deadline, fut).await.map_err(|_| {
            TravelError::LoopExceeded(LoopLimit::Deadline {
                after: self.limits.deadline,
            })
        })
    }
}

/// Builder for constructing a [`TravelAgent`]
pub struct TravelAgentBuilder {
    gateway: Arc<dyn LlmGateway>,
    model: String,
    tools: Option<ToolRegistry>,
    limits: AgentLimits,
    completion: CompletionConfig,
    unknown_tool_policy: UnknownToolPolicy,
}

impl TravelAgentBuilder {
    fn new(gateway: Arc<dyn LlmGateway>, model: String) -> Self {
        Self {
            gateway,
            model,
            tools: None,
            limits: AgentLimits::default(),
            completion: CompletionConfig::default(),
            unknown_tool_policy: UnknownToolPolicy::default(),
        }
    }

    pub fn tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn limits(mut self, limits: AgentLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Set the maximum number of model turns (default: 8)
    pub fn max_turns(mut self, max_turns: usize) -> Self {
        self.limits.max_turns = max_turns;
        self
    }

    /// Set the wall-clock budget for one run (default: 120s)
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.limits.deadline = deadline;
        self
    }

    pub fn completion_config(mut self, config: CompletionConfig) -> Self {
        self.completion = config;
        self
    }

    pub fn unknown_tool_policy(mut self, policy: UnknownToolPolicy) -> Self {
        self.unknown_tool_policy = policy;
        self
    }

    pub fn build(self) -> TravelAgent {
        TravelAgent {
            gateway: self.gateway,
            model: self.model,
            tools: self.tools.unwrap_or_default(),
            limits: AgentLimits {
                max_turns: self.limits.max_turns.max(1),
                deadline: self.limits.deadline,
            },
            completion: self.completion,
            unknown_tool_policy: self.unknown_tool_policy,
        }
    }
}
