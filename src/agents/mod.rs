//! Agents that answer travel requests.
//!
//! - [`TravelAgent`] - tool-calling chat loop over an [`LlmGateway`](crate::llm::LlmGateway)
//! - [`TravelCoordinator`] - splits a trip budget across the search agents
//! - [`FlightSearchAgent`], [`HotelSearchAgent`], [`ActivitySearchAgent`],
//!   [`RestaurantSearchAgent`] - budget filters over the structured finders

pub mod conversation;
pub mod coordinator;
pub mod search_agents;
pub mod travel_agent;

pub use conversation::{Conversation, ConversationId, ConversationStore, StoreLimits};
pub use coordinator::{BudgetAllocation, TravelCoordinator, TripPlan, TripRequest};
pub use search_agents::{
    ActivitySearchAgent, BudgetTier, FlightSearchAgent, FlightSearchResult, HotelSearchAgent,
    RestaurantSearchAgent,
};
pub use travel_agent::{mission_prompt, AgentLimits, AgentRun, TravelAgent, TravelAgentBuilder};
