//! Name-to-handler dispatch for model-requested tool calls.

use crate::error::{Result, TravelError};
use crate::llm::tools::{
    EventLookupTool, FlightLookupTool, HotelLookupTool, LlmTool, ToolDescriptor,
    WeatherLookupTool,
};
use crate::search::serpapi::SerpApiClient;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Names the travel agent advertises to the model
pub const TRAVEL_TOOL_NAMES: [&str; 4] = ["event_api", "hotel_api", "weather_api", "flight_api"];

/// What the agent loop does when the model asks for a tool nobody registered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownToolPolicy {
    /// Answer the call with an error-tagged function response and keep going
    #[default]
    ReportToModel,
    /// Stop the run with [`TravelError::UnknownTool`]
    Abort,
}

/// Immutable set of tools, validated when built
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn LlmTool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::default()
    }

    /// The four SerpApi-backed lookups, sharing one client
    pub fn travel_tools(serpapi: SerpApiClient) -> Result<Self> {
        Self::builder()
            .tool(EventLookupTool::new(serpapi.clone()))
            .tool(HotelLookupTool::new(serpapi.clone()))
            .tool(WeatherLookupTool::new(serpapi.clone()))
            .tool(FlightLookupTool::new(serpapi))
            .expect(TRAVEL_TOOL_NAMES)
            .build()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn LlmTool>> {
        self.index.get(name).map(|&i| Arc::clone(&self.tools[i]))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Tool names in registration order
    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Descriptors in registration order, as sent to the model
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools.iter().map(|t| t.descriptor()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[derive(Default)]
pub struct ToolRegistryBuilder {
    tools: Vec<Arc<dyn LlmTool>>,
    expected: Vec<String>,
}

impl ToolRegistryBuilder {
    pub fn tool(mut self, tool: impl LlmTool + 'static) -> Self {
        self.tools.push(Arc::new(tool));
        self
    }

    /// Names the model may emit; `build` fails unless each one has a handler
    pub fn expect<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expected.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn build(self) -> Result<ToolRegistry> {
        let mut index = HashMap::with_capacity(self.tools.len());

        for (i, tool) in self.tools.iter().enumerate() {
            let name = tool.name();
            if index.insert(name.clone(), i).is_some() {
                return Err(TravelError::ConfigError(format!(
                    "tool '{}' registered more than once",
                    name
                )));
            }
            debug!(tool = name.as_str(), "Registered tool");
        }

        let missing: Vec<&str> = self
            .expected
            .iter()
            .filter(|name| !index.contains_key(name.as_str()))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            return Err(TravelError::ConfigError(format!(
                "no handler registered for tool(s): {}",
                missing.join(", ")
            )));
        }

        Ok(ToolRegistry {
            tools: self.tools,
            index,
        })
    }
}
