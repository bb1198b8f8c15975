use crate::error::Result;
use crate::llm::tools::tool::{optional_str, required_str};
use crate::llm::tools::{LlmTool, ToolDescriptor, ToolOutcome};
use crate::search::serpapi::{extract_field, SerpApiClient};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::info;

pub(crate) const EVENTS_ENGINE: &str = "google_events";
pub(crate) const EVENTS_FIELD: &str = "events_results";
pub(crate) const DEFAULT_HTICHIPS: &str = "date:today";

/// Tool for looking up events through the Google Events engine
///
/// Returns the provider's `events_results` list. A response without that field is a
/// [`crate::TravelError::MissingField`] error.
#[derive(Clone)]
pub struct EventLookupTool {
    serpapi: SerpApiClient,
}

impl EventLookupTool {
    pub fn new(serpapi: SerpApiClient) -> Self {
        Self { serpapi }
    }
}

/// Shared by the event and weather tools, which hit the same engine.
pub(crate) async fn search_events(
    serpapi: &SerpApiClient,
    query: String,
    htichips: String,
) -> Result<Value> {
    let body = serpapi.search(EVENTS_ENGINE, &[("q", query), ("htichips", htichips)]).await?;
    extract_field(EVENTS_ENGINE, &body, EVENTS_FIELD)
}

#[async_trait]
impl LlmTool for EventLookupTool {
    async fn run(&self, args: &HashMap<String, Value>) -> Result<ToolOutcome> {
        let query = required_str(args, "query")?;
        let htichips = optional_str(args, "htichips", DEFAULT_HTICHIPS);

        info!(query = query.as_str(), htichips = htichips.as_str(), "Looking up events");

        let events = search_events(&self.serpapi, query, htichips).await?;
        Ok(ToolOutcome::Success(events))
    }

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::function(
            "event_api",
            "Retrieves event information based on a query and optional filters.",
            json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The query you want to search for (e.g., 'Events in Austin, TX')."
                    },
                    "htichips": {
                        "type": "string",
                        "description": "Optional filters used for search. Default: 'date:today'.\n\nOptions:\n- 'date:today' - Today's events\n- 'date:tomorrow' - Tomorrow's events\n- 'date:week' - This week's events\n- 'date:weekend' - This weekend's events\n- 'date:next_week' - Next week's events\n- 'date:month' - This month's events\n- 'date:next_month' - Next month's events\n- 'event_type:Virtual-Event' - Online events"
                    }
                },
                "required": ["query"]
            }),
        )
    }
}
