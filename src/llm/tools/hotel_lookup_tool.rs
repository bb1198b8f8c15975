use crate::error::Result;
use crate::llm::tools::tool::{optional_int, required_str};
use crate::llm::tools::{LlmTool, ToolDescriptor, ToolOutcome};
use crate::search::serpapi::{provider_error, SerpApiClient};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::{debug, info, warn};

const HOTELS_ENGINE: &str = "google_hotels";

/// Candidate result fields, checked in order
pub const HOTEL_RESULT_KEYS: [&str; 3] = ["properties", "hotels_results", "hotel_results"];

pub const NO_HOTEL_DATA: &str = "No hotel data found in the response";

/// Tool for looking up hotels through the Google Hotels engine
///
/// Unlike the other lookups this one never fails on the response shape: a provider
/// error becomes `Failure("Error: ...")`, and a document with none of
/// [`HOTEL_RESULT_KEYS`] becomes `Failure(NO_HOTEL_DATA)`.
#[derive(Clone)]
pub struct HotelLookupTool {
    serpapi: SerpApiClient,
}

impl HotelLookupTool {
    pub fn new(serpapi: SerpApiClient) -> Self {
        Self { serpapi }
    }

    fn interpret(body: &Value) -> ToolOutcome {
        if let Some(error) = provider_error(body) {
            warn!(error = error.as_str(), "Hotel provider reported an error");
            return ToolOutcome::Failure(format!("Error: {}", error));
        }

        HOTEL_RESULT_KEYS
            .iter()
            .find_map(|key| body.get(*key))
            .map(|results| ToolOutcome::Success(results.clone()))
            .unwrap_or_else(|| ToolOutcome::Failure(NO_HOTEL_DATA.to_string()))
    }
}

#[async_trait]
impl LlmTool for HotelLookupTool {
    async fn run(&self, args: &HashMap<String, Value>) -> Result<ToolOutcome> {
        let query = required_str(args, "query")?;
        let check_in_date = required_str(args, "check_in_date")?;
        let check_out_date = required_str(args, "check_out_date")?;
        let hotel_class = optional_int(args, "hotel_class", 3)?;
        let adults = optional_int(args, "adults", 2)?;

        info!(
            query = query.as_str(),
            check_in_date = check_in_date.as_str(),
            check_out_date = check_out_date.as_str(),
            "Looking up hotels"
        );

        let body = self
            .serpapi
            .search(
                HOTELS_ENGINE,
                &[
                    ("q", query),
                    ("check_in_date", check_in_date),
                    ("check_out_date", check_out_date),
                    ("adults", adults.to_string()),
                    ("hotel_class", hotel_class.to_string()),
                    ("currency", "USD".to_string()),
                ],
            )
            .await?;
        debug!("Hotel response received");

        Ok(Self::interpret(&body))
    }

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::function(
            "hotel_api",
            "Retrieves hotel information based on location, dates, and optional preferences.",
            json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Parameter defines the search query. You can use anything that you would use in a regular Google Hotels search."
                    },
                    "check_in_date": {
                        "type": "string",
                        "description": "Check-in date in YYYY-MM-DD format (e.g., '2024-04-30')."
                    },
                    "check_out_date": {
                        "type": "string",
                        "description": "Check-out date in YYYY-MM-DD format (e.g., '2024-05-01')."
                    },
                    "hotel_class": {
                        "type": "integer",
                        "description": "hotel class.\n\nOptions:\n- 2: 2-star\n- 3: 3-star\n- 4: 4-star\n- 5: 5-star\n\nFor multiple classes, separate with commas (e.g., '2,3,4')."
                    },
                    "adults": {
                        "type": "integer",
                        "description": "Number of adults. Only integers, no decimals or floats (e.g., 1 or 2)"
                    }
                },
                "required": ["query", "check_in_date", "check_out_date"]
            }),
        )
    }
}
