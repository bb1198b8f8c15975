use crate::error::Result;
use crate::llm::tools::tool::{optional_int, required_str};
use crate::llm::tools::{LlmTool, ToolDescriptor, ToolOutcome};
use crate::search::serpapi::{extract_field, SerpApiClient};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::info;

const FLIGHTS_ENGINE: &str = "google_flights";
const FLIGHTS_FIELD: &str = "properties";

/// Free-text flight lookup for the chat agent
///
/// Returns the provider's `properties` field. For structured airport-to-airport
/// searches with booking links see [`crate::search::FlightsFinder`].
#[derive(Clone)]
pub struct FlightLookupTool {
    serpapi: SerpApiClient,
}

impl FlightLookupTool {
    pub fn new(serpapi: SerpApiClient) -> Self {
        Self { serpapi }
    }
}

#[async_trait]
impl LlmTool for FlightLookupTool {
    async fn run(&self, args: &HashMap<String, Value>) -> Result<ToolOutcome> {
        let query = required_str(args, "query")?;
        let departure_date = required_str(args, "departure_date")?;
        let return_date = required_str(args, "return_date")?;
        let adults = optional_int(args, "adults", 2)?;

        info!(
            query = query.as_str(),
            departure_date = departure_date.as_str(),
            return_date = return_date.as_str(),
            "Looking up flights"
        );

        let body = self
            .serpapi
            .search(
                FLIGHTS_ENGINE,
                &[
                    ("q", query),
                    ("departure_date", departure_date),
                    ("return_date", return_date),
                    ("adults", adults.to_string()),
                    ("currency", "USD".to_string()),
                ],
            )
            .await?;

        Ok(ToolOutcome::Success(extract_field(FLIGHTS_ENGINE, &body, FLIGHTS_FIELD)?))
    }

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::function(
            "flight_api",
            "Retrieves flight information based on a query and travel dates.",
            json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The route you want to search for (e.g., 'Flights from Atlanta to Austin')."
                    },
                    "departure_date": {
                        "type": "string",
                        "description": "Departure date in YYYY-MM-DD format (e.g., '2024-04-30')."
                    },
                    "return_date": {
                        "type": "string",
                        "description": "Return date in YYYY-MM-DD format (e.g., '2024-05-07')."
                    },
                    "adults": {
                        "type": "integer",
                        "description": "Number of adults. Only integers, no decimals or floats (e.g., 1 or 2)"
                    }
                },
                "required": ["query", "departure_date", "return_date"]
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TravelError;
    use mockito::{Matcher, Server};

    fn args() -> HashMap<String, Value> {
        let mut args = HashMap::new();
        args.insert("query".to_string(), json!("Flights from ATL to AUS"));
        args.insert("departure_date".to_string(), json!("2026-11-01"));
        args.insert("return_date".to_string(), json!("2026-11-05"));
        args
    }

    #[tokio::test]
    async fn test_returns_properties() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/search.json")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("engine".into(), "google_flights".into()),
                Matcher::UrlEncoded("departure_date".into(), "2026-11-01".into()),
                Matcher::UrlEncoded("return_date".into(), "2026-11-05".into()),
                Matcher::UrlEncoded("adults".into(), "2".into()),
            ]))
            .with_body(r#"{"properties": [{"price": 240}]}"#)
            .create_async()
            .await;

        let tool = FlightLookupTool::new(SerpApiClient::with_base_url("key", server.url()).unwrap());
        let outcome = tool.run(&args()).await.unwrap();

        assert_eq!(outcome, ToolOutcome::Success(json!([{"price": 240}])));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_properties_is_missing_field() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/search.json")
            .match_query(Matcher::Any)
            .with_body(r#"{"best_flights": []}"#)
            .create_async()
            .await;

        let tool = FlightLookupTool::new(SerpApiClient::with_base_url("key", server.url()).unwrap());
        let err = tool.run(&args()).await.unwrap_err();

        assert!(matches!(err, TravelError::MissingField { .. }));
    }

    #[tokio::test]
    async fn test_return_date_is_required() {
        let tool = FlightLookupTool::new(SerpApiClient::new("key").unwrap());
        let mut args = args();
        args.remove("return_date");

        let err = tool.run(&args).await.unwrap_err();
        assert!(err.to_string().contains("return_date parameter is required"));
    }
}
