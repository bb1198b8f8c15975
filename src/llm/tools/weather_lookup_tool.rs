use crate::error::Result;
use crate::llm::tools::event_lookup_tool::{search_events, DEFAULT_HTICHIPS};
use crate::llm::tools::tool::required_str;
use crate::llm::tools::{LlmTool, ToolDescriptor, ToolOutcome};
use crate::search::serpapi::SerpApiClient;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::{info, warn};

/// Tool advertised to the model as a weather lookup.
///
/// There is no weather engine behind it: the query is sent to the Google Events engine
/// with today's filter chip and the `events_results` field is returned, so it fails
/// exactly like [`super::EventLookupTool`] when that field is absent.
#[derive(Clone)]
pub struct WeatherLookupTool {
    serpapi: SerpApiClient,
}

impl WeatherLookupTool {
    pub fn new(serpapi: SerpApiClient) -> Self {
        Self { serpapi }
    }
}

#[async_trait]
impl LlmTool for WeatherLookupTool {
    async fn run(&self, args: &HashMap<String, Value>) -> Result<ToolOutcome> {
        let query = required_str(args, "query")?;

        info!(query = query.as_str(), "Looking up weather");
        warn!("weather_api is served by the google_events engine");

        let results = search_events(&self.serpapi, query, DEFAULT_HTICHIPS.to_string()).await?;
        Ok(ToolOutcome::Success(results))
    }

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::function(
            "weather_api",
            "Retrieves weather information based on a query.",
            json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The query you want to search for (e.g., 'Weather in Austin, TX')."
                    }
                },
                "required": ["query"]
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TravelError;
    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn test_routes_through_events_engine() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/search.json")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("engine".into(), "google_events".into()),
                Matcher::UrlEncoded("q".into(), "Weather in Austin, TX".into()),
                Matcher::UrlEncoded("htichips".into(), "date:today".into()),
            ]))
            .with_body(r#"{"events_results": [{"title": "Sunny Street Fair"}]}"#)
            .create_async()
            .await;

        let tool =
            WeatherLookupTool::new(SerpApiClient::with_base_url("key", server.url()).unwrap());
        let mut args = HashMap::new();
        args.insert("query".to_string(), json!("Weather in Austin, TX"));

        let outcome = tool.run(&args).await.unwrap();

        assert_eq!(outcome, ToolOutcome::Success(json!([{"title": "Sunny Street Fair"}])));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_events_results_is_missing_field() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/search.json")
            .match_query(Matcher::Any)
            .with_body(r#"{"answer_box": {"temperature": "72"}}"#)
            .create_async()
            .await;

        let tool =
            WeatherLookupTool::new(SerpApiClient::with_base_url("key", server.url()).unwrap());
        let mut args = HashMap::new();
        args.insert("query".to_string(), json!("Weather in Austin, TX"));

        let err = tool.run(&args).await.unwrap_err();
        assert!(matches!(
            err,
            TravelError::MissingField { ref field, .. } if field == "events_results"
        ));
    }

    #[test]
    fn test_descriptor() {
        let tool = WeatherLookupTool::new(SerpApiClient::new("key").unwrap());
        assert_eq!(tool.descriptor().function.name, "weather_api");
    }
}
