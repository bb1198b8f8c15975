//! Thin client for the SerpApi search endpoint.
//!
//! Every travel search (events, hotels, flights, maps) is a GET against
//! `/search.json` with an `engine` selector. The provider reports most failures
//! in-band as `{"error": "..."}` with a 4xx status, so the body is parsed as JSON
//! regardless of status and handed back for the caller to inspect.

use crate::error::{Result, TravelError};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://serpapi.com";

/// Configuration for connecting to SerpApi
#[derive(Debug, Clone)]
pub struct SerpApiConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Option<Duration>,
}

impl Default for SerpApiConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("SERP_API_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            api_key: std::env::var("SERP_API_KEY").unwrap_or_default(),
            timeout: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SerpApiClient {
    client: Client,
    config: SerpApiConfig,
}

impl SerpApiClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(SerpApiConfig {
            api_key: api_key.into(),
            ..Default::default()
        })
    }

    pub fn with_config(config: SerpApiConfig) -> Result<Self> {
        let mut client_builder = Client::builder();

        if let Some(timeout) = config.timeout {
            client_builder = client_builder.timeout(timeout);
        }

        let client = client_builder.build()?;

        Ok(Self { client, config })
    }

    /// Point the client at another host (used by tests against a stub server)
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        Self::with_config(SerpApiConfig {
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout: None,
        })
    }

    /// Run one search against `engine` and return the raw JSON document
    pub async fn search(&self, engine: &str, params: &[(&str, String)]) -> Result<Value> {
        let mut query: Vec<(&str, String)> = Vec::with_capacity(params.len() + 4);
        query.push(("api_key", self.config.api_key.clone()));
        query.push(("engine", engine.to_string()));
        query.extend(params.iter().cloned());
        query.push(("hl", "en".to_string()));
        query.push(("gl", "us".to_string()));

        debug!(engine, param_count = params.len(), "Sending SerpApi search");

        let response = self
            .client
            .get(format!("{}/search.json", self.config.base_url.trim_end_matches('/')))
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        match serde_json::from_str::<Value>(&body) {
            Ok(json) => {
                if !status.is_success() {
                    warn!(engine, %status, "SerpApi returned an error status");
                }
                Ok(json)
            }
            Err(_) if !status.is_success() => Err(TravelError::ApiError(format!(
                "SerpApi request failed with status {}: {}",
                status, body
            ))),
            Err(e) => Err(e.into()),
        }
    }
}

/// Take `field` out of a provider document, failing with a typed error when absent
pub fn extract_field(engine: &str, body: &Value, field: &str) -> Result<Value> {
    body.get(field)
        .cloned()
        .ok_or_else(|| TravelError::missing_field(engine, field))
}

/// The provider's in-band error message, if any
pub fn provider_error(body: &Value) -> Option<String> {
    body.get("error").map(|e| match e {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

/// Fail with [`TravelError::ApiError`] when the provider reported an in-band error
pub fn ensure_no_provider_error(engine: &str, body: &Value) -> Result<()> {
    match provider_error(body) {
        Some(error) => Err(TravelError::ApiError(format!("{}: {}", engine, error))),
        None => Ok(()),
    }
}

/// First `limit` entries of an array field, empty when the field is absent
pub fn take_results(body: &Value, field: &str, limit: usize) -> Vec<Value> {
    body.get(field)
        .and_then(Value::as_array)
        .map(|items| items.iter().take(limit).cloned().collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    #[tokio::test]
    async fn test_search_sends_key_engine_and_locale() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/search.json")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("api_key".into(), "secret".into()),
                Matcher::UrlEncoded("engine".into(), "google_events".into()),
                Matcher::UrlEncoded("q".into(), "Events in Austin, TX".into()),
                Matcher::UrlEncoded("hl".into(), "en".into()),
                Matcher::UrlEncoded("gl".into(), "us".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"events_results": []}"#)
            .create_async()
            .await;

        let client = SerpApiClient::with_base_url("secret", server.url()).unwrap();
        let body = client
            .search("google_events", &[("q", "Events in Austin, TX".to_string())])
            .await
            .unwrap();

        assert_eq!(body, json!({"events_results": []}));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_search_returns_in_band_error_body() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/search.json")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body(r#"{"error": "Invalid API key."}"#)
            .create_async()
            .await;

        let client = SerpApiClient::with_base_url("bad", server.url()).unwrap();
        let body = client.search("google_hotels", &[]).await.unwrap();

        assert_eq!(provider_error(&body), Some("Invalid API key.".to_string()));
    }

    #[tokio::test]
    async fn test_search_non_json_error_is_api_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/search.json")
            .match_query(Matcher::Any)
            .with_status(502)
            .with_body("Bad Gateway")
            .create_async()
            .await;

        let client = SerpApiClient::with_base_url("key", server.url()).unwrap();
        let err = client.search("google_flights", &[]).await.unwrap_err();

        match err {
            TravelError::ApiError(msg) => assert!(msg.contains("502")),
            other => panic!("Expected ApiError, got {:?}", other),
        }
    }

    #[test]
    fn test_extract_field() {
        let body = json!({"properties": [{"name": "Inn"}]});
        assert_eq!(
            extract_field("google_hotels", &body, "properties").unwrap(),
            json!([{"name": "Inn"}])
        );

        let err = extract_field("google_flights", &body, "best_flights").unwrap_err();
        assert!(matches!(err, TravelError::MissingField { .. }));
    }

    #[test]
    fn test_ensure_no_provider_error() {
        assert!(ensure_no_provider_error("google_maps", &json!({"local_results": []})).is_ok());

        let err = ensure_no_provider_error("google_maps", &json!({"error": "Quota exceeded"}))
            .unwrap_err();
        assert_eq!(err.to_string(), "API error: google_maps: Quota exceeded");
    }

    #[test]
    fn test_take_results_limits_and_defaults() {
        let body = json!({"local_results": [1, 2, 3, 4, 5, 6, 7]});
        assert_eq!(take_results(&body, "local_results", 5).len(), 5);
        assert!(take_results(&body, "missing", 5).is_empty());
    }
}
