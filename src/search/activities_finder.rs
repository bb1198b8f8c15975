use crate::error::Result;
use crate::search::serpapi::{ensure_no_provider_error, take_results, SerpApiClient};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

const ENGINE: &str = "google_maps";
const RESULTS_FIELD: &str = "local_results";
const MAX_RESULTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ActivitiesQuery {
    pub location: String,
    /// Narrows the search, e.g. "museums" or "hiking"
    #[serde(default)]
    pub activity_type: Option<String>,
}

impl ActivitiesQuery {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            activity_type: None,
        }
    }

    fn search_text(&self) -> String {
        match self.activity_type.as_deref().map(str::trim) {
            Some(kind) if !kind.is_empty() => format!("{} in {}", kind, self.location),
            _ => format!("attractions in {}", self.location),
        }
    }
}

#[derive(Clone)]
pub struct ActivitiesFinder {
    serpapi: SerpApiClient,
}

impl ActivitiesFinder {
    pub fn new(serpapi: SerpApiClient) -> Self {
        Self { serpapi }
    }

    /// Top map results for things to do around `query.location`
    pub async fn find(&self, query: &ActivitiesQuery) -> Result<Vec<Value>> {
        let text = query.search_text();
        info!(q = text.as_str(), "Searching activities");

        let body = self
            .serpapi
            .search(ENGINE, &[("q", text), ("type", "search".to_string())])
            .await?;
        ensure_no_provider_error(ENGINE, &body)?;

        Ok(take_results(&body, RESULTS_FIELD, MAX_RESULTS))
    }
}
