use crate::error::Result;
use crate::search::serpapi::{ensure_no_provider_error, take_results, SerpApiClient};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

const ENGINE: &str = "google_maps";
const RESULTS_FIELD: &str = "local_results";
const MAX_RESULTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RestaurantsQuery {
    pub location: String,
    #[serde(default)]
    pub cuisine: Option<String>,
}

impl RestaurantsQuery {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            cuisine: None,
        }
    }

    fn search_text(&self) -> String {
        match self.cuisine.as_deref().map(str::trim) {
            Some(cuisine) if !cuisine.is_empty() => {
                format!("{} restaurants in {}", cuisine, self.location)
            }
            _ => format!("restaurants in {}", self.location),
        }
    }
}

#[derive(Clone)]
pub struct RestaurantsFinder {
    serpapi: SerpApiClient,
}

impl RestaurantsFinder {
    pub fn new(serpapi: SerpApiClient) -> Self {
        Self { serpapi }
    }

    pub async fn find(&self, query: &RestaurantsQuery) -> Result<Vec<Value>> {
        let text = query.search_text();
        info!(q = text.as_str(), "Searching restaurants");

        let body = self
            .serpapi
            .search(ENGINE, &[("q", text), ("type", "search".to_string())])
            .await?;
        ensure_no_provider_error(ENGINE, &body)?;

        Ok(take_results(&body, RESULTS_FIELD, MAX_RESULTS))
    }
}
