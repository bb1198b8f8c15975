use crate::error::Result;
use crate::search::serpapi::{ensure_no_provider_error, take_results, SerpApiClient};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

const ENGINE: &str = "google_hotels";
const RESULTS_FIELD: &str = "properties";
const MAX_RESULTS: usize = 20;
/// Provider sort code for lowest price first
const SORT_BY_LOWEST_PRICE: &str = "3";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelsQuery {
    pub location: String,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub adults: u32,
    pub rooms: u32,
}

impl HotelsQuery {
    fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("q", format!("hotels in {}", self.location)),
            ("check_in_date", self.check_in_date.to_string()),
            ("check_out_date", self.check_out_date.to_string()),
            ("adults", self.adults.max(1).to_string()),
            ("rooms", self.rooms.max(1).to_string()),
            ("currency", "USD".to_string()),
            ("sort_by", SORT_BY_LOWEST_PRICE.to_string()),
        ]
    }
}

#[derive(Clone)]
pub struct HotelsFinder {
    serpapi: SerpApiClient,
}

impl HotelsFinder {
    pub fn new(serpapi: SerpApiClient) -> Self {
        Self { serpapi }
    }

    /// Cheapest-first properties; a provider error fails the search
    pub async fn find(&self, query: &HotelsQuery) -> Result<Vec<Value>> {
        info!(
            location = query.location.as_str(),
            check_in = %query.check_in_date,
            check_out = %query.check_out_date,
            "Searching hotels"
        );

        let body = self.serpapi.search(ENGINE, &query.params()).await?;
        ensure_no_provider_error(ENGINE, &body)?;

        Ok(take_results(&body, RESULTS_FIELD, MAX_RESULTS))
    }
}
