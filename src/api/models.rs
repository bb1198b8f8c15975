//! Request and response bodies for the HTTP API.

use crate::agents::ConversationId;
use crate::error::{Result, TravelError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

fn default_one() -> u32 {
    1
}

/// Fields shared by every search request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelSearchRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub budget: f64,
    #[serde(default = "default_one")]
    pub travelers: u32,
}

impl TravelSearchRequest {
    pub fn validate(&self) -> Result<()> {
        validate_trip(self.start_date, self.end_date, self.budget)
    }
}

pub(crate) fn validate_trip(start: NaiveDate, end: NaiveDate, budget: f64) -> Result<()> {
    if end < start {
        return Err(TravelError::InvalidRequest(format!(
            "end_date {} is before start_date {}",
            end, start
        )));
    }
    if !budget.is_finite() || budget < 0.0 {
        return Err(TravelError::InvalidRequest(
            "budget must be a non-negative number".to_string(),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightSearchRequest {
    pub departure_city: String,
    pub arrival_city: String,
    #[serde(flatten)]
    pub trip: TravelSearchRequest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelSearchRequest {
    pub city: String,
    #[serde(default = "default_one")]
    pub room_count: u32,
    #[serde(flatten)]
    pub trip: TravelSearchRequest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivitySearchRequest {
    pub city: String,
    #[serde(default)]
    pub activity_type: Option<String>,
    #[serde(flatten)]
    pub trip: TravelSearchRequest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestaurantSearchRequest {
    pub city: String,
    #[serde(default)]
    pub cuisine_type: Option<String>,
    #[serde(default)]
    pub price_level: Option<String>,
    #[serde(flatten)]
    pub trip: TravelSearchRequest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Continue an earlier conversation; a new one is started when absent
    #[serde(default)]
    pub conversation_id: Option<ConversationId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub conversation_id: ConversationId,
    pub answer: String,
    pub turns: usize,
    pub tool_invocations: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}
