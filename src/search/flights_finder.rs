use crate::error::Result;
use crate::search::serpapi::{provider_error, SerpApiClient};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

const ENGINE: &str = "google_flights";

/// One-way search when `return_date` is absent, round trip otherwise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightsQuery {
    /// IATA code of the departure airport
    pub departure_airport: String,
    /// IATA code of the arrival airport
    pub arrival_airport: String,
    pub outbound_date: NaiveDate,
    #[serde(default)]
    pub return_date: Option<NaiveDate>,
    #[serde(default = "default_adults")]
    pub adults: u32,
    #[serde(default)]
    pub children: u32,
    #[serde(default)]
    pub infants_in_seat: u32,
    #[serde(default)]
    pub infants_on_lap: u32,
}

fn default_adults() -> u32 {
    1
}

impl FlightsQuery {
    pub fn new(
        departure_airport: impl Into<String>,
        arrival_airport: impl Into<String>,
        outbound_date: NaiveDate,
    ) -> Self {
        Self {
            departure_airport: departure_airport.into(),
            arrival_airport: arrival_airport.into(),
            outbound_date,
            return_date: None,
            adults: default_adults(),
            children: 0,
            infants_in_seat: 0,
            infants_on_lap: 0,
        }
    }

    pub fn returning(mut self, date: NaiveDate) -> Self {
        self.return_date = Some(date);
        self
    }

    pub fn adults(mut self, adults: u32) -> Self {
        self.adults = adults.max(1);
        self
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("departure_id", self.departure_airport.clone()),
            ("arrival_id", self.arrival_airport.clone()),
            ("outbound_date", self.outbound_date.to_string()),
            ("currency", "USD".to_string()),
            ("adults", self.adults.to_string()),
            ("children", self.children.to_string()),
            ("infants_in_seat", self.infants_in_seat.to_string()),
            ("infants_on_lap", self.infants_on_lap.to_string()),
        ];
        match self.return_date {
            Some(date) => params.push(("return_date", date.to_string())),
            None => params.push(("type", "2".to_string())),
        }
        params
    }
}

/// Google Flights link for an airport pair
pub fn booking_link(departure_airport: &str, arrival_airport: &str) -> String {
    format!(
        "https://www.google.com/travel/flights?q={}",
        urlencoding::encode(&format!(
            "Flights from {} to {}",
            departure_airport, arrival_airport
        ))
    )
}

#[derive(Clone)]
pub struct FlightsFinder {
    serpapi: SerpApiClient,
}

impl FlightsFinder {
    pub fn new(serpapi: SerpApiClient) -> Self {
        Self { serpapi }
    }

    /// The provider's `best_flights`, each carrying a `booking_link`.
    ///
    /// An in-band provider error is logged and yields an empty list; transport
    /// failures are returned as errors.
    pub async fn find(&self, query: &FlightsQuery) -> Result<Vec<Value>> {
        info!(
            from = query.departure_airport.as_str(),
            to = query.arrival_airport.as_str(),
            outbound = %query.outbound_date,
            "Searching flights"
        );

        let body = self.serpapi.search(ENGINE, &query.params()).await?;

        if let Some(error) = provider_error(&body) {
            warn!(error = error.as_str(), "Flight search returned an error");
            return Ok(Vec::new());
        }

        let link = booking_link(&query.departure_airport, &query.arrival_airport);
        let flights = body
            .get("best_flights")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(|mut flight| {
                if let Some(fields) = flight.as_object_mut() {
                    fields
                        .entry("booking_link")
                        .or_insert_with(|| Value::String(link.clone()));
                }
                flight
            })
            .collect();

        Ok(flights)
    }
}
