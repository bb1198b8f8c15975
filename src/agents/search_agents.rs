//! Budget-aware wrappers around the finders.
//!
//! Each agent turns a trip budget into the shape its finder needs (a price cap,
//! a nightly rate, a budget tier) and filters or tags the results accordingly.

use crate::error::Result;
use crate::search::{
    ActivitiesFinder, ActivitiesQuery, FlightsFinder, FlightsQuery, HotelsFinder, HotelsQuery,
    RestaurantsFinder, RestaurantsQuery,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

/// Whole days between two dates, never less than one
pub fn trip_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days().max(1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetTier {
    Low,
    Medium,
    High,
}

impl BudgetTier {
    /// Tier for a per-day activities budget
    pub fn for_daily_budget(daily: f64) -> Self {
        if daily > 200.0 {
            Self::High
        } else if daily > 100.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Coarse tier for a whole trip
    pub fn for_trip_budget(total: f64) -> Self {
        if total > 1000.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Dollar-sign price level used for restaurants at this tier
    pub fn price_level(self) -> &'static str {
        match self {
            Self::Low => "$$",
            Self::Medium => "$$$",
            Self::High => "$$$$",
        }
    }
}

/// Restaurant price level for a per-day dining budget
pub fn restaurant_price_level(daily: f64) -> &'static str {
    if daily > 100.0 {
        "$$$$"
    } else if daily > 50.0 {
        "$$$"
    } else {
        "$$"
    }
}

fn tag(mut items: Vec<Value>, key: &str, value: &str) -> Vec<Value> {
    for item in &mut items {
        if let Some(fields) = item.as_object_mut() {
            fields
                .entry(key)
                .or_insert_with(|| Value::String(value.to_string()));
        }
    }
    items
}

/// Flights within budget, or the error that prevented the search
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlightSearchResult {
    pub flights: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone)]
pub struct FlightSearchAgent {
    finder: FlightsFinder,
}

impl FlightSearchAgent {
    pub fn new(finder: FlightsFinder) -> Self {
        Self { finder }
    }

    /// Flights priced at or under `budget`, each with a `booking_url`.
    ///
    /// Never fails: a search error is reported in [`FlightSearchResult::error`].
    pub async fn search(
        &self,
        departure: &str,
        arrival: &str,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
        budget: f64,
        travelers: u32,
    ) -> FlightSearchResult {
        let mut query = FlightsQuery::new(departure, arrival, start_date).adults(travelers);
        if let Some(end_date) = end_date {
            query = query.returning(end_date);
        }

        let flights = match self.finder.find(&query).await {
            Ok(flights) => flights,
            Err(e) => {
                warn!(error = %e, "Flight search failed");
                return FlightSearchResult {
                    flights: Vec::new(),
                    error: Some(e.to_string()),
                };
            }
        };

        let url = crate::search::flights_finder::booking_link(departure, arrival);
        let flights: Vec<Value> = flights
            .into_iter()
            .filter(|flight| {
                flight
                    .get("price")
                    .and_then(Value::as_f64)
                    .is_some_and(|price| price <= budget)
            })
            .map(|mut flight| {
                if let Some(fields) = flight.as_object_mut() {
                    fields.insert("booking_url".to_string(), Value::String(url.clone()));
                }
                flight
            })
            .collect();

        info!(count = flights.len(), budget, "Found flights within budget");
        FlightSearchResult {
            flights,
            error: None,
        }
    }
}

/// Nightly rate of a hotel record, as the provider reports it
fn nightly_price(hotel: &Value) -> Option<f64> {
    hotel
        .get("price_per_night")
        .and_then(Value::as_f64)
        .or_else(|| {
            hotel
                .pointer("/rate_per_night/extracted_lowest")
                .and_then(Value::as_f64)
        })
}

#[derive(Clone)]
pub struct HotelSearchAgent {
    finder: HotelsFinder,
}

impl HotelSearchAgent {
    pub fn new(finder: HotelsFinder) -> Self {
        Self { finder }
    }

    /// Hotels whose nightly rate fits `budget` spread over the stay
    pub async fn search(
        &self,
        city: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        budget: f64,
        travelers: u32,
        rooms: u32,
    ) -> Result<Vec<Value>> {
        let nightly_budget = budget / trip_days(start_date, end_date) as f64;

        let hotels = self
            .finder
            .find(&HotelsQuery {
                location: city.to_string(),
                check_in_date: start_date,
                check_out_date: end_date,
                adults: travelers,
                rooms,
            })
            .await?;

        let hotels: Vec<Value> = hotels
            .into_iter()
            .filter(|hotel| nightly_price(hotel).is_some_and(|price| price <= nightly_budget))
            .collect();

        info!(count = hotels.len(), nightly_budget, "Found hotels within budget");
        Ok(hotels)
    }
}

#[derive(Clone)]
pub struct ActivitySearchAgent {
    finder: ActivitiesFinder,
}

impl ActivitySearchAgent {
    pub fn new(finder: ActivitiesFinder) -> Self {
        Self { finder }
    }

    /// Activities for the trip, tagged with the tier their daily budget falls in
    pub async fn search(
        &self,
        city: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        budget: f64,
        activity_type: Option<&str>,
    ) -> Result<Vec<Value>> {
        let tier = BudgetTier::for_daily_budget(budget / trip_days(start_date, end_date) as f64);
        self.search_tier(city, tier, activity_type).await
    }

    pub async fn search_tier(
        &self,
        city: &str,
        tier: BudgetTier,
        activity_type: Option<&str>,
    ) -> Result<Vec<Value>> {
        let activities = self
            .finder
            .find(&ActivitiesQuery {
                location: city.to_string(),
                activity_type: activity_type.map(str::to_string),
            })
            .await?;

        Ok(tag(activities, "budget_tier", tier.as_str()))
    }
}

#[derive(Clone)]
pub struct RestaurantSearchAgent {
    finder: RestaurantsFinder,
}

impl RestaurantSearchAgent {
    pub fn new(finder: RestaurantsFinder) -> Self {
        Self { finder }
    }

    /// Restaurants for the trip; `price_level` overrides the one derived from the budget
    pub async fn search(
        &self,
        city: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        budget: f64,
        cuisine_type: Option<&str>,
        price_level: Option<&str>,
    ) -> Result<Vec<Value>> {
        let level = price_level.unwrap_or_else(|| {
            restaurant_price_level(budget / trip_days(start_date, end_date) as f64)
        });
        self.search_level(city, level, cuisine_type).await
    }

    pub async fn search_level(
        &self,
        city: &str,
        price_level: &str,
        cuisine_type: Option<&str>,
    ) -> Result<Vec<Value>> {
        let restaurants = self
            .finder
            .find(&RestaurantsQuery {
                location: city.to_string(),
                cuisine: cuisine_type.map(str::to_string),
            })
            .await?;

        Ok(tag(restaurants, "price_level", price_level))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SerpApiClient;
    use mockito::{Matcher, Server, ServerGuard};
    use serde_json::json;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    async fn serve(body: Value) -> (ServerGuard, SerpApiClient) {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/search.json")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(body.to_string())
            .create_async()
            .await;
        let client = SerpApiClient::with_base_url("key", server.url()).unwrap();
        (server, client)
    }

    #[test]
    fn test_trip_days_floors_at_one() {
        assert_eq!(trip_days(date("2024-09-02"), date("2024-09-05")), 3);
        assert_eq!(trip_days(date("2024-09-02"), date("2024-09-02")), 1);
    }

    #[test]
    fn test_budget_tiers() {
        assert_eq!(BudgetTier::for_daily_budget(250.0), BudgetTier::High);
        assert_eq!(BudgetTier::for_daily_budget(200.0), BudgetTier::Medium);
        assert_eq!(BudgetTier::for_daily_budget(100.0), BudgetTier::Low);
        assert_eq!(BudgetTier::for_trip_budget(1500.0), BudgetTier::Medium);
        assert_eq!(BudgetTier::for_trip_budget(1000.0), BudgetTier::Low);
    }

    #[test]
    fn test_restaurant_price_levels() {
        assert_eq!(restaurant_price_level(120.0), "$$$$");
        assert_eq!(restaurant_price_level(75.0), "$$$");
        assert_eq!(restaurant_price_level(50.0), "$$");
    }

    #[tokio::test]
    async fn test_flight_agent_filters_by_price_and_adds_booking_url() {
        let (_server, client) = serve(json!({
            "best_flights": [
                {"price": 300, "airline": "Delta"},
                {"price": 650, "airline": "United"},
                {"airline": "Unpriced"}
            ]
        }))
        .await;

        let agent = FlightSearchAgent::new(FlightsFinder::new(client));
        let result = agent
            .search("ATL", "AUS", date("2024-09-02"), Some(date("2024-09-05")), 500.0, 1)
            .await;

        assert!(result.error.is_none());
        assert_eq!(result.flights.len(), 1);
        assert_eq!(result.flights[0]["airline"], "Delta");
        assert_eq!(
            result.flights[0]["booking_url"],
            "https://www.google.com/travel/flights?q=Flights%20from%20ATL%20to%20AUS"
        );
    }

    #[tokio::test]
    async fn test_flight_agent_reports_transport_error() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/search.json")
            .match_query(Matcher::Any)
            .with_status(503)
            .with_body("unavailable")
            .create_async()
            .await;
        let client = SerpApiClient::with_base_url("key", server.url()).unwrap();

        let agent = FlightSearchAgent::new(FlightsFinder::new(client));
        let result = agent
            .search("ATL", "AUS", date("2024-09-02"), None, 500.0, 1)
            .await;

        assert!(result.flights.is_empty());
        assert!(result.error.unwrap().contains("503"));
    }

    #[tokio::test]
    async fn test_hotel_agent_uses_nightly_budget() {
        let (_server, client) = serve(json!({
            "properties": [
                {"name": "Budget Inn", "price_per_night": 90},
                {"name": "Midtown Suites", "rate_per_night": {"extracted_lowest": 110}},
                {"name": "Grand", "rate_per_night": {"extracted_lowest": 400}},
                {"name": "Mystery"}
            ]
        }))
        .await;

        let agent = HotelSearchAgent::new(HotelsFinder::new(client));
        // 360 over three nights leaves 120 a night
        let hotels = agent
            .search("Atlanta", date("2024-09-02"), date("2024-09-05"), 360.0, 2, 1)
            .await
            .unwrap();

        let names: Vec<_> = hotels.iter().map(|h| h["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["Budget Inn", "Midtown Suites"]);
    }

    #[tokio::test]
    async fn test_activity_agent_tags_budget_tier() {
        let (_server, client) = serve(json!({"local_results": [{"title": "Aquarium"}]})).await;

        let agent = ActivitySearchAgent::new(ActivitiesFinder::new(client));
        let activities = agent
            .search("Atlanta", date("2024-09-02"), date("2024-09-04"), 500.0, None)
            .await
            .unwrap();

        assert_eq!(activities[0]["budget_tier"], "high");
    }

    #[tokio::test]
    async fn test_restaurant_agent_price_level() {
        let (_server, client) = serve(json!({
            "local_results": [{"title": "Mary Mac's"}, {"title": "Bacchanalia", "price_level": "$$$$"}]
        }))
        .await;
        let agent = RestaurantSearchAgent::new(RestaurantsFinder::new(client));

        let derived = agent
            .search("Atlanta", date("2024-09-02"), date("2024-09-04"), 120.0, None, None)
            .await
            .unwrap();
        assert_eq!(derived[0]["price_level"], "$$$");
        assert_eq!(derived[1]["price_level"], "$$$$");

        let requested = agent
            .search("Atlanta", date("2024-09-02"), date("2024-09-04"), 120.0, None, Some("$"))
            .await
            .unwrap();
        assert_eq!(requested[0]["price_level"], "$");
    }
}
