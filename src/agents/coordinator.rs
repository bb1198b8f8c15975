//! Whole-trip planning across the four search agents.

use crate::agents::search_agents::{
    ActivitySearchAgent, BudgetTier, FlightSearchAgent, FlightSearchResult, HotelSearchAgent,
    RestaurantSearchAgent,
};
use crate::error::Result;
use crate::search::{
    ActivitiesFinder, FlightsFinder, HotelsFinder, RestaurantsFinder, SerpApiClient,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

const FLIGHT_SHARE: f64 = 0.4;
const HOTEL_SHARE: f64 = 0.4;
const ACTIVITIES_SHARE: f64 = 0.2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRequest {
    pub departure: String,
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub budget: f64,
    #[serde(default = "default_travelers")]
    pub travelers: u32,
    #[serde(default = "default_true")]
    pub include_activities: bool,
    #[serde(default = "default_true")]
    pub include_restaurants: bool,
}

fn default_travelers() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

/// How a trip budget is split between the searches
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetAllocation {
    pub flights: f64,
    pub hotels: f64,
    pub activities: f64,
}

impl BudgetAllocation {
    pub fn split(budget: f64) -> Self {
        Self {
            flights: budget * FLIGHT_SHARE,
            hotels: budget * HOTEL_SHARE,
            activities: budget * ACTIVITIES_SHARE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripPlan {
    pub budget: BudgetAllocation,
    pub flights: FlightSearchResult,
    pub hotels: Vec<Value>,
    pub activities: Option<Vec<Value>>,
    pub restaurants: Option<Vec<Value>>,
    /// Searches that failed; their sections are left empty
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

#[derive(Clone)]
pub struct TravelCoordinator {
    flights: FlightSearchAgent,
    hotels: HotelSearchAgent,
    activities: ActivitySearchAgent,
    restaurants: RestaurantSearchAgent,
}

impl TravelCoordinator {
    pub fn new(
        flights: FlightSearchAgent,
        hotels: HotelSearchAgent,
        activities: ActivitySearchAgent,
        restaurants: RestaurantSearchAgent,
    ) -> Self {
        Self {
            flights,
            hotels,
            activities,
            restaurants,
        }
    }

    /// All four agents over one SerpApi client
    pub fn with_serpapi(serpapi: SerpApiClient) -> Self {
        Self::new(
            FlightSearchAgent::new(FlightsFinder::new(serpapi.clone())),
            HotelSearchAgent::new(HotelsFinder::new(serpapi.clone())),
            ActivitySearchAgent::new(ActivitiesFinder::new(serpapi.clone())),
            RestaurantSearchAgent::new(RestaurantsFinder::new(serpapi)),
        )
    }

    pub fn flights(&self) -> &FlightSearchAgent {
        &self.flights
    }

    pub fn hotels(&self) -> &HotelSearchAgent {
        &self.hotels
    }

    pub fn activities(&self) -> &ActivitySearchAgent {
        &self.activities
    }

    pub fn restaurants(&self) -> &RestaurantSearchAgent {
        &self.restaurants
    }

    /// Run every requested search concurrently and assemble the plan.
    ///
    /// Flights are searched one-way on the start date. A failing hotel, activity
    /// or restaurant search leaves its section empty and is listed in
    /// [`TripPlan::errors`].
    pub async fn plan_trip(&self, request: &TripRequest) -> TripPlan {
        let allocation = BudgetAllocation::split(request.budget);
        let tier = BudgetTier::for_trip_budget(request.budget);

        info!(
            departure = request.departure.as_str(),
            destination = request.destination.as_str(),
            budget = request.budget,
            tier = tier.as_str(),
            "Planning trip"
        );

        let flights = self.flights.search(
            &request.departure,
            &request.destination,
            request.start_date,
            None,
            allocation.flights,
            request.travelers,
        );
        let hotels = self.hotels.search(
            &request.destination,
            request.start_date,
            request.end_date,
            allocation.hotels,
            request.travelers,
            1,
        );
        let activities = async {
            if request.include_activities {
                Some(self.activities.search_tier(&request.destination, tier, None).await)
            } else {
                None
            }
        };
        let restaurants = async {
            if request.include_restaurants {
                Some(
                    self.restaurants
                        .search_level(&request.destination, tier.price_level(), None)
                        .await,
                )
            } else {
                None
            }
        };

        let (flights, hotels, activities, restaurants) =
            futures::join!(flights, hotels, activities, restaurants);

        let mut errors = Vec::new();
        if let Some(error) = &flights.error {
            errors.push(format!("flights: {}", error));
        }
        let hotels = settle("hotels", hotels, &mut errors);
        let activities = activities.map(|r| settle("activities", r, &mut errors));
        let restaurants = restaurants.map(|r| settle("restaurants", r, &mut errors));

        TripPlan {
            budget: allocation,
            flights,
            hotels,
            activities,
            restaurants,
            errors,
        }
    }
}

fn settle(section: &str, result: Result<Vec<Value>>, errors: &mut Vec<String>) -> Vec<Value> {
    result.unwrap_or_else(|e| {
        warn!(section, error = %e, "Trip search failed");
        errors.push(format!("{}: {}", section, e));
        Vec::new()
    })
}
