//! Structured searches behind the HTTP API.
//!
//! The chat tools in [`crate::llm::tools`] hand raw provider documents to the
//! model. The finders here take typed queries and return trimmed result lists
//! for the search agents to filter.

pub mod activities_finder;
pub mod flights_finder;
pub mod hotels_finder;
pub mod restaurants_finder;
pub mod serpapi;

pub use activities_finder::{ActivitiesFinder, ActivitiesQuery};
pub use flights_finder::{FlightsFinder, FlightsQuery};
pub use hotels_finder::{HotelsFinder, HotelsQuery};
pub use restaurants_finder::{RestaurantsFinder, RestaurantsQuery};
pub use serpapi::{SerpApiClient, SerpApiConfig};
