//! HTTP API for the travel agent.

pub mod models;
pub mod routes;

pub use routes::{router, serve, ApiError, AppState};
