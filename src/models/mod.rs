//! Data models for the wanderlist library
//!
//! This module contains the core domain models organized by concern:
//! - Query: the caller's request and the intent derived from it
//! - Place: points of interest returned by place search
//! - Weather / Forecast: current conditions and daily forecast
//! - Recommendation: the assembled result of one run

pub mod forecast;
pub mod place;
pub mod query;
pub mod recommendation;
pub mod weather;

// Re-export all public types for convenient access
pub use forecast::ForecastDay;
pub use place::{Coordinate, PlaceItem};
pub use query::{ParsedIntent, Query};
pub use recommendation::RecommendationResult;
pub use weather::CurrentWeather;
