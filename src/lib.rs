//! `wanderlist` - travel recommendations from free-text queries
//!
//! This library parses a travel query into a destination and search keywords,
//! searches points of interest, looks up the weather and asks a language model
//! for a short recommendation, degrading gracefully when any service fails.

pub mod amap;
pub mod config;
pub mod error;
pub mod intent;
pub mod models;
pub mod narrative;
pub mod orchestrator;
pub mod places;
pub mod transport;
pub mod weather;

// Re-export core types for public API
pub use config::WanderlistConfig;
pub use error::{TransportErrorCode, WanderlistError};
pub use models::{
    Coordinate, CurrentWeather, ForecastDay, ParsedIntent, PlaceItem, Query, RecommendationResult,
};
pub use narrative::{ChatNarrator, SummaryGenerator};
pub use orchestrator::{RecommendationService, RunMode};
pub use places::{AmapPlaces, PlaceSearch};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, Method, Transport};
pub use weather::{AmapWeather, WeatherProvider};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, WanderlistError>;
