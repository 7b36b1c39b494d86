//! Assembled output of one recommendation run

use serde::{Deserialize, Serialize};

use super::{CurrentWeather, ForecastDay, PlaceItem};

/// Maximum number of places carried in a result
pub const MAX_ITEMS: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResult {
    pub summary: String,
    pub items: Vec<PlaceItem>,
    /// True when the run was offline and no remote service was attempted
    pub is_mock: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_weather: Option<CurrentWeather>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecast: Option<Vec<ForecastDay>>,
}

impl RecommendationResult {
    /// A result carrying only a message
    pub fn message(summary: impl Into<String>, is_mock: bool) -> Self {
        Self {
            summary: summary.into(),
            items: Vec::new(),
            is_mock,
            current_weather: None,
            forecast: None,
        }
    }
}

/// Drop repeated names (first occurrence wins) and cap the list at [`MAX_ITEMS`]
#[must_use]
pub fn dedupe_places(items: Vec<PlaceItem>) -> Vec<PlaceItem> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.name.clone()))
        .take(MAX_ITEMS)
        .collect()
}
