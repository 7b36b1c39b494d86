//! Request and intent models

use serde::{Deserialize, Serialize};

/// A single recommendation request
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    /// Free-text query, e.g. "我想去上海玩,从北京出发"
    pub text: String,
    /// Explicit destination; always wins over anything inferred from `text`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_override: Option<String>,
    /// City the caller is browsing in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub travel_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_location: Option<String>,
}

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination_override = Some(destination.into());
        self
    }

    #[must_use]
    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    #[must_use]
    pub fn with_departure(mut self, departure: impl Into<String>) -> Self {
        self.departure = Some(departure.into());
        self
    }

    #[must_use]
    pub fn with_travel_date(mut self, date: impl Into<String>) -> Self {
        self.travel_date = Some(date.into());
        self
    }

    #[must_use]
    pub fn with_current_location(mut self, location: impl Into<String>) -> Self {
        self.current_location = Some(location.into());
        self
    }

    /// Explicit destination, ignoring blank values
    #[must_use]
    pub fn explicit_destination(&self) -> Option<&str> {
        non_blank(self.destination_override.as_deref())
    }

    /// Request-level city, ignoring blank values
    #[must_use]
    pub fn request_city(&self) -> Option<&str> {
        non_blank(self.city.as_deref())
    }
}

pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Destination and search keywords extracted from a query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedIntent {
    pub keywords: String,
    pub city: String,
}
