//! Current weather snapshot

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Live conditions for a city at report time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentWeather {
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_code: Option<String>,
    /// Human-readable condition, e.g. "多云"
    pub condition: String,
    /// Temperature in Celsius
    pub temperature_c: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_direction: Option<String>,
    /// Wind force as reported, e.g. "≤3"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_power: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity_pct: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_time: Option<NaiveDateTime>,
}

impl CurrentWeather {
    /// Wind as "东南风3级", present only when both direction and force are known
    #[must_use]
    pub fn format_wind(&self) -> Option<String> {
        match (&self.wind_direction, &self.wind_power) {
            (Some(direction), Some(power)) => Some(format!("{direction}风{power}级")),
            _ => None,
        }
    }
}
