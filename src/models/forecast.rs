//! Daily forecast entry

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One day of a multi-day forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastDay {
    pub date: NaiveDate,
    /// 1 = Monday ... 7 = Sunday, as reported by the service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekday: Option<String>,
    pub day_condition: String,
    pub night_condition: String,
    pub day_temp_c: f32,
    pub night_temp_c: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_wind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub night_wind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_power: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub night_power: Option<String>,
}

impl ForecastDay {
    /// `2024-05-01: 白天晴 28°C, 夜间多云 18°C`
    #[must_use]
    pub fn describe(&self) -> String {
        format!(
            "{}: 白天{} {}°C, 夜间{} {}°C",
            self.date, self.day_condition, self.day_temp_c, self.night_condition, self.night_temp_c
        )
    }
}
