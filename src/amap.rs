//! AMap web service response structures and conversion utilities
//!
//! The service reports failures in-band (`"status": "0"`) and encodes empty
//! text fields as `[]`, so every optional text field goes through
//! [`optional_text`].

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::models::{Coordinate, CurrentWeather, ForecastDay, PlaceItem};
use crate::transport::HttpResponse;
use crate::{Result, WanderlistError};

/// Accept a string, an empty array or null; blank strings become `None`
fn optional_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Envelope shared by every endpoint
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default, deserialize_with = "optional_text")]
    status: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    info: Option<String>,
}

/// Decode a response body, failing with a remote error on HTTP or in-band failure
pub fn decode<T: serde::de::DeserializeOwned>(response: HttpResponse, endpoint: &str) -> Result<T> {
    if !response.is_success() {
        return Err(WanderlistError::remote(format!(
            "{endpoint} returned HTTP {}",
            response.status
        )));
    }

    let envelope: Envelope = serde_json::from_value(response.body.clone()).map_err(|e| {
        WanderlistError::remote(format!("{endpoint} returned a malformed payload: {e}"))
    })?;
    if envelope.status.as_deref() != Some("1") {
        return Err(WanderlistError::remote(format!(
            "{endpoint} failed: {}",
            envelope.info.unwrap_or_else(|| "unknown error".to_string())
        )));
    }

    serde_json::from_value(response.body).map_err(|e| {
        WanderlistError::remote(format!("{endpoint} returned a malformed payload: {e}"))
    })
}

/// `/v3/place/text` response
#[derive(Debug, Deserialize)]
pub struct PlaceResponse {
    #[serde(default)]
    pub pois: Vec<Poi>,
}

#[derive(Debug, Deserialize)]
pub struct Poi {
    #[serde(default, deserialize_with = "optional_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub business_area: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub cityname: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub distance: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub tel: Option<String>,
    #[serde(default)]
    pub photos: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
pub struct Photo {
    #[serde(default, deserialize_with = "optional_text")]
    pub url: Option<String>,
}

impl Poi {
    /// Convert to a [`PlaceItem`]; records without a name are dropped
    #[must_use]
    pub fn into_place(self) -> Option<PlaceItem> {
        let name = self.name?;
        Some(PlaceItem {
            name,
            address: self.address.or(self.business_area),
            coordinate: self.location.as_deref().and_then(Coordinate::parse),
            city: self.cityname,
            distance_meters: self.distance.and_then(|d| d.trim().parse().ok()),
            phone: self.tel,
            image_url: self.photos.into_iter().next().and_then(|p| p.url),
        })
    }
}

/// `/v3/geocode/geo` response
#[derive(Debug, Deserialize)]
pub struct GeocodeResponse {
    #[serde(default)]
    pub geocodes: Vec<Geocode>,
}

#[derive(Debug, Deserialize)]
pub struct Geocode {
    #[serde(default, deserialize_with = "optional_text")]
    pub adcode: Option<String>,
}

/// `/v3/weather/weatherInfo?extensions=base` response
#[derive(Debug, Deserialize)]
pub struct LiveResponse {
    #[serde(default)]
    pub lives: Vec<Live>,
}

#[derive(Debug, Deserialize)]
pub struct Live {
    #[serde(default, deserialize_with = "optional_text")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub adcode: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub weather: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub temperature: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub winddirection: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub windpower: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub humidity: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub reporttime: Option<String>,
}

impl Live {
    #[must_use]
    pub fn into_weather(self, fallback_city: &str) -> CurrentWeather {
        CurrentWeather {
            city: self.city.unwrap_or_else(|| fallback_city.to_string()),
            area_code: self.adcode,
            condition: self.weather.unwrap_or_default(),
            temperature_c: parse_temperature(self.temperature.as_deref()),
            wind_direction: self.winddirection,
            wind_power: self.windpower,
            humidity_pct: self.humidity.and_then(|h| h.trim().parse().ok()),
            report_time: self
                .reporttime
                .and_then(|t| NaiveDateTime::parse_from_str(&t, "%Y-%m-%d %H:%M:%S").ok()),
        }
    }
}

/// `/v3/weather/weatherInfo?extensions=all` response
#[derive(Debug, Deserialize)]
pub struct ForecastResponse {
    #[serde(default)]
    pub forecasts: Vec<Forecast>,
}

#[derive(Debug, Deserialize)]
pub struct Forecast {
    #[serde(default)]
    pub casts: Vec<Cast>,
}

#[derive(Debug, Deserialize)]
pub struct Cast {
    #[serde(default, deserialize_with = "optional_text")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub week: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub dayweather: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub nightweather: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub daytemp: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub nighttemp: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub daywind: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub nightwind: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub daypower: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub nightpower: Option<String>,
}

impl Cast {
    /// Convert to a [`ForecastDay`]; casts without a parseable date are dropped
    #[must_use]
    pub fn into_day(self) -> Option<ForecastDay> {
        let date = NaiveDate::parse_from_str(self.date.as_deref()?, "%Y-%m-%d").ok()?;
        Some(ForecastDay {
            date,
            weekday: self.week,
            day_condition: self.dayweather.unwrap_or_default(),
            night_condition: self.nightweather.unwrap_or_default(),
            day_temp_c: parse_temperature(self.daytemp.as_deref()),
            night_temp_c: parse_temperature(self.nighttemp.as_deref()),
            day_wind: self.daywind,
            night_wind: self.nightwind,
            day_power: self.daypower,
            night_power: self.nightpower,
        })
    }
}

fn parse_temperature(value: Option<&str>) -> f32 {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(0.0)
}
