//! Weather lookups
//!
//! A city name is first geocoded to an administrative area code; live
//! conditions and the daily forecast are then queried by that code. Weather
//! is always optional to callers, so service-level failures surface as `None`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use crate::amap::{self, ForecastResponse, GeocodeResponse, LiveResponse};
use crate::config::SearchConfig;
use crate::models::{CurrentWeather, ForecastDay};
use crate::transport::{HttpRequest, Transport};
use crate::{Result, WanderlistError};

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Area code for a city name; `None` on any failure
    async fn area_code(&self, city: &str) -> Option<String>;

    /// Live conditions, resolving the area code when not supplied
    async fn current(&self, city: &str, area_code: Option<&str>) -> Result<Option<CurrentWeather>>;

    /// Daily forecast, resolving the area code when not supplied
    async fn forecast(&self, city: &str, area_code: Option<&str>)
    -> Result<Option<Vec<ForecastDay>>>;
}

/// AMap geocoding and weather client
pub struct AmapWeather {
    transport: Arc<dyn Transport>,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl AmapWeather {
    pub fn new(transport: Arc<dyn Transport>, config: &SearchConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| WanderlistError::config("search.api_key is not set"))?;
        Ok(Self {
            transport,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout(),
        })
    }

    async fn geocode(&self, city: &str) -> Result<Option<String>> {
        // Address only, no city filter
        let request = HttpRequest::get(format!("{}/v3/geocode/geo", self.base_url), self.timeout)
            .param("key", self.api_key.as_str())
            .param("address", city);
        let response = self.transport.request(request).await?;
        let parsed: GeocodeResponse = amap::decode(response, "geocode")?;
        Ok(parsed.geocodes.into_iter().next().and_then(|g| g.adcode))
    }

    async fn resolve(&self, city: &str, area_code: Option<&str>) -> Option<String> {
        match area_code {
            Some(code) => Some(code.to_string()),
            None => self.area_code(city).await,
        }
    }

    fn weather_request(&self, area_code: &str, extensions: &str) -> HttpRequest {
        HttpRequest::get(
            format!("{}/v3/weather/weatherInfo", self.base_url),
            self.timeout,
        )
        .param("key", self.api_key.as_str())
        .param("city", area_code)
        .param("extensions", extensions)
    }
}

#[async_trait]
impl WeatherProvider for AmapWeather {
    #[instrument(skip(self))]
    async fn area_code(&self, city: &str) -> Option<String> {
        match self.geocode(city).await {
            Ok(Some(code)) => {
                debug!("Resolved {} to area code {}", city, code);
                Some(code)
            }
            Ok(None) => {
                warn!("No area code found for '{}'", city);
                None
            }
            Err(e) => {
                warn!("Geocoding '{}' failed: {}", city, e);
                None
            }
        }
    }

    #[instrument(skip(self))]
    async fn current(&self, city: &str, area_code: Option<&str>) -> Result<Option<CurrentWeather>> {
        let Some(code) = self.resolve(city, area_code).await else {
            return Ok(None);
        };

        let response = self.transport.request(self.weather_request(&code, "base")).await?;
        let parsed: LiveResponse = match amap::decode(response, "live weather") {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Live weather unavailable for {}: {}", city, e);
                return Ok(None);
            }
        };

        let current = parsed.lives.into_iter().next().map(|live| live.into_weather(city));
        if let Some(weather) = &current {
            info!(
                "Current weather in {}: {} {}°C",
                weather.city, weather.condition, weather.temperature_c
            );
        }
        Ok(current)
    }

    #[instrument(skip(self))]
    async fn forecast(
        &self,
        city: &str,
        area_code: Option<&str>,
    ) -> Result<Option<Vec<ForecastDay>>> {
        let Some(code) = self.resolve(city, area_code).await else {
            return Ok(None);
        };

        let response = self.transport.request(self.weather_request(&code, "all")).await?;
        let parsed: ForecastResponse = match amap::decode(response, "weather forecast") {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Forecast unavailable for {}: {}", city, e);
                return Ok(None);
            }
        };

        let days: Vec<ForecastDay> = parsed
            .forecasts
            .into_iter()
            .next()
            .map(|f| f.casts.into_iter().filter_map(|c| c.into_day()).collect())
            .unwrap_or_default();

        if days.is_empty() {
            return Ok(None);
        }
        info!("Forecast for {}: {} days", city, days.len());
        Ok(Some(days))
    }
}
