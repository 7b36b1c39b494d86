//! Recommendation orchestration
//!
//! Runs one request through intent parsing, place search, weather and summary
//! generation. Stages run strictly in order and at most once; each remote
//! stage absorbs its own failure so that [`RecommendationService::get_recommendations`]
//! always produces a result.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{info, instrument, warn};

use crate::config::{FALLBACK_CITY, WanderlistConfig};
use crate::intent;
use crate::models::query::non_blank;
use crate::models::recommendation::dedupe_places;
use crate::models::{CurrentWeather, ForecastDay, PlaceItem, Query, RecommendationResult};
use crate::narrative::{self, ChatNarrator, SummaryGenerator};
use crate::places::{AmapPlaces, PlaceSearch};
use crate::transport::Transport;
use crate::weather::{AmapWeather, WeatherProvider};
use crate::{Result, WanderlistError};

/// Shown when a live search finds nothing
pub const NO_RESULTS_SUMMARY: &str = "未找到相关结果，请尝试更换关键词。";

/// Appended to the fallback summary when the model timed out
pub const AI_TIMEOUT_NOTE: &str = "（AI 生成超时，已为您展示基础列表）";

const FAILURE_PREFIX: &str = "获取推荐失败：";

/// Whether remote services may be called at all
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Remote services are called when their adapter is configured
    Live,
    /// Offline; results are computed locally only
    Mock,
}

/// Await a stage, replacing its error with `T::default()`
pub async fn attempt_or_default<T, F>(stage: &str, future: F) -> T
where
    T: Default,
    F: Future<Output = Result<T>>,
{
    attempt_or_else(stage, future, |_| T::default()).await
}

/// Await a stage, replacing its error with the fallback computed from it
pub async fn attempt_or_else<T, F, G>(stage: &str, future: F, fallback: G) -> T
where
    F: Future<Output = Result<T>>,
    G: FnOnce(&WanderlistError) -> T,
{
    match future.await {
        Ok(value) => value,
        Err(e) => {
            warn!("{} stage failed, degrading: {}", stage, e);
            fallback(&e)
        }
    }
}

pub struct RecommendationService {
    mode: RunMode,
    default_city: String,
    places: Option<Arc<dyn PlaceSearch>>,
    weather: Option<Arc<dyn WeatherProvider>>,
    narrator: Option<Arc<dyn SummaryGenerator>>,
}

impl RecommendationService {
    /// A service with no adapters; attach them with the `with_*` builders
    pub fn new(mode: RunMode, default_city: impl Into<String>) -> Self {
        Self {
            mode,
            default_city: default_city.into(),
            places: None,
            weather: None,
            narrator: None,
        }
    }

    /// Wire the AMap and chat completion adapters for every configured credential
    pub fn from_config(config: &WanderlistConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        let mut service = Self::new(config.run_mode(), config.defaults.city.clone());
        if config.search.api_key.is_some() {
            service = service
                .with_places(Arc::new(AmapPlaces::new(transport.clone(), &config.search)?))
                .with_weather(Arc::new(AmapWeather::new(transport.clone(), &config.search)?));
        }
        if config.narrative.api_key.is_some() {
            service = service.with_narrator(Arc::new(ChatNarrator::new(
                transport,
                &config.narrative,
            )?));
        }
        Ok(service)
    }

    #[must_use]
    pub fn with_places(mut self, places: Arc<dyn PlaceSearch>) -> Self {
        self.places = Some(places);
        self
    }

    #[must_use]
    pub fn with_weather(mut self, weather: Arc<dyn WeatherProvider>) -> Self {
        self.weather = Some(weather);
        self
    }

    #[must_use]
    pub fn with_narrator(mut self, narrator: Arc<dyn SummaryGenerator>) -> Self {
        self.narrator = Some(narrator);
        self
    }

    #[must_use]
    pub fn mode(&self) -> RunMode {
        self.mode
    }

    fn live<T: ?Sized>(&self, adapter: &Option<Arc<T>>) -> Option<Arc<T>> {
        match self.mode {
            RunMode::Live => adapter.clone(),
            RunMode::Mock => None,
        }
    }

    /// Recommendations for `query`. Never fails: every failure ends in a result.
    pub async fn get_recommendations(&self, query: &Query) -> RecommendationResult {
        match AssertUnwindSafe(self.run(query)).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                warn!("Recommendation run aborted: {}", message);
                RecommendationResult::message(format!("{FAILURE_PREFIX}{message}"), false)
            }
        }
    }

    #[instrument(skip(self, query), fields(mode = ?self.mode))]
    async fn run(&self, query: &Query) -> RecommendationResult {
        let is_mock = self.mode == RunMode::Mock;

        let target_city = query
            .explicit_destination()
            .or_else(|| query.request_city())
            .or_else(|| non_blank(Some(self.default_city.as_str())))
            .unwrap_or(FALLBACK_CITY);

        let intent = intent::parse(&query.text, query.explicit_destination(), target_city);
        info!("Recommending '{}' in {}", intent.keywords, intent.city);

        let mut items: Vec<PlaceItem> = Vec::new();
        if let Some(places) = self.live(&self.places) {
            items = attempt_or_default("places", places.search(&intent.keywords, &intent.city)).await;
        }
        let items = dedupe_places(items);

        if items.is_empty() && !is_mock {
            info!("No places found for '{}' in {}", intent.keywords, intent.city);
            return RecommendationResult::message(NO_RESULTS_SUMMARY, false);
        }

        let (current_weather, forecast) = match self.live(&self.weather) {
            Some(weather) if !intent.city.trim().is_empty() => {
                self.fetch_weather(weather.as_ref(), &intent.city).await
            }
            _ => (None, None),
        };

        let summary = match self.live(&self.narrator) {
            Some(narrator) => {
                let context = narrative::build_context(
                    query,
                    Some(intent.city.as_str()),
                    current_weather.as_ref(),
                    forecast.as_deref(),
                );
                attempt_or_else(
                    "narrative",
                    narrator.generate_summary(&query.text, &items, context.as_deref()),
                    |e| {
                        let fallback = narrative::default_summary(&items, &query.text);
                        if e.is_timeout() {
                            format!("{fallback}\n\n{AI_TIMEOUT_NOTE}")
                        } else {
                            fallback
                        }
                    },
                )
                .await
            }
            None => narrative::default_summary(&items, &query.text),
        };

        info!(
            "Recommendation ready: {} items, weather={}, forecast days={}",
            items.len(),
            current_weather.is_some(),
            forecast.as_ref().map_or(0, Vec::len)
        );

        RecommendationResult {
            summary,
            items,
            is_mock,
            current_weather,
            forecast,
        }
    }

    /// Resolve the area code once and reuse it for both weather calls
    async fn fetch_weather(
        &self,
        weather: &dyn WeatherProvider,
        city: &str,
    ) -> (Option<CurrentWeather>, Option<Vec<ForecastDay>>) {
        let Some(code) = weather.area_code(city).await else {
            return (None, None);
        };
        let current = attempt_or_default("current weather", weather.current(city, Some(code.as_str()))).await;
        let forecast = attempt_or_default("forecast", weather.forecast(city, Some(code.as_str()))).await;
        (current, forecast)
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown error".to_string()
    }
}
