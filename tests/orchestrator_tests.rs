//! Integration tests for the recommendation orchestrator

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;

use wanderlist::orchestrator::{AI_TIMEOUT_NOTE, NO_RESULTS_SUMMARY};
use wanderlist::{
    CurrentWeather, ForecastDay, PlaceItem, PlaceSearch, Query, RecommendationService, RunMode,
    SummaryGenerator, TransportErrorCode, WanderlistError, WeatherProvider,
};

type Result<T> = std::result::Result<T, WanderlistError>;

enum PlacesBehaviour {
    Return(Vec<PlaceItem>),
    Fail,
    Panic,
}

struct FakePlaces {
    behaviour: PlacesBehaviour,
    calls: Mutex<Vec<(String, String)>>,
}

impl FakePlaces {
    fn returning(names: &[&str]) -> Arc<Self> {
        Self::with(PlacesBehaviour::Return(
            names.iter().map(|n| PlaceItem::new(*n)).collect(),
        ))
    }

    fn with(behaviour: PlacesBehaviour) -> Arc<Self> {
        Arc::new(Self {
            behaviour,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlaceSearch for FakePlaces {
    async fn search(&self, keywords: &str, city: &str) -> Result<Vec<PlaceItem>> {
        self.calls
            .lock()
            .unwrap()
            .push((keywords.to_string(), city.to_string()));
        match &self.behaviour {
            PlacesBehaviour::Return(items) => Ok(items.clone()),
            PlacesBehaviour::Fail => Err(WanderlistError::remote("INVALID_USER_KEY")),
            PlacesBehaviour::Panic => panic!("place index corrupted"),
        }
    }
}

#[derive(Default)]
struct FakeWeather {
    area_code_calls: AtomicUsize,
    current_codes: Mutex<Vec<Option<String>>>,
    forecast_codes: Mutex<Vec<Option<String>>>,
    fail: bool,
}

impl FakeWeather {
    fn calls(&self) -> usize {
        self.area_code_calls.load(Ordering::SeqCst)
            + self.current_codes.lock().unwrap().len()
            + self.forecast_codes.lock().unwrap().len()
    }
}

#[async_trait]
impl WeatherProvider for FakeWeather {
    async fn area_code(&self, _city: &str) -> Option<String> {
        self.area_code_calls.fetch_add(1, Ordering::SeqCst);
        Some("330100".to_string())
    }

    async fn current(&self, city: &str, area_code: Option<&str>) -> Result<Option<CurrentWeather>> {
        self.current_codes
            .lock()
            .unwrap()
            .push(area_code.map(str::to_string));
        if self.fail {
            return Err(WanderlistError::transport(TransportErrorCode::Network, "down"));
        }
        Ok(Some(CurrentWeather {
            city: city.to_string(),
            area_code: area_code.map(str::to_string),
            condition: "晴".to_string(),
            temperature_c: 25.0,
            wind_direction: None,
            wind_power: None,
            humidity_pct: Some(55),
            report_time: None,
        }))
    }

    async fn forecast(
        &self,
        _city: &str,
        area_code: Option<&str>,
    ) -> Result<Option<Vec<ForecastDay>>> {
        self.forecast_codes
            .lock()
            .unwrap()
            .push(area_code.map(str::to_string));
        if self.fail {
            return Err(WanderlistError::remote("INVALID_PARAMS"));
        }
        Ok(Some(vec![ForecastDay {
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            weekday: Some("3".to_string()),
            day_condition: "晴".to_string(),
            night_condition: "多云".to_string(),
            day_temp_c: 28.0,
            night_temp_c: 18.0,
            day_wind: None,
            night_wind: None,
            day_power: None,
            night_power: None,
        }]))
    }
}

enum NarratorBehaviour {
    Answer(&'static str),
    Timeout,
    Fail,
}

struct FakeNarrator {
    behaviour: NarratorBehaviour,
    calls: Mutex<Vec<(String, usize, Option<String>)>>,
}

impl FakeNarrator {
    fn new(behaviour: NarratorBehaviour) -> Arc<Self> {
        Arc::new(Self {
            behaviour,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<(String, usize, Option<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SummaryGenerator for FakeNarrator {
    async fn generate_summary(
        &self,
        query: &str,
        items: &[PlaceItem],
        context: Option<&str>,
    ) -> Result<String> {
        self.calls.lock().unwrap().push((
            query.to_string(),
            items.len(),
            context.map(str::to_string),
        ));
        match self.behaviour {
            NarratorBehaviour::Answer(text) => Ok(text.to_string()),
            NarratorBehaviour::Timeout => Err(WanderlistError::transport(
                TransportErrorCode::Timeout,
                "no answer within 60000ms",
            )),
            NarratorBehaviour::Fail => Err(WanderlistError::remote("empty message")),
        }
    }
}

fn live(
    places: Arc<FakePlaces>,
    weather: Arc<FakeWeather>,
    narrator: Arc<FakeNarrator>,
) -> RecommendationService {
    RecommendationService::new(RunMode::Live, "北京")
        .with_places(places)
        .with_weather(weather)
        .with_narrator(narrator)
}

#[tokio::test]
async fn live_run_combines_all_sources() {
    let places = FakePlaces::returning(&["西湖", "灵隐寺", "西湖", "雷峰塔"]);
    let weather = Arc::new(FakeWeather::default());
    let narrator = FakeNarrator::new(NarratorBehaviour::Answer("推荐先游西湖，再去灵隐寺。"));
    let service = live(places.clone(), weather.clone(), narrator.clone());

    let result = service
        .get_recommendations(&Query::new("我想去杭州玩,从上海出发").with_travel_date("2024-05-01"))
        .await;

    assert_eq!(result.summary, "推荐先游西湖，再去灵隐寺。");
    assert!(!result.is_mock);
    let names: Vec<&str> = result.items.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["西湖", "灵隐寺", "雷峰塔"]);
    assert_eq!(result.current_weather.unwrap().condition, "晴");
    assert_eq!(result.forecast.unwrap().len(), 1);

    assert_eq!(places.calls(), vec![("景点 旅游".to_string(), "杭州".to_string())]);

    // One area code lookup shared by both weather calls
    assert_eq!(weather.area_code_calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        *weather.current_codes.lock().unwrap(),
        vec![Some("330100".to_string())]
    );
    assert_eq!(
        *weather.forecast_codes.lock().unwrap(),
        vec![Some("330100".to_string())]
    );

    let calls = narrator.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1, 3, "narrative sees the de-duplicated list");
    let context = calls[0].2.as_deref().unwrap();
    assert!(context.starts_with("目的地：杭州，"));
    assert!(context.contains("出行日期：2024-05-01"));
    assert!(context.contains("当前天气：晴 25°C 湿度55%"));
    assert!(context.contains("2024-05-01: 白天晴 28°C, 夜间多云 18°C"));
}

#[tokio::test]
async fn explicit_destination_wins_over_query_text() {
    let places = FakePlaces::returning(&["夫子庙"]);
    let service = live(
        places.clone(),
        Arc::new(FakeWeather::default()),
        FakeNarrator::new(NarratorBehaviour::Answer("ok")),
    );

    service
        .get_recommendations(&Query::new("我想去上海玩").with_destination("南京"))
        .await;

    assert_eq!(places.calls()[0].1, "南京");
}

#[tokio::test]
async fn request_city_is_the_default_for_inference() {
    let places = FakePlaces::returning(&["宽窄巷子"]);
    let service = live(
        places.clone(),
        Arc::new(FakeWeather::default()),
        FakeNarrator::new(NarratorBehaviour::Answer("ok")),
    );

    service
        .get_recommendations(&Query::new("吃什么好").with_city("成都"))
        .await;

    assert_eq!(
        places.calls(),
        vec![("餐厅 美食".to_string(), "成都".to_string())]
    );
}

#[tokio::test]
async fn empty_live_search_short_circuits() {
    let places = FakePlaces::returning(&[]);
    let weather = Arc::new(FakeWeather::default());
    let narrator = FakeNarrator::new(NarratorBehaviour::Answer("unused"));
    let service = live(places, weather.clone(), narrator.clone());

    let result = service.get_recommendations(&Query::new("去杭州玩")).await;

    assert_eq!(result.summary, NO_RESULTS_SUMMARY);
    assert!(result.items.is_empty());
    assert!(!result.is_mock);
    assert!(result.current_weather.is_none());
    assert_eq!(weather.calls(), 0);
    assert!(narrator.calls().is_empty());
}

#[tokio::test]
async fn places_failure_becomes_no_results() {
    let weather = Arc::new(FakeWeather::default());
    let narrator = FakeNarrator::new(NarratorBehaviour::Answer("unused"));
    let service = live(
        FakePlaces::with(PlacesBehaviour::Fail),
        weather.clone(),
        narrator.clone(),
    );

    let result = service.get_recommendations(&Query::new("去杭州玩")).await;

    assert_eq!(result.summary, NO_RESULTS_SUMMARY);
    assert!(!result.is_mock);
    assert_eq!(weather.calls(), 0);
    assert!(narrator.calls().is_empty());
}

#[tokio::test]
async fn narrative_timeout_falls_back_with_note() {
    let service = live(
        FakePlaces::returning(&["西湖", "灵隐寺"]),
        Arc::new(FakeWeather::default()),
        FakeNarrator::new(NarratorBehaviour::Timeout),
    );

    let result = service.get_recommendations(&Query::new("去杭州玩")).await;

    assert!(result.summary.contains("1. 西湖"));
    assert!(result.summary.contains("2. 灵隐寺"));
    assert!(result.summary.contains(AI_TIMEOUT_NOTE));
    assert_eq!(result.items.len(), 2);
}

#[tokio::test]
async fn narrative_failure_falls_back_without_note() {
    let service = live(
        FakePlaces::returning(&["西湖"]),
        Arc::new(FakeWeather::default()),
        FakeNarrator::new(NarratorBehaviour::Fail),
    );

    let result = service.get_recommendations(&Query::new("去杭州玩")).await;

    assert!(result.summary.contains("1. 西湖"));
    assert!(!result.summary.contains(AI_TIMEOUT_NOTE));
}

#[tokio::test]
async fn weather_failure_is_not_fatal() {
    let weather = Arc::new(FakeWeather {
        fail: true,
        ..FakeWeather::default()
    });
    let narrator = FakeNarrator::new(NarratorBehaviour::Answer("ok"));
    let service = live(FakePlaces::returning(&["西湖"]), weather, narrator.clone());

    let result = service.get_recommendations(&Query::new("去杭州玩")).await;

    assert_eq!(result.summary, "ok");
    assert!(result.current_weather.is_none());
    assert!(result.forecast.is_none());
    assert_eq!(narrator.calls()[0].2.as_deref(), Some("目的地：杭州"));
}

#[tokio::test]
async fn live_without_narrator_uses_default_summary() {
    let service = RecommendationService::new(RunMode::Live, "北京")
        .with_places(FakePlaces::returning(&["a", "b", "c", "d", "e", "f", "g"]));

    let result = service.get_recommendations(&Query::new("景点")).await;

    assert!(result.summary.contains("5. e"));
    assert!(!result.summary.contains("6. f"));
    assert!(result.summary.ends_with("另有 2 个地点未列出。"));
    assert_eq!(result.items.len(), 7);
    assert!(!result.is_mock);
}

#[tokio::test]
async fn items_are_capped_at_fifty() {
    let names: Vec<String> = (0..70).map(|i| format!("地点{i}")).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let narrator = FakeNarrator::new(NarratorBehaviour::Answer("ok"));
    let service = live(
        FakePlaces::returning(&refs),
        Arc::new(FakeWeather::default()),
        narrator.clone(),
    );

    let result = service.get_recommendations(&Query::new("景点")).await;

    assert_eq!(result.items.len(), 50);
    assert_eq!(narrator.calls()[0].1, 50);
}

#[tokio::test]
async fn mock_mode_calls_nothing() {
    let places = FakePlaces::returning(&["西湖"]);
    let weather = Arc::new(FakeWeather::default());
    let narrator = FakeNarrator::new(NarratorBehaviour::Answer("unused"));
    let service = RecommendationService::new(RunMode::Mock, "北京")
        .with_places(places.clone())
        .with_weather(weather.clone())
        .with_narrator(narrator.clone());

    let result = service.get_recommendations(&Query::new("去杭州玩")).await;

    assert!(result.is_mock);
    assert!(result.items.is_empty());
    assert!(result.summary.contains("去杭州玩"));
    assert!(places.calls().is_empty());
    assert_eq!(weather.calls(), 0);
    assert!(narrator.calls().is_empty());
}

#[tokio::test]
async fn panics_become_failure_results() {
    let service = RecommendationService::new(RunMode::Live, "北京")
        .with_places(FakePlaces::with(PlacesBehaviour::Panic));

    let result = service.get_recommendations(&Query::new("去杭州玩")).await;

    assert!(result.summary.starts_with("获取推荐失败："));
    assert!(result.summary.contains("place index corrupted"));
    assert!(result.items.is_empty());
    assert!(!result.is_mock);
}

#[tokio::test]
async fn never_fails_for_odd_queries() {
    let service = live(
        FakePlaces::returning(&["西湖"]),
        Arc::new(FakeWeather::default()),
        FakeNarrator::new(NarratorBehaviour::Answer("ok")),
    );

    for text in ["", "   ", "从出发", "去去去去去去去玩", "🙂🙂", "一日游"] {
        let result = service.get_recommendations(&Query::new(text)).await;
        assert!(!result.summary.is_empty(), "query {text:?}");
    }
}
