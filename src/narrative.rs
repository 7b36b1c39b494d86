//! Natural-language summaries
//!
//! Builds the background context handed to the language model, calls an
//! OpenAI-compatible chat completion endpoint, and renders the deterministic
//! summary used whenever no model answer is available.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::config::NarrativeConfig;
use crate::models::query::non_blank;
use crate::models::{CurrentWeather, ForecastDay, PlaceItem, Query};
use crate::transport::{HttpRequest, Transport};
use crate::{Result, WanderlistError};

/// Items listed by [`default_summary`]
pub const SUMMARY_LIST_LIMIT: usize = 5;

#[async_trait]
pub trait SummaryGenerator: Send + Sync {
    async fn generate_summary(
        &self,
        query: &str,
        items: &[PlaceItem],
        context: Option<&str>,
    ) -> Result<String>;
}

/// Background context for the model; `None` when nothing is known.
///
/// `destination` is the city the run resolved; an explicit destination on the
/// query takes precedence over it.
#[must_use]
pub fn build_context(
    query: &Query,
    destination: Option<&str>,
    current: Option<&CurrentWeather>,
    forecast: Option<&[ForecastDay]>,
) -> Option<String> {
    let mut segments = Vec::new();

    let destination = non_blank(query.destination_override.as_deref()).or(non_blank(destination));
    if let Some(destination) = destination {
        segments.push(format!("目的地：{destination}"));
    }
    if let Some(departure) = non_blank(query.departure.as_deref()) {
        segments.push(format!("出发地：{departure}"));
    }
    if let Some(date) = non_blank(query.travel_date.as_deref()) {
        segments.push(format!("出行日期：{date}"));
    }
    if let Some(location) = non_blank(query.current_location.as_deref()) {
        segments.push(format!("当前位置：{location}"));
    }
    if let Some(weather) = current {
        let mut parts = vec![format!("{} {}°C", weather.condition, weather.temperature_c)];
        if let Some(wind) = weather.format_wind() {
            parts.push(wind);
        }
        if let Some(humidity) = weather.humidity_pct {
            parts.push(format!("湿度{humidity}%"));
        }
        segments.push(format!("当前天气：{}", parts.join(" ")));
    }
    if let Some(days) = forecast.filter(|d| !d.is_empty()) {
        let rendered: Vec<String> = days.iter().map(ForecastDay::describe).collect();
        segments.push(format!("天气预报：{}", rendered.join("; ")));
    }

    if segments.is_empty() {
        None
    } else {
        Some(segments.join("，"))
    }
}

/// Summary rendered without a language model
#[must_use]
pub fn default_summary(items: &[PlaceItem], query: &str) -> String {
    if items.is_empty() {
        return format!("抱歉，没有找到与「{query}」相关的地点。");
    }

    let mut summary = format!("为您找到以下与「{query}」相关的地点：\n");
    for (index, item) in items.iter().take(SUMMARY_LIST_LIMIT).enumerate() {
        summary.push_str(&format!("{}. {}\n", index + 1, item.describe()));
    }
    if items.len() > SUMMARY_LIST_LIMIT {
        summary.push_str(&format!(
            "另有 {} 个地点未列出。",
            items.len() - SUMMARY_LIST_LIMIT
        ));
    }
    summary.trim_end().to_string()
}

/// User message: query, optional context, the full numbered list and instructions
fn build_prompt(query: &str, items: &[PlaceItem], context: Option<&str>) -> String {
    let mut prompt = format!("用户需求：{query}\n");
    if let Some(context) = context {
        prompt.push_str(&format!("背景信息：{context}\n"));
    }
    prompt.push_str(&format!("候选地点（共 {} 个）：\n", items.len()));
    for (index, item) in items.iter().enumerate() {
        prompt.push_str(&format!("{}. {}\n", index + 1, item.describe()));
    }
    prompt.push_str(
        "请从以上地点中挑选最值得推荐的几处，并逐一说明推荐理由；\
         如果需求涉及路线或多个地点的游玩安排，请给出建议的游览顺序。",
    );
    prompt
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    enable_search: Option<bool>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Chat completion client
pub struct ChatNarrator {
    transport: Arc<dyn Transport>,
    api_key: String,
    base_url: String,
    model: String,
    system_prompt: String,
    enable_search: bool,
    timeout: Duration,
}

impl ChatNarrator {
    pub fn new(transport: Arc<dyn Transport>, config: &NarrativeConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| WanderlistError::config("narrative.api_key is not set"))?;
        Ok(Self {
            transport,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            system_prompt: config.system_prompt.clone(),
            enable_search: config.enable_search,
            timeout: config.timeout(),
        })
    }
}

#[async_trait]
impl SummaryGenerator for ChatNarrator {
    #[instrument(skip(self, items, context), fields(items = items.len()))]
    async fn generate_summary(
        &self,
        query: &str,
        items: &[PlaceItem],
        context: Option<&str>,
    ) -> Result<String> {
        let prompt = build_prompt(query, items, context);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &self.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            enable_search: self.enable_search.then_some(true),
        };
        let body = serde_json::to_value(&body)
            .map_err(|e| WanderlistError::validation(format!("Unserializable chat request: {e}")))?;

        let request = HttpRequest::post(
            format!("{}/chat/completions", self.base_url),
            body,
            self.timeout,
        )
        .header("Authorization", format!("Bearer {}", self.api_key));

        let start = Instant::now();
        let response = self.transport.request(request).await?;
        if !response.is_success() {
            warn!("Chat completion returned HTTP {}", response.status);
            return Err(WanderlistError::remote(format!(
                "chat completion returned HTTP {}",
                response.status
            )));
        }

        let parsed: ChatResponse = serde_json::from_value(response.body).map_err(|e| {
            WanderlistError::remote(format!("chat completion returned a malformed payload: {e}"))
        })?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| WanderlistError::remote("chat completion returned an empty message"))?;

        info!(
            "Generated summary of {} chars in {:.3}s",
            content.chars().count(),
            start.elapsed().as_secs_f64()
        );
        debug!("Summary: {}", content);
        Ok(content)
    }
}
