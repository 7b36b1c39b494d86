//! Point-of-interest search
//!
//! Broadens the caller's keywords, runs a keyword search against the maps
//! service and tops up thin result sets with a second, generic search.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use crate::amap::{self, PlaceResponse};
use crate::config::SearchConfig;
use crate::intent::GENERIC_KEYWORDS;
use crate::models::PlaceItem;
use crate::models::recommendation::MAX_ITEMS;
use crate::transport::{HttpRequest, Transport};
use crate::{Result, WanderlistError};

/// Scenic-spot synonyms searched when the query has no specific intent
pub const SCENIC_KEYWORDS: &str = "景点|旅游景点|名胜古迹|风景区|公园|博物馆|纪念馆";

/// Keyword of the broad second-phase search
pub const FALLBACK_KEYWORD: &str = "景点";

/// First-phase result count below which the broad search runs
pub const MIN_RESULTS: usize = 5;

const PAGE_SIZE: usize = 25;

#[async_trait]
pub trait PlaceSearch: Send + Sync {
    async fn search(&self, keywords: &str, city: &str) -> Result<Vec<PlaceItem>>;
}

/// Broaden recall without discarding the caller's specific intent
#[must_use]
pub fn augment_keywords(keywords: &str) -> String {
    let keywords = keywords.trim();
    if keywords.is_empty() || keywords == GENERIC_KEYWORDS {
        SCENIC_KEYWORDS.to_string()
    } else if !keywords.contains("景点") && !keywords.contains("旅游") {
        format!("{keywords}|景点|旅游景点")
    } else {
        keywords.to_string()
    }
}

/// Keep every primary result in order, append unseen secondary results, cap at 50
#[must_use]
pub fn merge_places(primary: Vec<PlaceItem>, secondary: Vec<PlaceItem>) -> Vec<PlaceItem> {
    let mut seen: HashSet<String> = primary.iter().map(|p| p.name.clone()).collect();
    let mut merged = primary;
    merged.extend(
        secondary
            .into_iter()
            .filter(|place| seen.insert(place.name.clone())),
    );
    merged.truncate(MAX_ITEMS);
    merged
}

/// AMap keyword search client
pub struct AmapPlaces {
    transport: Arc<dyn Transport>,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl AmapPlaces {
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

    async fn query(&self, keywords: &str, city: &str) -> Result<Vec<PlaceItem>> {
        let request = HttpRequest::get(format!("{}/v3/place/text", self.base_url), self.timeout)
            .param("key", self.api_key.as_str())
            .param("keywords", keywords)
            .param("city", city)
            .param("citylimit", "true")
            .param("offset", PAGE_SIZE.to_string())
            .param("page", "1")
            .param("extensions", "all");

        let response = self.transport.request(request).await?;
        let parsed: PlaceResponse = amap::decode(response, "place search")?;
        let places: Vec<PlaceItem> = parsed.pois.into_iter().filter_map(|p| p.into_place()).collect();
        debug!("'{}' in {} returned {} places", keywords, city, places.len());
        Ok(places)
    }
}

#[async_trait]
impl PlaceSearch for AmapPlaces {
    #[instrument(skip(self))]
    async fn search(&self, keywords: &str, city: &str) -> Result<Vec<PlaceItem>> {
        let augmented = augment_keywords(keywords);
        let primary = self.query(&augmented, city).await?;

        if primary.len() >= MIN_RESULTS {
            info!("Found {} places for '{}' in {}", primary.len(), augmented, city);
            return Ok(primary);
        }

        debug!(
            "Only {} places for '{}', broadening to '{}'",
            primary.len(),
            augmented,
            FALLBACK_KEYWORD
        );
        let secondary = match self.query(FALLBACK_KEYWORD, city).await {
            Ok(places) => places,
            Err(e) => {
                warn!("Broad place search failed, keeping primary results: {}", e);
                Vec::new()
            }
        };

        let merged = merge_places(primary, secondary);
        info!("Found {} places in {} after broadening", merged.len(), city);
        Ok(merged)
    }
}
