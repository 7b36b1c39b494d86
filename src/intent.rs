//! Travel intent extraction
//!
//! Pulls a destination city and search keywords out of a free-text query.
//! Destination extraction is an ordered list of rules, each a pattern paired
//! with a validator; the first candidate a validator accepts wins.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::config::FALLBACK_CITY;
use crate::models::ParsedIntent;
use crate::models::query::non_blank;

/// Keywords used when the query carries no usable search terms
pub const GENERIC_KEYWORDS: &str = "景点 旅游";

const FOOD_KEYWORDS: &str = "餐厅 美食";
const COFFEE_KEYWORDS: &str = "咖啡店";
const MAX_CITY_CHARS: usize = 4;

static DEPARTURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"从\s*([^\s,，。、!！?？]+?)\s*出发").expect("departure pattern is valid")
});

static DESTINATION_RULES: LazyLock<Vec<DestinationRule>> = LazyLock::new(|| {
    vec![
        DestinationRule::new(
            "verb + city + trip word",
            r"(?:我想去|去|在|到|玩)([^\s,，。、!！?？]+?)(?:玩|旅游|一日游|两日游|三日游|出发)",
        ),
        DestinationRule::new("city + day trip", r"([^\s,，。、!！?？]+?)(?:一日游|两日游|三日游)"),
    ]
});

/// Query-text normalizations, highest priority first
const KEYWORD_OVERRIDES: &[(&[&str], &str)] = &[
    (&["吃什么", "餐厅", "美食"], FOOD_KEYWORDS),
    (&["玩什么", "景点", "旅游"], GENERIC_KEYWORDS),
    (&["咖啡", "咖啡店"], COFFEE_KEYWORDS),
];

struct DestinationRule {
    name: &'static str,
    pattern: Regex,
}

/// A candidate that matched a rule's pattern
struct Candidate<'a> {
    city: &'a str,
    phrase: &'a str,
}

impl DestinationRule {
    fn new(name: &'static str, pattern: &str) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).expect("destination pattern is valid"),
        }
    }

    fn candidate<'a>(&self, text: &'a str) -> Option<Candidate<'a>> {
        let captures = self.pattern.captures(text)?;
        Some(Candidate {
            city: captures.get(1)?.as_str(),
            phrase: captures.get(0)?.as_str(),
        })
    }

    fn accepts(candidate: &Candidate<'_>, departure_city: Option<&str>) -> bool {
        candidate.city.chars().count() <= MAX_CITY_CHARS
            && Some(candidate.city) != departure_city
            && !candidate.city.contains("出发")
            && !candidate.city.contains('从')
    }
}

/// Extract destination and keywords from `text`.
///
/// An explicit `destination_override` is used verbatim. Otherwise the city is
/// inferred from the text, falling back to `default_city` (or [`FALLBACK_CITY`]
/// when that is blank). Never fails.
#[must_use]
pub fn parse(text: &str, destination_override: Option<&str>, default_city: &str) -> ParsedIntent {
    let departure_city = DEPARTURE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str());
    let without_departure = DEPARTURE.replace_all(text, "");

    let (city, phrase) = match non_blank(destination_override) {
        Some(destination) => (destination.to_string(), None),
        None => match extract_destination(&without_departure, departure_city) {
            Some(candidate) => (candidate.city.to_string(), Some(candidate.phrase.to_string())),
            None => (
                non_blank(Some(default_city)).unwrap_or(FALLBACK_CITY).to_string(),
                None,
            ),
        },
    };

    let keywords = extract_keywords(text, &without_departure, phrase.as_deref());
    debug!(
        "Parsed intent: city={}, keywords={}, departure={:?}",
        city, keywords, departure_city
    );

    ParsedIntent { keywords, city }
}

fn extract_destination<'a>(text: &'a str, departure_city: Option<&str>) -> Option<Candidate<'a>> {
    for rule in DESTINATION_RULES.iter() {
        match rule.candidate(text) {
            Some(candidate) if DestinationRule::accepts(&candidate, departure_city) => {
                debug!("Destination '{}' matched rule '{}'", candidate.city, rule.name);
                return Some(candidate);
            }
            Some(candidate) => {
                debug!("Rule '{}' rejected candidate '{}'", rule.name, candidate.city);
            }
            None => {}
        }
    }
    None
}

fn extract_keywords(text: &str, without_departure: &str, city_phrase: Option<&str>) -> String {
    let mut residual = without_departure.to_string();
    if let Some(phrase) = city_phrase {
        residual = residual.replacen(phrase, "", 1);
    }
    let residual = residual.replace("我想去", "");
    let residual = residual.trim_matches(|c: char| c.is_whitespace() || is_punctuation(c));

    let mut keywords = if residual.chars().count() < 2 {
        GENERIC_KEYWORDS.to_string()
    } else {
        residual.to_string()
    };

    if let Some((_, normalized)) = KEYWORD_OVERRIDES
        .iter()
        .find(|(triggers, _)| triggers.iter().any(|t| text.contains(t)))
    {
        keywords = (*normalized).to_string();
    }

    keywords
}

fn is_punctuation(c: char) -> bool {
    c.is_ascii_punctuation() || "，。、！？；：…".contains(c)
}
