use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use wanderlist::{
    HttpTransport, PlaceItem, Query, RecommendationResult, RecommendationService, RunMode,
    WanderlistConfig, narrative,
};

/// Travel recommendations for free-text queries
#[derive(Debug, Parser)]
#[command(name = "wanderlist", version, about)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,

    /// Do not call any remote service
    #[arg(long)]
    mock: bool,

    /// Explicit destination city; overrides anything in the query
    #[arg(long)]
    destination: Option<String>,

    /// City to search when the query names none
    #[arg(long)]
    city: Option<String>,

    /// Departure city
    #[arg(long)]
    departure: Option<String>,

    /// Travel date, e.g. 2024-05-01
    #[arg(long)]
    date: Option<String>,

    /// Where the traveller currently is
    #[arg(long)]
    location: Option<String>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Report missing API keys and exit
    #[arg(long)]
    check_keys: bool,

    /// Free-text query, e.g. 我想去杭州玩
    query: Vec<String>,
}

fn init_logging(config: &WanderlistConfig, verbose: bool) {
    let level = if verbose { "debug" } else { config.logging.level.as_str() };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("wanderlist={level}")));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if config.logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Items not already rendered in the summary text
fn unlisted_items<'a>(result: &'a RecommendationResult, query: &str) -> &'a [PlaceItem] {
    let fallback = narrative::default_summary(&result.items, query);
    if result.summary.starts_with(&fallback) {
        let listed = result.items.len().min(narrative::SUMMARY_LIST_LIMIT);
        &result.items[listed..]
    } else {
        &result.items
    }
}

fn print_result(result: &RecommendationResult, query: &str) {
    println!("{}", result.summary);

    if let Some(weather) = &result.current_weather {
        println!();
        println!(
            "🌤️ {}: {} {}°C",
            weather.city, weather.condition, weather.temperature_c
        );
    }
    if let Some(days) = &result.forecast {
        for day in days {
            println!("   {}", day.describe());
        }
    }
    let unlisted = unlisted_items(result, query);
    if !unlisted.is_empty() {
        let offset = result.items.len() - unlisted.len();
        println!();
        for (index, item) in unlisted.iter().enumerate() {
            println!("{:>2}. {}", offset + index + 1, item.describe());
        }
    }
    if result.is_mock {
        println!();
        println!("(offline mode: no remote services were called)");
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = WanderlistConfig::load_from_path(cli.config.clone())
        .context("Failed to load configuration")?;
    if cli.mock {
        config.mock_mode = true;
    }
    init_logging(&config, cli.verbose);

    if cli.check_keys {
        return Ok(match config.require_keys() {
            Ok(()) => {
                println!("All API keys are configured.");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("{}", e.user_message());
                ExitCode::FAILURE
            }
        });
    }

    let query = Query {
        text: cli.query.join(" "),
        destination_override: cli.destination,
        city: cli.city,
        departure: cli.departure,
        travel_date: cli.date,
        current_location: cli.location,
    };

    let transport = Arc::new(HttpTransport::new()?);
    let service = RecommendationService::from_config(&config, transport)?;
    if service.mode() == RunMode::Mock {
        tracing::info!("Running offline; missing keys: {:?}", config.missing_keys());
    }

    let result = service.get_recommendations(&query).await;
    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&result).context("Failed to serialize result")?
        );
    } else {
        print_result(&result, &query.text);
    }

    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(summary: String, count: usize) -> RecommendationResult {
        let mut result = RecommendationResult::message(summary, false);
        result.items = (1..=count).map(|i| PlaceItem::new(format!("地点{i}"))).collect();
        result
    }

    #[test]
    fn test_fallback_summary_items_are_not_repeated() {
        let items: Vec<PlaceItem> = (1..=7).map(|i| PlaceItem::new(format!("地点{i}"))).collect();
        let summary = narrative::default_summary(&items, "景点");
        let result = result(summary, 7);

        let unlisted = unlisted_items(&result, "景点");
        let names: Vec<&str> = unlisted.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["地点6", "地点7"]);
    }

    #[test]
    fn test_timeout_note_still_counts_as_fallback() {
        let items: Vec<PlaceItem> = (1..=3).map(|i| PlaceItem::new(format!("地点{i}"))).collect();
        let summary = format!(
            "{}\n\n{}",
            narrative::default_summary(&items, "景点"),
            wanderlist::orchestrator::AI_TIMEOUT_NOTE
        );
        assert!(unlisted_items(&result(summary, 3), "景点").is_empty());
    }

    #[test]
    fn test_generated_summary_keeps_full_list() {
        let result = result("推荐先游地点1。".to_string(), 3);
        assert_eq!(unlisted_items(&result, "景点").len(), 3);
    }
}
