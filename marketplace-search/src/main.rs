//! Marketplace Search Main Entry Point
//!
//! Wires the search engine against OpenSearch and Redis, runs a single
//! search from the command line, and prints the JSON response. Useful as a
//! smoke test against a live backend; transports live elsewhere.
//!
//! Usage: `marketplace-search <query> [product|merchant|brand|all]`

use std::env;

use dotenv::dotenv;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use marketplace_search::{Dependencies, SearchError};
use marketplace_search_shared::{SearchEntityType, SearchOptions};

/// Initialize tracing/logging.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("marketplace_search=info"));

    if env::var("SEARCH_LOG_JSON").is_ok() {
        // JSON format for structured log drains
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true).pretty())
            .init();
    }

    info!(
        service_name = "marketplace-search",
        service_version = env!("CARGO_PKG_VERSION"),
        "Tracing initialized"
    );
}

fn parse_entity_type(raw: Option<&str>) -> SearchEntityType {
    match raw {
        Some("merchant") => SearchEntityType::Merchant,
        Some("brand") => SearchEntityType::Brand,
        Some("all") => SearchEntityType::All,
        _ => SearchEntityType::Product,
    }
}

#[tokio::main]
async fn main() -> Result<(), SearchError> {
    dotenv().ok();
    init_tracing();

    let args: Vec<String> = env::args().collect();
    let query = args.get(1).cloned().unwrap_or_default();
    let entity_type = parse_entity_type(args.get(2).map(String::as_str));

    info!(query = %query, entity_type = %entity_type, "Starting marketplace search");

    let deps = match Dependencies::new().await {
        Ok(deps) => {
            info!("Dependencies initialized successfully");
            deps
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            return Err(e);
        }
    };

    let options = SearchOptions::new(query, entity_type);
    match deps.orchestrator.search(options).await {
        Ok(response) => {
            let rendered = serde_json::to_string_pretty(&response)
                .unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e));
            println!("{}", rendered);
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Search failed");
            Err(e)
        }
    }
}
