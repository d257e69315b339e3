//! caltrack
//!
//! An MCP server for daily calorie balance tracking.

use rmcp::ServiceExt;
use tokio::io::{stdin, stdout};
use tracing_subscriber::EnvFilter;

use caltrack::build_info;
use caltrack::config::Config;
use caltrack::mcp::CaltrackService;
use caltrack::storage::{SqliteStore, Storage};
use caltrack::tracker::{CalorieTracker, LoggingObserver};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // stderr only: stdout carries the MCP stream
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("caltrack=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    build_info::print_startup_banner();
    eprintln!("Starting MCP server on stdio...");

    let config = Config::from_env();
    eprintln!("Database path: {}", config.database_path.display());

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let store = SqliteStore::open(&config.database_path)?;
    let storage = Storage::new(store).with_default_limit(config.default_limit);

    let mut tracker = CalorieTracker::load(storage)?;
    tracker.subscribe(LoggingObserver);
    tracker.load_items();

    let audit = tracker.audit();
    if !audit.consistent {
        tracing::warn!(
            "Stored total {} differs from entries ({}); run audit_ledger with repair to fix",
            audit.stored_total,
            audit.computed_total
        );
    }

    let service = CaltrackService::new(config.database_path.clone(), tracker);

    let transport = (stdin(), stdout());
    let server = service.serve(transport).await?;
    server.waiting().await?;

    Ok(())
}
