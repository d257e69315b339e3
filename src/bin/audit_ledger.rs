//! Compare the stored running total with the logged entries
//! Usage: cargo run --bin audit_ledger -- [--repair]

use caltrack::config::Config;
use caltrack::models::LedgerEntry;
use caltrack::storage::{SqliteStore, Storage};
use caltrack::tracker::{CalorieTracker, LoggingObserver};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let repair = std::env::args().skip(1).any(|arg| arg == "--repair");

    let config = Config::from_env();
    println!("Database: {}", config.database_path.display());

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let store = SqliteStore::open(&config.database_path)?;
    let mut tracker =
        CalorieTracker::load(Storage::new(store).with_default_limit(config.default_limit))?;
    tracker.subscribe(LoggingObserver);

    println!("\nMeals ({}):", tracker.meals().len());
    for meal in tracker.meals().values() {
        println!("  {:<24} {:>6} cal  [{}]", meal.name(), meal.calories(), meal.id());
    }
    println!("Workouts ({}):", tracker.workouts().len());
    for workout in tracker.workouts().values() {
        println!(
            "  {:<24} {:>6} cal  [{}]",
            workout.name(),
            workout.calories(),
            workout.id()
        );
    }

    let audit = tracker.audit();
    println!("\nConsumed:       {}", audit.consumed);
    println!("Burned:         {}", audit.burned);
    println!("Stored total:   {}", audit.stored_total);
    println!("Computed total: {}", audit.computed_total);

    if audit.consistent {
        println!("Ledger is consistent.");
        return Ok(());
    }

    println!("Drift: {:+}", audit.drift());
    if repair {
        let audit = tracker.reconcile_total()?;
        println!("Total rewritten to {}.", audit.computed_total);
    } else {
        println!("Run with --repair to rewrite the stored total.");
    }

    Ok(())
}
