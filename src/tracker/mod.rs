//! Calorie tracker core
//!
//! Owns the day's ledgers, keeps the running total consistent with them and
//! tells subscribed observers about every change.

mod calorie_tracker;
mod observer;

pub use calorie_tracker::{CalorieTracker, LedgerAudit};
pub use observer::{Change, LoggingObserver, Notification, TrackerObserver};
