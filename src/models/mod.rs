//! Data models
//!
//! Ledger records and the derived daily summary.

mod entry;
mod meal;
mod summary;
mod workout;

pub use entry::{name_has_prefix, EntryId, LedgerEntry};
pub use meal::Meal;
pub use summary::{progress_fraction, DailySummary};
pub use workout::{Intensity, Workout};
