//! Persistent store
//!
//! Typed calorie-tracker records over pluggable key-value backends.

mod backend;
mod error;
mod sqlite;
mod store;

pub use backend::{KeyValueStore, KvWrite, MemoryStore};
pub use error::{StoreError, StoreResult};
pub use sqlite::SqliteStore;
pub use store::{
    Storage, CALORIE_LIMIT_KEY, DEFAULT_CALORIE_LIMIT, DEFAULT_TOTAL_CALORIES, MEALS_KEY,
    TOTAL_CALORIES_KEY, WORKOUTS_KEY,
};
