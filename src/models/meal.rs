//! Meal model
//!
//! Calorie intake. A meal is immutable once created.

use serde::{Deserialize, Serialize};

use super::entry::{EntryId, LedgerEntry};

/// A logged meal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meal {
    id: EntryId,
    name: String,
    calories: i64,
}

impl Meal {
    /// Create a meal with a freshly generated id
    pub fn new(name: impl Into<String>, calories: i64) -> Self {
        Self::with_id(EntryId::generate(), name, calories)
    }

    pub fn with_id(id: EntryId, name: impl Into<String>, calories: i64) -> Self {
        Self {
            id,
            name: name.into(),
            calories,
        }
    }
}

impl LedgerEntry for Meal {
    fn id(&self) -> &EntryId {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn calories(&self) -> i64 {
        self.calories
    }
}
