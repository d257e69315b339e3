//! Workout model
//!
//! Calorie expenditure, with an optional intensity rating that does not take
//! part in the ledger arithmetic.

use serde::{Deserialize, Serialize};

use super::entry::{EntryId, LedgerEntry};

/// Workout intensity rating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intensity {
    Low,
    Moderate,
    High,
}

impl Intensity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intensity::Low => "low",
            Intensity::Moderate => "moderate",
            Intensity::High => "high",
        }
    }

    /// Case-insensitive `low`, `moderate` or `high`
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Some(Intensity::Low),
            "moderate" => Some(Intensity::Moderate),
            "high" => Some(Intensity::High),
            _ => None,
        }
    }
}

/// A logged workout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workout {
    id: EntryId,
    name: String,
    calories: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    intensity: Option<Intensity>,
}

impl Workout {
    /// Create a workout with a freshly generated id
    pub fn new(name: impl Into<String>, calories: i64, intensity: Option<Intensity>) -> Self {
        Self::with_id(EntryId::generate(), name, calories, intensity)
    }

    pub fn with_id(
        id: EntryId,
        name: impl Into<String>,
        calories: i64,
        intensity: Option<Intensity>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            calories,
            intensity,
        }
    }

    pub fn intensity(&self) -> Option<Intensity> {
        self.intensity
    }
}

impl LedgerEntry for Workout {
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
