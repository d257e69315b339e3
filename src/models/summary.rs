//! Daily summary
//!
//! Values derived from the ledgers and the calorie limit, handed to the
//! presentation layer with every notification.

use serde::Serialize;

/// Snapshot of the day's calorie balance
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailySummary {
    pub calorie_limit: i64,
    pub total_calories: i64,
    pub consumed: i64,
    pub burned: i64,
    pub remaining: i64,
    /// Fraction of the limit used, capped at 1.0. Non-finite when the limit is 0
    /// (serialized as `null`).
    pub progress: f64,
}

impl DailySummary {
    pub fn new(calorie_limit: i64, total_calories: i64, consumed: i64, burned: i64) -> Self {
        Self {
            calorie_limit,
            total_calories,
            consumed,
            burned,
            remaining: calorie_limit.saturating_sub(total_calories),
            progress: progress_fraction(total_calories, calorie_limit),
        }
    }

    /// True once the limit is reached or exceeded
    pub fn over_limit(&self) -> bool {
        self.remaining <= 0
    }

    /// Progress as a percentage, rounded to one decimal
    pub fn progress_percent(&self) -> f64 {
        (self.progress * 1000.0).round() / 10.0
    }
}

/// `min(total / limit, 1.0)`; a zero limit yields the raw non-finite ratio
pub fn progress_fraction(total_calories: i64, calorie_limit: i64) -> f64 {
    let ratio = total_calories as f64 / calorie_limit as f64;
    if !ratio.is_finite() {
        // f64::min would swallow NaN and clamp infinity to 1.0
        return ratio;
    }
    ratio.min(1.0)
}
