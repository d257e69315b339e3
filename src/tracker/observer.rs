//! Tracker notifications
//!
//! Renderers subscribe to the tracker instead of the tracker knowing about
//! them. Every mutation produces one [`Notification`].

use serde::Serialize;

use crate::models::{DailySummary, LedgerEntry, Meal, Workout};

/// What changed
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Change {
    MealAdded { meal: Meal },
    WorkoutAdded { workout: Workout },
    MealRemoved { meal: Meal },
    WorkoutRemoved { workout: Workout },
    /// Replayed at startup by `load_items`
    MealLoaded { meal: Meal },
    /// Replayed at startup by `load_items`
    WorkoutLoaded { workout: Workout },
    LimitChanged { calorie_limit: i64 },
    TotalReconciled { previous: i64, total: i64 },
    DayReset,
}

/// A change together with the refreshed derived values
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub change: Change,
    pub summary: DailySummary,
}

pub trait TrackerObserver: Send {
    fn notify(&mut self, notification: &Notification);
}

impl<F> TrackerObserver for F
where
    F: FnMut(&Notification) + Send,
{
    fn notify(&mut self, notification: &Notification) {
        self(notification)
    }
}

/// Forwards every notification to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

impl TrackerObserver for LoggingObserver {
    fn notify(&mut self, notification: &Notification) {
        let summary = &notification.summary;
        match &notification.change {
            Change::MealAdded { meal } => {
                tracing::info!("Meal added: {} ({} cal)", meal.name(), meal.calories())
            }
            Change::WorkoutAdded { workout } => tracing::info!(
                "Workout added: {} ({} cal)",
                workout.name(),
                workout.calories()
            ),
            Change::MealRemoved { meal } => tracing::info!("Meal removed: {}", meal.name()),
            Change::WorkoutRemoved { workout } => {
                tracing::info!("Workout removed: {}", workout.name())
            }
            Change::MealLoaded { meal } => {
                tracing::debug!("Loaded meal: {} ({} cal)", meal.name(), meal.calories());
                return;
            }
            Change::WorkoutLoaded { workout } => {
                tracing::debug!(
                    "Loaded workout: {} ({} cal)",
                    workout.name(),
                    workout.calories()
                );
                return;
            }
            Change::LimitChanged { calorie_limit } => {
                tracing::info!("Calorie limit set to {}", calorie_limit)
            }
            Change::TotalReconciled { previous, total } => {
                tracing::warn!("Running total reconciled: {} -> {}", previous, total)
            }
            Change::DayReset => tracing::info!("Day reset"),
        }

        if summary.over_limit() {
            tracing::info!(
                "Over limit: {} of {} cal ({} remaining)",
                summary.total_calories,
                summary.calorie_limit,
                summary.remaining
            );
        }
    }
}
