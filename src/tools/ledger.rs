//! Ledger tools
//!
//! Map tool calls onto the tracker and shape the results for JSON output.

use serde::Serialize;

use crate::input::{parse_limit, parse_meal, parse_workout};
use crate::models::{DailySummary, LedgerEntry, Meal, Workout};
use crate::storage::KeyValueStore;
use crate::tracker::{CalorieTracker, LedgerAudit};

/// Derived totals plus display helpers
#[derive(Debug, Serialize)]
pub struct SummaryView {
    #[serde(flatten)]
    pub summary: DailySummary,
    /// `None` when the limit is zero
    pub progress_percent: Option<f64>,
    pub over_limit: bool,
}

impl From<DailySummary> for SummaryView {
    fn from(summary: DailySummary) -> Self {
        let percent = summary.progress_percent();
        Self {
            summary,
            progress_percent: percent.is_finite().then_some(percent),
            over_limit: summary.over_limit(),
        }
    }
}

/// One ledger entry as shown to clients
#[derive(Debug, Serialize)]
pub struct EntryView {
    pub id: String,
    pub kind: &'static str,
    pub name: String,
    pub calories: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intensity: Option<&'static str>,
}

impl From<&Meal> for EntryView {
    fn from(meal: &Meal) -> Self {
        Self {
            id: meal.id().to_string(),
            kind: "meal",
            name: meal.name().to_string(),
            calories: meal.calories(),
            intensity: None,
        }
    }
}

impl From<&Workout> for EntryView {
    fn from(workout: &Workout) -> Self {
        Self {
            id: workout.id().to_string(),
            kind: "workout",
            name: workout.name().to_string(),
            calories: workout.calories(),
            intensity: workout.intensity().map(|i| i.as_str()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListEntriesResponse {
    pub meals: Vec<EntryView>,
    pub workouts: Vec<EntryView>,
    pub summary: SummaryView,
}

#[derive(Debug, Serialize)]
pub struct AddEntryResponse {
    pub entry: EntryView,
    pub summary: SummaryView,
}

#[derive(Debug, Serialize)]
pub struct RemoveEntryResponse {
    pub id: String,
    pub removed: bool,
    pub entry: Option<EntryView>,
    pub summary: SummaryView,
}

#[derive(Debug, Serialize)]
pub struct AuditResponse {
    #[serde(flatten)]
    pub audit: LedgerAudit,
    pub repaired: bool,
}

pub fn get_summary<S: KeyValueStore>(tracker: &CalorieTracker<S>) -> SummaryView {
    tracker.summary().into()
}

/// List entries, optionally only those whose name starts with `prefix`
pub fn list_entries<S: KeyValueStore>(
    tracker: &CalorieTracker<S>,
    prefix: Option<&str>,
) -> ListEntriesResponse {
    let prefix = prefix.unwrap_or("");
    ListEntriesResponse {
        meals: tracker
            .filter_meals(prefix)
            .into_iter()
            .map(EntryView::from)
            .collect(),
        workouts: tracker
            .filter_workouts(prefix)
            .into_iter()
            .map(EntryView::from)
            .collect(),
        summary: tracker.summary().into(),
    }
}

pub fn add_meal<S: KeyValueStore>(
    tracker: &mut CalorieTracker<S>,
    name: &str,
    calories: &str,
) -> Result<AddEntryResponse, String> {
    let meal = parse_meal(name, calories).map_err(|e| e.to_string())?;
    let entry = EntryView::from(&meal);
    let summary = tracker
        .add_meal(meal)
        .map_err(|e| format!("Failed to add meal: {}", e))?;
    Ok(AddEntryResponse {
        entry,
        summary: summary.into(),
    })
}

pub fn add_workout<S: KeyValueStore>(
    tracker: &mut CalorieTracker<S>,
    name: &str,
    calories: &str,
    intensity: Option<&str>,
) -> Result<AddEntryResponse, String> {
    let workout = parse_workout(name, calories, intensity).map_err(|e| e.to_string())?;
    let entry = EntryView::from(&workout);
    let summary = tracker
        .add_workout(workout)
        .map_err(|e| format!("Failed to add workout: {}", e))?;
    Ok(AddEntryResponse {
        entry,
        summary: summary.into(),
    })
}

pub fn remove_meal<S: KeyValueStore>(
    tracker: &mut CalorieTracker<S>,
    id: &str,
) -> Result<RemoveEntryResponse, String> {
    let removed = tracker
        .remove_meal(id)
        .map_err(|e| format!("Failed to remove meal: {}", e))?;
    Ok(RemoveEntryResponse {
        id: id.to_string(),
        removed: removed.is_some(),
        entry: removed.as_ref().map(EntryView::from),
        summary: tracker.summary().into(),
    })
}

pub fn remove_workout<S: KeyValueStore>(
    tracker: &mut CalorieTracker<S>,
    id: &str,
) -> Result<RemoveEntryResponse, String> {
    let removed = tracker
        .remove_workout(id)
        .map_err(|e| format!("Failed to remove workout: {}", e))?;
    Ok(RemoveEntryResponse {
        id: id.to_string(),
        removed: removed.is_some(),
        entry: removed.as_ref().map(EntryView::from),
        summary: tracker.summary().into(),
    })
}

pub fn set_limit<S: KeyValueStore>(
    tracker: &mut CalorieTracker<S>,
    limit: &str,
) -> Result<SummaryView, String> {
    let limit = parse_limit(limit).map_err(|e| e.to_string())?;
    let summary = tracker
        .set_limit(limit)
        .map_err(|e| format!("Failed to set limit: {}", e))?;
    Ok(summary.into())
}

pub fn reset_day<S: KeyValueStore>(tracker: &mut CalorieTracker<S>) -> Result<SummaryView, String> {
    let summary = tracker
        .reset_day()
        .map_err(|e| format!("Failed to reset day: {}", e))?;
    Ok(summary.into())
}

/// Compare the cached total with the ledgers; rewrite it only when `repair` is set
pub fn audit_ledger<S: KeyValueStore>(
    tracker: &mut CalorieTracker<S>,
    repair: bool,
) -> Result<AuditResponse, String> {
    let audit = tracker.audit();
    if !repair || audit.consistent {
        return Ok(AuditResponse {
            audit,
            repaired: false,
        });
    }

    let audit = tracker
        .reconcile_total()
        .map_err(|e| format!("Failed to reconcile total: {}", e))?;
    Ok(AuditResponse {
        audit,
        repaired: true,
    })
}
