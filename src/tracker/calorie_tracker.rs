//! Calorie tracker
//!
//! Single in-memory view of the day's ledgers. Every mutation persists the new
//! running total and the ledger change in one commit, then updates memory,
//! then notifies observers. A failed commit leaves memory untouched.

use std::collections::BTreeMap;

use serde::Serialize;

use super::observer::{Change, Notification, TrackerObserver};
use crate::models::{name_has_prefix, DailySummary, EntryId, LedgerEntry, Meal, Workout};
use crate::storage::{KeyValueStore, Storage, StoreError, StoreResult};

/// Stored running total versus the one implied by the ledgers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LedgerAudit {
    pub stored_total: i64,
    pub computed_total: i64,
    pub consumed: i64,
    pub burned: i64,
    pub consistent: bool,
}

impl LedgerAudit {
    fn new(stored_total: i64, consumed: i64, burned: i64) -> Self {
        let computed_total = consumed.saturating_sub(burned);
        Self {
            stored_total,
            computed_total,
            consumed,
            burned,
            consistent: stored_total == computed_total,
        }
    }

    /// `stored_total - computed_total`
    pub fn drift(&self) -> i64 {
        self.stored_total.saturating_sub(self.computed_total)
    }
}

/// Sum of entry calories, `None` on overflow
fn ledger_sum<'a, E: LedgerEntry + 'a>(entries: impl IntoIterator<Item = &'a E>) -> Option<i64> {
    entries
        .into_iter()
        .try_fold(0i64, |acc, entry| acc.checked_add(entry.calories()))
}

fn out_of_range(what: &'static str) -> StoreError {
    tracing::warn!("Rejected change: {} would leave the calorie range", what);
    StoreError::OutOfRange(what)
}

pub struct CalorieTracker<S> {
    storage: Storage<S>,
    calorie_limit: i64,
    total_calories: i64,
    meals: BTreeMap<EntryId, Meal>,
    workouts: BTreeMap<EntryId, Workout>,
    observers: Vec<Box<dyn TrackerObserver>>,
}

fn broadcast(observers: &mut [Box<dyn TrackerObserver>], notification: &Notification) {
    for observer in observers.iter_mut() {
        observer.notify(notification);
    }
}

impl<S: KeyValueStore> CalorieTracker<S> {
    /// Load limit, total and both ledgers from `storage`.
    ///
    /// The stored total is trusted as-is; see [`audit`](Self::audit).
    pub fn load(storage: Storage<S>) -> StoreResult<Self> {
        let calorie_limit = storage.get_calorie_limit()?;
        let total_calories = storage.get_total_calories()?;
        let meals = storage.get_meals()?;
        let workouts = storage.get_workouts()?;

        let consumed = ledger_sum(meals.values()).ok_or(StoreError::OutOfRange("consumed"))?;
        let burned = ledger_sum(workouts.values()).ok_or(StoreError::OutOfRange("burned"))?;
        consumed
            .checked_sub(burned)
            .ok_or(StoreError::OutOfRange("computed total"))?;

        tracing::info!(
            "Tracker loaded: limit {}, total {}, {} meals, {} workouts",
            calorie_limit,
            total_calories,
            meals.len(),
            workouts.len()
        );

        Ok(Self {
            storage,
            calorie_limit,
            total_calories,
            meals,
            workouts,
            observers: Vec::new(),
        })
    }

    pub fn subscribe<O: TrackerObserver + 'static>(&mut self, observer: O) {
        self.observers.push(Box::new(observer));
    }

    pub fn storage(&self) -> &Storage<S> {
        &self.storage
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Record a meal. A meal whose id is already logged replaces the old one.
    pub fn add_meal(&mut self, meal: Meal) -> StoreResult<DailySummary> {
        let replaced = self.meals.get(meal.id()).map(|m| m.calories());
        if replaced.is_some() {
            tracing::warn!("Meal {} already logged, replacing it", meal.id());
        }

        let total = self
            .total_calories
            .checked_sub(replaced.unwrap_or(0))
            .and_then(|t| t.checked_add(meal.calories()))
            .ok_or_else(|| out_of_range("total"))?;
        let kept = self.meals.values().filter(|m| m.id() != meal.id());
        let consumed = ledger_sum(kept.chain([&meal])).ok_or_else(|| out_of_range("consumed"))?;
        consumed
            .checked_sub(self.burned())
            .ok_or_else(|| out_of_range("computed total"))?;

        let writes = [
            self.storage.stage_total(total),
            self.storage.stage_meal(&meal)?,
        ];
        self.storage.commit(&writes)?;

        tracing::debug!("add_meal {}: {:+} cal, total {}", meal.id(), meal.calories(), total);
        self.total_calories = total;
        self.meals.insert(meal.id().clone(), meal.clone());
        Ok(self.emit(Change::MealAdded { meal }))
    }

    /// Record a workout. A workout whose id is already logged replaces the old one.
    pub fn add_workout(&mut self, workout: Workout) -> StoreResult<DailySummary> {
        let replaced = self.workouts.get(workout.id()).map(|w| w.calories());
        if replaced.is_some() {
            tracing::warn!("Workout {} already logged, replacing it", workout.id());
        }

        let total = self
            .total_calories
            .checked_add(replaced.unwrap_or(0))
            .and_then(|t| t.checked_sub(workout.calories()))
            .ok_or_else(|| out_of_range("total"))?;
        let kept = self.workouts.values().filter(|w| w.id() != workout.id());
        let burned = ledger_sum(kept.chain([&workout])).ok_or_else(|| out_of_range("burned"))?;
        self.consumed()
            .checked_sub(burned)
            .ok_or_else(|| out_of_range("computed total"))?;

        let writes = [
            self.storage.stage_total(total),
            self.storage.stage_workout(&workout)?,
        ];
        self.storage.commit(&writes)?;

        tracing::debug!(
            "add_workout {}: -{} cal, total {}",
            workout.id(),
            workout.calories(),
            total
        );
        self.total_calories = total;
        self.workouts.insert(workout.id().clone(), workout.clone());
        Ok(self.emit(Change::WorkoutAdded { workout }))
    }

    /// Remove a meal by id. Unknown ids are a no-op and return `None`.
    pub fn remove_meal(&mut self, id: &str) -> StoreResult<Option<Meal>> {
        let Some(meal) = self.meals.get(id).cloned() else {
            tracing::debug!("remove_meal {}: not in ledger", id);
            return Ok(None);
        };

        let total = self
            .total_calories
            .checked_sub(meal.calories())
            .ok_or_else(|| out_of_range("total"))?;
        let mut writes = vec![self.storage.stage_total(total)];
        writes.extend(self.storage.stage_meal_removal(&meal)?);
        self.storage.commit(&writes)?;

        tracing::debug!("remove_meal {}: total {}", id, total);
        self.total_calories = total;
        self.meals.remove(id);
        self.emit(Change::MealRemoved { meal: meal.clone() });
        Ok(Some(meal))
    }

    /// Remove a workout by id. Unknown ids are a no-op and return `None`.
    pub fn remove_workout(&mut self, id: &str) -> StoreResult<Option<Workout>> {
        let Some(workout) = self.workouts.get(id).cloned() else {
            tracing::debug!("remove_workout {}: not in ledger", id);
            return Ok(None);
        };

        let total = self
            .total_calories
            .checked_add(workout.calories())
            .ok_or_else(|| out_of_range("total"))?;
        let mut writes = vec![self.storage.stage_total(total)];
        writes.extend(self.storage.stage_workout_removal(&workout)?);
        self.storage.commit(&writes)?;

        tracing::debug!("remove_workout {}: total {}", id, total);
        self.total_calories = total;
        self.workouts.remove(id);
        self.emit(Change::WorkoutRemoved {
            workout: workout.clone(),
        });
        Ok(Some(workout))
    }

    /// Empty both ledgers and zero the total. The calorie limit is kept.
    pub fn reset_day(&mut self) -> StoreResult<DailySummary> {
        self.storage.clear_all()?;

        tracing::info!(
            "Day reset: dropped {} meals and {} workouts",
            self.meals.len(),
            self.workouts.len()
        );
        self.meals.clear();
        self.workouts.clear();
        self.total_calories = 0;
        Ok(self.emit(Change::DayReset))
    }

    /// Set the daily limit. Any value is accepted, including zero and negatives.
    pub fn set_limit(&mut self, calorie_limit: i64) -> StoreResult<DailySummary> {
        self.storage.set_calorie_limit(calorie_limit)?;
        self.calorie_limit = calorie_limit;
        Ok(self.emit(Change::LimitChanged { calorie_limit }))
    }

    /// Overwrite the running total with consumed - burned.
    ///
    /// Never called implicitly; an operator decides when a drifted total
    /// should be repaired.
    pub fn reconcile_total(&mut self) -> StoreResult<LedgerAudit> {
        let audit = self.audit();
        if audit.consistent {
            return Ok(audit);
        }

        self.storage.commit(&[self.storage.stage_total(audit.computed_total)])?;
        self.total_calories = audit.computed_total;
        self.emit(Change::TotalReconciled {
            previous: audit.stored_total,
            total: audit.computed_total,
        });
        Ok(audit)
    }

    /// Notify observers once per existing entry, meals first
    pub fn load_items(&mut self) {
        let summary = self.summary();
        for meal in self.meals.values() {
            let notification = Notification {
                change: Change::MealLoaded { meal: meal.clone() },
                summary,
            };
            broadcast(&mut self.observers, &notification);
        }
        for workout in self.workouts.values() {
            let notification = Notification {
                change: Change::WorkoutLoaded {
                    workout: workout.clone(),
                },
                summary,
            };
            broadcast(&mut self.observers, &notification);
        }
    }

    fn emit(&mut self, change: Change) -> DailySummary {
        let summary = self.summary();
        broadcast(&mut self.observers, &Notification { change, summary });
        summary
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn calorie_limit(&self) -> i64 {
        self.calorie_limit
    }

    pub fn total_calories(&self) -> i64 {
        self.total_calories
    }

    /// Sum of meal calories, recomputed from the ledger.
    ///
    /// Mutations refuse to push the sum out of `i64`, so the saturation
    /// here never kicks in for a tracker built by [`load`](Self::load).
    pub fn consumed(&self) -> i64 {
        self.meals
            .values()
            .fold(0, |acc, m| acc.saturating_add(m.calories()))
    }

    /// Sum of workout calories, recomputed from the ledger
    pub fn burned(&self) -> i64 {
        self.workouts
            .values()
            .fold(0, |acc, w| acc.saturating_add(w.calories()))
    }

    pub fn remaining(&self) -> i64 {
        self.calorie_limit.saturating_sub(self.total_calories)
    }

    pub fn progress(&self) -> f64 {
        self.summary().progress
    }

    pub fn summary(&self) -> DailySummary {
        DailySummary::new(
            self.calorie_limit,
            self.total_calories,
            self.consumed(),
            self.burned(),
        )
    }

    pub fn audit(&self) -> LedgerAudit {
        LedgerAudit::new(self.total_calories, self.consumed(), self.burned())
    }

    pub fn meals(&self) -> &BTreeMap<EntryId, Meal> {
        &self.meals
    }

    pub fn workouts(&self) -> &BTreeMap<EntryId, Workout> {
        &self.workouts
    }

    pub fn meal(&self, id: &str) -> Option<&Meal> {
        self.meals.get(id)
    }

    pub fn workout(&self, id: &str) -> Option<&Workout> {
        self.workouts.get(id)
    }

    /// Meals whose name starts with `prefix`, ignoring case
    pub fn filter_meals(&self, prefix: &str) -> Vec<&Meal> {
        self.meals
            .values()
            .filter(|m| name_has_prefix(m.name(), prefix))
            .collect()
    }

    /// Workouts whose name starts with `prefix`, ignoring case
    pub fn filter_workouts(&self, prefix: &str) -> Vec<&Workout> {
        self.workouts
            .values()
            .filter(|w| name_has_prefix(w.name(), prefix))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::models::Intensity;
    use crate::storage::{
        KvWrite, MemoryStore, StoreError, MEALS_KEY, TOTAL_CALORIES_KEY, WORKOUTS_KEY,
    };

    fn tracker() -> CalorieTracker<MemoryStore> {
        CalorieTracker::load(Storage::new(MemoryStore::new())).unwrap()
    }

    fn recorded(tracker: &mut CalorieTracker<MemoryStore>) -> Arc<Mutex<Vec<Notification>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        tracker.subscribe(move |n: &Notification| sink.lock().unwrap().push(n.clone()));
        log
    }

    fn assert_invariant(tracker: &CalorieTracker<MemoryStore>) {
        assert_eq!(
            tracker.total_calories(),
            tracker.consumed() - tracker.burned()
        );
        assert_eq!(
            tracker.storage().get_total_calories().unwrap(),
            tracker.total_calories()
        );
    }

    /// Backend whose writes always fail
    struct ReadOnlyStore(MemoryStore);

    impl KeyValueStore for ReadOnlyStore {
        fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
            self.0.get_item(key)
        }

        fn set_item(&self, _key: &str, _value: &str) -> StoreResult<()> {
            Err(StoreError::LockPoisoned)
        }

        fn remove_item(&self, _key: &str) -> StoreResult<()> {
            Err(StoreError::LockPoisoned)
        }
    }

    #[test]
    fn test_fresh_tracker_defaults() {
        let tracker = tracker();
        assert_eq!(tracker.calorie_limit(), 3000);
        assert_eq!(tracker.total_calories(), 0);
        assert!(tracker.meals().is_empty());
        assert!(tracker.workouts().is_empty());
        assert_eq!(tracker.remaining(), 3000);
        assert_eq!(tracker.progress(), 0.0);
    }

    #[test]
    fn test_breakfast_lunch_basketball() {
        let mut tracker = tracker();

        let summary = tracker.add_meal(Meal::new("Breakfast", 1000)).unwrap();
        assert_eq!(summary.total_calories, 1000);
        assert_eq!(summary.remaining, 2000);
        assert_eq!(summary.progress_percent(), 33.3);

        let summary = tracker.add_meal(Meal::new("Lunch", 500)).unwrap();
        assert_eq!(summary.total_calories, 1500);
        assert_eq!(summary.remaining, 1500);
        assert_eq!(summary.progress_percent(), 50.0);

        let summary = tracker
            .add_workout(Workout::new("Basketball", 700, None))
            .unwrap();
        assert_eq!(summary.total_calories, 800);
        assert_eq!(summary.remaining, 2200);
        assert_eq!(summary.progress_percent(), 26.7);
        assert_eq!(summary.consumed, 1500);
        assert_eq!(summary.burned, 700);

        assert_invariant(&tracker);
    }

    #[test]
    fn test_invariant_over_mixed_sequence() {
        let mut tracker = tracker();
        let mut meal_ids = Vec::new();
        let mut workout_ids = Vec::new();

        for i in 0..12i64 {
            let meal = Meal::new(format!("Meal {}", i), 100 + i * 37);
            meal_ids.push(meal.id().clone());
            tracker.add_meal(meal).unwrap();
            assert_invariant(&tracker);

            if i % 3 == 0 {
                let workout = Workout::new(format!("Workout {}", i), 50 + i * 11, None);
                workout_ids.push(workout.id().clone());
                tracker.add_workout(workout).unwrap();
                assert_invariant(&tracker);
            }
            if i % 4 == 1 {
                let id = meal_ids.remove(0);
                assert!(tracker.remove_meal(id.as_str()).unwrap().is_some());
                assert_invariant(&tracker);
            }
        }

        for id in workout_ids {
            tracker.remove_workout(id.as_str()).unwrap();
            assert_invariant(&tracker);
        }
        assert_eq!(tracker.burned(), 0);
        assert_eq!(tracker.total_calories(), tracker.consumed());
    }

    #[test]
    fn test_persisted_ledger_matches_memory() {
        let mut tracker = tracker();
        let meal = Meal::new("Dinner", 800);
        let workout = Workout::new("Swim", 300, Some(Intensity::Moderate));
        tracker.add_meal(meal.clone()).unwrap();
        tracker.add_workout(workout.clone()).unwrap();

        assert_eq!(&tracker.storage().get_meals().unwrap(), tracker.meals());
        assert_eq!(&tracker.storage().get_workouts().unwrap(), tracker.workouts());

        tracker.remove_meal(meal.id().as_str()).unwrap();
        assert!(tracker.storage().get_meals().unwrap().is_empty());
    }

    #[test]
    fn test_remove_unknown_id_is_noop() {
        let mut tracker = tracker();
        tracker.add_meal(Meal::new("Lunch", 500)).unwrap();
        let log = recorded(&mut tracker);
        let before = tracker.summary();

        assert_eq!(tracker.remove_meal("nope").unwrap(), None);
        assert_eq!(tracker.remove_workout("nope").unwrap(), None);

        assert_eq!(tracker.summary(), before);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_double_remove_matches_single_remove() {
        let mut once = tracker();
        let mut twice = tracker();
        let meal = Meal::new("Snack", 250);
        let other = Meal::new("Lunch", 600);
        for tracker in [&mut once, &mut twice] {
            tracker.add_meal(meal.clone()).unwrap();
            tracker.add_meal(other.clone()).unwrap();
        }

        once.remove_meal(meal.id().as_str()).unwrap();
        twice.remove_meal(meal.id().as_str()).unwrap();
        assert_eq!(twice.remove_meal(meal.id().as_str()).unwrap(), None);

        assert_eq!(once.summary(), twice.summary());
        assert_eq!(once.meals(), twice.meals());
        assert_eq!(
            once.storage().get_meals().unwrap(),
            twice.storage().get_meals().unwrap()
        );
    }

    #[test]
    fn test_reset_day_keeps_limit() {
        let mut tracker = tracker();
        tracker.set_limit(2200).unwrap();
        tracker.add_meal(Meal::new("Lunch", 900)).unwrap();
        tracker
            .add_workout(Workout::new("Run", 400, Some(Intensity::High)))
            .unwrap();

        let summary = tracker.reset_day().unwrap();
        assert_eq!(summary.total_calories, 0);
        assert_eq!(summary.calorie_limit, 2200);
        assert!(tracker.meals().is_empty());
        assert!(tracker.workouts().is_empty());

        let storage = tracker.storage();
        assert!(storage.get_meals().unwrap().is_empty());
        assert!(storage.get_workouts().unwrap().is_empty());
        assert_eq!(storage.get_total_calories().unwrap(), 0);
        assert_eq!(storage.get_calorie_limit().unwrap(), 2200);
    }

    #[test]
    fn test_remove_after_reset_is_noop() {
        let mut tracker = tracker();
        let meal = Meal::new("Lunch", 900);
        tracker.add_meal(meal.clone()).unwrap();
        tracker.reset_day().unwrap();

        assert_eq!(tracker.remove_meal(meal.id().as_str()).unwrap(), None);
        assert_eq!(tracker.total_calories(), 0);
        assert!(tracker.storage().backend().get_item(MEALS_KEY).unwrap().is_none());
    }

    #[test]
    fn test_zero_limit_progress_is_non_finite() {
        let mut tracker = tracker();
        let summary = tracker.set_limit(0).unwrap();
        assert!(!summary.progress.is_finite());

        tracker.add_meal(Meal::new("Lunch", 500)).unwrap();
        assert_eq!(tracker.progress(), f64::INFINITY);
        assert_eq!(tracker.remaining(), -500);
    }

    #[test]
    fn test_state_survives_reload() {
        let backend = MemoryStore::new();
        let mut tracker = CalorieTracker::load(Storage::new(backend)).unwrap();
        tracker.set_limit(2500).unwrap();
        let meal = Meal::new("Breakfast", 650);
        tracker.add_meal(meal.clone()).unwrap();
        tracker.add_workout(Workout::new("Cycling", 250, None)).unwrap();

        let CalorieTracker { storage, .. } = tracker;
        let reloaded = CalorieTracker::load(storage).unwrap();

        assert_eq!(reloaded.calorie_limit(), 2500);
        assert_eq!(reloaded.total_calories(), 400);
        assert_eq!(reloaded.meal(meal.id().as_str()), Some(&meal));
        assert_eq!(reloaded.workouts().len(), 1);
    }

    #[test]
    fn test_state_survives_sqlite_restart() {
        use crate::storage::SqliteStore;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("caltrack.db");
        let meal = Meal::new("Breakfast", 650);
        let workout = Workout::new("Cycling", 250, Some(Intensity::Low));

        {
            let store = SqliteStore::open(&path).unwrap();
            let mut tracker = CalorieTracker::load(Storage::new(store)).unwrap();
            tracker.set_limit(2500).unwrap();
            tracker.add_meal(meal.clone()).unwrap();
            tracker.add_meal(Meal::new("Lunch", 500)).unwrap();
            tracker.add_workout(workout.clone()).unwrap();
            tracker.remove_meal(meal.id().as_str()).unwrap();
            tracker.add_meal(meal.clone()).unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        let reloaded = CalorieTracker::load(Storage::new(store)).unwrap();
        assert_eq!(reloaded.calorie_limit(), 2500);
        assert_eq!(reloaded.total_calories(), 900);
        assert_eq!(reloaded.meals().len(), 2);
        assert_eq!(reloaded.meal(meal.id().as_str()), Some(&meal));
        assert_eq!(reloaded.workout(workout.id().as_str()), Some(&workout));
        assert!(reloaded.audit().consistent);
    }

    #[test]
    fn test_notifications() {
        let mut tracker = tracker();
        let log = recorded(&mut tracker);

        let meal = Meal::new("Breakfast", 1000);
        tracker.add_meal(meal.clone()).unwrap();
        tracker.remove_meal(meal.id().as_str()).unwrap();
        tracker.set_limit(1800).unwrap();
        tracker.reset_day().unwrap();

        let log = log.lock().unwrap();
        assert_eq!(log.len(), 4);
        assert_eq!(log[0].change, Change::MealAdded { meal: meal.clone() });
        assert_eq!(log[0].summary.consumed, 1000);
        assert_eq!(log[1].change, Change::MealRemoved { meal });
        assert_eq!(log[1].summary.total_calories, 0);
        assert_eq!(
            log[2].change,
            Change::LimitChanged {
                calorie_limit: 1800
            }
        );
        assert_eq!(log[2].summary.remaining, 1800);
        assert_eq!(log[3].change, Change::DayReset);
    }

    #[test]
    fn test_load_items_replays_each_entry_once() {
        let mut tracker = tracker();
        tracker.add_meal(Meal::new("Breakfast", 400)).unwrap();
        tracker.add_meal(Meal::new("Lunch", 600)).unwrap();
        tracker.add_workout(Workout::new("Walk", 150, None)).unwrap();

        let log = recorded(&mut tracker);
        tracker.load_items();

        let log = log.lock().unwrap();
        let meals = log
            .iter()
            .filter(|n| matches!(n.change, Change::MealLoaded { .. }))
            .count();
        let workouts = log
            .iter()
            .filter(|n| matches!(n.change, Change::WorkoutLoaded { .. }))
            .count();
        assert_eq!((meals, workouts), (2, 1));
        assert!(log.iter().all(|n| n.summary.total_calories == 850));
    }

    #[test]
    fn test_readding_same_id_replaces() {
        let mut tracker = tracker();
        let id = EntryId::from("m1");
        tracker.add_meal(Meal::with_id(id.clone(), "Toast", 200)).unwrap();
        tracker.add_meal(Meal::with_id(id.clone(), "Toast", 300)).unwrap();
        assert_eq!(tracker.meals().len(), 1);
        assert_eq!(tracker.total_calories(), 300);

        let wid = EntryId::from("w1");
        tracker.add_workout(Workout::with_id(wid.clone(), "Run", 100, None)).unwrap();
        tracker.add_workout(Workout::with_id(wid, "Run", 250, None)).unwrap();
        assert_eq!(tracker.total_calories(), 50);
        assert_invariant(&tracker);
    }

    #[test]
    fn test_failed_commit_leaves_memory_untouched() {
        let storage = Storage::new(ReadOnlyStore(MemoryStore::new()));
        let mut tracker = CalorieTracker::load(storage).unwrap();

        assert!(tracker.add_meal(Meal::new("Lunch", 500)).is_err());
        assert!(tracker.set_limit(1000).is_err());
        assert_eq!(tracker.total_calories(), 0);
        assert_eq!(tracker.calorie_limit(), 3000);
        assert!(tracker.meals().is_empty());
    }

    #[test]
    fn test_overflowing_add_is_rejected() {
        let mut tracker = tracker();
        tracker.add_meal(Meal::new("Feast", i64::MAX - 10)).unwrap();
        let log = recorded(&mut tracker);
        let before = tracker.summary();

        let err = tracker.add_meal(Meal::new("Dessert", 11)).unwrap_err();
        assert!(matches!(err, StoreError::OutOfRange("total")));
        let err = tracker
            .add_workout(Workout::with_id("w1".into(), "Nap", -11, None))
            .unwrap_err();
        assert!(matches!(err, StoreError::OutOfRange(_)));

        assert_eq!(tracker.summary(), before);
        assert_eq!(tracker.meals().len(), 1);
        assert_eq!(tracker.storage().get_meals().unwrap().len(), 1);
        assert_eq!(tracker.storage().get_total_calories().unwrap(), i64::MAX - 10);
        assert!(log.lock().unwrap().is_empty());

        // still usable afterwards
        tracker.add_workout(Workout::new("Run", 10, None)).unwrap();
        assert_invariant(&tracker);
    }

    #[test]
    fn test_overflowing_ledger_sum_is_rejected() {
        let mut tracker = tracker();
        tracker.add_meal(Meal::new("Feast", i64::MAX)).unwrap();
        tracker.add_workout(Workout::new("Marathon", i64::MAX, None)).unwrap();
        assert_eq!(tracker.total_calories(), 0);

        // total stays at 0 but consumed would pass i64::MAX
        let err = tracker.add_meal(Meal::new("Snack", 1)).unwrap_err();
        assert!(matches!(err, StoreError::OutOfRange("consumed")));
        assert_eq!(tracker.consumed(), i64::MAX);
        assert_invariant(&tracker);
    }

    #[test]
    fn test_overflowing_remove_is_rejected() {
        let storage = Storage::new(MemoryStore::new());
        storage.set_total_calories(i64::MAX).unwrap();
        let workout = Workout::new("Walk", 10, None);
        storage.save_workout(&workout).unwrap();

        let mut tracker = CalorieTracker::load(storage).unwrap();
        let err = tracker.remove_workout(workout.id().as_str()).unwrap_err();
        assert!(matches!(err, StoreError::OutOfRange("total")));
        assert_eq!(tracker.workouts().len(), 1);
        assert_eq!(tracker.storage().get_workouts().unwrap().len(), 1);
    }

    #[test]
    fn test_load_rejects_overflowing_ledger() {
        let storage = Storage::new(MemoryStore::new());
        storage.save_meal(&Meal::new("A", i64::MAX)).unwrap();
        storage.save_meal(&Meal::new("B", 1)).unwrap();

        let result = CalorieTracker::load(storage);
        assert!(matches!(result, Err(StoreError::OutOfRange("consumed"))));
    }

    #[test]
    fn test_corrupt_store_fails_load() {
        let backend = MemoryStore::with_items([(WORKOUTS_KEY, "[1, 2")]);
        let result = CalorieTracker::load(Storage::new(backend));
        assert!(matches!(result, Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn test_audit_and_reconcile() {
        // total written, ledger write lost
        let backend = MemoryStore::new();
        backend
            .write_batch(&[KvWrite::set(TOTAL_CALORIES_KEY, "1200")])
            .unwrap();
        let storage = Storage::new(backend);
        storage.save_meal(&Meal::new("Lunch", 700)).unwrap();

        let mut tracker = CalorieTracker::load(storage).unwrap();
        let audit = tracker.audit();
        assert!(!audit.consistent);
        assert_eq!(audit.drift(), 500);
        assert_eq!(tracker.total_calories(), 1200);

        let log = recorded(&mut tracker);
        tracker.reconcile_total().unwrap();
        assert!(tracker.audit().consistent);
        assert_eq!(tracker.storage().get_total_calories().unwrap(), 700);
        assert_eq!(
            log.lock().unwrap()[0].change,
            Change::TotalReconciled {
                previous: 1200,
                total: 700
            }
        );

        // already consistent: nothing emitted
        tracker.reconcile_total().unwrap();
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_filters() {
        let mut tracker = tracker();
        tracker.add_meal(Meal::new("Breakfast burrito", 600)).unwrap();
        tracker.add_meal(Meal::new("bread", 150)).unwrap();
        tracker.add_meal(Meal::new("Lunch", 500)).unwrap();
        tracker.add_workout(Workout::new("Basketball", 700, None)).unwrap();

        assert_eq!(tracker.filter_meals("BR").len(), 2);
        assert_eq!(tracker.filter_meals("").len(), 3);
        assert!(tracker.filter_meals("x").is_empty());
        assert_eq!(tracker.filter_workouts("bask").len(), 1);
    }
}
