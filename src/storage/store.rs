//! Typed persistent store
//!
//! Four fixed records on top of a [`KeyValueStore`]:
//!
//! | key             | value                                   |
//! |-----------------|-----------------------------------------|
//! | `calorieLimit`  | integer as text                         |
//! | `totalCalories` | integer as text                         |
//! | `meals`         | JSON object, entry id -> meal           |
//! | `workouts`      | JSON object, entry id -> workout        |
//!
//! Ledgers are rewritten whole on every insert or removal. They only ever hold
//! one day of entries.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::backend::{KeyValueStore, KvWrite};
use super::error::{StoreError, StoreResult};
use crate::models::{EntryId, LedgerEntry, Meal, Workout};

pub const CALORIE_LIMIT_KEY: &str = "calorieLimit";
pub const TOTAL_CALORIES_KEY: &str = "totalCalories";
pub const MEALS_KEY: &str = "meals";
pub const WORKOUTS_KEY: &str = "workouts";

pub const DEFAULT_CALORIE_LIMIT: i64 = 3000;
pub const DEFAULT_TOTAL_CALORIES: i64 = 0;

/// Typed access to the tracker's persisted state
pub struct Storage<S> {
    backend: S,
    default_limit: i64,
}

impl<S: KeyValueStore> Storage<S> {
    pub fn new(backend: S) -> Self {
        Self {
            backend,
            default_limit: DEFAULT_CALORIE_LIMIT,
        }
    }

    /// Limit reported by [`get_calorie_limit`](Self::get_calorie_limit) when none is stored
    pub fn with_default_limit(mut self, default_limit: i64) -> Self {
        self.default_limit = default_limit;
        self
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    // --- Scalars ---

    pub fn get_calorie_limit(&self) -> StoreResult<i64> {
        self.get_calorie_limit_or(self.default_limit)
    }

    pub fn get_calorie_limit_or(&self, default: i64) -> StoreResult<i64> {
        self.read_integer(CALORIE_LIMIT_KEY, default)
    }

    pub fn set_calorie_limit(&self, calorie_limit: i64) -> StoreResult<()> {
        self.backend
            .set_item(CALORIE_LIMIT_KEY, &calorie_limit.to_string())
    }

    pub fn get_total_calories(&self) -> StoreResult<i64> {
        self.get_total_calories_or(DEFAULT_TOTAL_CALORIES)
    }

    pub fn get_total_calories_or(&self, default: i64) -> StoreResult<i64> {
        self.read_integer(TOTAL_CALORIES_KEY, default)
    }

    pub fn set_total_calories(&self, total_calories: i64) -> StoreResult<()> {
        self.commit(&[self.stage_total(total_calories)])
    }

    // --- Meals ---

    pub fn get_meals(&self) -> StoreResult<BTreeMap<EntryId, Meal>> {
        Ok(self.read_ledger(MEALS_KEY)?.unwrap_or_default())
    }

    pub fn save_meal(&self, meal: &Meal) -> StoreResult<()> {
        let write = self.stage_meal(meal)?;
        self.commit(&[write])
    }

    /// No-op when no meal ledger has been stored yet
    pub fn remove_meal(&self, meal: &Meal) -> StoreResult<()> {
        match self.stage_meal_removal(meal)? {
            Some(write) => self.commit(&[write]),
            None => Ok(()),
        }
    }

    // --- Workouts ---

    pub fn get_workouts(&self) -> StoreResult<BTreeMap<EntryId, Workout>> {
        Ok(self.read_ledger(WORKOUTS_KEY)?.unwrap_or_default())
    }

    pub fn save_workout(&self, workout: &Workout) -> StoreResult<()> {
        let write = self.stage_workout(workout)?;
        self.commit(&[write])
    }

    /// No-op when no workout ledger has been stored yet
    pub fn remove_workout(&self, workout: &Workout) -> StoreResult<()> {
        match self.stage_workout_removal(workout)? {
            Some(write) => self.commit(&[write]),
            None => Ok(()),
        }
    }

    /// Drop both ledgers and the running total. The calorie limit survives.
    pub fn clear_all(&self) -> StoreResult<()> {
        self.commit(&self.stage_clear())
    }

    // --- Staged writes ---
    //
    // Callers that must keep several records consistent build the writes first
    // and hand them to `commit` together.

    pub fn stage_total(&self, total_calories: i64) -> KvWrite {
        KvWrite::set(TOTAL_CALORIES_KEY, total_calories.to_string())
    }

    pub fn stage_meal(&self, meal: &Meal) -> StoreResult<KvWrite> {
        self.stage_insert(MEALS_KEY, meal)
    }

    pub fn stage_meal_removal(&self, meal: &Meal) -> StoreResult<Option<KvWrite>> {
        self.stage_delete::<Meal>(MEALS_KEY, meal.id())
    }

    pub fn stage_workout(&self, workout: &Workout) -> StoreResult<KvWrite> {
        self.stage_insert(WORKOUTS_KEY, workout)
    }

    pub fn stage_workout_removal(&self, workout: &Workout) -> StoreResult<Option<KvWrite>> {
        self.stage_delete::<Workout>(WORKOUTS_KEY, workout.id())
    }

    pub fn stage_clear(&self) -> Vec<KvWrite> {
        vec![
            KvWrite::remove(MEALS_KEY),
            KvWrite::remove(WORKOUTS_KEY),
            KvWrite::remove(TOTAL_CALORIES_KEY),
        ]
    }

    pub fn commit(&self, writes: &[KvWrite]) -> StoreResult<()> {
        if writes.is_empty() {
            return Ok(());
        }
        self.backend.write_batch(writes)
    }

    // --- Helpers ---

    fn read_integer(&self, key: &str, default: i64) -> StoreResult<i64> {
        match self.backend.get_item(key)? {
            None => Ok(default),
            Some(raw) => raw.trim().parse().map_err(|_| StoreError::InvalidNumber {
                key: key.to_string(),
                value: raw,
            }),
        }
    }

    fn read_ledger<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> StoreResult<Option<BTreeMap<EntryId, T>>> {
        let Some(raw) = self.backend.get_item(key)? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StoreError::Corrupt {
                key: key.to_string(),
                source,
            })
    }

    fn encode_ledger<T: Serialize>(
        &self,
        key: &str,
        ledger: &BTreeMap<EntryId, T>,
    ) -> StoreResult<KvWrite> {
        let value = serde_json::to_string(ledger).map_err(|source| StoreError::Serialize {
            key: key.to_string(),
            source,
        })?;
        Ok(KvWrite::set(key, value))
    }

    fn stage_insert<T>(&self, key: &str, entry: &T) -> StoreResult<KvWrite>
    where
        T: LedgerEntry + Serialize + DeserializeOwned + Clone,
    {
        let mut ledger = self.read_ledger::<T>(key)?.unwrap_or_default();
        ledger.insert(entry.id().clone(), entry.clone());
        self.encode_ledger(key, &ledger)
    }

    fn stage_delete<T>(&self, key: &str, id: &EntryId) -> StoreResult<Option<KvWrite>>
    where
        T: Serialize + DeserializeOwned,
    {
        let Some(mut ledger) = self.read_ledger::<T>(key)? else {
            return Ok(None);
        };
        ledger.remove(id);
        self.encode_ledger(key, &ledger).map(Some)
    }
}
