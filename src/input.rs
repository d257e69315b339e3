//! User input validation
//!
//! The tracker core accepts any values; front ends validate raw text with
//! these helpers before calling it.

use thiserror::Error;

use crate::models::{Intensity, Meal, Workout};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("Please fill in all fields ({0} is empty)")]
    MissingField(&'static str),

    #[error("Please enter a valid number for {field} (got {value:?})")]
    InvalidNumber { field: &'static str, value: String },

    #[error("{field} must be at most {max} (got {value})")]
    TooLarge {
        field: &'static str,
        value: i64,
        max: i64,
    },

    #[error("Unknown intensity {0:?} (expected low, moderate or high)")]
    InvalidIntensity(String),
}

/// Largest amount accepted for a single entry or a daily limit
pub const MAX_CALORIES: i64 = 1_000_000;

/// Parse a non-negative amount of calories, rounding to the nearest whole number
fn parse_calories(field: &'static str, raw: &str) -> Result<i64, InputError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(InputError::MissingField(field));
    }

    let invalid = || InputError::InvalidNumber {
        field,
        value: raw.to_string(),
    };

    let value: f64 = trimmed.parse().map_err(|_| invalid())?;
    let rounded = value.round();
    // -0.4 rounds to -0.0, which is zero
    if !rounded.is_finite() || rounded < 0.0 {
        return Err(invalid());
    }
    if rounded > MAX_CALORIES as f64 {
        return Err(InputError::TooLarge {
            field,
            value: rounded.min(i64::MAX as f64) as i64,
            max: MAX_CALORIES,
        });
    }
    Ok(rounded as i64)
}

/// Validate a daily limit typed by the user
pub fn parse_limit(raw: &str) -> Result<i64, InputError> {
    parse_calories("limit", raw)
}

fn require_name(name: &str) -> Result<&str, InputError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(InputError::MissingField("name"));
    }
    Ok(name)
}

pub fn parse_intensity(raw: Option<&str>) -> Result<Option<Intensity>, InputError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => Intensity::parse(s)
            .map(Some)
            .ok_or_else(|| InputError::InvalidIntensity(s.to_string())),
    }
}

/// Validate the name and calories fields shared by meals and workouts
pub fn parse_entry<'a>(name: &'a str, calories: &str) -> Result<(&'a str, i64), InputError> {
    let name = require_name(name)?;
    let calories = parse_calories("calories", calories)?;
    Ok((name, calories))
}

/// Build a new meal from form fields
pub fn parse_meal(name: &str, calories: &str) -> Result<Meal, InputError> {
    let (name, calories) = parse_entry(name, calories)?;
    Ok(Meal::new(name, calories))
}

/// Build a new workout from form fields
pub fn parse_workout(
    name: &str,
    calories: &str,
    intensity: Option<&str>,
) -> Result<Workout, InputError> {
    let (name, calories) = parse_entry(name, calories)?;
    let intensity = parse_intensity(intensity)?;
    Ok(Workout::new(name, calories, intensity))
}
