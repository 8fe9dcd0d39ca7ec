//! FitTrack WASM Module
//!
//! Browser bindings for the shared calculations, so the web client shows
//! the same estimates the API stores.

use fittrack_shared::health_metrics::{
    calculate_bmi as shared_bmi, calculate_bmr_mifflin, calculate_daily_targets,
    estimate_met_calories, heuristic_met, ActivityLevel, BiologicalSex, HealthProfile, DEFAULT_MET,
};
use fittrack_shared::models::FitnessGoal;
use fittrack_shared::units::{HeightUnit, WeightUnit};
use wasm_bindgen::prelude::*;

/// Calculate BMI from weight (kg) and height (cm)
#[wasm_bindgen]
pub fn calculate_bmi(weight_kg: f64, height_cm: f64) -> f64 {
    shared_bmi(weight_kg, height_cm)
}

/// Mifflin-St Jeor BMR; `None` for an unknown `sex`
#[wasm_bindgen]
pub fn calculate_bmr(weight_kg: f64, height_cm: f64, age_years: i32, sex: &str) -> Option<f64> {
    let sex = sex.parse::<BiologicalSex>().ok()?;
    Some(calculate_bmr_mifflin(weight_kg, height_cm, age_years, sex))
}

/// BMR scaled by the activity multiplier
#[wasm_bindgen]
pub fn calculate_tdee(
    weight_kg: f64,
    height_cm: f64,
    age_years: i32,
    sex: &str,
    activity_level: &str,
) -> Option<f64> {
    let level = activity_level.parse::<ActivityLevel>().ok()?;
    calculate_bmr(weight_kg, height_cm, age_years, sex).map(|bmr| bmr * level.multiplier())
}

/// Convert a weight in `unit` ("kg", "lbs", "stone", ...) to kilograms
#[wasm_bindgen]
pub fn weight_to_kg(value: f64, unit: &str) -> Option<f64> {
    unit.parse::<WeightUnit>().ok().map(|unit| unit.to_kg(value))
}

/// Convert a height in `unit` ("cm", "m", "in", ...) to centimeters
#[wasm_bindgen]
pub fn height_to_cm(value: f64, unit: &str) -> Option<f64> {
    unit.parse::<HeightUnit>().ok().map(|unit| unit.to_cm(value))
}

/// Estimate calories burned for an activity
///
/// `met` of zero or less falls back to the name heuristic, then to the
/// default MET.
#[wasm_bindgen]
pub fn estimate_activity_calories(
    activity_name: &str,
    met: f64,
    weight_kg: f64,
    duration_minutes: i32,
) -> f64 {
    let met = if met > 0.0 {
        met
    } else {
        heuristic_met(activity_name).unwrap_or(DEFAULT_MET)
    };
    estimate_met_calories(met, weight_kg, duration_minutes)
}

/// Daily targets as a JSON string
///
/// `sex`, `activity_level` and `goal` use the API's string values.
/// Returns `None` when one of them is not recognised.
#[wasm_bindgen]
pub fn daily_targets_json(
    weight_kg: f64,
    height_cm: f64,
    age_years: i32,
    sex: &str,
    activity_level: &str,
    goal: &str,
) -> Option<String> {
    let profile = HealthProfile {
        height_cm,
        weight_kg,
        age_years,
        sex: sex.parse::<BiologicalSex>().ok()?,
        activity_level: activity_level.parse::<ActivityLevel>().ok()?,
        goal: goal.parse::<FitnessGoal>().ok()?,
    };
    serde_json::to_string(&calculate_daily_targets(&profile, None)).ok()
}
