//! Health metrics calculations module
//!
//! Pure calculations shared by the backend and the WASM bindings:
//! BMI, BMR/TDEE, goal-adjusted daily targets and MET-based
//! exercise calorie estimates.
//!
//! All inputs are SI (kg, cm, minutes); conversion happens at the API boundary.

use crate::models::FitnessGoal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Profile Types
// ============================================================================

/// Biological sex for physiological calculations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BiologicalSex {
    Male,
    Female,
}

impl BiologicalSex {
    pub fn as_str(&self) -> &'static str {
        match self {
            BiologicalSex::Male => "male",
            BiologicalSex::Female => "female",
        }
    }
}

impl FromStr for BiologicalSex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "male" | "m" => Ok(BiologicalSex::Male),
            "female" | "f" => Ok(BiologicalSex::Female),
            _ => Err(format!("Unknown gender: {}", s)),
        }
    }
}

/// Activity level for TDEE calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    /// Little or no exercise
    Sedentary,
    /// Light exercise 1-3 days/week
    #[default]
    LightlyActive,
    /// Moderate exercise 3-5 days/week
    ModeratelyActive,
    /// Hard exercise 6-7 days/week
    VeryActive,
    /// Very hard exercise, physical job
    ExtraActive,
}

impl ActivityLevel {
    /// Multiplier applied to BMR
    pub fn multiplier(&self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::LightlyActive => 1.375,
            ActivityLevel::ModeratelyActive => 1.55,
            ActivityLevel::VeryActive => 1.725,
            ActivityLevel::ExtraActive => 1.9,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "sedentary",
            ActivityLevel::LightlyActive => "lightly_active",
            ActivityLevel::ModeratelyActive => "moderately_active",
            ActivityLevel::VeryActive => "very_active",
            ActivityLevel::ExtraActive => "extra_active",
        }
    }
}

impl fmt::Display for ActivityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sedentary" => Ok(ActivityLevel::Sedentary),
            "lightly_active" | "light" => Ok(ActivityLevel::LightlyActive),
            "moderately_active" | "moderate" => Ok(ActivityLevel::ModeratelyActive),
            "very_active" | "active" => Ok(ActivityLevel::VeryActive),
            "extra_active" | "extra" => Ok(ActivityLevel::ExtraActive),
            _ => Err(format!("Unknown activity level: {}", s)),
        }
    }
}

/// Profile data needed for energy calculations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthProfile {
    pub height_cm: f64,
    pub weight_kg: f64,
    pub age_years: i32,
    pub sex: BiologicalSex,
    pub activity_level: ActivityLevel,
    pub goal: FitnessGoal,
}

// ============================================================================
// BMI
// ============================================================================

/// BMI category classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

/// BMI = weight(kg) / height(m)²
pub fn calculate_bmi(weight_kg: f64, height_cm: f64) -> f64 {
    if height_cm <= 0.0 {
        return 0.0;
    }
    let height_m = height_cm / 100.0;
    weight_kg / (height_m * height_m)
}

pub fn classify_bmi(bmi: f64) -> BmiCategory {
    if bmi < 18.5 {
        BmiCategory::Underweight
    } else if bmi < 25.0 {
        BmiCategory::Normal
    } else if bmi < 30.0 {
        BmiCategory::Overweight
    } else {
        BmiCategory::Obese
    }
}

// ============================================================================
// BMR, TDEE and daily targets
// ============================================================================

/// Lowest calorie target ever recommended
pub const MIN_DAILY_CALORIES: f64 = 1200.0;

/// Macro split of the calorie target (protein, carbs, fat)
pub const MACRO_SPLIT: (f64, f64, f64) = (0.30, 0.40, 0.30);

/// Basal Metabolic Rate, Mifflin-St Jeor
///
/// Men: 10 × weight(kg) + 6.25 × height(cm) - 5 × age(y) + 5
/// Women: 10 × weight(kg) + 6.25 × height(cm) - 5 × age(y) - 161
pub fn calculate_bmr_mifflin(weight_kg: f64, height_cm: f64, age_years: i32, sex: BiologicalSex) -> f64 {
    let base = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * age_years as f64;
    match sex {
        BiologicalSex::Male => base + 5.0,
        BiologicalSex::Female => base - 161.0,
    }
}

/// Total Daily Energy Expenditure = BMR × activity multiplier
pub fn calculate_tdee(profile: &HealthProfile) -> f64 {
    calculate_bmr_mifflin(profile.weight_kg, profile.height_cm, profile.age_years, profile.sex)
        * profile.activity_level.multiplier()
}

/// Daily energy and macro targets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTargets {
    pub bmr: f64,
    pub tdee: f64,
    pub calorie_target: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

/// Compute daily targets for a profile
///
/// `calorie_override` (the user's explicit daily goal) replaces the
/// goal-adjusted TDEE. Macros are derived from whichever target wins.
pub fn calculate_daily_targets(profile: &HealthProfile, calorie_override: Option<f64>) -> DailyTargets {
    let bmr = calculate_bmr_mifflin(profile.weight_kg, profile.height_cm, profile.age_years, profile.sex);
    let tdee = bmr * profile.activity_level.multiplier();
    let calorie_target = calorie_override
        .unwrap_or_else(|| (tdee + profile.goal.calorie_adjustment()).max(MIN_DAILY_CALORIES));

    let (protein_share, carbs_share, fat_share) = MACRO_SPLIT;

    DailyTargets {
        bmr: round1(bmr),
        tdee: round1(tdee),
        calorie_target: calorie_target.round(),
        // 4 kcal/g protein and carbs, 9 kcal/g fat
        protein_g: round1(calorie_target * protein_share / 4.0),
        carbs_g: round1(calorie_target * carbs_share / 4.0),
        fat_g: round1(calorie_target * fat_share / 9.0),
    }
}

// ============================================================================
// MET-based exercise calories
// ============================================================================

/// MET used when nothing better is known (moderate effort)
pub const DEFAULT_MET: f64 = 4.0;

/// Body weight used when the user never recorded one
pub const DEFAULT_WEIGHT_KG: f64 = 70.0;

/// Keyword → MET table, first match wins
const MET_KEYWORDS: &[(&[&str], f64)] = &[
    (&["hiit", "interval", "crossfit"], 8.0),
    (&["run", "jog", "sprint"], 9.8),
    (&["swim"], 8.0),
    (&["cycl", "bike", "biking", "spin"], 7.5),
    (&["row"], 7.0),
    (&["hik"], 6.0),
    (&["strength", "weight", "lift", "resistance"], 6.0),
    (&["danc", "zumba", "aerobic"], 5.0),
    (&["walk"], 3.5),
    (&["yoga", "stretch", "pilates"], 2.5),
];

/// Guess a MET value from an activity name
pub fn heuristic_met(activity_name: &str) -> Option<f64> {
    let name = activity_name.to_lowercase();
    MET_KEYWORDS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| name.contains(k)))
        .map(|(_, met)| *met)
}

/// kcal = MET × weight(kg) × hours, rounded to one decimal
pub fn estimate_met_calories(met: f64, weight_kg: f64, duration_minutes: i32) -> f64 {
    if met <= 0.0 || weight_kg <= 0.0 || duration_minutes <= 0 {
        return 0.0;
    }
    round1(met * weight_kg * duration_minutes as f64 / 60.0)
}

/// Arithmetic mean of the last `n` values (or fewer when the slice is shorter)
pub fn trailing_average(values: &[f64], n: usize) -> Option<f64> {
    if values.is_empty() || n == 0 {
        return None;
    }
    let window = &values[values.len().saturating_sub(n)..];
    Some(window.iter().sum::<f64>() / window.len() as f64)
}

/// Round to one decimal place
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
