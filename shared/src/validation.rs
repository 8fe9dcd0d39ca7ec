//! Input validation functions
//!
//! Format rules (email, string lengths) are declared on the request types
//! with `validator` derives; the numeric domain rules live here so the
//! backend and the clients agree on them.

use chrono::NaiveDate;

/// Validate body weight (kg)
pub fn validate_weight(weight_kg: f64) -> Result<(), String> {
    if weight_kg.is_nan() || weight_kg.is_infinite() {
        return Err("Weight must be a valid number".to_string());
    }
    if weight_kg < 20.0 {
        return Err("Weight must be at least 20 kg".to_string());
    }
    if weight_kg > 500.0 {
        return Err("Weight must be at most 500 kg".to_string());
    }
    Ok(())
}

/// Validate height (cm), 50-300
pub fn validate_height_cm(height_cm: f64) -> Result<(), String> {
    if height_cm.is_nan() || height_cm.is_infinite() {
        return Err("Height must be a valid number".to_string());
    }
    if height_cm < 50.0 {
        return Err("Height must be at least 50 cm".to_string());
    }
    if height_cm > 300.0 {
        return Err("Height must be at most 300 cm".to_string());
    }
    Ok(())
}

/// Date of birth must be in the past and give an age between 1 and 150
pub fn validate_date_of_birth(dob: NaiveDate, today: NaiveDate) -> Result<(), String> {
    if dob > today {
        return Err("Date of birth cannot be in the future".to_string());
    }
    match today.years_since(dob) {
        Some(age) if age < 1 => Err("Age must be at least 1 year".to_string()),
        Some(age) if age > 150 => Err("Age cannot exceed 150 years".to_string()),
        None => Err("Invalid date of birth".to_string()),
        _ => Ok(()),
    }
}

/// Calories of a single meal
pub fn validate_meal_calories(calories: f64) -> Result<(), String> {
    if calories.is_nan() || calories.is_infinite() {
        return Err("Calories must be a valid number".to_string());
    }
    if calories < 0.0 {
        return Err("Calories cannot be negative".to_string());
    }
    if calories > 10000.0 {
        return Err("Calorie value unreasonably high".to_string());
    }
    Ok(())
}

/// Grams of a macro nutrient
pub fn validate_macro_grams(name: &str, grams: f64) -> Result<(), String> {
    if grams.is_nan() || grams.is_infinite() || grams < 0.0 {
        return Err(format!("{} must be a non-negative number", name));
    }
    if grams > 2000.0 {
        return Err(format!("{} value unreasonably high", name));
    }
    Ok(())
}

/// Activity duration, 1 minute to 24 hours
pub fn validate_duration_minutes(minutes: i32) -> Result<(), String> {
    if minutes < 1 {
        return Err("Duration must be at least 1 minute".to_string());
    }
    if minutes > 1440 {
        return Err("Duration cannot exceed 24 hours".to_string());
    }
    Ok(())
}

/// Explicit daily calorie goal set by the user
pub fn validate_daily_calorie_goal(calories: i32) -> Result<(), String> {
    if !(800..=10000).contains(&calories) {
        return Err("Daily calorie goal must be between 800 and 10000".to_string());
    }
    Ok(())
}

/// Usernames are 3-32 characters of letters, digits, `_`, `-` or `.`
pub fn validate_username(username: &str) -> Result<(), String> {
    let len = username.chars().count();
    if !(3..=32).contains(&len) {
        return Err("Username must be between 3 and 32 characters".to_string());
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Err("Username may only contain letters, digits, '_', '-' and '.'".to_string());
    }
    Ok(())
}
