//! API request and response types

use crate::health_metrics::{ActivityLevel, BiologicalSex, DailyTargets};
use crate::models::{FitnessGoal, MealType, MetSource, Role, WeightSource};
use crate::units::{HeightUnit, WeightUnit};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

// ============================================================================
// Common
// ============================================================================

/// Optional inclusive date range
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DateRangeQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// Single day, defaults to today
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DateQuery {
    pub date: Option<NaiveDate>,
}

/// Paginated response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, total: i64, page: u32, per_page: u32) -> Self {
        let per_page = per_page.max(1);
        let total_pages = ((total.max(0) as u64 + per_page as u64 - 1) / per_page as u64) as u32;
        Self {
            data,
            total,
            page,
            per_page,
            total_pages,
        }
    }
}

/// Plain acknowledgement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ============================================================================
// Authentication
// ============================================================================

/// Authentication tokens response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Registration request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    pub username: String,
    #[validate(length(min = 8, max = 128, message = "Password must be 8 to 128 characters"))]
    pub password: String,
    #[validate(length(max = 64))]
    #[serde(default)]
    pub first_name: String,
    #[validate(length(max = 64))]
    #[serde(default)]
    pub last_name: String,
}

/// Login request; `login` is an email or a username
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "email", alias = "username")]
    pub login: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    pub token: String,
    #[validate(length(min = 8, max = 128, message = "Password must be 8 to 128 characters"))]
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    #[validate(length(min = 8, max = 128, message = "Password must be 8 to 128 characters"))]
    pub new_password: String,
}

// ============================================================================
// User profile
// ============================================================================

/// User profile response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfileResponse {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub date_of_birth: Option<NaiveDate>,
    pub age_years: Option<i32>,
    pub gender: Option<BiologicalSex>,
    pub activity_level: ActivityLevel,
    pub fitness_goal: FitnessGoal,
    pub target_weight_kg: Option<f64>,
    pub daily_calorie_goal: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bmi: Option<f64>,
    pub profile_picture_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Partial profile update; absent fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(max = 64))]
    pub first_name: Option<String>,
    #[validate(length(max = 64))]
    pub last_name: Option<String>,
    pub weight: Option<f64>,
    pub weight_unit: Option<WeightUnit>,
    pub height: Option<f64>,
    pub height_unit: Option<HeightUnit>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<BiologicalSex>,
    pub activity_level: Option<ActivityLevel>,
    pub fitness_goal: Option<FitnessGoal>,
    pub target_weight_kg: Option<f64>,
    pub daily_calorie_goal: Option<i32>,
}

/// Daily targets with the goal they were derived from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyTargetsResponse {
    #[serde(flatten)]
    pub targets: DailyTargets,
    pub fitness_goal: FitnessGoal,
    /// True when the user's explicit daily goal replaced the computed target
    pub overridden: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfilePictureResponse {
    pub url: String,
}

// ============================================================================
// Activities
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityCategoryResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub default_met: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityTypeResponse {
    pub id: Uuid,
    pub category_id: Uuid,
    pub category_name: String,
    pub name: String,
    pub met_value: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivityTypesQuery {
    pub category_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LogActivityRequest {
    pub activity_type_id: Uuid,
    pub duration_minutes: i32,
    /// Computed from MET values when absent
    pub calories_burned: Option<f64>,
    pub performed_on: Option<NaiveDate>,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateActivityRequest {
    pub activity_type_id: Option<Uuid>,
    pub duration_minutes: Option<i32>,
    pub calories_burned: Option<f64>,
    pub performed_on: Option<NaiveDate>,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityResponse {
    pub id: Uuid,
    pub activity_type_id: Uuid,
    pub activity_type_name: String,
    pub category_name: String,
    pub duration_minutes: i32,
    pub calories_burned: f64,
    pub performed_on: NaiveDate,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimateCaloriesRequest {
    pub activity_type_id: Uuid,
    pub duration_minutes: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalorieEstimateResponse {
    pub calories: f64,
    pub met: f64,
    pub met_source: MetSource,
    pub weight_kg: f64,
    pub weight_source: WeightSource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivitySummaryResponse {
    pub date: NaiveDate,
    pub activity_count: i64,
    pub total_minutes: i64,
    pub total_calories: f64,
}

// ============================================================================
// Meals
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateMealRequest {
    #[validate(length(min = 1, max = 120, message = "Name must be 1 to 120 characters"))]
    pub name: String,
    pub meal_type: MealType,
    pub calories: f64,
    #[serde(default)]
    pub protein_g: f64,
    #[serde(default)]
    pub carbs_g: f64,
    #[serde(default)]
    pub fat_g: f64,
    pub eaten_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateMealRequest {
    #[validate(length(min = 1, max = 120, message = "Name must be 1 to 120 characters"))]
    pub name: Option<String>,
    pub meal_type: Option<MealType>,
    pub calories: Option<f64>,
    pub protein_g: Option<f64>,
    pub carbs_g: Option<f64>,
    pub fat_g: Option<f64>,
    pub eaten_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogMealFromItemRequest {
    pub consumable_item_id: Uuid,
    pub quantity_g: f64,
    pub meal_type: MealType,
    pub eaten_on: Option<NaiveDate>,
    /// Defaults to the item name
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealResponse {
    pub id: Uuid,
    pub name: String,
    pub meal_type: MealType,
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub eaten_on: NaiveDate,
    pub consumable_item_id: Option<Uuid>,
    pub quantity_g: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// Calorie and macro totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MacroTotals {
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealTypeTotals {
    pub meal_type: MealType,
    pub meal_count: usize,
    pub totals: MacroTotals,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealSummaryResponse {
    pub date: NaiveDate,
    pub meal_count: usize,
    pub totals: MacroTotals,
    pub by_meal_type: Vec<MealTypeTotals>,
}

// ============================================================================
// Nutrition catalog
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NutrientDto {
    #[validate(length(min = 1, max = 64))]
    pub name: String,
    pub amount: f64,
    #[validate(length(min = 1, max = 16))]
    pub unit: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumableItemSummary {
    pub id: Uuid,
    pub name: String,
    pub brand: Option<String>,
    pub serving_size_g: f64,
    pub calories_per_serving: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumableItemResponse {
    pub id: Uuid,
    pub name: String,
    pub brand: Option<String>,
    pub serving_size_g: f64,
    pub calories_per_serving: f64,
    pub nutrients: Vec<NutrientDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateConsumableItemRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    pub brand: Option<String>,
    pub serving_size_g: f64,
    pub calories_per_serving: f64,
    #[validate(nested)]
    #[serde(default)]
    pub nutrients: Vec<NutrientDto>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemSearchQuery {
    pub q: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyNutritionResponse {
    pub date: NaiveDate,
    pub intake: MacroTotals,
    pub calories_burned: f64,
    pub net_calories: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calorie_target: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_calories: Option<f64>,
}

// ============================================================================
// Weight
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogWeightRequest {
    /// Weight in `unit` (kg when absent)
    pub weight: f64,
    pub unit: Option<WeightUnit>,
    pub recorded_on: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightRecordResponse {
    pub id: Uuid,
    pub weight_kg: f64,
    pub recorded_on: NaiveDate,
    pub notes: Option<String>,
}

/// One calendar day of weight progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightProgressPoint {
    pub date: NaiveDate,
    pub weight_kg: f64,
    /// False when the weight was carried forward from an earlier day
    pub recorded: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightProgressResponse {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub points: Vec<WeightProgressPoint>,
    pub start_weight_kg: Option<f64>,
    pub current_weight_kg: Option<f64>,
    pub change_kg: Option<f64>,
    pub moving_average_7d: Option<f64>,
    pub target_weight_kg: Option<f64>,
    pub remaining_to_target_kg: Option<f64>,
}

// ============================================================================
// Administration
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminUsersQuery {
    pub search: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUserSummary {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminStatsResponse {
    pub users: i64,
    pub admins: i64,
    pub meals: i64,
    pub activities: i64,
    pub weight_records: i64,
    pub consumable_items: i64,
    pub activity_types: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateActivityCategoryRequest {
    #[validate(length(min = 1, max = 80))]
    pub name: String,
    pub description: Option<String>,
    pub default_met: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateActivityTypeRequest {
    pub category_id: Uuid,
    #[validate(length(min = 1, max = 80))]
    pub name: String,
    pub met_value: Option<f64>,
}

/// Rows inserted by one seeding run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedReport {
    pub categories_inserted: u64,
    pub activity_types_inserted: u64,
    pub consumable_items_inserted: u64,
    pub nutrients_inserted: u64,
    pub admin_created: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginated_total_pages() {
        let page: PaginatedResponse<u8> = PaginatedResponse::new(vec![], 41, 1, 20);
        assert_eq!(page.total_pages, 3);
        let empty: PaginatedResponse<u8> = PaginatedResponse::new(vec![], 0, 1, 20);
        assert_eq!(empty.total_pages, 0);
    }

    #[test]
    fn test_register_request_validation() {
        let req = RegisterRequest {
            email: "not-an-email".to_string(),
            username: "jane".to_string(),
            password: "short".to_string(),
            first_name: String::new(),
            last_name: String::new(),
        };
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
    }

    #[test]
    fn test_login_accepts_email_alias() {
        let req: LoginRequest =
            serde_json::from_str(r#"{"email":"a@b.co","password":"secret123"}"#).unwrap();
        assert_eq!(req.login, "a@b.co");
    }

    #[test]
    fn test_targets_response_is_flattened() {
        let response = DailyTargetsResponse {
            targets: DailyTargets {
                bmr: 1780.0,
                tdee: 2759.0,
                calorie_target: 2259.0,
                protein_g: 169.4,
                carbs_g: 225.9,
                fat_g: 75.3,
            },
            fitness_goal: FitnessGoal::LoseWeight,
            overridden: false,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["calorie_target"], 2259.0);
        assert_eq!(json["fitness_goal"], "lose_weight");
    }
}
