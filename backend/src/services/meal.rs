//! Meal logging service
//!
//! Meals are either entered by hand or derived from a catalog item, in which
//! case calories and macros are scaled from the item's serving.

use crate::db::{decimal_to_f64, f64_to_decimal, opt_decimal_to_f64, opt_f64_to_decimal};
use crate::error::ApiError;
use crate::repositories::{
    ConsumableItemRecord, ConsumableItemRepository, CreateMeal, MealRecord, MealRepository,
    NutrientRecord, UpdateMeal,
};
use chrono::{NaiveDate, Utc};
use fittrack_shared::health_metrics::round1;
use fittrack_shared::models::MealType;
use fittrack_shared::types::{
    CreateMealRequest, LogMealFromItemRequest, MacroTotals, MealResponse, MealSummaryResponse,
    MealTypeTotals, UpdateMealRequest,
};
use fittrack_shared::validation::{validate_macro_grams, validate_meal_calories};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;
use validator::Validate;

/// Largest quantity accepted when logging from an item
const MAX_QUANTITY_G: f64 = 5000.0;

pub struct MealService;

impl MealService {
    pub async fn create_meal(
        pool: &PgPool,
        user_id: Uuid,
        req: CreateMealRequest,
    ) -> Result<MealResponse, ApiError> {
        req.validate()?;
        validate_amounts(
            Some(req.calories),
            Some(req.protein_g),
            Some(req.carbs_g),
            Some(req.fat_g),
        )?;

        let record = MealRepository::create(
            pool,
            CreateMeal {
                user_id,
                name: req.name.trim().to_string(),
                meal_type: req.meal_type.as_str().to_string(),
                calories: f64_to_decimal(req.calories, 1),
                protein_g: f64_to_decimal(req.protein_g, 1),
                carbs_g: f64_to_decimal(req.carbs_g, 1),
                fat_g: f64_to_decimal(req.fat_g, 1),
                eaten_on: req.eaten_on.unwrap_or_else(|| Utc::now().date_naive()),
                consumable_item_id: None,
                quantity_g: None,
            },
        )
        .await
        .map_err(ApiError::Internal)?;

        metrics::counter!("fittrack_meals_logged_total").increment(1);
        debug!(user_id = %user_id, meal_id = %record.id, "meal logged");
        meal_response(record)
    }

    /// Log a meal from a catalog item, scaled to the eaten quantity
    pub async fn log_from_item(
        pool: &PgPool,
        user_id: Uuid,
        req: LogMealFromItemRequest,
    ) -> Result<MealResponse, ApiError> {
        if !req.quantity_g.is_finite() || req.quantity_g <= 0.0 || req.quantity_g > MAX_QUANTITY_G {
            return Err(ApiError::invalid_field(
                "quantity_g",
                format!("Quantity must be greater than 0 and at most {} g", MAX_QUANTITY_G),
            ));
        }

        let item = ConsumableItemRepository::find(pool, req.consumable_item_id)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| ApiError::NotFound("Consumable item not found".to_string()))?;
        let nutrients = ConsumableItemRepository::nutrients(pool, item.id)
            .await
            .map_err(ApiError::Internal)?;

        let totals = scale_item(&item, &nutrients, req.quantity_g);
        check_scaled_totals(&totals)?;
        let name = req
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| item.name.clone());

        let record = MealRepository::create(
            pool,
            CreateMeal {
                user_id,
                name,
                meal_type: req.meal_type.as_str().to_string(),
                calories: f64_to_decimal(totals.calories, 1),
                protein_g: f64_to_decimal(totals.protein_g, 1),
                carbs_g: f64_to_decimal(totals.carbs_g, 1),
                fat_g: f64_to_decimal(totals.fat_g, 1),
                eaten_on: req.eaten_on.unwrap_or_else(|| Utc::now().date_naive()),
                consumable_item_id: Some(item.id),
                quantity_g: Some(f64_to_decimal(req.quantity_g, 1)),
            },
        )
        .await
        .map_err(ApiError::Internal)?;

        metrics::counter!("fittrack_meals_logged_total").increment(1);
        meal_response(record)
    }

    pub async fn get_meal(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<MealResponse, ApiError> {
        let record = MealRepository::find(pool, user_id, id)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| ApiError::NotFound("Meal not found".to_string()))?;
        meal_response(record)
    }

    pub async fn update_meal(
        pool: &PgPool,
        user_id: Uuid,
        id: Uuid,
        req: UpdateMealRequest,
    ) -> Result<MealResponse, ApiError> {
        req.validate()?;
        validate_amounts(req.calories, req.protein_g, req.carbs_g, req.fat_g)?;

        let record = MealRepository::update(
            pool,
            user_id,
            id,
            UpdateMeal {
                name: req.name.map(|n| n.trim().to_string()),
                meal_type: req.meal_type.map(|t| t.as_str().to_string()),
                calories: opt_f64_to_decimal(req.calories, 1),
                protein_g: opt_f64_to_decimal(req.protein_g, 1),
                carbs_g: opt_f64_to_decimal(req.carbs_g, 1),
                fat_g: opt_f64_to_decimal(req.fat_g, 1),
                eaten_on: req.eaten_on,
            },
        )
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::NotFound("Meal not found".to_string()))?;

        meal_response(record)
    }

    pub async fn delete_meal(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<(), ApiError> {
        let deleted = MealRepository::delete(pool, user_id, id)
            .await
            .map_err(ApiError::Internal)?;
        if !deleted {
            return Err(ApiError::NotFound("Meal not found".to_string()));
        }
        Ok(())
    }

    /// Meals of one day, breakfast first
    pub async fn list_meals(pool: &PgPool, user_id: Uuid, date: NaiveDate) -> Result<Vec<MealResponse>, ApiError> {
        let records = MealRepository::list_for_day(pool, user_id, date)
            .await
            .map_err(ApiError::Internal)?;

        let mut meals = records
            .into_iter()
            .map(meal_response)
            .collect::<Result<Vec<_>, _>>()?;
        meals.sort_by(|a, b| a.meal_type.cmp(&b.meal_type).then(a.created_at.cmp(&b.created_at)));
        Ok(meals)
    }

    pub async fn daily_summary(
        pool: &PgPool,
        user_id: Uuid,
        date: NaiveDate,
    ) -> Result<MealSummaryResponse, ApiError> {
        let meals = Self::list_meals(pool, user_id, date).await?;
        Ok(summarize_meals(date, &meals))
    }
}

fn validate_amounts(
    calories: Option<f64>,
    protein_g: Option<f64>,
    carbs_g: Option<f64>,
    fat_g: Option<f64>,
) -> Result<(), ApiError> {
    if let Some(calories) = calories {
        validate_meal_calories(calories).map_err(|m| ApiError::invalid_field("calories", m))?;
    }
    for (field, value) in [("protein_g", protein_g), ("carbs_g", carbs_g), ("fat_g", fat_g)] {
        if let Some(grams) = value {
            validate_macro_grams(field, grams).map_err(|m| ApiError::invalid_field(field, m))?;
        }
    }
    Ok(())
}

/// Scaled totals obey the same bounds as a hand-entered meal; the quantity is to blame
fn check_scaled_totals(totals: &MacroTotals) -> Result<(), ApiError> {
    validate_amounts(
        Some(totals.calories),
        Some(totals.protein_g),
        Some(totals.carbs_g),
        Some(totals.fat_g),
    )
    .map_err(|e| match e {
        ApiError::InvalidField { message, .. } => ApiError::invalid_field("quantity_g", message),
        other => other,
    })
}

fn nutrient_amount(nutrients: &[NutrientRecord], names: &[&str]) -> f64 {
    nutrients
        .iter()
        .find(|n| names.iter().any(|name| n.name.eq_ignore_ascii_case(name)))
        .map(|n| decimal_to_f64(&n.amount))
        .unwrap_or(0.0)
}

/// Calories and macros of `quantity_g` grams of an item
///
/// Nutrient amounts are per serving; missing macros count as zero.
pub fn scale_item(item: &ConsumableItemRecord, nutrients: &[NutrientRecord], quantity_g: f64) -> MacroTotals {
    let serving = decimal_to_f64(&item.serving_size_g);
    let factor = if serving > 0.0 { quantity_g / serving } else { 0.0 };

    MacroTotals {
        calories: round1(decimal_to_f64(&item.calories_per_serving) * factor),
        protein_g: round1(nutrient_amount(nutrients, &["protein"]) * factor),
        carbs_g: round1(nutrient_amount(nutrients, &["carbohydrates", "carbs"]) * factor),
        fat_g: round1(nutrient_amount(nutrients, &["fat"]) * factor),
    }
}

fn add_meal(totals: &mut MacroTotals, meal: &MealResponse) {
    totals.calories += meal.calories;
    totals.protein_g += meal.protein_g;
    totals.carbs_g += meal.carbs_g;
    totals.fat_g += meal.fat_g;
}

fn rounded(totals: MacroTotals) -> MacroTotals {
    MacroTotals {
        calories: round1(totals.calories),
        protein_g: round1(totals.protein_g),
        carbs_g: round1(totals.carbs_g),
        fat_g: round1(totals.fat_g),
    }
}

/// Day totals with a breakdown for every meal type that was eaten
pub fn summarize_meals(date: NaiveDate, meals: &[MealResponse]) -> MealSummaryResponse {
    let mut totals = MacroTotals::default();
    for meal in meals {
        add_meal(&mut totals, meal);
    }

    let by_meal_type = MealType::ALL
        .iter()
        .filter_map(|meal_type| {
            let of_type: Vec<&MealResponse> = meals.iter().filter(|m| m.meal_type == *meal_type).collect();
            if of_type.is_empty() {
                return None;
            }
            let mut type_totals = MacroTotals::default();
            for meal in &of_type {
                add_meal(&mut type_totals, meal);
            }
            Some(MealTypeTotals {
                meal_type: *meal_type,
                meal_count: of_type.len(),
                totals: rounded(type_totals),
            })
        })
        .collect();

    MealSummaryResponse {
        date,
        meal_count: meals.len(),
        totals: rounded(totals),
        by_meal_type,
    }
}

fn meal_response(record: MealRecord) -> Result<MealResponse, ApiError> {
    let meal_type = record
        .meal_type
        .parse::<MealType>()
        .map_err(|e| ApiError::Internal(anyhow::anyhow!(e)))?;

    Ok(MealResponse {
        id: record.id,
        name: record.name,
        meal_type,
        calories: decimal_to_f64(&record.calories),
        protein_g: decimal_to_f64(&record.protein_g),
        carbs_g: decimal_to_f64(&record.carbs_g),
        fat_g: decimal_to_f64(&record.fat_g),
        eaten_on: record.eaten_on,
        consumable_item_id: record.consumable_item_id,
        quantity_g: opt_decimal_to_f64(&record.quantity_g),
        created_at: record.created_at,
    })
}
