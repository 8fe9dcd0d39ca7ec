//! Consumable item catalog and daily nutrition balance

use crate::cache::{CatalogCache, ItemCatalog};
use crate::db::{decimal_to_f64, f64_to_decimal};
use crate::error::ApiError;
use crate::repositories::{
    ActivityRepository, ConsumableItemRecord, ConsumableItemRepository, CreateConsumableItem,
    CreateNutrient, NutrientRecord, UserRepository,
};
use crate::services::meal::MealService;
use crate::services::user::daily_targets_for;
use chrono::{NaiveDate, Utc};
use fittrack_shared::health_metrics::round1;
use fittrack_shared::types::{
    ConsumableItemResponse, ConsumableItemSummary, CreateConsumableItemRequest,
    DailyNutritionResponse, MacroTotals, NutrientDto,
};
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

pub const DEFAULT_SEARCH_LIMIT: i64 = 20;
pub const MAX_SEARCH_LIMIT: i64 = 100;

/// Largest serving a NUMERIC(7, 2) column holds
const MAX_SERVING_SIZE_G: i64 = 100_000;

pub struct NutritionService;

impl NutritionService {
    /// Whole catalog from the cache
    pub async fn catalog(pool: &PgPool, cache: &CatalogCache) -> Result<ItemCatalog, ApiError> {
        cache
            .items
            .get_or_try_insert_with((), || async {
                let records = ConsumableItemRepository::list_all(pool)
                    .await
                    .map_err(ApiError::Internal)?;
                Ok(Arc::new(records.into_iter().map(item_summary).collect()))
            })
            .await
    }

    /// Search by name; a blank query lists the cached catalog
    pub async fn search_items(
        pool: &PgPool,
        cache: &CatalogCache,
        query: Option<&str>,
        limit: Option<i64>,
    ) -> Result<Vec<ConsumableItemSummary>, ApiError> {
        let limit = limit.unwrap_or(DEFAULT_SEARCH_LIMIT).clamp(1, MAX_SEARCH_LIMIT);

        match query.map(str::trim).filter(|q| !q.is_empty()) {
            Some(q) => {
                let records = ConsumableItemRepository::search(pool, q, limit)
                    .await
                    .map_err(ApiError::Internal)?;
                Ok(records.into_iter().map(item_summary).collect())
            }
            None => {
                let catalog = Self::catalog(pool, cache).await?;
                Ok(catalog.iter().take(limit as usize).cloned().collect())
            }
        }
    }

    pub async fn get_item(pool: &PgPool, id: Uuid) -> Result<ConsumableItemResponse, ApiError> {
        let item = ConsumableItemRepository::find(pool, id)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| ApiError::NotFound("Consumable item not found".to_string()))?;
        let nutrients = ConsumableItemRepository::nutrients(pool, id)
            .await
            .map_err(ApiError::Internal)?;

        Ok(item_response(item, nutrients))
    }

    pub async fn create_item(
        pool: &PgPool,
        cache: &CatalogCache,
        req: CreateConsumableItemRequest,
    ) -> Result<ConsumableItemResponse, ApiError> {
        req.validate()?;
        let serving_size_g = serving_size_decimal(req.serving_size_g).ok_or_else(|| {
            ApiError::invalid_field(
                "serving_size_g",
                "Serving size must be at least 0.01 g and below 100000 g",
            )
        })?;
        if !req.calories_per_serving.is_finite() || req.calories_per_serving < 0.0 {
            return Err(ApiError::invalid_field(
                "calories_per_serving",
                "Calories cannot be negative",
            ));
        }
        if let Some(n) = req.nutrients.iter().find(|n| !n.amount.is_finite() || n.amount < 0.0) {
            return Err(ApiError::invalid_field(
                "nutrients",
                format!("Amount of {} cannot be negative", n.name),
            ));
        }

        let item = ConsumableItemRepository::create(
            pool,
            CreateConsumableItem {
                name: req.name.trim().to_string(),
                brand: req.brand.map(|b| b.trim().to_string()).filter(|b| !b.is_empty()),
                serving_size_g,
                calories_per_serving: f64_to_decimal(req.calories_per_serving, 1),
                nutrients: req
                    .nutrients
                    .iter()
                    .map(|n| CreateNutrient {
                        name: n.name.trim().to_lowercase(),
                        amount: f64_to_decimal(n.amount, 2),
                        unit: n.unit.trim().to_string(),
                    })
                    .collect(),
            },
        )
        .await
        .map_err(|e| ApiError::conflict_on_unique(e, "A consumable item with this name already exists"))?;

        cache.invalidate_items();
        info!(item_id = %item.id, name = %item.name, "consumable item created");
        Self::get_item(pool, item.id).await
    }

    pub async fn delete_item(pool: &PgPool, cache: &CatalogCache, id: Uuid) -> Result<(), ApiError> {
        let deleted = ConsumableItemRepository::delete(pool, id)
            .await
            .map_err(ApiError::Internal)?;
        if !deleted {
            return Err(ApiError::NotFound("Consumable item not found".to_string()));
        }

        cache.invalidate_items();
        info!(item_id = %id, "consumable item deleted");
        Ok(())
    }

    /// Intake, burn and target for one day
    pub async fn daily_nutrition(
        pool: &PgPool,
        user_id: Uuid,
        date: NaiveDate,
    ) -> Result<DailyNutritionResponse, ApiError> {
        let user = UserRepository::find_by_id(pool, user_id)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        let meals = MealService::daily_summary(pool, user_id, date).await?;
        let activity = ActivityRepository::day_totals(pool, user_id, date)
            .await
            .map_err(ApiError::Internal)?;

        // Targets need a complete profile; without one the balance is still useful
        let calorie_target = daily_targets_for(&user, Utc::now().date_naive())
            .ok()
            .map(|t| t.targets.calorie_target);

        Ok(nutrition_balance(
            date,
            meals.totals,
            decimal_to_f64(&activity.total_calories),
            calorie_target,
        ))
    }
}

/// Net calories and what is left of the target
pub fn nutrition_balance(
    date: NaiveDate,
    intake: MacroTotals,
    calories_burned: f64,
    calorie_target: Option<f64>,
) -> DailyNutritionResponse {
    let net_calories = round1(intake.calories - calories_burned);
    DailyNutritionResponse {
        date,
        intake,
        calories_burned: round1(calories_burned),
        net_calories,
        calorie_target,
        remaining_calories: calorie_target.map(|target| round1(target - net_calories)),
    }
}

pub fn item_summary(record: ConsumableItemRecord) -> ConsumableItemSummary {
    ConsumableItemSummary {
        id: record.id,
        name: record.name,
        brand: record.brand,
        serving_size_g: decimal_to_f64(&record.serving_size_g),
        calories_per_serving: decimal_to_f64(&record.calories_per_serving),
    }
}

fn item_response(record: ConsumableItemRecord, nutrients: Vec<NutrientRecord>) -> ConsumableItemResponse {
    ConsumableItemResponse {
        id: record.id,
        name: record.name,
        brand: record.brand,
        serving_size_g: decimal_to_f64(&record.serving_size_g),
        calories_per_serving: decimal_to_f64(&record.calories_per_serving),
        nutrients: nutrients
            .into_iter()
            .map(|n| NutrientDto {
                name: n.name,
                amount: decimal_to_f64(&n.amount),
                unit: n.unit,
            })
            .collect(),
    }
}

/// Serving size as stored, or None when it would not stay positive after rounding
pub fn serving_size_decimal(grams: f64) -> Option<Decimal> {
    if !grams.is_finite() {
        return None;
    }
    let value = f64_to_decimal(grams, 2);
    (value > Decimal::ZERO && value < Decimal::new(MAX_SERVING_SIZE_G, 0)).then_some(value)
}
