//! Meal log repository

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

const MEAL_COLUMNS: &str = r#"
    id, user_id, name, meal_type, calories, protein_g, carbs_g, fat_g,
    eaten_on, consumable_item_id, quantity_g, created_at
"#;

/// Meal record from database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MealRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub meal_type: String,
    pub calories: Decimal,
    pub protein_g: Decimal,
    pub carbs_g: Decimal,
    pub fat_g: Decimal,
    pub eaten_on: NaiveDate,
    pub consumable_item_id: Option<Uuid>,
    pub quantity_g: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a meal
#[derive(Debug, Clone)]
pub struct CreateMeal {
    pub user_id: Uuid,
    pub name: String,
    pub meal_type: String,
    pub calories: Decimal,
    pub protein_g: Decimal,
    pub carbs_g: Decimal,
    pub fat_g: Decimal,
    pub eaten_on: NaiveDate,
    pub consumable_item_id: Option<Uuid>,
    pub quantity_g: Option<Decimal>,
}

/// Fields to change on a meal
#[derive(Debug, Clone, Default)]
pub struct UpdateMeal {
    pub name: Option<String>,
    pub meal_type: Option<String>,
    pub calories: Option<Decimal>,
    pub protein_g: Option<Decimal>,
    pub carbs_g: Option<Decimal>,
    pub fat_g: Option<Decimal>,
    pub eaten_on: Option<NaiveDate>,
}

pub struct MealRepository;

impl MealRepository {
    pub async fn create(pool: &PgPool, input: CreateMeal) -> Result<MealRecord> {
        let record = sqlx::query_as::<_, MealRecord>(&format!(
            r#"
            INSERT INTO meals (user_id, name, meal_type, calories, protein_g, carbs_g, fat_g,
                               eaten_on, consumable_item_id, quantity_g)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {MEAL_COLUMNS}
            "#
        ))
        .bind(input.user_id)
        .bind(&input.name)
        .bind(&input.meal_type)
        .bind(input.calories)
        .bind(input.protein_g)
        .bind(input.carbs_g)
        .bind(input.fat_g)
        .bind(input.eaten_on)
        .bind(input.consumable_item_id)
        .bind(input.quantity_g)
        .fetch_one(pool)
        .await?;

        Ok(record)
    }

    /// Find a meal owned by `user_id`
    pub async fn find(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<Option<MealRecord>> {
        let record = sqlx::query_as::<_, MealRecord>(&format!(
            "SELECT {MEAL_COLUMNS} FROM meals WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(record)
    }

    /// Meals of one day in insertion order; callers sort by meal type
    pub async fn list_for_day(pool: &PgPool, user_id: Uuid, date: NaiveDate) -> Result<Vec<MealRecord>> {
        let records = sqlx::query_as::<_, MealRecord>(&format!(
            r#"
            SELECT {MEAL_COLUMNS} FROM meals
            WHERE user_id = $1 AND eaten_on = $2
            ORDER BY created_at, id
            "#
        ))
        .bind(user_id)
        .bind(date)
        .fetch_all(pool)
        .await?;

        Ok(records)
    }

    pub async fn update(
        pool: &PgPool,
        user_id: Uuid,
        id: Uuid,
        updates: UpdateMeal,
    ) -> Result<Option<MealRecord>> {
        let record = sqlx::query_as::<_, MealRecord>(&format!(
            r#"
            UPDATE meals SET
                name = COALESCE($3, name),
                meal_type = COALESCE($4, meal_type),
                calories = COALESCE($5, calories),
                protein_g = COALESCE($6, protein_g),
                carbs_g = COALESCE($7, carbs_g),
                fat_g = COALESCE($8, fat_g),
                eaten_on = COALESCE($9, eaten_on),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {MEAL_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(user_id)
        .bind(updates.name)
        .bind(updates.meal_type)
        .bind(updates.calories)
        .bind(updates.protein_g)
        .bind(updates.carbs_g)
        .bind(updates.fat_g)
        .bind(updates.eaten_on)
        .fetch_optional(pool)
        .await?;

        Ok(record)
    }

    pub async fn delete(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM meals WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
