//! Consumable item catalog repository

use anyhow::Result;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

/// Consumable item from database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ConsumableItemRecord {
    pub id: Uuid,
    pub name: String,
    pub brand: Option<String>,
    pub serving_size_g: Decimal,
    pub calories_per_serving: Decimal,
}

/// Nutrient of an item, per serving
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct NutrientRecord {
    pub consumable_item_id: Uuid,
    pub name: String,
    pub amount: Decimal,
    pub unit: String,
}

/// Input for one nutrient row
#[derive(Debug, Clone)]
pub struct CreateNutrient {
    pub name: String,
    pub amount: Decimal,
    pub unit: String,
}

/// Input for creating an item
#[derive(Debug, Clone)]
pub struct CreateConsumableItem {
    pub name: String,
    pub brand: Option<String>,
    pub serving_size_g: Decimal,
    pub calories_per_serving: Decimal,
    pub nutrients: Vec<CreateNutrient>,
}

pub struct ConsumableItemRepository;

impl ConsumableItemRepository {
    /// Whole catalog ordered by name
    pub async fn list_all(pool: &PgPool) -> Result<Vec<ConsumableItemRecord>> {
        let records = sqlx::query_as::<_, ConsumableItemRecord>(
            r#"
            SELECT id, name, brand, serving_size_g, calories_per_serving
            FROM consumable_items
            ORDER BY name
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(records)
    }

    /// Case-insensitive substring search on name and brand
    pub async fn search(pool: &PgPool, query: &str, limit: i64) -> Result<Vec<ConsumableItemRecord>> {
        let pattern = format!("%{}%", query.to_lowercase());
        let records = sqlx::query_as::<_, ConsumableItemRecord>(
            r#"
            SELECT id, name, brand, serving_size_g, calories_per_serving
            FROM consumable_items
            WHERE LOWER(name) LIKE $1 OR LOWER(COALESCE(brand, '')) LIKE $1
            ORDER BY name
            LIMIT $2
            "#,
        )
        .bind(pattern)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(records)
    }

    pub async fn find(pool: &PgPool, id: Uuid) -> Result<Option<ConsumableItemRecord>> {
        let record = sqlx::query_as::<_, ConsumableItemRecord>(
            r#"
            SELECT id, name, brand, serving_size_g, calories_per_serving
            FROM consumable_items
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(record)
    }

    pub async fn nutrients(pool: &PgPool, item_id: Uuid) -> Result<Vec<NutrientRecord>> {
        let records = sqlx::query_as::<_, NutrientRecord>(
            r#"
            SELECT consumable_item_id, name, amount, unit
            FROM nutrients
            WHERE consumable_item_id = $1
            ORDER BY name
            "#,
        )
        .bind(item_id)
        .fetch_all(pool)
        .await?;

        Ok(records)
    }

    /// Insert an item and its nutrients in one transaction
    pub async fn create(pool: &PgPool, input: CreateConsumableItem) -> Result<ConsumableItemRecord> {
        let mut tx = pool.begin().await?;

        let item = sqlx::query_as::<_, ConsumableItemRecord>(
            r#"
            INSERT INTO consumable_items (name, brand, serving_size_g, calories_per_serving)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, brand, serving_size_g, calories_per_serving
            "#,
        )
        .bind(&input.name)
        .bind(&input.brand)
        .bind(input.serving_size_g)
        .bind(input.calories_per_serving)
        .fetch_one(&mut *tx)
        .await?;

        for nutrient in &input.nutrients {
            Self::insert_nutrient(&mut tx, item.id, nutrient).await?;
        }

        tx.commit().await?;
        Ok(item)
    }

    /// Insert a nutrient unless the item already has one with that name
    pub async fn insert_nutrient(
        tx: &mut Transaction<'_, Postgres>,
        item_id: Uuid,
        nutrient: &CreateNutrient,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO nutrients (consumable_item_id, name, amount, unit)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (consumable_item_id, name) DO NOTHING
            "#,
        )
        .bind(item_id)
        .bind(&nutrient.name)
        .bind(nutrient.amount)
        .bind(&nutrient.unit)
        .execute(&mut **tx)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM consumable_items WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
