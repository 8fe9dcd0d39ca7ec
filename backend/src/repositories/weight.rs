//! Weight record repository

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

/// Weight record from database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WeightRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub recorded_on: NaiveDate,
    pub weight_kg: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Weight repository for database operations
pub struct WeightRepository;

impl WeightRepository {
    /// Insert or replace the record of a day
    pub async fn upsert(
        pool: &PgPool,
        user_id: Uuid,
        recorded_on: NaiveDate,
        weight_kg: Decimal,
        notes: Option<&str>,
    ) -> Result<WeightRecord> {
        let record = sqlx::query_as::<_, WeightRecord>(
            r#"
            INSERT INTO weight_records (user_id, recorded_on, weight_kg, notes)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, recorded_on)
            DO UPDATE SET weight_kg = EXCLUDED.weight_kg, notes = EXCLUDED.notes
            RETURNING id, user_id, recorded_on, weight_kg, notes, created_at
            "#,
        )
        .bind(user_id)
        .bind(recorded_on)
        .bind(weight_kg)
        .bind(notes)
        .fetch_one(pool)
        .await?;

        Ok(record)
    }

    /// Records in an optional inclusive date range, oldest first
    pub async fn list(
        pool: &PgPool,
        user_id: Uuid,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<WeightRecord>> {
        let records = sqlx::query_as::<_, WeightRecord>(
            r#"
            SELECT id, user_id, recorded_on, weight_kg, notes, created_at
            FROM weight_records
            WHERE user_id = $1
              AND ($2::DATE IS NULL OR recorded_on >= $2)
              AND ($3::DATE IS NULL OR recorded_on <= $3)
            ORDER BY recorded_on
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await?;

        Ok(records)
    }

    /// Most recent record overall
    pub async fn latest(pool: &PgPool, user_id: Uuid) -> Result<Option<WeightRecord>> {
        let record = sqlx::query_as::<_, WeightRecord>(
            r#"
            SELECT id, user_id, recorded_on, weight_kg, notes, created_at
            FROM weight_records
            WHERE user_id = $1
            ORDER BY recorded_on DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(record)
    }

    /// Last record strictly before `date`
    pub async fn latest_before(
        pool: &PgPool,
        user_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<WeightRecord>> {
        let record = sqlx::query_as::<_, WeightRecord>(
            r#"
            SELECT id, user_id, recorded_on, weight_kg, notes, created_at
            FROM weight_records
            WHERE user_id = $1 AND recorded_on < $2
            ORDER BY recorded_on DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(date)
        .fetch_optional(pool)
        .await?;

        Ok(record)
    }

    pub async fn delete(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM weight_records WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
