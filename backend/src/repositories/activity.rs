//! Activity taxonomy and activity log repository

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

/// Activity category from database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ActivityCategoryRecord {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub default_met: Option<Decimal>,
}

/// Activity type joined with its category
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ActivityTypeRecord {
    pub id: Uuid,
    pub category_id: Uuid,
    pub category_name: String,
    pub category_default_met: Option<Decimal>,
    pub name: String,
    pub met_value: Option<Decimal>,
}

/// Logged activity joined with type and category names
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ActivityRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub activity_type_id: Uuid,
    pub activity_type_name: String,
    pub category_name: String,
    pub duration_minutes: i32,
    pub calories_burned: Decimal,
    pub performed_on: NaiveDate,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for logging an activity
#[derive(Debug, Clone)]
pub struct CreateActivity {
    pub user_id: Uuid,
    pub activity_type_id: Uuid,
    pub duration_minutes: i32,
    pub calories_burned: Decimal,
    pub performed_on: NaiveDate,
    pub notes: Option<String>,
}

/// Fields to change on a logged activity
#[derive(Debug, Clone, Default)]
pub struct UpdateActivity {
    pub activity_type_id: Option<Uuid>,
    pub duration_minutes: Option<i32>,
    pub calories_burned: Option<Decimal>,
    pub performed_on: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Totals for one day
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ActivityDayTotals {
    pub activity_count: i64,
    pub total_minutes: i64,
    pub total_calories: Decimal,
}

const TYPE_SELECT: &str = r#"
    SELECT t.id, t.category_id, c.name AS category_name, c.default_met AS category_default_met,
           t.name, t.met_value
    FROM activity_types t
    JOIN activity_categories c ON c.id = t.category_id
"#;

const ACTIVITY_SELECT: &str = r#"
    SELECT a.id, a.user_id, a.activity_type_id, t.name AS activity_type_name,
           c.name AS category_name, a.duration_minutes, a.calories_burned,
           a.performed_on, a.notes, a.created_at
    FROM activities a
    JOIN activity_types t ON t.id = a.activity_type_id
    JOIN activity_categories c ON c.id = t.category_id
"#;

/// Categories and types
pub struct ActivityCatalogRepository;

impl ActivityCatalogRepository {
    pub async fn list_categories(pool: &PgPool) -> Result<Vec<ActivityCategoryRecord>> {
        let records = sqlx::query_as::<_, ActivityCategoryRecord>(
            "SELECT id, name, description, default_met FROM activity_categories ORDER BY name",
        )
        .fetch_all(pool)
        .await?;

        Ok(records)
    }

    pub async fn list_types(
        pool: &PgPool,
        category_id: Option<Uuid>,
    ) -> Result<Vec<ActivityTypeRecord>> {
        let records = sqlx::query_as::<_, ActivityTypeRecord>(&format!(
            "{TYPE_SELECT} WHERE $1::UUID IS NULL OR t.category_id = $1 ORDER BY c.name, t.name"
        ))
        .bind(category_id)
        .fetch_all(pool)
        .await?;

        Ok(records)
    }

    pub async fn find_type(pool: &PgPool, id: Uuid) -> Result<Option<ActivityTypeRecord>> {
        let record = sqlx::query_as::<_, ActivityTypeRecord>(&format!("{TYPE_SELECT} WHERE t.id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(record)
    }

    pub async fn category_exists(pool: &PgPool, id: Uuid) -> Result<bool> {
        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM activity_categories WHERE id = $1)")
                .bind(id)
                .fetch_one(pool)
                .await?;

        Ok(exists.0)
    }

    pub async fn create_category(
        pool: &PgPool,
        name: &str,
        description: Option<&str>,
        default_met: Option<Decimal>,
    ) -> Result<ActivityCategoryRecord> {
        let record = sqlx::query_as::<_, ActivityCategoryRecord>(
            r#"
            INSERT INTO activity_categories (name, description, default_met)
            VALUES ($1, $2, $3)
            RETURNING id, name, description, default_met
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(default_met)
        .fetch_one(pool)
        .await?;

        Ok(record)
    }

    pub async fn create_type(
        pool: &PgPool,
        category_id: Uuid,
        name: &str,
        met_value: Option<Decimal>,
    ) -> Result<ActivityTypeRecord> {
        let record = sqlx::query_as::<_, ActivityTypeRecord>(
            r#"
            WITH inserted AS (
                INSERT INTO activity_types (category_id, name, met_value)
                VALUES ($1, $2, $3)
                RETURNING id, category_id, name, met_value
            )
            SELECT i.id, i.category_id, c.name AS category_name,
                   c.default_met AS category_default_met, i.name, i.met_value
            FROM inserted i
            JOIN activity_categories c ON c.id = i.category_id
            "#,
        )
        .bind(category_id)
        .bind(name)
        .bind(met_value)
        .fetch_one(pool)
        .await?;

        Ok(record)
    }
}

/// Logged activities
pub struct ActivityRepository;

impl ActivityRepository {
    pub async fn create(pool: &PgPool, input: CreateActivity) -> Result<ActivityRecord> {
        let id: (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO activities (user_id, activity_type_id, duration_minutes, calories_burned, performed_on, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(input.user_id)
        .bind(input.activity_type_id)
        .bind(input.duration_minutes)
        .bind(input.calories_burned)
        .bind(input.performed_on)
        .bind(&input.notes)
        .fetch_one(pool)
        .await?;

        Self::find(pool, input.user_id, id.0)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Inserted activity {} not found", id.0))
    }

    /// Find an activity owned by `user_id`
    pub async fn find(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<Option<ActivityRecord>> {
        let record = sqlx::query_as::<_, ActivityRecord>(&format!(
            "{ACTIVITY_SELECT} WHERE a.id = $1 AND a.user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(record)
    }

    /// Activities in an optional inclusive date range, newest first
    pub async fn list(
        pool: &PgPool,
        user_id: Uuid,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<ActivityRecord>> {
        let records = sqlx::query_as::<_, ActivityRecord>(&format!(
            r#"
            {ACTIVITY_SELECT}
            WHERE a.user_id = $1
              AND ($2::DATE IS NULL OR a.performed_on >= $2)
              AND ($3::DATE IS NULL OR a.performed_on <= $3)
            ORDER BY a.performed_on DESC, a.created_at DESC
            "#
        ))
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await?;

        Ok(records)
    }

    pub async fn update(
        pool: &PgPool,
        user_id: Uuid,
        id: Uuid,
        updates: UpdateActivity,
    ) -> Result<Option<ActivityRecord>> {
        let result = sqlx::query(
            r#"
            UPDATE activities SET
                activity_type_id = COALESCE($3, activity_type_id),
                duration_minutes = COALESCE($4, duration_minutes),
                calories_burned = COALESCE($5, calories_burned),
                performed_on = COALESCE($6, performed_on),
                notes = COALESCE($7, notes),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(updates.activity_type_id)
        .bind(updates.duration_minutes)
        .bind(updates.calories_burned)
        .bind(updates.performed_on)
        .bind(updates.notes)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Self::find(pool, user_id, id).await
    }

    pub async fn delete(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM activities WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn day_totals(pool: &PgPool, user_id: Uuid, date: NaiveDate) -> Result<ActivityDayTotals> {
        let totals = sqlx::query_as::<_, ActivityDayTotals>(
            r#"
            SELECT COUNT(*) AS activity_count,
                   COALESCE(SUM(duration_minutes), 0)::BIGINT AS total_minutes,
                   COALESCE(SUM(calories_burned), 0) AS total_calories
            FROM activities
            WHERE user_id = $1 AND performed_on = $2
            "#,
        )
        .bind(user_id)
        .bind(date)
        .fetch_one(pool)
        .await?;

        Ok(totals)
    }
}
