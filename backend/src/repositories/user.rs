//! User repository for database operations

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

const USER_COLUMNS: &str = r#"
    id, email, username, password_hash, first_name, last_name, role,
    weight_kg, height_cm, date_of_birth, gender, activity_level, fitness_goal,
    target_weight_kg, daily_calorie_goal, profile_picture_url, profile_picture_id,
    created_at, updated_at
"#;

/// User record from database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub weight_kg: Option<Decimal>,
    pub height_cm: Option<Decimal>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub activity_level: String,
    pub fitness_goal: String,
    pub target_weight_kg: Option<Decimal>,
    pub daily_calorie_goal: Option<i32>,
    pub profile_picture_url: Option<String>,
    pub profile_picture_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a user
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
}

/// Profile fields to change; `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct UpdateUserProfile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub weight_kg: Option<Decimal>,
    pub height_cm: Option<Decimal>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub activity_level: Option<String>,
    pub fitness_goal: Option<String>,
    pub target_weight_kg: Option<Decimal>,
    pub daily_calorie_goal: Option<i32>,
}

/// Row of the admin user list
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserSummaryRecord {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

/// User repository for database operations
pub struct UserRepository;

impl UserRepository {
    /// Create a new user
    pub async fn create(pool: &PgPool, input: CreateUser) -> Result<UserRecord> {
        let user = sqlx::query_as::<_, UserRecord>(&format!(
            r#"
            INSERT INTO users (email, username, password_hash, first_name, last_name, role)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&input.email)
        .bind(&input.username)
        .bind(&input.password_hash)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(&input.role)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Find user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Find user by email (case-insensitive)
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)"
        ))
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Find user by email or username
    pub async fn find_by_login(pool: &PgPool, login: &str) -> Result<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(&format!(
            r#"
            SELECT {USER_COLUMNS} FROM users
            WHERE LOWER(email) = LOWER($1) OR username = $1
            ORDER BY (LOWER(email) = LOWER($1)) DESC
            LIMIT 1
            "#
        ))
        .bind(login)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Check if email exists
    pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool> {
        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1))")
                .bind(email)
                .fetch_one(pool)
                .await?;

        Ok(exists.0)
    }

    /// Check if username exists
    pub async fn username_exists(pool: &PgPool, username: &str) -> Result<bool> {
        let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
            .bind(username)
            .fetch_one(pool)
            .await?;

        Ok(exists.0)
    }

    /// Partial profile update
    pub async fn update_profile(
        pool: &PgPool,
        user_id: Uuid,
        updates: UpdateUserProfile,
    ) -> Result<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(&format!(
            r#"
            UPDATE users SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                weight_kg = COALESCE($4, weight_kg),
                height_cm = COALESCE($5, height_cm),
                date_of_birth = COALESCE($6, date_of_birth),
                gender = COALESCE($7, gender),
                activity_level = COALESCE($8, activity_level),
                fitness_goal = COALESCE($9, fitness_goal),
                target_weight_kg = COALESCE($10, target_weight_kg),
                daily_calorie_goal = COALESCE($11, daily_calorie_goal),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(updates.first_name)
        .bind(updates.last_name)
        .bind(updates.weight_kg)
        .bind(updates.height_cm)
        .bind(updates.date_of_birth)
        .bind(updates.gender)
        .bind(updates.activity_level)
        .bind(updates.fitness_goal)
        .bind(updates.target_weight_kg)
        .bind(updates.daily_calorie_goal)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Set or clear the profile weight
    pub async fn set_weight(pool: &PgPool, user_id: Uuid, weight_kg: Option<Decimal>) -> Result<()> {
        sqlx::query("UPDATE users SET weight_kg = $2, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .bind(weight_kg)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Replace the password hash
    pub async fn update_password(pool: &PgPool, user_id: Uuid, password_hash: &str) -> Result<()> {
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .bind(password_hash)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Store the profile picture location
    pub async fn set_profile_picture(
        pool: &PgPool,
        user_id: Uuid,
        url: &str,
        storage_id: &str,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET profile_picture_url = $2, profile_picture_id = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(url)
        .bind(storage_id)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Change the role; returns false when the user does not exist
    pub async fn set_role(pool: &PgPool, user_id: Uuid, role: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET role = $2, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .bind(role)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a user; owned rows cascade
    pub async fn delete(pool: &PgPool, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Page of users matching an optional email/username search
    pub async fn list(
        pool: &PgPool,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<UserSummaryRecord>, i64)> {
        let pattern = search.map(|s| format!("%{}%", s.to_lowercase()));

        let users = sqlx::query_as::<_, UserSummaryRecord>(
            r#"
            SELECT id, email, username, role, created_at
            FROM users
            WHERE $1::TEXT IS NULL OR LOWER(email) LIKE $1 OR LOWER(username) LIKE $1
            ORDER BY created_at DESC, id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(&pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        let total: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM users
            WHERE $1::TEXT IS NULL OR LOWER(email) LIKE $1 OR LOWER(username) LIKE $1
            "#,
        )
        .bind(&pattern)
        .fetch_one(pool)
        .await?;

        Ok((users, total.0))
    }
}
