//! Reference data seeding
//!
//! Loads activity categories, activity types and consumable items from a
//! JSON fixture. Every insert is `ON CONFLICT DO NOTHING`, so a rerun only
//! adds what is new, and the whole run is one transaction.

use crate::auth::PasswordService;
use crate::cache::CatalogCache;
use crate::config::SeedConfig;
use crate::db::{f64_to_decimal, opt_f64_to_decimal};
use crate::repositories::{ConsumableItemRepository, CreateNutrient, CreateUser, UserRepository};
use crate::services::nutrition::serving_size_decimal;
use anyhow::{bail, Context, Result};
use fittrack_shared::models::Role;
use fittrack_shared::types::SeedReport;
use serde::Deserialize;
use sqlx::{PgPool, Postgres, Transaction};
use std::path::Path;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct SeedFixture {
    #[serde(default)]
    pub activity_categories: Vec<CategoryFixture>,
    #[serde(default)]
    pub consumable_items: Vec<ItemFixture>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryFixture {
    pub name: String,
    pub description: Option<String>,
    pub default_met: Option<f64>,
    #[serde(default)]
    pub types: Vec<ActivityTypeFixture>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActivityTypeFixture {
    pub name: String,
    pub met_value: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemFixture {
    pub name: String,
    pub brand: Option<String>,
    pub serving_size_g: f64,
    pub calories_per_serving: f64,
    #[serde(default)]
    pub nutrients: Vec<NutrientFixture>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NutrientFixture {
    pub name: String,
    pub amount: f64,
    pub unit: String,
}

impl SeedFixture {
    pub fn from_json(json: &str) -> Result<Self> {
        let fixture: SeedFixture = serde_json::from_str(json).context("Invalid seed fixture")?;
        fixture.check()?;
        Ok(fixture)
    }

    /// Reject entries the schema would reject halfway through a run
    pub fn check(&self) -> Result<()> {
        for category in &self.activity_categories {
            if category.name.trim().is_empty() {
                bail!("Activity category with an empty name");
            }
            if category.default_met.is_some_and(|m| m <= 0.0) {
                bail!("Category {} has a non-positive default MET", category.name);
            }
            for activity_type in &category.types {
                if activity_type.name.trim().is_empty() {
                    bail!("Activity type with an empty name in {}", category.name);
                }
                if activity_type.met_value.is_some_and(|m| m <= 0.0) {
                    bail!("Activity type {} has a non-positive MET", activity_type.name);
                }
            }
        }
        for item in &self.consumable_items {
            if item.name.trim().is_empty() {
                bail!("Consumable item with an empty name");
            }
            if serving_size_decimal(item.serving_size_g).is_none() || item.calories_per_serving < 0.0 {
                bail!("Consumable item {} has an invalid serving", item.name);
            }
            if item.nutrients.iter().any(|n| n.amount < 0.0) {
                bail!("Consumable item {} has a negative nutrient amount", item.name);
            }
        }
        Ok(())
    }
}

pub async fn load_fixture(path: impl AsRef<Path>) -> Result<SeedFixture> {
    let path = path.as_ref();
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read seed fixture {}", path.display()))?;
    SeedFixture::from_json(&json)
}

pub struct DataSeeder;

impl DataSeeder {
    /// Load the configured fixture, seed it and bootstrap the admin
    pub async fn run(pool: &PgPool, config: &SeedConfig, cache: &CatalogCache) -> Result<SeedReport> {
        let fixture = load_fixture(&config.fixture_path).await?;
        let mut report = Self::seed(pool, &fixture).await?;
        report.admin_created = Self::bootstrap_admin(pool, config).await?;

        cache.invalidate_all();
        info!(
            categories = report.categories_inserted,
            activity_types = report.activity_types_inserted,
            items = report.consumable_items_inserted,
            nutrients = report.nutrients_inserted,
            admin_created = report.admin_created,
            "seeding finished"
        );
        Ok(report)
    }

    pub async fn seed(pool: &PgPool, fixture: &SeedFixture) -> Result<SeedReport> {
        let mut report = SeedReport::default();
        let mut tx = pool.begin().await?;

        for category in &fixture.activity_categories {
            let (category_id, inserted) = Self::upsert_category(&mut tx, category).await?;
            if inserted {
                report.categories_inserted += 1;
            }

            for activity_type in &category.types {
                let result = sqlx::query(
                    r#"
                    INSERT INTO activity_types (category_id, name, met_value)
                    VALUES ($1, $2, $3)
                    ON CONFLICT (name) DO NOTHING
                    "#,
                )
                .bind(category_id)
                .bind(activity_type.name.trim())
                .bind(opt_f64_to_decimal(activity_type.met_value, 2))
                .execute(&mut *tx)
                .await?;
                report.activity_types_inserted += result.rows_affected();
            }
        }

        for item in &fixture.consumable_items {
            let (item_id, inserted) = Self::upsert_item(&mut tx, item).await?;
            if inserted {
                report.consumable_items_inserted += 1;
            }

            for nutrient in &item.nutrients {
                let created = ConsumableItemRepository::insert_nutrient(
                    &mut tx,
                    item_id,
                    &CreateNutrient {
                        name: nutrient.name.trim().to_lowercase(),
                        amount: f64_to_decimal(nutrient.amount, 2),
                        unit: nutrient.unit.trim().to_string(),
                    },
                )
                .await?;
                if created {
                    report.nutrients_inserted += 1;
                }
            }
        }

        tx.commit().await?;
        Ok(report)
    }

    /// Id of the named category, inserting it when missing
    async fn upsert_category(
        tx: &mut Transaction<'_, Postgres>,
        category: &CategoryFixture,
    ) -> Result<(Uuid, bool)> {
        let inserted: Option<(Uuid,)> = sqlx::query_as(
            r#"
            INSERT INTO activity_categories (name, description, default_met)
            VALUES ($1, $2, $3)
            ON CONFLICT (name) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(category.name.trim())
        .bind(&category.description)
        .bind(opt_f64_to_decimal(category.default_met, 2))
        .fetch_optional(&mut **tx)
        .await?;

        if let Some((id,)) = inserted {
            return Ok((id, true));
        }

        let existing: (Uuid,) = sqlx::query_as("SELECT id FROM activity_categories WHERE name = $1")
            .bind(category.name.trim())
            .fetch_one(&mut **tx)
            .await?;
        Ok((existing.0, false))
    }

    async fn upsert_item(tx: &mut Transaction<'_, Postgres>, item: &ItemFixture) -> Result<(Uuid, bool)> {
        let serving_size_g = serving_size_decimal(item.serving_size_g)
            .with_context(|| format!("Consumable item {} has an invalid serving", item.name))?;
        let inserted: Option<(Uuid,)> = sqlx::query_as(
            r#"
            INSERT INTO consumable_items (name, brand, serving_size_g, calories_per_serving)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (name) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(item.name.trim())
        .bind(&item.brand)
        .bind(serving_size_g)
        .bind(f64_to_decimal(item.calories_per_serving, 1))
        .fetch_optional(&mut **tx)
        .await?;

        if let Some((id,)) = inserted {
            return Ok((id, true));
        }

        let existing: (Uuid,) = sqlx::query_as("SELECT id FROM consumable_items WHERE name = $1")
            .bind(item.name.trim())
            .fetch_one(&mut **tx)
            .await?;
        Ok((existing.0, false))
    }

    /// Create the configured admin unless that email is already registered
    pub async fn bootstrap_admin(pool: &PgPool, config: &SeedConfig) -> Result<bool> {
        let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
            return Ok(false);
        };
        let email = email.trim().to_lowercase();
        if UserRepository::email_exists(pool, &email).await? {
            return Ok(false);
        }

        let mut username = admin_username(&email);
        if UserRepository::username_exists(pool, &username).await? {
            username = format!("{}-{}", username, &Uuid::new_v4().simple().to_string()[..6]);
        }

        let password_hash = PasswordService::hash_async(password.clone()).await?;
        let user = UserRepository::create(
            pool,
            CreateUser {
                email,
                username,
                password_hash,
                first_name: "Admin".to_string(),
                last_name: String::new(),
                role: Role::Admin.as_str().to_string(),
            },
        )
        .await?;

        info!(user_id = %user.id, "bootstrap admin created");
        Ok(true)
    }
}

/// Username derived from the local part of an email
fn admin_username(email: &str) -> String {
    let local: String = email
        .split('@')
        .next()
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        .take(24)
        .collect();

    if local.chars().count() < 3 {
        "admin".to_string()
    } else {
        local
    }
}
