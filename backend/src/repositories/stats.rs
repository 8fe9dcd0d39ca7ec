//! Row counts for the admin dashboard

use anyhow::Result;
use sqlx::PgPool;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TableCounts {
    pub users: i64,
    pub admins: i64,
    pub meals: i64,
    pub activities: i64,
    pub weight_records: i64,
    pub consumable_items: i64,
    pub activity_types: i64,
}

pub struct StatsRepository;

impl StatsRepository {
    pub async fn counts(pool: &PgPool) -> Result<TableCounts> {
        let counts = sqlx::query_as::<_, TableCounts>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users) AS users,
                (SELECT COUNT(*) FROM users WHERE role = 'admin') AS admins,
                (SELECT COUNT(*) FROM meals) AS meals,
                (SELECT COUNT(*) FROM activities) AS activities,
                (SELECT COUNT(*) FROM weight_records) AS weight_records,
                (SELECT COUNT(*) FROM consumable_items) AS consumable_items,
                (SELECT COUNT(*) FROM activity_types) AS activity_types
            "#,
        )
        .fetch_one(pool)
        .await?;

        Ok(counts)
    }
}
