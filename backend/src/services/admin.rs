//! Administration: user management, statistics and catalog maintenance

use crate::cache::CatalogCache;
use crate::config::SeedConfig;
use crate::db::opt_f64_to_decimal;
use crate::error::ApiError;
use crate::repositories::user::UserSummaryRecord;
use crate::repositories::{ActivityCatalogRepository, StatsRepository, UserRepository};
use crate::services::activity::{category_response, type_response};
use crate::services::seeder::DataSeeder;
use crate::services::storage::FileStorage;
use crate::services::user::{parse_role, profile_from_record, UserService};
use chrono::Utc;
use fittrack_shared::models::Role;
use fittrack_shared::types::{
    ActivityCategoryResponse, ActivityTypeResponse, AdminStatsResponse, AdminUserSummary,
    AdminUsersQuery, CreateActivityCategoryRequest, CreateActivityTypeRequest, PaginatedResponse,
    SeedReport, UserProfileResponse,
};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

pub struct AdminService;

impl AdminService {
    pub async fn list_users(
        pool: &PgPool,
        query: AdminUsersQuery,
    ) -> Result<PaginatedResponse<AdminUserSummary>, ApiError> {
        let (page, per_page) = page_bounds(query.page, query.per_page);
        let offset = (page as i64 - 1) * per_page as i64;
        let search = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty());

        let (records, total) = UserRepository::list(pool, search, per_page as i64, offset)
            .await
            .map_err(ApiError::Internal)?;
        let users = records
            .into_iter()
            .map(user_summary)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PaginatedResponse::new(users, total, page, per_page))
    }

    pub async fn get_user(pool: &PgPool, user_id: Uuid) -> Result<UserProfileResponse, ApiError> {
        let user = UserRepository::find_by_id(pool, user_id)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
        profile_from_record(&user, Utc::now().date_naive())
    }

    /// Change a user's role; admins cannot demote themselves
    pub async fn set_role(
        pool: &PgPool,
        acting_admin: Uuid,
        user_id: Uuid,
        role: Role,
    ) -> Result<UserProfileResponse, ApiError> {
        if acting_admin == user_id && role != Role::Admin {
            return Err(ApiError::Forbidden("Admins cannot remove their own admin role".to_string()));
        }

        let updated = UserRepository::set_role(pool, user_id, role.as_str())
            .await
            .map_err(ApiError::Internal)?;
        if !updated {
            return Err(ApiError::NotFound("User not found".to_string()));
        }

        info!(admin_id = %acting_admin, user_id = %user_id, role = role.as_str(), "role changed");
        Self::get_user(pool, user_id).await
    }

    /// Delete another user's account
    pub async fn delete_user(
        pool: &PgPool,
        storage: &dyn FileStorage,
        acting_admin: Uuid,
        user_id: Uuid,
    ) -> Result<(), ApiError> {
        if acting_admin == user_id {
            return Err(ApiError::Forbidden("Admins cannot delete their own account here".to_string()));
        }

        UserService::delete_account(pool, storage, user_id).await?;
        info!(admin_id = %acting_admin, user_id = %user_id, "user deleted by admin");
        Ok(())
    }

    pub async fn stats(pool: &PgPool) -> Result<AdminStatsResponse, ApiError> {
        let counts = StatsRepository::counts(pool)
            .await
            .map_err(ApiError::Internal)?;

        Ok(AdminStatsResponse {
            users: counts.users,
            admins: counts.admins,
            meals: counts.meals,
            activities: counts.activities,
            weight_records: counts.weight_records,
            consumable_items: counts.consumable_items,
            activity_types: counts.activity_types,
        })
    }

    pub async fn create_category(
        pool: &PgPool,
        cache: &CatalogCache,
        req: CreateActivityCategoryRequest,
    ) -> Result<ActivityCategoryResponse, ApiError> {
        req.validate()?;
        check_met("default_met", req.default_met)?;

        let description = req.description.as_deref().map(str::trim).filter(|d| !d.is_empty());
        let record = ActivityCatalogRepository::create_category(
            pool,
            req.name.trim(),
            description,
            opt_f64_to_decimal(req.default_met, 2),
        )
        .await
        .map_err(|e| ApiError::conflict_on_unique(e, "An activity category with this name already exists"))?;

        cache.invalidate_activities();
        info!(category_id = %record.id, "activity category created");
        Ok(category_response(record))
    }

    pub async fn create_activity_type(
        pool: &PgPool,
        cache: &CatalogCache,
        req: CreateActivityTypeRequest,
    ) -> Result<ActivityTypeResponse, ApiError> {
        req.validate()?;
        check_met("met_value", req.met_value)?;

        let category_exists = ActivityCatalogRepository::category_exists(pool, req.category_id)
            .await
            .map_err(ApiError::Internal)?;
        if !category_exists {
            return Err(ApiError::NotFound("Activity category not found".to_string()));
        }

        let record = ActivityCatalogRepository::create_type(
            pool,
            req.category_id,
            req.name.trim(),
            opt_f64_to_decimal(req.met_value, 2),
        )
        .await
        .map_err(|e| ApiError::conflict_on_unique(e, "An activity type with this name already exists"))?;

        cache.invalidate_activities();
        info!(activity_type_id = %record.id, "activity type created");
        Ok(type_response(record))
    }

    pub async fn run_seeder(
        pool: &PgPool,
        cache: &CatalogCache,
        config: &SeedConfig,
    ) -> Result<SeedReport, ApiError> {
        DataSeeder::run(pool, config, cache)
            .await
            .map_err(ApiError::Internal)
    }
}

/// Clamp a 1-based page and page size
pub fn page_bounds(page: Option<u32>, per_page: Option<u32>) -> (u32, u32) {
    let page = page.unwrap_or(1).max(1);
    let per_page = per_page.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    (page, per_page)
}

fn check_met(field: &str, met: Option<f64>) -> Result<(), ApiError> {
    match met {
        Some(m) if !m.is_finite() || m <= 0.0 || m > 30.0 => Err(ApiError::invalid_field(
            field,
            "MET must be greater than 0 and at most 30",
        )),
        _ => Ok(()),
    }
}

fn user_summary(record: UserSummaryRecord) -> Result<AdminUserSummary, ApiError> {
    Ok(AdminUserSummary {
        id: record.id,
        email: record.email,
        username: record.username,
        role: parse_role(&record.role)?,
        created_at: record.created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, None, (1, DEFAULT_PAGE_SIZE))]
    #[case(Some(0), Some(0), (1, 1))]
    #[case(Some(3), Some(500), (3, MAX_PAGE_SIZE))]
    #[case(Some(2), Some(50), (2, 50))]
    fn test_page_bounds(#[case] page: Option<u32>, #[case] per_page: Option<u32>, #[case] expected: (u32, u32)) {
        assert_eq!(page_bounds(page, per_page), expected);
    }

    #[rstest]
    #[case(None, true)]
    #[case(Some(3.5), true)]
    #[case(Some(0.0), false)]
    #[case(Some(-2.0), false)]
    #[case(Some(45.0), false)]
    fn test_check_met(#[case] met: Option<f64>, #[case] ok: bool) {
        assert_eq!(check_met("met_value", met).is_ok(), ok);
    }

    #[tokio::test]
    async fn test_admin_cannot_demote_self() {
        // Rejected before any query runs
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        let admin = Uuid::new_v4();
        let result = AdminService::set_role(&pool, admin, admin, Role::User).await;
        assert!(matches!(result, Err(ApiError::Forbidden(_))));
    }
}
