//! Activity logging and MET-based calorie estimation

use crate::cache::{ActivityTypeList, CatalogCache, CategoryList};
use crate::db::{decimal_to_f64, f64_to_decimal, opt_decimal_to_f64};
use crate::error::ApiError;
use crate::repositories::{
    ActivityCatalogRepository, ActivityCategoryRecord, ActivityRecord, ActivityRepository,
    ActivityTypeRecord, CreateActivity, UpdateActivity, UserRepository, WeightRepository,
};
use chrono::{NaiveDate, Utc};
use fittrack_shared::health_metrics::{
    estimate_met_calories, heuristic_met, DEFAULT_MET, DEFAULT_WEIGHT_KG,
};
use fittrack_shared::models::{MetSource, WeightSource};
use fittrack_shared::types::{
    ActivityCategoryResponse, ActivityResponse, ActivitySummaryResponse, ActivityTypeResponse,
    CalorieEstimateResponse, LogActivityRequest, UpdateActivityRequest,
};
use fittrack_shared::validation::validate_duration_minutes;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;
use validator::Validate;

pub struct ActivityService;

impl ActivityService {
    /// All categories, served from the cache
    pub async fn list_categories(pool: &PgPool, cache: &CatalogCache) -> Result<CategoryList, ApiError> {
        cache
            .categories
            .get_or_try_insert_with((), || async {
                let records = ActivityCatalogRepository::list_categories(pool)
                    .await
                    .map_err(ApiError::Internal)?;
                Ok(Arc::new(records.into_iter().map(category_response).collect()))
            })
            .await
    }

    /// Activity types, optionally of one category, served from the cache
    pub async fn list_types(
        pool: &PgPool,
        cache: &CatalogCache,
        category_id: Option<Uuid>,
    ) -> Result<ActivityTypeList, ApiError> {
        cache
            .activity_types
            .get_or_try_insert_with(category_id, || async {
                let records = ActivityCatalogRepository::list_types(pool, category_id)
                    .await
                    .map_err(ApiError::Internal)?;
                Ok(Arc::new(records.into_iter().map(type_response).collect()))
            })
            .await
    }

    async fn find_type(pool: &PgPool, activity_type_id: Uuid) -> Result<ActivityTypeRecord, ApiError> {
        ActivityCatalogRepository::find_type(pool, activity_type_id)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| ApiError::NotFound("Activity type not found".to_string()))
    }

    pub async fn log_activity(
        pool: &PgPool,
        user_id: Uuid,
        req: LogActivityRequest,
    ) -> Result<ActivityResponse, ApiError> {
        req.validate()?;
        validate_duration_minutes(req.duration_minutes)
            .map_err(|m| ApiError::invalid_field("duration_minutes", m))?;
        if let Some(calories) = req.calories_burned {
            validate_burned_calories(calories)?;
        }

        let activity_type = Self::find_type(pool, req.activity_type_id).await?;
        let calories = match req.calories_burned {
            Some(calories) => calories,
            None => {
                Self::estimate_for_type(pool, user_id, &activity_type, req.duration_minutes)
                    .await?
                    .calories
            }
        };

        let record = ActivityRepository::create(
            pool,
            CreateActivity {
                user_id,
                activity_type_id: activity_type.id,
                duration_minutes: req.duration_minutes,
                calories_burned: f64_to_decimal(calories, 1),
                performed_on: req.performed_on.unwrap_or_else(|| Utc::now().date_naive()),
                notes: req.notes,
            },
        )
        .await
        .map_err(ApiError::Internal)?;

        metrics::counter!("fittrack_activities_logged_total").increment(1);
        debug!(user_id = %user_id, activity_id = %record.id, "activity logged");
        Ok(activity_response(record))
    }

    pub async fn get_activity(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<ActivityResponse, ApiError> {
        Self::find_owned(pool, user_id, id).await.map(activity_response)
    }

    async fn find_owned(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<ActivityRecord, ApiError> {
        ActivityRepository::find(pool, user_id, id)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| ApiError::NotFound("Activity not found".to_string()))
    }

    /// Partial update; a new type or duration without explicit calories
    /// recomputes them
    pub async fn update_activity(
        pool: &PgPool,
        user_id: Uuid,
        id: Uuid,
        req: UpdateActivityRequest,
    ) -> Result<ActivityResponse, ApiError> {
        req.validate()?;
        if let Some(minutes) = req.duration_minutes {
            validate_duration_minutes(minutes).map_err(|m| ApiError::invalid_field("duration_minutes", m))?;
        }
        if let Some(calories) = req.calories_burned {
            validate_burned_calories(calories)?;
        }

        let existing = Self::find_owned(pool, user_id, id).await?;

        let new_type = match req.activity_type_id {
            Some(type_id) if type_id != existing.activity_type_id => {
                Some(Self::find_type(pool, type_id).await?)
            }
            _ => None,
        };
        let duration_changed = req
            .duration_minutes
            .is_some_and(|d| d != existing.duration_minutes);

        let calories = match req.calories_burned {
            Some(calories) => Some(calories),
            None if new_type.is_some() || duration_changed => {
                let activity_type = match new_type {
                    Some(t) => t,
                    None => Self::find_type(pool, existing.activity_type_id).await?,
                };
                let minutes = req.duration_minutes.unwrap_or(existing.duration_minutes);
                let estimate = Self::estimate_for_type(pool, user_id, &activity_type, minutes).await?;
                Some(estimate.calories)
            }
            None => None,
        };

        let record = ActivityRepository::update(
            pool,
            user_id,
            id,
            UpdateActivity {
                activity_type_id: req.activity_type_id,
                duration_minutes: req.duration_minutes,
                calories_burned: calories.map(|c| f64_to_decimal(c, 1)),
                performed_on: req.performed_on,
                notes: req.notes,
            },
        )
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::NotFound("Activity not found".to_string()))?;

        Ok(activity_response(record))
    }

    pub async fn delete_activity(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<(), ApiError> {
        let deleted = ActivityRepository::delete(pool, user_id, id)
            .await
            .map_err(ApiError::Internal)?;
        if !deleted {
            return Err(ApiError::NotFound("Activity not found".to_string()));
        }
        Ok(())
    }

    /// Activities in an optional date range, newest first
    pub async fn list_activities(
        pool: &PgPool,
        user_id: Uuid,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<ActivityResponse>, ApiError> {
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(ApiError::BadRequest("start must not be after end".to_string()));
            }
        }
        let records = ActivityRepository::list(pool, user_id, start, end)
            .await
            .map_err(ApiError::Internal)?;
        Ok(records.into_iter().map(activity_response).collect())
    }

    pub async fn daily_summary(
        pool: &PgPool,
        user_id: Uuid,
        date: NaiveDate,
    ) -> Result<ActivitySummaryResponse, ApiError> {
        let totals = ActivityRepository::day_totals(pool, user_id, date)
            .await
            .map_err(ApiError::Internal)?;

        Ok(ActivitySummaryResponse {
            date,
            activity_count: totals.activity_count,
            total_minutes: totals.total_minutes,
            total_calories: decimal_to_f64(&totals.total_calories),
        })
    }

    /// Estimate calories for a type and duration without logging anything
    pub async fn calculate_exercise_calories(
        pool: &PgPool,
        user_id: Uuid,
        activity_type_id: Uuid,
        duration_minutes: i32,
    ) -> Result<CalorieEstimateResponse, ApiError> {
        validate_duration_minutes(duration_minutes)
            .map_err(|m| ApiError::invalid_field("duration_minutes", m))?;
        let activity_type = Self::find_type(pool, activity_type_id).await?;
        Self::estimate_for_type(pool, user_id, &activity_type, duration_minutes).await
    }

    async fn estimate_for_type(
        pool: &PgPool,
        user_id: Uuid,
        activity_type: &ActivityTypeRecord,
        duration_minutes: i32,
    ) -> Result<CalorieEstimateResponse, ApiError> {
        let (met, met_source) = resolve_met(
            opt_decimal_to_f64(&activity_type.met_value),
            opt_decimal_to_f64(&activity_type.category_default_met),
            &activity_type.name,
        );

        let recorded = WeightRepository::latest(pool, user_id)
            .await
            .map_err(ApiError::Internal)?
            .map(|r| decimal_to_f64(&r.weight_kg));
        let profile = match recorded {
            Some(_) => None,
            None => UserRepository::find_by_id(pool, user_id)
                .await
                .map_err(ApiError::Internal)?
                .and_then(|u| opt_decimal_to_f64(&u.weight_kg)),
        };
        let (weight_kg, weight_source) = resolve_weight(recorded, profile);

        Ok(CalorieEstimateResponse {
            calories: estimate_met_calories(met, weight_kg, duration_minutes),
            met,
            met_source,
            weight_kg,
            weight_source,
        })
    }
}

fn validate_burned_calories(calories: f64) -> Result<(), ApiError> {
    if !calories.is_finite() || !(0.0..=10_000.0).contains(&calories) {
        return Err(ApiError::invalid_field(
            "calories_burned",
            "Calories burned must be between 0 and 10000",
        ));
    }
    Ok(())
}

/// First positive MET of: type, category default, name heuristic, default
pub fn resolve_met(type_met: Option<f64>, category_met: Option<f64>, type_name: &str) -> (f64, MetSource) {
    if let Some(met) = type_met.filter(|m| *m > 0.0) {
        return (met, MetSource::ActivityType);
    }
    if let Some(met) = category_met.filter(|m| *m > 0.0) {
        return (met, MetSource::Category);
    }
    if let Some(met) = heuristic_met(type_name) {
        return (met, MetSource::Heuristic);
    }
    (DEFAULT_MET, MetSource::Default)
}

/// Latest recorded weight, then profile weight, then the default
pub fn resolve_weight(recorded: Option<f64>, profile: Option<f64>) -> (f64, WeightSource) {
    match (recorded.filter(|w| *w > 0.0), profile.filter(|w| *w > 0.0)) {
        (Some(w), _) => (w, WeightSource::WeightRecord),
        (None, Some(w)) => (w, WeightSource::Profile),
        (None, None) => (DEFAULT_WEIGHT_KG, WeightSource::Default),
    }
}

pub fn category_response(record: ActivityCategoryRecord) -> ActivityCategoryResponse {
    ActivityCategoryResponse {
        id: record.id,
        name: record.name,
        description: record.description,
        default_met: opt_decimal_to_f64(&record.default_met),
    }
}

pub fn type_response(record: ActivityTypeRecord) -> ActivityTypeResponse {
    ActivityTypeResponse {
        id: record.id,
        category_id: record.category_id,
        category_name: record.category_name,
        name: record.name,
        met_value: opt_decimal_to_f64(&record.met_value),
    }
}

fn activity_response(record: ActivityRecord) -> ActivityResponse {
    ActivityResponse {
        id: record.id,
        activity_type_id: record.activity_type_id,
        activity_type_name: record.activity_type_name,
        category_name: record.category_name,
        duration_minutes: record.duration_minutes,
        calories_burned: decimal_to_f64(&record.calories_burned),
        performed_on: record.performed_on,
        notes: record.notes,
        created_at: record.created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some(11.0), Some(7.0), "Running", 11.0, MetSource::ActivityType)]
    #[case(None, Some(7.0), "Running", 7.0, MetSource::Category)]
    #[case(Some(0.0), Some(7.0), "Running", 7.0, MetSource::Category)]
    #[case(None, None, "Trail running", 9.8, MetSource::Heuristic)]
    #[case(None, Some(0.0), "Lap Swimming", 8.0, MetSource::Heuristic)]
    #[case(None, None, "Chess boxing", DEFAULT_MET, MetSource::Default)]
    fn test_resolve_met_chain(
        #[case] type_met: Option<f64>,
        #[case] category_met: Option<f64>,
        #[case] name: &str,
        #[case] expected: f64,
        #[case] source: MetSource,
    ) {
        assert_eq!(resolve_met(type_met, category_met, name), (expected, source));
    }

    #[rstest]
    #[case(Some(82.5), Some(90.0), 82.5, WeightSource::WeightRecord)]
    #[case(None, Some(90.0), 90.0, WeightSource::Profile)]
    #[case(None, None, DEFAULT_WEIGHT_KG, WeightSource::Default)]
    fn test_resolve_weight_chain(
        #[case] recorded: Option<f64>,
        #[case] profile: Option<f64>,
        #[case] expected: f64,
        #[case] source: WeightSource,
    ) {
        assert_eq!(resolve_weight(recorded, profile), (expected, source));
    }

    #[test]
    fn test_running_half_hour_at_seventy_kg() {
        let (met, _) = resolve_met(None, None, "Running");
        let (weight, _) = resolve_weight(None, None);
        assert_eq!(estimate_met_calories(met, weight, 30), 343.0);
    }

    #[test]
    fn test_burned_calories_bounds() {
        assert!(validate_burned_calories(0.0).is_ok());
        assert!(validate_burned_calories(-1.0).is_err());
        assert!(validate_burned_calories(f64::NAN).is_err());
        assert!(validate_burned_calories(10_001.0).is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_resolved_met_is_positive(
            type_met in proptest::option::of(-5.0f64..20.0),
            category_met in proptest::option::of(-5.0f64..20.0),
            name in "[a-z ]{0,20}",
        ) {
            let (met, _) = resolve_met(type_met, category_met, &name);
            prop_assert!(met > 0.0);
        }

        #[test]
        fn prop_calories_grow_with_duration(minutes in 1i32..1440) {
            let shorter = estimate_met_calories(6.0, 70.0, minutes);
            let longer = estimate_met_calories(6.0, 70.0, minutes + 1);
            prop_assert!(longer >= shorter);
        }
    }
}
