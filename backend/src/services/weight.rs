//! Weight tracking service
//!
//! One record per user per day. Progress fills every calendar day of the
//! requested range, carrying the last known weight forward over gaps.

use crate::db::{decimal_to_f64, f64_to_decimal, opt_decimal_to_f64};
use crate::error::ApiError;
use crate::repositories::{UserRepository, WeightRecord, WeightRepository};
use chrono::{NaiveDate, Utc};
use fittrack_shared::health_metrics::{round1, trailing_average};
use fittrack_shared::types::{
    LogWeightRequest, WeightProgressPoint, WeightProgressResponse, WeightRecordResponse,
};
use fittrack_shared::validation::validate_weight;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

/// Longest progress range, in days between start and end
pub const MAX_PROGRESS_SPAN_DAYS: i64 = 366;

pub struct WeightService;

impl WeightService {
    /// Record the weight of a day, replacing an earlier entry for that day
    pub async fn log_weight(
        pool: &PgPool,
        user_id: Uuid,
        req: LogWeightRequest,
    ) -> Result<WeightRecordResponse, ApiError> {
        let weight_kg = req.unit.unwrap_or_default().to_kg(req.weight);
        validate_weight(weight_kg).map_err(|m| ApiError::invalid_field("weight", m))?;

        let today = Utc::now().date_naive();
        let recorded_on = req.recorded_on.unwrap_or(today);
        if recorded_on > today {
            return Err(ApiError::invalid_field("recorded_on", "Date cannot be in the future"));
        }
        let notes = req
            .notes
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());
        if notes.is_some_and(|n| n.chars().count() > 500) {
            return Err(ApiError::invalid_field("notes", "Notes must be at most 500 characters"));
        }

        let record = WeightRepository::upsert(
            pool,
            user_id,
            recorded_on,
            f64_to_decimal(weight_kg, 2),
            notes,
        )
        .await
        .map_err(ApiError::Internal)?;

        Self::sync_profile_weight(pool, user_id).await?;

        metrics::counter!("fittrack_weight_records_total").increment(1);
        debug!(user_id = %user_id, recorded_on = %recorded_on, "weight recorded");
        Ok(record_response(record))
    }

    /// Copy the latest record into the profile, clearing it once no records remain
    async fn sync_profile_weight(pool: &PgPool, user_id: Uuid) -> Result<(), ApiError> {
        let latest = WeightRepository::latest(pool, user_id)
            .await
            .map_err(ApiError::Internal)?;
        UserRepository::set_weight(pool, user_id, latest.map(|record| record.weight_kg))
            .await
            .map_err(ApiError::Internal)
    }

    pub async fn history(
        pool: &PgPool,
        user_id: Uuid,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<WeightRecordResponse>, ApiError> {
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(ApiError::BadRequest("start must not be after end".to_string()));
            }
        }
        let records = WeightRepository::list(pool, user_id, start, end)
            .await
            .map_err(ApiError::Internal)?;
        Ok(records.into_iter().map(record_response).collect())
    }

    pub async fn delete_record(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<(), ApiError> {
        let deleted = WeightRepository::delete(pool, user_id, id)
            .await
            .map_err(ApiError::Internal)?;
        if !deleted {
            return Err(ApiError::NotFound("Weight record not found".to_string()));
        }
        Self::sync_profile_weight(pool, user_id).await
    }

    pub async fn get_weight_progress(
        pool: &PgPool,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<WeightProgressResponse, ApiError> {
        check_progress_range(start, end)?;

        let user = UserRepository::find_by_id(pool, user_id)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
        let before = WeightRepository::latest_before(pool, user_id, start)
            .await
            .map_err(ApiError::Internal)?;
        let records = WeightRepository::list(pool, user_id, Some(start), Some(end))
            .await
            .map_err(ApiError::Internal)?;

        let known: Vec<(NaiveDate, f64)> = records
            .iter()
            .map(|r| (r.recorded_on, decimal_to_f64(&r.weight_kg)))
            .collect();
        let carried = before.map(|r| decimal_to_f64(&r.weight_kg));
        let points = fill_forward(start, end, carried, &known);

        Ok(progress_summary(
            start,
            end,
            points,
            opt_decimal_to_f64(&user.target_weight_kg),
        ))
    }
}

pub fn check_progress_range(start: NaiveDate, end: NaiveDate) -> Result<(), ApiError> {
    if start > end {
        return Err(ApiError::BadRequest("start must not be after end".to_string()));
    }
    if (end - start).num_days() > MAX_PROGRESS_SPAN_DAYS {
        return Err(ApiError::BadRequest(format!(
            "Range cannot exceed {} days",
            MAX_PROGRESS_SPAN_DAYS
        )));
    }
    Ok(())
}

/// One point per day of `[start, end]`
///
/// `carried` is the last weight known before `start`. `records` must be
/// sorted by date and lie inside the range. Days before any known weight
/// produce no point.
pub fn fill_forward(
    start: NaiveDate,
    end: NaiveDate,
    carried: Option<f64>,
    records: &[(NaiveDate, f64)],
) -> Vec<WeightProgressPoint> {
    let mut points = Vec::new();
    let mut last = carried;
    let mut next = records.iter().peekable();

    for date in start.iter_days().take_while(|d| *d <= end) {
        // Skip anything before the current day
        while next.peek().is_some_and(|(d, _)| *d < date) {
            next.next();
        }

        let recorded = match next.peek() {
            Some((d, weight)) if *d == date => {
                last = Some(*weight);
                next.next();
                true
            }
            _ => false,
        };

        if let Some(weight_kg) = last {
            points.push(WeightProgressPoint {
                date,
                weight_kg,
                recorded,
            });
        }
    }

    points
}

pub fn progress_summary(
    start: NaiveDate,
    end: NaiveDate,
    points: Vec<WeightProgressPoint>,
    target_weight_kg: Option<f64>,
) -> WeightProgressResponse {
    let weights: Vec<f64> = points.iter().map(|p| p.weight_kg).collect();
    let start_weight_kg = weights.first().copied();
    let current_weight_kg = weights.last().copied();

    let change_kg = match (start_weight_kg, current_weight_kg) {
        (Some(first), Some(last)) => Some(round1(last - first)),
        _ => None,
    };
    let remaining_to_target_kg = match (current_weight_kg, target_weight_kg) {
        (Some(current), Some(target)) => Some(round1(target - current)),
        _ => None,
    };

    WeightProgressResponse {
        start,
        end,
        moving_average_7d: trailing_average(&weights, 7).map(round1),
        points,
        start_weight_kg,
        current_weight_kg,
        change_kg,
        target_weight_kg,
        remaining_to_target_kg,
    }
}

fn record_response(record: WeightRecord) -> WeightRecordResponse {
    WeightRecordResponse {
        id: record.id,
        weight_kg: decimal_to_f64(&record.weight_kg),
        recorded_on: record.recorded_on,
        notes: record.notes,
    }
}
