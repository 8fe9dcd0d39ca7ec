//! User accounts: registration, login, profile and password management
//!
//! Password hashing and verification run on the blocking pool; tokens are
//! issued through `TokenService` so every login gets a persisted session.

use crate::auth::{JwtService, PasswordService};
use crate::db::{decimal_to_f64, f64_to_decimal, opt_decimal_to_f64, opt_f64_to_decimal};
use crate::error::ApiError;
use crate::repositories::{
    CreateUser, PasswordResetRepository, UpdateUserProfile, UserRecord, UserRepository,
};
use crate::services::email::EmailService;
use crate::services::storage::{image_extension, FileStorage, StoredUpload};
use crate::services::token::TokenService;
use chrono::{Datelike, Duration, NaiveDate, Utc};
use fittrack_shared::health_metrics::{
    calculate_bmi, calculate_daily_targets, round1, ActivityLevel, BiologicalSex, HealthProfile,
};
use fittrack_shared::models::{FitnessGoal, Role};
use fittrack_shared::types::{
    AuthTokens, ChangePasswordRequest, DailyTargetsResponse, ForgotPasswordRequest, LoginRequest,
    ProfilePictureResponse, RegisterRequest, ResetPasswordRequest, UpdateProfileRequest,
    UserProfileResponse,
};
use fittrack_shared::validation::{
    validate_daily_calorie_goal, validate_date_of_birth, validate_height_cm, validate_username,
    validate_weight,
};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

/// Profile picture upload as received from the client
#[derive(Debug, Clone)]
pub struct PictureUpload {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub content_type: String,
}

/// User service for account operations
pub struct UserService;

impl UserService {
    /// Register a new user and start a session
    pub async fn register(
        pool: &PgPool,
        jwt: &JwtService,
        email_service: &EmailService,
        req: RegisterRequest,
    ) -> Result<AuthTokens, ApiError> {
        req.validate()?;
        let username = req.username.trim().to_string();
        validate_username(&username).map_err(|m| ApiError::invalid_field("username", m))?;
        let email = req.email.trim().to_lowercase();

        if UserRepository::email_exists(pool, &email)
            .await
            .map_err(ApiError::Internal)?
        {
            return Err(ApiError::Conflict("Email already registered".to_string()));
        }
        if UserRepository::username_exists(pool, &username)
            .await
            .map_err(ApiError::Internal)?
        {
            return Err(ApiError::Conflict("Username already taken".to_string()));
        }

        let password_hash = PasswordService::hash_async(req.password)
            .await
            .map_err(ApiError::Internal)?;

        let user = UserRepository::create(
            pool,
            CreateUser {
                email,
                username,
                password_hash,
                first_name: req.first_name.trim().to_string(),
                last_name: req.last_name.trim().to_string(),
                role: Role::User.as_str().to_string(),
            },
        )
        .await
        .map_err(ApiError::Internal)?;

        metrics::counter!("fittrack_users_registered_total").increment(1);
        info!(user_id = %user.id, "user registered");

        // Welcome mail goes out in the background; failures are only logged
        let mailer = email_service.clone();
        let (to, name) = (user.email.clone(), user.username.clone());
        tokio::spawn(async move {
            if let Err(e) = mailer.send_welcome(&to, &name).await {
                warn!(error = %e, "failed to send welcome email");
            }
        });

        TokenService::issue_tokens(pool, jwt, user.id, Role::User).await
    }

    /// Login with email or username
    pub async fn login(pool: &PgPool, jwt: &JwtService, req: LoginRequest) -> Result<AuthTokens, ApiError> {
        let invalid = || ApiError::Unauthorized("Invalid credentials".to_string());

        let user = UserRepository::find_by_login(pool, req.login.trim())
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(invalid)?;

        let valid = PasswordService::verify_async(req.password, user.password_hash.clone())
            .await
            .map_err(ApiError::Internal)?;
        if !valid {
            return Err(invalid());
        }

        let role = parse_role(&user.role)?;
        info!(user_id = %user.id, "user logged in");
        TokenService::issue_tokens(pool, jwt, user.id, role).await
    }

    pub async fn refresh(pool: &PgPool, jwt: &JwtService, refresh_token: &str) -> Result<AuthTokens, ApiError> {
        TokenService::rotate(pool, jwt, refresh_token).await
    }

    pub async fn logout(pool: &PgPool, jwt: &JwtService, refresh_token: &str) -> Result<(), ApiError> {
        TokenService::revoke(pool, jwt, refresh_token).await
    }

    async fn find_user(pool: &PgPool, user_id: Uuid) -> Result<UserRecord, ApiError> {
        UserRepository::find_by_id(pool, user_id)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
    }

    pub async fn get_profile(pool: &PgPool, user_id: Uuid) -> Result<UserProfileResponse, ApiError> {
        let user = Self::find_user(pool, user_id).await?;
        profile_from_record(&user, Utc::now().date_naive())
    }

    /// Partial profile update; weight and height may come in other units
    pub async fn update_profile(
        pool: &PgPool,
        user_id: Uuid,
        req: UpdateProfileRequest,
    ) -> Result<UserProfileResponse, ApiError> {
        req.validate()?;
        let today = Utc::now().date_naive();
        let updates = profile_updates(&req, today)?;

        let user = UserRepository::update_profile(pool, user_id, updates)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        profile_from_record(&user, today)
    }

    /// Change password and end every session
    pub async fn change_password(
        pool: &PgPool,
        user_id: Uuid,
        req: ChangePasswordRequest,
    ) -> Result<(), ApiError> {
        req.validate()?;
        let user = Self::find_user(pool, user_id).await?;

        let valid = PasswordService::verify_async(req.current_password, user.password_hash)
            .await
            .map_err(ApiError::Internal)?;
        if !valid {
            return Err(ApiError::Unauthorized("Current password is incorrect".to_string()));
        }

        let password_hash = PasswordService::hash_async(req.new_password)
            .await
            .map_err(ApiError::Internal)?;
        UserRepository::update_password(pool, user_id, &password_hash)
            .await
            .map_err(ApiError::Internal)?;

        let revoked = TokenService::revoke_all(pool, user_id).await?;
        info!(user_id = %user_id, revoked, "password changed");
        Ok(())
    }

    /// Start a password reset
    ///
    /// Unknown addresses succeed silently so the endpoint cannot be used to
    /// probe for accounts.
    pub async fn forgot_password(
        pool: &PgPool,
        jwt: &JwtService,
        email_service: &EmailService,
        req: ForgotPasswordRequest,
    ) -> Result<(), ApiError> {
        req.validate()?;

        let Some(user) = UserRepository::find_by_email(pool, req.email.trim())
            .await
            .map_err(ApiError::Internal)?
        else {
            info!("password reset requested for unknown email");
            return Ok(());
        };

        let expires_at = Utc::now() + Duration::seconds(jwt.reset_token_expiry_secs());
        let row = PasswordResetRepository::create(pool, user.id, expires_at)
            .await
            .map_err(ApiError::Internal)?;
        let token = jwt
            .generate_reset_token(user.id, row.id)
            .map_err(ApiError::Internal)?;

        let valid_minutes = jwt.reset_token_expiry_secs() / 60;
        if let Err(e) = email_service
            .send_password_reset(&user.email, &token, valid_minutes)
            .await
        {
            warn!(user_id = %user.id, error = %e, "failed to send password reset email");
        }

        Ok(())
    }

    /// Finish a password reset with the emailed token
    pub async fn reset_password(
        pool: &PgPool,
        jwt: &JwtService,
        req: ResetPasswordRequest,
    ) -> Result<(), ApiError> {
        req.validate()?;
        let invalid = || ApiError::BadRequest("Invalid or expired reset token".to_string());

        let claims = jwt.validate_reset_token(&req.token).map_err(|_| invalid())?;
        let user_id = claims.user_id().map_err(|_| invalid())?;
        let token_id = claims.token_id().map_err(|_| invalid())?;

        let row = PasswordResetRepository::find(pool, token_id)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(invalid)?;
        if row.user_id != user_id || !row.is_usable(Utc::now()) {
            return Err(invalid());
        }
        if !PasswordResetRepository::mark_used(pool, token_id)
            .await
            .map_err(ApiError::Internal)?
        {
            return Err(invalid());
        }

        let password_hash = PasswordService::hash_async(req.new_password)
            .await
            .map_err(ApiError::Internal)?;
        UserRepository::update_password(pool, user_id, &password_hash)
            .await
            .map_err(ApiError::Internal)?;
        TokenService::revoke_all(pool, user_id).await?;

        info!(user_id = %user_id, "password reset completed");
        Ok(())
    }

    pub async fn daily_targets(pool: &PgPool, user_id: Uuid) -> Result<DailyTargetsResponse, ApiError> {
        let user = Self::find_user(pool, user_id).await?;
        daily_targets_for(&user, Utc::now().date_naive())
    }

    /// Store a new profile picture and drop the previous one
    pub async fn upload_profile_picture(
        pool: &PgPool,
        storage: &dyn FileStorage,
        max_bytes: usize,
        user_id: Uuid,
        upload: PictureUpload,
    ) -> Result<ProfilePictureResponse, ApiError> {
        if image_extension(&upload.content_type).is_none() {
            return Err(ApiError::invalid_field(
                "file",
                "Only JPEG, PNG, WebP or GIF images are accepted",
            ));
        }
        if upload.bytes.is_empty() {
            return Err(ApiError::invalid_field("file", "File is empty"));
        }
        if upload.bytes.len() > max_bytes {
            return Err(ApiError::PayloadTooLarge(format!(
                "Profile pictures are limited to {} bytes",
                max_bytes
            )));
        }

        let user = Self::find_user(pool, user_id).await?;

        let stored = storage
            .upload(StoredUpload {
                public_id: format!("{}-{}", user_id, Uuid::new_v4().simple()),
                bytes: upload.bytes,
                file_name: upload.file_name,
                content_type: upload.content_type,
            })
            .await
            .map_err(ApiError::Internal)?;

        UserRepository::set_profile_picture(pool, user_id, &stored.url, &stored.id)
            .await
            .map_err(ApiError::Internal)?;

        if let Some(previous) = user.profile_picture_id {
            if let Err(e) = storage.delete(&previous).await {
                warn!(user_id = %user_id, error = %e, "failed to delete previous profile picture");
            }
        }

        Ok(ProfilePictureResponse { url: stored.url })
    }

    /// Delete the account, its data and its stored picture
    pub async fn delete_account(
        pool: &PgPool,
        storage: &dyn FileStorage,
        user_id: Uuid,
    ) -> Result<(), ApiError> {
        let user = Self::find_user(pool, user_id).await?;

        UserRepository::delete(pool, user_id)
            .await
            .map_err(ApiError::Internal)?;

        if let Some(picture) = user.profile_picture_id {
            if let Err(e) = storage.delete(&picture).await {
                warn!(user_id = %user_id, error = %e, "failed to delete profile picture");
            }
        }

        info!(user_id = %user_id, "account deleted");
        Ok(())
    }
}

pub(crate) fn parse_role(value: &str) -> Result<Role, ApiError> {
    value
        .parse::<Role>()
        .map_err(|e| ApiError::Internal(anyhow::anyhow!(e)))
}

/// Completed years between birth and `today`
pub fn age_on(date_of_birth: NaiveDate, today: NaiveDate) -> Option<i32> {
    if date_of_birth > today {
        return None;
    }
    let mut years = today.year() - date_of_birth.year();
    if (today.month(), today.day()) < (date_of_birth.month(), date_of_birth.day()) {
        years -= 1;
    }
    Some(years)
}

/// Build the API profile from a row
pub fn profile_from_record(user: &UserRecord, today: NaiveDate) -> Result<UserProfileResponse, ApiError> {
    let weight_kg = opt_decimal_to_f64(&user.weight_kg);
    let height_cm = opt_decimal_to_f64(&user.height_cm);
    let bmi = match (weight_kg, height_cm) {
        (Some(w), Some(h)) if h > 0.0 => Some(round1(calculate_bmi(w, h))),
        _ => None,
    };

    Ok(UserProfileResponse {
        id: user.id,
        email: user.email.clone(),
        username: user.username.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        role: parse_role(&user.role)?,
        weight_kg,
        height_cm,
        date_of_birth: user.date_of_birth,
        age_years: user.date_of_birth.and_then(|dob| age_on(dob, today)),
        gender: user
            .gender
            .as_deref()
            .and_then(|g| g.parse::<BiologicalSex>().ok()),
        activity_level: user.activity_level.parse().unwrap_or_default(),
        fitness_goal: user.fitness_goal.parse().unwrap_or_default(),
        target_weight_kg: opt_decimal_to_f64(&user.target_weight_kg),
        daily_calorie_goal: user.daily_calorie_goal,
        bmi,
        profile_picture_url: user.profile_picture_url.clone(),
        created_at: user.created_at,
    })
}

/// Validate an update request and convert it to stored units
pub fn profile_updates(req: &UpdateProfileRequest, today: NaiveDate) -> Result<UpdateUserProfile, ApiError> {
    let weight_kg = match req.weight {
        Some(weight) => {
            let kg = req.weight_unit.unwrap_or_default().to_kg(weight);
            validate_weight(kg).map_err(|m| ApiError::invalid_field("weight", m))?;
            Some(kg)
        }
        None => None,
    };
    let height_cm = match req.height {
        Some(height) => {
            let cm = req.height_unit.unwrap_or_default().to_cm(height);
            validate_height_cm(cm).map_err(|m| ApiError::invalid_field("height", m))?;
            Some(cm)
        }
        None => None,
    };
    if let Some(dob) = req.date_of_birth {
        validate_date_of_birth(dob, today).map_err(|m| ApiError::invalid_field("date_of_birth", m))?;
    }
    if let Some(target) = req.target_weight_kg {
        validate_weight(target).map_err(|m| ApiError::invalid_field("target_weight_kg", m))?;
    }
    if let Some(goal) = req.daily_calorie_goal {
        validate_daily_calorie_goal(goal).map_err(|m| ApiError::invalid_field("daily_calorie_goal", m))?;
    }

    Ok(UpdateUserProfile {
        first_name: req.first_name.as_ref().map(|s| s.trim().to_string()),
        last_name: req.last_name.as_ref().map(|s| s.trim().to_string()),
        weight_kg: opt_f64_to_decimal(weight_kg, 2),
        height_cm: opt_f64_to_decimal(height_cm, 1),
        date_of_birth: req.date_of_birth,
        gender: req.gender.map(|g| g.as_str().to_string()),
        activity_level: req.activity_level.map(|a| a.as_str().to_string()),
        fitness_goal: req.fitness_goal.map(|g| g.as_str().to_string()),
        target_weight_kg: opt_f64_to_decimal(req.target_weight_kg, 2),
        daily_calorie_goal: req.daily_calorie_goal,
    })
}

/// Energy profile of a user, or the list of fields still missing
pub fn health_profile(user: &UserRecord, today: NaiveDate) -> Result<HealthProfile, Vec<&'static str>> {
    let weight_kg = user.weight_kg.as_ref().map(decimal_to_f64);
    let height_cm = user.height_cm.as_ref().map(decimal_to_f64);
    let age_years = user.date_of_birth.and_then(|dob| age_on(dob, today));
    let sex = user
        .gender
        .as_deref()
        .and_then(|g| g.parse::<BiologicalSex>().ok());

    match (weight_kg, height_cm, age_years, sex) {
        (Some(weight_kg), Some(height_cm), Some(age_years), Some(sex)) => Ok(HealthProfile {
            height_cm,
            weight_kg,
            age_years,
            sex,
            activity_level: user.activity_level.parse::<ActivityLevel>().unwrap_or_default(),
            goal: user.fitness_goal.parse::<FitnessGoal>().unwrap_or_default(),
        }),
        _ => {
            let mut missing = Vec::new();
            if weight_kg.is_none() {
                missing.push("weight");
            }
            if height_cm.is_none() {
                missing.push("height");
            }
            if age_years.is_none() {
                missing.push("date_of_birth");
            }
            if sex.is_none() {
                missing.push("gender");
            }
            Err(missing)
        }
    }
}

/// Targets for a user; an explicit daily goal replaces the computed target
pub fn daily_targets_for(user: &UserRecord, today: NaiveDate) -> Result<DailyTargetsResponse, ApiError> {
    let profile = health_profile(user, today).map_err(|missing| {
        ApiError::Validation(format!(
            "Complete your profile to compute targets (missing: {})",
            missing.join(", ")
        ))
    })?;

    let calorie_override = user.daily_calorie_goal.map(f64::from);
    Ok(DailyTargetsResponse {
        targets: calculate_daily_targets(&profile, calorie_override),
        fitness_goal: profile.goal,
        overridden: calorie_override.is_some(),
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use fittrack_shared::units::{HeightUnit, WeightUnit};
    use rust_decimal::Decimal;

    pub(crate) fn sample_user() -> UserRecord {
        UserRecord {
            id: Uuid::new_v4(),
            email: "jane@example.com".to_string(),
            username: "jane".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            role: "user".to_string(),
            weight_kg: Some(Decimal::new(800, 1)),
            height_cm: Some(Decimal::new(1800, 1)),
            date_of_birth: NaiveDate::from_ymd_opt(1995, 1, 1),
            gender: Some("male".to_string()),
            activity_level: "moderately_active".to_string(),
            fitness_goal: "lose_weight".to_string(),
            target_weight_kg: Some(Decimal::new(750, 1)),
            daily_calorie_goal: None,
            profile_picture_url: None,
            profile_picture_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    #[test]
    fn test_profile_from_record() {
        let profile = profile_from_record(&sample_user(), today()).unwrap();
        assert_eq!(profile.age_years, Some(30));
        assert_eq!(profile.bmi, Some(24.7));
        assert_eq!(profile.gender, Some(BiologicalSex::Male));
        assert_eq!(profile.activity_level, ActivityLevel::ModeratelyActive);
        assert_eq!(profile.fitness_goal, FitnessGoal::LoseWeight);
        assert_eq!(profile.role, Role::User);
    }

    #[test]
    fn test_age_before_and_after_birthday() {
        let dob = NaiveDate::from_ymd_opt(2000, 6, 15).unwrap();
        assert_eq!(age_on(dob, NaiveDate::from_ymd_opt(2025, 6, 14).unwrap()), Some(24));
        assert_eq!(age_on(dob, NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()), Some(25));
        assert_eq!(age_on(dob, NaiveDate::from_ymd_opt(1999, 1, 1).unwrap()), None);
    }

    #[test]
    fn test_profile_without_height_has_no_bmi() {
        let mut user = sample_user();
        user.height_cm = None;
        assert_eq!(profile_from_record(&user, today()).unwrap().bmi, None);
    }

    #[test]
    fn test_daily_targets_goal_adjusted() {
        let response = daily_targets_for(&sample_user(), today()).unwrap();
        assert_eq!(response.targets.tdee, 2759.0);
        assert_eq!(response.targets.calorie_target, 2259.0);
        assert!(!response.overridden);
    }

    #[test]
    fn test_daily_targets_explicit_goal_wins() {
        let mut user = sample_user();
        user.daily_calorie_goal = Some(1800);
        let response = daily_targets_for(&user, today()).unwrap();
        assert_eq!(response.targets.calorie_target, 1800.0);
        assert!(response.overridden);
    }

    #[test]
    fn test_daily_targets_missing_profile() {
        let mut user = sample_user();
        user.gender = None;
        user.date_of_birth = None;
        match daily_targets_for(&user, today()) {
            Err(ApiError::Validation(msg)) => {
                assert!(msg.contains("date_of_birth"));
                assert!(msg.contains("gender"));
            }
            other => panic!("unexpected: {:?}", other.map(|r| r.targets)),
        }
    }

    #[test]
    fn test_profile_updates_convert_units() {
        let req = UpdateProfileRequest {
            weight: Some(176.0),
            weight_unit: Some(WeightUnit::Lbs),
            height: Some(1.8),
            height_unit: Some(HeightUnit::Meters),
            ..Default::default()
        };
        let updates = profile_updates(&req, today()).unwrap();
        assert_eq!(updates.weight_kg, Some(Decimal::new(7983, 2)));
        assert_eq!(updates.height_cm, Some(Decimal::new(1800, 1)));
        assert!(updates.first_name.is_none());
    }

    #[test]
    fn test_profile_updates_reject_out_of_range() {
        let req = UpdateProfileRequest {
            height: Some(20.0),
            ..Default::default()
        };
        assert!(matches!(
            profile_updates(&req, today()),
            Err(ApiError::InvalidField { ref field, .. }) if field == "height"
        ));

        let req = UpdateProfileRequest {
            daily_calorie_goal: Some(300),
            ..Default::default()
        };
        assert!(profile_updates(&req, today()).is_err());
    }
}
