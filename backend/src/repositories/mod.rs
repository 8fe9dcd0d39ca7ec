//! Database repositories
//!
//! Data access layer. Repositories return `anyhow::Result` and map rows
//! into `*Record` structs; services turn those into API types.

pub mod activity;
pub mod meal;
pub mod nutrition;
pub mod stats;
pub mod token;
pub mod user;
pub mod weight;

pub use activity::{
    ActivityCatalogRepository, ActivityCategoryRecord, ActivityRecord, ActivityRepository,
    ActivityTypeRecord, CreateActivity, UpdateActivity,
};
pub use meal::{CreateMeal, MealRecord, MealRepository, UpdateMeal};
pub use nutrition::{
    ConsumableItemRecord, ConsumableItemRepository, CreateConsumableItem, CreateNutrient,
    NutrientRecord,
};
pub use stats::StatsRepository;
pub use token::{PasswordResetRepository, RefreshTokenRepository};
pub use user::{CreateUser, UpdateUserProfile, UserRecord, UserRepository};
pub use weight::{WeightRecord, WeightRepository};
