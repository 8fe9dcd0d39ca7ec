//! Business logic services
//!
//! Services encapsulate business logic and coordinate between
//! repositories and external systems.

pub mod activity;
pub mod admin;
pub mod email;
pub mod meal;
pub mod nutrition;
pub mod seeder;
pub mod storage;
pub mod token;
pub mod user;
pub mod weight;

pub use activity::ActivityService;
pub use admin::AdminService;
pub use email::EmailService;
pub use meal::MealService;
pub use nutrition::NutritionService;
pub use seeder::DataSeeder;
pub use storage::FileStorage;
pub use token::TokenService;
pub use user::UserService;
pub use weight::WeightService;
