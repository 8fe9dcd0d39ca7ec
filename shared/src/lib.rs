//! FitTrack Shared Library
//!
//! Request/response types, domain enums and pure calculations used by
//! the backend, the WASM bindings and the web client.

pub mod health_metrics;
pub mod models;
pub mod types;
pub mod units;
pub mod validation;

pub use health_metrics::*;
pub use models::{FitnessGoal, MealType, MetSource, Role, WeightSource};
pub use types::*;
pub use units::*;
