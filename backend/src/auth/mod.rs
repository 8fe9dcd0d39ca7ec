//! Authentication module
//!
//! JWT access/refresh/reset tokens and argon2 password hashing.

mod jwt;
mod middleware;
mod password;

pub use jwt::{Claims, JwtService, TokenLifetimes};
pub use middleware::{AdminUser, AuthUser};
pub use password::PasswordService;
