//! Application services layer - Use cases and business logic.
//!
//! Services depend on repository traits, never on a concrete storage backend.

mod auth_service;
mod user_service;

pub use auth_service::{AuthService, Authenticator, Claims, TokenResponse};
pub use user_service::{UserManager, UserService};
