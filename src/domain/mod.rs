//! Domain layer - Core business entities
//!
//! Entities here know nothing about storage; the infra layer persists them
//! as documents through [`Entity`].

pub mod entity;
pub mod password;
pub mod user;

pub use entity::Entity;
pub use password::HashedPassword;
pub use user::{NewUser, UpdateUser, User, UserResponse};
