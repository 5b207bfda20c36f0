//! Document store API
//!
//! A generic repository over schemaless document collections, backed by
//! PostgreSQL `jsonb` (or process memory), with a small user API on top.
//!
//! # Layers
//!
//! - **infra**: document collections, the generic repository, migrations
//! - **domain**: entities stored through the repository
//! - **services**: user and authentication use cases
//! - **api**: HTTP handlers, middleware, and routes
//! - **cli** / **commands**: `serve` and `migrate`
//!
//! ```bash
//! cargo run -- migrate up
//! cargo run -- serve
//! cargo run -- serve --in-memory
//! ```

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod infra;
pub mod services;

pub use api::AppState;
pub use config::Config;
pub use domain::{Entity, User};
pub use errors::{AppError, AppResult};
pub use infra::{DocumentCollection, DocumentRepository, Filter, Update};
