//! Application route configuration.

use axum::{extract::State, http::StatusCode, middleware, response::Json, routing::get, Router};
use sea_orm::DbErr;
use serde::Serialize;
use tower_http::trace::TraceLayer;

use super::handlers::{auth_routes, public_user_routes, user_routes};
use super::middleware::auth_middleware;
use super::AppState;

/// Create the application router with all routes configured
pub fn create_router(state: AppState) -> Router {
    // The auth layer only wraps routes registered before it; registration
    // (POST /users) is merged in afterwards and stays public.
    let users = user_routes()
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .merge(public_user_routes());

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/auth", auth_routes())
        .nest("/users", users)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> &'static str {
    "Document store API"
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    services: ServiceHealth,
}

#[derive(Serialize)]
struct ServiceHealth {
    database: ServiceStatus,
}

#[derive(Serialize)]
struct ServiceStatus {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Report database connectivity; `disabled` when serving from memory.
async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = match &state.database {
        None => ServiceStatus {
            status: "disabled",
            error: None,
        },
        Some(db) => database_status(db.ping().await),
    };

    let healthy = database.status != "unhealthy";
    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = HealthResponse {
        status: if healthy { "healthy" } else { "degraded" },
        services: ServiceHealth { database },
    };

    (status_code, Json(response))
}

/// Ping outcome as reported to anonymous callers; failure details only go
/// to the log.
fn database_status(ping: Result<(), DbErr>) -> ServiceStatus {
    match ping {
        Ok(()) => ServiceStatus {
            status: "healthy",
            error: None,
        },
        Err(e) => {
            tracing::error!(error = %e, "Database health check failed");
            ServiceStatus {
                status: "unhealthy",
                error: Some("database unreachable".to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unhealthy_database_hides_error_details() {
        let status = database_status(Err(DbErr::Custom(
            "password authentication failed for user \"docstore\"".to_string(),
        )));

        assert_eq!(status.status, "unhealthy");
        assert_eq!(status.error.as_deref(), Some("database unreachable"));
    }

    #[test]
    fn reachable_database_is_healthy() {
        let status = database_status(Ok(()));

        assert_eq!(status.status, "healthy");
        assert!(status.error.is_none());
    }
}
