//! Bearer token authentication.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::api::extractors::CurrentUser;
use crate::api::AppState;
use crate::errors::AppError;

/// Resolve the bearer token to a stored user and attach it as [`CurrentUser`].
///
/// Tokens whose subject no longer exists are rejected the same way as a
/// missing or invalid token.
pub async fn auth_middleware(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or(AppError::Unauthorized)?;

    let claims = state
        .auth_service
        .verify_token(bearer.token())
        .map_err(|_| AppError::Unauthorized)?;

    let user = match state.user_service.get_user(claims.sub).await {
        Ok(user) => user,
        Err(AppError::NotFound) => {
            tracing::debug!(user_id = %claims.sub, "Token subject no longer exists");
            return Err(AppError::Unauthorized);
        }
        Err(e) => return Err(e),
    };

    request.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(request).await)
}
