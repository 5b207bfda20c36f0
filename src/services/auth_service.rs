//! Authentication service - login and token verification.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::{Config, SECONDS_PER_HOUR, TOKEN_TYPE_BEARER};
use crate::domain::{HashedPassword, User};
use crate::errors::{AppError, AppResult};
use crate::infra::UserRepository;

/// Verified against when the email is unknown, so both paths cost one Argon2 run.
const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$ZHVtbXlzYWx0MTIzNDU2Nw$ZHVtbXloYXNoLWR1bW15aGFzaC1kdW1teWhhc2gtMzI";

/// JWT claims payload
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub exp: i64,
    pub iat: i64,
}

/// Token response returned after successful authentication
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    /// Seconds until expiry
    pub expires_in: i64,
}

/// Authentication service trait for dependency injection.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Check credentials and issue a token.
    async fn login(&self, email: String, password: String) -> AppResult<TokenResponse>;

    /// Verify a token and return its claims.
    fn verify_token(&self, token: &str) -> AppResult<Claims>;
}

/// [`AuthService`] issuing HS256 JWTs.
pub struct Authenticator {
    users: Arc<dyn UserRepository>,
    config: Config,
}

impl Authenticator {
    pub fn new(users: Arc<dyn UserRepository>, config: Config) -> Self {
        Self { users, config }
    }

    fn issue_token(&self, user: &User) -> AppResult<TokenResponse> {
        let now = Utc::now();
        let expires_at = now + Duration::hours(self.config.jwt_expiration_hours);

        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
        };

        let access_token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret_bytes()),
        )?;

        Ok(TokenResponse {
            access_token,
            token_type: TOKEN_TYPE_BEARER.to_string(),
            expires_in: self.config.jwt_expiration_hours * SECONDS_PER_HOUR,
        })
    }
}

#[async_trait]
impl AuthService for Authenticator {
    async fn login(&self, email: String, password: String) -> AppResult<TokenResponse> {
        let user = self.users.find_by_email(&email).await?;

        let stored = HashedPassword::from_stored(
            user.as_ref()
                .map(|u| u.password_hash.as_str())
                .unwrap_or(DUMMY_HASH),
        );
        let password_valid = stored.verify(&password);

        match user {
            Some(user) if password_valid => {
                tracing::debug!(user_id = %user.id, "Login succeeded");
                self.issue_token(&user)
            }
            _ => Err(AppError::InvalidCredentials),
        }
    }

    fn verify_token(&self, token: &str) -> AppResult<Claims> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret_bytes()),
            &Validation::default(),
        )?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::MockUserRepository;

    fn config() -> Config {
        Config::new("postgres://localhost/test", "unit-test-secret-that-is-32-chars!").unwrap()
    }

    fn stored_user(password: &str) -> User {
        User {
            id: Uuid::new_v4(),
            email: "ada@example.com".to_string(),
            password_hash: HashedPassword::hash(password).unwrap().into_string(),
            name: "Ada".to_string(),
        }
    }

    #[tokio::test]
    async fn login_issues_verifiable_token() {
        let user = stored_user("correct-password");
        let user_id = user.id;
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));
        let auth = Authenticator::new(Arc::new(repo), config());

        let token = auth
            .login("ada@example.com".to_string(), "correct-password".to_string())
            .await
            .unwrap();

        assert_eq!(token.token_type, "Bearer");
        assert_eq!(token.expires_in, 24 * 3600);
        let claims = auth.verify_token(&token.access_token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert!(claims.exp > claims.iat);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let user = stored_user("correct-password");
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email()
            .returning(move |email| Ok((email == "ada@example.com").then(|| user.clone())));
        let auth = Authenticator::new(Arc::new(repo), config());

        let wrong_password = auth
            .login("ada@example.com".to_string(), "wrong-password".to_string())
            .await;
        let unknown_email = auth
            .login("bob@example.com".to_string(), "correct-password".to_string())
            .await;

        assert!(matches!(wrong_password, Err(AppError::InvalidCredentials)));
        assert!(matches!(unknown_email, Err(AppError::InvalidCredentials)));
    }

    #[test]
    fn tampered_token_is_rejected() {
        let auth = Authenticator::new(Arc::new(MockUserRepository::new()), config());

        assert!(matches!(
            auth.verify_token("not.a.token"),
            Err(AppError::Jwt(_))
        ));
    }
}
