use std::sync::Arc;

use chrono::{DateTime, Utc};
use crates::domain::{entities::users::UserEntity, repositories::users::UserRepository};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};

use uuid::Uuid;

use crate::auth::{
    passwords::{spawn_hash_password, spawn_verify_password},
    tokens::{IssuedToken, TokenIssuer, TokenSubject},
};

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("invalid or expired token")]
    InvalidToken,
    #[error("invalid new password: {0}")]
    InvalidNewPassword(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            AuthError::InvalidCredentials | AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
            AuthError::InvalidNewPassword(_) => StatusCode::BAD_REQUEST,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type AuthResult<T> = std::result::Result<T, AuthError>;

#[derive(Debug, Clone, Serialize)]
pub struct TokenPairDto {
    pub access_token: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_token: String,
    pub refresh_expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccessTokenDto {
    pub access_token: String,
    pub access_expires_at: DateTime<Utc>,
}

impl From<IssuedToken> for AccessTokenDto {
    fn from(value: IssuedToken) -> Self {
        Self {
            access_token: value.token,
            access_expires_at: value.expires_at,
        }
    }
}

pub struct AuthUseCase<U>
where
    U: UserRepository + Send + Sync + 'static,
{
    user_repo: Arc<U>,
    token_issuer: Arc<TokenIssuer>,
}

impl<U> AuthUseCase<U>
where
    U: UserRepository + Send + Sync + 'static,
{
    pub fn new(user_repo: Arc<U>, token_issuer: Arc<TokenIssuer>) -> Self {
        Self {
            user_repo,
            token_issuer,
        }
    }

    pub async fn sign_in(
        &self,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> AuthResult<TokenPairDto> {
        let email = email.trim().to_lowercase();

        let user = self
            .user_repo
            .find_by_email(email.clone())
            .await
            .map_err(|err| {
                error!(db_error = ?err, "auth: failed to look up user");
                AuthError::Internal(err)
            })?
            .ok_or_else(|| {
                warn!("auth: sign-in for unknown email");
                AuthError::InvalidCredentials
            })?;

        // Accounts are provisioned with a password only after their first payment.
        let Some(password_hash) = user.password_hash.as_deref() else {
            warn!(user_id = %user.id, "auth: sign-in for account without credentials");
            return Err(AuthError::InvalidCredentials);
        };

        if !spawn_verify_password(password.to_string(), password_hash.to_string()).await? {
            warn!(user_id = %user.id, "auth: password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let subject = subject(&user);
        let access = self.token_issuer.issue_access(&subject, now)?;
        let refresh = self.token_issuer.issue_refresh(&subject, now)?;

        info!(user_id = %user.id, "auth: signed in");

        Ok(TokenPairDto {
            access_token: access.token,
            access_expires_at: access.expires_at,
            refresh_token: refresh.token,
            refresh_expires_at: refresh.expires_at,
        })
    }

    pub async fn refresh(&self, refresh_token: &str, now: DateTime<Utc>) -> AuthResult<AccessTokenDto> {
        let claims = self.token_issuer.validate_refresh(refresh_token).map_err(|err| {
            warn!(error = %err, "auth: refresh token rejected");
            AuthError::InvalidToken
        })?;

        // Reload so a removed account or changed role takes effect.
        let user = self
            .user_repo
            .find_by_id(claims.id)
            .await
            .map_err(|err| {
                error!(user_id = %claims.id, db_error = ?err, "auth: failed to load user");
                AuthError::Internal(err)
            })?
            .ok_or(AuthError::InvalidToken)?;

        let access = self.token_issuer.issue_access(&subject(&user), now)?;
        Ok(access.into())
    }

    /// Replaces the emailed temporary password (or any current one) after re-checking it.
    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> AuthResult<()> {
        if new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::InvalidNewPassword(format!(
                "must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        if new_password == current_password {
            return Err(AuthError::InvalidNewPassword(
                "must differ from the current password".to_string(),
            ));
        }

        let user = self
            .user_repo
            .find_by_id(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "auth: failed to load user");
                AuthError::Internal(err)
            })?
            .ok_or(AuthError::InvalidCredentials)?;

        let Some(password_hash) = user.password_hash else {
            warn!(%user_id, "auth: password change for account without credentials");
            return Err(AuthError::InvalidCredentials);
        };

        if !spawn_verify_password(current_password.to_string(), password_hash).await? {
            warn!(%user_id, "auth: password change with wrong current password");
            return Err(AuthError::InvalidCredentials);
        }

        let new_hash = spawn_hash_password(new_password.to_string()).await?;
        self.user_repo
            .update_password_hash(user_id, new_hash)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "auth: failed to store new password");
                AuthError::Internal(err)
            })?;

        info!(%user_id, "auth: password changed");
        Ok(())
    }
}

fn subject(user: &UserEntity) -> TokenSubject {
    TokenSubject {
        user_id: user.id,
        email: user.email.clone(),
        role: user.role.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::passwords::{hash_password, verify_password},
        usecases::fixtures::sample_user,
    };
    use crates::domain::repositories::users::MockUserRepository;
    use std::sync::Mutex;

    const SECRET: &str = "auth-usecase-test-secret-long-enough";

    fn usecase(users: MockUserRepository) -> (AuthUseCase<MockUserRepository>, Arc<TokenIssuer>) {
        let issuer = Arc::new(TokenIssuer::new(SECRET));
        (AuthUseCase::new(Arc::new(users), Arc::clone(&issuer)), issuer)
    }

    #[tokio::test]
    async fn sign_in_issues_access_and_refresh() {
        let user_id = Uuid::new_v4();
        let hash = hash_password("Secret123abc").unwrap();

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .withf(|email| email == "ann@example.com")
            .returning(move |_| {
                let user = sample_user(user_id, "ann@example.com", Some(hash.clone()));
                Box::pin(async move { Ok(Some(user)) })
            });

        let (usecase, issuer) = usecase(users);
        let pair = usecase
            .sign_in("Ann@Example.com", "Secret123abc", Utc::now())
            .await
            .unwrap();

        assert_eq!(issuer.validate_access(&pair.access_token).unwrap().id, user_id);
        assert_eq!(issuer.validate_refresh(&pair.refresh_token).unwrap().id, user_id);
        assert!(issuer.validate_access(&pair.refresh_token).is_err());
    }

    #[tokio::test]
    async fn unprovisioned_account_cannot_sign_in() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|_| {
            Box::pin(async { Ok(Some(sample_user(Uuid::new_v4(), "ann@example.com", None))) })
        });

        let (usecase, _) = usecase(users);
        let err = usecase
            .sign_in("ann@example.com", "anything", Utc::now())
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let hash = hash_password("Secret123abc").unwrap();
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(move |email| {
            let user = (email == "ann@example.com")
                .then(|| sample_user(Uuid::new_v4(), "ann@example.com", Some(hash.clone())));
            Box::pin(async move { Ok(user) })
        });

        let (usecase, _) = usecase(users);
        let wrong = usecase
            .sign_in("ann@example.com", "Wrong123abc", Utc::now())
            .await
            .unwrap_err();
        let unknown = usecase
            .sign_in("bob@example.com", "Secret123abc", Utc::now())
            .await
            .unwrap_err();

        assert_eq!(wrong.to_string(), unknown.to_string());
        assert_eq!(wrong.status_code(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn refresh_rejects_access_tokens() {
        let user = sample_user(Uuid::new_v4(), "ann@example.com", None);
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().never();

        let (usecase, issuer) = usecase(users);
        let access = issuer.issue_access(&subject(&user), Utc::now()).unwrap();

        let err = usecase.refresh(&access.token, Utc::now()).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn refresh_issues_new_access_token() {
        let user = sample_user(Uuid::new_v4(), "ann@example.com", None);
        let stored = user.clone();
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().returning(move |_| {
            let user = stored.clone();
            Box::pin(async move { Ok(Some(user)) })
        });

        let (usecase, issuer) = usecase(users);
        let refresh = issuer.issue_refresh(&subject(&user), Utc::now()).unwrap();

        let access = usecase.refresh(&refresh.token, Utc::now()).await.unwrap();
        assert_eq!(issuer.validate_access(&access.access_token).unwrap().email, "ann@example.com");
    }

    #[tokio::test]
    async fn change_password_replaces_hash_after_checking_current() {
        let user_id = Uuid::new_v4();
        let stored = Arc::new(Mutex::new(hash_password("Temp12345678").unwrap()));

        let mut users = MockUserRepository::new();
        let current = Arc::clone(&stored);
        users.expect_find_by_id().returning(move |id| {
            let hash = current.lock().unwrap().clone();
            Box::pin(async move { Ok(Some(sample_user(id, "ann@example.com", Some(hash)))) })
        });
        let current = Arc::clone(&stored);
        users
            .expect_update_password_hash()
            .times(1)
            .returning(move |_, hash| {
                *current.lock().unwrap() = hash;
                Box::pin(async { Ok(()) })
            });

        let (usecase, _) = usecase(users);
        usecase
            .change_password(user_id, "Temp12345678", "NewSecret99")
            .await
            .unwrap();

        let hash = stored.lock().unwrap().clone();
        assert!(verify_password("NewSecret99", &hash).unwrap());
        assert!(!verify_password("Temp12345678", &hash).unwrap());
    }

    #[tokio::test]
    async fn change_password_with_wrong_current_password_keeps_hash() {
        let hash = hash_password("Temp12345678").unwrap();
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().returning(move |id| {
            let user = sample_user(id, "ann@example.com", Some(hash.clone()));
            Box::pin(async move { Ok(Some(user)) })
        });
        users.expect_update_password_hash().never();

        let (usecase, _) = usecase(users);
        let err = usecase
            .change_password(Uuid::new_v4(), "Wrong1234567", "NewSecret99")
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn short_new_password_is_rejected_before_lookup() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().never();

        let (usecase, _) = usecase(users);
        let err = usecase
            .change_password(Uuid::new_v4(), "Temp12345678", "short")
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::InvalidNewPassword(_)));
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }
}
