pub mod passwords;
pub mod tokens;

use std::{marker::PhantomData, sync::Arc};

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};
use tracing::warn;
use uuid::Uuid;

use tokens::{TokenError, TokenIssuer};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: String,
}

pub fn bearer_token(parts: &Parts) -> Result<&str, (StatusCode, String)> {
    let auth_header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or((
            StatusCode::UNAUTHORIZED,
            "Missing Authorization header".to_string(),
        ))?;

    let auth_str = auth_header.to_str().map_err(|_| {
        (
            StatusCode::UNAUTHORIZED,
            "Invalid Authorization header".to_string(),
        )
    })?;

    auth_str.strip_prefix("Bearer ").ok_or((
        StatusCode::UNAUTHORIZED,
        "Invalid Authorization header format".to_string(),
    ))
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Installed as an Extension layer by http_serve.
        let issuer = parts
            .extensions
            .get::<Arc<TokenIssuer>>()
            .cloned()
            .ok_or((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Token issuer is not configured".to_string(),
            ))?;

        let token = bearer_token(parts)?;

        let claims = issuer.validate_access(token).map_err(|err| {
            let message = match err {
                TokenError::Expired => "Access token expired",
                TokenError::Invalid => "Invalid access token",
            };
            (StatusCode::UNAUTHORIZED, message.to_string())
        })?;

        Ok(AuthUser {
            user_id: claims.id,
            email: claims.email,
            role: claims.role,
        })
    }
}

/// A set of account roles allowed through a [`RequireRole`] gate.
pub trait RoleGroup {
    const ALLOWED: &'static [&'static str];
}

/// Front-desk operations: scanning, onboarding, selling subscriptions.
pub struct Staff;

/// Catalog management.
pub struct Admin;

/// Self-service endpoints for the signed-in member.
pub struct Member;

impl RoleGroup for Staff {
    const ALLOWED: &'static [&'static str] = &["super_admin", "admin", "staff"];
}

impl RoleGroup for Admin {
    const ALLOWED: &'static [&'static str] = &["super_admin", "admin"];
}

impl RoleGroup for Member {
    const ALLOWED: &'static [&'static str] = &["member"];
}

/// An [`AuthUser`] whose role belongs to `R`; anyone else gets 403.
pub struct RequireRole<R> {
    pub user: AuthUser,
    group: PhantomData<fn() -> R>,
}

#[async_trait]
impl<S, R> FromRequestParts<S> for RequireRole<R>
where
    S: Send + Sync,
    R: RoleGroup + 'static,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;

        if !R::ALLOWED.contains(&user.role.as_str()) {
            warn!(user_id = %user.user_id, role = %user.role, path = %parts.uri.path(), "auth: role not permitted");
            return Err((
                StatusCode::FORBIDDEN,
                "Insufficient permissions".to_string(),
            ));
        }

        Ok(RequireRole {
            user,
            group: PhantomData,
        })
    }
}
