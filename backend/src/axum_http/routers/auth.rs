use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use chrono::Utc;
use crates::domain::repositories::users::UserRepository;
use serde::Deserialize;

use crate::{
    auth::AuthUser, axum_http::error_responses::AppError, usecases::auth::AuthUseCase,
};

#[derive(Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

pub fn routes<U>(usecase: Arc<AuthUseCase<U>>) -> Router
where
    U: UserRepository + Send + Sync + 'static,
{
    Router::new()
        .route("/sign-in", post(sign_in::<U>))
        .route("/refresh", post(refresh::<U>))
        .route("/change-password", post(change_password::<U>))
        .with_state(usecase)
}

pub async fn sign_in<U>(
    State(usecase): State<Arc<AuthUseCase<U>>>,
    Json(request): Json<SignInRequest>,
) -> impl IntoResponse
where
    U: UserRepository + Send + Sync + 'static,
{
    match usecase
        .sign_in(&request.email, &request.password, Utc::now())
        .await
    {
        Ok(tokens) => Json(tokens).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub async fn refresh<U>(
    State(usecase): State<Arc<AuthUseCase<U>>>,
    Json(request): Json<RefreshRequest>,
) -> impl IntoResponse
where
    U: UserRepository + Send + Sync + 'static,
{
    match usecase.refresh(&request.refresh_token, Utc::now()).await {
        Ok(token) => Json(token).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub async fn change_password<U>(
    State(usecase): State<Arc<AuthUseCase<U>>>,
    auth_user: AuthUser,
    Json(request): Json<ChangePasswordRequest>,
) -> impl IntoResponse
where
    U: UserRepository + Send + Sync + 'static,
{
    match usecase
        .change_password(
            auth_user.user_id,
            &request.current_password,
            &request.new_password,
        )
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}
