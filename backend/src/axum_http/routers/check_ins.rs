use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use crates::domain::repositories::{
    check_ins::CheckInRepository, members::MemberRepository,
    subscriptions::SubscriptionRepository,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{
    auth::{AuthUser, RequireRole, Staff},
    axum_http::error_responses::AppError,
    usecases::check_ins::CheckInUseCase,
};

#[derive(Deserialize)]
pub struct ScanRequest {
    pub token: String,
}

#[derive(Serialize)]
pub struct VisitorCountResponse {
    pub branch_id: Uuid,
    pub visitors: i64,
}

pub fn routes<C, S, M>(usecase: Arc<CheckInUseCase<C, S, M>>) -> Router
where
    C: CheckInRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    M: MemberRepository + Send + Sync + 'static,
{
    Router::new()
        .route("/scan", post(scan::<C, S, M>))
        .route("/branches/:branch_id/sessions", get(branch_sessions::<C, S, M>))
        .route("/branches/:branch_id/visitors", get(visitor_count::<C, S, M>))
        .with_state(usecase)
}

/// Called by the front-desk scanner with the member's displayed code.
pub async fn scan<C, S, M>(
    State(usecase): State<Arc<CheckInUseCase<C, S, M>>>,
    RequireRole {
        user: AuthUser { user_id, .. },
        ..
    }: RequireRole<Staff>,
    Json(request): Json<ScanRequest>,
) -> impl IntoResponse
where
    C: CheckInRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    M: MemberRepository + Send + Sync + 'static,
{
    info!(scanner_id = %user_id, "check_ins: scan request received");
    match usecase.scan(&request.token, Utc::now()).await {
        Ok(outcome) => Json(outcome).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub async fn branch_sessions<C, S, M>(
    State(usecase): State<Arc<CheckInUseCase<C, S, M>>>,
    _staff: RequireRole<Staff>,
    Path(branch_id): Path<Uuid>,
) -> impl IntoResponse
where
    C: CheckInRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    M: MemberRepository + Send + Sync + 'static,
{
    match usecase.branch_sessions(branch_id).await {
        Ok(visits) => Json(visits).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub async fn visitor_count<C, S, M>(
    State(usecase): State<Arc<CheckInUseCase<C, S, M>>>,
    _auth: AuthUser,
    Path(branch_id): Path<Uuid>,
) -> impl IntoResponse
where
    C: CheckInRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    M: MemberRepository + Send + Sync + 'static,
{
    match usecase.visitor_count(branch_id).await {
        Ok(visitors) => Json(VisitorCountResponse {
            branch_id,
            visitors,
        })
        .into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}
