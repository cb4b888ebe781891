use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{NaiveDate, Utc};
use crates::domain::{
    repositories::{
        check_ins::CheckInRepository, members::MemberRepository,
        subscriptions::SubscriptionRepository, users::UserRepository,
    },
    value_objects::members::CreateMemberModel,
};
use serde::Deserialize;
use tracing::info;

use crate::{
    auth::{AuthUser, Member, RequireRole, Staff},
    axum_http::error_responses::AppError,
    usecases::{check_ins::CheckInUseCase, members::MemberUseCase, subscriptions::CheckoutStarter},
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

pub fn routes<M, U, C, CI, S>(
    members_usecase: Arc<MemberUseCase<M, U, C>>,
    check_ins_usecase: Arc<CheckInUseCase<CI, S, M>>,
) -> Router
where
    M: MemberRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    C: CheckoutStarter + 'static,
    CI: CheckInRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
{
    let onboarding = Router::new()
        .route("/", post(create_member::<M, U, C>))
        .with_state(members_usecase);

    let qr = Router::new()
        .route("/me/qr", get(member_qr::<CI, S, M>))
        .route("/me/attendance", get(member_attendance::<CI, S, M>))
        .with_state(check_ins_usecase);

    onboarding.merge(qr)
}

pub async fn create_member<M, U, C>(
    State(usecase): State<Arc<MemberUseCase<M, U, C>>>,
    RequireRole {
        user: AuthUser { user_id, .. },
        ..
    }: RequireRole<Staff>,
    Json(model): Json<CreateMemberModel>,
) -> impl IntoResponse
where
    M: MemberRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    C: CheckoutStarter + 'static,
{
    info!(%user_id, organization_id = %model.organization_id, "members: create request received");
    match usecase.create_member(model).await {
        Ok(created) => (StatusCode::CREATED, Json(created)).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub async fn member_qr<CI, S, M>(
    State(usecase): State<Arc<CheckInUseCase<CI, S, M>>>,
    RequireRole {
        user: AuthUser { user_id, .. },
        ..
    }: RequireRole<Member>,
) -> impl IntoResponse
where
    CI: CheckInRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    M: MemberRepository + Send + Sync + 'static,
{
    match usecase.issue_qr_token(user_id, Utc::now()).await {
        Ok(qr) => Json(qr).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub async fn member_attendance<CI, S, M>(
    State(usecase): State<Arc<CheckInUseCase<CI, S, M>>>,
    RequireRole {
        user: AuthUser { user_id, .. },
        ..
    }: RequireRole<Member>,
    Query(query): Query<AttendanceQuery>,
) -> impl IntoResponse
where
    CI: CheckInRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    M: MemberRepository + Send + Sync + 'static,
{
    match usecase
        .attendance(user_id, query.start_date, query.end_date)
        .await
    {
        Ok(days) => Json(days).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}
