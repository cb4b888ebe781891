use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use chrono::Utc;
use crates::domain::{
    repositories::{
        invoices::InvoiceRepository, members::MemberRepository, plans::PlanRepository,
        subscriptions::SubscriptionRepository, users::UserRepository,
    },
    value_objects::subscriptions::{CreateSubscriptionModel, RenewSubscriptionModel},
};
use tracing::info;
use uuid::Uuid;

use crate::{
    auth::{AuthUser, RequireRole, Staff},
    axum_http::error_responses::AppError,
    usecases::{
        gateways::{NotificationQueue, PaymentGateway},
        subscriptions::SubscriptionUseCase,
    },
};

pub fn routes<S, I, M, U, P, G, N>(usecase: Arc<SubscriptionUseCase<S, I, M, U, P, G, N>>) -> Router
where
    S: SubscriptionRepository + Send + Sync + 'static,
    I: InvoiceRepository + Send + Sync + 'static,
    M: MemberRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    G: PaymentGateway + 'static,
    N: NotificationQueue + 'static,
{
    Router::new()
        .route("/", post(create_subscription::<S, I, M, U, P, G, N>))
        .route(
            "/members/:member_id/renew",
            post(renew_subscription::<S, I, M, U, P, G, N>),
        )
        .with_state(usecase)
}

pub async fn create_subscription<S, I, M, U, P, G, N>(
    State(usecase): State<Arc<SubscriptionUseCase<S, I, M, U, P, G, N>>>,
    RequireRole {
        user: AuthUser { user_id, .. },
        ..
    }: RequireRole<Staff>,
    Json(model): Json<CreateSubscriptionModel>,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync + 'static,
    I: InvoiceRepository + Send + Sync + 'static,
    M: MemberRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    G: PaymentGateway + 'static,
    N: NotificationQueue + 'static,
{
    info!(%user_id, member_id = %model.member_id, "subscriptions: create request received");
    match usecase.create_subscription(model).await {
        Ok(started) => (StatusCode::CREATED, Json(started)).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub async fn renew_subscription<S, I, M, U, P, G, N>(
    State(usecase): State<Arc<SubscriptionUseCase<S, I, M, U, P, G, N>>>,
    RequireRole {
        user: AuthUser { user_id, .. },
        ..
    }: RequireRole<Staff>,
    Path(member_id): Path<Uuid>,
    body: Option<Json<RenewSubscriptionModel>>,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync + 'static,
    I: InvoiceRepository + Send + Sync + 'static,
    M: MemberRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    G: PaymentGateway + 'static,
    N: NotificationQueue + 'static,
{
    info!(%user_id, %member_id, "subscriptions: renew request received");
    let model = body.map(|Json(model)| model).unwrap_or_default();
    let today = Utc::now().date_naive();

    match usecase.renew_subscription(member_id, model, today).await {
        Ok(renewed) => (StatusCode::CREATED, Json(renewed)).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}
