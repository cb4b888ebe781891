use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use crates::domain::{
    repositories::plans::PlanRepository,
    value_objects::plans::{CreatePlanModel, PlanDto, UpdatePlanModel},
};
use tracing::info;
use uuid::Uuid;

use crate::{
    auth::{Admin, AuthUser, RequireRole},
    axum_http::error_responses::AppError,
    usecases::{gateways::PaymentGateway, plans::PlanUseCase},
};

pub fn routes<P, G>(usecase: Arc<PlanUseCase<P, G>>) -> Router
where
    P: PlanRepository + Send + Sync + 'static,
    G: PaymentGateway + 'static,
{
    Router::new()
        .route("/", post(create_plan::<P, G>))
        .route(
            "/:plan_id",
            get(get_plan::<P, G>)
                .patch(update_plan::<P, G>)
                .delete(archive_plan::<P, G>),
        )
        .with_state(usecase)
}

pub async fn get_plan<P, G>(
    State(usecase): State<Arc<PlanUseCase<P, G>>>,
    _auth: AuthUser,
    Path(plan_id): Path<Uuid>,
) -> impl IntoResponse
where
    P: PlanRepository + Send + Sync + 'static,
    G: PaymentGateway + 'static,
{
    match usecase.get_plan(plan_id).await {
        Ok(plan) => Json(PlanDto::from(plan)).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub async fn create_plan<P, G>(
    State(usecase): State<Arc<PlanUseCase<P, G>>>,
    RequireRole {
        user: AuthUser { user_id, .. },
        ..
    }: RequireRole<Admin>,
    Json(model): Json<CreatePlanModel>,
) -> impl IntoResponse
where
    P: PlanRepository + Send + Sync + 'static,
    G: PaymentGateway + 'static,
{
    info!(%user_id, "plans: create request received");
    match usecase.create_plan(model).await {
        Ok(plan) => (StatusCode::CREATED, Json(PlanDto::from(plan))).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub async fn update_plan<P, G>(
    State(usecase): State<Arc<PlanUseCase<P, G>>>,
    RequireRole {
        user: AuthUser { user_id, .. },
        ..
    }: RequireRole<Admin>,
    Path(plan_id): Path<Uuid>,
    Json(model): Json<UpdatePlanModel>,
) -> impl IntoResponse
where
    P: PlanRepository + Send + Sync + 'static,
    G: PaymentGateway + 'static,
{
    info!(%user_id, %plan_id, "plans: update request received");
    match usecase.update_plan(plan_id, model).await {
        Ok(plan) => Json(PlanDto::from(plan)).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub async fn archive_plan<P, G>(
    State(usecase): State<Arc<PlanUseCase<P, G>>>,
    RequireRole {
        user: AuthUser { user_id, .. },
        ..
    }: RequireRole<Admin>,
    Path(plan_id): Path<Uuid>,
) -> impl IntoResponse
where
    P: PlanRepository + Send + Sync + 'static,
    G: PaymentGateway + 'static,
{
    info!(%user_id, %plan_id, "plans: archive request received");
    match usecase.archive_plan(plan_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::tokens::{TokenIssuer, TokenSubject},
        usecases::{fixtures::sample_plan, gateways::MockPaymentGateway, plan_cache::PlanCache},
    };
    use axum::{
        Extension,
        body::Body,
        http::{Request, header::AUTHORIZATION},
    };
    use chrono::Utc;
    use crates::domain::repositories::plans::MockPlanRepository;
    use tower::ServiceExt;

    const SECRET: &str = "plan-router-test-secret-with-bytes";

    fn router(plan_repo: MockPlanRepository, gateway: MockPaymentGateway) -> Router {
        let usecase = PlanUseCase::new(
            Arc::new(plan_repo),
            Arc::new(gateway),
            Arc::new(PlanCache::default()),
        );
        routes(Arc::new(usecase)).layer(Extension(Arc::new(TokenIssuer::new(SECRET))))
    }

    fn bearer(role: &str) -> String {
        let subject = TokenSubject {
            user_id: Uuid::new_v4(),
            email: "someone@example.com".to_string(),
            role: role.to_string(),
        };
        let token = TokenIssuer::new(SECRET)
            .issue_access(&subject, Utc::now())
            .unwrap()
            .token;
        format!("Bearer {}", token)
    }

    fn request(method: &str, uri: &str, role: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(AUTHORIZATION, bearer(role))
            .header("content-type", "application/json")
            .body(Body::from(
                r#"{"organization_id":"00000000-0000-0000-0000-000000000001","name":"Monthly","price_minor":2000,"duration_days":30}"#,
            ))
            .unwrap()
    }

    #[tokio::test]
    async fn only_admins_change_the_catalog() {
        for role in ["member", "staff"] {
            let mut plan_repo = MockPlanRepository::new();
            plan_repo.expect_create().never();
            plan_repo.expect_deactivate().never();
            let mut gateway = MockPaymentGateway::new();
            gateway.expect_create_product().never();
            gateway.expect_archive_product().never();
            let router = router(plan_repo, gateway);

            let response = router
                .clone()
                .oneshot(request("POST", "/", role))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::FORBIDDEN, "{role} create");

            let response = router
                .oneshot(request("DELETE", &format!("/{}", Uuid::new_v4()), role))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::FORBIDDEN, "{role} archive");
        }
    }

    #[tokio::test]
    async fn any_signed_in_user_reads_a_plan() {
        let mut plan_repo = MockPlanRepository::new();
        plan_repo.expect_find_by_id().times(1).returning(|plan_id| {
            Box::pin(async move { Ok(Some(sample_plan(plan_id, 2000))) })
        });

        let response = router(plan_repo, MockPaymentGateway::new())
            .oneshot(request("GET", &format!("/{}", Uuid::new_v4()), "member"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
