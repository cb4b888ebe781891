use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::post,
};
use chrono::Utc;
use crates::domain::value_objects::subscriptions::ExpirySweepDto;
use tracing::{error, info};

use crate::usecases::subscriptions::ExpirySweeper;

// Run example
//   curl -X POST "http://localhost:$SERVER_PORT_BACKEND/internal/v1/subscriptions/expire" \
//     -H "Authorization: Bearer $INTERNAL_SWEEP_TOKEN"

#[derive(Clone)]
pub struct InternalRouteState {
    internal_token: Option<String>,
    sweeper: Arc<dyn ExpirySweeper>,
}

pub fn routes(internal_token: Option<String>, sweeper: Arc<dyn ExpirySweeper>) -> Router {
    Router::new()
        .route("/subscriptions/expire", post(expire_subscriptions))
        .with_state(InternalRouteState {
            internal_token,
            sweeper,
        })
}

pub async fn expire_subscriptions(
    State(state): State<InternalRouteState>,
    headers: HeaderMap,
) -> Response {
    let expected_token = match state.internal_token.as_deref() {
        Some(token) => token,
        None => {
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                "sweep token is not configured",
            )
                .into_response();
        }
    };

    if let Err(status) = authorize_bearer(&headers, expected_token) {
        return (status, "unauthorized").into_response();
    }

    let today = Utc::now().date_naive();
    match state.sweeper.expire_old_subscriptions(today).await {
        Ok(expired) => {
            info!(expired, "internal: manual expiry sweep finished");
            Json(ExpirySweepDto { expired }).into_response()
        }
        Err(err) => {
            error!(error = ?err, "internal: manual expiry sweep failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "sweep failed").into_response()
        }
    }
}

fn authorize_bearer(headers: &HeaderMap, expected_token: &str) -> Result<(), StatusCode> {
    let auth = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = auth
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if token == expected_token {
        Ok(())
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::subscriptions::MockExpirySweeper;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    fn router(sweeper: MockExpirySweeper) -> Router {
        routes(Some("sweep-secret".to_string()), Arc::new(sweeper))
    }

    fn request(authorization: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/subscriptions/expire");
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn wrong_token_does_not_sweep() {
        let mut sweeper = MockExpirySweeper::new();
        sweeper.expect_expire_old_subscriptions().never();

        let response = router(sweeper)
            .oneshot(request(Some("Bearer nope")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn valid_token_runs_sweep() {
        let mut sweeper = MockExpirySweeper::new();
        sweeper
            .expect_expire_old_subscriptions()
            .times(1)
            .returning(|_| Ok(3));

        let response = router(sweeper)
            .oneshot(request(Some("Bearer sweep-secret")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
