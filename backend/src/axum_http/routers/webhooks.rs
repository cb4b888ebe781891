use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
};
use chrono::Utc;
use crates::{
    domain::repositories::{
        invoices::InvoiceRepository, members::MemberRepository,
        subscriptions::SubscriptionRepository, users::UserRepository,
    },
    payments::webhook_signature::{
        WEBHOOK_ID_HEADER, WEBHOOK_SIGNATURE_HEADER, WEBHOOK_TIMESTAMP_HEADER, WebhookHeaders,
    },
};
use tracing::warn;

use crate::{
    axum_http::error_responses::AppError,
    usecases::{
        checkout_completion::CheckoutCompletionUseCase,
        gateways::{NotificationQueue, PaymentGateway},
    },
};

pub fn routes<I, S, M, U, G, N>(usecase: Arc<CheckoutCompletionUseCase<I, S, M, U, G, N>>) -> Router
where
    I: InvoiceRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    M: MemberRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    G: PaymentGateway + 'static,
    N: NotificationQueue + 'static,
{
    Router::new()
        .route("/checkout", post(checkout_webhook::<I, S, M, U, G, N>))
        .with_state(usecase)
}

/// Unauthenticated; trust comes from the signature headers only.
pub async fn checkout_webhook<I, S, M, U, G, N>(
    State(usecase): State<Arc<CheckoutCompletionUseCase<I, S, M, U, G, N>>>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse
where
    I: InvoiceRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    M: MemberRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    G: PaymentGateway + 'static,
    N: NotificationQueue + 'static,
{
    let webhook_headers = match webhook_headers(&headers) {
        Some(parsed) => parsed,
        None => {
            warn!("webhooks: request without standard webhook headers");
            return AppError::Unauthorized("Missing webhook signature headers".to_string())
                .into_response();
        }
    };

    match usecase
        .handle_webhook(&body, &webhook_headers, Utc::now())
        .await
    {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

fn webhook_headers(headers: &HeaderMap) -> Option<WebhookHeaders> {
    let read = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };

    Some(WebhookHeaders {
        id: read(WEBHOOK_ID_HEADER)?,
        timestamp: read(WEBHOOK_TIMESTAMP_HEADER)?,
        signature: read(WEBHOOK_SIGNATURE_HEADER)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn all_three_headers_are_required() {
        let mut headers = HeaderMap::new();
        headers.insert(WEBHOOK_ID_HEADER, HeaderValue::from_static("msg_1"));
        headers.insert(WEBHOOK_TIMESTAMP_HEADER, HeaderValue::from_static("1700000000"));
        assert!(webhook_headers(&headers).is_none());

        headers.insert(WEBHOOK_SIGNATURE_HEADER, HeaderValue::from_static("v1,abc"));
        assert_eq!(
            webhook_headers(&headers),
            Some(WebhookHeaders {
                id: "msg_1".to_string(),
                timestamp: "1700000000".to_string(),
                signature: "v1,abc".to_string(),
            })
        );
    }
}
