use anyhow::Result as AnyResult;
use async_trait::async_trait;
use crates::{
    domain::value_objects::payments::{
        CheckoutSession, CheckoutSessionRequest, ProductChanges, ProductDraft,
    },
    notifications::dispatcher::{Notification, NotificationDispatcher},
    payments::{polar_client::PolarClient, webhook_signature::WebhookHeaders},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_checkout_session(
        &self,
        request: CheckoutSessionRequest,
    ) -> AnyResult<CheckoutSession>;

    async fn create_product(&self, draft: ProductDraft) -> AnyResult<String>;

    async fn update_product(&self, product_id: String, changes: ProductChanges) -> AnyResult<()>;

    async fn archive_product(&self, product_id: String) -> AnyResult<()>;

    fn verify_webhook(&self, headers: &WebhookHeaders, payload: &[u8]) -> AnyResult<()>;
}

#[async_trait]
impl PaymentGateway for PolarClient {
    async fn create_checkout_session(
        &self,
        request: CheckoutSessionRequest,
    ) -> AnyResult<CheckoutSession> {
        self.create_checkout_session(request).await
    }

    async fn create_product(&self, draft: ProductDraft) -> AnyResult<String> {
        self.create_product(&draft).await
    }

    async fn update_product(&self, product_id: String, changes: ProductChanges) -> AnyResult<()> {
        self.update_product(&product_id, &changes).await
    }

    async fn archive_product(&self, product_id: String) -> AnyResult<()> {
        self.archive_product(&product_id).await
    }

    fn verify_webhook(&self, headers: &WebhookHeaders, payload: &[u8]) -> AnyResult<()> {
        self.verify_webhook(headers, payload)
    }
}

/// Detached notification submission. Implementations must not block or fail the caller.
#[cfg_attr(test, mockall::automock)]
pub trait NotificationQueue: Send + Sync {
    fn submit(&self, notification: Notification);
}

impl NotificationQueue for NotificationDispatcher {
    fn submit(&self, notification: Notification) {
        NotificationDispatcher::submit(self, notification)
    }
}
