use std::sync::Arc;

use chrono::{DateTime, Utc};
use crates::{
    domain::{
        repositories::{
            invoices::InvoiceRepository, members::MemberRepository,
            subscriptions::SubscriptionRepository, users::UserRepository,
        },
        value_objects::{
            enums::{
                invoice_statuses::InvoiceStatus, member_statuses::MemberStatus,
                payment_types::PaymentType, subscription_statuses::SubscriptionStatus,
            },
            payments::CheckoutWebhookEvent,
        },
    },
    notifications::dispatcher::Notification,
    payments::{polar_client::PolarClient, webhook_signature::WebhookHeaders},
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    auth::passwords::{generate_temporary_password, spawn_hash_password},
    usecases::gateways::{NotificationQueue, PaymentGateway},
};

const SUCCEEDED_STATUS: &str = "succeeded";

#[derive(Debug, Error)]
pub enum CheckoutCompletionError {
    #[error("invalid webhook signature")]
    InvalidSignature,
    #[error("invalid webhook payload: {0}")]
    InvalidWebhook(String),
    #[error("checkout metadata has no payment_type")]
    MissingPaymentType,
    #[error("no invoice for checkout {0}")]
    InvoiceNotFound(Uuid),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CheckoutCompletionError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            CheckoutCompletionError::InvalidSignature => StatusCode::UNAUTHORIZED,
            CheckoutCompletionError::InvalidWebhook(_)
            | CheckoutCompletionError::MissingPaymentType => StatusCode::BAD_REQUEST,
            CheckoutCompletionError::InvoiceNotFound(_) => StatusCode::NOT_FOUND,
            CheckoutCompletionError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type CompletionResult<T> = std::result::Result<T, CheckoutCompletionError>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CheckoutCompletion {
    Ignored {
        status: String,
    },
    AlreadyProcessed {
        invoice_id: Uuid,
    },
    Completed {
        invoice_id: Uuid,
        subscription_id: Option<Uuid>,
        member_id: Uuid,
        credentials_provisioned: bool,
    },
}

/// Applies a successful checkout exactly once: invoice paid, subscription and member
/// activated, and first-time purchasers provisioned with credentials.
pub struct CheckoutCompletionUseCase<I, S, M, U, G, N>
where
    I: InvoiceRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    M: MemberRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    G: PaymentGateway + 'static,
    N: NotificationQueue + 'static,
{
    invoice_repo: Arc<I>,
    subscription_repo: Arc<S>,
    member_repo: Arc<M>,
    user_repo: Arc<U>,
    payment_gateway: Arc<G>,
    notifications: Arc<N>,
    login_url: String,
}

impl<I, S, M, U, G, N> CheckoutCompletionUseCase<I, S, M, U, G, N>
where
    I: InvoiceRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    M: MemberRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    G: PaymentGateway + 'static,
    N: NotificationQueue + 'static,
{
    pub fn new(
        invoice_repo: Arc<I>,
        subscription_repo: Arc<S>,
        member_repo: Arc<M>,
        user_repo: Arc<U>,
        payment_gateway: Arc<G>,
        notifications: Arc<N>,
        login_url: String,
    ) -> Self {
        Self {
            invoice_repo,
            subscription_repo,
            member_repo,
            user_repo,
            payment_gateway,
            notifications,
            login_url,
        }
    }

    pub async fn handle_webhook(
        &self,
        payload: &[u8],
        headers: &WebhookHeaders,
        now: DateTime<Utc>,
    ) -> CompletionResult<CheckoutCompletion> {
        if let Err(err) = self.payment_gateway.verify_webhook(headers, payload) {
            warn!(
                webhook_id = %headers.id,
                error = %err,
                "checkout: rejected webhook with invalid signature"
            );
            return Err(CheckoutCompletionError::InvalidSignature);
        }

        let event = PolarClient::parse_checkout_event(payload).map_err(|err| {
            warn!(webhook_id = %headers.id, error = ?err, "checkout: malformed webhook payload");
            CheckoutCompletionError::InvalidWebhook(err.to_string())
        })?;

        info!(
            webhook_id = %headers.id,
            event_type = %event.type_,
            checkout_id = %event.data.id,
            status = %event.data.status,
            "checkout: webhook received"
        );

        self.complete_checkout(event, now).await
    }

    pub async fn complete_checkout(
        &self,
        event: CheckoutWebhookEvent,
        now: DateTime<Utc>,
    ) -> CompletionResult<CheckoutCompletion> {
        let data = event.data;
        if data.status != SUCCEEDED_STATUS {
            info!(
                checkout_id = %data.id,
                status = %data.status,
                "checkout: status is not succeeded, ignoring"
            );
            return Ok(CheckoutCompletion::Ignored {
                status: data.status,
            });
        }

        let external_id = Uuid::parse_str(&data.id).map_err(|_| {
            warn!(checkout_id = %data.id, "checkout: checkout id is not a uuid");
            CheckoutCompletionError::InvalidWebhook(format!(
                "checkout id is not a uuid: {}",
                data.id
            ))
        })?;

        let invoice = self
            .invoice_repo
            .find_by_external_id(external_id)
            .await
            .map_err(|err| {
                error!(%external_id, db_error = ?err, "checkout: failed to load invoice");
                CheckoutCompletionError::Internal(err)
            })?
            .ok_or_else(|| {
                error!(%external_id, "checkout: no invoice for checkout");
                CheckoutCompletionError::InvoiceNotFound(external_id)
            })?;
        let invoice_id = invoice.id;

        if InvoiceStatus::from_str(&invoice.status) == InvoiceStatus::Paid {
            info!(%invoice_id, %external_id, "checkout: invoice already paid, skipping");
            return Ok(CheckoutCompletion::AlreadyProcessed { invoice_id });
        }

        // Read before the first write so a bad payload never leaves a paid invoice behind.
        let payment_type = match data.metadata.get(PaymentType::METADATA_KEY) {
            Some(value) => PaymentType::from_str(value),
            None => {
                warn!(%invoice_id, checkout_id = %data.id, "checkout: metadata has no payment_type");
                return Err(CheckoutCompletionError::MissingPaymentType);
            }
        };

        let transitioned = self
            .invoice_repo
            .mark_paid_if_pending(invoice_id, now)
            .await
            .map_err(|err| {
                error!(%invoice_id, db_error = ?err, "checkout: failed to mark invoice paid");
                CheckoutCompletionError::Internal(err)
            })?;
        if !transitioned {
            info!(%invoice_id, "checkout: invoice was settled concurrently, skipping");
            return Ok(CheckoutCompletion::AlreadyProcessed { invoice_id });
        }

        let Some(subscription_id) = invoice.subscription_id else {
            info!(%invoice_id, "checkout: invoice has no subscription, nothing to activate");
            return Ok(CheckoutCompletion::Completed {
                invoice_id,
                subscription_id: None,
                member_id: invoice.member_id,
                credentials_provisioned: false,
            });
        };

        self.subscription_repo
            .update_status(subscription_id, SubscriptionStatus::Active)
            .await
            .map_err(|err| {
                error!(%subscription_id, db_error = ?err, "checkout: failed to activate subscription");
                CheckoutCompletionError::Internal(err)
            })?;

        let subscription = self
            .subscription_repo
            .find_by_id(subscription_id)
            .await
            .map_err(|err| {
                error!(%subscription_id, db_error = ?err, "checkout: failed to load subscription");
                CheckoutCompletionError::Internal(err)
            })?
            .ok_or_else(|| {
                error!(%subscription_id, "checkout: subscription disappeared after activation");
                CheckoutCompletionError::Internal(anyhow::anyhow!(
                    "subscription {} not found",
                    subscription_id
                ))
            })?;
        let member_id = subscription.member_id;

        self.member_repo
            .update_status(member_id, MemberStatus::Active)
            .await
            .map_err(|err| {
                error!(%member_id, db_error = ?err, "checkout: failed to activate member");
                CheckoutCompletionError::Internal(err)
            })?;

        let credentials_provisioned = match payment_type {
            Some(PaymentType::New) => {
                self.provision_credentials(member_id).await?;
                true
            }
            Some(PaymentType::Renewal) => false,
            None => {
                warn!(%member_id, "checkout: unknown payment_type, skipping provisioning");
                false
            }
        };

        info!(
            %invoice_id,
            %subscription_id,
            %member_id,
            credentials_provisioned,
            "checkout: checkout completed"
        );

        Ok(CheckoutCompletion::Completed {
            invoice_id,
            subscription_id: Some(subscription_id),
            member_id,
            credentials_provisioned,
        })
    }

    async fn provision_credentials(&self, member_id: Uuid) -> CompletionResult<()> {
        let user = self
            .user_repo
            .find_by_member_id(member_id)
            .await
            .map_err(|err| {
                error!(%member_id, db_error = ?err, "checkout: failed to load member account");
                CheckoutCompletionError::Internal(err)
            })?
            .ok_or_else(|| {
                error!(%member_id, "checkout: member has no account to provision");
                CheckoutCompletionError::Internal(anyhow::anyhow!(
                    "member {} has no account",
                    member_id
                ))
            })?;

        let password = generate_temporary_password();
        let password_hash = spawn_hash_password(password.clone()).await?;

        self.user_repo
            .update_password_hash(user.id, password_hash)
            .await
            .map_err(|err| {
                error!(user_id = %user.id, db_error = ?err, "checkout: failed to store credentials");
                CheckoutCompletionError::Internal(err)
            })?;

        self.notifications.submit(Notification::WelcomeCredentials {
            to: user.email,
            password,
            login_url: self.login_url.clone(),
        });

        info!(user_id = %user.id, %member_id, "checkout: credentials provisioned");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::{
        fixtures::{date, sample_invoice, sample_subscription, sample_user},
        gateways::{MockNotificationQueue, MockPaymentGateway},
    };
    use crates::domain::{
        repositories::{
            invoices::MockInvoiceRepository, members::MockMemberRepository,
            subscriptions::MockSubscriptionRepository, users::MockUserRepository,
        },
        value_objects::payments::CheckoutWebhookData,
    };
    use mockall::predicate::eq;
    use std::{collections::HashMap, sync::Mutex};

    type TestUseCase = CheckoutCompletionUseCase<
        MockInvoiceRepository,
        MockSubscriptionRepository,
        MockMemberRepository,
        MockUserRepository,
        MockPaymentGateway,
        MockNotificationQueue,
    >;

    struct Mocks {
        invoices: MockInvoiceRepository,
        subscriptions: MockSubscriptionRepository,
        members: MockMemberRepository,
        users: MockUserRepository,
        gateway: MockPaymentGateway,
        notifications: MockNotificationQueue,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                invoices: MockInvoiceRepository::new(),
                subscriptions: MockSubscriptionRepository::new(),
                members: MockMemberRepository::new(),
                users: MockUserRepository::new(),
                gateway: MockPaymentGateway::new(),
                notifications: MockNotificationQueue::new(),
            }
        }

        fn build(self) -> TestUseCase {
            CheckoutCompletionUseCase::new(
                Arc::new(self.invoices),
                Arc::new(self.subscriptions),
                Arc::new(self.members),
                Arc::new(self.users),
                Arc::new(self.gateway),
                Arc::new(self.notifications),
                "http://localhost:3000/login".to_string(),
            )
        }
    }

    fn event(checkout_id: &str, status: &str, payment_type: Option<&str>) -> CheckoutWebhookEvent {
        let mut metadata = HashMap::new();
        if let Some(value) = payment_type {
            metadata.insert("payment_type".to_string(), value.to_string());
        }
        CheckoutWebhookEvent {
            type_: "checkout.updated".to_string(),
            data: CheckoutWebhookData {
                id: checkout_id.to_string(),
                status: status.to_string(),
                metadata,
            },
        }
    }

    fn headers() -> WebhookHeaders {
        WebhookHeaders {
            id: "msg_1".to_string(),
            timestamp: "1700000000".to_string(),
            signature: "v1,invalid".to_string(),
        }
    }

    /// Wires a single invoice whose status lives in shared state, so repeated
    /// deliveries observe the effects of earlier ones.
    fn wire_invoice(
        mocks: &mut Mocks,
        external_id: Uuid,
        member_id: Uuid,
        subscription_id: Uuid,
    ) -> Arc<Mutex<InvoiceStatus>> {
        let invoice_id = Uuid::new_v4();
        let status = Arc::new(Mutex::new(InvoiceStatus::Pending));

        let current = Arc::clone(&status);
        mocks
            .invoices
            .expect_find_by_external_id()
            .with(eq(external_id))
            .returning(move |external_id| {
                let status = *current.lock().unwrap();
                let invoice = sample_invoice(
                    invoice_id,
                    external_id,
                    member_id,
                    Some(subscription_id),
                    status,
                );
                Box::pin(async move { Ok(Some(invoice)) })
            });

        let current = Arc::clone(&status);
        mocks
            .invoices
            .expect_mark_paid_if_pending()
            .returning(move |_, _| {
                let mut status = current.lock().unwrap();
                let transitioned = *status == InvoiceStatus::Pending;
                if transitioned {
                    *status = InvoiceStatus::Paid;
                }
                Box::pin(async move { Ok(transitioned) })
            });

        mocks
            .subscriptions
            .expect_find_by_id()
            .returning(move |id| {
                let sub = sample_subscription(
                    id,
                    member_id,
                    None,
                    date(2024, 1, 1),
                    date(2024, 1, 31),
                    SubscriptionStatus::Active,
                );
                Box::pin(async move { Ok(Some(sub)) })
            });

        status
    }

    #[tokio::test]
    async fn redelivered_new_checkout_provisions_exactly_once() {
        let external_id = Uuid::new_v4();
        let member_id = Uuid::new_v4();
        let subscription_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();

        let mut mocks = Mocks::new();
        let status = wire_invoice(&mut mocks, external_id, member_id, subscription_id);
        mocks
            .subscriptions
            .expect_update_status()
            .with(eq(subscription_id), eq(SubscriptionStatus::Active))
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(()) }));
        mocks
            .members
            .expect_update_status()
            .with(eq(member_id), eq(MemberStatus::Active))
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(()) }));
        mocks
            .users
            .expect_find_by_member_id()
            .with(eq(member_id))
            .times(1)
            .returning(move |_| {
                Box::pin(async move { Ok(Some(sample_user(user_id, "ann@example.com", None))) })
            });
        mocks
            .users
            .expect_update_password_hash()
            .withf(move |id, hash| *id == user_id && hash.starts_with("$argon2"))
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(()) }));
        mocks
            .notifications
            .expect_submit()
            .withf(|notification| {
                matches!(
                    notification,
                    Notification::WelcomeCredentials { to, password, login_url }
                        if to == "ann@example.com"
                            && password.len() == 12
                            && login_url == "http://localhost:3000/login"
                )
            })
            .times(1)
            .return_const(());

        let usecase = mocks.build();
        let now = Utc::now();

        let first = usecase
            .complete_checkout(event(&external_id.to_string(), "succeeded", Some("new")), now)
            .await
            .unwrap();
        let second = usecase
            .complete_checkout(event(&external_id.to_string(), "succeeded", Some("new")), now)
            .await
            .unwrap();

        assert!(matches!(
            first,
            CheckoutCompletion::Completed {
                credentials_provisioned: true,
                ..
            }
        ));
        assert!(matches!(second, CheckoutCompletion::AlreadyProcessed { .. }));
        assert_eq!(*status.lock().unwrap(), InvoiceStatus::Paid);
    }

    #[tokio::test]
    async fn renewal_activates_without_credentials() {
        let external_id = Uuid::new_v4();
        let member_id = Uuid::new_v4();
        let subscription_id = Uuid::new_v4();

        let mut mocks = Mocks::new();
        wire_invoice(&mut mocks, external_id, member_id, subscription_id);
        mocks
            .subscriptions
            .expect_update_status()
            .returning(|_, _| Box::pin(async { Ok(()) }));
        mocks
            .members
            .expect_update_status()
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(()) }));
        mocks.users.expect_update_password_hash().never();
        mocks.notifications.expect_submit().never();

        let outcome = mocks
            .build()
            .complete_checkout(
                event(&external_id.to_string(), "succeeded", Some("renewal")),
                Utc::now(),
            )
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            CheckoutCompletion::Completed {
                subscription_id: Some(id),
                member_id: activated,
                credentials_provisioned: false,
                ..
            } if id == subscription_id && activated == member_id
        ));
    }

    #[tokio::test]
    async fn non_succeeded_status_is_ignored_without_lookups() {
        let mut mocks = Mocks::new();
        mocks.invoices.expect_find_by_external_id().never();

        let outcome = mocks
            .build()
            .complete_checkout(event(&Uuid::new_v4().to_string(), "open", Some("new")), Utc::now())
            .await
            .unwrap();

        assert_eq!(
            outcome,
            CheckoutCompletion::Ignored {
                status: "open".to_string()
            }
        );
    }

    fn expect_invoice(mocks: &mut Mocks, status: InvoiceStatus) {
        mocks.invoices.expect_find_by_external_id().returning(move |external_id| {
            let invoice = sample_invoice(
                Uuid::new_v4(),
                external_id,
                Uuid::new_v4(),
                Some(Uuid::new_v4()),
                status,
            );
            Box::pin(async move { Ok(Some(invoice)) })
        });
    }

    #[tokio::test]
    async fn missing_payment_type_fails_before_any_write() {
        let mut mocks = Mocks::new();
        expect_invoice(&mut mocks, InvoiceStatus::Pending);
        mocks.invoices.expect_mark_paid_if_pending().never();
        mocks.subscriptions.expect_update_status().never();

        let err = mocks
            .build()
            .complete_checkout(event(&Uuid::new_v4().to_string(), "succeeded", None), Utc::now())
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutCompletionError::MissingPaymentType));
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn redelivery_for_paid_invoice_is_a_no_op_even_without_metadata() {
        let mut mocks = Mocks::new();
        expect_invoice(&mut mocks, InvoiceStatus::Paid);
        mocks.invoices.expect_mark_paid_if_pending().never();
        mocks.subscriptions.expect_update_status().never();

        let outcome = mocks
            .build()
            .complete_checkout(event(&Uuid::new_v4().to_string(), "succeeded", None), Utc::now())
            .await
            .unwrap();

        assert!(matches!(outcome, CheckoutCompletion::AlreadyProcessed { .. }));
    }

    #[tokio::test]
    async fn malformed_checkout_id_is_rejected() {
        let err = Mocks::new()
            .build()
            .complete_checkout(event("not-a-uuid", "succeeded", Some("new")), Utc::now())
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutCompletionError::InvalidWebhook(_)));
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_checkout_is_not_found() {
        let mut mocks = Mocks::new();
        mocks
            .invoices
            .expect_find_by_external_id()
            .returning(|_| Box::pin(async { Ok(None) }));

        let err = mocks
            .build()
            .complete_checkout(
                event(&Uuid::new_v4().to_string(), "succeeded", Some("new")),
                Utc::now(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutCompletionError::InvoiceNotFound(_)));
        assert_eq!(err.status_code(), axum::http::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn invoice_without_subscription_only_marks_paid() {
        let external_id = Uuid::new_v4();
        let member_id = Uuid::new_v4();

        let mut mocks = Mocks::new();
        mocks.invoices.expect_find_by_external_id().returning(move |external_id| {
            let invoice = sample_invoice(
                Uuid::new_v4(),
                external_id,
                member_id,
                None,
                InvoiceStatus::Pending,
            );
            Box::pin(async move { Ok(Some(invoice)) })
        });
        mocks
            .invoices
            .expect_mark_paid_if_pending()
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(true) }));
        mocks.subscriptions.expect_update_status().never();
        mocks.members.expect_update_status().never();
        mocks.notifications.expect_submit().never();

        let outcome = mocks
            .build()
            .complete_checkout(event(&external_id.to_string(), "succeeded", Some("new")), Utc::now())
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            CheckoutCompletion::Completed {
                subscription_id: None,
                credentials_provisioned: false,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn bad_signature_changes_nothing() {
        let mut mocks = Mocks::new();
        mocks
            .gateway
            .expect_verify_webhook()
            .times(1)
            .returning(|_, _| Err(anyhow::anyhow!("invalid webhook signature")));
        mocks.invoices.expect_find_by_external_id().never();
        mocks.invoices.expect_mark_paid_if_pending().never();

        let payload = br#"{"type":"checkout.updated","data":{"id":"x","status":"succeeded"}}"#;
        let err = mocks
            .build()
            .handle_webhook(payload, &headers(), Utc::now())
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutCompletionError::InvalidSignature));
        assert_eq!(err.status_code(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn verified_webhook_runs_completion() {
        let mut mocks = Mocks::new();
        mocks
            .gateway
            .expect_verify_webhook()
            .withf(|headers, _| headers.id == "msg_1")
            .returning(|_, _| Ok(()));

        let payload = br#"{"type":"checkout.updated","data":{"id":"abc","status":"confirmed","metadata":{}}}"#;
        let outcome = mocks
            .build()
            .handle_webhook(payload, &headers(), Utc::now())
            .await
            .unwrap();

        assert_eq!(
            outcome,
            CheckoutCompletion::Ignored {
                status: "confirmed".to_string()
            }
        );
    }
}
