use std::{collections::HashMap, sync::Arc};

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use crates::{
    domain::{
        entities::{
            invoices::InsertInvoiceEntity, plans::PlanEntity,
            subscriptions::InsertSubscriptionEntity,
        },
        repositories::{
            invoices::InvoiceRepository, members::MemberRepository, plans::PlanRepository,
            subscriptions::SubscriptionRepository, users::UserRepository,
        },
        value_objects::{
            enums::{
                invoice_statuses::InvoiceStatus, payment_types::PaymentType,
                subscription_statuses::SubscriptionStatus,
            },
            payments::CheckoutSessionRequest,
            subscriptions::{
                CheckoutStartedDto, CreateSubscriptionModel, RenewSubscriptionModel,
                RenewedSubscriptionDto,
            },
        },
    },
    notifications::dispatcher::Notification,
};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::usecases::{
    gateways::{NotificationQueue, PaymentGateway},
    plans::{PlanError, PlanUseCase},
};

#[derive(Debug, Error)]
pub enum SubscriptionError {
    #[error("plan not found")]
    PlanNotFound,
    #[error("invalid plan: {0}")]
    InvalidPlan(String),
    #[error("member not found")]
    MemberNotFound,
    #[error("member has no account email for checkout")]
    MissingEmail,
    #[error("subscription period is out of range")]
    InvalidPeriod,
    #[error("member has no active subscription")]
    NoActiveSubscription,
    #[error("payment provider request failed")]
    PaymentProvider(anyhow::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl SubscriptionError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            SubscriptionError::PlanNotFound | SubscriptionError::MemberNotFound => {
                StatusCode::NOT_FOUND
            }
            SubscriptionError::InvalidPlan(_)
            | SubscriptionError::MissingEmail
            | SubscriptionError::InvalidPeriod => StatusCode::BAD_REQUEST,
            SubscriptionError::NoActiveSubscription => StatusCode::CONFLICT,
            SubscriptionError::PaymentProvider(_) => StatusCode::BAD_GATEWAY,
            SubscriptionError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PlanError> for SubscriptionError {
    fn from(value: PlanError) -> Self {
        match value {
            PlanError::PlanNotFound => SubscriptionError::PlanNotFound,
            PlanError::InvalidPlan(reason) => SubscriptionError::InvalidPlan(reason),
            PlanError::PaymentProvider(err) => SubscriptionError::PaymentProvider(err),
            PlanError::Internal(err) => SubscriptionError::Internal(err),
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, SubscriptionError>;

/// Starts a paid subscription and its hosted checkout. Member onboarding goes through this seam.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CheckoutStarter: Send + Sync {
    async fn start_checkout(
        &self,
        model: CreateSubscriptionModel,
    ) -> UseCaseResult<CheckoutStartedDto>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExpirySweeper: Send + Sync {
    async fn expire_old_subscriptions(&self, today: NaiveDate) -> UseCaseResult<usize>;
}

pub struct SubscriptionUseCase<S, I, M, U, P, G, N>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    I: InvoiceRepository + Send + Sync + 'static,
    M: MemberRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    G: PaymentGateway + 'static,
    N: NotificationQueue + 'static,
{
    subscription_repo: Arc<S>,
    invoice_repo: Arc<I>,
    member_repo: Arc<M>,
    user_repo: Arc<U>,
    plans: Arc<PlanUseCase<P, G>>,
    payment_gateway: Arc<G>,
    notifications: Arc<N>,
    success_url: String,
}

impl<S, I, M, U, P, G, N> SubscriptionUseCase<S, I, M, U, P, G, N>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    I: InvoiceRepository + Send + Sync + 'static,
    M: MemberRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    G: PaymentGateway + 'static,
    N: NotificationQueue + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        subscription_repo: Arc<S>,
        invoice_repo: Arc<I>,
        member_repo: Arc<M>,
        user_repo: Arc<U>,
        plans: Arc<PlanUseCase<P, G>>,
        payment_gateway: Arc<G>,
        notifications: Arc<N>,
        success_url: String,
    ) -> Self {
        Self {
            subscription_repo,
            invoice_repo,
            member_repo,
            user_repo,
            plans,
            payment_gateway,
            notifications,
            success_url,
        }
    }

    pub async fn create_subscription(
        &self,
        model: CreateSubscriptionModel,
    ) -> UseCaseResult<CheckoutStartedDto> {
        let member_id = model.member_id;
        let plan_id = model.plan_id;
        info!(
            %member_id,
            %plan_id,
            start_date = %model.start_date,
            "subscriptions: create subscription requested"
        );

        let plan = self.plans.get_plan(plan_id).await?;
        validate_plan(&plan)?;
        ensure_purchasable(&plan)?;

        self.member_repo
            .find_by_id(member_id)
            .await
            .map_err(|err| {
                error!(%member_id, db_error = ?err, "subscriptions: failed to load member");
                SubscriptionError::Internal(err)
            })?
            .ok_or_else(|| {
                warn!(%member_id, "subscriptions: member not found");
                SubscriptionError::MemberNotFound
            })?;

        let user = self
            .user_repo
            .find_by_member_id(member_id)
            .await
            .map_err(|err| {
                error!(%member_id, db_error = ?err, "subscriptions: failed to load member account");
                SubscriptionError::Internal(err)
            })?
            .ok_or_else(|| {
                warn!(%member_id, "subscriptions: member has no account email");
                SubscriptionError::MissingEmail
            })?;

        // An account that never completed a payment has no credentials yet.
        let payment_type = model.payment_type.unwrap_or(match user.password_hash {
            Some(_) => PaymentType::Renewal,
            None => PaymentType::New,
        });

        let end_date = add_days(model.start_date, plan.duration_days.into())?;

        let subscription = self
            .subscription_repo
            .create(InsertSubscriptionEntity {
                member_id,
                plan_id: Some(plan.id),
                branch_id: model.branch_id,
                start_date: model.start_date,
                end_date,
                status: SubscriptionStatus::Active.to_string(),
            })
            .await
            .map_err(|err| {
                error!(%member_id, %plan_id, db_error = ?err, "subscriptions: failed to persist subscription");
                SubscriptionError::Internal(err)
            })?;
        let subscription_id = subscription.id;

        let mut metadata = HashMap::new();
        metadata.insert(
            PaymentType::METADATA_KEY.to_string(),
            payment_type.to_string(),
        );

        let session = self
            .payment_gateway
            .create_checkout_session(CheckoutSessionRequest {
                product_ids: vec![plan.id.to_string()],
                customer_email: user.email.clone(),
                success_url: self.success_url.clone(),
                metadata,
            })
            .await
            .map_err(|err| {
                error!(
                    %member_id,
                    %subscription_id,
                    error = ?err,
                    "subscriptions: checkout session creation failed"
                );
                SubscriptionError::PaymentProvider(err)
            })?;

        let external_id = Uuid::parse_str(&session.id).map_err(|err| {
            error!(checkout_id = %session.id, error = ?err, "subscriptions: checkout id is not a uuid");
            SubscriptionError::Internal(anyhow!("checkout id is not a uuid: {}", session.id))
        })?;

        let invoice = self
            .invoice_repo
            .create(InsertInvoiceEntity {
                member_id,
                subscription_id: Some(subscription_id),
                branch_id: model.branch_id,
                external_id,
                amount_minor: session.amount_minor,
                tax_amount_minor: session.tax_amount_minor,
                status: InvoiceStatus::Pending.to_string(),
                due_at: session.expires_at,
            })
            .await
            .map_err(|err| {
                error!(%subscription_id, %external_id, db_error = ?err, "subscriptions: failed to persist invoice");
                SubscriptionError::Internal(err)
            })?;

        self.notifications.submit(Notification::CheckoutLink {
            to: user.email,
            checkout_url: session.url.clone(),
        });

        info!(
            %member_id,
            %subscription_id,
            invoice_id = %invoice.id,
            payment_type = %payment_type,
            "subscriptions: checkout started"
        );

        Ok(CheckoutStartedDto {
            subscription_id,
            invoice_id: invoice.id,
            checkout_url: session.url,
            start_date: subscription.start_date,
            end_date: subscription.end_date,
        })
    }

    pub async fn renew_subscription(
        &self,
        member_id: Uuid,
        model: RenewSubscriptionModel,
        today: NaiveDate,
    ) -> UseCaseResult<RenewedSubscriptionDto> {
        info!(%member_id, "subscriptions: renewal requested");

        let current = self
            .subscription_repo
            .find_active_by_member_id(member_id, today)
            .await
            .map_err(|err| {
                error!(%member_id, db_error = ?err, "subscriptions: failed to load active subscription");
                SubscriptionError::Internal(err)
            })?
            .ok_or_else(|| {
                warn!(%member_id, "subscriptions: no active subscription to renew");
                SubscriptionError::NoActiveSubscription
            })?;

        let plan_id = model.plan_id.or(current.plan_id);
        let duration_days = match plan_id {
            Some(plan_id) => {
                let plan = self.plans.get_plan(plan_id).await?;
                validate_plan(&plan)?;
                // Members already on an archived plan may keep renewing it.
                if model.plan_id.is_some() {
                    ensure_purchasable(&plan)?;
                }
                i64::from(plan.duration_days)
            }
            None => current.period_days(),
        };
        let branch_id = model.branch_id.or(current.branch_id);

        let start_date = current.end_date;
        let end_date = add_days(start_date, duration_days)?;

        self.subscription_repo
            .update_status(current.id, SubscriptionStatus::Expired)
            .await
            .map_err(|err| {
                error!(subscription_id = %current.id, db_error = ?err, "subscriptions: failed to expire current subscription");
                SubscriptionError::Internal(err)
            })?;

        let renewed = self
            .subscription_repo
            .create(InsertSubscriptionEntity {
                member_id,
                plan_id,
                branch_id,
                start_date,
                end_date,
                status: SubscriptionStatus::Active.to_string(),
            })
            .await
            .map_err(|err| {
                error!(%member_id, db_error = ?err, "subscriptions: failed to persist renewal");
                SubscriptionError::Internal(err)
            })?;

        info!(
            %member_id,
            previous_subscription_id = %current.id,
            subscription_id = %renewed.id,
            "subscriptions: subscription renewed"
        );

        Ok(RenewedSubscriptionDto {
            previous_subscription_id: current.id,
            subscription_id: renewed.id,
            start_date: renewed.start_date,
            end_date: renewed.end_date,
        })
    }

    pub async fn expire_old_subscriptions(&self, today: NaiveDate) -> UseCaseResult<usize> {
        let expired = self
            .subscription_repo
            .expire_ended_before(today)
            .await
            .map_err(|err| {
                error!(%today, db_error = ?err, "subscriptions: expiry sweep failed");
                SubscriptionError::Internal(err)
            })?;

        info!(%today, expired, "subscriptions: expiry sweep finished");
        Ok(expired)
    }
}

#[async_trait]
impl<S, I, M, U, P, G, N> CheckoutStarter for SubscriptionUseCase<S, I, M, U, P, G, N>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    I: InvoiceRepository + Send + Sync + 'static,
    M: MemberRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    G: PaymentGateway + 'static,
    N: NotificationQueue + 'static,
{
    async fn start_checkout(
        &self,
        model: CreateSubscriptionModel,
    ) -> UseCaseResult<CheckoutStartedDto> {
        self.create_subscription(model).await
    }
}

#[async_trait]
impl<S, I, M, U, P, G, N> ExpirySweeper for SubscriptionUseCase<S, I, M, U, P, G, N>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    I: InvoiceRepository + Send + Sync + 'static,
    M: MemberRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    G: PaymentGateway + 'static,
    N: NotificationQueue + 'static,
{
    async fn expire_old_subscriptions(&self, today: NaiveDate) -> UseCaseResult<usize> {
        SubscriptionUseCase::expire_old_subscriptions(self, today).await
    }
}

fn validate_plan(plan: &PlanEntity) -> UseCaseResult<()> {
    if plan.duration_days <= 0 {
        return Err(SubscriptionError::InvalidPlan(
            "duration_days must be positive".to_string(),
        ));
    }
    if plan.price_minor < 0 {
        return Err(SubscriptionError::InvalidPlan(
            "price must not be negative".to_string(),
        ));
    }
    Ok(())
}

fn ensure_purchasable(plan: &PlanEntity) -> UseCaseResult<()> {
    if !plan.is_active {
        warn!(plan_id = %plan.id, "subscriptions: plan is archived");
        return Err(SubscriptionError::InvalidPlan(
            "plan is archived".to_string(),
        ));
    }
    Ok(())
}

fn add_days(start_date: NaiveDate, days: i64) -> UseCaseResult<NaiveDate> {
    let days = u64::try_from(days).map_err(|_| SubscriptionError::InvalidPeriod)?;
    start_date
        .checked_add_days(Days::new(days))
        .ok_or(SubscriptionError::InvalidPeriod)
}
