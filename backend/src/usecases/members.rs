use std::sync::Arc;

use crates::domain::{
    entities::{members::InsertMemberEntity, users::InsertUserEntity},
    repositories::{members::MemberRepository, users::UserRepository},
    value_objects::{
        enums::{member_statuses::MemberStatus, payment_types::PaymentType},
        members::{CreateMemberModel, CreatedMemberDto},
        subscriptions::CreateSubscriptionModel,
    },
};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::usecases::subscriptions::{CheckoutStarter, SubscriptionError};

const MEMBER_ROLE: &str = "member";

#[derive(Debug, Error)]
pub enum MemberError {
    #[error("invalid member: {0}")]
    InvalidMember(String),
    #[error("a user with this email already exists")]
    UserAlreadyExists,
    #[error("no user with this email exists")]
    UserNotFound,
    #[error("a home branch is required for a new user")]
    HomeBranchRequired,
    #[error(transparent)]
    Subscription(#[from] SubscriptionError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl MemberError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            MemberError::InvalidMember(_) | MemberError::HomeBranchRequired => {
                StatusCode::BAD_REQUEST
            }
            MemberError::UserAlreadyExists => StatusCode::CONFLICT,
            MemberError::UserNotFound => StatusCode::NOT_FOUND,
            MemberError::Subscription(err) => err.status_code(),
            MemberError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type MemberResult<T> = std::result::Result<T, MemberError>;

pub struct MemberUseCase<M, U, C>
where
    M: MemberRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    C: CheckoutStarter + 'static,
{
    member_repo: Arc<M>,
    user_repo: Arc<U>,
    checkout_starter: Arc<C>,
}

impl<M, U, C> MemberUseCase<M, U, C>
where
    M: MemberRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    C: CheckoutStarter + 'static,
{
    pub fn new(member_repo: Arc<M>, user_repo: Arc<U>, checkout_starter: Arc<C>) -> Self {
        Self {
            member_repo,
            user_repo,
            checkout_starter,
        }
    }

    /// Registers a member (and their login account when new) and starts the first checkout.
    pub async fn create_member(&self, model: CreateMemberModel) -> MemberResult<CreatedMemberDto> {
        if model.first_name.trim().is_empty() || model.last_name.trim().is_empty() {
            return Err(MemberError::InvalidMember(
                "first and last name are required".to_string(),
            ));
        }
        let email = normalize_email(&model.email)?;

        let existing = self
            .user_repo
            .find_by_email(email.clone())
            .await
            .map_err(|err| {
                error!(db_error = ?err, "members: failed to look up user by email");
                MemberError::Internal(err)
            })?;

        let create_new_user = match (model.create_new_user, existing.is_some()) {
            (Some(true), true) => return Err(MemberError::UserAlreadyExists),
            (Some(false), false) => return Err(MemberError::UserNotFound),
            (Some(explicit), _) => explicit,
            (None, exists) => !exists,
        };

        if create_new_user && model.home_branch_id.is_none() {
            warn!(organization_id = %model.organization_id, "members: new user without home branch");
            return Err(MemberError::HomeBranchRequired);
        }

        let new_user = create_new_user.then(|| InsertUserEntity {
            email: email.clone(),
            password_hash: None,
            role: MEMBER_ROLE.to_string(),
        });

        let member = self
            .member_repo
            .create(
                InsertMemberEntity {
                    user_id: existing.as_ref().map(|user| user.id),
                    organization_id: model.organization_id,
                    home_branch_id: model.home_branch_id,
                    first_name: model.first_name.trim().to_string(),
                    last_name: model.last_name.trim().to_string(),
                    status: MemberStatus::Lead.to_string(),
                },
                new_user,
            )
            .await
            .map_err(|err| {
                error!(
                    organization_id = %model.organization_id,
                    db_error = ?err,
                    "members: failed to create member"
                );
                MemberError::Internal(err)
            })?;

        let member_id = member.id;
        let user_id = member.user_id.ok_or_else(|| {
            error!(%member_id, "members: created member is not linked to a user");
            MemberError::Internal(anyhow::anyhow!("member {} has no user", member_id))
        })?;

        info!(%member_id, %user_id, create_new_user, "members: member created");

        // Only an account that already holds credentials is a renewal; an earlier unpaid
        // signup still needs them provisioned on this purchase.
        let has_credentials = existing
            .as_ref()
            .is_some_and(|user| user.password_hash.is_some());
        let payment_type = if has_credentials {
            PaymentType::Renewal
        } else {
            PaymentType::New
        };

        let checkout = self
            .checkout_starter
            .start_checkout(CreateSubscriptionModel {
                member_id,
                plan_id: model.plan_id,
                branch_id: model.home_branch_id,
                start_date: model.join_date,
                payment_type: Some(payment_type),
            })
            .await
            .map_err(|err| {
                warn!(%member_id, error = %err, "members: initial checkout failed, member stays a lead");
                MemberError::Subscription(err)
            })?;

        Ok(CreatedMemberDto {
            member_id,
            user_id,
            checkout,
        })
    }
}

fn normalize_email(raw: &str) -> MemberResult<String> {
    let email = raw.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid {
        return Err(MemberError::InvalidMember("email is invalid".to_string()));
    }
    Ok(email)
}
