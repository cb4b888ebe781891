use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::subscriptions::{InsertSubscriptionEntity, SubscriptionEntity};
use crate::domain::value_objects::enums::subscription_statuses::SubscriptionStatus;

#[async_trait]
#[automock]
pub trait SubscriptionRepository {
    async fn create(&self, subscription: InsertSubscriptionEntity) -> Result<SubscriptionEntity>;

    async fn find_by_id(&self, subscription_id: Uuid) -> Result<Option<SubscriptionEntity>>;

    /// Latest-ending subscription that is `active` and has not ended before `today`.
    async fn find_active_by_member_id(
        &self,
        member_id: Uuid,
        today: NaiveDate,
    ) -> Result<Option<SubscriptionEntity>>;

    async fn update_status(&self, subscription_id: Uuid, status: SubscriptionStatus)
    -> Result<()>;

    /// Moves every `active` subscription whose end date is before `today` to `expired`.
    async fn expire_ended_before(&self, today: NaiveDate) -> Result<usize>;
}
