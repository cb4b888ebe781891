use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::check_ins::{CheckInEntity, InsertCheckInEntity};

#[async_trait]
#[automock]
pub trait CheckInRepository {
    async fn find_open_by_member_id(&self, member_id: Uuid) -> Result<Option<CheckInEntity>>;

    /// `None` when the member already has an open visit.
    async fn open_visit(&self, visit: InsertCheckInEntity) -> Result<Option<CheckInEntity>>;

    /// Returns `false` when the visit had already been closed.
    async fn close_visit(&self, check_in_id: Uuid, checked_out_at: DateTime<Utc>)
    -> Result<bool>;

    async fn list_by_branch(&self, branch_id: Uuid) -> Result<Vec<CheckInEntity>>;

    async fn count_open_by_branch(&self, branch_id: Uuid) -> Result<i64>;

    /// Visits that started in `[from, until)`, oldest first.
    async fn list_by_member_between(
        &self,
        member_id: Uuid,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<CheckInEntity>>;
}
