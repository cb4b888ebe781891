use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::{
    members::{InsertMemberEntity, MemberEntity},
    users::InsertUserEntity,
};
use crate::domain::value_objects::enums::member_statuses::MemberStatus;

#[async_trait]
#[automock]
pub trait MemberRepository {
    async fn find_by_id(&self, member_id: Uuid) -> Result<Option<MemberEntity>>;

    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<MemberEntity>>;

    /// Inserts `new_user` first when given and links the member to it, in one transaction.
    async fn create(
        &self,
        member: InsertMemberEntity,
        new_user: Option<InsertUserEntity>,
    ) -> Result<MemberEntity>;

    async fn update_status(&self, member_id: Uuid, status: MemberStatus) -> Result<()>;
}
