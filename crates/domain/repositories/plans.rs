use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::plans::{InsertPlanEntity, PlanEntity, UpdatePlanEntity};

#[async_trait]
#[automock]
pub trait PlanRepository {
    async fn find_by_id(&self, plan_id: Uuid) -> Result<Option<PlanEntity>>;

    async fn create(&self, plan: InsertPlanEntity) -> Result<PlanEntity>;

    async fn update(&self, plan_id: Uuid, changes: UpdatePlanEntity) -> Result<Option<PlanEntity>>;

    async fn deactivate(&self, plan_id: Uuid) -> Result<bool>;
}
