use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use diesel::{OptionalExtension, RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain;
use crate::infra::db::postgres::{postgres_connection::PgPoolSquad, schema::plans};
use domain::{
    entities::plans::{InsertPlanEntity, PlanEntity, UpdatePlanEntity},
    repositories::plans::PlanRepository,
};

pub struct PlanPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl PlanPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl PlanRepository for PlanPostgres {
    async fn find_by_id(&self, plan_id: Uuid) -> Result<Option<PlanEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let plan = plans::table
            .filter(plans::id.eq(plan_id))
            .filter(plans::is_active.eq(true))
            .select(PlanEntity::as_select())
            .first::<PlanEntity>(&mut conn)
            .optional()?;

        Ok(plan)
    }

    async fn create(&self, plan: InsertPlanEntity) -> Result<PlanEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let created = insert_into(plans::table)
            .values(&plan)
            .returning(PlanEntity::as_returning())
            .get_result::<PlanEntity>(&mut conn)
            .context("failed to insert plan")?;

        Ok(created)
    }

    async fn update(
        &self,
        plan_id: Uuid,
        mut changes: UpdatePlanEntity,
    ) -> Result<Option<PlanEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        changes.updated_at = Some(Utc::now());

        let updated = update(
            plans::table
                .filter(plans::id.eq(plan_id))
                .filter(plans::is_active.eq(true)),
        )
        .set(&changes)
        .returning(PlanEntity::as_returning())
        .get_result::<PlanEntity>(&mut conn)
        .optional()?;

        Ok(updated)
    }

    async fn deactivate(&self, plan_id: Uuid) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let affected = update(
            plans::table
                .filter(plans::id.eq(plan_id))
                .filter(plans::is_active.eq(true)),
        )
        .set((plans::is_active.eq(false), plans::updated_at.eq(Utc::now())))
        .execute(&mut conn)?;

        Ok(affected > 0)
    }
}
