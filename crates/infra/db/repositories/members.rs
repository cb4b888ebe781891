use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{Connection, OptionalExtension, RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{members, users},
    },
};
use domain::{
    entities::{
        members::{InsertMemberEntity, MemberEntity},
        users::InsertUserEntity,
    },
    repositories::members::MemberRepository,
    value_objects::enums::member_statuses::MemberStatus,
};

pub struct MemberPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl MemberPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl MemberRepository for MemberPostgres {
    async fn find_by_id(&self, member_id: Uuid) -> Result<Option<MemberEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let member = members::table
            .filter(members::id.eq(member_id))
            .select(MemberEntity::as_select())
            .first::<MemberEntity>(&mut conn)
            .optional()?;

        Ok(member)
    }

    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<MemberEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let member = members::table
            .filter(members::user_id.eq(user_id))
            .order(members::created_at.desc())
            .select(MemberEntity::as_select())
            .first::<MemberEntity>(&mut conn)
            .optional()?;

        Ok(member)
    }

    async fn create(
        &self,
        member: InsertMemberEntity,
        new_user: Option<InsertUserEntity>,
    ) -> Result<MemberEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let created = conn.transaction::<_, anyhow::Error, _>(|conn| {
            let mut member = member;
            if let Some(user) = new_user {
                let user_id = insert_into(users::table)
                    .values(&user)
                    .returning(users::id)
                    .get_result::<Uuid>(conn)?;
                member.user_id = Some(user_id);
            }

            let created = insert_into(members::table)
                .values(&member)
                .returning(MemberEntity::as_returning())
                .get_result::<MemberEntity>(conn)?;

            Ok(created)
        })?;

        Ok(created)
    }

    async fn update_status(&self, member_id: Uuid, status: MemberStatus) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let affected = update(members::table.filter(members::id.eq(member_id)))
            .set((
                members::status.eq(status.to_string()),
                members::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        if affected == 0 {
            anyhow::bail!("member {} not found", member_id);
        }

        Ok(())
    }
}
