use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{
    OptionalExtension, RunQueryDsl, insert_into,
    prelude::*,
    result::{DatabaseErrorKind, Error as DieselError},
    update,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::check_ins},
};
use domain::{
    entities::check_ins::{CheckInEntity, InsertCheckInEntity},
    repositories::check_ins::CheckInRepository,
};

pub struct CheckInPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl CheckInPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl CheckInRepository for CheckInPostgres {
    async fn find_open_by_member_id(&self, member_id: Uuid) -> Result<Option<CheckInEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let visit = check_ins::table
            .filter(check_ins::member_id.eq(member_id))
            .filter(check_ins::check_out_time.is_null())
            .order(check_ins::check_in_time.desc())
            .select(CheckInEntity::as_select())
            .first::<CheckInEntity>(&mut conn)
            .optional()?;

        Ok(visit)
    }

    async fn open_visit(&self, visit: InsertCheckInEntity) -> Result<Option<CheckInEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let inserted = insert_into(check_ins::table)
            .values(&visit)
            .returning(CheckInEntity::as_returning())
            .get_result::<CheckInEntity>(&mut conn);

        match inserted {
            Ok(created) => Ok(Some(created)),
            // check_ins_one_open_visit_idx
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn close_visit(
        &self,
        check_in_id: Uuid,
        checked_out_at: DateTime<Utc>,
    ) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let affected = update(
            check_ins::table
                .filter(check_ins::id.eq(check_in_id))
                .filter(check_ins::check_out_time.is_null()),
        )
        .set(check_ins::check_out_time.eq(Some(checked_out_at)))
        .execute(&mut conn)?;

        Ok(affected == 1)
    }

    async fn list_by_branch(&self, branch_id: Uuid) -> Result<Vec<CheckInEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let visits = check_ins::table
            .filter(check_ins::branch_id.eq(branch_id))
            .order(check_ins::check_in_time.desc())
            .select(CheckInEntity::as_select())
            .load::<CheckInEntity>(&mut conn)?;

        Ok(visits)
    }

    async fn count_open_by_branch(&self, branch_id: Uuid) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let open = check_ins::table
            .filter(check_ins::branch_id.eq(branch_id))
            .filter(check_ins::check_out_time.is_null())
            .count()
            .get_result::<i64>(&mut conn)?;

        Ok(open)
    }

    async fn list_by_member_between(
        &self,
        member_id: Uuid,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<CheckInEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let visits = check_ins::table
            .filter(check_ins::member_id.eq(member_id))
            .filter(check_ins::check_in_time.ge(from))
            .filter(check_ins::check_in_time.lt(until))
            .order(check_ins::check_in_time.asc())
            .select(CheckInEntity::as_select())
            .load::<CheckInEntity>(&mut conn)?;

        Ok(visits)
    }
}
