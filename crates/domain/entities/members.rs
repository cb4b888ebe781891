use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::members;

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = members)]
pub struct MemberEntity {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub organization_id: Uuid,
    pub home_branch_id: Option<Uuid>,
    pub first_name: String,
    pub last_name: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = members)]
pub struct InsertMemberEntity {
    pub user_id: Option<Uuid>,
    pub organization_id: Uuid,
    pub home_branch_id: Option<Uuid>,
    pub first_name: String,
    pub last_name: String,
    pub status: String,
}
