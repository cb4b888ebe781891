use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    domain::value_objects::check_ins::VisitState, infra::db::postgres::schema::check_ins,
};

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = check_ins)]
pub struct CheckInEntity {
    pub id: Uuid,
    pub member_id: Uuid,
    pub subscription_id: Uuid,
    pub branch_id: Uuid,
    pub check_in_time: DateTime<Utc>,
    pub check_out_time: Option<DateTime<Utc>>,
    pub method: String,
}

impl CheckInEntity {
    pub fn state(&self) -> VisitState {
        match self.check_out_time {
            None => VisitState::Open,
            Some(checked_out_at) => VisitState::Closed { checked_out_at },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = check_ins)]
pub struct InsertCheckInEntity {
    pub member_id: Uuid,
    pub subscription_id: Uuid,
    pub branch_id: Uuid,
    pub check_in_time: DateTime<Utc>,
    pub method: String,
}
